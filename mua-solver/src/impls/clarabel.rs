use clarabel::algebra::*;
use clarabel::solver::*;
use mua_core::Map;
use mua_core::ports::{Direction, LinExpr, MathProgram, ProgramError, Sense, Variable};

/// A [`MathProgram`] backed by Clarabel.
///
/// Clarabel consumes one immutable conic program per solve, so this
/// implementation keeps the model symbolically — an append-only log of
/// named constraints over the declared variables — and assembles the CSC
/// conic form from scratch on every `optimize()`. Removing a constraint
/// by name just drops it from the log.
pub struct ClarabelProgram {
    settings: DefaultSettings<f64>,
    variables: Vec<VariableData>,
    constraints: Map<String, ConstraintData>,
    objective: Option<(LinExpr, Direction)>,
    solved: Option<Solved>,
}

struct VariableData {
    name: String,
    lower: f64,
    upper: f64,
}

struct ConstraintData {
    expr: LinExpr,
    sense: Sense,
    rhs: f64,
}

struct Solved {
    values: Vec<f64>,
    duals: Map<String, f64>,
    objective: f64,
}

impl Default for ClarabelProgram {
    fn default() -> Self {
        let mut settings = DefaultSettings::default();
        settings.verbose = false;
        Self::new(settings)
    }
}

impl MathProgram for ClarabelProgram {
    type Settings = DefaultSettings<f64>;

    fn new(settings: Self::Settings) -> Self {
        Self {
            settings,
            variables: Vec::new(),
            constraints: Map::default(),
            objective: None,
            solved: None,
        }
    }

    fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> Variable {
        self.solved = None;
        self.variables.push(VariableData {
            name: name.into(),
            lower,
            upper,
        });
        Variable::from_index(self.variables.len() - 1)
    }

    fn add_constraint(&mut self, name: impl Into<String>, expr: LinExpr, sense: Sense, rhs: f64) {
        self.solved = None;
        self.constraints
            .insert(name.into(), ConstraintData { expr, sense, rhs });
    }

    fn remove_constraint(&mut self, name: &str) -> Result<(), ProgramError> {
        self.solved = None;
        self.constraints
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| ProgramError::UnknownConstraint(name.to_owned()))
    }

    fn set_objective(&mut self, expr: LinExpr, direction: Direction) {
        self.solved = None;
        self.objective = Some((expr, direction));
    }

    fn optimize(&mut self) -> Result<(), ProgramError> {
        let ncols = self.variables.len();

        // Clarabel minimizes; a maximization objective flips sign here and
        // flips back when reading results.
        let no_objective = LinExpr::new();
        let (objective, direction) = match &self.objective {
            Some((expr, direction)) => (expr, *direction),
            None => (&no_objective, Direction::Minimize),
        };
        let objective_sign = match direction {
            Direction::Maximize => -1.0,
            Direction::Minimize => 1.0,
        };
        let mut q = vec![0.0; ncols];
        for &(variable, coefficient) in objective.terms() {
            q[variable.index()] = objective_sign * coefficient;
        }

        // Clarabel handles constraints via a cone specification Ax + s = b
        // with s in a cone. Equalities go into the zero cone, which must
        // come first; inequalities and variable bounds follow in the
        // nonnegative cone.
        let equalities: Vec<(&String, &ConstraintData)> = self
            .constraints
            .iter()
            .filter(|(_, c)| c.sense == Sense::Eq)
            .collect();
        let inequalities: Vec<(&String, &ConstraintData)> = self
            .constraints
            .iter()
            .filter(|(_, c)| c.sense != Sense::Eq)
            .collect();

        // (column, row, value) triplets; CSC assembly sorts them below.
        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        let mut b = Vec::new();
        // Dual bookkeeping: constraint name, row, sign back to the
        // declared objective direction and constraint sense.
        let mut dual_rows: Vec<(&String, usize, f64)> = Vec::new();

        for &(name, constraint) in equalities.iter().chain(inequalities.iter()) {
            // A >= row enters as its <= negation.
            let row_sign = match constraint.sense {
                Sense::Ge => -1.0,
                Sense::Le | Sense::Eq => 1.0,
            };
            let row = b.len();
            for &(variable, coefficient) in constraint.expr.terms() {
                triplets.push((variable.index(), row, row_sign * coefficient));
            }
            b.push(row_sign * constraint.rhs);
            // Shadow price in the declared direction/sense:
            // d(declared optimum)/d(rhs) = -row_sign * objective_sign * z.
            dual_rows.push((name, row, -row_sign * objective_sign));
        }

        // Finite variable bounds become nonnegative-cone rows of their own.
        for (index, variable) in self.variables.iter().enumerate() {
            if variable.upper.is_finite() {
                triplets.push((index, b.len(), 1.0));
                b.push(variable.upper);
            }
            if variable.lower.is_finite() {
                triplets.push((index, b.len(), -1.0));
                b.push(-variable.lower);
            }
        }

        let nzero = equalities.len();
        let mut cones = Vec::new();
        if nzero > 0 {
            cones.push(ZeroConeT(nzero));
        }
        if b.len() > nzero {
            cones.push(NonnegativeConeT(b.len() - nzero));
        }

        // Assemble A in CSC form from the sorted triplets.
        triplets.sort_unstable_by_key(|&(col, row, _)| (col, row));
        let mut a_colptr = Vec::with_capacity(ncols + 1);
        let mut a_rowval = Vec::with_capacity(triplets.len());
        let mut a_nzval = Vec::with_capacity(triplets.len());
        for (col, row, value) in triplets {
            while a_colptr.len() <= col {
                a_colptr.push(a_nzval.len());
            }
            a_rowval.push(row);
            a_nzval.push(value);
        }
        while a_colptr.len() <= ncols {
            a_colptr.push(a_nzval.len());
        }
        let a_matrix = CscMatrix {
            m: b.len(),
            n: ncols,
            colptr: a_colptr,
            rowval: a_rowval,
            nzval: a_nzval,
        };

        // The objective is purely linear; P is the zero matrix.
        let p_matrix = CscMatrix {
            m: ncols,
            n: ncols,
            colptr: vec![0; ncols + 1],
            rowval: Vec::new(),
            nzval: Vec::new(),
        };

        let mut solver =
            DefaultSolver::new(&p_matrix, &q, &a_matrix, &b, &cones, self.settings.clone())
                .map_err(|e| ProgramError::Numerical(e.to_string()))?;
        solver.solve();

        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {}
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                return Err(ProgramError::Infeasible);
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                return Err(ProgramError::Unbounded);
            }
            status => {
                return Err(ProgramError::Numerical(format!("{status:?}")));
            }
        }

        let values = solver.solution.x.clone();
        for (variable, value) in self.variables.iter().zip(&values) {
            tracing::debug!(target: "lp", "{} = {value:.6}", variable.name);
        }

        let duals = dual_rows
            .into_iter()
            .map(|(name, row, sign)| (name.clone(), sign * solver.solution.z[row]))
            .collect();

        self.solved = Some(Solved {
            values,
            duals,
            objective: objective_sign * solver.solution.obj_val,
        });
        Ok(())
    }

    fn value(&self, variable: Variable) -> Result<f64, ProgramError> {
        let solved = self.solved.as_ref().ok_or(ProgramError::NotSolved)?;
        solved
            .values
            .get(variable.index())
            .copied()
            .ok_or(ProgramError::UnknownVariable(variable.index()))
    }

    fn dual(&self, constraint: &str) -> Result<f64, ProgramError> {
        let solved = self.solved.as_ref().ok_or(ProgramError::NotSolved)?;
        solved
            .duals
            .get(constraint)
            .copied()
            .ok_or_else(|| ProgramError::UnknownConstraint(constraint.to_owned()))
    }

    fn objective_value(&self) -> Result<f64, ProgramError> {
        self.solved
            .as_ref()
            .map(|s| s.objective)
            .ok_or(ProgramError::NotSolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_before_solving_is_an_invalid_state() {
        let mut program = ClarabelProgram::default();
        let x = program.add_variable("x", 0.0, 1.0);
        assert!(matches!(program.value(x), Err(ProgramError::NotSolved)));
        assert!(matches!(
            program.objective_value(),
            Err(ProgramError::NotSolved)
        ));
    }

    #[test]
    fn solves_a_two_variable_lp() {
        // max x + 2y s.t. x + y <= 1, 0 <= x,y <= 1  ==>  y = 1, x = 0.
        let mut program = ClarabelProgram::default();
        let x = program.add_variable("x", 0.0, 1.0);
        let y = program.add_variable("y", 0.0, 1.0);
        let mut row = LinExpr::term(x, 1.0);
        row.add_term(y, 1.0);
        program.add_constraint("budget", row, Sense::Le, 1.0);
        let mut objective = LinExpr::term(x, 1.0);
        objective.add_term(y, 2.0);
        program.set_objective(objective, Direction::Maximize);

        program.optimize().unwrap();
        assert!((program.value(y).unwrap() - 1.0).abs() < 1e-6);
        assert!(program.value(x).unwrap().abs() < 1e-6);
        assert!((program.objective_value().unwrap() - 2.0).abs() < 1e-6);
        // The budget constraint binds with shadow price 2 (the marginal
        // unit would go to y).
        assert!((program.dual("budget").unwrap() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn infeasibility_is_distinct_from_not_solved() {
        let mut program = ClarabelProgram::default();
        let x = program.add_variable("x", 0.0, 1.0);
        program.add_constraint("impossible", LinExpr::term(x, 1.0), Sense::Ge, 2.0);
        program.set_objective(LinExpr::term(x, 1.0), Direction::Maximize);
        assert!(matches!(
            program.optimize(),
            Err(ProgramError::Infeasible)
        ));
        assert!(matches!(program.value(x), Err(ProgramError::NotSolved)));
    }

    #[test]
    fn equality_constraints_pin_variables() {
        let mut program = ClarabelProgram::default();
        let x = program.add_variable("x", 0.0, 10.0);
        let y = program.add_variable("y", 0.0, 10.0);
        let mut sum = LinExpr::term(x, 1.0);
        sum.add_term(y, 1.0);
        program.add_constraint("total", sum, Sense::Eq, 4.0);
        program.set_objective(LinExpr::term(x, 1.0), Direction::Maximize);

        program.optimize().unwrap();
        assert!((program.value(x).unwrap() - 4.0).abs() < 1e-5);
        assert!(program.value(y).unwrap().abs() < 1e-5);
    }

    #[test]
    fn removing_a_constraint_changes_the_optimum() {
        let mut program = ClarabelProgram::default();
        let x = program.add_variable("x", 0.0, 5.0);
        program.add_constraint("cap", LinExpr::term(x, 1.0), Sense::Le, 1.0);
        program.set_objective(LinExpr::term(x, 1.0), Direction::Maximize);
        program.optimize().unwrap();
        assert!((program.objective_value().unwrap() - 1.0).abs() < 1e-6);

        program.remove_constraint("cap").unwrap();
        program.optimize().unwrap();
        assert!((program.objective_value().unwrap() - 5.0).abs() < 1e-6);

        assert!(matches!(
            program.remove_constraint("cap"),
            Err(ProgramError::UnknownConstraint(_))
        ));
    }

    #[test]
    fn minimization_duals_follow_their_own_sign_convention() {
        // min x s.t. x >= 2  ==>  x = 2, shadow price of the bound is 1:
        // relaxing the right-hand side by one unit lowers the optimum by 1.
        let mut program = ClarabelProgram::default();
        let x = program.add_variable("x", 0.0, f64::INFINITY);
        program.add_constraint("floor", LinExpr::term(x, 1.0), Sense::Ge, 2.0);
        program.set_objective(LinExpr::term(x, 1.0), Direction::Minimize);
        program.optimize().unwrap();
        assert!((program.value(x).unwrap() - 2.0).abs() < 1e-5);
        assert!((program.dual("floor").unwrap() - 1.0).abs() < 1e-5);
    }
}
