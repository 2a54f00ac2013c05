/// A handle to a decision variable created by a [`MathProgram`].
///
/// Handles are only meaningful for the program that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(pub(crate) usize);

impl Variable {
    /// Creates a handle from a raw column index.
    ///
    /// Implementations of [`MathProgram`] use this when issuing handles;
    /// there is no reason to call it from mechanism code.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// The raw column index of this variable.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A linear expression over decision variables.
///
/// Repeated terms for the same variable accumulate, so callers can build
/// expressions incrementally the way cut generation naturally produces
/// them.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    terms: Vec<(Variable, f64)>,
}

impl LinExpr {
    /// The empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// An expression with a single term.
    pub fn term(variable: Variable, coefficient: f64) -> Self {
        Self {
            terms: vec![(variable, coefficient)],
        }
    }

    /// Adds `coefficient * variable`, merging with an existing term for the
    /// same variable.
    pub fn add_term(&mut self, variable: Variable, coefficient: f64) -> &mut Self {
        if let Some((_, c)) = self.terms.iter_mut().find(|(v, _)| *v == variable) {
            *c += coefficient;
        } else {
            self.terms.push((variable, coefficient));
        }
        self
    }

    /// The accumulated `(variable, coefficient)` terms.
    pub fn terms(&self) -> &[(Variable, f64)] {
        &self.terms
    }
}

impl FromIterator<(Variable, f64)> for LinExpr {
    fn from_iter<I: IntoIterator<Item = (Variable, f64)>>(iter: I) -> Self {
        let mut expr = Self::new();
        for (variable, coefficient) in iter {
            expr.add_term(variable, coefficient);
        }
        expr
    }
}

/// The sense of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// Left-hand side at most the right-hand side.
    Le,
    /// Left-hand side equal to the right-hand side.
    Eq,
    /// Left-hand side at least the right-hand side.
    Ge,
}

/// The optimization direction of the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Maximize the objective expression.
    Maximize,
    /// Minimize the objective expression.
    Minimize,
}

/// Failures of the numerical optimization engine.
///
/// Reading a value before a successful solve is an invalid-state error,
/// deliberately distinct from infeasibility of the program itself.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// No successful solve has happened yet (or the model changed since).
    #[error("the program has no optimal solution to read yet")]
    NotSolved,
    /// The constraints admit no feasible point.
    #[error("the program is infeasible")]
    Infeasible,
    /// The objective is unbounded over the feasible region.
    #[error("the program is unbounded")]
    Unbounded,
    /// A variable handle that this program never issued.
    #[error("unknown variable index {0}")]
    UnknownVariable(usize),
    /// A constraint name that is not (or no longer) present.
    #[error("unknown constraint {0:?}")]
    UnknownConstraint(String),
    /// The engine gave up for numerical reasons.
    #[error("the solver failed numerically: {0}")]
    Numerical(String),
}

/// The narrow interface to the external numerical optimization engine.
///
/// Everything the decomposition needs from an LP solver: named bounded
/// variables, named linear constraints (removable by name), a linear
/// objective, and primal/dual value retrieval after a solve. The
/// mechanisms never depend on solver-specific tolerances beyond standard
/// LP optimality.
///
/// `Default` must produce an engine with reasonable quiet settings; the
/// mechanisms construct their own (exclusively owned) program instances
/// through it.
pub trait MathProgram: Default {
    /// The configuration type for this engine.
    type Settings: Default;

    /// Creates a fresh, empty program with the provided settings.
    fn new(settings: Self::Settings) -> Self;

    /// Creates a scalar decision variable with the given bounds.
    ///
    /// Infinite bounds leave the corresponding side unconstrained.
    fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> Variable;

    /// Adds a named linear constraint `expr <sense> rhs`.
    fn add_constraint(&mut self, name: impl Into<String>, expr: LinExpr, sense: Sense, rhs: f64);

    /// Removes a constraint by name.
    fn remove_constraint(&mut self, name: &str) -> Result<(), ProgramError>;

    /// Replaces the objective.
    fn set_objective(&mut self, expr: LinExpr, direction: Direction);

    /// Solves the current program.
    fn optimize(&mut self) -> Result<(), ProgramError>;

    /// The optimal value of a variable after a successful solve.
    fn value(&self, variable: Variable) -> Result<f64, ProgramError>;

    /// The dual value (shadow price) of a named constraint after a
    /// successful solve, in the sign convention of the declared objective
    /// direction.
    fn dual(&self, constraint: &str) -> Result<f64, ProgramError>;

    /// The optimal objective value after a successful solve.
    fn objective_value(&self) -> Result<f64, ProgramError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expressions_merge_repeated_terms() {
        let x = Variable::from_index(0);
        let y = Variable::from_index(1);
        let mut expr = LinExpr::term(x, 1.0);
        expr.add_term(y, -2.0).add_term(x, 0.5);
        assert_eq!(expr.terms(), &[(x, 1.5), (y, -2.0)]);
    }

    #[test]
    fn expressions_collect_from_iterators() {
        let x = Variable::from_index(0);
        let expr: LinExpr = [(x, 1.0), (x, 1.0)].into_iter().collect();
        assert_eq!(expr.terms(), &[(x, 2.0)]);
    }
}
