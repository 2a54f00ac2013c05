use mua_core::models::{Agent, Allocation, Assignment};
use mua_core::ports::{Direction, LinExpr, MathProgram, ProgramError, Sense};
use std::marker::PhantomData;

/// The straightforward welfare-maximization LP, used to cross-check the
/// decomposition.
///
/// One variable `x_{i,j} ∈ [0,1]` per agent `i` and quantity `j`, a
/// convexity row per agent and a supply row, all scaled by the same gap
/// the decomposition applies to its right-hand side, so that the two
/// optimal objectives are directly comparable.
pub struct DirectSolver<P> {
    _program: PhantomData<P>,
}

impl<P: MathProgram> DirectSolver<P> {
    /// Solves the scaled welfare LP and returns its optimum.
    ///
    /// `gap` of 1.0 yields the plain LP relaxation of the assignment
    /// problem; the decomposition's results compare against `gap` 2.0.
    pub fn solve<'a>(
        supply: u32,
        agents: impl IntoIterator<Item = &'a Agent>,
        gap: f64,
    ) -> Result<(f64, Allocation), ProgramError> {
        let agents: Vec<&Agent> = agents.into_iter().collect();
        let mut program = P::default();

        let mut variables = Vec::new();
        let mut objective = LinExpr::new();
        let mut supply_row = LinExpr::new();

        for agent in &agents {
            let mut convexity = LinExpr::new();
            for quantity in 1..=supply {
                let x = program.add_variable(
                    format!("x_{}_{}", agent.id(), quantity),
                    0.0,
                    1.0,
                );
                convexity.add_term(x, 1.0);
                supply_row.add_term(x, quantity as f64);
                if let Ok(valuation) = agent.query_value(quantity) {
                    objective.add_term(x, valuation.value);
                }
                variables.push((x, agent.id(), quantity));
            }
            program.add_constraint(
                format!("one_{}", agent.id()),
                convexity,
                Sense::Le,
                1.0 / gap,
            );
        }
        program.add_constraint("supply", supply_row, Sense::Le, supply as f64 / gap);
        program.set_objective(objective, Direction::Maximize);

        program.optimize()?;

        let mut assignments = Vec::new();
        for (x, agent_id, quantity) in variables {
            let weight = program.value(x)?;
            if weight > 1e-6 {
                let value = agents
                    .iter()
                    .find(|a| a.id() == agent_id)
                    .and_then(|a| a.query_value(quantity).ok())
                    .map_or(0.0, |v| v.value);
                assignments.push(Assignment::new(
                    weight * quantity as f64,
                    agent_id,
                    weight * value,
                ));
            }
        }

        Ok((program.objective_value()?, Allocation::new(assignments)))
    }
}
