use crate::Approximator;
use mua_core::models::{Agent, AgentId, Allocation};
use mua_core::ports::{
    AuctionLog, Direction, LinExpr, MathProgram, ProgramError, Sense, Variable,
};
use mua_core::{EPSILON, Map};

/// Cut generation aborts after this many iterations; the result is then
/// tagged as unconverged rather than treated as an error.
const MAX_ITERATIONS: u32 = 100;

/// Interior-point duals are never exactly zero; below this magnitude a
/// cut counts as slack and is dropped. Distinct from the convergence
/// tolerance, which is caller-tunable.
const DUAL_ZERO: f64 = 1e-9;

/// The name of the cut for the trivial empty allocation. It is registered
/// at construction and survives every dropping pass.
const EMPTY_CUT: &str = "X0";

/// The Benders master-problem solver.
///
/// Maintains a growing LP over one (non-positive) price variable and one
/// (non-positive) utility variable per agent, alternating between solving
/// the master and invoking the separation oracle, adding one cut per round
/// until the oracle's best response no longer improves on the master's
/// bound. On convergence the duals of the retained cuts are the lottery
/// probabilities of their allocations.
///
/// Each solver exclusively owns its LP instance; a marginal-economy
/// sub-solve constructs a fresh solver rather than reusing this one.
pub struct BendersSolver<P, A, L> {
    program: P,
    approximator: A,
    log: L,
    epsilon: f64,
    b: Vec<f64>,
    z: Variable,
    price_var: Variable,
    utility_vars: Map<AgentId, Variable>,
    allocations: Map<String, Allocation>,
    iterations: u32,
    converged: bool,
}

/// The converged (or aborted) state of one decomposition run.
#[derive(Debug, Clone)]
pub struct BendersSolution {
    /// The retained allocations, keyed by their cut names. Probabilities
    /// are determined. Always contains the empty allocation under "X0".
    pub allocations: Map<String, Allocation>,
    /// The final per-item price (non-negative).
    pub price: f64,
    /// The final per-agent utilities (non-negative).
    pub utilities: Map<AgentId, f64>,
    /// The final master objective `z` (non-positive; its negation is the
    /// optimal scaled welfare).
    pub objective: f64,
    /// Rounds of cut generation performed.
    pub iterations: u32,
    /// Whether the φ-test passed before the iteration cap. When false the
    /// allocation and prices are approximate and VCG prices derived from
    /// them must not be assumed tight.
    pub converged: bool,
}

impl BendersSolution {
    /// The expected social welfare of the final lottery over allocations.
    pub fn welfare(&self) -> f64 {
        self.allocations
            .values()
            .map(Allocation::expected_welfare)
            .sum()
    }

    /// The probability-weighted welfare of everyone except `agent`.
    pub fn welfare_excluding(&self, agent: AgentId) -> f64 {
        self.allocations
            .values()
            .map(|a| a.expected_welfare_excluding(agent))
            .sum()
    }
}

impl<P, A, L> BendersSolver<P, A, L>
where
    P: MathProgram,
    A: Approximator,
    L: AuctionLog,
{
    /// Sets up the initial master problem for the given economy.
    ///
    /// The LP starts with the objective variable, the price and utility
    /// variables (upper-bounded at zero: the LP works with negated
    /// prices/utilities so that the objective is a maximization), and the
    /// cut for the empty allocation.
    pub fn new<'a>(
        supply: u32,
        agents: impl IntoIterator<Item = &'a Agent>,
        approximator: A,
        log: L,
    ) -> Self {
        let agents: Vec<&'a Agent> = agents.into_iter().collect();
        let mut program = P::default();

        let z = program.add_variable("z", f64::NEG_INFINITY, f64::INFINITY);
        let price_var = program.add_variable("price", f64::NEG_INFINITY, 0.0);
        let utility_vars: Map<AgentId, Variable> = agents
            .iter()
            .map(|agent| {
                (
                    agent.id(),
                    program.add_variable(format!("u_{}", agent.id()), f64::NEG_INFINITY, 0.0),
                )
            })
            .collect();

        // b = (1/gap, ..., 1/gap, supply/gap), aligned with the utility
        // variables followed by the price variable.
        let gap = approximator.gap();
        let mut b = vec![1.0 / gap; agents.len()];
        b.push(supply as f64 / gap);

        let mut solver = Self {
            program,
            approximator,
            log,
            epsilon: EPSILON,
            b,
            z,
            price_var,
            utility_vars,
            allocations: Map::default(),
            iterations: 0,
            converged: false,
        };

        // z <= b·w is the cut generated by the empty allocation.
        let mut cut = LinExpr::term(solver.z, 1.0);
        solver.weighted_variables(&mut cut, -1.0);
        solver
            .program
            .add_constraint(EMPTY_CUT, cut, Sense::Le, 0.0);
        solver
            .allocations
            .insert(EMPTY_CUT.to_owned(), Allocation::empty());

        solver
            .program
            .set_objective(LinExpr::term(solver.z, 1.0), Direction::Maximize);

        solver
    }

    /// Overrides the convergence tolerance (default [`EPSILON`]).
    ///
    /// Must be small relative to the valuation magnitudes: too large ends
    /// iteration prematurely, too small can make cut generation cycle on
    /// floating-point noise.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Adds `scale * b_i * variable_i` over the utility and price
    /// variables to `expr`.
    fn weighted_variables(&self, expr: &mut LinExpr, scale: f64) {
        for (variable, coefficient) in self
            .utility_vars
            .values()
            .copied()
            .chain(std::iter::once(self.price_var))
            .zip(&self.b)
        {
            expr.add_term(variable, scale * coefficient);
        }
    }

    /// The current per-item price, negated back into non-negative terms.
    pub fn price(&self) -> Result<f64, ProgramError> {
        Ok(self.program.value(self.price_var)?.abs())
    }

    /// The current per-agent utilities, negated back into non-negative
    /// terms.
    pub fn utilities(&self) -> Result<Map<AgentId, f64>, ProgramError> {
        self.utility_vars
            .iter()
            .map(|(&id, &variable)| Ok((id, self.program.value(variable)?.abs())))
            .collect()
    }

    /// Runs one round of cut generation.
    ///
    /// Returns `Ok(true)` while the master bound and the oracle's best
    /// response still disagree by more than the tolerance; `Ok(false)`
    /// once converged or after the iteration cap.
    pub fn iterate(&mut self) -> Result<bool, ProgramError> {
        self.program.optimize()?;

        let price = self.price()?;
        let utilities = self.utilities()?;
        self.log.log(&format!(
            "iteration {}: price={:.4}, z={:.4}",
            self.iterations + 1,
            price,
            self.program.value(self.z)?
        ));

        let allocation = self.approximator.approximate(price, &utilities);

        // φ is the candidate cut's right-hand side evaluated at the
        // current master solution, over the raw (non-positive) variables.
        let mut phi = 0.0;
        for (variable, coefficient) in self
            .utility_vars
            .values()
            .copied()
            .chain(std::iter::once(self.price_var))
            .zip(&self.b)
        {
            phi += coefficient * self.program.value(variable)?;
        }
        for assignment in &allocation.assignments {
            let utility_var = self.utility_vars[&assignment.agent];
            phi -= assignment.value
                + self.program.value(utility_var)?
                + assignment.quantity * self.program.value(self.price_var)?;
        }

        let objective = self.program.value(self.z)?;
        self.iterations += 1;

        if (phi - objective).abs() < self.epsilon {
            self.converged = true;
            self.determine_probabilities()?;
            return Ok(false);
        }
        if self.iterations >= MAX_ITERATIONS {
            self.log.log(&format!(
                "aborting after {} iterations without convergence",
                self.iterations
            ));
            self.converged = false;
            self.determine_probabilities()?;
            return Ok(false);
        }

        self.add_benders_cut(allocation);
        Ok(true)
    }

    /// Adds the cut `z <= Σ b_i w_i − (c + Σ_a (u_a + q_a · price))` for a
    /// candidate allocation and registers the allocation under the cut's
    /// name.
    fn add_benders_cut(&mut self, allocation: Allocation) {
        // The iteration counter never resets, so names stay unique even
        // after slack cuts have been dropped from the registry.
        let name = format!("X{}", self.iterations);

        let mut cut = LinExpr::term(self.z, 1.0);
        self.weighted_variables(&mut cut, -1.0);
        let mut rhs = 0.0;
        for assignment in &allocation.assignments {
            cut.add_term(self.utility_vars[&assignment.agent], 1.0);
            cut.add_term(self.price_var, assignment.quantity);
            rhs -= assignment.value;
        }

        self.log.log(&format!("adding cut {name}"));
        self.program.add_constraint(&*name, cut, Sense::Le, rhs);
        self.allocations.insert(name, allocation);
    }

    /// Reads the cut duals back as allocation probabilities, dropping
    /// slack (zero-dual) cuts from both the LP and the registry.
    ///
    /// The empty allocation always stays registered, whatever its dual.
    fn determine_probabilities(&mut self) -> Result<(), ProgramError> {
        let mut dropped = Vec::new();
        for (name, allocation) in self.allocations.iter_mut() {
            let dual = self.program.dual(name)?;
            if dual.abs() <= DUAL_ZERO && name != EMPTY_CUT {
                dropped.push(name.clone());
            } else {
                allocation.probability = Some(dual);
            }
        }
        for name in dropped {
            self.program.remove_constraint(&name)?;
            self.allocations.shift_remove(&name);
        }
        Ok(())
    }

    /// Runs cut generation to completion and returns the final state.
    ///
    /// Calling this again on an already-converged solver re-verifies
    /// convergence and returns an identical solution.
    pub fn solve(&mut self) -> Result<BendersSolution, ProgramError> {
        while self.iterate()? {}

        let solution = BendersSolution {
            allocations: self.allocations.clone(),
            price: self.price()?,
            utilities: self.utilities()?,
            objective: self.program.value(self.z)?,
            iterations: self.iterations,
            converged: self.converged,
        };

        for (name, allocation) in &solution.allocations {
            if let Some(probability) = allocation.probability {
                if probability > DUAL_ZERO {
                    self.log.log(&format!(
                        "{name} drawn with probability {probability:.4} (welfare {:.4})",
                        allocation.welfare()
                    ));
                }
            }
        }

        Ok(solution)
    }
}
