use crate::{BendersSolution, BendersSolver, MarginalGreedyApproximator};
use mua_core::Map;
use mua_core::models::{Agent, AgentId};
use mua_core::ports::{AuctionLog, MathProgram, ProgramError, SilentLog};
use std::marker::PhantomData;

/// The truthful multi-unit auction: efficient allocation via the Benders
/// decomposition, payments via marginal-economy comparisons.
///
/// Pricing agent `i` requires the full-economy solve plus one solve with
/// `i` excluded, `n + 1` independent decompositions in total. Each
/// sub-solve owns a fresh LP and approximator and logs into a silent sink
/// so the marginal economies do not interleave output with the main run.
pub struct VcgAuction<'a, P, L> {
    supply: u32,
    agents: Vec<&'a Agent>,
    log: L,
    _program: PhantomData<P>,
}

/// The outcome of a VCG run.
#[derive(Debug, Clone)]
pub struct VcgOutcome {
    /// The full-economy decomposition, with each retained assignment
    /// annotated with its agent's expected VCG price.
    pub solution: BendersSolution,
    /// Expected payment per agent.
    pub expected_prices: Map<AgentId, f64>,
    /// False when the full solve or any marginal-economy solve hit the
    /// iteration cap; prices are then approximate and must not be assumed
    /// tight.
    pub converged: bool,
}

impl<'a, P, L> VcgAuction<'a, P, L>
where
    P: MathProgram,
    L: AuctionLog,
{
    /// Creates an auction over the given economy.
    pub fn new(supply: u32, agents: impl IntoIterator<Item = &'a Agent>, log: L) -> Self {
        Self {
            supply,
            agents: agents.into_iter().collect(),
            log,
            _program: PhantomData,
        }
    }

    /// Runs the full economy and every marginal economy, returning the
    /// allocation lottery and the expected VCG price per agent.
    pub fn run(&self) -> Result<VcgOutcome, ProgramError> {
        let mut solution = self.solve_economy(self.agents.iter().copied(), &self.log)?;
        let mut converged = solution.converged;
        let mut expected_prices = Map::default();

        for &agent in &self.agents {
            let marginal = self.solve_economy(
                self.agents.iter().copied().filter(|a| a.id() != agent.id()),
                SilentLog,
            )?;
            converged &= marginal.converged;

            // The negated master objective is the marginal economy's
            // optimal (scaled) welfare.
            let optimal_without_agent = -marginal.objective;
            let other_agents_valuations = solution.welfare_excluding(agent.id());
            let vcg_price = optimal_without_agent - other_agents_valuations;

            self.log.log(&format!(
                "marginal economy of agent {}: {:.4} - {:.4} = {:.4}",
                agent.id(),
                optimal_without_agent,
                other_agents_valuations,
                vcg_price
            ));
            expected_prices.insert(agent.id(), vcg_price);
        }

        for allocation in solution.allocations.values_mut() {
            for assignment in allocation.assignments.iter_mut() {
                assignment.vcg_price = expected_prices.get(&assignment.agent).copied();
            }
        }

        for (agent, price) in &expected_prices {
            self.log
                .log(&format!("agent {agent} has expected VCG price {price:.4}"));
        }

        Ok(VcgOutcome {
            solution,
            expected_prices,
            converged,
        })
    }

    fn solve_economy(
        &self,
        agents: impl IntoIterator<Item = &'a Agent> + Clone,
        log: impl AuctionLog,
    ) -> Result<BendersSolution, ProgramError> {
        let approximator =
            MarginalGreedyApproximator::new(self.supply, agents.clone(), &log);
        BendersSolver::<P, _, _>::new(self.supply, agents, approximator, &log).solve()
    }
}
