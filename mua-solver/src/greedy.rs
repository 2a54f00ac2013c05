use mua_core::Map;
use mua_core::models::{Agent, AgentId, Allocation, Assignment};
use mua_core::ports::AuctionLog;

/// The separation oracle of the decomposition.
///
/// Given candidate prices and utilities from the master problem, an
/// approximator returns a best-response allocation whose implied welfare
/// is within a known ratio of the true Lagrangian optimum.
pub trait Approximator {
    /// The worst-case ratio between the true optimum and the welfare of
    /// the returned allocation. Scales the master LP's right-hand side.
    fn gap(&self) -> f64;

    /// Constructs a feasible allocation approximately maximizing the
    /// reduced social welfare `Σ (value − utility − price × quantity)`
    /// subject to the supply limit.
    ///
    /// The returned allocation has no probability yet; the master solver
    /// assigns one on convergence.
    fn approximate(&self, price: f64, utilities: &Map<AgentId, f64>) -> Allocation;
}

/// Marginal greedy approximator with an approximation ratio of 2.
///
/// Follows Lavi & Swamy: repeatedly award the agent with the highest
/// per-item marginal utility, growing the probed bundle size whenever no
/// single increment pays off, and finally compare against handing the
/// whole supply to one agent.
pub struct MarginalGreedyApproximator<'a, L> {
    supply: u32,
    agents: Vec<&'a Agent>,
    log: L,
}

impl<'a, L: AuctionLog> MarginalGreedyApproximator<'a, L> {
    /// Creates an approximator over the given economy.
    ///
    /// Agents are borrowed, not copied: a marginal economy is just the
    /// same agents minus one.
    pub fn new(supply: u32, agents: impl IntoIterator<Item = &'a Agent>, log: L) -> Self {
        Self {
            supply,
            agents: agents.into_iter().collect(),
            log,
        }
    }
}

impl<L: AuctionLog> Approximator for MarginalGreedyApproximator<'_, L> {
    fn gap(&self) -> f64 {
        2.0
    }

    fn approximate(&self, price: f64, utilities: &Map<AgentId, f64>) -> Allocation {
        let utility = |id: AgentId| utilities.get(&id).copied().unwrap_or(0.0);

        let mut owned: Map<AgentId, u32> = self.agents.iter().map(|a| (a.id(), 0)).collect();
        let mut gained: Map<AgentId, f64> = self.agents.iter().map(|a| (a.id(), 0.0)).collect();
        let mut left_supply = self.supply;
        let mut margin: u32 = 0;

        // Award one increment per round; widen the probed bundle when no
        // single increment pays off.
        while margin <= left_supply {
            let mut best: Option<(AgentId, f64, f64)> = None;
            for &agent in &self.agents {
                let id = agent.id();
                let quantity = owned[&id] + margin;
                if quantity == 0 {
                    continue;
                }
                let marginal_value = agent.marginal_value_query(margin, owned[&id]);
                let per_item =
                    (marginal_value - utility(id) - quantity as f64 * price) / quantity as f64;
                if per_item <= 0.0 {
                    continue;
                }
                // Ties go to the smallest agent id (the iteration order).
                if best.is_none_or(|(_, incumbent, _)| per_item > incumbent) {
                    best = Some((id, per_item, marginal_value));
                }
            }

            match best {
                Some((id, _, marginal_value)) => {
                    owned[&id] += margin;
                    gained[&id] += marginal_value;
                    left_supply -= margin;
                    margin = 0;
                }
                None => margin += 1,
            }
        }

        let mut assignments: Vec<Assignment> = owned
            .iter()
            .filter(|&(_, &quantity)| quantity > 0)
            .map(|(&id, &quantity)| Assignment::new(quantity as f64, id, gained[&id]))
            .collect();
        let mut reduced_welfare: f64 = assignments
            .iter()
            .map(|a| a.value - utility(a.agent) - a.quantity * price)
            .sum();

        // A single buyer taking the entire supply can beat the greedy
        // outcome by up to the approximation gap; check and substitute.
        for &agent in &self.agents {
            let Ok(valuation) = agent.query_value(self.supply) else {
                continue;
            };
            let reduced =
                valuation.value - utility(agent.id()) - self.supply as f64 * price;
            if reduced > reduced_welfare {
                reduced_welfare = reduced;
                assignments = vec![Assignment::new(
                    self.supply as f64,
                    agent.id(),
                    valuation.value,
                )];
            }
        }

        for assignment in &assignments {
            self.log.log(&format!(
                "agent {} receives {} item(s) (v={})",
                assignment.agent, assignment.quantity, assignment.value
            ));
        }

        Allocation::new(assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mua_core::models::Valuation;
    use mua_core::ports::SilentLog;

    fn agents() -> Vec<Agent> {
        vec![
            Agent::new(
                AgentId::from(1),
                vec![
                    Valuation::new(1, 10.0),
                    Valuation::new(2, 10.0),
                    Valuation::new(3, 10.0),
                    Valuation::new(4, 10.0),
                ],
            ),
            Agent::new(
                AgentId::from(2),
                vec![
                    Valuation::new(1, 10.0),
                    Valuation::new(2, 13.0),
                    Valuation::new(3, 14.0),
                    Valuation::new(4, 15.0),
                ],
            ),
        ]
    }

    fn zero_utilities(agents: &[Agent]) -> Map<AgentId, f64> {
        agents.iter().map(|a| (a.id(), 0.0)).collect()
    }

    #[test]
    fn never_exceeds_supply() {
        let agents = agents();
        for supply in 1..=6 {
            let greedy = MarginalGreedyApproximator::new(supply, &agents, SilentLog);
            for price in [0.0, 1.0, 2.5, 5.0] {
                let allocation = greedy.approximate(price, &zero_utilities(&agents));
                assert!(allocation.quantity_assigned() <= supply as f64);
            }
        }
    }

    #[test]
    fn free_items_go_to_the_highest_marginal_values() {
        let agents = agents();
        let greedy = MarginalGreedyApproximator::new(4, &agents, SilentLog);
        let allocation = greedy.approximate(0.0, &zero_utilities(&agents));
        // Both single units are worth 10; growing agent 2's bundle beats
        // stacking more on agent 1, whose marginal value vanishes.
        assert!(allocation.welfare() >= 20.0);
        assert!(allocation.quantity_assigned() <= 4.0);
    }

    #[test]
    fn probability_is_left_undetermined() {
        let agents = agents();
        let greedy = MarginalGreedyApproximator::new(4, &agents, SilentLog);
        let allocation = greedy.approximate(1.0, &zero_utilities(&agents));
        assert!(allocation.probability.is_none());
    }

    #[test]
    fn high_price_empties_the_allocation() {
        let agents = agents();
        let greedy = MarginalGreedyApproximator::new(4, &agents, SilentLog);
        let allocation = greedy.approximate(100.0, &zero_utilities(&agents));
        assert!(allocation.assignments.is_empty());
    }

    #[test]
    fn whole_supply_substitution_kicks_in() {
        // One agent with strong complementarities: only the full bundle
        // is worth anything, so unit-by-unit greedy finds nothing.
        let agents = vec![
            Agent::new(
                AgentId::from(1),
                vec![
                    Valuation::new(1, 0.0),
                    Valuation::new(2, 0.0),
                    Valuation::new(3, 3.0),
                ],
            ),
            Agent::new(
                AgentId::from(2),
                vec![
                    Valuation::new(1, 0.5),
                    Valuation::new(2, 0.5),
                    Valuation::new(3, 0.5),
                ],
            ),
        ];
        let greedy = MarginalGreedyApproximator::new(3, &agents, SilentLog);
        let allocation = greedy.approximate(0.0, &zero_utilities(&agents));
        assert_eq!(allocation.assignments.len(), 1);
        assert_eq!(allocation.assignments[0].agent, AgentId::from(1));
        assert_eq!(allocation.assignments[0].quantity, 3.0);
    }
}
