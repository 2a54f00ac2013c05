use mua_core::models::{Agent, AgentId, Assignment, Valuation};
use mua_core::ports::AuctionLog;
use mua_core::{Map, Set};

/// Heuristic price discovery by tâtonnement.
///
/// Raises a single scalar price in fixed steps, querying every agent's
/// demand correspondence at each price, and stops once aggregate demand
/// falls to or below the supply. The boundary step is split fractionally
/// between the agents whose demand just became non-binding. No VCG price
/// guarantee; this is an experimental alternative to the LP-based solver.
pub struct AscendingAuction<'a, L> {
    supply: u32,
    agents: Vec<&'a Agent>,
    log: L,
    step_size: f64,
}

/// The terminal state of an ascending run.
#[derive(Debug, Clone)]
pub struct AscendingOutcome {
    /// The boundary price: the last price at which demand still covered
    /// the supply.
    pub price: f64,
    /// Fractionally mixed assignments at the boundary price.
    pub assignments: Vec<Assignment>,
    /// Total realized value of the assignments.
    pub welfare: f64,
}

struct DemandProfile {
    demands: Map<AgentId, Vec<Valuation>>,
    total: f64,
    mix: f64,
}

impl<'a, L: AuctionLog> AscendingAuction<'a, L> {
    /// Creates an ascending auction with the default price step of 0.05.
    pub fn new(supply: u32, agents: impl IntoIterator<Item = &'a Agent>, log: L) -> Self {
        Self {
            supply,
            agents: agents.into_iter().collect(),
            log,
            step_size: 0.05,
        }
    }

    /// Overrides the price increment.
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Raises the price until aggregate demand no longer exceeds supply,
    /// then splits the boundary step fractionally.
    pub fn run(&self) -> AscendingOutcome {
        let supply = self.supply as f64;

        let mut price = 0.0;
        let profile = loop {
            price += self.step_size;
            let profile = self.demands_at(price, &self.agents);
            self.log
                .log(&format!("p={price:.2}: D(p)={:.3}", profile.total));
            if profile.total < supply {
                break profile;
            }
        };

        // Agents still demanding at the clearing price keep their bundles;
        // the ones that just dropped out share whatever remains of the
        // supply at the boundary price.
        let (non_marginal, marginal): (Vec<&Agent>, Vec<&Agent>) = self
            .agents
            .iter()
            .copied()
            .partition(|agent| !profile.demands[&agent.id()].is_empty());

        let boundary = price - self.step_size;
        let retained = self.demands_at(boundary, &non_marginal);
        let dropped = self.demands_at(boundary, &marginal);

        let coefficient = if dropped.total > 0.0 {
            ((supply - retained.total) / dropped.total).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.log.log(&format!(
            "boundary p={boundary:.2}: non-marginal demand {:.3}, marginal share {coefficient:.3}",
            retained.total
        ));

        let mut assignments = Vec::new();
        for &agent in &self.agents {
            let (profile, scale) = if retained.demands.contains_key(&agent.id()) {
                (&retained, 1.0)
            } else {
                (&dropped, coefficient)
            };
            if let Some(assignment) = self.mixed_assignment(agent, profile, scale) {
                self.log.log(&format!(
                    "agent {} receives {:.3} item(s) worth {:.3}",
                    assignment.agent, assignment.quantity, assignment.value
                ));
                assignments.push(assignment);
            }
        }

        let welfare = assignments.iter().map(|a| a.value).sum();
        AscendingOutcome {
            price: boundary,
            assignments,
            welfare,
        }
    }

    /// Queries every agent's demand correspondence at `price` and
    /// aggregates it into a single demand figure.
    ///
    /// When mixing the smallest and largest demanded bundles can exactly
    /// absorb the supply, the aggregate reflects that mix; otherwise every
    /// agent is counted at its smallest demanded bundle.
    fn demands_at(&self, price: f64, agents: &[&Agent]) -> DemandProfile {
        let mut demands: Map<AgentId, Vec<Valuation>> = Map::default();
        let mut smallest: Map<AgentId, f64> = Map::default();
        let mut largest: Map<AgentId, f64> = Map::default();

        for agent in agents {
            let set = agent.query_demand_set(price, self.supply);
            let (lo, hi) = set.iter().fold((f64::INFINITY, 0.0f64), |(lo, hi), v| {
                (lo.min(v.quantity as f64), hi.max(v.quantity as f64))
            });
            smallest.insert(agent.id(), if set.is_empty() { 0.0 } else { lo });
            largest.insert(agent.id(), hi);
            demands.insert(agent.id(), set);
        }

        let sum_largest: f64 = largest.values().sum();
        let sum_difference: f64 = agents
            .iter()
            .map(|a| smallest[&a.id()] - largest[&a.id()])
            .sum();
        let mix = if sum_difference != 0.0 {
            ((self.supply as f64 - sum_largest) / sum_difference).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let total = if mix < 1.0 {
            agents
                .iter()
                .map(|a| smallest[&a.id()] * mix + largest[&a.id()] * (1.0 - mix))
                .sum()
        } else {
            smallest.values().sum()
        };

        DemandProfile {
            demands,
            total,
            mix,
        }
    }

    /// Mixes an agent's smallest and largest demanded bundles by the
    /// profile's coefficient, scaled by the agent's share of the supply.
    ///
    /// Values are read through a projection restricted to the demanded
    /// quantities, so quantities the agent no longer demands contribute
    /// nothing.
    fn mixed_assignment(
        &self,
        agent: &Agent,
        profile: &DemandProfile,
        scale: f64,
    ) -> Option<Assignment> {
        let demanded = &profile.demands[&agent.id()];
        let min = demanded.iter().min_by_key(|v| v.quantity)?;
        let max = demanded.iter().max_by_key(|v| v.quantity)?;

        let relevant: Set<u32> = demanded.iter().map(|v| v.quantity).collect();
        let view = agent.restricted(&relevant);
        let value_of = |quantity: u32| view.query_value(quantity).map_or(0.0, |v| v.value);

        let quantity =
            (min.quantity as f64 * profile.mix + max.quantity as f64 * (1.0 - profile.mix)) * scale;
        let value =
            (value_of(min.quantity) * profile.mix + value_of(max.quantity) * (1.0 - profile.mix))
                * scale;

        (quantity > 0.0).then(|| Assignment::new(quantity, agent.id(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mua_core::models::{AgentId, Valuation};
    use mua_core::ports::SilentLog;

    #[test]
    fn stops_once_demand_fits_supply() {
        let agents = vec![
            Agent::new(
                AgentId::from(1),
                vec![
                    Valuation::new(1, 6.0),
                    Valuation::new(2, 6.0),
                    Valuation::new(3, 6.0),
                    Valuation::new(4, 9.0),
                ],
            ),
            Agent::new(
                AgentId::from(2),
                vec![
                    Valuation::new(1, 1.0),
                    Valuation::new(2, 4.0),
                    Valuation::new(3, 4.0),
                    Valuation::new(4, 6.0),
                ],
            ),
        ];
        let auction = AscendingAuction::new(4, &agents, SilentLog);
        let outcome = auction.run();

        assert!(outcome.price >= 0.0);
        let assigned: f64 = outcome.assignments.iter().map(|a| a.quantity).sum();
        assert!(assigned <= 4.0 + 1e-9);
        assert!(outcome.welfare >= 0.0);
    }

    #[test]
    fn single_agent_eventually_clears() {
        let agents = vec![Agent::new(
            AgentId::from(1),
            vec![Valuation::new(1, 2.0), Valuation::new(2, 2.0)],
        )];
        let auction = AscendingAuction::new(2, &agents, SilentLog);
        let outcome = auction.run();
        let assigned: f64 = outcome.assignments.iter().map(|a| a.quantity).sum();
        assert!(assigned <= 2.0 + 1e-9);
    }
}
