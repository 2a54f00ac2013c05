use mua_core::models::{Agent, AgentId, Valuation};
use mua_core::ports::{AuctionLog, Direction, LinExpr, MathProgram, ProgramError, Sense};
use mua_core::{EPSILON, Map};
use std::marker::PhantomData;

/// Price-ascent with a restricted primal LP at each step.
///
/// The price rises in fixed increments; at each price a restricted primal
/// over the currently demanded bundles is attempted. Agents whose demand
/// persists across the price and its epsilon-neighborhood are forced to
/// trade, as is the full supply once the price is positive. The first
/// feasible restricted primal ends the ascent with its objective as the
/// social welfare. Experimental variant; shares the agent contract with
/// the decomposition.
pub struct PrimalDualAuction<'a, P, L> {
    supply: u32,
    agents: Vec<&'a Agent>,
    log: L,
    step_size: f64,
    _program: PhantomData<P>,
}

impl<'a, P, L> PrimalDualAuction<'a, P, L>
where
    P: MathProgram,
    L: AuctionLog,
{
    /// Creates a primal-dual auction with the default price step of 0.1.
    pub fn new(supply: u32, agents: impl IntoIterator<Item = &'a Agent>, log: L) -> Self {
        Self {
            supply,
            agents: agents.into_iter().collect(),
            log,
            step_size: 0.1,
            _program: PhantomData,
        }
    }

    /// Raises the price until the restricted primal turns feasible and
    /// returns `(price, welfare)`.
    ///
    /// Fails with [`ProgramError::Infeasible`] if every agent drops out
    /// before a clearing price is found.
    pub fn run(&self) -> Result<(f64, f64), ProgramError> {
        let mut price = 0.0;
        loop {
            price += self.step_size;
            let demands = self.demand_sets(price);
            let demands_next = self.demand_sets(price + EPSILON);

            if demands.values().all(Vec::is_empty) && demands_next.values().all(Vec::is_empty) {
                // No demand left anywhere; there is no clearing price.
                return Err(ProgramError::Infeasible);
            }

            match self.solve_restricted_primal(&demands, &demands_next, price) {
                Ok(welfare) => {
                    self.log
                        .log(&format!("cleared at p={price:.2} with welfare {welfare:.4}"));
                    return Ok((price, welfare));
                }
                Err(ProgramError::Infeasible) => {
                    self.log.log(&format!("p={price:.2}: restricted primal infeasible"));
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn demand_sets(&self, price: f64) -> Map<AgentId, Vec<Valuation>> {
        self.agents
            .iter()
            .map(|agent| (agent.id(), agent.query_demand_set(price, self.supply)))
            .collect()
    }

    /// Builds and solves the restricted primal at one price step.
    ///
    /// One variable per agent/quantity pair; agents whose demand survives
    /// at `price` and just above it get an equality convexity row, the
    /// others an inequality; undemanded quantities are pinned to zero; the
    /// supply row is an equality once the price is positive.
    fn solve_restricted_primal(
        &self,
        demands: &Map<AgentId, Vec<Valuation>>,
        demands_next: &Map<AgentId, Vec<Valuation>>,
        price: f64,
    ) -> Result<f64, ProgramError> {
        let mut program = P::default();

        let mut allocation_vars = Map::default();
        for agent in &self.agents {
            for quantity in 1..=self.supply {
                let x = program.add_variable(
                    format!("x_{}_{}", agent.id(), quantity),
                    0.0,
                    1.0,
                );
                allocation_vars.insert((agent.id(), quantity), x);
            }
        }

        let mut supply_row = LinExpr::new();
        let mut objective = LinExpr::new();
        for agent in &self.agents {
            let id = agent.id();
            let convexity: LinExpr = (1..=self.supply)
                .map(|quantity| (allocation_vars[&(id, quantity)], 1.0))
                .collect();
            if !demands[&id].is_empty() && !demands_next[&id].is_empty() {
                program.add_constraint(format!("one_{id}_strict"), convexity, Sense::Eq, 1.0);
            } else {
                program.add_constraint(format!("one_{id}"), convexity, Sense::Le, 1.0);
            }

            for quantity in 1..=self.supply {
                let x = allocation_vars[&(id, quantity)];
                supply_row.add_term(x, quantity as f64);
                if !demands[&id].iter().any(|demand| demand.quantity == quantity) {
                    program.add_constraint(
                        format!("x_{id}_{quantity}_undemanded"),
                        LinExpr::term(x, 1.0),
                        Sense::Eq,
                        0.0,
                    );
                }
            }

            for valuation in agent.valuations() {
                if valuation.quantity <= self.supply {
                    objective
                        .add_term(allocation_vars[&(id, valuation.quantity)], valuation.value);
                }
            }
        }

        if price > 0.0 {
            program.add_constraint("supply_strict", supply_row, Sense::Eq, self.supply as f64);
        } else {
            program.add_constraint("supply", supply_row, Sense::Le, self.supply as f64);
        }

        program.set_objective(objective, Direction::Maximize);
        program.optimize()?;

        for agent in &self.agents {
            for quantity in 1..=self.supply {
                let trade = program.value(allocation_vars[&(agent.id(), quantity)])?;
                if trade > 1e-6 {
                    self.log.log(&format!(
                        "x_{}_{} = {trade:.4}",
                        agent.id(),
                        quantity
                    ));
                }
            }
        }

        program.objective_value()
    }
}
