use super::{AgentId, AgentIdSource, Valuation, ValuationError};
use crate::{EPSILON, Set};
use rand::Rng;
use rand_distr::{Distribution, Exp};
use std::cell::Cell;

/// A bidder holding a finite valuation function over quantities of the good.
///
/// Agents are the valuation oracles of the simulation: mechanisms never see
/// the valuation set directly, they interrogate it through demand, value and
/// marginal-value queries. An agent is immutable for the duration of a
/// mechanism run; the ascending auction restricts one through a
/// [`DemandView`] rather than copying it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Agent {
    id: AgentId,
    valuations: Vec<Valuation>,
    #[serde(skip)]
    epsilon: Epsilon,
    #[serde(skip)]
    queries: Cell<u64>,
}

// Wrapper so that a deserialized agent picks up the default tolerance
// instead of serde's f64 default of 0.0.
#[derive(Debug, Clone, Copy)]
struct Epsilon(f64);

impl Default for Epsilon {
    fn default() -> Self {
        Self(EPSILON)
    }
}

impl Agent {
    /// Creates an agent from an explicit valuation list.
    ///
    /// The caller is responsible for id uniqueness (or should thread an
    /// [`AgentIdSource`] through scenario construction).
    pub fn new(id: AgentId, valuations: Vec<Valuation>) -> Self {
        Self {
            id,
            valuations,
            epsilon: Epsilon::default(),
            queries: Cell::new(0),
        }
    }

    /// Overrides the demand-query tolerance.
    ///
    /// Keep it small relative to the valuation magnitudes; see
    /// [`crate::EPSILON`].
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Epsilon(epsilon);
        self
    }

    /// Creates an agent with randomly generated valuations for quantities
    /// `1..=supply`.
    ///
    /// Values are built by repeated addition of independent exponential
    /// increments (mean 5.0), floored, so the sequence is non-decreasing by
    /// construction.
    pub fn randomized(id: AgentId, supply: u32, rng: &mut impl Rng) -> Self {
        let increments = Exp::new(0.2).expect("positive rate");
        let mut valuations = Vec::with_capacity(supply as usize);
        let mut value = 0.0f64;
        for quantity in 1..=supply {
            value = (value + increments.sample(rng)).floor();
            valuations.push(Valuation::new(quantity, value));
        }
        Self::new(id, valuations)
    }

    /// This agent's stable identifier.
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// The agent's full valuation list, in declaration order.
    pub fn valuations(&self) -> &[Valuation] {
        &self.valuations
    }

    /// The number of demand queries this agent has answered so far.
    pub fn queries_answered(&self) -> u64 {
        self.queries.get()
    }

    /// Returns the valuation maximizing this agent's utility at the given
    /// per-item price, restricted to quantities within `left_supply`.
    ///
    /// Candidates must clear `utility >= -epsilon`; ties are broken by the
    /// first valuation found in declaration order. Returns `None` when no
    /// feasible valuation clears the tolerance.
    pub fn query_demand(
        &self,
        price: f64,
        left_supply: u32,
        reservation: f64,
    ) -> Option<Valuation> {
        self.queries.set(self.queries.get() + 1);
        best_response(
            self.valuations.iter().copied(),
            price,
            left_supply,
            reservation,
            self.epsilon.0,
        )
    }

    /// Returns every valuation within epsilon of the maximal utility at
    /// `price` among quantities within `left_supply`.
    ///
    /// The ascending mechanism uses this to detect multi-valued demand
    /// correspondences at critical prices.
    pub fn query_demand_set(&self, price: f64, left_supply: u32) -> Vec<Valuation> {
        self.queries.set(self.queries.get() + 1);
        demand_correspondence(
            self.valuations.iter().copied(),
            price,
            left_supply,
            self.epsilon.0,
        )
    }

    /// Exact lookup of the value recorded for `quantity`.
    pub fn query_value(&self, quantity: u32) -> Result<Valuation, ValuationError> {
        self.valuations
            .iter()
            .find(|v| v.quantity == quantity)
            .copied()
            .ok_or(ValuationError::NotFound(quantity))
    }

    /// The incremental value of moving from `quantity_owned` to
    /// `quantity_owned + additional_quantity`.
    ///
    /// A quantity with no recorded valuation contributes 0 to its term, as
    /// does owning nothing.
    pub fn marginal_value_query(&self, additional_quantity: u32, quantity_owned: u32) -> f64 {
        let owned_value = if quantity_owned == 0 {
            0.0
        } else {
            self.query_value(quantity_owned).map_or(0.0, |v| v.value)
        };
        let combined_value = self
            .query_value(quantity_owned + additional_quantity)
            .map_or(0.0, |v| v.value);
        combined_value - owned_value
    }

    /// A read-only projection of this agent restricted to an allowed
    /// quantity set.
    ///
    /// Quantities outside the set keep their entry but answer queries with
    /// value 0, matching an agent that has lost all interest in them. The
    /// agent itself is never copied or mutated.
    pub fn restricted<'a>(&'a self, allowed: &'a Set<u32>) -> DemandView<'a> {
        DemandView {
            agent: self,
            allowed,
        }
    }
}

/// A read-only projection over an agent's valuation set.
///
/// Used by the ascending auction to model marginal economies without
/// duplicating agent identity or state.
#[derive(Debug, Clone, Copy)]
pub struct DemandView<'a> {
    agent: &'a Agent,
    allowed: &'a Set<u32>,
}

impl DemandView<'_> {
    /// The id of the underlying agent.
    pub fn id(&self) -> AgentId {
        self.agent.id
    }

    fn projected(&self) -> impl Iterator<Item = Valuation> + Clone + '_ {
        self.agent.valuations.iter().map(|v| {
            if self.allowed.contains(&v.quantity) {
                *v
            } else {
                Valuation {
                    quantity: v.quantity,
                    value: 0.0,
                }
            }
        })
    }

    /// As [`Agent::query_demand`], over the projected valuations.
    pub fn query_demand(
        &self,
        price: f64,
        left_supply: u32,
        reservation: f64,
    ) -> Option<Valuation> {
        best_response(
            self.projected(),
            price,
            left_supply,
            reservation,
            self.agent.epsilon.0,
        )
    }

    /// As [`Agent::query_demand_set`], over the projected valuations.
    pub fn query_demand_set(&self, price: f64, left_supply: u32) -> Vec<Valuation> {
        demand_correspondence(self.projected(), price, left_supply, self.agent.epsilon.0)
    }

    /// As [`Agent::query_value`], over the projected valuations.
    pub fn query_value(&self, quantity: u32) -> Result<Valuation, ValuationError> {
        self.projected()
            .find(|v| v.quantity == quantity)
            .ok_or(ValuationError::NotFound(quantity))
    }
}

fn best_response(
    valuations: impl Iterator<Item = Valuation>,
    price: f64,
    left_supply: u32,
    reservation: f64,
    epsilon: f64,
) -> Option<Valuation> {
    let mut best: Option<(Valuation, f64)> = None;
    for valuation in valuations {
        if valuation.quantity > left_supply {
            continue;
        }
        let utility = valuation.utility(price, reservation);
        if utility < -epsilon {
            continue;
        }
        match best {
            Some((_, best_utility)) if utility <= best_utility => {}
            _ => best = Some((valuation, utility)),
        }
    }
    best.map(|(valuation, _)| valuation)
}

fn demand_correspondence(
    valuations: impl Iterator<Item = Valuation> + Clone,
    price: f64,
    left_supply: u32,
    epsilon: f64,
) -> Vec<Valuation> {
    let feasible = valuations.filter(|v| v.quantity <= left_supply);
    let max_utility = feasible
        .clone()
        .map(|v| v.utility(price, 0.0))
        .fold(f64::NEG_INFINITY, f64::max);
    feasible
        .filter(|v| {
            let utility = v.utility(price, 0.0);
            utility + epsilon >= max_utility && utility + epsilon >= 0.0
        })
        .collect()
}

/// Generates `count` agents with randomized valuations for a supply, drawing
/// ids from the given source.
pub fn generate_randomized_agents(
    supply: u32,
    count: usize,
    ids: &mut AgentIdSource,
    rng: &mut impl Rng,
) -> Vec<Agent> {
    (0..count)
        .map(|_| Agent::randomized(ids.next_id(), supply, rng))
        .collect()
}
