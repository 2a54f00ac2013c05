use super::AgentId;

/// A quantity of the good awarded to one agent within an allocation.
///
/// Quantities are real because the ascending mechanism mixes adjacent
/// bundles fractionally at the boundary price, and because the master LP's
/// final answer is a lottery over allocations.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assignment {
    /// The quantity assigned to the agent.
    pub quantity: f64,
    /// The receiving agent.
    pub agent: AgentId,
    /// The value the agent realizes for that quantity.
    pub value: f64,
    /// The agent's VCG payment for this assignment, once determined.
    pub vcg_price: Option<f64>,
}

impl Assignment {
    /// Creates an assignment with no payment attached yet.
    pub fn new(quantity: f64, agent: AgentId, value: f64) -> Self {
        Self {
            quantity,
            agent,
            value,
            vcg_price: None,
        }
    }
}

/// One feasible outcome of the auction: a set of assignments, plus the
/// weight this outcome carries in the master LP's optimal dual solution.
///
/// Allocations are the columns of the decomposition. They are created by
/// the separation oracle with `probability: None` and never mutated after
/// that, except for the late-stage probability assignment when the master
/// problem converges.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Allocation {
    /// The assignments making up this outcome.
    pub assignments: Vec<Assignment>,
    /// The lottery weight in `[0, 1]`, or `None` before determination.
    pub probability: Option<f64>,
}

impl Allocation {
    /// The trivial empty allocation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates an allocation whose probability is not yet determined.
    pub fn new(assignments: Vec<Assignment>) -> Self {
        Self {
            assignments,
            probability: None,
        }
    }

    /// Total quantity handed out by this allocation.
    pub fn quantity_assigned(&self) -> f64 {
        self.assignments.iter().map(|a| a.quantity).sum()
    }

    /// The social welfare of this allocation, ignoring its lottery weight.
    pub fn welfare(&self) -> f64 {
        self.assignments.iter().map(|a| a.value).sum()
    }

    /// The probability-weighted social welfare.
    ///
    /// Zero before the probability has been determined.
    pub fn expected_welfare(&self) -> f64 {
        self.probability.unwrap_or(0.0) * self.welfare()
    }

    /// The probability-weighted welfare of every assignment not belonging
    /// to `agent`.
    ///
    /// This is the marginal-welfare decomposition the VCG engine sums when
    /// pricing `agent`.
    pub fn expected_welfare_excluding(&self, agent: AgentId) -> f64 {
        self.probability.unwrap_or(0.0)
            * self
                .assignments
                .iter()
                .filter(|a| a.agent != agent)
                .map(|a| a.value)
                .sum::<f64>()
    }

    /// Whether `agent` receives a positive quantity here.
    pub fn includes(&self, agent: AgentId) -> bool {
        self.assignments.iter().any(|a| a.agent == agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lottery() -> Allocation {
        let mut allocation = Allocation::new(vec![
            Assignment::new(3.0, AgentId::from(1), 12.0),
            Assignment::new(1.0, AgentId::from(2), 5.0),
        ]);
        allocation.probability = Some(0.5);
        allocation
    }

    #[test]
    fn welfare_sums_assignment_values() {
        assert_eq!(lottery().welfare(), 17.0);
        assert_eq!(lottery().quantity_assigned(), 4.0);
    }

    #[test]
    fn expected_welfare_is_probability_weighted() {
        assert_eq!(lottery().expected_welfare(), 8.5);
        assert_eq!(Allocation::empty().expected_welfare(), 0.0);
    }

    #[test]
    fn excluding_an_agent_drops_only_its_assignments() {
        let allocation = lottery();
        assert_eq!(
            allocation.expected_welfare_excluding(AgentId::from(1)),
            2.5
        );
        assert_eq!(
            allocation.expected_welfare_excluding(AgentId::from(3)),
            allocation.expected_welfare()
        );
    }
}
