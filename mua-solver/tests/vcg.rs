use approx::assert_abs_diff_eq;
use mua_core::models::{Agent, AgentId, Valuation};
use mua_core::ports::SilentLog;
use mua_solver::clarabel::ClarabelProgram;
use mua_solver::{VcgAuction, VcgOutcome};
use rstest::*;

fn agent(id: u32, values: &[f64]) -> Agent {
    Agent::new(
        AgentId::from(id),
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Valuation::new(i as u32 + 1, v))
            .collect(),
    )
}

#[fixture]
fn paper_agents() -> Vec<Agent> {
    vec![
        agent(1, &[10.0, 10.0, 10.0, 10.0]),
        agent(2, &[10.0, 10.0, 10.0, 12.0]),
        agent(3, &[10.0, 13.0, 14.0, 15.0]),
    ]
}

fn run_auction(supply: u32, agents: &[Agent]) -> VcgOutcome {
    VcgAuction::<ClarabelProgram, _>::new(supply, agents, SilentLog)
        .run()
        .expect("auction runs")
}

#[rstest]
fn paper_scenario_prices_are_individually_rational(paper_agents: Vec<Agent>) {
    let outcome = run_auction(4, &paper_agents);
    assert!(outcome.converged);

    for agent in &paper_agents {
        let price = outcome.expected_prices[&agent.id()];
        let own_maximum = agent.query_value(4).unwrap().value;
        // Payments are non-negative and never exceed the bidder's own
        // value for the full bundle.
        assert!(price >= -5e-2, "agent {} pays {price}", agent.id());
        assert!(price <= own_maximum + 5e-2);
    }
}

#[rstest]
fn assignments_carry_their_vcg_prices(paper_agents: Vec<Agent>) {
    let outcome = run_auction(4, &paper_agents);
    for allocation in outcome.solution.allocations.values() {
        for assignment in &allocation.assignments {
            assert_eq!(
                assignment.vcg_price,
                outcome.expected_prices.get(&assignment.agent).copied()
            );
        }
    }
}

#[rstest]
fn worthless_agents_pay_nothing_and_change_nothing(paper_agents: Vec<Agent>) {
    let baseline = run_auction(4, &paper_agents);

    let mut extended = paper_agents.clone();
    extended.push(agent(4, &[0.0, 0.0, 0.0, 0.0]));
    let outcome = run_auction(4, &extended);

    // A bidder that values nothing pays nothing...
    assert_abs_diff_eq!(
        outcome.expected_prices[&AgentId::from(4)],
        0.0,
        epsilon = 5e-2
    );
    // ...and its presence leaves everyone else's price alone.
    for agent in &paper_agents {
        assert_abs_diff_eq!(
            outcome.expected_prices[&agent.id()],
            baseline.expected_prices[&agent.id()],
            epsilon = 5e-2
        );
    }
}

#[rstest]
fn full_and_marginal_welfare_are_consistent(paper_agents: Vec<Agent>) {
    let outcome = run_auction(4, &paper_agents);
    assert!(outcome.converged);

    // Removing an agent from the lottery never increases welfare, so each
    // payment (marginal optimum minus the others' share) stays below the
    // marginal economy's whole welfare.
    let full = outcome.solution.welfare();
    for agent in &paper_agents {
        let others = outcome.solution.welfare_excluding(agent.id());
        assert!(others <= full + 1e-6);
        assert!(outcome.expected_prices[&agent.id()] <= full + 5e-2);
    }
}
