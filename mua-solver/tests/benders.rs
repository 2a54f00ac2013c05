use approx::assert_abs_diff_eq;
use mua_core::models::{Agent, AgentId, Valuation};
use mua_core::ports::SilentLog;
use mua_solver::clarabel::ClarabelProgram;
use mua_solver::{BendersSolution, BendersSolver, DirectSolver, MarginalGreedyApproximator};
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

fn solve(supply: u32, agents: &[Agent]) -> BendersSolution {
    let approximator = MarginalGreedyApproximator::new(supply, agents, SilentLog);
    BendersSolver::<ClarabelProgram, _, _>::new(supply, agents, approximator, SilentLog)
        .solve()
        .expect("decomposition solves")
}

/// The three-agent economy from the reference scenario: supply 4, one flat
/// bidder, one with a jump at the full bundle, one with strong early
/// marginal values.
#[fixture]
fn paper_agents() -> Vec<Agent> {
    vec![
        agent(1, &[10.0, 10.0, 10.0, 10.0]),
        agent(2, &[10.0, 10.0, 10.0, 12.0]),
        agent(3, &[10.0, 13.0, 14.0, 15.0]),
    ]
}

#[test]
fn single_agent_gets_the_full_supply() {
    // With one strictly increasing bidder and enough supply, the scaled
    // optimum is the full-bundle value over the approximation gap.
    let agents = vec![agent(1, &[5.0, 8.0, 10.0, 11.0])];
    let solution = solve(4, &agents);

    assert!(solution.converged);
    assert_abs_diff_eq!(-solution.objective, 5.5, epsilon = 1e-2);
    assert_abs_diff_eq!(solution.welfare(), 5.5, epsilon = 1e-2);

    let (direct, _) = DirectSolver::<ClarabelProgram>::solve(4, &agents, 2.0)
        .expect("direct LP solves");
    assert_abs_diff_eq!(solution.welfare(), direct, epsilon = 1e-2);
}

#[test]
fn disjoint_demands_match_exhaustive_search() {
    // Each agent values exactly one bundle, and all three bundles fit the
    // supply together, so the fractional optimum is integral and an
    // exhaustive search over the valuation sets is exact.
    let agents = vec![
        Agent::new(AgentId::from(1), vec![Valuation::new(1, 12.0)]),
        Agent::new(AgentId::from(2), vec![Valuation::new(2, 16.0)]),
        Agent::new(AgentId::from(3), vec![Valuation::new(1, 6.0)]),
    ];
    let supply = 4;

    let best = exhaustive_welfare(supply, &agents);
    assert_abs_diff_eq!(best, 34.0, epsilon = 1e-9);

    let solution = solve(supply, &agents);
    assert!(solution.converged);
    // The master works in the gap-scaled economy.
    assert_abs_diff_eq!(solution.welfare() * 2.0, best, epsilon = 5e-2);
}

/// Brute-force welfare over every choice of one-valuation-or-nothing per
/// agent subject to the supply limit.
fn exhaustive_welfare(supply: u32, agents: &[Agent]) -> f64 {
    fn recurse(supply_left: u32, agents: &[Agent], acc: f64, best: &mut f64) {
        let Some((agent, rest)) = agents.split_first() else {
            *best = best.max(acc);
            return;
        };
        recurse(supply_left, rest, acc, best);
        for valuation in agent.valuations() {
            if valuation.quantity <= supply_left {
                recurse(
                    supply_left - valuation.quantity,
                    rest,
                    acc + valuation.value,
                    best,
                );
            }
        }
    }

    let mut best = 0.0;
    recurse(supply, agents, 0.0, &mut best);
    best
}

#[rstest]
fn probabilities_form_a_lottery(paper_agents: Vec<Agent>) {
    let solution = solve(4, &paper_agents);
    assert!(solution.converged);

    // The registry always keeps the empty allocation.
    assert!(solution.allocations.contains_key("X0"));

    let total: f64 = solution
        .allocations
        .values()
        .map(|a| a.probability.expect("probabilities are determined"))
        .sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-4);

    for allocation in solution.allocations.values() {
        assert!(allocation.probability.unwrap() >= -1e-6);
        assert!(allocation.quantity_assigned() <= 4.0 + 1e-9);
    }
}

#[rstest]
fn prices_and_utilities_are_non_negative(paper_agents: Vec<Agent>) {
    let solution = solve(4, &paper_agents);
    assert!(solution.price >= 0.0);
    for utility in solution.utilities.values() {
        assert!(*utility >= 0.0);
    }
}

#[rstest]
fn welfare_matches_the_direct_program(paper_agents: Vec<Agent>) {
    let solution = solve(4, &paper_agents);
    assert!(solution.converged);

    let (direct, _) = DirectSolver::<ClarabelProgram>::solve(4, &paper_agents, 2.0)
        .expect("direct LP solves");
    assert_abs_diff_eq!(solution.welfare(), direct, epsilon = 5e-2);
    assert_abs_diff_eq!(-solution.objective, direct, epsilon = 5e-2);
}

#[rstest]
fn solving_twice_is_idempotent(paper_agents: Vec<Agent>) {
    let approximator = MarginalGreedyApproximator::new(4, &paper_agents, SilentLog);
    let mut solver =
        BendersSolver::<ClarabelProgram, _, _>::new(4, &paper_agents, approximator, SilentLog);

    let first = solver.solve().expect("first solve");
    let second = solver.solve().expect("second solve");

    assert_abs_diff_eq!(first.price, second.price, epsilon = 1e-3);
    assert_eq!(
        first.allocations.keys().collect::<Vec<_>>(),
        second.allocations.keys().collect::<Vec<_>>()
    );
    for (name, allocation) in &first.allocations {
        assert_abs_diff_eq!(
            allocation.probability.unwrap(),
            second.allocations[name].probability.unwrap(),
            epsilon = 1e-3
        );
    }
    for (id, utility) in &first.utilities {
        assert_abs_diff_eq!(*utility, second.utilities[id], epsilon = 1e-3);
    }
}

#[test]
fn bounded_welfare_on_a_generated_economy() {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    let mut rng = StdRng::seed_from_u64(42);
    let mut ids = mua_core::models::AgentIdSource::new();
    let agents = mua_core::models::generate_randomized_agents(6, 4, &mut ids, &mut rng);

    let solution = solve(6, &agents);
    let (direct, _) = DirectSolver::<ClarabelProgram>::solve(6, &agents, 2.0)
        .expect("direct LP solves");

    // Even without the convergence flag, the master bound never exceeds
    // the scaled LP optimum.
    assert!(solution.welfare() <= direct + 5e-2);
    for allocation in solution.allocations.values() {
        assert!(allocation.quantity_assigned() <= 6.0 + 1e-9);
    }
    if solution.converged {
        assert_abs_diff_eq!(solution.welfare(), direct, epsilon = 5e-2);
    }
}
