use approx::assert_abs_diff_eq;
use mua_core::models::{Agent, AgentId, Valuation};
use mua_core::ports::SilentLog;
use mua_solver::clarabel::ClarabelProgram;
use mua_solver::{DirectSolver, PrimalDualAuction};

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

#[test]
fn primal_dual_clears_a_single_bidder_immediately() {
    let agents = vec![agent(1, &[6.0, 6.0, 6.0, 9.0])];
    let auction = PrimalDualAuction::<ClarabelProgram, _>::new(4, &agents, SilentLog);
    let (price, welfare) = auction.run().expect("a clearing price exists");

    // The full bundle is the unique demand at the very first price step,
    // so the restricted primal is feasible right away.
    assert_abs_diff_eq!(price, 0.1, epsilon = 1e-9);
    assert_abs_diff_eq!(welfare, 9.0, epsilon = 1e-4);
}

#[test]
fn primal_dual_rises_until_overdemand_clears() {
    let agents = vec![
        agent(1, &[6.0, 6.0, 6.0, 9.0]),
        agent(2, &[1.0, 4.0, 4.0, 6.0]),
    ];
    let auction = PrimalDualAuction::<ClarabelProgram, _>::new(4, &agents, SilentLog);
    let (price, welfare) = auction.run().expect("a clearing price exists");

    // Both bidders demand the full bundle until the price reaches 1,
    // where their demand correspondences open up and the supply can be
    // split exactly.
    assert_abs_diff_eq!(price, 1.0, epsilon = 5e-2);
    assert_abs_diff_eq!(welfare, 11.0, epsilon = 1e-3);
}

#[test]
fn direct_lp_beats_the_best_integral_assignment_under_complements() {
    // One bidder wants exactly three units, the other values any single
    // bundle at 2; the fractional relaxation mixes them.
    let agents = vec![agent(1, &[0.0, 0.0, 3.0]), agent(2, &[2.0, 2.0, 2.0])];
    let (welfare, allocation) =
        DirectSolver::<ClarabelProgram>::solve(3, &agents, 1.0).expect("direct LP solves");

    assert_abs_diff_eq!(welfare, 4.0, epsilon = 1e-4);
    assert!(allocation.quantity_assigned() <= 3.0 + 1e-6);
}

#[test]
fn direct_lp_scaling_halves_the_welfare() {
    let agents = vec![agent(1, &[5.0, 8.0, 10.0, 11.0])];
    let (unscaled, _) =
        DirectSolver::<ClarabelProgram>::solve(4, &agents, 1.0).expect("direct LP solves");
    let (scaled, _) =
        DirectSolver::<ClarabelProgram>::solve(4, &agents, 2.0).expect("direct LP solves");

    assert_abs_diff_eq!(unscaled, 11.0, epsilon = 1e-4);
    assert_abs_diff_eq!(scaled, 5.5, epsilon = 1e-4);
}
