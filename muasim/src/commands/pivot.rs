use crate::{PivotReport, Scenario};
use mua_core::ports::TraceLog;
use mua_solver::{DantzigWolfeSolver, MarginalGreedyApproximator, Pivot};

pub fn run(scenario: Scenario, max_steps: usize) {
    let approximator =
        MarginalGreedyApproximator::new(scenario.supply, &scenario.agents, TraceLog);
    let mut solver =
        DantzigWolfeSolver::new(scenario.supply, &scenario.agents, approximator, TraceLog);

    let mut pivots = 0;
    let mut converged = false;
    while pivots < max_steps {
        match solver.step() {
            Pivot::Pivoted { .. } => pivots += 1,
            Pivot::Converged => {
                converged = true;
                break;
            }
            Pivot::Stalled => break,
        }
    }

    let report = PivotReport {
        converged,
        pivots,
        objective: solver.objective(),
        price: solver.price(),
        columns: solver.allocations().len(),
    };
    serde_json::to_writer_pretty(std::io::stdout().lock(), &report).expect("stdout is writable");
    println!();
}
