use crate::{AscendingReport, AssignmentReport, Scenario};
use mua_core::ports::TraceLog;
use mua_solver::AscendingAuction;

pub fn run(scenario: Scenario, step_size: f64) {
    let auction = AscendingAuction::new(scenario.supply, &scenario.agents, TraceLog)
        .with_step_size(step_size);
    let outcome = auction.run();

    let report = AscendingReport {
        price: outcome.price,
        welfare: outcome.welfare,
        assignments: outcome
            .assignments
            .iter()
            .map(|a| AssignmentReport {
                agent: a.agent,
                quantity: a.quantity,
                value: a.value,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(std::io::stdout().lock(), &report).expect("stdout is writable");
    println!();
}
