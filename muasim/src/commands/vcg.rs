use crate::{AgentPrice, Scenario, VcgReport};
use mua_core::ports::TraceLog;
use mua_solver::VcgAuction;
use mua_solver::clarabel::ClarabelProgram;

pub fn run(scenario: Scenario) -> anyhow::Result<()> {
    let auction =
        VcgAuction::<ClarabelProgram, _>::new(scenario.supply, &scenario.agents, TraceLog);
    let outcome = auction.run()?;

    if !outcome.converged {
        tracing::warn!("decomposition hit the iteration cap; prices are approximate");
    }

    let report = VcgReport {
        converged: outcome.converged,
        welfare: outcome.solution.welfare(),
        price: outcome.solution.price,
        expected_prices: outcome
            .expected_prices
            .iter()
            .map(|(&agent, &expected_price)| AgentPrice {
                agent,
                expected_price,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
    println!();
    Ok(())
}
