use crate::{PrimalDualReport, Scenario};
use mua_core::ports::TraceLog;
use mua_solver::PrimalDualAuction;
use mua_solver::clarabel::ClarabelProgram;

pub fn run(scenario: Scenario) -> anyhow::Result<()> {
    let auction =
        PrimalDualAuction::<ClarabelProgram, _>::new(scenario.supply, &scenario.agents, TraceLog);
    let (price, welfare) = auction.run()?;

    let report = PrimalDualReport { price, welfare };
    serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
    println!();
    Ok(())
}
