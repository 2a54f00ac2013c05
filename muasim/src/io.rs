use mua_core::models::{Agent, AgentId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A complete auction instance: the supply up for sale and the
/// participating agents with their valuation functions.
#[derive(Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub supply: u32,
    pub agents: Vec<Agent>,
}

impl Scenario {
    /// Reads a scenario from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        Ok(serde_json::from_reader(File::open(path)?)?)
    }

    /// Writes the scenario as pretty-printed JSON.
    pub fn write(&self, output: &mut impl Write) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(output, self)?;
        Ok(())
    }
}

/// What the `vcg` subcommand prints.
#[derive(Debug, Serialize)]
pub struct VcgReport {
    pub converged: bool,
    pub welfare: f64,
    pub price: f64,
    pub expected_prices: Vec<AgentPrice>,
}

#[derive(Debug, Serialize)]
pub struct AgentPrice {
    pub agent: AgentId,
    pub expected_price: f64,
}

/// What the `ascending` subcommand prints.
#[derive(Debug, Serialize)]
pub struct AscendingReport {
    pub price: f64,
    pub welfare: f64,
    pub assignments: Vec<AssignmentReport>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentReport {
    pub agent: AgentId,
    pub quantity: f64,
    pub value: f64,
}

/// What the `primal-dual` subcommand prints.
#[derive(Debug, Serialize)]
pub struct PrimalDualReport {
    pub price: f64,
    pub welfare: f64,
}

/// What the `pivot` subcommand prints.
#[derive(Debug, Serialize)]
pub struct PivotReport {
    pub converged: bool,
    pub pivots: usize,
    pub objective: f64,
    pub price: f64,
    pub columns: usize,
}
