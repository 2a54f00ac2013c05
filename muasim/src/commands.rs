use clap::Subcommand;

use crate::ScenarioArgs;

pub mod ascending;
pub mod export;
pub mod pivot;
pub mod primal_dual;
pub mod vcg;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the decomposition auction and report VCG prices
    Vcg {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },

    /// Run the ascending-price auction
    Ascending {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Price increment per round
        #[arg(long, default_value_t = 0.05)]
        step_size: f64,
    },

    /// Run the primal-dual auction
    PrimalDual {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },

    /// Drive the Dantzig-Wolfe pivot solver to optimality
    Pivot {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Abort after this many pivots
        #[arg(long, default_value_t = 100)]
        max_steps: usize,
    },

    /// Write a scenario out as JSON (for editing or sharing)
    Export {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Destination file; stdout when omitted
        #[arg(long)]
        output: Option<std::path::PathBuf>,
    },
}
