use clap::Parser;

mod io;
pub use io::*;

mod scenario;
pub use scenario::*;

mod commands;
pub use commands::*;

// The top-level arguments -- presently just which subcommand to execute
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct BaseArgs {
    #[command(subcommand)]
    pub command: Commands,
}

impl BaseArgs {
    pub fn evaluate(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Vcg { scenario } => commands::vcg::run(scenario.load()?)?,
            Commands::Ascending { scenario, step_size } => {
                commands::ascending::run(scenario.load()?, step_size)
            }
            Commands::PrimalDual { scenario } => commands::primal_dual::run(scenario.load()?)?,
            Commands::Pivot { scenario, max_steps } => {
                commands::pivot::run(scenario.load()?, max_steps)
            }
            Commands::Export { scenario, output } => {
                commands::export::run(scenario.load()?, output)?
            }
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("unknown scenario {0:?}, expected a known name or a JSON file path")]
    UnknownScenario(String),
    #[error("a random scenario needs --supply and --agents")]
    IncompleteRandomScenario,
}
