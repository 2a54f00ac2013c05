use crate::Scenario;
use std::fs::File;
use std::path::PathBuf;

pub fn run(scenario: Scenario, output: Option<PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => scenario.write(&mut File::create(path)?)?,
        None => {
            scenario.write(&mut std::io::stdout().lock())?;
            println!();
        }
    }
    Ok(())
}
