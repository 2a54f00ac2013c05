use crate::{CliError, Scenario};
use clap::Args;
use mua_core::models::{Agent, AgentId, AgentIdSource, Valuation, generate_randomized_agents};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

/// Where a subcommand gets its economy from: a named built-in scenario, a
/// JSON file, or a seeded random generation.
#[derive(Args)]
pub struct ScenarioArgs {
    /// Named scenario ("paper", "ausubel", "two-bidder", "complements") or
    /// a path to a scenario JSON file
    #[arg(long, default_value = "paper")]
    pub scenario: String,

    /// Generate a random economy with this many agents instead
    #[arg(long)]
    pub agents: Option<usize>,

    /// Supply of the random economy
    #[arg(long)]
    pub supply: Option<u32>,

    /// Seed of the random economy
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl ScenarioArgs {
    pub fn load(&self) -> anyhow::Result<Scenario> {
        if self.agents.is_some() || self.supply.is_some() {
            let (Some(count), Some(supply)) = (self.agents, self.supply) else {
                return Err(CliError::IncompleteRandomScenario.into());
            };
            return Ok(random(supply, count, self.seed));
        }

        match self.scenario.as_str() {
            "paper" => Ok(paper()),
            "ausubel" => Ok(ausubel()),
            "two-bidder" => Ok(two_bidder()),
            "complements" => Ok(complements()),
            other => {
                let path = Path::new(other);
                if path.is_file() {
                    Scenario::from_file(path)
                } else {
                    Err(CliError::UnknownScenario(other.to_owned()).into())
                }
            }
        }
    }
}

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

/// The three-bidder example used in the accompanying paper.
pub fn paper() -> Scenario {
    Scenario {
        supply: 4,
        agents: vec![
            agent(1, &[10.0, 10.0, 10.0, 10.0]),
            agent(2, &[10.0, 10.0, 10.0, 12.0]),
            agent(3, &[10.0, 13.0, 14.0, 15.0]),
        ],
    }
}

/// Ausubel's five-bidder clinching example.
pub fn ausubel() -> Scenario {
    Scenario {
        supply: 5,
        agents: vec![
            agent(1, &[123.0, 236.0, 339.0, 339.0, 339.0]),
            agent(2, &[75.0, 80.0, 83.0, 83.0, 83.0]),
            agent(3, &[125.0, 250.0, 299.0, 299.0, 299.0]),
            agent(4, &[85.0, 150.0, 157.0, 157.0, 157.0]),
            agent(5, &[45.0, 70.0, 75.0, 75.0, 75.0]),
        ],
    }
}

/// Two bidders over four units with a late value jump.
pub fn two_bidder() -> Scenario {
    Scenario {
        supply: 4,
        agents: vec![
            agent(1, &[6.0, 6.0, 6.0, 9.0]),
            agent(2, &[1.0, 4.0, 4.0, 6.0]),
        ],
    }
}

/// One all-or-nothing bidder against a flat one; the fractional optimum
/// mixes them.
pub fn complements() -> Scenario {
    Scenario {
        supply: 3,
        agents: vec![agent(1, &[0.0, 0.0, 3.0]), agent(2, &[2.0, 2.0, 2.0])],
    }
}

/// A seeded random economy.
pub fn random(supply: u32, count: usize, seed: u64) -> Scenario {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = AgentIdSource::new();
    Scenario {
        supply,
        agents: generate_randomized_agents(supply, count, &mut ids, &mut rng),
    }
}
