mod agent;
mod allocation;
mod ids;
mod valuation;

pub use agent::{Agent, DemandView, generate_randomized_agents};
pub use allocation::{Allocation, Assignment};
pub use ids::{AgentId, AgentIdSource};
pub use valuation::{Valuation, ValuationError};
