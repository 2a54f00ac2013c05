/// Implementation of the math-program port using the Clarabel interior
/// point solver
#[cfg(feature = "clarabel")]
pub mod clarabel;
