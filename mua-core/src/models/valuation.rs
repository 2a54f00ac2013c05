/// A bidder's value for receiving a specific quantity of the good.
///
/// An agent's valuation function is the finite set of `Valuation`s it
/// holds. The sequence is expected to be non-decreasing in quantity
/// (receiving more identical items never hurts a buyer); this is
/// guaranteed by data generation, not enforced at runtime.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Valuation {
    /// The quantity of identical units this valuation covers.
    pub quantity: u32,
    /// The value the agent places on receiving exactly that quantity.
    pub value: f64,
}

impl Valuation {
    /// Creates a valuation for a positive quantity.
    pub fn new(quantity: u32, value: f64) -> Self {
        debug_assert!(quantity > 0, "valuations cover positive quantities");
        Self { quantity, value }
    }

    /// The quasilinear utility of buying this bundle at a per-item price,
    /// optionally shifted by a reservation term.
    pub fn utility(&self, price: f64, reservation: f64) -> f64 {
        self.value - self.quantity as f64 * price + reservation
    }
}

/// Failures when looking up an agent's valuation function directly.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValuationError {
    /// The agent never recorded a value for this quantity.
    #[error("no valuation recorded for quantity {0}")]
    NotFound(u32),
}
