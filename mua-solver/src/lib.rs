#![warn(missing_docs)]
//! Auction mechanisms for a single divisible-into-identical-units good.
//!
//! The centerpiece is the Benders decomposition in [`BendersSolver`]: a
//! master LP over one price variable and one utility variable per agent,
//! alternating with a greedy separation oracle until the generated cuts
//! pin down an optimal fractional allocation and its shadow prices. The
//! [`VcgAuction`] derives truthful payments from marginal-economy re-runs
//! of that loop. The remaining mechanisms are experimental variants
//! sharing the same agent contract.

mod impls;
pub use impls::*;

mod greedy;
pub use greedy::{Approximator, MarginalGreedyApproximator};

mod master;
pub use master::{BendersSolution, BendersSolver};

mod vcg;
pub use vcg::{VcgAuction, VcgOutcome};

mod direct;
pub use direct::DirectSolver;

mod ascending;
pub use ascending::{AscendingAuction, AscendingOutcome};

mod primal_dual;
pub use primal_dual::PrimalDualAuction;

mod dantzig;
pub use dantzig::{DantzigWolfeSolver, Pivot};
