#![warn(missing_docs)]
//! Domain models and ports for multi-unit auction simulation.
//!
//! This crate holds the data structures shared by every auction mechanism
//! (valuations, agents, assignments, allocations) and the port traits that
//! decouple the mechanisms from their collaborators: the numerical
//! optimization engine and the status log sink.

/// Core domain models for the auction simulation.
///
/// The models here are primarily data structures with minimal business
/// logic; the mechanisms that operate on them live in `mua-solver`.
pub mod models;

/// Interface traits for the auction simulation.
///
/// These define the contract between the mechanisms and external
/// collaborators (the LP engine, the console sink) without specifying
/// implementation details, so that infrastructure can be swapped without
/// touching the decomposition logic.
pub mod ports;

// We use non-std collections here for their ordering semantics and performance
/// A hashmap with deterministic iteration order.
pub type Map<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;
/// A hashset with deterministic iteration order.
pub type Set<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;

/// The numeric tolerance shared by demand queries and the decomposition
/// convergence test.
///
/// Callers supplying their own tolerance should keep it small relative to
/// the valuation magnitudes in play: too large and the solver terminates
/// prematurely (or a demand query admits loss-making bundles), too small
/// and cut generation may cycle on floating-point noise. The default suits
/// valuations in the 1..1000 range.
pub const EPSILON: f64 = 1e-3;
