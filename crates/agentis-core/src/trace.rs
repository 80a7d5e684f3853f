// src/trace.rs

/// A trait for observing loop progress.
/// This allows for decoupled monitoring, logging, or other features
/// without modifying the core loop logic.
pub trait RoundTraceHandler: Send + Sync {
    /// Called after each round with the number of items that completed in
    /// that round and the number still in flight. Every item is always in
    /// exactly one of the two groups or already completed earlier, so
    /// cumulative completions plus `in_flight` equals the initial batch
    /// size after every call.
    fn on_round_complete(&self, _round: usize, _completed_in_round: usize, _in_flight: usize) {}
}
