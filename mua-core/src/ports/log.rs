/// An abstract sink for line-formatted auction status messages.
///
/// Mechanisms narrate their progress through this port so that a no-op
/// sink can be substituted for silent sub-solves (the marginal-economy
/// computations run one solve per agent and would otherwise interleave
/// their output with the main solve's).
pub trait AuctionLog {
    /// Accepts one status line.
    fn log(&self, message: &str);
}

impl<T: AuctionLog + ?Sized> AuctionLog for &T {
    fn log(&self, message: &str) {
        (*self).log(message)
    }
}

/// Forwards status lines to the `tracing` infrastructure at info level.
///
/// By convention this project instruments through `tracing`; binaries
/// install a subscriber to surface these events on stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceLog;

impl AuctionLog for TraceLog {
    fn log(&self, message: &str) {
        tracing::info!(target: "auction", "{message}");
    }
}

/// Swallows every status line.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentLog;

impl AuctionLog for SilentLog {
    fn log(&self, _message: &str) {}
}
