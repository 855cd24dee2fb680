use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a cooperative shutdown.
///
/// `Running -> ShutdownRequested -> Flushing -> Exited`. The orchestrator only
/// observes the request between batches, so a write that already started
/// always finishes before state is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShutdownState {
    Running = 0,
    ShutdownRequested = 1,
    Flushing = 2,
    Exited = 3,
}

impl ShutdownState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ShutdownState::Running,
            1 => ShutdownState::ShutdownRequested,
            2 => ShutdownState::Flushing,
            _ => ShutdownState::Exited,
        }
    }
}

/// Shared handle to the shutdown state machine.
///
/// Cloned into the signal listener and into every orchestrator; all clones
/// observe the same state.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    state: Arc<AtomicU8>,
    cancel_token: CancellationToken,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ShutdownState::Running as u8)),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Requests a graceful shutdown.
    ///
    /// Returns `true` only for the request that moved the machine out of
    /// `Running`; repeated requests are no-ops.
    pub fn request(&self) -> bool {
        let moved = self
            .transition(ShutdownState::Running, ShutdownState::ShutdownRequested)
            .is_ok();
        if moved {
            self.cancel_token.cancel();
        }
        moved
    }

    /// Moves `ShutdownRequested -> Flushing`. Only the caller that wins the
    /// transition may flush.
    pub fn begin_flush(&self) -> bool {
        self.transition(ShutdownState::ShutdownRequested, ShutdownState::Flushing)
            .is_ok()
    }

    /// Moves `Flushing -> Exited`.
    pub fn mark_exited(&self) -> bool {
        self.transition(ShutdownState::Flushing, ShutdownState::Exited)
            .is_ok()
    }

    pub fn state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_requested(&self) -> bool {
        self.state() != ShutdownState::Running
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    fn transition(&self, from: ShutdownState, to: ShutdownState) -> Result<u8, u8> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
    }
}
