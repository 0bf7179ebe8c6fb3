use std::{
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::Duration,
};

/// Quiet window used when none is configured.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(50);

/// Message on a session's control channel. File change notifications and the
/// stop request share one channel so the worker waits on a single receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Changed,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The file changed and has been quiet for a full window since.
    Changed,
    /// Stop was requested or every sender is gone.
    Stop,
}

/// Collapses bursts of change signals into one tick.
///
/// Editors can report a write while still holding the file, and one logical
/// write often raises several notifications; waiting for quiet avoids most
/// of the resulting failed or fragmented reads. Reads can still fail, so this
/// is a heuristic only.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    quiet_window: Duration,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_WINDOW)
    }
}

impl Debouncer {
    pub fn new(quiet_window: Duration) -> Self {
        Self { quiet_window }
    }

    /// Blocks until a burst of changes has settled or stop is requested.
    /// A shutdown arriving inside the quiet window wins over the pending tick.
    pub fn next_tick(&self, signals: &Receiver<Signal>) -> Tick {
        match signals.recv() {
            Ok(Signal::Changed) => (),
            Ok(Signal::Shutdown) | Err(_) => return Tick::Stop,
        }

        let mut coalesced = 1usize;
        loop {
            match signals.recv_timeout(self.quiet_window) {
                Ok(Signal::Changed) => coalesced += 1,
                Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => return Tick::Stop,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::trace!(coalesced, "change burst settled");
                    return Tick::Changed;
                }
            }
        }
    }
}
