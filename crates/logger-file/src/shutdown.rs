//! Pipeline lifecycle and the stop protocol

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::writer::WriterExit;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::JoinHandle;
use tracing::{debug, error};

/// Lifecycle of a logger. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    /// Accepting entries
    Running = 0,
    /// No longer accepting entries; the writer is draining
    Stopping = 1,
    /// The writer has exited and every file is closed
    Stopped = 2,
}

/// Atomic holder for [`PipelineState`], shared with the writer thread
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(PipelineState::Running as u8))
    }

    pub(crate) fn load(&self) -> PipelineState {
        match self.0.load(Ordering::Acquire) {
            0 => PipelineState::Running,
            1 => PipelineState::Stopping,
            _ => PipelineState::Stopped,
        }
    }

    /// Move from `Running` to `Stopping`; no effect in any later state
    pub(crate) fn begin_stop(&self) {
        let _ = self.0.compare_exchange(
            PipelineState::Running as u8,
            PipelineState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn mark_stopped(&self) {
        self.0.store(PipelineState::Stopped as u8, Ordering::Release);
    }
}

/// Owns the writer thread and runs the stop sequence exactly once
pub(crate) struct ShutdownCoordinator {
    name: String,
    writer: Mutex<Option<JoinHandle<Result<WriterExit>>>>,
}

impl ShutdownCoordinator {
    pub(crate) fn new(name: String, writer: JoinHandle<Result<WriterExit>>) -> Self {
        Self {
            name,
            writer: Mutex::new(Some(writer)),
        }
    }

    /// Refuse new entries, let the writer drain and close its files, and
    /// wait for it to exit.
    ///
    /// Concurrent callers block until the first one has finished; every
    /// later call returns immediately.
    pub(crate) fn stop(&self, state: &StateCell, dispatcher: &Dispatcher) {
        let mut writer = self.writer.lock();
        if state.load() == PipelineState::Stopped {
            return;
        }

        state.begin_stop();
        dispatcher.close();

        if let Some(handle) = writer.take() {
            match handle.join() {
                Ok(Ok(exit)) => debug!(logger = %self.name, ?exit, "log writer stopped"),
                Ok(Err(e)) => error!(logger = %self.name, error = %e, "log writer failed"),
                Err(_) => error!(logger = %self.name, "log writer panicked"),
            }
        }

        state.mark_stopped();
    }
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("name", &self.name)
            .field("joined", &self.writer.lock().is_none())
            .finish()
    }
}
