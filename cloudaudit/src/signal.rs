//! Cancellation for a running export
//!
//! [`Interrupt`] is the top-level stop signal (Ctrl-C). [`ChunkContext`]
//! bounds the network activity of one chunk by a deadline and the interrupt.
use log::info;
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::{Instant, timeout_at};

/// Receiving side of the stop signal; cheap to clone
#[derive(Clone, Debug)]
pub struct Interrupt {
    receiver: watch::Receiver<bool>,
}

/// Sending side of the stop signal
#[derive(Debug)]
pub struct InterruptHandle {
    sender: watch::Sender<bool>,
}

/// Create a connected handle/interrupt pair
#[must_use]
pub fn interrupt_channel() -> (InterruptHandle, Interrupt) {
    let (sender, receiver) = watch::channel(false);
    (InterruptHandle { sender }, Interrupt { receiver })
}

impl InterruptHandle {
    /// Signal every holder of the paired [`Interrupt`]
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

impl Interrupt {
    /// An interrupt that never fires
    #[must_use]
    pub fn never() -> Self {
        let (_handle, interrupt) = interrupt_channel();
        interrupt
    }

    /// Interrupt that fires on Ctrl-C
    #[must_use]
    pub fn on_ctrl_c() -> Self {
        let (handle, interrupt) = interrupt_channel();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping export...");
                handle.trigger();
            }
        });
        interrupt
    }

    /// Whether the interrupt has fired
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the interrupt fires; never resolves if it cannot fire
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Run `future` unless the interrupt fires first
    ///
    /// # Errors
    ///
    /// Returns `Interrupted` if the interrupt fired before `future` finished.
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, Interrupted> {
        tokio::select! {
            biased;
            () = self.triggered() => Err(Interrupted),
            output = future => Ok(output),
        }
    }
}

/// The interrupt fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Why a bounded operation did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    Interrupted,
    DeadlineExceeded,
}

/// Deadline and interrupt scope for one chunk
///
/// Created when a chunk starts downloading and dropped when it finishes;
/// it owns no timers or tasks of its own.
#[derive(Debug)]
pub struct ChunkContext<'a> {
    deadline: Instant,
    timeout: Duration,
    interrupt: &'a Interrupt,
}

impl<'a> ChunkContext<'a> {
    /// Start a context whose deadline is `timeout` from now
    #[must_use]
    pub fn new(timeout: Duration, interrupt: &'a Interrupt) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            timeout,
            interrupt,
        }
    }

    /// Configured timeout for the chunk
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `future` within the deadline, unless interrupted
    ///
    /// # Errors
    ///
    /// Returns `DeadlineExceeded` once the deadline passes and `Interrupted`
    /// if the interrupt fires first.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, ContextError> {
        match self.interrupt.guard(timeout_at(self.deadline, future)).await {
            Err(Interrupted) => Err(ContextError::Interrupted),
            Ok(Err(_elapsed)) => Err(ContextError::DeadlineExceeded),
            Ok(Ok(output)) => Ok(output),
        }
    }
}
