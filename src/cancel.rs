//! A minimal cooperative cancellation token.
//!
//! Both the producer's `flush` and a decoder's receive loop need to accept a
//! cancellation signal from whatever owns the connection. Pulling in
//! `tokio-util` for this would add a dependency for a single boolean flag;
//! this type is the cooperative-check shape `CancellationToken` offers,
//! cloned cheaply across the task that owns a connection and anything that
//! needs to ask it to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply-cloneable, cooperative cancellation flag.
///
/// Cancellation is observed only at this crate's suspension points
/// (`RemoteCanvas::flush`, a decoder's receive loop) — nothing in this
/// crate polls it on a timer or interrupts work in progress.
#[derive(Clone, Debug, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
