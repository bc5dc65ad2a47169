//! Request lifecycle phases and the observer hook.
//!
//! Inject an [`Arc<dyn LifecycleObserver>`] via
//! [`crate::handler::ConversionHandler::with_observer`] to receive an event
//! every time a request changes phase.
//!
//! ```text
//! Validating ─▶ Staged ─▶ Converting ─▶ Succeeded ─┐
//!     │                       │                    ├─▶ CleanedUp ─▶ Responded
//!     │                       └───────▶ Failed ────┘
//!     └───────────────────────────────────────────────────────────▶ Responded
//! ```
//!
//! `CleanedUp` is always reported before `Responded` once a request reached
//! `Staged`. `Succeeded`/`Failed` and `CleanedUp` are reported from the
//! blocking thread that ran the converter; if the request was dropped
//! mid-conversion they still arrive, but `Responded` never does.
//!
//! # Example
//!
//! ```rust
//! use pdf2docx_api::{LifecycleObserver, RequestPhase};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use uuid::Uuid;
//!
//! struct FailureCounter(AtomicUsize);
//!
//! impl LifecycleObserver for FailureCounter {
//!     fn on_phase(&self, _request_id: Uuid, phase: RequestPhase) {
//!         if phase == RequestPhase::Failed {
//!             self.0.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPhase {
    Validating,
    /// Both temp files exist.
    Staged,
    Converting,
    Succeeded,
    Failed,
    /// Both temp files have been removed (or removal was attempted and logged).
    CleanedUp,
    /// Terminal: the outcome has been handed back to the caller.
    Responded,
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestPhase::Validating => "validating",
            RequestPhase::Staged => "staged",
            RequestPhase::Converting => "converting",
            RequestPhase::Succeeded => "succeeded",
            RequestPhase::Failed => "failed",
            RequestPhase::CleanedUp => "cleaned_up",
            RequestPhase::Responded => "responded",
        };
        f.write_str(s)
    }
}

/// Receives phase transitions from the handler.
///
/// Implementations must be `Send + Sync`: requests run concurrently on
/// different tokio tasks and all report to the same observer.
pub trait LifecycleObserver: Send + Sync {
    fn on_phase(&self, _request_id: Uuid, _phase: RequestPhase) {}
}

/// The default observer; ignores every event.
pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {}

/// Convenience alias for the type the handler stores.
pub type SharedObserver = Arc<dyn LifecycleObserver>;
