#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in pinstall
//!
//! Library crates never print. They report through an unbounded channel
//! of [`EventMessage`] values and the CLI decides how to render or log
//! them.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by functional domain (General warnings, Download, Install, Progress)
//! - **`EventEmitter` trait**: one API for emitting from a raw sender or any struct holding one
//! - **Metadata**: every message carries an id, timestamp, level and source
//! - **Progress counter**: a shared atomic counter reporting through the same channel

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod progress;
pub use progress::ProgressCounter;

pub mod events;
pub use events::{
    AppEvent, DownloadEvent, EventMessage, FailureContext, GeneralEvent, InstallEvent,
    InstallPhase, ProgressEvent,
};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for the event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout pinstall
///
/// This trait provides a single, consistent API for emitting events regardless of
/// whether you have a raw `EventSender` or a struct that contains one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        self.emit_message(EventMessage::from_event(event));
    }

    /// Emit an event correlated with a package name
    fn emit_for(&self, correlation_id: impl Into<String>, event: AppEvent) {
        let mut message = EventMessage::from_event(event);
        message.meta = message.meta.with_correlation_id(correlation_id);
        self.emit_message(message);
    }

    /// Send a fully built message
    fn emit_message(&self, message: EventMessage) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(message);
        }
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
/// This allows `EventSender` to be used directly where `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
