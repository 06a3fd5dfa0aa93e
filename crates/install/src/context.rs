use pinstall_events::{EventEmitter, EventSender};
use tokio_util::sync::CancellationToken;

/// Per-run installation context
#[derive(Clone, Debug)]
pub struct InstallContext {
    /// Suppress progress reporting; the counter still advances
    pub quiet: bool,

    /// Event sender for progress reporting
    pub event_sender: Option<EventSender>,

    /// Cancelling stops in-flight fetches and prevents publishing
    pub cancel: CancellationToken,
}

context_builder! {
    InstallContext {
        quiet: bool,
    }
}

impl InstallContext {
    /// Sender for progress events, withheld when quiet
    pub(crate) fn progress_sender(&self) -> Option<EventSender> {
        if self.quiet {
            None
        } else {
            self.event_sender.clone()
        }
    }
}

impl EventEmitter for InstallContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}
