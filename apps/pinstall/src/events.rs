//! Event handling and progress display

use std::time::Instant;

use console::{style, Term};
use pinstall_events::{AppEvent, EventMessage, GeneralEvent, InstallEvent, ProgressEvent};

use crate::logging::log_event_with_tracing;

/// A single redrawn status line for one progress counter
#[derive(Debug)]
struct ProgressLine {
    id: String,
    label: String,
    current: u64,
    total: Option<u64>,
    started: Instant,
}

impl ProgressLine {
    fn render(&self) -> String {
        let elapsed = self.started.elapsed().as_secs_f64();
        match self.total {
            Some(total) => format!("{} [{}/{}] {elapsed:.1}s", self.label, self.current, total),
            None => format!("{} [{}] {elapsed:.1}s", self.label, self.current),
        }
    }
}

/// Event handler for progress display and user feedback
pub struct EventHandler {
    term: Term,
    /// Draw the progress line; off when quiet or in JSON mode
    show_progress: bool,
    /// Print per-package failures and warnings
    show_messages: bool,
    progress: Option<ProgressLine>,
}

impl EventHandler {
    pub fn new(show_progress: bool, show_messages: bool) -> Self {
        Self {
            term: Term::stderr(),
            show_progress,
            show_messages,
            progress: None,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);

        match message.event {
            AppEvent::Progress(ProgressEvent::Started {
                id,
                operation,
                total,
            }) => {
                if self.show_progress {
                    self.progress = Some(ProgressLine {
                        id,
                        label: operation,
                        current: 0,
                        total,
                        started: Instant::now(),
                    });
                    self.redraw();
                }
            }
            AppEvent::Progress(ProgressEvent::Updated { id, current, total }) => {
                if let Some(line) = self.progress.as_mut().filter(|line| line.id == id) {
                    line.current = current;
                    line.total = total.or(line.total);
                    self.redraw();
                }
            }
            AppEvent::Progress(
                ProgressEvent::Completed { id, .. } | ProgressEvent::Failed { id, .. },
            ) => {
                if self.progress.as_ref().is_some_and(|line| line.id == id) {
                    self.progress = None;
                    self.clear();
                }
            }
            AppEvent::Install(InstallEvent::PackageFailed {
                package,
                version,
                phase,
                failure,
            }) => {
                self.show_error(&format!(
                    "failed to install {package} {version} ({phase}): {}",
                    failure.message
                ));
            }
            AppEvent::General(GeneralEvent::Warning { message, context }) => {
                let text = match context {
                    Some(context) => format!("{message} ({context})"),
                    None => message,
                };
                self.show_warning(&text);
            }
            // Everything else is only logged
            _ => {}
        }
    }

    /// Periodic redraw so elapsed time advances between updates
    pub fn tick(&self) {
        if self.progress.is_some() {
            self.redraw();
        }
    }

    /// Whether a progress line is currently drawn
    pub fn is_drawing(&self) -> bool {
        self.progress.is_some()
    }

    fn redraw(&self) {
        if let Some(line) = &self.progress {
            let _ = self.term.clear_line();
            let _ = self.term.write_str(&line.render());
        }
    }

    fn clear(&self) {
        let _ = self.term.clear_line();
    }

    fn print_line(&self, line: &str) {
        self.clear();
        let _ = self.term.write_line(line);
        self.redraw();
    }

    fn show_warning(&self, message: &str) {
        if self.show_messages {
            self.print_line(&format!("{} {message}", style("warning:").yellow().bold()));
        }
    }

    fn show_error(&self, message: &str) {
        if self.show_messages {
            self.print_line(&format!("{} {message}", style("error:").red().bold()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinstall_events::{EventMessage, FailureContext, InstallPhase};
    use std::time::Duration;

    fn message(event: AppEvent) -> EventMessage {
        EventMessage::from_event(event)
    }

    #[test]
    fn test_progress_line_lifecycle() {
        let mut handler = EventHandler::new(true, true);

        handler.handle_event(message(AppEvent::Progress(ProgressEvent::started(
            "p1",
            "installing 2 packages",
            Some(2),
        ))));
        assert!(handler.is_drawing());

        handler.handle_event(message(AppEvent::Progress(ProgressEvent::updated(
            "p1",
            1,
            Some(2),
        ))));
        assert_eq!(handler.progress.as_ref().map(|line| line.current), Some(1));
        assert!(handler
            .progress
            .as_ref()
            .is_some_and(|line| line.render().starts_with("installing 2 packages [1/2]")));

        // Updates for other counters are ignored
        handler.handle_event(message(AppEvent::Progress(ProgressEvent::updated(
            "other",
            2,
            Some(2),
        ))));
        assert_eq!(handler.progress.as_ref().map(|line| line.current), Some(1));

        handler.handle_event(message(AppEvent::Progress(ProgressEvent::completed(
            "p1",
            Duration::from_millis(5),
            2,
        ))));
        assert!(!handler.is_drawing());
    }

    #[test]
    fn test_progress_suppressed_when_hidden() {
        let mut handler = EventHandler::new(false, false);
        handler.handle_event(message(AppEvent::Progress(ProgressEvent::started(
            "p1",
            "installing 1 packages",
            Some(1),
        ))));
        assert!(!handler.is_drawing());

        handler.handle_event(message(AppEvent::Install(InstallEvent::PackageFailed {
            package: "acme/broken".to_string(),
            version: "1.0.0".to_string(),
            phase: InstallPhase::Fetch,
            failure: FailureContext::new(None::<String>, "boom", None::<String>, false),
        })));
        handler.tick();
    }
}
