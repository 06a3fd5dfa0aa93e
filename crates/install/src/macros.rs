//! Macros for context builder helpers

#[macro_export]
macro_rules! context_builder {
    ($name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        paste::paste! {
            impl $name {
                /// Create a new context with default values
                #[must_use]
                pub fn new() -> Self {
                    Self {
                        $($field: Default::default(),)*
                        event_sender: None,
                        cancel: tokio_util::sync::CancellationToken::new(),
                    }
                }

                $( #[must_use]
                pub fn [<with_ $field>](mut self, value: $ty) -> Self {
                    self.$field = value;
                    self
                } )*

                /// Set the event sender for progress reporting
                #[must_use]
                pub fn with_event_sender(mut self, sender: pinstall_events::EventSender) -> Self {
                    self.event_sender = Some(sender);
                    self
                }

                /// Share a cancellation token with the caller
                #[must_use]
                pub fn with_cancel_token(mut self, cancel: tokio_util::sync::CancellationToken) -> Self {
                    self.cancel = cancel;
                    self
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }
        }
    };
}
