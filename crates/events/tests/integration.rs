//! Integration tests for events

#[cfg(test)]
mod tests {
    use pinstall_errors::NetworkError;
    use pinstall_events::*;

    #[tokio::test]
    async fn test_event_sender_emit() {
        let (tx, mut rx) = channel();

        tx.emit_warning_with_context("scratch workspace left in place", "/work/.pinstall_1");
        tx.emit(AppEvent::Install(InstallEvent::PackageStarted {
            package: "acme/widgets".into(),
            version: "1.2.0".into(),
        }));

        let first = rx.recv().await.unwrap();
        match &first.event {
            AppEvent::General(GeneralEvent::Warning { message, context }) => {
                assert_eq!(message, "scratch workspace left in place");
                assert_eq!(context.as_deref(), Some("/work/.pinstall_1"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(first.meta.level, EventLevel::Warn);
        assert_eq!(first.meta.source, EventSource::GENERAL);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.meta.level, EventLevel::Debug);
        assert_ne!(first.meta.event_id, second.meta.event_id);
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning_with_context("ignored", "nowhere");
    }

    #[tokio::test]
    async fn test_correlated_failure() {
        let (tx, mut rx) = channel();
        let err = NetworkError::HttpError {
            status: 404,
            message: "Not Found".into(),
        };
        tx.emit_for(
            "acme/widgets",
            AppEvent::Install(InstallEvent::PackageFailed {
                package: "acme/widgets".into(),
                version: "1.2.0".into(),
                phase: InstallPhase::Fetch,
                failure: FailureContext::from_error(&err),
            }),
        );

        let message = rx.recv().await.unwrap();
        assert_eq!(message.meta.correlation_id.as_deref(), Some("acme/widgets"));
        assert_eq!(message.meta.source, EventSource::INSTALL);
        assert_eq!(message.meta.level, EventLevel::Error);
        match message.event {
            AppEvent::Install(InstallEvent::PackageFailed { failure, .. }) => {
                assert_eq!(failure.code.as_deref(), Some("network.http_error"));
                assert!(failure.hint.is_some());
                assert!(!failure.retryable);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = AppEvent::Install(InstallEvent::ManifestWritten {
            path: "vendor/composer/installed.json".into(),
            entries: 3,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "install");
        assert_eq!(json["event"]["type"], "ManifestWritten");
        assert_eq!(json["event"]["entries"], 3);
        assert_eq!(event.log_target(), "pinstall::events::install");
    }
}
