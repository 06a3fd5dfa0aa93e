//! Integration tests for error types

#[cfg(test)]
mod tests {
    use pinstall_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com/a.zip".into(),
            seconds: 5,
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_retryable());
        assert_eq!(err.user_code(), Some("network.timeout"));
    }

    #[test]
    fn test_lockfile_not_found_display() {
        let err = LockfileError::NotFound {
            path: "/srv/app".into(),
        };
        assert_eq!(
            err.to_string(),
            "no valid composer.lock file found at /srv/app"
        );
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_error_clone() {
        let err = ArchiveError::Empty {
            path: "/tmp/x.zip".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
        assert_eq!(err.user_message(), "denied");
    }

    #[test]
    fn test_cancelled_detection() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::from(InstallError::Cancelled).is_cancelled());
        assert!(!Error::internal("boom").is_cancelled());
    }

    #[test]
    fn test_packages_failed_hint() {
        let err: Error = InstallError::PackagesFailed {
            count: 1,
            packages: "acme/widgets".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("install.packages_failed"));
        assert!(err.to_string().contains("acme/widgets"));
        assert!(err.user_hint().unwrap().contains("--keep-going"));
    }
}
