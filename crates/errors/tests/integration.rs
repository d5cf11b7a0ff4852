//! Integration tests for error types

#[cfg(test)]
mod tests {
    use dlsim_errors::*;

    #[test]
    fn test_error_conversion() {
        let usage = UsageError::UnknownResource {
            resource: "R9".into(),
        };
        let err: Error = usage.into();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn test_error_display() {
        let err = UsageError::InvalidUnits { units: 0 };
        assert_eq!(
            err.to_string(),
            "invalid unit count: 0 (must be at least 1)"
        );
    }

    #[test]
    fn test_user_codes_pass_through_umbrella() {
        let err: Error = UsageError::ProcessTerminated {
            process: "P1".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("usage.process_terminated"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_blocked_process_is_retryable() {
        let err = UsageError::ProcessBlocked {
            process: "P0".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
        assert_eq!(err.user_code(), Some("error.io"));
    }

    #[test]
    fn test_toml_error_becomes_config_parse_error() {
        let parse = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }
}
