//! Error conversion from component error types.
//!
//! Every component error reaches the HTTP layer through one of these
//! conversions, so kind and doubt information are decided here.

use recordgate_codec::{FilterError, KeyDecodeError, PayloadError};
use recordgate_store::StoreError;

use crate::scan::ScanError;
use crate::tasks::TaskError;
use crate::Error;

impl From<KeyDecodeError> for Error {
    fn from(err: KeyDecodeError) -> Self {
        Error::InvalidKey {
            reason: err.to_string(),
        }
    }
}

impl From<FilterError> for Error {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Invalid { reason } => Error::InvalidFilter { reason },
        }
    }
}

impl From<PayloadError> for Error {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Malformed { .. } | PayloadError::SchemaMismatch { .. } => {
                Error::InvalidPayload {
                    reason: err.to_string(),
                }
            }
            PayloadError::UnsupportedMediaType { media_type } => {
                Error::UnsupportedMediaType { media_type }
            }
            PayloadError::Encode { .. } => Error::Internal {
                reason: err.to_string(),
            },
        }
    }
}

/// Store errors keep their kind; a filtered-out read is indistinguishable
/// from a missing record.
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            // Not Found
            StoreError::NamespaceNotFound { namespace } => Error::NamespaceNotFound { namespace },
            StoreError::RecordNotFound | StoreError::FilteredOut => Error::RecordNotFound,
            StoreError::NodeNotFound { node } => Error::NodeNotFound { node },
            StoreError::JobNotFound { job } => Error::StoreFailure {
                reason: format!("store lost job {}", job),
            },

            // Conflict
            StoreError::RecordExists => Error::RecordExists,
            StoreError::GenerationMismatch { expected, actual } => {
                Error::GenerationMismatch { expected, actual }
            }

            // Validation
            StoreError::InvalidExpression { reason } => Error::InvalidFilter { reason },
            StoreError::InvalidResumeToken { reason } => Error::InvalidRequest {
                reason: format!("invalid scan token: {}", reason),
            },
            StoreError::Parameter { reason } => Error::InvalidRequest { reason },

            // System
            StoreError::Timeout { in_doubt } => Error::StoreTimeout { in_doubt },
            StoreError::Unavailable { reason } => Error::StoreUnavailable { reason },
            StoreError::Server { reason } => Error::StoreFailure { reason },
        }
    }
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidPageSize { .. } => Error::InvalidRequest {
                reason: err.to_string(),
            },
            ScanError::Rejected(store) => store.into(),
            ScanError::Partial(store) => Error::ScanIncomplete {
                timed_out: matches!(store, StoreError::Timeout { .. }),
                reason: store.to_string(),
            },
        }
    }
}

impl From<TaskError> for Error {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound { task_id } => Error::TaskNotFound { task_id },
            TaskError::InvalidOperations { reason } => Error::InvalidRequest { reason },
            TaskError::Overloaded { reason } => Error::Overloaded { reason },
            TaskError::Rejected(store) => store.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_filtered_out_is_not_found() {
        let err: Error = StoreError::FilteredOut.into();
        assert_eq!(err, Error::RecordNotFound);
    }

    #[test]
    fn test_timeout_doubt_preserved() {
        let err: Error = StoreError::Timeout { in_doubt: true }.into();
        assert!(err.in_doubt());
        let err: Error = StoreError::Timeout { in_doubt: false }.into();
        assert!(!err.in_doubt());
        assert!(err.is_timeout());
    }

    #[test]
    fn test_codec_errors_are_client_errors() {
        let errors: Vec<Error> = vec![
            KeyDecodeError::InvalidInteger { token: "x".into() }.into(),
            FilterError::Invalid { reason: "x".into() }.into(),
            PayloadError::SchemaMismatch { reason: "x".into() }.into(),
            PayloadError::UnsupportedMediaType {
                media_type: "text/plain".into(),
            }
            .into(),
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::ClientError, "{}", err);
            assert!(!err.in_doubt());
        }
    }

    #[test]
    fn test_partial_scan_is_store_failure() {
        let err: Error = ScanError::Partial(StoreError::Unavailable {
            reason: "down".into(),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(!err.is_timeout());
    }
}
