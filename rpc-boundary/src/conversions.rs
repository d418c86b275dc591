//! Translation between the application error taxonomy and the transport
//! status-code space.
//!
//! Both directions are total: unknown inputs collapse to `Internal`
//! rather than failing, so a status can always be produced.

use tonic::{Code, Status};
use tonic_types::{ErrorDetails as StatusDetails, StatusExt};

use crate::error::{AppError, ErrorKind, RemoteError};

/// Map an optional error kind to a transport code.
pub fn kind_to_code(kind: Option<ErrorKind>) -> Code {
    match kind {
        Some(ErrorKind::Unavailable) => Code::Unavailable,
        Some(ErrorKind::Unauthorized) => Code::PermissionDenied,
        Some(ErrorKind::Conflict) => Code::AlreadyExists,
        Some(ErrorKind::NotImplemented) => Code::Unimplemented,
        Some(ErrorKind::InvalidArgument) => Code::InvalidArgument,
        _ => Code::Internal,
    }
}

/// Map a transport code back into the local taxonomy.
///
/// Lossy outside the five mapped codes: everything else is `Internal`,
/// so `kind_to_code(Some(kind_from_code(c)))` does not reproduce `c` in
/// general.
pub fn kind_from_code(code: Code) -> ErrorKind {
    match code {
        Code::Unavailable => ErrorKind::Unavailable,
        Code::PermissionDenied => ErrorKind::Unauthorized,
        Code::AlreadyExists => ErrorKind::Conflict,
        Code::Unimplemented => ErrorKind::NotImplemented,
        Code::InvalidArgument => ErrorKind::InvalidArgument,
        _ => ErrorKind::Internal,
    }
}

impl RemoteError {
    /// Reclassify a failing transport status into the local taxonomy.
    pub fn from_status(status: &Status) -> Self {
        RemoteError::new(kind_from_code(status.code()))
    }
}

/// Convert a handler error into the status returned to the caller.
///
/// The code comes from the kind table and the message from the error's
/// display form; structured detail is attached as a `google.rpc.ErrorInfo`
/// when the error exposes it.
pub fn error_to_status<E: AppError + ?Sized>(err: &E) -> Status {
    let code = kind_to_code(err.kind());
    let message = err.to_string();

    match err.details() {
        Some(details) => {
            let mut status_details = StatusDetails::new();
            status_details.set_error_info(details.reason, "", details.metadata);
            Status::with_error_details(code, message, status_details)
        }
        None => Status::new(code, message),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use thiserror::Error;

    use super::*;
    use crate::error::ErrorDetails;

    #[derive(Debug, Error)]
    #[error("quota exhausted for tenant")]
    struct QuotaError {
        detailed: bool,
    }

    impl AppError for QuotaError {
        fn kind(&self) -> Option<ErrorKind> {
            Some(ErrorKind::Conflict)
        }

        fn details(&self) -> Option<ErrorDetails> {
            if !self.detailed {
                return None;
            }
            let mut metadata = HashMap::new();
            metadata.insert("tenant".to_string(), "acme".to_string());
            Some(ErrorDetails {
                reason: "quota-exhausted".to_string(),
                metadata,
            })
        }
    }

    #[test]
    fn mapped_kinds_round_trip() {
        for kind in [
            ErrorKind::Unavailable,
            ErrorKind::Unauthorized,
            ErrorKind::Conflict,
            ErrorKind::NotImplemented,
            ErrorKind::InvalidArgument,
        ] {
            assert_eq!(kind_from_code(kind_to_code(Some(kind))), kind);
        }
    }

    #[test]
    fn unmapped_kinds_collapse_to_internal_code() {
        assert_eq!(kind_to_code(Some(ErrorKind::Internal)), Code::Internal);
        assert_eq!(kind_to_code(None), Code::Internal);
    }

    #[test]
    fn unmapped_codes_collapse_to_internal_kind() {
        assert_eq!(kind_from_code(Code::NotFound), ErrorKind::Internal);
        assert_eq!(kind_from_code(Code::DeadlineExceeded), ErrorKind::Internal);
        assert_eq!(kind_from_code(Code::Internal), ErrorKind::Internal);
    }

    #[test]
    fn remote_error_reclassifies_status() {
        let remote = RemoteError::from_status(&Status::unavailable("backend down"));
        assert_eq!(remote.kind(), ErrorKind::Unavailable);

        let remote = RemoteError::from_status(&Status::data_loss("corrupted"));
        assert_eq!(remote.kind(), ErrorKind::Internal);
    }

    #[test]
    fn translation_without_details_sets_code_and_message() {
        let status = error_to_status(&QuotaError { detailed: false });
        assert_eq!(status.code(), Code::AlreadyExists);
        assert_eq!(status.message(), "quota exhausted for tenant");
        assert!(status.get_details_error_info().is_none());
    }

    #[test]
    fn translation_attaches_structured_detail() {
        let status = error_to_status(&QuotaError { detailed: true });
        assert_eq!(status.code(), Code::AlreadyExists);

        let info = status.get_details_error_info().expect("error info detail");
        assert_eq!(info.reason, "quota-exhausted");
        assert_eq!(info.metadata.get("tenant").map(String::as_str), Some("acme"));
    }
}
