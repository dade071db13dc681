// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `errors.rs`

#[cfg(test)]
mod tests {
    use crate::errors::{ErrorKind, ReconcileError};
    use crate::secret_store::StoreError;
    use crate::status_reasons::*;
    use crate::token::TokenError;
    use std::time::Duration;

    fn unavailable() -> StoreError {
        StoreError::Kube(kube::Error::Api(Box::new(kube::core::Status {
            status: Some(kube::core::response::StatusSummary::Failure),
            message: "etcdserver: request timed out".to_string(),
            reason: "InternalError".to_string(),
            code: 500,
            metadata: None,
            details: None,
        })))
    }

    #[test]
    fn test_spec_and_reference_errors_are_permanent() {
        let missing = ReconcileError::MissingSpecFields {
            missing: vec!["clientId", "gitUrl"],
        };
        assert_eq!(missing.kind(), ErrorKind::Permanent);
        assert_eq!(missing.reason(), REASON_INVALID_SPEC);
        assert_eq!(
            missing.to_string(),
            "missing required fields: clientId, gitUrl"
        );

        let bad_ref = ReconcileError::InvalidSecretRef {
            namespace: "team-a".into(),
            field: "key",
        };
        assert_eq!(bad_ref.kind(), ErrorKind::Permanent);
        assert_eq!(bad_ref.reason(), REASON_SECRET_ERROR);
        assert!(bad_ref.retry_after().is_none());
    }

    #[test]
    fn test_credential_lookup_errors_are_retryable() {
        let not_found = ReconcileError::CredentialNotFound {
            namespace: "team-a".into(),
            name: "sp-credentials".into(),
            retry_after: Duration::from_secs(10),
        };
        assert_eq!(
            not_found.kind(),
            ErrorKind::Retryable {
                delay: Duration::from_secs(10)
            }
        );
        assert_eq!(not_found.reason(), REASON_SECRET_ERROR);

        let lookup = ReconcileError::CredentialLookup {
            namespace: "team-a".into(),
            name: "sp-credentials".into(),
            source: unavailable(),
            retry_after: Duration::from_secs(7),
        };
        assert!(lookup.is_retryable());
        assert_eq!(lookup.retry_after(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_empty_credential_is_permanent_token_error() {
        let err = ReconcileError::EmptyCredential {
            namespace: "team-a".into(),
            name: "sp-credentials".into(),
            key: "clientSecret".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert_eq!(err.reason(), REASON_TOKEN_ERROR);
    }

    #[test]
    fn test_token_errors_are_permanent() {
        let err: ReconcileError = TokenError::Status {
            status: 503,
            body: "busy".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert_eq!(err.reason(), REASON_TOKEN_ERROR);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_secret_write_and_delete_keep_their_classification() {
        let write = ReconcileError::SecretWrite {
            namespace: "argocd".into(),
            name: "demo-team-a-argocd-token".into(),
            source: unavailable(),
            retry_after: Duration::from_secs(10),
        };
        assert!(write.is_retryable());
        assert_eq!(write.reason(), REASON_SECRET_WRITE_FAILED);
        assert!(write.to_string().contains("etcdserver: request timed out"));

        let delete = ReconcileError::SecretDelete {
            namespace: "argocd".into(),
            name: "demo-team-a-argocd-token".into(),
            source: unavailable(),
            retry_after: Duration::from_secs(10),
        };
        assert!(delete.is_retryable());
        assert_eq!(delete.reason(), REASON_SECRET_DELETE_FAILED);
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::Permanent.as_str(), "permanent");
        assert_eq!(
            ErrorKind::Retryable {
                delay: Duration::from_secs(1)
            }
            .to_string(),
            "retryable"
        );
    }
}
