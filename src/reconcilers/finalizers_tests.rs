// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `finalizers.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{ServicePrincipalBinding, ServicePrincipalBindingSpec};
    use crate::labels::FINALIZER_SERVICE_PRINCIPAL;
    use crate::reconcilers::finalizers::has_finalizer;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    const TEST_NAMESPACE: &str = "team-a";
    const TEST_NAME: &str = "demo";

    fn binding_with_finalizers(finalizers: Option<Vec<String>>) -> ServicePrincipalBinding {
        ServicePrincipalBinding {
            metadata: ObjectMeta {
                name: Some(TEST_NAME.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                finalizers,
                ..Default::default()
            },
            spec: ServicePrincipalBindingSpec::default(),
            status: None,
        }
    }

    #[test]
    fn test_finalizer_constant() {
        assert_eq!(FINALIZER_SERVICE_PRINCIPAL, "k8sware.com/argocdsp-finalizer");
    }

    #[test]
    fn test_has_finalizer_none() {
        let sp = binding_with_finalizers(None);
        assert!(!has_finalizer(&sp, FINALIZER_SERVICE_PRINCIPAL));
    }

    #[test]
    fn test_has_finalizer_other_only() {
        let sp = binding_with_finalizers(Some(vec!["other.io/finalizer".to_string()]));
        assert!(!has_finalizer(&sp, FINALIZER_SERVICE_PRINCIPAL));
    }

    #[test]
    fn test_has_finalizer_present() {
        let sp = binding_with_finalizers(Some(vec![
            "other.io/finalizer".to_string(),
            FINALIZER_SERVICE_PRINCIPAL.to_string(),
        ]));
        assert!(has_finalizer(&sp, FINALIZER_SERVICE_PRINCIPAL));
    }
}
