// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label, annotation and finalizer constants.
//!
//! This module defines the standard Kubernetes labels and the operator-specific
//! labels/annotations stamped on every derived secret, so that the GitOps tool and
//! operators can trace a secret back to the resource that owns it.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

/// Value for `app.kubernetes.io/managed-by` on derived secrets
pub const MANAGED_BY_OPERATOR: &str = "argocd-sp-operator";

/// Value for `app.kubernetes.io/part-of` on derived secrets
pub const PART_OF_ARGOCD: &str = "argocd";

// ============================================================================
// ArgoCD Labels
// ============================================================================

/// Label ArgoCD uses to classify credential secrets (`repository`, `repo-creds`, ...)
pub const ARGOCD_SECRET_TYPE_LABEL: &str = "argocd.argoproj.io/secret-type";

// ============================================================================
// Operator Annotations
// ============================================================================

/// Annotation naming the `ServicePrincipalBinding` a derived secret belongs to
pub const OWNER_NAME_ANNOTATION: &str = "k8sware.com/owner-name";

/// Annotation naming the namespace of the owning `ServicePrincipalBinding`
pub const OWNER_NAMESPACE_ANNOTATION: &str = "k8sware.com/owner-namespace";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer that keeps a `ServicePrincipalBinding` around until its derived secret is removed
pub const FINALIZER_SERVICE_PRINCIPAL: &str = "k8sware.com/argocdsp-finalizer";
