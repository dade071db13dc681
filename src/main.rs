// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use argocd_sp_operator::{
    config::Cli,
    constants::{CONTROLLER_NAME, TOKIO_WORKER_THREADS},
    context::Context,
    crd::ServicePrincipalBinding,
    errors::ReconcileError,
    labels::FINALIZER_SERVICE_PRINCIPAL,
    reconcilers::{
        finalizers::{ensure_finalizer, handle_deletion},
        locks::resource_key,
        status::patch_status,
        trigger::delay_after_failure,
        Outcome,
    },
    server::{start_server, ServerState},
};
use clap::Parser;
use futures::StreamExt;
use kube::{
    runtime::{controller, controller::Action, reflector::Store, watcher, Controller},
    Api, Client, ResourceExt,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name(CONTROLLER_NAME)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Respects RUST_LOG (default INFO) and RUST_LOG_FORMAT=json|text
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    // reqwest and kube both use rustls; pick the provider once for the process
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let cli = Cli::parse();
    let config = cli.controller_config()?;

    info!(
        deploy_namespace = %config.deploy_namespace,
        authority_host = %config.authority_host,
        refresh_interval_secs = config.refresh_interval.as_secs(),
        "Starting ServicePrincipalBinding controller"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let idle = config.idle;
    let ctx = Arc::new(Context::new(client.clone(), config)?);

    let state = Arc::new(ServerState::default());
    let server = tokio::spawn(start_server(cli.metrics_port, state.clone(), async {
        shutdown_signal().await;
    }));

    let api = Api::<ServicePrincipalBinding>::all(client);
    let controller = Controller::new(api, watcher::Config::default())
        .with_config(controller::Config::default().debounce(idle))
        .shutdown_on_signal();

    let pruner = tokio::spawn(prune_vanished_bindings(controller.store(), ctx.clone()));

    let controller = controller
        .run(reconcile_wrapper, error_policy, ctx)
        .for_each(|result| {
            match result {
                Ok((obj, action)) => debug!("Reconciled {}: {:?}", obj, action),
                Err(e) => debug!("Reconcile loop error: {}", e),
            }
            futures::future::ready(())
        });

    state.mark_ready();
    controller.await;
    pruner.abort();
    info!("Controller stopped, waiting for HTTP server");

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("HTTP server failed: {}", e),
        Err(e) => error!("HTTP server task panicked: {}", e),
    }

    info!("Graceful shutdown completed successfully");
    Ok(())
}

/// Resolve on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, initiating graceful shutdown..."),
        () = terminate => info!("Received SIGTERM (pod termination), initiating graceful shutdown..."),
    }
}

/// Periodically drop per-resource state for bindings no longer in the cache.
async fn prune_vanished_bindings(store: Store<ServicePrincipalBinding>, ctx: Arc<Context>) {
    if store.wait_until_ready().await.is_err() {
        debug!("Reflector store dropped before it became ready");
        return;
    }

    let mut ticker = tokio::time::interval(ctx.config().refresh_interval);
    loop {
        ticker.tick().await;
        let live: HashSet<String> = store
            .state()
            .iter()
            .map(|sp| resource_key(&sp.namespace().unwrap_or_default(), &sp.name_any()))
            .collect();
        debug!(live = live.len(), "Pruning state of vanished bindings");
        ctx.reconciler.retain_resources(&live);
    }
}

/// Reconcile wrapper for `ServicePrincipalBinding`
async fn reconcile_wrapper(
    sp: Arc<ServicePrincipalBinding>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    debug!(
        name = %sp.name_any(),
        namespace = ?sp.namespace(),
        "Reconcile wrapper called for ServicePrincipalBinding"
    );

    if sp.metadata.deletion_timestamp.is_some() {
        let target = sp.as_ref();
        let reconciler = &ctx.reconciler;
        handle_deletion(&ctx.client, target, FINALIZER_SERVICE_PRINCIPAL, move || async move {
            reconciler.cleanup(target).await.map(|_| ())
        })
        .await?;
        return Ok(Action::await_change());
    }

    ensure_finalizer(&ctx.client, sp.as_ref(), FINALIZER_SERVICE_PRINCIPAL).await?;

    let reconciliation = ctx.reconciler.reconcile(&sp).await;
    if let Some(status) = &reconciliation.status {
        patch_status(&ctx.client, &sp, status).await?;
    }

    match reconciliation.outcome {
        Outcome::Failed(err) => Err(err),
        Outcome::Synced(_) | Outcome::Skipped => Ok(Action::requeue(reconciliation.requeue_after)),
    }
}

/// Error policy for the controller
fn error_policy(
    sp: Arc<ServicePrincipalBinding>,
    err: &ReconcileError,
    ctx: Arc<Context>,
) -> Action {
    let delay = delay_after_failure(ctx.config(), err.kind());
    debug!(
        name = %sp.name_any(),
        namespace = ?sp.namespace(),
        kind = %err.kind(),
        delay_secs = delay.as_secs(),
        "Requeueing after error"
    );
    Action::requeue(delay)
}
