use std::sync::Arc;

use tracing::{info, warn};

use squall_control::ControlPlane;
use squall_core::{ServeConfig, serve, shutdown_on_signal};

use super::Context;
use crate::{cli::ServeArgs, config::ConfigError, launch};

pub async fn run(ctx: &Context, args: ServeArgs) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let keys = match args.target {
        Some(key) => {
            if project.config.lookup(&key).is_none() {
                return Err(ConfigError::UnknownApp(key).into());
            }
            vec![key]
        }
        None => project.config.keys(),
    };
    if keys.is_empty() {
        anyhow::bail!("no apps configured in squall.yaml");
    }

    let control: Arc<dyn ControlPlane> = ctx.control_plane()?;
    let cfg = ServeConfig {
        poll_interval: args.poll_interval,
        operation_timeout: args.operation_timeout,
        list_timeout: args.list_timeout,
        health_interval: args.healthcheck_interval,
        ..ServeConfig::default()
    };

    let shutdown = shutdown_on_signal()?;
    let started = launch::start(&project, keys, &shutdown).await?;
    let serving: Vec<String> = started.runners.iter().map(|r| r.key().to_string()).collect();
    info!(target: "squall.cli", apps = ?serving, "serving");

    let loops = tokio::spawn(serve(started.runners, control, cfg, shutdown.clone()));
    shutdown.cancelled().await;
    info!(target: "squall.cli", "shutting down");
    if let Err(e) = loops.await {
        warn!(target: "squall.cli", error = %e, "serve task failed");
    }

    started.process.terminate().await;
    info!(target: "squall.cli", "app server stopped");
    Ok(())
}
