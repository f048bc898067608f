use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, info, info_span, warn};

use squall_app::{Runner, proto::HealthCheckRequest};
use squall_control::ControlPlane;
use squall_model::{HealthReport, HealthReportItem};

use crate::{config::ServeConfig, error::CoreError, poll::bounded, translate};

/// Periodic health passes for one App version: one right away, then every interval.
pub struct HealthLoop {
    runner: Runner,
    control: Arc<dyn ControlPlane>,
    cfg: ServeConfig,
    span: Span,
}

impl HealthLoop {
    pub fn new(runner: Runner, control: Arc<dyn ControlPlane>, cfg: ServeConfig) -> Self {
        let span = info_span!(target: "squall.health", "health", app = %runner.app_id(), version = %runner.version());
        Self {
            runner,
            control,
            cfg,
            span,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let span = self.span.clone();
        async move {
            info!(target: "squall.health", interval = ?self.cfg.health_interval, "health checks started");

            let mut ticker = tokio::time::interval(self.cfg.health_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Types that support health checks; fetched once, retried on later ticks until it succeeds.
            let mut checked: Option<Vec<String>> = None;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = self.tick(&mut checked) => {}
                }
            }
            info!(target: "squall.health", "health checks stopped");
        }
        .instrument(span)
        .await
    }

    async fn tick(&self, checked: &mut Option<Vec<String>>) {
        if checked.is_none() {
            match self.catalogue().await {
                Ok(types) => {
                    debug!(target: "squall.health", types = ?types, "health-checked resource types");
                    *checked = Some(types);
                }
                Err(e) => {
                    warn!(target: "squall.health", error = %e, "describe failed, skipping health pass");
                    return;
                }
            }
        }
        let types = checked.as_deref().unwrap_or_default();

        match self.pass(types).await {
            Ok(0) => debug!(target: "squall.health", "nothing to report"),
            Ok(n) => info!(target: "squall.health", reports = n, "health reported"),
            Err(e) => warn!(target: "squall.health", error = %e, "health pass abandoned"),
        }
    }

    /// Resource types whose definition has health checks enabled.
    pub async fn catalogue(&self) -> Result<Vec<String>, CoreError> {
        let described = bounded(self.cfg.health_timeout, self.runner.client().describe()).await?;
        Ok(described
            .resource_definitions
            .into_iter()
            .filter(|def| def.healthcheck_supported)
            .map(|def| def.r#type)
            .collect())
    }

    /// Check every type, then post the whole set once. Returns the number of items posted.
    ///
    /// The first failing RPC abandons the pass without posting anything.
    pub async fn pass(&self, types: &[String]) -> Result<usize, CoreError> {
        let mut items = Vec::new();
        for kind in types {
            let request = HealthCheckRequest {
                r#type: kind.clone(),
            };
            let response =
                bounded(self.cfg.health_timeout, self.runner.client().health_check(request)).await?;

            match translate::health_status(response.status) {
                Some(status) => items.push(HealthReportItem {
                    kind: kind.clone(),
                    status,
                    message: Some(response.message),
                }),
                None => debug!(target: "squall.health", resource = %kind, "unspecified status, not reported"),
            }
        }

        if items.is_empty() {
            return Ok(0);
        }
        let report = HealthReport {
            app_id: self.runner.app_id().to_string(),
            version: self.runner.version().to_string(),
            health_reports: items,
        };
        self.control.report_health(&report).await?;
        Ok(report.health_reports.len())
    }
}
