use std::{sync::Arc, time::Duration};

use tracing::{debug, info, instrument};

use squall_model::AppKey;

use crate::{
    client::{AppClient, GrpcAppClient},
    error::AppError,
    runner::Runner,
};

/// Reachability probe schedule: a fixed delay between a bounded number of attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbePolicy {
    pub attempts: u32,
    pub delay: Duration,
    /// Bound on a single Describe call.
    pub attempt_timeout: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

/// Call Describe until it succeeds, sleeping `policy.delay` between failures.
///
/// Returns the number of attempts used.
pub async fn probe(client: &dyn AppClient, policy: ProbePolicy) -> Result<u32, AppError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = match tokio::time::timeout(policy.attempt_timeout, client.describe()).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(AppError::Timeout(policy.attempt_timeout)),
        };

        match result {
            Ok(()) => return Ok(attempt),
            Err(e) if attempt >= attempts => {
                return Err(AppError::Unreachable {
                    attempts,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                debug!(target: "squall.app", attempt, error = %e, "app not reachable yet");
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

/// Wrap an existing client into a [`Runner`] once it answers Describe.
#[instrument(level = "debug", skip(client, policy), fields(app = %key))]
pub async fn register(
    key: AppKey,
    client: Arc<dyn AppClient>,
    policy: ProbePolicy,
) -> Result<Runner, AppError> {
    let attempts = probe(client.as_ref(), policy).await?;
    info!(target: "squall.app", app = %key, attempts, "app reachable");
    Ok(Runner::new(key, client))
}

/// Build the gRPC client for `key` on the local App server and probe it.
pub async fn connect_runner(
    key: AppKey,
    port: u16,
    policy: ProbePolicy,
) -> Result<Runner, AppError> {
    let client = GrpcAppClient::new(port, &key)?;
    register(key, Arc::new(client), policy).await
}

/// One runner per key, in order. The first unreachable App aborts the whole start.
pub async fn start_runners<I>(keys: I, port: u16, policy: ProbePolicy) -> Result<Vec<Runner>, AppError>
where
    I: IntoIterator<Item = AppKey>,
{
    let mut runners = Vec::new();
    for key in keys {
        runners.push(connect_runner(key, port, policy).await?);
    }
    Ok(runners)
}
