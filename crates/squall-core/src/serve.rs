use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use squall_app::Runner;
use squall_control::ControlPlane;

use crate::{config::ServeConfig, health::HealthLoop, poll::PollLoop};

/// Start a poll loop and a health loop per runner and wait until all have stopped.
///
/// The loops only stop once `shutdown` is cancelled.
pub async fn serve(
    runners: Vec<Runner>,
    control: Arc<dyn ControlPlane>,
    cfg: ServeConfig,
    shutdown: CancellationToken,
) {
    let mut loops = JoinSet::new();
    for runner in runners {
        info!(target: "squall.serve", app = %runner.key(), "starting poll and health loops");
        loops.spawn(
            HealthLoop::new(runner.clone(), Arc::clone(&control), cfg.clone()).run(shutdown.clone()),
        );
        loops.spawn(PollLoop::new(runner, Arc::clone(&control), cfg.clone()).run(shutdown.clone()));
    }

    while let Some(joined) = loops.join_next().await {
        if let Err(e) = joined {
            warn!(target: "squall.serve", error = %e, "loop task failed");
        }
    }
    info!(target: "squall.serve", "all loops stopped");
}
