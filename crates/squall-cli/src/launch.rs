use std::future::Future;

use anyhow::Context;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use squall_app::{ProbePolicy, Runner, proto::DescribeResponse, start_runners};
use squall_exec::{AppProcess, launch};
use squall_model::AppKey;

use crate::config::Project;

/// A termination signal arrived before the command finished.
#[derive(Debug, Error)]
#[error("interrupted")]
pub struct Interrupted;

/// The App server process and a registered runner per requested key.
pub struct Started {
    pub process: AppProcess,
    pub runners: Vec<Runner>,
}

/// Launch the project's App server and register `keys` against it.
///
/// The process is stopped again if any App fails to answer or `shutdown` fires first.
/// Once started, cancelling `shutdown` stops it as well.
pub async fn start(
    project: &Project,
    keys: Vec<AppKey>,
    shutdown: &CancellationToken,
) -> anyhow::Result<Started> {
    let cfg = project.launch_config();
    let process = match launch(&cfg, shutdown).await {
        Ok(process) => process,
        Err(_) if shutdown.is_cancelled() => return Err(Interrupted.into()),
        Err(e) => {
            return Err(e).with_context(|| format!("start app server in {}", cfg.build_dir.display()));
        }
    };
    info!(target: "squall.cli", port = process.port(), pid = ?process.pid(), "app server started");

    let port = process.port();
    let registered = until_shutdown(shutdown, async move {
        start_runners(keys, port, ProbePolicy::default())
            .await
            .context("reach local app")
    })
    .await;
    match registered {
        Ok(runners) => Ok(Started { process, runners }),
        Err(e) => {
            process.terminate().await;
            Err(e)
        }
    }
}

/// Run `work` unless `shutdown` fires first, in which case it is dropped and
/// [`Interrupted`] is returned.
pub async fn until_shutdown<T>(
    shutdown: &CancellationToken,
    work: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    tokio::select! {
        _ = shutdown.cancelled() => Err(Interrupted.into()),
        res = work => res,
    }
}

impl Started {
    /// Runner for `key`; `start` registered one per key, so a miss means the key was never requested.
    pub fn runner(&self, key: &AppKey) -> anyhow::Result<&Runner> {
        self.runners
            .iter()
            .find(|r| r.key() == key)
            .with_context(|| format!("app {key} was not started"))
    }

    pub async fn describe(&self, key: &AppKey) -> anyhow::Result<DescribeResponse> {
        self.runner(key)?
            .client()
            .describe()
            .await
            .context("reach local app")
    }

    /// Stop the App server and hand back `result`. Interruption wins over other errors.
    pub async fn finish<T>(
        self,
        shutdown: &CancellationToken,
        result: anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        self.process.terminate().await;
        match result {
            Err(_) if shutdown.is_cancelled() => Err(Interrupted.into()),
            other => other,
        }
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use std::{fs, time::Duration};

    use super::*;

    /// Project whose server backgrounds a long sleep, records its pid, then runs `tail`.
    fn project(dir: &tempfile::TempDir, tail: &str) -> Project {
        let path = dir.path().join("squall.yaml");
        let script = format!("sleep 317 & echo $! > bg.pid; {tail}");
        let yaml = format!(
            "launch:\n  program: sh\n  args: [\"-c\", {script:?}]\napps:\n  billing:\n    - path: .\n      version: v1\n"
        );
        fs::write(&path, yaml).unwrap();
        Project::discover(Some(&path), dir.path()).unwrap()
    }

    fn background_pid(dir: &tempfile::TempDir) -> Option<u32> {
        fs::read_to_string(dir.path().join("bg.pid"))
            .ok()
            .filter(|raw| raw.ends_with('\n'))
            .and_then(|raw| raw.trim().parse().ok())
    }

    fn alive(pid: u32) -> bool {
        fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
            stat.rsplit(") ")
                .next()
                .is_some_and(|rest| !rest.starts_with('Z') && !rest.starts_with('X'))
        })
    }

    async fn assert_gone(pid: u32) {
        for _ in 0..50 {
            if !alive(pid) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("app server child {pid} survived the interrupt");
    }

    #[tokio::test]
    async fn interrupt_while_starting_stops_the_server() {
        let dir = tempfile::tempdir().unwrap();
        let project = project(&dir, "wait");
        let shutdown = CancellationToken::new();

        let trigger = shutdown.clone();
        let root = dir.path().to_path_buf();
        tokio::spawn(async move {
            while !fs::read_to_string(root.join("bg.pid")).is_ok_and(|raw| raw.ends_with('\n')) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            trigger.cancel();
        });

        let keys = vec![AppKey::new("billing", "v1")];
        let err = tokio::time::timeout(Duration::from_secs(10), start(&project, keys, &shutdown))
            .await
            .expect("interrupted start should return")
            .err()
            .unwrap();
        assert!(err.is::<Interrupted>());
        assert_gone(background_pid(&dir).unwrap()).await;
    }

    #[tokio::test]
    async fn interrupt_while_reaching_the_app_stops_the_server() {
        let dir = tempfile::tempdir().unwrap();
        // Announces a port nothing listens on, so registration keeps retrying.
        let project = project(&dir, "echo 9; wait");
        let shutdown = CancellationToken::new();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let keys = vec![AppKey::new("billing", "v1")];
        let err = tokio::time::timeout(Duration::from_secs(10), start(&project, keys, &shutdown))
            .await
            .expect("interrupted start should return")
            .err()
            .unwrap();
        assert!(err.is::<Interrupted>());
        assert_gone(background_pid(&dir).unwrap()).await;
    }

    #[tokio::test]
    async fn until_shutdown_drops_pending_work() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let err = until_shutdown(&shutdown, std::future::pending::<anyhow::Result<()>>())
            .await
            .unwrap_err();
        assert!(err.is::<Interrupted>());

        let open = CancellationToken::new();
        assert_eq!(until_shutdown(&open, async { Ok(7) }).await.unwrap(), 7);
    }
}
