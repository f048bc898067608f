use std::{path::PathBuf, process::Stdio, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader, Lines},
    process::{Child, ChildStdout, Command},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    error::{ExecError, ExecResult},
    util::kill_graceful,
};

/// How to start the App server.
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    /// Working directory of the child; must exist and be a directory.
    pub build_dir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Upper bound on the wait for the port line. Covers toolchain compile time.
    pub startup_timeout: Duration,
    /// Time between SIGTERM and SIGKILL on termination.
    pub kill_grace: Duration,
}

impl LaunchConfig {
    /// `go run .` inside `build_dir`.
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            program: "go".to_string(),
            args: vec!["run".to_string(), ".".to_string()],
            env: Vec::new(),
            startup_timeout: Duration::from_secs(120),
            kill_grace: Duration::from_secs(5),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}

/// A running App server.
///
/// The child is owned by a background supervisor task. [`AppProcess::terminate`] stops it,
/// and so does cancelling the shutdown token passed to [`launch`].
pub struct AppProcess {
    port: u16,
    pid: Option<u32>,
    cancel: CancellationToken,
    supervisor: JoinHandle<()>,
}

impl AppProcess {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Stop the process and wait until it has been reaped.
    pub async fn terminate(self) {
        self.cancel.cancel();
        if let Err(e) = self.supervisor.await {
            warn!(target: "squall.exec", error = %e, "app supervisor task failed");
        }
    }
}

/// Start the App server and block until it announces its port.
///
/// Cancelling `shutdown` aborts the wait and, once the server is up, stops it. Whenever
/// startup fails after the spawn, the whole process group is killed before returning.
pub async fn launch(cfg: &LaunchConfig, shutdown: &CancellationToken) -> ExecResult<AppProcess> {
    validate_build_dir(cfg)?;

    let mut cmd = Command::new(&cfg.program);
    cmd.args(&cfg.args)
        .current_dir(&cfg.build_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (k, v) in &cfg.env {
        cmd.env(k, v);
    }
    #[cfg(unix)]
    cmd.process_group(0);

    trace!(target: "squall.exec", program = %cfg.program, args = ?cfg.args, dir = %cfg.build_dir.display(), "spawn");
    let mut child = cmd
        .spawn()
        .map_err(|e| ExecError::Spawn(format!("{}: {e}", cfg.program)))?;
    let pid = child.id();

    let announced = tokio::select! {
        _ = shutdown.cancelled() => Err(ExecError::Cancelled),
        res = announce(&mut child, cfg.startup_timeout) => res,
    };
    let (port, stdout) = match announced {
        Ok(found) => found,
        Err(e) => {
            debug!(target: "squall.exec", pid, error = %e, "startup failed, killing app process group");
            if let Err(kill) = kill_graceful(&mut child, cfg.kill_grace).await {
                warn!(target: "squall.exec", pid, error = %kill, "failed to kill app process");
            }
            return Err(e);
        }
    };
    info!(target: "squall.exec", port, pid, "app process listening");

    tokio::spawn(forward(stdout, "stdout"));

    let cancel = shutdown.child_token();
    let supervisor = tokio::spawn(supervise(child, cancel.clone(), cfg.kill_grace));

    Ok(AppProcess {
        port,
        pid,
        cancel,
        supervisor,
    })
}

/// Wire up output forwarding and read the port from the first stdout line.
async fn announce(
    child: &mut Child,
    timeout: Duration,
) -> ExecResult<(u16, Lines<BufReader<ChildStdout>>)> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::Io("stdout not captured".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecError::Io("stderr not captured".into()))?;

    tokio::spawn(forward(BufReader::new(stderr).lines(), "stderr"));

    let mut stdout = BufReader::new(stdout).lines();
    let first = match tokio::time::timeout(timeout, stdout.next_line()).await {
        Err(_) => return Err(ExecError::StartupTimeout(timeout)),
        Ok(Err(e)) => return Err(ExecError::Io(format!("read port line: {e}"))),
        Ok(Ok(None)) => return Err(ExecError::NoPort),
        Ok(Ok(Some(line))) => line,
    };
    Ok((parse_port_line(&first)?, stdout))
}

/// Parse the port announcement. Surrounding whitespace is ignored; zero is rejected.
pub fn parse_port_line(line: &str) -> ExecResult<u16> {
    match line.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ExecError::InvalidPort(line.to_string())),
    }
}

fn validate_build_dir(cfg: &LaunchConfig) -> ExecResult<()> {
    let meta = std::fs::metadata(&cfg.build_dir)
        .map_err(|_| ExecError::MissingBuildDir(cfg.build_dir.clone()))?;
    if !meta.is_dir() {
        return Err(ExecError::NotADirectory(cfg.build_dir.clone()));
    }
    Ok(())
}

async fn forward<R>(mut lines: Lines<BufReader<R>>, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => info!(target: "squall.exec.app", stream, "{line}"),
            Ok(None) => break,
            Err(e) => {
                debug!(target: "squall.exec", stream, error = %e, "stopped reading app output");
                break;
            }
        }
    }
}

async fn supervise(mut child: Child, cancel: CancellationToken, grace: Duration) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => warn!(target: "squall.exec", %status, "app process exited"),
            Err(e) => warn!(target: "squall.exec", error = %e, "failed to wait for app process"),
        },
        _ = cancel.cancelled() => {
            debug!(target: "squall.exec", "terminating app process");
            if let Err(e) = kill_graceful(&mut child, grace).await {
                warn!(target: "squall.exec", error = %e, "failed to kill app process");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn script(dir: &tempfile::TempDir, body: &str) -> LaunchConfig {
        LaunchConfig::new(dir.path())
            .with_program("sh", vec!["-c".to_string(), body.to_string()])
            .with_startup_timeout(Duration::from_secs(10))
    }

    #[cfg(target_os = "linux")]
    /// Pid written by the script to `bg.pid`.
    fn background_pid(dir: &tempfile::TempDir) -> u32 {
        std::fs::read_to_string(dir.path().join("bg.pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    #[cfg(target_os = "linux")]
    /// Running and not yet a zombie.
    fn alive(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit(") ")
                .next()
                .is_some_and(|rest| !rest.starts_with('Z') && !rest.starts_with('X')),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    async fn assert_gone(pid: u32) {
        for _ in 0..50 {
            if !alive(pid) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("process {pid} outlived its group");
    }

    #[test]
    fn port_line_parsing() {
        assert_eq!(parse_port_line("8080").unwrap(), 8080);
        assert_eq!(parse_port_line(" 41234\r").unwrap(), 41234);
        for bad in ["", "0", "70000", "listening on 8080", "-1"] {
            assert!(
                matches!(parse_port_line(bad), Err(ExecError::InvalidPort(_))),
                "{bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn discovers_port_from_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = script(&dir, "echo 41234; echo started; echo warming >&2; sleep 30");

        let process = launch(&cfg, &CancellationToken::new()).await.unwrap();
        assert_eq!(process.port(), 41234);
        assert!(process.pid().is_some());

        tokio::time::timeout(Duration::from_secs(10), process.terminate())
            .await
            .expect("terminate should not hang");
    }

    #[tokio::test]
    async fn non_numeric_first_line_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = script(&dir, "echo booting; echo 41234; sleep 30");

        let err = launch(&cfg, &CancellationToken::new()).await.err().unwrap();
        assert!(matches!(err, ExecError::InvalidPort(line) if line == "booting"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn bad_port_line_kills_the_group() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = script(&dir, "sleep 317 & echo $! > bg.pid; echo notaport; wait");

        let err = launch(&cfg, &CancellationToken::new()).await.err().unwrap();
        assert!(matches!(err, ExecError::InvalidPort(_)));
        assert_gone(background_pid(&dir)).await;
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn shutdown_during_startup_kills_the_group() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = script(&dir, "sleep 317 & echo $! > bg.pid; wait");
        let shutdown = CancellationToken::new();

        let trigger = shutdown.clone();
        let pid_file = dir.path().join("bg.pid");
        tokio::spawn(async move {
            while !std::fs::read_to_string(&pid_file).is_ok_and(|pid| pid.ends_with('\n')) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            trigger.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(5), launch(&cfg, &shutdown))
            .await
            .expect("cancelled startup should return")
            .err()
            .unwrap();
        assert!(matches!(err, ExecError::Cancelled));
        assert_gone(background_pid(&dir)).await;
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn shutdown_after_startup_stops_the_server() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = script(&dir, "sleep 317 & echo $! > bg.pid; echo 41234; wait");
        let shutdown = CancellationToken::new();

        let process = launch(&cfg, &shutdown).await.unwrap();
        let pid = background_pid(&dir);
        assert!(alive(pid));

        shutdown.cancel();
        assert_gone(pid).await;
        process.terminate().await;
    }

    #[tokio::test]
    async fn stdout_closed_before_port_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = script(&dir, "echo only-stderr >&2");

        let err = launch(&cfg, &CancellationToken::new()).await.err().unwrap();
        assert!(matches!(err, ExecError::NoPort));
    }

    #[tokio::test]
    async fn runs_inside_build_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("port.txt"), "5150\n").unwrap();
        let cfg = script(&dir, "cat port.txt; sleep 30");

        let process = launch(&cfg, &CancellationToken::new()).await.unwrap();
        assert_eq!(process.port(), 5150);
        process.terminate().await;
    }

    #[tokio::test]
    async fn missing_build_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LaunchConfig::new(dir.path().join("nope"));

        let err = launch(&cfg, &CancellationToken::new()).await.err().unwrap();
        assert!(matches!(err, ExecError::MissingBuildDir(_)));
    }

    #[tokio::test]
    async fn file_as_build_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.go");
        std::fs::write(&file, "package main").unwrap();

        let err = launch(&LaunchConfig::new(file), &CancellationToken::new()).await.err().unwrap();
        assert!(matches!(err, ExecError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn unknown_program_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LaunchConfig::new(dir.path()).with_program("squall-no-such-binary", vec![]);

        let err = launch(&cfg, &CancellationToken::new()).await.err().unwrap();
        assert!(matches!(err, ExecError::Spawn(_)));
    }
}
