use std::time::Duration;

use tokio::process::Child;

/// Ask the child's process group to stop, then kill it once `grace` has elapsed.
///
/// The child is spawned as the leader of its own group, so toolchain wrappers such as
/// `go run` take the compiled server down with them.
#[cfg(unix)]
pub async fn kill_graceful(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    if let Some(id) = child.id() {
        let pgid = -(id as libc::pid_t);
        // SAFETY: signalling a process group we created; no memory is shared.
        unsafe {
            libc::kill(pgid, libc::SIGTERM);
        }
        if tokio::time::timeout(grace, child.wait()).await.is_ok() {
            return Ok(());
        }
        // SAFETY: as above.
        unsafe {
            libc::kill(pgid, libc::SIGKILL);
        }
    }
    child.kill().await
}

#[cfg(not(unix))]
pub async fn kill_graceful(child: &mut Child, _grace: Duration) -> std::io::Result<()> {
    child.kill().await
}
