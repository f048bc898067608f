//! Launches the App server subprocess and discovers the port it listens on.
//!
//! The child must print its bound port as the very first line of stdout. Everything it
//! writes afterwards, on either stream, is forwarded to the log under `squall.exec.app`.

mod error;
pub use error::{ExecError, ExecResult};

mod launcher;
pub use launcher::{AppProcess, LaunchConfig, launch, parse_port_line};

mod util;
