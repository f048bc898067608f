//! Serve orchestration: per-App poll and health loops between the control plane and
//! the local App server, plus the mapping between their vocabularies.

mod error;
pub use error::{CoreError, TranslateError};

pub mod translate;

mod config;
pub use config::ServeConfig;

mod poll;
pub use poll::{PollLoop, Step};

mod health;
pub use health::HealthLoop;

mod serve;
pub use serve::serve;

mod signal;
pub use signal::shutdown_on_signal;
