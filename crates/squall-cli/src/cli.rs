use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use squall_control::DEFAULT_ENDPOINT;
use squall_model::AppKey;
use squall_observe::LoggerFormat;

#[derive(Parser, Debug)]
#[command(name = "squall", version, about = "Run squall Apps locally and connect them to the control plane")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Control-plane API endpoint
    #[arg(long, global = true, env = "SQUALL_API_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub api_endpoint: String,

    /// Path to the config file (default: squall.yaml in the working directory or a parent)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log output format: text, json or journald
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LoggerFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Develop, test and serve Apps
    App {
        #[command(subcommand)]
        command: AppCommand,
    },

    /// Manage the API token
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Run Apps and execute the operations the control plane hands out.
    ///
    /// Without an argument every App in squall.yaml is served.
    Serve(ServeArgs),

    /// Show the resource types and operations an App supports
    Describe(DescribeArgs),

    /// Register an App version's capabilities with the control plane
    Connect(ConnectArgs),

    /// Run a single operation against a local App
    Test(TestArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// App to serve, as <app_id>:<version>
    pub target: Option<AppKey>,

    /// Interval between health checks
    #[arg(short = 'i', long, value_parser = humantime::parse_duration, default_value = "5m")]
    pub healthcheck_interval: Duration,

    /// Bound on one create, read, update or delete call
    #[arg(long, value_parser = humantime::parse_duration, default_value = "5m")]
    pub operation_timeout: Duration,

    /// Bound on one list call
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub list_timeout: Duration,

    /// Wait after an empty or failed poll
    #[arg(long, value_parser = humantime::parse_duration, default_value = "5s")]
    pub poll_interval: Duration,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// App to describe, as <app_id>:<version>
    pub target: AppKey,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// App to connect, as <app_id>:<version>
    pub target: AppKey,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// App to test, as <app_id>:<version>
    pub target: AppKey,

    /// Resource type to test
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Operation: create, read, update, delete or list
    #[arg(short = 'o', long)]
    pub operation: Option<String>,

    /// JSON input for create and update
    #[arg(short = 'i', long)]
    pub input: Option<String>,

    /// Environment variable passed to the operation, KEY=VALUE
    #[arg(long = "env")]
    pub env: Vec<String>,

    /// External id of the resource; required for read, update and delete
    #[arg(short = 'e', long)]
    pub external_id: Option<String>,

    /// Project id sent in the metadata; random when absent
    #[arg(long)]
    pub project_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Store an API token
    Login {
        /// Read the token from stdin
        #[arg(short = 't', long)]
        with_token: bool,
    },

    /// Remove the stored token
    Logout,

    /// Show the token in use
    Show,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_parses_target_and_durations() {
        let cli = Cli::try_parse_from([
            "squall",
            "app",
            "serve",
            "billing:v2",
            "-i",
            "90s",
            "--operation-timeout",
            "10m",
        ])
        .unwrap();
        let Command::App {
            command: AppCommand::Serve(args),
        } = cli.command
        else {
            panic!("expected app serve");
        };
        assert_eq!(args.target, Some(AppKey::new("billing", "v2")));
        assert_eq!(args.healthcheck_interval, Duration::from_secs(90));
        assert_eq!(args.operation_timeout, Duration::from_secs(600));
        assert_eq!(args.list_timeout, Duration::from_secs(30));
        assert_eq!(args.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn malformed_target_is_rejected() {
        for bad in ["billing", "billing:", ":v1"] {
            assert!(Cli::try_parse_from(["squall", "app", "describe", bad]).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "squall", "app", "test", "billing:v1", "-t", "invoice", "-o", "read", "-e", "inv-1",
            "--env", "A=1", "--env", "B=2",
        ])
        .unwrap();
        let Command::App {
            command: AppCommand::Test(args),
        } = cli.command
        else {
            panic!("expected app test");
        };
        assert_eq!(args.kind.as_deref(), Some("invoice"));
        assert_eq!(args.operation.as_deref(), Some("read"));
        assert_eq!(args.external_id.as_deref(), Some("inv-1"));
        assert_eq!(args.env, ["A=1", "B=2"]);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "squall",
            "auth",
            "show",
            "--api-endpoint",
            "http://localhost:9000",
            "--debug",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.api_endpoint, "http://localhost:9000");
        assert!(cli.debug);
        assert_eq!(cli.log_format, LoggerFormat::Json);
    }
}
