mod auth;
mod connect;
mod describe;
mod serve;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context as _;

#[cfg(not(feature = "keyring"))]
use squall_control::FileTokenStore;
use squall_control::{ControlConfig, HttpControlPlane, TokenStore, resolve_token_from_env};

use crate::{
    cli::{AppCommand, AuthCommand, Cli, Command},
    config::Project,
};

/// Global options every command may need.
pub struct Context {
    api_endpoint: String,
    config: Option<PathBuf>,
}

impl Context {
    pub fn project(&self) -> anyhow::Result<Project> {
        let cwd = std::env::current_dir().context("resolve working directory")?;
        Project::discover(self.config.as_deref(), &cwd).context("read config")
    }

    /// The OS keyring when built with the `keyring` feature, a file otherwise.
    pub fn token_store(&self) -> anyhow::Result<Box<dyn TokenStore>> {
        #[cfg(feature = "keyring")]
        let store = squall_control::KeyringTokenStore::new()?;
        #[cfg(not(feature = "keyring"))]
        let store = FileTokenStore::default_location()?;
        Ok(Box::new(store))
    }

    /// Authenticated control-plane client. Fails when no token can be resolved.
    pub fn control_plane(&self) -> anyhow::Result<Arc<HttpControlPlane>> {
        let store = self.token_store()?;
        let token = resolve_token_from_env(store.as_ref())?;
        let client = HttpControlPlane::new(&ControlConfig::new(self.api_endpoint.clone(), token))
            .context("build control-plane client")?;
        Ok(Arc::new(client))
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context {
        api_endpoint: cli.api_endpoint,
        config: cli.config,
    };

    match cli.command {
        Command::App { command } => match command {
            AppCommand::Serve(args) => serve::run(&ctx, args).await,
            AppCommand::Describe(args) => describe::run(&ctx, args).await,
            AppCommand::Connect(args) => connect::run(&ctx, args).await,
            AppCommand::Test(args) => test::run(&ctx, args).await,
        },
        Command::Auth { command } => match command {
            AuthCommand::Login { with_token } => auth::login(&ctx, with_token),
            AuthCommand::Logout => auth::logout(&ctx),
            AuthCommand::Show => auth::show(&ctx),
        },
    }
}

/// Ask until the answer is y or n. End of input counts as no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<bool> {
    let mut line = String::new();
    loop {
        write!(output, "(y/n): ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim() {
            "y" | "Y" => return Ok(true),
            "n" | "N" => return Ok(false),
            _ => writeln!(output, "Invalid input. Please enter 'y' or 'n'.")?,
        }
    }
}
