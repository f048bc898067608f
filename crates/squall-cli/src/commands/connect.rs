use std::io;

use anyhow::Context as _;

use squall_app::proto::ResourceDefinition;
use squall_core::{shutdown_on_signal, translate::definition_from_proto};
use squall_model::{AppKey, ConnectRequest};

use super::{Context, confirm, describe::format_description};
use crate::{cli::ConnectArgs, config::ConfigError, launch};

const DASHBOARD_URL: &str = "https://app.squall.dev";

pub async fn run(ctx: &Context, args: ConnectArgs) -> anyhow::Result<()> {
    let key = args.target;
    let control = ctx.control_plane()?;
    let project = ctx.project()?;
    let app = project
        .config
        .lookup(&key)
        .ok_or_else(|| ConfigError::UnknownApp(key.clone()))?;
    let location = project.app_path(app);

    let shutdown = shutdown_on_signal()?;
    let started = launch::start(&project, vec![key.clone()], &shutdown).await?;
    let described = launch::until_shutdown(&shutdown, started.describe(&key)).await;
    let described = started.finish(&shutdown, described).await?;

    println!("squall App Connect\n------------------");
    println!(
        "{}",
        format_description(&described.resource_definitions, &key, &location)
    );
    println!(
        "The above capabilities will be connected to app {} at version {}.\n",
        key.app_id, key.version
    );

    if !args.yes {
        println!("Continue to connect this app to the squall API?");
        let answer = tokio::task::spawn_blocking(|| confirm(&mut io::stdin().lock(), &mut io::stdout()));
        let proceed = launch::until_shutdown(&shutdown, async {
            answer
                .await
                .context("read confirmation")
                .and_then(|read| read.context("read confirmation"))
        })
        .await?;
        if !proceed {
            println!("Exiting...");
            return Ok(());
        }
        println!();
    }

    let request = connect_request(&key, described.resource_definitions);
    let response = launch::until_shutdown(&shutdown, async {
        control
            .connect_version(&request)
            .await
            .context("connect version")
    })
    .await?;

    let url = response.app_url().unwrap_or(DASHBOARD_URL);
    println!("Successfully connected app to the squall API. View details at {url}\n");
    println!("To serve your app, run:\n\tsquall app serve {key}");
    Ok(())
}

fn connect_request(key: &AppKey, defs: Vec<ResourceDefinition>) -> ConnectRequest {
    ConnectRequest {
        app_id: key.app_id.clone(),
        version: key.version.clone(),
        resources: defs.into_iter().map(definition_from_proto).collect(),
    }
}
