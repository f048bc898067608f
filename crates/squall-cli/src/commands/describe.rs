use std::{fmt::Write as _, path::Path};

use squall_app::proto::ResourceDefinition;
use squall_core::{shutdown_on_signal, translate::link_kind_from_proto};
use squall_model::AppKey;

use super::Context;
use crate::{cli::DescribeArgs, config::ConfigError, launch};

pub async fn run(ctx: &Context, args: DescribeArgs) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let app = project
        .config
        .lookup(&args.target)
        .ok_or_else(|| ConfigError::UnknownApp(args.target.clone()))?;
    let location = project.app_path(app);

    let shutdown = shutdown_on_signal()?;
    let started = launch::start(&project, vec![args.target.clone()], &shutdown).await?;
    let described = launch::until_shutdown(&shutdown, started.describe(&args.target)).await;
    let described = started.finish(&shutdown, described).await?;

    println!("squall App Description\n----------------------");
    println!(
        "{}",
        format_description(&described.resource_definitions, &args.target, &location)
    );
    Ok(())
}

fn checkmark(supported: bool) -> &'static str {
    if supported { "✅" } else { "❌" }
}

/// Human-readable summary of what an App version supports.
pub fn format_description(defs: &[ResourceDefinition], key: &AppKey, location: &Path) -> String {
    let mut s = String::new();
    let _ = write!(
        s,
        "\nDescribing app: {key}\nLocation: {}\n\n",
        location.display()
    );

    for def in defs {
        let _ = writeln!(s, "Resource Type: {}", def.display_name);

        if !def.links.is_empty() {
            s.push_str("\nLinks:\n");
            for link in &def.links {
                let kind = link_kind_from_proto(link.r#type);
                let _ = writeln!(s, "- {}: {} ({})", link.title, link.url, kind.as_str());
            }
        }

        s.push_str("\nOperations Supported:\n");
        for (name, supported) in [
            ("Read", def.read_supported),
            ("List", def.list_supported),
            ("Create", def.create_supported),
            ("Update", def.update_supported),
            ("Delete", def.delete_supported),
        ] {
            let _ = writeln!(s, "- {} {name}", checkmark(supported));
        }

        let _ = writeln!(
            s,
            "\nHealth Check Supported: {}",
            checkmark(def.healthcheck_supported)
        );

        if !def.instructions_markdown.is_empty() {
            s.push_str("\nUsage Instructions and Details:\n");
            s.push_str(&def.instructions_markdown);
            s.push('\n');
        }
    }
    s
}
