//! strapi-stack: declarative AWS stack planner for a Strapi deployment
//!
//! Builds the resource graph from a configuration snapshot and renders it
//! either as a human-readable plan or as a JSON document for the external
//! provisioning engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use strapi_stack::{config::StackSettings, render, secret, stack, state};

#[derive(Parser, Debug)]
#[command(name = "strapi-stack")]
#[command(about = "Declarative AWS stack planning for a Strapi deployment")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the plan in creation order
    Plan {
        /// Stack name (keys the persisted state)
        #[arg(short, long, default_value = "dev")]
        stack: String,

        /// Path to the configuration file
        #[arg(short, long, default_value = "stack.toml")]
        config: PathBuf,
    },

    /// Export the plan as JSON for the provisioning engine
    Export {
        /// Stack name (keys the persisted state)
        #[arg(short, long, default_value = "dev")]
        stack: String,

        /// Path to the configuration file
        #[arg(short, long, default_value = "stack.toml")]
        config: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the resolved configuration (secrets redacted)
    Config {
        /// Path to the configuration file
        #[arg(short, long, default_value = "stack.toml")]
        config: PathBuf,
    },

    /// Manage persisted per-stack state
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand, Debug)]
enum StateAction {
    /// Show tracked stacks and their stored secret names
    List,

    /// Drop a stack's persisted state (a new password will be generated
    /// on the next plan)
    Prune {
        /// Stack name
        stack: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Plan { stack, config } => {
            let plan = build_plan(&stack, &config)?;
            print!("{}", render::render_text(&plan)?);
        }

        Command::Export {
            stack,
            config,
            output,
        } => {
            let plan = build_plan(&stack, &config)?;
            let json = render::export_json(&plan)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Plan exported");
                }
                None => println!("{json}"),
            }
        }

        Command::Config { config } => {
            let settings = StackSettings::load(&config)?;
            print_settings(&settings);
        }

        Command::State { action } => match action {
            StateAction::List => state::list_cli()?,
            StateAction::Prune { stack } => state::prune_cli(&stack)?,
        },
    }

    Ok(())
}

fn build_plan(stack_name: &str, config: &PathBuf) -> Result<stack::StackPlan> {
    let settings = StackSettings::load(config)?;
    let conn = state::open_db()?;
    let db_password =
        secret::resolve_db_password(&conn, stack_name, settings.db_password.as_deref())?;
    let plan = stack::build(stack_name, &settings, &db_password)?;
    Ok(plan)
}

fn print_settings(s: &StackSettings) {
    println!("db_name           = {}", s.db_name);
    println!("db_username       = {}", s.db_username);
    println!("db_type           = {}", s.db_engine.as_str());
    println!("db_port           = {}", s.db_port());
    println!("db_instance_class = {}", s.db_instance_class);
    println!("db_storage        = {}", s.db_storage);
    println!(
        "db_password       = {}",
        if s.db_password.is_some() {
            "[configured]"
        } else {
            "[generated]"
        }
    );
    println!("app_port          = {}", s.app_port);
    println!("app_cpu           = {}", s.app_cpu);
    println!("app_memory        = {}", s.app_memory);
    println!("app_uploads_path  = {}", s.app_uploads_path);
    println!(
        "domain            = {}",
        s.domain.as_deref().unwrap_or("(unset)")
    );
    println!(
        "subdomain         = {}",
        s.subdomain.as_deref().unwrap_or("(unset)")
    );
    match &s.tags {
        None => println!("tags              = (none)"),
        Some(tags) => {
            for (k, v) in tags {
                println!("tags.{k} = {v}");
            }
        }
    }
}
