// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! replyd - review ingestion and reply dispatch.
//!
//! This is the binary entry point: operator commands plus the `serve` daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use replyd_config::model::ReplydConfig;
use replyd_core::ReplyStatus;
use replyd_core::types::ReviewTab;

/// replyd - pull platform reviews and post templated replies.
#[derive(Parser, Debug)]
#[command(name = "replyd", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the periodic sync and dispatch tasks until interrupted.
    Serve,
    /// Run one review sync pass over every account.
    Sync {
        /// Only this account.
        #[arg(long)]
        account: Option<i64>,
    },
    /// Run one dispatch pass over pending reply jobs.
    Dispatch,
    /// Manage stores.
    #[command(subcommand)]
    Store(StoreCommands),
    /// Manage platform accounts.
    #[command(subcommand)]
    Account(AccountCommands),
    /// Manage reply templates.
    #[command(subcommand)]
    Template(TemplateCommands),
    /// List synchronized reviews.
    Reviews {
        /// Earliest review time (RFC 3339 or YYYY-MM-DD), inclusive.
        #[arg(long)]
        from: Option<String>,
        /// Latest review time (RFC 3339 or YYYY-MM-DD), inclusive.
        #[arg(long)]
        to: Option<String>,
        /// Only reviews in this tab: 미등록, 등록대기, 완료.
        #[arg(long)]
        tab: Option<ReviewTab>,
    },
    /// Create replies.
    #[command(subcommand)]
    Reply(ReplyCommands),
    /// Inspect and re-queue reply jobs.
    #[command(subcommand)]
    Jobs(JobCommands),
    /// Check storage and connector health.
    Health,
}

#[derive(Subcommand, Debug)]
enum StoreCommands {
    /// Register a store.
    Add { name: String },
    /// List stores.
    List,
}

#[derive(Subcommand, Debug)]
enum AccountCommands {
    /// Register a platform account. The credential is read from the prompt
    /// or REPLYD_ACCOUNT_CREDENTIAL and stored encrypted.
    Add {
        #[arg(long)]
        store: i64,
        #[arg(long)]
        platform: String,
        #[arg(long)]
        login: String,
    },
    /// List accounts with masked credentials.
    List,
}

#[derive(Subcommand, Debug)]
enum TemplateCommands {
    /// Create a template. Placeholders: {매장명} {플랫폼} {고객명} {메뉴}.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        body: String,
    },
    /// List templates.
    List,
    /// Delete a template. Existing replies keep their content.
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ReplyCommands {
    /// Render a template for each review and queue the replies.
    Bulk {
        #[arg(long)]
        template: i64,
        /// Review ids, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        reviews: Vec<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum JobCommands {
    /// List jobs, newest first.
    List {
        #[arg(long)]
        status: Option<ReplyStatus>,
    },
    /// Move a FAILED job back to PENDING.
    Requeue { id: i64 },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => replyd_config::load_and_validate_path(path),
        None => replyd_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            replyd_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    if let Err(e) = run(cli.command, cli.config, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(
    command: Option<Commands>,
    config_path: Option<PathBuf>,
    config: ReplydConfig,
) -> Result<(), replyd_core::ReplydError> {
    let Some(command) = command else {
        println!("replyd: use --help for available commands");
        return Ok(());
    };

    match command {
        Commands::Serve => serve::run_serve(config, config_path).await,
        Commands::Sync { account } => commands::run_sync(&config, account).await,
        Commands::Dispatch => commands::run_dispatch(&config).await,
        Commands::Store(StoreCommands::Add { name }) => commands::store_add(&config, &name).await,
        Commands::Store(StoreCommands::List) => commands::store_list(&config).await,
        Commands::Account(AccountCommands::Add {
            store,
            platform,
            login,
        }) => commands::account_add(&config, store, &platform, &login).await,
        Commands::Account(AccountCommands::List) => commands::account_list(&config).await,
        Commands::Template(TemplateCommands::Add { name, body }) => {
            commands::template_add(&config, &name, &body).await
        }
        Commands::Template(TemplateCommands::List) => commands::template_list(&config).await,
        Commands::Template(TemplateCommands::Delete { id }) => {
            commands::template_delete(&config, id).await
        }
        Commands::Reviews { from, to, tab } => {
            commands::reviews(&config, from.as_deref(), to.as_deref(), tab).await
        }
        Commands::Reply(ReplyCommands::Bulk { template, reviews }) => {
            commands::reply_bulk(&config, template, &reviews).await
        }
        Commands::Jobs(JobCommands::List { status }) => commands::jobs_list(&config, status).await,
        Commands::Jobs(JobCommands::Requeue { id }) => commands::jobs_requeue(&config, id).await,
        Commands::Health => commands::health(&config).await,
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("replyd={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
