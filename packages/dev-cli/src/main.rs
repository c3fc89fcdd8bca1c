//! Developer CLI for the pipelines workspace.
//!
//! Runs pipeline turns from the terminal, queries a keyword knowledge base
//! and evaluates it against a list of questions. Without a subcommand an
//! interactive menu is shown.

mod cmd;
mod context;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::context::AppContext;

#[derive(Parser)]
#[command(name = "dev", about = "Pipelines developer tools")]
struct Cli {
    /// Suppress headers and informational output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with a pipeline, one turn per line
    Chat {
        /// Pipeline id (see `dev chat --list`)
        #[arg(short, long, default_value = "helpdesk")]
        pipeline: String,

        /// List the available pipelines and exit
        #[arg(long)]
        list: bool,
    },
    /// Show the documents tagged with any of the keywords
    Lookup {
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Knowledge base file (embedded base when omitted)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Answer every question of a file with keyword retrieval
    Eval {
        /// One question per line; blank lines and `#` comments are skipped
        questions: PathBuf,

        /// Knowledge base file
        #[arg(long)]
        db: PathBuf,

        /// Also print the selected keywords and retrieved documents
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show the valve values, secrets masked
    Valves,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.quiet)?;

    match cli.command {
        Some(Command::Chat { pipeline, list }) => {
            if list {
                cmd::chat::list_pipelines(&ctx)
            } else {
                cmd::chat::run(&ctx, &pipeline).await
            }
        }
        Some(Command::Lookup { keywords, db }) => cmd::lookup::run(&ctx, &keywords, db.as_deref()),
        Some(Command::Eval {
            questions,
            db,
            verbose,
        }) => cmd::eval::run(&ctx, &questions, &db, verbose).await,
        Some(Command::Valves) => cmd::valves::show(&ctx),
        None => interactive(&ctx).await,
    }
}

async fn interactive(ctx: &AppContext) -> Result<()> {
    println!("{}", "╔════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║        UTC Pipelines Dev CLI           ║".bright_cyan());
    println!("{}", "╚════════════════════════════════════════╝".bright_cyan());

    loop {
        println!();
        let options = [
            "💬 Chat with the helpdesk",
            "📄 Chat with the document analyzer",
            "🔧 Show valves",
            "🛑 Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => cmd::chat::run(ctx, "helpdesk").await?,
            1 => cmd::chat::run(ctx, "document-analyzer").await?,
            2 => cmd::valves::show(ctx)?,
            _ => {
                println!("{}", "👋 Goodbye!".bright_blue());
                return Ok(());
            }
        }
    }
}
