use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ragkit_cli::{AppConfig, load_files};
use ragkit_core::RagSystem;
use ragkit_server::{AppState, create_app, serve};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Retrieval-augmented question answering over local documents.
#[derive(Parser, Debug)]
#[command(name = "ragkit", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "RAGKIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Bind address, overriding the [server] section
        #[arg(long)]
        addr: Option<String>,
        /// Files to load before serving
        #[arg(short, long)]
        load: Vec<PathBuf>,
    },
    /// Answer a single question and exit
    Ask {
        question: String,
        /// Files to load as context
        #[arg(short, long)]
        load: Vec<PathBuf>,
        /// Output token budget
        #[arg(long)]
        max_tokens: Option<u32>,
    },
    /// Interactive question loop
    Chat {
        /// Files to load as context
        #[arg(short, long)]
        load: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    ragkit_telemetry::init_telemetry(&config.logging)?;

    let system = config.build_system()?;

    match cli.command {
        Commands::Serve { addr, load } => {
            load_files(&system, &load).await?;
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let app = create_app(AppState::new(Arc::new(system)), &config.server);
            serve(app, &addr).await?;
        }
        Commands::Ask { question, load, max_tokens } => {
            load_files(&system, &load).await?;
            let budget = max_tokens.unwrap_or(config.rag.max_output_tokens);
            println!("{}", system.process_query(&question, budget).await?);
        }
        Commands::Chat { load } => {
            let loaded = load_files(&system, &load).await?;
            chat(&system, loaded).await?;
        }
    }

    Ok(())
}

async fn chat(system: &RagSystem, loaded: usize) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("ragkit chat ({loaded} documents loaded). Type 'exit' to quit.");

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if question == "exit" || question == "quit" {
                    break;
                }
                rl.add_history_entry(question)?;

                let budget = system.config().max_output_tokens;
                match system.process_query(question, budget).await {
                    Ok(answer) => println!("{answer}\n"),
                    Err(e) => eprintln!("error: {e}\n"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
