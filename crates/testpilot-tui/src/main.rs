use std::path::PathBuf;

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info};

use testpilot_core::{Config, FeatureKey, FlowKind, Provider};

mod app;
mod cli;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use cli::{CodeArgs, ModelChoice, OutputArgs};
use logging::LogTarget;

#[derive(Parser)]
#[command(name = "testpilot")]
#[command(version, about = "AI assistant for test automation: code suggestions, bug explanations, fixes and test generation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Model provider (ollama, claude, openai); defaults to the configured one
    #[arg(long, global = true)]
    provider: Option<Provider>,

    /// Model to use; defaults to the configured or provider default
    #[arg(long, global = true)]
    model: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive terminal UI (default)
    Tui,
    /// Suggest automation code for an objective
    Suggest {
        /// What the code should do
        #[arg(long)]
        objective: String,
        /// Programming language
        #[arg(long, default_value = "JavaScript")]
        language: String,
        /// Testing framework
        #[arg(long, default_value = "Jest")]
        framework: String,
        #[command(flatten)]
        code: CodeArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Explain a bug and suggest a fix
    ExplainBug {
        /// Bug report or description of the failure
        #[arg(long)]
        report: String,
        #[command(flatten)]
        code: CodeArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Fix a bug or inefficiency in code
    Fix {
        /// What is wrong or what should change
        #[arg(long)]
        description: String,
        #[command(flatten)]
        code: CodeArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate test cases for code
    GenerateTests {
        /// Programming language
        #[arg(long, default_value = "JavaScript")]
        language: String,
        /// Testing framework
        #[arg(long, default_value = "Jest")]
        framework: String,
        #[command(flatten)]
        code: CodeArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Ask a coding or testing question in plain English
    Ask {
        /// Your question
        question: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run a flow on a raw JSON request
    Run {
        /// Flow to run
        #[arg(long, value_parser = flow_names())]
        flow: String,
        /// JSON request file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List models for the selected provider
    Models,
    /// List the assistant's features
    Features,
}

/// Wire names accepted by `run --flow`
fn flow_names() -> PossibleValuesParser {
    PossibleValuesParser::new(FlowKind::all().map(|kind| kind.name()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Tui);
    let target = match command {
        Commands::Tui => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    logging::setup_logging(cli.verbose, target)?;

    let config = Config::load()?;
    let choice = ModelChoice::resolve(&config, cli.provider, cli.model);
    debug!(provider = %choice.provider, model = %choice.model, "model selected");

    match command {
        Commands::Tui => run_tui(config, choice).await?,
        Commands::Suggest { objective, language, framework, code, output } => {
            let fields = [
                ("codeSnippet", code.read()?),
                ("language", language),
                ("testingFramework", framework),
                ("objective", objective),
            ];
            cli::run_feature(&config, &choice, FeatureKey::SmartCodeSuggestions, &fields, output).await?
        }
        Commands::ExplainBug { report, code, output } => {
            let fields = [("code", code.read()?), ("bugReport", report)];
            cli::run_feature(&config, &choice, FeatureKey::BugDetection, &fields, output).await?
        }
        Commands::Fix { description, code, output } => {
            let fields = [("code", code.read()?), ("description", description)];
            cli::run_feature(&config, &choice, FeatureKey::AutoFix, &fields, output).await?
        }
        Commands::GenerateTests { language, framework, code, output } => {
            let fields = [
                ("code", code.read()?),
                ("language", language),
                ("testingFramework", framework),
            ];
            cli::run_feature(&config, &choice, FeatureKey::TestCaseGeneration, &fields, output).await?
        }
        Commands::Ask { question, output } => {
            let fields = [("objective", question)];
            cli::run_feature(&config, &choice, FeatureKey::NaturalLanguageQuery, &fields, output).await?
        }
        Commands::Run { flow, input, output } => {
            cli::run_raw(&config, &choice, &flow, &input, output).await?
        }
        Commands::Models => cli::list_provider_models(&config, choice.provider).await?,
        Commands::Features => cli::list_features(),
    }

    Ok(())
}

async fn run_tui(config: Config, choice: ModelChoice) -> Result<()> {
    info!(provider = %choice.provider, model = %choice.model, "starting terminal UI");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(config, choice.provider, choice.model);

    let result = async {
        loop {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            app.poll_pending().await;

            if let Some(event) = events.next().await {
                handler::handle_event(&mut app, event).await?;
            }

            if app.should_quit {
                break;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    info!("terminal UI closed");
    result
}
