use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::*;
use serde_json::Value;
use tracing::info;

use testpilot_core::features::{feature, FeatureKey, FEATURES};
use testpilot_core::panel::ResultBlock;
use testpilot_core::{build_model, list_models, Config, FlowExecutor, FlowKind, FlowRequest, Panel, Provider};

/// Source code passed inline or read from a file (`-` reads stdin)
#[derive(Args, Debug, Default)]
pub struct CodeArgs {
    /// Code to work on
    #[arg(long, conflicts_with = "code_file")]
    pub code: Option<String>,
    /// Read the code from a file, or `-` for stdin
    #[arg(long, value_name = "PATH")]
    pub code_file: Option<PathBuf>,
}

impl CodeArgs {
    pub fn read(&self) -> Result<String> {
        match (&self.code, &self.code_file) {
            (Some(code), _) => Ok(code.clone()),
            (None, Some(path)) => read_source(path),
            (None, None) => Ok(String::new()),
        }
    }
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub struct OutputArgs {
    /// Print the result object as JSON
    #[arg(long)]
    pub json: bool,
    /// Validate the request and print the prompt without calling a model
    #[arg(long)]
    pub dry_run: bool,
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

/// Provider and model the command line asks for, falling back to the config
pub struct ModelChoice {
    pub provider: Provider,
    pub model: String,
}

impl ModelChoice {
    pub fn resolve(config: &Config, provider: Option<Provider>, model: Option<String>) -> Self {
        let provider = provider.unwrap_or_else(|| config.provider());
        let model = model.unwrap_or_else(|| config.model_for(provider));
        Self { provider, model }
    }
}

/// Run the request as `key`'s panel would and print what that panel shows
pub async fn run_feature(
    config: &Config,
    choice: &ModelChoice,
    key: FeatureKey,
    fields: &[(&'static str, String)],
    output: OutputArgs,
) -> Result<()> {
    let mut panel = Panel::new(key);
    for (name, value) in fields {
        panel.set_input(name, value.clone());
    }
    run_request(config, choice, key, panel.build_request(), output).await
}

async fn run_request(
    config: &Config,
    choice: &ModelChoice,
    key: FeatureKey,
    request: FlowRequest,
    output: OutputArgs,
) -> Result<()> {
    if output.dry_run {
        println!("{}", request.render_prompt()?);
        return Ok(());
    }

    let model = build_model(config, choice.provider, &choice.model)?;
    let executor = FlowExecutor::new(model);

    if !output.json {
        eprintln!(
            "🤖 Running {} with {}...\n",
            request.kind().name().bold().cyan(),
            format!("{}: {}", choice.provider.short_name(), choice.model).bold().magenta()
        );
    }

    let mut panel = Panel::new(key);
    let ticket = panel
        .begin_submit()
        .map(|s| s.ticket)
        .ok_or_else(|| anyhow!("panel already busy"))?;
    let result = executor.execute(request).await?;
    info!(flow = result.kind().name(), "result received");

    if output.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    panel.complete(ticket, Ok(result));
    print_result(&panel);
    Ok(())
}

fn print_result(panel: &Panel) {
    println!("{}", panel.feature().results_heading.bold().green());

    for block in panel.result_blocks() {
        match block {
            ResultBlock::Field { view, value } => {
                println!("\n{}", view.label.bold().yellow());
                if view.code {
                    println!("{}", "─".repeat(40).dimmed());
                    println!("{}", value.trim_end());
                    println!("{}", "─".repeat(40).dimmed());
                } else {
                    println!("{}", value.trim_end());
                }
            }
            ResultBlock::Fallback(text) => println!("{}", text.dimmed()),
        }
    }
}

/// Feature whose panel shows results for `kind` when no panel is implied
fn feature_for(kind: FlowKind) -> FeatureKey {
    FEATURES
        .iter()
        .find(|f| f.flow == kind)
        .map(|f| f.key)
        .unwrap_or(FeatureKey::SmartCodeSuggestions)
}

/// Execute a raw JSON request payload against a flow named by its wire name
pub async fn run_raw(
    config: &Config,
    choice: &ModelChoice,
    flow: &str,
    input: &Path,
    output: OutputArgs,
) -> Result<()> {
    let Some(kind) = FlowKind::from_name(flow) else {
        let known: Vec<&str> = FlowKind::all().iter().map(|k| k.name()).collect();
        bail!("unknown flow '{}' (expected one of: {})", flow, known.join(", "));
    };

    let text = read_source(input)?;
    let payload: Value = serde_json::from_str(&text).context("request payload is not valid JSON")?;
    let request = FlowRequest::from_json(kind, &payload)?;

    run_request(config, choice, feature_for(kind), request, output).await
}

pub async fn list_provider_models(config: &Config, provider: Provider) -> Result<()> {
    println!("\n{}", format!("🤖 Available {} Models", provider.short_name()).bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    match list_models(config, provider).await {
        Ok(models) if models.is_empty() => {
            println!("{}", "No models found. Pull a model with: ollama pull llama3.2".yellow());
        }
        Ok(models) => {
            let current = config.model_for(provider);
            for model in models {
                if model == current {
                    println!("  • {} {}", model.green().bold(), "(selected)".dimmed());
                } else {
                    println!("  • {}", model.green());
                }
            }
        }
        Err(e) => {
            println!("{}: {}", format!("Error listing {} models", provider.short_name()).red(), e);
            if provider == Provider::Ollama {
                println!("Make sure Ollama is running: {}", "ollama serve".bold());
                println!("Then pull a model: {}", "ollama pull llama3.2".bold());
            }
        }
    }

    Ok(())
}

pub fn list_features() {
    println!("\n{}", "🧪 TestPilot AI Features".bold().blue());
    println!("{}", "=".repeat(40).dimmed());

    for key in FeatureKey::all() {
        let f = feature(key);
        println!(
            "\n{} {}  {}",
            f.icon,
            f.label.bold().green(),
            format!("[{}]", f.flow.name()).dimmed()
        );
        println!("   {}", f.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("add.js");
        fs::write(&path, "function add(a,b){return a-b}").unwrap();

        let args = CodeArgs {
            code: None,
            code_file: Some(path),
        };
        assert_eq!(args.read().unwrap(), "function add(a,b){return a-b}");
        assert_eq!(CodeArgs::default().read().unwrap(), "");
    }

    #[test]
    fn test_model_choice_prefers_flags() {
        let config = Config {
            provider: Some("openai".to_string()),
            default_model: Some("gpt-4o".to_string()),
            ..Config::new()
        };

        let choice = ModelChoice::resolve(&config, None, None);
        assert_eq!(choice.provider, Provider::OpenAI);
        assert_eq!(choice.model, "gpt-4o");

        let choice = ModelChoice::resolve(&config, Some(Provider::Ollama), None);
        assert_eq!(choice.model, Provider::Ollama.default_model());

        let choice = ModelChoice::resolve(&config, None, Some("gpt-4-turbo".to_string()));
        assert_eq!(choice.model, "gpt-4-turbo");
    }

    #[test]
    fn test_every_flow_has_a_result_view() {
        for kind in FlowKind::all() {
            assert_eq!(feature(feature_for(kind)).flow, kind);
        }
    }

    #[tokio::test]
    async fn test_dry_run_rejects_invalid_request() {
        let config = Config::new();
        let choice = ModelChoice::resolve(&config, Some(Provider::Ollama), None);
        let output = OutputArgs {
            json: false,
            dry_run: true,
        };

        let err = run_feature(&config, &choice, FeatureKey::AutoFix, &[("description", "optimize this".to_string())], output)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("`code`"));
    }
}
