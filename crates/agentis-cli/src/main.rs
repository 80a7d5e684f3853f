use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use agentis_core::config::{AgentisConfig, ConfigLoader, ExecutorConfig};
use agentis_core::conversation::ConversationBuilder;
use agentis_core::executors::{CodeExecutor, LocalExecutor, SandboxExecutor};
use agentis_core::generator::HttpGenerator;
use agentis_core::search;
use agentis_core::template::TeraChatTemplate;
use agentis_core::AgentLoop;

#[derive(Parser, Debug)]
#[clap(
    name = "Agentis",
    author,
    version = "0.1.0",
    about = "Batch code agent over an OpenAI-compatible completions endpoint"
)]
struct Cli {
    #[clap(long, short, help = "Path to a YAML configuration file")]
    config: Option<PathBuf>,

    #[clap(long, help = "Read prompts from a file, one per line")]
    prompts_file: Option<PathBuf>,

    #[clap(long, short, default_value = "info")]
    log_level: String,

    #[clap(long, help = "Pretty-print the JSON results")]
    pretty: bool,

    #[clap(help = "Prompts to run, one conversation each")]
    prompts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let config = match &cli.config {
        Some(path) => ConfigLoader::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AgentisConfig::default(),
    };

    let prompts = collect_prompts(&cli)?;
    log::info!(
        "Running {} prompt(s) against {}",
        prompts.len(),
        config.generator.api_base
    );

    let agent = build_loop(&config).await?;
    let completed = agent.run(&prompts).await?;

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&completed)?
    } else {
        serde_json::to_string(&completed)?
    };
    println!("{}", rendered);

    Ok(())
}

fn collect_prompts(cli: &Cli) -> Result<Vec<String>> {
    let prompts: Vec<String> = match &cli.prompts_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompts from {}", path.display()))?;
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        }
        None => cli.prompts.clone(),
    };
    if prompts.is_empty() {
        anyhow::bail!("No prompts given. Pass them as arguments or with --prompts-file.");
    }
    Ok(prompts)
}

async fn build_loop(config: &AgentisConfig) -> Result<AgentLoop> {
    let mut generator = HttpGenerator::new(
        config.generator.api_base.clone(),
        config.generator.model.clone(),
    )
    .with_timeout(Duration::from_secs(config.generator.timeout_seconds));
    if let Some(key) = &config.generator.api_key {
        generator = generator.with_api_key(key.clone());
    }

    let executor: Arc<dyn CodeExecutor> = match &config.executor {
        ExecutorConfig::Sandbox {
            image,
            dependencies,
            timeout_seconds,
        } => {
            let sandbox = SandboxExecutor::new(image.clone(), *timeout_seconds)
                .await
                .context("Failed to connect to Docker for the sandbox executor")?
                .with_dependencies(dependencies.clone());
            Arc::new(sandbox)
        }
        ExecutorConfig::Local {
            interpreter,
            args,
            timeout_seconds,
        } => {
            let local = LocalExecutor::new()
                .with_interpreter(interpreter.clone(), args.clone())
                .with_timeout(Duration::from_secs(*timeout_seconds));
            Arc::new(local)
        }
    };

    let mut builder = ConversationBuilder::new();
    if let Some(system) = &config.prompts.system {
        builder = builder.with_system_prompt(system.clone());
    }
    if let Some(environment) = &config.prompts.environment {
        builder = builder.with_environment_prompt(environment.clone());
    }
    if let Some(script_file) = &config.tools.script_file {
        builder = builder
            .with_tools_script_file(script_file)
            .context("Failed to load the tools script")?;
    }
    if config.tools.include_search_docs {
        builder = builder.with_tools(&search::tool_specs());
    }

    let template = match &config.prompts.chat_template {
        Some(template) => TeraChatTemplate::new(template.clone()),
        None => TeraChatTemplate::chatml(),
    };

    Ok(AgentLoop::new(
        Arc::new(generator),
        executor,
        Arc::new(template),
        builder,
        config.loop_config(),
    ))
}
