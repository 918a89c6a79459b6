//! Command-line front end

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use trends_router_sdk::{log_debug, log_file_saved, log_header, log_info, log_warning};

use crate::config::{ClassifierMode, Settings};
use crate::engines::{
    QdrantEngine, SearchFilters, SemanticQueryEngine, SqliteEngine, StructuredQueryEngine,
};
use crate::llm::{ClaudeModel, LanguageModel};
use crate::router::{KeywordClassifier, ModelClassifier, QueryClassifier};
use crate::workflow::{FinalResponse, Orchestrator, ResponseSynthesizer, SystemInfo};

/// YouTube Trends Router CLI Arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "trends-router", version, about = "Ask questions about trending YouTube videos")]
pub struct Args {
    /// Question to answer (starts interactive mode when omitted)
    #[arg(short, long)]
    pub query: Option<String>,

    /// YAML settings file (default: trends-router.yaml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the routing decision without running any engine
    #[arg(long)]
    pub route_only: bool,

    /// Print the full response as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory to save the response into as query_response_<timestamp>.json
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Semantic search filter as key=value (repeatable)
    #[arg(short, long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Use the keyword classifier instead of the language model
    #[arg(long)]
    pub keyword_router: bool,

    /// Print system information and exit
    #[arg(long)]
    pub info: bool,

    /// Print debug details (SQL, scores, timings)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse `--filter` values into search filters
    ///
    /// Values that parse as JSON (`views={"gte":1000}`, `country=["US","GB"]`,
    /// `trending_days=5`) keep their JSON type; anything else is a string.
    pub fn parse_filters(&self) -> Result<Option<SearchFilters>> {
        if self.filters.is_empty() {
            return Ok(None);
        }

        let mut filters = SearchFilters::new();
        for raw in &self.filters {
            let Some((key, value)) = raw.split_once('=') else {
                bail!("Invalid filter '{}': expected KEY=VALUE", raw);
            };
            let key = key.trim();
            if key.is_empty() {
                bail!("Invalid filter '{}': empty key", raw);
            }
            let value = value.trim();
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            filters.insert(key.to_string(), value);
        }
        Ok(Some(filters))
    }
}

/// Build the orchestrator described by `settings`
///
/// An engine that fails to initialize is left out with a warning; queries
/// routed to it get a "not available" result instead of aborting startup.
pub fn build_orchestrator(settings: &Settings, model: Arc<dyn LanguageModel>) -> Orchestrator {
    let classifier = match settings.classifier.mode {
        ClassifierMode::Model => QueryClassifier::Model(ModelClassifier::new(model.clone())),
        ClassifierMode::Keyword => QueryClassifier::Keyword(KeywordClassifier::new()),
    };

    let synthesizer = if settings.synthesis.narrative {
        ResponseSynthesizer::with_narrator(model.clone())
    } else {
        ResponseSynthesizer::new()
    };

    let mut orchestrator = Orchestrator::new(classifier).with_synthesizer(synthesizer);

    if settings.structured.enabled {
        match SqliteEngine::open(&settings.structured, model.clone()) {
            Ok(engine) => {
                let engine: Arc<dyn StructuredQueryEngine> = Arc::new(engine);
                orchestrator = orchestrator.with_structured(engine);
            }
            Err(e) => log_warning!("Structured engine disabled: {:#}", e),
        }
    }

    if settings.semantic.enabled {
        match QdrantEngine::new(&settings.semantic) {
            Ok(engine) => {
                let engine: Arc<dyn SemanticQueryEngine> = Arc::new(engine.with_model(model));
                orchestrator = orchestrator.with_semantic(engine);
            }
            Err(e) => log_warning!("Semantic engine disabled: {:#}", e),
        }
    }

    orchestrator
}

/// Entry point used by the binary
pub async fn run(args: Args) -> Result<()> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if args.keyword_router {
        settings.classifier.mode = ClassifierMode::Keyword;
    }
    let filters = args.parse_filters()?;

    let model: Arc<dyn LanguageModel> = Arc::new(ClaudeModel::new());
    let orchestrator = build_orchestrator(&settings, model);

    if args.info {
        print_system_info(&orchestrator.system_info(), args.json)?;
        return Ok(());
    }

    match &args.query {
        Some(query) => answer_once(&orchestrator, &args, query, filters).await,
        None => interactive(&orchestrator, &args, filters).await,
    }
}

async fn answer_once(
    orchestrator: &Orchestrator,
    args: &Args,
    query: &str,
    filters: Option<SearchFilters>,
) -> Result<()> {
    if args.route_only {
        let decision = orchestrator.get_routing_info(query).await?;
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    let response = orchestrator.process_query_with_filters(query, filters).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response, args.verbose);
    }

    if let Some(dir) = &args.save {
        let path = save_response(&response, dir).await?;
        log_file_saved!(path.display());
    }
    Ok(())
}

async fn interactive(
    orchestrator: &Orchestrator,
    args: &Args,
    filters: Option<SearchFilters>,
) -> Result<()> {
    log_header!("YouTube Trends Router");
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input.to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" => print_help(),
            "info" => print_system_info(&orchestrator.system_info(), false)?,
            _ => {
                if let Err(e) = answer_once(orchestrator, args, input, filters.clone()).await {
                    log_warning!("{:#}", e);
                }
            }
        }
    }

    log_info!("Goodbye!");
    Ok(())
}

/// Write `response` to `<dir>/query_response_<timestamp>.json`
pub async fn save_response(response: &FinalResponse, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("query_response_{}.json", timestamp));
    let json = serde_json::to_string_pretty(response)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write response file: {}", path.display()))?;
    Ok(path)
}

fn print_help() {
    println!("Ask a question about trending videos, or use a command:");
    println!("  help   show this message");
    println!("  info   show engines and classifier");
    println!("  quit   exit (also: exit, q)");
}

fn print_system_info(info: &SystemInfo, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }

    log_header!(info.orchestrator);
    println!("Classifier: {}", info.classifier);
    println!(
        "Narrative synthesis: {}",
        if info.narrative_synthesis { "on" } else { "off" }
    );
    for engine in &info.engines {
        println!("\n{} ({})", engine.name, engine.kind);
        println!("  {}", engine.description);
        for capability in &engine.capabilities {
            println!("  - {}", capability);
        }
    }
    for kind in &info.unavailable {
        log_warning!("{} not available", kind.label());
    }
    Ok(())
}

fn print_response(response: &FinalResponse, verbose: bool) {
    println!("\n{}", response.answer);

    let meta = &response.metadata;
    let agents: Vec<&str> = meta.agents_used.iter().map(|a| a.as_str()).collect();
    println!(
        "\n[{} | confidence {:.2} | engines: {}]",
        meta.query_type,
        meta.confidence,
        if agents.is_empty() { "none".to_string() } else { agents.join(", ") }
    );

    if let Some(error) = &response.error {
        log_warning!(error);
    }

    if verbose {
        if let Some(sql) = response.structured_result.as_ref().and_then(|r| r.sql.as_ref()) {
            log_debug!("SQL: {}", sql);
        }
        if let Some(hits) = response.semantic_result.as_ref().and_then(|r| r.results.as_ref()) {
            for hit in hits {
                log_debug!("#{} {:.4} {} ({})", hit.rank, hit.score, hit.title, hit.video_id);
            }
        }
        if let Some(ms) = response.processing_time_ms {
            log_debug!("Processed in {} ms", ms);
        }
    }
}
