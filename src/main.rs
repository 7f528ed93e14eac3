use anyhow::Context;
use pokedex::cli::output::Output;
use pokedex::cli::{self, Cli, Commands, DEMO_QUERIES};
use pokedex::llm::{ComparisonClient, GenerationOptions, Provider};
use pokedex::sources::http::build_client;
use pokedex::utils::toml_config::{ResearchConfig, SourceConfig};
use pokedex::{ResearchError, ResearchPipeline};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match ResearchConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let err = ResearchError::from(e);
            output.error(&err.to_string());
            if let Some(hint) = err.hint() {
                output.hint(hint);
            }
            std::process::exit(2);
        }
    };

    init_tracing(&cli, &config)?;

    match cli.command {
        Commands::Research {
            query,
            compare,
            verbose_findings,
        } => {
            output.banner();
            let pipeline = ResearchPipeline::from_config(&config)?;
            if let Err(e) = research(&pipeline, &config, &output, &query, compare, verbose_findings).await {
                report_error(&output, &e);
                std::process::exit(1);
            }
        }
        Commands::Interactive => interactive(&config, &output).await?,
        Commands::Demo { no_compare } => demo(&config, &output, !no_compare).await?,
        Commands::Config { validate } => show_config(&config, &output, validate),
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &ResearchConfig) -> anyhow::Result<()> {
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if cli.json_logs || config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

fn report_error(output: &Output, err: &ResearchError) {
    output.error(&format!("Research failed: {}", err));
    if let Some(hint) = err.hint() {
        output.hint(hint);
    }
}

async fn research(
    pipeline: &ResearchPipeline,
    config: &ResearchConfig,
    output: &Output,
    query: &str,
    compare: bool,
    verbose: bool,
) -> Result<(), ResearchError> {
    output.step(1, 2, &format!("Researching: {}", query));
    let run = pipeline.conduct_research_detailed(query).await?;
    let succeeded = run.outcomes.iter().filter(|o| o.is_success()).count();
    output.step(
        2,
        2,
        &format!("{} of {} source fetches succeeded", succeeded, run.outcomes.len()),
    );

    output.report(&run.report, verbose);
    if verbose {
        output.outcomes(&run.outcomes);
    }

    if compare {
        match comparison_client(config) {
            Ok(Some(client)) => match client.answer(query).await {
                Ok(answer) => output.comparison(&run.report, client.model_name(), &answer),
                Err(e) => output.warning(&format!("Comparison answer failed: {}", e)),
            },
            Ok(None) => output.warning("Comparison needs an LLM provider; check the [llm] section."),
            Err(e) => output.warning(&format!("Comparison unavailable: {}", e)),
        }
    }

    Ok(())
}

fn comparison_client(config: &ResearchConfig) -> anyhow::Result<Option<ComparisonClient>> {
    let Some(provider) = Provider::from_config(&config.llm) else {
        return Ok(None);
    };
    let http = build_client().context("building HTTP client")?;
    let options = GenerationOptions {
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
    };
    Ok(Some(ComparisonClient::new(provider.create_client(http, options))))
}

async fn interactive(config: &ResearchConfig, output: &Output) -> anyhow::Result<()> {
    output.banner();
    output.info("Ask multiple questions and explore Pokemon data. Type quit to leave.");
    let pipeline = ResearchPipeline::from_config(config)?;

    while let Some(query) = output.prompt("What would you like to know about Pokemon?") {
        if cli::is_quit(&query) {
            break;
        }
        if query.is_empty() {
            continue;
        }
        if let Err(e) = research(&pipeline, config, output, &query, false, false).await {
            report_error(output, &e);
        }
    }

    output.info("Goodbye!");
    Ok(())
}

async fn demo(config: &ResearchConfig, output: &Output, compare: bool) -> anyhow::Result<()> {
    output.banner();
    let pipeline = ResearchPipeline::from_config(config)?;

    for (i, query) in DEMO_QUERIES.iter().enumerate() {
        output.header(&format!("Demo {}/{}: {}", i + 1, DEMO_QUERIES.len(), query));
        if let Err(e) = research(&pipeline, config, output, query, compare, false).await {
            report_error(output, &e);
        }
    }

    Ok(())
}

fn show_config(config: &ResearchConfig, output: &Output, validate: bool) {
    output.header("Configuration");
    output.kv("Log level", &config.logging.level);
    output.kv("Budget", &format!("{} ms", config.pipeline.budget_ms));
    output.kv("Max in flight", &config.pipeline.max_in_flight.to_string());
    output.kv("Max retries", &config.pipeline.max_retries.to_string());
    output.kv("Team size", &config.pipeline.team_size.to_string());
    output.kv(
        "LLM",
        &format!("{:?} ({})", config.llm.provider, config.llm.model),
    );

    output.subheader("Sources");
    for (id, source) in &config.sources {
        let kind = match source {
            SourceConfig::PokeApi { .. } => "pokeapi".to_string(),
            SourceConfig::Web { site, .. } => format!("web/{}", site.default_id()),
        };
        let state = if source.enabled() { "enabled" } else { "disabled" };
        output.list_item(&format!(
            "{} ({}, trust {:.2}, {})",
            id,
            kind,
            source.trust(),
            state
        ));
    }

    if validate {
        match config.validate_with_warnings() {
            Ok(warnings) => {
                for warning in &warnings {
                    output.warning(&warning.message);
                }
                output.success("Configuration is valid");
            }
            Err(e) => {
                output.error(&e.to_string());
                std::process::exit(2);
            }
        }
    }
}
