use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scholar_merge::config::{find_config_file, load_config, write_default_config, Config};
use scholar_merge::engine::Engine;
use scholar_merge::enrich::classify_or_fallback;
use scholar_merge::models::{AuthorQuery, DateRange, ResolveResponse};
use scholar_merge::sources::build_classifier;
use scholar_merge::utils::HttpClient;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Merge - Reconcile an author's publications across bibliographic providers
#[derive(Parser, Debug)]
#[command(name = "scholar-merge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile an author's publications across Web of Science, Scopus and PubMed", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the publications of one or more authors
    #[command(alias = "r")]
    Resolve {
        /// Author full name ("First Last"); repeat for several authors
        #[arg(long = "author", short = 'a', required = true)]
        authors: Vec<String>,

        /// Earliest publication date (YYYY or YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest publication date (YYYY or YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Maximum records fetched from each provider
        #[arg(long, short = 'm')]
        max_results: Option<usize>,

        /// Skip citation-rate enrichment
        #[arg(long)]
        no_enrich: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Where to write the file
        #[arg(long, default_value = "scholar-merge.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Classify an abstract as review or primary research
    Classify {
        /// Abstract text
        text: String,
    },
}

fn init_logging(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scholar_merge={}", level)),
    );

    let json = config.logging.is_json();
    tracing_subscriber::registry()
        .with(filter)
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load config".to_string(),
    })?;

    init_logging(&cli, &config);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    match &cli.command {
        Commands::Resolve {
            authors,
            from,
            to,
            max_results,
            no_enrich,
        } => {
            let range = DateRange::parse(from.as_deref(), to.as_deref())?;
            let query = AuthorQuery::new(authors)
                .range(range)
                .max_results(max_results.unwrap_or(config.search.max_results_per_source));

            let mut engine = Engine::from_config(&config)?;
            if *no_enrich {
                engine = engine.without_enrichment();
            }

            let response = engine.resolve(&query).await;
            output_response(&response, cli.output, cli.quiet)?;
        }
        Commands::InitConfig { path, force } => {
            write_default_config(path, *force)?;
            if !cli.quiet {
                println!("Wrote default configuration to {}", path.display());
            }
        }
        Commands::Classify { text } => {
            let client =
                HttpClient::with_timeout(Duration::from_secs(config.search.request_timeout_secs))?;
            let classifier = build_classifier(&config, &client);
            let label = classify_or_fallback(classifier.as_ref(), text).await;
            println!("{}", label);
        }
    }

    Ok(())
}

fn output_response(response: &ResolveResponse, format: OutputFormat, quiet: bool) -> Result<()> {
    if format.resolve() == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    if !response.publications.is_empty() {
        println!("{}", publications_table(response));
    }
    if !quiet {
        print_summary(response);
    }
    for error in &response.errors {
        eprintln!("{}", error);
    }

    Ok(())
}

fn publications_table(response: &ResolveResponse) -> comfy_table::Table {
    use comfy_table::{Attribute, Cell, CellAlignment, Table};

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Title", "Authors", "Year", "Cited", "RCR", "Sources"]);

    for publication in &response.publications {
        let year = publication
            .year()
            .map(|y| y.to_string())
            .unwrap_or_default();
        let rcr = publication
            .relative_citation_ratio
            .map(|r| format!("{:.2}", r))
            .unwrap_or_default();
        let sources = publication
            .sources
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            Cell::new(truncate(&publication.title, 60)).add_attribute(Attribute::Bold),
            Cell::new(truncate(&publication.authors, 30)),
            Cell::new(year),
            Cell::new(publication.citation_count).set_alignment(CellAlignment::Right),
            Cell::new(rcr).set_alignment(CellAlignment::Right),
            Cell::new(sources),
        ]);
    }

    table
}

fn print_summary(response: &ResolveResponse) {
    let metrics = &response.metrics;
    println!(
        "{} publications, {} citations, impact index {}, weighted citation rate {:.2}",
        metrics.publication_count,
        metrics.total_citations,
        metrics.impact_index,
        metrics.weighted_citation_rate_sum
    );
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
