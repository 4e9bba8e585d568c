use clap::{Parser, Subcommand};
use content_schema::{ContentRecord, LevelContent};
use medref_core::{
    fail_on_warnings_from_env_value, load_corpus, resolve_corpus_dir, validate_corpus,
    validate_corpus_dir_safe_to_load, CoreConfig, Registry, RegistryError, ResolvedEdge,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medref")]
#[command(about = "Medical education content registry CLI")]
struct Cli {
    /// Corpus directory (overrides MEDREF_CORPUS_DIR)
    #[arg(long, global = true)]
    corpus_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the whole corpus and print the report
    Validate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
    },
    /// Show one record
    Show {
        /// Record id
        id: String,
        /// Only show this level (1-5)
        #[arg(long)]
        level: Option<u8>,
    },
    /// List records carrying a tag
    Tag {
        /// Topic or keyword
        tag: String,
    },
    /// List records in a category
    Category {
        /// Category name, e.g. adrenal
        name: String,
    },
    /// List resolved cross-references of a record
    Refs {
        /// Record id
        id: String,
        /// List records pointing at this one instead
        #[arg(long)]
        incoming: bool,
    },
    /// Search ids, categories, names and level text
    Search {
        /// Text to look for
        text: String,
        /// Only search this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Print registry statistics as JSON
    Stats,
    /// List categories
    Categories,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medref_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'medref --help' for commands");
        return Ok(());
    };

    let config = resolve_config(cli.corpus_dir)?;

    if let Commands::Validate { json, strict } = command {
        let passed = run_validate(&config, json, strict || config.fail_on_warnings())?;
        if !passed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let registry = Registry::load(&config)?;

    match command {
        Commands::Validate { .. } => {}
        Commands::Show { id, level } => match registry.get_by_id(&id) {
            Ok(record) => {
                let category = registry.category_of(&id).unwrap_or_default();
                print_record(record, category, level);
            }
            Err(RegistryError::NotFound(_)) => println!("Record not found: {id}"),
            Err(e) => eprintln!("Error reading record: {e}"),
        },
        Commands::Tag { tag } => print_records(&registry.query_by_tag(&tag)),
        Commands::Category { name } => print_records(&registry.query_by_category(&name)),
        Commands::Refs { id, incoming } => {
            if registry.get_by_id(&id).is_err() {
                println!("Record not found: {id}");
            } else if incoming {
                print_edges(registry.list_incoming_references(&id), true);
            } else {
                print_edges(registry.list_cross_references(&id), false);
            }
        }
        Commands::Search { text, category } => {
            print_records(&registry.search_in(category.as_deref(), &text))
        }
        Commands::Stats => println!("{}", serde_json::to_string_pretty(&registry.stats())?),
        Commands::Categories => {
            for category in registry.categories() {
                println!("{category}");
            }
        }
    }

    Ok(())
}

fn resolve_config(corpus_dir: Option<PathBuf>) -> Result<CoreConfig, Box<dyn std::error::Error>> {
    let override_dir = corpus_dir.or_else(|| {
        std::env::var("MEDREF_CORPUS_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });
    let corpus_dir = resolve_corpus_dir(override_dir)?;
    validate_corpus_dir_safe_to_load(&corpus_dir)?;

    let fail_on_warnings =
        fail_on_warnings_from_env_value(std::env::var("MEDREF_FAIL_ON_WARNINGS").ok())?;

    Ok(CoreConfig::new(corpus_dir, fail_on_warnings)?)
}

/// Returns whether the corpus passed the gate. Unparsable files fail it and are all listed.
fn run_validate(config: &CoreConfig, json: bool, strict: bool) -> Result<bool, RegistryError> {
    let records = match load_corpus(config.corpus_dir()) {
        Ok(records) => records,
        Err(err @ RegistryError::CorpusParse { .. }) => {
            eprintln!("{err}");
            return Ok(false);
        }
        Err(err) => return Err(err),
    };
    let report = validate_corpus(&records);

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }

    Ok(!(report.has_errors() || (strict && report.has_warnings())))
}

fn print_records(records: &[&ContentRecord]) {
    if records.is_empty() {
        println!("No records found.");
        return;
    }
    for record in records {
        println!("{}\t{}\t{}", record.id, record.record_type, record.name);
    }
}

fn print_edges(edges: &[ResolvedEdge], incoming: bool) {
    if edges.is_empty() {
        println!("No cross-references.");
        return;
    }
    for edge in edges {
        let other = if incoming {
            &edge.source_id
        } else {
            &edge.target_id
        };
        if edge.label.is_empty() {
            println!("{}\t{}", edge.relationship, other);
        } else {
            println!("{}\t{}\t{}", edge.relationship, other, edge.label);
        }
    }
}

fn print_record(record: &ContentRecord, category: &str, level: Option<u8>) {
    println!("{} ({})", record.name, record.id);
    println!(
        "type: {}, status: {}, category: {}, version: {}",
        record.record_type, record.status, category, record.version
    );
    if !record.alternate_names.is_empty() {
        println!("also known as: {}", record.alternate_names.join(", "));
    }

    match level {
        Some(n) => match record.level(n) {
            Some(content) => print_level(content),
            None => println!("Level {n} is not available for this record."),
        },
        None => record.levels.values().for_each(print_level),
    }
}

fn print_level(content: &LevelContent) {
    println!();
    println!("Level {}: {}", content.level, content.summary);
    println!("{}", content.explanation);
    for key_term in &content.key_terms {
        println!("  - {}: {}", key_term.term, key_term.definition);
    }
    if let Some(notes) = &content.clinical_notes {
        println!("Clinical notes: {notes}");
    }
}
