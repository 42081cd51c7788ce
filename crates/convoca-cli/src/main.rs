use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use convoca_dedup::catalog::{load_catalog, load_record};
use convoca_dedup::similarity::{
    bigram_similarity, containment_ratio, is_annual_variation, length_ratio, text_similarity,
    word_jaccard,
};
use convoca_dedup::{
    DedupConfig, DuplicateFinder, ExitCode, MatchResult, extract_registry_code, normalize_registry_code_str,
    normalize_text,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "convoca",
    about = "Flag likely duplicate financing-program announcements before they are catalogued",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting CONVOCA_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank catalogued programs that may duplicate a new record.
    Check {
        /// Catalogue file (JSON array, or object with a "programas" array).
        #[arg(long)]
        catalog: PathBuf,
        /// The newly extracted record (JSON object).
        #[arg(long)]
        record: PathBuf,
        #[arg(long)]
        min_score: Option<u8>,
        #[arg(long)]
        max_results: Option<usize>,
        /// Classify candidates on a single thread.
        #[arg(long)]
        sequential: bool,
        /// Config file (defaults to CONVOCA_CONFIG or ~/.config/convoca/dedup.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the canonical form of a registry code.
    NormalizeCode { value: String },

    /// Extract a registry code from a registry URL or bare code.
    ExtractCode { url_or_code: String },

    /// Show every similarity score for two program names.
    Similarity { first: String, second: String },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration.
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(ExitCode::GeneralError.code());
    }
}

fn run() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json || std::env::var("CONVOCA_JSON").as_deref() == Ok("1");

    match cli.command {
        Commands::Check {
            catalog,
            record,
            min_score,
            max_results,
            sequential,
            config,
        } => {
            let mut config = load_config(config)?;
            if let Some(score) = min_score {
                config.min_score = score;
            }
            if let Some(max) = max_results {
                config.max_results = max;
            }
            if sequential {
                config.parallel = false;
            }
            if let Err(e) = config.validate() {
                eprintln!("{e}");
                std::process::exit(ExitCode::InvalidArgs.code());
            }

            let catalogue = load_catalog(&catalog)?;
            let new_record = load_record(&record)?;
            tracing::info!(
                catalogue = %catalog.display(),
                programs = catalogue.len(),
                min_score = config.min_score,
                "checking new record for duplicates"
            );
            let matches = DuplicateFinder::from_config(&config).find_duplicates(&new_record, &catalogue);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": matches, "total": matches.len(), "catalogue_size": catalogue.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if matches.is_empty() {
                println!("No likely duplicates among {} catalogued programs.", catalogue.len());
            } else {
                println!("Found {} likely duplicates:", matches.len());
                for m in &matches {
                    print_match(m);
                }
            }
        }

        Commands::NormalizeCode { value } => {
            let normalized = normalize_registry_code_str(&value);
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"input":value,"normalized":normalized}}))?;
            } else {
                match normalized {
                    Some(code) => println!("{code}"),
                    None => {
                        eprintln!("Not a valid registry code: {value}");
                        std::process::exit(ExitCode::NotFound.code());
                    }
                }
            }
        }

        Commands::ExtractCode { url_or_code } => {
            let code = extract_registry_code(&url_or_code);
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"input":url_or_code,"code":code}}))?;
            } else {
                match code {
                    Some(code) => println!("{code}"),
                    None => {
                        eprintln!("No registry code found in: {url_or_code}");
                        std::process::exit(ExitCode::NotFound.code());
                    }
                }
            }
        }

        Commands::Similarity { first, second } => {
            let a = normalize_text(&first);
            let b = normalize_text(&second);
            let scores = serde_json::json!({
                "normalized": [a, b],
                "word_jaccard": word_jaccard(&a, &b),
                "bigram": bigram_similarity(&a, &b),
                "length_ratio": length_ratio(&a, &b),
                "containment": containment_ratio(&a, &b),
                "combined": text_similarity(&a, &b),
                "annual_variation": is_annual_variation(&a, &b),
            });

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":scores}))?;
            } else {
                println!("  normalized:       {a:?} / {b:?}");
                println!("  word jaccard:     {:.3}", word_jaccard(&a, &b));
                println!("  bigram:           {:.3}", bigram_similarity(&a, &b));
                println!("  length ratio:     {:.3}", length_ratio(&a, &b));
                println!("  containment:      {:.3}", containment_ratio(&a, &b));
                println!("  combined:         {:.3}", text_similarity(&a, &b));
                println!("  annual variation: {}", is_annual_variation(&a, &b));
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { config } => {
                let config = load_config(config)?;
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config}))?;
                } else {
                    println!("min_score   = {}", config.min_score);
                    println!("max_results = {}", config.max_results);
                    println!("parallel    = {}", config.parallel);
                }
            }
            ConfigAction::Path => {
                let path = DedupConfig::config_path();
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                } else {
                    println!("{}", path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<DedupConfig> {
    Ok(match path {
        Some(path) => DedupConfig::load_from(&path)?,
        None => DedupConfig::load()?,
    })
}

fn print_match(m: &MatchResult<'_>) {
    let id = if m.candidate.id.is_empty() { "-" } else { m.candidate.id.as_str() };
    println!(
        "  {score:>3}  {confidence:<10}  {kind:<31}  {id:<12}  {name}",
        score = m.score,
        confidence = m.confidence.label(),
        kind = m.match_type.as_str(),
        name = m.candidate.name,
    );
    println!("       {}", m.reason);
}
