use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use phishscore::engine::ScoreEngine;
use phishscore::reputation::{FileReputationStore, MemoryReputationStore, ReputationStore};
use phishscore::{NormalizedMessage, WeightsConfig};
use std::path::Path;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = Command::new("phishscore")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Explainable phishing-risk scoring for email messages")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (YAML)"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write the default configuration file and exit")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("reputation")
                .short('r')
                .long("reputation")
                .value_name("FILE")
                .help("Known-bad domain snapshot (one domain per line)"),
        )
        .arg(
            Arg::new("eml")
                .value_name("EML")
                .help("Email message file to score"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the result as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        let yaml = WeightsConfig::default()
            .to_yaml()
            .expect("default config always serializes");
        if let Err(e) = std::fs::write(path, yaml) {
            eprintln!("Failed to write {path}: {e}");
            process::exit(1);
        }
        println!("Wrote default configuration to {path}");
        return;
    }

    // Config load failure is fatal: the engine must not accept
    // scoring requests without its weight table.
    let config = match matches.get_one::<String>("config") {
        Some(path) => match WeightsConfig::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {e:#}");
                process::exit(1);
            }
        },
        None => WeightsConfig::default(),
    };

    let store: Arc<dyn ReputationStore> = match matches.get_one::<String>("reputation") {
        Some(path) => match FileReputationStore::load(Path::new(path)) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                eprintln!("Failed to load reputation snapshot: {e:#}");
                process::exit(1);
            }
        },
        None => Arc::new(MemoryReputationStore::default()),
    };

    let Some(eml_path) = matches.get_one::<String>("eml") else {
        eprintln!("No email file given. See --help.");
        process::exit(2);
    };

    let engine = match ScoreEngine::new(Arc::new(config), store) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to initialize engine: {e:#}");
            process::exit(1);
        }
    };

    let parsed = match phishscore::eml::parse_eml_from_path(Path::new(eml_path)) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Failed to parse {eml_path}: {e:#}");
            process::exit(1);
        }
    };

    let normalized = NormalizedMessage::from_parsed(&parsed);
    let result = engine.score(&normalized).await;

    if matches.get_flag("json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).expect("result always serializes")
        );
        return;
    }

    println!("Score:    {}/100 ({:?})", result.total_score, result.severity);
    if result.override_applied {
        println!("Override: sender domain is a confirmed phishing domain");
    }
    println!("\nWhy:");
    for reason in &result.user_reasons {
        println!("  - {reason}");
    }
    println!("\nDetails:");
    for reason in &result.technical_reasons {
        println!("  - {reason}");
    }
}
