use clap::{Arg, Command};
use log::LevelFilter;
use std::process;
use std::sync::Arc;

use mailwatch::audit::{FileAuditLog, MemoryAuditLog};
use mailwatch::config::Config;
use mailwatch::engine::{DecisionEngine, EmailSubmission};
use mailwatch::scorer::{TextScorer, TfidfScorer};
use mailwatch::trust::TrustRegistry;

#[tokio::main]
async fn main() {
    let matches = Command::new("mailwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Email scam risk scoring service with trusted-sender overrides")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("mailwatch.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("scan-email")
                .long("scan-email")
                .value_name("FILE")
                .help("Scan a JSON email submission file and print the result")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let config_path = matches.get_one::<String>("config").unwrap();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    let registry = TrustRegistry::new(config.trusted_domains.clone());
    let scorer = load_scorer(&config);

    if let Some(email_file) = matches.get_one::<String>("scan-email") {
        scan_email_file(registry, scorer, email_file);
        return;
    }

    let audit = Arc::new(FileAuditLog::new(&config.audit.path));
    let engine = Arc::new(DecisionEngine::new(registry, scorer, audit));

    if let Err(e) = mailwatch::server::run(&config.server.bind(), engine).await {
        eprintln!("Server error: {e:#}");
        process::exit(1);
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn load_scorer(config: &Config) -> Option<Arc<dyn TextScorer>> {
    match TfidfScorer::load(&config.model.path) {
        Ok(scorer) => {
            log::info!("Model artifact loaded from {}", config.model.path);
            Some(Arc::new(scorer))
        }
        Err(e) => {
            log::warn!("Model artifact not loaded: {e:#}");
            log::warn!("Scan requests will be rejected until an artifact is available");
            None
        }
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();
    println!("   Bind address: {}", config.server.bind());
    println!("   Audit log: {}", config.audit.path);
    println!("   Trusted domains: {} entries", config.trusted_domains.len());

    if TfidfScorer::artifact_exists(&config.model.path) {
        match TfidfScorer::load(&config.model.path) {
            Ok(_) => println!("   Model artifact: {} (loads cleanly)", config.model.path),
            Err(e) => {
                println!("❌ Model artifact: {} is unusable: {e:#}", config.model.path);
                process::exit(1);
            }
        }
    } else {
        println!(
            "⚠️  Model artifact: {} not found (server would start without a model)",
            config.model.path
        );
    }

    println!();
    println!("✅ Configuration is valid");
}

fn scan_email_file(
    registry: TrustRegistry,
    scorer: Option<Arc<dyn TextScorer>>,
    email_file: &str,
) {
    println!("🧪 Scanning email file: {email_file}");
    println!();

    let content = match std::fs::read_to_string(email_file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Error reading email file: {e}");
            process::exit(1);
        }
    };

    let submission: EmailSubmission = match serde_json::from_str(&content) {
        Ok(submission) => submission,
        Err(e) => {
            eprintln!("❌ Error parsing email file: {e}");
            process::exit(1);
        }
    };

    // One-shot scans go to a memory sink, not the audit trail
    let engine = DecisionEngine::new(registry, scorer, Arc::new(MemoryAuditLog::new()));

    match engine.scan(&submission) {
        Ok(result) => {
            println!("   Sender: {}", submission.sender);
            println!("   Subject: {}", submission.subject);
            println!();
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("❌ Error serializing result: {e}");
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ Scan failed: {e}");
            process::exit(1);
        }
    }
}
