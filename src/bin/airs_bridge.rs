//! airs-bridge: command-line front end for the scanning API client.
//!
//! Usage:
//!   airs-bridge scan <prompt> [--profile <name>] [--response <text>]
//!   airs-bridge results <scan-id>...
//!   airs-bridge reports <report-id>...
//!   airs-bridge config
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`). Results are
//! printed as JSON.

use anyhow::{bail, Context};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use airs_bridge::client::{ClientFactory, RequestOptions, ScanApi};
use airs_bridge::config::BridgeConfig;
use airs_bridge::types::{AiProfile, ContentItem, ScanMetadata, ScanRequest};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "scan" => cmd_scan(&args[2..]).await,
        "results" => cmd_results(&args[2..]).await,
        "reports" => cmd_reports(&args[2..]).await,
        "config" => cmd_config(),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"airs-bridge: AI Runtime Security scanning client

USAGE:
    airs-bridge <COMMAND> [OPTIONS]

COMMANDS:
    scan [<prompt>] [OPTIONS]   Scan a prompt and/or response
        --profile <name>        Security profile name (default: "default")
        --profile-id <id>       Security profile id
        --response <text>       Model response text
        --context <text>        Grounding context
        --app-name <name>       Application name metadata
        --async                 Submit asynchronously and print the handle
        --no-cache              Skip the cache lookup
    results <scan-id>...        Fetch results for scan ids
    reports <report-id>...      Fetch detailed threat reports
    config                      Show the effective configuration (key redacted)
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    AIRS_CONFIG                 YAML configuration file (overrides AIRS_* variables)
    AIRS_API_KEY                API key
    AIRS_API_URL                API base URL
    RUST_LOG                    Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("airs-bridge {}", env!("CARGO_PKG_VERSION"));
}

fn load_config() -> airs_bridge::Result<BridgeConfig> {
    match std::env::var("AIRS_CONFIG") {
        Ok(path) => BridgeConfig::from_yaml_file(path),
        Err(_) => BridgeConfig::from_env(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], name: &str) -> anyhow::Result<Option<&'a str>> {
    match args.iter().position(|a| a == name) {
        None => Ok(None),
        Some(i) => match args.get(i + 1) {
            Some(v) if !v.starts_with("--") => Ok(Some(v.as_str())),
            _ => bail!("{name} requires a value"),
        },
    }
}

fn positional_ids(args: &[String], what: &str) -> anyhow::Result<Vec<String>> {
    let ids: Vec<String> = args
        .iter()
        .flat_map(|a| a.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if ids.is_empty() {
        bail!("at least one {what} is required");
    }
    Ok(ids)
}

fn options(args: &[String]) -> RequestOptions {
    let opts = RequestOptions::new();
    if args.iter().any(|a| a == "--no-cache") {
        opts.bypass_cache()
    } else {
        opts
    }
}

async fn cmd_scan(args: &[String]) -> anyhow::Result<()> {
    let profile = match (flag_value(args, "--profile")?, flag_value(args, "--profile-id")?) {
        (Some(name), _) => AiProfile::named(name),
        (None, Some(id)) => AiProfile::with_id(id),
        (None, None) => AiProfile::named("default"),
    };

    let prompt = positionals(args).into_iter().next();
    let response = flag_value(args, "--response")?;
    let mut item = match (prompt, response) {
        (Some(p), r) => {
            let item = ContentItem::prompt(p);
            match r {
                Some(r) => item.with_response(r),
                None => item,
            }
        }
        (None, Some(r)) => ContentItem::default().with_response(r),
        (None, None) => bail!("a prompt or --response is required"),
    };
    if let Some(ctx) = flag_value(args, "--context")? {
        item = item.with_context(ctx);
    }

    let mut request = ScanRequest::new(profile, vec![item]);
    if let Some(app) = flag_value(args, "--app-name")? {
        request = request.with_metadata(ScanMetadata {
            app_name: Some(app.to_string()),
            ..ScanMetadata::default()
        });
    }

    let factory = ClientFactory::new(load_config);
    let client = factory.get_client().context("failed to initialize client")?;
    let opts = options(args);

    if args.iter().any(|a| a == "--async") {
        let handle = client.scan_async(&[request], &opts).await?;
        print_json(&handle)
    } else {
        let verdict = client.scan_sync(&request, &opts).await?;
        print_json(&verdict)
    }
}

async fn cmd_results(args: &[String]) -> anyhow::Result<()> {
    let ids = positional_ids(&positionals(args), "scan id")?;
    let factory = ClientFactory::new(load_config);
    let client = factory.get_client().context("failed to initialize client")?;
    let results = client.get_scan_results(&ids, &options(args)).await?;
    print_json(&results)
}

async fn cmd_reports(args: &[String]) -> anyhow::Result<()> {
    let ids = positional_ids(&positionals(args), "report id")?;
    let factory = ClientFactory::new(load_config);
    let client = factory.get_client().context("failed to initialize client")?;
    let reports = client.get_threat_scan_reports(&ids, &options(args)).await?;
    print_json(&reports)
}

fn cmd_config() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    print_json(&config.redacted())?;
    if let Err(e) = config.validate() {
        bail!("configuration is invalid: {e}");
    }
    Ok(())
}

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &[
    "--profile",
    "--profile-id",
    "--response",
    "--context",
    "--app-name",
];

/// Arguments that are neither flags nor flag values.
fn positionals(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with("--") {
            out.push(arg.clone());
        }
    }
    out
}
