use std::path::PathBuf;

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use dev_proxy::config::load_or_default;
use dev_proxy::routing::{RewriteStrategy, Router, RoutingError, RuleTable};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Inspect dev-proxy rules without starting the server", long_about = None)]
struct Cli {
    /// TOML config file. Built-in rules are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration
    Check,
    /// List rules in evaluation order
    Rules,
    /// Show where a request path would be forwarded
    Resolve {
        path: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
    },
}

#[derive(Serialize)]
struct RuleView<'a> {
    priority: usize,
    name: &'a str,
    kind: &'static str,
    pattern: &'a str,
    target: &'a str,
    change_origin: bool,
    rewrite: &'a RewriteStrategy,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    let table = RuleTable::from_config(&config.rules)?;

    match cli.command {
        Commands::Check => {
            print_json(&json!({
                "valid": true,
                "rules": table.len(),
                "bind_address": config.listener.bind_address,
            }))?;
        }
        Commands::Rules => {
            let rules: Vec<RuleView> = table
                .rules()
                .iter()
                .enumerate()
                .map(|(priority, rule)| RuleView {
                    priority,
                    name: &rule.name,
                    kind: if rule.matcher.is_literal() { "prefix" } else { "regex" },
                    pattern: rule.matcher.as_str(),
                    target: rule.upstream.base(),
                    change_origin: rule.change_origin,
                    rewrite: &rule.rewrite,
                })
                .collect();
            print_json(&rules)?;
        }
        Commands::Resolve { path, method } => {
            let method: Method = method.to_uppercase().parse()?;
            match Router::new(table).resolve(&method, &path) {
                Ok(resolution) => print_json(&resolution)?,
                Err(RoutingError::NoMatchingRoute { path }) => {
                    print_json(&json!({ "error": "no_matching_route", "path": path }))?;
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
