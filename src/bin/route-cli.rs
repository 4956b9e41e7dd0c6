use std::path::PathBuf;

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use party_router::config::load_config;
use party_router::http::HandlerRegistry;
use party_router::lifecycle::build_table;
use party_router::routing::ResolveError;

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect the route table built from a router config", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List routes in registration order
    Routes,
    /// Resolve a request against the table
    Resolve {
        method: String,
        host: String,
        path: String,
    },
    /// Build the path of a named route
    UrlFor {
        name: String,
        values: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let table = build_table(&config, &HandlerRegistry::new())?;
    let router = &table.router;

    let output = match cli.command {
        Commands::Routes => {
            let routes: Vec<_> = router.routes().iter().map(|r| r.info()).collect();
            serde_json::to_value(routes)?
        }
        Commands::Resolve { method, host, path } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            match router.resolve(&method, &host, &path) {
                Ok(matched) => json!({
                    "outcome": "matched",
                    "route": matched.route.info(),
                    "params": matched.params,
                    "subdomain": matched.subdomain,
                }),
                Err(ResolveError::NotFound) => json!({ "outcome": "not_found" }),
                Err(ResolveError::MethodNotAllowed { allowed }) => json!({
                    "outcome": "method_not_allowed",
                    "allowed": allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
                }),
            }
        }
        Commands::UrlFor { name, values } => {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            match router.url_for(&name, &values) {
                Some(url) => Value::String(url),
                None => {
                    eprintln!("Error: no route named `{}` accepts {:?}", name, values);
                    std::process::exit(1);
                }
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
