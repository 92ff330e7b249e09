use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use microservice_relay::config::load_config;
use microservice_relay::lifecycle::startup;
use microservice_relay::routing::NamedRoutes;
use microservice_relay::service::{CallArgs, ConnectionService, ResponseEnvelope};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "One-shot caller for services configured for microservice-relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call an operation on a configured service
    Call {
        /// Service name from `[[services]]`
        service: String,
        /// Operation: get, post, put, patch, delete or a declared extension
        operation: String,
        /// Path, with or without the lookup prefix
        path: String,
        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
        /// Query parameter as key=value, repeatable
        #[arg(short, long = "param")]
        params: Vec<String>,
        /// Extra header as Name:value, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// List configured services and their operations
    Services,
    /// Resolve a named route
    Reverse {
        name: String,
        /// Route parameter as key=value, repeatable
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Call {
            service,
            operation,
            path,
            data,
            params,
            headers,
        } => {
            let definitions = startup::build(&config)?;
            let definition = definitions
                .iter()
                .find(|d| d.name() == service)
                .ok_or_else(|| format!("unknown service '{service}'"))?;

            let mut args = CallArgs::new();
            if let Some(data) = data {
                args = CallArgs::json(serde_json::from_str(&data)?);
            }
            if !params.is_empty() {
                args = args.with_params(split_pairs(&params, '=')?);
            }

            let envelope = if headers.is_empty() {
                ConnectionService::one_shot(definition, &path, &operation, args).await?
            } else {
                ConnectionService::with_special_headers(definition, &path, split_pairs(&headers, ':')?)
                    .produce_response(&operation, args)
                    .await?
            };
            print_envelope(&envelope)?;
        }
        Commands::Services => {
            for service in &config.services {
                println!(
                    "{}\t{}\t{}\t{}",
                    service.name,
                    service.lookup_prefix,
                    service.base_location.as_deref().unwrap_or("-"),
                    service.extension_methods.join(",")
                );
            }
        }
        Commands::Reverse { name, params } => {
            let routes = NamedRoutes::from_map(config.routes.clone());
            let pairs = split_pairs(&params, '=')?;
            let borrowed: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            println!("{}", routes.reverse(&name, &borrowed)?);
        }
    }

    Ok(())
}

fn split_pairs(items: &[String], separator: char) -> Result<Vec<(String, String)>, String> {
    items
        .iter()
        .map(|item| {
            item.split_once(separator)
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| format!("expected key{separator}value, got '{item}'"))
        })
        .collect()
}

fn print_envelope(envelope: &ResponseEnvelope) -> Result<(), Box<dyn std::error::Error>> {
    if !envelope.status().is_success() {
        eprintln!("Error: service returned status {}", envelope.status());
    }
    if *envelope.body() != Value::Null {
        println!("{}", serde_json::to_string_pretty(envelope.body())?);
    }
    Ok(())
}
