// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! CryptoDesk CLI - command-line front end for the cryptographic service
//!
//! Lists the supported algorithms, shows what each operation accepts, and runs single
//! operations. Input is validated locally before anything is sent.
//!
//! ```text
//! cryptodesk run AES encrypt -p key=0123456789abcdef -p data=hello
//! cryptodesk run SHA256 hash -p data=abc -p encoding=base64
//! cryptodesk run RSA1024 keypair
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use cryptodesk_core::{
    config::ClientConfig,
    registry::{self, AlgorithmDescriptor},
    Console, Field, OperationKind, OperationRequest,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cryptodesk")]
#[command(about = "CryptoDesk - Validated client for a remote cryptographic service", long_about = None)]
struct Args {
    /// Path to configuration file (ignored if --env-mode is set)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load configuration from environment variables instead of file
    #[arg(long, default_value = "false")]
    env_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported algorithms
    List,

    /// Show modes, encodings and fields for one algorithm
    Describe {
        /// Algorithm id (e.g. AES, RSA1024, SHA256)
        algorithm: String,
    },

    /// Run one operation
    Run {
        /// Algorithm id (e.g. AES, RSA1024, SHA256)
        algorithm: String,

        /// Operation (encrypt, decrypt, sign, verify, hash, encode, decode, keypair)
        operation: String,

        /// Parameter as name=value (e.g. key=..., data=..., mode=cbc, iv=...)
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Print client metrics after the operation
        #[arg(long)]
        stats: bool,
    },
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    if args.env_mode {
        info!("Loading configuration from environment variables");
        return ClientConfig::from_env().context("Failed to load configuration from environment");
    }
    match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ClientConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(ClientConfig::default()),
    }
}

fn parse_param(raw: &str) -> Result<(Field, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("parameter '{}' is not of the form name=value", raw))?;
    let field = Field::parse(name).ok_or_else(|| anyhow!("unknown parameter '{}'", name))?;
    Ok((field, value.to_string()))
}

fn print_list() {
    for descriptor in registry::registry().iter() {
        let operations: Vec<String> = descriptor
            .operations
            .iter()
            .map(|op| op.kind.to_string())
            .collect();
        println!(
            "{:<12} {:<28} {:?} [{}]",
            descriptor.id,
            descriptor.name,
            descriptor.category,
            operations.join(", ")
        );
    }
}

fn print_descriptor(descriptor: &AlgorithmDescriptor) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(descriptor)?);
    Ok(())
}

async fn run(
    config: ClientConfig,
    algorithm: String,
    operation: String,
    params: Vec<String>,
    stats: bool,
) -> Result<bool> {
    let kind = OperationKind::parse(&operation)
        .ok_or_else(|| anyhow!("unknown operation '{}'", operation))?;

    let mut request = OperationRequest::new(algorithm, kind);
    for raw in &params {
        let (field, value) = parse_param(raw)?;
        request = request.with(field, value);
    }

    let console = Console::new(&config).context("Failed to create client")?;
    let completion = console.execute(&request).await?;

    println!("{}", serde_json::to_string_pretty(&completion)?);
    if stats {
        eprint!("{}", console.metrics().prometheus_format());
    }

    Ok(completion.is_success())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing
    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("CryptoDesk v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    info!("Service base URL: {}", config.base_url);

    match args.command {
        Command::List => print_list(),
        Command::Describe { algorithm } => {
            let descriptor = registry::describe(&algorithm)?;
            print_descriptor(descriptor)?;
        }
        Command::Run {
            algorithm,
            operation,
            params,
            stats,
        } => {
            if !run(config, algorithm, operation, params, stats).await? {
                bail!("operation did not succeed");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        let (field, value) = parse_param("outputEncoding=base64").unwrap();
        assert_eq!(field, Field::OutputEncoding);
        assert_eq!(value, "base64");

        // Values may contain '='
        let (field, value) = parse_param("data=aGk=").unwrap();
        assert_eq!(field, Field::Data);
        assert_eq!(value, "aGk=");

        assert!(parse_param("nokey").is_err());
        assert!(parse_param("colour=blue").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let args = Args::try_parse_from([
            "cryptodesk",
            "run",
            "AES",
            "encrypt",
            "-p",
            "key=0123456789abcdef",
            "--param",
            "data=hello",
        ])
        .unwrap();
        let Command::Run { algorithm, params, .. } = args.command else {
            panic!("expected run");
        };
        assert_eq!(algorithm, "AES");
        assert_eq!(params.len(), 2);
    }
}
