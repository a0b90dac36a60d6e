//! isoreq command line client

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use isoreq::{Body, Client, Response};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let env_filter = EnvFilter::new(format!("{},hyper=warn,rustls=warn", args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = config::load(args.config.as_deref()).context("Failed to load config")?;
    args.apply(&mut settings);
    tracing::debug!(?settings, "Loaded config");

    let client = Client::with_config(settings)?;
    let mut response = client
        .request(&args.method, &args.url, args.options()?)
        .await?;
    if args.fail {
        response = response.error_for_status()?;
    }

    let body = response.get_body(args.encoding.as_deref()).await?;
    print_response(&response, &body, args.include)?;

    Ok(())
}

fn print_response(response: &Response, body: &Body, include: bool) -> Result<()> {
    let mut out = std::io::stdout().lock();

    if include {
        writeln!(out, "HTTP {}", response.status())?;
        for (name, value) in response.headers() {
            writeln!(out, "{}: {}", name, value)?;
        }
        writeln!(out)?;
    }

    match body {
        Body::Text(text) => writeln!(out, "{}", text)?,
        Body::Bytes(bytes) => out.write_all(bytes)?,
    }
    out.flush()?;

    Ok(())
}
