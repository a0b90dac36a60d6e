use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use isoreq::{ClientConfig, FormData, Options};
use tracing::Level;
use url::Url;

/// Send one HTTP request and print the response
#[derive(Debug, Parser)]
#[command(name = "isoreq", author = env!("CARGO_PKG_AUTHORS"), version = env!("CARGO_PKG_VERSION"))]
pub struct CliArgs {
    /// Config file (TOML); `ISOREQ_*` environment variables override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: Level,
    /// HTTP method
    pub method: String,
    /// Request URL, absolute or relative to the configured base URL
    pub url: String,
    /// Request header as `name:value`
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// Query parameter as `key=value`
    #[arg(short = 'q', long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
    /// JSON body
    #[arg(long, conflicts_with_all = ["form", "data"])]
    pub json: Option<String>,
    /// Multipart field as `name=value`, or `name=@path` to upload a file
    #[arg(short = 'F', long = "form", value_parser = parse_key_value, conflicts_with = "data")]
    pub form: Vec<(String, String)>,
    /// Raw body
    #[arg(short = 'd', long)]
    pub data: Option<String>,
    /// Return redirect responses instead of following them
    #[arg(long)]
    pub no_follow: bool,
    /// Redirect limit
    #[arg(long)]
    pub max_redirects: Option<u32>,
    /// Timeout in seconds; 0 disables it
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Base URL for relative request URLs
    #[arg(long)]
    pub base_url: Option<Url>,
    /// Decode the body with this encoding (utf8, ascii, latin1, hex, base64)
    #[arg(short, long)]
    pub encoding: Option<String>,
    /// Print the status line and headers before the body
    #[arg(short, long)]
    pub include: bool,
    /// Exit with an error on a status of 400 or above
    #[arg(long)]
    pub fail: bool,
}

impl CliArgs {
    /// Let command line flags override the loaded config
    pub fn apply(&self, config: &mut ClientConfig) {
        if self.no_follow {
            config.follow_redirects = false;
        }
        if let Some(max) = self.max_redirects {
            config.max_redirects = max;
        }
        if let Some(timeout) = self.timeout {
            config.set_timeout(Duration::from_secs(timeout));
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
    }

    /// Per request options described by the flags
    pub fn options(&self) -> Result<Options> {
        let mut options = Options::new();

        for (key, value) in &self.query {
            options = options.query(key.as_str(), value.as_str());
        }
        for (name, value) in &self.headers {
            options = options.header(name.as_str(), value.as_str());
        }

        if let Some(json) = &self.json {
            let value: serde_json::Value =
                serde_json::from_str(json).context("--json is not valid JSON")?;
            options = options.json(&value);
        } else if !self.form.is_empty() {
            options = options.form(build_form(&self.form)?);
        } else if let Some(data) = &self.data {
            options = options.body(data.as_str());
        }

        if let Some(timeout) = self.timeout {
            options = options.timeout(Duration::from_secs(timeout));
        }

        Ok(options)
    }
}

fn build_form(fields: &[(String, String)]) -> Result<FormData> {
    let mut form = FormData::new();
    for (name, value) in fields {
        form = match value.strip_prefix('@') {
            Some(path) => {
                let path = Path::new(path);
                let data = std::fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
                form.append_file(name.as_str(), file_name, None, data)
            }
            None => form.append(name.as_str(), value.as_str()),
        };
    }
    Ok(form)
}

/// Parse `name:value`
pub fn parse_header(s: &str) -> Result<(String, String)> {
    let Some((name, value)) = s.split_once(':') else {
        bail!("expected `name:value`, got `{}`", s);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header name is empty in `{}`", s);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse `key=value`
pub fn parse_key_value(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, _)) if key.is_empty() => bail!("key is empty in `{}`", s),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => bail!("expected `key=value`, got `{}`", s),
    }
}
