//! Command line and environment configuration
//!
//! Every flag can be overridden by an environment variable. A non-empty
//! environment value wins over whatever was passed on the command line.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::options::AppOptions;
use crate::errors::ExporterError;
use crate::logs::{LogLevel, LogOptions};

/// Prometheus exporter for Google Smart Device Management thermostats
#[derive(Parser, Debug, Clone)]
#[command(name = "sdm-exporter")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(long, default_value = ":8080")]
    pub listen_address: String,

    /// ID of the Smart Device Management project.
    #[arg(long, default_value = "")]
    pub project_id: String,

    /// Location on disk to the OAuth2 credentials JSON file.
    #[arg(long, default_value = "client_secret.json")]
    pub credentials: PathBuf,

    /// Location on disk to store the OAuth2 refresh token JSON file.
    #[arg(long, default_value = "refresh_token.json")]
    pub refresh_token: PathBuf,

    /// Delay between queries to the Smart Device Management API for recording metrics.
    #[arg(long, default_value = "60s")]
    pub record_metrics_delay: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log in JSON format.
    #[arg(long)]
    pub log_json: bool,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppOptions,
    pub logs: LogOptions,
}

impl Config {
    /// Combine parsed flags with environment overrides looked up via `env`
    pub fn resolve<E>(args: Args, env: E) -> Result<Self, ExporterError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|value| !value.is_empty());

        let listen_address = var("LISTEN_ADDRESS").unwrap_or(args.listen_address);
        let project_id = var("PROJECT_ID").unwrap_or(args.project_id);
        let credentials = var("CREDENTIALS").map(PathBuf::from).unwrap_or(args.credentials);
        let refresh_token = var("REFRESH_TOKEN")
            .map(PathBuf::from)
            .unwrap_or(args.refresh_token);
        let record_metrics_delay =
            parse_duration(&var("RECORD_METRICS_DELAY").unwrap_or(args.record_metrics_delay))?;
        let log_level: LogLevel = var("LOG_LEVEL")
            .unwrap_or(args.log_level)
            .parse()?;
        let json_format = match var("LOG_JSON") {
            Some(value) => parse_bool(&value)?,
            None => args.log_json,
        };

        if project_id.trim().is_empty() {
            return Err(ExporterError::ConfigError(
                "a project id is required (--project-id or PROJECT_ID)".to_string(),
            ));
        }

        if record_metrics_delay.is_zero() {
            return Err(ExporterError::ConfigError(
                "record metrics delay must be greater than zero".to_string(),
            ));
        }

        let mut app = AppOptions {
            project_id,
            credentials_file: credentials,
            token_file: refresh_token,
            ..Default::default()
        };
        app.server.address = normalize_listen_address(&listen_address);
        app.poller.interval = record_metrics_delay;

        Ok(Self {
            app,
            logs: LogOptions {
                log_level,
                json_format,
            },
        })
    }
}

/// Accept Go style `:8080` addresses
pub fn normalize_listen_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    }
}

fn parse_bool(value: &str) -> Result<bool, ExporterError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ExporterError::ConfigError(format!(
            "invalid boolean: {}",
            value
        ))),
    }
}

/// Parse a Go style duration such as `60s`, `1m30s`, `1.5h` or `250ms`
pub fn parse_duration(input: &str) -> Result<Duration, ExporterError> {
    let invalid = || ExporterError::ConfigError(format!("invalid duration: {:?}", input));

    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() || s.starts_with('-') {
        return Err(invalid());
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total += value * seconds_per_unit;
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}
