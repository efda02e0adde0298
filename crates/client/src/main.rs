//! Command-line access to the Symplur API.
//!
//! Run with: `symplur <COMMAND> <PATH> [KEY=VALUE ...]`
//!
//! Credentials come from `SYMPLUR_CLIENT_ID`/`SYMPLUR_CLIENT_SECRET` (a
//! `.env` file is honoured) or from `symplur.toml`/`symplur.json`.
//!
//! This is a CLI tool, so `println!` and `eprintln!` are used for
//! user-facing output rather than structured logging.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use reqwest::Method;
use serde_json::Value;
use symplur_client::http::RequestParams;
use symplur_client::{config, ApiClient};
use symplur_common::{init_tracing, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let format = env::var("SYMPLUR_LOG_FORMAT")
        .ok()
        .and_then(|value| value.parse::<LogFormat>().ok())
        .unwrap_or_default();
    init_tracing(format);

    let args: Vec<String> = env::args().skip(1).collect();

    let result = match args.first().map(String::as_str) {
        Some("help" | "--help" | "-h") | None => {
            print_help();
            Ok(())
        }
        Some(command) => run(command, &args[1..]).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("Symplur API client");
    println!();
    println!("USAGE:");
    println!("    symplur <COMMAND> <PATH> [KEY=VALUE ...]");
    println!("    symplur token");
    println!();
    println!("COMMANDS:");
    println!("    get       GET <PATH>, KEY=VALUE pairs sent as the query string");
    println!("    post      POST <PATH>, KEY=VALUE pairs sent as a form body");
    println!("    put       PUT <PATH>, form body");
    println!("    patch     PATCH <PATH>, form body");
    println!("    delete    DELETE <PATH>, form body");
    println!("    token     Print the current access token");
    println!("    help      Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    SYMPLUR_CLIENT_ID, SYMPLUR_CLIENT_SECRET, SYMPLUR_BASE_URI,");
    println!("    SYMPLUR_TIMEOUT_SECS, SYMPLUR_LOG_FORMAT (pretty|json), RUST_LOG");
}

async fn run(command: &str, rest: &[String]) -> anyhow::Result<()> {
    let method = match command {
        "token" => None,
        other => Some(parse_method(other)?),
    };

    let settings = config::load().context("Failed to load configuration")?;
    let mut client = ApiClient::from_settings(settings)?;

    let Some(method) = method else {
        let token = client.access_token().await?;
        println!("{token}");
        return Ok(());
    };

    let (path, pairs) = rest.split_first().ok_or_else(|| anyhow!("Missing <PATH> argument"))?;
    let pairs = parse_pairs(pairs)?;
    let params = if method == Method::GET {
        RequestParams::query(pairs)
    } else {
        RequestParams::form(pairs)
    };

    let result: Option<Value> = client.request_json(method, path, params).await?;
    let output = serde_json::to_string_pretty(&result.unwrap_or(Value::Null))?;
    println!("{output}");
    Ok(())
}

fn parse_method(command: &str) -> anyhow::Result<Method> {
    match command {
        "get" => Ok(Method::GET),
        "post" => Ok(Method::POST),
        "put" => Ok(Method::PUT),
        "patch" => Ok(Method::PATCH),
        "delete" => Ok(Method::DELETE),
        unknown => bail!("Unknown command: {unknown}"),
    }
}

fn parse_pairs(args: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{arg}'"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("delete").unwrap(), Method::DELETE);
        assert!(parse_method("options").is_err());
    }

    #[test]
    fn parses_key_value_pairs() {
        let args = vec!["one=fish".to_string(), "q=a=b".to_string(), "empty=".to_string()];
        let pairs = parse_pairs(&args).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("one".to_string(), "fish".to_string()),
                ("q".to_string(), "a=b".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn rejects_bare_words() {
        assert!(parse_pairs(&["fish".to_string()]).is_err());
    }
}
