//! Shopkit CLI - command-line access to a shop's admin REST API
//!
//! Thin wrapper around `shopkit-core`: every subcommand builds a `ShopSdk`
//! from the environment and prints the JSON it gets back.

mod cli;
mod error;
mod logging;

use cli::{Cli, Commands, CountArgs, ExchangeCodeArgs, GetArgs, ListArgs, OutputFormat, RequestArgs};
use colored::control;
use error::{Error, Result};
use logging::LoggingConfig;
use serde_json::Value;
use serde_json::{json, Map};
use shopkit_core::utils::validate_http_method;
use shopkit_core::{HeaderMap, PageableApi, ShopSdk};
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    let mut logging = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging.merge_with_env();
    if let Err(e) = logging::init_logging(&logging) {
        eprintln!("{}", e);
    }

    match run(cli).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

#[instrument(skip(cli), fields(command = ?cli.command))]
async fn run(cli: Cli) -> Result<()> {
    let mut sdk = ShopSdk::from_env()?;
    if let Some(token) = &cli.access_token {
        sdk.set_access_token(token.as_str())?;
    }
    tracing::info!(endpoint = sdk.client().endpoint(), "Client ready");

    let output = match cli.command {
        Commands::Get(args) => get(&sdk, args).await?,
        Commands::Request(args) => request(&sdk, args).await?,
        Commands::List(args) => list(&sdk, args).await?,
        Commands::Count(args) => count(&sdk, args).await?,
        Commands::AuthorizeUrl(args) => {
            let scopes: Vec<&str> = args.scopes.iter().map(String::as_str).collect();
            let state = args.state.unwrap_or_else(|| shopkit_core::utils::random_string(16));
            let url = sdk.authorization_url(&args.redirect_uri, &scopes, Some(&state), &[])?;
            json!({ "url": url, "state": state })
        }
        Commands::ExchangeCode(args) => exchange_code(&sdk, args).await?,
    };

    print_value(&output, cli.output)
}

async fn get(sdk: &ShopSdk, args: GetArgs) -> Result<Value> {
    let params = parse_params(args.params.as_deref())?;
    let content = sdk.client().get(&args.path, params, HeaderMap::new()).await?;
    Ok(content.into_value())
}

async fn request(sdk: &ShopSdk, args: RequestArgs) -> Result<Value> {
    let method = parse_method(&args.method)?;
    let params = parse_params(args.params.as_deref())?;
    let client = sdk.client();

    let content = match method.as_str() {
        "GET" => client.get(&args.path, params, HeaderMap::new()).await?,
        "POST" => client.post(&args.path, params, HeaderMap::new()).await?,
        "PUT" => client.put(&args.path, params, HeaderMap::new()).await?,
        "PATCH" => client.patch(&args.path, params, HeaderMap::new()).await?,
        "DELETE" => client.delete(&args.path, params, HeaderMap::new()).await?,
        _ => {
            let response = client.head(&args.path, params, HeaderMap::new()).await?;
            let headers: Map<String, Value> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| Some((name.to_string(), Value::from(value.to_str().ok()?))))
                .collect();
            return Ok(json!({ "status": response.status().as_u16(), "headers": headers }));
        }
    };
    Ok(content.into_value())
}

async fn list(sdk: &ShopSdk, args: ListArgs) -> Result<Value> {
    let params = parse_params(args.params.as_deref())?;
    let resource = sdk.resource(&args.resource)?;
    resource.set_per_page(args.per_page);

    if !args.all {
        return Ok(resource.list(params).await?);
    }

    let mut pager = sdk.pager();
    let all = pager.fetch_all(&resource, move |r| r.list(params)).await?;
    tracing::info!(
        resource = resource.name(),
        items = all.as_array().map_or(0, Vec::len),
        "Fetched every page"
    );
    Ok(all)
}

async fn count(sdk: &ShopSdk, args: CountArgs) -> Result<Value> {
    let params = parse_params(args.params.as_deref())?;
    let count = sdk.resource(&args.resource)?.count(params).await?;
    Ok(Value::from(count))
}

async fn exchange_code(sdk: &ShopSdk, args: ExchangeCodeArgs) -> Result<Value> {
    let token = sdk.access_token_from_code(&args.redirect_uri, &args.code).await?;
    Ok(json!({ "access_token": token.as_str() }))
}

/// Upper-cased method name, rejected unless the client supports it
fn parse_method(raw: &str) -> Result<String> {
    let method = raw.to_uppercase();
    validate_http_method(&method).map_err(|e| Error::invalid_args(e.to_string()))?;
    Ok(method)
}

/// `--params` must be a JSON object; absent means no parameters
fn parse_params(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    match serde_json::from_str(raw)? {
        value @ Value::Object(_) => Ok(value),
        other => Err(Error::invalid_args(format!("--params must be a JSON object, got {}", other))),
    }
}

fn print_value(value: &Value, format: OutputFormat) -> Result<()> {
    let rendered = match (format, value) {
        (_, Value::String(s)) => s.clone(),
        (OutputFormat::Pretty, _) => serde_json::to_string_pretty(value)?,
        (OutputFormat::Json, _) => serde_json::to_string(value)?,
    };
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_default_to_null() {
        assert_eq!(parse_params(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_params_must_be_object() {
        let params = parse_params(Some(r#"{"status": "any"}"#)).unwrap();
        assert_eq!(params["status"], "any");

        let err = parse_params(Some("[1, 2]")).unwrap_err();
        assert!(err.should_show_help());
        assert!(matches!(parse_params(Some("{oops")), Err(Error::Json(_))));
    }

    #[test]
    fn test_method_is_normalized_and_checked() {
        assert_eq!(parse_method("patch").unwrap(), "PATCH");
        let err = parse_method("trace").unwrap_err();
        assert!(err.should_show_help());
        assert_eq!(err.exit_code(), 6);
    }
}
