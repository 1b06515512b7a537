//! Command-line argument parsing and definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;

/// Shopkit CLI - query a shop's admin REST API
///
/// Credentials are read from `SHOPKIT_APP_KEY`, `SHOPKIT_APP_SECRET`,
/// `SHOPKIT_APP_PASSWORD` and `SHOPKIT_SHOP_DOMAIN` (a `.env` file is honoured).
#[derive(Parser, Debug)]
#[command(
    name = "shopkit",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Access token for public apps; overrides the shared-secret password
    #[arg(long, global = true, env = "SHOPKIT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "pretty")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET an arbitrary admin path, e.g. `shop.json`
    Get(GetArgs),

    /// Send any supported method to an admin path
    Request(RequestArgs),

    /// List a resource, optionally walking every page
    List(ListArgs),

    /// Count the records of a resource
    Count(CountArgs),

    /// Print the URL a shop owner visits to install the app
    AuthorizeUrl(AuthorizeUrlArgs),

    /// Exchange an authorization code for an access token
    ExchangeCode(ExchangeCodeArgs),
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Path relative to the admin base path
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Query parameters as a JSON object
    #[arg(short, long, value_name = "JSON")]
    pub params: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// HTTP method: GET, HEAD, POST, PUT, PATCH or DELETE
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Path relative to the admin base path
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Query parameters or JSON body, as a JSON object
    #[arg(short, long, value_name = "JSON")]
    pub params: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Resource name, e.g. `products`
    #[arg(value_name = "RESOURCE")]
    pub resource: String,

    /// Query parameters as a JSON object
    #[arg(short, long, value_name = "JSON")]
    pub params: Option<String>,

    /// Follow `next` links until every page has been fetched
    #[arg(short, long)]
    pub all: bool,

    /// Page size requested from the API
    #[arg(long, value_name = "N")]
    pub per_page: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct CountArgs {
    #[arg(value_name = "RESOURCE")]
    pub resource: String,

    /// Query parameters as a JSON object
    #[arg(short, long, value_name = "JSON")]
    pub params: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AuthorizeUrlArgs {
    /// Where the shop redirects after the grant
    #[arg(long)]
    pub redirect_uri: String,

    /// Requested access scopes
    #[arg(long, value_delimiter = ',', required = true)]
    pub scopes: Vec<String>,

    /// Opaque value echoed back on the redirect; random when omitted
    #[arg(long)]
    pub state: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ExchangeCodeArgs {
    /// The redirect URI the shop called back
    #[arg(long)]
    pub redirect_uri: String,

    /// Authorization code from the redirect
    #[arg(long)]
    pub code: String,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON
    Pretty,
    /// Single-line JSON
    Json,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stderr().is_terminal()
    }
}
