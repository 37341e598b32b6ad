use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::json;

use crate::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};
use crate::middleware::cors::headers::{
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
};
use crate::middleware::cors::CorsFileConfig;
use crate::middleware::TracingMiddleware;

/// Command-line interface for routecors
#[derive(Parser)]
#[command(name = "routecors")]
#[command(about = "Inspect and exercise CORS configuration files", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Send one request through the configured router and print the response
    Check {
        /// Path to the CORS configuration file (YAML or JSON)
        #[arg(short, long, env = "ROUTECORS_CONFIG")]
        config: PathBuf,

        /// Request path, e.g. /items/1
        #[arg(short, long)]
        path: String,

        /// Request method
        #[arg(short, long, default_value = "OPTIONS")]
        method: String,

        /// Value of the Origin header
        #[arg(long)]
        origin: Option<String>,

        /// Value of Access-Control-Request-Method
        #[arg(long)]
        request_method: Option<String>,

        /// Value of Access-Control-Request-Headers
        #[arg(long)]
        request_headers: Option<String>,
    },
    /// Print the routing table built from a configuration file
    Routes {
        /// Path to the CORS configuration file (YAML or JSON)
        #[arg(short, long, env = "ROUTECORS_CONFIG")]
        config: PathBuf,
    },
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read, parsed or
/// applied, or if the request method is not a valid HTTP method.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check {
            config,
            path,
            method,
            origin,
            request_method,
            request_headers,
        } => {
            let file = CorsFileConfig::load(&config)?;
            let mut headers = HeaderVec::new();
            for (name, value) in [
                (ORIGIN, origin),
                (ACCESS_CONTROL_REQUEST_METHOD, request_method),
                (ACCESS_CONTROL_REQUEST_HEADERS, request_headers),
            ] {
                if let Some(value) = value {
                    headers.push((Arc::from(name), value));
                }
            }
            let response = check_request(&file, &method, &path, headers)?;
            println!("{}", render_response(&response));
            Ok(())
        }
        Commands::Routes { config } => {
            let file = CorsFileConfig::load(&config)?;
            let (router, _cors) = file
                .build()
                .with_context(|| format!("Failed to apply {}", config.display()))?;
            router.dump_routes();
            Ok(())
        }
    }
}

/// Dispatch one request against the router described by `file`.
///
/// Every configured route answers with a JSON echo of its handler name and
/// the request path.
pub fn check_request(
    file: &CorsFileConfig,
    method: &str,
    path: &str,
    headers: HeaderVec,
) -> anyhow::Result<HandlerResponse> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{method}'"))?;
    let (router, cors) = file.build()?;

    let mut dispatcher = Dispatcher::new();
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    for (_, meta) in router.routes().filter(|(_, meta)| !meta.preflight) {
        if dispatcher.has_handler(&meta.handler_name) {
            continue;
        }
        let name = meta.handler_name.clone();
        dispatcher.register(&meta.handler_name, move |req| {
            HandlerResponse::json(200, json!({ "handler": name, "path": req.path }))
        });
    }
    Arc::new(cors.build()).install(&mut dispatcher);

    Ok(dispatcher.handle(&router, method, path, headers))
}

/// Status line, headers and body, one per line.
#[must_use]
pub fn render_response(response: &HandlerResponse) -> String {
    let mut out = format!("status: {}", response.status);
    for (name, value) in &response.headers {
        out.push('\n');
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
    }
    out.push_str("\n\n");
    out.push_str(&response.body_text());
    out
}
