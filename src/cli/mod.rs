//! # CLI Module
//!
//! Command-line tooling for CORS configuration files.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Build the router described by a configuration file, send one synthetic
//! request through it and print the response:
//!
//! ```bash
//! routecors check --config cors.yaml --path /items/1 \
//!     --origin http://client.example --request-method PUT
//! ```
//!
//! The request is an OPTIONS preflight by default; pass `--method GET` to see
//! how an actual request's response is decorated. Every configured route is
//! served by an echo handler.
//!
//! ### `routes`
//!
//! Print the routing table, including the synthetic preflight routes:
//!
//! ```bash
//! routecors routes --config cors.yaml
//! ```

mod commands;


pub use commands::{check_request, render_response, run_cli, Cli, Commands};
