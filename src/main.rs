use clap::Parser;
use routecors::cli::{run_cli, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Command output shares stdout with the log writer; keep it quiet unless asked.
    let level = std::env::var("ROUTECORS_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    let _guard = routecors::otel::init_logging(&level)?;
    run_cli(cli)
}
