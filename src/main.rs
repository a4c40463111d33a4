use clap::Parser;
use tracing_subscriber::EnvFilter;

use matrix_calc::api::{Cli, Command, run_calc, run_http_server};

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            init_tracing("info");
            if let Err(e) = run_http_server(port).await {
                tracing::error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        Command::Calc(args) => {
            init_tracing("warn");
            match run_calc(&args) {
                Ok(out) => print!("{out}"),
                Err(msg) => {
                    eprintln!("{msg}");
                    std::process::exit(1);
                }
            }
        }
    }
}
