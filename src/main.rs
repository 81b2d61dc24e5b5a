//! sweezy-net - resilient access to the Sweezy backend
//!
//! Thin command-line wrapper over the library: builds the context once, runs a
//! single command and drains telemetry before exiting.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use sweezy_net::cli::{parse_header_arg, parse_method_arg, Cli, Command};
use sweezy_net::{AppContext, Config, FetchRequest, JobQuery};

/// Sends logs to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(ctx: &AppContext, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout().lock();
    match command {
        Command::Fetch {
            url,
            method,
            headers,
            data,
            context,
        } => {
            let mut request = FetchRequest::new(parse_method_arg(&method)?, Url::parse(&url)?);
            for header in &headers {
                let (name, value) = parse_header_arg(header)?;
                request = request.with_header(name, value);
            }
            if let Some(body) = data {
                request = request.with_body(body);
            }

            let response = ctx.fetcher().fetch_with_retry(&request, &context).await?;
            writeln!(
                stdout,
                "HTTP {} ({} ms, {} attempt(s))",
                response.status,
                response.elapsed.as_millis(),
                response.attempts
            )?;
            writeln!(stdout, "{}", response.text())?;
        }
        Command::Jobs {
            keyword,
            canton,
            page,
            per_page,
        } => {
            let mut query = JobQuery::new(keyword).page(page).per_page(per_page);
            if let Some(canton) = canton {
                query = query.canton(canton);
            }
            let result = ctx.jobs().search(&query).await?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&result)?)?;
        }
        Command::ClearCache => {
            let removed = match ctx.cache() {
                Some(cache) => cache.clear()?,
                None => 0,
            };
            writeln!(stdout, "{removed}")?;
        }
    }
    Ok(())
}

async fn try_main(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_cli(&cli)?;
    let ctx = AppContext::build(config)?;

    let result = run(&ctx, cli.command).await;
    ctx.shutdown().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match try_main(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
