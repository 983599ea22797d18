//! Command-line front end for the catalog read path.
//!
//! # Responsibility
//! - Map subcommands onto catalog requests and print JSON bodies.
//! - Exit non-zero when a request does not succeed.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use syllabus_core::{
    db::open_db_with_options, default_log_level, init_logging, ApiResponse, CatalogRequest,
    LoggingConfig, ReadGateway, StoreOptions,
};

use crate::cli::{Cli, Commands};

fn main() {
    if let Err(err) = run() {
        error!("event=cli_exit module=cli status=error error={err}");
        eprintln!("error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::stderr(
        cli.log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string()),
    );
    if let Some(dir) = &cli.log_dir {
        logging = logging.with_log_dir(dir);
    }
    init_logging(&logging).context("failed to initialize logging")?;

    let options = StoreOptions::default()
        .with_busy_timeout_ms(cli.store.busy_timeout_ms)
        .with_query_timeout_ms(cli.store.query_timeout_ms);

    let request = match cli.command {
        Commands::Init => {
            open_db_with_options(&cli.store.db_path, &options).with_context(|| {
                format!(
                    "failed to initialize content store `{}`",
                    cli.store.db_path.display()
                )
            })?;
            info!(
                "event=store_init module=cli status=ok path={}",
                cli.store.db_path.display()
            );
            return Ok(());
        }
        Commands::Subjects => CatalogRequest::Subjects,
        Commands::Syllabus(args) => CatalogRequest::Syllabus {
            subject: args.subject,
        },
        Commands::Subtopics(args) => CatalogRequest::SubTopics {
            subject: args.subject,
        },
        Commands::MicroUnits(args) => CatalogRequest::MicroUnits {
            subject: args.subject,
            subtopic: args.subtopic,
        },
        Commands::Note(args) => CatalogRequest::Note {
            micro_unit_id: args.micro_unit_id,
        },
        Commands::Mcqs(args) => CatalogRequest::Mcqs {
            micro_unit_id: args.micro_unit_id,
        },
    };

    let gateway = ReadGateway::new(cli.store.db_path, options);
    let response = gateway.handle(&request);
    print_response(&response)?;

    if !response.status.is_ok() {
        bail!(
            "{} returned status {}",
            request.operation(),
            response.status.http_code()
        );
    }
    Ok(())
}

fn print_response(response: &ApiResponse) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(&response.body).context("failed to render response body")?;
    println!("{rendered}");
    Ok(())
}
