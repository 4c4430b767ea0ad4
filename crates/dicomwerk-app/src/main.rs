// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dicomwerk — batch DICOM image review and PDF export
//
// Entry point. Initialises logging, loads the config, and runs one command.

mod cli;
mod services;
mod state;

use std::process::ExitCode;

use dicomwerk_core::PageSize;
use dicomwerk_core::error::Result;
use dicomwerk_core::human_errors::humanize_error;
use dicomwerk_export::{ExportEvent, ImageStage};
use tokio::sync::mpsc;

use cli::{Command, Invocation, Selection};
use services::session::Session;
use services::settings;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli::parse(pico_args::Arguments::from_env()) {
        Ok(invocation) => run(invocation).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, kind = ?err.kind(), "command failed");
            eprintln!("{}", humanize_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(invocation: Invocation) -> Result<()> {
    let config_path = invocation.config.unwrap_or_else(settings::config_path);
    let mut config = settings::load_config(&config_path);

    match invocation.command {
        Command::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }

        Command::List {
            input,
            page,
            page_size,
        } => {
            let mut session = Session::new(dicomwerk_render::default_engine(), config)?;
            session.import_path(&input)?;
            if let Some(size) = page_size {
                session.set_page_size(PageSize::try_from(size)?);
            }
            session.go_to_page(page);
            println!("{}", session.page_view());
            Ok(())
        }

        Command::Export {
            input,
            selection,
            annotation,
            filter,
            out,
        } => {
            if out.is_some() {
                config.output_dir = out;
            }
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let mut session = Session::new(dicomwerk_render::default_engine(), config)?
                .with_export_events(events_tx);
            let printer = tokio::spawn(print_progress(events_rx));

            let change = session.import_path(&input)?;
            println!("imported {} images", change.len);

            match selection {
                Selection::All => session.select_all(),
                Selection::Indices(indices) => {
                    for index in indices {
                        session.select(index)?;
                    }
                }
            }
            session.set_annotation(annotation);

            if let Some(index) = filter {
                // The export still runs without the filtered page.
                match session.apply_filter(index).await {
                    Ok(filtered) => println!("filtered image {index}: {} bytes", filtered.bytes.len()),
                    Err(err) => eprintln!("{}", humanize_error(&err)),
                }
            }

            println!(
                "exporting {} of {} images{} to {}",
                session.selection().selected_count(),
                session.catalog().len(),
                if session.filtered().is_some() { " plus the filtered image" } else { "" },
                session.output_path().display()
            );
            let report = session.export().await?;
            drop(session);
            let _ = printer.await;

            println!(
                "saved {} ({} pages, {} skipped)",
                report.output_path.display(),
                report.pages.len(),
                report.failures.len()
            );
            if report.annotation_truncated {
                eprintln!("warning: the annotation did not fit on one page and was cut short");
            }
            if report.all_images_failed() {
                eprintln!("warning: none of the selected images could be rendered");
            }
            if !report.dangling.is_empty() {
                eprintln!(
                    "warning: selected positions {:?} are not in the catalog",
                    report.dangling
                );
            }
            Ok(())
        }

        Command::Config {
            page_size,
            filter_endpoint,
            out,
            selection_on_import,
        } => {
            if let Some(size) = page_size {
                config.page_size = PageSize::try_from(size)?;
            }
            if let Some(endpoint) = filter_endpoint {
                config.filter_endpoint = endpoint;
            }
            if out.is_some() {
                config.output_dir = out;
            }
            if let Some(policy) = selection_on_import {
                config.selection_on_import = policy;
            }
            settings::persist_config(&config_path, &config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn print_progress(mut events: mpsc::UnboundedReceiver<ExportEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ExportEvent::ImageStarted { index } => println!("rendering image {index}"),
            ExportEvent::Stage {
                index,
                stage: ImageStage::PageAppended,
            } => println!("  page added for image {index}"),
            ExportEvent::Stage { .. } => {}
            ExportEvent::ImageSkipped(failure) => println!(
                "  skipped image {} while {}: {}",
                failure.index, failure.stage, failure.detail
            ),
            ExportEvent::Saved { path, pages } => {
                println!("wrote {pages} pages to {}", path.display())
            }
        }
    }
}
