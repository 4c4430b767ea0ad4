// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line parsing.

use std::path::PathBuf;

use dicomwerk_core::SelectionOnImport;
use dicomwerk_core::error::{DicomwerkError, Result};
use pico_args::Arguments;

pub const USAGE: &str = "\
dicomwerk — review a batch of DICOM images and export a selection to PDF

USAGE:
  dicomwerk list <INPUT> [--page N] [--page-size 5|10|20]
  dicomwerk export <INPUT> [--select 0,2,... | --all] [--annotation TEXT]
                           [--filter INDEX] [--out DIR]
  dicomwerk config [--page-size 5|10|20] [--filter-endpoint URL] [--out DIR]
                   [--selection keep|prune]

OPTIONS:
  --config PATH   use this config file instead of the one in the data directory
  -h, --help      print this help

INPUT is a single image file or a .zip archive of images.
Indices are 0-based catalog positions.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Indices(Vec<usize>),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List {
        input: PathBuf,
        page: usize,
        page_size: Option<usize>,
    },
    Export {
        input: PathBuf,
        selection: Selection,
        annotation: String,
        filter: Option<usize>,
        out: Option<PathBuf>,
    },
    Config {
        page_size: Option<usize>,
        filter_endpoint: Option<String>,
        out: Option<PathBuf>,
        selection_on_import: Option<SelectionOnImport>,
    },
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub config: Option<PathBuf>,
}

pub fn parse(mut args: Arguments) -> Result<Invocation> {
    if args.contains(["-h", "--help"]) {
        return Ok(Invocation {
            command: Command::Help,
            config: None,
        });
    }
    let subcommand = args.subcommand().map_err(arg_error)?;
    let config = args.opt_value_from_str("--config").map_err(arg_error)?;

    let command = match subcommand.as_deref() {
        None | Some("help") => Command::Help,
        Some("list") => Command::List {
            page: args.opt_value_from_str("--page").map_err(arg_error)?.unwrap_or(1),
            page_size: args.opt_value_from_str("--page-size").map_err(arg_error)?,
            input: args.free_from_str().map_err(arg_error)?,
        },
        Some("export") => {
            let all = args.contains("--all");
            let indices = args
                .opt_value_from_fn("--select", parse_indices)
                .map_err(arg_error)?;
            let selection = match (all, indices) {
                (true, Some(_)) => {
                    return Err(DicomwerkError::Config(
                        "--all and --select cannot be combined".into(),
                    ));
                }
                (true, None) => Selection::All,
                (false, indices) => Selection::Indices(indices.unwrap_or_default()),
            };
            Command::Export {
                selection,
                annotation: args
                    .opt_value_from_str("--annotation")
                    .map_err(arg_error)?
                    .unwrap_or_default(),
                filter: args.opt_value_from_str("--filter").map_err(arg_error)?,
                out: args.opt_value_from_str("--out").map_err(arg_error)?,
                input: args.free_from_str().map_err(arg_error)?,
            }
        }
        Some("config") => Command::Config {
            page_size: args.opt_value_from_str("--page-size").map_err(arg_error)?,
            filter_endpoint: args
                .opt_value_from_str("--filter-endpoint")
                .map_err(arg_error)?,
            out: args.opt_value_from_str("--out").map_err(arg_error)?,
            selection_on_import: args
                .opt_value_from_fn("--selection", parse_selection_policy)
                .map_err(arg_error)?,
        },
        Some(other) => {
            return Err(DicomwerkError::Config(format!("unknown command `{other}`")));
        }
    };

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(DicomwerkError::Config(format!("unexpected arguments: {rest:?}")));
    }
    Ok(Invocation { command, config })
}

/// Parse `0,2,5` into indices.
fn parse_indices(value: &str) -> std::result::Result<Vec<usize>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| format!("`{part}` is not a catalog index"))
        })
        .collect()
}

fn parse_selection_policy(value: &str) -> std::result::Result<SelectionOnImport, String> {
    match value {
        "keep" => Ok(SelectionOnImport::Keep),
        "prune" => Ok(SelectionOnImport::Prune),
        other => Err(format!("`{other}` is not one of keep, prune")),
    }
}

fn arg_error(err: pico_args::Error) -> DicomwerkError {
    DicomwerkError::Config(err.to_string())
}
