// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Nothing in Dicomwerk retries on its own, so `retriable` only tells the user
// whether running the same command again can help.

use crate::error::DicomwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy service — running the command again may work.
    Transient,
    /// The user must change something (input file, settings, service).
    ActionRequired,
    /// Cannot be fixed by retrying or by user action.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether trying again unchanged is worthwhile.
    pub retriable: bool,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n  {}", self.message, self.suggestion)
    }
}

/// Convert a `DicomwerkError` into a `HumanError`.
pub fn humanize_error(err: &DicomwerkError) -> HumanError {
    match err {
        DicomwerkError::Import(detail) => HumanError {
            message: "We couldn't read that file.".into(),
            suggestion: format!(
                "Check that it is a single image or a .zip archive of images and that it isn't damaged. ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DicomwerkError::IndexOutOfRange { index, len } => HumanError {
            message: format!("There is no image number {index}."),
            suggestion: format!("Pick an index between 0 and {}.", len.saturating_sub(1)),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DicomwerkError::Render(detail) | DicomwerkError::ImageError(detail) => HumanError {
            message: "One of the images couldn't be drawn.".into(),
            suggestion: format!("The file may be damaged or in a format we can't display. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        DicomwerkError::FilterTransport(detail) => humanize_transport_error(detail),

        DicomwerkError::FilterRejected { status, body } => HumanError {
            message: format!("The noise-reduction service refused the image (HTTP {status})."),
            suggestion: format!("The service said: {body}"),
            retriable: *status >= 500,
            severity: if *status >= 500 {
                Severity::Transient
            } else {
                Severity::Permanent
            },
        },

        DicomwerkError::Assembly(detail) | DicomwerkError::PdfError(detail) => HumanError {
            message: "The PDF couldn't be saved.".into(),
            suggestion: format!(
                "Check that the output folder exists and that you can write to it. ({detail})"
            ),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        DicomwerkError::Config(detail) => HumanError {
            message: "A setting is invalid.".into(),
            suggestion: format!("Fix the configuration file and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DicomwerkError::Io(io_err) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check the path and its permissions. ({io_err})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DicomwerkError::Serialization(detail) => HumanError {
            message: "Saved settings are corrupted.".into(),
            suggestion: format!("Delete config.json to restore the defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Network failures talking to the filter service.
fn humanize_transport_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("connection refused") || lower.contains("connect") {
        HumanError {
            message: "The noise-reduction service isn't running.".into(),
            suggestion: "Start the filter service, or point filter_endpoint at a running one.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("timed out") {
        HumanError {
            message: "The noise-reduction service didn't answer in time.".into(),
            suggestion: "It may be busy with a large image. Try again in a moment.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "We couldn't reach the noise-reduction service.".into(),
            suggestion: format!("Try again. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
