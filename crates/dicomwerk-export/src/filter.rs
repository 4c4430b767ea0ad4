// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client for the remote noise-reduction service.
//
// One image's original payload goes up as a multipart form; the response
// body is the filtered raster, kept verbatim for the trailing PDF page.

use dicomwerk_core::error::{DicomwerkError, Result};
use dicomwerk_core::{FilteredImage, ImageReference};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tracing::{info, instrument, warn};

/// Form field carrying the payload.
pub const FILTER_FIELD: &str = "file";
/// File name sent with the payload, whatever the image was called locally.
pub const FILTER_FILE_NAME: &str = "image.dcm";
pub const FILTER_CONTENT_TYPE: &str = "application/dicom";

#[derive(Debug, Clone)]
pub struct FilterClient {
    client: reqwest::Client,
    endpoint: String,
}

impl FilterClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("Dicomwerk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| DicomwerkError::FilterTransport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Send `image` to the service and return the filtered result.
    ///
    /// A non-success status becomes [`DicomwerkError::FilterRejected`] with
    /// the response body as the service wrote it.
    #[instrument(skip(self, image), fields(image = %image.id, bytes = image.payload.len()))]
    pub async fn apply(&self, image: &ImageReference) -> Result<FilteredImage> {
        let part = Part::bytes(image.payload.to_vec())
            .file_name(FILTER_FILE_NAME)
            .mime_str(FILTER_CONTENT_TYPE)
            .map_err(|err| DicomwerkError::FilterTransport(err.to_string()))?;
        let form = Form::new().part(FILTER_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| DicomwerkError::FilterTransport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
            warn!(status = status.as_u16(), "filter service rejected the image");
            return Err(DicomwerkError::FilterRejected {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| DicomwerkError::FilterTransport(err.to_string()))?;
        if bytes.is_empty() {
            return Err(DicomwerkError::FilterTransport(
                "filter service answered with an empty body".into(),
            ));
        }

        info!(bytes = bytes.len(), content_type = ?content_type, "filtered image received");
        Ok(FilteredImage {
            source: image.id,
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
