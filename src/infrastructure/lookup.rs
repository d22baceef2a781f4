//! Remote barcode lookup over HTTP
//!
//! Talks to the sample tracking service that resolves scanned barcodes to
//! item records. The wire shapes here mirror the service's JSON exactly;
//! everything past [`parse_lookup_body`] is domain vocabulary.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::domain::messages;
use crate::domain::qcable::{Qcable, QcableState};
use crate::infrastructure::config::LookupConfig;

/// Ways a barcode lookup can fail.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// The service understood the barcode and rejected it with a reason.
    #[error("lookup rejected: {0}")]
    Rejected(String),
    /// A parseable reply that matches neither the item nor the error shape.
    #[error("lookup returned an unexpected payload")]
    UnexpectedPayload,
    /// The request never produced a usable reply.
    #[error("lookup transport failure: {0}")]
    Transport(String),
    /// The reply did not arrive within the configured bound.
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl LookupError {
    /// Message shown to the operator for this failure.
    ///
    /// Domain rejections carry the service's own wording verbatim;
    /// infrastructure failures collapse to a generic hint so a transient
    /// outage is not mistaken for a bad barcode.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(reason) => reason.clone(),
            Self::UnexpectedPayload => messages::UNEXPECTED_RESPONSE.to_string(),
            Self::Transport(_) | Self::Timeout(_) => messages::BARCODE_NOT_FOUND.to_string(),
        }
    }
}

/// Resolves one scanned barcode to its item record.
///
/// Implementations must eventually resolve every call to `Ok` or `Err`;
/// a call that never completes leaves its field `Pending` and the gate
/// closed (see `FieldMonitor::with_lookup_timeout` for the bound).
#[async_trait]
pub trait LookupClient: Send + Sync {
    async fn lookup(&self, barcode: &str) -> Result<Qcable, LookupError>;
}

/// Lookup reply as the tracking service serializes it.
#[derive(Debug, Deserialize)]
struct LookupResponseBody {
    qcable: Option<QcableResource>,
    error: Option<String>,
}

/// Item resource embedded in a successful reply. Field names follow the
/// service's camelCase convention; missing fields degrade to empty values
/// rather than failing the whole reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QcableResource {
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    template_id: String,
    #[serde(default)]
    display_type: String,
    #[serde(default)]
    lot_number: String,
    #[serde(default)]
    tag_layout_name: String,
    #[serde(default)]
    asset_id: Option<String>,
}

impl From<QcableResource> for Qcable {
    fn from(resource: QcableResource) -> Self {
        Self {
            identifier: resource.identifier,
            state: QcableState::from(resource.state),
            template_id: resource.template_id,
            display_type: resource.display_type,
            lot_number: resource.lot_number,
            tag_layout_name: resource.tag_layout_name,
            asset_id: resource.asset_id,
        }
    }
}

/// Triages a raw response body into item / rejection / unexpected.
///
/// A rejection takes precedence: a reply carrying both an `error` and a
/// `qcable` fails the lookup, it never resolves to the item.
fn parse_lookup_body(body: &str) -> Result<Qcable, LookupError> {
    let parsed: LookupResponseBody = serde_json::from_str(body)
        .map_err(|e| LookupError::Transport(format!("unparseable response body: {e}")))?;

    match (parsed.qcable, parsed.error) {
        (_, Some(reason)) => Err(LookupError::Rejected(reason)),
        (Some(resource), None) => Ok(resource.into()),
        (None, None) => Err(LookupError::UnexpectedPayload),
    }
}

/// HTTP implementation of [`LookupClient`] against the tracking service.
pub struct HttpLookupClient {
    client: Client,
    endpoint: Url,
    request_timeout: Duration,
}

impl HttpLookupClient {
    /// Builds a client from the lookup section of the app config.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        // The search endpoint lives at the service root regardless of any
        // path on the configured base URL.
        let endpoint = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid lookup base URL: {}", config.base_url))?
            .join("/search/qcables")
            .context("Failed to derive lookup endpoint")?;

        let request_timeout = Duration::from_secs(config.request_timeout_seconds);
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            request_timeout,
        })
    }

    /// Fully resolved search endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn transport_error(&self, error: reqwest::Error) -> LookupError {
        if error.is_timeout() {
            LookupError::Timeout(self.request_timeout)
        } else {
            LookupError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl LookupClient for HttpLookupClient {
    async fn lookup(&self, barcode: &str) -> Result<Qcable, LookupError> {
        tracing::debug!(%barcode, endpoint = %self.endpoint, "submitting barcode lookup");

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("qcable_barcode", barcode)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            tracing::warn!(%status, %barcode, "lookup endpoint returned a non-success status");
            return Err(LookupError::Transport(format!("HTTP status {status}")));
        }

        parse_lookup_body(&body)
    }
}
