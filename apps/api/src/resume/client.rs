//! Client for the external resume-analysis service.
//!
//! The service owns parsing and scoring. This side only forwards the file and
//! types the response; no skill scores are computed here.
use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ResumeServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// The analysis payload. `skills` maps skill name to a 0–100 percentage;
/// every other field is passed through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    #[serde(default)]
    pub skills: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
}

impl ResumeFormat {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            Some(ResumeFormat::Pdf)
        } else if lower.ends_with(".docx") {
            Some(ResumeFormat::Docx)
        } else {
            None
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

#[derive(Clone)]
pub struct ResumeAnalyzer {
    client: Client,
    endpoint: String,
}

impl ResumeAnalyzer {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, endpoint })
    }

    /// Sends the file as multipart field `file` and parses the JSON reply.
    pub async fn analyze(
        &self,
        file_name: &str,
        format: ResumeFormat,
        content: Bytes,
    ) -> Result<ResumeAnalysis, ResumeServiceError> {
        let part = multipart::Part::bytes(content.to_vec())
            .file_name(file_name.to_string())
            .mime_str(format.mime())?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Resume service returned {status}");
            return Err(ResumeServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let analysis: ResumeAnalysis = response.json().await?;
        debug!(
            "Resume analysis returned {} skills",
            analysis.skills.len()
        );
        Ok(analysis)
    }
}
