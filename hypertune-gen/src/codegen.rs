//! An HTTP client for the Hypertune codegen service.
use std::fmt;

use anyhow::{bail, Context, Result};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EDGE_BASE_URL: &str = "https://edge.hypertune.com";

const CODEGEN_ENDPOINT: &str = "/codegen";

/// Generation options sent to the service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenRequest<'a> {
    pub sdk_type: &'a str,
    pub language: &'a str,
    /// Literal GraphQL initialization query. `None` lets the service pick its default.
    pub query: Option<&'a str>,
    pub include_token: bool,
    pub include_fallback: bool,
    pub sdk_version: &'a str,
    pub package_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CodegenResponse {
    #[serde(default)]
    pub files: Vec<CodegenFile>,
    #[serde(default)]
    pub messages: Vec<CodegenMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodegenFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodegenMessage {
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogLevel {
    Debug,
    Error,
    Info,
    Warn,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "Debug",
            LogLevel::Error => "Error",
            LogLevel::Info => "Info",
            LogLevel::Warn => "Warn",
        })
    }
}

/// A client that requests generated code from the service.
pub struct CodegenClient {
    client: reqwest::blocking::Client,
    base_url: Url,
}

impl CodegenClient {
    pub fn new(edge_base_url: &str) -> Result<CodegenClient> {
        let base_url = Url::parse(edge_base_url).context("failed to parse edgeBaseURL")?;
        Ok(CodegenClient {
            client: reqwest::blocking::Client::new(),
            base_url,
        })
    }

    /// Build the request URL.
    ///
    /// `body` and `token` are form-escaped before being added as query parameters, so they end
    /// up encoded twice on the wire. The service decodes them accordingly.
    pub fn codegen_url(
        &self,
        request: &CodegenRequest<'_>,
        token: &str,
        branch: &str,
    ) -> Result<Url> {
        let body = serde_json::to_string(request).context("failed to marshal request body")?;

        let mut url = self.base_url.clone();
        url.set_path(CODEGEN_ENDPOINT);
        url.query_pairs_mut()
            .append_pair("body", &form_escape(&body))
            .append_pair("branch", branch)
            .append_pair("token", &form_escape(token));
        Ok(url)
    }

    /// Issue the codegen request. There are no retries.
    pub fn fetch(
        &self,
        request: &CodegenRequest<'_>,
        token: &str,
        branch: &str,
    ) -> Result<CodegenResponse> {
        let url = self.codegen_url(request, token, branch)?;

        log::debug!(target: "hypertune_gen", "requesting generated code for branch {branch:?}");
        let response = self
            .client
            .get(url)
            .send()
            .context("failed to make codegen request")?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            bail!(
                "codegen request failed with code: {} and response: {}",
                status.as_u16(),
                body
            );
        }

        let response: CodegenResponse = response
            .json()
            .context("failed to decode codegen response")?;
        log::debug!(
            target: "hypertune_gen",
            "received {} files and {} messages",
            response.files.len(),
            response.messages.len()
        );
        Ok(response)
    }
}

fn form_escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
