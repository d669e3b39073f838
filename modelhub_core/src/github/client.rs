//! GitHub contents API reader.
//!
//! `GET {base}/repos/{owner}/{repo}/contents/{path}?ref={branch}` returns the
//! file base64-encoded inside a `{content, encoding}` envelope.

use crate::config::GithubConfig;
use crate::error::HttpError;
use crate::models::Binding;
use crate::traits::ContentFetcher;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use reqwest::{Client, Url};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::instrument;

const GITHUB_V3_JSON: &str = "application/vnd.github.v3+json";

/// Unpadded alphabet that also tolerates trailing `=`.
const UNPADDED: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Default, Deserialize)]
struct GithubErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct GithubContentClient {
    client: Client,
    api_base: String,
    user_agent: String,
}

impl GithubContentClient {
    pub fn new(cfg: &GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::InvalidInput(format!("build http client: {e}")))?;

        Ok(Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            user_agent: cfg.user_agent.clone(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Each path component becomes one percent-encoded segment, so `?`, `#`
    /// and spaces in file names stay part of the path.
    fn contents_url(&self, binding: &Binding, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| Error::InvalidInput(format!("invalid api base {}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("api base cannot take a path: {}", self.api_base)))?
            .pop_if_empty()
            .extend(["repos", binding.owner.as_str(), binding.repo.as_str(), "contents"])
            .extend(path.trim_start_matches('/').split('/'));
        Ok(url)
    }

    fn headers(&self, credential: &str) -> Result<HeaderMap> {
        let mut h = HeaderMap::new();
        h.insert(ACCEPT, HeaderValue::from_static(GITHUB_V3_JSON));
        h.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|e| Error::InvalidInput(format!("invalid user agent: {e}")))?,
        );
        if !credential.is_empty() {
            let mut auth = HeaderValue::from_str(&format!("Bearer {credential}"))
                .map_err(|_| Error::InvalidInput("credential is not a valid header value".into()))?;
            auth.set_sensitive(true);
            h.insert(AUTHORIZATION, auth);
        }
        Ok(h)
    }
}

#[async_trait]
impl ContentFetcher for GithubContentClient {
    #[instrument(level = "info", skip(self, credential, binding), fields(binding = %binding))]
    async fn fetch_raw(&self, credential: &str, binding: &Binding, path: &str) -> Result<Vec<u8>> {
        let had_credential = !credential.is_empty();
        let url = self.contents_url(binding, path)?;
        tracing::debug!(%url, had_credential, "github contents read");

        let resp = self
            .client
            .get(url)
            .headers(self.headers(credential)?)
            .query(&[("ref", binding.branch.as_str())])
            .send()
            .await
            .map_err(|e| Error::network(path, e))?;

        let status = resp.status();
        if !status.is_success() {
            // Body is context only; an unreadable one just loses the message.
            let message = resp
                .text()
                .await
                .ok()
                .and_then(|body| serde_json::from_str::<GithubErrorBody>(&body).ok())
                .unwrap_or_default()
                .message;
            let err = HttpError::new(status.as_u16(), message, had_credential, path);
            tracing::debug!(status = status.as_u16(), kind = ?err.kind, "github contents read failed");
            return Err(err.into());
        }

        let body = resp.bytes().await.map_err(|e| Error::network(path, e))?;
        let envelope: ContentEnvelope = serde_json::from_slice(&body)
            .map_err(|e| Error::decode(path, format!("unexpected contents response: {e}")))?;
        if !envelope.encoding.is_empty() && envelope.encoding != "base64" {
            tracing::debug!(encoding = %envelope.encoding, "non-base64 content encoding");
        }

        decode_content(&envelope.content).map_err(|e| Error::decode(path, e))
    }
}

/// Padded standard base64 first, then line breaks stripped and the unpadded
/// variant.
pub(crate) fn decode_content(content: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(content).or_else(|_| {
        let stripped: String = content.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        UNPADDED.decode(stripped)
    })
}
