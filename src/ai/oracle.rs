//! Adapter for the external text-generation oracle. Provider credentials
//! are fixed at construction, so one client is shared read-only across
//! concurrent requests. The oracle itself is untrusted: replies go through
//! the sanitization pass before anything downstream sees them.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ai::sanitize::{normalize_reply, validate_select};
use crate::error::QueryLensError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub provider: OracleProvider,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    Anthropic,
    OpenAI,
    Google,
}

impl OracleConfig {
    /// Read provider settings from the environment: `ORACLE_PROVIDER`,
    /// `ORACLE_API_KEY`, `ORACLE_MODEL` (model optional, per-provider
    /// default applies).
    pub fn from_env() -> Result<Self> {
        let provider = match std::env::var("ORACLE_PROVIDER")
            .unwrap_or_else(|_| "google".into())
            .to_lowercase()
            .as_str()
        {
            "anthropic" => OracleProvider::Anthropic,
            "openai" => OracleProvider::OpenAI,
            "google" => OracleProvider::Google,
            other => anyhow::bail!(
                "invalid ORACLE_PROVIDER '{other}'. Use 'anthropic', 'openai', or 'google'."
            ),
        };
        let api_key = std::env::var("ORACLE_API_KEY")
            .map_err(|_| anyhow::anyhow!("ORACLE_API_KEY not set"))?;
        let model = std::env::var("ORACLE_MODEL").unwrap_or_else(|_| {
            match provider {
                OracleProvider::Anthropic => "claude-sonnet-4-5".into(),
                OracleProvider::OpenAI => "gpt-4.1".into(),
                OracleProvider::Google => "gemini-2.0-flash".into(),
            }
        });
        Ok(Self {
            provider,
            api_key,
            model,
        })
    }
}

pub struct OracleClient {
    config: OracleConfig,
    http_client: reqwest::Client,
}

impl OracleClient {
    pub fn new(config: OracleConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// A client built from an empty API key can route nothing; the health
    /// surface reports this rather than failing requests late.
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Send an assembled prompt and reduce the reply to one validated SQL
    /// SELECT statement. Validation failure is final — no regeneration.
    pub async fn generate_sql(&self, system: &str, user: &str) -> Result<String, QueryLensError> {
        let reply = self.chat(system, user).await?;
        let sql = normalize_reply(&reply);
        validate_select(&sql)?;
        info!("generated SQL: {}", sql);
        Ok(sql)
    }

    /// One oracle round-trip, with a single retry on transport-level
    /// failure (timeout, connect). HTTP error statuses are not retried.
    pub async fn chat(&self, system: &str, user_message: &str) -> Result<String, QueryLensError> {
        match self.call_provider(system, user_message).await {
            Ok(text) => Ok(text),
            Err(e) if is_transient(&e) => {
                warn!("oracle call failed transiently, retrying once: {}", e);
                self.call_provider(system, user_message)
                    .await
                    .map_err(|e| QueryLensError::Oracle(e.to_string()))
            }
            Err(e) => Err(QueryLensError::Oracle(e.to_string())),
        }
    }

    async fn call_provider(&self, system: &str, user_message: &str) -> Result<String> {
        match self.config.provider {
            OracleProvider::Anthropic => self.call_anthropic(system, user_message).await,
            OracleProvider::OpenAI => self.call_openai(system, user_message).await,
            OracleProvider::Google => self.call_google(system, user_message).await,
        }
    }

    async fn call_anthropic(&self, system: &str, user_message: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 4096,
            "system": system,
            "messages": [
                {"role": "user", "content": user_message}
            ]
        });

        let resp = self
            .http_client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("Anthropic API error ({}): {}", status, text);
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        Ok(json["content"][0]["text"].as_str().unwrap_or("").to_string())
    }

    async fn call_openai(&self, system: &str, user_message: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 4096,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user_message}
            ]
        });

        let resp = self
            .http_client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("OpenAI API error ({}): {}", status, text);
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        Ok(json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string())
    }

    async fn call_google(&self, system: &str, user_message: &str) -> Result<String> {
        let body = serde_json::json!({
            "system_instruction": {"parts": [{"text": system}]},
            "contents": [
                {"parts": [{"text": user_message}]}
            ]
        });

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.config.model
        );
        let resp = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("Google API error ({}): {}", status, text);
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        Ok(json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_string())
    }
}

fn is_transient(e: &anyhow::Error) -> bool {
    e.downcast_ref::<reqwest::Error>()
        .map(|e| e.is_timeout() || e.is_connect())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_key(api_key: &str) -> OracleClient {
        OracleClient::new(OracleConfig {
            provider: OracleProvider::Google,
            api_key: api_key.to_string(),
            model: "gemini-2.0-flash".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn configured_when_api_key_present() {
        assert!(client_with_key("key").is_configured());
    }

    #[test]
    fn not_configured_with_empty_api_key() {
        assert!(!client_with_key("").is_configured());
    }
}
