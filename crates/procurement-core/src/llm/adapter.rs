//! Primary/fallback generative text adapter
//!
//! Every invocation makes at most two provider calls: one against the
//! primary and, only if that fails, one against the fallback. A failure is a
//! timeout, a transport/HTTP error, or output that cannot be parsed into the
//! requested shape. When both fail the caller gets [`GenerationUnavailable`]
//! and is expected to fall back to a template.

use super::client::{ChatMessage, HttpChatClient, LLMClient};
use super::parse::extract_json_object;
use crate::config::LLMConfig;
use crate::error::{with_timeout, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Both providers failed (or the fallback is not configured)
#[derive(Debug, Clone, Error)]
#[error(
    "Generation unavailable (primary: {primary}; fallback: {})",
    .fallback.as_deref().unwrap_or("not configured")
)]
pub struct GenerationUnavailable {
    pub primary: String,
    pub fallback: Option<String>,
}

struct Provider {
    client: Arc<dyn LLMClient>,
    timeout: Duration,
}

/// Generative text adapter over a fast primary and a more capable fallback
pub struct GenerationAdapter {
    primary: Provider,
    fallback: Option<Provider>,
}

impl GenerationAdapter {
    /// Create from explicit clients; both attempts share `timeout`
    pub fn new(
        primary: Arc<dyn LLMClient>,
        fallback: Option<Arc<dyn LLMClient>>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary: Provider {
                client: primary,
                timeout,
            },
            fallback: fallback.map(|client| Provider { client, timeout }),
        }
    }

    /// Create HTTP-backed providers from configuration
    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        let primary = Provider {
            client: Arc::new(HttpChatClient::new(config.primary.clone())?),
            timeout: config.primary.timeout(),
        };
        let fallback = match config.fallback {
            Some(ref fallback) => Some(Provider {
                client: Arc::new(HttpChatClient::new(fallback.clone())?),
                timeout: fallback.timeout(),
            }),
            None => None,
        };
        Ok(Self { primary, fallback })
    }

    /// Extract structured fields from unstructured text.
    ///
    /// `schema_hint` describes the JSON object expected back; output that does
    /// not deserialize into `T` counts as a failed attempt.
    pub async fn extract<T: DeserializeOwned>(
        &self,
        unstructured_text: &str,
        schema_hint: &str,
    ) -> std::result::Result<T, GenerationUnavailable> {
        let messages = vec![
            ChatMessage::system(
                "You are a procurement analyst. Extract structured data from the text. \
                 Respond ONLY with valid JSON matching the requested schema.",
            ),
            ChatMessage::user(format!(
                "{}\n\nText:\n{}\n\nJSON:",
                schema_hint, unstructured_text
            )),
        ];

        self.call_with_fallback(messages, |response| {
            let json = extract_json_object(response)
                .ok_or_else(|| "no JSON object in response".to_string())?;
            serde_json::from_str::<T>(json).map_err(|e| format!("malformed JSON: {}", e))
        })
        .await
    }

    /// Produce narrative text from a context description
    pub async fn synthesize(
        &self,
        context: &str,
    ) -> std::result::Result<String, GenerationUnavailable> {
        let messages = vec![
            ChatMessage::system(
                "You are a procurement analyst writing concise executive briefings. \
                 Respond in plain prose without markdown.",
            ),
            ChatMessage::user(context.to_string()),
        ];

        self.call_with_fallback(messages, |response| {
            let text = response.trim();
            if text.is_empty() {
                Err("empty response".to_string())
            } else {
                Ok(text.to_string())
            }
        })
        .await
    }

    async fn call_with_fallback<T, P>(
        &self,
        messages: Vec<ChatMessage>,
        parse: P,
    ) -> std::result::Result<T, GenerationUnavailable>
    where
        P: Fn(&str) -> std::result::Result<T, String>,
    {
        let primary_error = match attempt(&self.primary, messages.clone(), &parse).await {
            Ok(value) => return Ok(value),
            Err(reason) => reason,
        };

        let Some(ref fallback) = self.fallback else {
            tracing::warn!("Primary generation failed, no fallback configured: {}", primary_error);
            return Err(GenerationUnavailable {
                primary: primary_error,
                fallback: None,
            });
        };

        tracing::info!(
            "Primary generation failed ({}), trying fallback {}",
            primary_error,
            fallback.client.model_name()
        );

        match attempt(fallback, messages, &parse).await {
            Ok(value) => Ok(value),
            Err(fallback_error) => {
                tracing::warn!(
                    "Generation unavailable: primary: {}; fallback: {}",
                    primary_error,
                    fallback_error
                );
                Err(GenerationUnavailable {
                    primary: primary_error,
                    fallback: Some(fallback_error),
                })
            }
        }
    }
}

async fn attempt<T, P>(
    provider: &Provider,
    messages: Vec<ChatMessage>,
    parse: &P,
) -> std::result::Result<T, String>
where
    P: Fn(&str) -> std::result::Result<T, String>,
{
    let response = with_timeout(provider.timeout, provider.client.chat_completion(messages))
        .await
        .map_err(|e| format!("{}: {}", provider.client.model_name(), e))?;

    parse(&response).map_err(|e| format!("{}: {}", provider.client.model_name(), e))
}
