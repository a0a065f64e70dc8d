//! Chat-completions backed summarizer and intent recognizer.
//!
//! Both stages ask for a JSON object reply (`response_format: json_object`) and
//! parse `choices[0].message.content` as that object.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::{
    analysis::{
        error::{StageError, backend_failure, internal_error, invalid_input, timed_out},
        ports::{IntentRecognizer, Summarizer},
        types::{Intent, Summary},
    },
    config::OpenAiStageConfig,
};

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize customer feedback. Reply with a JSON object \
{\"bullets\": [string]} holding three to five concise bullet points in the language of \
the feedback.";

const INTENT_SYSTEM_PROMPT: &str = "You classify customer feedback. Reply with a JSON object \
{\"intent\": string or null, \"product_category\": string or null}. Use null for intent when \
no clear intent is expressed.";

const ERROR_BODY_PREVIEW_CHARS: usize = 240;

#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    model: String,
    auth_header: Option<String>,
    timeout: Duration,
}

impl OpenAiChatClient {
    pub fn from_config(config: &OpenAiStageConfig) -> Result<Self, StageError> {
        if config.base_url.trim().is_empty() {
            return Err(invalid_input("openai base_url cannot be empty"));
        }
        let auth_header = config.credential.resolve_auth_header()?;
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| internal_error(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            auth_header,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Sends one system+user exchange and decodes the reply content as `T`.
    pub async fn complete_json<T>(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<T, StageError>
    where
        T: DeserializeOwned,
    {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_text},
            ],
            "response_format": {"type": "json_object"},
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(auth_header) = &self.auth_header {
            request = request.header(header::AUTHORIZATION, auth_header);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status.as_u16(), &body));
        }

        let payload: Value = response.json().await.map_err(map_transport_error)?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| backend_failure("chat completion response has no message content"))?;

        serde_json::from_str(content).map_err(|err| {
            backend_failure(format!("chat completion content is not the expected JSON: {err}"))
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> StageError {
    if err.is_timeout() {
        timed_out(format!("chat completion request timed out: {err}"))
    } else {
        backend_failure(format!("chat completion request failed: {err}"))
    }
}

fn map_http_error(status: u16, body: &str) -> StageError {
    let preview = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect::<String>();
    match status {
        401 | 403 => invalid_input(format!("chat completion rejected credentials ({status})")),
        408 => timed_out(format!("chat completion backend timed out ({status})")),
        _ => backend_failure(format!(
            "chat completion backend returned status {status}: {preview}"
        )),
    }
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    bullets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IntentReply {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    product_category: Option<String>,
}

pub struct OpenAiSummarizer {
    client: OpenAiChatClient,
}

impl OpenAiSummarizer {
    pub fn new(client: OpenAiChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str) -> Result<Summary, StageError> {
        let reply: SummaryReply = self.client.complete_json(SUMMARY_SYSTEM_PROMPT, text).await?;
        let bullets: Summary = reply
            .bullets
            .into_iter()
            .map(|bullet| bullet.trim().to_string())
            .filter(|bullet| !bullet.is_empty())
            .collect();
        if bullets.is_empty() {
            return Err(backend_failure("summary reply contained no bullets"));
        }
        Ok(bullets)
    }
}

pub struct OpenAiIntentRecognizer {
    client: OpenAiChatClient,
}

impl OpenAiIntentRecognizer {
    pub fn new(client: OpenAiChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IntentRecognizer for OpenAiIntentRecognizer {
    async fn recognize(&self, text: &str) -> Result<Option<Intent>, StageError> {
        let reply: IntentReply = self.client.complete_json(INTENT_SYSTEM_PROMPT, text).await?;
        let Some(label) = reply.intent.filter(|label| !label.trim().is_empty()) else {
            return Ok(None);
        };

        let mut intent = Intent::new(label);
        if let Some(category) = reply
            .product_category
            .filter(|category| !category.trim().is_empty())
        {
            intent = intent.with_product_category(category);
        }
        Ok(Some(intent))
    }
}
