use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::config::Settings;
use crate::error::GenerateError;
use crate::prompt::build_prompt;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Client for the OpenRouter chat-completions endpoint.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    settings: Settings,
}

impl OpenRouterClient {
    /// Build a client. A timeout is only applied when one is configured;
    /// otherwise the transport default stands.
    pub fn new(settings: Settings) -> Result<Self, GenerateError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Build the prompt for `category` and `idea` and send it.
    pub async fn generate(&self, category: Category, idea: &str) -> Result<String, GenerateError> {
        let prompt = build_prompt(category, idea);
        self.complete(&prompt).await
    }

    /// Send one chat completion and return the first choice's content.
    pub async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(GenerateError::MissingApiKey)?;

        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let url = self.settings.endpoint();
        info!("requesting completion from {} with model {}", url, self.settings.model);
        debug!("prompt is {} bytes", prompt.len());

        let response = self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("HTTP-Referer", &self.settings.referer)
            .header("X-Title", &self.settings.title)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("completion request failed with status {}", status);
            return Err(GenerateError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let content = parse_completion(&body)?;
        info!("received {} bytes of markup", content.len());
        Ok(content)
    }
}

/// Pull `choices[0].message.content` out of a response body.
pub fn parse_completion(body: &str) -> Result<String, GenerateError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| GenerateError::MalformedResponse("response contained no choices".to_string()))
}
