use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::GenerationError;
use crate::services::prompting::ChatMessage;

/// One text-generation call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub timeout: Duration,
}

/// Text-generation collaborator: returns the raw text of the top completion.
pub trait LlmClient: Send + Sync {
    fn generate<'a>(&'a self, request: &'a CompletionRequest) -> BoxFuture<'a, Result<String, GenerationError>>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client, pointed at xAI by default.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn new(api_key: Option<&str>, base_url: &str, temperature: f32) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.map(str::to_string),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: self.temperature,
        };

        debug!(
            "Requesting completion from {} with model {}",
            self.endpoint(),
            request.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(request.timeout)
                } else {
                    GenerationError::from(e)
                }
            })?;

        match response.status() {
            status if status.is_success() => {}
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                return Err(GenerationError::Unauthorized {
                    status: status.as_u16(),
                });
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerationError::Http {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let payload: ChatCompletionResponse = response.json().await?;
        extract_content(payload)
    }
}

fn extract_content(payload: ChatCompletionResponse) -> Result<String, GenerationError> {
    payload
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::UnexpectedShape("response has no choices".into()))?
        .message
        .content
        .ok_or_else(|| GenerationError::UnexpectedShape("first choice has no content".into()))
}

impl LlmClient for ChatCompletionsClient {
    fn generate<'a>(&'a self, request: &'a CompletionRequest) -> BoxFuture<'a, Result<String, GenerationError>> {
        Box::pin(async move {
            // The reqwest timeout covers the HTTP exchange; this bounds body decoding too.
            match tokio::time::timeout(request.timeout, self.send(request)).await {
                Ok(result) => {
                    if result.is_ok() {
                        info!("Completion received from model {}", request.model);
                    }
                    result
                }
                Err(_) => Err(GenerationError::Timeout(request.timeout)),
            }
        })
    }
}

/// Canned responses for exercising the pipeline without a network.
#[cfg(test)]
pub mod scripted {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub struct ScriptedLlmClient {
        response: Result<String, GenerationError>,
        calls: AtomicUsize,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl ScriptedLlmClient {
        pub fn replying(text: impl Into<String>) -> Self {
            Self::with(Ok(text.into()))
        }

        pub fn failing(err: GenerationError) -> Self {
            Self::with(Err(err))
        }

        fn with(response: Result<String, GenerationError>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<CompletionRequest> {
            self.last_request.lock().unwrap().clone()
        }
    }

    impl LlmClient for ScriptedLlmClient {
        fn generate<'a>(&'a self, request: &'a CompletionRequest) -> BoxFuture<'a, Result<String, GenerationError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }
}
