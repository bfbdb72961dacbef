//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API with tool calling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::core::{Config, Result, SpecTestError};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
use crate::llm::types::{Message, ToolCall, ToolDefinition};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

/// Ollama response message format
#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama function in tool call
#[derive(Debug, Clone, Deserialize)]
struct OllamaFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

impl From<GenerateOptions> for OllamaOptions {
    fn from(opts: GenerateOptions) -> Self {
        Self {
            temperature: opts.temperature,
            num_predict: opts.max_tokens,
            stop: opts.stop,
        }
    }
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .build()
            .map_err(|e| SpecTestError::ollama(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.ollama_url(),
        })
    }

    /// Base URL of the Ollama server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert Ollama response to LLMResponse
    fn to_llm_response(response: ChatResponse) -> LLMResponse {
        let tool_calls = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        LLMResponse {
            content: response.message.content,
            tool_calls,
            usage,
            model: response.model,
        }
    }

    fn connect_error(&self, e: reqwest::Error) -> SpecTestError {
        if e.is_connect() {
            SpecTestError::ollama(format!(
                "Cannot connect to Ollama at {}. Is it running?",
                self.base_url
            ))
        } else {
            SpecTestError::from(e)
        }
    }

    async fn post_chat(&self, request: &ChatRequest<'_>) -> Result<LLMResponse> {
        let request_json = serde_json::to_string(request)?;
        debug!(
            model = request.model,
            bytes = request_json.len(),
            tools = request.tools.map(|t| t.len()).unwrap_or(0),
            "ollama chat request"
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(SpecTestError::ModelNotFound(request.model.to_string()));
            }

            return Err(SpecTestError::ollama(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        debug!(bytes = response_text.len(), "ollama chat response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| SpecTestError::ollama(format!("Failed to parse response: {}", e)))?;

        Ok(Self::to_llm_response(chat_response))
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = ChatRequest {
            model,
            messages,
            tools: None,
            options: options.map(OllamaOptions::from),
            stream: false,
        };
        self.post_chat(&request).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = ChatRequest {
            model,
            messages,
            tools: Some(tools),
            options: options.map(OllamaOptions::from),
            stream: false,
        };
        self.post_chat(&request).await
    }

    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m == model || m.split(':').next() == model.split(':').next()))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            return Err(SpecTestError::ollama("Failed to list models"));
        }

        let models_response: ModelsResponse = response.json().await?;
        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let mut config = Config::default();
        config.ollama.host = "localhost".to_string();
        config.ollama.port = 11434;
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_response_conversion() {
        let raw = r#"{
            "model": "qwen3:8b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{"function": {"name": "browser_click", "arguments": {"ref": "e4"}}}]
            },
            "prompt_eval_count": 10,
            "eval_count": 5
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = OllamaClient::to_llm_response(parsed);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "browser_click");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_request_omits_empty_fields() {
        let messages = [Message::user("hi")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            tools: None,
            options: None,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("options").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
