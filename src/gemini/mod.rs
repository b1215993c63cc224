//! Gemini recommendation provider
//!
//! Speaks the generateContent API directly over reqwest. Streaming uses the
//! `alt=sse` variant and hand-parses the SSE lines off the byte stream; each
//! text part is forwarded as a `StreamEvent::TextDelta` on an mpsc channel in
//! receipt order. A fixed system instruction biases the model to bold-wrap
//! every recommended title and append the year in parentheses, which is what
//! the title extractor keys on.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::session::Role;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// System instruction for the recommendation persona.
pub const SYSTEM_PROMPT: &str = "\
You are CineMate AI, a friendly and knowledgeable movie recommendation assistant.

When users describe their mood, preferences, or ask for movie suggestions:
1. Recommend 3-5 movies that match their request
2. Format each movie title in **bold** (e.g., **The Shawshank Redemption**)
3. Include the year in parentheses after the title: **The Shawshank Redemption** (1994)
4. Give a brief 1-2 sentence reason for each recommendation
5. Be conversational and enthusiastic about movies

Always use **bold** formatting for movie titles so they can be parsed and displayed as tappable cards.";

/// One prior turn as sent to the model.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

/// Incremental delivery events for a streaming completion.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    Error(String),
    Done,
}

/// Language-model boundary used by the pipeline.
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Non-streaming completion: full prior history plus the new input,
    /// returning the final response text.
    async fn complete(&self, history: &[ChatTurn], input: &str) -> Result<String>;

    /// Streaming completion. The receiver yields deltas in receipt order,
    /// then `Done`; a transport or API failure arrives as `Error`.
    async fn complete_stream(
        &self,
        history: &[ChatTurn],
        input: &str,
    ) -> Result<mpsc::Receiver<StreamEvent>>;
}

pub struct GeminiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        if config.gemini_api_key.is_empty() {
            anyhow::bail!("GEMINI_API_KEY not set");
        }
        Ok(Self {
            client: HttpClient::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            timeout: Duration::from_secs(config.gemini_timeout),
        })
    }

    /// Build Gemini contents from prior turns plus the current input.
    fn build_contents(history: &[ChatTurn], input: &str) -> Vec<GeminiContent> {
        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|turn| GeminiContent {
                role: turn.role.as_str().to_string(),
                parts: vec![GeminiPart { text: turn.text.clone() }],
            })
            .collect();

        contents.push(GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart { text: input.to_string() }],
        });

        contents
    }

    fn request_body(history: &[ChatTurn], input: &str) -> GeminiRequest {
        GeminiRequest {
            contents: Self::build_contents(history, input),
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiPart { text: SYSTEM_PROMPT.to_string() }],
            }),
        }
    }
}

/// Pop every complete line off the raw byte buffer, leaving any partial
/// trailing line in place. Decoding happens per line, not per network chunk,
/// so a multi-byte character split across chunks stays intact.
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let rest = buffer.split_off(pos + 1);
        let mut line = std::mem::replace(buffer, rest);
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        lines.push(String::from_utf8_lossy(&line).into_owned());
    }
    lines
}

/// Collect the text parts of one response payload, in order.
fn text_deltas(response: GeminiResponse) -> Vec<String> {
    let mut deltas = Vec::new();
    if let Some(candidates) = response.candidates {
        for candidate in candidates {
            for part in candidate.content.parts {
                if let Some(text) = part.text {
                    deltas.push(text);
                }
            }
        }
    }
    deltas
}

#[async_trait]
impl Recommender for GeminiClient {
    async fn complete(&self, history: &[ChatTurn], input: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&Self::request_body(history, input))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error: {} - {}", status, body);
        }

        let api_response: GeminiResponse = response.json().await?;
        if let Some(error) = &api_response.error {
            anyhow::bail!("Gemini error: {}", error.message);
        }

        Ok(text_deltas(api_response).concat())
    }

    async fn complete_stream(
        &self,
        history: &[ChatTurn],
        input: &str,
    ) -> Result<mpsc::Receiver<StreamEvent>> {
        let (tx, rx) = mpsc::channel(100);

        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );
        let body = Self::request_body(history, input);
        let client = self.client.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            match client.post(&url).json(&body).timeout(timeout).send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        let _ = tx
                            .send(StreamEvent::Error(format!(
                                "Gemini API error: {} - {}",
                                status, body
                            )))
                            .await;
                        return;
                    }

                    let mut stream = response.bytes_stream();
                    let mut buffer: Vec<u8> = Vec::new();

                    while let Some(chunk) = stream.next().await {
                        match chunk {
                            Ok(bytes) => {
                                buffer.extend_from_slice(&bytes);

                                // Parse complete SSE lines
                                for line in drain_lines(&mut buffer) {
                                    if let Some(data) = line.strip_prefix("data: ") {
                                        if let Ok(response) =
                                            serde_json::from_str::<GeminiResponse>(data)
                                        {
                                            for text in text_deltas(response) {
                                                let _ = tx
                                                    .send(StreamEvent::TextDelta(text))
                                                    .await;
                                            }
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                                break;
                            }
                        }
                    }

                    let _ = tx.send(StreamEvent::Done).await;
                }
                Err(e) => {
                    let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                }
            }
        });

        Ok(rx)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Clone)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Clone)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContentResponse,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_contents() {
        let history = vec![
            ChatTurn { role: Role::User, text: "Hello".into() },
            ChatTurn { role: Role::Model, text: "Hi there!".into() },
        ];

        let contents = GeminiClient::build_contents(&history, "Something scary?");
        assert_eq!(contents.len(), 3); // 2 history + 1 current
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].role, "user");
        assert_eq!(contents[2].parts[0].text, "Something scary?");
    }

    #[test]
    fn test_text_deltas_from_payload() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Try " }, { "text": "**Alien** (1979)." }] }
            }]
        });
        let response: GeminiResponse = serde_json::from_value(json).unwrap();
        assert_eq!(text_deltas(response), vec!["Try ", "**Alien** (1979)."]);
    }

    #[test]
    fn test_error_payload() {
        let json = serde_json::json!({ "error": { "message": "quota exceeded" } });
        let response: GeminiResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.error.unwrap().message, "quota exceeded");
    }

    #[test]
    fn test_drain_lines_keeps_partial_tail() {
        let mut buffer = b"data: one\ndata: tw".to_vec();
        assert_eq!(drain_lines(&mut buffer), vec!["data: one"]);
        buffer.extend_from_slice(b"o\r\n");
        assert_eq!(drain_lines(&mut buffer), vec!["data: two"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multibyte_char_split_across_chunks_survives() {
        let line = "data: {\"text\": \"Amélie\"}\n".as_bytes();
        // Split in the middle of the two-byte 'é'.
        let split = line.iter().position(|&b| b == 0xc3).unwrap() + 1;

        let mut buffer = line[..split].to_vec();
        assert!(drain_lines(&mut buffer).is_empty());
        buffer.extend_from_slice(&line[split..]);
        assert_eq!(drain_lines(&mut buffer), vec!["data: {\"text\": \"Amélie\"}"]);
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let mut config = Config::from_env();
        config.gemini_api_key = String::new();
        assert!(GeminiClient::new(&config).is_err());
    }
}
