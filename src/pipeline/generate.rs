//! The generative collaborator: request slides, repair the response.
//!
//! This stage is the only one with network I/O and the only one allowed to
//! fail softly — every error here degrades to the fallback slide list at the
//! orchestrator level, never to an aborted conversion.
//!
//! ## Response repair
//!
//! Chat models wrap JSON in code fences and surround it with prose despite
//! instructions not to. Repair runs two passes before parsing:
//!
//! 1. Strip an outer ```/```json fence pair, if present.
//! 2. Locate the first *balanced* `[...]` span, tracking string literals and
//!    escapes, so bracket characters inside slide copy cannot truncate the
//!    array the way a greedy regex would.

use crate::config::CarouselConfig;
use crate::error::GenerationError;
use crate::prompts::{slide_prompt, truncate_source, SYSTEM_PROMPT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Object-safe seam for the slide generator.
///
/// Production uses [`OpenAiGenerator`]; tests inject canned responses via
/// [`CarouselConfig::generator`](crate::CarouselConfig).
#[async_trait]
pub trait SlideGenerator: Send + Sync {
    /// Produce the raw model response for the given system role and prompt.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}

// ── OpenAI chat-completions implementation ───────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client for slide generation.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    base_url: String,
}

impl OpenAiGenerator {
    /// Build a client from the pipeline configuration.
    ///
    /// `OPENAI_API_BASE` overrides the endpoint, which also makes any
    /// OpenAI-compatible server usable.
    pub fn new(api_key: impl Into<String>, config: &CarouselConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        let base_url = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            base_url,
        })
    }
}

#[async_trait]
impl SlideGenerator for OpenAiGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::RequestFailed(format!(
                "HTTP {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::MalformedResponse("empty completion".into()))
    }
}

// ── Stage entry point ────────────────────────────────────────────────────

/// Ask the generator for a raw slide array.
///
/// Returns the parsed JSON array as a [`Value`]; shape validation happens in
/// [`crate::pipeline::validate`]. Any error is a soft failure the caller
/// turns into the fallback slide list.
pub async fn generate_slides(
    source_text: &str,
    config: &CarouselConfig,
) -> Result<Value, GenerationError> {
    let generator: Arc<dyn SlideGenerator> = match (&config.generator, &config.api_key) {
        (Some(g), _) => Arc::clone(g),
        (None, Some(key)) => Arc::new(OpenAiGenerator::new(key.clone(), config)?),
        (None, None) => return Err(GenerationError::NoApiKey),
    };

    let truncated = truncate_source(source_text, config.max_content_chars);
    if truncated.len() != source_text.len() {
        debug!(
            "Source truncated from {} to {} chars for the prompt budget",
            source_text.len(),
            truncated.len()
        );
    }

    let prompt = slide_prompt(&truncated);
    let raw = generator.generate(SYSTEM_PROMPT, &prompt).await?;
    debug!("Generator returned {} chars", raw.len());

    let slides = repair_response(&raw)?;
    let count = slides.as_array().map(Vec::len).unwrap_or(0);
    info!("Generated {count} raw slides");
    Ok(slides)
}

/// Strip fences, locate the array, parse it.
pub fn repair_response(raw: &str) -> Result<Value, GenerationError> {
    let stripped = strip_code_fences(raw);
    let span = extract_json_array(stripped)
        .ok_or_else(|| GenerationError::MalformedResponse("no balanced [...] span".into()))?;

    let value: Value = serde_json::from_str(span)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    if !value.is_array() {
        warn!("Generator returned valid JSON that is not an array");
        return Err(GenerationError::MalformedResponse(
            "top-level value is not an array".into(),
        ));
    }
    Ok(value)
}

/// Remove an outer ``` or ```json fence pair, if present.
fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Find the first balanced top-level `[...]` span.
///
/// Tracks string literals and backslash escapes so brackets inside slide
/// copy do not confuse the depth count.
fn extract_json_array(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('[')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'[' if !in_string => depth += 1,
            b']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
