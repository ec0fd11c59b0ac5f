//! Chat-completions backed extractor

use super::{validate_extraction, ContentExtractor, Extraction};
use crate::error::{DeployError, Result};
use crate::settings::LlmSettings;
use crate::util::{sanitize_base_url, sanitize_for_header};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client as HttpClient, StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tera::{Context, Tera};

pub const DEPLOYMENT_PROMPT: &str = r#"Analyze the following social media content and determine if an AI agent should be deployed. Consider:
1. User's needs and requirements
2. Potential use cases
3. Required capabilities
4. Deployment urgency

Example response:
```json
{
    "name": "SocialAnalystBot",
    "description": "AI agent for social media trend analysis",
    "personality": "Professional and analytical",
    "capabilities": ["trend analysis", "sentiment analysis", "report generation"],
    "shouldDeploy": true,
    "deploymentReason": "High demand for real-time social media analysis"
}
```

{{ recent_messages }}

Extract deployment requirements and determine if an agent should be deployed. Respond with a JSON markdown block."#;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Fill the deployment prompt with the content under analysis
pub fn build_prompt(recent_messages: &str) -> Result<String> {
    let mut context = Context::new();
    context.insert("recent_messages", recent_messages.trim());
    Ok(Tera::one_off(DEPLOYMENT_PROMPT, &context, false)?)
}

fn fence_end() -> &'static Regex {
    static FENCE_END: OnceLock<Regex> = OnceLock::new();
    FENCE_END.get_or_init(|| Regex::new(r"(?m)^[ \t]*```[ \t]*$").expect("valid regex"))
}

/// Bodies of every ```json fenced block, in order
fn fenced_json_blocks(content: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    // ASCII-only folding keeps byte offsets valid for `content`.
    let lower = content.to_ascii_lowercase();
    let mut search_from = 0usize;

    while let Some(rel_start) = lower[search_from..].find("```json") {
        let after_tag = search_from + rel_start + "```json".len();
        let body_start = match content[after_tag..].find('\n') {
            Some(nl) => after_tag + nl + 1,
            None => break,
        };
        match fence_end().find(&content[body_start..]) {
            Some(m) => {
                blocks.push(&content[body_start..body_start + m.start()]);
                search_from = body_start + m.end();
            }
            None => break,
        }
    }
    blocks
}

/// Top-level `{...}` spans, skipping braces inside JSON strings
fn balanced_objects(content: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_string = false;
    let mut escape = false;
    let mut depth: u32 = 0;
    let mut start = None;

    for (i, ch) in content.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        out.push(&content[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// First JSON object in a model reply, fenced blocks preferred
pub fn parse_generated(reply: &str) -> Option<Value> {
    fenced_json_blocks(reply)
        .into_iter()
        .chain(balanced_objects(reply))
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate.trim()).ok())
        .find(Value::is_object)
}

pub struct LlmExtractor {
    base_url: String,
    model: String,
    default_image: Option<String>,
    http_client: HttpClient,
}

impl LlmExtractor {
    pub fn new(settings: &LlmSettings, default_image: Option<String>) -> Result<Self> {
        let base_url = sanitize_base_url(&settings.base_url, "llm.base_url")?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = settings.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            let key = sanitize_for_header(api_key, "llm.api_key")?;
            let mut auth = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| DeployError::invalid_config(e.to_string()))?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| DeployError::invalid_config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            model: settings.model.clone(),
            default_image,
            http_client,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeployError::Extraction {
                message: format!("request to {} failed: {}", self.base_url, e),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| DeployError::Extraction {
            message: e.to_string(),
        })?;

        match status {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => {
                return Err(DeployError::Extraction {
                    message: "authentication failed, check llm.api_key".to_string(),
                })
            }
            _ => {
                return Err(DeployError::Extraction {
                    message: format!("{}: {}", status, text.trim()),
                })
            }
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| DeployError::Extraction {
            message: format!("unexpected completion body: {}", e),
        })?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ContentExtractor for LlmExtractor {
    async fn extract(&self, text: &str) -> Result<Extraction> {
        let prompt = build_prompt(text)?;
        let reply = self.complete(&prompt).await?;
        tracing::debug!(model = %self.model, reply_len = reply.len(), "Received extraction reply");

        Ok(match parse_generated(&reply) {
            Some(value) => validate_extraction(&value, self.default_image.as_deref()),
            None => Extraction::Invalid {
                reason: "model reply contained no JSON object".to_string(),
            },
        })
    }
}
