use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use devflow_core::config::ModelConfig;
use devflow_core::content::{ContentPayload, ContentRequest, PayloadKind, TemplateId};
use devflow_core::error::{DevflowError, Result};
use devflow_core::state::{DesignDocument, ReviewStatus};
use devflow_core::traits::ContentService;

use crate::templates;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible content service. Works with OpenAI, Groq, Ollama,
/// vLLM, OpenRouter, etc. Non-streaming: one chat completion per
/// request, driven in json_object mode and validated into a typed
/// payload before it leaves this boundary.
pub struct OpenAiContentService {
    http: Client,
    model: ModelConfig,
}

impl OpenAiContentService {
    pub fn new(model: ModelConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(model.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self { http, model }
    }

    fn endpoint(&self) -> String {
        self.model
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_API_URL.to_string())
    }
}

// Request types
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OaiMessage>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct OaiMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: String,
}

// Response types
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// Wire shapes, one per payload kind
#[derive(Deserialize)]
struct StoriesWire {
    stories: Vec<String>,
}

#[derive(Deserialize)]
struct VerdictWire {
    status: ReviewStatus,
    review: String,
}

#[derive(Deserialize)]
struct DesignWire {
    functional: Vec<String>,
    technical: Vec<String>,
}

#[derive(Deserialize)]
struct CodeWire {
    generated_code: String,
}

#[derive(Deserialize)]
struct CasesWire {
    cases: Vec<String>,
}

/// Parse a model reply into the payload shape its template requires.
pub fn parse_payload(template: TemplateId, text: &str) -> Result<ContentPayload> {
    let mismatch = |e: serde_json::Error| DevflowError::SchemaMismatch {
        template: format!("{} ({})", template, e),
        expected: template.payload_kind().to_string(),
    };

    let payload = match template.payload_kind() {
        PayloadKind::Stories => {
            let wire: StoriesWire = serde_json::from_str(text).map_err(mismatch)?;
            ContentPayload::Stories {
                stories: wire.stories,
            }
        }
        PayloadKind::Verdict => {
            let wire: VerdictWire = serde_json::from_str(text).map_err(mismatch)?;
            ContentPayload::Verdict {
                review: wire.review,
                status: wire.status,
            }
        }
        PayloadKind::Design => {
            let wire: DesignWire = serde_json::from_str(text).map_err(mismatch)?;
            ContentPayload::Design {
                document: DesignDocument {
                    functional: wire.functional,
                    technical: wire.technical,
                },
            }
        }
        PayloadKind::Code => {
            let wire: CodeWire = serde_json::from_str(text).map_err(mismatch)?;
            ContentPayload::Code {
                generated_code: wire.generated_code,
            }
        }
        PayloadKind::Cases => {
            let wire: CasesWire = serde_json::from_str(text).map_err(mismatch)?;
            ContentPayload::Cases { cases: wire.cases }
        }
    };
    Ok(payload)
}

impl ContentService for OpenAiContentService {
    fn generate(&self, request: &ContentRequest) -> BoxFuture<'_, Result<ContentPayload>> {
        let template = request.template;
        let prompt = templates::render(request);

        Box::pin(async move {
            let body = ChatRequest {
                model: self.model.model_id.clone(),
                messages: vec![OaiMessage {
                    role: "user".to_string(),
                    content: prompt,
                }],
                max_tokens: self.model.max_tokens,
                temperature: self.model.temperature,
                response_format: ResponseFormat {
                    r#type: "json_object".to_string(),
                },
            };

            let mut req = self.http.post(self.endpoint()).json(&body);
            if let Some(key) = &self.model.api_key {
                req = req.bearer_auth(key);
            }

            debug!(template = %template, model = %self.model.model_id, "Content request");

            let response = req
                .send()
                .await
                .map_err(|e| DevflowError::ContentService(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(DevflowError::ContentService(format!(
                    "HTTP {}: {}",
                    status, text
                )));
            }

            let chat: ChatResponse = response
                .json()
                .await
                .map_err(|e| DevflowError::ContentService(e.to_string()))?;

            let content = chat
                .choices
                .first()
                .and_then(|c| c.message.content.as_deref())
                .ok_or_else(|| {
                    DevflowError::ContentService("empty completion in response".to_string())
                })?;

            parse_payload(template, content)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stories() {
        let payload = parse_payload(
            TemplateId::StoryGeneration,
            r#"{"stories": ["As a user, I want to add tasks so that I can track work."]}"#,
        )
        .unwrap();
        let stories = payload.into_stories(TemplateId::StoryGeneration).unwrap();
        assert_eq!(stories.len(), 1);
    }

    #[test]
    fn test_parse_verdict_wire_status() {
        let payload = parse_payload(
            TemplateId::StoryReview,
            r#"{"status": "Not Approved", "review": "Stories lack acceptance criteria."}"#,
        )
        .unwrap();
        let (status, review) = payload.into_verdict(TemplateId::StoryReview).unwrap();
        assert_eq!(status, ReviewStatus::NotApproved);
        assert!(review.contains("acceptance criteria"));
    }

    #[test]
    fn test_parse_design() {
        let payload = parse_payload(
            TemplateId::DesignGeneration,
            r#"{"functional": ["f1"], "technical": ["t1", "t2"]}"#,
        )
        .unwrap();
        let doc = payload.into_design(TemplateId::DesignGeneration).unwrap();
        assert_eq!(doc.functional, vec!["f1"]);
        assert_eq!(doc.technical.len(), 2);
    }

    #[test]
    fn test_parse_wrong_shape_is_schema_mismatch() {
        let err = parse_payload(TemplateId::CodeGeneration, r#"{"stories": []}"#).unwrap_err();
        assert!(matches!(err, DevflowError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_parse_unknown_status_is_schema_mismatch() {
        let err = parse_payload(
            TemplateId::TestReview,
            r#"{"status": "Needs Fixes", "review": "tighten the edge cases"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DevflowError::SchemaMismatch { .. }));
    }
}
