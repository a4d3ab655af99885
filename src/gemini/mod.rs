pub mod synthesis_client;
pub mod tag_client;

use crate::{
    config::GeminiConfig,
    error::{FitroomError, Result},
};
use reqwest::Client;
use serde_json::Value;

pub use synthesis_client::SynthesisClient;
pub use tag_client::TagClient;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_SYNTHESIS_MODEL: &str = "gemini-2.5-flash-image-preview";
const DEFAULT_TAG_MODEL: &str = "gemini-2.5-flash";

/// Shared `generateContent` transport used by both sub-clients. One HTTP
/// client is built per [`GeminiClient`] and reused across every call.
#[derive(Clone)]
pub(crate) struct GeminiTransport {
    http: Client,
    api_base: String,
    api_key: String,
}

impl GeminiTransport {
    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    pub(crate) async fn generate_content(&self, model: &str, payload: &Value) -> Result<Value> {
        let endpoint = self.endpoint(model);
        log::debug!("POST {}", endpoint);

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(payload)
            .send()
            .await
            .map_err(|e| FitroomError::ServiceError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FitroomError::ServiceError(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FitroomError::ResponseError(e.to_string()))
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    synthesis_client: SynthesisClient,
    tag_client: TagClient,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            FitroomError::ConfigError(
                "no Gemini API key configured (set GEMINI_API_KEY or GOOGLE_API_KEY)".into(),
            )
        })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let transport = GeminiTransport {
            http: Client::new(),
            api_base,
            api_key,
        };

        Ok(Self {
            synthesis_client: SynthesisClient::new(
                transport.clone(),
                config
                    .synthesis_model
                    .unwrap_or_else(|| DEFAULT_SYNTHESIS_MODEL.to_string()),
            ),
            tag_client: TagClient::new(
                transport,
                config
                    .tag_model
                    .unwrap_or_else(|| DEFAULT_TAG_MODEL.to_string()),
            ),
        })
    }

    pub fn synthesis(&self) -> &SynthesisClient {
        &self.synthesis_client
    }

    pub fn tags(&self) -> &TagClient {
        &self.tag_client
    }
}

/// Builds an inline-image part the way the Gemini REST surface expects it.
pub(crate) fn inline_part(image: &crate::models::EncodedImage) -> Value {
    serde_json::json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": image.data,
        }
    })
}

/// Extracts the parts of the first candidate, tolerating both camelCase and
/// snake_case field spellings of the REST surface.
pub(crate) fn candidate_parts(response: &Value) -> Vec<Value> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
