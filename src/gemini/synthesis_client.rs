use super::{candidate_parts, inline_part, GeminiTransport};
use crate::{
    composer,
    error::Result,
    models::{EncodedImage, SynthesisRequest, SynthesisResult},
    orchestrator::SynthesisService,
};
use async_trait::async_trait;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct SynthesisClient {
    transport: GeminiTransport,
    model_id: String,
}

impl SynthesisClient {
    pub(crate) fn new(transport: GeminiTransport, model_id: String) -> Self {
        Self {
            transport,
            model_id,
        }
    }

    /// One synthesis call: both images plus the composed instruction,
    /// requesting image and text response modalities. A response without an
    /// image part comes back as `Ok` with `image: None`; the orchestrator
    /// decides whether that is fatal.
    pub async fn call(&self, request: &SynthesisRequest) -> Result<SynthesisResult> {
        let instruction = composer::build_instruction(
            &request.pose,
            &request.scenario,
            request.forced_size.as_deref(),
        );

        let payload = json!({
            "contents": [{
                "parts": [
                    inline_part(&request.subject),
                    inline_part(&request.garment),
                    { "text": instruction },
                ],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE", "TEXT"],
            },
        });

        log::info!(
            "Synthesizing pose '{}' with model {} (forced size: {})",
            request.pose.name,
            self.model_id,
            request.forced_size.as_deref().unwrap_or("none")
        );

        let response = self.transport.generate_content(&self.model_id, &payload).await?;
        Ok(parse_synthesis_response(&response))
    }
}

#[async_trait]
impl SynthesisService for SynthesisClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult> {
        self.call(request).await
    }
}

/// Walks the candidate's parts: the first inline-image part becomes the
/// result image, the first non-empty text part the suggested size. Text is
/// trimmed and stripped of incidental backtick markers.
fn parse_synthesis_response(response: &Value) -> SynthesisResult {
    let mut image = None;
    let mut suggested_size = None;

    for part in candidate_parts(response) {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if suggested_size.is_none() {
                let cleaned = text.replace('`', "");
                let cleaned = cleaned.trim();
                if !cleaned.is_empty() {
                    suggested_size = Some(cleaned.to_string());
                }
            }
        } else if let Some(inline) = part
            .get("inlineData")
            .or_else(|| part.get("inline_data"))
        {
            if image.is_none() {
                let data = inline.get("data").and_then(Value::as_str).unwrap_or_default();
                if !data.is_empty() {
                    let mime_type = inline
                        .get("mimeType")
                        .or_else(|| inline.get("mime_type"))
                        .and_then(Value::as_str)
                        .unwrap_or("image/png");
                    image = Some(EncodedImage::new(mime_type, data));
                }
            }
        }
    }

    SynthesisResult {
        image,
        suggested_size,
    }
}
