use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::options::{PoseTemplate, Scenario};

/// A base64-encoded image together with its media type, so the payload is
/// self-describing wherever it travels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String, // Base64 encoded
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn as_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parses a `data:<mime>;base64,<payload>` URL. Defaults the media type
    /// to JPEG when the header is malformed, matching what browsers emit.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let (meta, data) = url.split_once(',')?;
        let mime_type = meta
            .strip_prefix("data:")
            .and_then(|m| m.split(';').next())
            .filter(|m| !m.is_empty())
            .unwrap_or("image/jpeg");
        Some(Self::new(mime_type, data))
    }
}

/// One synthesis call, built fresh per (pose, scenario, forced-size?)
/// combination. Never persisted.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub subject: EncodedImage,
    pub garment: EncodedImage,
    pub pose: PoseTemplate,
    pub scenario: Scenario,
    pub forced_size: Option<String>,
}

/// What one synthesis call produced. A result without an image is a failed
/// call; the orchestrator decides whether that aborts the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub image: Option<EncodedImage>,
    pub suggested_size: Option<String>,
}

/// The finished set of pose variants for one subject/garment/scenario
/// combination, in pose-template order. After a successful merge every
/// element's `suggested_size` equals the batch's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub scenario_id: String,
    pub suggested_size: Option<String>,
    pub results: Vec<SynthesisResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_roundtrip() {
        let image = EncodedImage::new("image/png", "AAAA");
        let url = image.as_data_url();
        assert_eq!(url, "data:image/png;base64,AAAA");
        assert_eq!(EncodedImage::from_data_url(&url).unwrap(), image);
    }

    #[test]
    fn malformed_data_url_header_defaults_to_jpeg() {
        let image = EncodedImage::from_data_url("data:;base64,BBBB").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "BBBB");
    }

    #[test]
    fn data_url_without_payload_is_rejected() {
        assert!(EncodedImage::from_data_url("not a data url").is_none());
    }
}
