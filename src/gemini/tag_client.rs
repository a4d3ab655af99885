use super::{candidate_parts, inline_part, GeminiTransport};
use crate::{composer, models::EncodedImage};
use serde_json::{json, Value};

const TAG_PROMPT: &str = "Analiza la prenda en la imagen. Describe la prenda con etiquetas \
cortas y relevantes. Proporciona únicamente una lista de etiquetas.\n\
Ejemplos de etiquetas:\n\
- Tipo: Vestido, Pantalón, Camisa, Abrigo, Falda\n\
- Estilo: Casual, Formal, Deportivo, Elegante, Bohemio\n\
- Color: Rojo, Azul, Negro, Estampado Floral, Rayas\n\
- Material (aparente): Algodón, Jean, Seda, Lana\n\
- Ocasión: Verano, Invierno, Fiesta, Oficina\n\
- Largo: Corto, Midi, Largo\n\
- Manga: Manga corta, Manga larga, Sin mangas";

/// Best-effort descriptive labels for a garment image. This path never
/// returns a hard error: decode, transport, and parse failures are logged
/// and collapse to an empty list.
#[derive(Clone)]
pub struct TagClient {
    transport: GeminiTransport,
    model_id: String,
}

impl TagClient {
    pub(crate) fn new(transport: GeminiTransport, model_id: String) -> Self {
        Self {
            transport,
            model_id,
        }
    }

    pub async fn infer(&self, garment_bytes: &[u8]) -> Vec<String> {
        let garment = match composer::normalize_garment(garment_bytes) {
            Ok(garment) => garment,
            Err(e) => {
                log::warn!("Tag inference skipped, garment image unreadable: {}", e);
                return Vec::new();
            }
        };
        self.infer_encoded(&garment).await
    }

    pub async fn infer_encoded(&self, garment: &EncodedImage) -> Vec<String> {
        let payload = json!({
            "contents": [{
                "parts": [
                    inline_part(garment),
                    { "text": TAG_PROMPT },
                ],
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "tags": {
                            "type": "ARRAY",
                            "items": {
                                "type": "STRING",
                                "description": "Una etiqueta descriptiva para la prenda.",
                            },
                        },
                    },
                    "required": ["tags"],
                },
            },
        });

        log::info!("Inferring garment tags with model {}", self.model_id);

        match self.transport.generate_content(&self.model_id, &payload).await {
            Ok(response) => parse_tags(&response_text(&response)),
            Err(e) => {
                log::warn!("Tag inference failed: {}", e);
                Vec::new()
            }
        }
    }
}

fn response_text(response: &Value) -> String {
    candidate_parts(response)
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}

/// Primary path parses the schema-constrained JSON; valid JSON without a
/// `tags` string array yields nothing; anything unparseable falls back to
/// comma-separated splitting of the raw text.
pub(crate) fn parse_tags(text: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(text) {
        Ok(parsed) => parsed
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        Err(_) => {
            log::debug!("Structured tag parse failed, falling back to comma-separated text");
            text.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_schema_constrained_json() {
        let tags = parse_tags(r#"{"tags": ["Vestido", "Casual", "Rojo"]}"#);
        assert_eq!(tags, vec!["Vestido", "Casual", "Rojo"]);
    }

    #[test]
    fn falls_back_to_comma_separated_text() {
        let tags = parse_tags("rojo, casual, verano");
        assert_eq!(tags, vec!["rojo", "casual", "verano"]);
    }

    #[test]
    fn fallback_drops_empty_entries() {
        let tags = parse_tags("rojo,, , verano");
        assert_eq!(tags, vec!["rojo", "verano"]);
    }

    #[test]
    fn valid_json_without_tags_yields_nothing() {
        assert!(parse_tags(r#"{"labels": ["rojo"]}"#).is_empty());
        assert!(parse_tags(r#"{"tags": "rojo"}"#).is_empty());
    }

    #[test]
    fn unusable_text_yields_nothing_not_an_error() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags("  ,  , ").is_empty());
    }
}
