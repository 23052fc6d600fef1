use rand::Rng;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::PollinationsConfig;
use crate::error::{PollenError, Result};
use crate::models::{GeneratedImage, GenerationRequest, ImageHandle};

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    config: PollinationsConfig,
}

impl ImageClient {
    pub fn new(client: Client, config: PollinationsConfig) -> Self {
        Self { client, config }
    }

    /// Generate one image. Each call draws a fresh seed, so repeating the
    /// same request yields a different image.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage> {
        let seed = draw_seed();
        let api_key = request
            .trimmed_api_key()
            .or_else(|| self.config.trimmed_api_key())
            .map(String::from);

        let url = build_image_url(&self.config.api_base, &request, seed, api_key.as_deref())?;

        log::info!(
            "Generating {}x{} image with model: {} (seed {})",
            request.width,
            request.height,
            request.model,
            seed
        );

        let mut http_request = self.client.get(url.clone());
        if let Some(key) = &api_key {
            http_request = http_request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| PollenError::Network(format!("Image request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PollenError::Api {
                status: status.as_u16(),
                message: extract_error_message(status, &body),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PollenError::Response(format!("Failed to read image body: {}", e)))?;

        if bytes.is_empty() {
            return Err(PollenError::Response("Empty image body".to_string()));
        }

        let handle = ImageHandle::from_bytes(&bytes, content_type)?;
        log::debug!("Received {} image bytes", handle.len());

        Ok(GeneratedImage {
            handle,
            seed,
            model: request.model,
        })
    }
}

/// Seeds are drawn uniformly from [0, 1_000_000) per invocation.
pub fn draw_seed() -> u32 {
    rand::thread_rng().gen_range(0..1_000_000)
}

/// Build the generation URL. The prompt travels percent-encoded as a path
/// segment; the query order is fixed so requests stay byte-comparable,
/// and the key rides in both the bearer header and the `key` parameter.
pub fn build_image_url(
    api_base: &str,
    request: &GenerationRequest,
    seed: u32,
    api_key: Option<&str>,
) -> Result<Url> {
    let prompt = request.trimmed_prompt().ok_or(PollenError::EmptyPrompt)?;
    if request.width == 0 || request.height == 0 {
        return Err(PollenError::Request(format!(
            "Image dimensions must be positive, got {}x{}",
            request.width, request.height
        )));
    }

    let mut url = Url::parse(api_base)
        .map_err(|e| PollenError::Request(format!("Invalid API base '{}': {}", api_base, e)))?;
    url.path_segments_mut()
        .map_err(|_| PollenError::Request(format!("API base '{}' cannot carry a path", api_base)))?
        .pop_if_empty()
        .push("image")
        .push(prompt);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("width", &request.width.to_string());
        query.append_pair("height", &request.height.to_string());
        query.append_pair("seed", &seed.to_string());
        query.append_pair("model", &request.model);
        query.append_pair("nologo", "true");
        if let Some(reference) = &request.reference_image {
            query.append_pair("image", reference);
        }
        if let Some(key) = api_key {
            query.append_pair("key", key);
        }
    }

    Ok(url)
}

/// Pull a human-readable message out of an error response. The service
/// answers with `{"error": {"message": ...}}`, `{"message": ...}`, or
/// plain text depending on which layer rejected the request.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value
            .pointer("/error/message")
            .and_then(serde_json::Value::as_str)
        {
            return message.to_string();
        }
        if let Some(message) = value.get("message").and_then(serde_json::Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    format!(
        "Generation failed: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://gen.pollinations.ai";

    #[test]
    fn url_encodes_prompt_as_path_segment() {
        let request = GenerationRequest::new("a cat");
        let url = build_image_url(BASE, &request, 42, None).unwrap();
        assert_eq!(url.path(), "/image/a%20cat");
    }

    #[test]
    fn url_query_order_is_fixed() {
        let request = GenerationRequest::new("a cat").with_model("flux");
        let url = build_image_url(BASE, &request, 42, None).unwrap();
        assert_eq!(
            url.query(),
            Some("width=1024&height=1024&seed=42&model=flux&nologo=true")
        );
    }

    #[test]
    fn reference_and_key_append_after_nologo() {
        let request = GenerationRequest::new("a cat")
            .with_size(512, 768)
            .with_reference_image("https://example.com/ref.png");
        let url = build_image_url(BASE, &request, 7, Some("pk-123")).unwrap();
        assert_eq!(
            url.query(),
            Some(
                "width=512&height=768&seed=7&model=flux&nologo=true\
                 &image=https%3A%2F%2Fexample.com%2Fref.png&key=pk-123"
            )
        );
    }

    #[test]
    fn key_is_omitted_when_absent() {
        let request = GenerationRequest::new("a cat");
        let url = build_image_url(BASE, &request, 1, None).unwrap();
        assert!(!url.query().unwrap().contains("key="));
    }

    #[test]
    fn prompt_is_trimmed_before_encoding() {
        let request = GenerationRequest::new("  a cat  ");
        let url = build_image_url(BASE, &request, 1, None).unwrap();
        assert_eq!(url.path(), "/image/a%20cat");
    }

    #[test]
    fn whitespace_prompt_is_rejected_before_any_request() {
        let request = GenerationRequest::new("   ");
        let err = build_image_url(BASE, &request, 1, None).unwrap_err();
        assert!(matches!(err, PollenError::EmptyPrompt));
    }

    #[test]
    fn zero_dimensions_are_rejected_before_any_request() {
        let request = GenerationRequest::new("a cat").with_size(0, 0);
        let err = build_image_url(BASE, &request, 1, None).unwrap_err();
        assert!(matches!(err, PollenError::Request(_)));

        let request = GenerationRequest::new("a cat").with_size(1024, 0);
        assert!(build_image_url(BASE, &request, 1, None).is_err());
        let request = GenerationRequest::new("a cat").with_size(0, 768);
        assert!(build_image_url(BASE, &request, 1, None).is_err());
    }

    #[test]
    fn seeds_stay_in_range() {
        for _ in 0..1_000 {
            assert!(draw_seed() < 1_000_000);
        }
    }

    #[test]
    fn error_message_prefers_nested_error_object() {
        let body = r#"{"error": {"message": "model overloaded"}, "message": "outer"}"#;
        assert_eq!(
            extract_error_message(StatusCode::BAD_GATEWAY, body),
            "model overloaded"
        );
    }

    #[test]
    fn error_message_falls_back_to_top_level_message() {
        let body = r#"{"message": "invalid key"}"#;
        assert_eq!(
            extract_error_message(StatusCode::UNAUTHORIZED, body),
            "invalid key"
        );
    }

    #[test]
    fn error_message_uses_raw_body_when_not_json() {
        assert_eq!(
            extract_error_message(StatusCode::INTERNAL_SERVER_ERROR, "backend exploded"),
            "backend exploded"
        );
    }

    #[test]
    fn error_message_defaults_to_status_line_for_empty_body() {
        assert_eq!(
            extract_error_message(StatusCode::SERVICE_UNAVAILABLE, "  "),
            "Generation failed: 503 Service Unavailable"
        );
    }
}
