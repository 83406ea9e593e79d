// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding adapter speaking the OpenAI-compatible
//! `/v1/embeddings` shape.
//!
//! The embedding model itself is an external collaborator; this client
//! only moves text in and vectors out. All failures surface as transient
//! errors so the caller's bounded backoff applies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use keepsake_config::EmbeddingConfig;
use keepsake_core::traits::adapter::ServiceAdapter;
use keepsake_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use keepsake_core::{EmbeddingAdapter, KeepsakeError};

/// Embedding client for an OpenAI-compatible HTTP service.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dims: usize,
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn has_version_suffix(base_url: &str) -> bool {
    let Some(last_segment) = base_url.rsplit('/').next() else {
        return false;
    };
    let Some(rest) = last_segment.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

/// Resolve the embeddings endpoint from a configured base URL, tolerating
/// bare hosts, versioned bases, and fully explicit endpoint URLs.
fn embeddings_endpoint(base_url: &str) -> String {
    let normalized = normalize_base_url(base_url);
    if normalized.ends_with("/embeddings") {
        return normalized;
    }
    if has_version_suffix(&normalized) {
        return format!("{normalized}/embeddings");
    }
    format!("{normalized}/v1/embeddings")
}

impl HttpEmbedder {
    /// Creates a client from the embedding config section.
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(&config.base_url),
            api_key: config.api_key.clone(),
            model: config.model_name.clone(),
            dims: config.dimensions,
        }
    }

    fn transient(source: impl std::error::Error + Send + Sync + 'static) -> KeepsakeError {
        KeepsakeError::Transient {
            service: "embedding".into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl ServiceAdapter for HttpEmbedder {
    fn name(&self) -> &str {
        "http-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        // A HEAD against the base URL is enough to see the service.
        match self.client.head(&self.base_url).send().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, KeepsakeError> {
        let count = input.texts.len();
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: input.texts,
        };

        let mut builder = self
            .client
            .post(embeddings_endpoint(&self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(Self::transient)?
            .error_for_status()
            .map_err(Self::transient)?
            .json::<EmbeddingResponse>()
            .await
            .map_err(Self::transient)?;

        if response.data.len() != count {
            return Err(KeepsakeError::transient("embedding"));
        }

        metrics::counter!("keepsake_embeddings_generated_total").increment(count as u64);
        Ok(EmbeddingOutput {
            embeddings: response.data.into_iter().map(|d| d.embedding).collect(),
            dimensions: self.dims,
        })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn endpoint_from_bare_host() {
        assert_eq!(
            embeddings_endpoint("http://localhost:8080"),
            "http://localhost:8080/v1/embeddings"
        );
    }

    #[test]
    fn endpoint_from_versioned_base() {
        assert_eq!(
            embeddings_endpoint("https://api.example.com/v1"),
            "https://api.example.com/v1/embeddings"
        );
        assert_eq!(
            embeddings_endpoint("https://api.example.com/paas/v4"),
            "https://api.example.com/paas/v4/embeddings"
        );
    }

    #[test]
    fn endpoint_preserves_explicit_url() {
        assert_eq!(
            embeddings_endpoint("https://api.example.com/v1/embeddings/"),
            "https://api.example.com/v1/embeddings"
        );
    }

    fn config_for(server_url: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: server_url.to_string(),
            dimensions: 3,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn embed_parses_response_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [1.0, 0.0, 0.0]},
                    {"embedding": [0.0, 1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config_for(&server.uri()));
        let output = embedder
            .embed(EmbeddingInput {
                texts: vec!["first".into(), "second".into()],
            })
            .await
            .unwrap();

        assert_eq!(output.embeddings.len(), 2);
        assert_eq!(output.embeddings[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(output.embeddings[1], vec![0.0, 1.0, 0.0]);
        assert_eq!(output.dimensions, 3);
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config_for(&server.uri()));
        let result = embedder
            .embed(EmbeddingInput {
                texts: vec!["text".into()],
            })
            .await;

        assert!(matches!(result, Err(KeepsakeError::Transient { .. })));
    }

    #[tokio::test]
    async fn short_response_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [1.0, 0.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config_for(&server.uri()));
        let result = embedder
            .embed(EmbeddingInput {
                texts: vec!["one".into(), "two".into()],
            })
            .await;

        assert!(matches!(result, Err(KeepsakeError::Transient { .. })));
    }
}
