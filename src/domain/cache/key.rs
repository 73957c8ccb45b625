//! Content-addressed cache keys

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::gateway::request::GenerationRequest;

/// Key namespace for generation responses
const KEY_PREFIX: &str = "gen";

/// The canonical subset of a request that determines its cache identity.
/// Caller identity is deliberately excluded so identical requests from
/// different callers share an entry.
#[derive(Debug, Serialize)]
struct NormalizedRequest<'a> {
    model: Option<&'a str>,
    system: Option<&'a str>,
    prompt: &'a str,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    top_p: Option<f64>,
}

impl<'a> From<&'a GenerationRequest> for NormalizedRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            model: request.model_hint(),
            system: request.system(),
            prompt: request.prompt(),
            temperature: request.temperature(),
            max_tokens: request.max_tokens(),
            top_p: request.top_p(),
        }
    }
}

/// Derive the cache key for a request: `gen:` followed by the hex SHA-256
/// of the normalized request's canonical JSON.
pub fn cache_key(request: &GenerationRequest) -> String {
    let normalized = NormalizedRequest::from(request);

    // Serializing a struct of primitives cannot fail.
    let canonical = serde_json::to_vec(&normalized).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let digest = hasher.finalize();

    format!("{}:{}", KEY_PREFIX, hex::encode(digest))
}
