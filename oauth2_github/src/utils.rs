use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::rand::SecureRandom;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub(crate) enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),
}

/// Random URL-safe string built from `len` bytes of system randomness.
pub(crate) fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random string".to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Parsed query string.
///
/// Values that are not valid percent-encoded UTF-8 are kept aside so the
/// caller can tell "absent" from "undecodable".
#[derive(Debug, Default)]
pub(crate) struct QueryParams {
    values: HashMap<String, String>,
    undecodable: Vec<String>,
}

impl QueryParams {
    pub(crate) fn parse(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let Ok(key) = decode_component(raw_key) else {
                continue;
            };
            // First occurrence wins
            if params.values.contains_key(&key) {
                continue;
            }
            match decode_component(raw_value) {
                Ok(value) => {
                    params.values.insert(key, value);
                }
                Err(e) => {
                    tracing::debug!("Failed to decode query parameter {}: {}", key, e);
                    params.undecodable.push(key);
                }
            }
        }
        params
    }

    /// Decoded, non-empty value for `key`.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn is_undecodable(&self, key: &str) -> bool {
        self.undecodable.iter().any(|k| k == key)
    }
}

fn decode_component(raw: &str) -> Result<String, std::string::FromUtf8Error> {
    let plus_decoded = raw.replace('+', " ");
    urlencoding::decode(&plus_decoded).map(|s| s.into_owned())
}

/// Accepts a post-login destination only when it is a local path.
///
/// Anything that could leave the origin (absolute URLs, scheme-relative
/// `//host` or `/\host` forms, control characters) is rejected.
pub(crate) fn validate_redirect_target(target: &str) -> Option<&str> {
    if !target.starts_with('/') {
        return None;
    }
    if target.starts_with("//") || target.starts_with("/\\") {
        return None;
    }
    if target.chars().any(|c| c.is_control()) {
        return None;
    }
    Some(target)
}
