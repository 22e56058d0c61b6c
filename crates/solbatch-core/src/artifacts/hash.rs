use crate::config::CompilationSettings;
use sha3::{Digest, Keccak256};

/// Keccak-256 fingerprint of source text, lowercase hex without `0x`
///
/// This is the digest the compiler protocol expects in `sources.*.keccak256`.
pub fn fingerprint(content: &str) -> String {
    let digest = Keccak256::digest(content.as_bytes());
    format!("{:x}", digest)
}

/// Hash the settings that shape compiler output, to detect settings changes
///
/// Remappings are deliberately absent from [`CompilationSettings`]: they
/// depend on which targets share a batch, not on the output of any one.
pub fn hash_settings(settings: &CompilationSettings, language: &str) -> String {
    let json = serde_json::to_string(&(language, settings)).unwrap_or_default();
    let hash = blake3::hash(json.as_bytes());
    hash.to_hex().to_string()
}
