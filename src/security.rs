use subtle::ConstantTimeEq;

use crate::config::Config;

/// Constant-time string comparison to prevent timing attacks
/// Use this for comparing API keys and download access keys
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn matches_secret(secret: Option<&str>, presented: Option<&str>) -> bool {
    match (secret, presented) {
        (Some(secret), Some(presented)) => constant_time_compare(secret, presented),
        _ => false,
    }
}

/// Admin routes are open when no admin key is configured
pub fn admin_allowed(config: &Config, presented: Option<&str>) -> bool {
    match config.admin_api_key.as_deref() {
        None => true,
        Some(secret) => matches_secret(Some(secret), presented),
    }
}

/// Downloads are open when neither secret is configured; otherwise either
/// the `key` query parameter or the admin `X-API-Key` header must match.
pub fn download_allowed(
    config: &Config,
    query_key: Option<&str>,
    api_key_header: Option<&str>,
) -> bool {
    if config.admin_api_key.is_none() && config.download_access_key.is_none() {
        return true;
    }

    matches_secret(config.download_access_key.as_deref(), query_key)
        || matches_secret(config.admin_api_key.as_deref(), api_key_header)
}
