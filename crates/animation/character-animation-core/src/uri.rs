//! Storage-bucket URI normalization.
//!
//! `gs://bucket/path` style URIs are rewritten to a fetchable HTTPS URL.
//! A bucket whose name contains a `.` is a custom domain and is addressed
//! directly; any other bucket goes through `storage.googleapis.com`.

const PASSTHROUGH_PREFIXES: [&str; 3] = ["http://", "https://", "data:"];
const GCS_HOST: &str = "https://storage.googleapis.com";

/// Rewrite a storage URI into an HTTP(S) URL.
///
/// Empty strings, `http://`, `https://` and `data:` URIs are returned as-is,
/// as is anything without a `scheme://` separator.
pub fn normalize_uri(uri: &str) -> String {
    if uri.is_empty() || PASSTHROUGH_PREFIXES.iter().any(|p| uri.starts_with(p)) {
        return uri.to_string();
    }
    let Some((_, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let (bucket, path) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.contains('.') {
        format!("https://{bucket}/{path}")
    } else {
        format!("{GCS_HOST}/{bucket}/{path}")
    }
}

/// Normalize an optional URI, keeping `None` as `None`.
pub fn normalize_opt(uri: Option<&str>) -> Option<String> {
    uri.map(normalize_uri)
}
