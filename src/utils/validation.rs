use crate::utils::error::{Result, UpdaterError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> UpdaterError {
    UpdaterError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// Firestore collection id rules: no slashes, not `.`/`..`, not `__*__`.
pub fn validate_collection_id(field_name: &str, collection: &str) -> Result<()> {
    validate_non_empty_string(field_name, collection)?;

    if collection.contains('/') {
        return Err(invalid(
            field_name,
            collection,
            "Collection id cannot contain '/'",
        ));
    }
    if collection == "." || collection == ".." {
        return Err(invalid(field_name, collection, "Collection id is reserved"));
    }
    if collection.len() > 4 && collection.starts_with("__") && collection.ends_with("__") {
        return Err(invalid(
            field_name,
            collection,
            "Ids matching __.*__ are reserved",
        ));
    }
    if collection.len() > 1500 {
        return Err(invalid(
            field_name,
            collection,
            "Collection id must be at most 1500 bytes",
        ));
    }
    Ok(())
}

/// Daily price rate must be in (0, 1].
pub fn validate_daily_rate(field_name: &str, rate: f64) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 || rate > 1.0 {
        return Err(invalid(
            field_name,
            rate,
            "Daily price rate must be greater than 0 and at most 1",
        ));
    }
    Ok(())
}

/// Rejects values still holding an unresolved `${VAR}` placeholder.
pub fn validate_resolved(field_name: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(invalid(
            field_name,
            value,
            "Environment variable placeholder was not resolved",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("firestore_url", "https://firestore.googleapis.com").is_ok());
        assert!(validate_url("firestore_url", "http://localhost:8080").is_ok());
        assert!(validate_url("firestore_url", "").is_err());
        assert!(validate_url("firestore_url", "invalid-url").is_err());
        assert!(validate_url("firestore_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_collection_id() {
        assert!(validate_collection_id("collection", "marketplace").is_ok());
        assert!(validate_collection_id("collection", "").is_err());
        assert!(validate_collection_id("collection", "a/b").is_err());
        assert!(validate_collection_id("collection", "..").is_err());
        assert!(validate_collection_id("collection", "__internal__").is_err());
    }

    #[test]
    fn test_validate_daily_rate() {
        assert!(validate_daily_rate("daily_rate", 0.05).is_ok());
        assert!(validate_daily_rate("daily_rate", 1.0).is_ok());
        assert!(validate_daily_rate("daily_rate", 0.0).is_err());
        assert!(validate_daily_rate("daily_rate", 1.5).is_err());
        assert!(validate_daily_rate("daily_rate", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_range_and_placeholders() {
        assert!(validate_range("concurrency", 16, 1, 256).is_ok());
        assert!(validate_range("concurrency", 0, 1, 256).is_err());
        assert!(validate_resolved("project_id", "${FIRESTORE_PROJECT}").is_err());
        assert!(validate_resolved("project_id", "farm-market").is_ok());
    }
}
