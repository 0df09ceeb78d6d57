use crate::error::{ListingCoreError, Result};

/// Runtime configuration for the intake core.
#[derive(Debug, Clone)]
pub struct ListingCoreConfig {
    pub database_url: String,
    /// Timeout for listing-source HTTP requests.
    pub source_timeout_ms: u64,
    /// Timeout for address-enrichment HTTP requests.
    pub enrichment_timeout_ms: u64,
    /// Idle lifetime of a draft session before it is purged.
    pub session_ttl_minutes: i64,
    pub enrichment_token: Option<String>,
    pub enrichment_secret: Option<String>,
    pub event_channel_capacity: usize,
}

impl Default for ListingCoreConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/listing_core_development".to_string(),
            source_timeout_ms: 15_000,
            enrichment_timeout_ms: 10_000,
            session_ttl_minutes: 120,
            enrichment_token: None,
            enrichment_secret: None,
            event_channel_capacity: 1000,
        }
    }
}

impl ListingCoreConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(timeout) = std::env::var("LISTING_SOURCE_TIMEOUT_MS") {
            config.source_timeout_ms = timeout.parse().map_err(|e| {
                ListingCoreError::Configuration(format!("Invalid source_timeout_ms: {e}"))
            })?;
        }

        if let Ok(timeout) = std::env::var("LISTING_ENRICHMENT_TIMEOUT_MS") {
            config.enrichment_timeout_ms = timeout.parse().map_err(|e| {
                ListingCoreError::Configuration(format!("Invalid enrichment_timeout_ms: {e}"))
            })?;
        }

        if let Ok(ttl) = std::env::var("LISTING_SESSION_TTL_MINUTES") {
            config.session_ttl_minutes = ttl.parse().map_err(|e| {
                ListingCoreError::Configuration(format!("Invalid session_ttl_minutes: {e}"))
            })?;
        }

        if let Ok(token) = std::env::var("DADATA_TOKEN") {
            config.enrichment_token = Some(token);
        }

        if let Ok(secret) = std::env::var("DADATA_SECRET") {
            config.enrichment_secret = Some(secret);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ListingCoreConfig::default();
        assert_eq!(config.session_ttl_minutes, 120);
        assert!(config.enrichment_token.is_none());
    }

    #[test]
    fn test_from_env_override() {
        std::env::set_var("LISTING_SESSION_TTL_MINUTES", "30");
        let config = ListingCoreConfig::from_env().unwrap();
        assert_eq!(config.session_ttl_minutes, 30);
        std::env::remove_var("LISTING_SESSION_TTL_MINUTES");
    }
}
