//! Address enrichment client: free-text address in, normalized record with
//! cadastral identifiers out.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Normalized address record returned by the enrichment service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NormalizedAddress {
    pub street: Option<String>,
    pub street_type: Option<String>,
    pub house: Option<String>,
    pub house_cadastral_number: Option<String>,
    pub flat_cadastral_number: Option<String>,
    pub flat_area: Option<f64>,
    pub precision_level: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Enrichment request failed: {0}")]
    Http(String),
    #[error("Enrichment response malformed: {0}")]
    Malformed(String),
    #[error("Enrichment credentials are not configured")]
    MissingCredentials,
}

#[async_trait]
pub trait AddressEnrichmentClient: Send + Sync {
    async fn normalize(&self, free_text: &str) -> Result<NormalizedAddress, EnrichmentError>;
}

/// House-level resolution with the forced building-letter fallback chain:
/// try `<address>литера А`, then the bare address. Returns `None` when
/// neither attempt yields a house cadastral number.
pub async fn resolve_house(
    client: &dyn AddressEnrichmentClient,
    address: &str,
) -> Result<Option<NormalizedAddress>, EnrichmentError> {
    let with_letter = client.normalize(&format!("{address}литера А")).await?;
    if with_letter.house_cadastral_number.is_some() {
        return Ok(Some(with_letter));
    }

    let bare = client.normalize(address).await?;
    if bare.house_cadastral_number.is_some() {
        return Ok(Some(bare));
    }

    Ok(None)
}

/// Flat-level resolution, two attempts with and without the building letter.
pub async fn resolve_flat(
    client: &dyn AddressEnrichmentClient,
    house_address: &str,
    flat_number: &str,
) -> Result<Option<NormalizedAddress>, EnrichmentError> {
    let with_letter = client
        .normalize(&format!("{house_address}литера А, кв {flat_number}"))
        .await?;
    if with_letter.flat_cadastral_number.is_some() {
        return Ok(Some(with_letter));
    }

    let bare = client
        .normalize(&format!("{house_address},кв. {flat_number}"))
        .await?;
    if bare.flat_cadastral_number.is_some() {
        return Ok(Some(bare));
    }

    Ok(None)
}

/// Raw response shape of the cleaner API; only the fields we consume.
#[derive(Debug, Deserialize)]
struct DadataRecord {
    street: Option<String>,
    street_type: Option<String>,
    house: Option<String>,
    house_cadnum: Option<String>,
    flat_cadnum: Option<String>,
    flat_area: Option<String>,
    qc: Option<i32>,
}

/// HTTP client for the dadata address cleaner.
pub struct DadataClient {
    client: reqwest::Client,
    token: String,
    secret: String,
    base_url: String,
}

impl DadataClient {
    const DEFAULT_BASE_URL: &'static str = "https://cleaner.dadata.ru/api/v1/clean/address";

    pub fn new(token: String, secret: String, timeout: Duration) -> Result<Self, EnrichmentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichmentError::Http(e.to_string()))?;
        Ok(Self {
            client,
            token,
            secret,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl AddressEnrichmentClient for DadataClient {
    async fn normalize(&self, free_text: &str) -> Result<NormalizedAddress, EnrichmentError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Token {}", self.token))
            .header("X-Secret", &self.secret)
            .json(&serde_json::json!([free_text]))
            .send()
            .await
            .map_err(|e| EnrichmentError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EnrichmentError::Http(format!(
                "status {}",
                response.status()
            )));
        }

        let records: Vec<DadataRecord> = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Malformed(e.to_string()))?;

        let record = records
            .into_iter()
            .next()
            .ok_or_else(|| EnrichmentError::Malformed("empty response".to_string()))?;

        Ok(NormalizedAddress {
            street: record.street,
            street_type: record.street_type,
            house: record.house,
            house_cadastral_number: record.house_cadnum,
            flat_cadastral_number: record.flat_cadnum,
            flat_area: record
                .flat_area
                .and_then(|a| a.replace(',', ".").parse().ok()),
            precision_level: record.qc,
        })
    }
}

/// In-process enrichment client for tests: canned results per query text.
#[derive(Default)]
pub struct MockEnrichmentClient {
    responses: parking_lot::Mutex<std::collections::HashMap<String, NormalizedAddress>>,
}

impl MockEnrichmentClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, query: &str, address: NormalizedAddress) {
        self.responses.lock().insert(query.to_string(), address);
    }
}

#[async_trait]
impl AddressEnrichmentClient for MockEnrichmentClient {
    async fn normalize(&self, free_text: &str) -> Result<NormalizedAddress, EnrichmentError> {
        Ok(self
            .responses
            .lock()
            .get(free_text)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_house_prefers_letter_variant() {
        let mock = MockEnrichmentClient::new();
        mock.insert(
            "Невский 1литера А",
            NormalizedAddress {
                house_cadastral_number: Some("78:01:01:1".to_string()),
                ..Default::default()
            },
        );

        let resolved = resolve_house(&mock, "Невский 1").await.unwrap().unwrap();
        assert_eq!(resolved.house_cadastral_number.as_deref(), Some("78:01:01:1"));
    }

    #[tokio::test]
    async fn test_resolve_house_falls_back_to_bare() {
        let mock = MockEnrichmentClient::new();
        mock.insert(
            "Невский 1",
            NormalizedAddress {
                house_cadastral_number: Some("78:01:01:2".to_string()),
                ..Default::default()
            },
        );

        let resolved = resolve_house(&mock, "Невский 1").await.unwrap().unwrap();
        assert_eq!(resolved.house_cadastral_number.as_deref(), Some("78:01:01:2"));
    }

    #[tokio::test]
    async fn test_resolve_house_unresolved() {
        let mock = MockEnrichmentClient::new();
        assert!(resolve_house(&mock, "несуществующий адрес")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resolve_flat_fallback() {
        let mock = MockEnrichmentClient::new();
        mock.insert(
            "Невский 1,кв. 25",
            NormalizedAddress {
                flat_cadastral_number: Some("78:01:01:3:25".to_string()),
                flat_area: Some(112.6),
                ..Default::default()
            },
        );

        let resolved = resolve_flat(&mock, "Невский 1", "25").await.unwrap().unwrap();
        assert_eq!(resolved.flat_area, Some(112.6));
    }
}
