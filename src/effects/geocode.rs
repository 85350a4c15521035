use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::GeocodingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Lookup results keyed by normalised query; `None` records a known miss
#[async_trait]
pub trait GeocodeCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Option<Coordinates>>;

    async fn put(&self, key: &str, value: Option<Coordinates>);
}

#[derive(Default)]
pub struct MemoryGeocodeCache {
    entries: RwLock<HashMap<String, Option<Coordinates>>>,
}

impl MemoryGeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GeocodeCache for MemoryGeocodeCache {
    async fn get(&self, key: &str) -> Option<Option<Coordinates>> {
        self.entries.read().await.get(key).copied()
    }

    async fn put(&self, key: &str, value: Option<Coordinates>) {
        self.entries.write().await.insert(key.to_string(), value);
    }
}

/// Trimmed, lower-cased, inner whitespace collapsed
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[derive(Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
}

/// City/country lookup against a Nominatim-compatible endpoint
pub struct Geocoder {
    client: Option<reqwest::Client>,
    base_url: String,
    cache: Arc<dyn GeocodeCache>,
}

impl Geocoder {
    pub fn new(config: &GeocodingConfig, cache: Arc<dyn GeocodeCache>) -> Self {
        let client = if config.enabled {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(|e| tracing::warn!("Geocoding client unavailable: {}", e))
                .ok()
        } else {
            None
        };
        Self { client, base_url: config.base_url.clone(), cache }
    }

    /// Cache-only geocoder, never reaches the network
    pub fn offline(cache: Arc<dyn GeocodeCache>) -> Self {
        Self { client: None, base_url: String::new(), cache }
    }

    pub async fn locate(&self, ville: Option<&str>, pays: Option<&str>) -> Option<Coordinates> {
        let query = [ville, pays]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if query.is_empty() {
            return None;
        }

        let key = normalize_query(&query);
        if let Some(hit) = self.cache.get(&key).await {
            return hit;
        }

        let client = self.client.as_ref()?;
        match self.fetch(client, &query).await {
            Ok(result) => {
                self.cache.put(&key, result).await;
                result
            }
            Err(e) => {
                // Transport failures are not cached so the next request retries
                tracing::warn!("Geocoding '{}' failed: {}", query, e);
                None
            }
        }
    }

    async fn fetch(&self, client: &reqwest::Client, query: &str) -> Result<Option<Coordinates>, reqwest::Error> {
        let hits: Vec<NominatimHit> = client
            .get(&self.base_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(hits.into_iter().next().and_then(|hit| {
            Some(Coordinates { lat: hit.lat.parse().ok()?, lon: hit.lon.parse().ok()? })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_queries() {
        assert_eq!(normalize_query("  Dakar,   SÉNÉGAL "), "dakar, sénégal");
    }

    #[tokio::test]
    async fn serves_cached_entries_without_network() {
        let cache = Arc::new(MemoryGeocodeCache::new());
        cache.put("dakar, senegal", Some(Coordinates { lat: 14.69, lon: -17.44 })).await;
        let geocoder = Geocoder::offline(cache);

        let hit = geocoder.locate(Some(" Dakar "), Some("Senegal")).await;
        assert_eq!(hit, Some(Coordinates { lat: 14.69, lon: -17.44 }));
        assert_eq!(geocoder.locate(Some("Lyon"), Some("France")).await, None);
        assert_eq!(geocoder.locate(None, None).await, None);
    }
}
