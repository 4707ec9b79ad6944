use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use super::Geocoder;
use crate::cache::GeoCache;
use crate::error::BoxError;
use crate::models::nearby::Coordinates;

#[derive(Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Nominatim search client backed by the permanent geo cache.
pub struct NominatimClient {
    http: HttpClient,
    url: String,
    cache: GeoCache,
}

impl NominatimClient {
    pub fn new(
        url: &str,
        user_agent: &str,
        timeout_secs: u64,
        cache: GeoCache
    ) -> Result<Self, BoxError> {
        let http = HttpClient::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http, url: url.to_string(), cache })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>, BoxError> {
        if let Some(hit) = self.cache.get(place).await {
            return Ok(Some(hit));
        }

        let query = format!("{}, India", place.trim());
        let hits = self.http
            .get(&self.url)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send().await?
            .error_for_status()?
            .json::<Vec<SearchHit>>().await?;

        let Some(first) = hits.first() else {
            info!("nominatim_no_result location={}", place);
            return Ok(None);
        };
        let lat: f64 = first.lat.parse()?;
        let lon: f64 = first.lon.parse()?;
        let Some(at) = Coordinates::new(lat, lon) else {
            return Ok(None);
        };

        self.cache.put(place, at).await;
        info!("nominatim_geocoded location={} lat={} lon={}", place, lat, lon);
        Ok(Some(at))
    }
}
