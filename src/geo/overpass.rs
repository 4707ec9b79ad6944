use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::ProximitySearch;
use crate::error::BoxError;
use crate::models::nearby::{ Coordinates, FacilityKind, NearbyResult, ResultSource };

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl OverpassElement {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn into_result(self) -> NearbyResult {
        let name = self
            .tag("name")
            .or_else(|| self.tag("name:en"))
            .or_else(|| self.tag("name:hi"))
            .unwrap_or("Unknown")
            .to_string();
        let phone = self.tag("phone").or_else(|| self.tag("contact:phone")).map(str::to_string);
        let parts: Vec<&str> = ["addr:housenumber", "addr:street", "addr:city"]
            .iter()
            .filter_map(|k| self.tag(k))
            .collect();
        let address = if parts.is_empty() {
            self.tag("addr:full").map(str::to_string)
        } else {
            Some(parts.join(" "))
        };
        NearbyResult {
            name,
            category: self.tag("amenity").unwrap_or_default().to_string(),
            phone,
            address,
            lat: self.lat,
            lon: self.lon,
            source: ResultSource::Osm,
        }
    }
}

/// Overpass QL query for `amenity` nodes around a point.
pub fn build_query(at: Coordinates, amenities: &[&str], radius_meters: u32) -> String {
    let nodes = amenities
        .iter()
        .map(|a| format!("  node[\"amenity\"=\"{}\"](around:{},{},{});", a, radius_meters, at.lat, at.lon))
        .collect::<Vec<_>>()
        .join("\n");
    format!("[out:json][timeout:10];\n(\n{}\n);\nout;", nodes)
}

pub struct OverpassClient {
    http: HttpClient,
    url: String,
    radius_meters: u32,
}

impl OverpassClient {
    pub fn new(
        url: &str,
        user_agent: &str,
        timeout_secs: u64,
        radius_meters: u32
    ) -> Result<Self, BoxError> {
        let http = HttpClient::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http, url: url.to_string(), radius_meters })
    }
}

#[async_trait]
impl ProximitySearch for OverpassClient {
    async fn search_nearby(
        &self,
        at: Coordinates,
        kind: FacilityKind,
        max_results: usize
    ) -> Result<Vec<NearbyResult>, BoxError> {
        let amenities = kind.categories();
        if amenities.is_empty() {
            return Ok(Vec::new());
        }
        let query = build_query(at, amenities, self.radius_meters);
        let response = self.http
            .post(&self.url)
            .form(&[("data", query.as_str())])
            .send().await?
            .error_for_status()?
            .json::<OverpassResponse>().await?;

        info!(
            "overpass_results lat={} lon={} kind={} count={}",
            at.lat,
            at.lon,
            kind.as_str(),
            response.elements.len()
        );
        Ok(
            response.elements
                .into_iter()
                .take(max_results)
                .map(OverpassElement::into_result)
                .collect()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_string_contains, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    fn kota() -> Coordinates {
        Coordinates::new(25.2138, 75.8648).unwrap()
    }

    fn client(server: &MockServer) -> OverpassClient {
        OverpassClient::new(&format!("{}/api/interpreter", server.uri()), "GramSathi/test", 12, 5000).unwrap()
    }

    #[test]
    fn query_lists_one_node_clause_per_amenity() {
        let query = build_query(kota(), FacilityKind::Facilities.categories(), 5000);
        assert_eq!(query.matches("node[\"amenity\"=").count(), 3);
        assert!(query.contains("(around:5000,25.2138,75.8648)"));
        assert!(query.starts_with("[out:json]"));
    }

    #[tokio::test]
    async fn parses_elements_with_tag_fallbacks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/interpreter"))
            .and(body_string_contains("amenity"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(
                    json!({
                        "elements": [
                            {"lat": 25.21, "lon": 75.86, "tags": {"amenity": "clinic", "name": "City Clinic", "phone": "9000000001", "addr:street": "Station Road", "addr:city": "Kota"}},
                            {"lat": 25.22, "lon": 75.87, "tags": {"amenity": "clinic", "name:hi": "शहर क्लीनिक", "contact:phone": "9000000002", "addr:full": "Near Bus Stand"}},
                            {"lat": 25.23, "lon": 75.88, "tags": {"amenity": "clinic"}}
                        ]
                    })
                )
            )
            .mount(&server).await;

        let results = client(&server).search_nearby(kota(), FacilityKind::Clinic, 5).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name, "City Clinic");
        assert_eq!(results[0].phone.as_deref(), Some("9000000001"));
        assert_eq!(results[0].address.as_deref(), Some("Station Road Kota"));
        assert_eq!(results[0].source, ResultSource::Osm);
        assert_eq!(results[1].name, "शहर क्लीनिक");
        assert_eq!(results[1].phone.as_deref(), Some("9000000002"));
        assert_eq!(results[1].address.as_deref(), Some("Near Bus Stand"));
        assert_eq!(results[2].name, "Unknown");
        assert_eq!(results[2].category, "clinic");
    }

    #[tokio::test]
    async fn respects_max_results() {
        let server = MockServer::start().await;
        let elements: Vec<_> = (0..8)
            .map(|i| json!({"lat": 25.2, "lon": 75.8, "tags": {"amenity": "pharmacy", "name": format!("P{}", i)}}))
            .collect();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": elements})))
            .mount(&server).await;

        let results = client(&server).search_nearby(kota(), FacilityKind::Pharmacy, 3).await.unwrap();
        let names: Vec<_> = results.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["P0", "P1", "P2"]);
    }

    #[tokio::test]
    async fn empty_and_failed_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("hospital"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": []})))
            .mount(&server).await;
        Mock::given(method("POST"))
            .and(body_string_contains("pharmacy"))
            .respond_with(ResponseTemplate::new(504))
            .mount(&server).await;

        let overpass = client(&server);
        assert!(overpass.search_nearby(kota(), FacilityKind::Hospital, 5).await.unwrap().is_empty());
        assert!(overpass.search_nearby(kota(), FacilityKind::Pharmacy, 5).await.is_err());
    }

    #[tokio::test]
    async fn shops_are_never_sent_to_the_map_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": []})))
            .expect(0)
            .mount(&server).await;

        let results = client(&server).search_nearby(kota(), FacilityKind::Shops, 5).await.unwrap();
        assert!(results.is_empty());
    }
}
