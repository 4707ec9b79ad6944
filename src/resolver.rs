use async_trait::async_trait;
use log::{ info, warn };
use std::sync::Arc;

use crate::assistant::ConversationalAi;
use crate::config::prompt::PromptConfig;
use crate::directory::DirectoryFallback;
use crate::geo::{ Geocoder, ProximitySearch };
use crate::models::nearby::{ Coordinates, FacilityKind, NearbyResult };

/// Pulls a place name out of a free-form nearby question.
#[async_trait]
pub trait PlaceExtractor: Send + Sync {
    async fn extract_place(&self, text: &str) -> Option<String>;
}

#[async_trait]
impl PlaceExtractor for ConversationalAi {
    async fn extract_place(&self, text: &str) -> Option<String> {
        self.extract_nearby_location(text).await
    }
}

/// Where the results in a [`NearbyResolution`] were found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocationDescriptor {
    UserLocation,
    Place(String),
    Pincode(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NearbyResolution {
    pub results: Vec<NearbyResult>,
    pub location: LocationDescriptor,
}

/// Resolves nearby questions through live GPS search when the caller sent a
/// position, otherwise the place named in the text, then the local directory.
/// Stage failures are logged and fall through; resolution itself never fails.
pub struct NearbyResolver {
    proximity: Arc<dyn ProximitySearch>,
    geocoder: Arc<dyn Geocoder>,
    extractor: Arc<dyn PlaceExtractor>,
    directory: DirectoryFallback,
    max_results: usize,
}

impl NearbyResolver {
    pub fn new(
        proximity: Arc<dyn ProximitySearch>,
        geocoder: Arc<dyn Geocoder>,
        extractor: Arc<dyn PlaceExtractor>,
        directory: DirectoryFallback,
        max_results: usize
    ) -> Self {
        Self { proximity, geocoder, extractor, directory, max_results }
    }

    pub fn directory(&self) -> &DirectoryFallback {
        &self.directory
    }

    pub async fn resolve(
        &self,
        text: &str,
        kind: FacilityKind,
        coords: Option<Coordinates>,
        pincode: &str
    ) -> NearbyResolution {
        if kind.is_medical() {
            match coords {
                Some(at) => {
                    if let Some(results) = self.live_search(at, kind, "gps").await {
                        return NearbyResolution { results, location: LocationDescriptor::UserLocation };
                    }
                }
                // Place names are only consulted when the caller sent no position.
                None => {
                    if let Some(place) = self.extractor.extract_place(text).await {
                        if let Some(results) = self.search_place(&place, kind).await {
                            return NearbyResolution { results, location: LocationDescriptor::Place(place) };
                        }
                    }
                }
            }
        }

        let results = self.directory.search(pincode, kind).await;
        info!(
            "nearby_directory_fallback pincode={} kind={} results={}",
            pincode,
            kind.as_str(),
            results.len()
        );
        NearbyResolution { results, location: LocationDescriptor::Pincode(pincode.to_string()) }
    }

    async fn search_place(&self, place: &str, kind: FacilityKind) -> Option<Vec<NearbyResult>> {
        let at = match self.geocoder.geocode(place).await {
            Ok(Some(at)) => at,
            Ok(None) => {
                info!("nearby_place_not_geocoded place={}", place);
                return None;
            }
            Err(e) => {
                warn!("geocode_failed place={} error={}", place, e);
                return None;
            }
        };
        self.live_search(at, kind, "place").await
    }

    /// `None` when the search failed or found nothing.
    async fn live_search(
        &self,
        at: Coordinates,
        kind: FacilityKind,
        stage: &str
    ) -> Option<Vec<NearbyResult>> {
        match self.proximity.search_nearby(at, kind, self.max_results).await {
            Ok(mut results) if !results.is_empty() => {
                results.truncate(self.max_results);
                info!("nearby_live_hit stage={} kind={} results={}", stage, kind.as_str(), results.len());
                Some(results)
            }
            Ok(_) => {
                info!("nearby_live_empty stage={} kind={}", stage, kind.as_str());
                None
            }
            Err(e) => {
                warn!(
                    "proximity_search_failed stage={} lat={} lon={} kind={} error={}",
                    stage,
                    at.lat,
                    at.lon,
                    kind.as_str(),
                    e
                );
                None
            }
        }
    }
}

/// Renders a resolution as the localized reply text.
pub fn format_nearby_reply(
    prompts: &PromptConfig,
    language: &str,
    kind: FacilityKind,
    resolution: &NearbyResolution
) -> String {
    let Some(template) = prompts.nearby_template(language) else {
        return String::new();
    };
    let kind_label = template.kinds
        .get(kind.as_str())
        .map(|s| s.as_str())
        .unwrap_or(kind.as_str());
    let location = match &resolution.location {
        LocationDescriptor::UserLocation => template.your_location.clone(),
        LocationDescriptor::Place(place) => place.clone(),
        LocationDescriptor::Pincode(pincode) => template.pincode_location.replace("{pincode}", pincode),
    };

    if resolution.results.is_empty() {
        return template.not_found.replace("{kind}", kind_label).replace("{location}", &location);
    }

    let mut reply = template.found_header.replace("{kind}", kind_label).replace("{location}", &location);
    for (i, result) in resolution.results.iter().enumerate() {
        let mut line = format!("{}. {}", i + 1, result.name);
        for detail in [&result.address, &result.phone].into_iter().flatten() {
            line.push_str(" - ");
            line.push_str(detail);
        }
        reply.push('\n');
        reply.push_str(&line);
    }
    reply
}
