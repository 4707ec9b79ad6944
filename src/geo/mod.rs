pub mod nominatim;
pub mod overpass;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::models::nearby::{ Coordinates, FacilityKind, NearbyResult };

pub use nominatim::NominatimClient;
pub use overpass::OverpassClient;

/// Free-text place name to coordinates. `Ok(None)` means the service had no match.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>, BoxError>;
}

/// Live search for amenities of `kind` around a point.
#[async_trait]
pub trait ProximitySearch: Send + Sync {
    async fn search_nearby(
        &self,
        at: Coordinates,
        kind: FacilityKind,
        max_results: usize
    ) -> Result<Vec<NearbyResult>, BoxError>;
}
