pub mod memory;
pub mod redis;

use async_trait::async_trait;
use log::{ info, warn };
use serde::{ Deserialize, Serialize };
use std::sync::Arc;

use crate::cli::Args;
use crate::error::BoxError;
use crate::models::nearby::{ FacilityKind, NearbyResult, ResultSource };

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Pending,
    Approved,
    Suspended,
}

/// A registered shop or health facility in the local directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub shop_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// `clinic`, `pharmacy`, `hospital`, or absent for general shops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub pincode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon", skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub status: ListingStatus,
}

impl Listing {
    pub fn matches(&self, kind: FacilityKind) -> bool {
        if !kind.accepts_category(self.category.as_deref()) {
            return false;
        }
        kind.is_medical() || self.status == ListingStatus::Approved
    }

    pub fn to_result(&self) -> NearbyResult {
        NearbyResult {
            name: self.name.clone(),
            category: self.category.clone().unwrap_or_else(|| "shop".to_string()),
            phone: self.phone.clone(),
            address: self.address.clone(),
            lat: self.lat,
            lon: self.lng,
            source: ResultSource::Directory,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Listings registered under `pincode`, in registration order.
    async fn listings_by_pincode(&self, pincode: &str) -> Result<Vec<Listing>, BoxError>;

    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, BoxError>;
}

pub fn create_directory_store(args: &Args) -> Result<Arc<dyn DirectoryStore>, BoxError> {
    match args.store_type.to_lowercase().as_str() {
        "redis" => {
            let store = redis::RedisDirectoryStore::new(&args.redis_url, &args.redis_prefix)?;
            Ok(Arc::new(store))
        }
        "memory" => {
            let store = memory::MemoryDirectoryStore::from_file(&args.directory_seed_path)?;
            info!("Directory seeded from {}", args.directory_seed_path);
            Ok(Arc::new(store))
        }
        other => Err(format!("Unsupported directory store type: {}", other).into()),
    }
}

/// Last stage of nearby resolution: the locally seeded directory.
#[derive(Clone)]
pub struct DirectoryFallback {
    store: Arc<dyn DirectoryStore>,
    max_results: usize,
}

impl DirectoryFallback {
    pub fn new(store: Arc<dyn DirectoryStore>, max_results: usize) -> Self {
        Self { store, max_results }
    }

    pub fn store(&self) -> &Arc<dyn DirectoryStore> {
        &self.store
    }

    /// Never fails: a store error is logged and reported as no listings.
    pub async fn search(&self, pincode: &str, kind: FacilityKind) -> Vec<NearbyResult> {
        let listings = match self.store.listings_by_pincode(pincode).await {
            Ok(listings) => listings,
            Err(e) => {
                warn!(
                    "directory_lookup_failed pincode={} kind={} error={}",
                    pincode,
                    kind.as_str(),
                    e
                );
                return Vec::new();
            }
        };
        listings
            .iter()
            .filter(|listing| listing.matches(kind))
            .take(self.max_results)
            .map(Listing::to_result)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory::MemoryDirectoryStore;

    fn listing(id: &str, category: Option<&str>, status: ListingStatus) -> Listing {
        Listing {
            shop_id: id.to_string(),
            name: format!("Listing {}", id),
            owner_name: None,
            phone: None,
            category: category.map(str::to_string),
            pincode: "324008".to_string(),
            address: None,
            lat: None,
            lng: None,
            status,
        }
    }

    #[tokio::test]
    async fn shops_are_approved_non_medical_listings() {
        let store = MemoryDirectoryStore::new(
            vec![
                listing("1", Some("pharmacy"), ListingStatus::Approved),
                listing("2", None, ListingStatus::Pending),
                listing("3", None, ListingStatus::Approved),
                listing("4", Some("grocery"), ListingStatus::Approved)
            ],
            Vec::new()
        );
        let fallback = DirectoryFallback::new(Arc::new(store), 5);

        let names: Vec<String> = fallback
            .search("324008", FacilityKind::Shops).await
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Listing 3", "Listing 4"]);
    }

    #[tokio::test]
    async fn facilities_union_is_capped_in_store_order() {
        let store = MemoryDirectoryStore::new(
            (0..8)
                .map(|i| {
                    let category = ["clinic", "hospital", "pharmacy"][i % 3];
                    listing(&i.to_string(), Some(category), ListingStatus::Approved)
                })
                .collect(),
            Vec::new()
        );
        let fallback = DirectoryFallback::new(Arc::new(store), 5);

        let results = fallback.search("324008", FacilityKind::Facilities).await;
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].name, "Listing 0");
        assert!(results.iter().all(|r| r.source == ResultSource::Directory));

        let hospitals = fallback.search("324008", FacilityKind::Hospital).await;
        assert!(hospitals.iter().all(|r| r.category == "hospital"));
        assert!(fallback.search("110001", FacilityKind::Clinic).await.is_empty());
    }

    #[test]
    fn seed_listing_shape_parses() {
        let json =
            r#"{"shopId":"s1","name":"Ramu Kirana Store","pincode":"324008","lat":25.2,"lng":75.8,"status":"approved"}"#;
        let parsed: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, ListingStatus::Approved);
        assert_eq!(parsed.to_result().category, "shop");
        assert_eq!(parsed.to_result().lon, Some(75.8));
    }
}
