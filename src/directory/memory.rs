use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use super::{ DirectoryStore, Listing, UserProfile };
use crate::error::BoxError;

#[derive(Deserialize, Default)]
struct DirectorySeed {
    #[serde(default)]
    listings: Vec<Listing>,
    #[serde(default)]
    users: Vec<UserProfile>,
}

/// Read-only directory held in memory, for local development and tests.
pub struct MemoryDirectoryStore {
    by_pincode: HashMap<String, Vec<Listing>>,
    users: HashMap<String, UserProfile>,
}

impl MemoryDirectoryStore {
    pub fn new(listings: Vec<Listing>, users: Vec<UserProfile>) -> Self {
        let mut by_pincode: HashMap<String, Vec<Listing>> = HashMap::new();
        for listing in listings {
            by_pincode.entry(listing.pincode.clone()).or_default().push(listing);
        }
        let users = users
            .into_iter()
            .map(|u| (u.user_id.clone(), u))
            .collect();
        Self { by_pincode, users }
    }

    pub fn from_file(path: &str) -> Result<Self, BoxError> {
        let content = fs
            ::read_to_string(path)
            .map_err(|e| format!("Failed to read directory seed '{}': {}", path, e))?;
        let seed: DirectorySeed = serde_json
            ::from_str(&content)
            .map_err(|e| format!("Failed to parse directory seed '{}': {}", path, e))?;
        Ok(Self::new(seed.listings, seed.users))
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn listings_by_pincode(&self, pincode: &str) -> Result<Vec<Listing>, BoxError> {
        Ok(self.by_pincode.get(pincode).cloned().unwrap_or_default())
    }

    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, BoxError> {
        Ok(self.users.get(user_id).cloned())
    }
}
