use serde::{ Deserialize, Serialize };

pub const MEDICAL_CATEGORIES: [&str; 3] = ["clinic", "pharmacy", "hospital"];

/// What a "nearby" question is looking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilityKind {
    Clinic,
    Pharmacy,
    Hospital,
    /// Union of clinic, pharmacy and hospital.
    Facilities,
    /// Retail listings only; never medical categories.
    Shops,
}

impl FacilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityKind::Clinic => "clinic",
            FacilityKind::Pharmacy => "pharmacy",
            FacilityKind::Hospital => "hospital",
            FacilityKind::Facilities => "facilities",
            FacilityKind::Shops => "shops",
        }
    }

    pub fn is_medical(&self) -> bool {
        !matches!(self, FacilityKind::Shops)
    }

    /// OSM `amenity` values and directory categories this kind covers.
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            FacilityKind::Clinic => &["clinic"],
            FacilityKind::Pharmacy => &["pharmacy"],
            FacilityKind::Hospital => &["hospital"],
            FacilityKind::Facilities => &["clinic", "hospital", "pharmacy"],
            FacilityKind::Shops => &[],
        }
    }

    pub fn accepts_category(&self, category: Option<&str>) -> bool {
        match self {
            FacilityKind::Shops => category.map_or(true, |c| !MEDICAL_CATEGORIES.contains(&c)),
            _ => category.map_or(false, |c| self.categories().contains(&c)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Osm,
    Directory,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResult {
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub source: ResultSource,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid =
            lat.is_finite() &&
            lon.is_finite() &&
            (-90.0..=90.0).contains(&lat) &&
            (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }
}
