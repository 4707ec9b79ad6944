use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;

use super::chat::Intent;
use super::nearby::{ Coordinates, NearbyResult };

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "audioS3Key")]
    pub audio_key: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub low_bandwidth: bool,
    #[serde(default)]
    pub latitude: Option<JsonValue>,
    #[serde(default)]
    pub longitude: Option<JsonValue>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub generate_summary: bool,
}

impl QueryRequest {
    pub fn text(text: &str, language: &str) -> Self {
        Self {
            text: text.to_string(),
            language: Some(language.to_string()),
            ..Default::default()
        }
    }

    /// GPS from the body. Numbers and numeric strings are accepted; anything
    /// else yields `None` and the request continues without coordinates.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let lat = self.latitude.as_ref().and_then(json_number)?;
        let lon = self.longitude.as_ref().and_then(json_number)?;
        Coordinates::new(lat, lon)
    }
}

fn json_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub conversation_id: String,
    pub intent: Intent,
    pub text: String,
    pub user_text: String,
    pub audio_url: Option<String>,
    pub is_emergency: bool,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_summary: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DirectoryRequest {
    #[serde(default)]
    pub pincode: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct DirectoryResponse {
    pub pincode: String,
    pub facilities: Vec<NearbyResult>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
