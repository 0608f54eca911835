use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::member::non_empty;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Place {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub place_type: String,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub added_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Place {
    /// Location text copied onto events held here.
    pub fn event_location(&self) -> String {
        format!("{} - {}", self.name, self.address)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Type is required"))]
    pub place_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

impl PlaceInput {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            place_type: self.place_type.trim().to_string(),
            description: non_empty(self.description),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
