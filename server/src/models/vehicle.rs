use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::member::non_empty;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2030;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub member_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub license_plate: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A vehicle joined with its owner's name, as shown in the registry.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VehicleListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub owner_first_name: String,
    pub owner_last_name: String,
}

/// Payload for registering or editing a vehicle.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleInput {
    #[validate(length(min = 1, message = "Please select a vehicle make"))]
    pub make: String,
    #[validate(length(min = 1, message = "Please enter a vehicle model"))]
    pub model: String,
    #[validate(range(min = 1900, max = 2030, message = "Please enter a valid year between 1900 and 2030"))]
    pub year: i32,
    #[validate(length(min = 1, message = "Please enter a vehicle color"))]
    pub color: String,
    #[validate(length(min = 1, message = "Please enter a license plate"))]
    pub license_plate: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl VehicleInput {
    /// Trims every field and upper-cases the plate so duplicates compare equal.
    pub fn normalized(self) -> Self {
        Self {
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            year: self.year,
            color: self.color.trim().to_string(),
            license_plate: self.license_plate.trim().to_uppercase(),
            description: non_empty(self.description),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
}
