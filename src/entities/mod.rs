//! The four entity kinds of the portal and their request payloads
//!
//! Each kind declares its static schema, its stats aggregation, its feed
//! rendering and the service trait covering its REST endpoints.

pub mod macros;

pub mod driver;
pub mod payment;
pub mod ride;
pub mod user;

pub use driver::{Driver, DriverStats, DriverStatus};
pub use payment::{Payment, PaymentMethod, PaymentStats, PaymentStatus};
pub use ride::{Ride, RideStats, RideStatus, RideType};
pub use user::{User, UserRole, UserStats, UserStatus};

use crate::core::entity::EntityId;
use crate::core::validation::validators::{range, required};
use crate::core::validation::{FieldRules, Form, FormRules};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as the type's default.
///
/// The backend sends `null` for unset numeric columns such as a new
/// driver's rating.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A 1 to 5 star rating, for a driver or for a finished ride
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<EntityId>,
}

impl RatingRequest {
    pub fn new(rating: f64) -> Self {
        Self {
            rating,
            ride_id: None,
        }
    }

    pub fn for_ride(rating: f64, ride_id: EntityId) -> Self {
        Self {
            rating,
            ride_id: Some(ride_id),
        }
    }
}

impl Form for RatingRequest {
    fn rules(_today: NaiveDate) -> FormRules {
        FormRules::new().field(
            FieldRules::new("rating")
                .validate(required())
                .validate(range(1.0, 5.0)),
        )
    }
}
