//! Rides, ride types and the fare table

use crate::core::entity::{EntityId, EntitySchema, SortField};
use crate::core::error::BackendError;
use crate::core::feed::{ActivityKind, IntoActivity};
use crate::core::field::{FieldKind, FieldValue};
use crate::core::service::CollectionService;
use crate::core::sort::SortDirection::{Asc, Desc};
use crate::core::stats::{Aggregate, count_where, mean_positive, round_to, sum_by};
use crate::core::validation::filters::trim;
use crate::core::validation::validators::{in_list, positive, required, string_length};
use crate::core::validation::{FieldRules, Form, FormRules};
use crate::entities::{RatingRequest, null_as_default};
use crate::{impl_entity, wire_enum};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Ride lifecycle
    RideStatus {
        Requested => "REQUESTED",
        Confirmed => "CONFIRMED",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl RideStatus {
    /// Booked and not finished yet
    pub fn is_active(&self) -> bool {
        matches!(self, RideStatus::Confirmed | RideStatus::InProgress)
    }
}

wire_enum! {
    /// Service level, which sets the fare
    RideType {
        Economy => "ECONOMY",
        Premium => "PREMIUM",
        Luxury => "LUXURY",
    }
}

impl RideType {
    /// Flat part of the fare; unknown types price as economy
    pub fn base_fare(&self) -> f64 {
        match self {
            RideType::Premium => 3.50,
            RideType::Luxury => 5.00,
            RideType::Economy | RideType::Other(_) => 2.50,
        }
    }

    pub fn price_per_mile(&self) -> f64 {
        match self {
            RideType::Premium => 2.00,
            RideType::Luxury => 3.00,
            RideType::Economy | RideType::Other(_) => 1.50,
        }
    }
}

/// `base + distance * per_mile`, rounded to cents
pub fn estimate_fare(ride_type: &RideType, distance: f64) -> f64 {
    round_to(ride_type.base_fare() + distance * ride_type.price_per_mile(), 2)
}

/// Fare preview shown before booking, computed locally or by
/// `POST /payments/calculate-fare`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FareQuote {
    pub ride_type: RideType,
    #[serde(deserialize_with = "null_as_default")]
    pub distance: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub base_fare: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub price_per_mile: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub estimated_fare: f64,
    /// Minutes, at roughly 3.5 minutes per mile
    pub estimated_duration: i64,
}

impl FareQuote {
    pub fn new(ride_type: RideType, distance: f64) -> Self {
        Self {
            base_fare: ride_type.base_fare(),
            price_per_mile: ride_type.price_per_mile(),
            estimated_fare: estimate_fare(&ride_type, distance),
            estimated_duration: (distance * 3.5).trunc() as i64,
            ride_type,
            distance,
        }
    }
}

/// Ride record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ride {
    pub id: Option<EntityId>,
    #[serde(deserialize_with = "null_as_default")]
    pub customer_id: EntityId,
    pub driver_id: Option<EntityId>,
    pub customer_name: Option<String>,
    pub driver_name: Option<String>,
    pub pickup_location: String,
    pub destination_location: String,
    pub status: RideStatus,
    pub ride_type: RideType,
    pub estimated_fare: Option<f64>,
    pub actual_fare: Option<f64>,
    pub distance: Option<f64>,
    pub estimated_duration: Option<i64>,
    pub actual_duration: Option<i64>,
    pub driver_rating: Option<f64>,
    pub customer_rating: Option<f64>,
    pub pickup_time: Option<String>,
    pub completion_time: Option<String>,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
}

pub static RIDE_SCHEMA: EntitySchema = EntitySchema {
    category_field: Some("rideType"),
    rating_field: Some("driverRating"),
    location_field: Some("pickupLocation"),
    search_fields: &[
        "pickupLocation",
        "destinationLocation",
        "customerName",
        "driverName",
    ],
    sort_fields: &[
        SortField::new("createdDate", FieldKind::Date, Desc),
        SortField::new("estimatedFare", FieldKind::Number, Desc),
        SortField::new("distance", FieldKind::Number, Desc),
        SortField::new("driverRating", FieldKind::Number, Desc),
        SortField::new("status", FieldKind::Text, Asc),
        SortField::new("rideType", FieldKind::Text, Asc),
    ],
    default_sort: "createdDate",
};

impl Ride {
    fn lookup(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => self.id.map_or(FieldValue::Null, FieldValue::Integer),
            "customerId" => FieldValue::Integer(self.customer_id),
            "driverId" => self.driver_id.map_or(FieldValue::Null, FieldValue::Integer),
            "customerName" => FieldValue::opt_text(self.customer_name.as_deref()),
            "driverName" => FieldValue::opt_text(self.driver_name.as_deref()),
            "pickupLocation" => FieldValue::text(&self.pickup_location),
            "destinationLocation" => FieldValue::text(&self.destination_location),
            "status" => FieldValue::text(self.status.as_str()),
            "rideType" => FieldValue::text(self.ride_type.as_str()),
            "estimatedFare" => FieldValue::opt_float(self.estimated_fare),
            "actualFare" => FieldValue::opt_float(self.actual_fare),
            "distance" => FieldValue::opt_float(self.distance),
            "driverRating" => FieldValue::opt_float(self.driver_rating),
            "customerRating" => FieldValue::opt_float(self.customer_rating),
            "createdDate" => FieldValue::opt_text(self.created_date.as_deref()),
            _ => return None,
        };
        Some(value)
    }

    /// What the customer paid, or is expected to pay
    pub fn fare(&self) -> f64 {
        self.actual_fare.or(self.estimated_fare).unwrap_or(0.0)
    }

    pub fn is_completed(&self) -> bool {
        self.status == RideStatus::Completed
    }
}

impl_entity!(Ride, "rides", "ride", RIDE_SCHEMA, Ride::lookup);

/// Ride history counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub cancelled: usize,
    pub total_spent: f64,
    pub average_rating: f64,
}

impl Aggregate for Ride {
    type Stats = RideStats;

    fn aggregate(items: &[Self], _now: DateTime<FixedOffset>) -> RideStats {
        RideStats {
            total: items.len(),
            completed: count_where(items, Ride::is_completed),
            active: count_where(items, |r| r.status.is_active()),
            cancelled: count_where(items, |r| r.status == RideStatus::Cancelled),
            total_spent: round_to(sum_by(items, Ride::is_completed, Ride::fare), 2),
            average_rating: round_to(mean_positive(items.iter().map(|r| r.driver_rating)), 1),
        }
    }
}

impl IntoActivity for Ride {
    const KIND: ActivityKind = ActivityKind::Ride;

    fn title(&self) -> String {
        "Ride Completed".to_string()
    }

    fn description(&self) -> String {
        let customer = self.customer_name.as_deref().unwrap_or("Customer");
        format!("{} → {}", customer, self.destination_location)
    }

    fn amount(&self) -> Option<f64> {
        self.estimated_fare
    }
}

/// Payload of `POST /rides`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRideRequest {
    pub customer_id: EntityId,
    pub pickup_location: String,
    pub destination_location: String,
    pub ride_type: RideType,
}

impl CreateRideRequest {
    /// Fare preview for a known trip distance
    pub fn quote(&self, distance: f64) -> FareQuote {
        FareQuote::new(self.ride_type.clone(), distance)
    }
}

impl Form for CreateRideRequest {
    fn rules(_today: NaiveDate) -> FormRules {
        let place = |path: &'static str| {
            FieldRules::new(path)
                .filter(trim())
                .validate(required())
                .validate(string_length(3, usize::MAX))
        };

        FormRules::new()
            .field(FieldRules::new("customerId").validate(positive()))
            .field(place("pickupLocation"))
            .field(place("destinationLocation"))
            .field(FieldRules::new("rideType").validate(in_list(RideType::wire_values())))
    }
}

/// Payload of `POST /payments/calculate-fare`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareRequest {
    pub pickup_location: String,
    pub destination_location: String,
    pub ride_type: RideType,
}

impl From<&CreateRideRequest> for FareRequest {
    fn from(request: &CreateRideRequest) -> Self {
        Self {
            pickup_location: request.pickup_location.clone(),
            destination_location: request.destination_location.clone(),
            ride_type: request.ride_type.clone(),
        }
    }
}

impl Form for FareRequest {
    fn rules(_today: NaiveDate) -> FormRules {
        FormRules::new()
            .field(FieldRules::new("pickupLocation").filter(trim()).validate(required()))
            .field(
                FieldRules::new("destinationLocation")
                    .filter(trim())
                    .validate(required()),
            )
            .field(
                FieldRules::new("rideType")
                    .validate(required())
                    .validate(in_list(RideType::wire_values())),
            )
    }
}

/// Vehicle summary in a booking confirmation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleDetails {
    pub model: String,
    pub plate_number: String,
    pub color: String,
}

/// Assigned driver in a booking confirmation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriverDetails {
    pub id: Option<EntityId>,
    pub name: String,
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub rating: f64,
    pub vehicle: Option<VehicleDetails>,
}

/// Response of `POST /rides`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RideBooking {
    pub ride_id: Option<EntityId>,
    pub customer_name: Option<String>,
    pub driver_name: Option<String>,
    pub pickup_location: String,
    pub destination_location: String,
    pub status: RideStatus,
    pub ride_type: RideType,
    pub estimated_fare: Option<f64>,
    pub distance: Option<f64>,
    pub estimated_duration: Option<i64>,
    pub booking_time: Option<String>,
    pub message: Option<String>,
    pub driver_details: Option<DriverDetails>,
}

impl RideBooking {
    /// The booked ride as a list entry
    pub fn to_ride(&self, customer_id: EntityId) -> Ride {
        Ride {
            id: self.ride_id,
            customer_id,
            driver_id: self.driver_details.as_ref().and_then(|d| d.id),
            customer_name: self.customer_name.clone(),
            driver_name: self.driver_name.clone(),
            pickup_location: self.pickup_location.clone(),
            destination_location: self.destination_location.clone(),
            status: self.status.clone(),
            ride_type: self.ride_type.clone(),
            estimated_fare: self.estimated_fare,
            distance: self.distance,
            estimated_duration: self.estimated_duration,
            created_date: self.booking_time.clone(),
            ..Ride::default()
        }
    }
}

/// Ride endpoints beyond the collection fetch
#[async_trait]
pub trait RideService: CollectionService<Ride> {
    /// Rides of one customer (`GET /rides?customerId=N`)
    async fn fetch_for_customer(&self, customer_id: EntityId) -> Result<Vec<Ride>, BackendError>;

    async fn book_ride(&self, request: &CreateRideRequest) -> Result<RideBooking, BackendError>;

    async fn rate_ride(&self, id: EntityId, request: &RatingRequest) -> Result<Ride, BackendError>;
}
