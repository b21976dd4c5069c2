//! Drivers, their vehicle and location

use crate::core::entity::{EntityId, EntitySchema, SortField};
use crate::core::error::BackendError;
use crate::core::feed::{ActivityKind, IntoActivity};
use crate::core::field::{FieldFormat, FieldKind, FieldValue};
use crate::core::service::CollectionService;
use crate::core::sort::SortDirection::{Asc, Desc};
use crate::core::stats::{Aggregate, count_where, mean_positive, percentage, round_to};
use crate::core::validation::filters::{lowercase, trim, uppercase};
use crate::core::validation::validators::{format, in_list, range, required, string_length};
use crate::core::validation::{FieldRules, Form, FormRules};
use crate::entities::{RatingRequest, null_as_default};
use crate::{impl_entity, wire_enum};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Availability of a driver
    DriverStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Busy => "BUSY",
        Offline => "OFFLINE",
        Suspended => "SUSPENDED",
    }
}

/// Vehicle registered to a driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vehicle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub model: String,
    pub plate_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub year: i32,
    pub color: String,
}

/// Last known position of a driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub longitude: f64,
    pub address: String,
}

/// Driver record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Driver {
    pub id: Option<EntityId>,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub rating: f64,
    pub status: DriverStatus,
    pub vehicle: Option<Vehicle>,
    pub location: Option<Location>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_rides: i64,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
}

pub static DRIVER_SCHEMA: EntitySchema = EntitySchema {
    category_field: None,
    rating_field: Some("rating"),
    location_field: Some("location"),
    search_fields: &[
        "name",
        "email",
        "phone",
        "vehicleModel",
        "plateNumber",
        "vehicleColor",
    ],
    sort_fields: &[
        SortField::new("name", FieldKind::Text, Asc),
        SortField::new("rating", FieldKind::Number, Desc),
        SortField::new("status", FieldKind::Text, Asc),
        SortField::new("totalRides", FieldKind::Number, Desc),
        SortField::new("createdDate", FieldKind::Date, Desc),
    ],
    default_sort: "createdDate",
};

impl Driver {
    fn lookup(&self, field: &str) -> Option<FieldValue> {
        let vehicle = self.vehicle.as_ref();
        let location = self.location.as_ref();
        let value = match field {
            "id" => self.id.map_or(FieldValue::Null, FieldValue::Integer),
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "phone" => FieldValue::text(&self.phone),
            "rating" => FieldValue::Float(self.rating),
            "status" => FieldValue::text(self.status.as_str()),
            "totalRides" => FieldValue::Integer(self.total_rides),
            "createdDate" => FieldValue::opt_text(self.created_date.as_deref()),
            "vehicleModel" => FieldValue::opt_text(vehicle.map(|v| v.model.as_str())),
            "plateNumber" => FieldValue::opt_text(vehicle.map(|v| v.plate_number.as_str())),
            "vehicleColor" => FieldValue::opt_text(vehicle.map(|v| v.color.as_str())),
            "vehicleYear" => vehicle.map_or(FieldValue::Null, |v| FieldValue::Integer(v.year.into())),
            "location" => FieldValue::opt_text(location.map(|l| l.address.as_str())),
            "latitude" => FieldValue::opt_float(location.map(|l| l.latitude)),
            "longitude" => FieldValue::opt_float(location.map(|l| l.longitude)),
            _ => return None,
        };
        Some(value)
    }

    /// Whether the driver can be offered rides
    pub fn is_online(&self) -> bool {
        matches!(self.status, DriverStatus::Active | DriverStatus::Busy)
    }
}

impl_entity!(Driver, "drivers", "driver", DRIVER_SCHEMA, Driver::lookup);

/// Driver management counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStats {
    pub total: usize,
    pub active: usize,
    pub busy: usize,
    pub offline: usize,
    pub inactive: usize,
    pub suspended: usize,
    /// Mean over rated drivers, two decimals
    pub average_rating: f64,
    pub total_rides: i64,
    /// Share of active or busy drivers, one decimal
    pub online_percentage: f64,
}

impl Aggregate for Driver {
    type Stats = DriverStats;

    fn aggregate(items: &[Self], _now: DateTime<FixedOffset>) -> DriverStats {
        let with = |status: DriverStatus| count_where(items, |d| d.status == status);
        let online = count_where(items, Driver::is_online);

        DriverStats {
            total: items.len(),
            active: with(DriverStatus::Active),
            busy: with(DriverStatus::Busy),
            offline: with(DriverStatus::Offline),
            inactive: with(DriverStatus::Inactive),
            suspended: with(DriverStatus::Suspended),
            average_rating: round_to(mean_positive(items.iter().map(|d| Some(d.rating))), 2),
            total_rides: items.iter().map(|d| d.total_rides).sum(),
            online_percentage: round_to(percentage(online, items.len()), 1),
        }
    }
}

impl IntoActivity for Driver {
    const KIND: ActivityKind = ActivityKind::Driver;

    fn title(&self) -> String {
        "New Driver Registered".to_string()
    }

    fn description(&self) -> String {
        format!("{} joined as a driver", self.name)
    }
}

/// Vehicle section of the driver forms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInput {
    pub model: String,
    pub plate_number: String,
    pub year: i32,
    pub color: String,
}

/// Location section of the driver forms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// Payload of `POST /drivers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriverRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub vehicle: VehicleInput,
    pub location: LocationInput,
}

/// Payload of `PUT /drivers/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDriverRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub status: DriverStatus,
    pub vehicle: VehicleInput,
    pub location: LocationInput,
}

impl UpdateDriverRequest {
    /// Prefill the edit form from an existing driver
    pub fn from_driver(driver: &Driver) -> Self {
        let vehicle = driver.vehicle.clone().unwrap_or_default();
        let location = driver.location.clone().unwrap_or_default();
        Self {
            name: driver.name.clone(),
            phone: driver.phone.clone(),
            email: driver.email.clone(),
            status: driver.status.clone(),
            vehicle: VehicleInput {
                model: vehicle.model,
                plate_number: vehicle.plate_number,
                year: vehicle.year,
                color: vehicle.color,
            },
            location: LocationInput {
                latitude: location.latitude,
                longitude: location.longitude,
                address: location.address,
            },
        }
    }
}

fn driver_rules(current_year: i32) -> FormRules {
    FormRules::new()
        .field(
            FieldRules::new("name")
                .filter(trim())
                .validate(required())
                .validate(string_length(0, 100)),
        )
        .field(
            FieldRules::new("phone")
                .filter(trim())
                .validate(required())
                .validate(format(FieldFormat::Phone)),
        )
        .field(
            FieldRules::new("email")
                .filter(trim())
                .filter(lowercase())
                .validate(required())
                .validate(format(FieldFormat::Email)),
        )
        .field(
            FieldRules::new("vehicle.model")
                .filter(trim())
                .validate(required())
                .validate(string_length(0, 50)),
        )
        .field(
            FieldRules::new("vehicle.plateNumber")
                .filter(trim())
                .filter(uppercase())
                .validate(required())
                .validate(string_length(0, 20)),
        )
        .field(
            FieldRules::new("vehicle.year").validate(range(1990.0, f64::from(current_year))),
        )
        .field(
            FieldRules::new("vehicle.color")
                .filter(trim())
                .validate(required())
                .validate(string_length(0, 30)),
        )
        .field(FieldRules::new("location.latitude").validate(range(-90.0, 90.0)))
        .field(FieldRules::new("location.longitude").validate(range(-180.0, 180.0)))
        .field(
            FieldRules::new("location.address")
                .filter(trim())
                .validate(required())
                .validate(string_length(0, 200)),
        )
}

impl Form for CreateDriverRequest {
    fn rules(today: NaiveDate) -> FormRules {
        driver_rules(today.year())
    }
}

impl Form for UpdateDriverRequest {
    fn rules(today: NaiveDate) -> FormRules {
        driver_rules(today.year()).field(
            FieldRules::new("status")
                .validate(required())
                .validate(in_list(DriverStatus::wire_values())),
        )
    }
}

/// Driver endpoints beyond the collection fetch
#[async_trait]
pub trait DriverService: CollectionService<Driver> {
    async fn create_driver(&self, request: &CreateDriverRequest) -> Result<Driver, BackendError>;

    async fn update_driver(
        &self,
        id: EntityId,
        request: &UpdateDriverRequest,
    ) -> Result<Driver, BackendError>;

    async fn update_driver_status(
        &self,
        id: EntityId,
        status: &DriverStatus,
    ) -> Result<Driver, BackendError>;

    async fn rate_driver(
        &self,
        id: EntityId,
        request: &RatingRequest,
    ) -> Result<Driver, BackendError>;

    async fn delete_driver(&self, id: EntityId) -> Result<(), BackendError>;
}
