//! Payments and card details

use crate::core::entity::{EntityId, EntitySchema, SortField};
use crate::core::error::BackendError;
use crate::core::feed::{ActivityKind, IntoActivity};
use crate::core::field::{FieldFormat, FieldKind, FieldValue};
use crate::core::service::CollectionService;
use crate::core::sort::SortDirection::{Asc, Desc};
use crate::core::stats::{Aggregate, count_where, in_month, percentage, ratio, sum_by};
use crate::core::validation::filters::{blank_to_null, round_decimals, trim};
use crate::core::validation::validators::{
    format, in_list, min_value, positive, range, required,
};
use crate::core::validation::{FieldRules, Form, FormRules};
use crate::entities::null_as_default;
use crate::entities::ride::{FareQuote, FareRequest};
use crate::{impl_entity, wire_enum};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

wire_enum! {
    /// How a ride was paid
    PaymentMethod {
        CreditCard => "CREDIT_CARD",
        DebitCard => "DEBIT_CARD",
        DigitalWallet => "DIGITAL_WALLET",
        Cash => "CASH",
        Upi => "UPI",
    }
}

impl PaymentMethod {
    pub fn is_card(&self) -> bool {
        matches!(self, PaymentMethod::CreditCard | PaymentMethod::DebitCard)
    }
}

wire_enum! {
    /// Payment lifecycle
    PaymentStatus {
        Pending => "PENDING",
        Processing => "PROCESSING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
        Refunded => "REFUNDED",
    }
}

impl PaymentStatus {
    /// Not settled yet
    pub fn is_pending(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Processing)
    }
}

/// Payment record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payment {
    pub id: Option<EntityId>,
    #[serde(deserialize_with = "null_as_default")]
    pub customer_id: EntityId,
    #[serde(deserialize_with = "null_as_default")]
    pub ride_id: EntityId,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub processed_at: Option<String>,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
}

pub static PAYMENT_SCHEMA: EntitySchema = EntitySchema {
    category_field: Some("paymentMethod"),
    rating_field: None,
    location_field: None,
    search_fields: &["transactionId", "paymentMethod", "amount"],
    sort_fields: &[
        SortField::new("createdDate", FieldKind::Date, Desc),
        SortField::new("amount", FieldKind::Number, Desc),
        SortField::new("status", FieldKind::Text, Asc),
        SortField::new("paymentMethod", FieldKind::Text, Asc),
    ],
    default_sort: "createdDate",
};

impl Payment {
    fn lookup(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => self.id.map_or(FieldValue::Null, FieldValue::Integer),
            "customerId" => FieldValue::Integer(self.customer_id),
            "rideId" => FieldValue::Integer(self.ride_id),
            "amount" => FieldValue::Float(self.amount),
            "paymentMethod" => FieldValue::text(self.payment_method.as_str()),
            "status" => FieldValue::text(self.status.as_str()),
            "transactionId" => FieldValue::opt_text(self.transaction_id.as_deref()),
            "failureReason" => FieldValue::opt_text(self.failure_reason.as_deref()),
            "createdDate" => FieldValue::opt_text(self.created_date.as_deref()),
            _ => return None,
        };
        Some(value)
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}

impl_entity!(Payment, "payments", "payment", PAYMENT_SCHEMA, Payment::lookup);

/// Payment history counters.
///
/// Amounts and the success rate are kept unrounded; formatting is left to
/// the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_payments: usize,
    /// Sum over every payment, whatever its status
    pub total_amount: f64,
    pub completed_payments: usize,
    pub pending_payments: usize,
    pub failed_payments: usize,
    pub average_amount: f64,
    /// Completed payments created in the current month
    pub monthly_revenue: f64,
    pub success_rate: f64,
}

impl Aggregate for Payment {
    type Stats = PaymentStats;

    fn aggregate(items: &[Self], now: DateTime<FixedOffset>) -> PaymentStats {
        let total_amount = sum_by(items, |_| true, |p| p.amount);
        let completed = count_where(items, Payment::is_completed);
        let monthly_revenue = sum_by(
            items,
            |p| p.is_completed() && in_month(p.created_date.as_deref(), now),
            |p| p.amount,
        );

        PaymentStats {
            total_payments: items.len(),
            total_amount,
            completed_payments: completed,
            pending_payments: count_where(items, |p| p.status.is_pending()),
            failed_payments: count_where(items, |p| p.status == PaymentStatus::Failed),
            average_amount: ratio(total_amount, items.len()),
            monthly_revenue,
            success_rate: percentage(completed, items.len()),
        }
    }
}

impl IntoActivity for Payment {
    const KIND: ActivityKind = ActivityKind::Payment;

    fn title(&self) -> String {
        "Payment Processed".to_string()
    }

    fn description(&self) -> String {
        format!("Payment via {}", self.payment_method)
    }

    fn amount(&self) -> Option<f64> {
        Some(self.amount)
    }
}

/// Payload of `POST /payments/process`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub customer_id: EntityId,
    pub ride_id: EntityId,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_token: Option<String>,
}

impl Form for PaymentRequest {
    fn rules(_today: NaiveDate) -> FormRules {
        FormRules::new()
            .field(FieldRules::new("customerId").validate(positive()))
            .field(FieldRules::new("rideId").validate(positive()))
            .field(
                FieldRules::new("amount")
                    .filter(round_decimals(2))
                    .validate(min_value(0.01)),
            )
            .field(
                FieldRules::new("paymentMethod")
                    .validate(required())
                    .validate(in_list(PaymentMethod::wire_values())),
            )
            .field(
                FieldRules::new("cardToken")
                    .filter(trim())
                    .filter(blank_to_null()),
            )
    }
}

/// Card entered on the payment page. Never sent to the backend as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: String,
    pub cardholder_name: String,
}

impl CardDetails {
    pub fn last_four(&self) -> &str {
        let start = self.card_number.len().saturating_sub(4);
        self.card_number.get(start..).unwrap_or_default()
    }

    /// Issuer guessed from the leading digit
    pub fn brand(&self) -> &'static str {
        match self.card_number.chars().next() {
            Some('4') => "Visa",
            Some('5') => "MasterCard",
            Some('3') => "American Express",
            _ => "Card",
        }
    }

    /// Label such as `Visa ending in 4242`
    pub fn display_name(&self) -> String {
        format!("{} ending in {}", self.brand(), self.last_four())
    }
}

fn card_number_format() -> FieldFormat {
    static CARD_NUMBER: OnceLock<Regex> = OnceLock::new();
    let regex = CARD_NUMBER
        .get_or_init(|| Regex::new(r"^\d{16}$").expect("card number pattern is valid"));
    FieldFormat::Custom(regex.clone())
}

fn cvv_format() -> FieldFormat {
    static CVV: OnceLock<Regex> = OnceLock::new();
    let regex = CVV.get_or_init(|| Regex::new(r"^\d{3,4}$").expect("cvv pattern is valid"));
    FieldFormat::Custom(regex.clone())
}

/// Normalizer: drop the spaces users type between digit groups
fn strip_spaces() -> impl Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync + Clone {
    |_field: &str, value: Value| match value {
        Value::String(s) => Ok(Value::String(
            s.chars().filter(|c| !c.is_whitespace()).collect(),
        )),
        other => Ok(other),
    }
}

impl Form for CardDetails {
    fn rules(today: NaiveDate) -> FormRules {
        let this_year = today.year();

        FormRules::new()
            .field(
                FieldRules::new("cardNumber")
                    .filter(strip_spaces())
                    .validate(required())
                    .validate(format(card_number_format())),
            )
            .field(FieldRules::new("expiryMonth").validate(range(1.0, 12.0)))
            .field(FieldRules::new("expiryYear").validate(min_value(f64::from(this_year))))
            .field(
                FieldRules::new("cvv")
                    .filter(trim())
                    .validate(required())
                    .validate(format(cvv_format())),
            )
            .field(
                FieldRules::new("cardholderName")
                    .filter(trim())
                    .validate(required()),
            )
    }
}

/// Response of `POST /payments/process`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentReceipt {
    pub payment_id: Option<EntityId>,
    #[serde(deserialize_with = "null_as_default")]
    pub customer_id: EntityId,
    #[serde(deserialize_with = "null_as_default")]
    pub ride_id: EntityId,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub message: Option<String>,
    pub processed_at: Option<String>,
    pub created_date: Option<String>,
}

impl PaymentReceipt {
    /// The processed payment as a list entry
    pub fn to_payment(&self) -> Payment {
        Payment {
            id: self.payment_id,
            customer_id: self.customer_id,
            ride_id: self.ride_id,
            amount: self.amount,
            payment_method: self.payment_method.clone(),
            status: self.status.clone(),
            transaction_id: self.transaction_id.clone(),
            failure_reason: None,
            processed_at: self.processed_at.clone(),
            created_date: self.created_date.clone(),
            updated_date: None,
        }
    }
}

/// Payment endpoints beyond the collection fetch
#[async_trait]
pub trait PaymentService: CollectionService<Payment> {
    /// Payments of one customer (`GET /payments/customer/{id}`)
    async fn fetch_for_customer(&self, customer_id: EntityId)
    -> Result<Vec<Payment>, BackendError>;

    async fn process_payment(&self, request: &PaymentRequest)
    -> Result<PaymentReceipt, BackendError>;

    /// Fare preview for a trip (`POST /payments/calculate-fare`)
    async fn calculate_fare(&self, request: &FareRequest) -> Result<FareQuote, BackendError>;
}
