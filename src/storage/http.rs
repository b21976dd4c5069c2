//! REST client for the ride-hailing backend
//!
//! Maps each service trait onto the backend's JSON endpoints. Non-2xx
//! answers become [`BackendError::Status`] carrying the backend's `message`
//! field when it sends one; a 404 on an id path becomes
//! [`BackendError::NotFound`].

use crate::config::ConsoleConfig;
use crate::core::entity::{Entity, EntityId};
use crate::core::error::BackendError;
use crate::core::service::{AuthService, CollectionService};
use crate::core::session::{LoginRequest, SessionUser};
use crate::entities::RatingRequest;
use crate::entities::driver::{
    CreateDriverRequest, Driver, DriverService, DriverStatus, UpdateDriverRequest,
};
use crate::entities::payment::{Payment, PaymentReceipt, PaymentRequest, PaymentService};
use crate::entities::ride::{
    CreateRideRequest, FareQuote, FareRequest, Ride, RideBooking, RideService,
};
use crate::entities::user::{
    CreateUserRequest, UpdateUserRequest, User, UserRole, UserService, UserStatus,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Error body sent by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Response of `POST /users/login`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    id: EntityId,
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    role: UserRole,
}

/// HTTP implementation of every service trait
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, BackendError> {
        Self::new(config.base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and decode a JSON body
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = Self::dispatch(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Send and ignore the body
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        Self::dispatch(request).await.map(|_| ())
    }

    async fn dispatch(request: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request failed");
            BackendError::Transport(e.to_string())
        })?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "backend response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string())
}

/// Turn a 404 on an id path into `NotFound`
fn on_entity<E: Entity, T>(result: Result<T, BackendError>, id: EntityId) -> Result<T, BackendError> {
    result.map_err(|e| match e {
        BackendError::Status { status: 404, .. } => BackendError::NotFound {
            resource: E::resource_name_singular(),
            id,
        },
        other => other,
    })
}

macro_rules! collection_service {
    ($entity:ty) => {
        #[async_trait]
        impl CollectionService<$entity> for HttpBackend {
            async fn fetch_all(&self) -> Result<Vec<$entity>, BackendError> {
                let path = format!("/{}", <$entity>::resource_name());
                self.send(self.client.get(self.url(&path))).await
            }
        }
    };
}

collection_service!(User);
collection_service!(Driver);
collection_service!(Ride);
collection_service!(Payment);

#[async_trait]
impl AuthService for HttpBackend {
    async fn login(&self, request: &LoginRequest) -> Result<SessionUser, BackendError> {
        let response: LoginResponse = self
            .send(self.client.post(self.url("/users/login")).json(request))
            .await?;

        let role = response.role.session_role().ok_or_else(|| BackendError::Status {
            status: 403,
            message: format!("Role {} cannot sign in", response.role),
        })?;
        Ok(SessionUser {
            id: response.id,
            username: response.username,
            name: response.name,
            email: response.email,
            role,
        })
    }
}

#[async_trait]
impl UserService for HttpBackend {
    async fn create_user(&self, request: &CreateUserRequest) -> Result<User, BackendError> {
        self.send(self.client.post(self.url("/users")).json(request))
            .await
    }

    async fn update_user(
        &self,
        id: EntityId,
        request: &UpdateUserRequest,
    ) -> Result<User, BackendError> {
        let url = self.url(&format!("/users/{}", id));
        on_entity::<User, _>(self.send(self.client.put(url).json(request)).await, id)
    }

    async fn update_user_status(
        &self,
        id: EntityId,
        status: &UserStatus,
    ) -> Result<User, BackendError> {
        let url = self.url(&format!("/users/{}/status", id));
        let request = self.client.put(url).query(&[("status", status.as_str())]);
        on_entity::<User, _>(self.send(request).await, id)
    }

    async fn delete_user(&self, id: EntityId) -> Result<(), BackendError> {
        let url = self.url(&format!("/users/{}", id));
        on_entity::<User, _>(self.send_empty(self.client.delete(url)).await, id)
    }
}

#[async_trait]
impl DriverService for HttpBackend {
    async fn create_driver(&self, request: &CreateDriverRequest) -> Result<Driver, BackendError> {
        self.send(self.client.post(self.url("/drivers")).json(request))
            .await
    }

    async fn update_driver(
        &self,
        id: EntityId,
        request: &UpdateDriverRequest,
    ) -> Result<Driver, BackendError> {
        let url = self.url(&format!("/drivers/{}", id));
        on_entity::<Driver, _>(self.send(self.client.put(url).json(request)).await, id)
    }

    async fn update_driver_status(
        &self,
        id: EntityId,
        status: &DriverStatus,
    ) -> Result<Driver, BackendError> {
        let url = self.url(&format!("/drivers/{}/status", id));
        let request = self.client.put(url).query(&[("status", status.as_str())]);
        on_entity::<Driver, _>(self.send(request).await, id)
    }

    async fn rate_driver(
        &self,
        id: EntityId,
        request: &RatingRequest,
    ) -> Result<Driver, BackendError> {
        let url = self.url(&format!("/drivers/{}/rating", id));
        on_entity::<Driver, _>(self.send(self.client.put(url).json(request)).await, id)
    }

    async fn delete_driver(&self, id: EntityId) -> Result<(), BackendError> {
        let url = self.url(&format!("/drivers/{}", id));
        on_entity::<Driver, _>(self.send_empty(self.client.delete(url)).await, id)
    }
}

#[async_trait]
impl RideService for HttpBackend {
    async fn fetch_for_customer(&self, customer_id: EntityId) -> Result<Vec<Ride>, BackendError> {
        let request = self
            .client
            .get(self.url("/rides"))
            .query(&[("customerId", customer_id)]);
        self.send(request).await
    }

    async fn book_ride(&self, request: &CreateRideRequest) -> Result<RideBooking, BackendError> {
        self.send(self.client.post(self.url("/rides")).json(request))
            .await
    }

    async fn rate_ride(&self, id: EntityId, request: &RatingRequest) -> Result<Ride, BackendError> {
        let url = self.url(&format!("/rides/{}/rating", id));
        on_entity::<Ride, _>(self.send(self.client.put(url).json(request)).await, id)
    }
}

#[async_trait]
impl PaymentService for HttpBackend {
    async fn fetch_for_customer(
        &self,
        customer_id: EntityId,
    ) -> Result<Vec<Payment>, BackendError> {
        let url = self.url(&format!("/payments/customer/{}", customer_id));
        self.send(self.client.get(url)).await
    }

    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, BackendError> {
        self.send(self.client.post(self.url("/payments/process")).json(request))
            .await
    }

    async fn calculate_fare(&self, request: &FareRequest) -> Result<FareQuote, BackendError> {
        let url = self.url("/payments/calculate-fare");
        self.send(self.client.post(url).json(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_backend_message() {
        let body = r#"{"timestamp":"2024-05-15T10:00:00","status":409,"error":"Conflict","message":"Plate already registered"}"#;
        assert_eq!(
            error_message(StatusCode::CONFLICT, body),
            "Plate already registered"
        );
        assert_eq!(
            error_message(StatusCode::CONFLICT, r#"{"error":"Conflict"}"#),
            "Conflict"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>upstream</html>"),
            "Bad Gateway"
        );
    }

    #[test]
    fn test_not_found_mapping() {
        let result: Result<(), _> = Err(BackendError::Status {
            status: 404,
            message: "Not Found".into(),
        });
        assert_eq!(
            on_entity::<Driver, _>(result, 7),
            Err(BackendError::NotFound {
                resource: "driver",
                id: 7
            })
        );
    }

    #[test]
    fn test_base_url_is_normalized() {
        let backend = HttpBackend::new("http://localhost:8080/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8080/api");
        assert_eq!(backend.url("/rides"), "http://localhost:8080/api/rides");
    }
}
