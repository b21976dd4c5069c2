//! Customer dashboard: own rides and payments

use super::{LoadingFlag, ServiceSet, ViewLifetime};
use crate::core::clock::Clock;
use crate::core::error::{ConsoleError, ConsoleResult, FetchError, Notice};
use crate::core::feed::recent;
use crate::core::session::{AccessPolicy, Role, SessionContext, authorize};
use crate::core::stats::{count_where, mean_positive, round_to, sum_by};
use crate::entities::payment::Payment;
use crate::entities::ride::Ride;
use chrono::FixedOffset;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const RECENT_RIDES: usize = 5;
const RECENT_PAYMENTS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_rides: usize,
    pub completed_rides: usize,
    pub active_rides: usize,
    /// Sum of completed payments
    pub total_spent: f64,
    /// Mean positive driver rating given, 1 decimal
    pub average_rating: f64,
}

impl CustomerStats {
    pub fn compute(rides: &[Ride], payments: &[Payment]) -> Self {
        Self {
            total_rides: rides.len(),
            completed_rides: count_where(rides, Ride::is_completed),
            active_rides: count_where(rides, |r| r.status.is_active()),
            total_spent: round_to(sum_by(payments, Payment::is_completed, |p| p.amount), 2),
            average_rating: round_to(mean_positive(rides.iter().map(|r| r.driver_rating)), 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDashboard {
    pub stats: CustomerStats,
    /// Newest CONFIRMED or IN_PROGRESS ride
    pub active_ride: Option<Ride>,
    pub recent_rides: Vec<Ride>,
    pub recent_payments: Vec<Payment>,
}

impl CustomerDashboard {
    pub fn build(rides: &[Ride], payments: &[Payment], local: FixedOffset) -> Self {
        let by_recency = recent(rides, rides.len(), local);
        let active_ride = by_recency
            .iter()
            .find(|r| r.status.is_active())
            .map(|r| (*r).clone());

        Self {
            stats: CustomerStats::compute(rides, payments),
            active_ride,
            recent_rides: by_recency.into_iter().take(RECENT_RIDES).cloned().collect(),
            recent_payments: recent(payments, RECENT_PAYMENTS, local)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

/// Dashboard of the signed-in customer
pub struct CustomerDashboardView {
    services: ServiceSet,
    session: SessionContext,
    clock: Arc<dyn Clock>,
    lifetime: ViewLifetime,
    loading: LoadingFlag,
    dashboard: Option<CustomerDashboard>,
    last_notice: Option<Notice>,
}

impl CustomerDashboardView {
    pub fn new(services: ServiceSet, session: SessionContext, clock: Arc<dyn Clock>) -> Self {
        Self {
            services,
            session,
            clock,
            lifetime: ViewLifetime::new(),
            loading: LoadingFlag::default(),
            dashboard: None,
            last_notice: None,
        }
    }

    pub async fn load(&mut self) -> ConsoleResult<&CustomerDashboard> {
        let user = self.session.user();
        let customer_id = match user {
            Some(ref u)
                if authorize(Some(u), AccessPolicy::Role(Role::Customer)).is_allowed() =>
            {
                u.id
            }
            _ => {
                let err = ConsoleError::Unauthenticated;
                self.last_notice = err.notice();
                return Err(err);
            }
        };
        let Some(_guard) = self.loading.raise() else {
            return Err(ConsoleError::Internal(
                "dashboard is already loading".to_string(),
            ));
        };

        let rides = self.services.rides.clone();
        let payments = self.services.payments.clone();
        let fetch = async move {
            tokio::try_join!(
                rides.fetch_for_customer(customer_id),
                payments.fetch_for_customer(customer_id),
            )
        };

        let outcome = self.lifetime.run(fetch).await?;
        let (rides, payments) = match outcome {
            Ok(collections) => collections,
            Err(source) => {
                warn!(customer = customer_id, error = %source, "customer dashboard fetch failed");
                let err = ConsoleError::from(FetchError {
                    resource: "dashboard data",
                    source,
                });
                self.last_notice = err.notice();
                return Err(err);
            }
        };

        info!(
            customer = customer_id,
            rides = rides.len(),
            payments = payments.len(),
            "loaded customer dashboard"
        );
        let dashboard = CustomerDashboard::build(&rides, &payments, self.clock.offset());
        self.last_notice = None;
        Ok(self.dashboard.insert(dashboard))
    }

    pub fn dashboard(&self) -> Option<&CustomerDashboard> {
        self.dashboard.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    pub fn lifetime(&self) -> ViewLifetime {
        self.lifetime.clone()
    }
}

impl Drop for CustomerDashboardView {
    fn drop(&mut self) {
        self.lifetime.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::payment::PaymentStatus;
    use crate::entities::ride::RideStatus;

    fn ride(id: i64, status: RideStatus, rating: Option<f64>, created: &str) -> Ride {
        Ride {
            id: Some(id),
            customer_id: 9,
            status,
            driver_rating: rating,
            created_date: Some(created.to_string()),
            ..Ride::default()
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_stats() {
        let rides = vec![
            ride(1, RideStatus::Completed, Some(5.0), "2024-05-01T10:00:00"),
            ride(2, RideStatus::Completed, Some(4.0), "2024-05-02T10:00:00"),
            ride(3, RideStatus::Completed, None, "2024-05-03T10:00:00"),
            ride(4, RideStatus::InProgress, None, "2024-05-04T10:00:00"),
        ];
        let payments = vec![
            Payment {
                id: Some(1),
                amount: 12.5,
                status: PaymentStatus::Completed,
                ..Payment::default()
            },
            Payment {
                id: Some(2),
                amount: 40.0,
                status: PaymentStatus::Refunded,
                ..Payment::default()
            },
        ];

        let stats = CustomerStats::compute(&rides, &payments);
        assert_eq!(stats.total_rides, 4);
        assert_eq!(stats.completed_rides, 3);
        assert_eq!(stats.active_rides, 1);
        assert_eq!(stats.total_spent, 12.5);
        assert_eq!(stats.average_rating, 4.5);
    }

    #[test]
    fn test_active_ride_is_newest_active() {
        let rides = vec![
            ride(1, RideStatus::Confirmed, None, "2024-05-01T10:00:00"),
            ride(2, RideStatus::InProgress, None, "2024-05-06T10:00:00"),
            ride(3, RideStatus::Completed, None, "2024-05-07T10:00:00"),
        ];
        let dashboard = CustomerDashboard::build(&rides, &[], utc());
        assert_eq!(dashboard.active_ride.and_then(|r| r.id), Some(2));
        let order: Vec<_> = dashboard.recent_rides.iter().filter_map(|r| r.id).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_no_active_ride() {
        let rides = vec![ride(1, RideStatus::Cancelled, None, "2024-05-01T10:00:00")];
        let dashboard = CustomerDashboard::build(&rides, &[], utc());
        assert!(dashboard.active_ride.is_none());
        assert_eq!(dashboard.stats, CustomerStats::compute(&rides, &[]));
    }
}
