//! Admin dashboard: platform-wide stats, activity feed, top drivers

use super::{LoadingFlag, ServiceSet, ViewLifetime};
use crate::core::clock::Clock;
use crate::core::error::{ConsoleError, ConsoleResult, FetchError, Notice};
use crate::core::feed::{Activity, FeedLimits, candidates, merge_feed, recent};
use crate::core::session::{AccessPolicy, Role, SessionContext, authorize};
use crate::core::stats::{count_where, in_month, ratio, round_to, sum_by};
use crate::entities::driver::{Driver, DriverStatus};
use crate::entities::payment::Payment;
use crate::entities::ride::Ride;
use crate::entities::user::User;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const TOP_DRIVERS: usize = 5;
const RECENT_CUSTOMERS: usize = 5;

/// Headline numbers of the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    /// Customers only
    pub total_users: usize,
    pub active_users: usize,
    pub total_drivers: usize,
    /// Drivers with status ACTIVE
    pub active_drivers: usize,
    pub total_rides: usize,
    pub active_rides: usize,
    pub completed_rides: usize,
    /// Sum of completed payments
    pub total_revenue: f64,
    pub monthly_revenue: f64,
    /// Revenue per completed payment
    pub average_ride_value: f64,
}

impl AdminStats {
    pub fn compute(
        users: &[User],
        drivers: &[Driver],
        rides: &[Ride],
        payments: &[Payment],
        now: DateTime<FixedOffset>,
    ) -> Self {
        let revenue = sum_by(payments, Payment::is_completed, |p| p.amount);
        let monthly = sum_by(
            payments,
            |p| p.is_completed() && in_month(p.created_date.as_deref(), now),
            |p| p.amount,
        );
        let completed_payments = count_where(payments, Payment::is_completed);

        Self {
            total_users: count_where(users, User::is_customer),
            active_users: count_where(users, |u| u.is_customer() && u.is_active()),
            total_drivers: drivers.len(),
            active_drivers: count_where(drivers, |d| d.status == DriverStatus::Active),
            total_rides: rides.len(),
            active_rides: count_where(rides, |r| r.status.is_active()),
            completed_rides: count_where(rides, Ride::is_completed),
            total_revenue: round_to(revenue, 2),
            monthly_revenue: round_to(monthly, 2),
            average_ride_value: round_to(ratio(revenue, completed_payments), 2),
        }
    }
}

/// Everything the admin dashboard renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub stats: AdminStats,
    pub recent_activity: Vec<Activity>,
    /// Highest rated first
    pub top_drivers: Vec<Driver>,
    /// Newest first
    pub recent_customers: Vec<User>,
}

impl AdminDashboard {
    pub fn build(
        users: &[User],
        drivers: &[Driver],
        rides: &[Ride],
        payments: &[Payment],
        limits: FeedLimits,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let local = *now.offset();
        let customers: Vec<User> = users.iter().filter(|u| u.is_customer()).cloned().collect();

        let recent_activity = merge_feed(
            vec![
                candidates(&customers, limits.users, local),
                candidates(drivers, limits.drivers, local),
                candidates(rides, limits.rides, local),
                candidates(payments, limits.payments, local),
            ],
            limits.total,
        );

        let mut top_drivers = drivers.to_vec();
        top_drivers.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        top_drivers.truncate(TOP_DRIVERS);

        Self {
            stats: AdminStats::compute(users, drivers, rides, payments, now),
            recent_activity,
            top_drivers,
            recent_customers: recent(&customers, RECENT_CUSTOMERS, local)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

/// Admin dashboard screen
pub struct AdminDashboardView {
    services: ServiceSet,
    session: SessionContext,
    clock: Arc<dyn Clock>,
    limits: FeedLimits,
    lifetime: ViewLifetime,
    loading: LoadingFlag,
    dashboard: Option<AdminDashboard>,
    last_notice: Option<Notice>,
}

impl AdminDashboardView {
    pub fn new(
        services: ServiceSet,
        session: SessionContext,
        clock: Arc<dyn Clock>,
        limits: FeedLimits,
    ) -> Self {
        Self {
            services,
            session,
            clock,
            limits,
            lifetime: ViewLifetime::new(),
            loading: LoadingFlag::default(),
            dashboard: None,
            last_notice: None,
        }
    }

    /// Fetch all four collections and rebuild the dashboard.
    ///
    /// Commits only if every fetch succeeds.
    pub async fn load(&mut self) -> ConsoleResult<&AdminDashboard> {
        if !authorize(self.session.user().as_ref(), AccessPolicy::Role(Role::Admin)).is_allowed()
        {
            let err = ConsoleError::Unauthenticated;
            self.last_notice = err.notice();
            return Err(err);
        }
        let Some(_guard) = self.loading.raise() else {
            return Err(ConsoleError::Internal(
                "dashboard is already loading".to_string(),
            ));
        };

        let users = self.services.users.clone();
        let drivers = self.services.drivers.clone();
        let rides = self.services.rides.clone();
        let payments = self.services.payments.clone();
        let fetch = async move {
            tokio::try_join!(
                users.fetch_all(),
                drivers.fetch_all(),
                rides.fetch_all(),
                payments.fetch_all(),
            )
        };

        let outcome = self.lifetime.run(fetch).await?;
        let (users, drivers, rides, payments) = match outcome {
            Ok(collections) => collections,
            Err(source) => {
                warn!(error = %source, "admin dashboard fetch failed");
                let err = ConsoleError::from(FetchError {
                    resource: "dashboard data",
                    source,
                });
                self.last_notice = err.notice();
                return Err(err);
            }
        };

        info!(
            users = users.len(),
            drivers = drivers.len(),
            rides = rides.len(),
            payments = payments.len(),
            "loaded admin dashboard"
        );
        let dashboard = AdminDashboard::build(
            &users,
            &drivers,
            &rides,
            &payments,
            self.limits,
            self.clock.now(),
        );
        self.last_notice = None;
        Ok(self.dashboard.insert(dashboard))
    }

    pub fn dashboard(&self) -> Option<&AdminDashboard> {
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

impl Drop for AdminDashboardView {
    fn drop(&mut self) {
        self.lifetime.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::payment::{PaymentMethod, PaymentStatus};
    use crate::entities::ride::RideStatus;
    use crate::entities::user::{UserRole, UserStatus};

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-15T12:00:00Z").unwrap()
    }

    fn user(name: &str, role: UserRole, status: UserStatus, created: &str) -> User {
        User {
            id: Some(name.len() as i64),
            username: name.to_lowercase(),
            name: name.to_string(),
            role,
            status,
            created_date: Some(created.to_string()),
            ..User::default()
        }
    }

    fn payment(id: i64, amount: f64, status: PaymentStatus, created: &str) -> Payment {
        Payment {
            id: Some(id),
            customer_id: 1,
            ride_id: id,
            amount,
            payment_method: PaymentMethod::Cash,
            status,
            created_date: Some(created.to_string()),
            ..Payment::default()
        }
    }

    #[test]
    fn test_stats_count_customers_only() {
        let users = vec![
            user("Ann", UserRole::Customer, UserStatus::Active, "2024-05-01T09:00:00"),
            user("Boris", UserRole::Customer, UserStatus::Suspended, "2024-05-02T09:00:00"),
            user("Root", UserRole::Admin, UserStatus::Active, "2024-01-01T09:00:00"),
        ];
        let stats = AdminStats::compute(&users, &[], &[], &[], now());
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 1);
    }

    #[test]
    fn test_revenue_from_completed_payments() {
        let payments = vec![
            payment(1, 20.0, PaymentStatus::Completed, "2024-05-03T10:00:00"),
            payment(2, 30.0, PaymentStatus::Completed, "2024-04-03T10:00:00"),
            payment(3, 99.0, PaymentStatus::Failed, "2024-05-04T10:00:00"),
        ];
        let stats = AdminStats::compute(&[], &[], &[], &payments, now());
        assert_eq!(stats.total_revenue, 50.0);
        assert_eq!(stats.monthly_revenue, 20.0);
        assert_eq!(stats.average_ride_value, 25.0);
    }

    #[test]
    fn test_empty_collections() {
        let stats = AdminStats::compute(&[], &[], &[], &[], now());
        assert_eq!(stats, AdminStats::default());
    }

    #[test]
    fn test_build_ranks_drivers_and_feeds_customers() {
        let users = vec![
            user("Ann", UserRole::Customer, UserStatus::Active, "2024-05-01T09:00:00"),
            user("Root", UserRole::Admin, UserStatus::Active, "2024-05-10T09:00:00"),
        ];
        let drivers: Vec<Driver> = (1..=7)
            .map(|id| Driver {
                id: Some(id),
                name: format!("Driver {id}"),
                rating: id as f64 / 2.0,
                status: DriverStatus::Active,
                ..Driver::default()
            })
            .collect();
        let rides = vec![Ride {
            id: Some(1),
            customer_id: 1,
            status: RideStatus::Completed,
            destination_location: "JFK Airport".to_string(),
            created_date: Some("2024-05-14T08:00:00".to_string()),
            ..Ride::default()
        }];

        let dashboard =
            AdminDashboard::build(&users, &drivers, &rides, &[], FeedLimits::default(), now());

        let top: Vec<_> = dashboard.top_drivers.iter().map(|d| d.id).collect();
        assert_eq!(top, vec![Some(7), Some(6), Some(5), Some(4), Some(3)]);
        assert_eq!(dashboard.recent_customers.len(), 1);
        assert!(
            dashboard
                .recent_activity
                .iter()
                .all(|a| a.id != "user-4")
        );
        assert_eq!(dashboard.recent_activity[0].id, "ride-1");
        assert_eq!(dashboard.stats.completed_rides, 1);
    }
}
