//! Admin report over a seeded in-memory backend
//!
//! This example demonstrates:
//! - Signing in through `sign_in` and the session context
//! - Loading the admin dashboard (four concurrent fetches)
//! - Driving a driver list view: filter, sort, paginate, mutate
//!
//! Run with `RUST_LOG=ridedesk=debug cargo run --example admin_report`
//! to see the pipeline logs.

use ridedesk::entities::driver::Vehicle;
use ridedesk::prelude::*;
use tracing_subscriber::EnvFilter;

fn seed(backend: &InMemoryBackend) -> Result<()> {
    let user = |name: &str, role: UserRole, created: &str| User {
        username: name.to_lowercase(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        role,
        status: UserStatus::Active,
        created_date: Some(created.to_string()),
        ..User::default()
    };
    backend.seed_users(vec![
        user("Admin", UserRole::Admin, "2024-01-05T09:00:00"),
        user("Maria", UserRole::Customer, "2024-05-02T10:30:00"),
        user("Tomas", UserRole::Customer, "2024-05-09T16:10:00"),
    ])?;
    backend.set_password("admin", "admin123")?;

    let driver = |name: &str, rating: f64, status: DriverStatus, plate: &str| Driver {
        name: name.to_string(),
        phone: "+15550100200".to_string(),
        email: format!("{}@fleet.example.com", name.to_lowercase()),
        rating,
        status,
        vehicle: Some(Vehicle {
            id: None,
            model: "Hyundai Ioniq".to_string(),
            plate_number: plate.to_string(),
            year: 2022,
            color: "Blue".to_string(),
        }),
        total_rides: 120,
        created_date: Some("2024-04-18T07:00:00".to_string()),
        ..Driver::default()
    };
    backend.seed_drivers(vec![
        driver("Luis", 4.9, DriverStatus::Active, "RDX100"),
        driver("Nora", 4.6, DriverStatus::Busy, "RDX101"),
        driver("Owen", 3.8, DriverStatus::Offline, "RDX102"),
        driver("Pia", 4.2, DriverStatus::Active, "RDX103"),
    ])?;

    backend.seed_rides(vec![Ride {
        customer_id: 2,
        customer_name: Some("Maria".to_string()),
        pickup_location: "Union Square".to_string(),
        destination_location: "JFK Airport".to_string(),
        status: RideStatus::Completed,
        ride_type: RideType::Premium,
        estimated_fare: Some(estimate_fare(&RideType::Premium, 18.0)),
        driver_rating: Some(5.0),
        created_date: Some("2024-05-10T06:45:00".to_string()),
        ..Ride::default()
    }])?;

    backend.seed_payments(vec![Payment {
        customer_id: 2,
        ride_id: 8,
        amount: 39.5,
        payment_method: PaymentMethod::CreditCard,
        status: PaymentStatus::Completed,
        created_date: Some("2024-05-10T07:30:00".to_string()),
        ..Payment::default()
    }])?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ridedesk=info")),
        )
        .init();

    println!("🚕 ridedesk admin report");
    println!("========================\n");

    let config = ConsoleConfig::default();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::parse("2024-05-15T12:00:00Z")?);
    let backend = Arc::new(InMemoryBackend::new().with_clock(clock.clone()));
    seed(&backend)?;

    let session = SessionContext::new();
    let home = sign_in(&*backend, &session, &LoginRequest::new("admin", "admin123")).await?;
    println!("✅ Signed in, landing on {}\n", home);

    let services = ServiceSet::from_backend(backend.clone());
    let mut dashboard =
        AdminDashboardView::new(services.clone(), session.clone(), clock.clone(), config.feed);
    let report = dashboard.load().await?;

    let stats = &report.stats;
    println!("📊 Platform");
    println!("   - customers: {} ({} active)", stats.total_users, stats.active_users);
    println!("   - drivers:   {} ({} active)", stats.total_drivers, stats.active_drivers);
    println!("   - rides:     {} ({} completed)", stats.total_rides, stats.completed_rides);
    println!("   - revenue:   ${:.2} (${:.2} this month)\n", stats.total_revenue, stats.monthly_revenue);

    println!("🕑 Recent activity");
    for activity in &report.recent_activity {
        println!("   - [{}] {}: {}", activity.kind, activity.title, activity.description);
    }

    let mut drivers = ListView::drivers(services, &config, clock);
    drivers.refresh().await?;
    drivers.set_filter(FilterPatch::default().min_rating(4.0));
    drivers.set_sort("rating", None)?;

    let page = drivers.present();
    println!("\n⭐ Drivers rated 4.0+ ({} of {})", page.total_count, page.summary.total);
    for driver in &page.items {
        println!("   - {} {:.1} {}", driver.name, driver.rating, driver.status);
    }

    if let Some(id) = page.items.last().and_then(|d| d.id) {
        drivers.update_driver_status(id, DriverStatus::Offline).await?;
        let stats = drivers.present().stats;
        println!("\n🔧 Took driver {} offline, {}% of the fleet online", id, stats.online_percentage);
    }

    Ok(())
}
