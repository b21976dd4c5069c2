//! View teardown, loading flag and sign-in flow

mod common;

use common::*;
use ridedesk::config::ConsoleConfig;
use ridedesk::core::error::ConsoleError;
use ridedesk::core::session::{
    ADMIN_HOME, Access, CUSTOMER_HOME, LOGIN_ROUTE, LoginRequest, SessionContext, authorize_route,
    sign_in,
};
use ridedesk::entities::driver::Driver;
use ridedesk::storage::InMemoryBackend;
use ridedesk::views::{ListView, ServiceSet};
use std::sync::Arc;
use std::time::Duration;

fn slow_backend() -> InMemoryBackend {
    seeded_backend().with_latency(Duration::from_millis(200))
}

#[tokio::test]
async fn closing_a_view_discards_the_pending_fetch() {
    let services = ServiceSet::from_backend(Arc::new(slow_backend()));
    let mut view: ListView<Driver> = ListView::drivers(services, &ConsoleConfig::default(), clock());
    let lifetime = view.lifetime();
    let loading = view.loading_flag();

    let (result, ()) = tokio::join!(view.refresh(), async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(loading.is_set());
        lifetime.close();
    });

    assert!(matches!(result, Err(ConsoleError::Cancelled)));
    assert_eq!(view.engine().store().len(), 0);
    assert!(view.last_notice().is_none());
    assert!(!view.is_loading());

    assert!(matches!(view.refresh().await, Err(ConsoleError::Cancelled)));
}

#[tokio::test]
async fn slow_fetch_commits_when_view_stays_open() {
    let services = ServiceSet::from_backend(Arc::new(slow_backend()));
    let mut view = ListView::drivers(services, &ConsoleConfig::default(), clock());

    view.refresh().await.unwrap();
    assert_eq!(view.present().total_count, 3);
    assert!(!view.is_loading());
}

#[tokio::test]
async fn dropping_a_view_aborts_its_requests() {
    let services = ServiceSet::from_backend(Arc::new(slow_backend()));
    let view = ListView::drivers(services, &ConsoleConfig::default(), clock());
    let lifetime = view.lifetime();

    drop(view);
    assert!(lifetime.is_closed());
    assert_eq!(lifetime.in_flight(), 0);
}

#[tokio::test]
async fn sign_in_routes_by_role() {
    let backend = seeded_backend();
    let session = SessionContext::new();

    let home = sign_in(&backend, &session, &LoginRequest::new("ada.admin", "ada.admin"))
        .await
        .unwrap();
    assert_eq!(home, ADMIN_HOME);
    assert!(session.is_admin());
    assert_eq!(authorize_route(&session, "/admin/drivers"), Access::Allow);
    assert_eq!(
        authorize_route(&session, "/customer/book-ride"),
        Access::Deny {
            redirect: ADMIN_HOME
        }
    );

    session.logout();
    let home = sign_in(
        &backend,
        &session,
        &LoginRequest::new("  carla.customer ", "carla.customer"),
    )
    .await
    .unwrap();
    assert_eq!(home, CUSTOMER_HOME);
    assert_eq!(session.user().map(|u| u.id), Some(CUSTOMER_ID));
}

#[tokio::test]
async fn rejected_sign_in_leaves_session_empty() {
    let backend = seeded_backend();
    let session = SessionContext::new();

    let err = sign_in(&backend, &session, &LoginRequest::new("ada.admin", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::LoginFailed(ref e) if e.is_auth_rejection()));

    let err = sign_in(&backend, &session, &LoginRequest::new("eve.blocked", "eve.blocked"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::LoginFailed(_)));

    let err = sign_in(&backend, &session, &LoginRequest::new("", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));

    assert!(!session.is_authenticated());
    assert_eq!(
        authorize_route(&session, "/admin/dashboard"),
        Access::Deny {
            redirect: LOGIN_ROUTE
        }
    );
}
