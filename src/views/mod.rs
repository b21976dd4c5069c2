//! Views: the async shell around the synchronous list engine
//!
//! A view owns its engine, fetches through the service traits and keeps the
//! loading flag and the last [`Notice`](crate::core::error::Notice). Every
//! request runs inside the view's [`ViewLifetime`], so tearing the view down
//! aborts in-flight work and late results are never committed.

pub mod admin_dashboard;
pub mod customer_dashboard;
pub mod list_view;
pub mod profile;

pub use admin_dashboard::{AdminDashboard, AdminDashboardView, AdminStats};
pub use customer_dashboard::{CustomerDashboard, CustomerDashboardView, CustomerStats};
pub use list_view::ListView;
pub use profile::ProfileView;

use crate::core::error::{ConsoleError, ConsoleResult};
use crate::core::service::AuthService;
use crate::entities::driver::DriverService;
use crate::entities::payment::PaymentService;
use crate::entities::ride::RideService;
use crate::entities::user::UserService;
use futures::future::{AbortHandle, Abortable};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// The services a view may talk to
#[derive(Clone)]
pub struct ServiceSet {
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UserService>,
    pub drivers: Arc<dyn DriverService>,
    pub rides: Arc<dyn RideService>,
    pub payments: Arc<dyn PaymentService>,
}

impl ServiceSet {
    /// Use one backend for every service
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: AuthService + UserService + DriverService + RideService + PaymentService + 'static,
    {
        Self {
            auth: backend.clone(),
            users: backend.clone(),
            drivers: backend.clone(),
            rides: backend.clone(),
            payments: backend,
        }
    }
}

#[derive(Default)]
struct LifetimeState {
    closed: bool,
    next_task: u64,
    in_flight: HashMap<u64, AbortHandle>,
}

/// Scope of one mounted view.
///
/// Clones share the same scope, so a handle kept by the router can close a
/// view while one of its requests is pending.
#[derive(Clone, Default)]
pub struct ViewLifetime {
    state: Arc<Mutex<LifetimeState>>,
}

impl ViewLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).closed
    }

    /// Number of requests currently running in this scope
    pub fn in_flight(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .in_flight
            .len()
    }

    /// Abort every in-flight request and refuse new ones
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.closed {
            return;
        }
        state.closed = true;
        let aborted = state.in_flight.len();
        for (_, handle) in state.in_flight.drain() {
            handle.abort();
        }
        tracing::debug!(aborted, "view closed");
    }

    /// Run `future` in this scope.
    ///
    /// Yields [`ConsoleError::Cancelled`] if the scope is closed before,
    /// during or right after the future completes.
    pub async fn run<F: Future>(&self, future: F) -> ConsoleResult<F::Output> {
        let (handle, registration) = AbortHandle::new_pair();
        let task = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.closed {
                return Err(ConsoleError::Cancelled);
            }
            state.next_task += 1;
            let task = state.next_task;
            state.in_flight.insert(task, handle);
            task
        };

        let outcome = Abortable::new(future, registration).await;

        let closed = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.in_flight.remove(&task);
            state.closed
        };

        match outcome {
            Ok(output) if !closed => Ok(output),
            _ => {
                tracing::warn!("discarding result of a closed view");
                Err(ConsoleError::Cancelled)
            }
        }
    }
}

/// Shared "request outstanding" flag of a view
#[derive(Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag until the guard is dropped; `None` if already raised
    fn raise(&self) -> Option<LoadingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LoadingGuard(self.0.clone()))
    }
}

/// Clears the loading flag on every exit path
struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
