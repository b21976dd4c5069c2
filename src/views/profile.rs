//! Profile settings of the signed-in user

use super::list_view::success_message;
use super::{LoadingFlag, ServiceSet, ViewLifetime};
use crate::core::clock::Clock;
use crate::core::error::{ConsoleError, ConsoleResult, MutationError, MutationKind, Notice};
use crate::core::session::{SessionContext, SessionUser};
use crate::core::validation::Form;
use crate::entities::user::{UpdateUserRequest, User};
use std::sync::Arc;
use tracing::{info, warn};

const PROFILE: &str = "profile";

/// Edits the signed-in user's own account and keeps the session in step
pub struct ProfileView {
    services: ServiceSet,
    session: SessionContext,
    clock: Arc<dyn Clock>,
    lifetime: ViewLifetime,
    loading: LoadingFlag,
    profile: Option<User>,
    last_notice: Option<Notice>,
}

impl ProfileView {
    pub fn new(services: ServiceSet, session: SessionContext, clock: Arc<dyn Clock>) -> Self {
        Self {
            services,
            session,
            clock,
            lifetime: ViewLifetime::new(),
            loading: LoadingFlag::default(),
            profile: None,
            last_notice: None,
        }
    }

    /// Validate and save `request` for the session user.
    ///
    /// On success the session picks up the new name, username and email so
    /// every view sharing it sees them.
    pub async fn update_profile(&mut self, request: &UpdateUserRequest) -> ConsoleResult<User> {
        let Some(current) = self.session.user() else {
            return Err(self.fail(ConsoleError::Unauthenticated));
        };
        let request = match request.validated_with(self.clock.as_ref()) {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e)),
        };
        let Some(_guard) = self.loading.raise() else {
            return Err(ConsoleError::Internal(
                "profile update already in flight".to_string(),
            ));
        };

        let users = self.services.users.clone();
        let id = current.id;
        let outcome = self
            .lifetime
            .run(async move { users.update_user(id, &request).await })
            .await?;

        match outcome {
            Ok(user) => {
                self.session.update_user(SessionUser {
                    username: user.username.clone(),
                    name: user.name.clone(),
                    email: user.email.clone(),
                    ..current
                });
                info!(user = id, "profile updated");
                self.last_notice = Some(Notice::success(
                    "Success",
                    success_message(MutationKind::Update, PROFILE),
                ));
                self.profile = Some(user.clone());
                Ok(user)
            }
            Err(source) => {
                warn!(user = id, error = %source, "profile update failed");
                Err(self.fail(MutationError {
                    resource: PROFILE,
                    kind: MutationKind::Update,
                    source,
                }))
            }
        }
    }

    /// The account as last returned by the backend
    pub fn profile(&self) -> Option<&User> {
        self.profile.as_ref()
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

    fn fail(&mut self, err: impl Into<ConsoleError>) -> ConsoleError {
        let err = err.into();
        self.last_notice = err.notice();
        err
    }
}

impl Drop for ProfileView {
    fn drop(&mut self) {
        self.lifetime.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::error::{BackendError, NoticeLevel};
    use crate::core::session::Role;
    use crate::entities::user::{UserRole, UserStatus};
    use crate::storage::InMemoryBackend;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::parse("2024-05-15T12:00:00Z").unwrap())
    }

    fn carla() -> User {
        User {
            id: Some(2),
            username: "carla".into(),
            name: "Carla Customer".into(),
            email: "carla@example.com".into(),
            role: UserRole::Customer,
            status: UserStatus::Active,
            ..User::default()
        }
    }

    fn setup() -> (InMemoryBackend, SessionContext, ProfileView) {
        let backend = InMemoryBackend::new().with_clock(clock());
        backend.seed_users(vec![carla()]).unwrap();
        let session = SessionContext::signed_in(SessionUser {
            id: 2,
            username: "carla".into(),
            name: "Carla Customer".into(),
            email: "carla@example.com".into(),
            role: Role::Customer,
        });
        let services = ServiceSet::from_backend(Arc::new(backend.clone()));
        let view = ProfileView::new(services, session.clone(), clock());
        (backend, session, view)
    }

    #[tokio::test]
    async fn test_update_refreshes_session() {
        let (_, session, mut view) = setup();
        let mut request = UpdateUserRequest::from_user(&carla());
        request.name = "  Carla Jones ".into();
        request.bio = Some("Weekend commuter".into());

        let user = view.update_profile(&request).await.unwrap();
        assert_eq!(user.name, "Carla Jones");
        assert_eq!(user.bio.as_deref(), Some("Weekend commuter"));
        assert_eq!(session.user().unwrap().name, "Carla Jones");
        assert_eq!(session.role(), Some(Role::Customer));
        assert_eq!(view.profile().map(|u| u.id), Some(Some(2)));

        let notice = view.last_notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, "Profile updated successfully");
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_invalid_email_stays_local() {
        let (backend, session, mut view) = setup();
        backend
            .fail("users", BackendError::Unavailable("should not be called".into()))
            .unwrap();
        let mut request = UpdateUserRequest::from_user(&carla());
        request.email = "not-an-email".into();

        let err = view.update_profile(&request).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
        assert_eq!(view.last_notice().unwrap().level, NoticeLevel::Warning);
        assert_eq!(session.user().unwrap().email, "carla@example.com");
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_session() {
        let (backend, session, mut view) = setup();
        backend
            .fail("users", BackendError::Unavailable("down".into()))
            .unwrap();
        let mut request = UpdateUserRequest::from_user(&carla());
        request.name = "Carla Jones".into();

        let err = view.update_profile(&request).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Mutation(_)));
        let notice = view.last_notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Failed to update profile");
        assert_eq!(session.user().unwrap().name, "Carla Customer");
        assert!(view.profile().is_none());
    }

    #[tokio::test]
    async fn test_requires_session() {
        let (_, session, mut view) = setup();
        session.logout();

        let err = view
            .update_profile(&UpdateUserRequest::from_user(&carla()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Unauthenticated));
        assert_eq!(view.last_notice().unwrap().title, "Session expired");
    }
}
