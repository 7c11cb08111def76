//! Session state and the store that shares it.
//!
//! [`SessionStore`] is the single source of truth for who is signed in. Readers
//! take snapshots or subscribe to changes; only the session manager in this
//! crate can write.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::client::types::{UserId, UserProfile};

/// Operations that track their own in-flight flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Login,
    LoginWithPhone,
    Register,
    VerifyEmail,
    VerifyPhone,
    ResendEmail,
    ResendPhone,
    ForgotPassword,
    ResetPassword,
    /// Bootstrap fetch of the stored user
    User,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::Login,
        Operation::LoginWithPhone,
        Operation::Register,
        Operation::VerifyEmail,
        Operation::VerifyPhone,
        Operation::ResendEmail,
        Operation::ResendPhone,
        Operation::ForgotPassword,
        Operation::ResetPassword,
        Operation::User,
    ];

    /// Key the UI uses for this flag
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::LoginWithPhone => "loginWithPhone",
            Operation::Register => "register",
            Operation::VerifyEmail => "verifyEmail",
            Operation::VerifyPhone => "verifyPhone",
            Operation::ResendEmail => "resendEmail",
            Operation::ResendPhone => "resendPhone",
            Operation::ForgotPassword => "forgotPassword",
            Operation::ResetPassword => "resetPassword",
            Operation::User => "user",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-operation loading flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    active: BTreeSet<Operation>,
}

impl LoadingFlags {
    pub fn is_loading(&self, operation: Operation) -> bool {
        self.active.contains(&operation)
    }

    pub fn any(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = Operation> + '_ {
        self.active.iter().copied()
    }

    fn start(&mut self, operation: Operation) {
        self.active.insert(operation);
    }

    fn end(&mut self, operation: Operation) {
        self.active.remove(&operation);
    }
}

/// Coarse authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    /// Registered, waiting for the email/phone code
    PendingVerification,
    Authenticated,
}

/// Authentication state for this client
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<UserId>,
    token: Option<String>,
    user: Option<UserProfile>,
    loading: LoadingFlags,
}

impl Session {
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn loading(&self) -> &LoadingFlags {
        &self.loading
    }

    pub fn is_loading(&self, operation: Operation) -> bool {
        self.loading.is_loading(operation)
    }

    /// True iff both a profile and a token are held
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub fn is_pending_verification(&self) -> bool {
        self.user.is_some() && self.token.is_none()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated() {
            SessionStatus::Authenticated
        } else if self.is_pending_verification() {
            SessionStatus::PendingVerification
        } else if [Operation::Login, Operation::LoginWithPhone, Operation::User]
            .iter()
            .any(|op| self.loading.is_loading(*op))
        {
            SessionStatus::Authenticating
        } else {
            SessionStatus::Anonymous
        }
    }

    fn sign_in(&mut self, user: UserProfile, token: String) {
        self.user_id = Some(user.id.clone());
        self.token = Some(token);
        self.user = Some(user);
    }

    fn register_pending(&mut self, user: UserProfile) {
        self.user_id = Some(user.id.clone());
        self.token = None;
        self.user = Some(user);
    }

    fn clear_identity(&mut self) {
        self.user_id = None;
        self.token = None;
        self.user = None;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("loading", &self.loading)
            .finish()
    }
}

/// Shared, observable session container
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx: Arc::new(tx) }
    }

    /// Current state
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Receiver that is notified on every change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    pub(crate) fn sign_in(&self, user: UserProfile, token: String) {
        self.tx.send_modify(|session| session.sign_in(user, token));
    }

    pub(crate) fn register_pending(&self, user: UserProfile) {
        self.tx.send_modify(|session| session.register_pending(user));
    }

    /// Drop the identity. In-flight loading flags are left alone.
    pub(crate) fn clear(&self) {
        self.tx.send_modify(Session::clear_identity);
    }

    /// Raise the flag for `operation` until the guard drops
    pub(crate) fn begin(&self, operation: Operation) -> LoadingGuard {
        self.tx.send_modify(|session| session.loading.start(operation));
        LoadingGuard {
            store: self.clone(),
            operation,
        }
    }
}

/// Clears a loading flag on drop, on every exit path
#[must_use]
pub(crate) struct LoadingGuard {
    store: SessionStore,
    operation: Operation,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let operation = self.operation;
        self.store
            .tx
            .send_modify(|session| session.loading.end(operation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            name: Some("Dana".to_string()),
            email: Some("a@b.com".to_string()),
            phone: None,
            profile_image: None,
            role: None,
        }
    }

    #[test]
    fn test_session_default_is_anonymous() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert!(!session.is_pending_verification());
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(!session.loading().any());
    }

    #[test]
    fn test_sign_in_and_clear() {
        let store = SessionStore::new();
        store.sign_in(profile("42"), "abc".to_string());

        let session = store.snapshot();
        assert!(session.is_authenticated());
        assert_eq!(session.user_id().map(UserId::as_str), Some("42"));
        assert_eq!(session.token(), Some("abc"));
        assert_eq!(session.status(), SessionStatus::Authenticated);

        store.clear();
        let session = store.snapshot();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_register_pending_is_not_authenticated() {
        let store = SessionStore::new();
        store.sign_in(profile("1"), "old".to_string());
        store.register_pending(profile("2"));

        let session = store.snapshot();
        assert!(!session.is_authenticated());
        assert!(session.is_pending_verification());
        assert_eq!(session.status(), SessionStatus::PendingVerification);
        assert!(session.token().is_none());
    }

    #[test]
    fn test_loading_guard_clears_flag() {
        let store = SessionStore::new();
        {
            let _login = store.begin(Operation::Login);
            let _resend = store.begin(Operation::ResendEmail);
            let session = store.snapshot();
            assert!(session.is_loading(Operation::Login));
            assert!(session.is_loading(Operation::ResendEmail));
            assert_eq!(session.status(), SessionStatus::Authenticating);
        }
        assert!(!store.snapshot().loading().any());
    }

    #[test]
    fn test_flags_are_independent() {
        let store = SessionStore::new();
        let reset = store.begin(Operation::ResetPassword);
        let resend = store.begin(Operation::ResendEmail);
        drop(resend);

        let session = store.snapshot();
        assert!(session.is_loading(Operation::ResetPassword));
        assert!(!session.is_loading(Operation::ResendEmail));
        drop(reset);
    }

    #[test]
    fn test_clear_keeps_loading_flags() {
        let store = SessionStore::new();
        store.sign_in(profile("42"), "abc".to_string());
        let _guard = store.begin(Operation::ResendEmail);
        store.clear();
        assert!(store.snapshot().is_loading(Operation::ResendEmail));
    }

    #[test]
    fn test_debug_redacts_token() {
        let store = SessionStore::new();
        store.sign_in(profile("42"), "super-secret".to_string());
        let rendered = format!("{:?}", store.snapshot());
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        store.sign_in(profile("42"), "abc".to_string());
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_authenticated());
    }

    #[test]
    fn test_operation_names() {
        let names: Vec<&str> = Operation::ALL.iter().map(Operation::name).collect();
        assert_eq!(
            names,
            vec![
                "login",
                "loginWithPhone",
                "register",
                "verifyEmail",
                "verifyPhone",
                "resendEmail",
                "resendPhone",
                "forgotPassword",
                "resetPassword",
                "user"
            ]
        );
    }
}
