/**
 * Session Manager
 *
 * Every identity-lifecycle transition goes through here: bootstrap from saved
 * credentials, login, registration, verification, password recovery and
 * logout. Each public operation reports its outcome through the notifier and
 * never returns an error; failures are logged and shown, not propagated.
 */

use std::sync::Arc;

use crate::client::api::ApiClient;
use crate::client::config::Config;
use crate::client::error::{SessionError, StorageError};
use crate::client::navigation::{Navigator, Route};
use crate::client::notify::{Notification, Notifier};
use crate::client::session::{Operation, SessionStore};
use crate::client::storage::{
    CredentialPair, CredentialStore, FileStore, MemoryStore, StorageTier,
};
use crate::client::types::{
    AuthResponse, ContactMethod, ForgotPasswordRequest, LoginCredentials, LoginRequest,
    RegisterRequest, Registration, ResendRequest, ResetPasswordRequest, UserProfile,
    VerifyRequest,
};
use crate::shared::error::SharedError;

pub const LOGIN_SUCCESS: &str = "Congrats! You have successfully logged in";
pub const PHONE_LOGIN_SUCCESS: &str = "Congrats! You have successfully logged in with your phone!";
pub const LOGIN_FALLBACK: &str = "Something went wrong with login. Please, try again!";
pub const VERIFIED: &str = "You have logged in successfully!";
pub const LOGGED_OUT: &str = "Logged out successfully.";
pub const LOGOUT_FAILED: &str = "Logged out, but saved credentials could not be removed.";
/// Fallback for every failure that has no server message
pub const GENERIC_ERROR: &str = "Error";

const REGISTERED_DEFAULT: &str = "Account created. Enter the code we sent you.";
const RESENT_DEFAULT: &str = "Verification code sent.";
const FORGOT_DEFAULT: &str = "Password reset code sent.";
const RESET_DEFAULT: &str = "Password updated. Please log in.";

/// Which contact a verification step targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Email,
    Phone,
}

impl Channel {
    fn contact_from(self, user: &UserProfile) -> Option<ContactMethod> {
        match self {
            Channel::Email => user.email.clone().map(ContactMethod::Email),
            Channel::Phone => user.phone.clone().map(ContactMethod::Phone),
        }
    }

    fn missing(self) -> SharedError {
        match self {
            Channel::Email => SharedError::missing("email address to verify"),
            Channel::Phone => SharedError::missing("phone number to verify"),
        }
    }
}

/// Single writer of the [`SessionStore`]
pub struct SessionManager {
    api: ApiClient,
    store: SessionStore,
    credentials: CredentialStore,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl SessionManager {
    pub fn new(
        api: ApiClient,
        store: SessionStore,
        credentials: CredentialStore,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            store,
            credentials,
            notifier,
            navigator,
        }
    }

    /// Wire up a manager with a file-backed durable tier and an in-memory
    /// volatile tier.
    pub fn from_config(
        config: Config,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SessionError> {
        let path = config.credentials_path().ok_or(StorageError::Unavailable)?;
        let credentials = CredentialStore::new(
            Arc::new(FileStore::open(path)?),
            Arc::new(MemoryStore::new()),
        );
        let api = ApiClient::new(config)?;
        Ok(Self::new(api, SessionStore::new(), credentials, notifier, navigator))
    }

    /// Read handle for UI layers
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Restore the session from saved credentials.
    ///
    /// Failures mean the saved token is stale; the session is cleared and
    /// nothing is shown to the user.
    pub async fn initialize_auth(&self) {
        if self.store.is_authenticated() {
            return;
        }
        let Some(pair) = self.credentials.load() else {
            tracing::debug!("[AUTH] No saved credentials");
            return;
        };

        let _loading = self.store.begin(Operation::User);
        match self.api.get_user(&pair.user_id, &pair.token).await {
            Ok(user) => {
                tracing::info!("[AUTH] Restored session for user {}", user.id);
                self.store.sign_in(user, pair.token);
            }
            Err(e) => {
                tracing::debug!("[AUTH] Saved credentials rejected: {}", e);
                self.store.clear();
            }
        }
    }

    /// Email/password login
    pub async fn login(&self, credentials: LoginCredentials) {
        let contact = ContactMethod::Email(credentials.identifier.clone());
        self.login_via(Operation::Login, contact, &credentials, LOGIN_SUCCESS)
            .await;
    }

    /// Phone/password login
    pub async fn login_with_phone(&self, credentials: LoginCredentials) {
        let contact = ContactMethod::Phone(credentials.identifier.clone());
        self.login_via(Operation::LoginWithPhone, contact, &credentials, PHONE_LOGIN_SUCCESS)
            .await;
    }

    async fn login_via(
        &self,
        operation: Operation,
        contact: ContactMethod,
        credentials: &LoginCredentials,
        success: &str,
    ) {
        let _loading = self.store.begin(operation);
        let result = async {
            let body = LoginRequest {
                contact,
                password: &credentials.password,
            };
            let response = self.api.login(&body).await?;
            self.accept(response, StorageTier::for_remember(credentials.remember))
        }
        .await;

        match result {
            Ok(()) => {
                self.notifier.notify(Notification::success(success));
                self.navigator.navigate(Route::Home);
            }
            Err(e) => self.fail(operation, &e, LOGIN_FALLBACK),
        }
    }

    /// Create an account. The session is left pending until the code is verified.
    pub async fn register_user(&self, registration: Registration) {
        let _loading = self.store.begin(Operation::Register);
        let route = Route::verify_for(registration.contact.kind());

        let result = async {
            let body = RegisterRequest {
                name: &registration.name,
                password: &registration.password,
                contact: registration.contact.clone(),
            };
            let response = self.api.register(&body).await?;
            let pair = CredentialPair::new(response.profile.id.clone(), response.token);
            self.credentials
                .persist(&pair, StorageTier::for_remember(registration.remember))?;

            let mut pending = response.profile;
            pending.name = Some(registration.name.clone());
            match &registration.contact {
                ContactMethod::Email(email) => pending.email = Some(email.clone()),
                ContactMethod::Phone(phone) => pending.phone = Some(phone.clone()),
            }
            self.store.register_pending(pending);
            Ok::<_, SessionError>(response.message)
        }
        .await;

        match result {
            Ok(message) => {
                tracing::info!("[AUTH] Registered via {}", registration.contact.kind());
                self.navigator.navigate(route);
                self.notifier.notify(Notification::success(
                    message.unwrap_or_else(|| REGISTERED_DEFAULT.to_string()),
                ));
            }
            Err(e) => self.fail(Operation::Register, &e, GENERIC_ERROR),
        }
    }

    /// Submit the emailed one-time code
    pub async fn verify_email(&self, code: &str) {
        self.verify(Operation::VerifyEmail, Channel::Email, code).await;
    }

    /// Submit the texted one-time code
    pub async fn verify_phone(&self, code: &str) {
        self.verify(Operation::VerifyPhone, Channel::Phone, code).await;
    }

    async fn verify(&self, operation: Operation, channel: Channel, code: &str) {
        let _loading = self.store.begin(operation);
        let result = async {
            let pending = self.store.snapshot().user().cloned();
            let contact = pending
                .as_ref()
                .and_then(|user| channel.contact_from(user))
                .ok_or_else(|| channel.missing())?;

            let body = VerifyRequest { contact, otp: code };
            let mut response = self.api.verify(&body).await?;
            if let Some(pending) = pending {
                fill_missing(&mut response.profile, pending);
            }
            // Verified credentials always go to the durable tier.
            self.accept(response, StorageTier::Durable)
        }
        .await;

        match result {
            Ok(()) => {
                self.notifier.notify(Notification::success(VERIFIED));
                self.navigator.navigate(Route::Home);
            }
            Err(e) => self.fail(operation, &e, GENERIC_ERROR),
        }
    }

    pub async fn resend_email(&self) {
        self.resend(Operation::ResendEmail, Channel::Email).await;
    }

    pub async fn resend_phone(&self) {
        self.resend(Operation::ResendPhone, Channel::Phone).await;
    }

    async fn resend(&self, operation: Operation, channel: Channel) {
        let _loading = self.store.begin(operation);
        let result = async {
            let contact = self
                .store
                .snapshot()
                .user()
                .and_then(|user| channel.contact_from(user))
                .ok_or_else(|| channel.missing())?;
            let response = self.api.resend_verification(&ResendRequest { contact }).await?;
            Ok::<_, SessionError>(response.message)
        }
        .await;

        match result {
            Ok(message) => self.succeed(message, RESENT_DEFAULT),
            Err(e) => self.fail(operation, &e, GENERIC_ERROR),
        }
    }

    /// Request a password reset code. Returns whether the request went through
    /// so multi-step forms know when to advance.
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> bool {
        let _loading = self.store.begin(Operation::ForgotPassword);
        match self.api.forgot_password(&request).await {
            Ok(response) => {
                self.succeed(response.message, FORGOT_DEFAULT);
                true
            }
            Err(e) => {
                self.fail(Operation::ForgotPassword, &e.into(), GENERIC_ERROR);
                false
            }
        }
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) {
        let _loading = self.store.begin(Operation::ResetPassword);
        match self.api.reset_password(&request).await {
            Ok(response) => {
                self.succeed(response.message, RESET_DEFAULT);
                self.navigator.navigate(Route::Login);
            }
            Err(e) => self.fail(Operation::ResetPassword, &e.into(), GENERIC_ERROR),
        }
    }

    /// Forget the session locally. The server is not contacted.
    pub fn logout_user(&self) {
        self.store.clear();
        match self.credentials.clear_all() {
            Ok(()) => {
                tracing::info!("[AUTH] Logged out");
                self.notifier.notify(Notification::success(LOGGED_OUT));
            }
            Err(e) => {
                tracing::error!("[AUTH] Logout could not clear saved credentials: {}", e);
                self.notifier.notify(Notification::error(LOGOUT_FAILED));
            }
        }
    }

    /// Persist the pair from an auth response, then sign in with it
    fn accept(&self, response: AuthResponse, tier: StorageTier) -> Result<(), SessionError> {
        let pair = CredentialPair::new(response.profile.id.clone(), response.token.clone());
        self.credentials.persist(&pair, tier)?;
        tracing::info!("[AUTH] Signed in as user {}", response.profile.id);
        self.store.sign_in(response.profile, response.token);
        Ok(())
    }

    fn succeed(&self, message: Option<String>, default: &str) {
        let message = message.unwrap_or_else(|| default.to_string());
        self.notifier.notify(Notification::success(message));
    }

    fn fail(&self, operation: Operation, error: &SessionError, fallback: &str) {
        tracing::warn!("[AUTH] {} failed: {}", operation, error);
        self.notifier
            .notify(Notification::error(error.user_message(fallback)));
    }
}

/// Keep profile fields the server left out of a verification response
fn fill_missing(profile: &mut UserProfile, pending: UserProfile) {
    if profile.name.is_none() {
        profile.name = pending.name;
    }
    if profile.email.is_none() {
        profile.email = pending.email;
    }
    if profile.phone.is_none() {
        profile.phone = pending.phone;
    }
    if profile.profile_image.is_none() {
        profile.profile_image = pending.profile_image;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::navigation::RecordingNavigator;
    use crate::client::notify::{NotificationKind, RecordingNotifier};
    use crate::client::types::UserId;

    fn manager() -> (SessionManager, Arc<RecordingNotifier>, Arc<RecordingNavigator>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        // Nothing listens on port 9; requests fail fast.
        let api = ApiClient::new(Config::for_url("http://127.0.0.1:9").unwrap()).unwrap();
        let manager = SessionManager::new(
            api,
            SessionStore::new(),
            CredentialStore::in_memory(),
            notifier.clone(),
            navigator.clone(),
        );
        (manager, notifier, navigator)
    }

    #[test]
    fn test_fill_missing_keeps_server_values() {
        let mut profile = UserProfile {
            id: UserId::new("42"),
            name: Some("Server".to_string()),
            email: None,
            phone: None,
            profile_image: None,
            role: Some("admin".to_string()),
        };
        let pending = UserProfile {
            id: UserId::new("42"),
            name: Some("Form".to_string()),
            email: Some("a@b.com".to_string()),
            phone: None,
            profile_image: None,
            role: None,
        };
        fill_missing(&mut profile, pending);
        assert_eq!(profile.name.as_deref(), Some("Server"));
        assert_eq!(profile.email.as_deref(), Some("a@b.com"));
        assert_eq!(profile.role.as_deref(), Some("admin"));
    }

    #[test]
    fn test_logout_without_session_still_clears() {
        let (manager, notifier, _) = manager();
        manager
            .credentials()
            .persist(
                &CredentialPair::new(UserId::new("1"), "t"),
                StorageTier::Volatile,
            )
            .unwrap();

        manager.logout_user();

        assert_eq!(manager.credentials().load(), None);
        assert!(!manager.store().is_authenticated());
        assert_eq!(notifier.last(), Some(Notification::success(LOGGED_OUT)));
    }

    #[tokio::test]
    async fn test_resend_without_pending_contact_skips_request() {
        let (manager, notifier, navigator) = manager();
        manager.resend_email().await;

        let last = notifier.last().unwrap();
        assert_eq!(last.kind, NotificationKind::Error);
        assert_eq!(last.message, GENERIC_ERROR);
        assert!(navigator.visited().is_empty());
        assert!(!manager.store().snapshot().is_loading(Operation::ResendEmail));
    }

    #[tokio::test]
    async fn test_verify_without_pending_contact_fails_locally() {
        let (manager, notifier, _) = manager();
        manager.verify_phone("123456").await;

        assert_eq!(notifier.last(), Some(Notification::error(GENERIC_ERROR)));
        assert!(!manager.store().is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_without_credentials_does_nothing() {
        let (manager, notifier, _) = manager();
        manager.initialize_auth().await;
        assert!(notifier.entries().is_empty());
        assert!(!manager.store().snapshot().loading().any());
    }
}
