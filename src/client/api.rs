//! Platform API Client
//!
//! Typed async calls for every endpoint the session and order screens use.
//! Bodies are decoded at this boundary: a success response that does not
//! match its schema is reported as [`ApiError::MalformedResponse`] instead of
//! leaking half-parsed values upward.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::client::config::Config;
use crate::client::error::ApiError;
use crate::client::types::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResendRequest, ResetPasswordRequest, UserId, UserProfile, VerifyRequest,
};

/// HTTP client bound to one API base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Config,
    client: Client,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.app().request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `GET /users/{id}` with the stored token
    pub async fn get_user(&self, id: &UserId, token: &str) -> Result<UserProfile, ApiError> {
        let path = format!("/users/{}", id);
        let request = self.request_to(reqwest::Method::GET, &["users", id.as_str()]);
        let request = self.authorized(request, token);
        self.execute(&path, request).await
    }

    /// `POST /auth/login-email` or `/auth/login-phone`
    pub async fn login(&self, body: &LoginRequest<'_>) -> Result<AuthResponse, ApiError> {
        let path = format!("/auth/login-{}", body.contact.kind());
        self.post_auth(&path, body).await
    }

    /// `POST /auth/register-email` or `/auth/register-phone`
    pub async fn register(&self, body: &RegisterRequest<'_>) -> Result<AuthResponse, ApiError> {
        let path = format!("/auth/register-{}", body.contact.kind());
        self.post_auth(&path, body).await
    }

    /// `POST /auth/verify-email` or `/auth/verify-phone`
    pub async fn verify(&self, body: &VerifyRequest<'_>) -> Result<AuthResponse, ApiError> {
        let path = format!("/auth/verify-{}", body.contact.kind());
        self.post_auth(&path, body).await
    }

    /// `POST /auth/resend-email-verification` or `/auth/resend-phone-verification`
    pub async fn resend_verification(&self, body: &ResendRequest) -> Result<MessageResponse, ApiError> {
        let path = format!("/auth/resend-{}-verification", body.contact.kind());
        self.post(&path, body).await
    }

    pub async fn forgot_password(&self, body: &ForgotPasswordRequest) -> Result<MessageResponse, ApiError> {
        self.post("/auth/forgot-password", body).await
    }

    pub async fn reset_password(&self, body: &ResetPasswordRequest) -> Result<MessageResponse, ApiError> {
        self.post("/auth/reset-password", body).await
    }

    pub(crate) fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, self.config.authorization(token))
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.config.api_url(path)).json(body);
        self.execute(path, request).await
    }

    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.api_url(path))
    }

    /// Attach the token when there is one
    pub(crate) fn with_token(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => self.authorized(request, token),
            None => request,
        }
    }

    /// Like [`ApiClient::request`], with the path given as segments that may
    /// carry caller-supplied ids
    pub(crate) fn request_to(&self, method: reqwest::Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.config.endpoint(segments))
    }

    async fn post_auth<B>(&self, path: &str, body: &B) -> Result<AuthResponse, ApiError>
    where
        B: serde::Serialize + ?Sized,
    {
        let response: AuthResponse = self.post(path, body).await?;
        if response.token.trim().is_empty() {
            return Err(ApiError::malformed(path, "empty token"));
        }
        Ok(response)
    }

    /// Send a request and decode the body as `T`
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        tracing::debug!("[API] -> {}", path);
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            tracing::debug!("[API] <- {} {}", path, status);
            return Err(ApiError::from_error_body(status, &body));
        }

        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &body
        };
        serde_json::from_slice(body).map_err(|e| {
            tracing::warn!("[API] Unexpected body from {}: {}", path, e);
            ApiError::malformed(path, e.to_string())
        })
    }
}
