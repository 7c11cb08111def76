/**
 * Wire Types
 *
 * Request and response schemas for the platform API, plus the typed inputs
 * the session operations accept.
 */

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::shared::error::SharedError;

/// Opaque user identifier. The API sends it as either a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(Self)
    }
}

/// Decode an identifier sent as a non-empty string or an unsigned integer
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) if text.trim().is_empty() => Err(D::Error::custom("empty identifier")),
        Raw::Text(text) => Ok(text),
        Raw::Number(number) => Ok(number.to_string()),
    }
}

/// Profile record for the signed-in (or pending) user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Body returned by login, registration and verification endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body returned by endpoints that only acknowledge
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// The contact a user registers, verifies or recovers with.
///
/// Serializes as a single `email` or `phone` field when flattened into a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Email(String),
    Phone(String),
}

impl ContactMethod {
    /// Path segment used by the `register-*` / `verify-*` endpoints
    pub fn kind(&self) -> &'static str {
        match self {
            ContactMethod::Email(_) => "email",
            ContactMethod::Phone(_) => "phone",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ContactMethod::Email(value) | ContactMethod::Phone(value) => value,
        }
    }
}

/// Login form input
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    /// Email for `login`, phone number for `login_with_phone`
    pub identifier: String,
    pub password: String,
    /// Keep the credentials across restarts
    pub remember: bool,
}

impl LoginCredentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>, remember: bool) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
            remember,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(flatten)]
    pub contact: ContactMethod,
    pub password: &'a str,
}

/// Registration form input with exactly one contact method
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub password: String,
    pub contact: ContactMethod,
    pub remember: bool,
}

impl Registration {
    /// Validate untyped form fields. Exactly one of `email` or `phone` must be filled in.
    pub fn from_form(
        name: &str,
        password: &str,
        email: Option<&str>,
        phone: Option<&str>,
        remember: bool,
    ) -> Result<Self, SharedError> {
        fn filled(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        if name.trim().is_empty() {
            return Err(SharedError::validation("name", "Name is required"));
        }
        if password.is_empty() {
            return Err(SharedError::validation("password", "Password is required"));
        }

        let contact = match (filled(email), filled(phone)) {
            (Some(email), None) => ContactMethod::Email(email.to_string()),
            (None, Some(phone)) => ContactMethod::Phone(phone.to_string()),
            (Some(_), Some(_)) => {
                return Err(SharedError::validation(
                    "contact",
                    "Provide either an email or a phone number, not both",
                ))
            }
            (None, None) => {
                return Err(SharedError::validation(
                    "contact",
                    "An email or a phone number is required",
                ))
            }
        };

        Ok(Self {
            name: name.trim().to_string(),
            password: password.to_string(),
            contact,
            remember,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub password: &'a str,
    #[serde(flatten)]
    pub contact: ContactMethod,
}

#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    #[serde(flatten)]
    pub contact: ContactMethod,
    pub otp: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResendRequest {
    #[serde(flatten)]
    pub contact: ContactMethod,
}

/// Password recovery request
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    #[serde(flatten)]
    pub contact: ContactMethod,
}

/// New password submission
#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    #[serde(flatten)]
    pub contact: ContactMethod,
    pub otp: String,
    pub password: String,
}
