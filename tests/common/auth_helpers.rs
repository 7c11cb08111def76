//! Response bodies and credentials for authentication tests

use serde_json::{json, Value};

pub const EMAIL: &str = "a@b.com";
pub const PHONE: &str = "+15550100";
pub const PASSWORD: &str = "x";

/// Body of a successful login/registration/verification
pub fn auth_body(id: &str, token: &str) -> Value {
    json!({
        "id": id,
        "token": token,
        "name": "Dana",
        "email": EMAIL,
    })
}

/// Body of the user record returned by `GET /users/{id}`
pub fn user_body(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Dana",
        "email": EMAIL,
        "profileImage": "https://cdn.example.com/dana.png",
    })
}

pub fn message_body(message: &str) -> Value {
    json!({ "message": message })
}
