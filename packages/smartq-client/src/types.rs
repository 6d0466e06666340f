//! Request payloads and response types for the SmartQ API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /customers/register`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomer {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterCustomer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCustomer")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login form variants. The field the user typed into decides the body key.
#[derive(Clone)]
pub enum LoginCredentials {
    UsernameOrEmail { username_or_email: String, password: String },
    Email { email: String, password: String },
    Phone { phone_number: String, password: String },
}

impl LoginCredentials {
    /// Whether the user logged in with a phone number.
    pub fn is_phone(&self) -> bool {
        matches!(self, LoginCredentials::Phone { .. })
    }

    /// Identifier the user typed, for display and profile seeding.
    pub fn identifier(&self) -> &str {
        match self {
            LoginCredentials::UsernameOrEmail {
                username_or_email, ..
            } => username_or_email,
            LoginCredentials::Email { email, .. } => email,
            LoginCredentials::Phone { phone_number, .. } => phone_number,
        }
    }

    /// JSON body of `POST /customers/login`.
    pub fn to_body(&self) -> Value {
        match self {
            LoginCredentials::UsernameOrEmail {
                username_or_email,
                password,
            } => serde_json::json!({ "usernameOrEmail": username_or_email, "password": password }),
            LoginCredentials::Email { email, password } => {
                serde_json::json!({ "email": email, "password": password })
            }
            LoginCredentials::Phone {
                phone_number,
                password,
            } => serde_json::json!({ "phoneNumber": phone_number, "password": password }),
        }
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            LoginCredentials::UsernameOrEmail { .. } => "UsernameOrEmail",
            LoginCredentials::Email { .. } => "Email",
            LoginCredentials::Phone { .. } => "Phone",
        };
        f.debug_struct(kind)
            .field("identifier", &self.identifier())
            .finish_non_exhaustive()
    }
}

/// Body of `POST|PATCH /customers/change-username`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUsername {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// `{data: {success, message}}` responses (register, send OTP, change username).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Acknowledgement {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// Updated customer record, returned by change-username on some backends.
    #[serde(default)]
    pub customer: Option<Value>,
}

fn default_true() -> bool {
    true
}

impl Default for Acknowledgement {
    fn default() -> Self {
        Self {
            success: true,
            message: String::new(),
            customer: None,
        }
    }
}

/// `{data: {verified, message}}` responses of the verify-OTP endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OtpVerification {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub message: String,
}

/// Successful login: bearer token plus the backend's user record.
#[derive(Clone)]
pub struct LoginSession {
    pub token: String,
    pub user: Value,
}

impl std::fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Profile held by the session context. The password is never persisted.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(skip)]
    pub password: String,
    #[serde(default)]
    pub id: String,
}

impl UserData {
    /// Profile from a backend user record, tolerating missing fields.
    pub fn from_user_record(user: &Value) -> Self {
        let text = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| user.get(*key))
                .find_map(|value| match value {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .unwrap_or_default()
        };

        Self {
            username: text(&["username", "name"]),
            email: text(&["email"]),
            phone_number: text(&["phoneNumber", "phone"]),
            password: String::new(),
            id: text(&["id", "_id"]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.email.is_empty() && self.phone_number.is_empty()
    }
}

impl std::fmt::Debug for UserData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserData")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
