//! Typed façade over [`HttpClient`] for the SmartQ customer endpoints.
//!
//! Each method maps to a fixed endpoint/method/body triple. Two carry extra
//! behavior: `login` validates the token/user pair and rewrites error copy to
//! match the form the user filled in, and `change_username` negotiates the
//! HTTP verb once when the backend rejects POST.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::contact::Contact;
use crate::error::{ClientError, Result};
use crate::http::HttpClient;
use crate::normalize;
use crate::shops::Shop;
use crate::traits::BaseAuthApi;
use crate::types::{
    Acknowledgement, ChangeUsername, LoginCredentials, LoginSession, OtpVerification,
    RegisterCustomer,
};

const REGISTER: &str = "/customers/register";
const LOGIN: &str = "/customers/login";
const SEND_PHONE_OTP: &str = "/customers/send-phone-otp";
const VERIFY_PHONE_OTP: &str = "/customers/verify-phone-otp";
const SEND_EMAIL_OTP: &str = "/customers/send-email-otp";
const VERIFY_EMAIL_OTP: &str = "/customers/verify-email-otp";
const CHANGE_USERNAME: &str = "/customers/change-username";
const SHOPS: &str = "/shops/all";

/// Shown when login succeeds at the transport level but yields no session.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// One-shot verb negotiation for endpoints whose accepted method drifted.
///
/// A failure of the primary verb is reclassified as
/// [`ClientError::VerbUnsupported`] only when the backend message matches the
/// closed pattern set (`cannot post`, `not found`, `cannot (post|put|patch)`).
/// The caller then retries once with the fallback verb; there is no loop.
#[derive(Debug, Clone)]
pub struct VerbFallback {
    pub primary: Method,
    pub fallback: Method,
}

impl VerbFallback {
    pub fn post_then_patch() -> Self {
        Self {
            primary: Method::POST,
            fallback: Method::PATCH,
        }
    }

    /// Whether a backend message says the verb/route was rejected.
    pub fn is_rejection(message: &str) -> bool {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        PATTERN
            .get_or_init(|| {
                Regex::new(r"(?i)cannot post|not found|cannot (post|put|patch)")
                    .expect("verb rejection pattern is valid")
            })
            .is_match(message)
    }

    /// Reclassify a primary-verb failure.
    pub fn classify(&self, err: ClientError) -> ClientError {
        match err {
            ClientError::Request { message, .. } if Self::is_rejection(&message) => {
                ClientError::VerbUnsupported {
                    method: self.primary.to_string(),
                    message,
                }
            }
            other => other,
        }
    }
}

/// Rewrite login copy so it names the field the user actually filled in.
pub fn rewrite_login_message(message: &str, credentials: &LoginCredentials) -> String {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    static IDENTITY: OnceLock<Regex> = OnceLock::new();

    if credentials.is_phone() {
        IDENTITY
            .get_or_init(|| {
                Regex::new(r"(?i)\b(?:username\s*/\s*email|username or email|email|username)\b")
                    .expect("identity pattern is valid")
            })
            .replace_all(message, "phone number")
            .into_owned()
    } else {
        PHONE
            .get_or_init(|| {
                Regex::new(r"(?i)\b(?:phone\s*number|phone)\b").expect("phone pattern is valid")
            })
            .replace_all(message, "username/email")
            .into_owned()
    }
}

fn rewrite_login_error(err: ClientError, credentials: &LoginCredentials) -> ClientError {
    match err {
        ClientError::Request { status, message } => ClientError::Request {
            status,
            message: rewrite_login_message(&message, credentials),
        },
        ClientError::InvalidCredentials(message) => {
            ClientError::InvalidCredentials(rewrite_login_message(&message, credentials))
        }
        other => other,
    }
}

/// Decode the `data` envelope (or the bare body) into `T`.
///
/// Fields the backend leaves out take their defaults; a body of the wrong
/// shape degrades to `T::default()` with the message preserved where possible.
fn envelope<T: DeserializeOwned + Default>(value: &Value) -> T {
    let data = normalize::data_envelope(value);
    match serde_json::from_value(data.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(error = %e, "Unexpected response envelope, using defaults");
            T::default()
        }
    }
}

fn acknowledgement(value: &Value) -> Acknowledgement {
    let mut ack: Acknowledgement = envelope(value);
    if ack.message.is_empty() {
        ack.message = normalize::extract_message(value).unwrap_or_default();
    }
    ack
}

/// SmartQ customer API.
#[derive(Debug, Clone)]
pub struct SmartQApi {
    http: HttpClient,
}

impl SmartQApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Underlying transport (shares the auth config with this façade).
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub async fn register(&self, customer: &RegisterCustomer) -> Result<Acknowledgement> {
        let body = serde_json::to_value(customer)?;
        let value = self.http.post(REGISTER, &body).await?;
        Ok(acknowledgement(&value))
    }

    /// Log in. 2xx without both a token and a user is `InvalidCredentials`.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginSession> {
        let value = self
            .http
            .post(LOGIN, &credentials.to_body())
            .await
            .map_err(|e| rewrite_login_error(e, credentials))?;

        match normalize::extract_session(&value) {
            Some(session) => {
                info!(identifier = %credentials.identifier(), "Login succeeded");
                Ok(LoginSession {
                    token: session.token,
                    user: session.user,
                })
            }
            None => {
                let message = normalize::extract_message(&value)
                    .unwrap_or_else(|| INVALID_CREDENTIALS.to_string());
                warn!(identifier = %credentials.identifier(), "Login returned no session");
                Err(ClientError::InvalidCredentials(rewrite_login_message(
                    &message,
                    credentials,
                )))
            }
        }
    }

    pub async fn send_phone_otp(&self, phone_number: &str) -> Result<Acknowledgement> {
        let body = serde_json::json!({ "phoneNumber": phone_number });
        let value = self.http.post(SEND_PHONE_OTP, &body).await?;
        Ok(acknowledgement(&value))
    }

    pub async fn verify_phone_otp(&self, phone_number: &str, otp: &str) -> Result<OtpVerification> {
        let body = serde_json::json!({ "phoneNumber": phone_number, "otp": otp });
        let value = self.http.post(VERIFY_PHONE_OTP, &body).await?;
        Ok(envelope(&value))
    }

    pub async fn send_email_otp(&self, email: &str) -> Result<Acknowledgement> {
        let body = serde_json::json!({ "email": email });
        let value = self.http.post(SEND_EMAIL_OTP, &body).await?;
        Ok(acknowledgement(&value))
    }

    pub async fn verify_email_otp(&self, email: &str, otp: &str) -> Result<OtpVerification> {
        let body = serde_json::json!({ "email": email, "otp": otp });
        let value = self.http.post(VERIFY_EMAIL_OTP, &body).await?;
        Ok(envelope(&value))
    }

    /// Change the username, retrying once with PATCH if the backend rejects POST.
    ///
    /// When the retry also fails, its error is returned, not the POST one.
    pub async fn change_username(&self, payload: &ChangeUsername) -> Result<Acknowledgement> {
        let body = serde_json::to_value(payload)?;
        let policy = VerbFallback::post_then_patch();

        let first = self
            .http
            .request(
                policy.primary.clone(),
                CHANGE_USERNAME,
                Some(&body),
                &Default::default(),
            )
            .await
            .map_err(|e| policy.classify(e));

        let value = match first {
            Ok(value) => value,
            Err(ClientError::VerbUnsupported { method, message }) => {
                info!(
                    rejected = %method,
                    retry = %policy.fallback,
                    reason = %message,
                    "Change username: retrying with fallback verb"
                );
                self.http
                    .request(
                        policy.fallback.clone(),
                        CHANGE_USERNAME,
                        Some(&body),
                        &Default::default(),
                    )
                    .await?
            }
            Err(e) => return Err(e),
        };

        Ok(acknowledgement(&value))
    }

    /// Fetch the shop feed, accepting a bare array, `{data}` or `{shops}`.
    pub async fn list_shops(&self) -> Result<Vec<Shop>> {
        let value = self.http.get(SHOPS).await?;
        let shops = Shop::from_values(normalize::unwrap_list(&value));
        debug!(count = shops.len(), "Fetched shops");
        Ok(shops)
    }
}

#[async_trait]
impl BaseAuthApi for SmartQApi {
    async fn send_code(&self, contact: &Contact) -> Result<Acknowledgement> {
        match contact {
            Contact::Email(email) => self.send_email_otp(email).await,
            Contact::Phone(phone) => self.send_phone_otp(phone).await,
        }
    }

    async fn verify_code(&self, contact: &Contact, code: &str) -> Result<OtpVerification> {
        match contact {
            Contact::Email(email) => self.verify_email_otp(email, code).await,
            Contact::Phone(phone) => self.verify_phone_otp(phone, code).await,
        }
    }

    async fn register(&self, customer: &RegisterCustomer) -> Result<Acknowledgement> {
        SmartQApi::register(self, customer).await
    }
}
