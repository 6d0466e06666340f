// Trait definitions for dependency injection
//
// Infrastructure seams only. The OTP flow drives these so it can run against
// the real API or an in-process fake.
//
// Naming convention: Base* for trait names (e.g., BaseAuthApi)

use async_trait::async_trait;

use crate::contact::Contact;
use crate::error::Result;
use crate::types::{Acknowledgement, OtpVerification, RegisterCustomer};

#[async_trait]
pub trait BaseAuthApi: Send + Sync {
    /// Request a fresh code for the contact's channel (SMS or email).
    async fn send_code(&self, contact: &Contact) -> Result<Acknowledgement>;

    /// Check a 6-digit code for the contact.
    async fn verify_code(&self, contact: &Contact, code: &str) -> Result<OtpVerification>;

    /// Create the customer account once the contact is verified.
    async fn register(&self, customer: &RegisterCustomer) -> Result<Acknowledgement>;
}
