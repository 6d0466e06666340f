//! SmartQ customer API client.
//!
//! Client-side core of the SmartQ queue app: a bearer-authenticated REST
//! transport with a hard request deadline, typed wrappers for the customer
//! endpoints, a persisted session, and the OTP verification flow used during
//! registration.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use smartq_client::{ClientConfig, FileTokenStore, HttpClient, LoginCredentials, SessionContext, SmartQApi};
//!
//! let config = ClientConfig::from_env()?;
//! let http = HttpClient::from_config(&config);
//! let session = SessionContext::new(http.clone(), Arc::new(FileTokenStore::new(&config.token_path)));
//! session.activate().await;
//!
//! let api = SmartQApi::new(http);
//! let user = session
//!     .login(&api, &LoginCredentials::UsernameOrEmail {
//!         username_or_email: "bob".into(),
//!         password: "secret".into(),
//!     })
//!     .await?;
//!
//! for shop in api.list_shops().await? {
//!     println!("{} ({})", shop.name, shop.category());
//! }
//! ```

pub mod api;
pub mod config;
pub mod contact;
pub mod error;
pub mod http;
pub mod normalize;
pub mod otp;
pub mod session;
pub mod shops;
pub mod token_store;
pub mod traits;
pub mod types;

pub use api::SmartQApi;
pub use config::ClientConfig;
pub use contact::Contact;
pub use error::{ClientError, Result};
pub use http::HttpClient;
pub use otp::{CountdownHandle, Navigation, OtpFlow, OtpPhase, Registration, ResendTimer};
pub use session::SessionContext;
pub use shops::Shop;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use traits::BaseAuthApi;
pub use types::{
    Acknowledgement, ChangeUsername, LoginCredentials, LoginSession, OtpVerification,
    RegisterCustomer, UserData,
};
