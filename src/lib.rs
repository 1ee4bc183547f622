//! # DM Account Client
//! Asynchronous client for the DM account-management REST API and its MailHog mail capture, wrapping registration, login, password and email changes behind typed models ([`AccountClient`]) and waiting out asynchronous confirmation emails with a bounded retry loop ([`TokenPoller`]).
//!
//! ## Audience and uses
//! For Rust developers writing integration tests against an account service whose activation and reset flows go through email: compose flows with [`AccountHelper`] (register-and-activate, reset-and-change-password), or drive the pieces directly: [`AccountClient`] for the API, [`MailhogClient`] for the captured inbox, [`TokenPoller`] with a [`TokenQuery`] to pull a token out of it.
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`, so ensure the chosen Tokio features (`rt-multi-thread` or `current_thread`) are available in your application.
//!
//! ## Out of scope
//! Not a mail client and not a service SDK for production use. It only drives the account and capture endpoints a test environment exposes, polls sequentially (no parallel attempts, no cancellation beyond the attempt budget), and persists nothing.
//!
//! ## Errors
//! All network calls surface transport and non-2xx statuses as [`Error::Request`]; an inbox listing that does not decode is [`Error::Json`]. An exhausted token poll is [`Error::TokenNotFound`], a hard failure, distinct from individual malformed messages, which are silently skipped. The crate-wide [`Result`] alias wraps these errors.
//!
//! ## Example
//! ```no_run
//! use dm_account_client::{AccountClient, AccountHelper, MailhogClient, random_login};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dm_account_client::Error> {
//!     let helper = AccountHelper::new(
//!         AccountClient::new("http://localhost:5051")?,
//!         MailhogClient::new("http://localhost:5025")?,
//!     );
//!
//!     let login = random_login(12);
//!     let user = helper
//!         .register_user(&login, "correct-horse", &format!("{login}@example.com"))
//!         .await?;
//!     println!("activated: {}", user.resource.login);
//!
//!     let token = helper.authorize(&login, "correct-horse").await?;
//!     helper.logout(&token).await?;
//!     Ok(())
//! }
//! ```

mod account;
mod error;
mod helper;
mod mailhog;
mod models;
mod poller;

pub use account::{
    AUTH_TOKEN_HEADER, AccountClient, AccountClientBuilder, AuthToken, LoginResponse,
};
pub use error::Error;
pub use helper::{AccountHelper, random_email, random_login};
pub use mailhog::{MailhogClient, MailhogClientBuilder};
pub use models::{
    ChangeEmail, ChangePassword, InboxMessage, LoginCredentials, MailPayload, MessageContent,
    MessageList, Rating, Registration, ResetPassword, User, UserDetails, UserDetailsEnvelope,
    UserEnvelope,
};
pub use poller::{LinkField, MatchBy, PollConfig, TieBreak, TokenPoller, TokenQuery};

/// Result type alias for account and mail-capture operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
