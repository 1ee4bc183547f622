//! Request bodies and response envelopes for both services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body for registering a new account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub login: String,
    pub email: String,
    pub password: String,
}

/// Body for authenticating with login and password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub login: String,
    pub password: String,
    pub remember_me: bool,
}

/// Body for switching a registered account to a new email address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmail {
    pub login: String,
    pub password: String,
    pub email: String,
}

/// Body for changing a password using a reset token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub login: String,
    pub token: String,
    pub old_password: String,
    pub new_password: String,
}

/// Body for requesting a password-reset email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPassword {
    pub login: String,
    pub email: String,
}

/// Forum rating block attached to a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub enabled: bool,
    pub quality: i32,
    pub quantity: i32,
}

/// Public user representation returned by most account endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub rating: Option<Rating>,
    pub online: Option<DateTime<Utc>>,
    pub registration: Option<DateTime<Utc>>,
}

/// Extended user representation returned by the current-user endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub info: Option<String>,
}

/// Response wrapper: a `resource` payload plus service metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEnvelope {
    pub resource: User,
    pub metadata: Option<serde_json::Value>,
}

/// Envelope flavor carrying the extended user payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsEnvelope {
    pub resource: UserDetails,
    pub metadata: Option<serde_json::Value>,
}

/// Listing returned by the mail-capture service.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    pub total: u32,
    pub count: u32,
    pub start: u32,
    pub items: Vec<InboxMessage>,
}

/// One captured outgoing email, immutable once fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct InboxMessage {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Content")]
    pub content: MessageContent,
}

/// Captured message content: MIME-style headers plus the raw body string.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "Headers", default)]
    pub headers: HashMap<String, Vec<String>>,
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Notification fields the account service embeds as JSON in a message body.
///
/// Activation emails carry `ConfirmationLinkUrl`, reset emails
/// `ConfirmationLinkUri`; either may be absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailPayload {
    pub login: Option<String>,
    pub confirmation_link_url: Option<String>,
    pub confirmation_link_uri: Option<String>,
}

impl InboxMessage {
    /// First address of the `To` header, if the capture recorded one.
    pub fn recipient(&self) -> Option<&str> {
        self.content
            .headers
            .get("To")
            .and_then(|addrs| addrs.first())
            .map(String::as_str)
    }

    /// Parse the raw body as an account-service notification.
    ///
    /// Returns `None` for bodies that are not valid JSON of that shape;
    /// captured mail can contain anything, so this is not an error.
    pub fn payload(&self) -> Option<MailPayload> {
        serde_json::from_str(&self.content.body).ok()
    }
}
