//! Bounded retry loop that reads tokens out of captured mail.
//!
//! Account flows trigger emails asynchronously: the service accepts a
//! registration or reset request, and the confirmation message shows up in
//! the capture inbox some time later. [`TokenPoller`] bridges that gap by
//! re-reading the full inbox on a fixed interval until a matching message
//! yields a token or the attempt budget runs out.

use crate::{Error, InboxMessage, MailhogClient, Result};
use std::time::Duration;

/// Which link field of the notification payload holds the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    /// `ConfirmationLinkUrl`, sent for registration and email changes.
    Activation,
    /// `ConfirmationLinkUri`, sent for password resets.
    Reset,
}

/// How a captured message is matched against the target user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchBy {
    /// Exact equality with the `Login` field of the notification payload.
    Login(String),
    /// Exact equality with the first address of the `To` header. Used
    /// after an email change, when the message goes to the new address.
    Recipient(String),
}

impl MatchBy {
    /// The login or address being matched, for diagnostics.
    pub fn key(&self) -> &str {
        match self {
            MatchBy::Login(login) => login,
            MatchBy::Recipient(address) => address,
        }
    }
}

/// Which message wins when several match the same key.
///
/// Both orderings occur in real account flows, so the choice is explicit
/// configuration rather than a fixed rule: activation flows take the most
/// recent message (`Last`), the reset flow stops at the first one it sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Stop scanning at the first matching message.
    First,
    /// Scan the whole listing; a later match overwrites an earlier one.
    #[default]
    Last,
}

/// Target of one poll: who to look for and which link to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQuery {
    pub match_by: MatchBy,
    pub field: LinkField,
}

impl TokenQuery {
    /// Activation token for a freshly registered login.
    pub fn activation_by_login(login: impl Into<String>) -> Self {
        Self {
            match_by: MatchBy::Login(login.into()),
            field: LinkField::Activation,
        }
    }

    /// Reset token for a login that requested a password reset.
    pub fn reset_by_login(login: impl Into<String>) -> Self {
        Self {
            match_by: MatchBy::Login(login.into()),
            field: LinkField::Reset,
        }
    }

    /// Activation token delivered to a changed email address.
    pub fn activation_by_recipient(address: impl Into<String>) -> Self {
        Self {
            match_by: MatchBy::Recipient(address.into()),
            field: LinkField::Activation,
        }
    }
}

/// Retry budget and ordering for a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Inbox scans before giving up. Must be at least 1 to ever succeed.
    pub max_attempts: u32,
    /// Fixed wait between unsuccessful attempts.
    pub interval: Duration,
    pub tie_break: TieBreak,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(1),
            tie_break: TieBreak::Last,
        }
    }
}

impl PollConfig {
    /// The slower flavor used after an email change, when delivery to the
    /// new address can lag: same budget, 3-second interval.
    pub fn relaxed() -> Self {
        Self {
            interval: Duration::from_secs(3),
            ..Self::default()
        }
    }
}

/// Polls the mail-capture inbox until a query yields a token.
///
/// Each attempt re-fetches the complete listing, so the inbox itself stays
/// the source of truth; the poller keeps no state between attempts and
/// never mutates the inbox. Transport errors from the listing call abort
/// the poll immediately rather than being retried.
#[derive(Debug, Clone)]
pub struct TokenPoller {
    mailhog: MailhogClient,
    config: PollConfig,
}

impl TokenPoller {
    /// Create a poller with the default budget (5 attempts, 1s apart,
    /// last match wins).
    pub fn new(mailhog: MailhogClient) -> Self {
        Self {
            mailhog,
            config: PollConfig::default(),
        }
    }

    /// Create a poller with an explicit budget and ordering.
    pub fn with_config(mailhog: MailhogClient, config: PollConfig) -> Self {
        Self { mailhog, config }
    }

    /// Poll until `query` yields a token or the budget is exhausted.
    ///
    /// Messages that do not parse as a notification, do not match, or
    /// carry a missing or malformed link are skipped; only budget
    /// exhaustion fails the poll, with [`Error::TokenNotFound`].
    ///
    /// # Examples
    /// ```no_run
    /// # use dm_account_client::{MailhogClient, TokenPoller, TokenQuery};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), dm_account_client::Error> {
    /// let mailhog = MailhogClient::new("http://localhost:5025")?;
    /// let poller = TokenPoller::new(mailhog);
    /// let token = poller.poll(&TokenQuery::activation_by_login("alice")).await?;
    /// println!("{token}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn poll(&self, query: &TokenQuery) -> Result<String> {
        for attempt in 1..=self.config.max_attempts {
            tracing::debug!(attempt, key = query.match_by.key(), "polling inbox for token");

            let messages = self.mailhog.messages().await?;
            if let Some(token) = scan(&messages, query, self.config.tie_break) {
                tracing::debug!(attempt, key = query.match_by.key(), "token found");
                return Ok(token);
            }

            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        tracing::warn!(
            key = query.match_by.key(),
            attempts = self.config.max_attempts,
            "token poll exhausted"
        );
        Err(Error::TokenNotFound {
            match_key: query.match_by.key().to_string(),
            attempts: self.config.max_attempts,
        })
    }
}

/// Scan one inbox snapshot for a token, honoring the tie-break order.
fn scan(messages: &[InboxMessage], query: &TokenQuery, tie_break: TieBreak) -> Option<String> {
    let mut token = None;

    for message in messages {
        let Some(payload) = message.payload() else {
            continue;
        };

        let matched = match &query.match_by {
            MatchBy::Login(login) => payload.login.as_deref() == Some(login.as_str()),
            MatchBy::Recipient(address) => message.recipient() == Some(address.as_str()),
        };
        if !matched {
            continue;
        }

        let link = match query.field {
            LinkField::Activation => payload.confirmation_link_url.as_deref(),
            LinkField::Reset => payload.confirmation_link_uri.as_deref(),
        };
        let Some(segment) = link.and_then(trailing_segment) else {
            continue;
        };

        token = Some(segment.to_string());
        if tie_break == TieBreak::First {
            break;
        }
    }

    token
}

/// Non-empty path segment after the last `/`, or `None` for a link with no
/// path structure to split on.
fn trailing_segment(link: &str) -> Option<&str> {
    match link.rsplit_once('/') {
        Some((_, segment)) if !segment.is_empty() => Some(segment),
        _ => None,
    }
}
