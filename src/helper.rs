//! End-to-end account flows composed from the two service clients.

use crate::{
    AccountClient, AuthToken, ChangeEmail, ChangePassword, Error, LoginCredentials, LoginResponse,
    MailhogClient, PollConfig, Registration, ResetPassword, Result, TieBreak, TokenPoller,
    TokenQuery, UserEnvelope,
};
use rand::{Rng, distr::Alphanumeric};
use std::time::{Duration, Instant};

/// Drives complete account lifecycles: register and activate, log in,
/// change email or password, reset, log out.
///
/// Every flow that triggers a confirmation email polls the capture inbox
/// for the token with [`TokenPoller`] before moving on, so a call like
/// [`AccountHelper::register_user`] returns only once the account is
/// actually activated.
#[derive(Debug, Clone)]
pub struct AccountHelper {
    account: AccountClient,
    mailhog: MailhogClient,
    activation_deadline: Option<Duration>,
}

impl AccountHelper {
    pub fn new(account: AccountClient, mailhog: MailhogClient) -> Self {
        Self {
            account,
            mailhog,
            activation_deadline: None,
        }
    }

    /// Fail [`AccountHelper::register_user`] with [`Error::DeadlineExceeded`]
    /// when its poll-and-activate sequence takes longer than `deadline`.
    ///
    /// Off by default. Useful as an end-to-end latency assertion on the
    /// mail pipeline, on top of the poller's own attempt budget.
    pub fn with_activation_deadline(mut self, deadline: Duration) -> Self {
        self.activation_deadline = Some(deadline);
        self
    }

    /// Register a new user, wait for the activation email, and activate.
    pub async fn register_user(
        &self,
        login: &str,
        password: &str,
        email: &str,
    ) -> Result<UserEnvelope> {
        self.account
            .register(&Registration {
                login: login.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        let started = Instant::now();
        let token = self.activation_token_by_login(login).await?;
        let activated = self.account.activate(&token).await?;

        if let Some(budget) = self.activation_deadline {
            let elapsed = started.elapsed();
            if elapsed > budget {
                return Err(Error::DeadlineExceeded { elapsed, budget });
            }
        }

        tracing::debug!(login, "user registered and activated");
        Ok(activated)
    }

    /// Log in and return the envelope plus the captured session token.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<LoginResponse> {
        self.account
            .login(&LoginCredentials {
                login: login.to_string(),
                password: password.to_string(),
                remember_me,
            })
            .await
    }

    /// Log in and keep only the session token, for flows that just need
    /// an authorized credential to pass to later calls.
    pub async fn authorize(&self, login: &str, password: &str) -> Result<AuthToken> {
        let session = self.login(login, password, true).await?;
        Ok(session.token)
    }

    /// Change a user's email, then re-activate the account with the token
    /// from the confirmation sent to the old login's notification stream.
    pub async fn change_email(
        &self,
        login: &str,
        password: &str,
        new_email: &str,
    ) -> Result<UserEnvelope> {
        self.account
            .change_email(&ChangeEmail {
                login: login.to_string(),
                password: password.to_string(),
                email: new_email.to_string(),
            })
            .await?;

        let token = self.activation_token_by_login(login).await?;
        self.account.activate(&token).await
    }

    /// Request a password reset and return the emailed reset token.
    pub async fn reset_password(&self, login: &str, email: &str) -> Result<String> {
        self.account
            .request_password_reset(&ResetPassword {
                login: login.to_string(),
                email: email.to_string(),
            })
            .await?;

        self.reset_token_by_login(login).await
    }

    /// Change a password using a token from [`AccountHelper::reset_password`].
    pub async fn change_password(
        &self,
        login: &str,
        reset_token: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<UserEnvelope> {
        self.account
            .change_password(&ChangePassword {
                login: login.to_string(),
                token: reset_token.to_string(),
                old_password: old_password.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    /// End the session on this device.
    pub async fn logout(&self, auth: &AuthToken) -> Result<()> {
        self.account.logout(auth).await
    }

    /// End the user's sessions on every device.
    pub async fn logout_all(&self, auth: &AuthToken) -> Result<()> {
        self.account.logout_all(auth).await
    }

    /// Poll for an activation token by login: 1-second interval, most
    /// recent matching message wins.
    pub async fn activation_token_by_login(&self, login: &str) -> Result<String> {
        self.poller(PollConfig::default())
            .poll(&TokenQuery::activation_by_login(login))
            .await
    }

    /// Poll for a reset token by login: 1-second interval, first matching
    /// message wins.
    pub async fn reset_token_by_login(&self, login: &str) -> Result<String> {
        let config = PollConfig {
            tie_break: TieBreak::First,
            ..PollConfig::default()
        };
        self.poller(config)
            .poll(&TokenQuery::reset_by_login(login))
            .await
    }

    /// Poll for the activation token delivered to a changed address,
    /// matching on the `To` header: 3-second interval, most recent wins.
    pub async fn activation_token_by_recipient(&self, address: &str) -> Result<String> {
        self.poller(PollConfig::relaxed())
            .poll(&TokenQuery::activation_by_recipient(address))
            .await
    }

    fn poller(&self, config: PollConfig) -> TokenPoller {
        TokenPoller::with_config(self.mailhog.clone(), config)
    }
}

/// Generate a random lowercase alphanumeric login, 6 to 32 characters.
///
/// Unique identities keep parallel test runs from tripping over each
/// other's accounts.
pub fn random_login(len: usize) -> String {
    let length = len.clamp(6, 32);
    let mut rng = rand::rng();
    let raw: String = (0..length)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect();
    raw.to_lowercase()
}

/// Build an email address for a generated login.
pub fn random_email(login: &str, domain: &str) -> String {
    format!("{login}@{domain}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_login_clamps_length_and_lowercases() {
        let short = random_login(1);
        assert_eq!(short.len(), 6);

        let long = random_login(100);
        assert_eq!(long.len(), 32);

        let login = random_login(12);
        assert_eq!(login.len(), 12);
        assert!(login.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn random_email_joins_login_and_domain() {
        assert_eq!(random_email("alice", "example.com"), "alice@example.com");
    }
}
