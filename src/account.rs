//! Client for the DM account-management REST API.

use crate::{
    ChangeEmail, ChangePassword, Error, LoginCredentials, Registration, ResetPassword, Result,
    UserDetailsEnvelope, UserEnvelope,
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

/// Response header carrying the session token after a successful login.
pub const AUTH_TOKEN_HEADER: &str = "x-dm-auth-token";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_VALUE: &str = "dm-account-client/0.3";

/// Opaque session token captured from a login response.
///
/// Authorized endpoints take this explicitly per call; the client itself
/// holds no session state, so one client can serve any number of users.
#[derive(Debug, Clone)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw header value, e.g. one captured outside this crate.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw header value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A successful login: the user envelope plus the captured session token.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user: UserEnvelope,
    pub token: AuthToken,
}

/// Async client for the DM account-management service.
///
/// Use [`AccountClient::new`] for defaults or [`AccountClient::builder`]
/// for custom settings like proxies and timeouts.
#[derive(Debug, Clone)]
pub struct AccountClient {
    http: reqwest::Client,
    base_url: String,
}

impl AccountClient {
    /// Create a client with default settings against `base_url`
    /// (e.g. `http://localhost:5051`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        AccountClientBuilder::new(base_url).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(base_url: impl Into<String>) -> AccountClientBuilder {
        AccountClientBuilder::new(base_url)
    }

    /// Register a new user account.
    ///
    /// The account stays inactive until [`AccountClient::activate`] is
    /// called with the token from the confirmation email.
    ///
    /// # Examples
    /// ```no_run
    /// # use dm_account_client::{AccountClient, Registration};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), dm_account_client::Error> {
    /// let client = AccountClient::new("http://localhost:5051")?;
    /// client
    ///     .register(&Registration {
    ///         login: "alice".into(),
    ///         email: "alice@example.com".into(),
    ///         password: "correct-horse".into(),
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        self.http
            .post(self.url("/v1/account"))
            .json(registration)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(login = %registration.login, "registration submitted");
        Ok(())
    }

    /// Activate a registered account with an emailed token.
    pub async fn activate(&self, token: &str) -> Result<UserEnvelope> {
        self.http
            .put(self.url(&format!("/v1/account/{token}")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(Into::into)
    }

    /// Fetch the current user for an authorized session.
    pub async fn current_user(&self, auth: &AuthToken) -> Result<UserDetailsEnvelope> {
        self.http
            .get(self.url("/v1/account"))
            .header(AUTH_TOKEN_HEADER, auth.as_str())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(Into::into)
    }

    /// Change a registered user's email address.
    ///
    /// The account drops back to inactive until the confirmation sent to
    /// the new address is used to [`AccountClient::activate`] it again.
    pub async fn change_email(&self, change: &ChangeEmail) -> Result<UserEnvelope> {
        self.http
            .put(self.url("/v1/account/email"))
            .json(change)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(Into::into)
    }

    /// Change a user's password using a reset token.
    pub async fn change_password(&self, change: &ChangePassword) -> Result<UserEnvelope> {
        self.http
            .put(self.url("/v1/account/password"))
            .json(change)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(Into::into)
    }

    /// Request a password-reset email for an account.
    pub async fn request_password_reset(&self, reset: &ResetPassword) -> Result<()> {
        self.http
            .post(self.url("/v1/account/password"))
            .json(reset)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Authenticate and capture the session token from the response headers.
    ///
    /// # Examples
    /// ```no_run
    /// # use dm_account_client::{AccountClient, LoginCredentials};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), dm_account_client::Error> {
    /// let client = AccountClient::new("http://localhost:5051")?;
    /// let session = client
    ///     .login(&LoginCredentials {
    ///         login: "alice".into(),
    ///         password: "correct-horse".into(),
    ///         remember_me: true,
    ///     })
    ///     .await?;
    /// let me = client.current_user(&session.token).await?;
    /// println!("{}", me.resource.user.login);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse> {
        let response = self
            .http
            .post(self.url("/v1/account/login"))
            .json(credentials)
            .send()
            .await?
            .error_for_status()?;

        let token = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(AuthToken::new)
            .ok_or(Error::MissingAuthToken)?;

        let user = response.json().await?;
        tracing::debug!(login = %credentials.login, "login succeeded");
        Ok(LoginResponse { user, token })
    }

    /// End the session behind `auth` on this device.
    pub async fn logout(&self, auth: &AuthToken) -> Result<()> {
        self.http
            .delete(self.url("/v1/account/login"))
            .header(AUTH_TOKEN_HEADER, auth.as_str())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// End the user's sessions on every device.
    pub async fn logout_all(&self, auth: &AuthToken) -> Result<()> {
        self.http
            .delete(self.url("/v1/account/login/all"))
            .header(AUTH_TOKEN_HEADER, auth.as_str())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Builder for configuring an [`AccountClient`].
#[derive(Debug, Clone)]
pub struct AccountClientBuilder {
    base_url: String,
    proxy: Option<String>,
    user_agent: String,
    timeout: Duration,
}

impl AccountClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - No proxy
    /// - 30-second request timeout
    /// - Crate user agent
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            proxy: None,
            user_agent: USER_AGENT_VALUE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Route all requests through a proxy URL (e.g. "http://127.0.0.1:8080").
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the default 30-second request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AccountClient> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers);

        if let Some(proxy_url) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(AccountClient {
            http: builder.build()?,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}
