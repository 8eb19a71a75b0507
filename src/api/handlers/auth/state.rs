//! Auth configuration and shared request state.

use secrecy::SecretString;
use std::sync::Arc;

use crate::email::Mailer;

use super::access::AccessTokenSigner;
use super::credentials::CredentialStore;
use super::csrf::CsrfGuard;
use super::error::AuthError;
use super::password::PasswordPolicy;
use super::rate_limit::RateLimiter;
use super::sessions::SessionRegistry;
use super::verification::VerificationRegistry;
use crate::api::handlers::Factory;

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
const DEFAULT_EMAIL_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 30 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    email_token_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    enforce_csrf: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            email_token_ttl_seconds: DEFAULT_EMAIL_TOKEN_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            enforce_csrf: false,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_email_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.email_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_enforce_csrf(mut self, enforce: bool) -> Self {
        self.enforce_csrf = enforce;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(super) fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    pub(super) fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    pub(super) fn email_token_ttl_seconds(&self) -> i64 {
        self.email_token_ttl_seconds
    }

    pub(super) fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub fn enforce_csrf(&self) -> bool {
        self.enforce_csrf
    }

    /// Only mark cookies secure when the service fronts HTTPS.
    pub(super) fn cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    password: PasswordPolicy,
    signer: AccessTokenSigner,
    csrf: CsrfGuard,
    credentials: CredentialStore,
    sessions: SessionRegistry,
    verifications: VerificationRegistry,
    mailer: Arc<dyn Mailer>,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        token_secret: &SecretString,
        csrf_key: SecretString,
        factory: &Factory,
        mailer: Arc<dyn Mailer>,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Result<Self, AuthError> {
        let signer = AccessTokenSigner::new(token_secret, config.access_token_ttl_seconds());
        let sessions = SessionRegistry::new(factory.sessions(), config.refresh_token_ttl_seconds());
        Ok(Self {
            password: PasswordPolicy::new()?,
            signer,
            csrf: CsrfGuard::new(csrf_key),
            credentials: CredentialStore::new(factory.users()),
            sessions,
            verifications: VerificationRegistry::new(factory.verifications()),
            mailer,
            rate_limiter,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn password(&self) -> &PasswordPolicy {
        &self.password
    }

    #[must_use]
    pub fn signer(&self) -> &AccessTokenSigner {
        &self.signer
    }

    pub(crate) fn csrf(&self) -> &CsrfGuard {
        &self.csrf
    }

    pub(crate) fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub(crate) fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub(crate) fn verifications(&self) -> &VerificationRegistry {
        &self.verifications
    }

    pub(crate) fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub(super) fn rate_limiter(&self) -> &dyn RateLimiter {
        self.rate_limiter.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("https://bennu.dev".to_string());

        assert_eq!(config.base_url(), "https://bennu.dev");
        assert_eq!(
            config.access_token_ttl_seconds(),
            DEFAULT_ACCESS_TOKEN_TTL_SECONDS
        );
        assert_eq!(
            config.refresh_token_ttl_seconds(),
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS
        );
        assert_eq!(
            config.email_token_ttl_seconds(),
            DEFAULT_EMAIL_TOKEN_TTL_SECONDS
        );
        assert!(!config.enforce_csrf());
        assert!(config.cookie_secure());

        let config = config
            .with_access_token_ttl_seconds(60)
            .with_refresh_token_ttl_seconds(120)
            .with_email_token_ttl_seconds(180)
            .with_reset_token_ttl_seconds(240)
            .with_enforce_csrf(true);

        assert_eq!(config.access_token_ttl_seconds(), 60);
        assert_eq!(config.refresh_token_ttl_seconds(), 120);
        assert_eq!(config.email_token_ttl_seconds(), 180);
        assert_eq!(config.reset_token_ttl_seconds(), 240);
        assert!(config.enforce_csrf());
    }

    #[test]
    fn plain_http_base_url_leaves_cookies_insecure() {
        let config = AuthConfig::new("http://localhost:8080".to_string());
        assert!(!config.cookie_secure());
    }
}
