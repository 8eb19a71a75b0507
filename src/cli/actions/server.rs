use crate::api;
use crate::api::handlers::auth::{AuthConfig, AuthState, NoopRateLimiter};
use crate::api::handlers::Factory;
use crate::cli::actions::Action;
use crate::email::LogMailer;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        token_secret,
        csrf_key,
        base_url,
        store_timeout_seconds,
        enforce_csrf,
    } = action;

    let factory = Factory::in_memory(Duration::from_secs(store_timeout_seconds));
    let config = AuthConfig::new(base_url).with_enforce_csrf(enforce_csrf);

    let auth_state = AuthState::new(
        config,
        &token_secret,
        csrf_key,
        &factory,
        Arc::new(LogMailer),
        Arc::new(NoopRateLimiter),
    )
    .map_err(|err| anyhow!("failed to build auth state: {err}"))?;

    api::new(port, factory, Arc::new(auth_state)).await?;

    Ok(())
}
