use crate::cli::actions::Action;
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        token_secret: matches
            .get_one::<String>("token-secret")
            .map(|s| SecretString::from(s.as_str()))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --token-secret"))?,
        csrf_key: matches
            .get_one::<String>("csrf-key")
            .map(|s| SecretString::from(s.as_str()))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --csrf-key"))?,
        base_url: matches
            .get_one::<String>("base-url")
            .map(String::to_string)
            .unwrap_or_else(|| "http://localhost:8080".to_string()),
        store_timeout_seconds: matches
            .get_one::<u64>("store-timeout")
            .copied()
            .unwrap_or(5),
        enforce_csrf: matches.get_flag("enforce-csrf"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn handler_builds_the_server_action() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "bennu",
            "--token-secret",
            "token-secret",
            "--csrf-key",
            "csrf-key",
            "--base-url",
            "https://bennu.dev",
            "--store-timeout",
            "7",
            "--enforce-csrf",
        ]);

        let Action::Server {
            port,
            token_secret,
            csrf_key,
            base_url,
            store_timeout_seconds,
            enforce_csrf,
        } = handler(&matches)?;

        assert_eq!(port, 8080);
        assert_eq!(token_secret.expose_secret(), "token-secret");
        assert_eq!(csrf_key.expose_secret(), "csrf-key");
        assert_eq!(base_url, "https://bennu.dev");
        assert_eq!(store_timeout_seconds, 7);
        assert!(enforce_csrf);
        Ok(())
    }
}
