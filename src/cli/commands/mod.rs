use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("bennu")
        .about("Credential and session authentication service")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("BENNU_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("token-secret")
                .long("token-secret")
                .help("Secret used to sign access tokens")
                .env("BENNU_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("csrf-key")
                .long("csrf-key")
                .help("Key used to derive CSRF tokens")
                .env("BENNU_CSRF_KEY")
                .required(true),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Public base URL used in emailed links and CORS origin")
                .default_value("http://localhost:8080")
                .env("BENNU_BASE_URL"),
        )
        .arg(
            Arg::new("store-timeout")
                .long("store-timeout")
                .help("Per-operation store timeout in seconds")
                .default_value("5")
                .env("BENNU_STORE_TIMEOUT")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("enforce-csrf")
                .long("enforce-csrf")
                .help("Reject state-changing requests without a valid CSRF token")
                .env("BENNU_ENFORCE_CSRF")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("BENNU_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "bennu");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Credential and session authentication service"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_port_and_secrets() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "bennu",
            "--port",
            "8080",
            "--token-secret",
            "token-secret",
            "--csrf-key",
            "csrf-key",
            "--base-url",
            "https://bennu.dev",
        ]);

        assert_eq!(matches.get_one::<u16>("port").map(|s| *s), Some(8080));
        assert_eq!(
            matches
                .get_one::<String>("token-secret")
                .map(|s| s.to_string()),
            Some("token-secret".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("csrf-key").map(|s| s.to_string()),
            Some("csrf-key".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("base-url").map(|s| s.to_string()),
            Some("https://bennu.dev".to_string())
        );
        assert_eq!(matches.get_one::<u64>("store-timeout").map(|s| *s), Some(5));
        assert!(!matches.get_flag("enforce-csrf"));
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("BENNU_PORT", Some("443")),
                ("BENNU_TOKEN_SECRET", Some("env-token-secret")),
                ("BENNU_CSRF_KEY", Some("env-csrf-key")),
                ("BENNU_BASE_URL", Some("https://auth.example.com")),
                ("BENNU_STORE_TIMEOUT", Some("10")),
                ("BENNU_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["bennu"]);
                assert_eq!(matches.get_one::<u16>("port").map(|s| *s), Some(443));
                assert_eq!(
                    matches
                        .get_one::<String>("token-secret")
                        .map(|s| s.to_string()),
                    Some("env-token-secret".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("base-url").map(|s| s.to_string()),
                    Some("https://auth.example.com".to_string())
                );
                assert_eq!(
                    matches.get_one::<u64>("store-timeout").map(|s| *s),
                    Some(10)
                );
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("BENNU_LOG_LEVEL", Some(level)),
                    ("BENNU_TOKEN_SECRET", Some("token-secret")),
                    ("BENNU_CSRF_KEY", Some("csrf-key")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["bennu"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").map(|s| *s),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("BENNU_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "bennu".to_string(),
                    "--token-secret".to_string(),
                    "token-secret".to_string(),
                    "--csrf-key".to_string(),
                    "csrf-key".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }
}
