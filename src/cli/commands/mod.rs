use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
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

    Command::new("sesamo")
        .about("SCRAM login client for web-managed network devices")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .help("Device base URL, example: http://192.168.8.1")
                .env("SESAMO_URL")
                .required(true),
        )
        .arg(
            Arg::new("username")
                .long("username")
                .help("Administrative account name")
                .default_value("admin")
                .env("SESAMO_USERNAME"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Administrative account password")
                .env("SESAMO_PASSWORD")
                .required(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SESAMO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "sesamo");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "SCRAM login client for web-managed network devices"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_url_and_credentials() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "sesamo",
            "--url",
            "http://192.168.8.1",
            "--username",
            "admin",
            "--password",
            "hunter2",
        ]);

        assert_eq!(
            matches.get_one::<String>("url").map(|s| s.to_string()),
            Some("http://192.168.8.1".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("username").map(|s| s.to_string()),
            Some("admin".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("password").map(|s| s.to_string()),
            Some("hunter2".to_string())
        );
    }

    #[test]
    fn test_username_defaults_to_admin() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "sesamo",
            "--url",
            "http://192.168.8.1",
            "--password",
            "hunter2",
        ]);

        assert_eq!(
            matches.get_one::<String>("username").map(|s| s.to_string()),
            Some("admin".to_string())
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("SESAMO_URL", Some("http://192.168.8.1")),
                ("SESAMO_USERNAME", Some("admin")),
                ("SESAMO_PASSWORD", Some("hunter2")),
                ("SESAMO_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["sesamo"]);
                assert_eq!(
                    matches.get_one::<String>("url").map(|s| s.to_string()),
                    Some("http://192.168.8.1".to_string())
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
                    ("SESAMO_LOG_LEVEL", Some(level)),
                    ("SESAMO_URL", Some("http://192.168.8.1")),
                    ("SESAMO_PASSWORD", Some("hunter2")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["sesamo"]);
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
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("SESAMO_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "sesamo".to_string(),
                    "--url".to_string(),
                    "http://192.168.8.1".to_string(),
                    "--password".to_string(),
                    "hunter2".to_string(),
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
