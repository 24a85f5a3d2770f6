//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ChatclickConfig, LogOutput, LoggingConfig, ReplyConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ChatclickConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_reply_config(&config.reply)?;
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for module in logging.filters.keys() {
        if module.trim().is_empty() || module.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid logging filter target: {module:?}"
            )));
        }
    }

    Ok(())
}

/// Validates reply formatting settings.
fn validate_reply_config(reply: &ReplyConfig) -> ConfigResult<()> {
    validate_color("reply.error_color", &reply.error_color)?;

    if reply.help_pretext.trim().is_empty() {
        return Err(ConfigError::missing_field("reply.help_pretext"));
    }

    Ok(())
}

/// Validates a `#RRGGBB`-style colour.
fn validate_color(field: &str, value: &str) -> ConfigResult<()> {
    let Some(hex) = value.strip_prefix('#') else {
        return Err(ConfigError::invalid_color(field, value));
    };
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::invalid_color(field, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = ChatclickConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_bad_colors() {
        for color in ["", "FF0000", "#", "#GG0000"] {
            let mut config = ChatclickConfig::default();
            config.reply.error_color = color.to_string();
            assert!(
                matches!(
                    validate_config(&config),
                    Err(ConfigError::InvalidColor { .. })
                ),
                "{color:?}"
            );
        }
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = ChatclickConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some("chatclick.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
