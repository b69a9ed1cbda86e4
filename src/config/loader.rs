//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::TidemarkConfig;
use crate::domain::errors::TidemarkError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into TidemarkConfig
/// 4. Applies environment variable overrides (TIDEMARK_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use tidemark::config::loader::load_config;
///
/// let config = load_config("tidemark.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TidemarkConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TidemarkError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        TidemarkError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: TidemarkConfig = toml::from_str(&contents)
        .map_err(|e| TidemarkError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        TidemarkError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(TidemarkError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the TIDEMARK_* prefix
///
/// Environment variables follow the pattern: TIDEMARK_<SECTION>_<KEY>
/// For example: TIDEMARK_EXPORT_TABLES, TIDEMARK_EXPORT_WINDOW_MINUTES
fn apply_env_overrides(config: &mut TidemarkConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("TIDEMARK_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("TIDEMARK_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Export overrides
    if let Ok(val) = std::env::var("TIDEMARK_EXPORT_TABLES") {
        config.export.tables = val;
    }
    if let Ok(val) = std::env::var("TIDEMARK_EXPORT_WINDOW_MINUTES") {
        if let Ok(minutes) = val.parse() {
            config.export.window_minutes = minutes;
        }
    }
    if let Ok(val) = std::env::var("TIDEMARK_EXPORT_POLL_INTERVAL_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.export.poll_interval_seconds = seconds;
        }
    }
    if let Ok(val) = std::env::var("TIDEMARK_EXPORT_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.export.retry.max_retries = retries;
        }
    }

    // Store overrides
    if let Ok(val) = std::env::var("TIDEMARK_STORE_PREFIX") {
        config.store.prefix = val;
    }
    if let Ok(val) = std::env::var("TIDEMARK_STORE_PATH") {
        config.store.path = val;
    }

    // Notification overrides
    if let Ok(val) = std::env::var("TIDEMARK_NOTIFICATION_TOPIC_NAME") {
        config.notification.topic_name = Some(val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("TIDEMARK_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("TIDEMARK_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("TIDEMARK_TEST_VAR", "orders");
        let input = "tables = \"${TIDEMARK_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "tables = \"orders\"\n");
        std::env::remove_var("TIDEMARK_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("TIDEMARK_MISSING_VAR");
        let input = "tables = \"${TIDEMARK_MISSING_VAR}\"";
        assert!(substitute_env_vars(input).is_err());
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# tables = \"${TIDEMARK_UNSET_IN_COMMENT}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "info"

[export]
tables = "orders,customers"
window_minutes = 60
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.export.tables, "orders,customers");
        assert_eq!(config.export.window_minutes, 60);
    }

    #[test]
    fn test_load_config_rejects_out_of_range_window() {
        let toml_content = r#"
[export]
tables = "orders"
window_minutes = 14
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("window_minutes"));
    }
}
