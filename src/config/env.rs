use std::env;
use std::str::FromStr;

use super::ConfigError;

/// Read an environment variable, treating blank values as unset.
pub fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
pub fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_var_blank_is_unset() {
        unsafe {
            env::set_var("CALLBOT_TEST_BLANK", "   ");
        }
        assert_eq!(env_var("CALLBOT_TEST_BLANK"), None);
        unsafe {
            env::remove_var("CALLBOT_TEST_BLANK");
        }
    }

    #[test]
    #[serial]
    fn test_env_parse() {
        unsafe {
            env::set_var("CALLBOT_TEST_NUMBER", "42");
        }
        assert_eq!(env_parse::<u32>("CALLBOT_TEST_NUMBER", 7).unwrap(), 42);
        assert_eq!(env_parse::<u32>("CALLBOT_TEST_UNSET", 7).unwrap(), 7);

        unsafe {
            env::set_var("CALLBOT_TEST_NUMBER", "many");
        }
        assert!(matches!(
            env_parse::<u32>("CALLBOT_TEST_NUMBER", 7),
            Err(ConfigError::InvalidValue { .. })
        ));
        unsafe {
            env::remove_var("CALLBOT_TEST_NUMBER");
        }
    }
}
