use regex::Regex;
use std::env;
use std::sync::OnceLock;

use crate::ConfigError;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
    })
}

/// Interpolate environment variables in a string.
/// Replaces `${VAR_NAME}` with the value of the environment variable.
pub fn interpolate_env(input: &str) -> Result<String, ConfigError> {
    let mut result = input.to_string();
    let mut errors = Vec::new();

    let matches: Vec<(String, String)> = var_pattern()
        .captures_iter(input)
        .map(|cap| (cap[0].to_string(), cap[1].to_string()))
        .collect();

    for (full_match, var_name) in matches {
        match env::var(&var_name) {
            Ok(value) => {
                result = result.replace(&full_match, &value);
            }
            Err(_) => {
                if !errors.contains(&var_name) {
                    errors.push(var_name);
                }
            }
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::MissingEnvVars(errors));
    }

    Ok(result)
}
