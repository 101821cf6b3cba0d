use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted configuration path,
/// e.g. `provider.api_key` is read from `HAVEN_PROVIDER__API_KEY`
pub fn to_env_var(path: &str) -> String {
    format!("HAVEN_{}", path.replace('.', "__").to_uppercase())
}

/// Extract the dotted path from a "missing field `x` for key `y`" deserialization message
pub fn missing_field_path(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let (field, rest) = rest.split_once('`')?;
    let key = rest
        .strip_prefix(" for key `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(key, _)| key);

    Some(match key {
        Some(key) => format!("{}.{}", key, field),
        None => field.to_string(),
    })
}
