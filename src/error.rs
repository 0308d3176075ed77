use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    #[error("Invalid theme value: {value:?}")]
    Validation { value: String },

    #[error("Preference store error: {0}")]
    Persistence(String),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<ThemeError> for String {
    fn from(err: ThemeError) -> Self {
        err.to_string()
    }
}
