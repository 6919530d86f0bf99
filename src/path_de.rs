use serde::de::DeserializeOwned;
use thiserror::Error;

/// A decode failure together with the JSON path where it happened.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("at JSON path {path} → {message}")]
pub struct DecodeError {
    pub path: String,
    pub message: String,
}

impl DecodeError {
    fn from_path_error<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> Self {
        let path = err.path().to_string();
        DecodeError { path, message: err.into_inner().to_string() }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DecodeError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(DecodeError::from_path_error)
}

pub fn from_value_with_path<T: DeserializeOwned>(doc: serde_json::Value) -> Result<T, DecodeError> {
    serde_path_to_error::deserialize::<_, T>(doc).map_err(DecodeError::from_path_error)
}
