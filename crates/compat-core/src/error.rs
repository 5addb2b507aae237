use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompatError {
    #[error("feature not found: {0}")]
    NotFound(String),

    #[error("invalid support level '{0}'")]
    InvalidSupport(String),

    #[error("invalid feature id '{0}': empty segment")]
    InvalidFeatureId(String),

    #[error("malformed compat record for {feature_id}: {message}")]
    Malformed { feature_id: String, message: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompatError>;
