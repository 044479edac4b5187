use serde_json::{json, Value};

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    MethodNotAllowed,
    NotFound,
    Forbidden,
    Storage(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Forbidden => 403,
            ApiError::NotFound => 404,
            ApiError::MethodNotAllowed => 405,
            ApiError::Storage(_) => 500,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ApiError::Storage(e) => json!({
                "error": "Internal server error",
                "message": e.to_string(),
            }),
            e => json!({ "error": e.to_string() }),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "{}", msg),
            ApiError::MethodNotAllowed => write!(f, "Method not allowed. Use GET or POST."),
            ApiError::NotFound => write!(f, "Nothing to see here."),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Storage(e)
    }
}
