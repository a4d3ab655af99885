use std::fmt;

#[derive(Debug)]
pub enum FitroomError {
    ConfigError(String),
    ImageDecodeError(String),
    NoImageReturned(String),
    ServiceError(String),
    ResponseError(String),
    SerializationError(String),
    RequestError(String),
}

impl fmt::Display for FitroomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitroomError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            FitroomError::ImageDecodeError(msg) => write!(f, "Image decode error: {}", msg),
            FitroomError::NoImageReturned(msg) => write!(f, "No image returned: {}", msg),
            FitroomError::ServiceError(msg) => write!(f, "Service error: {}", msg),
            FitroomError::ResponseError(msg) => write!(f, "Response error: {}", msg),
            FitroomError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            FitroomError::RequestError(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for FitroomError {}

pub type Result<T> = std::result::Result<T, FitroomError>;
