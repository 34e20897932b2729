use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("transport initialization failed on '{iface}': {reason}")]
    Transport { iface: String, reason: String },

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MotionError {
    pub fn transport(iface: impl Into<String>, reason: impl Into<String>) -> Self {
        MotionError::Transport {
            iface: iface.into(),
            reason: reason.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, MotionError::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, MotionError>;
