use thiserror::Error;

/// Errors raised while loading or validating shading configuration.
///
/// The shading pipeline itself never fails; out-of-range numbers are clamped
/// or substituted in place. These errors only surface at the boundary where
/// parameters, materials, and output buffers come in from the host.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Failed to parse configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Output buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
}

impl ShaderError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ShaderError::InvalidParameter { name, reason: reason.into() }
    }
}
