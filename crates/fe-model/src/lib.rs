//! fe-model: persisted finite-element model and its validation.

pub mod area;
pub mod schema;
pub mod validate;

pub use area::{PhysicsArea, ProblemTypeMask};
pub use schema::*;
pub use validate::{CURRENT_VERSION, ValidationError, validate_model};

use std::path::Path;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported model file extension: {path}")]
    UnsupportedFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding, picked from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Yaml,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> ModelResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(ModelFormat::Json),
            Some("yaml") | Some("yml") => Ok(ModelFormat::Yaml),
            _ => Err(ModelError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

pub fn load(path: &Path) -> ModelResult<Model> {
    let format = ModelFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let model: Model = match format {
        ModelFormat::Json => serde_json::from_str(&content)?,
        ModelFormat::Yaml => serde_yaml::from_str(&content)?,
    };
    validate_model(&model)?;
    Ok(model)
}

pub fn save(path: &Path, model: &Model) -> ModelResult<()> {
    validate_model(model)?;
    let content = match ModelFormat::from_path(path)? {
        ModelFormat::Json => serde_json::to_string_pretty(model)?,
        ModelFormat::Yaml => serde_yaml::to_string(model)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
