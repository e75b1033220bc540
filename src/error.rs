use miette::Diagnostic;
use thiserror::Error;

pub type VnResult<T> = Result<T, VnError>;

#[derive(Debug, Error, Diagnostic)]
pub enum VnError {
    #[error("story validation failed:\n{0}")]
    #[diagnostic(code("vn.invalid_story"))]
    InvalidStory(String),
    #[error("unknown scene '{0}'")]
    #[diagnostic(code("vn.unknown_scene"))]
    UnknownScene(String),
    #[error("unknown dialog node '{node}' in scene '{scene}'")]
    #[diagnostic(code("vn.unknown_node"))]
    UnknownNode { scene: String, node: String },
    #[error("serialization error: {0}")]
    #[diagnostic(code("vn.serialization"))]
    Serialization(String),
    #[error("save record format error: {0}")]
    #[diagnostic(code("vn.save_format"))]
    SaveFormat(String),
    #[error("save storage error: {0}")]
    #[diagnostic(code("vn.save_storage"))]
    SaveStorage(String),
}

impl From<crate::save::SaveStoreError> for VnError {
    fn from(value: crate::save::SaveStoreError) -> Self {
        match value {
            crate::save::SaveStoreError::Io(err) => VnError::SaveStorage(err.to_string()),
            crate::save::SaveStoreError::Save(err) => VnError::SaveFormat(err.to_string()),
        }
    }
}
