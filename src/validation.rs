use thiserror::Error;

/// User input rejected before any state change happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a rating.")]
    MissingRating,

    #[error("Please enter a comment.")]
    MissingComment,

    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    #[error("Please enter a name for the asset.")]
    MissingName,

    #[error("No file selected")]
    MissingFile,

    #[error("Unsupported file type '{extension}', expected .glb or .gltf")]
    UnsupportedFile { extension: String },

    #[error("File is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
}

pub type ValidationResult<T> = Result<T, ValidationError>;
