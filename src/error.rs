use thiserror::Error;

/// Errors produced anywhere in the template → PDF pipeline
#[derive(Debug, Error)]
pub enum DocfillError {
    #[error("no template has been uploaded")]
    NotFound,

    #[error("required field is missing or blank: {0}")]
    MissingRequiredField(String),

    #[error("PDF rendering failed: {0}")]
    RenderFailure(String),

    #[error("invalid admin credential")]
    InvalidCredential,

    #[error("unreadable template document: {0}")]
    Document(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocfillError {
    /// Message shown to the person at the keyboard. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            DocfillError::NotFound => "Template not uploaded yet. Please contact the admin.".into(),
            DocfillError::MissingRequiredField(label) => format!("Please enter {}", label),
            DocfillError::RenderFailure(_) => {
                "The PDF could not be generated from the filled template.".into()
            }
            DocfillError::InvalidCredential => "Invalid Password".into(),
            DocfillError::Document(_) => {
                "The uploaded file is not a readable DOCX or text template.".into()
            }
            DocfillError::Io(_) | DocfillError::Json(_) => "Something went wrong, please try again.".into(),
        }
    }
}

/// Result type for docfill operations
pub type Result<T> = std::result::Result<T, DocfillError>;
