use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no captions: {0}")]
    NoCaptions(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaptionError {
    pub fn is_no_captions(&self) -> bool {
        matches!(self, CaptionError::NoCaptions(_))
    }
}

impl From<quick_xml::Error> for CaptionError {
    fn from(err: quick_xml::Error) -> Self {
        CaptionError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for CaptionError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        CaptionError::Xml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CaptionError>;
