use std::fmt;

#[derive(Debug)]
pub enum StampError {
    UnknownTemplate(String),
    AssetMissing(String),
    TemplateCorrupt(String),
    FontEmbed(String),
    PageOutOfRange { page: usize, page_count: usize },
    EmptyBatch,
    InvalidTemplateDefinition(String),
    Archive(String),
    Io(std::io::Error),
}

impl fmt::Display for StampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StampError::UnknownTemplate(id) => write!(f, "unknown template: {}", id),
            StampError::AssetMissing(message) => write!(f, "asset missing: {}", message),
            StampError::TemplateCorrupt(message) => {
                write!(f, "template cannot be parsed: {}", message)
            }
            StampError::FontEmbed(message) => write!(f, "font embed failure: {}", message),
            StampError::PageOutOfRange { page, page_count } => {
                write!(
                    f,
                    "page index out of range: {} (template has {} pages)",
                    page, page_count
                )
            }
            StampError::EmptyBatch => write!(f, "no records provided for batch generation"),
            StampError::InvalidTemplateDefinition(message) => {
                write!(f, "invalid template definition: {}", message)
            }
            StampError::Archive(message) => write!(f, "archive error: {}", message),
            StampError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for StampError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StampError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StampError {
    fn from(value: std::io::Error) -> Self {
        StampError::Io(value)
    }
}
