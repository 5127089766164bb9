use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format version {0}")]
    Unsupported(u32),

    /// The payload is the page reference as given by the caller, formatted
    /// `#123` for ids and `"Title"` for titles.
    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("link not found: from #{src} to #{dst}")]
    LinkNotFound { src: u32, dst: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
