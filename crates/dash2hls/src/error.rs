use thiserror::Error;

#[derive(Error, Debug)]
pub enum Dash2HlsError {
    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("Invalid DASH manifest: {0}")]
    InvalidFileContent(String),

    #[error("Profile does not exist: {0}")]
    InvalidProfile(String),

    #[error("Remote manifest URL required to resolve relative url: {0}")]
    MissingRemoteUrl(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[cfg(feature = "fetch")]
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[cfg(feature = "fetch")]
    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    HexDecodeError(#[from] hex::FromHexError),
}

impl Dash2HlsError {
    pub(crate) fn content<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFileContent(message.into())
    }

    /// Whether the manifest could not be obtained at all, either from disk or over the network.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::InvalidPath(_) | Self::IOError(_) => true,
            #[cfg(feature = "fetch")]
            Self::HttpError(_) | Self::RequestError(_) => true,
            _ => false,
        }
    }
}

impl From<quick_xml::Error> for Dash2HlsError {
    fn from(error: quick_xml::Error) -> Self {
        Self::InvalidFileContent(format!("Unable to load file, {error}"))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Dash2HlsError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::InvalidFileContent(format!("Unable to load file, {error}"))
    }
}

pub type Dash2HlsResult<T> = Result<T, Dash2HlsError>;
