use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Transport,
    EmptyResponse,
}

/// Failure of a single remote fetch. Either kind aborts the enclosing batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{message}")]
    Transport { locator: Url, message: String },
    #[error("no data and no error returned for {locator}")]
    EmptyResponse { locator: Url },
}

impl FetchError {
    pub fn transport(locator: &Url, message: impl Into<String>) -> Self {
        Self::Transport {
            locator: locator.clone(),
            message: message.into(),
        }
    }

    pub fn empty_response(locator: &Url) -> Self {
        Self::EmptyResponse {
            locator: locator.clone(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } => ErrorCode::Transport,
            Self::EmptyResponse { .. } => ErrorCode::EmptyResponse,
        }
    }

    pub fn locator(&self) -> &Url {
        match self {
            Self::Transport { locator, .. } | Self::EmptyResponse { locator } => locator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failure_displays_its_cause_verbatim() {
        let locator = Url::parse("https://example.test/a.png").expect("url");
        let err = FetchError::transport(&locator, "timeout");
        assert_eq!(err.to_string(), "timeout");
        assert_eq!(err.code(), ErrorCode::Transport);
        assert_eq!(err.locator(), &locator);
    }

    #[test]
    fn empty_response_names_the_locator() {
        let locator = Url::parse("https://example.test/b.png").expect("url");
        let err = FetchError::empty_response(&locator);
        assert_eq!(err.code(), ErrorCode::EmptyResponse);
        assert!(err.to_string().contains("https://example.test/b.png"));
    }
}
