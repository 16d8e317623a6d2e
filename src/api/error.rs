use derive_more::{Display, From};

#[derive(Debug, Display, From)]
pub enum ApiError {
    #[from]
    #[display("request failed: {_0}")]
    Transport(reqwest::Error),
    #[display("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },
    #[display("unexpected response: {_0}")]
    UnexpectedResponse(String),
    #[display("no API token configured")]
    MissingToken,
}

impl ApiError {
    /// Text shown to the user. Backend messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => "Network error. Please check your connection.".to_owned(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::UnexpectedResponse(_) => "Unexpected response from server".to_owned(),
            ApiError::MissingToken => "You are not logged in".to_owned(),
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Rejected {
                status: 401 | 403,
                ..
            } | ApiError::MissingToken
        )
    }
}

impl std::error::Error for ApiError {}
