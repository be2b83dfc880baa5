use thiserror::Error;

/// Failure talking to the news provider. The affected category is skipped
/// for the current cycle; nothing is written to the ledger.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("news request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bad request url: {0}")]
    Url(#[from] url::ParseError),
    #[error("news provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("news provider rejected the request: {0}")]
    Provider(String),
}

/// Failure reading or writing one of the sqlite-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// Transport failure while pushing a message to a recipient.
#[derive(Debug, Error)]
#[error("send failed: {reason}")]
pub struct SendError {
    reason: String,
}

impl SendError {
    #[cfg(test)]
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl From<teloxide::RequestError> for SendError {
    fn from(err: teloxide::RequestError) -> Self {
        Self {
            reason: err.to_string(),
        }
    }
}
