use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PortOneApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The request did not complete within {0} ms")]
    Timeout(u128),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl PortOneApiError {
    /// True for failures where PortOne (or the network) could not give an answer at all, as opposed to answering
    /// with something we did not expect.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RestRequestError(_) | Self::RestResponseError(_) => true,
            Self::QueryError { status, .. } => *status >= 500,
            Self::Initialization(_) | Self::JsonError(_) => false,
        }
    }
}
