use webscout_model::{ErrorKind, ModelProviderError};

/// Errors returned by [`crate::Agent::ask`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The model provider failed to answer.
    #[error("model request failed: {0}")]
    Model(Box<dyn ModelProviderError>),
    /// The history ended without a user message to answer.
    #[error("nothing to answer: the history has no user message")]
    NoUserInput,
}

impl Error {
    /// Returns the provider error kind, if the error came from the model.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Model(err) => Some(err.kind()),
            Error::NoUserInput => None,
        }
    }
}
