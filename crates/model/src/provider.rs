use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// Errors reported by a provider, classified by [`ErrorKind`].
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Classifies the error.
    fn kind(&self) -> ErrorKind;
}

/// A vendor backend that turns a [`ModelRequest`] into a streamed
/// [`ModelResponse`].
///
/// Providers are shared by reference and carry no conversation state; every
/// request holds the whole history. Connection pools and the like are fine.
pub trait ModelProvider: Send + Sync {
    /// The error returned by this provider and its responses.
    type Error: ModelProviderError;

    /// The streamed response of this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Starts a request.
    ///
    /// Everything needed is captured up front: the future owns its data and
    /// outlives both `self` and `req`.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
