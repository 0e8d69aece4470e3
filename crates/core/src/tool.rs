//! Tools and the errors they report back to the model.

mod error;
mod manager;
mod object;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub(crate) use manager::Manager;

/// The text handed back to the model, or why the call failed.
pub type ToolResult = Result<String, Error>;

/// Something the model can invoke by name while answering.
///
/// A tool describes itself with a name, a description and a JSON schema for
/// its input, all of which are sent to the model. Inputs are deserialized
/// into [`Tool::Input`] before [`Tool::execute`] runs, so a malformed call
/// never reaches the tool.
///
/// Tools that talk to an external service should hold a cheap handle to it
/// and clone that handle into the returned future.
pub trait Tool: Send + Sync + 'static {
    /// The deserialized input.
    type Input: DeserializeOwned;

    /// The name the model calls this tool by.
    fn name(&self) -> &str;

    /// Tells the model what the tool does.
    fn description(&self) -> &str;

    /// The JSON schema of [`Tool::Input`].
    fn parameter_schema(&self) -> &Value;

    /// Runs the tool.
    ///
    /// The future must not borrow `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}
