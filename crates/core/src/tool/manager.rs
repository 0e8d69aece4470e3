use std::sync::Arc;

use webscout_model::{ModelTool, ToolCallRequest, ToolCallResult};

use crate::tool::object::{ToolObject, ToolObjectImpl};
use crate::tool::{Error, Tool};

/// An object that manages the toolset and handles requests from the model.
///
/// Tools are kept in registration order, which is also the order they are
/// advertised to the model.
#[derive(Default)]
pub struct Manager {
    tools: Vec<Arc<dyn ToolObject>>,
}

impl Manager {
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        if self.find(tool.name()).is_some() {
            warn!("tool `{}` is registered twice, keeping both", tool.name());
        }
        self.tools.push(Arc::new(ToolObjectImpl(tool)));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Runs the requested tool and converts the outcome into a result the
    /// model can read. Failures never abort the caller, they become error
    /// results instead.
    pub async fn call(&self, req: ToolCallRequest) -> ToolCallResult {
        let ToolCallRequest {
            id,
            name,
            arguments,
        } = req;

        let outcome = match self.find(&name) {
            Some(tool) => {
                trace!("running tool `{name}` ({id}) with args: {arguments:?}");
                tool.execute(arguments).await
            }
            None => {
                warn!("tool not found: {name}");
                Err(Error::not_found().with_reason(format!("unknown tool `{name}`")))
            }
        };

        match outcome {
            Ok(content) => ToolCallResult {
                id,
                content,
                is_error: false,
            },
            Err(err) => {
                debug!("tool `{name}` ({id}) failed: {err}");
                ToolCallResult {
                    id,
                    content: err.reason().into_owned(),
                    is_error: true,
                }
            }
        }
    }

    // The first registration wins when names collide.
    #[inline]
    fn find(&self, name: &str) -> Option<&Arc<dyn ToolObject>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }
}
