//! A provider-neutral protocol for talking to LLMs.
//!
//! The agent only ever sees the types defined here: a request made of
//! history messages and tool definitions, and a response that yields a
//! stream of events. Each model vendor lives in its own crate and maps its
//! wire format onto these types, so the agent never changes when a vendor
//! does.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
