//! Agentic sampling loop for computer-use models behind a Converse-style API.
//!
//! The crate drives one conversation: send the growing history to the model,
//! interpret the response as text plus tool-invocation requests, execute
//! those requests locally, feed the results back, and repeat until the model
//! stops asking for tools.
//!
//! - [`messages`]: the internal turn/content-block model
//! - [`wire`]: translation to and from the Converse wire shape
//! - [`prune`]: bounded sliding window over retained tool-result images
//! - [`tools`]: capability trait, dispatch registry, and the standard
//!   computer-use tool set
//! - [`agent`]: the loop itself, with session state and observability hooks
//! - [`client`]: the remote-call boundary and its fault taxonomy
//!
//! The interactive front-end, if any, lives outside this crate: it renders
//! what the [`agent::Hooks`] sinks hand it and supplies the next user
//! message.

pub mod agent;
pub mod client;
pub mod config;
pub mod messages;
pub mod prune;
pub mod tools;
pub mod wire;

pub use agent::{run_turn, Hooks, NullHooks, Session, TurnOutcome};
pub use client::{ApiError, ConverseClient, RemoteModel};
pub use config::Config;
pub use messages::{ContentBlock, Message, Role};
pub use tools::{Tool, ToolExecutionResult, ToolRegistry};
