//! The sampling loop — call the model, run its tool requests, feed the
//! results back, repeat until the model stops asking for tools.
//!
//! ## Architecture
//!
//! - [`Session`]: history plus per-call observability state, owned by the
//!   embedding application and passed in by reference. No globals.
//! - [`Hooks`]: three synchronous notification sinks (assistant blocks,
//!   tool results, API exchanges). The loop never reads state back from
//!   them; a slow sink stalls the loop.
//! - [`run_turn`]: one entry per new user message. Terminates when the
//!   assistant turn contains no tool-use blocks, or when the remote call
//!   faults. There is deliberately no iteration cap here; that policy
//!   belongs to the embedding application.

pub mod prompt;

use std::collections::HashMap;

use futures_util::future::join_all;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::client::{
    ApiError, ConverseRequest, ConverseResponse, InferenceConfig, RemoteModel, SystemBlock,
};
use crate::config::Config;
use crate::messages::{ContentBlock, Message, Role};
use crate::prune::{prune_images, IMAGE_CHUNK_FLOOR};
use crate::tools::{ToolExecutionResult, ToolRegistry};
use crate::wire::{from_wire, to_wire, tool_result_block};

/// Beta flag advertising the computer-use tool types.
pub const COMPUTER_USE_BETA_FLAG: &str = "computer-use-2024-10-22";

/// Observability sinks consumed by the embedding application (typically a
/// UI layer). Pure notifications; default impls drop everything.
pub trait Hooks: Send + Sync {
    fn on_assistant_block(&self, _block: &ContentBlock) {}

    fn on_tool_result(&self, _result: &ToolExecutionResult, _tool_use_id: &str) {}

    fn on_api_exchange(
        &self,
        _request: &ConverseRequest,
        _response: Option<&ConverseResponse>,
        _fault: Option<&ApiError>,
    ) {
    }
}

/// Sink that drops every notification.
pub struct NullHooks;

impl Hooks for NullHooks {}

/// A recorded request/response pair, kept for observability.
#[derive(Debug, Clone)]
pub struct ApiExchange {
    pub request: ConverseRequest,
    pub response: Option<ConverseResponse>,
    /// Rendered fault text when the call failed.
    pub fault: Option<String>,
}

/// One conversation: the full message sequence plus per-call bookkeeping.
///
/// History grows monotonically; nothing here truncates it except the image
/// pruner working on the tool-result image subset.
#[derive(Default)]
pub struct Session {
    pub history: Vec<Message>,
    exchanges: HashMap<Uuid, ApiExchange>,
    tool_results: HashMap<String, ToolExecutionResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an externally supplied history (must end in a user turn).
    pub fn with_history(history: Vec<Message>) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    /// Append a new user message, readying the session for [`run_turn`].
    pub fn push_user_text(&mut self, text: impl Into<String>) {
        self.history.push(Message::user_text(text));
    }

    pub fn exchanges(&self) -> &HashMap<Uuid, ApiExchange> {
        &self.exchanges
    }

    /// Last execution result for a tool-call id.
    pub fn tool_result(&self, tool_use_id: &str) -> Option<&ToolExecutionResult> {
        self.tool_results.get(tool_use_id)
    }
}

/// How one call to [`run_turn`] ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The assistant made no further tool requests; control returns to
    /// whatever supplies the next user input.
    EndTurn,
    /// The remote call failed. History is preserved up to, but not
    /// including, the failed call; the fault was also surfaced through
    /// the API-exchange hook.
    TransportFault(ApiError),
}

/// Drive the sampling loop for one user turn.
pub async fn run_turn(
    session: &mut Session,
    model: &dyn RemoteModel,
    tools: &ToolRegistry,
    hooks: &dyn Hooks,
    config: &Config,
) -> TurnOutcome {
    loop {
        prune_images(
            &mut session.history,
            config.image_retention_limit,
            IMAGE_CHUNK_FLOOR,
        );

        let request = build_request(&session.history, tools, config);
        let exchange_id = Uuid::new_v4();

        let response = match model.converse(&request).await {
            Ok(response) => response,
            Err(fault) => {
                tracing::warn!(%fault, "remote call failed, ending turn");
                hooks.on_api_exchange(&request, None, Some(&fault));
                session.exchanges.insert(
                    exchange_id,
                    ApiExchange {
                        request,
                        response: None,
                        fault: Some(fault.to_string()),
                    },
                );
                return TurnOutcome::TransportFault(fault);
            }
        };

        hooks.on_api_exchange(&request, Some(&response), None);
        session.exchanges.insert(
            exchange_id,
            ApiExchange {
                request,
                response: Some(response.clone()),
                fault: None,
            },
        );

        let assistant_blocks: Vec<ContentBlock> =
            response.output.message.content.iter().map(from_wire).collect();

        // Appended even when the model returned zero blocks; an empty
        // assistant turn is treated as a legal terminal state.
        session
            .history
            .push(Message::new(Role::Assistant, assistant_blocks.clone()));

        for block in &assistant_blocks {
            hooks.on_assistant_block(block);
        }

        let requests: Vec<(String, String, Value)> = assistant_blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.clone(), name.clone(), input.clone()))
                }
                _ => None,
            })
            .collect();

        if requests.is_empty() {
            return TurnOutcome::EndTurn;
        }

        // Invocations are independent and may overlap; join_all hands the
        // results back in request order regardless of completion order.
        let results = join_all(
            requests
                .iter()
                .map(|(_, name, input)| tools.execute(name, input.clone())),
        )
        .await;

        let mut reply = Vec::with_capacity(results.len());
        for ((id, _, _), result) in requests.iter().zip(results) {
            hooks.on_tool_result(&result, id);
            reply.push(tool_result_block(&result, id));
            session.tool_results.insert(id.clone(), result);
        }

        session.history.push(Message::new(Role::User, reply));
    }
}

fn build_request(history: &[Message], tools: &ToolRegistry, config: &Config) -> ConverseRequest {
    ConverseRequest {
        model_id: config.model_id.clone(),
        messages: to_wire(history),
        system: vec![SystemBlock {
            text: prompt::build_system_prompt(&config.system_prompt_suffix),
        }],
        inference_config: InferenceConfig {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        },
        additional_model_request_fields: json!({
            "tools": tools.specs(),
            "anthropic_beta": [COMPUTER_USE_BETA_FLAG],
        }),
        tool_config: tool_config_stub(),
    }
}

/// The endpoint insists on a non-empty `toolConfig`; the real tool
/// declarations ride in `additionalModelRequestFields`.
fn tool_config_stub() -> Value {
    json!({
        "tools": [{
            "toolSpec": {
                "name": "dummy_tool",
                "description": "Never use this tool.",
                "inputSchema": {"json": {"type": "object"}}
            }
        }]
    })
}
