//! Connectivity check and user messages. Neither needs an open design.

use serde_json::json;

use super::support;
use crate::context::CommandContext;
use crate::handler::HandlerError;
use crate::protocol::{CommandId, Params};
use crate::registry::HandlerEntry;

pub(super) const ENTRIES: &[HandlerEntry] = &[
    HandlerEntry::new("ping", ping),
    HandlerEntry::new("message", message),
];

const MESSAGE_TITLE: &str = "cadbridge";

fn ping(ctx: &CommandContext<'_>, id: CommandId, _params: &Params) -> Result<(), HandlerError> {
    ctx.respond(id, json!({"message": "pong"}))
}

fn message(ctx: &CommandContext<'_>, id: CommandId, params: &Params) -> Result<(), HandlerError> {
    let text = support::text(params, "text", "Hello!")?;
    ctx.host().show_message(MESSAGE_TITLE, text);
    ctx.respond(id, json!({"message": "displayed"}))
}
