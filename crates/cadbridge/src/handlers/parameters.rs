//! User parameter management.

use serde_json::json;

use super::support;
use crate::context::CommandContext;
use crate::handler::HandlerError;
use crate::host::ParameterChange;
use crate::protocol::{CommandId, Params};
use crate::registry::HandlerEntry;

pub(super) const ENTRIES: &[HandlerEntry] = &[HandlerEntry::new("set_parameter", set_parameter)];

fn set_parameter(
    ctx: &CommandContext<'_>,
    id: CommandId,
    params: &Params,
) -> Result<(), HandlerError> {
    let design = ctx.require_active_document()?;
    let name = support::optional_text(params, "name")?.filter(|name| !name.is_empty());
    let value = params.get("value").filter(|value| !value.is_null());
    let (Some(name), Some(value)) = (name, value) else {
        return Err(HandlerError::failed("Name and value required"));
    };
    let unit = support::text(params, "unit", "cm")?;
    let value = support::scalar_text(value);

    let verb = match design.set_user_parameter(name, &value, unit) {
        ParameterChange::Created => "Created",
        ParameterChange::Updated => "Updated",
    };
    ctx.respond(id, json!({"message": format!("{verb} {name} = {value} {unit}")}))
}
