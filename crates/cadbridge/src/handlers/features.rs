//! Solid-creating features.

use serde_json::json;

use super::support;
use crate::context::{CommandContext, ContextError};
use crate::handler::HandlerError;
use crate::host::{FeatureOperation, HostError};
use crate::protocol::{CommandId, Params};
use crate::registry::HandlerEntry;

pub(super) const BASIC: &[HandlerEntry] = &[HandlerEntry::new("extrude", extrude)];

fn extrude(ctx: &CommandContext<'_>, id: CommandId, params: &Params) -> Result<(), HandlerError> {
    let sketch_index = support::optional_integer(params, "sketch_index")?;
    let profile_index = support::integer(params, "profile_index", 0)?;
    let height = support::number(params, "height", 1.0)?;
    let raw_operation = support::text(params, "operation", "new")?;

    let sketch = ctx.resolve_root_sketch(sketch_index)?;
    let profiles = sketch.profile_count();
    let in_range = usize::try_from(profile_index).is_ok_and(|index| index < profiles);
    if !in_range {
        return Err(HostError::InvalidProfile {
            index: profile_index,
            count: profiles,
        }
        .into());
    }

    let operation = raw_operation.parse::<FeatureOperation>().map_err(|_| {
        HandlerError::failed(format!(
            "Unknown operation: {raw_operation}. Use 'new', 'join', 'cut', or 'intersect'."
        ))
    })?;

    let extrudes = ctx
        .extrude_feature_collection()
        .ok_or(ContextError::NoActiveDesign)?;
    let feature = extrudes.add(&sketch, profile_index, height, operation)?;
    ctx.respond(
        id,
        json!({
            "message": format!("Extruded {}cm", support::format_number(height)),
            "feature": feature.name(),
        }),
    )
}
