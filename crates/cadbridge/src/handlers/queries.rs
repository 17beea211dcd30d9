//! Read-only design queries.

use serde_json::{Value, json};

use crate::context::{CommandContext, ContextError};
use crate::handler::HandlerError;
use crate::protocol::{CommandId, Params};
use crate::registry::HandlerEntry;

pub(super) const ENTRIES: &[HandlerEntry] = &[
    HandlerEntry::new("get_info", get_info),
    HandlerEntry::new("get_parameters", get_parameters),
    HandlerEntry::new("get_features", get_features),
    HandlerEntry::new("get_sketches", get_sketches),
];

fn get_info(ctx: &CommandContext<'_>, id: CommandId, _params: &Params) -> Result<(), HandlerError> {
    let design = ctx.require_active_document()?;
    let components = design.all_components();

    let bodies: Vec<Value> = components
        .iter()
        .flat_map(|component| {
            component
                .bodies()
                .into_iter()
                .map(move |body| (component.name().to_owned(), body))
        })
        .enumerate()
        .map(|(index, (component, body))| {
            json!({
                "name": body.name,
                "index": index,
                "faces": body.faces,
                "component": component,
            })
        })
        .collect();
    let sketch_count: usize = components
        .iter()
        .map(|component| component.sketches().count())
        .sum();

    ctx.respond(
        id,
        json!({
            "name": design.root_component().name(),
            "bodies": bodies,
            "sketch_count": sketch_count,
            "component_count": components.len(),
        }),
    )
}

fn get_parameters(
    ctx: &CommandContext<'_>,
    id: CommandId,
    _params: &Params,
) -> Result<(), HandlerError> {
    let design = ctx.require_active_document()?;
    let parameters: Vec<Value> = design
        .user_parameters()
        .into_iter()
        .map(|param| {
            json!({
                "name": param.name,
                "expression": param.expression,
                "value": param.value,
                "unit": param.unit,
                "comment": param.comment,
            })
        })
        .collect();
    let count = parameters.len();
    ctx.respond(id, json!({"parameters": parameters, "count": count}))
}

fn get_features(
    ctx: &CommandContext<'_>,
    id: CommandId,
    _params: &Params,
) -> Result<(), HandlerError> {
    let extrudes = ctx
        .extrude_feature_collection()
        .ok_or(ContextError::NoActiveDesign)?;
    let features: Vec<Value> = extrudes
        .to_vec()
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            json!({
                "name": feature.name(),
                "index": index,
                "type": feature.kind(),
                "is_suppressed": feature.is_suppressed(),
                "is_valid": true,
            })
        })
        .collect();
    let count = features.len();
    ctx.respond(id, json!({"features": features, "count": count}))
}

fn get_sketches(
    ctx: &CommandContext<'_>,
    id: CommandId,
    _params: &Params,
) -> Result<(), HandlerError> {
    let design = ctx.require_active_document()?;
    let sketches: Vec<Value> = design
        .all_sketches()
        .iter()
        .enumerate()
        .map(|(index, (component, sketch))| {
            json!({
                "name": sketch.name(),
                "index": index,
                "component": component.name(),
                "plane": sketch.plane().to_string(),
                "curve_count": sketch.curve_count(),
                "profile_count": sketch.profile_count(),
            })
        })
        .collect();
    let count = sketches.len();
    ctx.respond(id, json!({"sketches": sketches, "count": count}))
}
