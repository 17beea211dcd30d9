//! Sketch creation, closed primitives, and open curves.

use std::rc::Rc;

use serde_json::json;

use super::support::{self, format_number as fmt};
use crate::context::{CommandContext, SketchTarget};
use crate::handler::HandlerError;
use crate::host::{Point, SketchPlane};
use crate::protocol::{CommandId, Params};
use crate::registry::HandlerEntry;

pub(super) const PRIMITIVES: &[HandlerEntry] = &[
    HandlerEntry::new("create_sketch", create_sketch),
    HandlerEntry::new("draw_line", draw_line),
    HandlerEntry::new("draw_circle", draw_circle),
    HandlerEntry::new("draw_rectangle", draw_rectangle),
];

pub(super) const CURVES: &[HandlerEntry] = &[HandlerEntry::new("draw_arc", draw_arc)];

fn target(ctx: &CommandContext<'_>, params: &Params) -> Result<SketchTarget, HandlerError> {
    let index = support::optional_integer(params, "sketch_index")?;
    Ok(ctx.resolve_sketch(index)?)
}

fn point(params: &Params, x: &str, y: &str, default: (f64, f64)) -> Result<Point, HandlerError> {
    Ok(Point::new(
        support::number(params, x, default.0)?,
        support::number(params, y, default.1)?,
    ))
}

fn create_sketch(
    ctx: &CommandContext<'_>,
    id: CommandId,
    params: &Params,
) -> Result<(), HandlerError> {
    let design = ctx.require_active_document()?;
    let raw_plane = support::text(params, "plane", "xy")?;
    let plane = raw_plane.parse::<SketchPlane>().map_err(|_| {
        HandlerError::failed(format!(
            "Unknown plane: {raw_plane}. Use 'xy', 'xz', or 'yz'."
        ))
    })?;

    let sketch = design.root_component().sketches().add(plane);
    let index = design
        .all_sketches()
        .iter()
        .position(|(_, candidate)| Rc::ptr_eq(candidate, &sketch));
    ctx.respond(
        id,
        json!({
            "message": format!("Created {} on {plane}", sketch.name()),
            "sketch_index": index,
        }),
    )
}

fn draw_line(ctx: &CommandContext<'_>, id: CommandId, params: &Params) -> Result<(), HandlerError> {
    let start = point(params, "x1", "y1", (0.0, 0.0))?;
    let end = point(params, "x2", "y2", (1.0, 1.0))?;
    let target = target(ctx, params)?;

    target
        .sketch
        .add_line(start, end)
        .map_err(HandlerError::during("draw line"))?;
    ctx.respond(
        id,
        json!({"message": format!(
            "Line ({},{})->({},{})",
            fmt(start.x),
            fmt(start.y),
            fmt(end.x),
            fmt(end.y)
        )}),
    )
}

fn draw_circle(
    ctx: &CommandContext<'_>,
    id: CommandId,
    params: &Params,
) -> Result<(), HandlerError> {
    let center = point(params, "x", "y", (0.0, 0.0))?;
    let radius = support::number(params, "radius", 1.0)?;
    let target = target(ctx, params)?;

    target
        .sketch
        .add_circle(center, radius)
        .map_err(HandlerError::during("draw circle"))?;
    ctx.respond(
        id,
        json!({"message": format!(
            "Circle at ({},{}) r={}",
            fmt(center.x),
            fmt(center.y),
            fmt(radius)
        )}),
    )
}

fn draw_rectangle(
    ctx: &CommandContext<'_>,
    id: CommandId,
    params: &Params,
) -> Result<(), HandlerError> {
    let corner = point(params, "x", "y", (0.0, 0.0))?;
    let width = support::number(params, "width", 1.0)?;
    let height = support::number(params, "height", 1.0)?;
    let target = target(ctx, params)?;

    target
        .sketch
        .add_rectangle(corner, width, height)
        .map_err(HandlerError::during("draw rectangle"))?;
    ctx.respond(
        id,
        json!({"message": format!(
            "Rectangle at ({},{}) {}x{}",
            fmt(corner.x),
            fmt(corner.y),
            fmt(width),
            fmt(height)
        )}),
    )
}

fn draw_arc(ctx: &CommandContext<'_>, id: CommandId, params: &Params) -> Result<(), HandlerError> {
    let center = point(params, "center_x", "center_y", (0.0, 0.0))?;
    let start = point(params, "start_x", "start_y", (1.0, 0.0))?;
    let end = point(params, "end_x", "end_y", (0.0, 1.0))?;
    let target = target(ctx, params)?;

    let radius = target
        .sketch
        .add_arc(center, start, end)
        .map_err(HandlerError::during("draw arc"))?;
    ctx.respond(
        id,
        json!({
            "message": format!(
                "Arc from ({},{}) to ({},{}) around ({},{})",
                fmt(start.x),
                fmt(start.y),
                fmt(end.x),
                fmt(end.y),
                fmt(center.x),
                fmt(center.y)
            ),
            "radius": support::round4(radius),
        }),
    )
}
