//! File-based command protocol shared with the external controller.
//!
//! Three independent JSON documents live in the bridge directory:
//!
//! ```json
//! // commands.json (controller -> bridge, single pending command)
//! {"id":7,"action":"draw_circle","params":{"radius":2.5}}
//! // results.json (bridge -> controller, latest result only)
//! {"command_id":7,"success":true,"result":{"message":"Circle at (0,0) r=2.5"},"error":null,"timestamp":1760000000.5}
//! // bridge_status.json (bridge -> controller, liveness)
//! {"status":"running","message":"Bridge active"}
//! ```
//!
//! Each document is a single slot: a new write fully replaces the previous
//! content. There is no file locking; exactly one party writes each file.

mod command;
mod errors;
pub(crate) mod files;
mod result;
mod status;

pub use self::command::{Command, CommandId, CommandSource, Params};
pub use self::errors::ProtocolError;
pub use self::result::{CommandResult, ResultChannel};
pub use self::status::{BridgeState, BridgeStatus, StatusFile};

/// Tracing target for protocol file operations.
pub(crate) const PROTOCOL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::protocol");
