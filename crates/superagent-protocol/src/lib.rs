//! Headless NDJSON event protocol and persisted state layouts (spec §6):
//! the stable external wire format emitted during non-interactive
//! execution, secret redaction applied before anything reaches logs or
//! the NDJSON stream, and the JSON document shapes used for session
//! snapshots, checkpoints, and conversation export.

pub mod checkpoint;
pub mod error;
pub mod export;
pub mod ndjson;
pub mod redact;
pub mod session;

pub use checkpoint::CheckpointRecord;
pub use error::ProtocolError;
pub use export::{export, import_json, ConversationExport, ExportFormat};
pub use ndjson::{to_wire_value, NdjsonWriter};
pub use redact::{redact_text, redact_value, redacted_clone};
pub use session::SessionSnapshot;
