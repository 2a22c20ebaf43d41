//! Shared data types of the pex runner: lifecycle events, their encodings,
//! the event sink seam and the command descriptor produced by config loaders.

mod error;
pub use error::ModelError;

mod event;
pub use event::{Event, EventKind, EventRecord, EventSink, NoopSink};

mod domain;
pub use domain::CommandSpec;
