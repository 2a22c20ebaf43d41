mod logger;
pub use logger::*;

mod sink;
pub use sink::{EventLog, EventLogMode, log_event, message_for};
