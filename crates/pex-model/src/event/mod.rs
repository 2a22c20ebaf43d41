mod event;
pub use event::{Event, EventRecord};

mod kind;
pub use kind::EventKind;

mod sink;
pub use sink::{EventSink, NoopSink};
