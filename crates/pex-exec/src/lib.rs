//! Live-process [`Command`](pex_core::Command) backed by `tokio::process`.

mod output;
pub use output::{OutputSink, SharedWriter};

pub mod proc;
pub use proc::ProcCommand;

mod util;
pub use util::kill_graceful;

pub mod prelude {
    pub use crate::{OutputSink, ProcCommand};
    pub use pex_model::CommandSpec;
}
