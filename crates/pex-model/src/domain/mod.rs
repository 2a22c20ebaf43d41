mod command_spec;
pub use command_spec::CommandSpec;
