// Command handlers behind the CLI. Each returns a serialisable response or a
// caller-facing error string.

pub mod docker;
pub mod server;
pub mod worlds;
