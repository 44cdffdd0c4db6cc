//! Port traits at the I/O seams.

pub mod config_port;
pub mod feature_sink;
pub mod row_source;
