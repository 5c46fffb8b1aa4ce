//! Port traits the domain talks to.

pub mod bar_port;
pub mod config_port;
pub mod indicator_store_port;
