//! Repository implementations

pub mod http;
