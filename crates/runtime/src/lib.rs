#![deny(clippy::future_not_send)]

pub mod context;
pub mod kv;
pub mod time;
