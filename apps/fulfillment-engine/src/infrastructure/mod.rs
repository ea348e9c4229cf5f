//! Driven adapters: cache, bus, persistence, and the HTTP surface.

pub mod bus;
pub mod cache;
pub mod http;
pub mod persistence;
