//! Shared model and rendering core for the document shop.
//!
//! Everything in this crate is pure: no I/O, no clocks, no global state. The
//! backend feeds it records read from storage, and a browser client compiled to
//! WASM can reuse the same formatters for live input masking.

pub mod engine;
pub mod model;
pub mod requests;
