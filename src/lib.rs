//! weft — uniform text generation over multi-provider LLM completion APIs.
//!
//! The `core::generation` module exposes the [`Generation`] interface and its
//! router-backed implementation; `providers` holds the completion-client
//! boundary and the feature-gated default backend.
//!
//! [`Generation`]: core::generation::Generation

pub mod cli;
pub mod core;
pub mod providers;
