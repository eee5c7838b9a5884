//! Translate Bot — relays group-chat messages to a translation model and
//! posts the Hebrew translation back as a threaded reply.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod store;
