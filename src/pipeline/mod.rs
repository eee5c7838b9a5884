//! Message processing pipeline.
//!
//! Every inbound chat message flows through:
//! 1. `KeywordFilter::should_suppress()` — admin-managed regex rules
//! 2. `normalize()` — symbol and signature stripping
//! 3. `Translator::translate()` — one provider call, no retries
//! 4. `ResponseParser::parse()` — tolerant reply decoding + language guard
//!
//! `MessageProcessor` drives the sequence and owns all chat side effects.

pub mod commands;
pub mod filter;
pub mod normalize;
pub mod parser;
pub mod processor;
pub mod translate;
pub mod types;

pub use processor::{MessageProcessor, Notices, ProcessorConfig};
pub use translate::{TokenBudget, Translator, TranslatorConfig};
