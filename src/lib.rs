//! Greenroom: a mock-interview practice service.
//!
//! The core is the interview pipeline orchestrator — a per-session state
//! machine that generates role-tailored questions, scores spoken-answer
//! transcripts against a rubric, and aggregates results across a session.
//! An external generative model does the generation and scoring; Greenroom
//! owns the state, the serialization of concurrent mutation, and the
//! strict contracts that keep the model's output honest.
//!
//! Module map:
//! - [`orchestrator`] — the pipeline entity, state machine, and HTTP gateway
//! - [`store`] — durable pipeline storage (libSQL or in-memory)
//! - [`contracts`] — prompt builders and strict response parsers
//! - [`llm`] — the generative-model seam
//! - [`analysis`] — session-level aggregation
//! - [`transcription`] — audio-to-text providers

pub mod analysis;
pub mod config;
pub mod contracts;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod store;
pub mod transcription;

pub use config::Config;
pub use error::Error;
