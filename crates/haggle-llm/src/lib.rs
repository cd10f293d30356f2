//! Haggle LLM - Provider abstraction for the natural-language envelope
//!
//! Agents use an LLM only to phrase protocol messages as prose and to read
//! intent out of free-text instructions. Two rules hold everywhere:
//!
//! 1. The LLM may **phrase**, never **decide** money - every amount comes
//!    from the evaluator or the buyer strategy, not from generated text.
//! 2. A deterministic fallback is always available, so the demo runs with
//!    no model configured.
//!
//! Supported providers: Ollama (`http://localhost:11434`), any
//! OpenAI-compatible server (vLLM, llama.cpp), and the deterministic
//! fallback (the default when `HAGGLE_LLM_PROVIDER` is unset).

pub mod providers;
pub mod router;
pub mod types;

pub use providers::*;
pub use router::*;
pub use types::*;
