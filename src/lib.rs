//! # Query Gateway
//!
//! A query-answering gateway that resolves a text query through an ordered
//! chain of sources and caches the outcome.
//!
//! ## Architecture
//!
//! ```text
//!   GET /search ──▶ Orchestrator ──▶ ResultCache (hit? return)
//!                        │
//!                        ├─▶ Primary index ── non-empty? ──▶ Primary outcome
//!                        ├─▶ Web search ───── non-empty? ──▶ Web outcome
//!                        │        (failure absorbed, items become context)
//!                        └─▶ Generative ───── answer ──────▶ Generated outcome
//!                                 (failure is terminal)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GOOGLE_API_KEY=... GOOGLE_CSE_ID=... OPENAI_API_KEY=...
//! qgw serve                          # listen on 0.0.0.0:3000 (or $PORT)
//! qgw search "capital of France"     # one-shot resolution
//! qgw ask "write a haiku about rust" # direct generative call
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Adapter and resolution errors |
//! | [`cache`] | LRU + TTL result cache |
//! | [`traits`] | Source adapter capability traits |
//! | [`primary`] | Local primary index |
//! | [`web`] | Web search adapter |
//! | [`generative`] | Generative answer adapter |
//! | [`orchestrator`] | Fallback resolution pipeline |
//! | [`server`] | HTTP gateway |

pub mod cache;
pub mod config;
pub mod error;
pub mod generative;
pub mod models;
pub mod orchestrator;
pub mod primary;
pub mod server;
pub mod traits;
pub mod web;
