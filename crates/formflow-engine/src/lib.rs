//! Formflow Engine
//!
//! This crate provides a reference engine hosting form nodes. It owns what
//! the form core leaves to its host: scheduling nodes, persisting runs
//! between requests, and routing requests by waiting token.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FormEngine                           │
//! │  - start(payload) → run parked on its first form node       │
//! │  - handle_request(token, request) → HttpResponse            │
//! │  - cancel(run_id)                                           │
//! └─────────────────────────────────────────────────────────────┘
//!               │                                 │
//!               ▼                                 ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │     SuspensionController      │ │         RunStore          │
//! │  - enter / resume_candidate   │ │  - RunRecord per run      │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use formflow_engine::{EngineConfig, FormEngine};
//! use formflow_store::InMemoryRunStore;
//!
//! let engine = FormEngine::new(workflow, InMemoryRunStore::new(), EngineConfig::default());
//!
//! let run = engine.start(serde_json::json!({})).await?;
//! let token = run.resume_token().unwrap();
//!
//! let page = engine.handle_request(token, InboundRequest::get()).await?;
//! ```

mod context;
mod engine;
mod error;
mod events;
mod http;

pub use context::EngineNodeContext;
pub use engine::{EngineConfig, FormEngine, validate_forms};
pub use error::EngineError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use http::{CONTENT_TYPE_HTML, CONTENT_TYPE_JSON, HttpResponse};
