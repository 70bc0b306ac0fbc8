//! Formflow Form
//!
//! The form page node: a workflow step that parks its run, serves a form to
//! an end user over HTTP, and resumes the run with the captured submission.
//! Chained form nodes make a multi-page wizard served from one URL; a final
//! completion node shows a closing screen and passes its entry data through.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SuspensionController                     │
//! │  enter ──▶ GraphValidator ──▶ DataAggregator::preserve      │
//! │  resume_candidate ──▶ Transition::select                    │
//! │     ├─ Render   ──▶ ConfigurationResolver ──▶ FormDocument  │
//! │     ├─ Submit   ──▶ capture_submission    ──▶ Item          │
//! │     └─ Complete ──▶ DataAggregator::restore                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The node never calls back into its engine. Engine services come in
//! through [`NodeContext`]; requests to suspend or resume go out as the
//! [`Suspension`] and [`Resolution`] values. All state that must survive a
//! suspension is kept in the engine-persisted [`RunState`].

mod aggregator;
mod capture;
mod context;
mod controller;
mod error;
mod expression;
mod item;
mod operation;
mod render;
mod request;
mod resolver;
mod state;
mod validator;

pub use aggregator::DataAggregator;
pub use capture::{CaptureSettings, capture_submission};
pub use context::NodeContext;
pub use controller::{Resolution, Suspension, SuspensionController, Transition};
pub use error::{ErrorKind, FormError};
pub use expression::{ExpressionEvaluator, MinijinjaEvaluator, expression_scope};
pub use item::{Item, ItemBatch, SubmissionMeta};
pub use operation::Operation;
pub use render::{CompletionDocument, FormAction, FormDocument, NodeResponse, RenderedField};
pub use request::{HttpMethod, InboundRequest, UnsupportedMethod};
pub use resolver::{
  ConfigurationResolver, DEFAULT_BUTTON_LABEL, DEFAULT_COMPLETION_TITLE, DEFAULT_TITLE, TextOption,
};
pub use state::{InstanceSlot, Phase, RunState};
pub use validator::GraphValidator;
