//! # konnect-renderer
//!
//! Tera-based rendering of the text the orchestrator writes into git and the
//! code-hosting provider: the pull-request title and body, and the commit
//! message for an `(env, team)` unit.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use konnect_renderer::{ChangeContext, Renderer};
//!
//! fn title_for(env: &str) -> Option<String> {
//!     let renderer = Renderer::new().ok()?;
//!     let ctx = ChangeContext::new("acme", env, "payments", vec!["checkout".into()]);
//!     renderer.pull_request(&ctx).ok().map(|pr| pr.title)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::ChangeContext;
pub use engine::{PullRequestText, Renderer, TemplateKind};
pub use error::RenderError;
