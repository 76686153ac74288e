//! Tera rendering engine: [`TemplateKind`] enum and [`Renderer`].
//!
//! | Template         | Used for                                  |
//! |------------------|-------------------------------------------|
//! | `pr_title`       | pull-request title (one line)             |
//! | `pr_body`        | pull-request body (env-scoped, stable)    |
//! | `commit_message` | commit on the env's apply branch          |

use tera::{Context, Tera};

use crate::context::ChangeContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("pr_title.tera", include_str!("templates/pr_title.tera")),
    ("pr_body.tera", include_str!("templates/pr_body.tera")),
    ("commit_message.tera", include_str!("templates/commit_message.tera")),
];

/// Which embedded template to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    PullRequestTitle,
    PullRequestBody,
    CommitMessage,
}

impl TemplateKind {
    pub fn all() -> &'static [TemplateKind] {
        &[
            TemplateKind::PullRequestTitle,
            TemplateKind::PullRequestBody,
            TemplateKind::CommitMessage,
        ]
    }

    fn template_name(self) -> &'static str {
        match self {
            TemplateKind::PullRequestTitle => "pr_title.tera",
            TemplateKind::PullRequestBody => "pr_body.tera",
            TemplateKind::CommitMessage => "commit_message.tera",
        }
    }
}

/// Rendered pull-request text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestText {
    pub title: String,
    pub body: String,
}

/// Holds the compiled templates; build once per pass.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TPLS.iter().copied())?;
        Ok(Self { tera })
    }

    /// Render one template. Trailing whitespace is trimmed.
    pub fn render(&self, kind: TemplateKind, ctx: &ChangeContext) -> Result<String, RenderError> {
        let context = Context::from_serialize(ctx)?;
        let out = self.tera.render(kind.template_name(), &context)?;
        Ok(out.trim_end().to_string())
    }

    pub fn pull_request(&self, ctx: &ChangeContext) -> Result<PullRequestText, RenderError> {
        Ok(PullRequestText {
            title: self.render(TemplateKind::PullRequestTitle, ctx)?,
            body: self.render(TemplateKind::PullRequestBody, ctx)?,
        })
    }

    pub fn commit_message(&self, ctx: &ChangeContext) -> Result<String, RenderError> {
        self.render(TemplateKind::CommitMessage, ctx)
    }
}
