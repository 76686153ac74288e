//! Secret resolution.
//!
//! | `type`    | `value`                         | Result                          |
//! |-----------|---------------------------------|---------------------------------|
//! | `file`    | path, `$VAR`/`${VAR}`/`~/` expanded | full file contents          |
//! | `env`     | environment variable name       | variable content (non-empty)    |
//! | `literal` | the secret itself               | `value` verbatim                |
//!
//! Nothing is cached; every call reads the environment and filesystem afresh.
//!
//! Every resolver has two forms, mirroring the rest of the crate:
//! - [`resolve_with`]: explicit variable lookup; used in tests
//! - [`resolve`]: reads the process environment, delegates to `resolve_with`

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::ConfigError;
use crate::types::{SecretKind, SecretRef};

/// Source of plaintext secrets handed to the reconciler.
pub trait Secrets: Send + Sync {
    fn resolve(&self, secret: &SecretRef) -> Result<String, ConfigError>;
}

/// [`Secrets`] backed by the process environment and filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSecrets;

impl Secrets for ProcessSecrets {
    fn resolve(&self, secret: &SecretRef) -> Result<String, ConfigError> {
        resolve(secret)
    }
}

/// Resolve `secret` against the process environment.
pub fn resolve(secret: &SecretRef) -> Result<String, ConfigError> {
    resolve_with(secret, |name| std::env::var(name).ok())
}

/// Resolve `secret`, looking environment variables up through `lookup`.
pub fn resolve_with<F>(secret: &SecretRef, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match &secret.kind {
        SecretKind::File => {
            let path = expand_path(&secret.value, &lookup);
            let bytes = std::fs::read(&path)
                .map_err(|source| ConfigError::SecretFile { path: path.clone(), source })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        SecretKind::Env => match lookup(&secret.value) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar {
                name: secret.value.clone(),
            }),
        },
        SecretKind::Literal => Ok(secret.value.clone()),
        SecretKind::Other(kind) => Err(ConfigError::UnsupportedSecret { kind: kind.clone() }),
    }
}

fn env_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("static regex")
    })
}

/// Expand `$VAR` and `${VAR}` references; unset variables expand to "".
pub fn expand_env<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_ref_pattern()
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}

fn expand_path<F>(raw: &str, lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let expanded = expand_env(raw, lookup);
    if let Some(rest) = expanded.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(expanded)
}
