//! Manifest data model.
//!
//! The manifest is the single declarative input of the orchestrator. Every map
//! is a `BTreeMap` so a reconciliation pass walks organizations, environments,
//! teams and services in lexicographic order.
//!
//! Field names are kebab-case on the wire (`access-token`, `spec-path`);
//! snake_case aliases are accepted. Unknown keys are ignored.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! name_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

name_newtype!(
    /// Key of an entry under `organizations`.
    OrgName
);
name_newtype!(
    /// Key of an entry under an organization's `environments`.
    EnvName
);
name_newtype!(
    /// Key of an entry under `teams`; also the team's remote name.
    TeamName
);
name_newtype!(
    /// Key of an entry under a team's `services`.
    ServiceName
);

// ---------------------------------------------------------------------------
// Open enums
//
// These deserialize from any string so that unknown kinds survive parsing and
// are rejected (or tolerated) where they are used, with a precise error.
// ---------------------------------------------------------------------------

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// Any value not listed above, kept verbatim.
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(s) => s.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $($text => $name::$variant,)+
                    _ => $name::Other(s),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.as_str().to_owned()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Source of a secret value.
    SecretKind {
        File => "file",
        Env => "env",
        Literal => "literal",
    }
);

string_enum!(
    /// How the git driver authenticates against a remote.
    AuthKind {
        None => "none",
        SshKey => "ssh-key",
        Token => "token",
    }
);

impl Default for AuthKind {
    fn default() -> Self {
        AuthKind::None
    }
}

string_enum!(
    /// Code-hosting provider used for pull requests.
    HostingKind {
        Github => "github",
    }
);

impl Default for HostingKind {
    fn default() -> Self {
        HostingKind::Github
    }
}

string_enum!(
    /// Deployment stage of an environment.
    ///
    /// The value is also written verbatim into the control plane's `env` label.
    EnvType {
        Dev => "DEV",
        Prod => "PROD",
    }
);

impl EnvType {
    /// Role granted to a team on its control plane in this kind of environment.
    pub fn role_name(&self) -> Option<&'static str> {
        match self {
            EnvType::Dev => Some("Viewer"),
            EnvType::Prod => Some("Admin"),
            EnvType::Other(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// `{ type: file|env|literal, value }`, resolved by [`crate::secret`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    #[serde(rename = "type")]
    pub kind: SecretKind,
    pub value: String,
}

impl SecretRef {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: SecretKind::Literal,
            value: value.into(),
        }
    }

    pub fn env(name: impl Into<String>) -> Self {
        Self {
            kind: SecretKind::Env,
            value: name.into(),
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            kind: SecretKind::File,
            value: path.into(),
        }
    }
}

/// Git credentials: `{ type: none|ssh-key|token, value: SecretRef }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthRef {
    #[serde(rename = "type", default)]
    pub kind: AuthKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SecretRef>,
}

/// Code-hosting settings for opening pull requests on the platform repo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingRef {
    #[serde(rename = "type", default)]
    pub kind: HostingKind,
    pub token: SecretRef,
    /// REST base URL override (GitHub Enterprise).
    #[serde(
        rename = "api-url",
        alias = "api_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub api_url: Option<String>,
}

/// Commit author identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitAuthor {
    pub name: String,
    pub email: String,
}

/// A git repository and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    pub remote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<GitAuthor>,
    #[serde(default)]
    pub auth: AuthRef,
    #[serde(default, alias = "github", skip_serializing_if = "Option::is_none")]
    pub hosting: Option<HostingRef>,
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// The platform repository all service specs are materialized into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRef {
    pub git: GitRef,
}

/// A service owned by a team; its OpenAPI document lives at `spec_path` in
/// its own repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDef {
    #[serde(default)]
    pub name: String,
    pub git: GitRef,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "spec-path", alias = "spec_path")]
    pub spec_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamDef {
    #[serde(default)]
    pub description: String,
    /// Member emails.
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub services: BTreeMap<ServiceName, ServiceDef>,
}

fn default_branch() -> String {
    "main".to_string()
}

/// Which branch of a service repository to pull the spec from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvServiceDef {
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// The services of one team that are active in an environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvTeamDef {
    #[serde(default)]
    pub services: BTreeMap<ServiceName, EnvServiceDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvDef {
    #[serde(rename = "type")]
    pub env_type: EnvType,
    /// Host prefix of the regional API endpoint (`us`, `eu`, ...).
    pub region: String,
    #[serde(default)]
    pub teams: BTreeMap<TeamName, EnvTeamDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgDef {
    #[serde(rename = "access-token", alias = "access_token")]
    pub access_token: SecretRef,
    #[serde(default)]
    pub environments: BTreeMap<EnvName, EnvDef>,
}

/// Root of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub platform: PlatformRef,
    #[serde(default)]
    pub teams: BTreeMap<TeamName, TeamDef>,
    #[serde(default)]
    pub organizations: BTreeMap<OrgName, OrgDef>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
