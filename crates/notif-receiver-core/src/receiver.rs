//! Domain model for `Receiver` objects and the resources they signal.
//!
//! These types mirror the declarative configuration record described in the
//! data model: a `Receiver` names a provider, an optional secret, the
//! resources it notifies, and an optional filter expression. Lifecycles are
//! externally managed — this crate only ever reads these objects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of supported webhook provider types.
///
/// New providers are added here and in `webhook::providers`; see that
/// module's dispatch table for the authentication rule each variant maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    Generic,
    GenericHmac,
    Github,
    Gitlab,
    Bitbucket,
    BitbucketServer,
    Harbor,
    Dockerhub,
    Quay,
    Gcr,
    Acr,
    Nexus,
    Cdevents,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::GenericHmac => "generic-hmac",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Bitbucket => "bitbucket",
            Self::BitbucketServer => "bitbucket-server",
            Self::Harbor => "harbor",
            Self::Dockerhub => "dockerhub",
            Self::Quay => "quay",
            Self::Gcr => "gcr",
            Self::Acr => "acr",
            Self::Nexus => "nexus",
            Self::Cdevents => "cdevents",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown receiver type '{0}'")]
pub struct UnknownProviderType(pub String);

impl FromStr for ProviderType {
    type Err = UnknownProviderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Self::Generic),
            "generic-hmac" => Ok(Self::GenericHmac),
            "github" => Ok(Self::Github),
            "gitlab" => Ok(Self::Gitlab),
            "bitbucket" => Ok(Self::Bitbucket),
            "bitbucket-server" => Ok(Self::BitbucketServer),
            "harbor" => Ok(Self::Harbor),
            "dockerhub" => Ok(Self::Dockerhub),
            "quay" => Ok(Self::Quay),
            "gcr" => Ok(Self::Gcr),
            "acr" => Ok(Self::Acr),
            "nexus" => Ok(Self::Nexus),
            "cdevents" => Ok(Self::Cdevents),
            other => Err(UnknownProviderType(other.to_string())),
        }
    }
}

/// Reference to the Secret holding a receiver's shared token material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretRef {
    pub name: String,
    /// Defaults to the receiver's own namespace when omitted.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Cross-namespace reference to one or more resources a Receiver signals.
///
/// A literal `name` resolves to exactly one object; `name == "*"` resolves to
/// every object of `(api_version, kind)` in the target namespace, narrowed by
/// `match_labels` if present. The label selector is ignored for literal
/// names — see [`ResourceRef::is_wildcard`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub match_labels: Option<HashMap<String, String>>,
}

impl ResourceRef {
    pub fn is_wildcard(&self) -> bool {
        self.name.as_deref() == Some("*")
    }

    /// Resolve the effective namespace, falling back to the receiver's own.
    pub fn namespace_or<'a>(&'a self, receiver_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(receiver_namespace)
    }
}

/// A reconciler-signalled readiness condition, as found on `status.conditions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
}

/// Declarative configuration for one webhook endpoint.
///
/// `webhook_path` is the sole routing key: it is assigned by the reconciler
/// and is expected to be unique across all Receivers in the store.
///
/// This is the crate's internal, flattened representation, not the wire
/// shape of a cluster object: a real `Receiver` custom resource nests these
/// fields under `metadata`/`spec`/`status`. `adapters::kube_store` owns the
/// conversion from that nested shape into this one; `Deserialize` here only
/// backs `InMemoryObjectStore`'s test fixtures, which construct `Receiver`
/// values directly rather than through JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receiver {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub secret_ref: Option<SecretRef>,
    #[serde(default)]
    pub resources: Vec<ResourceRef>,
    #[serde(default)]
    pub resource_filter: Option<String>,
    #[serde(default)]
    pub suspend: bool,
    pub webhook_path: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Receiver {
    /// A receiver is usable only when it is not suspended and the reconciler
    /// has posted a `Ready=True` condition.
    pub fn is_ready(&self) -> bool {
        !self.suspend
            && self
                .conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
    }

    /// The namespace a `secret_ref` should resolve in, when no explicit
    /// namespace is given on the reference itself.
    pub fn secret_namespace(&self) -> Option<&str> {
        self.secret_ref
            .as_ref()
            .map(|r| r.namespace.as_deref().unwrap_or(&self.namespace))
    }
}

/// Opaque byte map backing a `secret-ref`. At minimum carries `token`; some
/// providers additionally read `username`.
#[derive(Clone, Default)]
pub struct Secret {
    data: HashMap<String, Vec<u8>>,
}

impl Secret {
    pub fn new(data: HashMap<String, Vec<u8>>) -> Self {
        Self { data }
    }

    /// The shared token, used verbatim or as an HMAC key depending on provider.
    pub fn token(&self) -> Option<&[u8]> {
        self.data.get("token").map(Vec::as_slice)
    }

    pub fn username(&self) -> Option<&[u8]> {
        self.data.get("username").map(Vec::as_slice)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}
