//! Code signing material and its on-agent lifecycle.
//!
//! Parsing of PKCS#12 archives and provisioning profiles happens outside this
//! crate. Callers hand in a [`CredentialArchive`] and an already parsed
//! [`ProvisioningProfile`]; this module decides what touches disk and for how
//! long.
//!
//! # Lifetimes of on-disk secrets
//!
//! - [`ExportedIdentity`]: the exported `.p12` file. Removal is strict and
//!   happens before identity installation returns, on every path.
//! - [`TempKeychain`]: the keychain holding the imported identity. Deletion
//!   is best-effort and logged, performed once by the orchestrator's cleanup.
//! - Provisioning profiles are written into an agent-wide directory through a
//!   [`ProfileRegistry`] and are not removed.

mod exported;
mod keychain;
mod registry;

pub use exported::ExportedIdentity;
pub use keychain::TempKeychain;
pub use registry::{HomeProfileRegistry, PROFILE_EXTENSION, PROFILES_SUBPATH, ProfileRegistry};

use super::error::Result;
use std::fmt;

/// DER-encoded X.509 certificate.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    /// Wraps DER bytes.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self(der.into())
    }

    /// DER bytes.
    pub fn as_der(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Certificate({} bytes)", self.0.len())
    }
}

/// A certificate and private key usable for code signing.
#[derive(Clone)]
pub struct SigningIdentity {
    common_name: String,
    certificate: Certificate,
    private_key: Vec<u8>,
}

impl SigningIdentity {
    /// Creates an identity from its parts.
    pub fn new(common_name: impl Into<String>, certificate: Certificate, private_key: Vec<u8>) -> Self {
        Self {
            common_name: common_name.into(),
            certificate,
            private_key,
        }
    }

    /// Subject common name, e.g. `iPhone Distribution: Example Inc`.
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    /// Signing certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Raw private key material, as provided by the archive.
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// Whether this identity's certificate is one of `candidates`.
    pub fn matches(&self, candidates: &[Certificate]) -> bool {
        candidates.contains(&self.certificate)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("common_name", &self.common_name)
            .field("certificate", &self.certificate)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// A parsed `.mobileprovision` file.
#[derive(Clone, PartialEq, Eq)]
pub struct ProvisioningProfile {
    uuid: String,
    bytes: Vec<u8>,
    certificates: Vec<Certificate>,
}

impl ProvisioningProfile {
    /// Creates a profile from its parsed parts and original bytes.
    pub fn new(uuid: impl Into<String>, bytes: Vec<u8>, certificates: Vec<Certificate>) -> Self {
        Self {
            uuid: uuid.into(),
            bytes,
            certificates,
        }
    }

    /// Profile UUID.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Original file contents, installed verbatim.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Developer certificates the profile authorizes.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }
}

impl fmt::Debug for ProvisioningProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningProfile")
            .field("uuid", &self.uuid)
            .field("bytes", &self.bytes.len())
            .field("certificates", &self.certificates.len())
            .finish()
    }
}

/// A PKCS#12 archive holding one or more signing identities.
pub trait CredentialArchive {
    /// The identity whose certificate is among `candidates`, if any.
    fn choose_identity(&self, candidates: &[Certificate]) -> Result<Option<SigningIdentity>>;

    /// Serializes `identity` as PKCS#12 protected by `password`.
    fn export(&self, identity: &SigningIdentity, password: &str) -> Result<Vec<u8>>;
}

/// Random secret for keychains and exported identities.
pub fn one_time_password() -> String {
    uuid::Uuid::new_v4().to_string()
}
