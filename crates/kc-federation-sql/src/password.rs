//! Stored password verification.
//!
//! ## NIST 800-53 Rev5: IA-5 (Authenticator Management)
//!
//! Comparisons of derived values are constant-time. Neither the supplied
//! secret nor the stored value is ever logged.
//!
//! Supported encodings:
//!
//! - `NONE`: the store holds clear text; the supplied secret must equal it
//! - `MD5`: `[{salt}]hex(md5(secret + "{salt}"))`, lower-case hex, where the
//!   braced salt prefix is optional
//! - `BCRYPT`: `$2a$`/`$2b$`/`$2x$`/`$2y$` hashes

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

use crate::config::PasswordEncoding;
use crate::error::SqlStorageResult;

type Matcher = fn(&str, &str) -> bool;

/// An encoding bound to its comparison function.
pub struct ResolvedVerifier {
    encoding: PasswordEncoding,
    matcher: Matcher,
}

impl ResolvedVerifier {
    fn for_encoding(encoding: PasswordEncoding) -> Self {
        let matcher: Matcher = match encoding {
            PasswordEncoding::Plain => plain_matches,
            PasswordEncoding::Md5 => md5_matches,
            PasswordEncoding::Bcrypt => bcrypt_matches,
        };
        Self { encoding, matcher }
    }

    /// Returns the encoding this verifier handles.
    #[must_use]
    pub const fn encoding(&self) -> PasswordEncoding {
        self.encoding
    }

    /// Checks a supplied secret against a stored value.
    #[must_use]
    pub fn matches(&self, supplied: &str, stored: &str) -> bool {
        (self.matcher)(supplied, stored)
    }
}

impl fmt::Debug for ResolvedVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedVerifier")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Verifies supplied secrets against stored passwords.
///
/// Resolved verifiers are cached per encoding for the life of the
/// verifier. Concurrent callers may populate the cache without locking.
#[derive(Debug, Default)]
pub struct CredentialVerifier {
    cache: DashMap<PasswordEncoding, Arc<ResolvedVerifier>>,
}

impl CredentialVerifier {
    /// Creates a verifier with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached verifier for an encoding, creating it on first use.
    #[must_use]
    pub fn resolve(&self, encoding: PasswordEncoding) -> Arc<ResolvedVerifier> {
        let entry = self
            .cache
            .entry(encoding)
            .or_insert_with(|| Arc::new(ResolvedVerifier::for_encoding(encoding)));
        Arc::clone(&entry)
    }

    /// Verifies a secret with the encoding named `encoding`.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidEncoding` if the name is not exactly `NONE`, `MD5`
    /// or `BCRYPT`.
    pub fn verify(&self, encoding: &str, supplied: &str, stored: &str) -> SqlStorageResult<bool> {
        let encoding: PasswordEncoding = encoding.parse()?;
        Ok(self.resolve(encoding).matches(supplied, stored))
    }
}

/// Encodes a secret the way `MD5` stored passwords are written.
///
/// `salt` is either empty or a braced value such as `{pepper}`.
#[must_use]
pub fn encode_md5(raw: &str, salt: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(raw.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{salt}{}", hex::encode(hasher.finalize()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

fn plain_matches(supplied: &str, stored: &str) -> bool {
    constant_time_eq(supplied, stored)
}

fn md5_salt(stored: &str) -> &str {
    if stored.starts_with('{') {
        if let Some(end) = stored.find('}') {
            return &stored[..=end];
        }
    }
    ""
}

fn md5_matches(supplied: &str, stored: &str) -> bool {
    let expected = encode_md5(supplied, md5_salt(stored));
    constant_time_eq(&expected, stored)
}

fn bcrypt_matches(supplied: &str, stored: &str) -> bool {
    if stored.is_empty() {
        tracing::warn!("Empty bcrypt hash in user store");
        return false;
    }
    match bcrypt::verify(supplied, stored) {
        Ok(valid) => valid,
        Err(_) => {
            // The error text embeds the hash.
            tracing::warn!("Malformed bcrypt hash in user store");
            false
        }
    }
}
