//! Lock token codec.
//!
//! On the wire a lock token is `opaquelocktoken:` followed by the UUID
//! string the repository generated. The UUID part is opaque here, an
//! identifier and nothing more.
use std::cmp::Ordering;

use crate::errors::DavError;
use crate::DavResult;

const TOKEN_URI_SCHEME: &str = "opaquelocktoken:";

/// A lock token, which is just a repository UUID string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    pub uuid_str: String,
}

impl LockToken {
    /// Parse a lock token URI. Anything not starting with the
    /// `opaquelocktoken:` scheme is rejected; the suffix is taken as the
    /// UUID string without further validation.
    pub fn parse(token: &str) -> DavResult<LockToken> {
        match token.strip_prefix(TOKEN_URI_SCHEME) {
            Some(uuid_str) => Ok(LockToken {
                uuid_str: uuid_str.to_string(),
            }),
            None => Err(DavError::UnknownLockToken),
        }
    }

    /// Format the token as a URI. Never empty.
    pub fn format(&self) -> String {
        format!("{}{}", TOKEN_URI_SCHEME, self.uuid_str)
    }

    /// Byte-wise comparison of the UUID strings. The host uses this to
    /// deduplicate tokens submitted in an `If:` header.
    pub fn compare(&self, other: &LockToken) -> Ordering {
        self.uuid_str.as_bytes().cmp(other.uuid_str.as_bytes())
    }
}

impl std::fmt::Display for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.format())
    }
}
