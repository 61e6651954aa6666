//! Canonical request construction for AWS Signature Version 4.
//!
//! The backends issue exactly one request shape: a PUT with the payload
//! hash carried in `x-amz-content-sha256` and no query string. The
//! canonical request is built directly in that form:
//!
//! ```text
//! PUT\n
//! /<key>\n
//! \n
//! host:<host>\n
//! x-amz-content-sha256:<hash>\n
//! x-amz-date:<long date>\n
//! x-amz-storage-class:REDUCED_REDUNDANCY\n
//! \n
//! host;x-amz-content-sha256;x-amz-date;x-amz-storage-class\n
//! <hash>
//! ```
//!
//! The headers are already lowercase and in sorted order, and the query
//! string line is empty. Any deviation from this byte sequence breaks
//! server-side signature verification.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// The storage class requested for every uploaded object.
pub const STORAGE_CLASS: &str = "REDUCED_REDUNDANCY";

/// The signed header list, fixed for the PUT request shape.
pub const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date;x-amz-storage-class";

/// The set of characters percent-encoded in URI path segments.
///
/// Per the SigV4 spec, everything except unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) must be encoded; forward slashes in
/// the path are preserved.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How object keys are embedded in the canonical request and request path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyEncoding {
    /// Embed keys verbatim.
    ///
    /// Matches the historical wire behavior. Keys containing reserved
    /// characters produce signatures the service rejects; backup trees
    /// contain only unreserved path characters.
    #[default]
    Raw,
    /// Percent-encode each path segment per the SigV4 unreserved set.
    ///
    /// Opting in changes the request path (and therefore the object key as
    /// stored) for keys with reserved characters.
    UriEncoded,
}

impl KeyEncoding {
    /// Apply this encoding to a bucket-relative key.
    #[must_use]
    pub fn apply(self, key: &str) -> String {
        match self {
            Self::Raw => key.to_owned(),
            Self::UriEncoded => key
                .split('/')
                .map(|segment| utf8_percent_encode(segment, URI_ENCODE_SET).to_string())
                .collect::<Vec<_>>()
                .join("/"),
        }
    }
}

/// Build the canonical request for one object PUT.
///
/// `key` is the bucket-relative object key without a leading slash;
/// `content_sha256` is the hex payload digest; `long_date` is the ISO 8601
/// basic timestamp (`YYYYMMDDThhmmssZ`).
#[must_use]
pub fn build_put_canonical_request(
    host: &str,
    key: &str,
    content_sha256: &str,
    long_date: &str,
    encoding: KeyEncoding,
) -> String {
    let key = encoding.apply(key);
    format!(
        "PUT\n/{key}\n\nhost:{host}\nx-amz-content-sha256:{content_sha256}\nx-amz-date:{long_date}\nx-amz-storage-class:{STORAGE_CLASS}\n\n{SIGNED_HEADERS}\n{content_sha256}"
    )
}
