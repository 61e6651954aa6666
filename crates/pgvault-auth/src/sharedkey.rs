//! Azure Storage shared-key signing for Blob PUT requests.
//!
//! The signature is `Base64(HMAC-SHA256(Base64Decode(key), StringToSign))`
//! carried in an `Authorization: SharedKey account:signature` header. The
//! string to sign interleaves fixed header slots with the canonicalized
//! `x-ms-*` headers and the canonicalized resource:
//!
//! ```text
//! PUT\n\n\n<length>\n\napplication/octet-stream\n\n\n\n\n\n\n
//! x-ms-blob-type:BlockBlob\n
//! x-ms-date:<rfc 1123 date>\n
//! x-ms-version:2021-08-06\n
//! /<account>/<container>/<path>
//! ```
//!
//! A zero-length body leaves the Content-Length slot empty rather than
//! writing `0`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SigningResult;

type HmacSha256 = Hmac<Sha256>;

/// Blob type header value for every uploaded blob.
pub const BLOB_TYPE: &str = "BlockBlob";

/// The storage service version the requests are pinned to.
pub const MS_VERSION: &str = "2021-08-06";

/// Content type sent with every blob PUT.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Inputs for signing one blob PUT.
///
/// `path` is the container-relative blob path without a leading slash;
/// `shared_key` is the base64-encoded account key.
#[derive(Debug, Clone, Copy)]
pub struct BlobSignRequest<'a> {
    /// Storage account name.
    pub account: &'a str,
    /// Container name.
    pub container: &'a str,
    /// Container-relative blob path.
    pub path: &'a str,
    /// Base64-encoded shared account key.
    pub shared_key: &'a str,
    /// Payload length in bytes.
    pub content_length: u64,
}

/// A signed blob PUT, ready to be turned into an HTTP request.
#[derive(Debug, Clone)]
pub struct SignedPutBlob {
    /// The complete `Authorization` header value.
    pub authorization: String,
    /// The `x-ms-date` header value.
    pub ms_date: String,
}

/// Render an instant as the RFC 1123 date the `x-ms-date` header requires.
#[must_use]
pub fn rfc1123_date(instant: &DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the shared-key string to sign for a blob PUT.
#[must_use]
pub fn build_blob_string_to_sign(req: &BlobSignRequest<'_>, ms_date: &str) -> String {
    let content_length = if req.content_length == 0 {
        String::new()
    } else {
        req.content_length.to_string()
    };

    format!(
        "PUT\n\n\n{content_length}\n\n{CONTENT_TYPE}\n\n\n\n\n\n\n\
         x-ms-blob-type:{BLOB_TYPE}\n\
         x-ms-date:{ms_date}\n\
         x-ms-version:{MS_VERSION}\n\
         /{}/{}/{}",
        req.account, req.container, req.path
    )
}

/// Sign one blob PUT end to end.
///
/// # Errors
///
/// Returns [`crate::SigningError::InvalidSharedKey`] when the account key is
/// not valid base64.
pub fn sign_put_blob(req: &BlobSignRequest<'_>, ms_date: &str) -> SigningResult<SignedPutBlob> {
    let key = BASE64.decode(req.shared_key)?;
    let string_to_sign = build_blob_string_to_sign(req, ms_date);

    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC can accept any key length");
    mac.update(string_to_sign.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    Ok(SignedPutBlob {
        authorization: format!("SharedKey {}:{signature}", req.account),
        ms_date: ms_date.to_owned(),
    })
}
