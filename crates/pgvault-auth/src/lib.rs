//! Request signing for pgvault's storage offload backends.
//!
//! This crate implements the client side of two authentication protocols:
//! AWS Signature Version 4 (used for S3-compatible object storage) and the
//! Azure Storage shared-key scheme (used for Blob Storage). Both are
//! hand-rolled: every signing input must match the service's defined format
//! byte-for-byte, or server-side verification rejects the request.
//!
//! # Overview
//!
//! For SigV4, signing one PUT proceeds through a canonical request, a
//! string-to-sign scoped to (date, region, service), a four-stage HMAC-SHA256
//! key derivation, and a final hex-encoded signature embedded in the
//! `Authorization` header. All signing materials are ephemeral: they are
//! derived per file and never reused, because the key chain is scoped to the
//! calendar day.
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction per the SigV4 specification
//! - [`sigv4`] - Key derivation, string-to-sign, and Authorization assembly
//! - [`sharedkey`] - Azure Storage shared-key signing (HMAC-SHA256, base64)
//! - [`hash`] - SHA-256 payload hashing, including streaming file digests
//! - [`error`] - Signing error types

pub mod canonical;
pub mod error;
pub mod hash;
pub mod sharedkey;
pub mod sigv4;

pub use canonical::{KeyEncoding, build_put_canonical_request};
pub use error::SigningError;
pub use hash::{sha256_file, sha256_hex};
pub use sharedkey::{BlobSignRequest, SignedPutBlob, rfc1123_date, sign_put_blob};
pub use sigv4::{PutSignRequest, SignedPutObject, SigningDates, sign_put_object};
