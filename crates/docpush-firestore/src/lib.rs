//! Firestore REST plumbing for document uploads.
//!
//! This crate provides:
//! - Service account JWT assertions signed with the key file's private key
//! - OAuth2 token exchange for a short-lived bearer token
//! - Encoding of dynamic documents into Firestore's typed wire values
//! - A document-create client with tracing spans and request metrics

pub mod assertion;
pub mod client;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod token;
pub mod types;


pub use assertion::{AssertionClaims, AssertionSigner, SignedAssertion, DATASTORE_SCOPE};
pub use client::{validate_collection_path, FirestoreClient, FirestoreConfig};
pub use encoder::{encode_document, encode_document_at, encode_value, parse_geo_point};
pub use error::{FirestoreError, FirestoreResult};
pub use token::{acquire_token, AccessToken, TokenExchanger};
pub use types::{Document, GeoPoint, Value};
