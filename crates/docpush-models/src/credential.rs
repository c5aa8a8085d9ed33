//! Service account credential models.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only credential type accepted for uploads.
pub const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Errors raised while parsing or validating a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid credential JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported credential type '{0}', expected 'service_account'")]
    WrongType(String),

    #[error("Credential is missing required field '{0}'")]
    MissingField(&'static str),
}

/// Service account key material, as found in a downloaded key file.
///
/// Never mutated after parsing. The private key may still contain literal
/// `\n` escapes; the signer normalizes them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(rename = "type", default)]
    pub account_type: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub auth_uri: String,
    #[serde(default)]
    pub token_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_provider_x509_cert_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_x509_cert_url: Option<String>,
}

impl CredentialRecord {
    /// Parse and validate a service account key file.
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let record: Self = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Check the type tag and the fields the upload path depends on.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.account_type != SERVICE_ACCOUNT_TYPE {
            return Err(CredentialError::WrongType(self.account_type.clone()));
        }

        let required = [
            ("project_id", &self.project_id),
            ("client_email", &self.client_email),
            ("private_key", &self.private_key),
            ("token_uri", &self.token_uri),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CredentialError::MissingField(name));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("account_type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}
