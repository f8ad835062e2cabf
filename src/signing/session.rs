//! Session Request Construction
//!
//! Builds the CreateSession request: one required JPKI digital signature
//! over the application form and one optional consent to disclose the
//! latest personal information. A fresh nonce is attached as metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::messages::Translator;
use super::nonce::NonceSource;

/// Metadata key carrying the anti-forgery nonce
pub const NONCE_METADATA_KEY: &str = "nonce";

/// Default session lifetime (1 hour)
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 3600;

/// CreateSession request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Where the user is sent once they finish on the signing service
    pub callback_url: String,

    /// Requested items, in the order results must be interpreted
    pub requests: Vec<RequestItem>,

    pub expires_at: DateTime<Utc>,

    /// Opaque values echoed back by FinalizeSession
    pub metadata: BTreeMap<String, String>,

    /// Ask mobile users to return to the original browser by hand
    pub require_manual_return: bool,

    /// Ask the service to append `session_id` to the callback URL
    pub callback_with_session_id: bool,
}

impl CreateSessionRequest {
    /// Nonce embedded in the metadata
    pub fn nonce(&self) -> Option<&str> {
        self.metadata.get(NONCE_METADATA_KEY).map(String::as_str)
    }
}

/// CreateSession response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub id: String,
    pub redirect_url: String,
}

/// One requested action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestItem {
    /// When true the user cannot skip this item
    pub required: bool,

    #[serde(flatten)]
    pub request: RequestKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    DigitalSignature(DigitalSignatureRequest),
    PersonalInfoConsent(PersonalInfoConsentRequest),
}

/// Signature over `content` with the JPKI signing certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalSignatureRequest {
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,

    /// CommonMark shown to the user in place of the raw bytes
    pub printable_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfoConsentRequest {
    pub preference: PersonalInfoPreference,
}

/// Which of the four basic attributes the user is asked to disclose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoPreference {
    pub address: bool,
    pub common_name: bool,
    pub date_of_birth: bool,
    pub gender: bool,
}

impl PersonalInfoPreference {
    pub fn all() -> Self {
        Self {
            address: true,
            common_name: true,
            date_of_birth: true,
            gender: true,
        }
    }
}

/// protobuf-JSON `bytes` fields are standard base64
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Assembles CreateSession requests
#[derive(Debug, Clone)]
pub struct SessionRequestBuilder {
    translator: Translator,
    ttl: Duration,
    require_manual_return: bool,
    callback_with_session_id: bool,
}

impl Default for SessionRequestBuilder {
    fn default() -> Self {
        Self::new(Translator::default())
    }
}

impl SessionRequestBuilder {
    pub fn new(translator: Translator) -> Self {
        Self {
            translator,
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECONDS),
            require_manual_return: true,
            callback_with_session_id: false,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_manual_return(mut self, require: bool) -> Self {
        self.require_manual_return = require;
        self
    }

    pub fn with_callback_session_id(mut self, enabled: bool) -> Self {
        self.callback_with_session_id = enabled;
        self
    }

    /// Build a request for `plan`, calling back to `{origin}/callback`.
    ///
    /// The plan label is passed through as-is. Only the nonce depends on
    /// anything but the arguments.
    pub fn build(
        &self,
        plan: &str,
        origin: &str,
        now: DateTime<Utc>,
        nonces: &dyn NonceSource,
    ) -> CreateSessionRequest {
        let signature = RequestItem {
            required: true,
            request: RequestKind::DigitalSignature(DigitalSignatureRequest {
                content: self.translator.agreement_text(plan).into_bytes(),
                printable_content: self.translator.printable_disclosure(plan),
            }),
        };

        let consent = RequestItem {
            required: false,
            request: RequestKind::PersonalInfoConsent(PersonalInfoConsentRequest {
                preference: PersonalInfoPreference::all(),
            }),
        };

        let mut metadata = BTreeMap::new();
        metadata.insert(NONCE_METADATA_KEY.to_string(), nonces.generate());

        CreateSessionRequest {
            callback_url: format!("{}/callback", origin.trim_end_matches('/')),
            requests: vec![signature, consent],
            expires_at: now + self.ttl,
            metadata,
            require_manual_return: self.require_manual_return,
            callback_with_session_id: self.callback_with_session_id,
        }
    }
}
