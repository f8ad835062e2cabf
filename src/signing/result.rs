//! FinalizeSession result model
//!
//! The remote service answers in protobuf-JSON. Every `oneof` arrives as an
//! object with exactly one member key, which we decode through a raw struct
//! of optional fields and then fold into a closed Rust enum so the
//! reconciler can match exhaustively.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use super::session::NONCE_METADATA_KEY;

/// Type URL suffix identifying a `google.rpc.ErrorInfo` detail
pub const ERROR_INFO_TYPE: &str = "google.rpc.ErrorInfo";

/// Response of FinalizeSession
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResult {
    /// Metadata echoed back from the session request
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// One entry per answered request item, in request order
    #[serde(default)]
    pub results: Vec<ResultItem>,
}

impl FinalizeResult {
    /// Nonce echoed back by the service, if any
    pub fn nonce(&self) -> Option<&str> {
        self.metadata.get(NONCE_METADATA_KEY).map(String::as_str)
    }
}

/// A single result entry, mirroring the request item variants
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawResultItem")]
pub enum ResultItem {
    DigitalSignature(ItemResponse<DigitalSignatureResult>),
    PersonalInfoConsent(ItemResponse<PersonalInfoConsentResult>),
    /// A variant this build does not know about
    Unrecognized,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResultItem {
    #[serde(default)]
    digital_signature: Option<ItemResponse<DigitalSignatureResult>>,
    #[serde(default)]
    personal_info_consent: Option<ItemResponse<PersonalInfoConsentResult>>,
}

impl From<RawResultItem> for ResultItem {
    fn from(raw: RawResultItem) -> Self {
        match (raw.digital_signature, raw.personal_info_consent) {
            (Some(response), _) => ResultItem::DigitalSignature(response),
            (None, Some(response)) => ResultItem::PersonalInfoConsent(response),
            (None, None) => ResultItem::Unrecognized,
        }
    }
}

/// Success payload or structured failure for one item
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    from = "RawItemResponse<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub enum ItemResponse<T> {
    Result(T),
    Error(Status),
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct RawItemResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<Status>,
}

impl<T> From<RawItemResponse<T>> for ItemResponse<T> {
    fn from(raw: RawItemResponse<T>) -> Self {
        match (raw.result, raw.error) {
            (Some(result), _) => ItemResponse::Result(result),
            (None, Some(status)) => ItemResponse::Error(status),
            // Neither branch set: nothing usable came back, treat as an unexplained failure
            (None, None) => ItemResponse::Error(Status::default()),
        }
    }
}

/// Outcome of a JPKI digital signature request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalSignatureResult {
    #[serde(default)]
    pub verification: Option<Verification>,

    /// Only meaningful when verification is OK
    #[serde(default)]
    pub certificate_content: Option<CertificateContent>,
}

impl DigitalSignatureResult {
    /// Verification outcome, `Unspecified` when the service omitted it
    pub fn verification_result(&self) -> VerificationResult {
        self.verification
            .as_ref()
            .map(|v| v.result.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Verification {
    #[serde(default)]
    pub result: VerificationResult,
}

/// Signature verification outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VerificationResult {
    #[default]
    Unspecified,
    Ok,
    SignatureMismatch,
    CertificateRevoked,
    CertificateExpired,
    /// A value outside the known set, kept verbatim for diagnostics
    Unrecognized(String),
}

impl VerificationResult {
    /// Parse a proto enum name. Accepts both `RESULT_OK` and the bare `OK`.
    pub fn from_name(name: &str) -> Self {
        match name.strip_prefix("RESULT_").unwrap_or(name) {
            "UNSPECIFIED" => Self::Unspecified,
            "OK" => Self::Ok,
            "SIGNATURE_MISMATCH" => Self::SignatureMismatch,
            "CERTIFICATE_REVOKED" => Self::CertificateRevoked,
            "CERTIFICATE_EXPIRED" => Self::CertificateExpired,
            _ => Self::Unrecognized(name.to_string()),
        }
    }

    /// Parse a proto enum number
    pub fn from_number(value: i64) -> Self {
        match value {
            0 => Self::Unspecified,
            1 => Self::Ok,
            2 => Self::SignatureMismatch,
            3 => Self::CertificateRevoked,
            4 => Self::CertificateExpired,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl<'de> Deserialize<'de> for VerificationResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Number(i64),
            Null(()),
        }

        match Repr::deserialize(deserializer)
            .map_err(|_| de::Error::custom("verification result must be a string or integer"))?
        {
            Repr::Name(name) => Ok(Self::from_name(&name)),
            Repr::Number(n) => Ok(Self::from_number(n)),
            Repr::Null(()) => Ok(Self::Unspecified),
        }
    }
}

/// Certificate content attached to a verified signature
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCertificateContent")]
pub enum CertificateContent {
    /// Signing certificate of a JPKI card (My Number card)
    JpkiCardDigitalSignature(JpkiCardDigitalSignatureContent),
    /// Any other certificate kind
    Unrecognized,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCertificateContent {
    #[serde(default)]
    jpki_card_digital_signature_content: Option<JpkiCardDigitalSignatureContent>,
}

impl From<RawCertificateContent> for CertificateContent {
    fn from(raw: RawCertificateContent) -> Self {
        match raw.jpki_card_digital_signature_content {
            Some(content) => CertificateContent::JpkiCardDigitalSignature(content),
            None => CertificateContent::Unrecognized,
        }
    }
}

/// Attributes carried by a JPKI signing certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JpkiCardDigitalSignatureContent {
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub address: String,
}

/// Outcome of a personal-info consent request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoConsentResult {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// `google.rpc.Status` as carried in an item's error branch
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<StatusDetail>,
}

impl Status {
    /// First `ErrorInfo` detail, if any
    pub fn error_info(&self) -> Option<ErrorInfo> {
        self.details.iter().find_map(StatusDetail::as_error_info)
    }

    /// Free-text message, `None` when blank
    pub fn message(&self) -> Option<&str> {
        let message = self.message.trim();
        (!message.is_empty()).then_some(message)
    }
}

/// A `google.protobuf.Any` detail in its JSON form
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusDetail {
    #[serde(rename = "@type", default)]
    pub type_url: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

impl StatusDetail {
    fn as_error_info(&self) -> Option<ErrorInfo> {
        if !self.type_url.ends_with(ERROR_INFO_TYPE) {
            return None;
        }
        Some(ErrorInfo {
            reason: self.reason.clone().unwrap_or_default(),
            domain: self.domain.clone().unwrap_or_default(),
        })
    }
}

/// Structured failure reason (`google.rpc.ErrorInfo`)
///
/// The reason belongs to exactly one of the two reason enumerations; which
/// one depends on where the error surfaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    pub reason: String,
    pub domain: String,
}

impl ErrorInfo {
    /// Reason code, `None` when blank
    pub fn reason(&self) -> Option<&str> {
        (!self.reason.is_empty()).then_some(self.reason.as_str())
    }
}
