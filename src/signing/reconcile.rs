//! Result Reconciliation
//!
//! Turns a finalized session into the single message shown to the user.
//!
//! Terminal failures, checked in order:
//! 1. no session ID available -> [`ReconcileError::MissingSession`] (no remote call)
//! 2. finalize fails -> [`ReconcileError::RemoteCallFailed`]
//! 3. stored nonce differs from the echoed one -> [`ReconcileError::ForgeryDetected`]
//!
//! Anything past that is a business outcome: every result item yields one
//! fragment (declined consent and failed verification included) and the
//! fragments are joined with newlines.

use hyper::StatusCode;
use tracing::{info, warn};

use super::messages::Translator;
use super::result::{
    CertificateContent, DigitalSignatureResult, FinalizeResult, ItemResponse,
    PersonalInfoConsentResult, ResultItem, Status,
};
use super::store::{TokenSlot, TokenStore};
use crate::stamp::{RemoteError, SessionClient};

/// Protocol or security failure that aborts the callback
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("no session identifier is available")]
    MissingSession,

    #[error("nonce mismatch: callback does not belong to this browser session")]
    ForgeryDetected,

    #[error("finalize call failed: {0}")]
    RemoteCallFailed(#[source] RemoteError),
}

impl ReconcileError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingSession => StatusCode::BAD_REQUEST,
            Self::ForgeryDetected => StatusCode::FORBIDDEN,
            Self::RemoteCallFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Sentence for the error page
    pub fn user_message(&self, translator: &Translator) -> String {
        match self {
            Self::MissingSession => translator.missing_session().to_string(),
            Self::ForgeryDetected => translator.forgery_detected().to_string(),
            Self::RemoteCallFailed(err) => remote_failure_message(err, translator),
        }
    }
}

/// Sentence for a failed remote call
///
/// A reason code is looked up in the session lifecycle table. Without one,
/// the generic sentence is followed by the raw error for diagnostics.
pub fn remote_failure_message(err: &RemoteError, translator: &Translator) -> String {
    match err.reason() {
        Some(reason) => translator.stamp_error(Some(reason)).to_string(),
        None => translator.unknown_error_with_detail(&err.to_string()),
    }
}

/// Successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub session_id: String,
    /// Newline-joined fragments
    pub content: String,
}

/// Interprets finalize results into user-facing text
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    translator: Translator,
}

impl Reconciler {
    pub fn new(translator: Translator) -> Self {
        Self { translator }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Check the nonce and interpret every result item.
    ///
    /// Pure: the same inputs always give the same output.
    pub fn reconcile(
        &self,
        stored_nonce: Option<&str>,
        result: &FinalizeResult,
    ) -> Result<String, ReconcileError> {
        match (stored_nonce, result.nonce()) {
            (Some(stored), Some(echoed)) if stored == echoed => {}
            _ => return Err(ReconcileError::ForgeryDetected),
        }

        let fragments: Vec<String> = result
            .results
            .iter()
            .filter_map(|item| self.interpret(item))
            .filter(|fragment| !fragment.is_empty())
            .collect();

        Ok(fragments.join("\n"))
    }

    fn interpret(&self, item: &ResultItem) -> Option<String> {
        match item {
            ResultItem::DigitalSignature(response) => Some(self.digital_signature(response)),
            ResultItem::PersonalInfoConsent(response) => Some(self.consent(response)),
            ResultItem::Unrecognized => None,
        }
    }

    fn digital_signature(&self, response: &ItemResponse<DigitalSignatureResult>) -> String {
        let t = &self.translator;
        match response {
            ItemResponse::Result(signature) => {
                let verification = signature.verification_result();
                if !verification.is_ok() {
                    return t.signature_rejected(&verification);
                }
                match &signature.certificate_content {
                    Some(CertificateContent::JpkiCardDigitalSignature(card)) => {
                        t.signature_completed(&card.common_name, &card.address)
                    }
                    Some(CertificateContent::Unrecognized) | None => t.unrecognized_certificate(),
                }
            }
            ItemResponse::Error(status) => t.signature_missing(status.message()),
        }
    }

    fn consent(&self, response: &ItemResponse<PersonalInfoConsentResult>) -> String {
        let t = &self.translator;
        match response {
            ItemResponse::Result(consent) => t.consent_acknowledged(consent.expires_at),
            ItemResponse::Error(status) => t.consent_unconfirmed(&self.consent_reason(status)),
        }
    }

    /// Translated reason code, else the free-text message, else the generic sentence
    fn consent_reason(&self, status: &Status) -> String {
        let t = &self.translator;
        match status.error_info().as_ref().and_then(|info| info.reason()) {
            Some(reason) => t.verify_error(Some(reason)).to_string(),
            None => status
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| t.unknown_error().to_string()),
        }
    }
}

/// Handle a signing service callback end to end.
///
/// `query_session_id` is the `session_id` query parameter, only passed when
/// the service was asked to append it; otherwise the stored value is used.
/// The store is only read.
pub async fn finalize_and_reconcile(
    client: &dyn SessionClient,
    store: &dyn TokenStore,
    query_session_id: Option<&str>,
    reconciler: &Reconciler,
) -> Result<Outcome, ReconcileError> {
    let stored_nonce = store.get(TokenSlot::Nonce);
    let session_id = query_session_id
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| store.get(TokenSlot::SessionId))
        .ok_or(ReconcileError::MissingSession)?;

    let result = client
        .finalize_session(&session_id)
        .await
        .map_err(ReconcileError::RemoteCallFailed)?;

    match reconciler.reconcile(stored_nonce.as_deref(), &result) {
        Ok(content) => {
            info!(session_id = %session_id, items = result.results.len(), "Session reconciled");
            Ok(Outcome {
                session_id,
                content,
            })
        }
        Err(e) => {
            warn!(session_id = %session_id, "Rejected callback: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::messages::{display_offset, Locale};
    use crate::signing::result::{
        ErrorInfo, JpkiCardDigitalSignatureContent, StatusDetail, Verification, VerificationResult,
    };
    use crate::signing::session::{CreateSessionRequest, CreateSessionResponse};
    use crate::signing::store::MemoryTokenStore;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn reconciler() -> Reconciler {
        Reconciler::new(Translator::new(Locale::En, display_offset(0).unwrap()))
    }

    fn finalize(nonce: Option<&str>, results: Vec<ResultItem>) -> FinalizeResult {
        let mut metadata = HashMap::new();
        if let Some(nonce) = nonce {
            metadata.insert("nonce".to_string(), nonce.to_string());
        }
        FinalizeResult { metadata, results }
    }

    fn signed(verification: VerificationResult, cert: Option<CertificateContent>) -> ResultItem {
        ResultItem::DigitalSignature(ItemResponse::Result(DigitalSignatureResult {
            verification: Some(Verification {
                result: verification,
            }),
            certificate_content: cert,
        }))
    }

    fn card(common_name: &str, address: &str) -> Option<CertificateContent> {
        Some(CertificateContent::JpkiCardDigitalSignature(
            JpkiCardDigitalSignatureContent {
                common_name: common_name.to_string(),
                address: address.to_string(),
            },
        ))
    }

    fn consent_error(reason: Option<&str>, message: &str) -> ResultItem {
        ResultItem::PersonalInfoConsent(ItemResponse::Error(Status {
            code: 9,
            message: message.to_string(),
            details: reason
                .map(|r| {
                    vec![StatusDetail {
                        type_url: "type.googleapis.com/google.rpc.ErrorInfo".to_string(),
                        reason: Some(r.to_string()),
                        domain: None,
                    }]
                })
                .unwrap_or_default(),
        }))
    }

    #[test]
    fn test_verified_signer_card() {
        let result = finalize(
            Some("n"),
            vec![signed(VerificationResult::Ok, card("山田太郎", "東京都千代田区1-1"))],
        );
        let content = reconciler().reconcile(Some("n"), &result).unwrap();
        assert!(content.contains("山田太郎"));
        assert!(content.contains("東京都千代田区1-1"));
    }

    #[test]
    fn test_signature_mismatch() {
        let result = finalize(Some("n"), vec![signed(VerificationResult::SignatureMismatch, None)]);
        let content = reconciler().reconcile(Some("n"), &result).unwrap();
        assert_eq!(content, "Identity verification failed. Reason: signature did not match.");
    }

    #[test]
    fn test_unknown_verification_value_falls_back() {
        let result = finalize(
            Some("n"),
            vec![signed(VerificationResult::Unrecognized("RESULT_NEW".into()), None)],
        );
        let content = reconciler().reconcile(Some("n"), &result).unwrap();
        assert_eq!(content, "Identity verification failed. Reason: unknown error.");
    }

    #[test]
    fn test_unrecognized_certificate_is_explicit() {
        let result = finalize(
            Some("n"),
            vec![signed(VerificationResult::Ok, Some(CertificateContent::Unrecognized))],
        );
        let content = reconciler().reconcile(Some("n"), &result).unwrap();
        assert_eq!(
            content,
            "Identity verification failed. Reason: unrecognized certificate type."
        );
    }

    #[test]
    fn test_signature_never_produced_uses_message() {
        let result = finalize(
            Some("n"),
            vec![ResultItem::DigitalSignature(ItemResponse::Error(Status {
                code: 10,
                message: "user aborted".to_string(),
                details: vec![],
            }))],
        );
        let content = reconciler().reconcile(Some("n"), &result).unwrap();
        assert_eq!(content, "Your application could not be confirmed. Reason: user aborted");
    }

    #[test]
    fn test_consent_absent_emits_signature_only() {
        let result = finalize(
            Some("n"),
            vec![signed(VerificationResult::Ok, card("山田太郎", "東京都"))],
        );
        let content = reconciler().reconcile(Some("n"), &result).unwrap();
        assert!(!content.contains('\n'));
        assert_eq!(
            content,
            reconciler().translator().signature_completed("山田太郎", "東京都")
        );
    }

    #[test]
    fn test_consent_granted_joined_in_order() {
        let expires = chrono::Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();
        let result = finalize(
            Some("n"),
            vec![
                signed(VerificationResult::Ok, card("山田太郎", "東京都")),
                ResultItem::PersonalInfoConsent(ItemResponse::Result(PersonalInfoConsentResult {
                    expires_at: Some(expires),
                })),
            ],
        );
        let content = reconciler().reconcile(Some("n"), &result).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("山田太郎"));
        assert!(lines[1].contains("2026/03/31 00:00:00"));
    }

    #[test]
    fn test_consent_error_translation_and_fallbacks() {
        let r = reconciler();

        let coded = finalize(
            Some("n"),
            vec![consent_error(Some("ERROR_REASON_PERSONAL_INFO_CONSENT_REVOKED"), "ignored")],
        );
        assert!(r
            .reconcile(Some("n"), &coded)
            .unwrap()
            .ends_with("The consent has been revoked."));

        let free_text = finalize(Some("n"), vec![consent_error(None, "card locked")]);
        assert!(r.reconcile(Some("n"), &free_text).unwrap().ends_with("card locked"));

        let nothing = finalize(Some("n"), vec![consent_error(None, "")]);
        assert!(r
            .reconcile(Some("n"), &nothing)
            .unwrap()
            .ends_with(r.translator().unknown_error()));
    }

    #[test]
    fn test_unrecognized_item_skipped() {
        let result = finalize(
            Some("n"),
            vec![
                ResultItem::Unrecognized,
                signed(VerificationResult::CertificateExpired, None),
            ],
        );
        let content = reconciler().reconcile(Some("n"), &result).unwrap();
        assert_eq!(content, "Identity verification failed. Reason: certificate expired.");
    }

    #[test]
    fn test_nonce_mismatch_is_forgery_regardless_of_items() {
        let items = vec![signed(VerificationResult::Ok, card("a", "b"))];
        let r = reconciler();

        for (stored, echoed) in [
            (Some("n1"), Some("n2")),
            (None, Some("n2")),
            (Some("n1"), None),
            (None, None),
            (Some(""), Some("n")),
        ] {
            let result = finalize(echoed, items.clone());
            assert_eq!(
                r.reconcile(stored, &result),
                Err(ReconcileError::ForgeryDetected),
                "stored={:?} echoed={:?}",
                stored,
                echoed
            );
        }
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let result = finalize(
            Some("n"),
            vec![
                signed(VerificationResult::CertificateRevoked, None),
                consent_error(Some("ERROR_REASON_PERSONAL_INFO_NOT_CONSENTED"), ""),
            ],
        );
        let r = reconciler();
        assert_eq!(r.reconcile(Some("n"), &result), r.reconcile(Some("n"), &result));
    }

    #[test]
    fn test_remote_failure_messages() {
        let t = Translator::new(Locale::En, display_offset(0).unwrap());
        let coded = RemoteError::Protocol {
            code: "failed_precondition".into(),
            message: "already".into(),
            error_info: Some(ErrorInfo {
                reason: "ERROR_REASON_SESSION_ALREADY_COMPLETED".into(),
                domain: String::new(),
            }),
        };
        assert_eq!(
            ReconcileError::RemoteCallFailed(coded).user_message(&t),
            "The session has already been completed."
        );

        let raw = RemoteError::Transport("connection refused".into());
        let message = ReconcileError::RemoteCallFailed(raw).user_message(&t);
        assert!(message.starts_with(t.unknown_error()));
        assert!(message.contains("connection refused"));
    }

    // ------------------------------------------------------------------
    // End-to-end flow against a fake client
    // ------------------------------------------------------------------

    struct FakeClient {
        result: Result<FinalizeResult, RemoteError>,
        finalize_calls: AtomicUsize,
        last_session: std::sync::Mutex<Option<String>>,
    }

    impl FakeClient {
        fn new(result: Result<FinalizeResult, RemoteError>) -> Self {
            Self {
                result,
                finalize_calls: AtomicUsize::new(0),
                last_session: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl SessionClient for FakeClient {
        async fn create_session(
            &self,
            _request: &CreateSessionRequest,
        ) -> Result<CreateSessionResponse, RemoteError> {
            unreachable!("callback flow never creates sessions")
        }

        async fn finalize_session(&self, session_id: &str) -> Result<FinalizeResult, RemoteError> {
            self.finalize_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_session.lock().unwrap() = Some(session_id.to_string());
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn test_missing_session_skips_remote_call() {
        let client = FakeClient::new(Ok(finalize(Some("n"), vec![])));
        let store = MemoryTokenStore::new().with(TokenSlot::Nonce, "n");

        let outcome = finalize_and_reconcile(&client, &store, None, &reconciler()).await;

        assert_eq!(outcome, Err(ReconcileError::MissingSession));
        assert_eq!(client.finalize_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_flow_uses_stored_session_id() {
        let client = FakeClient::new(Ok(finalize(
            Some("n"),
            vec![signed(VerificationResult::Ok, card("山田太郎", "東京都"))],
        )));
        let store = MemoryTokenStore::new()
            .with(TokenSlot::Nonce, "n")
            .with(TokenSlot::SessionId, "sess-1");

        let outcome = finalize_and_reconcile(&client, &store, None, &reconciler())
            .await
            .unwrap();

        assert_eq!(outcome.session_id, "sess-1");
        assert!(outcome.content.contains("山田太郎"));
        assert_eq!(client.last_session.lock().unwrap().as_deref(), Some("sess-1"));
    }

    #[test]
    fn test_flow_prefers_query_session_id() {
        let client = FakeClient::new(Ok(finalize(Some("n"), vec![])));
        let store = MemoryTokenStore::new()
            .with(TokenSlot::Nonce, "n")
            .with(TokenSlot::SessionId, "from-cookie");

        let outcome = tokio_test::block_on(finalize_and_reconcile(
            &client,
            &store,
            Some("from-query"),
            &reconciler(),
        ))
        .unwrap();

        assert_eq!(outcome.session_id, "from-query");
        assert_eq!(outcome.content, "");
    }

    #[tokio::test]
    async fn test_flow_forgery_detected() {
        let client = FakeClient::new(Ok(finalize(Some("attacker"), vec![])));
        let store = MemoryTokenStore::new()
            .with(TokenSlot::Nonce, "n")
            .with(TokenSlot::SessionId, "sess-1");

        let outcome = finalize_and_reconcile(&client, &store, None, &reconciler()).await;
        assert_eq!(outcome, Err(ReconcileError::ForgeryDetected));
    }

    #[tokio::test]
    async fn test_flow_remote_failure() {
        let err = RemoteError::Protocol {
            code: "not_found".into(),
            message: "no such session".into(),
            error_info: Some(ErrorInfo {
                reason: "ERROR_REASON_NO_SUCH_SESSION".into(),
                domain: String::new(),
            }),
        };
        let client = FakeClient::new(Err(err.clone()));
        let store = MemoryTokenStore::new()
            .with(TokenSlot::Nonce, "n")
            .with(TokenSlot::SessionId, "sess-1");

        let outcome = finalize_and_reconcile(&client, &store, None, &reconciler()).await;
        assert_eq!(outcome, Err(ReconcileError::RemoteCallFailed(err)));
    }
}
