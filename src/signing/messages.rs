//! User-facing message texts
//!
//! All sentences the gateway shows to a human live here, keyed by
//! [`Locale`]. Reason code tables live in [`super::reasons`]; this module
//! composes them into the per-item fragments of the final outcome.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use super::reasons::{
    stamp_error_message, unknown_error_message, verify_error_message, StampErrorReason,
    VerifyErrorReason,
};
use super::result::VerificationResult;

/// Default display offset for timestamps (JST)
pub const DEFAULT_DISPLAY_OFFSET_MINUTES: i32 = 9 * 60;

/// Display language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ja" | "ja-jp" => Ok(Locale::Ja),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

/// Build a display offset from minutes east of UTC
pub fn display_offset(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// Formats every human-readable sentence for one locale
#[derive(Debug, Clone)]
pub struct Translator {
    locale: Locale,
    display_offset: FixedOffset,
}

impl Default for Translator {
    fn default() -> Self {
        let offset = display_offset(DEFAULT_DISPLAY_OFFSET_MINUTES).unwrap_or_else(|| Utc.fix());
        Self::new(Locale::Ja, offset)
    }
}

impl Translator {
    pub fn new(locale: Locale, display_offset: FixedOffset) -> Self {
        Self {
            locale,
            display_offset,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    // ---------------------------------------------------------------------
    // Reason tables
    // ---------------------------------------------------------------------

    /// Generic "unknown error" sentence
    pub fn unknown_error(&self) -> &'static str {
        unknown_error_message(self.locale)
    }

    /// Translate a session lifecycle reason code. Unknown or absent codes,
    /// including codes from the verification enumeration, give the generic sentence.
    pub fn stamp_error(&self, reason: Option<&str>) -> &'static str {
        match reason.and_then(StampErrorReason::from_code) {
            Some(reason) => stamp_error_message(reason, self.locale),
            None => self.unknown_error(),
        }
    }

    /// Translate a verification / consent reason code. Unknown or absent
    /// codes give the generic sentence.
    pub fn verify_error(&self, reason: Option<&str>) -> &'static str {
        match reason.and_then(VerifyErrorReason::from_code) {
            Some(reason) => verify_error_message(reason, self.locale),
            None => self.unknown_error(),
        }
    }

    /// Reason sentence for a non-OK verification outcome
    pub fn verification_failure(&self, result: &VerificationResult) -> &'static str {
        match (self.locale, result) {
            (Locale::Ja, VerificationResult::SignatureMismatch) => "署名が一致しませんでした",
            (Locale::Ja, VerificationResult::CertificateRevoked) => "証明書が失効しています",
            (Locale::Ja, VerificationResult::CertificateExpired) => "証明書が期限切れです",
            (Locale::Ja, _) => "不明なエラーが発生しました",
            (Locale::En, VerificationResult::SignatureMismatch) => "signature did not match",
            (Locale::En, VerificationResult::CertificateRevoked) => "certificate revoked",
            (Locale::En, VerificationResult::CertificateExpired) => "certificate expired",
            (Locale::En, _) => "unknown error",
        }
    }

    // ---------------------------------------------------------------------
    // Outcome fragments
    // ---------------------------------------------------------------------

    /// Signature verified against a JPKI signing certificate
    pub fn signature_completed(&self, common_name: &str, address: &str) -> String {
        match self.locale {
            Locale::Ja => format!(
                "{} 様、お申し込みありがとうございました。ご自宅（{}）に契約書をお送りします。",
                common_name, address
            ),
            Locale::En => format!(
                "Thank you for your application, {}. The contract will be mailed to your home ({}).",
                common_name, address
            ),
        }
    }

    /// Signature produced but verification did not pass
    pub fn signature_rejected(&self, result: &VerificationResult) -> String {
        let reason = self.verification_failure(result);
        match self.locale {
            Locale::Ja => format!("本人確認に失敗しました。理由：{}。", reason),
            Locale::En => format!("Identity verification failed. Reason: {}.", reason),
        }
    }

    /// Signature verified, but by a certificate kind we do not handle
    pub fn unrecognized_certificate(&self) -> String {
        match self.locale {
            Locale::Ja => "本人確認に失敗しました。理由：対応していない種類の証明書です。".to_string(),
            Locale::En => {
                "Identity verification failed. Reason: unrecognized certificate type.".to_string()
            }
        }
    }

    /// The signature was never produced
    pub fn signature_missing(&self, message: Option<&str>) -> String {
        let message = message.unwrap_or_else(|| self.unknown_error());
        match self.locale {
            Locale::Ja => format!("お申し込みが確認できませんでした。理由：{}", message),
            Locale::En => format!("Your application could not be confirmed. Reason: {}", message),
        }
    }

    /// Consent granted until `expires_at`
    pub fn consent_acknowledged(&self, expires_at: Option<DateTime<Utc>>) -> String {
        let until = self.format_timestamp(expires_at);
        match self.locale {
            Locale::Ja => format!(
                "また、最新4情報の提供に同意いただきありがとうございます。同意は {} まで有効です。",
                until
            ),
            Locale::En => format!(
                "Thank you also for consenting to share your latest personal information. The consent is valid until {}.",
                until
            ),
        }
    }

    /// Consent could not be confirmed; `reason` is an already translated sentence
    pub fn consent_unconfirmed(&self, reason: &str) -> String {
        match self.locale {
            Locale::Ja => format!("最新4情報の提供の同意が確認できませんでした。理由：{}", reason),
            Locale::En => format!(
                "Consent to share your latest personal information could not be confirmed. Reason: {}",
                reason
            ),
        }
    }

    // ---------------------------------------------------------------------
    // Terminal errors
    // ---------------------------------------------------------------------

    pub fn missing_session(&self) -> &'static str {
        match self.locale {
            Locale::Ja => "セッションIDがありません。",
            Locale::En => "No session ID is available.",
        }
    }

    pub fn forgery_detected(&self) -> &'static str {
        match self.locale {
            Locale::Ja => "不正なリダイレクトを検知しました。",
            Locale::En => "An illegitimate redirect was detected.",
        }
    }

    pub fn missing_plan(&self) -> &'static str {
        match self.locale {
            Locale::Ja => "プランが選択されていません。",
            Locale::En => "No plan was selected.",
        }
    }

    /// Generic sentence followed by raw diagnostics
    pub fn unknown_error_with_detail(&self, detail: &str) -> String {
        format!("{}\n\n{}", self.unknown_error(), detail)
    }

    // ---------------------------------------------------------------------
    // Session request texts
    // ---------------------------------------------------------------------

    /// Content the user signs; embeds the plan label verbatim
    pub fn agreement_text(&self, plan: &str) -> String {
        match self.locale {
            Locale::Ja => format!(
                "【申込書】\n利用規約に同意し、選択したプランに申し込みます。\nプラン: {}",
                plan
            ),
            Locale::En => format!(
                "[Application]\nI agree to the terms of service and apply for the selected plan.\nPlan: {}",
                plan
            ),
        }
    }

    /// Markdown shown to the user while signing; embeds the plan label verbatim
    pub fn printable_disclosure(&self, plan: &str) -> String {
        match self.locale {
            Locale::Ja => format!(
                "ポケットサインターネットにお申し込みいただきありがとうございます。申込内容は以下のとおりです。\n\nプラン: {}",
                plan
            ),
            Locale::En => format!(
                "Thank you for applying to PocketSign Internet. Your application details are as follows.\n\nPlan: {}",
                plan
            ),
        }
    }

    fn format_timestamp(&self, at: Option<DateTime<Utc>>) -> String {
        match at {
            Some(at) => at
                .with_timezone(&self.display_offset)
                .format("%Y/%m/%d %H:%M:%S")
                .to_string(),
            None => match self.locale {
                Locale::Ja => "不明".to_string(),
                Locale::En => "unknown".to_string(),
            },
        }
    }
}
