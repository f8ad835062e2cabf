//! Error reason codes reported by the remote service
//!
//! Two closed enumerations exist and they must never be mixed:
//! - [`StampErrorReason`] comes from the session lifecycle RPCs
//!   (CreateSession / FinalizeSession failures)
//! - [`VerifyErrorReason`] comes from verification and consent outcomes
//!   attached to individual result items
//!
//! Each enumeration has its own message table per [`Locale`].

use super::messages::Locale;

macro_rules! reason_codes {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every code in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation (`ERROR_REASON_*`)
            pub fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Parse a wire code. Codes outside this enumeration yield `None`.
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

reason_codes! {
    /// Session lifecycle failures (CreateSession / FinalizeSession)
    StampErrorReason {
        Unspecified => "ERROR_REASON_UNSPECIFIED",
        NoSuchSession => "ERROR_REASON_NO_SUCH_SESSION",
        SessionNotCompleted => "ERROR_REASON_SESSION_NOT_COMPLETED",
        SessionAlreadyCompleted => "ERROR_REASON_SESSION_ALREADY_COMPLETED",
        SessionExpired => "ERROR_REASON_SESSION_EXPIRED",
        SessionCanceled => "ERROR_REASON_SESSION_CANCELED",
    }
}

reason_codes! {
    /// Verification and personal-info consent failures
    VerifyErrorReason {
        Unspecified => "ERROR_REASON_UNSPECIFIED",
        InvalidCertificate => "ERROR_REASON_INVALID_CERTIFICATE",
        UnsupportedCertificate => "ERROR_REASON_UNSUPPORTED_CERTIFICATE",
        OcspRequestFailed => "ERROR_REASON_OCSP_REQUEST_FAILED",
        AssociatedCertificateNotExists => "ERROR_REASON_ASSOCIATED_CERTIFICATE_NOT_EXISTS",
        ConsentServiceCertificateRevoked => "ERROR_REASON_CONSENT_SERVICE_CERTIFICATE_REVOKED",
        ConsentServiceCertificateExpired => "ERROR_REASON_CONSENT_SERVICE_CERTIFICATE_EXPIRED",
        ConsentServiceCertificateOnHold => "ERROR_REASON_CONSENT_SERVICE_CERTIFICATE_ON_HOLD",
        ConsentServiceVerificationFailed => "ERROR_REASON_CONSENT_SERVICE_VERIFICATION_FAILED",
        ConsentServiceNotConsented => "ERROR_REASON_CONSENT_SERVICE_NOT_CONSENTED",
        ConsentServiceConsentExpired => "ERROR_REASON_CONSENT_SERVICE_CONSENT_EXPIRED",
        ConsentServiceConsentRevoked => "ERROR_REASON_CONSENT_SERVICE_CONSENT_REVOKED",
        ConsentServiceRequestFailed => "ERROR_REASON_CONSENT_SERVICE_REQUEST_FAILED",
        PersonalInfoNotConsented => "ERROR_REASON_PERSONAL_INFO_NOT_CONSENTED",
        PersonalInfoConsentExpired => "ERROR_REASON_PERSONAL_INFO_CONSENT_EXPIRED",
        PersonalInfoConsentRevoked => "ERROR_REASON_PERSONAL_INFO_CONSENT_REVOKED",
        PersonalInfoLatestCertificateExpired => "ERROR_REASON_PERSONAL_INFO_LATEST_CERTIFICATE_EXPIRED",
        PersonalInfoLatestCertificateRevokedOrOnHold => "ERROR_REASON_PERSONAL_INFO_LATEST_CERTIFICATE_REVOKED_OR_ON_HOLD",
        PersonalInfoLatestCertificateUnknown => "ERROR_REASON_PERSONAL_INFO_LATEST_CERTIFICATE_UNKNOWN",
        PersonalInfoRequestFailed => "ERROR_REASON_PERSONAL_INFO_REQUEST_FAILED",
    }
}

/// Generic sentence for unknown or absent reason codes
pub fn unknown_error_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Ja => "不明なエラーが発生しました。",
        Locale::En => "An unknown error occurred.",
    }
}

/// Localized sentence for a session lifecycle reason
pub fn stamp_error_message(reason: StampErrorReason, locale: Locale) -> &'static str {
    use StampErrorReason::*;

    match locale {
        Locale::Ja => match reason {
            Unspecified => unknown_error_message(locale),
            NoSuchSession => "セッションが見つかりませんでした。",
            SessionNotCompleted => "セッションが完了していません。",
            SessionAlreadyCompleted => "セッションは既に完了済みです。",
            SessionExpired => "セッションが期限切れです。",
            SessionCanceled => "セッションがキャンセルされました。",
        },
        Locale::En => match reason {
            Unspecified => unknown_error_message(locale),
            NoSuchSession => "The session could not be found.",
            SessionNotCompleted => "The session has not been completed.",
            SessionAlreadyCompleted => "The session has already been completed.",
            SessionExpired => "The session has expired.",
            SessionCanceled => "The session was canceled.",
        },
    }
}

/// Localized sentence for a verification / consent reason
pub fn verify_error_message(reason: VerifyErrorReason, locale: Locale) -> &'static str {
    use VerifyErrorReason::*;

    match locale {
        Locale::Ja => match reason {
            Unspecified => unknown_error_message(locale),
            InvalidCertificate => "証明書の形式が不正です。",
            UnsupportedCertificate => "サポートされていない証明書です。",
            OcspRequestFailed => "OCSPによる問い合わせに失敗しました。",
            AssociatedCertificateNotExists => "紐付け情報がありません。",
            ConsentServiceCertificateRevoked => "証明書が失効しています。",
            ConsentServiceCertificateExpired => "証明書が有効期限切れです。",
            ConsentServiceCertificateOnHold => "証明書が一時保留状態です。",
            ConsentServiceVerificationFailed => "電子署名の検証に失敗しました。",
            ConsentServiceNotConsented => "同意がありません。",
            ConsentServiceConsentExpired => "同意が有効期限切れです。",
            ConsentServiceConsentRevoked => "同意が取り消されています。",
            ConsentServiceRequestFailed => "同意申請リクエストに失敗しました。",
            PersonalInfoNotConsented => "同意がありません。",
            PersonalInfoConsentExpired => "同意が有効期限切れです。",
            PersonalInfoConsentRevoked => "同意が取り消されています。",
            PersonalInfoLatestCertificateExpired => "証明書が有効期限切れです。",
            PersonalInfoLatestCertificateRevokedOrOnHold => "証明書が失効または一時保留状態です。",
            PersonalInfoLatestCertificateUnknown => "証明書の有効性が不明です。",
            PersonalInfoRequestFailed => "最新4情報取得リクエストに失敗しました。",
        },
        Locale::En => match reason {
            Unspecified => unknown_error_message(locale),
            InvalidCertificate => "The certificate is malformed.",
            UnsupportedCertificate => "The certificate is not supported.",
            OcspRequestFailed => "The OCSP status query failed.",
            AssociatedCertificateNotExists => "No associated certificate is registered.",
            ConsentServiceCertificateRevoked => "The certificate has been revoked.",
            ConsentServiceCertificateExpired => "The certificate has expired.",
            ConsentServiceCertificateOnHold => "The certificate is on hold.",
            ConsentServiceVerificationFailed => "The digital signature could not be verified.",
            ConsentServiceNotConsented => "Consent has not been given.",
            ConsentServiceConsentExpired => "The consent has expired.",
            ConsentServiceConsentRevoked => "The consent has been revoked.",
            ConsentServiceRequestFailed => "The consent request failed.",
            PersonalInfoNotConsented => "Consent has not been given.",
            PersonalInfoConsentExpired => "The consent has expired.",
            PersonalInfoConsentRevoked => "The consent has been revoked.",
            PersonalInfoLatestCertificateExpired => "The latest certificate has expired.",
            PersonalInfoLatestCertificateRevokedOrOnHold => {
                "The latest certificate is revoked or on hold."
            }
            PersonalInfoLatestCertificateUnknown => "The validity of the latest certificate is unknown.",
            PersonalInfoRequestFailed => "The request for the latest personal information failed.",
        },
    }
}
