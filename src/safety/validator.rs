//! Screening for generated replies before they reach a customer.
//!
//! [`ResponseValidator::validate`] runs a fixed battery of checks in priority
//! order and reports the first failure. [`sanitize`] is an independent,
//! idempotent redaction pass.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Replacement for a redacted phone number.
pub const PHONE_PLACEHOLDER: &str = "[เบอร์โทร - กรุณาติดต่อแอดมิน]";

/// Replacement for a redacted e-mail address.
pub const EMAIL_PLACEHOLDER: &str = "[อีเมล]";

static GUARANTEED_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(ได้เงิน|รับเงิน|จ่าย)\s*[0-9]{4,}").expect("valid pattern"));

static CREDENTIAL_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(username|password|ยูสเซอร์|รหัสผ่าน|user|pass)\s*[:=]\s*[A-Za-z0-9_]+")
        .expect("valid pattern")
});

/// ASCII word runs; a phone number must be a whole run.
static ASCII_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("valid pattern"));

static NUMBER_PREDICTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(แนะนำเลข|เลขเด็ด|ลองเลข|เลขนี้|เลข.*แม่น|ฟันธง|เลขดัง)").expect("valid pattern")
});

static PERCENT_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(จ่าย|ได้|โบนัส)\s*[0-9]+\s*%").expect("valid pattern"));

static HEDGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(โดยประมาณ|ราว|ประมาณ)").expect("valid pattern"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[A-Za-z0-9_.+-]+@[A-Za-z0-9_.-]+\.[a-z]{2,}").expect("valid pattern")
});

/// Why a candidate reply was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    GuaranteedAmount,
    CredentialDisclosure,
    UnverifiedPhone,
    NumberPrediction,
    UnhedgedPercentage,
    TooShort,
    TooLong,
}

impl RejectReason {
    /// Machine-readable code for logs.
    pub fn code(self) -> &'static str {
        match self {
            Self::GuaranteedAmount => "guaranteed_amount",
            Self::CredentialDisclosure => "credential_disclosure",
            Self::UnverifiedPhone => "unverified_phone",
            Self::NumberPrediction => "number_prediction",
            Self::UnhedgedPercentage => "unhedged_percentage",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of screening one candidate reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub reason: Option<RejectReason>,
    /// Do not auto-send; substitute a safe reply or hand to a human.
    pub escalate: bool,
}

impl ValidationVerdict {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
            escalate: false,
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason),
            escalate: true,
        }
    }
}

/// Reply screener with configurable length bounds.
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    /// Minimum characters after trimming.
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self {
            min_chars: 10,
            max_chars: 800,
        }
    }
}

impl ResponseValidator {
    /// Screen a candidate reply. The first failing check wins.
    pub fn validate(&self, reply: &str) -> ValidationVerdict {
        let checks: [(RejectReason, &dyn Fn(&str) -> bool); 7] = [
            (RejectReason::GuaranteedAmount, &|r: &str| GUARANTEED_AMOUNT.is_match(r)),
            (RejectReason::CredentialDisclosure, &|r: &str| CREDENTIAL_PAIR.is_match(r)),
            (RejectReason::UnverifiedPhone, &contains_phone_number),
            (RejectReason::NumberPrediction, &|r: &str| NUMBER_PREDICTION.is_match(r)),
            (RejectReason::UnhedgedPercentage, &|r: &str| {
                PERCENT_CLAIM.is_match(r) && !HEDGE.is_match(r)
            }),
            (RejectReason::TooShort, &|r: &str| r.trim().chars().count() < self.min_chars),
            (RejectReason::TooLong, &|r: &str| r.chars().count() > self.max_chars),
        ];

        checks
            .iter()
            .find(|(_, failed)| failed(reply))
            .map(|(reason, _)| ValidationVerdict::rejected(*reason))
            .unwrap_or_else(ValidationVerdict::valid)
    }
}

fn is_phone_number(word: &str) -> bool {
    word.len() == 10 && word.starts_with('0') && word.bytes().all(|b| b.is_ascii_digit())
}

/// True if the text holds a 10-digit domestic number (`0` + 9 digits) as a whole word.
pub fn contains_phone_number(text: &str) -> bool {
    ASCII_WORD.find_iter(text).any(|m| is_phone_number(m.as_str()))
}

/// Redact e-mail addresses, then phone numbers, then trim.
///
/// E-mails go first so a number glued to an address becomes a whole word
/// once the address is replaced. Neither placeholder can form a new match,
/// so `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    let without_emails = EMAIL.replace_all(text, EMAIL_PLACEHOLDER);
    ASCII_WORD
        .replace_all(&without_emails, |caps: &regex::Captures<'_>| {
            let word = &caps[0];
            if is_phone_number(word) {
                PHONE_PLACEHOLDER.to_string()
            } else {
                word.to_string()
            }
        })
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_of(reply: &str) -> Option<RejectReason> {
        ResponseValidator::default().validate(reply).reason
    }

    #[test]
    fn accepts_ordinary_reply() {
        let verdict = ResponseValidator::default()
            .validate("สวัสดีค่ะ วันนี้มีอะไรให้แอดมินช่วยเหลือไหมคะ 😊");
        assert!(verdict.is_valid);
        assert!(!verdict.escalate);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn rejects_phone_number_and_escalates() {
        let verdict = ResponseValidator::default()
            .validate("ติดต่อแอดมินได้ที่เบอร์ 0812345678 ตลอด 24 ชั่วโมงค่ะ");
        assert!(!verdict.is_valid);
        assert!(verdict.escalate);
        assert_eq!(verdict.reason, Some(RejectReason::UnverifiedPhone));
    }

    #[test]
    fn phone_adjacent_to_thai_text_is_still_a_phone() {
        assert!(contains_phone_number("โทร0812345678ค่ะ"));
        assert!(!contains_phone_number("เลขอ้างอิง 08123456789"));
        assert!(!contains_phone_number("code A0812345678"));
    }

    #[test]
    fn rejects_guaranteed_amount() {
        assert_eq!(
            reason_of("ฝากวันนี้ได้เงิน 5000 บาทแน่นอนค่ะ"),
            Some(RejectReason::GuaranteedAmount)
        );
        // three digits is not a "large" amount
        assert_eq!(reason_of("ถอนขั้นต่ำ จ่าย 100 บาทค่ะ ระบบอัตโนมัติ"), None);
    }

    #[test]
    fn rejects_credentials() {
        assert_eq!(
            reason_of("ยูสเซอร์ของคุณคือ username: abc123 นะคะ"),
            Some(RejectReason::CredentialDisclosure)
        );
        assert_eq!(
            reason_of("ลองเข้าระบบด้วย PASSWORD=hunter2 ได้เลยค่ะ"),
            Some(RejectReason::CredentialDisclosure)
        );
    }

    #[test]
    fn rejects_number_prediction() {
        assert_eq!(
            reason_of("งวดนี้แนะนำเลข 59 ค่ะ ลองดูนะคะ"),
            Some(RejectReason::NumberPrediction)
        );
        assert_eq!(
            reason_of("เลขชุดนี้แม่นมากค่ะ ห้ามพลาดเลยนะคะ"),
            Some(RejectReason::NumberPrediction)
        );
    }

    #[test]
    fn percentage_needs_hedge() {
        assert_eq!(
            reason_of("สมัครวันนี้รับโบนัส 50% ทันทีค่ะ"),
            Some(RejectReason::UnhedgedPercentage)
        );
        assert_eq!(reason_of("สมัครวันนี้รับโบนัส 50% โดยประมาณค่ะ"), None);
    }

    #[test]
    fn length_bounds() {
        assert_eq!(reason_of("   ค่ะ   "), Some(RejectReason::TooShort));
        assert_eq!(reason_of(""), Some(RejectReason::TooShort));
        assert_eq!(reason_of(&"ก".repeat(801)), Some(RejectReason::TooLong));
        assert_eq!(reason_of(&"ก".repeat(800)), None);
    }

    #[test]
    fn first_failing_check_wins() {
        // both guaranteed amount and phone present; amount is checked first
        assert_eq!(
            reason_of("รับเงิน 10000 บาท โทร 0812345678"),
            Some(RejectReason::GuaranteedAmount)
        );
    }

    #[test]
    fn sanitize_redacts_phone_and_email() {
        let cleaned = sanitize("  โทร 0812345678 หรืออีเมล admin@example.com ค่ะ ");
        assert_eq!(
            cleaned,
            format!("โทร {PHONE_PLACEHOLDER} หรืออีเมล {EMAIL_PLACEHOLDER} ค่ะ")
        );
    }

    #[test]
    fn sanitize_keeps_line_handle() {
        assert_eq!(sanitize("แอดไลน์ @mechoke ได้เลยค่ะ"), "แอดไลน์ @mechoke ได้เลยค่ะ");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "",
            "   ",
            "plain text",
            "โทร0812345678ค่ะ",
            "0812345678+a@b.com",
            "a.b-c@mail.co.th, 0999999999 and 08123456789",
            "[อีเมล] already redacted [เบอร์โทร - กรุณาติดต่อแอดมิน]",
            "x@y.zz@w.com 0000000000\n0123456789\t",
            "a@b.com0812345678",
            "0812345678a@b.com",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {sample:?}");
            assert!(!contains_phone_number(&once), "phone survived in {once:?}");
        }
    }

    #[test]
    fn phone_glued_to_email_is_redacted() {
        assert_eq!(
            sanitize("a@b.com0812345678"),
            format!("{EMAIL_PLACEHOLDER}{PHONE_PLACEHOLDER}")
        );
    }
}
