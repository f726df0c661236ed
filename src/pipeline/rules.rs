//! Intent rules: ordered regex patterns, first match wins.
//!
//! Input is lower-cased and trimmed before matching. Order is the
//! precedence: operator hand-over phrases, then sensitive requests, then the
//! domain intents. Nothing here calls the LLM; `NoMatch` tells the caller to
//! fall back to it.

use regex::Regex;
use tracing::debug;

/// What a domain rule routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainIntent {
    /// Promotion as a rich card.
    PromoImage,
    /// Every active promotion, as text.
    PromoSummary,
    /// The promotion picked by keyword (or the default one).
    PromoDetail,
    CreditIssue,
    Registration,
    WithdrawMinimum,
    NewsDigest,
    DreamNumbers,
    Schedule,
}

impl DomainIntent {
    pub fn label(self) -> &'static str {
        match self {
            Self::PromoImage => "promo_image",
            Self::PromoSummary => "promo_summary",
            Self::PromoDetail => "promo_detail",
            Self::CreditIssue => "credit_issue",
            Self::Registration => "registration",
            Self::WithdrawMinimum => "withdraw_minimum",
            Self::NewsDigest => "news_digest",
            Self::DreamNumbers => "dream_numbers",
            Self::Schedule => "schedule",
        }
    }
}

/// What happens when a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// A human operator has the conversation; stay silent.
    Suppress,
    /// Sensitive request; answer with the fixed deflection script.
    Deflect,
    /// The promotion rule; refined into summary or detail.
    Promotion,
    Domain(DomainIntent),
}

/// A single routing rule with a compiled regex.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub name: String,
    pub regex: Regex,
    pub action: RuleAction,
}

/// Classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentMatch {
    NoMatch,
    Suppress { rule: String },
    Deflect { rule: String },
    Domain { rule: String, intent: DomainIntent },
}

impl IntentMatch {
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::NoMatch => None,
            Self::Suppress { rule } | Self::Deflect { rule } | Self::Domain { rule, .. } => {
                Some(rule)
            }
        }
    }
}

/// Ordered intent matcher.
pub struct IntentMatcher {
    rules: Vec<IntentRule>,
    /// Inside a promotion match: asks for the whole list rather than one promo.
    promo_summary: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in intent pattern must compile")
}

impl IntentMatcher {
    /// The production rule set.
    pub fn default_rules() -> Self {
        let rule = |name: &str, pattern: &str, action: RuleAction| IntentRule {
            name: name.to_string(),
            regex: compile(pattern),
            action,
        };

        let rules = vec![
            rule(
                "admin_suppression",
                r"(#admin|\[admin\]|แอดมินรับเรื่อง|แอดมินกำลังตรวจสอบ|แอดมินดูแลต่อ|admin handover)",
                RuleAction::Suppress,
            ),
            rule(
                "sensitive_request",
                r"(password|รหัสผ่าน|otp|(^|[^a-z0-9])pin([^a-z0-9]|$)|ขอยูส|ขอเบอร์|เบอร์ส่วนตัว|เบอร์แอดมิน|phone number)",
                RuleAction::Deflect,
            ),
            rule(
                "promo_image",
                r"(รูปโปร|โปรภาพ|promotion image|โปรโมชั่นแบบรูป)",
                RuleAction::Domain(DomainIntent::PromoImage),
            ),
            rule(
                "promotion",
                r"(โปร|promotion|ฝาก 300|ของแถม|เช็คอิน|vip)",
                RuleAction::Promotion,
            ),
            rule(
                "credit_issue",
                r"(เครดิต|เงิน|ยอด).*(ไม่เข้า|ไม่มา|หาย)",
                RuleAction::Domain(DomainIntent::CreditIssue),
            ),
            rule(
                "registration",
                r"(สมัคร|regis|register)",
                RuleAction::Domain(DomainIntent::Registration),
            ),
            rule(
                "withdraw_minimum",
                r"(ถอน|withdraw).*(เท่าไหร่|min|ขั้นต่ำ)",
                RuleAction::Domain(DomainIntent::WithdrawMinimum),
            ),
            rule(
                "news_digest",
                r"(ข่าวหวย|ข่าวเลขเด็ด|ข่าวล่าสุด|lucky news|news)",
                RuleAction::Domain(DomainIntent::NewsDigest),
            ),
            rule(
                "dream_numbers",
                r"(ฝัน|ทำนายฝัน|dream)",
                RuleAction::Domain(DomainIntent::DreamNumbers),
            ),
            rule(
                "schedule",
                r"(หวย|ลาว|ฮานอย|หุ้น|เวลา|ออกผล|ปิดรับ|ตาราง|ยี่กี|lotto)",
                RuleAction::Domain(DomainIntent::Schedule),
            ),
        ];

        Self {
            rules,
            promo_summary: compile(r"(โปรวันนี้|promotion|โปร พิเศษ|โปร ทั้งหมด|มีโปรอะไรบ้าง)"),
        }
    }

    /// A matcher with no rules (for testing).
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            promo_summary: compile(r"(โปรวันนี้|promotion|โปร พิเศษ|โปร ทั้งหมด|มีโปรอะไรบ้าง)"),
        }
    }

    /// Append a rule at the lowest precedence.
    pub fn add_rule(
        &mut self,
        name: &str,
        pattern: &str,
        action: RuleAction,
    ) -> Result<(), regex::Error> {
        self.rules.push(IntentRule {
            name: name.to_string(),
            regex: Regex::new(pattern)?,
            action,
        });
        Ok(())
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify one message.
    pub fn classify(&self, text: &str) -> IntentMatch {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return IntentMatch::NoMatch;
        }

        let Some(rule) = self.rules.iter().find(|r| r.regex.is_match(&normalized)) else {
            return IntentMatch::NoMatch;
        };
        debug!(rule = %rule.name, "Intent rule matched");

        let name = rule.name.clone();
        match rule.action {
            RuleAction::Suppress => IntentMatch::Suppress { rule: name },
            RuleAction::Deflect => IntentMatch::Deflect { rule: name },
            RuleAction::Promotion => {
                let intent = if self.promo_summary.is_match(&normalized) {
                    DomainIntent::PromoSummary
                } else {
                    DomainIntent::PromoDetail
                };
                IntentMatch::Domain { rule: name, intent }
            }
            RuleAction::Domain(intent) => IntentMatch::Domain { rule: name, intent },
        }
    }
}
