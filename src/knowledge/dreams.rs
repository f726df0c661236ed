//! Dream interpretation: free text to "lucky" number tokens.
//!
//! Two sources are merged. Digit runs typed by the user come first (Thai
//! numerals are normalised to ASCII beforehand), followed by tokens from the
//! keyword table. The keyword match is a plain case-sensitive substring test;
//! Thai script has no case.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Display cap for the token list.
pub const MAX_TOKENS: usize = 10;

/// A keyword and the numbers traditionally read from it.
#[derive(Debug, Clone, Copy)]
pub struct DreamRule {
    pub keywords: &'static [&'static str],
    pub tokens: &'static [&'static str],
    pub note: Option<&'static str>,
}

pub static DREAM_RULES: &[DreamRule] = &[
    DreamRule {
        keywords: &["งู", "พญานาค", "นาค"],
        tokens: &["5", "6", "56"],
        note: Some("ฝันเห็นงูหรือพญานาค ตำราว่าเป็นเลข 5 และ 6"),
    },
    DreamRule {
        keywords: &["ช้าง"],
        tokens: &["9", "19", "91"],
        note: Some("ช้างเป็นสัตว์มงคล ตำราว่าเป็นเลข 9"),
    },
    DreamRule {
        keywords: &["ปลา"],
        tokens: &["8", "18", "81"],
        note: Some("ฝันเห็นปลา มักตีเป็นเลข 8"),
    },
    DreamRule {
        keywords: &["น้ำท่วม", "แม่น้ำ", "ทะเล"],
        tokens: &["2", "22", "27"],
        note: Some("ฝันเกี่ยวกับน้ำ ตำราว่าเป็นเลข 2 และ 7"),
    },
    DreamRule {
        keywords: &["ไฟไหม้", "ไฟ"],
        tokens: &["7", "17", "71"],
        note: None,
    },
    DreamRule {
        keywords: &["ทอง", "สร้อย", "แหวน"],
        tokens: &["4", "44", "48"],
        note: Some("ฝันเห็นทองหรือเครื่องประดับ ตำราว่าเป็นเลข 4"),
    },
    DreamRule {
        keywords: &["พระ", "วัด"],
        tokens: &["8", "89", "98"],
        note: Some("ฝันเห็นพระหรือวัด ตำราว่าเป็นเลข 8 และ 9"),
    },
    DreamRule {
        keywords: &["เด็ก", "ทารก"],
        tokens: &["1", "13", "31"],
        note: None,
    },
    DreamRule {
        keywords: &["คนตาย", "ศพ", "ผี"],
        tokens: &["0", "40", "04"],
        note: Some("ฝันเห็นคนตายหรือผี ตำราว่าเป็นเลข 0 และ 4"),
    },
    DreamRule {
        keywords: &["รถ"],
        tokens: &["3", "37", "73"],
        note: None,
    },
    DreamRule {
        keywords: &["บ้าน"],
        tokens: &["6", "16", "61"],
        note: None,
    },
];

/// Extraction result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LuckyTokens {
    /// Deduplicated, insertion-ordered, capped at [`MAX_TOKENS`].
    pub tokens: Vec<String>,
    /// Annotation from the first matching rule.
    pub note: Option<String>,
}

impl LuckyTokens {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid digit pattern"));

/// Map Thai numerals `๐..๙` to ASCII digits, leaving everything else alone.
pub fn normalize_thai_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '๐'..='๙' => char::from(b'0' + (c as u32 - '๐' as u32) as u8),
            other => other,
        })
        .collect()
}

/// Extract lucky tokens from dream text.
pub fn extract_tokens(text: &str) -> LuckyTokens {
    let normalized = normalize_thai_digits(text);

    let mut ordered: Vec<String> = DIGIT_RUN
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect();

    let mut note = None;
    for rule in DREAM_RULES {
        if rule.keywords.iter().any(|k| text.contains(k)) {
            if note.is_none() {
                note = rule.note.map(str::to_string);
            }
            ordered.extend(rule.tokens.iter().map(|t| t.to_string()));
        }
    }

    let mut seen = HashSet::new();
    let tokens = ordered
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_TOKENS)
        .collect();

    LuckyTokens { tokens, note }
}

/// Text reply for the extracted tokens.
pub fn render_reply(lucky: &LuckyTokens, line_handle: &str) -> String {
    if lucky.is_empty() {
        return [
            "🔮 เล่าความฝันให้ละเอียดขึ้นอีกนิดได้ไหมคะ",
            "เช่น ฝันเห็นงู ช้าง ปลา น้ำ ไฟ ทอง หรือพระ",
            "แอดมินจะช่วยตีความให้ค่ะ",
        ]
        .join("\n");
    }

    let mut lines = vec![
        "🔮 ตีความฝันตามตำรา".to_string(),
        format!("เลขที่เกี่ยวข้อง: {}", lucky.tokens.join(" • ")),
    ];
    if let Some(note) = &lucky.note {
        lines.push(format!("({note})"));
    }
    lines.push("※ เป็นความเชื่อส่วนบุคคล โปรดใช้วิจารณญาณนะคะ".to_string());
    lines.push(format!("สอบถามเพิ่มเติมที่ {line_handle}"));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_thai_numerals() {
        assert_eq!(normalize_thai_digits("เลข ๑๒๓ กับ 45"), "เลข 123 กับ 45");
    }

    #[test]
    fn keyword_tokens_from_single_rule() {
        let lucky = extract_tokens("เมื่อคืนฝันเห็นช้าง");
        assert_eq!(lucky.tokens, vec!["9", "19", "91"]);
        assert!(lucky.note.unwrap().contains("ช้าง"));
    }

    #[test]
    fn inline_numbers_come_first() {
        let lucky = extract_tokens("ฝันเห็นงู ๒ ตัว บ้านเลขที่ 39");
        // digits first (Thai 2 normalised), then snake, then house
        assert_eq!(&lucky.tokens[..2], &["2", "39"]);
        assert_eq!(&lucky.tokens[2..5], &["5", "6", "56"]);
        assert!(lucky.tokens.contains(&"16".to_string()));
    }

    #[test]
    fn multiple_rules_union_and_keep_first_note() {
        // rule order: ช้าง before ปลา; first note wins
        let lucky = extract_tokens("ฝันว่าขี่ช้างไปจับปลา");
        assert_eq!(lucky.tokens, vec!["9", "19", "91", "8", "18", "81"]);
        assert!(lucky.note.unwrap().contains("ช้าง"));
    }

    #[test]
    fn note_taken_from_first_rule_with_note() {
        // ไฟ has no note, so the note comes from ทอง
        let lucky = extract_tokens("ฝันเห็นไฟกับทอง");
        assert!(lucky.note.unwrap().contains("ทอง"));
    }

    #[test]
    fn duplicates_removed_preserving_order() {
        // "8" typed and also produced by ปลา
        let lucky = extract_tokens("ฝันเห็นปลา 8 ตัว");
        assert_eq!(lucky.tokens, vec!["8", "18", "81"]);
    }

    #[test]
    fn result_capped() {
        let lucky = extract_tokens("1 2 3 4 5 6 7 8 9 10 11 12 ฝันเห็นช้าง");
        assert_eq!(lucky.tokens.len(), MAX_TOKENS);
        assert_eq!(lucky.tokens[0], "1");
    }

    #[test]
    fn nothing_fabricated_for_unknown_text() {
        let lucky = extract_tokens("ฝันแปลกๆ จำไม่ได้");
        assert!(lucky.is_empty());
        assert!(lucky.note.is_none());
    }

    #[test]
    fn render_empty_asks_for_detail() {
        let reply = render_reply(&LuckyTokens::default(), "@oa");
        assert!(reply.contains("เล่าความฝัน"));
    }

    #[test]
    fn render_lists_tokens_and_note() {
        let lucky = extract_tokens("ฝันเห็นช้าง");
        let reply = render_reply(&lucky, "@oa");
        assert!(reply.contains("9 • 19 • 91"));
        assert!(reply.contains("@oa"));
    }
}
