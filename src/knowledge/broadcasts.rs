//! Canned broadcast templates for admin push.

use crate::config::BrandConfig;

/// Which brand link a template line or button points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Signup,
    Issue,
    Results,
}

impl Link {
    fn resolve(self, brand: &BrandConfig) -> &str {
        match self {
            Self::Signup => &brand.signup_url,
            Self::Issue => &brand.issue_url,
            Self::Results => &brand.results_url,
        }
    }
}

/// One template line; `{signup}`, `{issue}` and `{results}` are replaced with
/// brand links when rendered.
#[derive(Debug)]
pub struct BroadcastTemplate {
    pub key: &'static str,
    pub title: &'static str,
    lines: &'static [&'static str],
    cta: Option<(&'static str, Link)>,
}

pub static TEMPLATES: &[BroadcastTemplate] = &[
    BroadcastTemplate {
        key: "bc_checkin_7d",
        title: "โปรเช็คอิน 7 วัน 🎯",
        lines: &[
            "เช็คอินครบ 7 วัน ฝากวันละ 300 บาท",
            "รับของแถมฟรี 1 ชิ้น เลือกได้เลยค่ะ 🎁",
            "เริ่มเลย: {signup}",
        ],
        cta: Some(("กดรับโปร", Link::Signup)),
    },
    BroadcastTemplate {
        key: "bc_welcome_new",
        title: "ยินดีต้อนรับสมาชิกใหม่ ✨",
        lines: &[
            "ฝากครั้งแรกวันนี้ มีของแถมให้ทันทีค่ะ",
            "เริ่มใช้งานที่: {signup}",
            "แจ้งปัญหา: {issue} • กลุ่มผลรางวัล: {results}",
        ],
        cta: Some(("เริ่มใช้งาน", Link::Signup)),
    },
    BroadcastTemplate {
        key: "bc_credit_help",
        title: "เครดิตไม่เข้า แก้ยังไงดีคะ? 🛠️",
        lines: &[
            "แจ้งแอดมินด้วยข้อมูล 3 อย่างนี้นะคะ:",
            "1) ยูสเซอร์/เบอร์สมัคร  2) เวลา/ยอดฝาก  3) ธนาคาร/สลิปย่อ",
            "ลิงก์แจ้งปัญหา: {issue}",
        ],
        cta: Some(("แจ้งปัญหา (LINE)", Link::Issue)),
    },
];

pub fn find_template(key: &str) -> Option<&'static BroadcastTemplate> {
    let key = key.trim();
    TEMPLATES.iter().find(|t| t.key == key)
}

fn fill(line: &str, brand: &BrandConfig) -> String {
    line.replace("{signup}", Link::Signup.resolve(brand))
        .replace("{issue}", Link::Issue.resolve(brand))
        .replace("{results}", Link::Results.resolve(brand))
}

/// Title, lines, then the call to action after a blank line.
pub fn render_broadcast(template: &BroadcastTemplate, brand: &BrandConfig) -> String {
    let body = std::iter::once(template.title.to_string())
        .chain(template.lines.iter().map(|line| fill(line, brand)))
        .collect::<Vec<_>>()
        .join("\n");

    match template.cta {
        Some((label, link)) => format!("{body}\n\n{label}: {}", link.resolve(brand)),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        for (i, a) in TEMPLATES.iter().enumerate() {
            for b in &TEMPLATES[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn find_by_key() {
        assert!(find_template("bc_checkin_7d").is_some());
        assert!(find_template(" bc_credit_help ").is_some());
        assert!(find_template("bc_unknown").is_none());
    }

    #[test]
    fn render_fills_brand_links() {
        let brand = BrandConfig {
            signup_url: "https://signup.test/".into(),
            issue_url: "https://issue.test/".into(),
            results_url: "https://results.test/".into(),
            ..BrandConfig::default()
        };
        let text = render_broadcast(find_template("bc_welcome_new").unwrap(), &brand);

        assert!(text.starts_with("ยินดีต้อนรับสมาชิกใหม่ ✨\n"));
        assert!(text.contains("เริ่มใช้งานที่: https://signup.test/"));
        assert!(text.contains("แจ้งปัญหา: https://issue.test/ • กลุ่มผลรางวัล: https://results.test/"));
        assert!(text.ends_with("\n\nเริ่มใช้งาน: https://signup.test/"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn credit_help_cta_points_at_issue_link() {
        let brand = BrandConfig::default();
        let text = render_broadcast(find_template("bc_credit_help").unwrap(), &brand);
        assert!(text.ends_with(&format!("แจ้งปัญหา (LINE): {}", brand.issue_url)));
    }
}
