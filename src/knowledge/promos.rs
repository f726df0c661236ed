//! Promotion catalogue and the two text renderers built on it.

use crate::config::BrandConfig;

/// Promotion picked when a message talks about promotions but names none.
pub const DEFAULT_PROMO_ID: &str = "first-deposit-300-gift";

/// A promotion the bot can describe.
#[derive(Debug, Clone, Copy)]
pub struct Promo {
    pub id: &'static str,
    pub title: &'static str,
    pub active: bool,
    /// Phrases a customer might type that should surface this promotion.
    pub keywords: &'static [&'static str],
    /// Body lines; `{handle}` is replaced with the LINE OA handle.
    pub lines: &'static [&'static str],
    pub limit_note: Option<&'static str>,
}

pub static PROMOS: &[Promo] = &[
    Promo {
        id: "first-deposit-300-gift",
        title: "ฝากครั้งแรก 300 รับของแถมฟรี",
        active: true,
        keywords: &["โปร", "โปรวันนี้", "promotion", "ฝาก 300", "ของแถม", "โปรพิเศษ", "โปรฝากแรก"],
        lines: &[
            "🎁 โปรฝากแรกพิเศษ!",
            "• ฝาก 300 บาท เลือกรับของแถมฟรี 1 ชิ้น (ของแท้ ส่งฟรีถึงบ้าน)",
            "• สำหรับสมาชิกใหม่เท่านั้น",
            "สอบถามเพิ่มเติมที่ LINE OA 👉 {handle}",
        ],
        limit_note: Some("※ ของมีจำนวนจำกัด โปรดใช้สิทธิ์ภายในวันนี้ค่ะ"),
    },
    Promo {
        id: "checkin-7days",
        title: "เช็คอิน 7 วัน ฝากวันละ 300 รับของแถม",
        active: true,
        keywords: &["เช็คอิน", "เช็คอิน7วัน", "check in", "โปรเช็คอิน", "7 วัน", "โปรต่อเนื่อง"],
        lines: &[
            "📅 เช็คอินครบ 7 วัน รับของแถมฟรีทันที!",
            "• เงื่อนไข: ฝากวันละ 300 บาท ต่อเนื่องครบ 7 วัน",
            "• ของแท้ ส่งฟรีถึงบ้าน",
            "ติดต่อแอดมินได้ที่ {handle}",
        ],
        limit_note: Some("※ สิทธิ์มีจำนวนจำกัด/ตรวจสอบสถานะทุกวัน"),
    },
    Promo {
        id: "vip-monthly",
        title: "สะสมยอดเป็น VIP ประจำเดือน",
        active: true,
        keywords: &["vip", "สะสม", "โกลด์", "ซิลเวอร์", "สิทธิ์พิเศษ"],
        lines: &[
            "🏆 สะสมยอดครบตามเกณฑ์ รับสิทธิ์ VIP รายเดือน",
            "• รับโบนัส/ของขวัญเพิ่ม และดูแลพิเศษโดยทีมงาน",
            "แอดไลน์เพื่อดูเกณฑ์ล่าสุดได้ที่ {handle}",
        ],
        limit_note: None,
    },
];

/// Summary of every active promotion.
pub fn promo_summary(brand: &BrandConfig) -> String {
    let list = PROMOS
        .iter()
        .filter(|p| p.active)
        .map(|p| format!("• {}", p.title))
        .collect::<Vec<_>>()
        .join("\n");
    let list = if list.is_empty() {
        "ยังไม่มีโปรที่เปิดอยู่ในขณะนี้".to_string()
    } else {
        list
    };

    [
        format!("🎉 โปรปัจจุบันของ {}", brand.brand_name),
        list,
        format!("สอบถามเพิ่มเติมได้ที่ {}", brand.line_handle),
    ]
    .join("\n")
}

/// First active promotion whose keywords appear in the text, else the default.
pub fn promo_from_text(text: &str) -> Option<&'static Promo> {
    let lowered = text.to_lowercase();
    PROMOS
        .iter()
        .filter(|p| p.active)
        .find(|p| p.keywords.iter().any(|k| lowered.contains(&k.to_lowercase())))
        .or_else(|| PROMOS.iter().find(|p| p.active && p.id == DEFAULT_PROMO_ID))
}

/// Detail reply for the promotion matching the text.
pub fn promo_reply_from_text(text: &str, brand: &BrandConfig) -> Option<String> {
    let promo = promo_from_text(text)?;
    let mut body: Vec<String> = promo
        .lines
        .iter()
        .map(|line| line.replace("{handle}", &brand.line_handle))
        .collect();
    if let Some(note) = promo.limit_note {
        body.push(note.to_string());
    }
    Some(body.join("\n"))
}
