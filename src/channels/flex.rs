//! LINE Flex card builders.
//!
//! Each builder returns an [`OutboundMessage::RichCard`]; the LINE client
//! wraps it as `{"type": "flex", "altText", "contents"}` on the wire.

use chrono::{DateTime, FixedOffset};
use serde_json::{Value, json};

use crate::config::BrandConfig;
use crate::feed::LuckyItem;
use crate::pipeline::OutboundMessage;

/// A news carousel holds at most this many bubbles.
pub const MAX_NEWS_BUBBLES: usize = 5;

/// Headline length inside a news bubble, ellipsis included.
const NEWS_TITLE_CHARS: usize = 70;

/// Bangkok is UTC+7 year-round.
const BANGKOK_OFFSET_SECS: i32 = 7 * 3600;

fn card(alt_text: impl Into<String>, content: Value) -> OutboundMessage {
    OutboundMessage::RichCard {
        alt_text: alt_text.into(),
        content,
    }
}

/// Promotion bubble with hero image and a signup button.
pub fn promo_card(brand: &BrandConfig) -> OutboundMessage {
    card(
        "โปรโมชันล่าสุด",
        json!({
            "type": "bubble",
            "hero": {
                "type": "image",
                "url": brand.promo_image_url,
                "size": "full",
                "aspectMode": "cover",
                "aspectRatio": "20:13"
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "spacing": "sm",
                "contents": [
                    { "type": "text", "text": "โปรเช็คอิน 7 วัน", "weight": "bold", "size": "lg" },
                    {
                        "type": "text",
                        "text": "ฝาก 300 ต่อเนื่อง 7 วัน เลือกรับของแถมฟรี 1 ชิ้น",
                        "size": "sm",
                        "wrap": true,
                        "color": "#666666"
                    }
                ]
            },
            "footer": {
                "type": "box",
                "layout": "vertical",
                "contents": [{
                    "type": "button",
                    "style": "primary",
                    "action": { "type": "uri", "label": "สมัคร / ดูโปร", "uri": brand.signup_url }
                }]
            }
        }),
    )
}

/// Checklist of what to send when a deposit has not been credited.
pub fn credit_help_card() -> OutboundMessage {
    let line = |text: &str| json!({ "type": "text", "text": text, "size": "sm" });
    card(
        "แจ้งเครดิตไม่เข้า",
        json!({
            "type": "bubble",
            "body": {
                "type": "box",
                "layout": "vertical",
                "spacing": "md",
                "contents": [
                    { "type": "text", "text": "แจ้งเครดิตไม่เข้า", "weight": "bold", "size": "lg" },
                    { "type": "text", "text": "กรุณาระบุ:", "size": "sm", "color": "#777777" },
                    line("• ยูสเซอร์/เบอร์ที่สมัคร"),
                    line("• เวลา/ยอดฝาก"),
                    line("• ธนาคาร/สลิปย่อ")
                ]
            }
        }),
    )
}

/// Carousel of news bubbles. `None` when there is nothing to show.
pub fn news_carousel(items: &[LuckyItem], brand: &BrandConfig) -> Option<OutboundMessage> {
    if items.is_empty() {
        return None;
    }

    let bubbles: Vec<Value> = items
        .iter()
        .take(MAX_NEWS_BUBBLES)
        .map(|item| news_bubble(item, brand))
        .collect();

    Some(card(
        format!("ข่าวเลขเด็ด • {}", brand.brand_name),
        json!({ "type": "carousel", "contents": bubbles }),
    ))
}

fn news_bubble(item: &LuckyItem, brand: &BrandConfig) -> Value {
    let subtitle = [
        item.source.clone(),
        Some(
            item.published_at
                .as_deref()
                .and_then(format_published)
                .unwrap_or_else(|| "ล่าสุด".to_string()),
        ),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" • ");

    let hero = item
        .image_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or(&brand.news_fallback_image);

    json!({
        "type": "bubble",
        "hero": { "type": "image", "url": hero, "size": "full", "aspectMode": "cover", "aspectRatio": "20:13" },
        "body": {
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": [
                { "type": "text", "text": truncate(&item.title, NEWS_TITLE_CHARS), "wrap": true, "weight": "bold", "size": "md" },
                { "type": "text", "text": subtitle, "wrap": true, "size": "xs", "color": "#888888" }
            ]
        },
        "footer": {
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": [{
                "type": "button",
                "style": "primary",
                "action": { "type": "uri", "label": "อ่านข่าว", "uri": item.url }
            }]
        }
    })
}

/// Trim and cut to `max` characters, ending in `…` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// `dd/mm HH:MM` in Bangkok time, from RFC 2822 or RFC 3339.
fn format_published(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc2822(raw.trim())
        .or_else(|_| DateTime::parse_from_rfc3339(raw.trim()))
        .ok()?;
    let bangkok = FixedOffset::east_opt(BANGKOK_OFFSET_SECS)?;
    Some(parsed.with_timezone(&bangkok).format("%d/%m %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str) -> LuckyItem {
        LuckyItem {
            title: title.into(),
            url: url.into(),
            image_url: None,
            source: Some("Thairath".into()),
            published_at: Some("2025-10-16T09:00:00Z".into()),
        }
    }

    fn content(message: &OutboundMessage) -> &Value {
        match message {
            OutboundMessage::RichCard { content, .. } => content,
            other => panic!("expected card, got {other:?}"),
        }
    }

    #[test]
    fn promo_card_uses_brand_urls() {
        let brand = BrandConfig::default();
        let message = promo_card(&brand);
        let c = content(&message);
        assert_eq!(c["hero"]["url"], brand.promo_image_url.as_str());
        assert_eq!(c["footer"]["contents"][0]["action"]["uri"], brand.signup_url.as_str());
    }

    #[test]
    fn credit_help_lists_three_fields() {
        let message = credit_help_card();
        let lines = content(&message)["body"]["contents"].as_array().unwrap().len();
        assert_eq!(lines, 5);
    }

    #[test]
    fn news_carousel_caps_bubbles_and_falls_back_image() {
        let brand = BrandConfig::default();
        let items: Vec<_> = (0..7).map(|i| item("หวย", &format!("https://n/{i}"))).collect();
        let message = news_carousel(&items, &brand).unwrap();
        let c = content(&message);

        assert_eq!(c["type"], "carousel");
        let bubbles = c["contents"].as_array().unwrap();
        assert_eq!(bubbles.len(), MAX_NEWS_BUBBLES);
        assert_eq!(bubbles[0]["hero"]["url"], brand.news_fallback_image.as_str());
        // 09:00Z is 16:00 in Bangkok
        assert_eq!(bubbles[0]["body"]["contents"][1]["text"], "Thairath • 16/10 16:00");
    }

    #[test]
    fn news_carousel_empty_is_none() {
        assert!(news_carousel(&[], &BrandConfig::default()).is_none());
    }

    #[test]
    fn unparseable_date_reads_latest() {
        let mut it = item("หวย", "https://n/1");
        it.source = None;
        it.published_at = Some("yesterday".into());
        let bubble = news_bubble(&it, &BrandConfig::default());
        assert_eq!(bubble["body"]["contents"][1]["text"], "ล่าสุด");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("  สั้น  ", 70), "สั้น");
        let long = "ก".repeat(80);
        let cut = truncate(&long, 70);
        assert_eq!(cut.chars().count(), 70);
        assert!(cut.ends_with('…'));
    }
}
