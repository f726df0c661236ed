//! Message processor: the per-event decision pipeline.
//!
//! Flow, first applicable exit wins:
//! 1. Intake: non-text or empty payload ends silently
//! 2. Operator phrases end silently
//! 3. Sensitive requests get the fixed deflection script
//! 4. Rate limit gate
//! 5. Intent routing (templates, schedule, dreams, news)
//! 6. Generative fallback, validated and sanitized
//!
//! Each event is answered with at most one `reply` call, made at the end.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::channels::flex;
use crate::config::{BrandConfig, PipelineConfig, ThrottlePolicy};
use crate::error::{LlmError, PipelineError};
use crate::feed::NewsFeed;
use crate::knowledge::{dreams, promos, schedule};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::rules::{DomainIntent, IntentMatch, IntentMatcher};
use crate::pipeline::types::{
    Decision, EventKind, EventReport, InboundEvent, MessageSender, OutboundMessage, Stage,
};
use crate::safety::{RateLimiter, ResponseValidator, sanitize};
use crate::store::UserTracker;

/// Sent when the fallback fails, times out, or a stage blows up.
pub const APOLOGY: &str = "ขออภัยค่ะ ระบบขัดข้องชั่วคราว ลองพิมพ์อีกครั้งได้เลยนะคะ 🙏";

pub const THROTTLE_NOTICE: &str =
    "ส่งข้อความถี่เกินไปนิดนึงค่ะ 🙏 รอสักครู่แล้วพิมพ์ใหม่ได้เลยนะคะ";

pub const WITHDRAW_MINIMUM_TEXT: &str = "ถอนได้ขั้นต่ำ 100 บาทค่ะ ระบบอัตโนมัติ 24 ชม. ⏱️";

/// LINE accepts at most five messages per reply.
const MAX_SCHEDULE_MESSAGES: usize = 5;

const FALLBACK_TEMPERATURE: f32 = 0.35;

const FALLBACK_MAX_TOKENS: u32 = 600;

/// Runs inbound events through the pipeline and sends the reply.
pub struct MessageProcessor {
    matcher: IntentMatcher,
    validator: ResponseValidator,
    rate_limiter: RateLimiter,
    llm: Arc<dyn LlmProvider>,
    feed: Arc<dyn NewsFeed>,
    sender: Arc<dyn MessageSender>,
    users: Arc<dyn UserTracker>,
    brand: BrandConfig,
    config: PipelineConfig,
}

impl MessageProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rate_limiter: RateLimiter,
        llm: Arc<dyn LlmProvider>,
        feed: Arc<dyn NewsFeed>,
        sender: Arc<dyn MessageSender>,
        users: Arc<dyn UserTracker>,
        brand: BrandConfig,
        config: PipelineConfig,
    ) -> Self {
        Self {
            matcher: IntentMatcher::default_rules(),
            validator: ResponseValidator::default(),
            rate_limiter,
            llm,
            feed,
            sender,
            users,
            brand,
            config,
        }
    }

    pub fn with_matcher(mut self, matcher: IntentMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_validator(mut self, validator: ResponseValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Process one event end to end. Never fails: errors become the apology
    /// or a logged delivery failure.
    pub async fn handle_event(&self, event: InboundEvent) -> EventReport {
        let InboundEvent {
            source_id,
            kind,
            text,
            reply_handle,
        } = event;

        if kind == EventKind::Message && !source_id.is_empty() {
            let users = Arc::clone(&self.users);
            let id = source_id.clone();
            tokio::spawn(async move {
                users.track(&id, Utc::now()).await;
            });
        }

        let decision = match AssertUnwindSafe(self.decide(&source_id, kind, text.as_deref()))
            .catch_unwind()
            .await
        {
            Ok(decision) => decision,
            Err(payload) => {
                let err = PipelineError::Panicked(panic_message(payload.as_ref()));
                error!(source = %source_id, error = %err, "Recovered from pipeline panic");
                Decision::reply(Stage::Recovered, vec![OutboundMessage::text(APOLOGY)])
            }
        };

        let delivered = if decision.is_silent() {
            false
        } else {
            match self
                .sender
                .reply(reply_handle, decision.messages.clone())
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    let err = PipelineError::from(e);
                    warn!(source = %source_id, error = %err, "Reply not delivered");
                    false
                }
            }
        };

        debug!(
            source = %source_id,
            stage = ?decision.stage,
            messages = decision.messages.len(),
            delivered,
            "Event processed"
        );

        EventReport {
            source_id,
            decision,
            delivered,
        }
    }

    /// Process a webhook batch concurrently. One report per event, in order.
    pub async fn process_batch(&self, events: Vec<InboundEvent>) -> Vec<EventReport> {
        let count = events.len();
        debug!(count, "Processing event batch");
        join_all(events.into_iter().map(|event| self.handle_event(event))).await
    }

    async fn decide(&self, source_id: &str, kind: EventKind, text: Option<&str>) -> Decision {
        let text = match text.map(str::trim) {
            Some(t) if kind == EventKind::Message && !t.is_empty() => t,
            _ => return Decision::silent(Stage::Intake),
        };
        let text = truncate_chars(text, self.config.max_input_chars);

        let intent = self.matcher.classify(&text);
        match &intent {
            IntentMatch::Suppress { rule } => {
                info!(source = %source_id, rule = %rule, "Operator phrase, staying silent");
                return Decision::silent(Stage::AdminSuppression);
            }
            IntentMatch::Deflect { rule } => {
                info!(source = %source_id, rule = %rule, "Sensitive request deflected");
                return Decision::reply(
                    Stage::SensitiveDeflection,
                    vec![OutboundMessage::text(deflection_script(&self.brand))],
                );
            }
            IntentMatch::Domain { .. } | IntentMatch::NoMatch => {}
        }

        let gate = self.rate_limiter.check(source_id, self.config.rate_limit);
        if !gate.allowed {
            info!(
                source = %source_id,
                reset_at = %gate.reset_at,
                policy = ?self.config.throttle_policy,
                "Throttled"
            );
            return match self.config.throttle_policy {
                ThrottlePolicy::Silent => Decision::silent(Stage::RateLimitGate),
                ThrottlePolicy::Notice => Decision::reply(
                    Stage::RateLimitGate,
                    vec![OutboundMessage::text(THROTTLE_NOTICE)],
                ),
            };
        }

        if let IntentMatch::Domain { rule, intent } = intent {
            if let Some(messages) = self.render_intent(intent, &text).await {
                debug!(source = %source_id, rule = %rule, intent = intent.label(), "Intent routed");
                return Decision::reply(Stage::IntentRouting, messages);
            }
            debug!(
                source = %source_id,
                intent = intent.label(),
                "Intent produced nothing, falling back to generation"
            );
        }

        let body = self.generate(source_id, &text).await;
        Decision::reply(Stage::GenerativeFallback, vec![OutboundMessage::text(body)])
    }

    /// Messages for a domain intent. `None` degrades to generation.
    async fn render_intent(&self, intent: DomainIntent, text: &str) -> Option<Vec<OutboundMessage>> {
        let brand = &self.brand;
        match intent {
            DomainIntent::PromoImage => Some(vec![flex::promo_card(brand)]),
            DomainIntent::PromoSummary => {
                Some(vec![OutboundMessage::text(promos::promo_summary(brand))])
            }
            DomainIntent::PromoDetail => {
                promos::promo_reply_from_text(text, brand).map(|t| vec![OutboundMessage::text(t)])
            }
            DomainIntent::CreditIssue => Some(vec![
                flex::credit_help_card(),
                OutboundMessage::text(credit_issue_text()),
            ]),
            DomainIntent::Registration => {
                Some(vec![OutboundMessage::text(registration_text(brand))])
            }
            DomainIntent::WithdrawMinimum => {
                Some(vec![OutboundMessage::text(WITHDRAW_MINIMUM_TEXT)])
            }
            DomainIntent::NewsDigest => match self.feed.fetch(self.config.news_limit).await {
                Ok(items) => flex::news_carousel(&items, brand).map(|card| vec![card]),
                Err(e) => {
                    warn!(error = %e, "News feed unavailable");
                    None
                }
            },
            DomainIntent::DreamNumbers => {
                let lucky = dreams::extract_tokens(text);
                Some(vec![OutboundMessage::text(dreams::render_reply(
                    &lucky,
                    &brand.line_handle,
                ))])
            }
            DomainIntent::Schedule => {
                let entries = schedule::find_by_text(text);
                if entries.is_empty() {
                    return Some(vec![OutboundMessage::text(schedule::category_hint())]);
                }
                let chunks = schedule::render_chunks(&entries, schedule::MAX_CHUNK_CHARS);
                if chunks.len() > MAX_SCHEDULE_MESSAGES {
                    debug!(chunks = chunks.len(), "Schedule reply truncated");
                }
                Some(
                    chunks
                        .into_iter()
                        .take(MAX_SCHEDULE_MESSAGES)
                        .map(OutboundMessage::text)
                        .collect(),
                )
            }
        }
    }

    /// Generative fallback under the configured timeout. Always yields text.
    async fn generate(&self, source_id: &str, text: &str) -> String {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt(&self.brand)),
            ChatMessage::user(text),
        ])
        .with_temperature(FALLBACK_TEMPERATURE)
        .with_max_tokens(FALLBACK_MAX_TOKENS);

        let timeout = self.config.llm_timeout;
        let response = match tokio::time::timeout(timeout, self.llm.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(source = %source_id, error = %e, "Generative fallback failed");
                return APOLOGY.to_string();
            }
            Err(_) => {
                let err = LlmError::Timeout {
                    provider: self.llm.model_name().to_string(),
                    timeout,
                };
                warn!(source = %source_id, error = %err, "Generative fallback timed out");
                return APOLOGY.to_string();
            }
        };

        let verdict = self.validator.validate(&response.content);
        if !verdict.is_valid {
            info!(
                source = %source_id,
                reason = verdict.reason.map(|r| r.code()).unwrap_or("unknown"),
                escalate = verdict.escalate,
                "Generated reply rejected"
            );
            return APOLOGY.to_string();
        }

        sanitize(&response.content)
    }
}

/// System prompt for the generative fallback.
fn build_system_prompt(brand: &BrandConfig) -> String {
    format!(
        "คุณคือแอดมินของแบรนด์ {brand_name} (LINE OA {handle})
สไตล์การตอบ: สุภาพ มืออาชีพ กระชับ ใช้อิโมจิเล็กน้อย ใช้คำลงท้าย คะ/ค่ะ
ตอบเฉพาะเรื่อง: โปรโมชัน, วิธีสมัคร, ฝาก-ถอน, เครดิตไม่เข้า, เวลาออกผล/ปิดรับ, ช่องทางติดต่อ
กติกา:
- ถ้าลูกค้าพูดเรื่องเครดิตไม่เข้า: ขอ \"ยูสเซอร์/เบอร์ที่สมัคร\" + \"เวลา/ยอดฝาก\" + \"ธนาคาร/สลิปย่อ\"
- ถ้าเรื่องโปร: ให้ข้อมูลโปรฝาก 300 รับของแถม + เช็คอิน 7 วัน (ห้ามคุยเกินขอบเขต)
- ห้ามรับประกันยอดเงิน ห้ามแนะนำหรือทำนายเลข ห้ามขอหรือเปิดเผยรหัสผ่านหรือเบอร์โทร
- ปิดท้ายด้วยการชวนติดต่อ LINE OA {handle} เมื่อเหมาะสม
ภาษาไทยเท่านั้น",
        brand_name = brand.brand_name,
        handle = brand.line_handle,
    )
}

fn deflection_script(brand: &BrandConfig) -> String {
    [
        "เพื่อความปลอดภัยของบัญชี แอดมินไม่ขอและไม่ส่งรหัสผ่าน OTP หรือเบอร์ส่วนตัวทางแชทค่ะ 🔒".to_string(),
        format!("หากต้องการความช่วยเหลือ แจ้งแอดมินได้ที่ {} นะคะ", brand.issue_url),
    ]
    .join("\n")
}

fn credit_issue_text() -> String {
    [
        "ขออภัยในความไม่สะดวกนะคะ 🙏",
        "รบกวนแจ้ง 'ยูสเซอร์/เบอร์ที่สมัคร' + 'เวลา/ยอดฝาก' + 'ธนาคาร/สลิปย่อ'",
        "แอดมินจะตรวจสอบและอัปเดตให้โดยเร็วค่ะ 💬",
    ]
    .join("\n")
}

fn registration_text(brand: &BrandConfig) -> String {
    [
        "สมัครสมาชิกได้เลยค่ะ ✨".to_string(),
        format!("ลิงก์สมัคร: {}", brand.signup_url),
        "ฝากครั้งแรกวันนี้ รับของแถมฟรีทันทีค่ะ 🎁".to_string(),
    ]
    .join("\n")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::config::RateLimitPolicy;
    use crate::error::{ChannelError, FeedError};
    use crate::feed::LuckyItem;
    use crate::llm::CompletionResponse;
    use crate::pipeline::rules::RuleAction;
    use crate::pipeline::types::ReplyHandle;
    use crate::store::{InMemoryRateLimitStore, InMemoryUserRegistry};

    // ── Mocks ───────────────────────────────────────────────────────

    enum LlmBehavior {
        Reply(String),
        Slow(Duration),
        Fail,
        /// Panic when the user text contains the marker.
        PanicOn(&'static str),
    }

    struct MockLlm {
        behavior: LlmBehavior,
        calls: AtomicUsize,
    }

    impl MockLlm {
        fn new(behavior: LlmBehavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn replying(text: &str) -> Arc<Self> {
            Self::new(LlmBehavior::Reply(text.to_string()))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        fn model_name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                LlmBehavior::Reply(text) => Ok(CompletionResponse {
                    content: text.clone(),
                }),
                LlmBehavior::Slow(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(CompletionResponse {
                        content: "ตอบช้าไปหน่อยนะคะ ขอบคุณค่ะ".to_string(),
                    })
                }
                LlmBehavior::Fail => Err(LlmError::RequestFailed {
                    provider: "mock".to_string(),
                    reason: "boom".to_string(),
                }),
                LlmBehavior::PanicOn(marker) => {
                    if request.user_text().contains(marker) {
                        panic!("mock llm exploded");
                    }
                    Ok(CompletionResponse {
                        content: "ยินดีให้บริการค่ะ มีอะไรให้ช่วยไหมคะ".to_string(),
                    })
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        replies: Mutex<Vec<(String, Vec<OutboundMessage>)>>,
        fail: bool,
    }

    impl RecordingSender {
        fn replies(&self) -> Vec<(String, Vec<OutboundMessage>)> {
            self.replies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn reply(
            &self,
            handle: ReplyHandle,
            messages: Vec<OutboundMessage>,
        ) -> Result<(), ChannelError> {
            if self.fail {
                return Err(ChannelError::SendFailed {
                    name: "test".to_string(),
                    reason: "offline".to_string(),
                });
            }
            self.replies
                .lock()
                .unwrap()
                .push((handle.token().to_string(), messages));
            Ok(())
        }

        async fn push(&self, _to: &str, _messages: Vec<OutboundMessage>) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    struct MockFeed {
        items: Vec<LuckyItem>,
        fail: bool,
    }

    #[async_trait]
    impl NewsFeed for MockFeed {
        async fn fetch(&self, limit: usize) -> Result<Vec<LuckyItem>, FeedError> {
            if self.fail {
                return Err(FeedError::BadStatus {
                    url: "http://feed.test".to_string(),
                    status: 503,
                });
            }
            Ok(self.items.iter().take(limit).cloned().collect())
        }
    }

    fn empty_feed() -> MockFeed {
        MockFeed {
            items: Vec::new(),
            fail: false,
        }
    }

    struct Harness {
        processor: MessageProcessor,
        sender: Arc<RecordingSender>,
        users: Arc<InMemoryUserRegistry>,
    }

    fn harness_with(
        llm: Arc<MockLlm>,
        feed: MockFeed,
        sender: RecordingSender,
        config: PipelineConfig,
    ) -> Harness {
        let sender = Arc::new(sender);
        let users = Arc::new(InMemoryUserRegistry::new());
        let processor = MessageProcessor::new(
            RateLimiter::new(Arc::new(InMemoryRateLimitStore::new())),
            llm,
            Arc::new(feed),
            sender.clone(),
            users.clone(),
            BrandConfig::default(),
            config,
        );
        Harness {
            processor,
            sender,
            users,
        }
    }

    fn harness(llm: Arc<MockLlm>) -> Harness {
        harness_with(
            llm,
            empty_feed(),
            RecordingSender::default(),
            PipelineConfig::default(),
        )
    }

    fn only_text(report: &EventReport) -> &str {
        match report.decision.messages.as_slice() {
            [OutboundMessage::Text { body }] => body.as_str(),
            other => panic!("expected one text message, got {other:?}"),
        }
    }

    // ── Intake & suppression ────────────────────────────────────────

    #[tokio::test]
    async fn non_text_event_is_silent() {
        let llm = MockLlm::replying("ไม่ควรถูกเรียกค่ะ");
        let h = harness(llm.clone());
        let event = InboundEvent {
            source_id: "U1".into(),
            kind: EventKind::Other,
            text: None,
            reply_handle: ReplyHandle::new("r1"),
        };

        let report = h.processor.handle_event(event).await;
        assert_eq!(report.decision.stage, Stage::Intake);
        assert!(!report.delivered);
        assert!(h.sender.replies().is_empty());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn whitespace_text_is_silent() {
        let h = harness(MockLlm::replying("x"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "   \n", "r1"))
            .await;
        assert_eq!(report.decision.stage, Stage::Intake);
        assert!(h.sender.replies().is_empty());
    }

    #[tokio::test]
    async fn admin_phrase_sends_nothing() {
        let llm = MockLlm::replying("ไม่ควรถูกเรียกค่ะ");
        let h = harness(llm.clone());
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "แอดมินรับเรื่องแล้วค่ะ", "r1"))
            .await;

        assert_eq!(report.decision.stage, Stage::AdminSuppression);
        assert!(report.decision.is_silent());
        assert!(h.sender.replies().is_empty());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn sensitive_request_never_reaches_llm() {
        let llm = MockLlm::replying("รหัสผ่านของคุณคือ 1234 ค่ะ");
        let h = harness(llm.clone());
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ขอรหัสผ่านหน่อยครับ", "r1"))
            .await;

        assert_eq!(report.decision.stage, Stage::SensitiveDeflection);
        assert!(only_text(&report).contains("🔒"));
        assert_eq!(llm.calls(), 0);
        assert!(report.delivered);
    }

    // ── Intent routing ──────────────────────────────────────────────

    #[tokio::test]
    async fn promo_summary_without_llm() {
        let llm = MockLlm::replying("x");
        let h = harness(llm.clone());
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "โปรวันนี้มีอะไรบ้าง", "r1"))
            .await;

        assert_eq!(report.decision.stage, Stage::IntentRouting);
        assert!(only_text(&report).contains("โปรปัจจุบัน"));
        assert_eq!(llm.calls(), 0);

        let replies = h.sender.replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "r1");
    }

    #[tokio::test]
    async fn credit_issue_sends_card_then_text() {
        let h = harness(MockLlm::replying("x"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "เครดิตไม่เข้าค่ะ", "r1"))
            .await;

        let messages = &report.decision.messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].label(), "rich_card");
        assert_eq!(messages[1].label(), "text");
    }

    #[tokio::test]
    async fn registration_uses_brand_signup_url() {
        let h = harness(MockLlm::replying("x"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "สมัครยังไงคะ", "r1"))
            .await;
        assert!(only_text(&report).contains(&BrandConfig::default().signup_url));
    }

    #[tokio::test]
    async fn withdraw_minimum_fixed_text() {
        let h = harness(MockLlm::replying("x"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ถอนขั้นต่ำเท่าไหร่", "r1"))
            .await;
        assert_eq!(only_text(&report), WITHDRAW_MINIMUM_TEXT);
    }

    #[tokio::test]
    async fn dream_reply_lists_tokens() {
        let h = harness(MockLlm::replying("x"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ฝันเห็นช้างค่ะ", "r1"))
            .await;
        assert!(only_text(&report).contains("9 • 19 • 91"));
    }

    #[tokio::test]
    async fn schedule_group_lookup() {
        let h = harness(MockLlm::replying("x"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "หวยฮานอยออกกี่โมง", "r1"))
            .await;
        assert_eq!(report.decision.stage, Stage::IntentRouting);
        assert!(only_text(&report).contains("ฮานอย"));
    }

    #[tokio::test]
    async fn schedule_unknown_gets_category_hint() {
        let h = harness(MockLlm::replying("x"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ปิดรับกี่โมง", "r1"))
            .await;
        assert_eq!(only_text(&report), schedule::category_hint());
    }

    #[tokio::test]
    async fn full_schedule_fits_one_reply() {
        let h = harness(MockLlm::replying("x"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ดูเวลาทั้งหมด", "r1"))
            .await;
        let count = report.decision.messages.len();
        assert!((1..=MAX_SCHEDULE_MESSAGES).contains(&count));
    }

    #[tokio::test]
    async fn news_with_items_sends_carousel() {
        let item = LuckyItem {
            title: "เลขเด็ดงวดนี้".into(),
            url: "https://news.test/1".into(),
            image_url: None,
            source: None,
            published_at: None,
        };
        let llm = MockLlm::replying("x");
        let h = harness_with(
            llm.clone(),
            MockFeed {
                items: vec![item],
                fail: false,
            },
            RecordingSender::default(),
            PipelineConfig::default(),
        );
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ขอข่าวหวยล่าสุด", "r1"))
            .await;

        assert_eq!(report.decision.stage, Stage::IntentRouting);
        assert_eq!(report.decision.messages[0].label(), "rich_card");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn empty_news_falls_back_to_llm() {
        let llm = MockLlm::replying("ตอนนี้ยังไม่มีข่าวใหม่ค่ะ ลองใหม่ภายหลังนะคะ");
        let h = harness(llm.clone());
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ข่าวหวยวันนี้", "r1"))
            .await;

        assert_eq!(report.decision.stage, Stage::GenerativeFallback);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn failing_news_falls_back_to_llm() {
        let llm = MockLlm::replying("ตอนนี้ยังไม่มีข่าวใหม่ค่ะ ลองใหม่ภายหลังนะคะ");
        let h = harness_with(
            llm.clone(),
            MockFeed {
                items: Vec::new(),
                fail: true,
            },
            RecordingSender::default(),
            PipelineConfig::default(),
        );
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "lucky news", "r1"))
            .await;
        assert_eq!(report.decision.stage, Stage::GenerativeFallback);
        assert_eq!(llm.calls(), 1);
    }

    // ── Generative fallback ─────────────────────────────────────────

    #[tokio::test]
    async fn small_talk_calls_llm_once() {
        let llm = MockLlm::replying("สวัสดีค่ะ วันนี้อากาศดีมากเลยค่ะ มีอะไรให้ช่วยไหมคะ");
        let h = harness(llm.clone());
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "สวัสดีครับวันนี้อากาศเป็นไงบ้าง", "r1"))
            .await;

        assert_eq!(report.decision.stage, Stage::GenerativeFallback);
        assert_eq!(llm.calls(), 1);
        assert!(only_text(&report).starts_with("สวัสดีค่ะ"));
    }

    #[tokio::test]
    async fn llm_timeout_sends_apology() {
        let llm = MockLlm::new(LlmBehavior::Slow(Duration::from_secs(5)));
        let config = PipelineConfig {
            llm_timeout: Duration::from_millis(50),
            ..PipelineConfig::default()
        };
        let h = harness_with(llm, empty_feed(), RecordingSender::default(), config);

        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ช่วยเล่าเรื่องตลกหน่อย", "r1"))
            .await;
        assert_eq!(only_text(&report), APOLOGY);
        assert!(report.delivered);
    }

    #[tokio::test]
    async fn llm_error_sends_apology() {
        let h = harness(MockLlm::new(LlmBehavior::Fail));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ช่วยเล่าเรื่องตลกหน่อย", "r1"))
            .await;
        assert_eq!(report.decision.stage, Stage::GenerativeFallback);
        assert_eq!(only_text(&report), APOLOGY);
    }

    #[tokio::test]
    async fn rejected_generation_becomes_apology() {
        let h = harness(MockLlm::replying("แนะนำเลข 25 งวดนี้แม่นแน่นอนค่ะ"));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "คุยเล่นกันหน่อย", "r1"))
            .await;
        assert_eq!(report.decision.stage, Stage::GenerativeFallback);
        assert_eq!(only_text(&report), APOLOGY);
    }

    #[tokio::test]
    async fn stricter_validator_rejects_long_reply() {
        let llm = MockLlm::replying("สวัสดีค่ะ ยินดีให้บริการทุกวันตลอด 24 ชั่วโมงเลยนะคะ");
        let processor = harness(llm.clone())
            .processor
            .with_validator(ResponseValidator {
                min_chars: 5,
                max_chars: 20,
            });
        let report = processor
            .handle_event(InboundEvent::text("U1", "เปิดกี่โมง", "r1"))
            .await;
        assert_eq!(llm.calls(), 1);
        assert_eq!(only_text(&report), APOLOGY);
    }

    #[tokio::test]
    async fn custom_matcher_replaces_default_rules() {
        let llm = MockLlm::replying("ยินดีให้บริการค่ะ สอบถามได้เลยนะคะ");
        let mut matcher = IntentMatcher::empty();
        matcher
            .add_rule("vip desk", r"vip", RuleAction::Suppress)
            .unwrap();
        let processor = harness(llm.clone()).processor.with_matcher(matcher);

        let report = processor
            .handle_event(InboundEvent::text("U1", "VIP ช่วยด้วย", "r1"))
            .await;
        assert_eq!(report.decision.stage, Stage::AdminSuppression);
        assert!(report.decision.is_silent());

        // default promotion keywords no longer route
        let report = processor
            .handle_event(InboundEvent::text("U2", "โปรโมชั่นมีอะไรบ้าง", "r2"))
            .await;
        assert_eq!(report.decision.stage, Stage::GenerativeFallback);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn generated_email_is_redacted() {
        let h = harness(MockLlm::replying(
            "ส่งรายละเอียดมาที่ support@example.com ได้เลยค่ะ",
        ));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "ติดต่อทางไหนได้บ้าง", "r1"))
            .await;
        let body = only_text(&report);
        assert!(!body.contains("support@example.com"));
        assert!(body.contains(crate::safety::validator::EMAIL_PLACEHOLDER));
    }

    #[tokio::test]
    async fn long_input_is_truncated_before_llm() {
        let llm = MockLlm::replying("ได้รับข้อความแล้วค่ะ ขอบคุณนะคะ");
        let config = PipelineConfig {
            max_input_chars: 5,
            ..PipelineConfig::default()
        };
        let h = harness_with(llm.clone(), empty_feed(), RecordingSender::default(), config);
        let long = format!("{}#admin", "ก".repeat(50));
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", long, "r1"))
            .await;
        // The operator phrase sits past the cut.
        assert_eq!(report.decision.stage, Stage::GenerativeFallback);
        assert_eq!(llm.calls(), 1);
    }

    // ── Rate limiting ───────────────────────────────────────────────

    fn tight_limit(policy: ThrottlePolicy) -> PipelineConfig {
        PipelineConfig {
            rate_limit: RateLimitPolicy {
                max_requests: 2,
                window: Duration::from_secs(60),
            },
            throttle_policy: policy,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn throttle_notice_after_cap() {
        let h = harness_with(
            MockLlm::replying("x"),
            empty_feed(),
            RecordingSender::default(),
            tight_limit(ThrottlePolicy::Notice),
        );
        for token in ["r1", "r2"] {
            let report = h
                .processor
                .handle_event(InboundEvent::text("U1", "โปรวันนี้", token))
                .await;
            assert_eq!(report.decision.stage, Stage::IntentRouting);
        }
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "โปรวันนี้", "r3"))
            .await;
        assert_eq!(report.decision.stage, Stage::RateLimitGate);
        assert_eq!(only_text(&report), THROTTLE_NOTICE);

        // Other identities are unaffected.
        let report = h
            .processor
            .handle_event(InboundEvent::text("U2", "โปรวันนี้", "r4"))
            .await;
        assert_eq!(report.decision.stage, Stage::IntentRouting);
    }

    #[tokio::test]
    async fn silent_throttle_sends_nothing() {
        let h = harness_with(
            MockLlm::replying("x"),
            empty_feed(),
            RecordingSender::default(),
            tight_limit(ThrottlePolicy::Silent),
        );
        for token in ["r1", "r2", "r3"] {
            h.processor
                .handle_event(InboundEvent::text("U1", "โปรวันนี้", token))
                .await;
        }
        let replies = h.sender.replies();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].0, "r2");
    }

    #[tokio::test]
    async fn deflection_is_not_rate_limited() {
        let h = harness_with(
            MockLlm::replying("x"),
            empty_feed(),
            RecordingSender::default(),
            tight_limit(ThrottlePolicy::Notice),
        );
        for token in ["r1", "r2", "r3", "r4"] {
            let report = h
                .processor
                .handle_event(InboundEvent::text("U1", "ขอ OTP หน่อย", token))
                .await;
            assert_eq!(report.decision.stage, Stage::SensitiveDeflection);
        }
    }

    // ── Batches, failures, tracking ─────────────────────────────────

    #[tokio::test]
    async fn panic_in_one_event_spares_siblings() {
        let llm = MockLlm::new(LlmBehavior::PanicOn("boom"));
        let h = harness(llm);
        let reports = h
            .processor
            .process_batch(vec![
                InboundEvent::text("U1", "boom boom", "r1"),
                InboundEvent::text("U2", "โปรวันนี้", "r2"),
                InboundEvent::text("U3", "ช่วยแนะนำหน่อยค่ะ", "r3"),
            ])
            .await;

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].decision.stage, Stage::Recovered);
        assert_eq!(only_text(&reports[0]), APOLOGY);
        assert_eq!(reports[1].decision.stage, Stage::IntentRouting);
        assert_eq!(reports[2].decision.stage, Stage::GenerativeFallback);
        assert!(reports.iter().all(|r| r.delivered));
        assert_eq!(h.sender.replies().len(), 3);
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_not_raised() {
        let h = harness_with(
            MockLlm::replying("x"),
            empty_feed(),
            RecordingSender {
                fail: true,
                ..RecordingSender::default()
            },
            PipelineConfig::default(),
        );
        let report = h
            .processor
            .handle_event(InboundEvent::text("U1", "โปรวันนี้", "r1"))
            .await;
        assert_eq!(report.decision.stage, Stage::IntentRouting);
        assert!(!report.delivered);
    }

    #[tokio::test]
    async fn message_senders_are_tracked() {
        let h = harness(MockLlm::replying("x"));
        h.processor
            .handle_event(InboundEvent::text("U-track", "โปรวันนี้", "r1"))
            .await;

        // Tracking is spawned; give it a moment.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let users = h.users.list().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, "U-track");
    }

    #[test]
    fn system_prompt_names_brand_and_handle() {
        let brand = BrandConfig::default();
        let prompt = build_system_prompt(&brand);
        assert!(prompt.contains(&brand.brand_name));
        assert!(prompt.contains(&brand.line_handle));
        assert!(prompt.contains("ภาษาไทยเท่านั้น"));
    }

    #[test]
    fn panic_message_from_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic");
    }
}
