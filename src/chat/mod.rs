// FAQ chat widget: a scripted dialogue over a static FAQ list with a WhatsApp handoff
// when the answers do not resolve the visitor's issue.
//
// "Typing" delays are cooperative. Anything that should appear later is returned as a
// `PendingReply` for the front end to schedule; each reply carries the widget's epoch,
// and `close` / `start_new_conversation` bump the epoch so late deliveries are dropped.

use std::time::Duration;

use chrono::Local;
use log::{debug, info};

use crate::config::AppConfig;

pub const WHATSAPP_BASE_URL: &str = "https://wa.me";

pub const WELCOME_MESSAGE: &str =
    "Hi there! I'm the Explorer Circle assistant. Pick a question below and I'll help you plan your Uganda adventure.";
pub const ENCOURAGEMENT_MESSAGE: &str = "Of course! Pick another question below.";
pub const CLOSING_MESSAGE: &str =
    "Wonderful! We're glad we could help. Safe travels and see you in the Pearl of Africa.";
pub const FOLLOW_UP_PROMPT: &str = "Would you like to ask another question?";
pub const RESOLUTION_PROMPT: &str = "Did this resolve your issue?";

const HANDOFF_GREETING: &str =
    "Hello Explorer Circle! I was chatting with your website assistant and asked the following:";
const HANDOFF_TRAILER: &str =
    "My issue is still unresolved. Could I please speak with one of your travel consultants?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const FAQS: &[Faq] = &[
    Faq {
        question: "What is the best time to visit Uganda?",
        answer: "Uganda is a year-round destination. The dry seasons (June to September and December to February) are best for gorilla trekking and game drives, while the green seasons bring lush scenery, fewer crowds and lower rates.",
    },
    Faq {
        question: "Do I need a visa to travel to Uganda?",
        answer: "Most visitors need a visa, which you can apply for online through the official e-visa portal before you travel. The East Africa Tourist Visa also covers Kenya and Rwanda if you plan to combine destinations.",
    },
    Faq {
        question: "How much does a gorilla trekking permit cost?",
        answer: "Gorilla permits are issued by the Uganda Wildlife Authority and are limited each day, so we recommend booking early. We secure permits for you as part of your tailored itinerary.",
    },
    Faq {
        question: "Which vaccinations do I need?",
        answer: "A yellow fever vaccination certificate is required for entry. We also recommend speaking with a travel clinic about malaria prophylaxis and routine vaccines at least six weeks before departure.",
    },
    Faq {
        question: "Can you plan a trip for a group or a family?",
        answer: "Absolutely. We design trips for solo travellers, couples, friends and families, and adjust pacing, accommodation and activities to suit everyone in your group.",
    },
    Faq {
        question: "How do I pay and what is your cancellation policy?",
        answer: "A deposit confirms your booking and the balance is due before arrival. Cancellation terms depend on permits and lodges in your itinerary; your consultant shares the exact terms with your quote.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStep {
    Welcome,
    FaqSelection,
    Answer,
    FollowUp,
    Resolution,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub content: String,
    pub is_bot: bool,
    /// `HH:MM`, local time. Display only.
    pub timestamp: String,
}

impl ChatMessage {
    fn now(content: impl Into<String>, is_bot: bool) -> Self {
        Self {
            content: content.into(),
            is_bot,
            timestamp: Local::now().format("%H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Welcome,
    Answer(usize),
    Completion,
}

/// A bot reply that should be delivered after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReply {
    epoch: u64,
    kind: ReplyKind,
    delay: Duration,
}

impl PendingReply {
    pub fn kind(&self) -> ReplyKind {
        self.kind
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("That action is not available while the chat is in the {0:?} step")]
    WrongStep(ChatStep),
    #[error("Unknown FAQ item {0}")]
    UnknownFaq(usize),
}

/// Outcome of answering the resolution prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Closing message shown; `completed` follows after the reply is delivered.
    Resolved(PendingReply),
    /// Deep link to continue the conversation with a human on WhatsApp.
    Handoff(String),
}

#[derive(Debug, Clone)]
pub struct ChatWidget {
    messages: Vec<ChatMessage>,
    step: ChatStep,
    selected_faq: Option<usize>,
    history: Vec<String>,
    epoch: u64,
    pending: Option<ReplyKind>,
    is_open: bool,
    whatsapp_number: String,
    typing_delay: Duration,
    completion_delay: Duration,
}

impl ChatWidget {
    pub fn new(
        whatsapp_number: impl Into<String>,
        typing_delay: Duration,
        completion_delay: Duration,
    ) -> Self {
        Self {
            messages: Vec::new(),
            step: ChatStep::Welcome,
            selected_faq: None,
            history: Vec::new(),
            epoch: 0,
            pending: None,
            is_open: false,
            whatsapp_number: whatsapp_number.into(),
            typing_delay,
            completion_delay,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.whatsapp_number.clone(),
            config.typing_delay(),
            config.completion_delay(),
        )
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn step(&self) -> ChatStep {
        self.step
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn selected_faq(&self) -> Option<&'static Faq> {
        self.selected_faq.and_then(|i| FAQS.get(i))
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// The bot is "typing" while a reply is scheduled.
    pub fn is_typing(&self) -> bool {
        self.pending.is_some()
    }

    /// Prompt shown above the choice buttons for the current step.
    pub fn prompt(&self) -> Option<&'static str> {
        match self.step {
            ChatStep::FollowUp => Some(FOLLOW_UP_PROMPT),
            ChatStep::Resolution => Some(RESOLUTION_PROMPT),
            _ => None,
        }
    }

    /// Open the widget. An empty conversation schedules the welcome message; a reply
    /// dropped by an earlier `close` is rescheduled.
    pub fn open(&mut self) -> Option<PendingReply> {
        self.is_open = true;
        if let Some(kind) = self.pending {
            return Some(self.schedule(kind));
        }
        if self.messages.is_empty() {
            return Some(self.schedule(ReplyKind::Welcome));
        }
        None
    }

    /// Hide the widget. The conversation is kept; scheduled replies become stale.
    pub fn close(&mut self) {
        self.is_open = false;
        self.epoch += 1;
    }

    pub fn select_faq(&mut self, index: usize) -> Result<PendingReply, ChatError> {
        if self.step != ChatStep::FaqSelection {
            return Err(ChatError::WrongStep(self.step));
        }
        let faq = FAQS.get(index).ok_or(ChatError::UnknownFaq(index))?;

        self.messages.push(ChatMessage::now(faq.question, false));
        self.history.push(faq.question.to_string());
        self.selected_faq = Some(index);
        self.step = ChatStep::Answer;
        info!("[PHASE: chat] [STEP: faq] Visitor selected FAQ #{}", index);
        Ok(self.schedule(ReplyKind::Answer(index)))
    }

    pub fn follow_up(&mut self, another_question: bool) -> Result<(), ChatError> {
        if self.step != ChatStep::FollowUp {
            return Err(ChatError::WrongStep(self.step));
        }
        if another_question {
            self.messages.push(ChatMessage::now("Yes, I have another question", false));
            self.messages.push(ChatMessage::now(ENCOURAGEMENT_MESSAGE, true));
            self.step = ChatStep::FaqSelection;
        } else {
            self.messages.push(ChatMessage::now("No, that's all", false));
            self.step = ChatStep::Resolution;
        }
        Ok(())
    }

    pub fn resolve(&mut self, resolved: bool) -> Result<Resolution, ChatError> {
        if self.step != ChatStep::Resolution || self.pending.is_some() {
            return Err(ChatError::WrongStep(self.step));
        }
        if resolved {
            self.messages.push(ChatMessage::now("Yes, thank you!", false));
            self.messages.push(ChatMessage::now(CLOSING_MESSAGE, true));
            info!("[PHASE: chat] [STEP: resolution] Conversation resolved");
            return Ok(Resolution::Resolved(self.schedule(ReplyKind::Completion)));
        }

        self.messages.push(ChatMessage::now("No, I still need help", false));
        info!(
            "[PHASE: chat] [STEP: handoff] Handing off to WhatsApp with {} question(s)",
            self.history.len()
        );
        Ok(Resolution::Handoff(self.whatsapp_url()))
    }

    /// Apply a scheduled reply. Returns `false` when the reply is stale.
    pub fn deliver(&mut self, reply: PendingReply) -> bool {
        if reply.epoch != self.epoch || self.pending != Some(reply.kind) {
            debug!(
                "[PHASE: chat] [STEP: deliver] Dropping stale {:?} reply (epoch {}, current {})",
                reply.kind, reply.epoch, self.epoch
            );
            return false;
        }
        self.pending = None;

        match reply.kind {
            ReplyKind::Welcome => {
                self.messages.push(ChatMessage::now(WELCOME_MESSAGE, true));
                self.step = ChatStep::FaqSelection;
            }
            ReplyKind::Answer(index) => {
                if let Some(faq) = FAQS.get(index) {
                    self.messages.push(ChatMessage::now(faq.answer, true));
                }
                self.step = ChatStep::FollowUp;
            }
            ReplyKind::Completion => {
                self.step = ChatStep::Completed;
            }
        }
        true
    }

    /// Wait out the reply's delay on the current runtime, then deliver it.
    pub async fn deliver_after_delay(&mut self, reply: PendingReply) -> bool {
        tokio::time::sleep(reply.delay).await;
        self.deliver(reply)
    }

    /// Wipe the conversation and greet again.
    pub fn start_new_conversation(&mut self) -> Option<PendingReply> {
        self.messages.clear();
        self.history.clear();
        self.selected_faq = None;
        self.pending = None;
        self.step = ChatStep::Welcome;
        self.epoch += 1;
        info!("[PHASE: chat] [STEP: reset] Started a new conversation");
        self.open()
    }

    /// Plain-text message prefilled into WhatsApp.
    pub fn handoff_message(&self) -> String {
        let mut text = String::from(HANDOFF_GREETING);
        text.push('\n');
        for question in &self.history {
            text.push_str("\nQ: ");
            text.push_str(question);
        }
        text.push_str("\n\n");
        text.push_str(HANDOFF_TRAILER);
        text
    }

    pub fn whatsapp_url(&self) -> String {
        format!(
            "{}/{}?text={}",
            WHATSAPP_BASE_URL,
            self.whatsapp_number,
            urlencoding::encode(&self.handoff_message())
        )
    }

    fn schedule(&mut self, kind: ReplyKind) -> PendingReply {
        self.pending = Some(kind);
        let delay = match kind {
            ReplyKind::Completion => self.completion_delay,
            _ => self.typing_delay,
        };
        PendingReply {
            epoch: self.epoch,
            kind,
            delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ChatWidget {
        ChatWidget::new("256700000000", Duration::ZERO, Duration::ZERO)
    }

    fn opened() -> ChatWidget {
        let mut w = widget();
        let reply = w.open().unwrap();
        assert!(w.deliver(reply));
        w
    }

    fn ask(w: &mut ChatWidget, index: usize) {
        let reply = w.select_faq(index).unwrap();
        assert!(w.deliver(reply));
    }

    fn decoded_text(url: &str) -> String {
        let (_, encoded) = url.split_once("?text=").unwrap();
        urlencoding::decode(encoded).unwrap().into_owned()
    }

    #[test]
    fn open_greets_after_typing_delay() {
        let mut w = ChatWidget::new("256700000000", Duration::from_millis(800), Duration::ZERO);
        let reply = w.open().unwrap();
        assert_eq!(reply.kind(), ReplyKind::Welcome);
        assert_eq!(reply.delay(), Duration::from_millis(800));
        assert!(w.is_typing());
        assert!(w.messages().is_empty());

        assert!(w.deliver(reply));
        assert_eq!(w.step(), ChatStep::FaqSelection);
        assert_eq!(w.messages().len(), 1);
        assert!(w.messages()[0].is_bot);
        assert!(!w.is_typing());
    }

    #[test]
    fn reopening_existing_conversation_does_not_greet_again() {
        let mut w = opened();
        w.close();
        assert!(w.open().is_none());
        assert_eq!(w.messages().len(), 1);
    }

    #[test]
    fn selecting_faq_appends_two_messages_and_one_history_entry() {
        let mut w = opened();
        let before = w.messages().len();

        let reply = w.select_faq(1).unwrap();
        assert_eq!(w.step(), ChatStep::Answer);
        assert_eq!(w.selected_faq(), Some(&FAQS[1]));
        assert!(w.deliver(reply));

        assert_eq!(w.messages().len(), before + 2);
        assert_eq!(w.history(), &[FAQS[1].question.to_string()]);
        let question = &w.messages()[before];
        let answer = &w.messages()[before + 1];
        assert!(!question.is_bot);
        assert_eq!(question.content, FAQS[1].question);
        assert!(answer.is_bot);
        assert_eq!(answer.content, FAQS[1].answer);
        assert_eq!(w.step(), ChatStep::FollowUp);
        assert_eq!(w.prompt(), Some(FOLLOW_UP_PROMPT));
    }

    #[test]
    fn timestamps_are_hour_minute() {
        let w = opened();
        let ts = &w.messages()[0].timestamp;
        assert_eq!(ts.len(), 5);
        assert_eq!(&ts[2..3], ":");
        assert!(ts.chars().filter(|c| *c != ':').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn follow_up_yes_loops_back_with_encouragement() {
        let mut w = opened();
        ask(&mut w, 0);
        w.follow_up(true).unwrap();
        assert_eq!(w.step(), ChatStep::FaqSelection);
        let last = w.messages().last().unwrap();
        assert!(last.is_bot);
        assert_eq!(last.content, ENCOURAGEMENT_MESSAGE);

        ask(&mut w, 2);
        assert_eq!(w.history().len(), 2);
    }

    #[test]
    fn resolved_conversation_completes_after_delay() {
        let mut w = opened();
        ask(&mut w, 0);
        w.follow_up(false).unwrap();
        assert_eq!(w.step(), ChatStep::Resolution);

        let Resolution::Resolved(reply) = w.resolve(true).unwrap() else {
            panic!("expected resolved");
        };
        assert_eq!(w.messages().last().unwrap().content, CLOSING_MESSAGE);
        assert_eq!(w.step(), ChatStep::Resolution);
        assert!(w.resolve(true).is_err());
        assert!(w.deliver(reply));
        assert_eq!(w.step(), ChatStep::Completed);
    }

    #[test]
    fn handoff_url_contains_every_question_in_order() {
        let mut w = opened();
        ask(&mut w, 3);
        w.follow_up(true).unwrap();
        ask(&mut w, 0);
        w.follow_up(false).unwrap();

        let Resolution::Handoff(url) = w.resolve(false).unwrap() else {
            panic!("expected handoff");
        };
        assert!(url.starts_with("https://wa.me/256700000000?text="));
        assert!(!url.contains(' '));
        assert!(!url.contains('\n'));

        let text = decoded_text(&url);
        assert!(text.starts_with(HANDOFF_GREETING));
        assert!(text.ends_with(HANDOFF_TRAILER));
        let first = text.find(&format!("Q: {}", FAQS[3].question)).unwrap();
        let second = text.find(&format!("Q: {}", FAQS[0].question)).unwrap();
        assert!(first < second);

        // Terminal by navigation: the widget stays where it is.
        assert_eq!(w.step(), ChatStep::Resolution);
    }

    #[test]
    fn stale_reply_after_close_is_discarded() {
        let mut w = opened();
        let reply = w.select_faq(0).unwrap();
        w.close();
        assert!(!w.deliver(reply));
        assert_eq!(w.step(), ChatStep::Answer);

        // Reopening reschedules the answer under the new epoch.
        let again = w.open().unwrap();
        assert_eq!(again.kind(), ReplyKind::Answer(0));
        assert!(w.deliver(again));
        assert_eq!(w.step(), ChatStep::FollowUp);
        assert_eq!(
            w.messages().iter().filter(|m| m.content == FAQS[0].answer).count(),
            1
        );
    }

    #[test]
    fn start_new_conversation_resets_and_discards_pending() {
        let mut w = opened();
        let stale = w.select_faq(4).unwrap();
        let welcome = w.start_new_conversation().unwrap();

        assert!(w.messages().is_empty());
        assert!(w.history().is_empty());
        assert_eq!(w.selected_faq(), None);
        assert_eq!(w.step(), ChatStep::Welcome);

        assert!(!w.deliver(stale));
        assert!(w.messages().is_empty());
        assert!(w.deliver(welcome));
        assert_eq!(w.step(), ChatStep::FaqSelection);
    }

    #[test]
    fn actions_out_of_step_are_refused() {
        let mut w = widget();
        assert_eq!(
            w.select_faq(0).unwrap_err(),
            ChatError::WrongStep(ChatStep::Welcome)
        );
        let mut w = opened();
        assert_eq!(w.select_faq(99).unwrap_err(), ChatError::UnknownFaq(99));
        assert!(w.follow_up(true).is_err());
        assert!(w.resolve(true).is_err());
        assert!(w.history().is_empty());
    }

    #[tokio::test]
    async fn deliver_after_delay_applies_reply() {
        let mut w = ChatWidget::new("256700000000", Duration::from_millis(5), Duration::ZERO);
        let reply = w.open().unwrap();
        assert!(w.deliver_after_delay(reply).await);
        assert_eq!(w.step(), ChatStep::FaqSelection);
    }
}
