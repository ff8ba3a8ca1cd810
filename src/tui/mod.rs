//! Headless terminal front end for the Explorer Circle trip planner.
//!
//! Layout:
//! - Centered window titled "Explorer Circle"
//! - Left banner with the brand and the three wizard steps
//! - Main content panel with one page per step plus a "submitted" page
//! - Bottom button row: [ Back ] [ Next ] [ Cancel ]
//! - F2 toggles the FAQ chat panel from any page
//!
//! Note: Logging is file-only in TUI mode (stdout logging is disabled) to avoid corrupting the terminal UI.

use crate::api::client::{ApiError, HttpLeadApi, LeadApi, PhotoFile, UPLOAD_KIND_TRAVEL_PHOTO};
use crate::chat::{ChatStep, ChatWidget, PendingReply, Resolution, FAQS};
use crate::config::AppConfig;
use crate::models::record::{
    Companion, Experience, HearAboutUs, PioneerTraveller, TravellerType,
};
use crate::models::responses::{SubmissionReceipt, UploadResult};
use crate::models::state::SessionState;
use crate::utils::countries;
use crate::wizard::consent::SubmissionStatus;
use crate::wizard::profile::{ProfileField, UploadStatus, UploadTicket};
use crate::wizard::trip::TripField;
use crate::wizard::{WizardEvent, WizardStep};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{info, warn};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const BANNER: &str = r#"
  EXPLORER  CIRCLE
  ~~~~~~~~~~~~~~~~
  Uganda, your way
"#;

const PROFILE_FIELD_COUNT: usize = 9;
const TRIP_FIELD_COUNT: usize = 7;
const CHAT_VISIBLE_MESSAGES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Home,
    Profile,
    Trip,
    Consent,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonFocus {
    Back,
    Next,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    Field(usize),
    Button(ButtonFocus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    ConfirmCancel,
}

#[derive(Debug)]
enum UiMsg {
    UploadFinished(UploadTicket, Result<UploadResult, ApiError>),
    SubmitFinished(Result<SubmissionReceipt, ApiError>),
}

/// Single-line text entry. The cursor counts characters, not bytes.
struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn new(value: impl Into<String>) -> Self {
        let v = value.into();
        Self {
            cursor: v.chars().count(),
            value: v,
        }
    }

    fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn display(&self, focused: bool) -> String {
        if focused {
            format!("{}_", self.value)
        } else {
            self.value.clone()
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        let len = self.value.chars().count();
        match code {
            KeyCode::Char(c) => {
                let idx = self.byte_index();
                self.value.insert(idx, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let idx = self.byte_index();
                    self.value.remove(idx);
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < len {
                    let idx = self.byte_index();
                    self.value.remove(idx);
                }
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(len);
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = len;
                true
            }
            _ => false,
        }
    }
}

struct TuiState {
    session: SessionState,
    in_wizard: bool,
    modal: Option<Modal>,
    focus: FocusTarget,
    quit: bool,
    status_line: Option<String>,

    // Step 1 inputs
    name: TextInput,
    email: TextInput,
    phone: TextInput,
    country_search: TextInput,
    photo_path: TextInput,
    country_index: usize,
    traveller_index: usize,

    // Step 2 inputs
    start_date: TextInput,
    end_date: TextInput,
    companion_count: TextInput,
    dream_words: TextInput,
    special_requirements: TextInput,
    experience_index: usize,

    // Chat panel
    chat_open: bool,
    chat_index: usize,
    chat_handoff: Option<String>,
    chat_handoff_opened: bool,
    // Off in smoke mode and tests so nothing is launched.
    open_links: bool,
    pending_replies: Vec<(Instant, PendingReply)>,
}

impl TuiState {
    fn new(config: AppConfig, today: NaiveDate) -> Self {
        Self {
            session: SessionState::new(&config, today),
            in_wizard: false,
            modal: None,
            focus: FocusTarget::Button(ButtonFocus::Next),
            quit: false,
            status_line: None,
            name: TextInput::new(""),
            email: TextInput::new(""),
            phone: TextInput::new(""),
            country_search: TextInput::new(""),
            photo_path: TextInput::new(""),
            country_index: 0,
            traveller_index: 0,
            start_date: TextInput::new(""),
            end_date: TextInput::new(""),
            companion_count: TextInput::new(""),
            dream_words: TextInput::new(""),
            special_requirements: TextInput::new(""),
            experience_index: 0,
            chat_open: false,
            chat_index: 0,
            chat_handoff: None,
            chat_handoff_opened: false,
            open_links: false,
            pending_replies: Vec::new(),
        }
    }
}

fn current_page(state: &TuiState) -> Page {
    if !state.in_wizard {
        return Page::Home;
    }
    if state.session.consent.is_submitted() {
        return Page::Submitted;
    }
    match state.session.step() {
        WizardStep::Profile => Page::Profile,
        WizardStep::Trip => Page::Trip,
        WizardStep::Consent => Page::Consent,
    }
}

fn page_title(page: Page) -> &'static str {
    match page {
        Page::Home => "Welcome",
        Page::Profile => "Step 1 of 3: Traveller Vibes",
        Page::Trip => "Step 2 of 3: Dream Trip",
        Page::Consent => "Step 3 of 3: Explorer Circle",
        Page::Submitted => "You're in!",
    }
}

fn next_label(page: Page) -> &'static str {
    match page {
        Page::Home => "Start",
        Page::Consent => "Submit",
        Page::Submitted => "Close",
        _ => "Next",
    }
}

fn cancel_label(page: Page) -> &'static str {
    match page {
        Page::Home => "Quit",
        _ => "Cancel",
    }
}

fn can_go_back(state: &TuiState) -> bool {
    match current_page(state) {
        Page::Trip => true,
        Page::Consent => !state.session.consent.is_busy(),
        _ => false,
    }
}

fn can_go_next(state: &TuiState) -> bool {
    match current_page(state) {
        Page::Home | Page::Submitted => true,
        _ => state.session.can_advance(),
    }
}

// After a successful submission only "Close" remains.
fn can_cancel(state: &TuiState) -> bool {
    match current_page(state) {
        Page::Submitted => false,
        Page::Consent => !state.session.consent.is_busy(),
        _ => true,
    }
}

fn page_field_count(page: Page) -> usize {
    match page {
        Page::Profile => PROFILE_FIELD_COUNT,
        Page::Trip => TRIP_FIELD_COUNT,
        Page::Consent => 1,
        Page::Home | Page::Submitted => 0,
    }
}

fn focused_text_input_mut(state: &mut TuiState) -> Option<&mut TextInput> {
    let page = current_page(state);
    let FocusTarget::Field(i) = state.focus else {
        return None;
    };
    match (page, i) {
        (Page::Profile, 0) => Some(&mut state.name),
        (Page::Profile, 1) => Some(&mut state.email),
        (Page::Profile, 2) => Some(&mut state.phone),
        (Page::Profile, 3) => Some(&mut state.country_search),
        (Page::Profile, 8) => Some(&mut state.photo_path),
        (Page::Trip, 0) => Some(&mut state.start_date),
        (Page::Trip, 1) => Some(&mut state.end_date),
        (Page::Trip, 4) => Some(&mut state.companion_count),
        (Page::Trip, 5) => Some(&mut state.dream_words),
        (Page::Trip, 6) => Some(&mut state.special_requirements),
        _ => None,
    }
}

/// Push the focused input's text into the step form (write + touch + validate).
fn apply_text_input(state: &mut TuiState) {
    let page = current_page(state);
    let FocusTarget::Field(i) = state.focus else {
        return;
    };
    match (page, i) {
        (Page::Profile, 0) => {
            let v = state.name.value.clone();
            state.session.profile.set_name(v);
        }
        (Page::Profile, 1) => {
            let v = state.email.value.clone();
            state.session.profile.set_email(v);
        }
        (Page::Profile, 2) => apply_phone(state),
        (Page::Profile, 3) => {
            let v = state.country_search.value.clone();
            state.session.profile.set_country_search(v);
            state.country_index = 0;
        }
        (Page::Trip, 0) => {
            let v = state.start_date.value.trim().to_string();
            if v.is_empty() {
                state.session.trip.set_start_date(None);
            } else {
                state.session.trip.set_start_date_text(&v);
            }
            // A start on or after the end clears the end date.
            if state.session.trip.end_date().is_none()
                && crate::wizard::trip::parse_date(&state.end_date.value).is_ok()
            {
                state.end_date.set("");
            }
        }
        (Page::Trip, 1) => {
            let v = state.end_date.value.trim().to_string();
            if v.is_empty() {
                state.session.trip.set_end_date(None);
            } else {
                state.session.trip.set_end_date_text(&v);
            }
        }
        (Page::Trip, 4) => {
            let v = state.companion_count.value.trim();
            let count = if v.is_empty() { None } else { v.parse().ok() };
            state.session.trip.set_companion_count(count);
        }
        (Page::Trip, 5) => {
            let v = state.dream_words.value.clone();
            state.session.trip.set_dream_words(v);
        }
        (Page::Trip, 6) => {
            let v = state.special_requirements.value.clone();
            state.session.trip.set_special_requirements(v);
        }
        _ => {}
    }
}

// Local numbers are prefixed with the chosen country's dial code.
fn apply_phone(state: &mut TuiState) {
    let raw = state.phone.value.trim().to_string();
    let dial = countries::find_country(state.session.profile.country()).map(|c| c.dial_code);
    match dial {
        Some(dial) if !raw.is_empty() && !raw.starts_with('+') => {
            state.session.profile.set_phone_parts(dial, &raw)
        }
        _ => state.session.profile.set_phone(raw),
    }
}

/// Refill every input from the mounted forms (after navigation or reset).
fn load_inputs(state: &mut TuiState) {
    let profile = &state.session.profile;
    state.name.set(profile.name());
    state.email.set(profile.email());
    state.phone.set(profile.phone());
    state.country_search.set(profile.country_search());
    state.photo_path.set("");
    state.country_index = 0;
    state.traveller_index = 0;

    let trip = &state.session.trip;
    let fmt = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    state.start_date.set(fmt(trip.start_date()));
    state.end_date.set(fmt(trip.end_date()));
    state
        .companion_count
        .set(trip.companion_count().map(|c| c.to_string()).unwrap_or_default());
    state.dream_words.set(trip.dream_words());
    state.special_requirements.set(trip.special_requirements());
    state.experience_index = 0;
}

fn reset_focus(state: &mut TuiState) {
    if page_field_count(current_page(state)) > 0 {
        state.focus = FocusTarget::Field(0);
    } else {
        set_focused_button(state, ButtonFocus::Next);
    }
}

fn handle_wizard_events(state: &mut TuiState) {
    for event in state.session.drain_events() {
        match event {
            WizardEvent::ScrollToTop => reset_focus(state),
            WizardEvent::NavigateHome => {
                state.in_wizard = false;
                load_inputs(state);
                set_focused_button(state, ButtonFocus::Next);
            }
            WizardEvent::Submitted { reference_number } => {
                info!(
                    "[PHASE: tui] [STEP: submit] Showing confirmation for {}",
                    reference_number
                );
                set_focused_button(state, ButtonFocus::Next);
            }
        }
    }
}

fn start_upload(state: &mut TuiState, tx: &mpsc::Sender<UiMsg>, api: &Arc<dyn LeadApi>) {
    let path = state.photo_path.value.trim().to_string();
    if path.is_empty() {
        state.session.profile.remove_photo();
        return;
    }

    let file = match PhotoFile::from_path(Path::new(&path)) {
        Ok(f) => f,
        Err(e) => {
            state.session.profile.reject_file(e.to_string());
            return;
        }
    };
    let Some(ticket) = state.session.profile.begin_upload(&file) else {
        return;
    };

    let api = Arc::clone(api);
    let tx = tx.clone();
    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build();
        let result = match rt {
            Ok(rt) => rt.block_on(api.upload_file(&file, UPLOAD_KIND_TRAVEL_PHOTO)),
            Err(e) => Err(ApiError::Network(format!(
                "Internal error starting upload: {}",
                e
            ))),
        };
        let _ = tx.send(UiMsg::UploadFinished(ticket, result));
    });
}

fn start_submit(state: &mut TuiState, tx: &mpsc::Sender<UiMsg>, api: &Arc<dyn LeadApi>) {
    let payload = match state.session.prepare_submission() {
        Ok(p) => p,
        Err(e) => {
            state.status_line = Some(e.to_string());
            return;
        }
    };
    state.status_line = None;

    let api = Arc::clone(api);
    let tx = tx.clone();
    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build();
        let result = match rt {
            Ok(rt) => rt.block_on(api.submit(&payload)),
            Err(e) => Err(ApiError::Network(format!(
                "Internal error starting submission: {}",
                e
            ))),
        };
        let _ = tx.send(UiMsg::SubmitFinished(result));
    });
}

fn schedule_reply(state: &mut TuiState, reply: Option<PendingReply>) {
    if let Some(reply) = reply {
        state
            .pending_replies
            .push((Instant::now() + reply.delay(), reply));
    }
}

fn deliver_due_replies(state: &mut TuiState, now: Instant) {
    let (due, later): (Vec<_>, Vec<_>) = state
        .pending_replies
        .drain(..)
        .partition(|(at, _)| *at <= now);
    state.pending_replies = later;
    for (_, reply) in due {
        state.session.chat.deliver(reply);
    }
}

fn open_chat(state: &mut TuiState) {
    state.chat_open = true;
    state.chat_index = 0;
    let reply = state.session.chat.open();
    schedule_reply(state, reply);
}

fn close_chat(state: &mut TuiState) {
    state.chat_open = false;
    state.session.chat.close();
    state.pending_replies.clear();
}

fn chat_options(chat: &ChatWidget) -> Vec<String> {
    match chat.step() {
        ChatStep::FaqSelection => FAQS.iter().map(|f| f.question.to_string()).collect(),
        ChatStep::FollowUp | ChatStep::Resolution if !chat.is_typing() => {
            vec!["Yes".to_string(), "No".to_string()]
        }
        ChatStep::Completed => vec!["Start a new conversation".to_string()],
        _ => Vec::new(),
    }
}

fn handle_chat_key(state: &mut TuiState, code: KeyCode) {
    let options = chat_options(&state.session.chat);
    match code {
        KeyCode::Esc | KeyCode::F(2) => close_chat(state),
        KeyCode::Up => state.chat_index = state.chat_index.saturating_sub(1),
        KeyCode::Down => {
            state.chat_index = (state.chat_index + 1).min(options.len().saturating_sub(1));
        }
        KeyCode::Enter if !options.is_empty() => {
            let choice = state.chat_index.min(options.len() - 1);
            state.chat_index = 0;
            match state.session.chat.step() {
                ChatStep::FaqSelection => match state.session.chat.select_faq(choice) {
                    Ok(reply) => schedule_reply(state, Some(reply)),
                    Err(e) => warn!("[PHASE: tui] [STEP: chat] {}", e),
                },
                ChatStep::FollowUp => {
                    if let Err(e) = state.session.chat.follow_up(choice == 0) {
                        warn!("[PHASE: tui] [STEP: chat] {}", e);
                    }
                }
                ChatStep::Resolution => match state.session.chat.resolve(choice == 0) {
                    Ok(Resolution::Resolved(reply)) => {
                        state.chat_handoff = None;
                        state.chat_handoff_opened = false;
                        schedule_reply(state, Some(reply));
                    }
                    Ok(Resolution::Handoff(url)) => {
                        state.chat_handoff_opened = state.open_links && open_link(&url);
                        state.chat_handoff = Some(url);
                    }
                    Err(e) => warn!("[PHASE: tui] [STEP: chat] {}", e),
                },
                ChatStep::Completed => {
                    state.chat_handoff = None;
                    state.chat_handoff_opened = false;
                    state.pending_replies.clear();
                    let reply = state.session.chat.start_new_conversation();
                    schedule_reply(state, reply);
                }
                _ => {}
            }
        }
        _ => {}
    }
}

/// Hand the URL to the platform opener. The link stays on screen either way.
fn open_link(url: &str) -> bool {
    match open::that(url) {
        Ok(()) => {
            info!("[PHASE: tui] [STEP: chat] Opened WhatsApp handoff link");
            true
        }
        Err(e) => {
            warn!(
                "[PHASE: tui] [STEP: chat] Could not open WhatsApp link automatically: {}",
                e
            );
            false
        }
    }
}

pub fn run(config: AppConfig, open_chat_on_start: bool) -> Result<()> {
    info!("[PHASE: tui] [STEP: start] Starting TUI trip planner");

    let api: Arc<dyn LeadApi> = Arc::new(HttpLeadApi::new(
        &config.api_base_url,
        config.request_timeout(),
    )?);

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, config, api, open_chat_on_start);
    restore_terminal(&mut terminal)?;

    result
}

fn new_smoke_state(config: AppConfig, target: &str) -> TuiState {
    // Smoke-only: seeded state for deterministic page rendering in CI/tooling.
    let today = Local::now().date_naive();
    let mut state = TuiState::new(config, today);
    let start = today + chrono::Days::new(45);
    let end = today + chrono::Days::new(54);

    let seed_profile = |state: &mut TuiState| {
        state.in_wizard = true;
        let p = &mut state.session.profile;
        p.set_name("Jo");
        p.set_email("jo@example.com");
        p.set_country("Uganda");
        p.set_phone_parts("+256", "0700000000");
        p.set_been_to_africa(true);
        p.toggle_traveller_type(TravellerType::Adventurer);
        p.toggle_traveller_type(TravellerType::NatureLover);
        p.set_hear_about_us(HearAboutUs::SocialMedia);
    };
    let seed_trip = |state: &mut TuiState| {
        let t = &mut state.session.trip;
        t.set_start_date(Some(start));
        t.set_end_date(Some(end));
        t.toggle_experience(Experience::GorillaTrekking);
        t.toggle_experience(Experience::NileAdventure);
        t.toggle_experience(Experience::FoodNightlife);
        t.set_companion(Companion::Friends);
        t.set_companion_count(Some(5));
        t.set_dream_words("misty mountains and wild rivers");
    };

    match target {
        "profile" => {
            seed_profile(&mut state);
            state.session.profile.set_email("jo@");
        }
        "trip" => {
            seed_profile(&mut state);
            let _ = state.session.next_step();
            seed_trip(&mut state);
        }
        "consent" | "submitted" => {
            seed_profile(&mut state);
            let _ = state.session.next_step();
            seed_trip(&mut state);
            let _ = state.session.next_step();
            state.session.consent.set_keep_updated(true);
            if target == "submitted" && state.session.prepare_submission().is_ok() {
                state.session.complete_submission(Ok(SubmissionReceipt {
                    submission_id: None,
                    reference_number: "EXP-2026-000123".to_string(),
                    estimated_response_time: Some("24-48 hours".to_string()),
                    next_steps: vec![
                        "A travel consultant reviews your answers".to_string(),
                        "You receive a tailored itinerary by email".to_string(),
                        "We fine-tune the trip together".to_string(),
                    ],
                }));
            }
        }
        "cancel" => {
            seed_profile(&mut state);
            state.modal = Some(Modal::ConfirmCancel);
        }
        "chat" => {
            state.chat_open = true;
            let chat = &mut state.session.chat;
            if let Some(reply) = chat.open() {
                chat.deliver(reply);
            }
            if let Ok(reply) = chat.select_faq(0) {
                chat.deliver(reply);
            }
        }
        _ => {}
    }

    handle_wizard_events(&mut state);
    load_inputs(&mut state);
    if state.modal.is_some() {
        set_focused_button(&mut state, ButtonFocus::Next);
    } else {
        reset_focus(&mut state);
    }
    state
}

/// Non-interactive smoke mode: render a single frame and exit.
/// Target pages: home|profile|trip|consent|submitted|cancel|chat
pub fn smoke(config: AppConfig, target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={}",
        target
    );

    let t = target.trim().to_ascii_lowercase();
    let state = new_smoke_state(config, t.as_str());

    // In-memory backend: no raw mode, no alternate screen.
    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f.size(), f, &state))?;

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: AppConfig,
    api: Arc<dyn LeadApi>,
    open_chat_on_start: bool,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut state = TuiState::new(config, Local::now().date_naive());
    state.open_links = true;
    let (tx, rx) = mpsc::channel::<UiMsg>();

    if open_chat_on_start {
        open_chat(&mut state);
    }

    while !state.quit {
        drain_messages(&mut state, &rx);
        deliver_due_replies(&mut state, Instant::now());
        terminal.draw(|f| draw(f.size(), f, &state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut state, key.code, &tx, &api);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    info!("[PHASE: tui] [STEP: exit] TUI closed");
    Ok(())
}

fn focused_button(state: &TuiState) -> ButtonFocus {
    match state.focus {
        FocusTarget::Button(b) => b,
        _ => ButtonFocus::Next,
    }
}

fn set_focused_button(state: &mut TuiState, b: ButtonFocus) {
    state.focus = FocusTarget::Button(b);
}

fn drain_messages(state: &mut TuiState, rx: &mpsc::Receiver<UiMsg>) {
    while let Ok(msg) = rx.try_recv() {
        match msg {
            UiMsg::UploadFinished(ticket, result) => {
                state.session.profile.finish_upload(ticket, result);
            }
            UiMsg::SubmitFinished(result) => {
                state.session.complete_submission(result);
                handle_wizard_events(state);
            }
        }
    }
}

fn leave_wizard(state: &mut TuiState) {
    state.session.close_wizard();
    state.status_line = None;
    handle_wizard_events(state);
}

fn handle_key(
    state: &mut TuiState,
    code: KeyCode,
    tx: &mpsc::Sender<UiMsg>,
    api: &Arc<dyn LeadApi>,
) {
    // Chat panel sits above everything else.
    if state.chat_open {
        handle_chat_key(state, code);
        return;
    }
    if matches!(code, KeyCode::F(2)) && state.modal.is_none() {
        open_chat(state);
        return;
    }

    // Modal handling
    if let Some(modal) = state.modal.clone() {
        match modal {
            Modal::ConfirmCancel => match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    let next = match focused_button(state) {
                        ButtonFocus::Cancel => ButtonFocus::Next,
                        _ => ButtonFocus::Cancel,
                    };
                    set_focused_button(state, next);
                }
                KeyCode::Enter => {
                    let confirm = focused_button(state) == ButtonFocus::Cancel;
                    state.modal = None;
                    if confirm {
                        leave_wizard(state);
                    } else {
                        reset_focus(state);
                    }
                }
                KeyCode::Esc => {
                    state.modal = None;
                    reset_focus(state);
                }
                _ => {}
            },
        }
        return;
    }

    let page = current_page(state);

    // Global keys
    if matches!(code, KeyCode::Esc) {
        match page {
            Page::Home => state.quit = true,
            _ if can_cancel(state) => {
                state.modal = Some(Modal::ConfirmCancel);
                set_focused_button(state, ButtonFocus::Next); // "No"
            }
            _ => {}
        }
        return;
    }

    // Text input handling (when a field is focused)
    if let Some(input) = focused_text_input_mut(state) {
        if input.handle_key(code) {
            apply_text_input(state);
            return;
        }
    }

    let field = match state.focus {
        FocusTarget::Field(i) => Some(i),
        FocusTarget::Button(_) => None,
    };

    match (page, field, code) {
        // Step 1
        (Page::Profile, Some(3), KeyCode::Up) => {
            state.country_index = state.country_index.saturating_sub(1);
        }
        (Page::Profile, Some(3), KeyCode::Down) => {
            let n = state.session.profile.country_options().len();
            state.country_index = (state.country_index + 1).min(n.saturating_sub(1));
        }
        (Page::Profile, Some(3), KeyCode::Enter) => {
            let options = state.session.profile.country_options();
            if let Some(country) = options.get(state.country_index) {
                state.session.profile.set_country(country.name);
                if !state.phone.value.trim().is_empty() {
                    apply_phone(state);
                }
            }
        }
        (Page::Profile, Some(4), KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
            let been = state.session.profile.been_to_africa();
            state
                .session
                .profile
                .set_been_to_africa(!been.unwrap_or(false));
        }
        (Page::Profile, Some(5), KeyCode::Up) => {
            state.traveller_index = state.traveller_index.saturating_sub(1);
        }
        (Page::Profile, Some(5), KeyCode::Down) => {
            state.traveller_index = (state.traveller_index + 1).min(TravellerType::ALL.len() - 1);
        }
        (Page::Profile, Some(5), KeyCode::Char(' ')) => {
            if let Some(t) = TravellerType::ALL.get(state.traveller_index) {
                if !state.session.profile.toggle_traveller_type(*t) {
                    state.status_line = Some("You can choose up to 3 traveller types.".to_string());
                }
            }
        }
        (Page::Profile, Some(6), KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
            let current = state.session.profile.hear_about_us();
            let idx = current
                .and_then(|h| HearAboutUs::ALL.iter().position(|x| *x == h))
                .map(|i| {
                    if matches!(code, KeyCode::Left) {
                        (i + HearAboutUs::ALL.len() - 1) % HearAboutUs::ALL.len()
                    } else {
                        (i + 1) % HearAboutUs::ALL.len()
                    }
                })
                .unwrap_or(0);
            state.session.profile.set_hear_about_us(HearAboutUs::ALL[idx]);
        }
        (Page::Profile, Some(7), KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
            let next = state
                .session
                .profile
                .pioneer_traveller()
                .map(|p| p.toggle())
                .unwrap_or(PioneerTraveller::Yes);
            state.session.profile.set_pioneer_traveller(next);
        }
        (Page::Profile, Some(8), KeyCode::Enter) => start_upload(state, tx, api),

        // Step 2
        (Page::Trip, Some(2), KeyCode::Up) => {
            state.experience_index = state.experience_index.saturating_sub(1);
        }
        (Page::Trip, Some(2), KeyCode::Down) => {
            state.experience_index = (state.experience_index + 1).min(Experience::ALL.len() - 1);
        }
        (Page::Trip, Some(2), KeyCode::Char(' ')) => {
            if let Some(e) = Experience::ALL.get(state.experience_index) {
                state.session.trip.toggle_experience(*e);
            }
        }
        (Page::Trip, Some(3), KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
            let next = state
                .session
                .trip
                .companion()
                .map(|c| c.next())
                .unwrap_or(Companion::Solo);
            state.session.trip.set_companion(next);
            if !next.needs_count() {
                state.companion_count.set("");
            }
        }

        // Step 3
        (Page::Consent, Some(0), KeyCode::Char(' ')) => {
            let v = !state.session.consent.keep_updated();
            state.session.consent.set_keep_updated(v);
        }

        (_, _, KeyCode::Tab) => cycle_focus(state, page, true),
        (_, _, KeyCode::BackTab) => cycle_focus(state, page, false),
        (_, _, KeyCode::Enter) => activate_button(state, page, tx, api),
        _ => {}
    }
}

// The head-count field only exists for friends and family trips.
fn is_field_visible(state: &TuiState, page: Page, idx: usize) -> bool {
    match (page, idx) {
        (Page::Trip, 4) => state
            .session
            .trip
            .companion()
            .map(|c| c.needs_count())
            .unwrap_or(false),
        _ => true,
    }
}

fn cycle_focus(state: &mut TuiState, page: Page, forward: bool) {
    let fields = page_field_count(page);
    let mut order: Vec<FocusTarget> = (0..fields)
        .filter(|i| is_field_visible(state, page, *i))
        .map(FocusTarget::Field)
        .collect();
    order.extend([
        FocusTarget::Button(ButtonFocus::Back),
        FocusTarget::Button(ButtonFocus::Next),
        FocusTarget::Button(ButtonFocus::Cancel),
    ]);
    let pos = order.iter().position(|f| *f == state.focus).unwrap_or(0);
    let next = if forward {
        (pos + 1) % order.len()
    } else {
        (pos + order.len() - 1) % order.len()
    };
    state.focus = order[next];
}

fn activate_button(
    state: &mut TuiState,
    page: Page,
    tx: &mpsc::Sender<UiMsg>,
    api: &Arc<dyn LeadApi>,
) {
    match focused_button(state) {
        ButtonFocus::Back => {
            if can_go_back(state) {
                state.session.previous_step();
                state.status_line = None;
                reset_focus(state);
            }
        }
        ButtonFocus::Next => match page {
            Page::Home => {
                state.in_wizard = true;
                load_inputs(state);
                reset_focus(state);
            }
            Page::Profile | Page::Trip => match state.session.next_step() {
                Ok(()) => {
                    state.status_line = None;
                    handle_wizard_events(state);
                }
                Err(e) => state.status_line = Some(e.to_string()),
            },
            Page::Consent => {
                if can_go_next(state) {
                    start_submit(state, tx, api);
                }
            }
            Page::Submitted => leave_wizard(state),
        },
        ButtonFocus::Cancel => {
            if page == Page::Home {
                state.quit = true;
            } else if can_cancel(state) {
                state.modal = Some(Modal::ConfirmCancel);
                set_focused_button(state, ButtonFocus::Next);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn focus_prefix(state: &TuiState, idx: usize) -> &'static str {
    if matches!(state.focus, FocusTarget::Field(i) if i == idx) {
        ">"
    } else {
        " "
    }
}

fn is_field_focused(state: &TuiState, idx: usize) -> bool {
    matches!(state.focus, FocusTarget::Field(i) if i == idx)
}

fn error_line(error: Option<&str>) -> Option<Line<'static>> {
    error.map(|e| {
        Line::from(Span::styled(
            format!("    ! {}", e),
            Style::default().fg(Color::Red),
        ))
    })
}

fn checkbox(on: bool) -> &'static str {
    if on {
        "[x]"
    } else {
        "[ ]"
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame<'_>, state: &TuiState) {
    let window_area = centered_window(area, 100, 30);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Explorer Circle");
    f.render_widget(outer_block, window_area);

    // Inner layout: banner + content + buttons row
    let inner = window_area.inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(inner);

    let body = rows[0];
    let buttons = rows[1];

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(0)].as_ref())
        .split(body);

    let page = current_page(state);
    draw_banner(f, cols[0], state, page);

    let content_text = match page {
        Page::Home => home_text(),
        Page::Profile => profile_text(state),
        Page::Trip => trip_text(state),
        Page::Consent => consent_text(state),
        Page::Submitted => submitted_text(state),
    };

    let content_block = Block::default()
        .borders(Borders::ALL)
        .title(page_title(page));
    f.render_widget(content_block, cols[1]);
    let content_inner = cols[1].inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let content = Paragraph::new(content_text)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });
    f.render_widget(content, content_inner);

    draw_buttons(f, buttons, state, page);

    if state.chat_open {
        draw_chat_panel(f, window_area, state);
    }

    if let Some(modal) = state.modal.as_ref() {
        match modal {
            Modal::ConfirmCancel => draw_cancel_modal(f, window_area, state),
        }
    }
}

fn draw_banner(f: &mut ratatui::Frame<'_>, area: Rect, state: &TuiState, page: Page) {
    let mut lines: Vec<Line> = BANNER.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));

    let active = match page {
        Page::Profile => Some(WizardStep::Profile),
        Page::Trip => Some(WizardStep::Trip),
        Page::Consent | Page::Submitted => Some(WizardStep::Consent),
        Page::Home => None,
    };
    for step in [WizardStep::Profile, WizardStep::Trip, WizardStep::Consent] {
        let marker = if Some(step) == active { ">" } else { " " };
        let text = format!(" {} {}. {}", marker, step.number(), step.title());
        let style = if Some(step) == active {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    lines.push(Line::from(""));
    let chat_hint = if state.chat_open {
        "  F2  Hide chat"
    } else {
        "  F2  Chat with us"
    };
    lines.push(Line::from(chat_hint));

    let p = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn home_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Discover Uganda with the Explorer Circle."),
        Line::from(""),
        Line::from("Tell us about yourself and your dream trip in three short steps and"),
        Line::from("one of our travel consultants will craft an itinerary just for you."),
        Line::from(""),
        Line::from("Press Enter to start planning, F2 to ask us a question, Esc to quit."),
    ])
}

fn profile_text(state: &TuiState) -> Text<'static> {
    let p = &state.session.profile;
    let mut lines = Vec::new();

    let text_row = |lines: &mut Vec<Line<'static>>, idx: usize, label: &str, input: &TextInput| {
        lines.push(Line::from(format!(
            "{} {}: {}",
            focus_prefix(state, idx),
            label,
            input.display(is_field_focused(state, idx))
        )));
    };

    text_row(&mut lines, 0, "Full name", &state.name);
    lines.extend(error_line(p.visible_error(ProfileField::Name)));
    text_row(&mut lines, 1, "Email", &state.email);
    lines.extend(error_line(p.visible_error(ProfileField::Email)));
    text_row(&mut lines, 2, "Phone", &state.phone);
    lines.extend(error_line(p.visible_error(ProfileField::Phone)));

    let chosen = if p.country().is_empty() {
        "(none)".to_string()
    } else {
        p.country().to_string()
    };
    lines.push(Line::from(format!(
        "{} Country of residence: {}   search: {}",
        focus_prefix(state, 3),
        chosen,
        state.country_search.display(is_field_focused(state, 3))
    )));
    if is_field_focused(state, 3) {
        for (i, c) in p.country_options().iter().take(5).enumerate() {
            let marker = if i == state.country_index { "*" } else { " " };
            lines.push(Line::from(format!(
                "    {} {} ({})",
                marker, c.name, c.dial_code
            )));
        }
    }
    lines.extend(error_line(p.visible_error(ProfileField::Country)));

    let been = match p.been_to_africa() {
        Some(true) => "(x) Yes  ( ) No",
        Some(false) => "( ) Yes  (x) No",
        None => "( ) Yes  ( ) No",
    };
    lines.push(Line::from(format!(
        "{} Been to Africa before? {}",
        focus_prefix(state, 4),
        been
    )));
    lines.extend(error_line(p.visible_error(ProfileField::BeenToAfrica)));

    let chosen_types: Vec<&str> = p.traveller_types().iter().map(|t| t.as_str()).collect();
    lines.push(Line::from(format!(
        "{} Traveller type (up to 3): {}",
        focus_prefix(state, 5),
        chosen_types.join(", ")
    )));
    if is_field_focused(state, 5) {
        for (i, t) in TravellerType::ALL.iter().enumerate() {
            let marker = if i == state.traveller_index { "*" } else { " " };
            let mut style = Style::default();
            if p.is_traveller_type_disabled(*t) {
                style = style.fg(Color::DarkGray);
            }
            lines.push(Line::from(Span::styled(
                format!(
                    "    {} {} {}",
                    marker,
                    checkbox(p.traveller_types().contains(t)),
                    t.as_str()
                ),
                style,
            )));
        }
    }
    lines.extend(error_line(p.visible_error(ProfileField::TravellerType)));

    lines.push(Line::from(format!(
        "{} How did you hear about us? {}",
        focus_prefix(state, 6),
        p.hear_about_us().map(|h| h.as_str()).unwrap_or("(choose)")
    )));
    lines.push(Line::from(format!(
        "{} Feature me as a pioneer traveller: {}",
        focus_prefix(state, 7),
        p.pioneer_traveller()
            .map(|v| v.as_str())
            .unwrap_or("(choose)")
    )));

    let upload = match p.upload_status() {
        UploadStatus::Idle => match p.photo_url() {
            Some(url) => format!("current photo: {}", url),
            None => "optional".to_string(),
        },
        UploadStatus::Uploading { file_name, .. } => format!("uploading {}...", file_name),
        UploadStatus::Succeeded { url } => format!("uploaded: {}", url),
        UploadStatus::Failed { message } => format!("upload failed: {}", message),
    };
    lines.push(Line::from(format!(
        "{} Travel photo path: {}  ({})",
        focus_prefix(state, 8),
        state.photo_path.display(is_field_focused(state, 8)),
        upload
    )));
    lines.extend(error_line(p.visible_error(ProfileField::Photo)));

    push_status_line(&mut lines, state);
    Text::from(lines)
}

fn trip_text(state: &TuiState) -> Text<'static> {
    let t = &state.session.trip;
    let mut lines = Vec::new();

    lines.push(Line::from(format!(
        "{} Start date (YYYY-MM-DD, from {}): {}",
        focus_prefix(state, 0),
        t.earliest_start().format("%Y-%m-%d"),
        state.start_date.display(is_field_focused(state, 0))
    )));
    lines.extend(error_line(t.visible_error(TripField::StartDate)));
    lines.push(Line::from(format!(
        "{} End date (YYYY-MM-DD): {}",
        focus_prefix(state, 1),
        state.end_date.display(is_field_focused(state, 1))
    )));
    lines.extend(error_line(t.visible_error(TripField::EndDate)));

    let chosen: Vec<&str> = t.experiences().iter().map(|e| e.as_str()).collect();
    lines.push(Line::from(format!(
        "{} Must-have experiences ({}/3): {}",
        focus_prefix(state, 2),
        chosen.len(),
        chosen.join(", ")
    )));
    if is_field_focused(state, 2) {
        for (i, e) in Experience::ALL.iter().enumerate() {
            let marker = if i == state.experience_index { "*" } else { " " };
            let mut style = Style::default();
            if t.is_experience_disabled(*e) {
                style = style.fg(Color::DarkGray);
            }
            lines.push(Line::from(Span::styled(
                format!(
                    "    {} {} {}",
                    marker,
                    checkbox(t.experiences().contains(e)),
                    e.as_str()
                ),
                style,
            )));
        }
    }
    lines.extend(error_line(t.visible_error(TripField::Experiences)));

    lines.push(Line::from(format!(
        "{} Travelling with: {}",
        focus_prefix(state, 3),
        t.companion().map(|c| c.as_str()).unwrap_or("(choose)")
    )));
    lines.extend(error_line(t.visible_error(TripField::Companion)));
    if t.companion().map(|c| c.needs_count()).unwrap_or(false) {
        lines.push(Line::from(format!(
            "{} How many travellers? {}",
            focus_prefix(state, 4),
            state.companion_count.display(is_field_focused(state, 4))
        )));
        lines.extend(error_line(t.visible_error(TripField::CompanionCount)));
    }

    lines.push(Line::from(format!(
        "{} Your dream escape in a few words: {}",
        focus_prefix(state, 5),
        state.dream_words.display(is_field_focused(state, 5))
    )));
    lines.extend(error_line(t.visible_error(TripField::DreamWords)));
    lines.push(Line::from(format!(
        "{} Accessibility or dietary needs: {}",
        focus_prefix(state, 6),
        state.special_requirements.display(is_field_focused(state, 6))
    )));
    lines.extend(error_line(t.visible_error(TripField::SpecialRequirements)));

    push_status_line(&mut lines, state);
    Text::from(lines)
}

fn consent_text(state: &TuiState) -> Text<'static> {
    let c = &state.session.consent;
    let mut lines = vec![
        Line::from("Join the Explorer Circle: early access to new trips, insider tips"),
        Line::from("and seasonal offers for our first travellers."),
        Line::from(""),
        Line::from(format!(
            "{} {} Keep me updated by email",
            focus_prefix(state, 0),
            checkbox(c.keep_updated())
        )),
        Line::from(""),
    ];

    match c.status() {
        SubmissionStatus::Idle => {
            lines.push(Line::from("Select Submit to send your answers."));
        }
        SubmissionStatus::Submitting => {
            lines.push(Line::from("Submitting..."));
        }
        SubmissionStatus::Failed { lines: failure } => {
            for l in failure {
                lines.push(Line::from(Span::styled(
                    l.clone(),
                    Style::default().fg(Color::Red),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from("Fix anything above and select Submit to try again."));
        }
        SubmissionStatus::Submitted(_) => {}
    }

    push_status_line(&mut lines, state);
    Text::from(lines)
}

fn submitted_text(state: &TuiState) -> Text<'static> {
    let SubmissionStatus::Submitted(receipt) = state.session.consent.status() else {
        return Text::from("");
    };
    let mut lines = vec![
        Line::from("Thank you! Your dream trip request has been received."),
        Line::from(""),
        Line::from(format!("Reference number: {}", receipt.reference_number)),
    ];
    if let Some(eta) = receipt.estimated_response_time.as_ref() {
        lines.push(Line::from(format!("Expect to hear from us within {}.", eta)));
    }
    if !receipt.next_steps.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from("What happens next:"));
        for (i, step) in receipt.next_steps.iter().enumerate() {
            lines.push(Line::from(format!("  {}. {}", i + 1, step)));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Select Close to finish."));
    Text::from(lines)
}

fn push_status_line(lines: &mut Vec<Line<'static>>, state: &TuiState) {
    if let Some(s) = state.status_line.as_ref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            s.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }
}

fn centered_window(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(2)).max(60).min(area.width);
    let h = height.min(area.height.saturating_sub(2)).max(20).min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

fn draw_buttons(f: &mut ratatui::Frame<'_>, area: Rect, state: &TuiState, page: Page) {
    let back = button_text(
        "Back",
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Back)),
        can_go_back(state),
    );
    let next = button_text(
        next_label(page),
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Next)),
        can_go_next(state),
    );
    let cancel = button_text(
        cancel_label(page),
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Cancel)),
        can_cancel(state),
    );

    let line = Line::from(vec![back, Span::raw(" "), next, Span::raw(" "), cancel]);

    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, area);
}

fn button_text(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default();
    if !enabled {
        style = style.fg(Color::DarkGray);
    }
    if focused && enabled {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(format!("[ {} ]", label), style)
}

fn draw_chat_panel(f: &mut ratatui::Frame<'_>, window_area: Rect, state: &TuiState) {
    let w = 60u16.min(window_area.width.saturating_sub(4));
    let h = window_area.height.saturating_sub(4);
    let area = Rect {
        x: window_area.x + window_area.width.saturating_sub(w + 2),
        y: window_area.y + 2,
        width: w,
        height: h,
    };

    let chat = &state.session.chat;
    let mut lines = Vec::new();
    // Leave room for the handoff link.
    let visible = if state.chat_handoff.is_some() {
        2
    } else {
        CHAT_VISIBLE_MESSAGES
    };
    let skip = chat.messages().len().saturating_sub(visible);
    for m in chat.messages().iter().skip(skip) {
        let who = if m.is_bot { "Assistant" } else { "You" };
        let style = if m.is_bot {
            Style::default()
        } else {
            Style::default().fg(Color::Cyan)
        };
        lines.push(Line::from(Span::styled(
            format!("[{}] {}: {}", m.timestamp, who, m.content),
            style,
        )));
    }

    if chat.is_typing() {
        lines.push(Line::from(Span::styled(
            "Assistant is typing...",
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    if let Some(prompt) = chat.prompt() {
        if !chat.is_typing() {
            lines.push(Line::from(""));
            lines.push(Line::from(prompt));
        }
    }

    let options = chat_options(chat);
    if !options.is_empty() {
        lines.push(Line::from(""));
        for (i, o) in options.iter().enumerate() {
            let style = if i == state.chat_index {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!("  {}", o), style)));
        }
    }

    if let Some(url) = state.chat_handoff.as_ref() {
        lines.push(Line::from(""));
        if state.chat_handoff_opened {
            lines.push(Line::from(
                "WhatsApp opened in your browser. If it did not appear, open this link:",
            ));
        } else {
            lines.push(Line::from(
                "Open this link in your browser to chat with a travel consultant on WhatsApp:",
            ));
        }
        lines.push(Line::from(url.clone()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Explorer Circle assistant (Esc to close)");
    let p = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn draw_cancel_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, state: &TuiState) {
    let modal_w = 56u16.min(window_area.width.saturating_sub(4)).max(40);
    let modal_h = 7u16;
    let x = window_area.x + (window_area.width.saturating_sub(modal_w)) / 2;
    let y = window_area.y + (window_area.height.saturating_sub(modal_h)) / 2;
    let area = Rect {
        x,
        y,
        width: modal_w,
        height: modal_h,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Leave the trip planner?");
    let body = Paragraph::new(Text::from(vec![
        Line::from("Your answers will be cleared if you leave now."),
        Line::from(""),
        Line::from(""),
    ]))
    .block(block)
    .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(body, area);

    // Buttons: [Yes, leave] [No] (primary on right)
    let buttons_area = Rect {
        x: area.x + 1,
        y: area.y + area.height - 2,
        width: area.width - 2,
        height: 1,
    };

    let reversed_if = |on: bool| {
        if on {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        }
    };
    let yes = Span::styled(
        "[ Yes, leave ]",
        reversed_if(focused_button(state) == ButtonFocus::Cancel),
    );
    let no = Span::styled("[ No ]", reversed_if(focused_button(state) == ButtonFocus::Next));

    let line = Line::from(vec![yes, Span::raw(" "), no]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, buttons_area);
}
