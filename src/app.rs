use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nanoid::nanoid;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::amount::{Amount, AmountParseError};
use crate::config::Config;
use crate::envelope::{Envelope, EnvelopeId, EnvelopeStore};
use crate::error::GameError;
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::mock;
use crate::screen::{HomeAction, Nav, Screen};
use crate::timer::Delayed;

const MAX_MESSAGES: usize = 5;
const MAX_HISTORY: usize = 32;
const MAX_AMOUNT_CHARS: usize = 12;
const MAX_COUNT_DIGITS: usize = 6;
const MAX_GREETING_CHARS: usize = 60;
const LUCKY_LINES: &[&str] = &["手气不错！", "恭喜发财！"];
const RECEIPT_ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J',
    'K', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W', 'X', 'Y', 'Z',
];

/// Smallest pot the create form accepts.
pub const MIN_CREATE_AMOUNT: Amount = Amount::from_yuan(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormField {
    #[default]
    Amount,
    Count,
    Message,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Amount => FormField::Count,
            FormField::Count => FormField::Message,
            FormField::Message => FormField::Amount,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Amount => FormField::Message,
            FormField::Count => FormField::Amount,
            FormField::Message => FormField::Count,
        }
    }
}

/// A validated create request, waiting for its delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeRequest {
    pub total_amount: Amount,
    pub share_count: u32,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct CreateForm {
    pub amount: String,
    pub count: String,
    pub message: String,
    pub focus: FormField,
}

impl CreateForm {
    fn input(&mut self, ch: char) {
        match self.focus {
            FormField::Amount => {
                let decimals = self.amount.split_once('.').map(|(_, frac)| frac.len());
                let accepted = match (ch, decimals) {
                    ('.', None) => true,
                    ('0'..='9', None) => true,
                    ('0'..='9', Some(len)) => len < 2,
                    _ => false,
                };
                if accepted && self.amount.len() < MAX_AMOUNT_CHARS {
                    self.amount.push(ch);
                }
            }
            FormField::Count => {
                if ch.is_ascii_digit() && self.count.len() < MAX_COUNT_DIGITS {
                    self.count.push(ch);
                }
            }
            FormField::Message => {
                if !ch.is_control() && self.message.chars().count() < MAX_GREETING_CHARS {
                    self.message.push(ch);
                }
            }
        }
    }

    fn backspace(&mut self) {
        let field = match self.focus {
            FormField::Amount => &mut self.amount,
            FormField::Count => &mut self.count,
            FormField::Message => &mut self.message,
        };
        field.pop();
    }

    /// Both required fields hold something.
    pub fn is_filled(&self) -> bool {
        !self.amount.is_empty() && !self.count.is_empty()
    }

    pub fn parse(&self) -> Result<EnvelopeRequest, GameError> {
        let total_amount: Amount = self
            .amount
            .parse()
            .map_err(|err: AmountParseError| GameError::validation("amount", err.to_string()))?;
        if total_amount < MIN_CREATE_AMOUNT {
            return Err(GameError::validation(
                "amount",
                format!("must be at least {MIN_CREATE_AMOUNT}"),
            ));
        }
        let share_count: u32 = self
            .count
            .trim()
            .parse()
            .map_err(|_| GameError::validation("count", "must be a whole number"))?;
        if share_count == 0 {
            return Err(GameError::validation("count", "must be at least 1"));
        }
        Ok(EnvelopeRequest {
            total_amount,
            share_count,
            message: self.message.trim().to_string(),
        })
    }

    pub fn average_preview(&self) -> Option<Amount> {
        self.parse()
            .ok()
            .map(|request| request.total_amount.per_share(request.share_count))
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Create(EnvelopeRequest),
    Grab(EnvelopeId),
}

#[derive(Debug, Clone, Serialize)]
pub struct GrabRecord {
    pub receipt: String,
    pub envelope_id: EnvelopeId,
    pub player: String,
    pub amount: Amount,
    pub grabbed_at: DateTime<Utc>,
    pub emptied: bool,
}

impl GrabRecord {
    pub fn grabbed_local(&self) -> DateTime<Local> {
        self.grabbed_at.with_timezone(&Local)
    }
}

/// The result card shown between a grab and the leaderboard.
#[derive(Debug, Clone)]
pub struct GrabReveal {
    pub record: GrabRecord,
    pub line: &'static str,
}

#[derive(Debug, Default)]
pub struct GrabState {
    pub selected: usize,
}

impl GrabState {
    fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1) % len;
    }

    fn select_previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        if self.selected == 0 {
            self.selected = len - 1;
        } else {
            self.selected -= 1;
        }
    }

    fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub screen: Screen,
    pub envelopes: &'a [Envelope],
    pub leaderboard: &'a [LeaderboardEntry],
}

pub struct App {
    pub config: Config,
    pub screen: Screen,
    pub should_quit: bool,
    pub home: HomeAction,
    pub form: CreateForm,
    pub grab: GrabState,
    pub envelopes: EnvelopeStore,
    pub leaderboard: Leaderboard,
    pub leaderboard_scroll: usize,
    pub history: Vec<GrabRecord>,
    pub messages: VecDeque<String>,
    pub spinner: usize,
    pending: Option<Delayed<PendingAction>>,
    reveal: Option<Delayed<GrabReveal>>,
    rng: StdRng,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut envelopes = EnvelopeStore::new(config.payout_mode);
        let leaderboard = if config.mock_data {
            mock::seed_envelopes(&mut envelopes);
            mock::seed_leaderboard()
        } else {
            Leaderboard::new()
        };
        info!(
            player = %config.player_name,
            payout_mode = config.payout_mode.label(),
            mock_data = config.mock_data,
            "session started"
        );

        Ok(Self {
            config,
            screen: Screen::default(),
            should_quit: false,
            home: HomeAction::default(),
            form: CreateForm::default(),
            grab: GrabState::default(),
            envelopes,
            leaderboard,
            leaderboard_scroll: 0,
            history: Vec::new(),
            messages: VecDeque::new(),
            spinner: 0,
            pending: None,
            reveal: None,
            rng,
        })
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref().and_then(Delayed::payload)
    }

    pub fn pending_ratio(&self) -> f64 {
        self.pending.as_ref().map_or(0.0, Delayed::ratio)
    }

    pub fn is_creating(&self) -> bool {
        matches!(self.pending(), Some(PendingAction::Create(_)))
    }

    pub fn grabbing(&self) -> Option<EnvelopeId> {
        match self.pending() {
            Some(PendingAction::Grab(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn reveal(&self) -> Option<&GrabReveal> {
        self.reveal.as_ref().and_then(Delayed::payload)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            screen: self.screen,
            envelopes: self.envelopes.active(),
            leaderboard: self.leaderboard.entries(),
        }
    }

    pub fn on_tick(&mut self, dt: Duration) {
        self.spinner = self.spinner.wrapping_add(1);

        if self.reveal.as_mut().and_then(|r| r.advance(dt)).is_some() {
            self.acknowledge_reveal();
        }

        if let Some(action) = self.pending.as_mut().and_then(|p| p.advance(dt)) {
            self.pending = None;
            match action {
                PendingAction::Create(request) => self.finish_create(request),
                PendingAction::Grab(id) => self.finish_grab(id),
            }
        }
    }

    fn push_message(&mut self, msg: impl Into<String>) {
        self.messages.push_front(msg.into());
        while self.messages.len() > MAX_MESSAGES {
            self.messages.pop_back();
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c')) {
            self.should_quit = true;
            return;
        }
        // the create form takes free text, so `q` only quits elsewhere
        if self.screen != Screen::Create && matches!(key.code, KeyCode::Char('q' | 'Q')) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Home => self.handle_home_input(key),
            Screen::Create => self.handle_create_input(key),
            Screen::Grab => self.handle_grab_input(key),
            Screen::Leaderboard => self.handle_leaderboard_input(key),
        }
    }

    fn handle_home_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Left | KeyCode::BackTab => self.home = self.home.prev(),
            KeyCode::Down | KeyCode::Right | KeyCode::Tab => self.home = self.home.next(),
            KeyCode::Enter => self.navigate(self.home.nav()),
            KeyCode::Char('1' | 'c') => self.navigate(Nav::OpenCreate),
            KeyCode::Char('2' | 'g') => self.navigate(Nav::OpenGrab),
            KeyCode::Char('3' | 'l') => self.navigate(Nav::OpenLeaderboard),
            _ => {}
        }
    }

    fn handle_create_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.navigate(Nav::Back),
            KeyCode::Tab | KeyCode::Down => self.form.focus = self.form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus = self.form.focus.prev(),
            KeyCode::Enter => self.submit_create(),
            KeyCode::Backspace if !self.is_creating() => self.form.backspace(),
            KeyCode::Char(ch) if !self.is_creating() => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.form.input(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_grab_input(&mut self, key: KeyEvent) {
        if self.reveal.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.acknowledge_reveal();
            }
            return;
        }
        let len = self.envelopes.len();
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => self.navigate(Nav::Back),
            KeyCode::Up => self.grab.select_previous(len),
            KeyCode::Down => self.grab.select_next(len),
            KeyCode::Enter | KeyCode::Char(' ') => self.grab_selected(),
            _ => {}
        }
    }

    fn handle_leaderboard_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => self.navigate(Nav::Back),
            KeyCode::Up => self.leaderboard_scroll = self.leaderboard_scroll.saturating_sub(1),
            KeyCode::Down => {
                if self.leaderboard_scroll + 1 < self.leaderboard.len() {
                    self.leaderboard_scroll += 1;
                }
            }
            _ => {}
        }
    }

    /// Schedules the create if the form is complete and valid; otherwise the submit stays disabled.
    pub fn submit_create(&mut self) {
        if self.screen != Screen::Create || self.pending.is_some() {
            return;
        }
        match self.form.parse() {
            Ok(request) => {
                debug!(
                    amount = %request.total_amount,
                    count = request.share_count,
                    "create scheduled"
                );
                self.pending = Some(Delayed::new(
                    self.config.create_delay(),
                    PendingAction::Create(request),
                ));
            }
            Err(err) => debug!(%err, "create submit ignored"),
        }
    }

    /// Schedules a grab of the highlighted red packet. One action is in flight at a time.
    pub fn grab_selected(&mut self) {
        if self.screen != Screen::Grab || self.pending.is_some() || self.reveal.is_some() {
            return;
        }
        let Some(envelope) = self.envelopes.active().get(self.grab.selected) else {
            return;
        };
        let id = envelope.id();
        debug!(%id, "grab scheduled");
        self.pending = Some(Delayed::new(
            self.config.grab_delay(),
            PendingAction::Grab(id),
        ));
    }

    fn finish_create(&mut self, request: EnvelopeRequest) {
        let created = self
            .envelopes
            .create(
                &self.config.player_name,
                request.total_amount,
                request.share_count,
                &request.message,
            )
            .map(|envelope| envelope.id());
        match created {
            Ok(id) => {
                self.push_message(format!(
                    "红包 {} 已发出: {} / {} 个",
                    id,
                    format_yuan(request.total_amount),
                    request.share_count
                ));
                self.form.clear();
                self.navigate(Nav::Submitted);
                self.log_snapshot();
            }
            Err(err) => {
                warn!(%err, "red packet rejected");
                self.push_message(format!("创建失败: {err}"));
            }
        }
    }

    fn finish_grab(&mut self, id: EnvelopeId) {
        let outcome = match self.envelopes.grab(id, &mut self.rng) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, "grab failed");
                self.push_message(format!("抢夺失败: {err}"));
                return;
            }
        };
        self.leaderboard.record_win(
            &self.config.player_name,
            outcome.amount,
            &self.config.player_avatar,
        );

        let record = GrabRecord {
            receipt: generate_receipt(id, outcome.amount),
            envelope_id: id,
            player: self.config.player_name.clone(),
            amount: outcome.amount,
            grabbed_at: Utc::now(),
            emptied: outcome.depleted,
        };
        info!(
            receipt = %record.receipt,
            %id,
            amount = %outcome.amount,
            remaining = outcome.remaining_shares,
            "red packet grabbed"
        );
        self.push_message(format!(
            "{} 抢到 {} ({})",
            id,
            format_yuan(outcome.amount),
            record.receipt
        ));
        self.history.insert(0, record.clone());
        self.history.truncate(MAX_HISTORY);
        self.grab.clamp(self.envelopes.len());

        let line = LUCKY_LINES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("恭喜发财！");
        self.reveal = Some(Delayed::new(
            self.config.result_delay(),
            GrabReveal { record, line },
        ));
        self.log_snapshot();
    }

    fn acknowledge_reveal(&mut self) {
        self.reveal = None;
        self.leaderboard_scroll = 0;
        self.navigate(Nav::GrabAcknowledged);
    }

    fn navigate(&mut self, nav: Nav) {
        let from = self.screen;
        let Some(to) = from.transition(nav) else {
            debug!(?from, ?nav, "navigation ignored");
            return;
        };
        // anything still counting down belongs to the screen being left
        if let Some(pending) = self.pending.take() {
            info!(?from, action = ?pending.payload(), "pending action cancelled");
            self.push_message("操作已取消");
        }
        self.reveal = None;
        self.screen = to;
        if to == Screen::Grab {
            self.grab.clamp(self.envelopes.len());
        }
        debug!(?from, ?to, "screen changed");
    }

    fn log_snapshot(&self) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        match serde_json::to_string(&self.snapshot()) {
            Ok(json) => debug!(snapshot = %json, "state"),
            Err(err) => warn!(%err, "failed to serialize snapshot"),
        }
    }
}

fn generate_receipt(id: EnvelopeId, amount: Amount) -> String {
    let magnitude = amount.cents().max(1).ilog10().min(15);
    let body = nanoid!(6, RECEIPT_ALPHABET);
    let core = format!("HB{:X}{:X}-{}", id.get() % 16, magnitude, body);
    format!("{}-{}", core, receipt_checksum(&core))
}

fn receipt_checksum(core: &str) -> char {
    let hash = blake3::hash(core.as_bytes());
    let nibble = u32::from(hash.as_bytes()[0] >> 4);
    std::char::from_digit(nibble, 16)
        .unwrap_or('0')
        .to_ascii_uppercase()
}

/// True when the trailing character of a receipt matches the rest of it.
pub fn receipt_is_valid(receipt: &str) -> bool {
    match receipt.rsplit_once('-') {
        Some((core, check)) => {
            let mut chars = check.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c == receipt_checksum(core))
        }
        None => false,
    }
}

pub fn format_yuan(amount: Amount) -> String {
    format!("¥{amount}")
}
