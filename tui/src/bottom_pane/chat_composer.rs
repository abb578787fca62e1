//! The chat composer is the bottom-pane text input state machine.
//!
//! It owns exactly three pieces of state:
//!
//! - the draft (a [`TextArea`]), edited verbatim on every key or paste,
//! - a single attachment slot holding one encoded image (usually a `data:` URI),
//! - the externally owned `disabled` flag, mirrored here so the gate can read it.
//!
//! # Submission Gate
//!
//! [`ChatComposer::try_send`] is the only place a message is built. It succeeds when the
//! composer is enabled and the draft is non-empty after trimming; otherwise it is a silent no-op.
//! The payload uses the *untrimmed* draft. With an attachment the payload is exactly two parts
//! (text, then image). After a send the attachment slot is always emptied; the draft is emptied
//! only when the composer was configured with `clear_on_send`.
//!
//! Readiness is never stored. [`ChatComposer::can_send`] recomputes it from the draft and the
//! disabled flag on every call, so the footer affordance and the gate cannot disagree.
//!
//! # Enter Handling
//!
//! - <kbd>Enter</kbd> goes through the gate and never inserts a newline.
//! - <kbd>Shift</kbd>+<kbd>Enter</kbd> (or <kbd>Alt</kbd>+<kbd>Enter</kbd>, or
//!   <kbd>Ctrl</kbd>+<kbd>J</kbd>, for terminals that cannot report Shift+Enter) inserts a
//!   literal newline and never sends.
//! - While an input method is composing (see [`ChatComposer::set_ime_composing`]), Enter belongs
//!   to the IME: nothing is sent and nothing is inserted.
//!
//! # Attachment Pipeline
//!
//! [`ChatComposer::attach_file`] does not encode anything itself. It issues a request number and
//! emits [`AppEvent::StartImageEncode`]; the app loop runs the encode in the background and feeds
//! the outcome back through [`ChatComposer::on_image_encoded`] or
//! [`ChatComposer::on_image_encode_failed`]. A completion only writes the slot when no newer
//! request has already written it, so overlapping attaches resolve to the most recent pick.
//! Failures leave the slot untouched and are only logged.
//!
//! Sending while an encode is in flight sends without the image; the image lands in the slot
//! afterwards and rides along with the next message.
//!
//! # Auto-Sizing
//!
//! [`Renderable::desired_height`] grows with the wrapped draft up to `max_input_height` rows.
//! Past that the text area keeps its height and scrolls to follow the cursor.
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use quill_protocol::ConversationId;
use quill_protocol::message::MessageContent;
use quill_protocol::message::OutgoingMessage;
use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::StatefulWidgetRef;
use ratatui::widgets::Widget;

use super::ActionButton;
use super::footer::FooterMode;
use super::footer::FooterProps;
use super::footer::footer_height;
use super::footer::render_footer;
use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::bottom_pane::textarea::TextArea;
use crate::bottom_pane::textarea::TextAreaState;
use crate::clipboard_paste::pasted_image_path;
use crate::host_settings::HostSettings;
use crate::host_settings::StaticHostSettings;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::render::Insets;
use crate::render::RectExt;
use crate::render::renderable::Renderable;
use crate::style::attachment_style;
use crate::style::composer_style;
use crate::theme::Theme;
use crate::ui_consts::LIVE_PREFIX_COLS;

pub const DEFAULT_PLACEHOLDER: &str = "Type your question...";

/// Upper bound on the rows the input grows to before it starts scrolling.
pub const DEFAULT_MAX_INPUT_HEIGHT: u16 = 200;

pub const REMOVE_ATTACHMENT_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('x'));

/// Result returned when the user interacts with the composer.
#[derive(Debug, PartialEq)]
pub enum InputResult {
    Submitted(OutgoingMessage),
    None,
}

/// Construction-time configuration of a [`ChatComposer`].
pub struct ComposerParams {
    pub app_event_tx: AppEventSender,
    pub placeholder_text: Option<String>,
    pub clear_on_send: bool,
    pub target: Option<ConversationId>,
    pub disabled: bool,
    pub action_buttons: Vec<ActionButton>,
    pub host_settings: Arc<dyn HostSettings>,
    pub max_input_height: u16,
    pub theme: Theme,
}

impl ComposerParams {
    pub fn new(app_event_tx: AppEventSender) -> Self {
        Self {
            app_event_tx,
            placeholder_text: None,
            clear_on_send: false,
            target: None,
            disabled: false,
            action_buttons: Vec::new(),
            host_settings: Arc::new(StaticHostSettings::default()),
            max_input_height: DEFAULT_MAX_INPUT_HEIGHT,
            theme: Theme::default(),
        }
    }
}

/// Single-image slot plus the bookkeeping that orders overlapping encode requests.
#[derive(Debug, Default)]
struct AttachmentSlot {
    data_url: Option<String>,
    last_issued: u64,
    last_applied: u64,
    in_flight: BTreeSet<u64>,
}

impl AttachmentSlot {
    fn issue(&mut self) -> u64 {
        self.last_issued += 1;
        self.in_flight.insert(self.last_issued);
        self.last_issued
    }

    fn complete(&mut self, seq: u64, data_url: String) -> bool {
        self.in_flight.remove(&seq);
        if seq < self.last_applied {
            return false;
        }
        self.last_applied = seq;
        self.data_url = Some(data_url);
        true
    }

    fn fail(&mut self, seq: u64) {
        self.in_flight.remove(&seq);
    }

    fn clear(&mut self) {
        self.data_url = None;
    }
}

pub struct ChatComposer {
    textarea: TextArea,
    textarea_state: RefCell<TextAreaState>,
    app_event_tx: AppEventSender,
    placeholder_text: String,
    clear_on_send: bool,
    target: Option<ConversationId>,
    disabled: bool,
    ime_composing: bool,
    attachment: AttachmentSlot,
    action_buttons: Vec<ActionButton>,
    host_settings: Arc<dyn HostSettings>,
    max_input_height: u16,
    theme: Theme,
    quit_shortcut_expires_at: Option<Instant>,
    quit_shortcut_key: KeyBinding,
}

impl ChatComposer {
    pub fn new(params: ComposerParams) -> Self {
        let ComposerParams {
            app_event_tx,
            placeholder_text,
            clear_on_send,
            target,
            disabled,
            action_buttons,
            host_settings,
            max_input_height,
            theme,
        } = params;

        Self {
            textarea: TextArea::new(),
            textarea_state: RefCell::new(TextAreaState::default()),
            app_event_tx,
            placeholder_text: placeholder_text
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
            clear_on_send,
            target,
            disabled,
            ime_composing: false,
            attachment: AttachmentSlot::default(),
            action_buttons,
            host_settings,
            max_input_height: max_input_height.max(1),
            theme,
            quit_shortcut_expires_at: None,
            quit_shortcut_key: key_hint::ctrl(KeyCode::Char('c')),
        }
    }

    /// Returns true if the draft is empty.
    pub fn is_empty(&self) -> bool {
        self.textarea.is_empty()
    }

    /// The current draft, untrimmed.
    pub fn draft(&self) -> &str {
        self.textarea.text()
    }

    /// The encoded image waiting to be sent with the next message.
    pub fn attachment(&self) -> Option<&str> {
        self.attachment.data_url.as_deref()
    }

    /// Whether any image encode issued by this composer has not resolved yet.
    pub fn is_attaching(&self) -> bool {
        !self.attachment.in_flight.is_empty()
    }

    pub fn target(&self) -> Option<&ConversationId> {
        self.target.as_ref()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether [`ChatComposer::try_send`] would emit a message right now.
    pub fn can_send(&self) -> bool {
        !self.disabled && !self.textarea.text().trim().is_empty()
    }

    /// Run the submission gate.
    ///
    /// Returns [`InputResult::None`] without touching any state when the composer is disabled or
    /// the draft is blank.
    pub fn try_send(&mut self) -> InputResult {
        if !self.can_send() {
            tracing::debug!(
                disabled = self.disabled,
                "send refused: composer disabled or draft blank"
            );
            return InputResult::None;
        }

        let content = MessageContent::from_draft(self.textarea.text(), self.attachment());
        let message = OutgoingMessage::new(content, self.target.clone());
        tracing::debug!(
            with_image = message.content.image_url().is_some(),
            reply = self.target.is_some(),
            "composer submitted a message"
        );

        self.attachment.clear();
        if self.clear_on_send {
            self.textarea.set_text("");
            *self.textarea_state.borrow_mut() = TextAreaState::default();
        }
        InputResult::Submitted(message)
    }

    /// Handle a key event coming from the main UI.
    ///
    /// Returns the submission outcome and whether the composer needs a redraw.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> (InputResult, bool) {
        if key_event.kind == KeyEventKind::Release || self.disabled {
            return (InputResult::None, false);
        }
        self.quit_shortcut_expires_at = None;

        match key_event {
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } if self.ime_composing => (InputResult::None, false),
            KeyEvent {
                code: KeyCode::Enter,
                modifiers,
                ..
            } if modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
                self.textarea.insert_str("\n");
                (InputResult::None, true)
            }
            KeyEvent {
                code: KeyCode::Char('j'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.textarea.insert_str("\n");
                (InputResult::None, true)
            }
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => (self.try_send(), true),
            event if REMOVE_ATTACHMENT_KEY.is_press(event) => {
                self.remove_attachment();
                (InputResult::None, true)
            }
            input => {
                self.textarea.input(input);
                (InputResult::None, true)
            }
        }
    }

    /// Integrate pasted text into the composer.
    ///
    /// A paste that is exactly the path of an existing image file is treated as picking that
    /// file for attachment; anything else is inserted at the cursor.
    pub fn handle_paste(&mut self, pasted: String) -> bool {
        if self.disabled {
            return false;
        }
        if let Some(path) = pasted_image_path(&pasted) {
            self.attach_file(path);
        } else {
            self.textarea.insert_str(&pasted);
        }
        true
    }

    /// Request that the image at `path` be encoded into the attachment slot.
    ///
    /// Returns the request number echoed back by the completion event.
    pub fn attach_file(&mut self, path: PathBuf) -> u64 {
        let seq = self.attachment.issue();
        tracing::debug!("requesting image encode #{seq} for {}", path.display());
        self.app_event_tx
            .send(AppEvent::StartImageEncode { seq, path });
        seq
    }

    /// Integrate a finished encode. Returns whether the slot was updated.
    pub fn on_image_encoded(&mut self, seq: u64, data_url: String) -> bool {
        let applied = self.attachment.complete(seq, data_url);
        if !applied {
            tracing::debug!(
                "dropping image encode #{seq}: superseded by #{}",
                self.attachment.last_applied
            );
        }
        applied
    }

    pub fn on_image_encode_failed(&mut self, seq: u64) {
        tracing::debug!("image encode #{seq} failed; attachment left unchanged");
        self.attachment.fail(seq);
    }

    /// Empty the attachment slot. The draft is not affected.
    pub fn remove_attachment(&mut self) {
        self.attachment.clear();
    }

    /// Replace the entire draft with `text`; the cursor moves to the end.
    pub fn set_text_content(&mut self, text: String) {
        self.textarea.set_text(&text);
    }

    /// Discard the draft and any attachment, returning the discarded draft.
    pub fn clear_for_ctrl_c(&mut self) -> Option<String> {
        if self.is_empty() && self.attachment().is_none() {
            return None;
        }
        let previous = self.textarea.text().to_string();
        self.textarea.set_text("");
        *self.textarea_state.borrow_mut() = TextAreaState::default();
        self.attachment.clear();
        Some(previous)
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn set_target(&mut self, target: Option<ConversationId>) {
        self.target = target;
    }

    pub fn set_clear_on_send(&mut self, clear_on_send: bool) {
        self.clear_on_send = clear_on_send;
    }

    /// Tell the composer whether an input method is mid-composition.
    ///
    /// Terminals do not report IME state, so hosts that know it (e.g. an embedding GUI) forward
    /// it here.
    pub fn set_ime_composing(&mut self, composing: bool) {
        self.ime_composing = composing;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn set_action_buttons(&mut self, buttons: Vec<ActionButton>) {
        self.action_buttons = buttons;
    }

    pub fn action_buttons(&self) -> &[ActionButton] {
        &self.action_buttons
    }

    /// Show the transient "press again to quit" hint for `key`.
    pub fn show_quit_shortcut_hint(&mut self, key: KeyBinding) {
        self.quit_shortcut_expires_at = Some(Instant::now() + super::QUIT_SHORTCUT_TIMEOUT);
        self.quit_shortcut_key = key;
    }

    /// Whether the quit shortcut hint should currently be shown.
    pub fn quit_shortcut_hint_visible(&self) -> bool {
        self.quit_shortcut_expires_at
            .is_some_and(|expires_at| Instant::now() < expires_at)
    }

    fn footer_props(&self) -> FooterProps {
        FooterProps {
            mode: if self.quit_shortcut_hint_visible() {
                FooterMode::QuitShortcutReminder
            } else {
                FooterMode::ShortcutSummary
            },
            can_send: self.can_send(),
            disabled: self.disabled,
            data_grounding: self.host_settings.data_grounding_enabled(),
            quit_shortcut_key: self.quit_shortcut_key,
        }
    }

    fn attachment_row_height(&self) -> u16 {
        if self.attachment().is_some() || self.is_attaching() {
            1
        } else {
            0
        }
    }

    fn textarea_height(&self, width: u16) -> u16 {
        const COLS_WITH_MARGIN: u16 = LIVE_PREFIX_COLS + 1;
        self.textarea
            .desired_height(width.saturating_sub(COLS_WITH_MARGIN))
            .clamp(1, self.max_input_height)
    }

    /// `[composer, textarea, attachment row, footer]`
    fn layout_areas(&self, area: Rect) -> [Rect; 4] {
        let footer_rows = footer_height(self.footer_props());
        let [composer_rect, footer_rect] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(footer_rows)]).areas(area);
        let inner = composer_rect.inset(Insets::tlbr(1, LIVE_PREFIX_COLS, 1, 1));
        let [textarea_rect, attachment_rect] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(self.attachment_row_height()),
        ])
        .areas(inner);
        [composer_rect, textarea_rect, attachment_rect, footer_rect]
    }

    fn attachment_line(&self) -> Line<'static> {
        let mut spans: Vec<Span<'static>> = Vec::new();
        if let Some(data_url) = self.attachment() {
            spans.push(Span::styled(
                attachment_label(data_url),
                attachment_style(self.theme),
            ));
            spans.push("  ".into());
            spans.push(REMOVE_ATTACHMENT_KEY.into());
            spans.push(" remove".dim());
        }
        if self.is_attaching() {
            if !spans.is_empty() {
                spans.push("  ".into());
            }
            spans.push("attaching image…".dim().italic());
        }
        Line::from(spans)
    }
}

/// Short description of an encoded image, e.g. `[image/png · 12.3 KB]`.
fn attachment_label(data_url: &str) -> String {
    let Some((header, payload)) = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
    else {
        return "[image]".to_string();
    };
    let mime = header.split(';').next().unwrap_or_default();
    let mime = if mime.is_empty() { "image" } else { mime };
    let bytes = if header.ends_with(";base64") {
        payload.len() / 4 * 3
    } else {
        payload.len()
    };
    let kib = bytes as f64 / 1024.0;
    format!("[{mime} · {kib:.1} KB]")
}

impl Renderable for ChatComposer {
    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if self.disabled {
            return None;
        }
        let [_, textarea_rect, _, _] = self.layout_areas(area);
        let state = *self.textarea_state.borrow();
        self.textarea.cursor_pos_with_state(textarea_rect, state)
    }

    fn desired_height(&self, width: u16) -> u16 {
        self.textarea_height(width)
            + self.attachment_row_height()
            + 2
            + footer_height(self.footer_props())
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        let [composer_rect, textarea_rect, attachment_rect, footer_rect] =
            self.layout_areas(area);

        Block::default()
            .style(composer_style(self.theme))
            .render(composer_rect, buf);

        if !textarea_rect.is_empty() {
            let prompt = if self.disabled {
                "›".dim()
            } else {
                "›".bold()
            };
            buf.set_span(
                textarea_rect.x.saturating_sub(LIVE_PREFIX_COLS),
                textarea_rect.y,
                &prompt,
                LIVE_PREFIX_COLS,
            );
        }

        let mut state = self.textarea_state.borrow_mut();
        StatefulWidgetRef::render_ref(&(&self.textarea), textarea_rect, buf, &mut state);
        if self.textarea.is_empty() {
            Line::from(self.placeholder_text.clone().dim()).render(textarea_rect, buf);
        }

        if !attachment_rect.is_empty() {
            self.attachment_line().render(attachment_rect, buf);
        }

        render_footer(
            footer_rect,
            buf,
            self.footer_props(),
            &self.action_buttons,
        );
    }
}
