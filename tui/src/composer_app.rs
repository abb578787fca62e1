//! Interactive composer session.
//!
//! A transcript of sent messages sits above the composer. Everything that mutates the composer
//! runs on the single loop in [`run_composer_app`]; image encodes are the only work that leaves
//! it, and their outcomes come back as [`AppEvent`]s on the same loop.

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use quill_protocol::ConversationId;
use quill_protocol::message::OutgoingMessage;
use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::text::Text;
use ratatui::widgets::Clear;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::StreamExt;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::bottom_pane::ActionButton;
use crate::bottom_pane::ChatComposer;
use crate::bottom_pane::ComposerParams;
use crate::bottom_pane::DEFAULT_MAX_INPUT_HEIGHT;
use crate::bottom_pane::InputResult;
use crate::bottom_pane::QUIT_SHORTCUT_TIMEOUT;
use crate::exit::AppExitInfo;
use crate::exit::ExitReason;
use crate::host::ConversationHost;
use crate::host::deliver;
use crate::host_settings::HostSettings;
use crate::host_settings::StaticHostSettings;
use crate::image_encode::DataUrlResizer;
use crate::image_encode::ImageEncodeManager;
use crate::image_encode::ImageResizer;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::render::renderable::Renderable;
use crate::style::transcript_style;
use crate::theme::GlyphIcon;
use crate::theme::LabelIcon;
use crate::theme::THEME_TOGGLE_KEY;
use crate::theme::Theme;
use crate::theme::ThemeIcon;
use crate::theme::ThemeToggle;
use crate::tui::Tui;
use crate::tui::TuiEvent;

const QUIT_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('c'));

pub struct ComposerAppParams {
    pub placeholder_text: Option<String>,
    pub clear_on_send: bool,
    /// Conversation to reply to; `None` starts a new one on the first send.
    pub target: Option<ConversationId>,
    pub disabled: bool,
    pub host_settings: Arc<dyn HostSettings>,
    pub max_input_height: u16,
    pub theme: Theme,
    /// Draw the theme toggle with text labels instead of emoji.
    pub plain_icons: bool,
    /// Extra footer buttons whose keys are reported to the host.
    pub action_buttons: Vec<ActionButton>,
    /// Image to attach as soon as the session starts.
    pub initial_attachment: Option<PathBuf>,
}

impl Default for ComposerAppParams {
    fn default() -> Self {
        Self {
            placeholder_text: None,
            clear_on_send: true,
            target: None,
            disabled: false,
            host_settings: Arc::new(StaticHostSettings::default()),
            max_input_height: DEFAULT_MAX_INPUT_HEIGHT,
            theme: Theme::default(),
            plain_icons: false,
            action_buttons: Vec::new(),
            initial_attachment: None,
        }
    }
}

/// Run the composer until the user quits or terminal input ends.
pub async fn run_composer_app(
    tui: &mut Tui,
    params: ComposerAppParams,
    host: &mut dyn ConversationHost,
) -> anyhow::Result<AppExitInfo> {
    let (app_event_tx_raw, mut app_event_rx) = unbounded_channel::<AppEvent>();
    let app_event_tx = AppEventSender::new(app_event_tx_raw);
    let mut app = ComposerApp::new(params, app_event_tx, Arc::new(DataUrlResizer));

    let mut tui_events = tui.event_stream();
    app.draw(tui)?;

    loop {
        tokio::select! {
            maybe_event = tui_events.next() => {
                let Some(event) = maybe_event else {
                    return Ok(app.exit_info(ExitReason::InputClosed));
                };
                if let Some(reason) = app.handle_tui_event(event, host) {
                    return Ok(app.exit_info(reason));
                }
            }
            maybe_app_event = app_event_rx.recv() => {
                let Some(app_event) = maybe_app_event else {
                    return Ok(app.exit_info(ExitReason::InputClosed));
                };
                app.handle_app_event(app_event);
            }
            // Redraw once the quit reminder expires.
            _ = tokio::time::sleep(QUIT_SHORTCUT_TIMEOUT), if app.composer.quit_shortcut_hint_visible() => {}
        }
        app.draw(tui)?;
    }
}

struct ComposerApp {
    composer: ChatComposer,
    theme_toggle: ThemeToggle<Box<dyn ThemeIcon>>,
    action_buttons: Vec<ActionButton>,
    image_encoder: ImageEncodeManager,
    transcript: Vec<Line<'static>>,
    messages_sent: usize,
}

impl ComposerApp {
    fn new(
        params: ComposerAppParams,
        app_event_tx: AppEventSender,
        resizer: Arc<dyn ImageResizer>,
    ) -> Self {
        let ComposerAppParams {
            placeholder_text,
            clear_on_send,
            target,
            disabled,
            host_settings,
            max_input_height,
            theme,
            plain_icons,
            action_buttons,
            initial_attachment,
        } = params;

        let icon: Box<dyn ThemeIcon> = if plain_icons {
            Box::new(LabelIcon)
        } else {
            Box::new(GlyphIcon)
        };
        let composer = ChatComposer::new(ComposerParams {
            placeholder_text,
            clear_on_send,
            target,
            disabled,
            action_buttons: Vec::new(),
            host_settings,
            max_input_height,
            theme,
            ..ComposerParams::new(app_event_tx.clone())
        });

        let mut app = Self {
            composer,
            theme_toggle: ThemeToggle::new(theme, icon),
            action_buttons,
            image_encoder: ImageEncodeManager::new(resizer, app_event_tx),
            transcript: Vec::new(),
            messages_sent: 0,
        };
        app.refresh_footer_buttons();
        if let Some(path) = initial_attachment {
            app.composer.attach_file(path);
        }
        app
    }

    fn exit_info(&self, exit_reason: ExitReason) -> AppExitInfo {
        AppExitInfo {
            messages_sent: self.messages_sent,
            conversation_id: self.composer.target().cloned(),
            exit_reason,
        }
    }

    fn handle_tui_event(
        &mut self,
        event: TuiEvent,
        host: &mut dyn ConversationHost,
    ) -> Option<ExitReason> {
        match event {
            TuiEvent::Key(key_event) => self.handle_key_event(key_event, host),
            TuiEvent::Paste(pasted) => {
                // Many terminals convert newlines to \r when pasting (e.g., iTerm2).
                let pasted = pasted.replace("\r\n", "\n").replace('\r', "\n");
                self.composer.handle_paste(pasted);
                None
            }
            TuiEvent::Resize => None,
        }
    }

    fn handle_key_event(
        &mut self,
        key_event: KeyEvent,
        host: &mut dyn ConversationHost,
    ) -> Option<ExitReason> {
        if key_event.kind == KeyEventKind::Release {
            return None;
        }

        if QUIT_KEY.is_press(key_event) {
            if self.composer.clear_for_ctrl_c().is_none() && self.composer.quit_shortcut_hint_visible()
            {
                return Some(ExitReason::UserRequested);
            }
            self.composer.show_quit_shortcut_hint(QUIT_KEY);
            return None;
        }

        if THEME_TOGGLE_KEY.is_press(key_event) {
            let theme = self.theme_toggle.toggle();
            self.composer.set_theme(theme);
            self.refresh_footer_buttons();
            return None;
        }

        if let Some(button) = self
            .action_buttons
            .iter()
            .find(|button| button.is_pressed_by(key_event))
        {
            tracing::info!("action button pressed: {}", button.label());
            let notice = format!("{} requested", button.label());
            self.push_notice(notice);
            return None;
        }

        let (result, _needs_redraw) = self.composer.handle_key_event(key_event);
        if let InputResult::Submitted(message) = result {
            self.submit(message, host);
        }
        None
    }

    fn handle_app_event(&mut self, app_event: AppEvent) {
        match app_event {
            AppEvent::StartImageEncode { seq, path } => self.image_encoder.on_request(seq, path),
            AppEvent::ImageEncoded { seq, data_url } => {
                self.composer.on_image_encoded(seq, data_url);
            }
            AppEvent::ImageEncodeFailed { seq } => self.composer.on_image_encode_failed(seq),
        }
    }

    fn submit(&mut self, message: OutgoingMessage, host: &mut dyn ConversationHost) {
        self.echo_message(&message);
        match deliver(host, message) {
            Ok(conversation_id) => {
                self.messages_sent += 1;
                if let Some(id) = conversation_id
                    && self.composer.target() != Some(&id)
                {
                    self.push_notice(format!("started conversation {id}"));
                    self.composer.set_target(Some(id));
                }
            }
            Err(err) => {
                tracing::warn!("failed to deliver message: {err:#}");
                self.push_entry(vec![Line::from(
                    format!("■ failed to deliver message: {err}").red(),
                )]);
            }
        }
    }

    fn echo_message(&mut self, message: &OutgoingMessage) {
        let mut lines: Vec<Line<'static>> = message
            .content
            .text()
            .split('\n')
            .enumerate()
            .map(|(idx, line)| {
                let prefix = if idx == 0 { "› ".bold() } else { "  ".into() };
                Line::from(vec![prefix, Span::from(line.to_string())])
            })
            .collect();
        if message.content.image_url().is_some() {
            lines.push(Line::from(vec!["  ".into(), "[image]".cyan()]));
        }
        self.push_entry(lines);
    }

    fn push_notice(&mut self, notice: String) {
        self.push_entry(vec![Line::from(format!("• {notice}").dim())]);
    }

    fn push_entry(&mut self, lines: Vec<Line<'static>>) {
        if !self.transcript.is_empty() {
            self.transcript.push(Line::from(""));
        }
        self.transcript.extend(lines);
    }

    fn refresh_footer_buttons(&mut self) {
        let mut buttons = self.action_buttons.clone();
        buttons.push(self.theme_toggle.action_button());
        self.composer.set_action_buttons(buttons);
    }

    /// `[header, transcript, composer]`
    fn layout(&self, area: Rect) -> [Rect; 3] {
        let composer_height = self.composer.desired_height(area.width).min(area.height);
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(composer_height),
        ])
        .areas(area)
    }

    fn header_line(&self) -> Line<'static> {
        let title = match self.composer.target() {
            Some(id) => format!("conversation {id}"),
            None => "new conversation".to_string(),
        };
        Line::from(vec![
            "quill".bold(),
            " · ".dim(),
            title.dim(),
            "  ".into(),
            self.theme_toggle.icon(),
            " ".into(),
            self.theme_toggle.switch_label().dim(),
        ])
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let [header_rect, transcript_rect, composer_rect] = self.layout(area);

        self.header_line().render(header_rect, buf);

        let transcript = Paragraph::new(Text::from(self.transcript.clone()))
            .style(transcript_style(self.theme_toggle.theme()))
            .wrap(Wrap { trim: false });
        let total = u16::try_from(transcript.line_count(transcript_rect.width))
            .unwrap_or(u16::MAX);
        let scroll = total.saturating_sub(transcript_rect.height);
        transcript.scroll((scroll, 0)).render(transcript_rect, buf);

        self.composer.render(composer_rect, buf);
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let [_, _, composer_rect] = self.layout(area);
        self.composer.cursor_pos(composer_rect)
    }

    fn draw(&self, tui: &mut Tui) -> anyhow::Result<()> {
        tui.draw(|frame| {
            let area = frame.area();
            self.render(area, frame.buffer_mut());
            if let Some(cursor) = self.cursor_pos(area) {
                frame.set_cursor_position(cursor);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use quill_protocol::message::MessageContent;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::image_encode::EncodeImageError;

    #[derive(Default)]
    struct RecordingHost {
        delivered: Vec<(MessageContent, Option<ConversationId>)>,
        fail: bool,
    }

    impl ConversationHost for RecordingHost {
        fn reply(
            &mut self,
            content: MessageContent,
            conversation_id: &ConversationId,
        ) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("host offline");
            }
            self.delivered.push((content, Some(conversation_id.clone())));
            Ok(())
        }

        fn start_conversation(
            &mut self,
            content: MessageContent,
        ) -> anyhow::Result<Option<ConversationId>> {
            if self.fail {
                anyhow::bail!("host offline");
            }
            self.delivered.push((content, None));
            Ok(Some(ConversationId::from("conv-new")))
        }
    }

    struct FixedResizer;

    impl ImageResizer for FixedResizer {
        fn resize(&self, bytes: &[u8], _: u32, _: u32) -> Result<String, EncodeImageError> {
            Ok(format!("data:image/png;base64,len{}", bytes.len()))
        }
    }

    fn app_with(params: ComposerAppParams) -> (ComposerApp, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let app = ComposerApp::new(params, AppEventSender::new(tx), Arc::new(FixedResizer));
        (app, rx)
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, modifiers))
    }

    fn type_str(app: &mut ComposerApp, host: &mut RecordingHost, text: &str) {
        for ch in text.chars() {
            assert_eq!(
                app.handle_tui_event(press(KeyCode::Char(ch), KeyModifiers::NONE), host),
                None
            );
        }
    }

    fn enter(app: &mut ComposerApp, host: &mut RecordingHost) -> Option<ExitReason> {
        app.handle_tui_event(press(KeyCode::Enter, KeyModifiers::NONE), host)
    }

    fn transcript_text(app: &ComposerApp) -> Vec<String> {
        app.transcript
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn first_send_starts_conversation_and_later_sends_reply() {
        let (mut app, _rx) = app_with(ComposerAppParams::default());
        let mut host = RecordingHost::default();

        type_str(&mut app, &mut host, "Hello");
        assert_eq!(enter(&mut app, &mut host), None);
        type_str(&mut app, &mut host, "again");
        assert_eq!(enter(&mut app, &mut host), None);

        assert_eq!(
            host.delivered,
            vec![
                (MessageContent::Text("Hello".to_string()), None),
                (
                    MessageContent::Text("again".to_string()),
                    Some(ConversationId::from("conv-new"))
                ),
            ]
        );
        assert_eq!(
            transcript_text(&app),
            vec![
                "› Hello",
                "",
                "• started conversation conv-new",
                "",
                "› again",
            ]
        );
        assert_eq!(
            app.exit_info(ExitReason::UserRequested),
            AppExitInfo {
                messages_sent: 2,
                conversation_id: Some(ConversationId::from("conv-new")),
                exit_reason: ExitReason::UserRequested,
            }
        );
    }

    #[test]
    fn blank_enter_reaches_no_host() {
        let (mut app, _rx) = app_with(ComposerAppParams::default());
        let mut host = RecordingHost::default();
        type_str(&mut app, &mut host, "   ");
        assert_eq!(enter(&mut app, &mut host), None);
        assert!(host.delivered.is_empty());
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn delivery_failure_is_reported_and_session_continues() {
        let (mut app, _rx) = app_with(ComposerAppParams::default());
        let mut host = RecordingHost {
            fail: true,
            ..RecordingHost::default()
        };
        type_str(&mut app, &mut host, "hi");
        assert_eq!(enter(&mut app, &mut host), None);
        assert_eq!(
            transcript_text(&app),
            vec!["› hi", "", "■ failed to deliver message: host offline"]
        );
        assert_eq!(app.exit_info(ExitReason::InputClosed).messages_sent, 0);
    }

    #[test]
    fn ctrl_c_clears_then_quits_on_second_press() {
        let (mut app, _rx) = app_with(ComposerAppParams::default());
        let mut host = RecordingHost::default();
        let ctrl_c = || press(KeyCode::Char('c'), KeyModifiers::CONTROL);

        type_str(&mut app, &mut host, "draft");
        assert_eq!(app.handle_tui_event(ctrl_c(), &mut host), None);
        assert!(app.composer.is_empty());

        assert_eq!(
            app.handle_tui_event(ctrl_c(), &mut host),
            Some(ExitReason::UserRequested)
        );
    }

    #[test]
    fn ctrl_c_on_empty_composer_needs_confirmation() {
        let (mut app, _rx) = app_with(ComposerAppParams::default());
        let mut host = RecordingHost::default();
        let ctrl_c = || press(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(app.handle_tui_event(ctrl_c(), &mut host), None);
        assert!(app.composer.quit_shortcut_hint_visible());
        type_str(&mut app, &mut host, "x");
        assert_eq!(app.handle_tui_event(ctrl_c(), &mut host), None);
        assert_eq!(app.composer.draft(), "");
    }

    #[test]
    fn disabled_composer_still_quits() {
        let (mut app, _rx) = app_with(ComposerAppParams {
            disabled: true,
            ..ComposerAppParams::default()
        });
        let mut host = RecordingHost::default();
        let ctrl_c = || press(KeyCode::Char('c'), KeyModifiers::CONTROL);
        type_str(&mut app, &mut host, "ignored");
        assert!(app.composer.is_empty());
        assert_eq!(app.handle_tui_event(ctrl_c(), &mut host), None);
        assert_eq!(
            app.handle_tui_event(ctrl_c(), &mut host),
            Some(ExitReason::UserRequested)
        );
    }

    #[test]
    fn ctrl_t_toggles_theme_and_footer_icon() {
        let (mut app, _rx) = app_with(ComposerAppParams {
            plain_icons: true,
            ..ComposerAppParams::default()
        });
        let mut host = RecordingHost::default();
        let labels = |app: &ComposerApp| {
            app.composer
                .action_buttons()
                .iter()
                .map(|button| button.label().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(labels(&app), vec!["dark"]);

        app.handle_tui_event(press(KeyCode::Char('t'), KeyModifiers::CONTROL), &mut host);
        assert_eq!(app.theme_toggle.theme(), Theme::Dark);
        assert_eq!(labels(&app), vec!["light"]);
    }

    #[test]
    fn action_button_keys_are_reported() {
        let (mut app, _rx) = app_with(ComposerAppParams {
            action_buttons: vec![ActionButton::share(
                key_hint::ctrl(KeyCode::Char('s')),
                "Share",
            )],
            ..ComposerAppParams::default()
        });
        let mut host = RecordingHost::default();
        app.handle_tui_event(press(KeyCode::Char('s'), KeyModifiers::CONTROL), &mut host);
        assert_eq!(transcript_text(&app), vec!["• 🔗 Share requested"]);
        assert!(app.composer.is_empty());
    }

    #[test]
    fn pasted_carriage_returns_become_newlines() {
        let (mut app, _rx) = app_with(ComposerAppParams::default());
        let mut host = RecordingHost::default();
        app.handle_tui_event(TuiEvent::Paste("a\r\nb\rc".to_string()), &mut host);
        assert_eq!(app.composer.draft(), "a\nb\nc");
    }

    #[test]
    fn render_shows_header_transcript_and_composer() {
        let (mut app, _rx) = app_with(ComposerAppParams {
            plain_icons: true,
            ..ComposerAppParams::default()
        });
        let mut host = RecordingHost::default();
        type_str(&mut app, &mut host, "hey");
        enter(&mut app, &mut host);

        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        let rows: Vec<String> = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect();

        assert_eq!(
            rows[0],
            "quill · conversation conv-new  dark Switch to dark mode"
        );
        assert_eq!(rows[1], "› hey");
        assert_eq!(rows[3], "• started conversation conv-new");
        assert_eq!(rows[7], "› Type your question...");
        assert_eq!(rows[9], "  ⏎ send   shift + ⏎ newline   ctrl + t dark");
        assert_eq!(app.cursor_pos(area), Some((2, 7)));
    }

    #[tokio::test]
    async fn initial_attachment_is_encoded_and_sent_with_next_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, b"12345").unwrap();

        let (mut app, mut rx) = app_with(ComposerAppParams {
            initial_attachment: Some(path.clone()),
            ..ComposerAppParams::default()
        });
        let mut host = RecordingHost::default();

        let request = rx.recv().await.unwrap();
        assert_eq!(request, AppEvent::StartImageEncode { seq: 1, path });
        app.handle_app_event(request);

        let completion = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        app.handle_app_event(completion);
        assert_eq!(app.composer.attachment(), Some("data:image/png;base64,len5"));

        type_str(&mut app, &mut host, "Look");
        enter(&mut app, &mut host);
        assert_eq!(
            host.delivered,
            vec![(
                MessageContent::from_draft("Look", Some("data:image/png;base64,len5")),
                None
            )]
        );
        assert_eq!(app.composer.attachment(), None);
        assert_eq!(
            transcript_text(&app)[..2].to_vec(),
            vec!["› Look", "  [image]"]
        );
    }
}
