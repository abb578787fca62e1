use std::io::Stdout;
use std::io::stdout;
use std::pin::Pin;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::event::KeyboardEnhancementFlags;
use crossterm::event::PopKeyboardEnhancementFlags;
use crossterm::event::PushKeyboardEnhancementFlags;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

pub type Backend = CrosstermBackend<Stdout>;

/// Input the composer app reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    /// The terminal changed size or regained focus; redraw.
    Resize,
}

/// Put the terminal into raw mode with bracketed paste and an alternate screen.
///
/// Keyboard enhancement is requested so terminals that support it report Shift+Enter distinctly
/// from Enter; terminals that don't simply ignore the request.
pub fn init() -> anyhow::Result<Terminal<Backend>> {
    enable_raw_mode()?;
    set_panic_hook();
    execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste)?;
    if execute!(
        stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    )
    .is_err()
    {
        tracing::debug!("keyboard enhancement flags not supported");
    }
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

/// Undo everything [`init`] did. Safe to call more than once.
pub fn restore() -> anyhow::Result<()> {
    let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        hook(panic_info);
    }));
}

pub struct Tui {
    pub terminal: Terminal<Backend>,
}

impl Tui {
    pub fn new(terminal: Terminal<Backend>) -> Self {
        Self { terminal }
    }

    /// Stream of terminal input, filtered down to the events the app handles.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent>>> {
        let stream = EventStream::new().filter_map(|event| match event {
            Ok(Event::Key(key_event)) => Some(TuiEvent::Key(key_event)),
            Ok(Event::Paste(pasted)) => Some(TuiEvent::Paste(pasted)),
            Ok(Event::Resize(..)) | Ok(Event::FocusGained) => Some(TuiEvent::Resize),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("terminal event stream error: {err}");
                None
            }
        });
        Box::pin(stream)
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> anyhow::Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }
}
