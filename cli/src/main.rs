mod config;
mod logging;
mod outbox;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap::ValueEnum;
use crossterm::event::KeyCode;
use quill_protocol::ConversationId;
use quill_tui::ActionButton;
use quill_tui::ComposerAppParams;
use quill_tui::ExitReason;
use quill_tui::StaticHostSettings;
use quill_tui::Theme;
use quill_tui::keys;

use crate::config::ConfigStore;
use crate::outbox::JsonlHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
enum CliTheme {
    Light,
    Dark,
}

impl From<CliTheme> for Theme {
    fn from(theme: CliTheme) -> Self {
        match theme {
            CliTheme::Light => Theme::Light,
            CliTheme::Dark => Theme::Dark,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Compose chat messages in the terminal and hand them to a conversation outbox"
)]
struct Cli {
    /// Hint shown while the draft is empty.
    #[arg(long)]
    placeholder: Option<String>,

    /// Reply into this conversation instead of starting a new one. A blank id starts a new one.
    #[arg(long, env = "QUILL_CONVERSATION_ID")]
    conversation_id: Option<String>,

    /// Keep the draft after sending (only the attachment is cleared).
    #[arg(long)]
    keep_draft: bool,

    /// Start with input disabled.
    #[arg(long)]
    disabled: bool,

    #[arg(long, value_enum)]
    theme: Option<CliTheme>,

    /// Draw the theme toggle with text instead of emoji.
    #[arg(long)]
    plain_icons: bool,

    /// JSON-lines file that receives sent messages. Defaults to `~/.quill/outbox.jsonl`.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Image to attach before the first message.
    #[arg(long)]
    attach: Option<PathBuf>,

    /// Config file. Defaults to `~/.quill/config.toml`.
    #[arg(long, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,

    /// Log file. Defaults to `~/.quill/log/quill.log`.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn target(&self) -> Option<ConversationId> {
        self.conversation_id
            .as_deref()
            .and_then(|raw| raw.parse::<ConversationId>().ok())
    }

    fn composer_params(&self, config: config::QuillConfig) -> ComposerAppParams {
        ComposerAppParams {
            placeholder_text: self.placeholder.clone().or(config.placeholder),
            clear_on_send: config.clear_on_send && !self.keep_draft,
            target: self.target(),
            disabled: self.disabled,
            host_settings: Arc::new(StaticHostSettings {
                data_grounding_enabled: config.oyd_enabled,
            }),
            max_input_height: config.max_input_height,
            theme: self.theme.map_or(config.theme, Theme::from),
            plain_icons: self.plain_icons,
            action_buttons: vec![
                ActionButton::share(keys::ctrl(KeyCode::Char('s')), "Share"),
                ActionButton::history(keys::ctrl(KeyCode::Char('o')), "History"),
            ],
            initial_attachment: self.attach.clone(),
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.log_file {
        Some(path) => path.clone(),
        None => config::quill_home()?.join("log").join("quill.log"),
    };
    logging::init_file_logging(&log_file)?;

    let store = match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default()?,
    };
    let config = store
        .load()
        .with_context(|| format!("load config {}", store.path().display()))?;

    let output = match &cli.output {
        Some(path) => path.clone(),
        None => config::quill_home()?.join("outbox.jsonl"),
    };
    let mut host = JsonlHost::new(output);
    let params = cli.composer_params(config);

    tracing::info!("starting composer; outbox at {}", host.path().display());
    let terminal = quill_tui::init_terminal()?;
    let mut tui = quill_tui::Tui::new(terminal);
    let result = quill_tui::run_composer_app(&mut tui, params, &mut host).await;
    quill_tui::restore_terminal()?;

    let exit_info = result?;
    tracing::info!(?exit_info, "composer exited");
    if exit_info.exit_reason == ExitReason::InputClosed {
        eprintln!("terminal input closed");
    }
    if exit_info.messages_sent > 0 {
        let conversation = exit_info
            .conversation_id
            .map(|id| format!(" (conversation {id})"))
            .unwrap_or_default();
        println!(
            "sent {} message(s) to {}{conversation}",
            exit_info.messages_sent,
            host.path().display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "quill",
            "--placeholder",
            "From flag",
            "--keep-draft",
            "--theme",
            "dark",
            "--conversation-id",
            "conv-7",
        ]);
        let params = cli.composer_params(config::QuillConfig {
            placeholder: Some("From config".to_string()),
            ..config::QuillConfig::default()
        });

        assert_eq!(params.placeholder_text.as_deref(), Some("From flag"));
        assert!(!params.clear_on_send);
        assert_eq!(params.theme, Theme::Dark);
        assert_eq!(params.target, Some(ConversationId::from("conv-7")));
        assert!(!params.host_settings.data_grounding_enabled());
    }

    #[test]
    fn config_applies_without_flags() {
        let cli = Cli::parse_from(["quill"]);
        let params = cli.composer_params(config::QuillConfig {
            placeholder: Some("From config".to_string()),
            clear_on_send: true,
            max_input_height: 6,
            theme: Theme::Dark,
            oyd_enabled: true,
        });

        assert_eq!(params.placeholder_text.as_deref(), Some("From config"));
        assert!(params.clear_on_send);
        assert_eq!(params.max_input_height, 6);
        assert_eq!(params.theme, Theme::Dark);
        assert!(params.host_settings.data_grounding_enabled());
        assert_eq!(params.target, None);
    }

    #[test]
    fn blank_conversation_id_starts_new_conversation() {
        for raw in ["", "  "] {
            let cli = Cli::parse_from(["quill", "--conversation-id", raw]);
            let params = cli.composer_params(config::QuillConfig::default());
            assert_eq!(params.target, None);
        }
    }

    #[test]
    fn conversation_id_is_trimmed() {
        let cli = Cli::parse_from(["quill", "--conversation-id", " conv-1 "]);
        let params = cli.composer_params(config::QuillConfig::default());
        assert_eq!(params.target, Some(ConversationId::from("conv-1")));
    }
}
