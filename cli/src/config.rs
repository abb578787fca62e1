use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use quill_tui::Theme;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

const DEFAULT_MAX_INPUT_HEIGHT: u16 = 200;

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuillConfig {
    pub placeholder: Option<String>,
    /// Defaults to `true`.
    pub clear_on_send: bool,
    pub max_input_height: u16,
    pub theme: Theme,
    /// `[frontend] oyd_enabled`: answers are grounded on the user's own data.
    pub oyd_enabled: bool,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            placeholder: None,
            clear_on_send: true,
            max_input_height: DEFAULT_MAX_INPUT_HEIGHT,
            theme: Theme::default(),
            oyd_enabled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        Ok(Self::new(default_config_path(&quill_home()?)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config file. A missing file yields the defaults; so does a file that is not
    /// valid TOML (with a warning in the log).
    pub fn load(&self) -> anyhow::Result<QuillConfig> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(QuillConfig::default());
        };

        let doc = match content.parse::<DocumentMut>() {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(
                    "ignoring invalid config at {}: {err}",
                    self.path.display()
                );
                return Ok(QuillConfig::default());
            }
        };

        Ok(read_config(&doc))
    }
}

/// `~/.quill`, the root for config, logs and the default outbox.
pub fn quill_home() -> anyhow::Result<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        anyhow::bail!("cannot determine home directory for quill state");
    };
    Ok(home.join(".quill"))
}

fn default_config_path(quill_home: &Path) -> PathBuf {
    quill_home.join("config.toml")
}

fn read_config(doc: &DocumentMut) -> QuillConfig {
    let defaults = QuillConfig::default();

    let placeholder = doc
        .get("placeholder")
        .and_then(TomlItem::as_str)
        .map(str::to_string)
        .filter(|placeholder| !placeholder.is_empty());

    let clear_on_send = doc
        .get("clear_on_send")
        .and_then(TomlItem::as_bool)
        .unwrap_or(defaults.clear_on_send);

    let max_input_height = doc
        .get("max_input_height")
        .and_then(TomlItem::as_integer)
        .and_then(|rows| u16::try_from(rows).ok())
        .filter(|rows| *rows > 0)
        .unwrap_or(defaults.max_input_height);

    let theme = match doc.get("theme").and_then(TomlItem::as_str) {
        Some(raw) => raw.parse::<Theme>().unwrap_or_else(|err| {
            tracing::warn!("{err}; using the {} theme", defaults.theme);
            defaults.theme
        }),
        None => defaults.theme,
    };

    let oyd_enabled = doc
        .get("frontend")
        .and_then(TomlItem::as_table)
        .and_then(|frontend| frontend.get("oyd_enabled"))
        .and_then(TomlItem::as_bool)
        .unwrap_or(defaults.oyd_enabled);

    QuillConfig {
        placeholder,
        clear_on_send,
        max_input_height,
        theme,
        oyd_enabled,
    }
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with(contents: &str) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).expect("write config");
        (dir, ConfigStore::new(path))
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join("config.toml"));
        assert_eq!(store.load().expect("load"), QuillConfig::default());
        assert!(QuillConfig::default().clear_on_send);
    }

    #[test]
    fn reads_all_keys() {
        let (_dir, store) = store_with(
            r#"# composer settings
placeholder = "Ask about your data"
clear_on_send = false
max_input_height = 8
theme = "dark"

[frontend]
oyd_enabled = true # grounded answers
"#,
        );

        assert_eq!(
            store.load().expect("load"),
            QuillConfig {
                placeholder: Some("Ask about your data".to_string()),
                clear_on_send: false,
                max_input_height: 8,
                theme: Theme::Dark,
                oyd_enabled: true,
            }
        );
    }

    #[test]
    fn out_of_range_and_unknown_values_fall_back() {
        let (_dir, store) = store_with(
            r#"placeholder = ""
max_input_height = 0
theme = "sepia"
"#,
        );
        assert_eq!(store.load().expect("load"), QuillConfig::default());

        let (_dir, store) = store_with("max_input_height = 100000\n");
        assert_eq!(
            store.load().expect("load").max_input_height,
            DEFAULT_MAX_INPUT_HEIGHT
        );
    }

    #[test]
    fn invalid_toml_uses_defaults() {
        let (_dir, store) = store_with("[frontend\noyd_enabled = true\n");
        assert_eq!(store.load().expect("load"), QuillConfig::default());
    }

    #[test]
    fn default_config_path_uses_quill_home_dir() {
        let home = Path::new("home").join(".quill");
        assert_eq!(default_config_path(&home), home.join("config.toml"));
    }
}
