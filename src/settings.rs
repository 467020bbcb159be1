//! User settings and the sources they come from
//!
//! Settings are pushed into the scanner; the scanner never reads storage.

use crate::error::{HighlightError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
             event::{AccessKind, AccessMode}};
use serde::{Deserialize, Serialize};
use std::{path::{Path, PathBuf}, sync::mpsc::{self, Receiver, TryRecvError}};

/// What the user configured: whether the overlay is on and which attribute to track
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub enabled: bool,

    /// Attribute name without the `data-` prefix (e.g. "testid")
    #[serde(default)]
    pub attribute: Option<String>,
}

/// A partial update, like a storage change notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsChange {
    pub enabled: Option<bool>,
    pub attribute: Option<Option<String>>,
}

impl Settings {
    pub fn new(enabled: bool, attribute: Option<String>) -> Self {
        Self { enabled, attribute }
    }

    /// Enabled settings tracking `attribute`
    pub fn tracking(attribute: impl Into<String>) -> Self {
        Self::new(true, Some(attribute.into()))
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, change: &SettingsChange) {
        if let Some(enabled) = change.enabled {
            self.enabled = enabled;
        }
        if let Some(attribute) = &change.attribute {
            self.attribute = attribute.clone();
        }
    }

    /// The attribute to scan for, or `None` when the overlay should be inert
    pub fn resolve(&self, bare_attributes: &[String]) -> Result<Option<AttributeName>> {
        if !self.enabled {
            return Ok(None);
        }
        match &self.attribute {
            Some(raw) => AttributeName::parse(raw, bare_attributes),
            None => Ok(None),
        }
    }
}

impl SettingsChange {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn attribute(attribute: Option<String>) -> Self {
        Self {
            attribute: Some(attribute),
            ..Self::default()
        }
    }
}

/// A resolved attribute: what the user typed and the attribute actually queried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeName {
    configured: String,
    full: String,
}

impl AttributeName {
    /// Derive the queried attribute from a configured name
    ///
    /// `testid` becomes `data-testid`, `data-testid` stays as is, and names in
    /// `bare_attributes` (such as `alt`) are used without a prefix. Blank names
    /// resolve to `None`.
    pub fn parse(raw: &str, bare_attributes: &[String]) -> Result<Option<Self>> {
        let configured = raw.trim();
        if configured.is_empty() {
            return Ok(None);
        }

        if let Some(bad) = configured
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '[' | ']' | '=' | '>' | '<' | '/'))
        {
            return Err(HighlightError::InvalidSettings(format!(
                "attribute name '{}' contains '{}'",
                configured, bad
            )));
        }

        let lowered = configured.to_ascii_lowercase();
        let full = if lowered.starts_with("data-") || bare_attributes.iter().any(|b| b.eq_ignore_ascii_case(&lowered)) {
            lowered
        } else {
            format!("data-{}", lowered)
        };

        Ok(Some(Self {
            configured: configured.to_string(),
            full,
        }))
    }

    /// The name as configured
    pub fn configured(&self) -> &str {
        &self.configured
    }

    /// The attribute name present on elements
    pub fn full(&self) -> &str {
        &self.full
    }
}

/// A JSON settings file
///
/// [`SettingsFile::reload`] compares file contents, not modification times,
/// so two writes within one timestamp tick are both picked up.
#[derive(Debug)]
pub struct SettingsFile {
    path: PathBuf,
    last_settings: Option<Settings>,
}

impl SettingsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last_settings: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Settings> {
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Re-read the file; new settings if they differ from the last ones read
    pub fn reload(&mut self) -> Result<Option<Settings>> {
        let settings = self.load()?;
        if self.last_settings.as_ref() == Some(&settings) {
            return Ok(None);
        }

        log::debug!("Settings file {} changed: {:?}", self.path.display(), settings);
        self.last_settings = Some(settings.clone());
        Ok(Some(settings))
    }

    /// Whether a watch event concerns this file
    fn is_affected_by(&self, event: &Event) -> bool {
        let name = self.path.file_name();
        let written = event.kind.is_modify()
            || event.kind.is_create()
            || matches!(event.kind, EventKind::Access(AccessKind::Close(AccessMode::Write)));
        written && event.paths.iter().any(|path| path.file_name() == name)
    }
}

/// A [`SettingsFile`] followed with a filesystem watcher
///
/// The parent directory is watched rather than the file, so editors that
/// replace the file on save are followed too.
pub struct SettingsWatcher {
    file: SettingsFile,
    events: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl SettingsWatcher {
    pub fn new(file: SettingsFile) -> Result<Self> {
        let (tx, events) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if tx.send(res).is_err() {
                log::debug!("Settings watcher dropped, ignoring file event");
            }
        })
        .map_err(|e| HighlightError::Watch(e.to_string()))?;

        let dir = match file.path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| HighlightError::Watch(format!("{}: {}", dir.display(), e)))?;
        log::info!("Watching settings file {}", file.path().display());

        Ok(Self {
            file,
            events,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the file now, regardless of pending events
    pub fn reload(&mut self) -> Result<Option<Settings>> {
        self.file.reload()
    }

    /// New settings if the file was written since the last call
    ///
    /// A read that races a write in progress can fail to parse; the write's
    /// own events trigger another read once it completes.
    pub fn poll(&mut self) -> Result<Option<Settings>> {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(Ok(event)) => changed |= self.file.is_affected_by(&event),
                Ok(Err(e)) => log::warn!("Watch error on {}: {}", self.path().display(), e),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(HighlightError::Watch(format!(
                        "watcher for {} stopped",
                        self.path().display()
                    )));
                }
            }
        }

        if !changed {
            return Ok(None);
        }
        self.file.reload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn bare() -> Vec<String> {
        vec!["alt".to_string(), "aria-label".to_string()]
    }

    #[test]
    fn test_attribute_prefixing() {
        let name = AttributeName::parse("testid", &bare()).unwrap().unwrap();
        assert_eq!(name.full(), "data-testid");
        assert_eq!(name.configured(), "testid");

        let name = AttributeName::parse("  data-qa ", &bare()).unwrap().unwrap();
        assert_eq!(name.full(), "data-qa");

        let name = AttributeName::parse("aria-label", &bare()).unwrap().unwrap();
        assert_eq!(name.full(), "aria-label");
    }

    #[test]
    fn test_blank_attribute_is_unconfigured() {
        assert_eq!(AttributeName::parse("", &bare()).unwrap(), None);
        assert_eq!(AttributeName::parse("   ", &bare()).unwrap(), None);
    }

    #[test]
    fn test_invalid_attribute_is_rejected() {
        assert!(matches!(
            AttributeName::parse("test id", &bare()),
            Err(HighlightError::InvalidSettings(_))
        ));
        assert!(AttributeName::parse("x]", &bare()).is_err());
    }

    #[test]
    fn test_resolve_requires_enabled_and_attribute() {
        assert_eq!(Settings::disabled().resolve(&bare()).unwrap(), None);
        assert_eq!(Settings::new(true, None).resolve(&bare()).unwrap(), None);
        assert_eq!(Settings::new(false, Some("testid".into())).resolve(&bare()).unwrap(), None);

        let resolved = Settings::tracking("testid").resolve(&bare()).unwrap().unwrap();
        assert_eq!(resolved.full(), "data-testid");
    }

    #[test]
    fn test_apply_change() {
        let mut settings = Settings::tracking("testid");

        settings.apply(&SettingsChange::attribute(Some("qa".into())));
        assert_eq!(settings.attribute.as_deref(), Some("qa"));
        assert!(settings.enabled);

        settings.apply(&SettingsChange::enabled(false));
        assert!(!settings.enabled);
        assert_eq!(settings.attribute.as_deref(), Some("qa"));

        settings.apply(&SettingsChange::attribute(None));
        assert_eq!(settings.attribute, None);
    }

    #[test]
    fn test_settings_json_shape() {
        let settings: Settings = serde_json::from_str(r#"{"enabled": true, "attribute": "testid"}"#).unwrap();
        assert_eq!(settings, Settings::tracking("testid"));

        let empty: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Settings::disabled());
    }

    #[test]
    fn test_settings_file_reload_compares_contents() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"enabled": true, "attribute": "testid"}"#).unwrap();

        let mut source = SettingsFile::new(file.path());
        assert_eq!(source.reload().unwrap(), Some(Settings::tracking("testid")));
        assert_eq!(source.reload().unwrap(), None);

        // Back-to-back writes usually share a modification time
        std::fs::write(file.path(), r#"{"enabled": false, "attribute": "testid"}"#).unwrap();
        assert_eq!(
            source.reload().unwrap(),
            Some(Settings::new(false, Some("testid".into())))
        );
    }

    #[test]
    fn test_settings_watcher_reports_writes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"enabled": true, "attribute": "testid"}"#).unwrap();

        let mut watcher = SettingsWatcher::new(SettingsFile::new(&path)).unwrap();
        assert_eq!(watcher.reload().unwrap(), Some(Settings::tracking("testid")));

        std::fs::write(&path, r#"{"enabled": true, "attribute": "qa"}"#).unwrap();
        std::fs::write(dir.path().join("other.json"), "{}").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = None;
        while seen.is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
            seen = watcher.poll().ok().flatten();
        }
        assert_eq!(seen, Some(Settings::tracking("qa")));
        std::thread::sleep(Duration::from_millis(100));
        assert!(matches!(watcher.poll(), Ok(None)));
    }

    #[test]
    fn test_settings_file_missing() {
        let mut source = SettingsFile::new("/nonexistent/settings.json");
        assert!(source.reload().is_err());
        assert!(SettingsWatcher::new(SettingsFile::new("/nonexistent/settings.json")).is_err());
    }
}
