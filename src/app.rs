//! Control-surface state.
//!
//! The TUI is a passive view over [`App`]: it renders what is here and turns
//! key presses into [`Intent`]s. Every intent is answered with an
//! [`Outcome`] that is also written to the console.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Local;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::core::UiConfig;
use crate::security::{redact, CredentialStore, SecretValue};
use crate::service::{ServiceManager, ServiceState};
use crate::settings::{SettingEdit, SettingKind, SettingValue, Settings, HOST_SETTINGS_KEY};

/// Result of one intent, ready for the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Discrete user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    RequestStart(SecretValue),
    RequestStop,
    Edit { plugin: String, key: String, edit: SettingEdit },
    ResetPlugin(String),
    ListPlugins,
    RescanPlugins,
}

/// Application mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppMode {
    /// Navigating tabs and settings
    #[default]
    Normal,
    /// Typing into the token field
    EditingToken,
    /// Typing into a text or number setting
    EditingField,
    /// Typing the console filter
    Search,
    /// Waiting for a yes/no on resetting the current tab
    ConfirmReset,
    /// Showing the help overlay
    Help,
}

/// One console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub timestamp: String,
    pub text: String,
    pub is_error: bool,
}

/// Bounded console buffer.
///
/// Lines are stored already redacted and truncated, so nothing rendered
/// later can leak the token.
#[derive(Debug)]
pub struct ConsoleLog {
    lines: VecDeque<ConsoleLine>,
    max_lines: usize,
    max_line_len: usize,
    secret: Option<SecretValue>,
}

impl ConsoleLog {
    pub fn new(max_lines: usize, max_line_len: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines.min(1024)),
            max_lines: max_lines.max(1),
            max_line_len: max_line_len.max(4),
            secret: None,
        }
    }

    /// Mask this value in every line pushed from now on.
    pub fn set_secret(&mut self, secret: Option<SecretValue>) {
        self.secret = secret.filter(|s| !s.is_empty());
    }

    pub fn push(&mut self, text: &str) {
        self.push_line(text, false);
    }

    pub fn push_error(&mut self, text: &str) {
        self.push_line(text, true);
    }

    fn push_line(&mut self, text: &str, is_error: bool) {
        let flat: String =
            text.chars().map(|c| if c.is_control() { ' ' } else { c }).collect();
        let mut text = redact(flat.trim_end(), self.secret.as_ref());
        if text.chars().count() > self.max_line_len {
            text = text.chars().take(self.max_line_len - 3).collect::<String>() + "...";
        }

        if self.lines.len() >= self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(ConsoleLine {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            text,
            is_error,
        });
    }

    /// Lines containing `query`, ignoring case. An empty query matches all.
    pub fn filtered(&self, query: &str) -> Vec<&ConsoleLine> {
        let query = query.trim().to_lowercase();
        self.lines
            .iter()
            .filter(|line| query.is_empty() || line.text.to_lowercase().contains(&query))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Main application state.
pub struct App {
    /// Lifecycle manager and settings bridge
    pub service: Arc<ServiceManager>,

    /// Runtime the service runs on
    runtime: Handle,

    /// Where the token is loaded from and saved to
    credentials: Box<dyn CredentialStore>,

    /// Token field contents
    pub token_input: String,

    /// Plugin tabs in discovery order, host entry last
    pub tabs: Vec<String>,

    /// Index of the selected tab
    pub selected_tab: usize,

    /// Index of the selected setting within the tab
    pub selected_field: usize,

    /// Current mode
    pub mode: AppMode,

    /// Console output
    pub console: ConsoleLog,

    /// Console filter
    pub search: String,

    /// Last intent outcome
    pub status_message: Option<Outcome>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Keeps the loopback inbox open for the lifetime of a test app
    #[cfg(test)]
    loopback: Option<crate::service::LoopbackHandle>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("service", &self.service)
            .field("credentials", &self.credentials.describe())
            .field("tabs", &self.tabs)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create the control surface over a stopped service.
    pub fn new(
        service: Arc<ServiceManager>,
        runtime: Handle,
        credentials: Box<dyn CredentialStore>,
        ui: &UiConfig,
    ) -> Self {
        let stored = match credentials.get() {
            Ok(secret) => secret,
            Err(e) => {
                warn!(error = %e, "Could not read stored token");
                None
            }
        };

        let mut tabs = service.plugin_names();
        tabs.push(HOST_SETTINGS_KEY.to_string());

        let mut console = ConsoleLog::new(ui.max_log_lines, ui.max_line_len);
        console.set_secret(stored.clone());
        console.push(&format!("Loaded {} controller(s)", tabs.len() - 1));

        Self {
            service,
            runtime,
            credentials,
            token_input: stored.map(|s| s.expose().to_string()).unwrap_or_default(),
            tabs,
            selected_tab: 0,
            selected_field: 0,
            mode: AppMode::default(),
            console,
            search: String::new(),
            status_message: None,
            should_quit: false,
            #[cfg(test)]
            loopback: None,
        }
    }

    /// App over a loopback client with the built-in controllers, rooted in `dir`.
    #[cfg(test)]
    pub fn new_test(dir: &std::path::Path, runtime: Handle) -> Self {
        use crate::plugin::{catalog, ControllerRegistry};
        use crate::security::MemoryCredentialStore;
        use crate::service::{LoopbackClient, ServiceOptions};
        use crate::settings::SettingsStore;

        let units = dir.join("units");
        let _ = catalog::write_default_units(&units, false);
        let store = SettingsStore::new(dir.join("settings.json"));
        let registry = ControllerRegistry::discover(&units, &store);
        let (client, handle) = LoopbackClient::new("ctrlbot#0001");
        let service =
            Arc::new(ServiceManager::new(registry, store, Arc::new(client), ServiceOptions::default()));
        let mut app =
            Self::new(service, runtime, Box::new(MemoryCredentialStore::new()), &UiConfig::default());
        app.loopback = Some(handle);
        app
    }

    /// Run one intent and report it.
    pub fn dispatch(&mut self, intent: Intent) -> Outcome {
        let quiet = matches!(
            &intent,
            Intent::Edit { edit: SettingEdit::Append(_) | SettingEdit::Backspace, .. }
        );
        let outcome = match intent {
            Intent::RequestStart(credential) => self.start(&credential),
            Intent::RequestStop => match self.runtime.block_on(self.service.stop()) {
                Ok(()) => Outcome::ok("Bot stopped"),
                Err(e) => Outcome::fail(e.to_string()),
            },
            Intent::Edit { plugin, key, edit } => {
                match self.service.apply_edit(&plugin, &key, &edit) {
                    Ok(value) => Outcome::ok(self.saved_note(format!("{plugin}.{key} = {value}"))),
                    Err(e) => Outcome::fail(e.to_string()),
                }
            }
            Intent::ResetPlugin(plugin) => match self.service.reset_plugin(&plugin) {
                Ok(_) => Outcome::ok(self.saved_note(format!("{plugin} reset to defaults"))),
                Err(e) => Outcome::fail(e.to_string()),
            },
            Intent::ListPlugins => {
                Outcome::ok(format!("Controllers: {}", self.service.plugin_names().join(", ")))
            }
            Intent::RescanPlugins => self.rescan(),
        };

        self.drain_events();
        if !outcome.success {
            self.console.push_error(&outcome.message);
        } else if !quiet {
            self.console.push(&outcome.message);
        }
        debug!(success = outcome.success, message = %outcome.message, "Intent handled");
        self.status_message = Some(outcome.clone());
        outcome
    }

    fn start(&mut self, credential: &SecretValue) -> Outcome {
        self.console.set_secret(Some(credential.clone()));
        match self.runtime.block_on(self.service.start(credential)) {
            Ok(plugins) => {
                if let Err(e) = self.credentials.set(credential) {
                    warn!(error = %e, "Token not saved");
                    self.console.push_error(&format!("Token not saved: {e}"));
                }
                Outcome::ok(format!("Bot started with {} controller(s)", plugins.len()))
            }
            Err(e) => Outcome::fail(e.to_string()),
        }
    }

    /// Move service events into the console.
    fn drain_events(&mut self) {
        for event in self.service.poll_events() {
            self.console.push(&event.describe());
        }
    }

    /// Periodic tick: notice dropped connections and pull events.
    pub fn tick(&mut self) {
        if let Some(reason) = self.runtime.block_on(self.service.reap()) {
            self.set_status(Outcome::fail(format!("Bot disconnected: {reason}")));
        }
        self.drain_events();
    }

    pub fn state(&self) -> ServiceState {
        self.service.state()
    }

    pub fn set_status(&mut self, outcome: Outcome) {
        self.status_message = Some(outcome);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    // --- Start / stop ---

    /// Start with the token field, or stop if running.
    pub fn toggle_service(&mut self) -> Outcome {
        match self.state() {
            ServiceState::Running => self.dispatch(Intent::RequestStop),
            _ => {
                let credential = SecretValue::new(self.token_input.trim());
                self.dispatch(Intent::RequestStart(credential))
            }
        }
    }

    /// Token field with every character masked.
    pub fn masked_token(&self) -> String {
        "*".repeat(self.token_input.chars().count())
    }

    pub fn enter_token_char(&mut self, c: char) {
        if !c.is_control() {
            self.token_input.push(c);
        }
    }

    pub fn delete_token_char(&mut self) {
        self.token_input.pop();
    }

    pub fn paste_token(&mut self, text: &str) {
        self.token_input.extend(text.chars().filter(|c| !c.is_control()));
    }

    // --- Tabs and fields ---

    pub fn current_tab(&self) -> Option<&str> {
        self.tabs.get(self.selected_tab).map(String::as_str)
    }

    /// Settings shown for the current tab.
    pub fn current_settings(&self) -> Settings {
        let Some(plugin) = self.current_tab() else {
            return Settings::new();
        };
        self.service
            .pending(plugin)
            .or_else(|| self.service.defaults_for(plugin).ok())
            .unwrap_or_default()
    }

    /// Key and kind of the selected setting.
    pub fn selected_setting(&self) -> Option<(String, SettingKind)> {
        let plugin = self.current_tab()?;
        let settings = self.current_settings();
        let key = settings.keys().nth(self.selected_field)?.to_string();
        let kind = self
            .service
            .setting_kind(plugin, &key)
            .unwrap_or_else(|_| settings.get(&key).map_or(SettingKind::Str, SettingValue::kind));
        Some((key, kind))
    }

    pub fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.selected_tab = (self.selected_tab + 1) % self.tabs.len();
            self.selected_field = 0;
        }
    }

    pub fn previous_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.selected_tab = self.selected_tab.checked_sub(1).unwrap_or(self.tabs.len() - 1);
            self.selected_field = 0;
        }
    }

    pub fn next_field(&mut self) {
        let count = self.current_settings().len();
        if count > 0 {
            self.selected_field = (self.selected_field + 1) % count;
        }
    }

    pub fn previous_field(&mut self) {
        let count = self.current_settings().len();
        if count > 0 {
            self.selected_field = self.selected_field.checked_sub(1).unwrap_or(count - 1);
        }
    }

    /// Send an edit of the selected setting.
    pub fn edit_selected(&mut self, edit: SettingEdit) -> Option<Outcome> {
        let plugin = self.current_tab()?.to_string();
        let (key, _) = self.selected_setting()?;
        Some(self.dispatch(Intent::Edit { plugin, key, edit }))
    }

    /// Toggle a flag, or start typing into a text or number field.
    pub fn activate_selected(&mut self) {
        match self.selected_setting() {
            Some((_, SettingKind::Bool)) => {
                self.edit_selected(SettingEdit::Toggle);
            }
            Some(_) => self.mode = AppMode::EditingField,
            None => {}
        }
    }

    /// Append pasted text to the selected field.
    pub fn paste_into_selected(&mut self, text: &str) -> Option<Outcome> {
        let plugin = self.current_tab()?;
        let (key, kind) = self.selected_setting()?;
        if kind == SettingKind::Bool {
            return None;
        }
        let current = self.service.pending(plugin).and_then(|s| s.get(&key).map(SettingValue::as_text));
        let combined = format!("{}{}", current.unwrap_or_default(), text.replace(['\n', '\r'], ""));
        self.edit_selected(SettingEdit::Text(combined))
    }

    // --- Reset ---

    pub fn ask_reset(&mut self) {
        if self.current_tab().is_some() {
            self.mode = AppMode::ConfirmReset;
        }
    }

    pub fn confirm_reset(&mut self) {
        self.mode = AppMode::Normal;
        if let Some(plugin) = self.current_tab().map(str::to_string) {
            self.dispatch(Intent::ResetPlugin(plugin));
        }
    }

    pub fn cancel_reset(&mut self) {
        self.mode = AppMode::Normal;
    }

    // --- Console search ---

    pub fn enter_search_char(&mut self, c: char) {
        if !c.is_control() {
            self.search.push(c);
        }
    }

    pub fn delete_search_char(&mut self) {
        self.search.pop();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Console lines matching the search filter.
    pub fn visible_console(&self) -> Vec<&ConsoleLine> {
        self.console.filtered(&self.search)
    }

    // --- Help / quit ---

    pub fn show_help(&mut self) {
        self.mode = AppMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.mode = AppMode::Normal;
    }

    // --- Discovery ---

    fn rescan(&mut self) -> Outcome {
        let added = self.service.rescan();
        if added.is_empty() {
            return Outcome::ok("No new controllers");
        }

        let on_host = self.current_tab() == Some(HOST_SETTINGS_KEY);
        let at = self.tabs.iter().position(|t| t == HOST_SETTINGS_KEY).unwrap_or(self.tabs.len());
        self.tabs.splice(at..at, added.iter().cloned());
        if on_host {
            self.selected_tab += added.len();
        }

        let mut message = format!("Found {} new controller(s): {}", added.len(), added.join(", "));
        if self.state() == ServiceState::Running {
            message.push_str(" (active on next start)");
        }
        Outcome::ok(message)
    }

    fn saved_note(&self, message: String) -> String {
        if self.service.has_unsaved_changes() {
            format!("{message} (not saved)")
        } else {
            message
        }
    }

    /// Quit, stopping the service first if it is running.
    pub fn quit(&mut self) {
        if self.state() == ServiceState::Running {
            self.dispatch(Intent::RequestStop);
        }
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{catalog, ControllerRegistry};
    use crate::security::MemoryCredentialStore;
    use crate::service::{LoopbackClient, ServiceOptions};
    use crate::settings::SettingsStore;
    use tempfile::TempDir;
    use tokio::runtime::Runtime;

    fn app_with(dir: &TempDir, rt: &Runtime, credentials: MemoryCredentialStore) -> App {
        let units = dir.path().join("units");
        catalog::write_default_units(&units, false).unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let registry = ControllerRegistry::discover(&units, &store);
        let (client, handle) = LoopbackClient::new("ctrlbot#0001");
        let service = Arc::new(ServiceManager::new(
            registry,
            store,
            Arc::new(client),
            ServiceOptions::default(),
        ));
        let mut app = App::new(service, rt.handle().clone(), Box::new(credentials), &UiConfig::default());
        app.loopback = Some(handle);
        app
    }

    #[test]
    fn test_tabs_end_with_host_entry() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let app = app_with(&dir, &rt, MemoryCredentialStore::new());

        assert_eq!(app.tabs, vec!["ControllerAdmin", "ControllerPing", HOST_SETTINGS_KEY]);
        assert_eq!(app.current_tab(), Some("ControllerAdmin"));
    }

    #[test]
    fn test_list_plugins() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = app_with(&dir, &rt, MemoryCredentialStore::new());

        let outcome = app.dispatch(Intent::ListPlugins);
        assert!(outcome.success);
        assert_eq!(outcome.message, "Controllers: ControllerAdmin, ControllerPing");
    }

    #[test]
    fn test_rescan_adds_tabs_before_host_entry() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let units = dir.path().join("units");
        std::fs::create_dir_all(&units).unwrap();
        std::fs::write(units.join("controller_ping.toml"), "[unit]\ncontrollers = [\"ControllerPing\"]\n")
            .unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let registry = ControllerRegistry::discover(&units, &store);
        let (client, handle) = LoopbackClient::new("ctrlbot#0001");
        let service =
            Arc::new(ServiceManager::new(registry, store, Arc::new(client), ServiceOptions::default()));
        let mut app = App::new(
            service,
            rt.handle().clone(),
            Box::new(MemoryCredentialStore::new()),
            &UiConfig::default(),
        );
        app.loopback = Some(handle);

        let outcome = app.dispatch(Intent::RescanPlugins);
        assert_eq!(outcome.message, "No new controllers");

        std::fs::write(units.join("controller_zz.toml"), "[unit]\ncontrollers = [\"ControllerAdmin\"]\n")
            .unwrap();
        app.previous_tab();
        assert_eq!(app.current_tab(), Some(HOST_SETTINGS_KEY));

        let outcome = app.dispatch(Intent::RescanPlugins);
        assert!(outcome.success);
        assert_eq!(outcome.message, "Found 1 new controller(s): ControllerAdmin");
        assert_eq!(app.tabs, vec!["ControllerPing", "ControllerAdmin", HOST_SETTINGS_KEY]);
        assert_eq!(app.current_tab(), Some(HOST_SETTINGS_KEY));
        assert_eq!(
            app.service.pending("ControllerAdmin").unwrap().int_or("default_mute_duration", 0),
            60
        );
    }

    #[test]
    fn test_unsaved_edit_is_flagged() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = app_with(&dir, &rt, MemoryCredentialStore::new());
        let path = dir.path().join("settings.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let outcome = app.dispatch(Intent::Edit {
            plugin: "ControllerPing".into(),
            key: "enabled".into(),
            edit: SettingEdit::Toggle,
        });
        assert!(outcome.success);
        assert_eq!(outcome.message, "ControllerPing.enabled = false (not saved)");

        std::fs::remove_dir(&path).unwrap();
        let outcome = app.dispatch(Intent::ResetPlugin("ControllerPing".into()));
        assert_eq!(outcome.message, "ControllerPing reset to defaults");
    }

    #[test]
    fn test_start_without_token_is_rejected() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = app_with(&dir, &rt, MemoryCredentialStore::new());

        let outcome = app.toggle_service();
        assert!(!outcome.success);
        assert_eq!(app.state(), ServiceState::Stopped);
        assert!(app.console.filtered("token").iter().any(|l| l.is_error));
    }

    #[test]
    fn test_start_saves_token_and_stop() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = app_with(&dir, &rt, MemoryCredentialStore::new());
        app.paste_token("abc.def.ghi");

        let outcome = app.toggle_service();
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(app.state(), ServiceState::Running);
        assert_eq!(app.credentials.get().unwrap(), Some(SecretValue::new("abc.def.ghi")));

        let outcome = app.toggle_service();
        assert!(outcome.success);
        assert_eq!(app.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_stored_token_prefills_field() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let app = app_with(&dir, &rt, MemoryCredentialStore::with_secret(SecretValue::new("tok1")));

        assert_eq!(app.token_input, "tok1");
        assert_eq!(app.masked_token(), "****");
    }

    #[test]
    fn test_toggle_selected_flag() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = app_with(&dir, &rt, MemoryCredentialStore::new());
        app.next_tab();

        assert_eq!(app.selected_setting(), Some(("enabled".to_string(), SettingKind::Bool)));
        app.activate_selected();

        assert_eq!(app.current_settings().bool("enabled"), Some(false));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_integer_field_rejects_letters() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = app_with(&dir, &rt, MemoryCredentialStore::new());
        while app.selected_setting().map(|(k, _)| k) != Some("default_mute_duration".to_string()) {
            app.next_field();
        }

        app.activate_selected();
        assert_eq!(app.mode, AppMode::EditingField);

        let outcome = app.edit_selected(SettingEdit::Append('x')).unwrap();
        assert!(!outcome.success);
        assert_eq!(app.current_settings().int_or("default_mute_duration", 0), 60);

        let outcome = app.edit_selected(SettingEdit::Append('5')).unwrap();
        assert!(outcome.success);
        assert_eq!(app.current_settings().int_or("default_mute_duration", 0), 605);
    }

    #[test]
    fn test_reset_confirmation() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = app_with(&dir, &rt, MemoryCredentialStore::new());
        app.next_tab();
        app.activate_selected();

        app.ask_reset();
        assert_eq!(app.mode, AppMode::ConfirmReset);
        app.confirm_reset();

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.current_settings().bool("enabled"), Some(true));
    }

    #[test]
    fn test_quit_stops_running_service() {
        let dir = TempDir::new().unwrap();
        let rt = Runtime::new().unwrap();
        let mut app = app_with(&dir, &rt, MemoryCredentialStore::new());
        app.token_input = "abc.def.ghi".to_string();
        app.toggle_service();

        app.quit();
        assert!(app.should_quit);
        assert_eq!(app.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_console_masks_token() {
        let mut console = ConsoleLog::new(10, 200);
        console.set_secret(Some(SecretValue::new("abc.def.ghi")));
        console.push("Logging in with abc.def.ghi");

        assert_eq!(console.filtered("")[0].text, "Logging in with [HIDDEN]");
    }

    #[test]
    fn test_console_is_bounded_and_truncates() {
        let mut console = ConsoleLog::new(3, 10);
        for i in 0..5 {
            console.push(&format!("line {i}"));
        }
        console.push("a very long console line");

        assert_eq!(console.len(), 3);
        let lines = console.filtered("");
        assert_eq!(lines[0].text, "line 3");
        assert_eq!(lines[2].text, "a very ...");
    }

    #[test]
    fn test_console_filter_ignores_case() {
        let mut console = ConsoleLog::new(10, 200);
        console.push("Bot stopped");
        console.push_error("Failed to start bot: timeout");
        console.push("Controllers: ControllerPing");

        let hits = console.filtered("BOT");
        assert_eq!(hits.len(), 2);
        assert!(hits[1].is_error);
    }
}
