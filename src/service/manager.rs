//! Service lifecycle manager.
//!
//! Owns the state machine, the pending settings document, and, while the
//! service is up, the live controller set of the current run. All of it sits
//! behind one mutex that is never held across an `.await`. The registry has
//! its own lock; when both are held the state mutex is taken first.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::client::{ChatClient, ClientSession};
use super::events::{self, EventReceiver, EventSender, ServiceEvent};
use super::{LifecycleError, NetworkError, ServiceResult, ServiceState};
use crate::core::ServiceConfig;
use crate::plugin::{CommandTable, Controller, ControllerHost, ControllerRegistry, PluginHost};
use crate::security::SecretValue;
use crate::settings::{
    host_defaults, shared, Settings, SettingsDocument, SettingsStore, SharedSettings,
    HOST_SETTINGS_KEY,
};

/// Timeouts for start and stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for ServiceOptions {
    fn from(config: &ServiceConfig) -> Self {
        Self { start_timeout: config.start_timeout(), stop_timeout: config.stop_timeout() }
    }
}

/// Controllers and command table of one run.
pub(super) struct LiveSet {
    pub(super) commands: Arc<CommandTable>,
    pub(super) host_settings: SharedSettings,
    pub(super) controllers: Vec<Box<dyn Controller>>,
}

impl LiveSet {
    pub(super) fn controller(&self, plugin: &str) -> Option<&dyn Controller> {
        self.controllers.iter().find(|c| c.name() == plugin).map(|c| &**c)
    }
}

pub(super) struct RuntimeState {
    pub(super) state: ServiceState,
    pub(super) pending: SettingsDocument,
    pub(super) live: Option<Arc<LiveSet>>,
    /// Set when the last write of an edit did not reach the disk.
    pub(super) unsaved: bool,
    task: Option<JoinHandle<Result<(), NetworkError>>>,
    user: Option<String>,
}

/// Starts and stops the chat service and keeps settings congruent.
pub struct ServiceManager {
    pub(super) registry: RwLock<ControllerRegistry>,
    pub(super) store: SettingsStore,
    client: Arc<dyn ChatClient>,
    options: ServiceOptions,
    pub(super) inner: Mutex<RuntimeState>,
    events_tx: EventSender,
    events_rx: Mutex<EventReceiver>,
}

impl std::fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceManager")
            .field("state", &self.state())
            .field("plugins", &self.plugin_names())
            .field("store", &self.store.path())
            .finish_non_exhaustive()
    }
}

impl ServiceManager {
    /// Create a stopped manager.
    ///
    /// Pending settings are loaded from the store merged over every plugin's
    /// defaults; a missing settings file is created from the defaults.
    pub fn new(
        registry: ControllerRegistry,
        store: SettingsStore,
        client: Arc<dyn ChatClient>,
        options: ServiceOptions,
    ) -> Self {
        let defaults = registry.defaults_document();
        let pending = store.load_document(&defaults);
        let unsaved = match store.ensure_initialized(&pending) {
            Ok(true) => {
                info!(path = %store.path().display(), "Created settings file");
                false
            }
            Ok(false) => false,
            Err(e) => {
                warn!(error = %e, "Could not create settings file");
                true
            }
        };

        let (events_tx, events_rx) = events::channel();
        Self {
            registry: RwLock::new(registry),
            store,
            client,
            options,
            inner: Mutex::new(RuntimeState {
                state: ServiceState::Stopped,
                pending,
                live: None,
                unsaved,
                task: None,
                user: None,
            }),
            events_tx,
            events_rx: Mutex::new(events_rx),
        }
    }

    /// Copy of the current registry.
    pub fn registry(&self) -> ControllerRegistry {
        self.registry.read().clone()
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn state(&self) -> ServiceState {
        self.inner.lock().state
    }

    /// Account the client is logged in as, while running.
    pub fn user(&self) -> Option<String> {
        self.inner.lock().user.clone()
    }

    /// Plugin names in discovery order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.registry.read().names()
    }

    /// True while an edit or reset has not reached the disk.
    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.lock().unsaved
    }

    /// Pick up controller units added since the last scan.
    ///
    /// New plugins get their stored settings merged over their defaults in
    /// the pending document. They join the live set on the next start.
    /// Returns the names of the added plugins.
    pub fn rescan(&self) -> Vec<String> {
        let added: Vec<(String, Settings)> = {
            let mut registry = self.registry.write();
            let names = registry.rescan(&self.store);
            names
                .into_iter()
                .filter_map(|name| {
                    let defaults = registry.get(&name)?.defaults().clone();
                    Some((name, defaults))
                })
                .collect()
        };
        if added.is_empty() {
            debug!("Rescan found no new controllers");
            return Vec::new();
        }

        let mut inner = self.inner.lock();
        for (name, defaults) in &added {
            let settings = self.store.load(name, defaults);
            inner.pending.insert(name.clone(), settings);
        }
        inner.unsaved = match self.store.write_document(&inner.pending) {
            Ok(()) => false,
            Err(e) => {
                warn!(error = %e, "Rescanned settings not persisted");
                true
            }
        };

        let names: Vec<String> = added.into_iter().map(|(name, _)| name).collect();
        info!(plugins = ?names, "Controllers added");
        names
    }

    /// Pending settings of a plugin or the host entry.
    pub fn pending(&self, plugin: &str) -> Option<Settings> {
        self.inner.lock().pending.get(plugin).cloned()
    }

    /// Copy of the whole pending document.
    pub fn pending_document(&self) -> SettingsDocument {
        self.inner.lock().pending.clone()
    }

    /// Live settings of a plugin or the host entry, if a run is active.
    pub fn live_settings(&self, plugin: &str) -> Option<Settings> {
        let live = self.inner.lock().live.clone()?;
        if plugin == HOST_SETTINGS_KEY {
            return Some(live.host_settings.read().clone());
        }
        live.controller(plugin).map(|c| c.snapshot())
    }

    /// Commands registered by the current run.
    pub fn active_commands(&self) -> Vec<String> {
        self.inner.lock().live.as_ref().map(|live| live.commands.names()).unwrap_or_default()
    }

    /// Command table and host settings of the current run.
    pub fn live_commands(&self) -> Option<(Arc<CommandTable>, SharedSettings)> {
        let inner = self.inner.lock();
        let live = inner.live.as_ref()?;
        Some((Arc::clone(&live.commands), Arc::clone(&live.host_settings)))
    }

    /// Sender for extra console lines.
    pub fn event_sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    /// Drain pending events without blocking.
    pub fn poll_events(&self) -> Vec<ServiceEvent> {
        let mut rx = self.events_rx.lock();
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub(super) fn emit(&self, event: ServiceEvent) {
        // The receiver lives in self, so this only fails during teardown.
        let _ = self.events_tx.send(event);
    }

    /// Start the service with `credential`.
    ///
    /// Returns the names of the now-active plugins.
    pub async fn start(&self, credential: &SecretValue) -> ServiceResult<Vec<String>> {
        if credential.is_empty() {
            warn!("Start rejected: no token");
            return Err(LifecycleError::MissingCredential.into());
        }

        let live = {
            let mut inner = self.inner.lock();
            if inner.state != ServiceState::Stopped {
                warn!(state = %inner.state, "Start rejected");
                return Err(LifecycleError::NotStopped(inner.state).into());
            }
            inner.state.transition(ServiceState::Starting)?;

            // Flush pending so live controllers load exactly what the user sees.
            if let Err(e) = self.store.write_document(&inner.pending) {
                debug!(error = %e, "Starting with unsaved pending settings");
            }
            let live = Arc::new(self.build_live_set(&inner.pending));
            inner.live = Some(Arc::clone(&live));
            live
        };
        self.emit(ServiceEvent::Starting);
        info!(commands = ?live.commands.names(), "Starting service");

        let (ready_tx, ready_rx) = oneshot::channel();
        let session = ClientSession {
            commands: Arc::clone(&live.commands),
            host_settings: Arc::clone(&live.host_settings),
            ready: ready_tx,
        };
        let client = Arc::clone(&self.client);
        let credential = credential.clone();
        let mut task = tokio::spawn(async move { client.start(credential, session).await });

        let handshake = match tokio::time::timeout(self.options.start_timeout, ready_rx).await {
            Ok(Ok(user)) => Ok(user),
            Ok(Err(_)) => Err(match (&mut task).await {
                Ok(Err(e)) => e,
                Ok(Ok(())) => NetworkError::Closed("client exited before it was ready".into()),
                Err(e) => NetworkError::Connection(e.to_string()),
            }),
            Err(_) => {
                match tokio::time::timeout(self.options.stop_timeout, self.client.stop()).await {
                    Ok(Ok(())) => debug!("Client closed after start timeout"),
                    Ok(Err(e)) => warn!(error = %e, "Client shutdown after start timeout failed"),
                    Err(_) => warn!("Client shutdown after start timeout timed out"),
                }
                task.abort();
                Err(NetworkError::Timeout(
                    u64::try_from(self.options.start_timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        };

        match handshake {
            Ok(user) => {
                let plugins: Vec<String> =
                    live.controllers.iter().map(|c| c.name().to_string()).collect();
                {
                    let mut inner = self.inner.lock();
                    inner.state.transition(ServiceState::Running)?;
                    inner.task = Some(task);
                    inner.user = Some(user.clone());
                }
                info!(user = %user, plugins = ?plugins, "Service running");
                self.emit(ServiceEvent::Ready { user, plugins: plugins.clone() });
                Ok(plugins)
            }
            Err(e) => {
                {
                    let mut inner = self.inner.lock();
                    inner.live = None;
                    inner.state.transition(ServiceState::Stopped)?;
                }
                error!(error = %e, "Service failed to start");
                self.emit(ServiceEvent::StartFailed { reason: e.to_string() });
                Err(e.into())
            }
        }
    }

    /// Stop the running service.
    ///
    /// Always ends in `Stopped`; shutdown problems are logged, not returned.
    pub async fn stop(&self) -> ServiceResult<()> {
        let task = {
            let mut inner = self.inner.lock();
            if inner.state != ServiceState::Running {
                warn!(state = %inner.state, "Stop rejected");
                return Err(LifecycleError::NotRunning(inner.state).into());
            }
            inner.state.transition(ServiceState::Stopping)?;
            inner.task.take()
        };
        self.emit(ServiceEvent::Stopping);
        info!("Stopping service");

        match tokio::time::timeout(self.options.stop_timeout, self.client.stop()).await {
            Ok(Ok(())) => debug!("Client closed"),
            Ok(Err(e)) => warn!(error = %e, "Client shutdown failed"),
            Err(_) => warn!("Client shutdown timed out"),
        }

        if let Some(mut task) = task {
            match tokio::time::timeout(self.options.stop_timeout, &mut task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => warn!(error = %e, "Client ended with an error"),
                Ok(Err(e)) => warn!(error = %e, "Client task failed"),
                Err(_) => {
                    warn!("Client task did not finish, cancelling");
                    task.abort();
                }
            }
        }

        self.finish_stop()?;
        self.emit(ServiceEvent::Stopped);
        info!("Service stopped");
        Ok(())
    }

    /// Notice a client task that ended on its own while running.
    ///
    /// Returns the disconnect reason if the service was torn down.
    pub async fn reap(&self) -> Option<String> {
        let task = {
            let mut inner = self.inner.lock();
            if inner.state != ServiceState::Running {
                return None;
            }
            match &inner.task {
                Some(task) if task.is_finished() => {}
                _ => return None,
            }
            inner.state.transition(ServiceState::Stopping).ok()?;
            inner.task.take()
        }?;

        let reason = match task.await {
            Ok(Ok(())) => "connection closed".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };
        warn!(reason = %reason, "Client disconnected");

        if let Err(e) = self.finish_stop() {
            error!(error = %e, "Failed to settle service state");
        }
        self.emit(ServiceEvent::Disconnected { reason: reason.clone() });
        self.emit(ServiceEvent::Stopped);
        Some(reason)
    }

    fn finish_stop(&self) -> ServiceResult<()> {
        let mut inner = self.inner.lock();
        inner.live = None;
        inner.user = None;
        inner.state.transition(ServiceState::Stopped)?;
        Ok(())
    }

    /// Instantiate every plugin for a new run.
    fn build_live_set(&self, pending: &SettingsDocument) -> LiveSet {
        let commands = Arc::new(CommandTable::new());
        let host: Arc<dyn PluginHost> = Arc::new(ControllerHost::new(
            self.store.clone(),
            Arc::clone(&commands),
            self.events_tx.clone(),
        ));

        let controllers = self.registry.read().instantiate_all(&host);
        for controller in &controllers {
            // Pending wins if the flush before start did not reach the disk.
            if let Some(settings) = pending.get(controller.name()) {
                *controller.settings().write() = settings.clone();
            }
        }

        let host_settings =
            shared(pending.get(HOST_SETTINGS_KEY).cloned().unwrap_or_else(host_defaults));
        LiveSet { commands, host_settings, controllers }
    }
}
