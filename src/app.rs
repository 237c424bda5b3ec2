//! Application state management for the KubeGraf console
//!
//! This module contains the main application state, handling keyboard input,
//! data loading through the resource cache, and state transitions between
//! the resource table, YAML view and confirmation prompts.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::cache::{CacheEvent, CacheOptions, CachedResource, ResourceCache, Scope};
use crate::cli::StartupConfig;
use crate::refresh::RefreshMessage;
use crate::resources::{Action, ResourceKind, ResourceRef, ResourceRow};

/// Cache key for the namespace list
pub const NAMESPACES_KEY: &str = "namespaces";

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching data
    Loading,
    /// Table of resources for the selected kind
    ResourceList,
    /// Read-only YAML manifest for one resource
    YamlView { target: ResourceRef, yaml: String },
    /// Waiting for the user to confirm a delete
    ConfirmDelete(ResourceRef),
    /// Collecting a replica count for a scale
    ScaleInput { target: ResourceRef, input: String },
}

/// Work requested by a key press that needs I/O
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the current kind through the cache
    Load,
    /// Force a refetch of the current kind
    Refetch,
    ViewYaml(ResourceRef),
    /// Open the manifest in `$EDITOR`; driven by the main loop
    EditYaml(ResourceRef),
    Delete(ResourceRef),
    Scale(ResourceRef, u32),
    Restart(ResourceRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// One-line notification shown under the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Index into `ResourceKind::all()` of the visible kind
    pub kind_index: usize,
    /// Index of currently selected row
    pub selected_index: usize,
    /// Cluster and namespace selection
    pub scope: Scope,
    /// Namespaces known to the backend, for cycling with `n`
    pub namespaces: Vec<String>,
    /// Latest notification
    pub status: Option<StatusMessage>,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Scroll offset for the YAML view
    pub yaml_scroll: u16,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    table: Option<CachedResource<Vec<ResourceRow>>>,
    pending: Option<Command>,
    cache: ResourceCache,
    api: ApiClient,
    options: CacheOptions,
}

impl App {
    /// Creates a new App bound to `cache`, switching it to `scope`
    pub fn new(api: ApiClient, cache: ResourceCache, scope: Scope, options: CacheOptions) -> Self {
        cache.set_scope(scope.key());
        Self {
            state: AppState::Loading,
            kind_index: 0,
            selected_index: 0,
            scope,
            namespaces: Vec::new(),
            status: None,
            show_help: false,
            yaml_scroll: 0,
            should_quit: false,
            table: None,
            pending: None,
            cache,
            api,
            options,
        }
    }

    /// Applies CLI startup options such as `--view`
    pub fn with_startup_config(mut self, config: StartupConfig) -> Self {
        if let Some(kind) = config.initial_kind {
            self.kind_index = ResourceKind::all()
                .iter()
                .position(|k| *k == kind)
                .unwrap_or(0);
        }
        self
    }

    /// Shows `rows` for `kind` as if they had been fetched (for testing)
    #[cfg(test)]
    pub(crate) async fn with_rows(mut self, kind: ResourceKind, rows: Vec<ResourceRow>) -> Self {
        self = self.with_startup_config(StartupConfig {
            initial_kind: Some(kind),
        });
        let table = self
            .cache
            .get(
                kind.cache_key(),
                move || futures::future::ready(Ok::<_, crate::cache::FetchError>(rows.clone())),
                self.options,
            )
            .await
            .expect("test rows cached");
        self.table = Some(table);
        self.state = AppState::ResourceList;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The kind whose table is on screen
    pub fn current_kind(&self) -> ResourceKind {
        ResourceKind::all()[self.kind_index % ResourceKind::all().len()]
    }

    /// Cache key of the visible table
    pub fn cache_key(&self) -> &'static str {
        self.current_kind().cache_key()
    }

    /// Rows of the visible table that belong to the selected namespaces
    pub fn rows(&self) -> Vec<ResourceRow> {
        let Some(data) = self.table.as_ref().and_then(|table| table.data()) else {
            return Vec::new();
        };
        data.iter()
            .filter(|row| self.scope.includes(row.target.namespace.as_deref()))
            .cloned()
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Returns the currently selected row, if any
    pub fn selected_row(&self) -> Option<ResourceRow> {
        self.rows().into_iter().nth(self.selected_index)
    }

    /// True while the visible table is being fetched in the foreground
    pub fn is_loading(&self) -> bool {
        self.table.as_ref().is_some_and(|table| table.loading())
    }

    /// Last fetch error for the visible table
    pub fn table_error(&self) -> Option<String> {
        self.table
            .as_ref()
            .and_then(|table| table.error())
            .map(|error| error.message().to_string())
    }

    /// Age of the visible table's data
    pub fn data_age(&self) -> Option<Duration> {
        self.table.as_ref().and_then(|table| table.age())
    }

    /// Takes the command queued by the last key press
    pub fn take_command(&mut self) -> Option<Command> {
        self.pending.take()
    }

    /// Loads the namespace list and the initial table
    pub async fn load_initial_data(&mut self) {
        self.load_namespaces().await;
        self.load_current_kind().await;
    }

    /// Fetches the namespace list through the cache
    pub async fn load_namespaces(&mut self) {
        let api = self.api.clone();
        let result = self
            .cache
            .get(
                NAMESPACES_KEY,
                move || {
                    let api = api.clone();
                    async move { api.namespaces().await }
                },
                self.options,
            )
            .await;

        match result {
            Ok(handle) => {
                if let Some(namespaces) = handle.data() {
                    self.namespaces = namespaces.as_ref().clone();
                } else if let Some(error) = handle.error() {
                    warn!(%error, "could not load namespaces");
                }
            }
            Err(e) => warn!(error = %e, "namespace cache lookup failed"),
        }
    }

    /// Loads the visible kind through the cache
    ///
    /// Returns as soon as a cached value can be shown; a stale value is
    /// refreshed behind the table when background refresh is enabled.
    pub async fn load_current_kind(&mut self) {
        let kind = self.current_kind();
        let api = self.api.clone();
        let namespace = if kind.is_namespaced() {
            self.scope.namespace_param().map(str::to_string)
        } else {
            None
        };
        debug!(kind = kind.cache_key(), ?namespace, "loading resource list");

        let result = self
            .cache
            .get(
                kind.cache_key(),
                move || {
                    let api = api.clone();
                    let namespace = namespace.clone();
                    async move { api.list(kind, namespace.as_deref()).await }
                },
                self.options,
            )
            .await;

        match result {
            Ok(table) => {
                match table.error() {
                    Some(error) => {
                        self.status = Some(StatusMessage::error(format!(
                            "Failed to load {}: {}",
                            kind.title(),
                            error
                        )))
                    }
                    None => self.clear_error_status(),
                }
                self.table = Some(table);
            }
            Err(e) => {
                self.table = None;
                self.status = Some(StatusMessage::error(e.to_string()));
            }
        }

        if self.state == AppState::Loading {
            self.state = AppState::ResourceList;
        }
        self.clamp_selection();
    }

    /// Forces a refetch of the visible table
    pub async fn refetch_current_kind(&mut self) {
        let Some(table) = self.table.clone() else {
            self.load_current_kind().await;
            return;
        };
        match table.refetch().await {
            Ok(()) => match table.error() {
                Some(error) => {
                    self.status = Some(StatusMessage::error(format!("Refresh failed: {}", error)))
                }
                None => {
                    self.status = Some(StatusMessage::info(format!(
                        "{} refreshed",
                        self.current_kind().title()
                    )))
                }
            },
            Err(e) => self.status = Some(StatusMessage::error(e.to_string())),
        }
        self.clamp_selection();
    }

    /// Executes a queued command
    pub async fn run_command(&mut self, command: Command) {
        match command {
            Command::Load => self.load_current_kind().await,
            Command::Refetch => self.refetch_current_kind().await,
            Command::ViewYaml(target) => match self.api.get_yaml(&target).await {
                Ok(yaml) => {
                    self.yaml_scroll = 0;
                    self.state = AppState::YamlView { target, yaml };
                }
                Err(e) => {
                    self.status = Some(StatusMessage::error(format!(
                        "Failed to load YAML for {}: {}",
                        target.display_name(),
                        e
                    )));
                }
            },
            Command::EditYaml(target) => {
                // The editor needs the terminal; the main loop handles this one.
                self.pending = Some(Command::EditYaml(target));
            }
            Command::Delete(target) => {
                let result = self.api.delete(&target).await;
                self.finish_mutation(&target, "Deleted", "Delete", result).await;
            }
            Command::Scale(target, replicas) => {
                let result = self.api.scale(&target, replicas).await;
                let verb = format!("Scaled to {} replicas:", replicas);
                self.finish_mutation(&target, &verb, "Scale", result).await;
            }
            Command::Restart(target) => {
                let result = self.api.restart(&target).await;
                self.finish_mutation(&target, "Restarted", "Restart", result)
                    .await;
            }
        }
    }

    /// Saves an edited manifest and refreshes the table
    pub async fn save_yaml(&mut self, target: &ResourceRef, yaml: String) {
        let result = self.api.update_yaml(target, yaml).await;
        self.finish_mutation(target, "Updated", "Update", result).await;
    }

    async fn finish_mutation(
        &mut self,
        target: &ResourceRef,
        done: &str,
        action: &str,
        result: Result<(), ApiError>,
    ) {
        match result {
            Ok(()) => {
                info!(resource = %target.display_name(), kind = target.kind.cache_key(), "{} succeeded", action);
                self.refetch_current_kind().await;
                let done = format!("{} {}", done, target.display_name());
                self.status = Some(match self.table_error() {
                    Some(error) => {
                        warn!(%error, "refresh after {} failed", action);
                        StatusMessage::error(format!("{} (refresh failed: {})", done, error))
                    }
                    None => StatusMessage::info(done),
                });
            }
            Err(e) => {
                warn!(resource = %target.display_name(), error = %e, "{} failed", action);
                self.status = Some(StatusMessage::error(format!("{} failed: {}", action, e)));
            }
        }
    }

    /// Applies a message from the background refresh task
    pub fn handle_refresh(&mut self, message: RefreshMessage) {
        match message {
            RefreshMessage::Refreshing { key } => {
                debug!(%key, "background refresh started");
            }
            RefreshMessage::Cache(CacheEvent::Updated { key }) if key == self.cache_key() => {
                if self.state == AppState::Loading {
                    self.state = AppState::ResourceList;
                }
                self.clear_error_status();
                self.clamp_selection();
            }
            RefreshMessage::Cache(CacheEvent::Failed { key, error }) if key == self.cache_key() => {
                self.status = Some(StatusMessage::error(format!("Refresh failed: {}", error)));
            }
            RefreshMessage::Cache(_) => {}
        }
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`: Quit the application
    /// - `Tab`/`l`/`Right`, `Shift-Tab`/`h`/`Left`: Switch resource kind
    /// - `Up`/`k`, `Down`/`j`: Move selection
    /// - `Enter`/`y`: View YAML, `e`: Edit YAML, `d`: Delete
    /// - `s`: Scale, `R`: Restart (StatefulSets)
    /// - `r`: Refetch, `n`: Cycle namespace, `?`: Help
    /// - `Esc`: Go back / cancel
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.state.clone() {
            AppState::Loading => {
                // Only quit is allowed during loading
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::ResourceList => self.handle_list_key(key_event),
            AppState::YamlView { target, .. } => match key_event.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Esc => self.state = AppState::ResourceList,
                KeyCode::Char('j') | KeyCode::Down => {
                    self.yaml_scroll = self.yaml_scroll.saturating_add(1)
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.yaml_scroll = self.yaml_scroll.saturating_sub(1)
                }
                KeyCode::PageDown => self.yaml_scroll = self.yaml_scroll.saturating_add(20),
                KeyCode::PageUp => self.yaml_scroll = self.yaml_scroll.saturating_sub(20),
                KeyCode::Char('g') => self.yaml_scroll = 0,
                KeyCode::Char('e') => {
                    self.state = AppState::ResourceList;
                    self.pending = Some(Command::EditYaml(target));
                }
                KeyCode::Char('?') => self.show_help = true,
                _ => {}
            },
            AppState::ConfirmDelete(target) => match key_event.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.state = AppState::ResourceList;
                    self.status = Some(StatusMessage::info(format!(
                        "Deleting {}...",
                        target.display_name()
                    )));
                    self.pending = Some(Command::Delete(target));
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.state = AppState::ResourceList;
                }
                _ => {}
            },
            AppState::ScaleInput { target, mut input } => match key_event.code {
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    if input.len() < 5 {
                        input.push(c);
                    }
                    self.state = AppState::ScaleInput { target, input };
                }
                KeyCode::Backspace => {
                    input.pop();
                    self.state = AppState::ScaleInput { target, input };
                }
                KeyCode::Enter => match input.parse::<u32>() {
                    Ok(replicas) => {
                        self.state = AppState::ResourceList;
                        self.pending = Some(Command::Scale(target, replicas));
                    }
                    Err(_) => {
                        self.status = Some(StatusMessage::error("Enter a replica count"));
                    }
                },
                KeyCode::Esc => self.state = AppState::ResourceList,
                _ => {}
            },
        }
    }

    fn handle_list_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection_down(),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.switch_kind(1),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.switch_kind(ResourceKind::all().len() - 1)
            }
            KeyCode::Enter | KeyCode::Char('y') => {
                if let Some(target) = self.selected_target(Action::ViewYaml) {
                    self.pending = Some(Command::ViewYaml(target));
                }
            }
            KeyCode::Char('e') => {
                if let Some(target) = self.selected_target(Action::EditYaml) {
                    self.pending = Some(Command::EditYaml(target));
                }
            }
            KeyCode::Char('d') => {
                if let Some(target) = self.selected_target(Action::Delete) {
                    self.state = AppState::ConfirmDelete(target);
                }
            }
            KeyCode::Char('s') => {
                if let Some(target) = self.selected_target(Action::Scale) {
                    self.state = AppState::ScaleInput {
                        target,
                        input: String::new(),
                    };
                }
            }
            KeyCode::Char('R') => {
                if let Some(target) = self.selected_target(Action::Restart) {
                    self.status = Some(StatusMessage::info(format!(
                        "Restarting {}...",
                        target.display_name()
                    )));
                    self.pending = Some(Command::Restart(target));
                }
            }
            KeyCode::Char('r') => self.pending = Some(Command::Refetch),
            KeyCode::Char('n') => self.cycle_namespace(),
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    /// The selected row's identity, if the visible kind supports `action`
    fn selected_target(&mut self, action: Action) -> Option<ResourceRef> {
        let kind = self.current_kind();
        if !kind.supports(action) {
            self.status = Some(StatusMessage::error(format!(
                "{} is not supported for {}",
                action.label(),
                kind.title()
            )));
            return None;
        }
        self.selected_row().map(|row| row.target)
    }

    /// Moves `steps` kinds forward, wrapping around
    fn switch_kind(&mut self, steps: usize) {
        let count = ResourceKind::all().len();
        self.kind_index = (self.kind_index + steps) % count;
        self.selected_index = 0;
        self.table = None;
        self.status = None;
        self.pending = Some(Command::Load);
    }

    /// Drops an error notice once the data behind it has recovered
    fn clear_error_status(&mut self) {
        if self
            .status
            .as_ref()
            .is_some_and(|status| status.level == StatusLevel::Error)
        {
            self.status = None;
        }
    }

    /// Cycles all namespaces -> each known namespace -> all namespaces
    fn cycle_namespace(&mut self) {
        let next = match self.scope.namespace_param() {
            None if !self.scope.is_all_namespaces() => None,
            None => self.namespaces.first().cloned(),
            Some(current) => self
                .namespaces
                .iter()
                .position(|ns| ns == current)
                .and_then(|i| self.namespaces.get(i + 1))
                .cloned(),
        };

        self.scope = Scope::new(self.scope.cluster.clone(), next.into_iter().collect());
        info!(scope = %self.scope.key(), "namespace selection changed");
        self.cache.set_scope(self.scope.key());
        self.status = Some(StatusMessage::info(format!(
            "Namespace: {}",
            self.scope.namespace_label()
        )));
        self.selected_index = 0;
        self.pending = Some(Command::Load);
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn clamp_selection(&mut self) {
        let count = self.row_count();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }
}
