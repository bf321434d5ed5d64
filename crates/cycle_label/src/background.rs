//! Deciding which navigations get the content script.

use label_config::{Config, StorageChange, UrlFilter};
use log::{debug, info};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStatus {
    Loading,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub tab_id: u32,
    pub url: Url,
    pub status: NavigationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Filtered navigation listeners. A listener with no filters hears every navigation.
#[derive(Debug, Default)]
pub struct NavigationEvents {
    listeners: Vec<(ListenerHandle, Vec<UrlFilter>)>,
    next_handle: u64,
}

impl NavigationEvents {
    pub fn add_listener(&mut self, filters: Vec<UrlFilter>) -> ListenerHandle {
        self.next_handle += 1;
        let handle = ListenerHandle(self.next_handle);
        self.listeners.push((handle, filters));
        handle
    }

    /// Returns `true` if the listener was registered.
    pub fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(current, _)| *current != handle);
        self.listeners.len() != before
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Handles of the listeners a completed navigation matches. Other statuses reach none.
    pub fn dispatch(&self, event: &NavigationEvent) -> Vec<ListenerHandle> {
        if event.status != NavigationStatus::Complete {
            return Vec::new();
        }
        self.listeners
            .iter()
            .filter(|(_, filters)| {
                filters.is_empty() || filters.iter().any(|filter| filter.matches(&event.url))
            })
            .map(|(handle, _)| *handle)
            .collect()
    }
}

/// Owns the single navigation listener and re-registers it when the configuration changes.
///
/// An empty allowlist registers no listener at all, so nothing is injected anywhere.
#[derive(Debug)]
pub struct Background {
    handle: Option<ListenerHandle>,
    filters: Vec<UrlFilter>,
}

impl Background {
    pub fn register(hub: &mut NavigationEvents, config: &Config) -> Self {
        let filters = config.url_filters();
        if filters.is_empty() {
            info!(target: "background", "no label setting, not listening for navigations");
            return Self {
                handle: None,
                filters,
            };
        }
        let handle = hub.add_listener(filters.clone());
        debug!(target: "background", "listening with {} filters", filters.len());
        Self {
            handle: Some(handle),
            filters,
        }
    }

    /// Drop the current listener and register a fresh one for `config`.
    pub fn rebind(&mut self, hub: &mut NavigationEvents, config: &Config) {
        if let Some(handle) = self.handle {
            hub.remove_listener(handle);
        }
        *self = Self::register(hub, config);
        info!(target: "background", "navigation filters rebound");
    }

    /// Rebind from a storage change notification.
    pub fn apply_change(&mut self, hub: &mut NavigationEvents, change: &StorageChange) {
        self.rebind(hub, &change.config());
    }

    #[inline]
    pub const fn handle(&self) -> Option<ListenerHandle> {
        self.handle
    }

    pub fn should_inject(&self, url: &Url) -> bool {
        self.filters.iter().any(|filter| filter.matches(url))
    }

    /// Whether `event` reached this listener, i.e. the content script should run.
    pub fn handle_navigation(&self, hub: &NavigationEvents, event: &NavigationEvent) -> bool {
        let inject = self
            .handle
            .is_some_and(|handle| hub.dispatch(event).contains(&handle));
        debug!(
            target: "background",
            "tab {} {}: inject = {inject}",
            event.tab_id, event.url
        );
        inject
    }
}
