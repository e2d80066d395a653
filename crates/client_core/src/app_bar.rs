use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use tracing::warn;

pub const DEFAULT_TITLE: &str = "FundiPro";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBarAction {
    pub id: String,
    pub icon: String,
    pub label: String,
}

impl AppBarAction {
    pub fn new(id: impl Into<String>, icon: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            icon: icon.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBarState {
    pub title: String,
    pub show_back: bool,
    pub actions: Vec<AppBarAction>,
}

impl Default for AppBarState {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            show_back: false,
            actions: Vec::new(),
        }
    }
}

struct Shared {
    state: AppBarState,
    owner: Option<u64>,
}

/// Title, back button and action buttons shared by every screen.
///
/// A screen takes the bar with [`AppBar::activate`] and keeps the returned
/// guard for as long as it is on screen. Dropping the guard clears the
/// actions and the back button, unless another screen has activated since.
#[derive(Clone)]
pub struct AppBar {
    shared: Arc<RwLock<Shared>>,
    next_owner: Arc<AtomicU64>,
}

impl Default for AppBar {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBar {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(RwLock::new(Shared {
                state: AppBarState::default(),
                owner: None,
            })),
            next_owner: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn activate(&self, state: AppBarState) -> AppBarGuard {
        let owner = self.next_owner.fetch_add(1, Ordering::Relaxed);
        {
            let mut shared = self.write();
            shared.state = state;
            shared.owner = Some(owner);
        }
        AppBarGuard {
            bar: self.clone(),
            owner,
        }
    }

    pub fn snapshot(&self) -> AppBarState {
        self.read().state.clone()
    }

    fn release(&self, owner: u64) {
        let mut shared = self.write();
        if shared.owner == Some(owner) {
            shared.state.actions.clear();
            shared.state.show_back = false;
            shared.owner = None;
        }
    }

    // Writers never leave `Shared` half-updated, so a lock poisoned by a
    // panicking screen is recovered and logged.
    fn read(&self) -> RwLockReadGuard<'_, Shared> {
        self.shared.read().unwrap_or_else(|poisoned| {
            warn!("app_bar: recovering from poisoned lock");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Shared> {
        self.shared.write().unwrap_or_else(|poisoned| {
            warn!("app_bar: recovering from poisoned lock");
            PoisonError::into_inner(poisoned)
        })
    }
}

#[must_use = "dropping the guard immediately tears the screen's app bar down"]
pub struct AppBarGuard {
    bar: AppBar,
    owner: u64,
}

impl AppBarGuard {
    pub fn set_title(&self, title: impl Into<String>) {
        let mut shared = self.bar.write();
        if shared.owner == Some(self.owner) {
            shared.state.title = title.into();
        }
    }
}

impl Drop for AppBarGuard {
    fn drop(&mut self) {
        self.bar.release(self.owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(title: &str, actions: &[&str]) -> AppBarState {
        AppBarState {
            title: title.to_string(),
            show_back: true,
            actions: actions
                .iter()
                .map(|id| AppBarAction::new(*id, *id, *id))
                .collect(),
        }
    }

    #[test]
    fn guard_drop_tears_down_actions() {
        let bar = AppBar::new();
        {
            let _screen = bar.activate(screen("Manage Sites", &["add-site", "refresh"]));
            let live = bar.snapshot();
            assert_eq!(live.title, "Manage Sites");
            assert_eq!(live.actions.len(), 2);
            assert!(live.show_back);
        }
        let after = bar.snapshot();
        assert!(after.actions.is_empty());
        assert!(!after.show_back);
    }

    #[test]
    fn stale_guard_does_not_clear_newer_screen() {
        let bar = AppBar::new();
        let first = bar.activate(screen("Verify Gigs", &["refresh"]));
        let second = bar.activate(screen("Manage Workers", &["search-worker"]));
        drop(first);

        let live = bar.snapshot();
        assert_eq!(live.title, "Manage Workers");
        assert_eq!(live.actions[0].id, "search-worker");

        second.set_title("Workers");
        assert_eq!(bar.snapshot().title, "Workers");
    }

    #[test]
    fn poisoned_bar_keeps_its_state() {
        let bar = AppBar::new();
        let screen_guard = bar.activate(screen("MPESA Payments", &["stk-push"]));

        let crashing = bar.clone();
        let crashed = std::thread::spawn(move || {
            let _held = crashing.shared.write().expect("lock");
            panic!("screen crashed while updating the bar");
        })
        .join();
        assert!(crashed.is_err());
        assert!(bar.shared.is_poisoned());

        let live = bar.snapshot();
        assert_eq!(live.title, "MPESA Payments");
        assert_eq!(live.actions.len(), 1);

        drop(screen_guard);
        assert!(bar.snapshot().actions.is_empty());
    }
}
