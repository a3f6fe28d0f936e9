use crate::storage::KeyValueStorage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Storage key for the last chosen mode.
pub const THEME_KEY: &str = "theme";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub input_background: &'static str,
    pub button: &'static str,
}

pub const LIGHT: Palette = Palette {
    background: "#ffffff",
    text: "#000000",
    input_background: "#f0f0f0",
    button: "#007bff",
};

pub const DARK: Palette = Palette {
    background: "#000000",
    text: "#ffffff",
    input_background: "#333333",
    button: "#1e90ff",
};

impl ThemeMode {
    pub fn palette(&self) -> &'static Palette {
        match self {
            ThemeMode::Light => &LIGHT,
            ThemeMode::Dark => &DARK,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    /// Host preference: `TODO_BOARD_THEME` if set, else the terminal's
    /// `COLORFGBG`, else light.
    pub fn detect() -> Self {
        let forced = std::env::var("TODO_BOARD_THEME").ok();
        let colorfgbg = std::env::var("COLORFGBG").ok();
        Self::detect_from(forced.as_deref(), colorfgbg.as_deref())
    }

    pub fn detect_from(forced: Option<&str>, colorfgbg: Option<&str>) -> Self {
        if let Some(mode) = forced.and_then(Self::parse) {
            return mode;
        }
        // "fg;bg" or "fg;default;bg"; ANSI 0-6 and 8 are dark backgrounds
        let background = colorfgbg.and_then(|v| v.rsplit(';').next()).and_then(|bg| bg.parse::<u8>().ok());
        match background {
            Some(bg) if bg <= 6 || bg == 8 => ThemeMode::Dark,
            _ => ThemeMode::Light,
        }
    }
}

type Callback = Arc<dyn Fn(ThemeMode) + Send + Sync>;

struct Inner {
    mode: ThemeMode,
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

/// Current light/dark mode plus the callbacks that want to hear about changes.
///
/// Cloning gives another handle to the same store. Callbacks run
/// synchronously on the thread that changed the mode, after the internal
/// lock is released, so a callback may read `current()` freely.
///
/// A store built with [`ThemeStore::following_host`] tracks the host
/// preference through [`ThemeStore::host_changed`] until the user picks a
/// mode with `toggle` or `set_mode`.
#[derive(Clone)]
pub struct ThemeStore {
    inner: Arc<Mutex<Inner>>,
    follow_host: Arc<AtomicBool>,
}

impl ThemeStore {
    pub fn new(mode: ThemeMode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { mode, next_id: 0, subscribers: Vec::new() })),
            follow_host: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn following_host() -> Self {
        let store = Self::new(ThemeMode::detect());
        store.follow_host.store(true, Ordering::SeqCst);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> ThemeMode {
        self.lock().mode
    }

    pub fn palette(&self) -> &'static Palette {
        self.current().palette()
    }

    pub fn follows_host(&self) -> bool {
        self.follow_host.load(Ordering::SeqCst)
    }

    /// User toggle. Returns the mode now in effect.
    pub fn toggle(&self) -> ThemeMode {
        self.follow_host.store(false, Ordering::SeqCst);
        self.update(false, ThemeMode::toggled)
    }

    /// User choice of `mode`; subscribers hear about it only if it changed.
    pub fn set_mode(&self, mode: ThemeMode) {
        self.follow_host.store(false, Ordering::SeqCst);
        self.update(false, |_| mode);
    }

    /// Host preference changed. Ignored once the user has picked a mode.
    pub fn host_changed(&self, mode: ThemeMode) {
        self.update(true, |_| mode);
    }

    pub fn refresh_from_host(&self) {
        self.host_changed(ThemeMode::detect());
    }

    /// Reads and replaces the mode under one lock so concurrent toggles
    /// never compute the same target.
    fn update(&self, from_host: bool, next: impl FnOnce(ThemeMode) -> ThemeMode) -> ThemeMode {
        let (mode, callbacks): (ThemeMode, Vec<Callback>) = {
            let mut inner = self.lock();
            if from_host && !self.follows_host() {
                return inner.mode;
            }
            let mode = next(inner.mode);
            if inner.mode == mode {
                return mode;
            }
            inner.mode = mode;
            (mode, inner.subscribers.iter().map(|(_, cb)| cb.clone()).collect())
        };
        log::debug!("theme changed to {:?}, notifying {} subscribers", mode, callbacks.len());
        for cb in callbacks {
            cb(mode);
        }
        mode
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(ThemeMode) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        Subscription { id, store: Arc::downgrade(&self.inner) }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

/// A store on the saved mode if there is a readable one, otherwise one that
/// follows the host preference.
pub fn restore(storage: &dyn KeyValueStorage) -> ThemeStore {
    match storage.get_item(THEME_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(mode) => ThemeStore::new(mode),
            Err(e) => {
                log::warn!("ignoring saved theme {:?}: {}", raw, e);
                ThemeStore::following_host()
            }
        },
        Ok(None) => ThemeStore::following_host(),
        Err(e) => {
            log::warn!("{}", e);
            ThemeStore::following_host()
        }
    }
}

/// Writes every user-chosen mode to `storage` for the life of `store`.
/// Changes that only track the host are not saved.
pub fn persist_changes(store: &ThemeStore, storage: Arc<dyn KeyValueStorage>) {
    let follow_host = store.follow_host.clone();
    store
        .subscribe(move |mode| {
            if follow_host.load(Ordering::SeqCst) {
                return;
            }
            let written = serde_json::to_string(&mode)
                .map_err(|e| e.to_string())
                .and_then(|raw| storage.set_item(THEME_KEY, &raw).map_err(|e| e.to_string()));
            if let Err(e) = written {
                log::error!("could not save theme: {}", e);
            }
        })
        .detach();
}

/// Handle returned by [`ThemeStore::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    store: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self)
    }

    /// Keeps the callback registered for as long as the store lives.
    pub fn detach(mut self) {
        self.store = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}
