use core::time::Duration;

use instant::Instant;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::actions::{Action, Dispatch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportDimensions {
    pub width: f32,
    pub height: f32,
    /// Height of the document body. Absolutely positioned sidebars stop
    /// `height: 100%` from reflecting it.
    pub document_height: f32,
}

impl ViewportDimensions {
    pub fn new(width: f32, height: f32, document_height: f32) -> Self {
        Self {
            width,
            height,
            document_height,
        }
    }
}

/// Leading + trailing edge rate limiter.
///
/// The first call of a quiet period passes through. Calls inside the wait
/// window are coalesced and the newest one is released by [`Throttle::flush`]
/// once the window closes, which opens the next window. Any span of `wait`
/// therefore sees at most two emissions.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    wait: Duration,
    last_emit: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            last_emit: None,
            pending: None,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    fn is_open(&self, now: Instant) -> bool {
        match self.last_emit {
            None => true,
            Some(at) => now >= at && now - at >= self.wait,
        }
    }

    pub fn call(&mut self, value: T, now: Instant) -> Option<T> {
        if self.is_open(now) {
            self.last_emit = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Releases the trailing value if its window has closed.
    pub fn flush(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.is_open(now) {
            self.last_emit = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// When the pending trailing value becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_emit.map(|at| at + self.wait)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Who last wrote the docking flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DockSource {
    #[default]
    Auto,
    Manual,
}

/// Sidebar docking. Breakpoint crossings only write through while the
/// source is [`DockSource::Auto`]; a crossing blocked by a manual toggle
/// consumes the override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockState {
    pub source: DockSource,
    pub value: bool,
}

impl DockState {
    pub fn auto(value: bool) -> Self {
        Self {
            source: DockSource::Auto,
            value,
        }
    }

    pub fn toggle(&mut self) {
        self.value = !self.value;
        self.source = DockSource::Manual;
    }

    /// Returns true if the docked value changed.
    pub fn apply_breakpoint(&mut self, matches: bool) -> bool {
        match self.source {
            DockSource::Auto => {
                let changed = self.value != matches;
                self.value = matches;
                changed
            }
            DockSource::Manual => {
                self.source = DockSource::Auto;
                false
            }
        }
    }
}

/// Docked sidebar on wide screens, touch drawer (`open`) elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarState {
    pub dock: DockState,
    pub open: bool,
}

impl SidebarState {
    pub fn docked(&self) -> bool {
        self.dock.value
    }

    pub fn visible(&self) -> bool {
        self.open || self.dock.value
    }
}

/// Feeds window size into the store and tracks sidebar docking.
#[derive(Debug, Clone)]
pub struct ViewportMonitor {
    throttle: Throttle<ViewportDimensions>,
    sidebar: SidebarState,
    last: Option<ViewportDimensions>,
}

impl ViewportMonitor {
    pub fn new(wait: Duration, breakpoint_matches: bool) -> Self {
        Self {
            throttle: Throttle::new(wait),
            sidebar: SidebarState {
                dock: DockState::auto(breakpoint_matches),
                open: false,
            },
            last: None,
        }
    }

    /// Emits the initial dimensions, bypassing the throttle.
    pub fn activate<D: Dispatch + ?Sized>(&mut self, dims: ViewportDimensions, sink: &mut D) {
        self.emit(dims, sink);
    }

    pub fn on_resize<D: Dispatch + ?Sized>(
        &mut self,
        dims: ViewportDimensions,
        now: Instant,
        sink: &mut D,
    ) {
        match self.throttle.call(dims, now) {
            Some(dims) => self.emit(dims, sink),
            None => trace!("resize coalesced: {}x{}", dims.width, dims.height),
        }
    }

    /// Delivers a due trailing resize. Hosts call this from a timer or frame loop.
    pub fn poll<D: Dispatch + ?Sized>(&mut self, now: Instant, sink: &mut D) {
        if let Some(dims) = self.throttle.flush(now) {
            self.emit(dims, sink);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    pub fn on_breakpoint(&mut self, matches: bool) -> bool {
        let changed = self.sidebar.dock.apply_breakpoint(matches);
        debug!(
            "breakpoint matches={matches}, docked={}, changed={changed}",
            self.sidebar.dock.value
        );
        changed
    }

    pub fn toggle_dock(&mut self) {
        self.sidebar.dock.toggle();
        debug!("sidebar dock toggled by user: {}", self.sidebar.dock.value);
    }

    pub fn set_open(&mut self, open: bool) {
        self.sidebar.open = open;
    }

    pub fn sidebar(&self) -> SidebarState {
        self.sidebar
    }

    pub fn dimensions(&self) -> Option<ViewportDimensions> {
        self.last
    }

    fn emit<D: Dispatch + ?Sized>(&mut self, dims: ViewportDimensions, sink: &mut D) {
        trace!("viewport {}x{} (doc {})", dims.width, dims.height, dims.document_height);
        self.last = Some(dims);
        sink.dispatch(Action::SetViewport(dims));
    }
}
