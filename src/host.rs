use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use crate::viewport::ViewportDimensions;

/// Scoped listener registration: the listener is removed when this is dropped.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostEventKind {
    PopState,
    Resize,
    Breakpoint,
}

/// Events the host environment delivers to the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// Back/forward navigation; the new address is read from the history.
    PopState,
    Resize(ViewportDimensions),
    /// The `(min-width: ..)` media query changed; carries whether it matches.
    Breakpoint(bool),
}

impl HostEvent {
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::PopState => HostEventKind::PopState,
            HostEvent::Resize(_) => HostEventKind::Resize,
            HostEvent::Breakpoint(_) => HostEventKind::Breakpoint,
        }
    }
}

/// The window the viewer runs in.
pub trait Host {
    fn dimensions(&self) -> ViewportDimensions;

    /// Whether a `(min-width: {min_width}px)` media query matches now.
    fn breakpoint_matches(&self, min_width: f32) -> bool;

    /// Starts forwarding events of `kind`; stops when the subscription drops.
    fn listen(&mut self, kind: HostEventKind, min_width: f32) -> Subscription;
}

/// Host with a fixed window size that counts live listeners.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    pub dims: ViewportDimensions,
    listeners: Rc<RefCell<BTreeMap<HostEventKind, usize>>>,
}

impl MemoryHost {
    pub fn new(dims: ViewportDimensions) -> Self {
        Self {
            dims,
            listeners: Rc::default(),
        }
    }

    pub fn listener_count(&self, kind: HostEventKind) -> usize {
        self.listeners.borrow().get(&kind).copied().unwrap_or(0)
    }
}

impl Host for MemoryHost {
    fn dimensions(&self) -> ViewportDimensions {
        self.dims
    }

    fn breakpoint_matches(&self, min_width: f32) -> bool {
        self.dims.width >= min_width
    }

    fn listen(&mut self, kind: HostEventKind, _min_width: f32) -> Subscription {
        *self.listeners.borrow_mut().entry(kind).or_default() += 1;
        let listeners = Rc::clone(&self.listeners);
        Subscription::new(move || {
            if let Some(count) = listeners.borrow_mut().get_mut(&kind) {
                *count = count.saturating_sub(1);
            }
        })
    }
}
