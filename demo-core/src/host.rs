use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    rc::Rc,
};

use phylo_view::{
    History, Host, HostEvent, HostEventKind, MemoryHistory, Subscription, ViewportDimensions,
};

/// Host events waiting for the next frame.
pub type EventQueue = Rc<RefCell<VecDeque<HostEvent>>>;

/// Queues host events from listener callbacks and wakes the frame loop,
/// so a queued event is handled without waiting for user input.
#[derive(Clone, Default)]
pub struct EventForwarder {
    events: EventQueue,
    wake: Rc<RefCell<Option<Rc<dyn Fn()>>>>,
}

impl EventForwarder {
    pub fn new(events: EventQueue) -> Self {
        Self {
            events,
            wake: Rc::default(),
        }
    }

    pub fn set_waker(&self, wake: impl Fn() + 'static) {
        *self.wake.borrow_mut() = Some(Rc::new(wake));
    }

    /// Wakes `ctx` on every forwarded event. Later calls keep the first context.
    pub fn attach(&self, ctx: &egui::Context) {
        if self.wake.borrow().is_some() {
            return;
        }
        let ctx = ctx.clone();
        self.set_waker(move || ctx.request_repaint());
    }

    pub fn forward(&self, event: HostEvent) {
        self.events.borrow_mut().push_back(event);
        let wake = self.wake.borrow().clone();
        if let Some(wake) = wake {
            wake();
        }
    }
}

/// A [`Host`] that may need the egui context to notice window changes.
pub trait FrameHost: Host {
    fn observe(&mut self, _ctx: &egui::Context) {}
}

/// Back/forward for the address bar buttons.
pub trait Navigation: History {
    /// Moves `delta` entries. Returns true when the caller has to deliver the
    /// resulting [`HostEvent::PopState`] itself.
    fn go(&mut self, delta: i32) -> bool;
}

impl Navigation for MemoryHistory {
    fn go(&mut self, delta: i32) -> bool {
        match delta.signum() {
            -1 => self.back(),
            1 => self.forward(),
            _ => false,
        }
    }
}

/// Native window: resizes and breakpoint crossings are read off the egui
/// screen rect once per frame.
#[derive(Debug)]
pub struct NativeHost {
    events: EventQueue,
    listeners: Rc<RefCell<BTreeMap<HostEventKind, usize>>>,
    dims: ViewportDimensions,
    breakpoint: Option<(f32, bool)>,
}

impl NativeHost {
    pub fn new(events: EventQueue) -> Self {
        Self {
            events,
            listeners: Rc::default(),
            dims: ViewportDimensions::default(),
            breakpoint: None,
        }
    }

    fn listening(&self, kind: HostEventKind) -> bool {
        self.listeners.borrow().get(&kind).is_some_and(|n| *n > 0)
    }

    /// Records a new window size and queues whatever listeners care about.
    pub fn resize(&mut self, dims: ViewportDimensions) {
        if dims == self.dims {
            return;
        }
        self.dims = dims;
        if self.listening(HostEventKind::Resize) {
            self.events.borrow_mut().push_back(HostEvent::Resize(dims));
        }
        if let Some((min_width, matched)) = self.breakpoint {
            let matches = dims.width >= min_width;
            if matches != matched {
                self.breakpoint = Some((min_width, matches));
                if self.listening(HostEventKind::Breakpoint) {
                    self.events
                        .borrow_mut()
                        .push_back(HostEvent::Breakpoint(matches));
                }
            }
        }
    }
}

impl Host for NativeHost {
    fn dimensions(&self) -> ViewportDimensions {
        self.dims
    }

    fn breakpoint_matches(&self, min_width: f32) -> bool {
        self.dims.width >= min_width
    }

    fn listen(&mut self, kind: HostEventKind, min_width: f32) -> Subscription {
        if kind == HostEventKind::Breakpoint {
            self.breakpoint = Some((min_width, self.breakpoint_matches(min_width)));
        }
        *self.listeners.borrow_mut().entry(kind).or_default() += 1;
        let listeners = Rc::clone(&self.listeners);
        Subscription::new(move || {
            if let Some(n) = listeners.borrow_mut().get_mut(&kind) {
                *n = n.saturating_sub(1);
            }
        })
    }
}

impl FrameHost for NativeHost {
    fn observe(&mut self, ctx: &egui::Context) {
        let rect = ctx.screen_rect();
        self.resize(ViewportDimensions::new(
            rect.width(),
            rect.height(),
            rect.height(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_listened_kinds_are_queued() {
        let events = EventQueue::default();
        let mut host = NativeHost::new(Rc::clone(&events));
        host.resize(ViewportDimensions::new(1200.0, 800.0, 800.0));
        assert!(events.borrow().is_empty());

        let resize = host.listen(HostEventKind::Resize, 1000.0);
        let breakpoint = host.listen(HostEventKind::Breakpoint, 1000.0);
        host.resize(ViewportDimensions::new(1100.0, 800.0, 800.0));
        host.resize(ViewportDimensions::new(900.0, 800.0, 800.0));
        assert_eq!(
            events.borrow_mut().drain(..).collect::<Vec<_>>(),
            vec![
                HostEvent::Resize(ViewportDimensions::new(1100.0, 800.0, 800.0)),
                HostEvent::Resize(ViewportDimensions::new(900.0, 800.0, 800.0)),
                HostEvent::Breakpoint(false),
            ]
        );

        drop(resize);
        drop(breakpoint);
        host.resize(ViewportDimensions::new(1300.0, 800.0, 800.0));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_forwarded_event_wakes_frame_loop() {
        use std::cell::Cell;

        let events = EventQueue::default();
        let forwarder = EventForwarder::new(Rc::clone(&events));
        forwarder.forward(HostEvent::PopState);
        assert_eq!(events.borrow().len(), 1);

        let wakes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&wakes);
        forwarder.set_waker(move || counter.set(counter.get() + 1));

        let listener = forwarder.clone();
        listener.forward(HostEvent::PopState);
        listener.forward(HostEvent::Breakpoint(true));
        assert_eq!(wakes.get(), 2);
        assert_eq!(events.borrow().len(), 3);

        // an attached context does not replace a waker already in place
        forwarder.attach(&egui::Context::default());
        forwarder.forward(HostEvent::PopState);
        assert_eq!(wakes.get(), 3);
    }

    #[test]
    fn test_memory_history_navigation() {
        let mut history = MemoryHistory::new("/zika/");
        history.push("/ebola/");
        assert!(history.go(-1));
        assert_eq!(history.current(), "/zika/");
        assert!(!history.go(-1));
        assert!(history.go(1));
    }
}
