#![cfg(target_arch = "wasm32")]
use std::rc::Rc;

use demo_core::{EventForwarder, EventQueue, FrameHost, Navigation, ViewerApp};
use phylo_view::{History, Host, HostEvent, HostEventKind, Settings, Subscription, ViewportDimensions};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventTarget, HtmlCanvasElement, MediaQueryList, Window};

/// `window.history` plus `window.location`.
pub struct WebHistory {
    window: Window,
}

impl WebHistory {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl History for WebHistory {
    fn location(&self) -> (String, String) {
        let location = self.window.location();
        (
            location.pathname().unwrap_or_else(|_| "/".to_string()),
            location.search().unwrap_or_default(),
        )
    }

    fn push(&mut self, url: &str) {
        if let Ok(history) = self.window.history() {
            if let Err(err) = history.push_state_with_url(&JsValue::NULL, "", Some(url)) {
                log::warn!("pushState({url}) failed: {err:?}");
            }
        }
    }

    fn replace(&mut self, url: &str) {
        if let Ok(history) = self.window.history() {
            if let Err(err) = history.replace_state_with_url(&JsValue::NULL, "", Some(url)) {
                log::warn!("replaceState({url}) failed: {err:?}");
            }
        }
    }
}

impl Navigation for WebHistory {
    fn go(&mut self, delta: i32) -> bool {
        match self.window.history() {
            Ok(history) => {
                if let Err(err) = history.go_with_delta(delta) {
                    log::warn!("history.go({delta}) failed: {err:?}");
                }
            }
            Err(err) => log::warn!("window.history unavailable: {err:?}"),
        }
        // the browser fires popstate itself
        false
    }
}

/// Browser window events forwarded into the frame queue.
pub struct WebHost {
    window: Window,
    forwarder: EventForwarder,
}

impl WebHost {
    pub fn new(window: Window, events: EventQueue) -> Self {
        Self {
            window,
            forwarder: EventForwarder::new(events),
        }
    }

    fn media_query(&self, min_width: f32) -> Option<MediaQueryList> {
        self.window
            .match_media(&format!("(min-width: {min_width}px)"))
            .ok()
            .flatten()
    }
}

fn read_dimensions(window: &Window) -> ViewportDimensions {
    let px = |v: Result<JsValue, JsValue>| {
        v.ok().and_then(|v| v.as_f64()).unwrap_or_default() as f32
    };
    let document_height = window
        .document()
        .and_then(|d| d.body())
        .map_or(0.0, |body| body.scroll_height() as f32);
    ViewportDimensions::new(
        px(window.inner_width()),
        px(window.inner_height()),
        document_height,
    )
}

fn subscribe(
    target: EventTarget,
    name: &'static str,
    mut on_event: impl FnMut() + 'static,
) -> Subscription {
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| on_event());
    if let Err(err) = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
        log::warn!("addEventListener({name}) failed: {err:?}");
        return Subscription::noop();
    }
    Subscription::new(move || {
        if let Err(err) =
            target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        {
            log::warn!("removeEventListener({name}) failed: {err:?}");
        }
    })
}

impl Host for WebHost {
    fn dimensions(&self) -> ViewportDimensions {
        read_dimensions(&self.window)
    }

    fn breakpoint_matches(&self, min_width: f32) -> bool {
        self.media_query(min_width).is_some_and(|mql| mql.matches())
    }

    fn listen(&mut self, kind: HostEventKind, min_width: f32) -> Subscription {
        let forwarder = self.forwarder.clone();
        match kind {
            HostEventKind::PopState => subscribe(self.window.clone().into(), "popstate", move || {
                forwarder.forward(HostEvent::PopState);
            }),
            HostEventKind::Resize => {
                let window = self.window.clone();
                subscribe(self.window.clone().into(), "resize", move || {
                    forwarder.forward(HostEvent::Resize(read_dimensions(&window)));
                })
            }
            HostEventKind::Breakpoint => match self.media_query(min_width) {
                Some(mql) => {
                    let target: EventTarget = mql.clone().into();
                    subscribe(target, "change", move || {
                        forwarder.forward(HostEvent::Breakpoint(mql.matches()));
                    })
                }
                None => Subscription::noop(),
            },
        }
    }
}

impl FrameHost for WebHost {
    fn observe(&mut self, ctx: &egui::Context) {
        self.forwarder.attach(ctx);
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // Fire and forget: kick off the async runner
    wasm_bindgen_futures::spawn_local(async {
        if let Err(err) = run().await {
            log::error!("viewer failed to start: {err:?}");
        }
    });
    Ok(())
}

#[wasm_bindgen]
pub async fn run() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id("the_canvas_id")
        .ok_or_else(|| JsValue::from_str("canvas with id 'the_canvas_id' not found"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("failed to cast to HtmlCanvasElement"))?;

    let web_options = eframe::WebOptions::default();
    eframe::WebRunner::new()
        .start(
            canvas,
            web_options,
            Box::new(move |cc| {
                let events = EventQueue::default();
                let host = WebHost::new(window.clone(), Rc::clone(&events));
                let history = WebHistory::new(window);
                Ok::<Box<dyn eframe::App>, _>(Box::new(ViewerApp::new(
                    cc,
                    history,
                    host,
                    events,
                    Settings::default(),
                )))
            }),
        )
        .await?;
    Ok(())
}
