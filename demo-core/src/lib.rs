use core::time::Duration;

use eframe::{App, CreationContext};
use egui::{CollapsingHeader, ComboBox, ScrollArea, Ui};
use instant::Instant;
use log::{debug, info};
use phylo_view::{
    genotype_frequency_key, is_genotype, parse_query, today, Action, Dispatch, HostEvent,
    Outcome, Phase, Query, Route, RouteStateSynchronizer, Settings, KEY_COLOR_BY,
    KEY_DISTANCE_MEASURE, KEY_LAYOUT,
};

pub mod host;
pub mod loader;
pub mod store;

pub use host::{EventForwarder, EventQueue, FrameHost, Navigation, NativeHost};
pub use loader::DemoLoader;
pub use store::ViewerStore;

#[cfg(feature = "events")]
pub use crossbeam::channel::{unbounded, Receiver, Sender};

pub const LAYOUTS: [&str; 4] = ["rect", "radial", "unrooted", "clock"];
pub const DISTANCE_MEASURES: [&str; 2] = ["div", "num_date"];
pub const COLOR_BYS: [&str; 5] = ["region", "country", "num_date", "gt-E_123", "gt-NS1_26"];

pub mod settings {
    pub struct SettingsPanel {
        pub show_action_log: bool,
        pub show_debug_overlay: bool,
        pub load_latency_ms: u64,
    }

    impl Default for SettingsPanel {
        fn default() -> Self {
            Self {
                show_action_log: true,
                show_debug_overlay: true,
                load_latency_ms: 400,
            }
        }
    }
}

fn info_icon(ui: &mut Ui, tip: &str) {
    ui.add_space(4.0);
    ui.small_button("ℹ").on_hover_text(tip);
}

pub struct ViewerApp<H: Navigation, W: FrameHost> {
    pub sync: RouteStateSynchronizer<H>,
    pub store: ViewerStore,
    pub loader: DemoLoader,
    pub settings_panel: settings::SettingsPanel,
    pub address_input: String,
    host: W,
    events: EventQueue,
    last_outcome: Option<Outcome>,
    #[cfg(feature = "events")]
    action_publisher: Sender<Action>,
    #[cfg(feature = "events")]
    action_consumer: Receiver<Action>,
}

impl<H: Navigation, W: FrameHost> ViewerApp<H, W> {
    /// Builds the synchronizer over `history`. `events` is the queue `host`
    /// delivers into.
    pub fn new(
        cc: &CreationContext<'_>,
        history: H,
        mut host: W,
        events: EventQueue,
        settings: Settings,
    ) -> Self {
        host.observe(&cc.egui_ctx);
        Self::with_host(history, host, events, settings)
    }

    /// Same as [`Self::new`] for a host that is already observing its window.
    /// Nothing is mounted until the address first resolves to the viewer.
    pub fn with_host(history: H, host: W, events: EventQueue, settings: Settings) -> Self {
        let settings_panel = settings::SettingsPanel::default();

        #[cfg(feature = "events")]
        let (action_publisher, action_consumer) = unbounded();

        let sync = RouteStateSynchronizer::new(history, settings, &host);
        let address_input = sync.location().href();
        Self {
            sync,
            store: ViewerStore::new(),
            loader: DemoLoader::new(Duration::from_millis(settings_panel.load_latency_ms)),
            settings_panel,
            address_input,
            host,
            events,
            last_outcome: None,
            #[cfg(feature = "events")]
            action_publisher,
            #[cfg(feature = "events")]
            action_consumer,
        }
    }

    /// Resolves the current route and mounts the synchronizer the first time
    /// it is the viewer.
    fn route(&mut self) -> Route {
        let route = self
            .sync
            .settings()
            .routes
            .resolve(&self.sync.location().pathname);
        if route == Route::Viewer && !self.sync.is_mounted() {
            #[cfg(feature = "events")]
            self.sync
                .mount(&mut self.host, &mut self.action_publisher, today());
            #[cfg(not(feature = "events"))]
            self.sync.mount(&mut self.host, &mut self.store, today());
            self.drain_actions();
            self.address_input = self.sync.location().href();
            info!("viewer mounted at {}", self.address_input);
        }
        route
    }

    /// Without listeners nothing reports back/forward, so compare the
    /// history against the last known location instead.
    fn follow_history(&mut self, now: Instant) {
        let (pathname, search) = self.sync.history().location();
        let location = self.sync.location();
        if pathname == location.pathname && parse_query(&search) == location.query {
            return;
        }
        debug!("history moved to {pathname}{search} while unmounted");
        self.with_sink(|sync, sink| sync.handle(HostEvent::PopState, now, sink));
        self.address_input = self.sync.location().href();
    }

    /// Runs `f` with the synchronizer and wherever actions go in this build.
    fn with_sink<R>(
        &mut self,
        f: impl FnOnce(&mut RouteStateSynchronizer<H>, &mut dyn Dispatch) -> R,
    ) -> R {
        #[cfg(feature = "events")]
        let out = f(&mut self.sync, &mut self.action_publisher);
        #[cfg(not(feature = "events"))]
        let out = f(&mut self.sync, &mut self.store);
        self.drain_actions();
        out
    }

    #[cfg(feature = "events")]
    fn drain_actions(&mut self) {
        for action in self.action_consumer.try_iter() {
            self.store.dispatch(action);
        }
    }

    #[cfg(not(feature = "events"))]
    fn drain_actions(&mut self) {}

    fn navigate(&mut self, url: &str) {
        let (pathname, search) = phylo_view::split_url(url);
        let query = parse_query(search);
        let decision = self.with_sink(|sync, sink| sync.change_route(pathname, query, sink));
        self.last_outcome = Some(decision.outcome);
        self.address_input = self.sync.location().href();
    }

    fn go(&mut self, delta: i32) {
        if self.sync.history_mut().go(delta) {
            self.events.borrow_mut().push_back(HostEvent::PopState);
        }
    }

    /// Writes a store field and mirrors it into the query string.
    fn set_query_value(&mut self, key: &str, action: Action) {
        let value = match &action {
            Action::SetLayout(v) | Action::SetDistanceMeasure(v) | Action::SetColorBy(v) => {
                v.clone()
            }
            _ => return,
        };
        self.with_sink(|_, sink| sink.dispatch(action));
        let location = self.sync.location().clone();
        let mut query: Query = location.query;
        query.insert(key.to_string(), value);
        let decision =
            self.with_sink(|sync, sink| sync.change_route(&location.pathname, query, sink));
        self.last_outcome = Some(decision.outcome);
        self.address_input = self.sync.location().href();
    }

    fn pump(&mut self, ctx: &egui::Context) {
        self.host.observe(ctx);
        if let Some(wait) = self.step(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }

    /// Host events, route, throttle and loader for one frame. Returns how
    /// soon the next frame is needed, if at all.
    pub fn step(&mut self, now: Instant) -> Option<Duration> {
        if !self.sync.is_mounted() {
            self.follow_history(now);
        }

        let pending: Vec<HostEvent> = self.events.borrow_mut().drain(..).collect();
        let popped = pending.iter().any(|e| matches!(e, HostEvent::PopState));
        for event in pending {
            self.with_sink(|sync, sink| sync.handle(event, now, sink));
        }
        if popped {
            self.address_input = self.sync.location().href();
        }
        self.route();

        self.with_sink(|sync, sink| sync.poll(now, sink));
        let mut wait = self
            .sync
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now));

        if let Some(request) = self.store.take_load() {
            self.loader.request(request, now);
        }
        if let Some(key) = self.loader.poll(now) {
            if self.sync.mark_loaded(&key) {
                debug!("dataset {key} ready");
            }
        }
        if self.loader.is_busy() {
            let busy = Duration::from_millis(50);
            wait = Some(wait.map_or(busy, |w| w.min(busy)));
        }
        wait
    }

    fn ui_address_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if ui.button("◀").on_hover_text("Back").clicked() {
                self.go(-1);
            }
            if ui.button("▶").on_hover_text("Forward").clicked() {
                self.go(1);
            }
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.address_input)
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Monospace),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                let url = self.address_input.clone();
                self.navigate(&url);
            }
        });
    }

    fn ui_controls(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            let docked = self.sync.sidebar().docked();
            let label = if docked { "Undock" } else { "Dock" };
            if ui.button(label).clicked() {
                self.sync.toggle_dock();
            }
            if !docked && ui.button("Close").clicked() {
                self.sync.set_sidebar_open(false);
            }
        });
        ui.separator();

        CollapsingHeader::new("Tree")
            .default_open(true)
            .show(ui, |ui| {
                let mut layout = self.store.layout.clone();
                ComboBox::from_label("Layout")
                    .selected_text(layout.clone())
                    .show_ui(ui, |ui| {
                        for l in LAYOUTS {
                            ui.selectable_value(&mut layout, l.to_string(), l);
                        }
                    });
                if layout != self.store.layout {
                    self.set_query_value(KEY_LAYOUT, Action::SetLayout(layout));
                }

                let mut measure = self.store.distance_measure.clone();
                ComboBox::from_label("Branch length")
                    .selected_text(measure.clone())
                    .show_ui(ui, |ui| {
                        for m in DISTANCE_MEASURES {
                            ui.selectable_value(&mut measure, m.to_string(), m);
                        }
                    });
                if measure != self.store.distance_measure {
                    self.set_query_value(KEY_DISTANCE_MEASURE, Action::SetDistanceMeasure(measure));
                }

                let mut color_by = self.store.color_by.clone();
                ui.horizontal(|ui| {
                    ComboBox::from_label("Color by")
                        .selected_text(color_by.clone())
                        .show_ui(ui, |ui| {
                            for c in COLOR_BYS {
                                ui.selectable_value(&mut color_by, c.to_string(), c);
                            }
                        });
                    info_icon(ui, "gt-* values color by genotype at a position");
                });
                if color_by != self.store.color_by {
                    self.set_query_value(KEY_COLOR_BY, Action::SetColorBy(color_by));
                }
            });

        CollapsingHeader::new("Date range")
            .default_open(true)
            .show(ui, |ui| {
                ui.label(format!(
                    "selected {} .. {}",
                    self.store.date_min, self.store.date_max
                ));
                ui.label(format!(
                    "absolute {} .. {}",
                    self.store.absolute_date_min, self.store.absolute_date_max
                ));
            });

        CollapsingHeader::new("Loader").show(ui, |ui| {
            let mut latency = self.settings_panel.load_latency_ms;
            ui.add(egui::Slider::new(&mut latency, 0..=3000).text("latency ms"));
            if latency != self.settings_panel.load_latency_ms {
                self.settings_panel.load_latency_ms = latency;
                self.loader.set_latency(Duration::from_millis(latency));
            }
            ui.label(format!("stale responses dropped: {}", self.loader.discarded()));
        });

        CollapsingHeader::new("Debug").show(ui, |ui| {
            ui.checkbox(&mut self.settings_panel.show_debug_overlay, "overlay");
            ui.checkbox(&mut self.settings_panel.show_action_log, "action log");
        });
    }

    fn ui_viewer(&mut self, ui: &mut Ui) {
        let address = self.sync.address();
        ui.heading(if address.canonical_key.is_empty() {
            "no dataset"
        } else {
            address.canonical_key.as_str()
        });
        egui::Grid::new("address_levels")
            .num_columns(2)
            .show(ui, |ui| {
                for (level, value) in &address.levels {
                    ui.label(level);
                    ui.code(value);
                    ui.end_row();
                }
                if !address.raw_suffix.is_empty() {
                    ui.label("unrecognized");
                    ui.code(&address.raw_suffix);
                    ui.end_row();
                }
            });
        for issue in &address.issues {
            ui.colored_label(ui.visuals().error_fg_color, format!("{issue:?}"));
        }

        let phase = match self.sync.phase() {
            Phase::LocationKnown => "waiting for a complete address".to_string(),
            Phase::DatasetPending(key) => format!("loading {key}…"),
            Phase::DatasetLoaded(key) => format!("showing {key}"),
        };
        ui.label(phase);

        if is_genotype(&self.store.color_by) {
            if let Some(key) = genotype_frequency_key(&self.store.color_by) {
                ui.label(format!("frequencies: {key}"));
            }
        }

        if self.settings_panel.show_action_log {
            ui.separator();
            ui.horizontal(|ui| {
                ui.strong(format!("Actions ({})", self.store.dispatched()));
                if ui.small_button("clear").clicked() {
                    self.store.clear_log();
                }
            });
            ScrollArea::vertical()
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for line in self.store.log() {
                        ui.monospace(line);
                    }
                });
        }
    }

    fn ui_splash(&mut self, ui: &mut Ui) {
        ui.heading("Choose a dataset");
        let datasets = self.sync.settings().routes.datasets.clone();
        for dataset in datasets {
            if ui.button(&dataset).clicked() {
                let decision = self.with_sink(|sync, sink| sync.set_virus_path(&dataset, sink));
                self.last_outcome = Some(decision.outcome);
                self.address_input = self.sync.location().href();
            }
        }
    }

    fn overlay_debug_panel(&self, ui: &Ui) {
        if !self.settings_panel.show_debug_overlay {
            return;
        }
        let dims = self
            .sync
            .dimensions()
            .map_or_else(|| "-".to_string(), |d| format!("{:.0}x{:.0}", d.width, d.height));
        let text = format!(
            "viewport: {dims}\nlast: {:?}\nloaded: {}",
            self.last_outcome,
            self.sync.latest_valid().unwrap_or("-")
        );
        let panel_rect = ui.max_rect();
        egui::Area::new(egui::Id::new("overlay_debug_in_panel"))
            .order(egui::Order::Middle)
            .fixed_pos(egui::pos2(panel_rect.max.x - 220.0, panel_rect.min.y + 10.0))
            .movable(false)
            .show(ui.ctx(), |ui_area| {
                ui_area.set_clip_rect(panel_rect);
                ui_area.label(egui::RichText::new(text).monospace().size(12.0));
            });
    }
}

impl<H: Navigation, W: FrameHost> App for ViewerApp<H, W> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump(ctx);

        egui::TopBottomPanel::top("address").show(ctx, |ui| self.ui_address_bar(ui));

        let route = self.route();

        if route == Route::Viewer {
            let sidebar = self.sync.sidebar();
            if sidebar.visible() {
                egui::SidePanel::left("controls")
                    .default_width(280.0)
                    .resizable(sidebar.docked())
                    .show(ctx, |ui| {
                        ScrollArea::vertical().show(ui, |ui| self.ui_controls(ui));
                    });
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            match &route {
                Route::Viewer => {
                    if !self.sync.sidebar().visible() && ui.button("Controls").clicked() {
                        self.sync.set_sidebar_open(true);
                    }
                    self.ui_viewer(ui);
                }
                Route::Page(page) => {
                    ui.heading(page);
                }
                Route::External(target) => {
                    ui.hyperlink_to(format!("continue to {target}"), target);
                }
                Route::Splash => self.ui_splash(ui),
            }
            self.overlay_debug_panel(ui);
        });
    }
}

impl<H: Navigation, W: FrameHost> Drop for ViewerApp<H, W> {
    fn drop(&mut self) {
        self.sync.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use phylo_view::{History, MemoryHistory, ViewportDimensions};

    use super::*;

    fn app(url: &str) -> ViewerApp<MemoryHistory, NativeHost> {
        let events = EventQueue::default();
        let mut host = NativeHost::new(Rc::clone(&events));
        host.resize(ViewportDimensions::new(1200.0, 800.0, 800.0));
        ViewerApp::with_host(MemoryHistory::new(url), host, events, Settings::default())
    }

    #[test]
    fn test_pages_do_not_mount() {
        let mut app = app("/about");
        app.step(Instant::now());
        assert!(!app.sync.is_mounted());
        assert_eq!(app.store.dispatched(), 0);
        assert!(app.store.layout.is_empty());
    }

    #[test]
    fn test_viewer_mounts_on_first_visit() {
        let mut app = app("/about");
        app.step(Instant::now());
        app.navigate("/zika/?l=radial");
        app.step(Instant::now());
        assert!(app.sync.is_mounted());
        assert_eq!(app.store.layout, "radial");
        assert_eq!(app.address_input, "/zika/?l=radial");

        let dispatched = app.store.dispatched();
        app.step(Instant::now());
        assert_eq!(app.store.dispatched(), dispatched);
    }

    #[test]
    fn test_history_followed_while_unmounted() {
        let mut app = app("/help");
        app.sync.history_mut().push("/methods");
        assert!(app.sync.history_mut().back());
        app.sync.history_mut().push("/zika/");
        app.step(Instant::now());
        assert_eq!(app.sync.location().pathname, "/zika/");
        assert!(app.sync.is_mounted());
        assert_eq!(app.address_input, "/zika/");
    }
}
