//! Keeps the address bar, the store and the loaded dataset consistent.
//!
//! [`decide`] is the pure half: given the current [`Location`] and what was
//! already evaluated it says whether to rewrite the address and whether to
//! request a dataset. [`RouteStateSynchronizer`] applies those decisions to
//! a [`History`] and a [`Dispatch`] sink, and owns the listeners and
//! viewport state for the lifetime of the view.

use chrono::NaiveDate;
use instant::Instant;
use log::{debug, info};

use crate::{
    actions::{Action, Dispatch, LoadRequest},
    address::{normalize_path, parse, AddressSchema, DatasetAddress},
    bindings::QueryBindings,
    history::History,
    host::{Host, HostEvent, HostEventKind, Subscription},
    query::{compose_url, parse_query, stringify_query, Location, Query},
    settings::Settings,
    viewport::{SidebarState, ViewportDimensions, ViewportMonitor},
};

/// Left in paths by static-hosting redirects (`/!/zika`); stripped on navigation.
pub const REDIRECT_MARKER: &str = "!/";

/// What earlier passes already did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileState {
    /// Pathname of the last evaluated pass.
    pub last_evaluated: Option<String>,
    /// Canonical key of the last load request. Overwritten, never cleared.
    pub latest_valid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressAction {
    /// Rewrite the current history entry in place.
    Replace(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Pathname already evaluated.
    Unchanged,
    /// Ambiguous or contradictory levels; left exactly as typed.
    Malformed,
    /// Required levels missing; at most the address is tidied.
    Incomplete,
    /// Valid, and its dataset was already requested.
    Current,
    /// Valid and new: a load is due.
    Load,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub outcome: Outcome,
    pub address: Option<DatasetAddress>,
    pub address_action: Option<AddressAction>,
    pub load_action: Option<LoadRequest>,
}

impl Decision {
    fn unchanged() -> Self {
        Self {
            outcome: Outcome::Unchanged,
            address: None,
            address_action: None,
            load_action: None,
        }
    }
}

/// One reconciliation pass, without side effects.
pub fn decide(location: &Location, state: &ReconcileState, schema: &AddressSchema) -> Decision {
    if state.last_evaluated.as_deref() == Some(location.pathname.as_str()) {
        return Decision::unchanged();
    }

    let address = parse(schema, &location.pathname);
    let mut decision = Decision {
        outcome: Outcome::Incomplete,
        address: None,
        address_action: None,
        load_action: None,
    };

    if address.is_malformed() {
        decision.outcome = Outcome::Malformed;
    } else if !address.is_complete {
        let normalized = address.normalized_path();
        if address.has_recognized_levels() && normalized != location.pathname {
            decision.address_action = Some(AddressAction::Replace(compose_url(
                &normalized,
                &stringify_query(&location.query),
            )));
        }
    } else if state.latest_valid.as_deref() == Some(address.canonical_key.as_str()) {
        decision.outcome = Outcome::Current;
    } else {
        decision.outcome = Outcome::Load;
        decision.load_action = Some(LoadRequest {
            key: address.canonical_key.clone(),
            address: location.pathname.clone(),
        });
    }

    decision.address = Some(address);
    decision
}

/// Lifecycle of the bound dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    LocationKnown,
    DatasetPending(String),
    DatasetLoaded(String),
}

pub struct RouteStateSynchronizer<H: History> {
    history: H,
    settings: Settings,
    bindings: QueryBindings,
    location: Location,
    state: ReconcileState,
    phase: Phase,
    viewport: ViewportMonitor,
    subscriptions: Vec<Subscription>,
}

impl<H: History> RouteStateSynchronizer<H> {
    /// Reads the current address so the first render already reflects it.
    ///
    /// The pathname is kept as the history holds it; an incomplete address
    /// is tidied (`/zika` to `/zika/`) by the first reconciliation in
    /// [`Self::mount`], which rewrites the history entry in place.
    pub fn new(history: H, settings: Settings, host: &impl Host) -> Self {
        let (pathname, search) = history.location();
        let pathname = if pathname.is_empty() {
            "/".to_string()
        } else {
            pathname
        };
        let viewport = ViewportMonitor::new(
            settings.resize_throttle(),
            host.breakpoint_matches(settings.controls_hidden_width),
        );
        Self {
            history,
            bindings: QueryBindings::default(),
            location: Location::new(pathname, parse_query(&search)),
            state: ReconcileState::default(),
            phase: Phase::LocationKnown,
            viewport,
            subscriptions: Vec::new(),
            settings,
        }
    }

    pub fn with_bindings(mut self, bindings: QueryBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn is_mounted(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Initializes the store from the query, starts listening to the host and
    /// runs the first reconciliation. A second call is a no-op.
    pub fn mount<D: Dispatch + ?Sized>(
        &mut self,
        host: &mut impl Host,
        sink: &mut D,
        today: NaiveDate,
    ) {
        if self.is_mounted() {
            debug!("synchronizer already mounted");
            return;
        }
        self.bindings
            .reconcile(&self.location.query, sink, today, &self.settings.defaults);

        let width = self.settings.controls_hidden_width;
        self.subscriptions = [
            HostEventKind::PopState,
            HostEventKind::Resize,
            HostEventKind::Breakpoint,
        ]
        .into_iter()
        .map(|kind| host.listen(kind, width))
        .collect();

        self.viewport.activate(host.dimensions(), sink);
        self.reconcile(sink);
    }

    /// Releases every host listener.
    pub fn teardown(&mut self) {
        debug!("releasing {} host listeners", self.subscriptions.len());
        self.subscriptions.clear();
    }

    pub fn handle<D: Dispatch + ?Sized>(&mut self, event: HostEvent, now: Instant, sink: &mut D) {
        match event {
            HostEvent::PopState => {
                self.reload_location();
                self.reconcile(sink);
            }
            HostEvent::Resize(dims) => self.viewport.on_resize(dims, now, sink),
            HostEvent::Breakpoint(matches) => {
                self.viewport.on_breakpoint(matches);
            }
        }
    }

    /// Delivers a throttled trailing resize once it is due.
    pub fn poll<D: Dispatch + ?Sized>(&mut self, now: Instant, sink: &mut D) {
        self.viewport.poll(now, sink);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.viewport.next_deadline()
    }

    /// In-app navigation: pushes a new history entry and reconciles at once,
    /// without waiting for a navigation event.
    pub fn change_route<D: Dispatch + ?Sized>(
        &mut self,
        pathname: &str,
        query: Query,
        sink: &mut D,
    ) -> Decision {
        let pathname = normalize_path(&pathname.replacen(REDIRECT_MARKER, "", 1));
        let search = stringify_query(&query);
        let url = compose_url(&pathname, &search);
        debug!("change route to {url}");
        self.history.push(&url);
        // what the address bar can give back, not what the caller passed
        self.location = Location::new(pathname, parse_query(&search));
        self.reconcile(sink)
    }

    /// Pushes a new path and carries the current query string forward unchanged.
    pub fn set_virus_path<D: Dispatch + ?Sized>(
        &mut self,
        new_path: &str,
        sink: &mut D,
    ) -> Decision {
        let pathname = normalize_path(new_path);
        let (_, search) = self.history.location();
        self.history.push(&compose_url(&pathname, &search));
        self.location = Location::new(pathname, parse_query(&search));
        self.reconcile(sink)
    }

    /// Runs one pass over the current location and applies its decision.
    pub fn reconcile<D: Dispatch + ?Sized>(&mut self, sink: &mut D) -> Decision {
        let decision = decide(&self.location, &self.state, &self.settings.schema);
        if decision.outcome == Outcome::Unchanged {
            return decision;
        }
        debug!("reconcile {} -> {:?}", self.location.pathname, decision.outcome);
        self.state.last_evaluated = Some(self.location.pathname.clone());

        if let Some(AddressAction::Replace(url)) = &decision.address_action {
            debug!("normalizing address to {url}");
            self.history.replace(url);
            // the rewrite moved the address; continue from what history now says
            self.reload_location();
            self.state.last_evaluated = Some(self.location.pathname.clone());
        }

        if let Some(request) = &decision.load_action {
            if self.state.latest_valid.as_deref() != Some(request.key.as_str()) {
                info!("requesting dataset {} for {}", request.key, request.address);
                sink.dispatch(Action::RequestDatasetLoad(request.clone()));
                self.state.latest_valid = Some(request.key.clone());
                self.phase = Phase::DatasetPending(request.key.clone());
            }
        }
        decision
    }

    /// Loader acknowledgement. Ignored unless `key` is the latest request.
    pub fn mark_loaded(&mut self, key: &str) -> bool {
        if self.state.latest_valid.as_deref() != Some(key) {
            debug!("ignoring load completion for superseded {key}");
            return false;
        }
        self.phase = Phase::DatasetLoaded(key.to_string());
        true
    }

    pub fn toggle_dock(&mut self) {
        self.viewport.toggle_dock();
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.viewport.set_open(open);
    }

    pub fn sidebar(&self) -> SidebarState {
        self.viewport.sidebar()
    }

    pub fn dimensions(&self) -> Option<ViewportDimensions> {
        self.viewport.dimensions()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Parse of the current pathname.
    pub fn address(&self) -> DatasetAddress {
        parse(&self.settings.schema, &self.location.pathname)
    }

    pub fn latest_valid(&self) -> Option<&str> {
        self.state.latest_valid.as_deref()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Mutable history access for hosts driving back/forward themselves;
    /// follow any move with [`HostEvent::PopState`].
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    fn reload_location(&mut self) {
        let (pathname, search) = self.history.location();
        self.location = Location::new(pathname, parse_query(&search));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Level;

    fn schema() -> AddressSchema {
        AddressSchema::new(vec![
            Level::one_of("virus", true, &["zika", "ebola"]),
            Level::one_of("segment", true, &["s1", "s2"]),
            Level::one_of("resolution", false, &["genome"]),
        ])
    }

    #[test]
    fn test_decide_new_valid_address_loads() {
        let loc = Location::from_url("/zika/s1/");
        let d = decide(&loc, &ReconcileState::default(), &schema());
        assert_eq!(d.outcome, Outcome::Load);
        assert_eq!(
            d.load_action,
            Some(LoadRequest {
                key: "s1_zika".to_string(),
                address: "/zika/s1/".to_string(),
            })
        );
        assert_eq!(d.address_action, None);
    }

    #[test]
    fn test_decide_skips_evaluated_pathname() {
        let loc = Location::from_url("/zika/s1/");
        let state = ReconcileState {
            last_evaluated: Some("/zika/s1/".to_string()),
            latest_valid: None,
        };
        assert_eq!(decide(&loc, &state, &schema()).outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_decide_same_key_is_current() {
        let loc = Location::from_url("/s1/zika/");
        let state = ReconcileState {
            last_evaluated: Some("/zika/s1/".to_string()),
            latest_valid: Some("s1_zika".to_string()),
        };
        let d = decide(&loc, &state, &schema());
        assert_eq!(d.outcome, Outcome::Current);
        assert!(d.load_action.is_none());
    }

    #[test]
    fn test_decide_incomplete_replaces_with_query() {
        let loc = Location::from_url("/zika?c=country");
        let d = decide(&loc, &ReconcileState::default(), &schema());
        assert_eq!(d.outcome, Outcome::Incomplete);
        assert_eq!(
            d.address_action,
            Some(AddressAction::Replace("/zika/?c=country".to_string()))
        );
        assert!(d.load_action.is_none());
    }

    #[test]
    fn test_decide_normalized_incomplete_needs_nothing() {
        let loc = Location::from_url("/zika/");
        let d = decide(&loc, &ReconcileState::default(), &schema());
        assert_eq!(d.outcome, Outcome::Incomplete);
        assert_eq!(d.address_action, None);
    }

    #[test]
    fn test_decide_malformed_is_ignored() {
        let loc = Location::from_url("/zika/ebola");
        let d = decide(&loc, &ReconcileState::default(), &schema());
        assert_eq!(d.outcome, Outcome::Malformed);
        assert_eq!(d.address_action, None);
        assert_eq!(d.load_action, None);
    }

    #[test]
    fn test_decide_unknown_only_path_left_alone() {
        let loc = Location::from_url("/whatever");
        let d = decide(&loc, &ReconcileState::default(), &schema());
        assert_eq!(d.outcome, Outcome::Incomplete);
        assert_eq!(d.address_action, None);
    }
}
