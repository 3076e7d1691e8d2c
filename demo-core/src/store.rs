use std::collections::VecDeque;

use phylo_view::{Action, Dispatch, LoadRequest, ViewportDimensions};

pub const ACTIONS_LIMIT: usize = 200;

/// The slice of viewer state the synchronizer writes to.
#[derive(Debug, Clone, Default)]
pub struct ViewerStore {
    pub layout: String,
    pub distance_measure: String,
    pub date_min: String,
    pub date_max: String,
    pub absolute_date_min: String,
    pub absolute_date_max: String,
    pub color_by: String,
    pub viewport: Option<ViewportDimensions>,
    pending_load: Option<LoadRequest>,
    log: VecDeque<String>,
    dispatched: usize,
}

impl ViewerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load requested since the last call, if any.
    pub fn take_load(&mut self) -> Option<LoadRequest> {
        self.pending_load.take()
    }

    /// Serialized actions, newest last.
    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn record(&mut self, action: &Action) {
        let line = match serde_json::to_string(action) {
            Ok(json) => json,
            Err(err) => format!("{action:?} ({err})"),
        };
        if self.log.len() == ACTIONS_LIMIT {
            self.log.pop_front();
        }
        self.log.push_back(line);
        self.dispatched += 1;
    }

    fn reduce(&mut self, action: Action) {
        match action {
            Action::SetLayout(v) => self.layout = v,
            Action::SetDistanceMeasure(v) => self.distance_measure = v,
            Action::SetDateMin(v) => self.date_min = v,
            Action::SetDateMax(v) => self.date_max = v,
            Action::SetAbsoluteDateMin(v) => self.absolute_date_min = v,
            Action::SetAbsoluteDateMax(v) => self.absolute_date_max = v,
            Action::SetColorBy(v) => self.color_by = v,
            Action::SetViewport(dims) => self.viewport = Some(dims),
            Action::RequestDatasetLoad(request) => self.pending_load = Some(request),
        }
    }
}

impl Dispatch for ViewerStore {
    fn dispatch(&mut self, action: Action) {
        self.record(&action);
        self.reduce(action);
    }
}
