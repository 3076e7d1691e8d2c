use serde::{Deserialize, Serialize};

use crate::viewport::ViewportDimensions;

/// A dataset fetch handed to the external loader.
///
/// `key` doubles as the fencing token: a loader must drop any response whose
/// key is no longer the latest one requested (see [`crate::LoadFence`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub key: String,
    /// Pathname the key was derived from.
    pub address: String,
}

/// Store updates issued by the synchronizer. Serialized as
/// `{"type": "SET_LAYOUT", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SetLayout(String),
    SetDistanceMeasure(String),
    SetDateMin(String),
    SetDateMax(String),
    SetAbsoluteDateMin(String),
    SetAbsoluteDateMax(String),
    SetColorBy(String),
    SetViewport(ViewportDimensions),
    RequestDatasetLoad(LoadRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    Layout,
    DistanceMeasure,
    DateMin,
    DateMax,
    AbsoluteDateMin,
    AbsoluteDateMax,
    ColorBy,
    Viewport,
    DatasetLoad,
}

impl ActionKind {
    /// Builds the action for kinds that carry a plain string value.
    pub fn with_value(self, value: String) -> Option<Action> {
        match self {
            ActionKind::Layout => Some(Action::SetLayout(value)),
            ActionKind::DistanceMeasure => Some(Action::SetDistanceMeasure(value)),
            ActionKind::DateMin => Some(Action::SetDateMin(value)),
            ActionKind::DateMax => Some(Action::SetDateMax(value)),
            ActionKind::AbsoluteDateMin => Some(Action::SetAbsoluteDateMin(value)),
            ActionKind::AbsoluteDateMax => Some(Action::SetAbsoluteDateMax(value)),
            ActionKind::ColorBy => Some(Action::SetColorBy(value)),
            ActionKind::Viewport | ActionKind::DatasetLoad => None,
        }
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::SetLayout(_) => ActionKind::Layout,
            Action::SetDistanceMeasure(_) => ActionKind::DistanceMeasure,
            Action::SetDateMin(_) => ActionKind::DateMin,
            Action::SetDateMax(_) => ActionKind::DateMax,
            Action::SetAbsoluteDateMin(_) => ActionKind::AbsoluteDateMin,
            Action::SetAbsoluteDateMax(_) => ActionKind::AbsoluteDateMax,
            Action::SetColorBy(_) => ActionKind::ColorBy,
            Action::SetViewport(_) => ActionKind::Viewport,
            Action::RequestDatasetLoad(_) => ActionKind::DatasetLoad,
        }
    }
}

/// Receiver of store updates: the store's dispatch function.
pub trait Dispatch {
    fn dispatch(&mut self, action: Action);
}

impl Dispatch for Vec<Action> {
    fn dispatch(&mut self, action: Action) {
        self.push(action);
    }
}

impl<D: Dispatch + ?Sized> Dispatch for &mut D {
    fn dispatch(&mut self, action: Action) {
        (**self).dispatch(action);
    }
}

/// Adapts a closure into a [`Dispatch`].
pub struct FnDispatch<F>(pub F);

impl<F: FnMut(Action)> Dispatch for FnDispatch<F> {
    fn dispatch(&mut self, action: Action) {
        (self.0)(action);
    }
}

#[cfg(feature = "events")]
impl Dispatch for crossbeam::channel::Sender<Action> {
    fn dispatch(&mut self, action: Action) {
        if let Err(err) = self.send(action) {
            log::warn!("dropping action, store channel closed: {:?}", err.0.kind());
        }
    }
}
