mod actions;
mod address;
mod bindings;
mod color_by;
mod error;
mod fence;
mod history;
mod host;
mod query;
mod routes;
mod settings;
mod sync;
mod viewport;

pub use self::actions::{Action, ActionKind, Dispatch, FnDispatch, LoadRequest};
pub use self::address::{
    normalize_path, parse, Accepts, AddressIssue, AddressSchema, DatasetAddress, Level,
    KEY_SEPARATOR,
};
pub use self::bindings::{
    format_date, standard_bindings, today, years_before, DefaultContext, DefaultFn, QueryBinding,
    QueryBindings, DATE_FORMAT, KEY_COLOR_BY, KEY_DATE_MAX, KEY_DATE_MIN, KEY_DISTANCE_MEASURE,
    KEY_LAYOUT,
};
pub use self::color_by::{genotype_frequency_key, is_genotype, GENOTYPE_PREFIX};
pub use self::error::{ConfigError, Result};
pub use self::fence::LoadFence;
pub use self::history::{History, MemoryHistory};
pub use self::host::{Host, HostEvent, HostEventKind, MemoryHost, Subscription};
pub use self::query::{compose_url, parse_query, split_url, stringify_query, Location, Query};
pub use self::routes::{Redirect, Route, RouteTable};
pub use self::settings::{Settings, SettingsDefaults};
pub use self::sync::{
    decide, AddressAction, Decision, Outcome, Phase, ReconcileState, RouteStateSynchronizer,
    REDIRECT_MARKER,
};
pub use self::viewport::{
    DockSource, DockState, SidebarState, Throttle, ViewportDimensions, ViewportMonitor,
};
