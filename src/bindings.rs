//! Query-string parameters bound to store fields.
//!
//! Each binding reads one query key (or none) and falls back to a computed
//! default. Defaults may depend on values resolved earlier in the same pass;
//! those dependencies are edges in a graph and bindings are applied in its
//! topological order, so the selected date range always sees the absolute
//! range that was just dispatched.

use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use log::debug;
use petgraph::{algo::toposort, graph::DiGraph};

use crate::{
    actions::{ActionKind, Dispatch},
    error::{ConfigError, Result},
    query::Query,
    settings::SettingsDefaults,
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const KEY_LAYOUT: &str = "l";
pub const KEY_DISTANCE_MEASURE: &str = "m";
pub const KEY_DATE_MIN: &str = "dmin";
pub const KEY_DATE_MAX: &str = "dmax";
pub const KEY_COLOR_BY: &str = "c";

/// Inputs available to a default: the clock, configured defaults and the
/// values already resolved in this pass.
pub struct DefaultContext<'a> {
    pub today: NaiveDate,
    pub defaults: &'a SettingsDefaults,
    resolved: &'a HashMap<ActionKind, String>,
}

impl DefaultContext<'_> {
    pub fn resolved(&self, kind: ActionKind) -> Option<&str> {
        self.resolved.get(&kind).map(String::as_str)
    }
}

pub type DefaultFn = fn(&DefaultContext<'_>) -> String;

#[derive(Debug, Clone, Copy)]
pub struct QueryBinding {
    /// Query key, or `None` for fields that always take their default.
    pub key: Option<&'static str>,
    pub kind: ActionKind,
    pub default: DefaultFn,
    /// Bindings whose resolved value the default reads.
    pub depends_on: &'static [ActionKind],
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// `date` moved back by whole years; Feb 29 clamps to Feb 28.
pub fn years_before(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

fn default_layout(ctx: &DefaultContext<'_>) -> String {
    ctx.defaults.layout.clone()
}

fn default_distance_measure(ctx: &DefaultContext<'_>) -> String {
    ctx.defaults.distance_measure.clone()
}

fn default_absolute_min(ctx: &DefaultContext<'_>) -> String {
    format_date(years_before(ctx.today, ctx.defaults.date_range_years))
}

fn default_absolute_max(ctx: &DefaultContext<'_>) -> String {
    format_date(ctx.today)
}

fn default_date_min(ctx: &DefaultContext<'_>) -> String {
    ctx.resolved(ActionKind::AbsoluteDateMin)
        .map_or_else(|| default_absolute_min(ctx), ToString::to_string)
}

fn default_date_max(ctx: &DefaultContext<'_>) -> String {
    ctx.resolved(ActionKind::AbsoluteDateMax)
        .map_or_else(|| default_absolute_max(ctx), ToString::to_string)
}

fn default_color_by(ctx: &DefaultContext<'_>) -> String {
    ctx.defaults.color_by.clone()
}

pub fn standard_bindings() -> Vec<QueryBinding> {
    vec![
        QueryBinding {
            key: Some(KEY_LAYOUT),
            kind: ActionKind::Layout,
            default: default_layout,
            depends_on: &[],
        },
        QueryBinding {
            key: Some(KEY_DISTANCE_MEASURE),
            kind: ActionKind::DistanceMeasure,
            default: default_distance_measure,
            depends_on: &[],
        },
        QueryBinding {
            key: None,
            kind: ActionKind::AbsoluteDateMin,
            default: default_absolute_min,
            depends_on: &[],
        },
        QueryBinding {
            key: None,
            kind: ActionKind::AbsoluteDateMax,
            default: default_absolute_max,
            depends_on: &[],
        },
        QueryBinding {
            key: Some(KEY_DATE_MIN),
            kind: ActionKind::DateMin,
            default: default_date_min,
            depends_on: &[ActionKind::AbsoluteDateMin],
        },
        QueryBinding {
            key: Some(KEY_DATE_MAX),
            kind: ActionKind::DateMax,
            default: default_date_max,
            depends_on: &[ActionKind::AbsoluteDateMax],
        },
        QueryBinding {
            key: Some(KEY_COLOR_BY),
            kind: ActionKind::ColorBy,
            default: default_color_by,
            depends_on: &[],
        },
    ]
}

/// A binding table with its application order fixed up front.
#[derive(Debug, Clone)]
pub struct QueryBindings {
    bindings: Vec<QueryBinding>,
    order: Vec<usize>,
}

impl Default for QueryBindings {
    fn default() -> Self {
        match Self::new(standard_bindings()) {
            Ok(bindings) => bindings,
            Err(err) => unreachable!("standard bindings are well formed: {err}"),
        }
    }
}

impl QueryBindings {
    pub fn new(bindings: Vec<QueryBinding>) -> Result<Self> {
        let mut graph = DiGraph::<usize, ()>::new();
        let nodes: Vec<_> = (0..bindings.len()).map(|i| graph.add_node(i)).collect();
        for (i, binding) in bindings.iter().enumerate() {
            for dep in binding.depends_on {
                let Some(j) = bindings.iter().position(|b| b.kind == *dep) else {
                    return Err(ConfigError::MissingDependency(*dep));
                };
                graph.add_edge(nodes[j], nodes[i], ());
            }
        }
        let order = toposort(&graph, None)
            .map_err(|cycle| ConfigError::BindingCycle(bindings[graph[cycle.node_id()]].kind))?
            .into_iter()
            .map(|n| graph[n])
            .collect();
        Ok(Self { bindings, order })
    }

    /// Bindings in application order.
    pub fn ordered(&self) -> impl Iterator<Item = &QueryBinding> {
        self.order.iter().map(|i| &self.bindings[*i])
    }

    /// Dispatches one update per binding: the query value when present and
    /// non-empty, otherwise the default.
    pub fn reconcile<D: Dispatch + ?Sized>(
        &self,
        query: &Query,
        sink: &mut D,
        today: NaiveDate,
        defaults: &SettingsDefaults,
    ) {
        let mut resolved: HashMap<ActionKind, String> = HashMap::new();
        for binding in self.ordered() {
            let from_query = binding
                .key
                .and_then(|k| query.get(k))
                .filter(|v| !v.is_empty())
                .cloned();
            let value = match from_query {
                Some(v) => {
                    debug!("{:?} from query: {v}", binding.kind);
                    v
                }
                None => {
                    let ctx = DefaultContext {
                        today,
                        defaults,
                        resolved: &resolved,
                    };
                    let v = (binding.default)(&ctx);
                    debug!("{:?} from default: {v}", binding.kind);
                    v
                }
            };
            resolved.insert(binding.kind, value.clone());
            if let Some(action) = binding.kind.with_value(value) {
                sink.dispatch(action);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::query::parse_query;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn position(actions: &[Action], kind: ActionKind) -> usize {
        actions.iter().position(|a| a.kind() == kind).unwrap()
    }

    #[test]
    fn test_empty_query_dispatches_every_default_once() {
        let mut sink: Vec<Action> = Vec::new();
        QueryBindings::default().reconcile(
            &Query::new(),
            &mut sink,
            day(2026, 10, 16),
            &SettingsDefaults::default(),
        );
        assert_eq!(sink.len(), 7);
        for kind in [
            ActionKind::Layout,
            ActionKind::DistanceMeasure,
            ActionKind::AbsoluteDateMin,
            ActionKind::AbsoluteDateMax,
            ActionKind::DateMin,
            ActionKind::DateMax,
            ActionKind::ColorBy,
        ] {
            assert_eq!(sink.iter().filter(|a| a.kind() == kind).count(), 1);
        }
        assert!(sink.contains(&Action::SetLayout("rect".to_string())));
        assert!(sink.contains(&Action::SetDistanceMeasure("div".to_string())));
        assert!(sink.contains(&Action::SetColorBy("region".to_string())));
        assert!(sink.contains(&Action::SetAbsoluteDateMin("2020-10-16".to_string())));
        assert!(sink.contains(&Action::SetDateMin("2020-10-16".to_string())));
        assert!(sink.contains(&Action::SetDateMax("2026-10-16".to_string())));
        assert!(
            position(&sink, ActionKind::AbsoluteDateMin) < position(&sink, ActionKind::DateMin)
        );
        assert!(
            position(&sink, ActionKind::AbsoluteDateMax) < position(&sink, ActionKind::DateMax)
        );
    }

    #[test]
    fn test_query_values_pass_through_raw() {
        let mut sink: Vec<Action> = Vec::new();
        QueryBindings::default().reconcile(
            &parse_query("?dmin=2020-01-01&l=radial&c=gt-HA1_159&x=ignored"),
            &mut sink,
            day(2026, 10, 16),
            &SettingsDefaults::default(),
        );
        assert!(sink.contains(&Action::SetDateMin("2020-01-01".to_string())));
        assert!(sink.contains(&Action::SetDateMax("2026-10-16".to_string())));
        assert!(sink.contains(&Action::SetLayout("radial".to_string())));
        assert!(sink.contains(&Action::SetColorBy("gt-HA1_159".to_string())));
        assert_eq!(sink.len(), 7);
    }

    #[test]
    fn test_empty_query_value_falls_back() {
        let mut sink: Vec<Action> = Vec::new();
        QueryBindings::default().reconcile(
            &parse_query("?l="),
            &mut sink,
            day(2026, 10, 16),
            &SettingsDefaults::default(),
        );
        assert!(sink.contains(&Action::SetLayout("rect".to_string())));
    }

    #[test]
    fn test_years_before_clamps_leap_day() {
        assert_eq!(years_before(day(2024, 2, 29), 1), day(2023, 2, 28));
        assert_eq!(years_before(day(2026, 10, 16), 6), day(2020, 10, 16));
    }

    #[test]
    fn test_dependency_order_is_structural() {
        // declare the dependents first; the graph still puts their inputs ahead
        let mut reversed = standard_bindings();
        reversed.reverse();
        let bindings = QueryBindings::new(reversed).unwrap();
        let kinds: Vec<ActionKind> = bindings.ordered().map(|b| b.kind).collect();
        let at = |k| kinds.iter().position(|x| *x == k).unwrap();
        assert!(at(ActionKind::AbsoluteDateMin) < at(ActionKind::DateMin));
        assert!(at(ActionKind::AbsoluteDateMax) < at(ActionKind::DateMax));
    }

    #[test]
    fn test_cycle_and_missing_dependency_rejected() {
        let a = QueryBinding {
            key: None,
            kind: ActionKind::DateMin,
            default: default_date_min,
            depends_on: &[ActionKind::DateMax],
        };
        let b = QueryBinding {
            key: None,
            kind: ActionKind::DateMax,
            default: default_date_max,
            depends_on: &[ActionKind::DateMin],
        };
        assert!(matches!(
            QueryBindings::new(vec![a, b]),
            Err(ConfigError::BindingCycle(_))
        ));
        assert!(matches!(
            QueryBindings::new(vec![a]),
            Err(ConfigError::MissingDependency(ActionKind::DateMax))
        ));
    }
}
