use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{address::AddressSchema, error::Result, routes::RouteTable};

/// Store values used when the query string does not provide one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDefaults {
    pub layout: String,
    pub distance_measure: String,
    /// Span of the absolute date range, counted back from today.
    pub date_range_years: u32,
    pub color_by: String,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            layout: "rect".to_string(),
            distance_measure: "div".to_string(),
            date_range_years: 6,
            color_by: "region".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub schema: AddressSchema,
    pub defaults: SettingsDefaults,
    /// Viewports at least this wide dock the sidebar.
    pub controls_hidden_width: f32,
    pub resize_throttle_ms: u64,
    pub routes: RouteTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema: AddressSchema::default(),
            defaults: SettingsDefaults::default(),
            controls_hidden_width: 1000.0,
            resize_throttle_ms: 500,
            routes: RouteTable::default(),
        }
    }
}

impl Settings {
    /// Parses and validates settings; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.schema.validate()?;
        Ok(settings)
    }

    pub fn resize_throttle(&self) -> Duration {
        Duration::from_millis(self.resize_throttle_ms)
    }
}
