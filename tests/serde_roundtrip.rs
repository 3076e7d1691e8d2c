use chrono::NaiveDate;
use phylo_view::{
    Accepts, Action, ConfigError, MemoryHistory, MemoryHost, RouteStateSynchronizer, Settings,
    ViewportDimensions,
};

const SETTINGS: &str = r#"{
    "schema": {
        "levels": [
            {"name": "virus", "required": true, "accepts": {"oneOf": ["flu"]}},
            {"name": "lineage", "required": true, "accepts": {"oneOf": ["h3n2", "h1n1pdm"]}},
            {"name": "build", "required": false, "accepts": "any"}
        ],
        "key_order": ["virus", "lineage", "build"]
    },
    "defaults": {"layout": "radial", "date_range_years": 2},
    "resize_throttle_ms": 250
}"#;

#[test]
fn test_settings_from_json() {
    let settings = Settings::from_json(SETTINGS).expect("valid settings");
    assert_eq!(settings.schema.levels.len(), 3);
    assert_eq!(settings.schema.levels[2].accepts, Accepts::Any);
    assert_eq!(settings.defaults.layout, "radial");
    assert_eq!(settings.defaults.color_by, "region");
    assert_eq!(settings.controls_hidden_width, 1000.0);

    let json = serde_json::to_string(&settings).expect("serialize settings");
    let again = Settings::from_json(&json).expect("deserialize settings");
    assert_eq!(again, settings);
}

#[test]
fn test_invalid_settings_rejected() {
    let err = Settings::from_json(r#"{"schema": {"levels": []}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::EmptySchema));

    let err = Settings::from_json(r#"{"schema": {"levels": [{"name": "virus", "accepts": {"oneOf": ["zika"]}}], "key_order": ["segment"]}}"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::KeyOrder(_)));

    assert!(matches!(
        Settings::from_json("not json"),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn test_action_log_replays() {
    let settings = Settings::from_json(SETTINGS).expect("valid settings");
    let mut host = MemoryHost::new(ViewportDimensions::new(800.0, 600.0, 600.0));
    let mut sync =
        RouteStateSynchronizer::new(MemoryHistory::new("/h3n2/flu/2026-10"), settings, &host);
    let mut log: Vec<Action> = Vec::new();
    sync.mount(
        &mut host,
        &mut log,
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date"),
    );

    assert!(!sync.sidebar().docked());
    assert_eq!(sync.latest_valid(), Some("flu_h3n2_2026-10"));
    assert!(log.contains(&Action::SetLayout("radial".to_string())));
    assert!(log.contains(&Action::SetAbsoluteDateMin("2024-10-16".to_string())));

    let json = serde_json::to_string(&log).expect("serialize log");
    let replayed: Vec<Action> = serde_json::from_str(&json).expect("deserialize log");
    assert_eq!(replayed, log);
}
