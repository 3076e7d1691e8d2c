use phylo_view::{
    normalize_path, parse, parse_query, split_url, stringify_query, Action, AddressSchema, Level,
    MemoryHistory, MemoryHost, Query, RouteStateSynchronizer, Settings, ViewportDimensions,
};
use proptest::prelude::*;

fn schema() -> AddressSchema {
    AddressSchema::new(vec![
        Level::one_of("virus", true, &["zika", "ebola"]),
        Level::one_of("segment", true, &["s1", "s2", "s3"]),
        Level::one_of("resolution", false, &["genome", "3y"]),
    ])
}

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("zika".to_string()),
        Just("ebola".to_string()),
        Just("s1".to_string()),
        Just("s3".to_string()),
        Just("genome".to_string()),
        "[a-z0-9]{1,6}",
    ]
}

proptest! {
    #[test]
    fn parse_is_idempotent_over_normalized_path(
        segments in prop::collection::vec(segment(), 0..5),
        lead in any::<bool>(),
        trail in any::<bool>(),
    ) {
        let mut path = segments.join("/");
        if lead {
            path.insert(0, '/');
        }
        if trail {
            path.push('/');
        }
        let first = parse(&schema(), &path);
        let second = parse(&schema(), &first.normalized_path());
        prop_assert_eq!(&first.normalized_path(), &second.normalized_path());
        prop_assert_eq!(first.canonical_key, second.canonical_key);
        prop_assert_eq!(first.is_complete, second.is_complete);
        prop_assert_eq!(first.is_valid, second.is_valid);
    }

    #[test]
    fn canonical_key_ignores_segment_order(
        virus in prop::sample::select(vec!["zika", "ebola"]),
        seg in prop::sample::select(vec!["s1", "s2", "s3"]),
        with_resolution in any::<bool>(),
        rotate in 0usize..3,
    ) {
        let mut segments = vec![virus, seg];
        if with_resolution {
            segments.push("genome");
        }
        let baseline = parse(&schema(), &segments.join("/"));
        let len = segments.len();
        segments.rotate_left(rotate % len);
        segments.swap(0, len - 1);
        let permuted = parse(&schema(), &segments.join("/"));
        prop_assert!(baseline.is_valid);
        prop_assert_eq!(baseline.canonical_key, permuted.canonical_key);
    }

    #[test]
    fn normalize_path_is_stable(path in "[a-z/]{0,20}") {
        let once = normalize_path(&path);
        prop_assert!(once.starts_with('/'));
        prop_assert!(once.ends_with('/'));
        prop_assert!(!once.contains("//"));
        prop_assert_eq!(normalize_path(&once), once);
    }

    #[test]
    fn query_survives_stringify(
        query in prop::collection::btree_map("[a-z]{1,4}", "[a-zA-Z0-9 &=?-]{0,8}", 0..5),
    ) {
        prop_assert_eq!(parse_query(&stringify_query(&query)), query);
    }

    #[test]
    fn change_route_address_round_trips_query(
        segments in prop::collection::vec(segment(), 0..4),
        query in prop::collection::btree_map("[a-z &=?%+]{0,3}", "[a-z0-9 &=]{0,5}", 0..4),
    ) {
        let host = MemoryHost::new(ViewportDimensions::new(1200.0, 800.0, 800.0));
        let settings = Settings { schema: schema(), ..Settings::default() };
        let mut sync = RouteStateSynchronizer::new(MemoryHistory::default(), settings, &host);
        let mut sink: Vec<Action> = Vec::new();
        let query: Query = query;
        let expected: Query = query
            .iter()
            .filter(|(k, _)| !k.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let decision = sync.change_route(&segments.join("/"), query, &mut sink);
        let (pathname, search) = split_url(sync.history().current());
        prop_assert_eq!(pathname, normalize_path(&segments.join("/")));
        prop_assert_eq!(&parse_query(search), &expected);
        prop_assert_eq!(&sync.location().query, &expected);
        prop_assert!(decision.load_action.iter().count() <= 1);
    }
}
