use chanmap_core::{
    CatalogConfig, ChannelCatalog, Mapping, Point, RuleTable, SignalType, TranslatorConfig,
};
use chanmap_core::{AllocatorConfig, ModuleAddressPlanner};
use chanmap_engine::{AssignError, AssignmentEngine};
use chanmap_store::{JsonFileStore, MemoryStore, Repository};
use std::collections::BTreeMap;

fn catalog(counts: &str) -> ChannelCatalog {
    ChannelCatalog::new(CatalogConfig::parse_counts(counts).unwrap())
}

fn setup(counts: &str, points: Vec<Point>) -> (AssignmentEngine<MemoryStore>, String, String) {
    let engine = AssignmentEngine::new(MemoryStore::new(), catalog(counts));
    let project = engine.create_project("Unit 1", "test plant").unwrap();
    engine.import_points(&project, points).unwrap();
    let scheme = engine.create_scheme(&project, "Main", "").unwrap();
    (engine, project, scheme)
}

fn ai(id: &str, tag: &str) -> Point {
    Point::new(id, tag, SignalType::Ai)
}

#[test]
fn assign_then_channel_is_used() {
    let (engine, project, scheme) = setup("AI=4,DI=4", vec![ai("p1", "PT-1001")]);

    let mapping = engine.assign(&project, &scheme, "p1", "AI-03").unwrap();
    assert_eq!(mapping.channel_id.to_string(), "AI-03");
    assert_eq!(mapping.channel_type, SignalType::Ai);

    let used = engine.get_used_channels(&project, &scheme).unwrap();
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].to_string(), "AI-03");
}

#[test]
fn assign_moves_point_to_new_channel() {
    let (engine, project, scheme) = setup("AI=4", vec![ai("p1", "PT-1001")]);

    engine.assign(&project, &scheme, "p1", "AI-01").unwrap();
    engine.assign(&project, &scheme, "p1", "AI-02").unwrap();

    let used = engine.get_used_channels(&project, &scheme).unwrap();
    assert_eq!(
        used.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ["AI-02"]
    );
}

#[test]
fn reassigning_same_channel_is_a_no_op() {
    let (engine, project, scheme) = setup("AI=4", vec![ai("p1", "PT-1001")]);

    let first = engine.assign(&project, &scheme, "p1", "AI-01").unwrap();
    let second = engine.assign(&project, &scheme, "p1", "AI-1").unwrap();
    assert_eq!(first, second);
}

#[test]
fn type_mismatch_leaves_scheme_unchanged() {
    let (engine, project, scheme) = setup(
        "AI=4,DI=4",
        vec![ai("p1", "PT-1001"), Point::new("p2", "LS-2001", SignalType::Di)],
    );
    engine.assign(&project, &scheme, "p2", "DI-01").unwrap();
    let before = engine.repository().load().unwrap();

    let err = engine.assign(&project, &scheme, "p1", "DI-02").unwrap_err();
    assert!(matches!(
        &err,
        AssignError::TypeMismatch { instrument_tag, channel_id, .. }
            if instrument_tag == "PT-1001" && channel_id == "DI-02"
    ));
    assert_eq!(engine.repository().load().unwrap(), before);
}

#[test]
fn assign_failure_kinds() {
    let (engine, project, scheme) = setup("AI=4", vec![ai("p1", "PT-1"), ai("p2", "PT-2")]);
    engine.assign(&project, &scheme, "p1", "AI-01").unwrap();

    let kind = |point: &str, channel: &str| {
        engine
            .assign(&project, &scheme, point, channel)
            .unwrap_err()
            .kind()
    };

    assert_eq!(kind("p9", "AI-02"), "PointNotFound");
    assert_eq!(kind("p2", "AI02"), "InvalidChannelIdFormat");
    assert_eq!(kind("p2", "AI-05"), "ChannelIndexOutOfRange");
    assert_eq!(kind("p2", "RTD-01"), "UnknownChannelType");
    assert_eq!(kind("p2", "AI-01"), "ChannelAlreadyAssigned");
}

#[test]
fn channel_taken_error_names_holder() {
    let (engine, project, scheme) = setup("AI=4", vec![ai("p1", "PT-1"), ai("p2", "PT-2")]);
    engine.assign(&project, &scheme, "p1", "AI-01").unwrap();

    let err = engine.assign(&project, &scheme, "p2", "AI-01").unwrap_err();
    assert!(err.to_string().contains("AI-01"));
    assert!(err.to_string().contains("p1"));
}

#[test]
fn unassign_reports_whether_removed() {
    let (engine, project, scheme) = setup("AI=4", vec![ai("p1", "PT-1")]);
    engine.assign(&project, &scheme, "p1", "AI-01").unwrap();

    assert!(engine.unassign(&project, &scheme, "p1").unwrap());
    assert!(!engine.unassign(&project, &scheme, "p1").unwrap());
    assert!(engine.get_used_channels(&project, &scheme).unwrap().is_empty());
}

#[test]
fn auto_assign_reports_shortfall_per_point() {
    let points = (1..=5)
        .map(|i| ai(&format!("p{i}"), &format!("TT-{i:03}")))
        .collect();
    let (engine, project, scheme) = setup("AI=3", points);

    let summary = engine.auto_assign(&project, &scheme, None, None).unwrap();

    assert_eq!(summary.total_points, 5);
    assert_eq!(summary.assigned, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.failures.len(), 2);
    assert_eq!(summary.failures[0].instrument_tag, "TT-004");
    assert_eq!(summary.failures[1].instrument_tag, "TT-005");
    assert!(summary.failures[0].reason.contains("TT-004"));
    assert!(summary.failures[1].reason.contains("TT-005"));
    assert!(summary
        .errors
        .contains(&"Not enough available AI channels: need 5, available 3".to_string()));
}

#[test]
fn auto_assign_orders_by_type_then_tag() {
    let points = vec![
        Point::new("d2", "XV-200", SignalType::Do),
        Point::new("a2", "PT-200", SignalType::Ai),
        Point::new("i1", "LS-100", SignalType::Di),
        Point::new("a1", "PT-100", SignalType::Ai),
        Point::new("c1", "COM-1", SignalType::Comm),
    ];
    let (engine, project, scheme) = setup("AI=4,DI=4,AO=2,DO=2,COMM=1", points);
    engine.assign(&project, &scheme, "i1", "DI-01").unwrap();

    let summary = engine.auto_assign(&project, &scheme, None, None).unwrap();

    let placed: Vec<(String, String)> = summary
        .assignments
        .iter()
        .map(|a| (a.point_tag.clone(), a.channel_id.to_string()))
        .collect();
    assert_eq!(
        placed,
        [
            ("PT-100".to_string(), "AI-01".to_string()),
            ("PT-200".to_string(), "AI-02".to_string()),
            ("XV-200".to_string(), "DO-01".to_string()),
            ("COM-1".to_string(), "COMM-01".to_string()),
        ]
    );
    assert_eq!(summary.total_points, 4);
    assert_eq!(summary.failed, 0);
}

#[test]
fn auto_assign_skips_used_channels_and_honours_start() {
    let points = vec![ai("a1", "PT-1"), ai("a2", "PT-2"), ai("a3", "PT-3")];
    let (engine, project, scheme) = setup("AI=8", points);
    engine.assign(&project, &scheme, "a1", "AI-04").unwrap();

    let summary = engine
        .auto_assign(&project, &scheme, Some(&SignalType::Ai), Some("AI-03"))
        .unwrap();

    let channels: Vec<String> = summary
        .assignments
        .iter()
        .map(|a| a.channel_id.to_string())
        .collect();
    assert_eq!(channels, ["AI-03", "AI-05"]);
}

#[test]
fn auto_assign_filters_by_signal_type() {
    let points = vec![ai("a1", "PT-1"), Point::new("i1", "LS-1", SignalType::Di)];
    let (engine, project, scheme) = setup("AI=2,DI=2", points);

    let summary = engine
        .auto_assign(&project, &scheme, Some(&SignalType::Di), None)
        .unwrap();
    assert_eq!(summary.total_points, 1);
    assert_eq!(summary.assignments[0].point_id, "i1");
    assert_eq!(
        engine
            .get_unassigned(&project, &scheme, None)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn auto_assign_rejects_invalid_start_channel() {
    let (engine, project, scheme) = setup("AI=2", vec![ai("a1", "PT-1")]);
    let err = engine
        .auto_assign(&project, &scheme, None, Some("AI-9"))
        .unwrap_err();
    assert_eq!(err.kind(), "ChannelIndexOutOfRange");
    assert!(engine.get_used_channels(&project, &scheme).unwrap().is_empty());
}

#[test]
fn auto_assign_is_idempotent() {
    let points = vec![ai("a1", "PT-1"), ai("a2", "PT-2")];
    let (engine, project, scheme) = setup("AI=4", points);

    let first = engine.auto_assign(&project, &scheme, None, None).unwrap();
    assert_eq!(first.assigned, 2);

    let second = engine.auto_assign(&project, &scheme, None, None).unwrap();
    assert_eq!(second.total_points, 0);
    assert_eq!(second.assigned, 0);

    // A newly parsed point is picked up on the next run
    engine
        .import_points(&project, vec![ai("a1", "PT-1"), ai("a2", "PT-2"), ai("a3", "PT-3")])
        .unwrap();
    let third = engine.auto_assign(&project, &scheme, None, None).unwrap();
    assert_eq!(third.assigned, 1);
    assert_eq!(third.assignments[0].channel_id.to_string(), "AI-03");
}

#[test]
fn validate_reports_each_conflicting_channel_once() {
    let points = vec![ai("a1", "PT-1"), ai("a2", "PT-2"), ai("a3", "PT-3")];
    let (engine, project, scheme) = setup("AI=4", points);

    // Write two mappings on one channel straight into the document
    engine
        .repository()
        .transaction(|ws| {
            let scheme = ws
                .project_mut(&project)
                .unwrap()
                .scheme_mut(&scheme)
                .unwrap();
            for point in ["a1", "a2"] {
                scheme.mappings.push(Mapping::new(point, "AI-01".parse().unwrap()));
            }
            Ok::<_, chanmap_store::StoreError>(())
        })
        .unwrap();

    let report = engine.validate_scheme(&project, &scheme).unwrap();
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("AI-01"));
    assert_eq!(report.total_assignments, 2);
    assert_eq!(report.total_points, 3);
}

#[test]
fn validate_warns_on_stale_and_drifted_points() {
    let points = vec![ai("a1", "PT-1"), ai("a2", "PT-2")];
    let (engine, project, scheme) = setup("AI=4,DI=4", points);
    engine.assign(&project, &scheme, "a1", "AI-01").unwrap();
    engine.assign(&project, &scheme, "a2", "AI-02").unwrap();

    // Re-parse: a1 disappears, a2 becomes a digital input
    engine
        .import_points(&project, vec![Point::new("a2", "PT-2", SignalType::Di)])
        .unwrap();

    let report = engine.validate_scheme(&project, &scheme).unwrap();
    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings.iter().any(|w| w.contains("a1")));
    assert!(report.warnings.iter().any(|w| w.contains("PT-2")));
    assert!((report.coverage - 1.0).abs() < f64::EPSILON);
}

#[test]
fn overview_counts_by_type() {
    let points = vec![
        ai("a1", "PT-1"),
        ai("a2", "PT-2"),
        Point::new("i1", "LS-1", SignalType::Di),
        Point::new("o1", "XV-1", SignalType::Do),
    ];
    let (engine, project, scheme) = setup("AI=4,DI=4,DO=4", points);
    engine.assign(&project, &scheme, "a1", "AI-01").unwrap();
    engine.assign(&project, &scheme, "i1", "DI-01").unwrap();

    let overview = engine.get_overview(&project, &scheme).unwrap().unwrap();
    assert_eq!(overview.project_name, "Unit 1");
    assert_eq!(overview.scheme_name, "Main");
    assert_eq!(overview.total_points, 4);
    assert_eq!(overview.assigned_points, 2);
    assert_eq!(overview.unassigned_points, 2);
    assert!((overview.coverage - 0.5).abs() < f64::EPSILON);
    assert_eq!(overview.points_by_type[&SignalType::Ai].total, 2);
    assert_eq!(overview.points_by_type[&SignalType::Ai].assigned, 1);
    assert_eq!(overview.points_by_type[&SignalType::Do].assigned, 0);
    assert_eq!(overview.channel_statistics[0].used, 1);
    assert_eq!(overview.channel_statistics[0].available, 3);
}

#[test]
fn available_channels_exclude_used() {
    let (engine, project, scheme) = setup("DI=3", vec![Point::new("i1", "LS-1", SignalType::Di)]);
    engine.assign(&project, &scheme, "i1", "DI-02").unwrap();

    let available = engine
        .get_available_channels(&project, &scheme, &SignalType::Di)
        .unwrap();
    let ids: Vec<String> = available.iter().map(|c| c.id.to_string()).collect();
    assert_eq!(ids, ["DI-01", "DI-03"]);
}

#[test]
fn suggest_optimal_reports_feasibility() {
    let points = vec![
        ai("a1", "PT-1"),
        ai("a2", "PT-2"),
        Point::new("i1", "LS-1", SignalType::Di),
    ];
    let (engine, project, scheme) = setup("AI=1,DI=2", points);

    let suggestion = engine.suggest_optimal(&project, &scheme).unwrap();
    assert!(!suggestion.feasible);
    assert_eq!(suggestion.unassigned_by_type[&SignalType::Ai], 2);
    assert_eq!(suggestion.suggestions[0].channels.len(), 1);

    engine
        .import_points(&project, vec![ai("a1", "PT-1"), Point::new("i1", "LS-1", SignalType::Di)])
        .unwrap();
    assert!(engine.suggest_optimal(&project, &scheme).unwrap().feasible);

    // Suggesting reserves nothing
    assert!(engine.get_used_channels(&project, &scheme).unwrap().is_empty());
}

#[test]
fn replace_assignments_is_all_or_nothing() {
    let points = vec![ai("a1", "PT-1"), ai("a2", "PT-2"), Point::new("i1", "LS-1", SignalType::Di)];
    let (engine, project, scheme) = setup("AI=4,DI=4", points);
    engine.assign(&project, &scheme, "a1", "AI-04").unwrap();
    let before = engine.repository().load().unwrap();

    let bad: BTreeMap<String, String> = [
        ("a1".to_string(), "AI-01".to_string()),
        ("a2".to_string(), "AI-01".to_string()),
    ]
    .into_iter()
    .collect();
    let err = engine
        .replace_assignments(&project, &scheme, &bad)
        .unwrap_err();
    assert_eq!(err.kind(), "ChannelAlreadyAssigned");
    assert_eq!(engine.repository().load().unwrap(), before);

    let good: BTreeMap<String, String> = [
        ("a2".to_string(), "AI-01".to_string()),
        ("i1".to_string(), "DI-02".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(engine.replace_assignments(&project, &scheme, &good).unwrap(), 2);

    let stats = engine.statistics(&project, &scheme).unwrap();
    assert_eq!(stats.total_assignments, 2);
    assert_eq!(stats.by_channel_type[&SignalType::Ai], 1);
    assert_eq!(
        stats
            .used_channels
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        ["AI-01", "DI-02"]
    );
}

#[test]
fn clear_assignments_empties_scheme() {
    let (engine, project, scheme) = setup("AI=4", vec![ai("a1", "PT-1"), ai("a2", "PT-2")]);
    engine.auto_assign(&project, &scheme, None, None).unwrap();

    assert_eq!(engine.clear_assignments(&project, &scheme).unwrap(), 2);
    assert_eq!(engine.get_unassigned(&project, &scheme, None).unwrap().len(), 2);
}

#[test]
fn plan_addresses_in_channel_order() {
    let points = vec![
        Point::new("i1", "LS-1", SignalType::Di),
        ai("a1", "PT-1"),
        Point::new("c1", "COM-1", SignalType::Comm),
    ];
    let (engine, project, scheme) = setup("AI=2,DI=2,COMM=1", points);
    engine.auto_assign(&project, &scheme, None, None).unwrap();

    let planner = ModuleAddressPlanner::new(
        &AllocatorConfig::legacy(),
        TranslatorConfig::default(),
        RuleTable::standard(),
    );
    let plan = engine.plan_addresses(&project, &scheme, planner).unwrap();

    assert_eq!(plan.points.len(), 2);
    assert_eq!(plan.points[0].channel_id.to_string(), "AI-01");
    assert_eq!(plan.points[0].entry_count(), 11);
    assert_eq!(plan.points[0].primary.internal, "%MD320");
    // AI auxiliaries took %MX20.0..20.4
    assert_eq!(plan.points[1].channel_id.to_string(), "DI-01");
    assert_eq!(plan.points[1].entry_count(), 1);
    assert_eq!(plan.points[1].primary.internal, "%MX20.5");
    assert_eq!(plan.points[1].primary.external, "3166");

    assert_eq!(plan.skipped.len(), 1);
    assert_eq!(plan.skipped[0].point_id, "c1");
    assert_eq!(plan.next_state.next_real_offset, 344);
}

#[test]
fn json_store_round_trip_through_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chanmap.json");

    let (project, scheme) = {
        let engine = AssignmentEngine::new(JsonFileStore::new(&path), catalog("AI=4"));
        let project = engine.create_project("Unit 1", "").unwrap();
        engine
            .import_points(&project, vec![ai("a1", "PT-1")])
            .unwrap();
        let scheme = engine.create_scheme(&project, "Main", "").unwrap();
        engine.assign(&project, &scheme, "a1", "AI-02").unwrap();
        (project, scheme)
    };

    let engine = AssignmentEngine::new(JsonFileStore::new(&path), catalog("AI=4"));
    let used = engine.get_used_channels(&project, &scheme).unwrap();
    assert_eq!(used[0].to_string(), "AI-02");
    assert_eq!(engine.list_projects().unwrap()[0].scheme_count, 1);
}
