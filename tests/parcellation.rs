#![allow(clippy::unwrap_used)]

use parcellate::error::DefinitionError;
use parcellate::labeling::Label;
use parcellate::{
    grid, triangulate_planar, Catalogue, ConflictPolicy, ElementKind, EngineBuilder, EngineConfig,
    Landmark, LoopInterior, ParcellationError, Point3, RegionRule, RuleSet, SideRequirement,
    SurfaceMesh, Vector3,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn p(x: f64, y: f64) -> Point3 {
    Point3::new(x, y, 0.0)
}

fn mesh() -> SurfaceMesh {
    grid(11, 11, 1.0).unwrap()
}

fn quadrant_landmarks() -> Vec<Landmark> {
    vec![
        Landmark::plane("X", p(4.5, 0.0), Vector3::x()),
        Landmark::plane("Y", p(0.0, 4.5), Vector3::y()),
    ]
}

fn quadrant_rules() -> RuleSet {
    use SideRequirement::{Negative, Positive};
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("SW").with("X", Negative).with("Y", Negative));
    rules.push(RegionRule::new("SE").with("X", Positive).with("Y", Negative));
    rules.push(RegionRule::new("NW").with("X", Negative).with("Y", Positive));
    rules.push(RegionRule::new("NE").with("X", Positive).with("Y", Positive));
    rules
}

fn expected_quadrant(position: &Point3) -> &'static str {
    match (position.x > 4.5, position.y > 4.5) {
        (false, false) => "SW",
        (true, false) => "SE",
        (false, true) => "NW",
        (true, true) => "NE",
    }
}

fn square_loop() -> Landmark {
    Landmark::closed_curve("Loop", vec![p(2.0, 2.0), p(8.0, 2.0), p(8.0, 8.0), p(2.0, 8.0)])
}

#[test]
fn four_quadrants_on_vertices() {
    init_tracing();
    let mesh = mesh();
    let result = EngineBuilder::new(&mesh)
        .build(&quadrant_landmarks(), &quadrant_rules())
        .unwrap()
        .run();

    let report = result.report();
    assert!(report.is_clean());
    assert_eq!(report.labeled, 121);
    assert_eq!(result.labels().region_counts(), vec![25, 30, 30, 36]);
    for (v, position) in mesh.positions().iter().enumerate() {
        assert_eq!(result.labels().region_of(v), Some(expected_quadrant(position)));
    }
}

#[test]
fn four_quadrants_on_faces() {
    init_tracing();
    let mesh = mesh();
    let config = EngineConfig::default().with_element_kind(ElementKind::Face);
    let result = EngineBuilder::new(&mesh)
        .with_config(config)
        .build(&quadrant_landmarks(), &quadrant_rules())
        .unwrap()
        .run();

    assert!(result.report().is_clean());
    assert_eq!(result.labels().len(), mesh.face_count());
    for f in 0..mesh.face_count() {
        let centroid = mesh.face_centroid(f);
        assert_eq!(result.labels().region_of(f), Some(expected_quadrant(&centroid)));
    }
}

#[test]
fn side_table_is_total() {
    let mesh = mesh();
    let mut landmarks = quadrant_landmarks();
    landmarks.push(Landmark::open_curve("Sulcus", vec![p(0.0, 5.0), p(10.0, 5.0)]));
    landmarks.push(square_loop());
    let mut rules = quadrant_rules();
    rules.push(
        RegionRule::new("Band")
            .with("Sulcus", SideRequirement::Positive)
            .with("Loop", SideRequirement::Inside),
    );

    for kind in [ElementKind::Vertex, ElementKind::Face] {
        let engine = EngineBuilder::new(&mesh)
            .with_config(EngineConfig::default().with_element_kind(kind))
            .build(&landmarks, &rules)
            .unwrap();
        let table = engine.side_table();
        assert_eq!(table.divider_count(), 4);
        for (id, _) in engine.registry().iter() {
            let column = table.column(id).unwrap();
            assert_eq!(column.len(), mesh.element_count(kind));
        }
    }
}

#[test]
fn evaluation_is_deterministic() {
    let mesh = mesh();
    let mut landmarks = quadrant_landmarks();
    landmarks.push(square_loop());
    let mut rules = quadrant_rules();
    rules.push(RegionRule::new("Core").with("Loop", SideRequirement::Inside));

    let engine = EngineBuilder::new(&mesh).build(&landmarks, &rules).unwrap();
    let first = engine.candidates();
    assert_eq!(first, engine.candidates());
    assert_eq!(engine.run(), engine.run());

    let sequential = EngineBuilder::new(&mesh)
        .with_config(EngineConfig::default().with_parallel(false))
        .build(&landmarks, &rules)
        .unwrap();
    assert_eq!(first, sequential.candidates());
    assert_eq!(engine.run(), sequential.run());
}

#[test]
fn undefined_divider_fails_construction() {
    init_tracing();
    let mesh = mesh();
    let mut rules = quadrant_rules();
    rules.push(RegionRule::new("F2").with("PlaneA", SideRequirement::Positive));

    let err = EngineBuilder::new(&mesh)
        .build(&quadrant_landmarks(), &rules)
        .unwrap_err();
    let ParcellationError::Definition(errors) = &err else {
        panic!("expected a definition error, got {err}");
    };
    assert_eq!(
        errors.errors(),
        &[DefinitionError::UndefinedDivider {
            rule: "F2".into(),
            divider: "PlaneA".into(),
        }]
    );
    let message = err.to_string();
    assert!(message.contains("F2") && message.contains("PlaneA"));
}

#[test]
fn closed_curve_inside_rule() {
    let mesh = mesh();
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("Core").with("Loop", SideRequirement::Inside));
    rules.push(RegionRule::new("Rest").with("Loop", SideRequirement::Outside));

    let result = EngineBuilder::new(&mesh).build(&[square_loop()], &rules).unwrap().run();
    assert!(result.report().is_clean());

    for (v, position) in mesh.positions().iter().enumerate() {
        let strictly_inside =
            (3.0..=7.0).contains(&position.x) && (3.0..=7.0).contains(&position.y);
        let strictly_outside =
            !(2.0..=8.0).contains(&position.x) || !(2.0..=8.0).contains(&position.y);
        if strictly_inside {
            assert_eq!(result.labels().region_of(v), Some("Core"), "vertex {v}");
        }
        if strictly_outside {
            assert_eq!(result.labels().region_of(v), Some("Rest"), "vertex {v}");
        }
    }
    // The loop itself snaps inside.
    assert_eq!(result.labels().elements_of("Core").len(), 49);
}

#[test]
fn loop_interior_policy_can_follow_travel_direction() {
    let mesh = mesh();
    let clockwise = Landmark::closed_curve(
        "Loop",
        vec![p(2.0, 8.0), p(8.0, 8.0), p(8.0, 2.0), p(2.0, 2.0)],
    );
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("Core").with("Loop", SideRequirement::Inside));

    let config = EngineConfig::default().with_loop_interior(LoopInterior::LeftOfTravel);
    let result = EngineBuilder::new(&mesh)
        .with_config(config)
        .build(&[clockwise], &rules)
        .unwrap()
        .run();
    assert_eq!(result.labels().region_of(0), Some("Core"));
    assert_eq!(result.labels().region_of(5 * 11 + 5), None);
}

#[test]
fn star_shaped_loop_keeps_its_center() {
    init_tracing();
    let mesh = mesh();
    let star = Landmark::closed_curve(
        "Star",
        vec![
            p(6.0, 5.0),
            p(7.0, 6.0),
            p(6.0, 6.0),
            p(6.0, 7.0),
            p(5.0, 6.0),
            p(4.0, 6.0),
            p(4.0, 5.0),
            p(3.0, 4.0),
            p(4.0, 4.0),
            p(4.0, 3.0),
            p(5.0, 4.0),
            p(6.0, 4.0),
        ],
    );
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("Core").with("Star", SideRequirement::Inside));
    rules.push(RegionRule::new("Rest").with("Star", SideRequirement::Outside));

    let result = EngineBuilder::new(&mesh)
        .build(std::slice::from_ref(&star), &rules)
        .unwrap()
        .run();
    assert!(result.report().is_clean());
    assert_eq!(result.labels().region_of(5 * 11 + 5), Some("Core"));
    assert_eq!(result.labels().region_of(0), Some("Rest"));
    assert_eq!(result.labels().elements_of("Core").len(), 13);

    let config = EngineConfig::default().with_element_kind(ElementKind::Face);
    let faces = EngineBuilder::new(&mesh)
        .with_config(config)
        .build(&[star], &rules)
        .unwrap()
        .run();
    // Cell (5, 5) meets the loop along a chord, never along a loop edge.
    assert_eq!(faces.labels().region_of(2 * (5 * 10 + 5)), Some("Core"));
    assert_eq!(faces.labels().region_of(2 * (5 * 10 + 5) + 1), Some("Core"));
}

#[test]
fn overlapping_rules_are_reported() {
    init_tracing();
    let mesh = mesh();
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("East").with("X", SideRequirement::Positive));
    rules.push(RegionRule::new("North").with("Y", SideRequirement::Positive));

    let engine = EngineBuilder::new(&mesh).build(&quadrant_landmarks(), &rules).unwrap();
    let result = engine.run();
    let report = result.report();

    assert_eq!(report.conflict_count(), 36);
    assert_eq!(report.gap_count(), 25);
    for conflict in &report.conflicts {
        assert_eq!(conflict.regions, ["East", "North"]);
        assert_eq!(conflict.resolved_as, None);
        assert_eq!(result.labels().get(conflict.element), Some(Label::Conflicted));
        let position = mesh.position(u32::try_from(conflict.element).unwrap());
        assert!(position.x > 4.5 && position.y > 4.5);
    }
    for gap in &report.gaps {
        assert!(gap.position[0] < 4.5 && gap.position[1] < 4.5);
        assert_eq!(result.labels().get(gap.element), Some(Label::Unlabeled));
    }
    assert!(result.ensure_resolved().is_err());
}

#[test]
fn first_defined_wins_is_opt_in() {
    let mesh = mesh();
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("East").with("X", SideRequirement::Positive));
    rules.push(RegionRule::new("North").with("Y", SideRequirement::Positive));

    let config = EngineConfig::default().with_conflict_policy(ConflictPolicy::FirstDefinedWins);
    let result = EngineBuilder::new(&mesh)
        .with_config(config)
        .build(&quadrant_landmarks(), &rules)
        .unwrap()
        .run();

    assert_eq!(result.report().conflict_count(), 36);
    assert!(result
        .report()
        .conflicts
        .iter()
        .all(|c| c.resolved_as.as_deref() == Some("East")));
    assert_eq!(result.labels().conflicted_count(), 0);
    assert_eq!(result.labels().elements_of("East").len(), 66);
    assert!(result.ensure_resolved().is_ok());
}

#[test]
fn open_curve_splits_the_grid() {
    let mesh = mesh();
    let landmarks = vec![Landmark::open_curve("Sulcus", vec![p(0.0, 5.0), p(10.0, 5.0)])];
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("Above").with("Sulcus", SideRequirement::Positive));
    rules.push(RegionRule::new("Below").with("Sulcus", SideRequirement::Negative));

    let result = EngineBuilder::new(&mesh).build(&landmarks, &rules).unwrap().run();
    assert!(result.report().is_clean());
    // The traced row snaps to the positive side.
    assert_eq!(result.labels().region_counts(), vec![66, 55]);
}

#[test]
fn conflicting_duplicate_landmarks_fail() {
    let mesh = mesh();
    let mut landmarks = quadrant_landmarks();
    landmarks.push(Landmark::plane("X", p(2.5, 0.0), Vector3::x()));

    let err = EngineBuilder::new(&mesh)
        .build(&landmarks, &quadrant_rules())
        .unwrap_err();
    let ParcellationError::Definition(errors) = err else {
        panic!("expected a definition error");
    };
    assert_eq!(errors.by_divider()[0].0, "X");
    assert!(matches!(errors.errors()[0], DefinitionError::DuplicateDivider { .. }));
}

#[test]
fn degenerate_loop_fails_construction() {
    let mesh = mesh();
    let bow = Landmark::closed_curve(
        "Bow",
        vec![p(2.0, 5.0), p(8.0, 5.0), p(5.0, 8.0), p(5.0, 2.0)],
    );
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("In").with("Bow", SideRequirement::Inside));

    let err = EngineBuilder::new(&mesh).build(&[bow], &rules).unwrap_err();
    assert!(matches!(
        err,
        ParcellationError::Definition(ref e)
            if matches!(e.errors()[0], DefinitionError::DegenerateCurve { .. })
    ));
}

#[test]
fn catalogue_with_seeded_implicit_sides() {
    init_tracing();
    let text = "
        # quadrants
        _Planes = [X, Y]
        SW = X & Y
        SE = X & Y
        NW = X:negative & Y
        NE = X:lateral & Y:anterior
    ";
    let mut catalogue = Catalogue::parse(text).unwrap();
    assert!(catalogue.attach_seeds("SW", [p(1.0, 1.0), p(3.0, 2.0)]));
    assert!(catalogue.attach_seeds("SE", [p(8.0, 1.0)]));
    assert!(catalogue.attach_seeds("NW", [p(2.0, 9.0)]));

    let mesh = mesh();
    let result = EngineBuilder::new(&mesh)
        .from_catalogue(&quadrant_landmarks(), &catalogue)
        .unwrap()
        .run();

    assert!(result.report().is_clean());
    for (v, position) in mesh.positions().iter().enumerate() {
        assert_eq!(result.labels().region_of(v), Some(expected_quadrant(position)));
    }
}

#[test]
fn catalogue_landmark_kinds_are_checked() {
    let source = "_Curves = [X]\n_Planes = [Y, Z]\nA = X:positive & Y:positive";
    let catalogue = Catalogue::parse(source).unwrap();
    let mesh = mesh();
    let err = EngineBuilder::new(&mesh)
        .from_catalogue(&quadrant_landmarks(), &catalogue)
        .unwrap_err();
    let ParcellationError::Definition(errors) = err else {
        panic!("expected a definition error");
    };
    let names: Vec<_> = errors.by_divider().into_iter().map(|(d, _)| d).collect();
    assert_eq!(names, ["X", "Z"]);
}

#[test]
fn works_on_a_triangulated_patch() {
    let points: Vec<Point3> = (0..8)
        .flat_map(|j| {
            (0..8).map(move |i| {
                p(
                    f64::from(i) + 0.1 * f64::from(j % 3),
                    f64::from(j) + 0.07 * f64::from(i % 2),
                )
            })
        })
        .collect();
    let mesh = triangulate_planar(&points).unwrap();
    let landmarks = vec![Landmark::plane("Mid", p(3.55, 0.0), Vector3::x())];
    let mut rules = RuleSet::new();
    rules.push(RegionRule::new("West").with("Mid", SideRequirement::Negative));
    rules.push(RegionRule::new("East").with("Mid", SideRequirement::Positive));

    let result = EngineBuilder::new(&mesh).build(&landmarks, &rules).unwrap().run();
    assert!(result.report().is_clean());
    for (v, position) in mesh.positions().iter().enumerate() {
        let expected = if position.x > 3.55 { "East" } else { "West" };
        assert_eq!(result.labels().region_of(v), Some(expected));
    }
}

#[test]
fn report_and_labels_export() {
    let mesh = mesh();
    let mut landmarks = quadrant_landmarks();
    landmarks.push(square_loop());
    let result = EngineBuilder::new(&mesh)
        .build(&landmarks, &quadrant_rules())
        .unwrap()
        .run();

    let array = result.labels().to_label_array();
    assert_eq!(array.len(), 121);
    assert_eq!(array[0], 1);
    assert_eq!(array[120], 4);

    let json: serde_json::Value =
        serde_json::from_str(&result.report().to_json().unwrap()).unwrap();
    assert_eq!(json["element_count"], 121);
    assert_eq!(json["unused_dividers"][0], "Loop");
    assert_eq!(json["region_counts"][3]["region"], "NE");
    assert_eq!(json["region_counts"][3]["count"], 36);
    assert_eq!(json["policy"], "report");
}
