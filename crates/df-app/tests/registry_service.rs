mod common;

use df_app::{AppError, ErrorKind, RegistryService};
use df_project::RegionSpec;

fn circle(x: f64) -> RegionSpec {
    RegionSpec {
        kind: "circle".to_string(),
        p1: Some(vec![x, 0.025, 0.0]),
        p2: Some(vec![x, 0.025, 0.05]),
        radius: Some(0.001),
        ..RegionSpec::default()
    }
}

#[test]
fn initialize_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let service = RegistryService::new(&config);

    let created = service.initialize("2D_HIT", 3).unwrap();
    assert_eq!(created.case_names(), vec!["2D_HIT_1", "2D_HIT_2", "2D_HIT_3"]);
    assert_eq!(service.get().unwrap(), created);
    assert!(!config.lock_path().exists());

    let raw: serde_json::Value =
        serde_json::from_slice(&common::read(&config.registry_path)).unwrap();
    assert_eq!(raw["run_cases"]["2D_HIT_2"]["case_type"], "2D_HIT");
    assert_eq!(
        raw["run_cases"]["2D_HIT_1"]["case_config"]["controlDict"]["endTime"],
        3e-4
    );
}

#[test]
fn case_type_phrases_are_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let registry = RegistryService::new(&config).initialize("hit", 1).unwrap();
    assert_eq!(registry.case_names(), vec!["2D_HIT_1"]);
}

#[test]
fn second_initialize_is_rejected_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let service = RegistryService::new(&config);

    service.initialize("2D_HIT", 2).unwrap();
    let before = common::read(&config.registry_path);

    let err = service.initialize("2D_HIT", 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(common::read(&config.registry_path), before);
}

#[test]
fn rejected_initializations_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let service = RegistryService::new(&config);

    let err = service.initialize("3D_jet", 2).unwrap_err();
    assert!(matches!(err, AppError::UnsupportedCaseType { ref case_type } if case_type == "3D_jet"));
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    for count in [0, -3] {
        let err = service.initialize("2D_HIT", count).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert!(!config.registry_path.exists());
    assert!(!config.registry_path.parent().unwrap().exists());
    assert!(!config.lock_path().exists());
}

#[test]
fn regions_append_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let service = RegistryService::new(&config);
    service.initialize("2D_HIT", 2).unwrap();

    for x in [0.01, 0.02, 0.03] {
        service.add_region("2D_HIT_1", &circle(x)).unwrap();
    }
    // Identical regions are kept as given.
    service.add_region("2D_HIT_1", &circle(0.01)).unwrap();

    let case = service.get_case("2D_HIT_1").unwrap();
    let xs: Vec<f64> = case.regions().iter().map(|r| r.shape.points().0[0]).collect();
    assert_eq!(xs, vec![0.01, 0.02, 0.03, 0.01]);
    assert!(service.get_case("2D_HIT_2").unwrap().regions().is_empty());
}

#[test]
fn failed_additions_leave_registry_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let service = RegistryService::new(&config);
    service.initialize("2D_HIT", 1).unwrap();
    let before = common::read(&config.registry_path);

    let err = service.add_region("2D_HIT_7", &circle(0.01)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let triangle = RegionSpec {
        kind: "triangle".to_string(),
        ..circle(0.01)
    };
    let err = service.add_region("2D_HIT_1", &triangle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    let flat = RegionSpec {
        radius: Some(-1.0),
        ..circle(0.01)
    };
    let err = service.add_region("2D_HIT_1", &flat).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let short = RegionSpec {
        p1: Some(vec![0.0, 0.0]),
        ..circle(0.01)
    };
    assert!(service.add_region("2D_HIT_1", &short).is_err());

    assert_eq!(common::read(&config.registry_path), before);
}

#[test]
fn missing_registry() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let err = RegistryService::new(&config)
        .add_region("2D_HIT_1", &circle(0.01))
        .unwrap_err();
    assert!(matches!(err, AppError::RegistryMissing { .. }));
    assert!(!config.registry_path.exists());
}

#[test]
fn concurrent_additions_on_distinct_cases_are_lossless() {
    const CASES: usize = 6;
    const PER_CASE: usize = 8;

    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let service = RegistryService::new(&config);
    service.initialize("2D_HIT", CASES as i64).unwrap();

    std::thread::scope(|scope| {
        for case in 1..=CASES {
            let service = &service;
            scope.spawn(move || {
                let name = format!("2D_HIT_{case}");
                for i in 0..PER_CASE {
                    service.add_region(&name, &circle(i as f64 * 1e-3)).unwrap();
                }
            });
        }
    });

    let registry = service.get().unwrap();
    for (name, case) in &registry.run_cases {
        assert_eq!(case.regions().len(), PER_CASE, "{name} lost updates");
        let xs: Vec<f64> = case.regions().iter().map(|r| r.shape.points().0[0]).collect();
        let expected: Vec<f64> = (0..PER_CASE).map(|i| i as f64 * 1e-3).collect();
        assert_eq!(xs, expected);
    }
}

#[test]
fn appended_region_lists_are_transaction_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    RegistryService::new(&config).initialize("2D_HIT", 1).unwrap();

    let snapshots: Vec<(f64, Vec<df_project::Region>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let config = &config;
                scope.spawn(move || {
                    let x = i as f64 * 1e-3;
                    let region = circle(x).validate().unwrap();
                    let listed = RegistryService::new(config)
                        .add_regions("2D_HIT_1", vec![region])
                        .unwrap();
                    (x, listed)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let stored = RegistryService::new(&config).get_case("2D_HIT_1").unwrap();
    assert_eq!(stored.regions().len(), 8);
    for (x, listed) in snapshots {
        let last = listed.last().unwrap();
        assert_eq!(last.shape.points().0[0], x);
        assert_eq!(listed.as_slice(), &stored.regions()[..listed.len()]);
    }
}
