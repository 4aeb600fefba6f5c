mod common;

use df_app::{AppError, RegistryService, inject_case_regions, materialize_cases, set_fields_path, setup_ignition_zones};
use df_project::{RegionSpec, ShapeKind};
use df_setfields::UpsertOutcome;

fn ring(id: Option<&str>) -> RegionSpec {
    RegionSpec {
        id: id.map(str::to_string),
        kind: "ring".to_string(),
        p1: Some(vec![0.025, 0.025, 0.0]),
        p2: Some(vec![0.025, 0.025, 0.05]),
        radius: Some(0.002),
    }
}

fn materialized(dir: &std::path::Path) -> df_app::AppConfig {
    let config = common::config(dir);
    common::write_template(&config, "#!/bin/bash\n");
    RegistryService::new(&config).initialize("2D_HIT", 2).unwrap();
    for (_, result) in materialize_cases(&config).unwrap() {
        result.unwrap();
    }
    config
}

#[test]
fn registry_regions_are_synced_into_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    let config = materialized(dir.path());
    let service = RegistryService::new(&config);
    service.add_region("2D_HIT_1", &ring(None)).unwrap();

    let report = inject_case_regions(&config, "2D_HIT_1").unwrap();
    assert_eq!(report.regions[0].outcome, UpsertOutcome::Inserted);

    let dict = std::fs::read_to_string(set_fields_path(&config, "2D_HIT_1")).unwrap();
    assert_eq!(dict.matches("cylinderAnnulusToCell").count(), 1);
    assert!(dict.contains("innerRadius 0.002;"));
    assert!(dict.contains("outerRadius 0.004;"));
    assert!(dict.contains("volScalarFieldValue T"));

    // The other case is untouched.
    let other = std::fs::read_to_string(set_fields_path(&config, "2D_HIT_2")).unwrap();
    assert_eq!(other, common::SET_FIELDS_DICT);

    let again = inject_case_regions(&config, "2D_HIT_1").unwrap();
    assert!(!again.changed());
    assert_eq!(
        std::fs::read_to_string(set_fields_path(&config, "2D_HIT_1")).unwrap(),
        dict
    );
}

#[test]
fn later_region_with_same_id_wins() {
    let dir = tempfile::tempdir().unwrap();
    let config = materialized(dir.path());
    let service = RegistryService::new(&config);

    service.add_region("2D_HIT_1", &ring(Some("spark"))).unwrap();
    let square = RegionSpec {
        kind: "square".to_string(),
        radius: None,
        ..ring(Some("spark"))
    };
    service.add_region("2D_HIT_1", &square).unwrap();
    assert_eq!(service.get_case("2D_HIT_1").unwrap().regions().len(), 2);

    inject_case_regions(&config, "2D_HIT_1").unwrap();
    let dict = std::fs::read_to_string(set_fields_path(&config, "2D_HIT_1")).unwrap();
    assert_eq!(dict.matches("// ignition region: spark").count(), 1);
    assert!(dict.contains("boxToCell"));
    assert!(!dict.contains("cylinderAnnulusToCell"));
}

#[test]
fn preset_zones_are_recorded_and_injected() {
    let dir = tempfile::tempdir().unwrap();
    let config = materialized(dir.path());

    let setup = setup_ignition_zones(
        &config,
        "2D_HIT_2",
        &[ShapeKind::Circle, ShapeKind::Square, ShapeKind::Ring],
    )
    .unwrap();
    assert_eq!(setup.regions.len(), 3);
    assert_eq!(setup.injection.regions.len(), 3);

    let case = RegistryService::new(&config).get_case("2D_HIT_2").unwrap();
    assert_eq!(case.regions(), setup.regions.as_slice());

    let dict = std::fs::read_to_string(set_fields_path(&config, "2D_HIT_2")).unwrap();
    let circle = dict.find("cylinderToCell").unwrap();
    let square = dict.find("boxToCell").unwrap();
    let ring = dict.find("cylinderAnnulusToCell").unwrap();
    assert!(circle < square && square < ring);
}

#[test]
fn unsupported_zone_count_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = materialized(dir.path());
    let before = common::read(&config.registry_path);

    let err = setup_ignition_zones(&config, "2D_HIT_1", &[ShapeKind::Circle]).unwrap_err();
    assert!(matches!(err, AppError::UnsupportedLayout { count: 1 }));
    assert_eq!(common::read(&config.registry_path), before);
}

#[test]
fn unmaterialized_case_is_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    RegistryService::new(&config).initialize("2D_HIT", 1).unwrap();
    let before = common::read(&config.registry_path);

    let err = setup_ignition_zones(&config, "2D_HIT_1", &[ShapeKind::Ring, ShapeKind::Ring])
        .unwrap_err();
    assert!(matches!(err, AppError::CaseDirMissing { .. }));
    assert_eq!(common::read(&config.registry_path), before);
}

#[test]
fn dictionary_without_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let config = materialized(dir.path());
    let path = set_fields_path(&config, "2D_HIT_1");
    std::fs::write(&path, "defaultFieldValues\n(\n);\n").unwrap();
    RegistryService::new(&config)
        .add_region("2D_HIT_1", &ring(None))
        .unwrap();

    let err = inject_case_regions(&config, "2D_HIT_1").unwrap_err();
    assert!(matches!(err, AppError::AnchorNotFound { .. }));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "defaultFieldValues\n(\n);\n"
    );
}

#[test]
fn zones_are_not_recorded_when_dictionary_rejects_them() {
    let dir = tempfile::tempdir().unwrap();
    let config = materialized(dir.path());
    let path = set_fields_path(&config, "2D_HIT_1");
    std::fs::write(&path, "defaultFieldValues\n(\n);\n").unwrap();
    let before = common::read(&config.registry_path);

    let err = setup_ignition_zones(&config, "2D_HIT_1", &[ShapeKind::Circle, ShapeKind::Ring])
        .unwrap_err();
    assert!(matches!(err, AppError::AnchorNotFound { .. }));
    assert_eq!(common::read(&config.registry_path), before);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "defaultFieldValues\n(\n);\n"
    );
}

#[test]
fn zones_are_not_recorded_over_an_unterminated_block() {
    let dir = tempfile::tempdir().unwrap();
    let config = materialized(dir.path());
    let path = set_fields_path(&config, "2D_HIT_2");
    let broken = common::SET_FIELDS_DICT.replace(
        "regions\n(\n",
        "regions\n(\n    // ignition region: spark\n    boxToCell\n",
    );
    std::fs::write(&path, &broken).unwrap();
    let before = common::read(&config.registry_path);

    let err = setup_ignition_zones(&config, "2D_HIT_2", &[ShapeKind::Square, ShapeKind::Square])
        .unwrap_err();
    assert!(matches!(err, AppError::CorruptedBlock { .. }));
    assert_eq!(common::read(&config.registry_path), before);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
}
