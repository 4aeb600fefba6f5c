use df_results::*;
use std::path::Path;

fn scalar_file(internal_field: &str) -> String {
    format!(
        "FoamFile\n{{\n    version     2.0;\n    format      ascii;\n    class       volScalarField;\n}}\n\ndimensions      [0 0 0 1 0 0 0];\n\ninternalField   {internal_field}\n\nboundaryField\n{{\n    front {{ type empty; }}\n}}\n"
    )
}

fn write_field(dir: &Path, name: &str, internal_field: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), scalar_file(internal_field)).unwrap();
}

#[test]
fn latest_time_is_numeric_not_lexical() {
    let case = tempfile::tempdir().unwrap();
    for name in ["0", "2e-05", "0.0001", "constant", "system"] {
        std::fs::create_dir_all(case.path().join(name)).unwrap();
    }
    std::fs::write(case.path().join("9"), "not a directory").unwrap();

    let times: Vec<f64> = time_dirs(case.path())
        .unwrap()
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    assert_eq!(times, vec![0.0, 2e-5, 1e-4]);
    assert!(latest_time_dir(case.path()).unwrap().ends_with("0.0001"));
}

#[test]
fn case_without_time_directories() {
    let case = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(case.path().join("system")).unwrap();
    assert!(matches!(
        latest_time_dir(case.path()),
        Err(ResultsError::NoTimeDirectory { .. })
    ));
}

#[test]
fn reads_requested_fields_in_order() {
    let case = tempfile::tempdir().unwrap();
    let snapshot = case.path().join("0.0003");
    write_field(&snapshot, "T", "nonuniform List<scalar> \n3\n(\n600\n1800\n2400\n)\n;");
    write_field(&snapshot, "Cx", "nonuniform List<scalar> 3(0.001 0.002 0.003);");
    write_field(&snapshot, "p", "uniform 101325;");

    let names = vec!["Cx".to_string(), "T".to_string(), "p".to_string()];
    let table = read_scalar_series(&snapshot, &names).unwrap();
    assert_eq!(table.time.as_deref(), Some("0.0003"));
    assert_eq!(table.field_names(), vec!["Cx", "T", "p"]);
    assert_eq!(table.rows()[1], vec![Some(0.002), Some(1800.0), Some(101325.0)]);

    let csv_path = case.path().join("out").join("fields.csv");
    table.write_csv(&csv_path).unwrap();
    let csv = std::fs::read_to_string(csv_path).unwrap();
    assert_eq!(csv.lines().next(), Some("Cx,T,p"));
    assert_eq!(csv.lines().count(), 4);
}

#[test]
fn all_missing_fields_are_reported() {
    let case = tempfile::tempdir().unwrap();
    let snapshot = case.path().join("0");
    write_field(&snapshot, "T", "uniform 600;");

    let names = vec!["T".to_string(), "Cx".to_string(), "Cy".to_string()];
    match read_scalar_series(&snapshot, &names) {
        Err(ResultsError::FieldNotFound { missing, .. }) => {
            assert_eq!(missing, vec!["Cx".to_string(), "Cy".to_string()]);
        }
        other => panic!("expected FieldNotFound, got {other:?}"),
    }
}

#[test]
fn malformed_field_names_the_file() {
    let case = tempfile::tempdir().unwrap();
    let snapshot = case.path().join("0");
    write_field(&snapshot, "T", "nonuniform List<scalar> 2(600 oops);");

    let err = read_scalar_series(&snapshot, &["T".to_string()]).unwrap_err();
    assert!(matches!(err, ResultsError::Parse { .. }));
    assert!(err.to_string().contains("oops"));
}
