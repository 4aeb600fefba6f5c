//! Aligned scalar tables read from a solution time directory.

use crate::scalar::{ScalarField, read_scalar_field};
use crate::{ResultsError, ResultsResult};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Scalar fields of one snapshot, in the order they were requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarTable {
    pub time: Option<String>,
    pub fields: IndexMap<String, ScalarField>,
}

impl ScalarTable {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Longest field length; uniform fields count as one row.
    pub fn row_count(&self) -> usize {
        self.fields.values().map(ScalarField::len).max().unwrap_or(0)
    }

    /// Row-major values, one column per field.
    ///
    /// Uniform fields repeat on every row; lists shorter than the longest
    /// field leave `None` past their end.
    pub fn rows(&self) -> Vec<Vec<Option<f64>>> {
        (0..self.row_count())
            .map(|row| self.fields.values().map(|f| f.value_at(row)).collect())
            .collect()
    }

    pub fn column(&self, field: &str) -> Option<Vec<Option<f64>>> {
        let values = self.fields.get(field)?;
        Some((0..self.row_count()).map(|row| values.value_at(row)).collect())
    }

    pub fn to_csv(&self) -> String {
        let mut csv = self.field_names().join(",");
        csv.push('\n');
        for row in self.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
                .collect();
            let _ = writeln!(csv, "{}", cells.join(","));
        }
        csv
    }

    pub fn write_csv(&self, path: &Path) -> ResultsResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }
}

/// Read each named field file in `snapshot_dir`.
///
/// Every missing field is reported in one error rather than stopping at the
/// first.
pub fn read_scalar_series(snapshot_dir: &Path, field_names: &[String]) -> ResultsResult<ScalarTable> {
    let missing: Vec<String> = field_names
        .iter()
        .filter(|name| !snapshot_dir.join(name.as_str()).is_file())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ResultsError::FieldNotFound {
            dir: snapshot_dir.to_path_buf(),
            missing,
        });
    }

    let mut fields = IndexMap::with_capacity(field_names.len());
    for name in field_names {
        let field = read_scalar_field(&snapshot_dir.join(name))?;
        fields.insert(name.clone(), field);
    }

    let time = snapshot_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string());
    Ok(ScalarTable { time, fields })
}

/// Numeric time directories of a case, sorted by time.
pub fn time_dirs(case_dir: &Path) -> ResultsResult<Vec<(f64, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(case_dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Ok(time) = name.parse::<f64>() {
            if time.is_finite() {
                dirs.push((time, entry.path()));
            }
        }
    }
    dirs.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(dirs)
}

/// The latest written solution time of a case.
pub fn latest_time_dir(case_dir: &Path) -> ResultsResult<PathBuf> {
    time_dirs(case_dir)?
        .pop()
        .map(|(_, path)| path)
        .ok_or_else(|| ResultsError::NoTimeDirectory {
            dir: case_dir.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(fields: Vec<(&str, ScalarField)>) -> ScalarTable {
        ScalarTable {
            time: None,
            fields: fields
                .into_iter()
                .map(|(name, field)| (name.to_string(), field))
                .collect(),
        }
    }

    #[test]
    fn rows_align_lists_and_broadcast_uniform() {
        let t = table(vec![
            ("T", ScalarField::NonUniform(vec![300.0, 400.0, 500.0])),
            ("Cx", ScalarField::NonUniform(vec![0.0, 0.5])),
            ("p", ScalarField::Uniform(101325.0)),
        ]);
        assert_eq!(t.row_count(), 3);
        assert_eq!(
            t.rows()[2],
            vec![Some(500.0), None, Some(101325.0)]
        );
        assert_eq!(t.column("Cx").unwrap(), vec![Some(0.0), Some(0.5), None]);
    }

    #[test]
    fn csv_leaves_blank_cells() {
        let t = table(vec![
            ("T", ScalarField::NonUniform(vec![300.0, 400.0])),
            ("Cx", ScalarField::NonUniform(vec![0.25])),
        ]);
        assert_eq!(t.to_csv(), "T,Cx\n300,0.25\n400,\n");
    }

    #[test]
    fn empty_table_has_header_only() {
        let t = table(vec![]);
        assert_eq!(t.row_count(), 0);
        assert_eq!(t.to_csv(), "\n");
    }
}
