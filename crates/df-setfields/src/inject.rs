//! Splicing region blocks into an existing `setFieldsDict`.

use crate::field_values::FieldValueTable;
use crate::render::{BLOCK_BEGIN, begin_marker, end_marker, render_region};
use crate::{SetFieldsError, SetFieldsResult};
use df_project::{Region, RegionSpec};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No block carried this id; a new one was added after the list opener.
    Inserted,
    /// An existing block with this id was rewritten.
    Replaced,
    /// The existing block already matched.
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct InjectReport {
    pub path: PathBuf,
    pub regions: Vec<RegionOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionOutcome {
    pub id: String,
    pub outcome: UpsertOutcome,
}

impl InjectReport {
    pub fn changed(&self) -> bool {
        self.regions
            .iter()
            .any(|r| r.outcome != UpsertOutcome::Unchanged)
    }
}

/// Why a block could not be placed in a dictionary text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    AnchorNotFound,
    Unterminated { id: String },
}

impl BlockError {
    fn at(self, path: &Path) -> SetFieldsError {
        match self {
            BlockError::AnchorNotFound => SetFieldsError::AnchorNotFound {
                path: path.to_path_buf(),
            },
            BlockError::Unterminated { id } => SetFieldsError::UnterminatedBlock {
                id,
                path: path.to_path_buf(),
            },
        }
    }
}

fn first_token(line: &str) -> Option<&str> {
    line.split(|c: char| c.is_whitespace() || c == '(')
        .find(|t| !t.is_empty())
}

fn paren_depth(text: &str) -> i64 {
    text.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Index of the line that opens the `regions` list.
///
/// The opener is either the `regions` keyword line itself (`regions (`) or the
/// first non-blank line after it, which must start with `(`.
fn list_opener(lines: &[String]) -> Option<usize> {
    let keyword = lines.iter().position(|l| first_token(l) == Some("regions"))?;
    let rest = lines[keyword]
        .trim_start()
        .trim_start_matches("regions")
        .trim_start();
    if rest.starts_with('(') {
        return (paren_depth(rest) > 0).then_some(keyword);
    }
    if !rest.is_empty() && !rest.starts_with("//") {
        return None;
    }

    let next = (keyword + 1..lines.len()).find(|&i| !lines[i].trim().is_empty())?;
    let opener = lines[next].trim_start();
    (opener.starts_with('(') && paren_depth(opener) > 0).then_some(next)
}

fn find_line(lines: &[String], from: usize, wanted: &str) -> Option<usize> {
    (from..lines.len()).find(|&i| lines[i].trim() == wanted)
}

/// Replace the block marked with `region_id`, or insert `block` after the list
/// opener and any managed blocks that directly follow it.
///
/// Every line outside the touched block is kept byte-for-byte.
pub fn upsert_block(
    content: &str,
    region_id: &str,
    block: &[String],
) -> Result<(String, UpsertOutcome), BlockError> {
    let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    let rendered: Vec<String> = block.iter().map(|l| format!("{l}\n")).collect();

    if let Some(start) = find_line(&lines, 0, &begin_marker(region_id)) {
        let end = find_line(&lines, start + 1, &end_marker(region_id)).ok_or_else(|| {
            BlockError::Unterminated {
                id: region_id.to_string(),
            }
        })?;
        if lines[start..=end] == rendered[..] {
            return Ok((content.to_string(), UpsertOutcome::Unchanged));
        }
        lines.splice(start..=end, rendered);
        return Ok((lines.concat(), UpsertOutcome::Replaced));
    }

    let opener = list_opener(&lines).ok_or(BlockError::AnchorNotFound)?;
    let mut insert_at = opener + 1;
    let mut cursor = insert_at;
    loop {
        while cursor < lines.len() && lines[cursor].trim().is_empty() {
            cursor += 1;
        }
        let Some(other_id) = lines
            .get(cursor)
            .and_then(|l| l.trim().strip_prefix(BLOCK_BEGIN))
            .map(str::to_string)
        else {
            break;
        };
        let end = find_line(&lines, cursor + 1, &end_marker(&other_id))
            .ok_or(BlockError::Unterminated { id: other_id })?;
        cursor = end + 1;
        insert_at = cursor;
    }

    if let Some(prev) = lines.get_mut(insert_at - 1) {
        if !prev.ends_with('\n') {
            prev.push('\n');
        }
    }
    let mut inserted = Vec::with_capacity(rendered.len() + 1);
    inserted.push("\n".to_string());
    inserted.extend(rendered);
    lines.splice(insert_at..insert_at, inserted);
    Ok((lines.concat(), UpsertOutcome::Inserted))
}

/// Dictionary text before and after upserting a set of regions.
struct Splice {
    original: String,
    content: String,
    outcomes: Vec<RegionOutcome>,
}

fn splice_regions(
    path: &Path,
    regions: &[Region],
    field_values: &FieldValueTable,
) -> SetFieldsResult<Splice> {
    if !path.is_file() {
        return Err(SetFieldsError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let original = std::fs::read_to_string(path)?;
    let mut content = original.clone();
    let mut outcomes = Vec::with_capacity(regions.len());

    for region in regions {
        let id = region.stable_id();
        let block = render_region(region, field_values);
        let (next, outcome) = upsert_block(&content, &id, &block).map_err(|e| e.at(path))?;
        debug!(path = %path.display(), region_id = %id, ?outcome, "upserted region block");
        content = next;
        outcomes.push(RegionOutcome { id, outcome });
    }
    Ok(Splice {
        original,
        content,
        outcomes,
    })
}

/// Check that every region can be placed in the dictionary at `path`
/// without writing anything.
pub fn check_regions(
    path: &Path,
    regions: &[Region],
    field_values: &FieldValueTable,
) -> SetFieldsResult<Vec<RegionOutcome>> {
    Ok(splice_regions(path, regions, field_values)?.outcomes)
}

/// Upsert every region into the dictionary at `path`, writing it once.
///
/// Nothing is written if any region cannot be placed.
pub fn inject_regions(
    path: &Path,
    regions: &[Region],
    field_values: &FieldValueTable,
) -> SetFieldsResult<InjectReport> {
    let splice = splice_regions(path, regions, field_values)?;
    if splice.content != splice.original {
        std::fs::write(path, &splice.content)?;
    }

    let report = InjectReport {
        path: path.to_path_buf(),
        regions: splice.outcomes,
    };
    info!(
        path = %path.display(),
        regions = report.regions.len(),
        changed = report.changed(),
        "injected ignition regions"
    );
    Ok(report)
}

pub fn inject_region(
    path: &Path,
    region: &Region,
    field_values: &FieldValueTable,
) -> SetFieldsResult<InjectReport> {
    inject_regions(path, std::slice::from_ref(region), field_values)
}

/// Validate a raw region description, then inject it.
///
/// Validation happens before the dictionary is touched.
pub fn inject_region_spec(
    path: &Path,
    spec: &RegionSpec,
    field_values: &FieldValueTable,
) -> SetFieldsResult<InjectReport> {
    let region = spec.validate()?;
    inject_region(path, &region, field_values)
}
