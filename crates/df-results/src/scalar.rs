//! OpenFOAM `volScalarField` files: `internalField` extraction.

use crate::{ResultsError, ResultsResult};
use serde::Serialize;
use std::path::Path;

/// Internal field of a scalar field file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ScalarField {
    Uniform(f64),
    NonUniform(Vec<f64>),
}

impl ScalarField {
    /// Number of cell values; a uniform field counts as one.
    pub fn len(&self) -> usize {
        match self {
            ScalarField::Uniform(_) => 1,
            ScalarField::NonUniform(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at row `index`; uniform fields have the same value at every row.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        match self {
            ScalarField::Uniform(value) => Some(*value),
            ScalarField::NonUniform(values) => values.get(index).copied(),
        }
    }
}

pub fn read_scalar_field(path: &Path) -> ResultsResult<ScalarField> {
    let content = std::fs::read_to_string(path)?;
    parse_scalar_field(&content).map_err(|message| ResultsError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |i| &after[i..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |i| &after[i + 2..]);
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    out
}

fn parse_number(token: &str) -> Result<f64, String> {
    token
        .parse::<f64>()
        .map_err(|_| format!("invalid scalar value '{}'", token))
}

/// Parse the `internalField` entry of a scalar field file.
///
/// Accepts `internalField uniform <v>;` and
/// `internalField nonuniform List<scalar> <n> ( v1 ... vn );` with the list
/// either inline or spread over lines.
pub fn parse_scalar_field(content: &str) -> Result<ScalarField, String> {
    let content = strip_comments(content);
    let start = content
        .split_inclusive('\n')
        .scan(0usize, |offset, line| {
            let at = *offset;
            *offset += line.len();
            Some((at, line))
        })
        .find(|(_, line)| line.split_whitespace().next() == Some("internalField"))
        .map(|(at, line)| at + line.len() - line.trim_start().len() + "internalField".len())
        .ok_or_else(|| "no internalField entry".to_string())?;
    let body = content[start..].trim_start();

    if let Some(rest) = body.strip_prefix("uniform") {
        let value = rest
            .split(';')
            .next()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| "uniform internalField without a value".to_string())?;
        return parse_number(value).map(ScalarField::Uniform);
    }

    let rest = body
        .strip_prefix("nonuniform")
        .ok_or_else(|| "internalField is neither uniform nor nonuniform".to_string())?
        .trim_start();
    let rest = rest
        .strip_prefix("List<scalar>")
        .ok_or_else(|| "only List<scalar> internal fields are supported".to_string())?
        .trim_start();

    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    let expected: usize = rest[..digits]
        .parse()
        .map_err(|_| "missing value count before list".to_string())?;
    let rest = rest[digits..].trim_start();
    let rest = rest
        .strip_prefix('(')
        .ok_or_else(|| "expected '(' after value count".to_string())?;
    let close = rest
        .find(')')
        .ok_or_else(|| "unterminated value list".to_string())?;

    let values = rest[..close]
        .split_whitespace()
        .map(parse_number)
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(format!(
            "list declares {} values but contains {}",
            expected,
            values.len()
        ));
    }
    Ok(ScalarField::NonUniform(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "FoamFile\n{\n    class       volScalarField;\n    object      T;\n}\n// * * //\n\ndimensions      [0 0 0 1 0 0 0];\n\n";

    #[test]
    fn uniform_value() {
        let content = format!("{HEADER}internalField   uniform 600;\n\nboundaryField\n{{\n}}\n");
        assert_eq!(parse_scalar_field(&content), Ok(ScalarField::Uniform(600.0)));
    }

    #[test]
    fn multiline_list() {
        let content = format!(
            "{HEADER}internalField   nonuniform List<scalar> \n3\n(\n300\n1500.5\n2.5e3\n)\n;\n\nboundaryField\n{{\n    left {{ type zeroGradient; }}\n}}\n"
        );
        assert_eq!(
            parse_scalar_field(&content),
            Ok(ScalarField::NonUniform(vec![300.0, 1500.5, 2500.0]))
        );
    }

    #[test]
    fn inline_list() {
        let content = format!("{HEADER}internalField nonuniform List<scalar> 2(0.1 0.2);\n");
        assert_eq!(
            parse_scalar_field(&content),
            Ok(ScalarField::NonUniform(vec![0.1, 0.2]))
        );
    }

    #[test]
    fn count_mismatch_is_an_error() {
        let content = format!("{HEADER}internalField nonuniform List<scalar> 3(1 2);\n");
        assert!(parse_scalar_field(&content).unwrap_err().contains("declares 3"));
    }

    #[test]
    fn commented_out_entry_is_ignored() {
        let content = format!(
            "{HEADER}// internalField uniform 1;\n/* internalField uniform 2; */\ninternalField uniform 3;\n"
        );
        assert_eq!(parse_scalar_field(&content), Ok(ScalarField::Uniform(3.0)));
    }

    #[test]
    fn missing_entry() {
        assert!(parse_scalar_field(HEADER).is_err());
    }

    #[test]
    fn uniform_broadcasts() {
        let field = ScalarField::Uniform(1.0);
        assert_eq!(field.value_at(10), Some(1.0));
        assert_eq!(ScalarField::NonUniform(vec![1.0]).value_at(1), None);
    }
}
