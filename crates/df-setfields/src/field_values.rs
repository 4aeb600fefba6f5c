//! Field values imposed inside every ignition zone.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub field: String,
    pub value: f64,
}

impl FieldValue {
    pub fn new(field: impl Into<String>, value: f64) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// Ordered `volScalarFieldValue` entries written into each region block.
///
/// The default is the burnt state of a stoichiometric H2/air mixture:
/// temperature in K followed by species mass fractions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FieldValueTable(Vec<FieldValue>);

impl FieldValueTable {
    pub fn new(entries: Vec<FieldValue>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[FieldValue] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.iter().find(|e| e.field == field).map(|e| e.value)
    }

    /// Override one entry, appending it when absent.
    pub fn set(&mut self, field: &str, value: f64) {
        match self.0.iter_mut().find(|e| e.field == field) {
            Some(entry) => entry.value = value,
            None => self.0.push(FieldValue::new(field, value)),
        }
    }

    pub(crate) fn render_into(&self, out: &mut Vec<String>, indent: &str) {
        out.push(format!("{indent}fieldValues"));
        out.push(format!("{indent}("));
        for entry in &self.0 {
            out.push(format!(
                "{indent}    volScalarFieldValue {:<6} {}",
                entry.field, entry.value
            ));
        }
        out.push(format!("{indent});"));
    }
}

impl Default for FieldValueTable {
    fn default() -> Self {
        Self(vec![
            FieldValue::new("T", 2562.9164474426),
            FieldValue::new("H", 0.0001388161),
            FieldValue::new("H2", 0.0017201967),
            FieldValue::new("O", 0.0007829835),
            FieldValue::new("OH", 0.0088649505),
            FieldValue::new("H2O", 0.2335677169),
            FieldValue::new("O2", 0.0097972807),
            FieldValue::new("HO2", 0.0000040007),
            FieldValue::new("H2O2", 0.0000004494),
            FieldValue::new("N2", 0.7451236055),
        ])
    }
}
