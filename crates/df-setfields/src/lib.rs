//! df-setfields: ignition zone blocks for OpenFOAM `setFieldsDict` files.
//!
//! Rendering is pure ([`render`]); [`inject`] splices rendered blocks into an
//! existing dictionary after its `regions` list opener, keyed by region id so
//! that re-injecting a region replaces its block instead of duplicating it.

pub mod field_values;
pub mod inject;
pub mod presets;
pub mod render;

pub use field_values::{FieldValue, FieldValueTable};
pub use inject::{
    BlockError, InjectReport, RegionOutcome, UpsertOutcome, check_regions, inject_region,
    inject_region_spec, inject_regions, upsert_block,
};
pub use presets::{IgnitionSlot, ignition_layout};
pub use render::{RING_OUTER_RADIUS_RATIO, render_region, render_shape};

use std::path::PathBuf;

pub type SetFieldsResult<T> = Result<T, SetFieldsError>;

#[derive(thiserror::Error, Debug)]
pub enum SetFieldsError {
    #[error("setFieldsDict not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("No 'regions' list found in {path}")]
    AnchorNotFound { path: PathBuf },

    #[error("Block for region '{id}' has no end marker in {path}")]
    UnterminatedBlock { id: String, path: PathBuf },

    #[error("Unsupported region shape: {shape}")]
    UnsupportedShape { shape: String },

    #[error("Invalid region: {0}")]
    InvalidRegion(df_project::ValidationError),

    #[error("No preset ignition layout for {count} zones (supported: 2, 3, 4)")]
    UnsupportedLayout { count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<df_project::ValidationError> for SetFieldsError {
    fn from(err: df_project::ValidationError) -> Self {
        match err {
            df_project::ValidationError::UnsupportedShape { shape } => {
                SetFieldsError::UnsupportedShape { shape }
            }
            other => SetFieldsError::InvalidRegion(other),
        }
    }
}
