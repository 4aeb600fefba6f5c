#![allow(dead_code)]

use df_app::{AppConfig, ConfigFile};
use std::path::Path;

pub const SET_FIELDS_DICT: &str = "FoamFile\n{\n    version     2.0;\n    format      ascii;\n    class       dictionary;\n    object      setFieldsDict;\n}\n\ndefaultFieldValues\n(\n    volScalarFieldValue T 600\n);\n\nregions\n(\n);\n";

pub fn config(root: &Path) -> AppConfig {
    let mut file = ConfigFile::new(["1D_free_flame", "2D_HIT"]);
    file.case_type_aliases
        .insert("HIT".to_string(), "2D_HIT".to_string());
    file.run_timeout_s = 30;
    AppConfig::with_root(root, file)
}

/// A 2D_HIT template with a set-fields dictionary and the given entry script.
pub fn write_template(config: &AppConfig, allrun: &str) {
    let template = config.templates_dir.join("2D_HIT");
    for dir in ["system", "constant", "0"] {
        std::fs::create_dir_all(template.join(dir)).unwrap();
    }
    std::fs::write(template.join("system").join("setFieldsDict"), SET_FIELDS_DICT).unwrap();
    std::fs::write(template.join("system").join("controlDict"), "endTime 0.0003;\n").unwrap();
    std::fs::write(template.join("0").join("T"), "internalField uniform 600;\n").unwrap();
    std::fs::write(template.join("Allrun"), allrun).unwrap();
}

pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}
