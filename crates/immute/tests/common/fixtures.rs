use std::fs;
use std::path::PathBuf;

use immute::{CreateOptions, Node};
use serde::Deserialize;

pub fn node(json: serde_json::Value) -> Node {
    Node::from_json(&json).unwrap_or_else(|e| panic!("fixture is not an object or array: {e}"))
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

#[derive(Debug, Deserialize)]
pub struct OptionProfiles {
    pub profile: Vec<OptionProfile>,
}

#[derive(Debug, Deserialize)]
pub struct OptionProfile {
    pub name: String,
    pub options: CreateOptions,
}

pub fn load_option_profiles() -> OptionProfiles {
    let path = fixtures_dir().join("create_options.toml");
    let text = fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {:?}: {e}", path));
    toml::from_str(&text).unwrap_or_else(|e| panic!("failed to parse {:?}: {e}", path))
}

pub fn profile(name: &str) -> CreateOptions {
    load_option_profiles()
        .profile
        .into_iter()
        .find(|p| p.name == name)
        .map(|p| p.options)
        .unwrap_or_else(|| panic!("no option profile named {name:?}"))
}
