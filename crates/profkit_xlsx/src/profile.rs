//! Profile document model and tool dispatch.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::conf::C_TOOL_UNKNOWN;
use crate::spec::ProfileError;

/// Tool that emitted a profile document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumProfileTool {
    /// `lcov`: segmented timing collector.
    SegmentedTiming,
    /// `geninfo`: per-directory generator.
    PerDirectoryGeneration,
    /// `genhtml`: HTML report generator.
    HtmlReportGeneration,
    /// Any other (or missing) tag.
    Unknown(String),
}

impl EnumProfileTool {
    /// Resolve a `config.tool` tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "lcov" => Self::SegmentedTiming,
            "geninfo" => Self::PerDirectoryGeneration,
            "genhtml" => Self::HtmlReportGeneration,
            _ => Self::Unknown(tag.to_string()),
        }
    }

    /// Tag as written in `config.tool`.
    pub fn tag(&self) -> &str {
        match self {
            Self::SegmentedTiming => "lcov",
            Self::PerDirectoryGeneration => "geninfo",
            Self::HtmlReportGeneration => "genhtml",
            Self::Unknown(tag) => tag,
        }
    }

    /// Top-level keys the tool layout cannot do without.
    ///
    /// Each inner slice is a set of alternatives; one of them must be present.
    pub fn required_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Self::SegmentedTiming => &[],
            Self::PerDirectoryGeneration => &[&["gen_info"]],
            Self::HtmlReportGeneration => &[&["file"], &["directory", "dir"]],
            Self::Unknown(_) => &[],
        }
    }
}

/// Parsed JSON object of one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDocument {
    root: Map<String, Value>,
}

impl ProfileDocument {
    /// Read and parse `path`.
    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        let c_text = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&c_text).map_err(|source| ProfileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(value).ok_or_else(|| ProfileError::NotAnObject {
            path: path.to_path_buf(),
        })
    }

    /// Wrap an already parsed value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    /// Top-level object.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Top-level value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Whether a top-level key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Top-level mapping by key.
    pub fn mapping(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// `config` mapping.
    pub fn config(&self) -> Option<&Map<String, Value>> {
        self.mapping("config")
    }

    /// `config.tool` tag, if it is a string.
    pub fn tool_tag(&self) -> Option<&str> {
        self.config()?.get("tool")?.as_str()
    }

    /// Tool variant; [`EnumProfileTool::Unknown`] with tag `unknown` when absent.
    pub fn tool(&self) -> EnumProfileTool {
        EnumProfileTool::from_tag(self.tool_tag().unwrap_or(C_TOOL_UNKNOWN))
    }

    /// `config.segments` as a raw value.
    pub fn segments(&self) -> Option<&Value> {
        self.config()?.get("segments")
    }

    /// Segment block `idx` (stored under its decimal key).
    pub fn segment(&self, idx: u64) -> Option<&Map<String, Value>> {
        self.mapping(&idx.to_string())
    }

    /// First missing required-key group of `tool`, joined with `|`.
    pub fn missing_required_key(&self, tool: &EnumProfileTool) -> Option<String> {
        tool.required_keys()
            .iter()
            .find(|l_alternatives| !l_alternatives.iter().any(|key| self.mapping(key).is_some()))
            .map(|l_alternatives| l_alternatives.join("|"))
    }

    /// First present mapping among `keys`.
    pub fn first_mapping(&self, keys: &[&str]) -> Option<&Map<String, Value>> {
        keys.iter().find_map(|key| self.mapping(key))
    }
}

/// Numeric view of a JSON value: numbers and numeric strings.
pub fn lookup_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(val) => val.as_f64(),
        Value::String(val) => val.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Short text of a JSON value for diagnostics.
pub fn describe_value(value: Option<&Value>) -> String {
    match value {
        None => "??".to_string(),
        Some(Value::String(val)) => val.clone(),
        Some(val) => val.to_string(),
    }
}

/// Mapping nested under `keys`, e.g. `["data", "src"]` for `doc.data.src`.
pub fn lookup_path<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    let (c_head, l_rest) = keys.split_first()?;
    let value = map.get(*c_head)?;
    if l_rest.is_empty() {
        return Some(value);
    }
    lookup_path(value.as_object()?, l_rest)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tool_defaults_to_unknown() {
        let doc = ProfileDocument::from_value(json!({"total": 1.0})).unwrap();
        assert_eq!(doc.tool(), EnumProfileTool::Unknown("unknown".to_string()));
        assert_eq!(doc.tool().tag(), "unknown");

        let doc = ProfileDocument::from_value(json!({"config": {"tool": "genhtml"}})).unwrap();
        assert_eq!(doc.tool(), EnumProfileTool::HtmlReportGeneration);
    }

    #[test]
    fn from_value_rejects_non_object() {
        assert!(ProfileDocument::from_value(json!([1, 2])).is_none());
    }

    #[test]
    fn lookup_f64_accepts_numeric_strings_only() {
        assert_eq!(lookup_f64(&json!(1.5)), Some(1.5));
        assert_eq!(lookup_f64(&json!(" 2.25 ")), Some(2.25));
        assert_eq!(lookup_f64(&json!("bogus")), None);
        assert_eq!(lookup_f64(&json!("nan")), None);
        assert_eq!(lookup_f64(&json!({"a": 1})), None);
    }

    #[test]
    fn missing_required_key_accepts_alias() {
        let tool = EnumProfileTool::HtmlReportGeneration;
        let doc = ProfileDocument::from_value(json!({"file": {}, "dir": {}})).unwrap();
        assert_eq!(doc.missing_required_key(&tool), None);

        let doc = ProfileDocument::from_value(json!({"file": {}})).unwrap();
        assert_eq!(
            doc.missing_required_key(&tool),
            Some("directory|dir".to_string())
        );
    }

    #[test]
    fn lookup_path_walks_nested_mappings() {
        let value = json!({"exec": {"src": {"src/a.c": 0.5}}});
        let map = value.as_object().unwrap();
        assert_eq!(
            lookup_path(map, &["exec", "src", "src/a.c"]),
            Some(&json!(0.5))
        );
        assert_eq!(lookup_path(map, &["exec", "lib", "src/a.c"]), None);
    }
}
