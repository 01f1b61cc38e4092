//! Workbook constants, schema key tables and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters kept from the tail of a derived sheet base name.
pub const N_LEN_SHEET_NAME_BASE_MAX: usize = 30;
/// Candidate names tried before sheet naming gives up.
pub const N_SHEET_NAME_ATTEMPTS_MAX: usize = 1_000;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Default name of the cross-file summary sheet.
pub const C_SHEET_NAME_SUMMARY: &str = "summary";
/// Tool tag used when `config.tool` is missing.
pub const C_TOOL_UNKNOWN: &str = "unknown";

/// Minimum distance above the average, as a ratio of the average, for outlier highlighting.
pub const N_RATIO_OUTLIER_FLOOR: f64 = 0.15;

/// Top-level keys carrying the file-level wall time, in write order.
pub const TUP_KEYS_TOTAL: [&str; 2] = ["total", "overall"];

/// Scalar keys of one segmented-timing block.
pub const TUP_KEYS_SEGMENT_SCALAR: [&str; 3] = ["total", "merge", "undump"];
/// Mapping keys (file path -> seconds) of one segmented-timing block.
pub const TUP_KEYS_SEGMENT_MAPPING: [&str; 2] = ["parse", "append"];

/// Per-file timing categories of the per-directory generator.
pub const TUP_KEYS_GENINFO_CATEGORY: [&str; 7] = [
    "process", "parse", "append", "child", "exec", "merge", "undump",
];
/// File-total mappings of the per-directory generator, in write order.
pub const TUP_KEYS_GENINFO_FILE_TYPE: [&str; 2] = ["data", "graph"];

/// Per-file timing categories of the HTML report generator.
pub const TUP_KEYS_GENHTML_CATEGORY: [&str; 8] = [
    "check_version",
    "synth",
    "load",
    "annotate",
    "categorize",
    "source",
    "html",
    "child",
];
/// Prelude scalars of the HTML report generator.
pub const TUP_KEYS_GENHTML_SCALAR: [&str; 4] = [
    "parse_source",
    "parse_diff",
    "parse_current",
    "parse_baseline",
];

/// Scalar keys understood by the generic layout.
pub const TUP_KEYS_GENERIC_SCALAR: [&str; 5] = [
    "parse_source",
    "parse_diff",
    "emit",
    "parse_current",
    "parse_baseline",
];
/// Mapping keys expanded one row per inner key by the generic layout.
pub const TUP_KEYS_GENERIC_MAPPING: [&str; 16] = [
    "file",
    "dir",
    "directory",
    "load",
    "synth",
    "check_version",
    "annotate",
    "parse",
    "append",
    "segment",
    "undump",
    "merge",
    "gen_info",
    "data",
    "graph",
    "find",
];
/// Keys consumed by the common prelude.
pub const TUP_KEYS_GENERIC_SKIPPED: [&str; 3] = ["config", "total", "overall"];

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumFmtKey {
    /// Two-decimal number format.
    TwoDecimal,
    /// Integer number format.
    Integer,
    /// Bold centered title.
    Title,
    /// Italic centered label.
    Italic,
    /// Secondary highlight fill (beyond one standard deviation).
    Highlight,
    /// Danger fill (beyond two standard deviations).
    Danger,
}

impl EnumFmtKey {
    /// All preset keys in a stable order.
    pub const ALL: [EnumFmtKey; 6] = [
        EnumFmtKey::TwoDecimal,
        EnumFmtKey::Integer,
        EnumFmtKey::Title,
        EnumFmtKey::Italic,
        EnumFmtKey::Highlight,
        EnumFmtKey::Danger,
    ];
}

/// Build default format presets used by [`crate::writer::XlsxWriter`].
pub fn derive_default_xlsx_formats() -> BTreeMap<EnumFmtKey, SpecCellFormat> {
    let cfg_centered = SpecCellFormat {
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        EnumFmtKey::TwoDecimal,
        SpecCellFormat {
            num_format: Some("0.00".to_string()),
            ..Default::default()
        },
    );
    dict_fmt.insert(
        EnumFmtKey::Integer,
        SpecCellFormat {
            num_format: Some("0".to_string()),
            ..Default::default()
        },
    );
    dict_fmt.insert(
        EnumFmtKey::Title,
        cfg_centered.with_(SpecCellFormat {
            bold: Some(true),
            text_wrap: Some(true),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Italic,
        cfg_centered.with_(SpecCellFormat {
            italic: Some(true),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Highlight,
        SpecCellFormat {
            bg_color: Some("#FFEB9C".to_string()),
            font_color: Some("#9C5700".to_string()),
            ..Default::default()
        },
    );
    dict_fmt.insert(
        EnumFmtKey::Danger,
        SpecCellFormat {
            bg_color: Some("#FFC7CE".to_string()),
            font_color: Some("#9C0006".to_string()),
            ..Default::default()
        },
    );

    dict_fmt
}
