//! Per-tool sheet layouts.
//!
//! - `segmented`     : `lcov` segmented timing
//! - `per_directory` : `geninfo` per-directory generation
//! - `html_report`   : `genhtml` HTML report generation
//! - `generic`       : any other tool, and the fallback for incomplete documents
mod generic;
mod html_report;
mod per_directory;
mod segmented;

use rust_xlsxwriter::{ColNum, RowNum};
use serde_json::{Map, Value};

use crate::conf::{EnumFmtKey, TUP_KEYS_TOTAL};
use crate::cursor::SheetCursor;
use crate::profile::{EnumProfileTool, ProfileDocument};
use crate::spec::SpecBuildOptions;

pub use generic::layout_generic;
pub use html_report::layout_html_report;
pub use per_directory::layout_per_directory;
pub use segmented::{EnumSegmentPolicy, layout_segmented, resolve_segment_policy};

/// Cells of a per-directory sheet referenced by the summary sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSummaryAnchors {
    /// File-level total.
    pub cell_total: Option<(RowNum, ColNum)>,
    /// File-level effective parallelism.
    pub cell_parallelism: Option<(RowNum, ColNum)>,
    /// Column sum per timing category, in category order.
    pub cells_category: Vec<Option<(RowNum, ColNum)>>,
}

/// Positions written by the common prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecPrelude {
    /// File-level total cell, when a numeric total was written.
    pub cell_total: Option<(RowNum, ColNum)>,
}

/// Lay out `doc` into `cursor` according to its tool.
///
/// Returns summary anchors for per-directory documents.
pub fn layout_document(
    cursor: &mut SheetCursor,
    doc: &ProfileDocument,
    options: &SpecBuildOptions,
) -> Option<SpecSummaryAnchors> {
    let tool = doc.tool();
    let prelude = write_prelude(cursor, doc);

    if let Some(c_missing) = doc.missing_required_key(&tool) {
        let c_msg = format!(
            "{}: missing required key '{c_missing}' for {}; using generic layout",
            cursor.file_label(),
            tool.tag()
        );
        cursor.warn(c_msg);
        layout_generic(cursor, doc);
        return None;
    }

    match tool {
        EnumProfileTool::SegmentedTiming => {
            layout_segmented(cursor, doc, &prelude);
            None
        }
        EnumProfileTool::PerDirectoryGeneration => {
            Some(layout_per_directory(cursor, doc, &prelude, options))
        }
        EnumProfileTool::HtmlReportGeneration => {
            layout_html_report(cursor, doc, &prelude, options);
            None
        }
        EnumProfileTool::Unknown(_) => {
            layout_generic(cursor, doc);
            None
        }
    }
}

/// Write the input path, the `config` block and the file-level total rows.
pub fn write_prelude(cursor: &mut SheetCursor, doc: &ProfileDocument) -> SpecPrelude {
    let c_file_label = cursor.file_label().to_string();
    cursor.write_string(0, 0, c_file_label, Some(EnumFmtKey::Title));
    cursor.advance();

    // Old profile formats carry no config block.
    if let Some(dict_config) = doc.config() {
        cursor.write_string(cursor.row(), 0, "config", None);
        for c_key in sorted_keys(dict_config) {
            let row = cursor.row();
            cursor.write_string(row, 1, c_key, None);
            match &dict_config[c_key] {
                Value::String(val) => cursor.write_string(row, 2, val.clone(), None),
                Value::Number(val) => match val.as_f64() {
                    Some(n_value) => cursor.write_f64(row, 2, n_value, Some(EnumFmtKey::Integer)),
                    None => cursor.write_string(row, 2, val.to_string(), None),
                },
                val => cursor.write_string(row, 2, val.to_string(), None),
            }
            cursor.advance();
        }
    }

    let mut prelude = SpecPrelude::default();
    for c_key in TUP_KEYS_TOTAL {
        if !doc.contains(c_key) {
            continue;
        }
        let row = cursor.row();
        cursor.write_string(row, 0, "total", None);
        if cursor
            .write_duration(row, 1, doc.get(c_key), &format!("[{c_key}]"))
            .is_some()
        {
            prelude.cell_total = Some((row, 1));
        }
        cursor.advance();
    }
    prelude
}

/// Keys of `map` in lexicographic order.
pub(crate) fn sorted_keys(map: &Map<String, Value>) -> Vec<&String> {
    let mut l_keys: Vec<&String> = map.keys().collect();
    l_keys.sort();
    l_keys
}

/// `(SUM(r1)+SUM(r2)+...)/<total>` over file-total ranges of one column.
pub(crate) fn derive_parallelism_formula(
    ranges: &[(RowNum, RowNum)],
    col: ColNum,
    c_total_ref: &str,
) -> String {
    let c_sum = ranges
        .iter()
        .map(|(row_first, row_last)| {
            format!(
                "SUM({})",
                crate::util::derive_column_range_ref(*row_first, *row_last, col)
            )
        })
        .collect::<Vec<_>>()
        .join("+");
    format!("({c_sum})/{c_total_ref}")
}
