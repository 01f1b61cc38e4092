//! Segmented timing (`lcov`) layout.

use serde_json::{Map, Value};

use crate::conf::{EnumFmtKey, TUP_KEYS_SEGMENT_MAPPING, TUP_KEYS_SEGMENT_SCALAR};
use crate::cursor::SheetCursor;
use crate::layout::{SpecPrelude, sorted_keys};
use crate::profile::ProfileDocument;
use crate::util::derive_cell_ref;

/// How a segmented-timing document is read.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumSegmentPolicy<'a> {
    /// Every segment block resolved, in index order.
    Segmented(Vec<&'a Map<String, Value>>),
    /// Read the timing keys from the document root.
    Unsegmented {
        /// Why segment blocks were not used, when `config.segments` was given.
        reason: Option<String>,
    },
}

/// Decide between segmented and unsegmented reading.
///
/// Segments are used only when `config.segments` is a count and every block
/// `"0".."segments-1"` is a mapping; otherwise the whole document is one block.
pub fn resolve_segment_policy(doc: &ProfileDocument) -> EnumSegmentPolicy<'_> {
    let Some(value) = doc.segments() else {
        return EnumSegmentPolicy::Unsegmented { reason: None };
    };
    let Some(n_segments) = value.as_u64() else {
        return EnumSegmentPolicy::Unsegmented {
            reason: Some(format!("config.segments is not a count: {value}")),
        };
    };

    let mut l_blocks = Vec::new();
    for idx_segment in 0..n_segments {
        match doc.segment(idx_segment) {
            Some(block) => l_blocks.push(block),
            None => {
                return EnumSegmentPolicy::Unsegmented {
                    reason: Some(format!("segment {idx_segment} is missing")),
                };
            }
        }
    }
    EnumSegmentPolicy::Segmented(l_blocks)
}

/// Lay out a segmented-timing (`lcov`) document.
pub fn layout_segmented(cursor: &mut SheetCursor, doc: &ProfileDocument, prelude: &SpecPrelude) {
    match resolve_segment_policy(doc) {
        EnumSegmentPolicy::Segmented(l_blocks) => {
            let mut l_total_refs = Vec::new();
            for (idx_segment, block) in l_blocks.into_iter().enumerate() {
                cursor.write_string(cursor.row(), 0, format!("segment {idx_segment}"), None);
                write_timing_block(
                    cursor,
                    block,
                    &format!("lcov[seg {idx_segment}]"),
                    &mut l_total_refs,
                );
            }
            write_parallelism(cursor, prelude, &l_total_refs);
        }
        EnumSegmentPolicy::Unsegmented { reason } => {
            if let Some(c_reason) = reason {
                let c_msg = format!(
                    "{}: {c_reason}; reading unsegmented",
                    cursor.file_label()
                );
                cursor.warn(c_msg);
            }
            write_timing_block(cursor, doc.root(), "lcov", &mut Vec::new());
        }
    }
}

/// Write `total`/`merge`/`undump` rows and the `parse`/`append` file rows of one block.
///
/// Scalar rows always advance so blocks stay aligned across segments.
fn write_timing_block(
    cursor: &mut SheetCursor,
    block: &Map<String, Value>,
    c_field_prefix: &str,
    l_total_refs: &mut Vec<String>,
) {
    for c_key in TUP_KEYS_SEGMENT_SCALAR {
        let row = cursor.row();
        cursor.write_string(row, 1, c_key, None);
        let n_value = cursor.write_duration(
            row,
            2,
            block.get(c_key),
            &format!("{c_field_prefix}[{c_key}]"),
        );
        if c_key == "total" && n_value.is_some() {
            l_total_refs.push(derive_cell_ref(row, 2));
        }
        cursor.advance();
    }

    for c_key in TUP_KEYS_SEGMENT_MAPPING {
        let Some(dict_files) = block.get(c_key).and_then(Value::as_object) else {
            let c_msg = format!(
                "{}: failed to write {c_key} for {c_field_prefix}",
                cursor.file_label()
            );
            cursor.warn(c_msg);
            continue;
        };

        cursor.write_string(cursor.row(), 1, c_key, None);
        if dict_files.is_empty() {
            cursor.advance();
            continue;
        }
        for c_file in sorted_keys(dict_files) {
            let row = cursor.row();
            cursor.write_string(row, 2, c_file.clone(), None);
            cursor.write_duration(
                row,
                3,
                dict_files.get(c_file),
                &format!("{c_field_prefix}[{c_key}][{c_file}]"),
            );
            cursor.advance();
        }
    }
}

/// `(<seg0 total>+<seg1 total>+...)/<file total>` at the total row.
fn write_parallelism(cursor: &mut SheetCursor, prelude: &SpecPrelude, l_total_refs: &[String]) {
    if l_total_refs.is_empty() {
        return;
    }
    let Some((row_total, col_total)) = prelude.cell_total else {
        let c_msg = format!(
            "{}: no file-level total; effective parallelism skipped",
            cursor.file_label()
        );
        cursor.warn(c_msg);
        return;
    };
    cursor.write_formula(
        row_total,
        3,
        format!(
            "({})/{}",
            l_total_refs.join("+"),
            derive_cell_ref(row_total, col_total)
        ),
        Some(EnumFmtKey::TwoDecimal),
    );
}
