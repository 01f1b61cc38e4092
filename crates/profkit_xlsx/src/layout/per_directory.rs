//! Per-directory generation (`geninfo`) layout.

use rust_xlsxwriter::{ColNum, RowNum};
use serde_json::{Map, Value};

use crate::conf::{EnumFmtKey, TUP_KEYS_GENINFO_CATEGORY, TUP_KEYS_GENINFO_FILE_TYPE};
use crate::cursor::SheetCursor;
use crate::layout::{SpecPrelude, SpecSummaryAnchors, derive_parallelism_formula, sorted_keys};
use crate::profile::{ProfileDocument, lookup_path};
use crate::spec::SpecBuildOptions;
use crate::stats::{SpecStatsRows, insert_stats};
use crate::util::{derive_cell_ref, derive_column_range_ref, derive_file_label, is_file_in_directory};

const N_COL_FILE_TOTAL: ColNum = 3;
const N_COL_CATEGORY_FIRST: ColNum = 4;

/// How file entries of a `data`/`graph` mapping are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumFileMembership {
    /// `data[type][dir][file]`, categories as `category[dir][file]`.
    Nested,
    /// `data[type][file]` filtered by parent directory, categories as `category[file]`.
    /// Used when `data[type][dir]` is not a mapping.
    Flat,
}

impl EnumFileMembership {
    fn detect(dict_type: &Map<String, Value>, c_dirname: &str) -> Self {
        if dict_type.get(c_dirname).is_some_and(Value::is_object) {
            Self::Nested
        } else {
            Self::Flat
        }
    }
}

/// Lay out a per-directory generation (`geninfo`) document.
pub fn layout_per_directory(
    cursor: &mut SheetCursor,
    doc: &ProfileDocument,
    prelude: &SpecPrelude,
    options: &SpecBuildOptions,
) -> SpecSummaryAnchors {
    let mut anchors = SpecSummaryAnchors {
        cell_total: prelude.cell_total,
        cell_parallelism: None,
        cells_category: vec![None; TUP_KEYS_GENINFO_CATEGORY.len()],
    };
    let Some(dict_gen_info) = doc.mapping("gen_info") else {
        return anchors;
    };

    if doc.contains("emit") {
        let row = cursor.row();
        cursor.write_string(row, 2, "emit", None);
        cursor.write_duration(row, 3, doc.get("emit"), "geninfo[emit]");
        cursor.advance();
    }

    write_header(cursor);
    let rows_stats = SpecStatsRows::reserve(cursor, 2, true);

    let mut l_observed = vec![0usize; TUP_KEYS_GENINFO_CATEGORY.len()];
    let mut l_file_ranges: Vec<(RowNum, RowNum)> = Vec::new();

    for c_dirname in sorted_keys(dict_gen_info) {
        let row_dir = cursor.row();
        cursor.write_string(row_dir, 0, "gen_info", None);
        cursor.write_string(row_dir, 1, c_dirname.clone(), None);
        let n_dir_total = cursor.write_duration(
            row_dir,
            2,
            dict_gen_info.get(c_dirname),
            &format!("geninfo[gen_info][{c_dirname}]"),
        );
        cursor.advance();

        let row_find = cursor.row();
        cursor.write_string(row_find, 2, "find", None);
        cursor.write_duration(
            row_find,
            3,
            lookup_path(doc.root(), &["find", c_dirname.as_str()]),
            &format!("geninfo[find][{c_dirname}]"),
        );
        cursor.advance();

        let row_files_first = cursor.row();
        for c_type in TUP_KEYS_GENINFO_FILE_TYPE {
            let Some(dict_type) = doc.mapping(c_type) else {
                continue;
            };
            write_directory_files(cursor, doc, dict_type, c_type, c_dirname, &mut l_observed);
        }

        if cursor.row() == row_files_first {
            continue;
        }
        let row_files_last = cursor.row() - 1;
        l_file_ranges.push((row_files_first, row_files_last));

        if n_dir_total.is_some() {
            cursor.write_formula(
                row_dir,
                N_COL_FILE_TOTAL,
                format!(
                    "SUM({})/{}",
                    derive_column_range_ref(row_files_first, row_files_last, N_COL_FILE_TOTAL),
                    derive_cell_ref(row_dir, 2)
                ),
                Some(EnumFmtKey::TwoDecimal),
            );
        }
    }

    if let (Some((row_first, _)), Some((_, row_last))) = (l_file_ranges.first(), l_file_ranges.last())
    {
        for (idx_category, n_observed) in l_observed.iter().enumerate() {
            let col = N_COL_CATEGORY_FIRST + idx_category as ColNum;
            insert_stats(
                cursor,
                &rows_stats,
                col,
                *row_first,
                *row_last,
                *n_observed,
                options.ratio_outlier_floor,
            );
            if *n_observed > 0 {
                anchors.cells_category[idx_category] = rows_stats.row_sum.map(|row| (row, col));
            }
        }
    }

    if !l_file_ranges.is_empty() {
        match prelude.cell_total {
            Some((row_total, col_total)) => {
                cursor.write_formula(
                    row_total,
                    2,
                    derive_parallelism_formula(
                        &l_file_ranges,
                        N_COL_FILE_TOTAL,
                        &derive_cell_ref(row_total, col_total),
                    ),
                    Some(EnumFmtKey::TwoDecimal),
                );
                anchors.cell_parallelism = Some((row_total, 2));
            }
            None => {
                let c_msg = format!(
                    "{}: no file-level total; effective parallelism skipped",
                    cursor.file_label()
                );
                cursor.warn(c_msg);
            }
        }
    }

    anchors
}

fn write_header(cursor: &mut SheetCursor) {
    let row = cursor.row();
    cursor.write_string(row, 1, "directory", Some(EnumFmtKey::Title));
    cursor.write_string(row, 2, "file", Some(EnumFmtKey::Title));
    cursor.write_string(row, N_COL_FILE_TOTAL, "total", Some(EnumFmtKey::Title));
    for (idx_category, c_category) in TUP_KEYS_GENINFO_CATEGORY.iter().enumerate() {
        cursor.write_string(
            row,
            N_COL_CATEGORY_FIRST + idx_category as ColNum,
            *c_category,
            Some(EnumFmtKey::Title),
        );
    }
    cursor.advance();
}

/// One row per file of `c_dirname` in `dict_type`: total plus category durations.
fn write_directory_files(
    cursor: &mut SheetCursor,
    doc: &ProfileDocument,
    dict_type: &Map<String, Value>,
    c_type: &str,
    c_dirname: &str,
    l_observed: &mut [usize],
) {
    let membership = EnumFileMembership::detect(dict_type, c_dirname);
    let l_files: Vec<(&String, &Value)> = match membership {
        EnumFileMembership::Nested => dict_type
            .get(c_dirname)
            .and_then(Value::as_object)
            .map(|dict_files| {
                sorted_keys(dict_files)
                    .into_iter()
                    .map(|c_file| (c_file, &dict_files[c_file]))
                    .collect()
            })
            .unwrap_or_default(),
        EnumFileMembership::Flat => sorted_keys(dict_type)
            .into_iter()
            .filter(|c_file| is_file_in_directory(c_file, c_dirname))
            .map(|c_file| (c_file, &dict_type[c_file]))
            .collect(),
    };

    for (c_file, value_total) in l_files {
        let row = cursor.row();
        cursor.write_string(row, 2, derive_file_label(c_file, c_dirname), None);
        cursor.write_duration(
            row,
            N_COL_FILE_TOTAL,
            Some(value_total),
            &format!("geninfo[{c_type}][{c_file}]"),
        );

        for (idx_category, c_category) in TUP_KEYS_GENINFO_CATEGORY.iter().enumerate() {
            let value = match membership {
                EnumFileMembership::Nested => {
                    lookup_path(doc.root(), &[*c_category, c_dirname, c_file.as_str()])
                }
                EnumFileMembership::Flat => lookup_path(doc.root(), &[*c_category, c_file.as_str()]),
            };
            // Files not processed in parallel have no category timings.
            let Some(value) = value else {
                continue;
            };
            if cursor
                .write_duration(
                    row,
                    N_COL_CATEGORY_FIRST + idx_category as ColNum,
                    Some(value),
                    &format!("geninfo[{c_category}][{c_file}]"),
                )
                .is_some()
            {
                l_observed[idx_category] += 1;
            }
        }
        cursor.advance();
    }
}
