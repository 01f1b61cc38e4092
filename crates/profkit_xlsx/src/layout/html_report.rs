//! HTML report generation (`genhtml`) layout.

use std::path::Path;

use rust_xlsxwriter::{ColNum, RowNum};

use crate::conf::{EnumFmtKey, TUP_KEYS_GENHTML_CATEGORY, TUP_KEYS_GENHTML_SCALAR};
use crate::cursor::SheetCursor;
use crate::layout::{SpecPrelude, derive_parallelism_formula, sorted_keys};
use crate::profile::{ProfileDocument, lookup_path};
use crate::spec::SpecBuildOptions;
use crate::stats::{SpecStatsRows, insert_stats};
use crate::util::{derive_cell_ref, derive_column_range_ref, is_file_in_directory};

const N_COL_FILE_TOTAL: ColNum = 3;
const N_COL_CATEGORY_FIRST: ColNum = 4;

/// Directory mapping keys, canonical first.
const TUP_KEYS_DIRECTORY: [&str; 2] = ["directory", "dir"];

/// Lay out an HTML report generation (`genhtml`) document.
pub fn layout_html_report(
    cursor: &mut SheetCursor,
    doc: &ProfileDocument,
    prelude: &SpecPrelude,
    options: &SpecBuildOptions,
) {
    for c_key in TUP_KEYS_GENHTML_SCALAR {
        if !doc.contains(c_key) {
            continue;
        }
        let row = cursor.row();
        cursor.write_string(row, 0, c_key, None);
        cursor.write_duration(row, 1, doc.get(c_key), &format!("genhtml[{c_key}]"));
        cursor.advance();
    }

    let (Some(dict_dirs), Some(dict_files)) =
        (doc.first_mapping(&TUP_KEYS_DIRECTORY), doc.mapping("file"))
    else {
        return;
    };

    let row_header = cursor.row();
    cursor.write_string(row_header, 1, "directory", Some(EnumFmtKey::Title));
    cursor.write_string(row_header, 2, "file", Some(EnumFmtKey::Title));
    cursor.write_string(row_header, N_COL_FILE_TOTAL, "total", Some(EnumFmtKey::Title));
    for (idx_category, c_category) in TUP_KEYS_GENHTML_CATEGORY.iter().enumerate() {
        cursor.write_string(
            row_header,
            N_COL_CATEGORY_FIRST + idx_category as ColNum,
            *c_category,
            Some(EnumFmtKey::Title),
        );
    }
    cursor.advance();
    let rows_stats = SpecStatsRows::reserve(cursor, 2, true);

    let l_files = sorted_keys(dict_files);
    let mut l_observed = vec![0usize; TUP_KEYS_GENHTML_CATEGORY.len()];
    let mut l_file_ranges: Vec<(RowNum, RowNum)> = Vec::new();

    for c_dirname in sorted_keys(dict_dirs) {
        let row_dir = cursor.row();
        cursor.write_string(row_dir, 0, "directory", None);
        cursor.write_string(row_dir, 1, c_dirname.clone(), None);
        let n_dir_total = cursor.write_duration(
            row_dir,
            2,
            dict_dirs.get(c_dirname),
            &format!("genhtml[directory][{c_dirname}]"),
        );
        cursor.advance();

        let row_files_first = cursor.row();
        for c_file in l_files
            .iter()
            .filter(|c_file| is_file_in_directory(c_file, c_dirname))
        {
            let row = cursor.row();
            let c_name = Path::new(c_file.as_str())
                .file_name()
                .map(|val| val.to_string_lossy().to_string())
                .unwrap_or_else(|| c_file.to_string());
            cursor.write_string(row, 2, c_name, None);
            cursor.write_duration(
                row,
                N_COL_FILE_TOTAL,
                dict_files.get(c_file.as_str()),
                &format!("genhtml[file][{c_file}]"),
            );

            for (idx_category, c_category) in TUP_KEYS_GENHTML_CATEGORY.iter().enumerate() {
                let Some(value) = lookup_path(doc.root(), &[*c_category, c_file.as_str()]) else {
                    continue;
                };
                if cursor
                    .write_duration(
                        row,
                        N_COL_CATEGORY_FIRST + idx_category as ColNum,
                        Some(value),
                        &format!("genhtml[{c_category}][{c_file}]"),
                    )
                    .is_some()
                {
                    l_observed[idx_category] += 1;
                }
            }
            cursor.advance();
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

    let (Some((row_first, _)), Some((_, row_last))) =
        (l_file_ranges.first().copied(), l_file_ranges.last().copied())
    else {
        return;
    };
    for (idx_category, n_observed) in l_observed.iter().enumerate() {
        insert_stats(
            cursor,
            &rows_stats,
            N_COL_CATEGORY_FIRST + idx_category as ColNum,
            row_first,
            row_last,
            *n_observed,
            options.ratio_outlier_floor,
        );
    }

    match prelude.cell_total {
        Some((row_total, col_total)) => cursor.write_formula(
            row_total,
            2,
            derive_parallelism_formula(
                &l_file_ranges,
                N_COL_FILE_TOTAL,
                &derive_cell_ref(row_total, col_total),
            ),
            Some(EnumFmtKey::TwoDecimal),
        ),
        None => {
            let c_msg = format!(
                "{}: no file-level total; effective parallelism skipped",
                cursor.file_label()
            );
            cursor.warn(c_msg);
        }
    }
}
