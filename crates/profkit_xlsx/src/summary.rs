//! Cross-file summary of per-directory generation runs.

use rust_xlsxwriter::{ColNum, RowNum};

use crate::conf::{EnumFmtKey, TUP_KEYS_GENINFO_CATEGORY};
use crate::cursor::SheetCursor;
use crate::layout::SpecSummaryAnchors;
use crate::spec::SpecSheetLayout;
use crate::stats::{SpecStatsRows, insert_stats};
use crate::util::derive_sheet_cell_ref;

const N_COL_TOTAL: ColNum = 1;
const N_COL_PARALLELISM: ColNum = 2;
const N_COL_CATEGORY_FIRST: ColNum = 3;
const N_COLS_VALUE: usize = 2 + TUP_KEYS_GENINFO_CATEGORY.len();

/// One row per laid-out `geninfo` sheet, referencing its anchor cells.
#[derive(Debug)]
pub struct SummarySheet {
    cursor: SheetCursor,
    rows_stats: SpecStatsRows,
    row_first: RowNum,
    l_observed: [usize; N_COLS_VALUE],
    n_entries: usize,
}

impl SummarySheet {
    /// Start the summary sheet: header row, then average and stddev rows.
    pub fn new(sheet_name: &str) -> Self {
        let mut cursor = SheetCursor::new(sheet_name, sheet_name);
        let row = cursor.row();
        cursor.write_string(row, 0, "file", Some(EnumFmtKey::Title));
        cursor.write_string(row, N_COL_TOTAL, "total", Some(EnumFmtKey::Title));
        cursor.write_string(row, N_COL_PARALLELISM, "parallelism", Some(EnumFmtKey::Title));
        for (idx_category, c_category) in TUP_KEYS_GENINFO_CATEGORY.iter().enumerate() {
            cursor.write_string(
                row,
                N_COL_CATEGORY_FIRST + idx_category as ColNum,
                *c_category,
                Some(EnumFmtKey::Title),
            );
        }
        cursor.advance();

        let rows_stats = SpecStatsRows::reserve(&mut cursor, 0, false);
        let row_first = cursor.row();
        Self {
            cursor,
            rows_stats,
            row_first,
            l_observed: [0; N_COLS_VALUE],
            n_entries: 0,
        }
    }

    /// Append one row referencing `anchors` on sheet `sheet_name`.
    pub fn add_entry(&mut self, sheet_name: &str, anchors: &SpecSummaryAnchors) {
        let row = self.cursor.row();
        self.cursor.write_string(row, 0, sheet_name, None);

        let l_cells = [anchors.cell_total, anchors.cell_parallelism]
            .into_iter()
            .chain(anchors.cells_category.iter().copied());
        for (idx_value, cell) in l_cells.take(N_COLS_VALUE).enumerate() {
            let Some((row_ref, col_ref)) = cell else {
                continue;
            };
            self.cursor.write_formula(
                row,
                N_COL_TOTAL + idx_value as ColNum,
                derive_sheet_cell_ref(sheet_name, row_ref, col_ref),
                Some(EnumFmtKey::TwoDecimal),
            );
            self.l_observed[idx_value] += 1;
        }

        self.cursor.advance();
        self.n_entries += 1;
    }

    /// Number of rows added so far.
    pub fn n_entries(&self) -> usize {
        self.n_entries
    }

    /// Attach column statistics and return the layout.
    ///
    /// `None` when no entry was added. With a single entry the sheet is hidden.
    pub fn finish(mut self, ratio_outlier_floor: f64) -> Option<SpecSheetLayout> {
        if self.n_entries == 0 {
            return None;
        }
        let row_last = self.cursor.row() - 1;
        for (idx_value, n_observed) in self.l_observed.iter().enumerate() {
            insert_stats(
                &mut self.cursor,
                &self.rows_stats,
                N_COL_TOTAL + idx_value as ColNum,
                self.row_first,
                row_last,
                *n_observed,
                ratio_outlier_floor,
            );
        }

        let (mut layout, _) = self.cursor.finish();
        layout.if_hidden = self.n_entries < 2;
        Some(layout)
    }
}
