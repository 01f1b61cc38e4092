//! Column statistics and outlier highlighting.

use rust_xlsxwriter::{ColNum, RowNum};

use crate::conf::EnumFmtKey;
use crate::cursor::SheetCursor;
use crate::spec::SpecConditionalFormat;
use crate::util::{derive_cell_ref, derive_cell_ref_absolute, derive_column_range_ref};

/// Rows holding the per-column statistics formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecStatsRows {
    /// `SUM` row, when the sheet has one.
    pub row_sum: Option<RowNum>,
    /// `AVERAGE` row.
    pub row_avg: RowNum,
    /// `STDEV` row.
    pub row_dev: RowNum,
}

impl SpecStatsRows {
    /// Reserve consecutive stats rows at the cursor and label them in `col_label`.
    pub fn reserve(cursor: &mut SheetCursor, col_label: ColNum, if_sum: bool) -> Self {
        let row_sum = if if_sum {
            let row = cursor.row();
            cursor.write_string(row, col_label, "sum", Some(EnumFmtKey::Italic));
            cursor.advance();
            Some(row)
        } else {
            None
        };

        let row_avg = cursor.row();
        cursor.write_string(row_avg, col_label, "average", Some(EnumFmtKey::Italic));
        cursor.advance();

        let row_dev = cursor.row();
        cursor.write_string(row_dev, col_label, "stddev", Some(EnumFmtKey::Italic));
        cursor.advance();

        Self {
            row_sum,
            row_avg,
            row_dev,
        }
    }
}

/// Build the highlight and danger rule formulas for a range anchored at `(row_first, col)`.
///
/// Values above the average by more than `ratio_floor * average` are flagged:
/// highlight between one and two standard deviations, danger beyond two.
pub fn derive_outlier_rules(
    rows: &SpecStatsRows,
    row_first: RowNum,
    col: ColNum,
    ratio_floor: f64,
) -> (String, String) {
    let c_cell = derive_cell_ref(row_first, col);
    let c_avg = derive_cell_ref_absolute(rows.row_avg, col);
    let c_dev = derive_cell_ref_absolute(rows.row_dev, col);

    let c_guard = format!("NOT(ISBLANK({c_cell})),NOT(ISBLANK({c_dev}))");
    let c_floor = format!("({c_cell}-{c_avg})>{ratio_floor}*{c_avg}");

    let c_highlight = format!(
        "AND({c_guard},ABS({c_cell}-{c_avg})>{c_dev},ABS({c_cell}-{c_avg})<=2*{c_dev},{c_floor})"
    );
    let c_danger = format!("AND({c_guard},ABS({c_cell}-{c_avg})>2*{c_dev},{c_floor})");
    (c_highlight, c_danger)
}

/// Write sum/average/stddev formulas for one column and attach outlier rules.
///
/// Nothing is written when the column has no observation; the stddev needs two.
pub fn insert_stats(
    cursor: &mut SheetCursor,
    rows: &SpecStatsRows,
    col: ColNum,
    row_first: RowNum,
    row_last: RowNum,
    n_observed: usize,
    ratio_floor: f64,
) {
    if n_observed == 0 || row_last < row_first {
        return;
    }

    let c_range = derive_column_range_ref(row_first, row_last, col);
    if let Some(row_sum) = rows.row_sum {
        cursor.write_formula(
            row_sum,
            col,
            format!("SUM({c_range})"),
            Some(EnumFmtKey::TwoDecimal),
        );
    }
    cursor.write_formula(
        rows.row_avg,
        col,
        format!("AVERAGE({c_range})"),
        Some(EnumFmtKey::TwoDecimal),
    );
    if n_observed >= 2 {
        cursor.write_formula(
            rows.row_dev,
            col,
            format!("STDEV({c_range})"),
            Some(EnumFmtKey::TwoDecimal),
        );
    }

    let (c_highlight, c_danger) = derive_outlier_rules(rows, row_first, col, ratio_floor);
    cursor.add_conditional_format(SpecConditionalFormat {
        row_first,
        row_last,
        col,
        rule: c_highlight,
        fmt: EnumFmtKey::Highlight,
    });
    cursor.add_conditional_format(SpecConditionalFormat {
        row_first,
        row_last,
        col,
        rule: c_danger,
        fmt: EnumFmtKey::Danger,
    });
}
