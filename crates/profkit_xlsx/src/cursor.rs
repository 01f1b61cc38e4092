//! Append-only sheet cursor used by the layout routines.

use rust_xlsxwriter::{ColNum, RowNum};
use serde_json::Value;

use crate::conf::EnumFmtKey;
use crate::profile::{describe_value, lookup_f64};
use crate::spec::{EnumCellValue, SpecCell, SpecConditionalFormat, SpecSheetLayout};

/// Mutable write position plus the layout being built for one input file.
///
/// `row` only moves forward. Field-level failures are logged and recorded,
/// never propagated, so one bad record cannot abort a sheet.
#[derive(Debug)]
pub struct SheetCursor {
    layout: SpecSheetLayout,
    file_label: String,
    row: RowNum,
    warnings: Vec<String>,
}

impl SheetCursor {
    /// Start an empty sheet named `sheet_name` for input `file_label`.
    pub fn new(sheet_name: impl Into<String>, file_label: impl Into<String>) -> Self {
        Self {
            layout: SpecSheetLayout::new(sheet_name),
            file_label: file_label.into(),
            row: 0,
            warnings: Vec::new(),
        }
    }

    /// Current row.
    pub fn row(&self) -> RowNum {
        self.row
    }

    /// Move to the next row.
    pub fn advance(&mut self) {
        self.row += 1;
    }

    /// Input file this sheet describes.
    pub fn file_label(&self) -> &str {
        &self.file_label
    }

    /// Diagnostics recorded so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Log and record a diagnostic.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let c_msg = msg.into();
        log::warn!("{c_msg}");
        self.warnings.push(c_msg);
    }

    /// Write a text cell.
    pub fn write_string(
        &mut self,
        row: RowNum,
        col: ColNum,
        text: impl Into<String>,
        fmt: Option<EnumFmtKey>,
    ) {
        self.put(row, col, EnumCellValue::String(text.into()), fmt);
    }

    /// Write a number that is already known to be finite.
    pub fn write_f64(&mut self, row: RowNum, col: ColNum, value: f64, fmt: Option<EnumFmtKey>) {
        self.put(row, col, EnumCellValue::Number(value), fmt);
    }

    /// Write a formula (no leading `=`).
    pub fn write_formula(
        &mut self,
        row: RowNum,
        col: ColNum,
        formula: impl Into<String>,
        fmt: Option<EnumFmtKey>,
    ) {
        self.put(row, col, EnumCellValue::Formula(formula.into()), fmt);
    }

    /// Write a two-decimal duration from a JSON value.
    ///
    /// On a missing or non-numeric value the cell stays blank and
    /// `"<file>: failed to write <value> for <field>"` is recorded.
    pub fn write_duration(
        &mut self,
        row: RowNum,
        col: ColNum,
        value: Option<&Value>,
        field: &str,
    ) -> Option<f64> {
        self.write_number(row, col, value, Some(EnumFmtKey::TwoDecimal), field)
    }

    /// Write a number from a JSON value with `fmt`, see [`Self::write_duration`].
    pub fn write_number(
        &mut self,
        row: RowNum,
        col: ColNum,
        value: Option<&Value>,
        fmt: Option<EnumFmtKey>,
        field: &str,
    ) -> Option<f64> {
        match value.and_then(lookup_f64) {
            Some(n_value) => {
                self.write_f64(row, col, n_value, fmt);
                Some(n_value)
            }
            None => {
                let c_msg = format!(
                    "{}: failed to write {} for {field}",
                    self.file_label,
                    describe_value(value)
                );
                self.warn(c_msg);
                None
            }
        }
    }

    /// Register a conditional format.
    pub fn add_conditional_format(&mut self, spec: SpecConditionalFormat) {
        self.layout.conditional_formats.push(spec);
    }

    /// Finish the sheet, returning its layout and diagnostics.
    pub fn finish(self) -> (SpecSheetLayout, Vec<String>) {
        (self.layout, self.warnings)
    }

    fn put(&mut self, row: RowNum, col: ColNum, value: EnumCellValue, fmt: Option<EnumFmtKey>) {
        self.layout.cells.insert((row, col), SpecCell { value, fmt });
    }
}
