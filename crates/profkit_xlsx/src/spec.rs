//! Shared layout models, build options and error types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rust_xlsxwriter::{ColNum, RowNum, XlsxError};

use crate::conf::{
    C_SHEET_NAME_SUMMARY, EnumFmtKey, N_RATIO_OUTLIER_FLOOR, derive_default_xlsx_formats,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification resolved by the writer into `rust_xlsxwriter::Format`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LayoutSpecification

/// Cell payload in a sheet layout.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Formula text without the leading `=`.
    Formula(String),
}

/// One laid out cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCell {
    /// Cell payload.
    pub value: EnumCellValue,
    /// Optional format preset.
    pub fmt: Option<EnumFmtKey>,
}

/// Formula-based conditional format over one column range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConditionalFormat {
    /// First row (inclusive).
    pub row_first: RowNum,
    /// Last row (inclusive).
    pub row_last: RowNum,
    /// Target column.
    pub col: ColNum,
    /// Rule formula, relative to the top-left cell of the range.
    pub rule: String,
    /// Format applied when the rule holds.
    pub fmt: EnumFmtKey,
}

/// In-memory layout of one worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetLayout {
    /// Unique worksheet name.
    pub sheet_name: String,
    /// Cells keyed by `(row, col)`.
    pub cells: BTreeMap<(RowNum, ColNum), SpecCell>,
    /// Conditional formats in insertion order.
    pub conditional_formats: Vec<SpecConditionalFormat>,
    /// Hide the worksheet tab.
    pub if_hidden: bool,
}

impl SpecSheetLayout {
    /// Create an empty layout for `sheet_name`.
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..Default::default()
        }
    }

    /// Cell at `(row, col)`, if written.
    pub fn cell(&self, row: RowNum, col: ColNum) -> Option<&SpecCell> {
        self.cells.get(&(row, col))
    }

    /// Text at `(row, col)` when the cell is a string.
    pub fn text(&self, row: RowNum, col: ColNum) -> Option<&str> {
        match self.cell(row, col).map(|cell| &cell.value) {
            Some(EnumCellValue::String(val)) => Some(val),
            _ => None,
        }
    }

    /// Number at `(row, col)` when the cell is numeric.
    pub fn number(&self, row: RowNum, col: ColNum) -> Option<f64> {
        match self.cell(row, col).map(|cell| &cell.value) {
            Some(EnumCellValue::Number(val)) => Some(*val),
            _ => None,
        }
    }

    /// Formula text at `(row, col)` when the cell is a formula.
    pub fn formula(&self, row: RowNum, col: ColNum) -> Option<&str> {
        match self.cell(row, col).map(|cell| &cell.value) {
            Some(EnumCellValue::Formula(val)) => Some(val),
            _ => None,
        }
    }

    /// First row of column `col` holding exactly `text`.
    pub fn find_row(&self, col: ColNum, text: &str) -> Option<RowNum> {
        self.cells.iter().find_map(|((row, c), cell)| match &cell.value {
            EnumCellValue::String(val) if *c == col && val == text => Some(*row),
            _ => None,
        })
    }
}

/// Ordered set of sheet layouts forming one workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecWorkbookLayout {
    /// Sheets in tab order.
    pub sheets: Vec<SpecSheetLayout>,
}

impl SpecWorkbookLayout {
    /// Sheet by exact name.
    pub fn sheet(&self, sheet_name: &str) -> Option<&SpecSheetLayout> {
        self.sheets.iter().find(|sheet| sheet.sheet_name == sheet_name)
    }

    /// Sheet names in tab order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.sheet_name.as_str()).collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BuildOptions

/// Column width inference policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Infer widths from text cells.
    pub if_enabled: bool,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            if_enabled: true,
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Run-wide options for layout and rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecBuildOptions {
    /// Name reserved for the cross-file summary sheet.
    pub summary_sheet_name: String,
    /// Minimum distance above the average (ratio of the average) for highlighting.
    pub ratio_outlier_floor: f64,
    /// Column width inference.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Format presets by key.
    pub formats: BTreeMap<EnumFmtKey, SpecCellFormat>,
}

impl Default for SpecBuildOptions {
    fn default() -> Self {
        Self {
            summary_sheet_name: C_SHEET_NAME_SUMMARY.to_string(),
            ratio_outlier_floor: N_RATIO_OUTLIER_FLOOR,
            policy_autofit: SpecAutofitCellsPolicy::default(),
            formats: derive_default_xlsx_formats(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// File-level failure: the input is skipped, the run continues.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Input could not be read.
    #[error("unable to read: {source}")]
    Io {
        /// Input path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Input is not valid JSON.
    #[error("unable to parse: {source}")]
    Json {
        /// Input path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// JSON root is not an object.
    #[error("unable to parse: top-level value is not an object")]
    NotAnObject {
        /// Input path.
        path: PathBuf,
    },
}

/// Fatal failure: aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Every candidate sheet name is taken.
    #[error("{base_name} in use..giving up")]
    SheetNameExhausted {
        /// Base name the candidates were derived from.
        base_name: String,
    },
    /// Workbook rendering or saving failed.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Writer was used after `close()`.
    #[error("cannot write after close()")]
    Closed,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
