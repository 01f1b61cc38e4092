//! Stateless helpers: sheet naming, A1 references and path matching.

use std::collections::BTreeSet;
use std::path::Path;

use rust_xlsxwriter::utility::{cell_range, row_col_to_cell, row_col_to_cell_absolute};
use rust_xlsxwriter::{ColNum, RowNum};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_LEN_SHEET_NAME_BASE_MAX, N_SHEET_NAME_ATTEMPTS_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::BuildError;

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to a usable Excel sheet name.
///
/// Length is not capped here; callers cut from the tail.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }
    c_name
}

/// Keep the last `n_chars` characters of `text`.
pub fn derive_tail_chars(text: &str, n_chars: usize) -> String {
    let n_len = text.chars().count();
    text.chars().skip(n_len.saturating_sub(n_chars)).collect()
}

/// Derive the sheet base name for an input file.
///
/// A file named after its tool (`<dir>/geninfo.json`) is labelled by its
/// directory; anything else by its file name. Only the last
/// `N_LEN_SHEET_NAME_BASE_MAX` characters are kept.
pub fn derive_sheet_name_base(path: &Path, tool_tag: &str) -> String {
    let c_file_name = path
        .file_name()
        .map(|val| val.to_string_lossy().to_string())
        .unwrap_or_default();
    let c_file_stem = path
        .file_stem()
        .map(|val| val.to_string_lossy().to_string())
        .unwrap_or_default();

    let c_name = if c_file_stem == tool_tag {
        path.parent()
            .and_then(Path::file_name)
            .map(|val| val.to_string_lossy().to_string())
            .unwrap_or_default()
    } else {
        c_file_name
    };

    // Cutting the head can expose an apostrophe; sanitize again.
    sanitize_sheet_name(
        &derive_tail_chars(&sanitize_sheet_name(&c_name, "_"), N_LEN_SHEET_NAME_BASE_MAX),
        "_",
    )
}

/// Create suffixed candidate name (`base_0`, `base_1`, ...), keeping the tail.
pub fn create_sheet_identifier(base_name: &str, idx_attempt: usize) -> String {
    derive_tail_chars(
        &format!("{base_name}_{idx_attempt}"),
        N_LEN_EXCEL_SHEET_NAME_MAX,
    )
    .trim_start_matches('\'')
    .to_string()
}

/// Case-insensitive registry of sheet names claimed in one workbook.
#[derive(Debug, Clone, Default)]
pub struct SheetNameRegistry {
    set_sheet_names_existing: BTreeSet<String>,
}

impl SheetNameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` if free.
    pub fn try_claim(&mut self, name: &str) -> bool {
        self.set_sheet_names_existing.insert(name.to_lowercase())
    }

    /// Claim the first free candidate derived from `base_name`.
    ///
    /// Tries `base_name`, then `base_name_0`, `base_name_1`, ... for
    /// [`N_SHEET_NAME_ATTEMPTS_MAX`] attempts in total.
    pub fn claim_unique(&mut self, base_name: &str) -> Result<String, BuildError> {
        let mut c_candidate = derive_tail_chars(base_name, N_LEN_EXCEL_SHEET_NAME_MAX);
        for idx_attempt in 0..N_SHEET_NAME_ATTEMPTS_MAX {
            if self.try_claim(&c_candidate) {
                return Ok(c_candidate);
            }
            c_candidate = create_sheet_identifier(base_name, idx_attempt);
        }
        Err(BuildError::SheetNameExhausted {
            base_name: base_name.to_string(),
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellReferences

/// Relative A1 reference, e.g. `D7`.
pub fn derive_cell_ref(row: RowNum, col: ColNum) -> String {
    row_col_to_cell(row, col)
}

/// Absolute A1 reference, e.g. `$D$7`.
pub fn derive_cell_ref_absolute(row: RowNum, col: ColNum) -> String {
    row_col_to_cell_absolute(row, col)
}

/// Relative range reference over one column, e.g. `D7:D12`.
pub fn derive_column_range_ref(row_first: RowNum, row_last: RowNum, col: ColNum) -> String {
    cell_range(row_first, col, row_last, col)
}

/// Quote a sheet name for use in a cross-sheet reference.
pub fn quote_sheet_name(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

/// Cross-sheet reference, e.g. `'run_1'!B3`.
pub fn derive_sheet_cell_ref(sheet_name: &str, row: RowNum, col: ColNum) -> String {
    format!(
        "{}!{}",
        quote_sheet_name(sheet_name),
        derive_cell_ref(row, col)
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathMatching

/// Whether `file` sits directly inside `dirname`.
pub fn is_file_in_directory(file: &str, dirname: &str) -> bool {
    Path::new(file)
        .parent()
        .is_some_and(|parent| parent == Path::new(dirname))
}

/// Display name of `file` relative to `dirname`.
pub fn derive_file_label(file: &str, dirname: &str) -> String {
    match file.strip_prefix(dirname) {
        Some(rest) if !dirname.is_empty() => rest.trim_start_matches('/').to_string(),
        _ => file.to_string(),
    }
}

/// Estimate displayed width units of a text cell.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
