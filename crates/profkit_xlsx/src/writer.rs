//! XLSX writer kernel that renders workbook layouts into an output file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{
    ColNum, ConditionalFormatFormula, Format, FormatAlign, Formula, Workbook, Worksheet,
};

use crate::conf::EnumFmtKey;
use crate::spec::{
    BuildError, EnumCellValue, SpecAutofitCellsPolicy, SpecBuildOptions, SpecCellFormat,
    SpecSheetLayout, SpecWorkbookLayout,
};
use crate::util::estimate_unicode_string_width;

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    dict_formats: BTreeMap<EnumFmtKey, Format>,
    policy_autofit: SpecAutofitCellsPolicy,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and format presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: impl Into<PathBuf>, options: &SpecBuildOptions) -> Self {
        let dict_formats = EnumFmtKey::ALL
            .iter()
            .map(|fmt_key| {
                let spec = options.formats.get(fmt_key).cloned().unwrap_or_default();
                (*fmt_key, derive_rust_xlsx_format(&spec))
            })
            .collect();
        Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            dict_formats,
            policy_autofit: options.policy_autofit.clone(),
            if_closed: false,
        }
    }

    /// Return output file path.
    pub fn file_out(&self) -> &Path {
        &self.path_file_out
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), BuildError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        Ok(())
    }

    /// Write every sheet of `layout`, in tab order.
    pub fn write_workbook(&mut self, layout: &SpecWorkbookLayout) -> Result<(), BuildError> {
        for sheet in &layout.sheets {
            self.write_sheet(sheet)?;
        }
        Ok(())
    }

    /// Write one sheet: cells, conditional formats, column widths, visibility.
    pub fn write_sheet(&mut self, sheet: &SpecSheetLayout) -> Result<(), BuildError> {
        if self.if_closed {
            return Err(BuildError::Closed);
        }

        let dict_formats = &self.dict_formats;
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet.sheet_name)?;

        let mut dict_width_by_col: BTreeMap<ColNum, usize> = BTreeMap::new();
        for ((row, col), cell) in &sheet.cells {
            let format = cell.fmt.and_then(|fmt_key| dict_formats.get(&fmt_key));
            write_cell_with_format(worksheet, *row, *col, &cell.value, format)?;

            let n_width = estimate_width_len(&cell.value);
            let n_width_recorded = dict_width_by_col.entry(*col).or_insert(0);
            *n_width_recorded = usize::max(*n_width_recorded, n_width);
        }

        for spec in &sheet.conditional_formats {
            let mut conditional_format =
                ConditionalFormatFormula::new().set_rule(Formula::new(spec.rule.as_str()));
            if let Some(format) = dict_formats.get(&spec.fmt) {
                conditional_format = conditional_format.set_format(format.clone());
            }
            worksheet.add_conditional_format(
                spec.row_first,
                spec.col,
                spec.row_last,
                spec.col,
                &conditional_format,
            )?;
        }

        if self.policy_autofit.if_enabled {
            let n_min = self.policy_autofit.width_cell_min;
            let n_max = usize::min(255, usize::max(n_min, self.policy_autofit.width_cell_max));
            let n_pad = self.policy_autofit.width_cell_padding;
            for (col, n_width_recorded) in dict_width_by_col {
                let n_width_final = usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
                worksheet.set_column_width(col, n_width_final as f64)?;
            }
        }

        if sheet.if_hidden {
            worksheet.set_hidden(true);
        }
        Ok(())
    }
}

/// Render `layout` to `path_file_out` in one pass.
pub fn write_workbook_file(
    path_file_out: &Path,
    layout: &SpecWorkbookLayout,
    options: &SpecBuildOptions,
) -> Result<(), BuildError> {
    let mut writer = XlsxWriter::new(path_file_out, options);
    writer.write_workbook(layout)?;
    writer.close()?;
    log::info!("wrote {}", writer.file_out().display());
    Ok(())
}

/// Display width used by autofit inference. Formulas are not measured.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => format!("{n:.2}").len(),
        EnumCellValue::Formula(_) => 0,
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row: u32,
    col: ColNum,
    value: &EnumCellValue,
    format: Option<&Format>,
) -> Result<(), BuildError> {
    match (value, format) {
        (EnumCellValue::String(s), Some(fmt)) => {
            worksheet.write_string_with_format(row, col, s, fmt)?;
        }
        (EnumCellValue::String(s), None) => {
            worksheet.write_string(row, col, s)?;
        }
        (EnumCellValue::Number(n), Some(fmt)) => {
            worksheet.write_number_with_format(row, col, *n, fmt)?;
        }
        (EnumCellValue::Number(n), None) => {
            worksheet.write_number(row, col, *n)?;
        }
        (EnumCellValue::Formula(f), Some(fmt)) => {
            worksheet.write_formula_with_format(row, col, Formula::new(f.as_str()), fmt)?;
        }
        (EnumCellValue::Formula(f), None) => {
            worksheet.write_formula(row, col, Formula::new(f.as_str()))?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::EnumFmtKey;
    use crate::spec::{SpecCell, SpecConditionalFormat};

    fn derive_layout() -> SpecWorkbookLayout {
        let mut sheet = SpecSheetLayout::new("run_a");
        sheet.cells.insert(
            (0, 0),
            SpecCell {
                value: EnumCellValue::String("runs/a/geninfo.json".to_string()),
                fmt: Some(EnumFmtKey::Title),
            },
        );
        sheet.cells.insert(
            (1, 1),
            SpecCell {
                value: EnumCellValue::Number(2.5),
                fmt: Some(EnumFmtKey::TwoDecimal),
            },
        );
        sheet.cells.insert(
            (1, 2),
            SpecCell {
                value: EnumCellValue::Formula("B2*2".to_string()),
                fmt: None,
            },
        );
        sheet.conditional_formats.push(SpecConditionalFormat {
            row_first: 1,
            row_last: 1,
            col: 1,
            rule: "B2>1".to_string(),
            fmt: EnumFmtKey::Danger,
        });

        let mut summary = SpecSheetLayout::new("summary");
        summary.if_hidden = true;
        SpecWorkbookLayout {
            sheets: vec![sheet, summary],
        }
    }

    #[test]
    fn write_workbook_creates_file_and_close_is_idempotent() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("stats.xlsx");
        let options = SpecBuildOptions::default();

        let mut writer = XlsxWriter::new(&path_out, &options);
        writer.write_workbook(&derive_layout()).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        assert_eq!(writer.file_out(), path_out.as_path());
        assert!(path_out.metadata().unwrap().len() > 0);
    }

    #[test]
    fn write_after_close_fails() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let options = SpecBuildOptions::default();
        let mut writer = XlsxWriter::new(dir_tmp.path().join("out.xlsx"), &options);
        writer.close().unwrap();

        let err = writer
            .write_sheet(&SpecSheetLayout::new("late"))
            .unwrap_err();
        assert!(matches!(err, BuildError::Closed));
    }

    #[test]
    fn estimate_width_len_by_value_kind() {
        assert_eq!(estimate_width_len(&EnumCellValue::String("abc".into())), 3);
        assert_eq!(estimate_width_len(&EnumCellValue::Number(12.0)), 5);
        assert_eq!(estimate_width_len(&EnumCellValue::Formula("SUM(A1:A9)".into())), 0);
    }
}
