//! Build orchestration: input files in, one workbook out.

use std::path::Path;

use crate::cursor::SheetCursor;
use crate::layout::layout_document;
use crate::profile::ProfileDocument;
use crate::report::{ReportBuild, ReportBuildBuilder};
use crate::spec::{BuildError, SpecBuildOptions, SpecSheetLayout, SpecWorkbookLayout};
use crate::summary::SummarySheet;
use crate::util::{SheetNameRegistry, derive_sheet_name_base};
use crate::writer::write_workbook_file;

/// Collects one sheet per input document, then the summary sheet.
///
/// Files are laid out in the order they are added.
#[derive(Debug)]
pub struct ReportBuilder {
    options: SpecBuildOptions,
    registry: SheetNameRegistry,
    summary: SummarySheet,
    l_sheets: Vec<SpecSheetLayout>,
    report: ReportBuildBuilder,
}

impl ReportBuilder {
    /// Create a builder; the summary sheet name is reserved up front.
    pub fn new(options: SpecBuildOptions) -> Self {
        let mut registry = SheetNameRegistry::new();
        registry.try_claim(&options.summary_sheet_name);
        let summary = SummarySheet::new(&options.summary_sheet_name);
        Self {
            options,
            registry,
            summary,
            l_sheets: Vec::new(),
            report: ReportBuildBuilder::default(),
        }
    }

    /// Read, parse and lay out one input file.
    ///
    /// Unreadable or unparsable files are logged and skipped (`Ok(None)`).
    pub fn add_file(&mut self, path: &Path) -> Result<Option<String>, BuildError> {
        self.report.add_file();
        match ProfileDocument::from_path(path) {
            Ok(doc) => self.add_document(path, &doc).map(Some),
            Err(err) => {
                self.warn(format!("{}: {err}", path.display()));
                self.report.add_skipped();
                Ok(None)
            }
        }
    }

    /// Lay out an already parsed document read from `path`.
    ///
    /// Returns the claimed sheet name.
    pub fn add_document(
        &mut self,
        path: &Path,
        doc: &ProfileDocument,
    ) -> Result<String, BuildError> {
        let c_file_label = path.to_string_lossy().to_string();
        if doc.tool_tag().is_none() {
            self.warn(format!("{c_file_label}: unknown tool"));
        }
        let tool = doc.tool();

        let c_base_name = derive_sheet_name_base(path, tool.tag());
        let sheet_name = self.registry.claim_unique(&c_base_name)?;
        log::info!("{c_file_label}: {} -> sheet '{sheet_name}'", tool.tag());

        let mut cursor = SheetCursor::new(sheet_name.clone(), c_file_label);
        let anchors = layout_document(&mut cursor, doc, &self.options);
        let (layout, warnings) = cursor.finish();

        self.report.extend_warnings(warnings);
        self.report.add_sheet(sheet_name.clone());
        self.l_sheets.push(layout);
        if let Some(anchors) = anchors {
            self.summary.add_entry(&sheet_name, &anchors);
        }
        Ok(sheet_name)
    }

    /// Append the summary sheet and return the workbook layout with its report.
    pub fn finish(mut self) -> (SpecWorkbookLayout, ReportBuild) {
        log::debug!("summary entries: {}", self.summary.n_entries());
        if let Some(layout) = self.summary.finish(self.options.ratio_outlier_floor) {
            self.report.add_sheet(layout.sheet_name.clone());
            self.l_sheets.push(layout);
        }
        (
            SpecWorkbookLayout {
                sheets: self.l_sheets,
            },
            self.report.build(),
        )
    }

    fn warn(&mut self, msg: String) {
        log::warn!("{msg}");
        self.report.add_warning(msg);
    }
}

/// Build `path_file_out` from `files` with default options.
pub fn build<P: AsRef<Path>>(path_file_out: &Path, files: &[P]) -> Result<ReportBuild, BuildError> {
    build_with_options(path_file_out, files, &SpecBuildOptions::default())
}

/// Build `path_file_out` from `files`.
///
/// Per-file problems are reported, not returned; only sheet-name exhaustion
/// and workbook write failures abort the run.
pub fn build_with_options<P: AsRef<Path>>(
    path_file_out: &Path,
    files: &[P],
    options: &SpecBuildOptions,
) -> Result<ReportBuild, BuildError> {
    let mut builder = ReportBuilder::new(options.clone());
    for path in files {
        builder.add_file(path.as_ref())?;
    }
    let (layout, report) = builder.finish();

    write_workbook_file(path_file_out, &layout, options)?;
    Ok(report)
}
