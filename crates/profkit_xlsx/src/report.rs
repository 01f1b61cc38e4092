//! Build report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one workbook build.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReportBuild {
    /// Input files seen.
    pub cnt_files: u64,
    /// Worksheets laid out, summary included.
    pub cnt_sheets: u64,
    /// Input files skipped because they could not be read or parsed.
    pub cnt_skipped: u64,
    /// Diagnostics in emission order.
    pub warnings: Vec<String>,
    /// Worksheet names in tab order.
    pub sheet_names: Vec<String>,
}

impl ReportBuild {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_files".to_string(), self.cnt_files);
        dict_counts.insert("cnt_sheets".to_string(), self.cnt_sheets);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} files={} sheets={} skipped={} warnings={}",
            dict_counts["cnt_files"],
            dict_counts["cnt_sheets"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[XLSX]"))
    }
}

/// Mutable accumulator for build statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportBuildBuilder {
    /// See [`ReportBuild::cnt_files`].
    pub cnt_files: u64,
    /// See [`ReportBuild::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportBuild::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportBuild::sheet_names`].
    pub sheet_names: Vec<String>,
}

impl ReportBuildBuilder {
    /// Increment seen-file count by one.
    pub fn add_file(&mut self) {
        self.cnt_files += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add warning messages.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    /// Record a laid-out sheet.
    pub fn add_sheet(&mut self, sheet_name: String) {
        self.sheet_names.push(sheet_name);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportBuild {
        ReportBuild {
            cnt_files: self.cnt_files,
            cnt_sheets: self.sheet_names.len() as u64,
            cnt_skipped: self.cnt_skipped,
            warnings: self.warnings,
            sheet_names: self.sheet_names,
        }
    }
}
