//! `profkit_xlsx` v1:
//! Coverage-toolchain profile to XLSX kernel.
//!
//! Module layout:
//! - `conf`    : constants, schema key tables and default presets
//! - `spec`    : layout models, options and errors
//! - `util`    : sheet naming, A1 references and path helpers
//! - `profile` : JSON profile document and tool dispatch
//! - `cursor`  : append-only sheet cursor
//! - `stats`   : column statistics and outlier rules
//! - `layout`  : per-tool sheet layouts
//! - `summary` : cross-file summary sheet
//! - `writer`  : `rust_xlsxwriter` rendering kernel
//! - `build`   : orchestration over input files
//! - `report`  : run-time report model
pub mod build;
pub mod conf;
pub mod cursor;
pub mod layout;
pub mod profile;
pub mod report;
pub mod spec;
pub mod stats;
pub mod summary;
pub mod util;
pub mod writer;

#[cfg(test)]
mod testutil;

pub use build::{ReportBuilder, build, build_with_options};
pub use conf::{C_SHEET_NAME_SUMMARY, EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
pub use profile::{EnumProfileTool, ProfileDocument};
pub use report::{ReportBuild, ReportBuildBuilder};
pub use spec::{
    BuildError, EnumCellValue, ProfileError, SpecAutofitCellsPolicy, SpecBuildOptions,
    SpecCellFormat, SpecSheetLayout, SpecWorkbookLayout,
};
pub use util::sanitize_sheet_name;
pub use writer::XlsxWriter;
