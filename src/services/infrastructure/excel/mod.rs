pub mod excel_exporter;
pub mod excel_importer;

pub use excel_exporter::*;
pub use excel_importer::*;
