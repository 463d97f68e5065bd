//! Lead import services
//!
//! - CSV parsing and the downloadable template
//! - Per-row validation
//! - Batched persistence through the [`LeadStore`] seam
//! - Session orchestration

pub mod batch_importer;
pub mod csv_parser;
pub mod row_validator;
pub mod session_manager;

pub use batch_importer::{BatchImporter, LeadStore, NoopObserver, ProgressObserver, DEFAULT_BATCH_SIZE};
pub use csv_parser::{parse_csv, ParsedFile, LEADS_TEMPLATE, TEMPLATE_FILE_NAME};
pub use session_manager::SessionManager;
