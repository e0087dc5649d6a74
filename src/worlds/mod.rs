pub mod error;
mod layout;
pub mod mapper;
pub mod reader;
pub mod scratch;
mod service;
pub mod writer;

pub use error::{FailureCategory, WorldError};
pub use layout::{
    package_file_name, EntryRole, PackKind, IDENTITY_FILE, PACKAGE_EXTENSION, WORLDS_DIR,
};
pub use mapper::{Direction, ImportReport};
pub use reader::ExtractedPackage;
pub use scratch::{ScratchDir, ScratchSpace};
pub use service::{ExportOutcome, ImportOutcome, WorldService};
pub use writer::PackageSummary;
