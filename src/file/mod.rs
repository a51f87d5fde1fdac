//! Folder and file management: repositories, blob storage, and the
//! service tying them together.

pub mod folder;
pub mod record;
pub mod service;
pub mod storage;

pub use folder::{Folder, FolderRepository, FolderUpdate, NewFolder};
pub use record::{FileRecord, FileRepository, NewFileRecord};
pub use service::{DeleteOutcome, LibraryService};
pub use storage::FileStorage;
