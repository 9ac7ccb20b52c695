pub mod error;
pub mod config;
pub mod schema;
pub mod document;
pub mod storage;
pub mod store;
pub mod calendar;
pub mod financials;
pub mod progress;
pub mod summary;
pub mod autosave;
pub mod session;

pub use config::{FlushPolicy, PlannerConfig};
pub use document::Document;
pub use error::{PlannerError, Result};
pub use schema::{CalendarField, DocPath, FinancialField, Namespace};
pub use session::PlannerSession;
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage, StorageBackend};
pub use store::PlannerStore;
