pub mod path;
pub mod types;

pub use path::DocPath;
pub use types::{CalendarField, FieldKind, FinancialField, Namespace, Root};
