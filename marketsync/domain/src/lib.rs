pub mod bar;
pub mod calendar;
pub mod date_range;
pub mod frequency;
pub mod gap;
pub mod sync_status;

pub use bar::{check_bar, Bar, ValidationIssue};
pub use calendar::{CalendarDay, CalendarPlan, YearRange};
pub use date_range::{DateRange, DateRangeError};
pub use frequency::{Frequency, FrequencyParseError};
pub use gap::{merge_missing, Gap, GapKind, GapSeverity};
pub use sync_status::{SyncState, SyncStatus};
