pub mod memory;
pub mod weekday;

pub use memory::InMemoryCalendarRepository;
pub use weekday::{WeekdayCalendar, WeekdayCalendarFeed};
