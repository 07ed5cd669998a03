//! Task service over the Markdown store: day resolution, read-modify-write
//! operations, weekly plans and history.

pub mod clock;
pub mod error;
pub mod lock;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ServiceError;
pub use service::{HistoryDay, TaskService, TaskUpdate, TodayView, WeeklyPlan};
