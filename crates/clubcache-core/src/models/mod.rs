//! Club data models.
//!
//! Each module pairs the raw row shape returned by the data service (with
//! its embedded joins) and the shaped result the query wrappers cache:
//!
//! - `PlayerWithCategory`: roster entry with category name and age
//! - `SessionWithStats`: training session with attendance counts and rate
//! - `ClubEvent`: calendar event with category name
//! - `StaffWithCategories`: staff member with the categories they coach
//! - `CategoryWithCount`: category with member counts
//! - `DashboardStats`: aggregate counters for the dashboard

pub mod category;
pub mod dashboard;
pub mod event;
pub mod player;
pub mod session;
pub mod staff;

pub use category::{CategoryMemberRow, CategoryRef, CategoryRow, CategoryWithCount};
pub use dashboard::DashboardStats;
pub use event::{ClubEvent, EventRow};
pub use player::{PlayerRow, PlayerWithCategory};
pub use session::{AttendanceRow, AttendanceStats, AttendanceStatus, SessionRow, SessionWithStats};
pub use staff::{StaffCategoryLink, StaffRow, StaffWithCategories};

fn default_true() -> bool {
    true
}
