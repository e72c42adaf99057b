//! Command implementations.

pub mod admin;
pub mod freeze;
pub mod group;
pub mod habit;
pub mod stats;
pub mod streak;
pub mod user;

pub use self::admin::execute_admin;
pub use self::freeze::execute_freeze;
pub use self::group::execute_group;
pub use self::habit::execute_habit;
pub use self::stats::execute_stats;
pub use self::streak::execute_streak;
pub use self::user::execute_user;

use crate::error::Result;
use kindle_domain::{CivilDate, GroupId, HabitId};

/// Parse an optional `YYYY-MM-DD` argument.
pub(crate) fn parse_date(date: Option<&str>) -> Result<Option<CivilDate>> {
    Ok(date.map(str::parse::<CivilDate>).transpose()?)
}

pub(crate) fn parse_habit(id: &str) -> Result<HabitId> {
    Ok(id.parse()?)
}

pub(crate) fn parse_group(id: &str) -> Result<GroupId> {
    Ok(id.parse()?)
}
