//! Daily classification of a user's habits

use crate::{CivilDate, Habit};

/// How a day scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayClass {
    /// Every active habit completed
    Full,

    /// Some but not all active habits completed ("ember")
    Partial,

    /// No active habit completed
    None,
}

/// Completion figures for a day with at least one active habit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyProgress {
    /// Completion percentage, 0..=100
    pub percentage: u8,

    /// Active habits completed on the day
    pub completed: usize,

    /// Active habits on the day
    pub total: usize,

    /// Resulting classification
    pub class: DayClass,
}

/// Result of classifying a day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No habit was active: the day neither advances nor breaks a streak
    RestDay,

    /// At least one habit was active
    Scored(DailyProgress),
}

/// Classify `day` from the user's full habit list
///
/// Finished habits and habits not scheduled on `day`'s weekday are ignored.
/// The class is decided from the counts; the percentage is rounded half-up
/// and kept within 1..=99 for partial days so it never reads as 0% or 100%
/// while the class says otherwise.
///
/// # Examples
///
/// ```
/// use kindle_domain::{classify, Classification, CivilDate};
///
/// let day = CivilDate::from_ymd(2024, 1, 6).unwrap();
/// assert_eq!(classify(&[], day), Classification::RestDay);
/// ```
pub fn classify(habits: &[Habit], day: CivilDate) -> Classification {
    let active: Vec<&Habit> = habits.iter().filter(|h| h.is_active_on(day)).collect();
    if active.is_empty() {
        return Classification::RestDay;
    }

    let total = active.len();
    let completed = active.iter().filter(|h| h.is_completed_on(day)).count();

    let class = if completed == total {
        DayClass::Full
    } else if completed == 0 {
        DayClass::None
    } else {
        DayClass::Partial
    };

    let rounded = (200 * completed + total) / (2 * total);
    let percentage = match class {
        DayClass::Full => 100,
        DayClass::None => 0,
        DayClass::Partial => rounded.clamp(1, 99),
    } as u8;

    Classification::Scored(DailyProgress {
        percentage,
        completed,
        total,
        class,
    })
}
