//! Habit module - a user's habit and its completion ledger

use crate::{CivilDate, DomainError, GroupId, HabitId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether a habit is something to do or something to stop doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitKind {
    /// A habit the user wants to build
    Build,

    /// A habit the user wants to break
    Break,
}

impl HabitKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitKind::Build => "build",
            HabitKind::Break => "break",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "build" => Some(HabitKind::Build),
            "break" => Some(HabitKind::Break),
            _ => None,
        }
    }
}

impl std::str::FromStr for HabitKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::UnknownTag {
            kind: "habit kind",
            value: s.to_string(),
        })
    }
}

/// Who can see a habit on the user's profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to friends and groups
    Public,

    /// Visible only to the owner
    Private,
}

impl Visibility {
    /// Get the visibility name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    /// Parse a visibility from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::UnknownTag {
            kind: "visibility",
            value: s.to_string(),
        })
    }
}

/// Input for creating a habit
#[derive(Debug, Clone, PartialEq)]
pub struct NewHabit {
    /// Display name
    pub name: String,

    /// Identity tag ("runner", "reader", ...)
    pub identity: String,

    /// Build or break
    pub kind: HabitKind,

    /// Numeric goal shown alongside the habit
    pub goal: u32,

    /// Weekdays (1=Mon..7=Sun) the habit is scheduled on; empty means every day
    pub active_days: Vec<u8>,

    /// Number of completions after which the habit is finished
    pub duration_target: Option<u32>,

    /// Profile visibility
    pub visibility: Visibility,
}

impl NewHabit {
    /// A public build habit scheduled every day with no duration target
    pub fn daily(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: String::new(),
            kind: HabitKind::Build,
            goal: 1,
            active_days: Vec::new(),
            duration_target: None,
            visibility: Visibility::Public,
        }
    }
}

/// Partial update of a habit's editable fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitPatch {
    /// New name
    pub name: Option<String>,
    /// New identity tag
    pub identity: Option<String>,
    /// New goal
    pub goal: Option<u32>,
    /// New schedule; empty means every day
    pub active_days: Option<Vec<u8>>,
    /// New duration target; `Some(None)` clears it
    pub duration_target: Option<Option<u32>>,
    /// New visibility
    pub visibility: Option<Visibility>,
}

/// A habit belonging to exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier
    pub id: HabitId,

    /// Owning user
    pub user_id: UserId,

    /// Display name
    pub name: String,

    /// Identity tag
    pub identity: String,

    /// Build or break
    #[serde(rename = "type")]
    pub kind: HabitKind,

    /// Numeric goal
    pub goal: u32,

    /// Scheduled weekdays, 1=Mon..7=Sun
    pub active_days: BTreeSet<u8>,

    /// Required completion count, not a calendar span
    pub duration_target: Option<u32>,

    /// The completion ledger
    pub completions: BTreeSet<CivilDate>,

    /// Profile visibility
    pub visibility: Visibility,

    /// Group whose streak this habit feeds, if any
    pub group_link: Option<GroupId>,

    /// When the habit was created
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Create a habit from validated input
    pub fn new(user_id: UserId, input: NewHabit, created_at: DateTime<Utc>) -> Result<Self, DomainError> {
        let name = validate_name(&input.name)?;
        let active_days = normalize_days(&input.active_days)?;
        validate_duration_target(input.duration_target)?;

        Ok(Self {
            id: HabitId::new(),
            user_id,
            name,
            identity: input.identity.trim().to_string(),
            kind: input.kind,
            goal: input.goal,
            active_days,
            duration_target: input.duration_target,
            completions: BTreeSet::new(),
            visibility: input.visibility,
            group_link: None,
            created_at,
        })
    }

    /// Apply an edit, validating every changed field before touching any
    pub fn apply_patch(&mut self, patch: HabitPatch) -> Result<(), DomainError> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let active_days = patch.active_days.as_deref().map(normalize_days).transpose()?;
        if let Some(target) = patch.duration_target {
            validate_duration_target(target)?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(identity) = patch.identity {
            self.identity = identity.trim().to_string();
        }
        if let Some(goal) = patch.goal {
            self.goal = goal;
        }
        if let Some(days) = active_days {
            self.active_days = days;
        }
        if let Some(target) = patch.duration_target {
            self.duration_target = target;
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
        Ok(())
    }

    /// Whether the completion count has reached the duration target
    pub fn is_finished(&self) -> bool {
        match self.duration_target {
            Some(target) => self.completions.len() >= target as usize,
            None => false,
        }
    }

    /// Whether the habit is scheduled on the weekday of `day`
    pub fn is_scheduled_on(&self, day: CivilDate) -> bool {
        self.active_days.contains(&day.weekday_number())
    }

    /// Whether the habit counts toward `day`'s classification
    pub fn is_active_on(&self, day: CivilDate) -> bool {
        !self.is_finished() && self.is_scheduled_on(day)
    }

    /// Whether the ledger has an entry for `day`
    pub fn is_completed_on(&self, day: CivilDate) -> bool {
        self.completions.contains(&day)
    }

    /// Flip the ledger entry for `day`, returning whether it is now completed
    pub fn toggle_completion(&mut self, day: CivilDate) -> bool {
        if self.completions.remove(&day) {
            false
        } else {
            self.completions.insert(day);
            true
        }
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidHabit("name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_duration_target(target: Option<u32>) -> Result<(), DomainError> {
    if target == Some(0) {
        return Err(DomainError::InvalidHabit(
            "duration target must be at least 1 completion".to_string(),
        ));
    }
    Ok(())
}

/// Validate weekday numbers; an empty schedule means all seven days
fn normalize_days(days: &[u8]) -> Result<BTreeSet<u8>, DomainError> {
    if days.is_empty() {
        return Ok((1..=7).collect());
    }
    days.iter()
        .map(|&d| {
            if (1..=7).contains(&d) {
                Ok(d)
            } else {
                Err(DomainError::InvalidHabit(format!("weekday {} is outside 1..=7", d)))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CivilDate {
        s.parse().unwrap()
    }

    fn habit(days: Vec<u8>, target: Option<u32>) -> Habit {
        let input = NewHabit {
            active_days: days,
            duration_target: target,
            ..NewHabit::daily("Read")
        };
        Habit::new(UserId::new(), input, Utc::now()).unwrap()
    }

    #[test]
    fn test_empty_schedule_means_every_day() {
        let h = habit(vec![], None);
        assert_eq!(h.active_days.len(), 7);
    }

    #[test]
    fn test_rejects_bad_input() {
        let bad_day = NewHabit { active_days: vec![0, 3], ..NewHabit::daily("Run") };
        assert!(Habit::new(UserId::new(), bad_day, Utc::now()).is_err());

        let blank = NewHabit::daily("   ");
        assert!(Habit::new(UserId::new(), blank, Utc::now()).is_err());

        let zero_target = NewHabit { duration_target: Some(0), ..NewHabit::daily("Run") };
        assert!(Habit::new(UserId::new(), zero_target, Utc::now()).is_err());
    }

    #[test]
    fn test_toggle_completion() {
        let mut h = habit(vec![], None);
        let d = date("2024-01-05");
        assert!(h.toggle_completion(d));
        assert!(h.is_completed_on(d));
        assert!(!h.toggle_completion(d));
        assert!(!h.is_completed_on(d));
    }

    #[test]
    fn test_finished_habit_is_inactive() {
        let mut h = habit(vec![], Some(2));
        h.toggle_completion(date("2024-01-01"));
        assert!(h.is_active_on(date("2024-01-03")));
        h.toggle_completion(date("2024-01-02"));
        assert!(h.is_finished());
        assert!(!h.is_active_on(date("2024-01-03")));
    }

    #[test]
    fn test_schedule_filters_weekdays() {
        // Monday, Wednesday, Friday
        let h = habit(vec![1, 3, 5], None);
        assert!(h.is_active_on(date("2024-01-01")));
        assert!(!h.is_active_on(date("2024-01-02")));
        assert!(!h.is_active_on(date("2024-01-07")));
    }

    #[test]
    fn test_patch_is_all_or_nothing() {
        let mut h = habit(vec![], None);
        let patch = HabitPatch {
            name: Some("Read more".to_string()),
            active_days: Some(vec![9]),
            ..Default::default()
        };
        assert!(h.apply_patch(patch).is_err());
        assert_eq!(h.name, "Read");

        let patch = HabitPatch {
            name: Some("Read more".to_string()),
            duration_target: Some(Some(30)),
            ..Default::default()
        };
        h.apply_patch(patch).unwrap();
        assert_eq!(h.name, "Read more");
        assert_eq!(h.duration_target, Some(30));
    }

    #[test]
    fn test_kind_and_visibility_parse() {
        assert_eq!("BUILD".parse::<HabitKind>().unwrap(), HabitKind::Build);
        assert!("maybe".parse::<HabitKind>().is_err());
        assert_eq!("private".parse::<Visibility>().unwrap(), Visibility::Private);
    }
}
