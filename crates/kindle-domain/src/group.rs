//! Group ("squad") module
//!
//! A group keeps its own streak, independent of its members' personal
//! streaks: no freezes, no partial days. The group streak grows by one on
//! each day every linked member completes their linked habit, and lapses to
//! zero once the last such day is older than yesterday.

use crate::{CivilDate, GroupId, HabitId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The group's streak state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStreak {
    /// Consecutive days every linked member completed
    pub group_streak: u32,

    /// Last day the whole group completed
    #[serde(rename = "lastCompletedDateIST")]
    pub last_completed_date_ist: Option<CivilDate>,
}

impl GroupStreak {
    /// Advance the state machine for `today`. Returns true if anything changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use kindle_domain::{CivilDate, GroupStreak};
    ///
    /// let day = CivilDate::from_ymd(2024, 1, 6).unwrap();
    /// let mut streak = GroupStreak::default();
    /// assert!(streak.refresh(day, true));
    /// assert!(!streak.refresh(day, true));
    /// assert_eq!(streak.group_streak, 1);
    /// ```
    pub fn refresh(&mut self, today: CivilDate, all_members_done: bool) -> bool {
        let before = *self;

        if let Some(last) = self.last_completed_date_ist {
            if last < today.pred() {
                self.group_streak = 0;
            }
        }

        if all_members_done && self.last_completed_date_ist != Some(today) {
            self.group_streak += 1;
            self.last_completed_date_ist = Some(today);
        }

        *self != before
    }
}

/// A member of a group and the habit that feeds the group streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    /// Member user
    pub user_id: UserId,

    /// The member's linked habit, if any
    pub habit_id: Option<HabitId>,
}

/// A group of users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Unique identifier
    pub id: GroupId,

    /// Display name
    pub name: String,

    /// Members in join order
    pub members: Vec<GroupMember>,

    /// The group streak
    #[serde(flatten)]
    pub streak: GroupStreak,

    /// When the group was created
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Create a group whose first member is `owner`
    pub fn new(name: String, owner: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: GroupId::new(),
            name,
            members: vec![GroupMember {
                user_id: owner,
                habit_id: None,
            }],
            streak: GroupStreak::default(),
            created_at,
        }
    }

    /// Whether `user` belongs to the group
    pub fn is_member(&self, user: UserId) -> bool {
        self.members.iter().any(|m| m.user_id == user)
    }

    /// Add `user` without a linked habit. Returns false if already a member.
    pub fn add_member(&mut self, user: UserId) -> bool {
        if self.is_member(user) {
            return false;
        }
        self.members.push(GroupMember {
            user_id: user,
            habit_id: None,
        });
        true
    }

    /// Link `habit` as `user`'s contribution. Returns false if `user` is not a member.
    pub fn link_habit(&mut self, user: UserId, habit: HabitId) -> bool {
        match self.members.iter_mut().find(|m| m.user_id == user) {
            Some(member) => {
                member.habit_id = Some(habit);
                true
            }
            None => false,
        }
    }

    /// Drop every link to `habit`. Returns how many links were removed.
    pub fn unlink_habit(&mut self, habit: HabitId) -> usize {
        let mut removed = 0;
        for member in self.members.iter_mut().filter(|m| m.habit_id == Some(habit)) {
            member.habit_id = None;
            removed += 1;
        }
        removed
    }

    /// The habit `user` currently contributes, if any
    pub fn linked_habit_of(&self, user: UserId) -> Option<HabitId> {
        self.members
            .iter()
            .find(|m| m.user_id == user)
            .and_then(|m| m.habit_id)
    }

    /// Linked habits in member order
    pub fn linked_habits(&self) -> Vec<HabitId> {
        self.members.iter().filter_map(|m| m.habit_id).collect()
    }
}
