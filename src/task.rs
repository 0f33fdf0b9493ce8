use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Name stored in the `priority` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Priority",
            Self::Medium => "Medium Priority",
            Self::High => "High Priority",
        }
    }

    /// Next value in picker order, wrapping around.
    pub const fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(Error::UnknownPriority(s.to_string())),
        }
    }
}

/// Identity of a task as seen by the board.
///
/// Rows coming from the store carry their database id. Tasks added
/// optimistically get a provisional id that only lives until the next
/// snapshot replaces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Stored(i64),
    Provisional(u64),
}

impl TaskId {
    pub const fn stored(self) -> Option<i64> {
        match self {
            Self::Stored(id) => Some(id),
            Self::Provisional(_) => None,
        }
    }

    pub const fn is_provisional(self) -> bool {
        matches!(self, Self::Provisional(_))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored(id) => write!(f, "#{id}"),
            Self::Provisional(seq) => write!(f, "~{seq}"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub task: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
    High,
    Medium,
    Low,
}

impl Filter {
    /// Selector order.
    pub const ALL: [Filter; 6] = [
        Filter::All,
        Filter::Active,
        Filter::Completed,
        Filter::High,
        Filter::Medium,
        Filter::Low,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Done",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
            Self::High => task.priority == Priority::High,
            Self::Medium => task.priority == Priority::Medium,
            Self::Low => task.priority == Priority::Low,
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn cycle(self, step: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let index = (self.index() as isize + step).rem_euclid(len) as usize;
        Self::ALL[index]
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(Error::UnknownFilter(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn task(completed: bool, priority: Priority) -> Task {
        Task {
            id: TaskId::Stored(1),
            task: "write report".to_string(),
            completed,
            priority,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("low", Priority::Low)]
    #[case("Medium", Priority::Medium)]
    #[case(" HIGH ", Priority::High)]
    fn parses_priority(#[case] input: &str, #[case] expected: Priority) {
        assert_eq!(input.parse::<Priority>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_priority() {
        assert!(matches!(
            "urgent".parse::<Priority>(),
            Err(Error::UnknownPriority(value)) if value == "urgent"
        ));
    }

    #[test]
    fn default_priority_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn priority_cycles_through_all_values() {
        assert_eq!(Priority::Low.next(), Priority::Medium);
        assert_eq!(Priority::Medium.next(), Priority::High);
        assert_eq!(Priority::High.next(), Priority::Low);
    }

    #[rstest]
    #[case("done", Filter::Completed)]
    #[case("completed", Filter::Completed)]
    #[case("active", Filter::Active)]
    #[case("all", Filter::All)]
    fn parses_filter(#[case] input: &str, #[case] expected: Filter) {
        assert_eq!(input.parse::<Filter>().unwrap(), expected);
    }

    #[test]
    fn filter_cycle_wraps() {
        assert_eq!(Filter::All.cycle(-1), Filter::Low);
        assert_eq!(Filter::Low.cycle(1), Filter::All);
        assert_eq!(Filter::Active.cycle(2), Filter::High);
    }

    #[test]
    fn stored_ids_serialize_as_plain_numbers() {
        let json = serde_json::to_value(TaskId::Stored(42)).unwrap();
        assert_eq!(json, serde_json::json!(42));
    }

    fn any_priority() -> impl Strategy<Value = Priority> {
        prop_oneof![
            Just(Priority::Low),
            Just(Priority::Medium),
            Just(Priority::High)
        ]
    }

    proptest! {
        #[test]
        fn status_filters_partition_all(completed in any::<bool>(), priority in any_priority()) {
            let task = task(completed, priority);
            prop_assert!(Filter::All.matches(&task));
            prop_assert!(Filter::Active.matches(&task) != Filter::Completed.matches(&task));
        }

        #[test]
        fn each_task_has_exactly_one_priority_filter(completed in any::<bool>(), priority in any_priority()) {
            let task = task(completed, priority);
            let hits = [Filter::High, Filter::Medium, Filter::Low]
                .into_iter()
                .filter(|f| f.matches(&task))
                .count();
            prop_assert_eq!(hits, 1);
        }
    }
}
