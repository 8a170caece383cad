use std::fmt;
use std::str::FromStr;

use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High
}

impl Priority {
  /// Display rank, lower sorts first.
  pub fn rank(self) -> u8 {
    match self {
      | Priority::High => 1,
      | Priority::Medium => 2,
      | Priority::Low => 3
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | Priority::Low => "low",
      | Priority::Medium => "medium",
      | Priority::High => "high"
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct ParseValueError {
  pub kind:  &'static str,
  pub value: String
}

impl fmt::Display for ParseValueError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "invalid {}: {}",
      self.kind, self.value
    )
  }
}

impl std::error::Error
  for ParseValueError
{
}

impl FromStr for Priority {
  type Err = ParseValueError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "l" | "low" => Ok(Priority::Low),
      | "m" | "medium" => {
        Ok(Priority::Medium)
      }
      | "h" | "high" => {
        Ok(Priority::High)
      }
      | _ => {
        Err(ParseValueError {
          kind:  "priority",
          value: s.to_string()
        })
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
  #[default]
  All,
  Completed,
  Incomplete
}

impl FilterMode {
  pub const ALL: [FilterMode; 3] = [
    FilterMode::All,
    FilterMode::Completed,
    FilterMode::Incomplete
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | FilterMode::All => "all",
      | FilterMode::Completed => {
        "completed"
      }
      | FilterMode::Incomplete => {
        "incomplete"
      }
    }
  }

  pub fn admits(
    self,
    completed: bool
  ) -> bool {
    match self {
      | FilterMode::All => true,
      | FilterMode::Completed => {
        completed
      }
      | FilterMode::Incomplete => {
        !completed
      }
    }
  }
}

impl fmt::Display for FilterMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Accepts the full name or any unique
/// prefix of it.
impl FromStr for FilterMode {
  type Err = ParseValueError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let needle =
      s.trim().to_ascii_lowercase();
    let mut matches = Self::ALL
      .into_iter()
      .filter(|mode| {
        !needle.is_empty()
          && mode
            .as_str()
            .starts_with(&needle)
      });

    match (
      matches.next(),
      matches.next()
    ) {
      | (Some(mode), None) => Ok(mode),
      | _ => {
        Err(ParseValueError {
          kind:  "filter",
          value: s.to_string()
        })
      }
    }
  }
}

/// A raw user intent handed to the
/// engine by the presentation layer.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(
  tag = "type",
  rename_all = "snake_case"
)]
pub enum Intent {
  Add {
    text: String
  },
  Toggle {
    id: u64
  },
  Delete {
    id: u64
  },
  SetPriority {
    id:       u64,
    priority: Priority
  },
  Rename {
    id:   u64,
    text: String
  },
  ToggleMultiSelect,
  Select {
    id: u64
  },
  BulkDelete,
  BulkComplete,
  BulkUncomplete,
  SetFilter {
    mode: FilterMode
  },
  SetEditing {
    id: Option<u64>
  },
  DragStart {
    id: u64
  },
  DragEnter {
    id: u64
  },
  DragLeave {
    id: u64
  },
  Drop {
    id: u64
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TaskDto {
  pub id:        u64,
  pub text:      String,
  pub completed: bool,
  pub priority:  Priority
}

/// Everything the presentation layer
/// needs to draw one frame.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct BoardView {
  pub tasks:        Vec<TaskDto>,
  pub filter:       FilterMode,
  pub multi_select: bool,
  pub selected:     Vec<u64>,
  pub dragged:      Option<u64>,
  pub hovered:      Option<u64>,
  pub editing:      Option<u64>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub warning:      Option<String>
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn priority_parses_names_and_letters()
  {
    assert_eq!(
      "High".parse::<Priority>(),
      Ok(Priority::High)
    );
    assert_eq!(
      "m".parse::<Priority>(),
      Ok(Priority::Medium)
    );
    assert_eq!(
      " low ".parse::<Priority>(),
      Ok(Priority::Low)
    );
    assert!(
      "urgent"
        .parse::<Priority>()
        .is_err()
    );
  }

  #[test]
  fn priority_rank_orders_high_first() {
    assert_eq!(Priority::High.rank(), 1);
    assert_eq!(
      Priority::Medium.rank(),
      2
    );
    assert_eq!(Priority::Low.rank(), 3);
    assert_eq!(
      Priority::default(),
      Priority::Medium
    );
  }

  #[test]
  fn filter_mode_accepts_unique_prefixes()
  {
    assert_eq!(
      "comp".parse::<FilterMode>(),
      Ok(FilterMode::Completed)
    );
    assert_eq!(
      "i".parse::<FilterMode>(),
      Ok(FilterMode::Incomplete)
    );
    assert_eq!(
      "ALL".parse::<FilterMode>(),
      Ok(FilterMode::All)
    );
    assert!(
      "".parse::<FilterMode>().is_err()
    );
    assert!(
      "done"
        .parse::<FilterMode>()
        .is_err()
    );
  }

  #[test]
  fn filter_mode_admits_by_completion() {
    assert!(FilterMode::All.admits(true));
    assert!(
      FilterMode::All.admits(false)
    );
    assert!(
      FilterMode::Completed.admits(true)
    );
    assert!(
      !FilterMode::Completed
        .admits(false)
    );
    assert!(
      FilterMode::Incomplete
        .admits(false)
    );
    assert!(
      !FilterMode::Incomplete
        .admits(true)
    );
  }

  #[test]
  fn intents_use_tagged_snake_case_json()
  {
    let intent: Intent =
      serde_json::from_str(
        r#"{"type":"set_priority","id":7,"priority":"high"}"#
      )
      .expect("parse intent");
    assert_eq!(
      intent,
      Intent::SetPriority {
        id:       7,
        priority: Priority::High
      }
    );

    let bulk: Intent =
      serde_json::from_str(
        r#"{"type":"bulk_complete"}"#
      )
      .expect("parse unit intent");
    assert_eq!(
      bulk,
      Intent::BulkComplete
    );

    let editing: Intent =
      serde_json::from_str(
        r#"{"type":"set_editing","id":null}"#
      )
      .expect("parse editing intent");
    assert_eq!(
      editing,
      Intent::SetEditing {
        id: None
      }
    );
  }

  #[test]
  fn board_view_omits_absent_warning() {
    let json = serde_json::to_string(
      &BoardView::default()
    )
    .expect("serialize view");
    assert!(!json.contains("warning"));
    assert!(
      json.contains(r#""filter":"all""#)
    );
  }
}
