//! Unit status reported back to the host framework.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum UnitStatus {
    Maintenance(String),
    Waiting(String),
    Blocked(String),
    Active,
}

impl UnitStatus {
    pub fn name(&self) -> &'static str {
        match self {
            UnitStatus::Maintenance(_) => "maintenance",
            UnitStatus::Waiting(_) => "waiting",
            UnitStatus::Blocked(_) => "blocked",
            UnitStatus::Active => "active",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UnitStatus::Maintenance(msg)
            | UnitStatus::Waiting(msg)
            | UnitStatus::Blocked(msg) => msg.as_str(),
            UnitStatus::Active => "",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            "" => f.write_str(self.name()),
            msg => write!(f, "{}: {}", self.name(), msg),
        }
    }
}
