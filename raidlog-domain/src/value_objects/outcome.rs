// Raid event outcome value object

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Attached,
    Hit,
    Burned,
    Destroyed,
    NoHit,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Attached => "attached",
            EventOutcome::Hit => "hit",
            EventOutcome::Burned => "burned",
            EventOutcome::Destroyed => "destroyed",
            EventOutcome::NoHit => "no_hit",
        }
    }

    /// Label used when an operator has not configured one.
    pub fn default_label(&self) -> &'static str {
        match self {
            EventOutcome::Attached => "attached to",
            EventOutcome::Hit => "hit",
            EventOutcome::Burned => "burnt",
            EventOutcome::Destroyed => "destroyed",
            EventOutcome::NoHit => "no hit",
        }
    }

    pub fn all() -> [EventOutcome; 5] {
        [
            EventOutcome::Attached,
            EventOutcome::Hit,
            EventOutcome::Burned,
            EventOutcome::Destroyed,
            EventOutcome::NoHit,
        ]
    }
}

impl fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
