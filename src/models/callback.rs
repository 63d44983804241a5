//! Inline button payloads

use std::fmt;
use std::str::FromStr;

/// Action encoded in an inline button's callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// "I've joined": re-run the membership check
    CheckJoin,
    /// Reminder "Paid": delete the debt; `created_at` guards against renumbered ids
    Paid { debt_id: u32, created_at: i64 },
    /// Reminder "Snooze": push the reminder back; `created_at` guards like `Paid`
    Snooze { debt_id: u32, created_at: i64 },
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::CheckJoin => write!(f, "check_join"),
            CallbackAction::Paid { debt_id, created_at } => write!(f, "paid:{}:{}", debt_id, created_at),
            CallbackAction::Snooze { debt_id, created_at } => write!(f, "snooze:{}:{}", debt_id, created_at),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = String;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = data.split(':').collect();
        let number = |index: usize| -> Result<i64, String> {
            parts
                .get(index)
                .and_then(|p| p.parse::<i64>().ok())
                .ok_or_else(|| format!("bad callback data: {}", data))
        };
        let debt_id = |index: usize| -> Result<u32, String> {
            u32::try_from(number(index)?).map_err(|_| format!("bad debt id in: {}", data))
        };

        match parts.as_slice() {
            ["check_join"] => Ok(CallbackAction::CheckJoin),
            ["paid", _, _] => Ok(CallbackAction::Paid {
                debt_id: debt_id(1)?,
                created_at: number(2)?,
            }),
            ["snooze", _, _] => Ok(CallbackAction::Snooze {
                debt_id: debt_id(1)?,
                created_at: number(2)?,
            }),
            _ => Err(format!("unknown callback data: {}", data)),
        }
    }
}
