//! Debt model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use crate::utils::errors::{KapanBayarError, Result};
use crate::utils::helpers::{
    combine_due_moment, parse_amount, parse_due_date, parse_remind_time, DUE_DATE_FORMAT,
    REMIND_TIME_FORMAT,
};

/// Reminder interval a fresh user starts with, in minutes
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// One recorded debt. Dates and times are kept as entered so a hand-edited
/// record with garbage in them only affects that record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: u32,
    pub debtor_name: String,
    pub amount: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub remind_at: Option<String>,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
    /// Host-local moment of the last reminder fire
    #[serde(default)]
    pub last_reminded: Option<NaiveDateTime>,
}

/// Where a debt stands relative to its reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    NoDueDate,
    Pending,
    DueUnfired,
    DueFiredToday,
}

impl DebtRecord {
    /// Combined due moment, `None` when due date or reminder time is unset
    pub fn due_moment(&self) -> Result<Option<NaiveDateTime>> {
        let (Some(date), Some(time)) = (self.due_date.as_deref(), self.remind_at.as_deref()) else {
            return Ok(None);
        };

        let date = parse_due_date(date).ok_or_else(|| {
            KapanBayarError::MalformedRecord(format!("debt {}: bad due date '{}'", self.id, date))
        })?;
        let time = parse_remind_time(time).ok_or_else(|| {
            KapanBayarError::MalformedRecord(format!("debt {}: bad reminder time '{}'", self.id, time))
        })?;

        Ok(Some(combine_due_moment(date, time)))
    }

    /// Whether a reminder already fired on the given calendar day
    pub fn reminded_on(&self, day: NaiveDate) -> bool {
        self.last_reminded.map(|at| at.date() == day).unwrap_or(false)
    }

    /// Classify the debt against the host-local moment `now`
    pub fn reminder_state(&self, now: NaiveDateTime) -> Result<ReminderState> {
        let Some(due) = self.due_moment()? else {
            return Ok(ReminderState::NoDueDate);
        };

        if now < due {
            Ok(ReminderState::Pending)
        } else if self.reminded_on(now.date()) {
            Ok(ReminderState::DueFiredToday)
        } else {
            Ok(ReminderState::DueUnfired)
        }
    }

    pub fn amount_value(&self) -> f64 {
        parse_amount(&self.amount)
    }
}

/// All debts of one owner plus their notification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDebts {
    #[serde(default)]
    pub debts: Vec<DebtRecord>,
    #[serde(default = "default_interval")]
    pub notification_interval: u32,
    #[serde(default)]
    pub is_notification_paused: bool,
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

impl Default for UserDebts {
    fn default() -> Self {
        Self {
            debts: Vec::new(),
            notification_interval: DEFAULT_INTERVAL_MINUTES,
            is_notification_paused: false,
        }
    }
}

impl UserDebts {
    /// Append a debt, assigning the next id in the dense 1..N range
    pub fn push(&mut self, debt: NewDebt, created_at: DateTime<Utc>) -> u32 {
        let id = self.debts.len() as u32 + 1;
        self.debts.push(DebtRecord {
            id,
            debtor_name: debt.debtor_name,
            amount: debt.amount,
            due_date: debt.due_date.map(|d| d.format(DUE_DATE_FORMAT).to_string()),
            remind_at: debt.remind_at.map(|t| t.format(REMIND_TIME_FORMAT).to_string()),
            note: debt.note,
            created_at,
            last_reminded: None,
        });
        id
    }

    /// Remove a debt and renumber the rest densely, keeping relative order
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.debts.len();
        self.debts.retain(|d| d.id != id);
        self.renumber();
        self.debts.len() != before
    }

    fn renumber(&mut self) {
        for (index, debt) in self.debts.iter_mut().enumerate() {
            debt.id = index as u32 + 1;
        }
    }

    pub fn get(&self, id: u32) -> Option<&DebtRecord> {
        self.debts.iter().find(|d| d.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut DebtRecord> {
        self.debts.iter_mut().find(|d| d.id == id)
    }

    /// Best-effort sum of all amounts
    pub fn total_amount(&self) -> f64 {
        self.debts.iter().map(DebtRecord::amount_value).sum()
    }

    /// Paused users and users with a zero interval get no reminders
    pub fn reminders_enabled(&self) -> bool {
        !self.is_notification_paused && self.notification_interval > 0
    }
}

/// A validated add request
#[derive(Debug, Clone, PartialEq)]
pub struct NewDebt {
    pub debtor_name: String,
    pub amount: String,
    pub due_date: Option<NaiveDate>,
    pub remind_at: Option<NaiveTime>,
    pub note: String,
}

impl NewDebt {
    /// Parse `Name | Amount | Date | Time | Notes`; only name and amount are required
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split('|').map(str::trim).collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(KapanBayarError::InvalidInput(
                "Wrong format! At least: Name | Amount (e.g. John | 100k)".to_string(),
            ));
        }

        let field = |index: usize| parts.get(index).copied().filter(|p| !p.is_empty());

        let due_date = match field(2) {
            Some(raw) => Some(parse_due_date(raw).ok_or_else(|| {
                KapanBayarError::InvalidInput(
                    "Wrong date format! Use YYYY/MM/DD, e.g. 2025/12/20".to_string(),
                )
            })?),
            None => None,
        };

        let remind_at = match field(3) {
            Some(raw) => Some(parse_remind_time(raw).ok_or_else(|| {
                KapanBayarError::InvalidInput(
                    "Wrong time format! Use HH:MM (24h), e.g. 14:30".to_string(),
                )
            })?),
            None => None,
        };

        Ok(Self {
            debtor_name: parts[0].to_string(),
            amount: parts[1].to_string(),
            due_date,
            remind_at,
            note: field(4).unwrap_or_default().to_string(),
        })
    }
}
