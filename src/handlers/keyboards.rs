//! Reply and inline keyboards shared by the handlers

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use crate::models::CallbackAction;
use crate::utils::helpers::{display_group, group_join_link};

/// Buttons of the main reply keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    AddDebt,
    DeleteDebt,
    ListDebts,
    ReminderInterval,
    Guide,
    BackToMenu,
}

impl MenuButton {
    pub const ALL: [MenuButton; 6] = [
        MenuButton::AddDebt,
        MenuButton::DeleteDebt,
        MenuButton::ListDebts,
        MenuButton::ReminderInterval,
        MenuButton::Guide,
        MenuButton::BackToMenu,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuButton::AddDebt => "➕ Add Debt",
            MenuButton::DeleteDebt => "🗑️ Delete Debt",
            MenuButton::ListDebts => "📋 Debt List",
            MenuButton::ReminderInterval => "⏸️ Reminder Interval",
            MenuButton::Guide => "❓ Guide",
            MenuButton::BackToMenu => "⬅️ Back to Menu",
        }
    }

    pub fn from_text(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|button| button.label() == text.trim())
    }
}

pub fn main_menu_keyboard() -> KeyboardMarkup {
    let row = |buttons: &[MenuButton]| -> Vec<KeyboardButton> {
        buttons.iter().map(|b| KeyboardButton::new(b.label())).collect()
    };

    KeyboardMarkup::new(vec![
        row(&[MenuButton::AddDebt, MenuButton::DeleteDebt]),
        row(&[MenuButton::ListDebts, MenuButton::ReminderInterval]),
        row(&[MenuButton::Guide, MenuButton::BackToMenu]),
    ])
    .resize_keyboard()
}

/// One join link per public group plus the "I've joined" button
pub fn join_keyboard(groups: &[String]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
        .iter()
        .filter_map(|group| {
            group_join_link(group).map(|url| {
                vec![InlineKeyboardButton::url(format!("🔗 Join {}", display_group(group)), url)]
            })
        })
        .collect();

    rows.push(vec![InlineKeyboardButton::callback(
        "✅ I've joined",
        CallbackAction::CheckJoin.to_string(),
    )]);

    InlineKeyboardMarkup::new(rows)
}
