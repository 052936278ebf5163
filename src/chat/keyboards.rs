use crate::chat::session::Callback;
use crate::core::Currency;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

fn btn(text: &str, callback: Callback) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), callback.to_string())
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![btn("Конвертация", Callback::Convert)],
        vec![btn("История курса", Callback::History)],
    ])
}

/// One currency per row
pub fn currency_keyboard(callback: fn(Currency) -> Callback) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        Currency::ALL
            .into_iter()
            .map(|currency| vec![btn(currency.code(), callback(currency))]),
    )
}
