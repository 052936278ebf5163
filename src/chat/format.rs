use crate::chat::session::Prompt;
use crate::core::{Currency, RateHistory, RateTable};

/// Two decimals, space separated thousands, comma as decimal mark: `1 234,56`
pub fn format_number(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let Some((int_part, frac_part)) = digits.split_once('.') else {
        // NaN and infinities
        return formatted;
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped},{frac_part}")
}

pub fn format_currency(amount: f64, currency: Currency) -> String {
    format!(
        "{} {} ({})",
        format_number(amount),
        currency.symbol(),
        currency.name()
    )
}

pub fn format_conversion(amount: f64, from: Currency, converted: &RateTable) -> String {
    let lines: Vec<String> = converted
        .iter()
        .map(|(currency, value)| format_currency(*value, *currency))
        .collect();
    format!(
        "Конвертация {}:\n\n{}",
        format_currency(amount, from),
        lines.join("\n")
    )
}

/// Newest date first
pub fn format_history(base: Currency, days: u32, history: &RateHistory) -> String {
    let mut result = format!("История курса {} за {} дней:\n\n", base.name(), days);
    for (date, rates) in history.iter().rev() {
        let rates_str: Vec<String> = rates
            .iter()
            .map(|(currency, rate)| format_currency(*rate, *currency))
            .collect();
        result.push_str(&format!("{}: {}\n", date.format("%Y-%m-%d"), rates_str.join(", ")));
    }
    result
}

pub const START_TEXT: &str = "Выберите действие:";
pub const NEXT_ACTION_TEXT: &str = "Выберите следующее действие:";
pub const INVALID_NUMBER_TEXT: &str = "Введите целое положительное число, например 7.";

pub fn prompt_text(prompt: Prompt) -> String {
    match prompt {
        Prompt::ChooseConvertCurrency => "Выберите валюту для конвертации:".to_string(),
        Prompt::ChooseHistoryBase => "Выберите базовую валюту для истории курса:".to_string(),
        Prompt::EnterAmount(currency) => format!(
            "Вы выбрали {}. Введите сумму для конвертации:",
            currency.name()
        ),
        Prompt::EnterDays(_) => "Введите количество дней для истории (например, 7):".to_string(),
    }
}
