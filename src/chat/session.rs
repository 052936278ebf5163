//! Per-user dialogue state for the chat front end

use crate::core::Currency;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Longest history a user can ask for
pub const MAX_HISTORY_DAYS: u32 = 3650;

/// Where a user currently is in the dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Idle,
    AwaitingConversionAmount(Currency),
    AwaitingHistoryDays(Currency),
}

/// Inline button payloads understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    Convert,
    History,
    ConvertFrom(Currency),
    HistoryBase(Currency),
}

impl Display for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callback::Convert => write!(f, "convert"),
            Callback::History => write!(f, "history"),
            Callback::ConvertFrom(c) => write!(f, "convert_{c}"),
            Callback::HistoryBase(c) => write!(f, "history_base_{c}"),
        }
    }
}

impl FromStr for Callback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "convert" => return Ok(Callback::Convert),
            "history" => return Ok(Callback::History),
            _ => {}
        }
        if let Some(code) = s.strip_prefix("history_base_") {
            return Ok(Callback::HistoryBase(code.parse()?));
        }
        if let Some(code) = s.strip_prefix("convert_") {
            return Ok(Callback::ConvertFrom(code.parse()?));
        }
        Err(anyhow::anyhow!("Invalid callback data: {}", s))
    }
}

/// What the bot should ask next after a button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    ChooseConvertCurrency,
    ChooseHistoryBase,
    EnterAmount(Currency),
    EnterDays(Currency),
}

/// A completed dialogue, ready to be sent to the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    Convert { amount: f64, from: Currency },
    History { base: Currency, days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextOutcome {
    /// Nothing was pending for this user
    Ignored,
    /// Input was pending but the text was not a usable number
    Invalid,
    Request(Request),
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<u64, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: u64) -> Session {
        let sessions = self.inner.lock().await;
        sessions.get(&user_id).copied().unwrap_or_default()
    }

    pub async fn reset(&self, user_id: u64) {
        let mut sessions = self.inner.lock().await;
        sessions.remove(&user_id);
    }

    pub async fn on_callback(&self, user_id: u64, callback: Callback) -> Prompt {
        let mut sessions = self.inner.lock().await;
        let prompt = match callback {
            Callback::Convert => Prompt::ChooseConvertCurrency,
            Callback::History => Prompt::ChooseHistoryBase,
            Callback::ConvertFrom(currency) => {
                sessions.insert(user_id, Session::AwaitingConversionAmount(currency));
                Prompt::EnterAmount(currency)
            }
            Callback::HistoryBase(currency) => {
                sessions.insert(user_id, Session::AwaitingHistoryDays(currency));
                Prompt::EnterDays(currency)
            }
        };
        debug!(user_id, %callback, ?prompt, "Callback handled");
        prompt
    }

    /// Consumes a pending session when `text` completes it
    pub async fn on_text(&self, user_id: u64, text: &str) -> TextOutcome {
        let mut sessions = self.inner.lock().await;
        let session = sessions.get(&user_id).copied().unwrap_or_default();
        let text = text.trim();

        let request = match session {
            Session::Idle => return TextOutcome::Ignored,
            _ if !is_number(text) => return TextOutcome::Invalid,
            Session::AwaitingConversionAmount(from) => match text.parse::<f64>() {
                Ok(amount) => Request::Convert { amount, from },
                Err(_) => return TextOutcome::Invalid,
            },
            Session::AwaitingHistoryDays(base) => match text.parse::<u32>() {
                Ok(days) if days <= MAX_HISTORY_DAYS => Request::History { base, days },
                _ => return TextOutcome::Invalid,
            },
        };

        sessions.remove(&user_id);
        debug!(user_id, ?request, "Dialogue complete");
        TextOutcome::Request(request)
    }
}
