//! Telegram long-polling loop and update dispatch

use crate::chat::backend::BackendClient;
use crate::chat::fallback::{convert_or_synthetic, history_or_synthetic};
use crate::chat::format::{
    INVALID_NUMBER_TEXT, NEXT_ACTION_TEXT, START_TEXT, format_conversion, format_history,
    prompt_text,
};
use crate::chat::keyboards;
use crate::chat::session::{Callback, Prompt, Request, SessionStore, TextOutcome};
use crate::core::config::BotConfig;
use anyhow::{Context, Result};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, Message, Update, UpdateKind};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Seconds Telegram may hold a getUpdates call open
const POLL_TIMEOUT_SECS: u32 = 10;

const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Consecutive getUpdates failures between warnings
const POLL_FAILURES_BEFORE_WARN: u32 = 5;

#[derive(Debug, Default)]
struct PollState {
    offset: i32,
    failures: u32,
}

impl PollState {
    /// Counts a failed poll; true when this failure should be surfaced as a warning
    fn record_failure(&mut self) -> bool {
        self.failures += 1;
        self.failures % POLL_FAILURES_BEFORE_WARN == 0
    }

    /// Resets the failure streak, returning its length
    fn record_success(&mut self) -> u32 {
        std::mem::take(&mut self.failures)
    }
}

/// Reply owed to a user once their session has moved on
#[derive(Debug)]
enum Action {
    Start(ChatId),
    Hint(ChatId),
    Prompt {
        query: CallbackQuery,
        chat_id: ChatId,
        prompt: Prompt,
    },
    /// Unknown button payload, only the loading indicator is cleared
    Dismiss(CallbackQuery),
    Complete {
        chat_id: ChatId,
        request: Request,
    },
}

/// Chat the pressed button lives in, or the user's private chat when Telegram omits it
fn callback_chat(query: &CallbackQuery) -> ChatId {
    query
        .message
        .as_ref()
        .map(|message| message.chat().id)
        .unwrap_or(ChatId(query.from.id.0 as i64))
}

pub struct ChatBot {
    bot: Bot,
    backend: BackendClient,
    sessions: SessionStore,
}

impl ChatBot {
    pub fn new(config: &BotConfig) -> Result<Self> {
        if config.token.is_empty() {
            anyhow::bail!("Bot token is empty");
        }
        let backend =
            BackendClient::new(&config.backend_url, Duration::from_secs(config.timeout_secs))
                .context("Failed to build backend client")?;

        Ok(Self::with_bot(Bot::new(config.token.clone()), backend))
    }

    fn with_bot(bot: Bot, backend: BackendClient) -> Self {
        Self {
            bot,
            backend,
            sessions: SessionStore::new(),
        }
    }

    /// Polls for updates until Ctrl-C
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let me = self.bot.get_me().await.context("Failed to validate bot token")?;
        info!(
            username = me.username.as_deref().unwrap_or("unknown"),
            "Chat bot started"
        );

        let mut state = PollState::default();
        loop {
            let polled = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping chat bot");
                    break;
                }
                polled = self.poll_once(&mut state.offset) => polled,
            };

            match polled {
                Ok(_) => {
                    let failures = state.record_success();
                    if failures >= POLL_FAILURES_BEFORE_WARN {
                        info!(failures, "Telegram polling recovered");
                    }
                }
                Err(e) => {
                    if state.record_failure() {
                        warn!(error = %e, failures = state.failures, "Telegram polling keeps failing");
                    } else {
                        // Connection hiccups are expected with long polling
                        debug!(error = %e, "Error fetching Telegram updates");
                    }
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
        Ok(())
    }

    /// Fetches one batch and applies its session transitions in arrival order.
    /// Replies run as detached tasks, whose handles are returned.
    async fn poll_once(self: &Arc<Self>, offset: &mut i32) -> Result<Vec<JoinHandle<()>>> {
        let mut request = self.bot.get_updates().timeout(POLL_TIMEOUT_SECS);
        if *offset > 0 {
            request = request.offset(*offset);
        }
        let updates = request.await?;

        let mut replies = Vec::with_capacity(updates.len());
        for update in updates {
            *offset = update.id.0 as i32 + 1;
            let Some(action) = self.plan(update).await else {
                continue;
            };
            let this = Arc::clone(self);
            replies.push(tokio::spawn(async move {
                if let Err(e) = this.perform(action).await {
                    error!(error = %e, "Failed to handle update");
                }
            }));
        }
        Ok(replies)
    }

    async fn plan(&self, update: Update) -> Option<Action> {
        match update.kind {
            UpdateKind::Message(message) => self.plan_message(&message).await,
            UpdateKind::CallbackQuery(query) => Some(self.plan_callback(query).await),
            _ => None,
        }
    }

    async fn plan_message(&self, message: &Message) -> Option<Action> {
        let user_id = message.from.as_ref()?.id.0;
        let text = message.text()?;
        let chat_id = message.chat.id;

        if text.trim().starts_with("/start") {
            self.sessions.reset(user_id).await;
            return Some(Action::Start(chat_id));
        }

        match self.sessions.on_text(user_id, text).await {
            TextOutcome::Ignored => None,
            TextOutcome::Invalid => Some(Action::Hint(chat_id)),
            TextOutcome::Request(request) => Some(Action::Complete { chat_id, request }),
        }
    }

    async fn plan_callback(&self, query: CallbackQuery) -> Action {
        let parsed = query.data.as_deref().unwrap_or("").parse::<Callback>();
        let callback = match parsed {
            Ok(callback) => callback,
            Err(e) => {
                warn!(error = %e, "Ignoring unknown callback");
                return Action::Dismiss(query);
            }
        };

        let chat_id = callback_chat(&query);
        let prompt = self.sessions.on_callback(query.from.id.0, callback).await;
        Action::Prompt {
            query,
            chat_id,
            prompt,
        }
    }

    async fn perform(&self, action: Action) -> Result<()> {
        match action {
            Action::Start(chat_id) => {
                self.bot
                    .send_message(chat_id, START_TEXT)
                    .reply_markup(keyboards::main_menu())
                    .await?;
            }
            Action::Hint(chat_id) => {
                self.bot.send_message(chat_id, INVALID_NUMBER_TEXT).await?;
            }
            Action::Dismiss(query) => {
                self.bot.answer_callback_query(query.id.clone()).await?;
            }
            Action::Prompt {
                query,
                chat_id,
                prompt,
            } => {
                self.bot.answer_callback_query(query.id.clone()).await?;
                let message = self.bot.send_message(chat_id, prompt_text(prompt));
                match prompt {
                    Prompt::ChooseConvertCurrency => {
                        message
                            .reply_markup(keyboards::currency_keyboard(Callback::ConvertFrom))
                            .await?
                    }
                    Prompt::ChooseHistoryBase => {
                        message
                            .reply_markup(keyboards::currency_keyboard(Callback::HistoryBase))
                            .await?
                    }
                    Prompt::EnterAmount(_) | Prompt::EnterDays(_) => message.await?,
                };
            }
            Action::Complete { chat_id, request } => self.complete(chat_id, request).await?,
        }
        Ok(())
    }

    async fn complete(&self, chat_id: ChatId, request: Request) -> Result<()> {
        let text = match request {
            Request::Convert { amount, from } => {
                let converted = convert_or_synthetic(&self.backend, amount, from).await;
                format_conversion(amount, from, converted.value())
            }
            Request::History { base, days } => {
                let today = Local::now().date_naive();
                let history = history_or_synthetic(&self.backend, base, days, today).await;
                format_history(base, days, history.value())
            }
        };

        self.bot.send_message(chat_id, text).await?;
        self.bot
            .send_message(chat_id, NEXT_ACTION_TEXT)
            .reply_markup(keyboards::main_menu())
            .await?;
        Ok(())
    }
}

pub async fn run(config: &BotConfig) -> Result<()> {
    let bot = Arc::new(ChatBot::new(config)?);
    bot.run().await
}
