//! Tokio glue for `tgmarkup`.
//!
//! `tgmarkup` turns one formatted log record into messages that fit the Bot API length limit and
//! is runtime-agnostic. This crate delivers those messages from async code:
//!
//! - [`Dispatcher`] picks the splitter for a record's parse mode and sends every message to every
//!   recipient through a [`MessageSender`].
//! - [`RecordSender`] is a producer-side helper for bounded channels of records.
//! - [`spawn_delivery_actor`] runs a dispatcher on its own task.
//!
//! The HTTP side of `sendMessage` is up to the [`MessageSender`] implementation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tgmarkup::{ParseMode, SplitError, SplitterFactory};
use thiserror::Error;
use tokio::sync::mpsc;

/// Target chat: a numeric id or a `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(name: &str) -> Self {
        ChatId::Username(name.to_string())
    }
}

impl From<String> for ChatId {
    fn from(name: String) -> Self {
        ChatId::Username(name)
    }
}

/// One `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    /// Already split; never longer than the splitter limit.
    pub text: String,
    pub parse_mode: ParseMode,
    pub disable_notification: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The Bot API answered with `ok: false`.
    #[error("Bot API rejected the message ({code}): {description}")]
    Api { code: i64, description: String },
    #[error("transport error: {0}")]
    Transport(String),
}

/// Adapter for the Bot API `sendMessage` method.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), SendError>;
}

#[async_trait]
impl<S: MessageSender + ?Sized> MessageSender for Arc<S> {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), SendError> {
        (**self).send(message).await
    }
}

/// A formatted log record waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub text: String,
    /// Markup of `text`; selects the splitter.
    pub parse_mode: ParseMode,
    pub disable_notification: bool,
}

impl Record {
    pub fn new(text: impl Into<String>, parse_mode: ParseMode) -> Self {
        Self {
            text: text.into(),
            parse_mode,
            disable_notification: false,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, ParseMode::Plain)
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self::new(text, ParseMode::Html)
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOptions {
    pub chat_ids: Vec<ChatId>,
    /// Keep sending to the remaining recipients and messages after a failed send.
    ///
    /// By default the first failure aborts delivery of the record.
    #[serde(default)]
    pub force_send_on_error: bool,
}

impl DeliveryOptions {
    pub fn new<I, C>(chat_ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ChatId>,
    {
        Self {
            chat_ids: chat_ids.into_iter().map(Into::into).collect(),
            force_send_on_error: false,
        }
    }

    pub fn force_send_on_error(mut self, force: bool) -> Self {
        self.force_send_on_error = force;
        self
    }

    /// Configured chats without duplicates, in first-seen order.
    pub fn recipients(&self) -> Vec<&ChatId> {
        let mut out: Vec<&ChatId> = Vec::with_capacity(self.chat_ids.len());
        for chat_id in &self.chat_ids {
            if !out.contains(&chat_id) {
                out.push(chat_id);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Number of messages the record was split into.
    pub messages: usize,
    pub sent: usize,
    /// Failed sends skipped because of `force_send_on_error`.
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error("failed to send message {index} to {chat_id}: {source}")]
    Send {
        chat_id: ChatId,
        index: usize,
        #[source]
        source: SendError,
    },
}

/// Splits records and fans the messages out to every configured chat.
///
/// Messages are sent strictly in order: all recipients get message `n` before any recipient gets
/// message `n + 1`.
pub struct Dispatcher<S> {
    factory: SplitterFactory,
    sender: S,
    opts: DeliveryOptions,
}

impl<S: MessageSender> Dispatcher<S> {
    pub fn new(sender: S, opts: DeliveryOptions) -> Self {
        Self {
            factory: SplitterFactory::default(),
            sender,
            opts,
        }
    }

    pub fn with_factory(mut self, factory: SplitterFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn options(&self) -> &DeliveryOptions {
        &self.opts
    }

    pub fn factory(&self) -> &SplitterFactory {
        &self.factory
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub async fn deliver(&self, record: &Record) -> Result<DeliveryReport, DeliveryError> {
        let splitter = self.factory.get(record.parse_mode)?;
        let parse_mode = splitter.parse_mode();
        let messages = splitter.split(&record.text)?;
        let recipients = self.opts.recipients();

        let mut report = DeliveryReport {
            messages: messages.len(),
            ..DeliveryReport::default()
        };
        for (index, text) in messages.into_iter().enumerate() {
            for &chat_id in &recipients {
                let message = OutgoingMessage {
                    chat_id: chat_id.clone(),
                    text: text.clone(),
                    parse_mode,
                    disable_notification: record.disable_notification,
                };
                match self.sender.send(&message).await {
                    Ok(()) => report.sent += 1,
                    Err(source) if self.opts.force_send_on_error => {
                        tracing::warn!(
                            %chat_id,
                            index,
                            error = %source,
                            "failed to send log message; continuing with remaining recipients"
                        );
                        report.failed += 1;
                    }
                    Err(source) => {
                        return Err(DeliveryError::Send {
                            chat_id: chat_id.clone(),
                            index,
                            source,
                        });
                    }
                }
            }
        }
        tracing::debug!(
            parse_mode = %parse_mode,
            messages = report.messages,
            sent = report.sent,
            failed = report.failed,
            "delivered log record"
        );
        Ok(report)
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("factory", &self.factory)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackpressurePolicy {
    /// Await capacity. Never drops.
    Block,
    /// Drop the new record when the channel is full.
    ///
    /// Keeps logging call sites from stalling when the chat API is slow; records are lost under
    /// sustained load.
    DropNew,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Dropped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("delivery channel closed")]
    Closed,
}

/// Producer-side helper for a bounded channel of records.
#[derive(Clone, Debug)]
pub struct RecordSender {
    tx: mpsc::Sender<Record>,
    policy: BackpressurePolicy,
}

impl RecordSender {
    pub fn new(tx: mpsc::Sender<Record>, policy: BackpressurePolicy) -> Self {
        Self { tx, policy }
    }

    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: BackpressurePolicy) {
        self.policy = policy;
    }

    pub async fn send(&self, record: Record) -> Result<SendOutcome, QueueError> {
        match self.policy {
            BackpressurePolicy::Block => {
                self.tx.send(record).await.map_err(|_| QueueError::Closed)?;
                Ok(SendOutcome::Sent)
            }
            BackpressurePolicy::DropNew => self.try_send(record),
        }
    }

    /// Enqueue without waiting, whatever the policy. For synchronous call sites.
    pub fn try_send(&self, record: Record) -> Result<SendOutcome, QueueError> {
        match self.tx.try_send(record) {
            Ok(()) => Ok(SendOutcome::Sent),
            Err(mpsc::error::TrySendError::Full(record)) => {
                tracing::debug!(
                    parse_mode = %record.parse_mode,
                    "delivery channel full; dropping log record"
                );
                Ok(SendOutcome::Dropped)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }
}

#[derive(Debug)]
pub struct DeliveryOutcome {
    pub record: Record,
    pub result: Result<DeliveryReport, DeliveryError>,
}

/// Spawn a task that owns `dispatcher` and delivers records from `rx` one at a time.
///
/// Returns a channel with one outcome per record. Outcomes are optional: dropping the returned
/// receiver does not stop delivery. If it is kept, it must be drained, or the task stalls once
/// the outcome buffer is full. The task ends when every sender of `rx` is dropped.
pub fn spawn_delivery_actor<S>(
    dispatcher: Dispatcher<S>,
    mut rx: mpsc::Receiver<Record>,
) -> mpsc::Receiver<DeliveryOutcome>
where
    S: MessageSender + 'static,
{
    let (tx_out, rx_out) = mpsc::channel::<DeliveryOutcome>(64);

    tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            let result = dispatcher.deliver(&record).await;
            if let Err(err) = &result {
                tracing::error!(
                    parse_mode = %record.parse_mode,
                    error = %err,
                    "failed to deliver log record"
                );
            }
            if !tx_out.is_closed() {
                let _ = tx_out.send(DeliveryOutcome { record, result }).await;
            }
        }
    });

    rx_out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tgmarkup::HtmlSplitter;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OutgoingMessage>>,
        failing: Vec<ChatId>,
    }

    impl Recorder {
        fn failing(chat_ids: Vec<ChatId>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing: chat_ids,
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|m| (m.chat_id.to_string(), m.text.clone()))
                .collect()
        }
    }

    #[async_trait]
    impl MessageSender for Recorder {
        async fn send(&self, message: &OutgoingMessage) -> Result<(), SendError> {
            if self.failing.contains(&message.chat_id) {
                return Err(SendError::Api {
                    code: 400,
                    description: "Bad Request: chat not found".to_string(),
                });
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn html_factory(limit: usize) -> SplitterFactory {
        SplitterFactory::default().with_splitter(ParseMode::Html, HtmlSplitter::new(limit))
    }

    #[tokio::test]
    async fn sends_every_message_to_every_recipient_in_order() {
        let opts = DeliveryOptions::new([ChatId::Id(1), ChatId::from("@ops"), ChatId::Id(1)]);
        let dispatcher = Dispatcher::new(Recorder::default(), opts).with_factory(html_factory(10));

        let report = dispatcher
            .deliver(&Record::html("12345<b>12345</b>12345").silent())
            .await
            .unwrap();

        assert_eq!(
            report,
            DeliveryReport {
                messages: 4,
                sent: 8,
                failed: 0
            }
        );
        let expected: Vec<(String, String)> = ["12345", "<b>123</b>", "<b>45</b>1", "2345"]
            .iter()
            .flat_map(|text| {
                [
                    ("1".to_string(), text.to_string()),
                    ("@ops".to_string(), text.to_string()),
                ]
            })
            .collect();
        assert_eq!(dispatcher.sender().sent(), expected);

        let sent = dispatcher.sender().sent.lock().unwrap();
        assert!(sent.iter().all(|m| m.parse_mode == ParseMode::Html));
        assert!(sent.iter().all(|m| m.disable_notification));
    }

    #[tokio::test]
    async fn first_failure_aborts_delivery() {
        let opts = DeliveryOptions::new([1i64, 2, 3]);
        let factory = SplitterFactory::default()
            .with_splitter(ParseMode::Plain, tgmarkup::PlainSplitter::new(3));
        let dispatcher =
            Dispatcher::new(Recorder::failing(vec![ChatId::Id(2)]), opts).with_factory(factory);

        let err = dispatcher.deliver(&Record::plain("abcdef")).await.unwrap_err();

        match err {
            DeliveryError::Send { chat_id, index, .. } => {
                assert_eq!(chat_id, ChatId::Id(2));
                assert_eq!(index, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            dispatcher.sender().sent(),
            [("1".to_string(), "abc".to_string())]
        );
    }

    #[tokio::test]
    async fn force_send_continues_past_failures() {
        let opts = DeliveryOptions::new([1i64, 2, 3]).force_send_on_error(true);
        let factory = SplitterFactory::default()
            .with_splitter(ParseMode::Plain, tgmarkup::PlainSplitter::new(3));
        let dispatcher =
            Dispatcher::new(Recorder::failing(vec![ChatId::Id(2)]), opts).with_factory(factory);

        let report = dispatcher.deliver(&Record::plain("abcdef")).await.unwrap();

        assert_eq!(
            report,
            DeliveryReport {
                messages: 2,
                sent: 4,
                failed: 2
            }
        );
        assert_eq!(dispatcher.sender().sent().len(), 4);
    }

    #[tokio::test]
    async fn split_errors_abort_before_sending() {
        let dispatcher = Dispatcher::new(Recorder::default(), DeliveryOptions::new([1i64]));

        let err = dispatcher
            .deliver(&Record::html("text </b>"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Split(SplitError::TagMismatch { .. })
        ));

        let err = dispatcher
            .deliver(&Record::new("*x*", ParseMode::Markdown))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Split(SplitError::NotMapped(ParseMode::Markdown))
        ));

        assert!(dispatcher.sender().sent().is_empty());
    }

    #[tokio::test]
    async fn empty_record_sends_nothing() {
        let dispatcher = Dispatcher::new(Recorder::default(), DeliveryOptions::new([1i64]));
        let report = dispatcher.deliver(&Record::plain("")).await.unwrap();
        assert_eq!(report, DeliveryReport::default());
    }

    #[tokio::test]
    async fn actor_delivers_records_and_reports_outcomes() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(recorder.clone(), DeliveryOptions::new(["@logs"]));

        let (tx, rx) = mpsc::channel::<Record>(8);
        let mut outcomes = spawn_delivery_actor(dispatcher, rx);
        let sender = RecordSender::new(tx, BackpressurePolicy::Block);

        assert_eq!(
            sender.send(Record::html("<b>boot</b>")).await.unwrap(),
            SendOutcome::Sent
        );
        assert_eq!(
            sender.send(Record::html("</i>")).await.unwrap(),
            SendOutcome::Sent
        );
        drop(sender);

        let first = outcomes.recv().await.unwrap();
        assert_eq!(first.result.unwrap().sent, 1);
        let second = outcomes.recv().await.unwrap();
        assert_eq!(second.record.text, "</i>");
        assert!(second.result.is_err());

        let closed = tokio::time::timeout(Duration::from_millis(200), outcomes.recv())
            .await
            .expect("actor should finish once all record senders are dropped");
        assert!(closed.is_none());
        assert_eq!(
            recorder.sent(),
            [("@logs".to_string(), "<b>boot</b>".to_string())]
        );
    }

    #[tokio::test]
    async fn record_sender_drop_new_drops_when_full() {
        let (tx, mut rx) = mpsc::channel::<Record>(1);
        let s = RecordSender::new(tx, BackpressurePolicy::DropNew);

        assert_eq!(s.send(Record::plain("a")).await.unwrap(), SendOutcome::Sent);
        assert_eq!(
            s.send(Record::plain("b")).await.unwrap(),
            SendOutcome::Dropped
        );

        assert_eq!(rx.recv().await.map(|r| r.text).as_deref(), Some("a"));
        drop(s);
        let got = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("receiver should complete once all senders are dropped");
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn record_sender_reports_closed_channel() {
        let (tx, rx) = mpsc::channel::<Record>(1);
        drop(rx);
        let s = RecordSender::new(tx, BackpressurePolicy::Block);
        assert_eq!(
            s.send(Record::plain("a")).await,
            Err(QueueError::Closed)
        );
        assert_eq!(s.try_send(Record::plain("a")), Err(QueueError::Closed));
    }

    #[test]
    fn delivery_options_from_json() {
        let opts: DeliveryOptions = serde_json::from_str(
            r#"{ "chat_ids": [123, "@channel", 123], "force_send_on_error": true }"#,
        )
        .unwrap();
        assert!(opts.force_send_on_error);
        assert_eq!(
            opts.recipients(),
            [&ChatId::Id(123), &ChatId::Username("@channel".to_string())]
        );

        let opts: DeliveryOptions = serde_json::from_str(r#"{ "chat_ids": [-1001] }"#).unwrap();
        assert!(!opts.force_send_on_error);
        assert_eq!(opts.chat_ids[0].to_string(), "-1001");
    }
}
