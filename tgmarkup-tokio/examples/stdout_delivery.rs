//! Deliver log records through the actor with a sender that prints instead of calling the API.
//!
//! Run:
//!   RUST_LOG=debug cargo run -p tgmarkup-tokio --example stdout_delivery

use async_trait::async_trait;
use tgmarkup::{HtmlSplitter, ParseMode, SplitterFactory};
use tgmarkup_tokio::{
    BackpressurePolicy, DeliveryOptions, Dispatcher, MessageSender, OutgoingMessage, Record,
    RecordSender, SendError, spawn_delivery_actor,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

struct StdoutSender;

#[async_trait]
impl MessageSender for StdoutSender {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), SendError> {
        println!(
            "-> chat={} parse_mode={:?} silent={} ({} chars)\n{}\n",
            message.chat_id,
            message.parse_mode.as_str(),
            message.disable_notification,
            message.text.chars().count(),
            message.text
        );
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let factory =
        SplitterFactory::default().with_splitter(ParseMode::Html, HtmlSplitter::new(64));
    let opts = DeliveryOptions::new(["@ops-alerts"]).force_send_on_error(true);
    let dispatcher = Dispatcher::new(StdoutSender, opts).with_factory(factory);

    let (tx, rx) = mpsc::channel::<Record>(16);
    let mut outcomes = spawn_delivery_actor(dispatcher, rx);
    let sender = RecordSender::new(tx, BackpressurePolicy::Block);

    let records = [
        Record::html("<b>INFO</b> service started"),
        Record::html(
            "<b>ERROR</b> request failed\n<pre><code class=\"language-python\">\
             Traceback (most recent call last):\n  File \"api.py\", line 12, in handle\n\
             KeyError: 'user_id'</code></pre>",
        ),
        Record::plain("disk usage at 91% on /var").silent(),
        Record::html("broken </i> markup"),
    ];
    for record in records {
        if sender.send(record).await.is_err() {
            break;
        }
    }
    drop(sender);

    while let Some(outcome) = outcomes.recv().await {
        match outcome.result {
            Ok(report) => println!("delivered: {report:?}"),
            Err(err) => println!("not delivered: {err}"),
        }
    }
}
