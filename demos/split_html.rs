//! Split an HTML-formatted log record into Telegram-sized messages.
//!
//! Run:
//!   RUST_LOG=tgmarkup=trace cargo run --example split_html -- 120

use tgmarkup::{ParseMode, SplitterFactory};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let limit: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(160);

    let mut traceback = String::new();
    for depth in 0..6 {
        traceback.push_str(&format!(
            "  File \"worker.py\", line {}, in step_{depth}\n    result = step_{}(payload)\n",
            40 + depth * 7,
            depth + 1
        ));
    }
    let record = format!(
        "🟥 <b>ERROR</b> <i>worker</i>\n\
         Job <a href=\"https://example.org/jobs/42\">#42</a> failed.\n\
         <pre><code class=\"language-python\">Traceback (most recent call last):\n{traceback}\
         ZeroDivisionError: division by zero</code></pre>"
    );

    let factory = SplitterFactory::default().with_splitter(
        ParseMode::Html,
        tgmarkup::HtmlSplitter::new(limit),
    );

    match factory.split(ParseMode::Html, &record) {
        Ok(messages) => {
            for (i, message) in messages.iter().enumerate() {
                println!(
                    "\n== message {i} ({} chars) ==\n{message}",
                    message.chars().count()
                );
            }
        }
        Err(err) => eprintln!("cannot split record: {err}"),
    }
}
