//! Human-readable renderings of a [`DailyInsight`].

use std::fmt::Write as _;

use brief_core::insight::DailyInsight;

const HOT_TOPICS_IN_MESSAGE: usize = 5;
const TRENDS_IN_MESSAGE: usize = 3;
const HIDDEN_INSIGHTS_IN_MESSAGE: usize = 2;

/// File name the binary writes the markdown report to.
pub fn report_file_name(insight: &DailyInsight) -> String {
  format!("daily_report_{}.md", insight.date)
}

/// The daily markdown report.
pub fn render_markdown(insight: &DailyInsight) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "# 📊 Market Report for {}\n", insight.date);
  let _ = writeln!(
    out,
    "### 🌡️ Market Sentiment: {}\n",
    insight.market_sentiment_overlay.as_deref().unwrap_or("n/a")
  );

  let sections = [
    ("📈 Main Trends", &insight.main_trends),
    ("🔥 Hot Topics", &insight.hot_topics),
    ("👁️ Hidden Insights", &insight.hidden_insights),
  ];
  for (heading, items) in sections {
    let _ = writeln!(out, "## {heading}");
    for item in items.iter() {
      let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
  }

  let _ = writeln!(out, "## 🧭 Media Steering Analysis");
  let _ = writeln!(
    out,
    "{}",
    insight.media_steering_analysis.as_deref().unwrap_or("n/a")
  );
  out
}

/// Escape text for Telegram's HTML parse mode.
fn escape_html(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}

/// The short HTML notification sent after a successful synthesis.
pub fn notification_message(insight: &DailyInsight, analyzed: usize) -> String {
  let mut msg = String::from("<b>🚀 AI NEWS BRIEF UPDATE</b>\n\n");
  let _ = writeln!(msg, "📅 Date: {}", insight.date);
  let _ = writeln!(msg, "📰 Articles analysed: <b>{analyzed}</b>");
  let _ = writeln!(
    msg,
    "🌡️ Market sentiment: <b>{}</b>",
    escape_html(insight.market_sentiment_overlay.as_deref().unwrap_or("n/a"))
  );

  let sections = [
    ("🔥 Hot Topics", &insight.hot_topics, HOT_TOPICS_IN_MESSAGE),
    ("📊 Main Trends", &insight.main_trends, TRENDS_IN_MESSAGE),
    ("👁️ Hidden Insights", &insight.hidden_insights, HIDDEN_INSIGHTS_IN_MESSAGE),
  ];
  for (heading, items, limit) in sections {
    let _ = writeln!(msg, "\n<b>{heading}:</b>");
    for item in items.iter().take(limit) {
      let _ = writeln!(msg, "• {}", escape_html(item));
    }
  }
  msg
}
