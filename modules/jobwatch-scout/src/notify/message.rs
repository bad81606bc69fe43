//! Rendering an accepted posting into a chat message.

use jobwatch_common::{JobPosting, MessageFormat};

pub fn render(posting: &JobPosting, format: MessageFormat) -> String {
    match format {
        MessageFormat::RichText => rich_text(posting),
        MessageFormat::PlainText => plain_text(posting),
    }
}

/// Telegram HTML parse mode. Every field is escaped; the link is also
/// attribute-safe.
fn rich_text(posting: &JobPosting) -> String {
    format!(
        "✨ <b>{}</b>\n🏢 <i>{}</i>\n📍 {}\n🕒 Posted: {}\n\n🔗 <a href=\"{}\">View Job</a>",
        escape_html(&posting.title),
        escape_html(&posting.company),
        escape_html(&posting.location),
        escape_html(&posting.time_posted_raw),
        escape_html(&posting.link),
    )
}

fn plain_text(posting: &JobPosting) -> String {
    format!(
        "{}\n{}\n{}\nPosted: {}\n\n{}",
        posting.title, posting.company, posting.location, posting.time_posted_raw, posting.link,
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
