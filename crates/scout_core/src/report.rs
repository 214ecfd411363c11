use std::fmt::Write;

use crate::Post;

pub const REPORT_TITLE: &str = "Local Service Leads - All Search Terms";

const HEAVY_RULE: &str = "==================================================";
const LIGHT_RULE: &str = "--------------------------------------------------";

/// Renders the plain-text lead report.
///
/// `generated` is the already formatted generation timestamp
/// (`YYYY-MM-DD HH:MM:SS`).
pub fn render_report(title: &str, generated: &str, posts: &[Post]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{HEAVY_RULE}");
    let _ = writeln!(out, "Generated: {generated}");
    let _ = writeln!(out, "{HEAVY_RULE}");
    out.push('\n');

    for (index, post) in posts.iter().enumerate() {
        let _ = writeln!(out, "Post {}:", index + 1);
        let _ = writeln!(out, "Author: {}", post.author);
        if let Some(term) = post.search_term.as_deref().filter(|t| !t.is_empty()) {
            let _ = writeln!(out, "Search Term: {term}");
        }
        let _ = writeln!(out, "Text: {}", post.text);
        if let Some(url) = post.url.as_deref().filter(|u| !u.is_empty()) {
            let _ = writeln!(out, "URL: {url}");
        }
        let _ = writeln!(out, "{LIGHT_RULE}");
        out.push('\n');
    }

    let _ = writeln!(out, "\nTotal posts: {}", posts.len());
    out
}
