use crate::domain::Record;

pub const INSTRUCTIONS: &str = "You summarize articles concisely and objectively. \
Always answer in the language of the article. \
Use plain text only: no markdown, no bold, no italics, no formatting. \
Produce exactly ONE paragraph, with no line breaks or extra spaces.";

const CLOSING: &str = "Give a concise plain-text summary (no formatting) as a single paragraph. \
Do not use line breaks. Summarize the main points objectively.";

/// Compose the prompt for one record from everything the detail view shows
pub fn build_prompt(record: &Record) -> String {
    let mut prompt = format!("Title: {}\nAuthor: {}", record.title, record.owner_username);

    if !record.published_at.trim().is_empty() {
        prompt.push_str(&format!("\nPublished: {}", record.published_at));
    }

    if let Some(body) = record.body_text() {
        prompt.push_str(&format!("\n\nContent:\n{}", body));
    }

    if let Some(source) = record.source_link() {
        prompt.push_str(&format!("\n\nSource: {}", source));
    }

    prompt.push_str("\n\n");
    prompt.push_str(CLOSING);
    prompt
}
