use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One article as returned by the content listing.
///
/// `id` is stable across pages and is the key for both feed deduplication
/// and enrichment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub tabcoins: i64,
    #[serde(default)]
    pub tabcoins_credit: i64,
    #[serde(default)]
    pub tabcoins_debit: i64,
    #[serde(default)]
    pub owner_username: String,
    #[serde(default)]
    pub children_deep_count: i64,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub body: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: String::new(),
            parent_id: None,
            slug: String::new(),
            title: title.into(),
            status: "published".to_string(),
            source_url: None,
            created_at: String::new(),
            updated_at: String::new(),
            published_at: String::new(),
            deleted_at: None,
            tabcoins: 0,
            tabcoins_credit: 0,
            tabcoins_debit: 0,
            owner_username: String::new(),
            children_deep_count: 0,
            kind: "content".to_string(),
            body: None,
        }
    }

    pub fn with_owner(mut self, username: impl Into<String>) -> Self {
        self.owner_username = username.into();
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    pub fn with_source_url(mut self, source_url: Option<String>) -> Self {
        self.source_url = source_url;
        self
    }

    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = published_at.into();
        self
    }

    pub fn with_counters(mut self, tabcoins: i64, comments: i64) -> Self {
        self.tabcoins = tabcoins;
        self.children_deep_count = comments;
        self
    }

    /// Credits minus debits; the debit counter is stored as a negative number
    pub fn net_votes(&self) -> i64 {
        self.tabcoins_credit + self.tabcoins_debit
    }

    pub fn published_date(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Body text, if present and not blank
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.trim().is_empty())
    }

    pub fn source_link(&self) -> Option<&str> {
        self.source_url.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Format: "{author} · {votes} tabcoins · {comments} comments · {published}"
    pub fn subtitle(&self) -> String {
        let mut parts = vec![
            self.owner_username.clone(),
            format!("{} tabcoins", self.tabcoins),
            format!("{} comments", self.children_deep_count),
        ];

        if let Some(date) = self.published_date() {
            parts.push(date.format("%Y-%m-%d %H:%M").to_string());
        }

        parts.join(" · ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_ENTRY: &str = r#"{
        "id": "7d9b1b5e-3f47-4a3c-9d0b-8e0b9a0c1d2e",
        "owner_id": "a1b2",
        "parent_id": null,
        "slug": "rust-e-bom",
        "title": "Rust é bom",
        "status": "published",
        "source_url": null,
        "created_at": "2025-12-04T12:00:00.000Z",
        "updated_at": "2025-12-04T12:00:00.000Z",
        "published_at": "2025-12-04T12:30:00.000Z",
        "deleted_at": null,
        "tabcoins": 12,
        "tabcoins_credit": 13,
        "tabcoins_debit": -1,
        "owner_username": "ferris",
        "children_deep_count": 4,
        "type": "content"
    }"#;

    #[test]
    fn test_deserialize_listing_entry() {
        let record: Record = serde_json::from_str(LISTING_ENTRY).unwrap();

        assert_eq!(record.id, "7d9b1b5e-3f47-4a3c-9d0b-8e0b9a0c1d2e");
        assert_eq!(record.owner_username, "ferris");
        assert_eq!(record.kind, "content");
        assert_eq!(record.tabcoins, 12);
        assert!(record.body.is_none());
        assert!(record.source_url.is_none());
    }

    #[test]
    fn test_net_votes_matches_tabcoins() {
        let record: Record = serde_json::from_str(LISTING_ENTRY).unwrap();
        assert_eq!(record.net_votes(), 12);
        assert_eq!(record.net_votes(), record.tabcoins);
    }

    #[test]
    fn test_published_date_parses_rfc3339() {
        let record: Record = serde_json::from_str(LISTING_ENTRY).unwrap();
        let date = record.published_date().unwrap();
        assert_eq!(date.to_rfc3339(), "2025-12-04T12:30:00+00:00");
    }

    #[test]
    fn test_published_date_invalid() {
        let record = Record::new("1", "Title").with_published_at("yesterday");
        assert!(record.published_date().is_none());
    }

    #[test]
    fn test_blank_body_and_source_are_absent() {
        let record = Record::new("1", "Title")
            .with_body(Some("   ".to_string()))
            .with_source_url(Some(String::new()));

        assert!(record.body_text().is_none());
        assert!(record.source_link().is_none());
    }

    #[test]
    fn test_subtitle() {
        let record = Record::new("1", "Title")
            .with_owner("ferris")
            .with_counters(7, 2)
            .with_published_at("2025-12-04T12:30:00Z");

        assert_eq!(
            record.subtitle(),
            "ferris · 7 tabcoins · 2 comments · 2025-12-04 12:30"
        );
    }
}
