use std::fmt;

use serde::{Serialize, Serializer};

/// Text written for a field that was attempted but could not be resolved.
pub const UNAVAILABLE: &str = "unavailable";

/// Text shown for a field that has not been attempted yet.
pub const PENDING: &str = "pending";

// -------------------------
// Field
// -------------------------

/// One listing attribute and how far its resolution got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Resolved(String),
    Pending,
    Unavailable,
}

impl Field {
    /// `Resolved` when `text` is present, `fallback` otherwise.
    pub fn from_text(text: Option<String>, fallback: Field) -> Self {
        match text {
            Some(t) => Field::Resolved(t),
            None => fallback,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Field::Resolved(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Field::Pending)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Field::Resolved(v) => v,
            Field::Pending => PENDING,
            Field::Unavailable => UNAVAILABLE,
        }
    }

    /// Export form: anything not resolved is written as the placeholder.
    pub fn export_str(&self) -> &str {
        match self {
            Field::Resolved(v) => v,
            Field::Pending | Field::Unavailable => UNAVAILABLE,
        }
    }

    /// Turns a leftover `Pending` into `Unavailable`.
    pub fn settle(&mut self) {
        if self.is_pending() {
            *self = Field::Unavailable;
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.export_str())
    }
}

// -------------------------
// Record
// -------------------------

/// One discovered listing. Field order matches the exported header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub url: String,
    pub title: Field,
    pub price: Field,
    pub description: Field,
    pub location: Field,
}

impl Record {
    /// A record as seen on the results page: description is never there.
    pub fn from_card(url: String, title: Field, price: Field, location: Field) -> Self {
        Self {
            url,
            title,
            price,
            description: Field::Pending,
            location,
        }
    }

    pub fn fields(&self) -> [(&'static str, &Field); 4] {
        [
            ("title", &self.title),
            ("price", &self.price),
            ("description", &self.description),
            ("location", &self.location),
        ]
    }

    pub fn has_pending(&self) -> bool {
        self.fields().iter().any(|(_, f)| f.is_pending())
    }

    /// Enforces the final-record invariant: nothing stays `Pending`.
    pub fn settle(&mut self) {
        self.title.settle();
        self.price.settle();
        self.description.settle();
        self.location.settle();
    }

    /// Short label for log lines.
    pub fn label(&self) -> String {
        let title = self.title.as_str();
        match title.char_indices().nth(30) {
            Some((cut, _)) => format!("{}...", &title[..cut]),
            None => title.to_string(),
        }
    }
}
