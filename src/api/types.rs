use chrono::{DateTime, Utc};

use crate::grouping::Stored;

/// A tracked belonging
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
  pub id: String,
  pub name: String,
  pub location: String,
  pub category: Option<String>,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Stored for Item {
  fn name(&self) -> &str {
    &self.name
  }

  fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }

  fn group_key(&self) -> Option<&str> {
    self.category.as_deref()
  }

  fn notes(&self) -> Option<&str> {
    Some(&self.location)
  }

  fn fallback_group() -> &'static str {
    "Uncategorized"
  }
}

/// A tracked paper/document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  pub id: String,
  pub name: String,
  pub doc_type: String,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Stored for Document {
  fn name(&self) -> &str {
    &self.name
  }

  fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }

  fn group_key(&self) -> Option<&str> {
    Some(&self.doc_type)
  }

  fn notes(&self) -> Option<&str> {
    self.notes.as_deref()
  }

  fn fallback_group() -> &'static str {
    "other"
  }
}

/// Partial item fields for update calls. Unset fields are left untouched by
/// the backend.
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
  pub name: Option<String>,
  pub location: Option<String>,
  pub category: Option<String>,
}
