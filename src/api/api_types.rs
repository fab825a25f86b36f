//! Serde types matching the backend wire format.
//!
//! Every endpoint answers with a `{success, data?, error?}` envelope in
//! camelCase JSON. The envelope is collapsed into a `Result` right here so
//! nothing above the client ever sees the wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Document, Item, ItemFields};

/// Response envelope for endpoints that return data.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
  #[serde(default)]
  pub success: bool,
  pub data: Option<T>,
  pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
  /// Collapse the envelope into a `Result`.
  ///
  /// `success` without `data` is a malformed payload, not an empty result.
  pub fn into_result(self) -> Result<T, String> {
    if self.success {
      self
        .data
        .ok_or_else(|| "malformed response: success without data".to_string())
    } else {
      Err(
        self
          .error
          .unwrap_or_else(|| "backend reported failure without a message".to_string()),
      )
    }
  }
}

/// Response envelope for endpoints that only acknowledge (delete).
#[derive(Debug, Deserialize)]
pub struct ApiAck {
  #[serde(default)]
  pub success: bool,
  pub error: Option<String>,
}

impl ApiAck {
  pub fn into_result(self) -> Result<(), String> {
    if self.success {
      Ok(())
    } else {
      Err(
        self
          .error
          .unwrap_or_else(|| "backend reported failure without a message".to_string()),
      )
    }
  }
}

// ============================================================================
// Inbound records
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiItem {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub location: String,
  pub category: Option<String>,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl ApiItem {
  pub fn into_item(self) -> Item {
    Item {
      id: self.id,
      name: self.name,
      location: self.location,
      category: self.category,
      image_url: self.image_url,
      created_at: self.created_at,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
  pub id: String,
  pub name: String,
  #[serde(rename = "type", default)]
  pub doc_type: String,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl ApiDocument {
  pub fn into_document(self) -> Document {
    Document {
      id: self.id,
      name: self.name,
      doc_type: self.doc_type,
      notes: self.notes,
      created_at: self.created_at,
    }
  }
}

// ============================================================================
// Outbound payloads
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiItemCreate<'a> {
  pub name: &'a str,
  pub location: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiItemPatch<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<&'a str>,
}

impl<'a> ApiItemPatch<'a> {
  pub fn from_fields(fields: &'a ItemFields) -> Self {
    Self {
      name: fields.name.as_deref(),
      location: fields.location.as_deref(),
      category: fields.category.as_deref(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_items_payload_deserializes() {
    let body = r#"{
      "success": true,
      "data": [
        {
          "id": "itm_1",
          "name": "Car Keys",
          "location": "Hallway drawer",
          "category": "Keys",
          "imageUrl": "https://cdn.example.com/itm_1.jpg",
          "createdAt": "2024-06-15T12:00:00Z"
        },
        {
          "id": "itm_2",
          "name": "Passport",
          "createdAt": "2024-06-01T08:30:00Z"
        }
      ]
    }"#;

    let envelope: ApiEnvelope<Vec<ApiItem>> = serde_json::from_str(body).unwrap();
    let items = envelope.into_result().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Car Keys");
    assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.example.com/itm_1.jpg"));
    // Missing optional fields come through as defaults
    assert_eq!(items[1].location, "");
    assert_eq!(items[1].category, None);
  }

  #[test]
  fn test_document_type_field_is_renamed() {
    let body = r#"{
      "id": "doc_1",
      "name": "Insurance policy",
      "type": "insurance",
      "notes": "renews in June",
      "createdAt": "2024-05-20T10:00:00Z"
    }"#;

    let doc = serde_json::from_str::<ApiDocument>(body).unwrap().into_document();
    assert_eq!(doc.doc_type, "insurance");
    assert_eq!(doc.notes.as_deref(), Some("renews in June"));
  }

  #[test]
  fn test_failure_envelope_carries_error() {
    let body = r#"{"success": false, "error": "database offline"}"#;
    let envelope: ApiEnvelope<Vec<ApiItem>> = serde_json::from_str(body).unwrap();
    assert_eq!(envelope.into_result().unwrap_err(), "database offline");
  }

  #[test]
  fn test_success_without_data_is_malformed() {
    let body = r#"{"success": true}"#;
    let envelope: ApiEnvelope<Vec<ApiItem>> = serde_json::from_str(body).unwrap();
    assert!(envelope.into_result().is_err());
  }

  #[test]
  fn test_patch_skips_unset_fields() {
    let fields = ItemFields {
      location: Some("Garage shelf".to_string()),
      ..Default::default()
    };
    let json = serde_json::to_string(&ApiItemPatch::from_fields(&fields)).unwrap();
    assert_eq!(json, r#"{"location":"Garage shelf"}"#);
  }
}
