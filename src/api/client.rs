use color_eyre::{eyre::eyre, Result};
use reqwest::header;
use url::Url;

use crate::config::Config;

use super::api_types::{ApiAck, ApiDocument, ApiEnvelope, ApiItem, ApiItemCreate, ApiItemPatch};
use super::types::{Document, Item, ItemFields};

/// Trove backend client
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;

    let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", token))
      .map_err(|e| eyre!("Invalid API token: {}", e))?;
    auth.set_sensitive(true);
    let mut headers = header::HeaderMap::new();
    headers.insert(header::AUTHORIZATION, auth);

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    // Url::join drops the last path segment unless the base ends with '/'
    let mut base_url = config.api.url.clone();
    if !base_url.ends_with('/') {
      base_url.push('/');
    }
    let base = Url::parse(&base_url)
      .map_err(|e| eyre!("Invalid api.url '{}': {}", config.api.url, e))?;

    Ok(Self { http, base })
  }

  /// Fetch all items.
  pub async fn fetch_items(&self) -> Result<Vec<Item>> {
    let url = self.endpoint("api/items")?;
    let envelope: ApiEnvelope<Vec<ApiItem>> = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch items: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse items response: {}", e))?;

    let items = envelope.into_result().map_err(|e| eyre!(e))?;
    Ok(items.into_iter().map(ApiItem::into_item).collect())
  }

  /// Fetch all documents.
  pub async fn fetch_documents(&self) -> Result<Vec<Document>> {
    let url = self.endpoint("api/documents")?;
    let envelope: ApiEnvelope<Vec<ApiDocument>> = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch documents: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse documents response: {}", e))?;

    let documents = envelope.into_result().map_err(|e| eyre!(e))?;
    Ok(documents.into_iter().map(ApiDocument::into_document).collect())
  }

  /// Create an item, returning the stored record.
  pub async fn create_item(
    &self,
    name: &str,
    location: &str,
    category: Option<&str>,
  ) -> Result<Item> {
    let url = self.endpoint("api/items")?;
    let payload = ApiItemCreate {
      name,
      location,
      category,
    };

    let envelope: ApiEnvelope<ApiItem> = self
      .http
      .post(url)
      .json(&payload)
      .send()
      .await
      .map_err(|e| eyre!("Failed to create item: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse create response: {}", e))?;

    Ok(envelope.into_result().map_err(|e| eyre!(e))?.into_item())
  }

  /// Update an item's fields, returning the stored record.
  pub async fn update_item(&self, id: &str, fields: &ItemFields) -> Result<Item> {
    let url = self.endpoint(&format!("api/items/{}", id))?;

    let envelope: ApiEnvelope<ApiItem> = self
      .http
      .put(url)
      .json(&ApiItemPatch::from_fields(fields))
      .send()
      .await
      .map_err(|e| eyre!("Failed to update item {}: {}", id, e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse update response: {}", e))?;

    Ok(envelope.into_result().map_err(|e| eyre!(e))?.into_item())
  }

  /// Delete an item.
  pub async fn delete_item(&self, id: &str) -> Result<()> {
    let url = self.endpoint(&format!("api/items/{}", id))?;

    let ack: ApiAck = self
      .http
      .delete(url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to delete item {}: {}", id, e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse delete response: {}", e))?;

    ack.into_result().map_err(|e| eyre!(e))
  }

  /// Autocomplete items matching a partial query.
  pub async fn suggest_items(&self, query: &str) -> Result<Vec<Item>> {
    let mut url = self.endpoint("api/items/suggest")?;
    url.query_pairs_mut().append_pair("q", query);

    let envelope: ApiEnvelope<Vec<ApiItem>> = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch suggestions: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse suggestions response: {}", e))?;

    let items = envelope.into_result().map_err(|e| eyre!(e))?;
    Ok(items.into_iter().map(ApiItem::into_item).collect())
  }

  /// Autocomplete documents matching a partial query.
  pub async fn suggest_documents(&self, query: &str) -> Result<Vec<Document>> {
    let mut url = self.endpoint("api/documents/suggest")?;
    url.query_pairs_mut().append_pair("q", query);

    let envelope: ApiEnvelope<Vec<ApiDocument>> = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch suggestions: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse suggestions response: {}", e))?;

    let documents = envelope.into_result().map_err(|e| eyre!(e))?;
    Ok(documents.into_iter().map(ApiDocument::into_document).collect())
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint path '{}': {}", path, e))
  }
}
