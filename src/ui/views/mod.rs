mod document_list;
mod item_detail;
mod item_list;

pub use document_list::DocumentListView;
pub use item_detail::ItemDetailView;
pub use item_list::ItemListView;

use chrono::{DateTime, TimeZone};

use crate::grouping::{self, Stored, TimelineBucket};

/// How a list view groups its records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum GroupingMode {
  /// Recency buckets: Today, Yesterday, Last 7 Days, Earlier
  #[default]
  Timeline,
  /// Category / document type groups
  Category,
}

impl GroupingMode {
  pub(crate) fn toggled(self) -> Self {
    match self {
      GroupingMode::Timeline => GroupingMode::Category,
      GroupingMode::Category => GroupingMode::Timeline,
    }
  }

  pub(crate) fn label(self) -> &'static str {
    match self {
      GroupingMode::Timeline => "timeline",
      GroupingMode::Category => "category",
    }
  }
}

/// One display row of a grouped list: a group header or a record line.
pub(crate) enum Row<'a, T> {
  Header {
    label: String,
    count: usize,
    /// Set for timeline headers, drives the header color
    bucket: Option<TimelineBucket>,
  },
  Record(&'a T),
}

/// Flatten the visible records into display rows under the active grouping.
pub(crate) fn grouped_rows<'a, T, Tz>(
  visible: &[&'a T],
  mode: GroupingMode,
  now: DateTime<Tz>,
) -> Vec<Row<'a, T>>
where
  T: Stored,
  Tz: TimeZone,
{
  let mut rows = Vec::new();
  match mode {
    GroupingMode::Timeline => {
      for group in grouping::timeline_groups(visible, now) {
        rows.push(Row::Header {
          label: group.bucket.label().to_string(),
          count: group.records.len(),
          bucket: Some(group.bucket),
        });
        for record in group.records {
          rows.push(Row::Record(*record));
        }
      }
    }
    GroupingMode::Category => {
      for group in grouping::category_groups(visible) {
        rows.push(Row::Header {
          label: group.name,
          count: group.records.len(),
          bucket: None,
        });
        for record in group.records {
          rows.push(Row::Record(*record));
        }
      }
    }
  }
  rows
}

/// Move the selection `delta` record rows, skipping headers and clamping at
/// the ends. `delta == 0` snaps a stale index to the nearest record row.
pub(crate) fn step_selection<T>(rows: &[Row<'_, T>], current: usize, delta: i32) -> usize {
  let record_rows: Vec<usize> = rows
    .iter()
    .enumerate()
    .filter_map(|(i, row)| matches!(row, Row::Record(_)).then_some(i))
    .collect();

  if record_rows.is_empty() {
    return 0;
  }

  let pos = record_rows
    .iter()
    .position(|&i| i >= current)
    .unwrap_or(record_rows.len() - 1);
  let stepped = (pos as i32 + delta).clamp(0, record_rows.len() as i32 - 1) as usize;
  record_rows[stepped]
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, Utc};

  #[derive(Debug)]
  struct StubRec {
    name: &'static str,
    group: Option<&'static str>,
    created_at: DateTime<Utc>,
  }

  impl Stored for StubRec {
    fn name(&self) -> &str {
      self.name
    }

    fn created_at(&self) -> DateTime<Utc> {
      self.created_at
    }

    fn group_key(&self) -> Option<&str> {
      self.group
    }

    fn notes(&self) -> Option<&str> {
      None
    }

    fn fallback_group() -> &'static str {
      "Uncategorized"
    }
  }

  fn recs(now: DateTime<Utc>) -> Vec<StubRec> {
    vec![
      StubRec {
        name: "today",
        group: Some("Tools"),
        created_at: now,
      },
      StubRec {
        name: "last week",
        group: None,
        created_at: now - Duration::days(3),
      },
    ]
  }

  #[test]
  fn test_grouped_rows_timeline_interleaves_headers() {
    let now = Utc::now();
    let records = recs(now);
    let visible: Vec<&StubRec> = records.iter().collect();

    let rows = grouped_rows(&visible, GroupingMode::Timeline, now);
    assert_eq!(rows.len(), 4);
    assert!(matches!(
      rows[0],
      Row::Header { bucket: Some(TimelineBucket::Today), .. }
    ));
    assert!(matches!(rows[1], Row::Record(r) if r.name == "today"));
    assert!(matches!(
      rows[2],
      Row::Header { bucket: Some(TimelineBucket::LastSevenDays), .. }
    ));
  }

  #[test]
  fn test_grouped_rows_category_uses_fallback() {
    let now = Utc::now();
    let records = recs(now);
    let visible: Vec<&StubRec> = records.iter().collect();

    let rows = grouped_rows(&visible, GroupingMode::Category, now);
    let labels: Vec<&str> = rows
      .iter()
      .filter_map(|row| match row {
        Row::Header { label, .. } => Some(label.as_str()),
        Row::Record(_) => None,
      })
      .collect();
    assert_eq!(labels, vec!["Tools", "Uncategorized"]);
  }

  #[test]
  fn test_step_selection_skips_headers_and_clamps() {
    let now = Utc::now();
    let records = recs(now);
    let visible: Vec<&StubRec> = records.iter().collect();
    let rows = grouped_rows(&visible, GroupingMode::Timeline, now);

    // Rows: header, record(1), header, record(3)
    assert_eq!(step_selection(&rows, 0, 0), 1);
    assert_eq!(step_selection(&rows, 1, 1), 3);
    assert_eq!(step_selection(&rows, 3, 1), 3);
    assert_eq!(step_selection(&rows, 3, -1), 1);
    assert_eq!(step_selection(&rows, 1, -1), 1);
  }

  #[test]
  fn test_step_selection_empty_rows() {
    let rows: Vec<Row<'_, StubRec>> = Vec::new();
    assert_eq!(step_selection(&rows, 5, 1), 0);
  }
}
