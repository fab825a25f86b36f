//! Pure view derivation over stored records: timeline buckets, category
//! groups, the recency marker, and the filter/search predicates.
//!
//! Everything here is deterministic given `(records, now)` - no I/O, no
//! hidden clocks. Bucket boundaries are computed against the `now` the caller
//! passes at render time, so the same records shift buckets across midnight.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Trait for records the derived views work over.
///
/// Items and documents both implement this; the grouping and search code
/// never needs to know which kind it is looking at.
pub trait Stored {
  fn name(&self) -> &str;

  fn created_at(&self) -> DateTime<Utc>;

  /// Grouping field: category for items, document type for documents.
  /// `None` or blank lands the record in [`Stored::fallback_group`].
  fn group_key(&self) -> Option<&str>;

  /// Secondary searchable text (location, notes), if any.
  fn notes(&self) -> Option<&str>;

  /// Group label for records whose grouping field is blank or absent.
  fn fallback_group() -> &'static str;
}

// Lets the grouping functions run over borrowed views (&[&T]) as well as
// owned lists.
impl<T: Stored> Stored for &T {
  fn name(&self) -> &str {
    (*self).name()
  }

  fn created_at(&self) -> DateTime<Utc> {
    (*self).created_at()
  }

  fn group_key(&self) -> Option<&str> {
    (*self).group_key()
  }

  fn notes(&self) -> Option<&str> {
    (*self).notes()
  }

  fn fallback_group() -> &'static str {
    T::fallback_group()
  }
}

/// Fixed timeline buckets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineBucket {
  Today,
  Yesterday,
  LastSevenDays,
  Earlier,
}

impl TimelineBucket {
  pub fn label(&self) -> &'static str {
    match self {
      TimelineBucket::Today => "Today",
      TimelineBucket::Yesterday => "Yesterday",
      TimelineBucket::LastSevenDays => "Last 7 Days",
      TimelineBucket::Earlier => "Earlier",
    }
  }
}

#[derive(Debug)]
pub struct TimelineGroup<'a, T> {
  pub bucket: TimelineBucket,
  pub records: Vec<&'a T>,
}

#[derive(Debug)]
pub struct CategoryGroup<'a, T> {
  pub name: String,
  pub records: Vec<&'a T>,
}

/// Classify records into timeline buckets relative to `now`'s calendar day.
///
/// Same day as `now` is Today, the day before is Yesterday, anything else
/// within the preceding seven days is Last 7 Days, the rest is Earlier.
/// Records inside a bucket are sorted newest first; empty buckets are
/// omitted.
pub fn timeline_groups<'a, T, Tz>(records: &'a [T], now: DateTime<Tz>) -> Vec<TimelineGroup<'a, T>>
where
  T: Stored,
  Tz: TimeZone,
{
  let today = now.date_naive();

  let mut buckets: [Vec<&T>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
  for record in records {
    let date = record
      .created_at()
      .with_timezone(&now.timezone())
      .date_naive();
    let age_days = (today - date).num_days();
    let slot = match age_days {
      0 => 0,
      1 => 1,
      d if d <= 7 => 2,
      _ => 3,
    };
    buckets[slot].push(record);
  }

  const ORDER: [TimelineBucket; 4] = [
    TimelineBucket::Today,
    TimelineBucket::Yesterday,
    TimelineBucket::LastSevenDays,
    TimelineBucket::Earlier,
  ];

  ORDER
    .into_iter()
    .zip(buckets)
    .filter(|(_, records)| !records.is_empty())
    .map(|(bucket, mut records)| {
      records.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
      TimelineGroup { bucket, records }
    })
    .collect()
}

/// Group records by their literal (trimmed) grouping key.
///
/// Blank or absent keys fall back to the record kind's sentinel group.
/// Groups are ordered by case-insensitive name; keys themselves stay
/// case-sensitive, so "Tools" and "tools" are distinct groups. Record order
/// within a group preserves source order.
pub fn category_groups<T: Stored>(records: &[T]) -> Vec<CategoryGroup<'_, T>> {
  let mut groups: Vec<CategoryGroup<'_, T>> = Vec::new();

  for record in records {
    let key = match record.group_key().map(str::trim) {
      Some(k) if !k.is_empty() => k,
      _ => T::fallback_group(),
    };
    match groups.iter_mut().find(|g| g.name == key) {
      Some(group) => group.records.push(record),
      None => groups.push(CategoryGroup {
        name: key.to_string(),
        records: vec![record],
      }),
    }
  }

  groups.sort_by_key(|g| g.name.to_lowercase());
  groups
}

/// Whether a record was created within the last five minutes.
///
/// Recomputed on every render so the marker expires on its own.
pub fn is_recently_added(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  now.signed_duration_since(created_at) <= Duration::minutes(5)
}

/// Active category/type filter for a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
  /// Wildcard - every record matches.
  #[default]
  All,
  /// Only records whose grouping field equals this value exactly.
  Only(String),
}

impl CategoryFilter {
  pub fn matches<T: Stored>(&self, record: &T) -> bool {
    match self {
      CategoryFilter::All => true,
      CategoryFilter::Only(value) => record.group_key() == Some(value.as_str()),
    }
  }

  pub fn label(&self) -> &str {
    match self {
      CategoryFilter::All => "all",
      CategoryFilter::Only(value) => value,
    }
  }
}

/// Whether a record matches a free-text query: empty matches everything,
/// otherwise a case-insensitive substring of the name or the notes field.
pub fn matches_query<T: Stored>(record: &T, query: &str) -> bool {
  if query.is_empty() {
    return true;
  }
  let needle = query.to_lowercase();
  if record.name().to_lowercase().contains(&needle) {
    return true;
  }
  record
    .notes()
    .is_some_and(|notes| notes.to_lowercase().contains(&needle))
}

/// The visible set: records passing both the category filter and the text
/// query.
pub fn visible<'a, T: Stored>(
  records: &'a [T],
  filter: &CategoryFilter,
  query: &str,
) -> Vec<&'a T> {
  records
    .iter()
    .filter(|r| filter.matches(*r) && matches_query(*r, query))
    .collect()
}
