use crate::grouping::TimelineBucket;
use ratatui::prelude::Color;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.len() <= max_len {
    s.to_string()
  } else {
    format!("{}...", &s[..max_len.saturating_sub(3)])
  }
}

/// Display color for a timeline bucket header
pub fn bucket_color(bucket: TimelineBucket) -> Color {
  match bucket {
    TimelineBucket::Today => Color::Green,
    TimelineBucket::Yesterday => Color::Cyan,
    TimelineBucket::LastSevenDays => Color::Yellow,
    TimelineBucket::Earlier => Color::DarkGray,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("keys", 10), "keys");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_bucket_colors_are_distinct_per_recency() {
    assert_eq!(bucket_color(TimelineBucket::Today), Color::Green);
    assert_eq!(bucket_color(TimelineBucket::Earlier), Color::DarkGray);
  }
}
