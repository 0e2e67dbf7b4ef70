//! Pure aggregation over record snapshots.
//!
//! Every function borrows its input and returns a freshly built value. Malformed
//! values never produce errors: missing categories fall into a default bucket,
//! unparseable dates are dropped from trends and passed through range filters.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::dates;
use crate::models::{FieldValue, Record, UnrecognizedValue};

pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Whether known categories with no records stay in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroCounts {
    /// Table and summary views show every known category.
    #[default]
    Keep,
    /// Chart distributions drop empty slices.
    Omit,
}

#[derive(Debug, Clone, Copy)]
pub struct CountOptions<'a> {
    pub known_categories: Option<&'a [&'a str]>,
    pub default_category: &'a str,
    pub zero_counts: ZeroCounts,
}

impl Default for CountOptions<'_> {
    fn default() -> Self {
        Self {
            known_categories: None,
            default_category: UNKNOWN_CATEGORY,
            zero_counts: ZeroCounts::Keep,
        }
    }
}

impl<'a> CountOptions<'a> {
    pub fn known(categories: &'a [&'a str]) -> Self {
        Self {
            known_categories: Some(categories),
            ..Self::default()
        }
    }

    pub fn omit_zero(mut self) -> Self {
        self.zero_counts = ZeroCounts::Omit;
        self
    }

    pub fn with_default(mut self, category: &'a str) -> Self {
        self.default_category = category;
        self
    }
}

/// Ordered category counts. Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl CategoryCounts {
    pub fn get(&self, category: &str) -> Option<usize> {
        self.index.get(category).map(|&slot| self.entries[slot].1)
    }

    /// Count for a category, zero when it never appeared.
    pub fn count(&self, category: &str) -> usize {
        self.get(category).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.entries
            .iter()
            .map(|(category, count)| (category.as_str(), *count))
    }

    pub fn categories(&self) -> Vec<&str> {
        self.iter().map(|(category, _)| category).collect()
    }

    /// `{name, value}` pairs for pie and bar charts.
    pub fn to_chart(&self) -> Vec<ChartPoint> {
        self.iter()
            .map(|(name, value)| ChartPoint {
                name: name.to_string(),
                value,
            })
            .collect()
    }

    fn add(&mut self, category: &str, amount: usize) {
        match self.index.get(category).copied() {
            Some(slot) => self.entries[slot].1 += amount,
            None => {
                self.index.insert(category.to_string(), self.entries.len());
                self.entries.push((category.to_string(), amount));
            }
        }
    }
}

impl Serialize for CategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, count) in &self.entries {
            map.serialize_entry(category, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: usize,
}

pub fn count_by_field<T, F>(records: &[T], selector: F) -> CategoryCounts
where
    F: Fn(&T) -> Option<&str>,
{
    count_by_field_with(records, selector, &CountOptions::default())
}

/// Counts records per category.
///
/// Without known categories the output follows first-seen order. With them the
/// known categories come first in the given order, then any other observed
/// category in first-seen order.
pub fn count_by_field_with<T, F>(
    records: &[T],
    selector: F,
    options: &CountOptions<'_>,
) -> CategoryCounts
where
    F: Fn(&T) -> Option<&str>,
{
    let mut observed = CategoryCounts::default();
    for record in records {
        observed.add(resolve(selector(record), options.default_category), 1);
    }

    let Some(known) = options.known_categories else {
        return observed;
    };

    let mut ordered = CategoryCounts::default();
    for category in known {
        let count = observed.count(category);
        if count == 0 && options.zero_counts == ZeroCounts::Omit {
            continue;
        }
        ordered.add(category, count);
    }
    for (category, count) in observed.iter() {
        if !known.iter().any(|listed| *listed == category) {
            ordered.add(category, count);
        }
    }
    ordered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Nearest integer, as shown for approximate attendance.
    Whole,
    /// Two decimal places, as shown for average scores.
    Hundredths,
}

impl Rounding {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Rounding::Whole => value.round(),
            Rounding::Hundredths => (value * 100.0).round() / 100.0,
        }
    }
}

pub fn percentage_of(part: f64, whole: f64, rounding: Rounding) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let ratio = part / whole;
    if !ratio.is_finite() {
        return 0.0;
    }
    rounding.apply(ratio * 100.0)
}

/// Rounded arithmetic mean, zero for no values.
pub fn average<I>(values: I, rounding: Rounding) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        return 0.0;
    }
    rounding.apply(sum / count as f64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub date: NaiveDate,
    pub count: usize,
}

/// One bucket per calendar day, ending at `reference` inclusive.
pub fn time_bucket_trend<T, F>(
    records: &[T],
    date_selector: F,
    window_days: usize,
    reference: NaiveDate,
) -> Vec<TrendPoint>
where
    F: Fn(&T) -> Option<&str>,
{
    if window_days == 0 {
        return Vec::new();
    }

    let Some(start) = i64::try_from(window_days - 1)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|span| reference.checked_sub_signed(span))
    else {
        tracing::debug!(window_days, %reference, "trend window reaches outside the calendar");
        return Vec::new();
    };
    let mut points: Vec<TrendPoint> = (0..window_days)
        .map(|offset| {
            let date = start + Duration::days(offset as i64);
            TrendPoint {
                label: dates::day_label(date),
                date,
                count: 0,
            }
        })
        .collect();

    let mut undated = 0usize;
    for record in records {
        let Some(day) = date_selector(record).and_then(dates::parse_day) else {
            undated += 1;
            continue;
        };
        let offset = (day - start).num_days();
        if offset >= 0 && (offset as usize) < window_days {
            points[offset as usize].count += 1;
        }
    }

    if undated > 0 {
        tracing::debug!(undated, "records without a parseable date left out of trend");
    }

    points
}

/// Inclusive calendar-day range filter. Records without a parseable date are kept.
pub fn filter_by_date_range<T, F>(
    records: &[T],
    date_selector: F,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<&str>,
{
    let mut kept = Vec::new();
    let mut undated = 0usize;

    for record in records {
        let in_range = match date_selector(record).and_then(dates::parse_day) {
            Some(day) => {
                start.map_or(true, |start| day >= start) && end.map_or(true, |end| day <= end)
            }
            None => {
                undated += 1;
                true
            }
        };
        if in_range {
            kept.push(record.clone());
        }
    }

    if undated > 0 {
        tracing::debug!(undated, "records without a parseable date kept by range filter");
    }

    kept
}

/// Keeps records whose fields equal every non-empty filter value.
pub fn filter_by_exact_match<T>(records: &[T], predicates: &[(&str, &str)]) -> Vec<T>
where
    T: Record + Clone,
{
    let active: Vec<&(&str, &str)> = predicates
        .iter()
        .filter(|(_, expected)| !expected.is_empty())
        .collect();

    records
        .iter()
        .filter(|record| {
            active.iter().all(|(key, expected)| {
                record
                    .field(key)
                    .is_some_and(|value| value.matches(expected))
            })
        })
        .cloned()
        .collect()
}

/// Per-group status counts. Only statuses seen in a group get a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTally {
    pub group: String,
    pub counts: CategoryCounts,
    pub total: usize,
}

impl Serialize for GroupTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len() + 2))?;
        map.serialize_entry("group", &self.group)?;
        for (status, count) in self.counts.iter() {
            map.serialize_entry(status, &count)?;
        }
        map.serialize_entry("total", &self.total)?;
        map.end()
    }
}

pub fn group_and_tally<T, G, S>(
    records: &[T],
    group_selector: G,
    status_selector: S,
) -> Vec<GroupTally>
where
    G: Fn(&T) -> Option<&str>,
    S: Fn(&T) -> Option<&str>,
{
    let mut groups: Vec<GroupTally> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in records {
        let group = resolve(group_selector(record), UNKNOWN_CATEGORY);
        let status = resolve(status_selector(record), UNKNOWN_CATEGORY);

        let slot = match slots.get(group).copied() {
            Some(slot) => slot,
            None => {
                slots.insert(group.to_string(), groups.len());
                groups.push(GroupTally {
                    group: group.to_string(),
                    counts: CategoryCounts::default(),
                    total: 0,
                });
                groups.len() - 1
            }
        };

        let tally = &mut groups[slot];
        tally.counts.add(status, 1);
        tally.total += 1;
    }

    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = UnrecognizedValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(UnrecognizedValue(other.to_string())),
        }
    }
}

/// Stable sort on a field key.
///
/// Direction applies within a value type. Across types the order is always
/// numbers, timestamps, text, then records missing the field.
pub fn sort_by<T>(records: &[T], key: &str, direction: SortDirection) -> Vec<T>
where
    T: Record + Clone,
{
    let mut keyed: Vec<(Option<FieldValue<'_>>, &T)> =
        records.iter().map(|record| (record.field(key), record)).collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b, direction),
    });

    keyed.into_iter().map(|(_, record)| record.clone()).collect()
}

pub fn top_n<T: Clone>(records: &[T], n: usize) -> Vec<T> {
    records.iter().take(n).cloned().collect()
}

fn compare_values(a: &FieldValue<'_>, b: &FieldValue<'_>, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (FieldValue::Number(a), FieldValue::Number(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Timestamp { at: a, .. }, FieldValue::Timestamp { at: b, .. }) => a.cmp(b),
        (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
        _ => return type_rank(a).cmp(&type_rank(b)),
    };

    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

fn type_rank(value: &FieldValue<'_>) -> u8 {
    match value {
        FieldValue::Number(_) => 0,
        FieldValue::Timestamp { .. } => 1,
        FieldValue::Text(_) => 2,
    }
}

fn resolve<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.filter(|raw| !raw.trim().is_empty()).unwrap_or(default)
}
