//! Core activity type definitions.
//!
//! [`ParsedActivity`] and [`QueryIntent`] are what the intent-extraction
//! collaborator hands us; [`Activity`] is the committed record; [`RankedResult`]
//! and [`DateGroup`] are the request-scoped search output.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque activity identity (UUID v7, time-sortable).
pub type ActivityId = String;

/// Muscle-group tag derived from the exercise name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    Cardio,
    FullBody,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Self::Chest,
        Self::Back,
        Self::Legs,
        Self::Shoulders,
        Self::Arms,
        Self::Core,
        Self::Cardio,
        Self::FullBody,
        Self::Other,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chest => "chest",
            Self::Back => "back",
            Self::Legs => "legs",
            Self::Shoulders => "shoulders",
            Self::Arms => "arms",
            Self::Core => "core",
            Self::Cardio => "cardio",
            Self::FullBody => "full_body",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Lbs,
    Kg,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lbs => "lbs",
            Self::Kg => "kg",
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lbs" | "lb" | "pounds" | "pound" => Ok(Self::Lbs),
            "kg" | "kgs" | "kilograms" | "kilogram" => Ok(Self::Kg),
            _ => Err(format!("unknown weight unit: {s}")),
        }
    }
}

/// Structured activity as produced by the intent-extraction collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedActivity {
    pub exercise: String,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<u32>,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ParsedActivity {
    pub fn new(exercise: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            exercise: exercise.into(),
            sets: None,
            reps: None,
            weight: None,
            unit: None,
            duration: None,
            date,
            notes: None,
        }
    }

    /// Exercise name as stored: trimmed, lower-cased, inner whitespace collapsed.
    pub fn normalized_exercise(&self) -> String {
        normalize_exercise(&self.exercise)
    }

    /// Reject malformed records before they reach the store.
    pub fn validate(&self) -> Result<()> {
        if self.normalized_exercise().is_empty() {
            return Err(Error::validation("exercise must not be empty"));
        }
        if self.sets == Some(0) {
            return Err(Error::validation("sets must be positive"));
        }
        if self.reps == Some(0) {
            return Err(Error::validation("reps must be positive"));
        }
        if self.duration == Some(0) {
            return Err(Error::validation("duration must be positive"));
        }
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::validation(format!("invalid weight: {weight}")));
            }
        }
        match (&self.unit, self.weight) {
            (Some(_), None) => return Err(Error::validation("unit given without weight")),
            (Some(unit), Some(_)) => {
                unit.parse::<WeightUnit>().map_err(Error::Validation)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Normalized unit. Weight without a unit is assumed to be pounds.
    pub fn weight_unit(&self) -> Option<WeightUnit> {
        match (&self.unit, self.weight) {
            (Some(unit), _) => unit.parse().ok(),
            (None, Some(_)) => Some(WeightUnit::Lbs),
            (None, None) => None,
        }
    }
}

pub fn normalize_exercise(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A committed activity record, matching the `activities` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub owner_id: String,
    pub exercise: String,
    pub category: Category,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub unit: Option<WeightUnit>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    /// Calendar day the workout happened.
    pub performed_on: NaiveDate,
    /// When the record was committed.
    pub created_at: DateTime<Utc>,
    /// Id of the vector row in the index; `None` until indexed.
    pub embedding_ref: Option<String>,
}

impl Activity {
    pub fn metadata(&self) -> VectorMetadata {
        VectorMetadata {
            owner_id: self.owner_id.clone(),
            performed_on: self.performed_on,
            category: self.category,
        }
    }
}

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_CE_DAYS: i64 = 719_163;

/// Days since 1970-01-01; the integer form of a date stored in the vector index.
pub fn epoch_day(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64 - UNIX_EPOCH_CE_DAYS
}

pub fn from_epoch_day(day: i64) -> Option<NaiveDate> {
    let ce_days = i32::try_from(day + UNIX_EPOCH_CE_DAYS).ok()?;
    NaiveDate::from_num_days_from_ce_opt(ce_days)
}

/// Filterable metadata denormalized onto each vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorMetadata {
    pub owner_id: String,
    pub performed_on: NaiveDate,
    pub category: Category,
}

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = Error;

    fn try_from(raw: RawTimeRange) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Fails unless `start < end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(Error::validation(format!(
                "time range end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering exactly one day.
    pub fn day(date: NaiveDate) -> Result<Self> {
        let end = date
            .succ_opt()
            .ok_or_else(|| Error::validation(format!("date out of range: {date}")))?;
        Self::new(date, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Structured search request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryIntent {
    #[serde(default)]
    text: String,
    #[serde(default)]
    time_range: Option<TimeRange>,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    exercise: Option<String>,
    #[serde(default)]
    owner_id: Option<String>,
}

impl QueryIntent {
    /// `text` is the free-text residual left after filters were extracted; may be empty.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_exercise(mut self, exercise: impl Into<String>) -> Self {
        self.exercise = Some(exercise.into());
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn time_range(&self) -> Option<&TimeRange> {
        self.time_range.as_ref()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Requested exercise, normalized like stored names. Blank counts as absent.
    pub fn exercise(&self) -> Option<String> {
        self.exercise
            .as_deref()
            .map(normalize_exercise)
            .filter(|e| !e.is_empty())
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }
}

/// Metadata constraints applied inside the nearest-neighbor scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    pub owner_id: Option<String>,
    pub time_range: Option<TimeRange>,
    pub category: Option<Category>,
}

impl MetadataFilter {
    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none() && self.time_range.is_none() && self.category.is_none()
    }

    pub fn matches(&self, meta: &VectorMetadata) -> bool {
        self.owner_id.as_ref().map_or(true, |o| *o == meta.owner_id)
            && self.time_range.map_or(true, |r| r.contains(meta.performed_on))
            && self.category.map_or(true, |c| c == meta.category)
    }
}

/// One scored search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub activity: Activity,
    /// Cosine similarity to the query, in `[0, 1]`.
    pub similarity: f64,
    /// Final ranking score.
    pub score: f64,
    pub recency_boost: f64,
    pub exact_match_boost: f64,
}

/// Results sharing a `performed_on` date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub best_similarity: f64,
    pub results: Vec<RankedResult>,
}
