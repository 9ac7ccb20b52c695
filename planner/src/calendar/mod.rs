// Weekly content calendar: week keys, row durations, and category rollups.
//
// Every week is a fixed grid of 7 days × 2 rows stored under
// `calendar.<monday>.rows.<day>_<row>`. Recomputing a week rewrites every
// row's `duration` and returns the category totals for display.

use crate::document::Document;
use crate::error::{PlannerError, Result};
use crate::schema::{CalendarField, DocPath};
use crate::storage::Storage;
use crate::store::PlannerStore;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const DAYS_PER_WEEK: usize = 7;
pub const ROWS_PER_DAY: usize = 2;

/// Weekly hours above this are flagged as overwork
pub const OVERWORK_THRESHOLD_HOURS: f64 = 60.0;

pub const DAY_NAMES: [&str; DAYS_PER_WEEK] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

// ── Week keys ────────────────────────────────────────────────────

/// A calendar week, identified by the ISO date of its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// The week containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday() as i64;
        WeekKey(date - Duration::days(offset))
    }

    /// The week containing today's local date
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn monday(&self) -> NaiveDate {
        self.0
    }

    pub fn sunday(&self) -> NaiveDate {
        self.0 + Duration::days(6)
    }

    /// Date of the given day index (0 = Monday)
    pub fn day(&self, index: usize) -> NaiveDate {
        self.0 + Duration::days(index as i64)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    pub fn offset(&self, weeks: i64) -> Self {
        WeekKey(self.0 + Duration::weeks(weeks))
    }

    /// e.g. `Week of October 12, 2026`
    pub fn label(&self) -> String {
        format!("Week of {}", self.0.format("%B %-d, %Y"))
    }

    /// e.g. `2026-10-12 to 2026-10-18`
    pub fn range_label(&self) -> String {
        format!("{} to {}", self, self.sunday().format("%Y-%m-%d"))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for WeekKey {
    type Err = PlannerError;

    /// Accepts any `YYYY-MM-DD` date and snaps it to that week's Monday.
    fn from_str(s: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| PlannerError::Other(format!("Invalid week date '{s}': {e}")))?;
        Ok(Self::containing(date))
    }
}

// ── Enumerations ─────────────────────────────────────────────────

/// The five buckets weekly hours roll up into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Streaming,
    Content,
    Community,
    Business,
    Rest,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Streaming,
        Category::Content,
        Category::Community,
        Category::Business,
        Category::Rest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Streaming => "Streaming",
            Category::Content => "Content",
            Category::Community => "Community",
            Category::Business => "Business",
            Category::Rest => "Rest",
        }
    }

    /// Map an activity string by its prefix before `" - "`.
    pub fn for_activity(activity: &str) -> Option<Self> {
        let prefix = activity.split(" - ").next().unwrap_or_default();
        match prefix {
            "Stream" => Some(Category::Streaming),
            "Content Creation" | "Social Media" => Some(Category::Content),
            "Community" => Some(Category::Community),
            "Business" => Some(Category::Business),
            "Personal" => Some(Category::Rest),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        match self {
            Category::Streaming => 0,
            Category::Content => 1,
            Category::Community => 2,
            Category::Business => 3,
            Category::Rest => 4,
        }
    }
}

/// The activity types offered by the calendar form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    StreamMainContent,
    StreamJustChatting,
    StreamCollab,
    StreamSpecialEvent,
    VideoEditing,
    Thumbnails,
    ShortsClips,
    SocialPosting,
    SocialEngagement,
    CommunityDiscord,
    CommunityGameNight,
    AnalyticsReview,
    SponsorOutreach,
    AdminFinance,
    RestDay,
    SkillDevelopment,
}

impl ActivityType {
    pub const ALL: [ActivityType; 16] = [
        ActivityType::StreamMainContent,
        ActivityType::StreamJustChatting,
        ActivityType::StreamCollab,
        ActivityType::StreamSpecialEvent,
        ActivityType::VideoEditing,
        ActivityType::Thumbnails,
        ActivityType::ShortsClips,
        ActivityType::SocialPosting,
        ActivityType::SocialEngagement,
        ActivityType::CommunityDiscord,
        ActivityType::CommunityGameNight,
        ActivityType::AnalyticsReview,
        ActivityType::SponsorOutreach,
        ActivityType::AdminFinance,
        ActivityType::RestDay,
        ActivityType::SkillDevelopment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::StreamMainContent => "Stream - Main Content",
            ActivityType::StreamJustChatting => "Stream - Just Chatting",
            ActivityType::StreamCollab => "Stream - Collab",
            ActivityType::StreamSpecialEvent => "Stream - Special Event",
            ActivityType::VideoEditing => "Content Creation - Video Editing",
            ActivityType::Thumbnails => "Content Creation - Thumbnails",
            ActivityType::ShortsClips => "Content Creation - Shorts/Clips",
            ActivityType::SocialPosting => "Social Media - Posting",
            ActivityType::SocialEngagement => "Social Media - Engagement",
            ActivityType::CommunityDiscord => "Community - Discord",
            ActivityType::CommunityGameNight => "Community - Game Night",
            ActivityType::AnalyticsReview => "Business - Analytics Review",
            ActivityType::SponsorOutreach => "Business - Sponsor Outreach",
            ActivityType::AdminFinance => "Business - Admin/Finance",
            ActivityType::RestDay => "Personal - Rest Day",
            ActivityType::SkillDevelopment => "Personal - Skill Development",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Twitch,
    YouTube,
    XTwitter,
    Facebook,
    Tumblr,
    Discord,
    Multiple,
    NotApplicable,
}

impl Platform {
    pub const ALL: [Platform; 8] = [
        Platform::Twitch,
        Platform::YouTube,
        Platform::XTwitter,
        Platform::Facebook,
        Platform::Tumblr,
        Platform::Discord,
        Platform::Multiple,
        Platform::NotApplicable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitch => "Twitch",
            Platform::YouTube => "YouTube",
            Platform::XTwitter => "X/Twitter",
            Platform::Facebook => "Facebook",
            Platform::Tumblr => "Tumblr",
            Platform::Discord => "Discord",
            Platform::Multiple => "Multiple",
            Platform::NotApplicable => "N/A",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Not Started" => Some(Status::NotStarted),
            "In Progress" => Some(Status::InProgress),
            "Done" => Some(Status::Done),
            _ => None,
        }
    }
}

// ── Durations ────────────────────────────────────────────────────

/// Parse an `HH:MM` (or `HH:MM:SS`) time-of-day. Blank or malformed input is `None`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Hours between two times of day, rounded to 2 decimals.
///
/// An end before the start crosses midnight. Either side missing, or both
/// equal, gives 0.
pub fn duration_hours(start: Option<NaiveTime>, end: Option<NaiveTime>) -> f64 {
    let (Some(start), Some(end)) = (start, end) else {
        return 0.0;
    };
    let start_min = (start.hour() * 60 + start.minute()) as i64;
    let mut end_min = (end.hour() * 60 + end.minute()) as i64;
    if end_min == start_min {
        return 0.0;
    }
    if end_min < start_min {
        end_min += 24 * 60;
    }
    round2((end_min - start_min) as f64 / 60.0)
}

/// [`duration_hours`] over raw `HH:MM` strings
pub fn duration_between(start: &str, end: &str) -> f64 {
    duration_hours(parse_time(start), parse_time(end))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One decimal place, as weekly totals are displayed. Ties round away from zero.
pub fn format_hours(hours: f64) -> String {
    let tenths = (hours * 10.0).round() / 10.0;
    format!("{tenths:.1}")
}

/// A row's duration cell: `0` when empty, otherwise one decimal place
pub fn format_duration_cell(hours: f64) -> String {
    if hours > 0.0 {
        format_hours(hours)
    } else {
        "0".to_string()
    }
}

// ── Rows ─────────────────────────────────────────────────────────

/// One time block as stored in the document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRow {
    pub day: usize,
    pub row: usize,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub activity_type: Option<String>,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub content_pillar: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub duration: f64,
}

impl CalendarRow {
    /// Read a grid slot from the document. Missing fields are `None`; `duration` is recomputed.
    pub fn read(doc: &Document, week: &WeekKey, day: usize, row: usize) -> Self {
        let text = |field: CalendarField| -> Option<String> {
            match doc.lookup(&DocPath::calendar(week, day, row, field)) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            }
        };
        let mut entry = CalendarRow {
            day,
            row,
            time_start: text(CalendarField::TimeStart),
            time_end: text(CalendarField::TimeEnd),
            activity_type: text(CalendarField::ActivityType),
            description: text(CalendarField::Description),
            platform: text(CalendarField::Platform),
            content_pillar: text(CalendarField::ContentPillar),
            status: text(CalendarField::Status),
            notes: text(CalendarField::Notes),
            duration: 0.0,
        };
        entry.duration = entry.compute_duration();
        entry
    }

    pub fn compute_duration(&self) -> f64 {
        duration_hours(
            self.time_start.as_deref().and_then(parse_time),
            self.time_end.as_deref().and_then(parse_time),
        )
    }

    /// Category this row's hours count toward, if any
    pub fn category(&self) -> Option<Category> {
        self.activity_type
            .as_deref()
            .filter(|a| !a.is_empty())
            .and_then(Category::for_activity)
    }

    /// Stored status, defaulting to Not Started
    pub fn status(&self) -> Status {
        self.status
            .as_deref()
            .and_then(Status::parse)
            .unwrap_or_default()
    }

    pub fn day_name(&self) -> &'static str {
        DAY_NAMES[self.day % DAYS_PER_WEEK]
    }
}

// ── Totals ───────────────────────────────────────────────────────

/// Hours per category for one week, kept in whole hundredths of an hour
/// so sums of rounded durations stay exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    hundredths: [i64; 5],
}

fn to_hundredths(hours: f64) -> i64 {
    (hours * 100.0).round() as i64
}

impl CategoryTotals {
    pub fn add(&mut self, category: Category, hours: f64) {
        self.hundredths[category.index()] += to_hundredths(hours);
    }

    pub fn get(&self, category: Category) -> f64 {
        self.hundredths[category.index()] as f64 / 100.0
    }

    pub fn grand_total(&self) -> f64 {
        self.hundredths.iter().sum::<i64>() as f64 / 100.0
    }

    /// Strictly more than [`OVERWORK_THRESHOLD_HOURS`]
    pub fn is_overworked(&self) -> bool {
        self.hundredths.iter().sum::<i64>() > to_hundredths(OVERWORK_THRESHOLD_HOURS)
    }
}

impl Serialize for CategoryTotals {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Category::ALL.len()))?;
        for category in Category::ALL {
            map.serialize_entry(&category, &self.get(category))?;
        }
        map.end()
    }
}

/// Everything the calendar view shows for one week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    pub week: WeekKey,
    pub label: String,
    pub range: String,
    pub rows: Vec<CalendarRow>,
    pub totals: CategoryTotals,
    pub grand_total: f64,
    pub overworked: bool,
}

/// Compute durations and category totals for a week without writing anything.
pub fn summarize_week(doc: &Document, week: &WeekKey) -> WeekSummary {
    let mut rows = Vec::with_capacity(DAYS_PER_WEEK * ROWS_PER_DAY);
    let mut totals = CategoryTotals::default();

    for day in 0..DAYS_PER_WEEK {
        for row in 0..ROWS_PER_DAY {
            let entry = CalendarRow::read(doc, week, day, row);
            if entry.duration > 0.0 {
                if let Some(category) = entry.category() {
                    totals.add(category, entry.duration);
                }
            }
            rows.push(entry);
        }
    }

    WeekSummary {
        week: *week,
        label: week.label(),
        range: week.range_label(),
        rows,
        grand_total: totals.grand_total(),
        overworked: totals.is_overworked(),
        totals,
    }
}

impl WeekSummary {
    /// The week as the calendar view shows it: formatted hours, day names,
    /// and each row's status.
    pub fn display(&self) -> WeekDisplay {
        let rows = self
            .rows
            .iter()
            .map(|r| RowDisplay {
                day: r.day_name(),
                date: self.week.day(r.day).format("%Y-%m-%d").to_string(),
                row: r.row,
                time: match (r.time_start.as_deref(), r.time_end.as_deref()) {
                    (None, None) => String::new(),
                    (start, end) => format!("{}-{}", start.unwrap_or(""), end.unwrap_or("")),
                },
                activity: r.activity_type.clone().unwrap_or_default(),
                category: r.category().map(|c| c.label()),
                platform: r.platform.clone().unwrap_or_default(),
                status: r.status().as_str(),
                duration: format_duration_cell(r.duration),
            })
            .collect();

        let totals = Category::ALL
            .iter()
            .map(|c| (c.label(), format_hours(self.totals.get(*c))))
            .collect();

        WeekDisplay {
            week: self.week.to_string(),
            label: self.label.clone(),
            range: self.range.clone(),
            rows,
            totals,
            grand_total: format_hours(self.grand_total),
            overworked: self.overworked,
        }
    }
}

/// One grid row, formatted for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDisplay {
    pub day: &'static str,
    pub date: String,
    pub row: usize,
    pub time: String,
    pub activity: String,
    pub category: Option<&'static str>,
    pub platform: String,
    pub status: &'static str,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekDisplay {
    pub week: String,
    pub label: String,
    pub range: String,
    pub rows: Vec<RowDisplay>,
    pub totals: Vec<(&'static str, String)>,
    pub grand_total: String,
    pub overworked: bool,
}

/// Why a value written to a calendar field won't behave as the form expects, if it won't.
pub fn input_warning(field: CalendarField, value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) if !s.trim().is_empty() => s.as_str(),
        Value::String(_) | Value::Null => return None,
        _ if field == CalendarField::Duration => "",
        other => return Some(format!("{} expects text, got {other}", field.key())),
    };
    match field {
        CalendarField::TimeStart | CalendarField::TimeEnd if parse_time(text).is_none() => {
            Some(format!("'{text}' is not an HH:MM time and counts as empty"))
        }
        CalendarField::ActivityType if ActivityType::parse(text).is_none() => {
            match Category::for_activity(text) {
                Some(_) => None,
                None => Some(format!("'{text}' is not a known activity and won't be totalled")),
            }
        }
        CalendarField::Platform if Platform::parse(text).is_none() => {
            Some(format!("'{text}' is not a known platform"))
        }
        CalendarField::Status if Status::parse(text).is_none() => {
            Some(format!("'{text}' is not a known status and reads as Not Started"))
        }
        CalendarField::Duration => {
            Some("duration is derived and is overwritten when the week is recalculated".to_string())
        }
        _ => None,
    }
}

/// Recompute a whole week: write every row's `duration` back and return the totals.
pub fn recalc_week<S: Storage>(store: &mut PlannerStore<S>, week: &WeekKey) -> Result<WeekSummary> {
    let summary = summarize_week(store.get_all(), week);

    let mut batch = store.batch();
    for entry in &summary.rows {
        batch.set(
            DocPath::calendar(week, entry.day, entry.row, CalendarField::Duration),
            entry.duration,
        );
    }
    batch.execute()?;

    log::debug!(
        "Recalculated calendar week {week}: {:.2}h total{}",
        summary.grand_total,
        if summary.overworked { " (overworked)" } else { "" }
    );
    Ok(summary)
}
