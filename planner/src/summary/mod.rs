// Markdown rendering of the consolidated plan.

use crate::document::Document;
use crate::financials::{self, format_whole, MONTHS};
use crate::schema::FinancialField;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

pub const TITLE: &str = "Solopreneur Influencer Business Plan";

pub const NO_DATA_NOTICE: &str = "> **No data yet.** Start filling in your business plan, \
checklist, and other sections. Your consolidated plan will appear here automatically.";

/// Plan sections in display order, with their headings
pub const PLAN_SECTIONS: [(&str, &str); 15] = [
    ("section1", "Executive Summary & Vision"),
    ("section2", "Target Audience Definition"),
    ("section3", "Value Proposition & Content Strategy"),
    ("section4", "Platform Strategy"),
    ("section5", "Engagement Funnel & Stages"),
    ("section6", "Tools & Tech Stack"),
    ("section7", "Requirements"),
    ("section8", "Monetization Strategy"),
    ("section9", "Growth Roadmap"),
    ("section10", "Engagement Plan"),
    ("section11", "Buying Power Optimization"),
    ("section12", "Metrics & Analytics Framework"),
    ("section13", "Risk Assessment & Contingency"),
    ("section14", "Solo Operations Blueprint"),
    ("appendixD", "Content Idea Bank"),
];

pub const CHECKLIST_SECTIONS: [(&str, &str); 5] = [
    ("prereqs", "Prerequisites"),
    ("week1", "Week 1"),
    ("week2", "Week 2"),
    ("week3", "Week 3"),
    ("week4", "Week 4"),
];

const FIELD_LABELS: [(&str, &str); 17] = [
    ("mission", "Mission Statement"),
    ("vision", "Vision Statement"),
    ("uvp", "Unique Value Proposition"),
    ("combo1", "Unique Combination 1"),
    ("combo2", "Unique Combination 2"),
    ("combo3", "Unique Combination 3"),
    ("functionalJob", "Functional Job"),
    ("emotionalJob", "Emotional Job"),
    ("socialJob", "Social Job"),
    ("brandName", "Brand Name"),
    ("tagline", "Tagline"),
    ("legalEntity", "Legal Entity Type"),
    ("stateCountry", "State/Country"),
    ("targetRevenue", "Target Annual Revenue"),
    ("timelineMonths", "Timeline (Months)"),
    ("timelineYears", "Timeline (Years)"),
    ("elevatorPitch", "Elevator Pitch"),
];

static UPPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").expect("valid upper regex"));
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)").expect("valid digit regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space regex"));

// ── Labels ───────────────────────────────────────────────────────

/// Turn a camelCase key into a display label: `targetRevenue2026` → `Target Revenue 2026`.
pub fn humanize(key: &str) -> String {
    let spaced = UPPER_RE.replace_all(key, " $1");
    let mut chars = spaced.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    let numbered = DIGITS_RE.replace_all(&capitalized, " $1 ");
    SPACES_RE.replace_all(numbered.trim(), " ").into_owned()
}

pub fn field_label(key: &str) -> String {
    FIELD_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| humanize(key))
}

/// Whether a subtree holds anything worth showing: `true`, a non-blank
/// string, or a non-zero number somewhere inside a mapping or sequence.
pub fn has_content(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().any(child_has_content),
        Value::Array(items) => items.iter().any(child_has_content),
        _ => false,
    }
}

fn child_has_content(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Object(_) | Value::Array(_) => has_content(value),
        Value::Null => false,
    }
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn dollars(value: f64) -> String {
    if value.round() < 0.0 {
        format!("-${}", format_whole(value.abs()))
    } else {
        format!("${}", format_whole(value))
    }
}

// ── Rendering ────────────────────────────────────────────────────

struct Markdown {
    out: String,
    blocks: usize,
}

impl Markdown {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn heading(&mut self, level: usize, text: &str) {
        self.line(&format!("{} {text}", "#".repeat(level)));
        self.line("");
    }

    fn block(&mut self, heading: &str) {
        self.blocks += 1;
        self.heading(3, heading);
    }

    fn fields(&mut self, map: &Map<String, Value>, depth: usize) {
        let indent = "  ".repeat(depth);
        for (key, value) in map {
            let label = field_label(key);
            match value {
                Value::Null => {}
                Value::String(s) if s.is_empty() => {}
                Value::Object(inner) => {
                    if has_content(value) {
                        self.line(&format!("{indent}- **{label}**"));
                        self.fields(inner, depth + 1);
                    }
                }
                Value::Bool(true) => self.line(&format!("{indent}- [x] {label}")),
                Value::Bool(false) => {}
                Value::Array(items) => {
                    let joined: Vec<String> = items.iter().map(display_scalar).collect();
                    self.line(&format!("{indent}- **{label}:** {}", joined.join(", ")));
                }
                scalar => self.line(&format!("{indent}- **{label}:** {}", display_scalar(scalar))),
            }
        }
    }

    fn end_block(&mut self) {
        self.line("");
    }
}

fn section_number(key: &str) -> String {
    match key.strip_prefix("section") {
        Some(n) => n.to_string(),
        None => key.replacen("appendix", "App ", 1),
    }
}

/// Render the consolidated plan. `generated` is stamped under the title.
pub fn render(doc: &Document, generated: NaiveDate) -> String {
    let mut md = Markdown {
        out: String::new(),
        blocks: 0,
    };

    md.heading(1, TITLE);
    if let Some(brand) = doc
        .plan
        .get("section1")
        .and_then(|s| s.get("brandName"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
    {
        md.heading(2, brand);
    }
    md.line(&format!("_Generated {}_", generated.format("%Y-%m-%d")));
    md.line("");

    for (key, title) in PLAN_SECTIONS {
        let Some(section) = doc.plan.get(key).filter(|v| has_content(v)) else {
            continue;
        };
        md.block(&format!("Section {}: {title}", section_number(key)));
        if let Value::Object(map) = section {
            md.fields(map, 0);
        }
        md.end_block();
    }

    if doc.checklist.values().any(child_has_content) {
        md.block("30-Day Quick-Start Checklist");
        for (key, title) in CHECKLIST_SECTIONS {
            if let Some(Value::Object(items)) = doc.checklist.get(key).filter(|v| has_content(v)) {
                md.line(&format!("**{title}**"));
                md.line("");
                md.fields(items, 0);
                md.line("");
            }
        }
    }

    if let Some(Value::Object(months)) = doc.financials.get("months").filter(|v| has_content(v)) {
        render_financials(&mut md, months);
    }

    if let Some(targets) = doc.deep_dive.get("targets").filter(|v| has_content(v)) {
        md.block("Key Metric Targets");
        if let Value::Object(map) = targets {
            md.fields(map, 0);
        }
        md.end_block();
    }

    if md.blocks == 0 {
        md.line(NO_DATA_NOTICE);
    }
    md.out
}

fn render_financials(md: &mut Markdown, months: &Map<String, Value>) {
    md.block("Financial Projections Summary");
    md.line("| Month | Revenue | Expenses | Net Profit |");
    md.line("|------:|--------:|---------:|-----------:|");
    for month in 1..=MONTHS {
        let Some(record) = months.get(&month.to_string()).filter(|v| has_content(v)) else {
            continue;
        };
        let field = |f: FinancialField| financials::numeric(record.get(f.key()));
        let revenue = field(FinancialField::TotalRevenue);
        let expenses = field(FinancialField::TotalExpenses);
        let net = match field(FinancialField::NetProfit) {
            n if n != 0.0 => n,
            _ => revenue - expenses,
        };
        md.line(&format!(
            "| {month} | {} | {} | {} |",
            dollars(revenue),
            dollars(expenses),
            dollars(net)
        ));
    }
    md.end_block();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::PlannerStore;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("targetRevenue"), "Target Revenue");
        assert_eq!(humanize("week1Goal"), "Week 1 Goal");
        assert_eq!(humanize("platforms"), "Platforms");
        assert_eq!(humanize("subs2026Target"), "Subs 2026 Target");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_field_labels_prefer_table() {
        assert_eq!(field_label("uvp"), "Unique Value Proposition");
        assert_eq!(field_label("timelineMonths"), "Timeline (Months)");
        assert_eq!(field_label("streamSchedule"), "Stream Schedule");
    }

    #[test]
    fn test_has_content() {
        assert!(!has_content(&json!({})));
        assert!(!has_content(&json!({ "a": "  ", "b": 0, "c": false, "d": null })));
        assert!(!has_content(&json!("text")));
        assert!(has_content(&json!({ "a": { "b": 3 } })));
        assert!(has_content(&json!({ "a": true })));
        assert!(has_content(&json!({ "a": ["x"] })));
        assert!(!has_content(&json!({ "a": ["", 0] })));
    }

    #[test]
    fn test_empty_document_renders_notice() {
        let text = render(&Document::default(), date());
        assert!(text.starts_with("# Solopreneur Influencer Business Plan"));
        assert!(text.contains("No data yet"));
        assert!(!text.contains("### "));
    }

    #[test]
    fn test_renders_sections_checklist_and_targets() {
        let mut store = PlannerStore::open(MemoryStorage::new());
        store.set("plan.section1.brandName", "NovaByte").unwrap();
        store.set("plan.section1.mission", "Help small creators").unwrap();
        store.set("plan.section1.tagline", "").unwrap();
        store.set("plan.appendixD.ideas", json!(["Speedruns", "Retro nights"])).unwrap();
        store.set("plan.section2.empty", "").unwrap();
        store.set("checklist.week1.setupDiscord", true).unwrap();
        store.set("checklist.week1.buyMic", false).unwrap();
        store.set("deepDive.targets.followers", 1000).unwrap();

        let text = render(store.get_all(), date());
        assert!(text.contains("## NovaByte"));
        assert!(text.contains("_Generated 2026-10-18_"));
        assert!(text.contains("### Section 1: Executive Summary & Vision"));
        assert!(text.contains("- **Mission Statement:** Help small creators"));
        assert!(!text.contains("Tagline"));
        assert!(!text.contains("Target Audience Definition"));
        assert!(text.contains("### Section App D: Content Idea Bank"));
        assert!(text.contains("- **Ideas:** Speedruns, Retro nights"));
        assert!(text.contains("**Week 1**"));
        assert!(text.contains("- [x] Setup Discord"));
        assert!(!text.contains("Buy Mic"));
        assert!(text.contains("### Key Metric Targets"));
        assert!(text.contains("- **Followers:** 1000"));
        assert!(!text.contains("No data yet"));
    }

    #[test]
    fn test_financial_table_uses_derived_totals() {
        let mut store = PlannerStore::open(MemoryStorage::new());
        store.set("financials.months.1.subRevenue", 1500).unwrap();
        store.set("financials.months.1.hardwareCosts", 200).unwrap();
        store.set("financials.months.2.otherExpenses", 2500).unwrap();
        financials::recalc_all(&mut store).unwrap();

        let text = render(store.get_all(), date());
        assert!(text.contains("### Financial Projections Summary"));
        assert!(text.contains("| 1 | $1,500 | $200 | $1,300 |"));
        assert!(text.contains("| 2 | $0 | $2,500 | -$2,500 |"));
        assert!(!text.contains("| 3 |"));
    }

    #[test]
    fn test_nested_fields_are_indented() {
        let mut store = PlannerStore::open(MemoryStorage::new());
        store.set("plan.section4.twitch.goal", "Affiliate").unwrap();
        let text = render(store.get_all(), date());
        assert!(text.contains("- **Twitch**\n  - **Goal:** Affiliate"));
    }
}
