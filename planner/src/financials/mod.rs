// 36-month financial projections: monthly rollups, running profit, yearly summaries.

use crate::document::Document;
use crate::error::Result;
use crate::schema::{DocPath, FieldKind, FinancialField};
use crate::storage::Storage;
use crate::store::PlannerStore;
use serde::Serialize;
use serde_json::Value;

pub const MONTHS: u32 = 36;
pub const MONTHS_PER_YEAR: u32 = 12;

// ── Phases ───────────────────────────────────────────────────────

/// Growth phase a projection month belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Foundation,
    Traction,
    Acceleration,
    Scale,
}

impl Phase {
    pub fn for_month(month: u32) -> Self {
        match month {
            4..=8 => Phase::Traction,
            9..=18 => Phase::Acceleration,
            19..=MONTHS => Phase::Scale,
            _ => Phase::Foundation,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Foundation => "Foundation",
            Phase::Traction => "Traction",
            Phase::Acceleration => "Acceleration",
            Phase::Scale => "Scale",
        }
    }
}

// ── Profit tone ──────────────────────────────────────────────────

/// Highlight class for a profit figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitTone {
    Gain,
    Loss,
}

impl ProfitTone {
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            ProfitTone::Loss
        } else {
            ProfitTone::Gain
        }
    }
}

// ── Formatting ───────────────────────────────────────────────────

/// Format a dollar amount for display.
///
/// `0` is `$0`; magnitudes of 1000 and up get thousands separators and no
/// decimals; smaller magnitudes get exactly two decimals, ties rounding away
/// from zero. Negatives carry a leading `-`.
pub fn format_currency(value: f64) -> String {
    if value == 0.0 {
        return "$0".to_string();
    }
    let abs = value.abs();
    let formatted = if abs >= 1000.0 {
        format!("${}", group_thousands(abs.round()))
    } else {
        let cents = (abs * 100.0).round() / 100.0;
        format!("${cents:.2}")
    };
    if value < 0.0 {
        format!("-{formatted}")
    } else {
        formatted
    }
}

/// Whole-dollar amount with thousands separators and no sign or symbol
pub fn format_whole(value: f64) -> String {
    let grouped = group_thousands(value.abs().round());
    if value.round() < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn group_thousands(whole: f64) -> String {
    let digits = format!("{whole:.0}");
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ── Monthly rollups ──────────────────────────────────────────────

/// Read a numeric input the way the form does: numbers as-is, numeric
/// strings parsed, anything else 0.
pub fn numeric(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Why a value written to a month field won't count the way it looks, if it won't.
pub fn input_warning(field: FinancialField, value: &Value) -> Option<String> {
    match field.kind() {
        FieldKind::Text => None,
        FieldKind::Derived => Some(format!(
            "{} is derived and is overwritten when the projection is recalculated",
            field.key()
        )),
        FieldKind::Metric | FieldKind::Revenue | FieldKind::Expense => match value {
            Value::Null | Value::Number(_) => None,
            Value::String(s) if s.trim().is_empty() || s.trim().parse::<f64>().is_ok() => None,
            other => Some(format!("{} expects a number; {other} counts as 0", field.key())),
        },
    }
}

fn field_value(doc: &Document, month: u32, field: FinancialField) -> f64 {
    numeric(doc.lookup(&DocPath::financial(month, field)))
}

/// Derived figures for one month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotals {
    pub month: u32,
    pub phase: Phase,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub cumulative_profit: f64,
}

impl MonthTotals {
    pub fn net_tone(&self) -> ProfitTone {
        ProfitTone::of(self.net_profit)
    }

    pub fn cumulative_tone(&self) -> ProfitTone {
        ProfitTone::of(self.cumulative_profit)
    }

    pub fn display(&self) -> MonthDisplay {
        MonthDisplay {
            month: self.month,
            phase: self.phase.name(),
            total_revenue: format_currency(self.total_revenue),
            total_expenses: format_currency(self.total_expenses),
            net_profit: format_currency(self.net_profit),
            cumulative_profit: format_currency(self.cumulative_profit),
            net_tone: self.net_tone(),
            cumulative_tone: self.cumulative_tone(),
        }
    }
}

/// A month as the projection table shows it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthDisplay {
    pub month: u32,
    pub phase: &'static str,
    pub total_revenue: String,
    pub total_expenses: String,
    pub net_profit: String,
    pub cumulative_profit: String,
    pub net_tone: ProfitTone,
    pub cumulative_tone: ProfitTone,
}

/// Revenue, expenses, and net profit for a single month (cumulative left at 0).
pub fn month_totals(doc: &Document, month: u32) -> MonthTotals {
    let total_revenue: f64 = FinancialField::REVENUE
        .iter()
        .map(|f| field_value(doc, month, *f))
        .sum();
    let total_expenses: f64 = FinancialField::EXPENSES
        .iter()
        .map(|f| field_value(doc, month, *f))
        .sum();
    MonthTotals {
        month,
        phase: Phase::for_month(month),
        total_revenue,
        total_expenses,
        net_profit: total_revenue - total_expenses,
        cumulative_profit: 0.0,
    }
}

// ── Yearly summaries ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: u32,
    pub first_month: u32,
    pub last_month: u32,
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub avg_revenue: f64,
}

impl YearSummary {
    pub fn profit_tone(&self) -> ProfitTone {
        ProfitTone::of(self.profit)
    }

    pub fn display(&self) -> YearDisplay {
        YearDisplay {
            year: self.year,
            months: format!("{}-{}", self.first_month, self.last_month),
            revenue: format_currency(self.revenue),
            expenses: format_currency(self.expenses),
            profit: format_currency(self.profit),
            avg_revenue: format_currency(self.avg_revenue),
            profit_tone: self.profit_tone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearDisplay {
    pub year: u32,
    pub months: String,
    pub revenue: String,
    pub expenses: String,
    pub profit: String,
    pub avg_revenue: String,
    pub profit_tone: ProfitTone,
}

fn year_summary(months: &[MonthTotals], year: u32) -> YearSummary {
    let first_month = (year - 1) * MONTHS_PER_YEAR + 1;
    let last_month = year * MONTHS_PER_YEAR;
    let in_year = months
        .iter()
        .filter(|m| (first_month..=last_month).contains(&m.month));

    let (revenue, expenses, profit) = in_year.fold((0.0, 0.0, 0.0), |(r, e, p), m| {
        (r + m.total_revenue, e + m.total_expenses, p + m.net_profit)
    });

    YearSummary {
        year,
        first_month,
        last_month,
        revenue,
        expenses,
        profit,
        avg_revenue: revenue / MONTHS_PER_YEAR as f64,
    }
}

// ── Full recomputation ───────────────────────────────────────────

/// All 36 months plus the three yearly summaries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub months: Vec<MonthTotals>,
    pub years: Vec<YearSummary>,
}

impl Projection {
    pub fn month(&self, month: u32) -> Option<&MonthTotals> {
        self.months.iter().find(|m| m.month == month)
    }

    /// Cumulative profit after the last month
    pub fn ending_cumulative(&self) -> f64 {
        self.months
            .last()
            .map(|m| m.cumulative_profit)
            .unwrap_or_default()
    }

    pub fn display(&self) -> ProjectionDisplay {
        ProjectionDisplay {
            months: self.months.iter().map(MonthTotals::display).collect(),
            years: self.years.iter().map(YearSummary::display).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionDisplay {
    pub months: Vec<MonthDisplay>,
    pub years: Vec<YearDisplay>,
}

/// Compute every month in order 1→36 without writing anything.
///
/// The running sum makes this strictly sequential: month `m`'s cumulative
/// profit depends on every earlier month.
pub fn project(doc: &Document) -> Projection {
    let mut cumulative = 0.0;
    let months: Vec<MonthTotals> = (1..=MONTHS)
        .map(|month| {
            let mut totals = month_totals(doc, month);
            cumulative += totals.net_profit;
            totals.cumulative_profit = cumulative;
            totals
        })
        .collect();

    let years = (1..=MONTHS / MONTHS_PER_YEAR)
        .map(|year| year_summary(&months, year))
        .collect();

    Projection { months, years }
}

/// Recompute every month and write `totalRevenue`, `totalExpenses`,
/// `netProfit`, and `cumulativeProfit` back into the store.
pub fn recalc_all<S: Storage>(store: &mut PlannerStore<S>) -> Result<Projection> {
    let projection = project(store.get_all());

    let mut batch = store.batch();
    for m in &projection.months {
        batch
            .set(DocPath::financial(m.month, FinancialField::TotalRevenue), m.total_revenue)
            .set(DocPath::financial(m.month, FinancialField::TotalExpenses), m.total_expenses)
            .set(DocPath::financial(m.month, FinancialField::NetProfit), m.net_profit)
            .set(
                DocPath::financial(m.month, FinancialField::CumulativeProfit),
                m.cumulative_profit,
            );
    }
    batch.execute()?;

    log::debug!(
        "Recalculated {MONTHS}-month projection, ending cumulative profit {}",
        format_currency(projection.ending_cumulative())
    );
    Ok(projection)
}
