use crate::autosave::{AutoSave, FieldInput};
use crate::calendar::{self, WeekKey, WeekSummary};
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::financials::{self, Projection};
use crate::progress::{self, ProgressReport};
use crate::schema::{DocPath, Namespace};
use crate::storage::Storage;
use crate::store::PlannerStore;
use serde_json::Value;
use std::time::Instant;

/// Derived views that were recomputed after a write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recomputed {
    pub week: Option<WeekSummary>,
    pub projection: Option<Projection>,
    /// Values just written that won't behave the way they look
    pub warnings: Vec<String>,
}

/// One planner session: the store, its autosave queue, and the week on screen.
///
/// Every write goes through here so the derived calendar and financial
/// fields stay in step with the raw fields they come from.
pub struct PlannerSession<S: Storage> {
    store: PlannerStore<S>,
    autosave: AutoSave,
    week: WeekKey,
}

impl<S: Storage> PlannerSession<S> {
    pub fn new(store: PlannerStore<S>, week: WeekKey) -> Self {
        PlannerSession {
            store,
            autosave: AutoSave::default(),
            week,
        }
    }

    pub fn with_config(storage: S, config: &PlannerConfig, week: WeekKey) -> Self {
        PlannerSession {
            store: PlannerStore::with_config(storage, config),
            autosave: AutoSave::from_config(config),
            week,
        }
    }

    pub fn store(&self) -> &PlannerStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PlannerStore<S> {
        &mut self.store
    }

    pub fn into_store(self) -> PlannerStore<S> {
        self.store
    }

    pub fn week(&self) -> WeekKey {
        self.week
    }

    /// Recompute every derived field: the selected week and all 36 months.
    pub fn load(&mut self) -> Result<Recomputed> {
        let week = calendar::recalc_week(&mut self.store, &self.week)?;
        let projection = financials::recalc_all(&mut self.store)?;
        Ok(Recomputed {
            week: Some(week),
            projection: Some(projection),
            warnings: Vec::new(),
        })
    }

    /// Write a value and recompute whatever depends on it.
    pub fn edit(&mut self, path: impl Into<DocPath>, value: impl Into<Value>) -> Result<Recomputed> {
        let path = path.into();
        let value: Value = value.into();
        let warning = input_warning(&path, &value);
        self.store.set(path.clone(), value)?;
        let mut recomputed = self.recompute_for(&[path])?;
        recomputed.warnings.extend(warning);
        Ok(recomputed)
    }

    /// Feed a keystroke into the autosave queue.
    pub fn input(&mut self, path: impl Into<DocPath>, input: &FieldInput, now: Instant) {
        self.autosave.on_input(path, input, now);
    }

    /// Commit a field immediately (focus left it).
    pub fn commit(&mut self, path: impl Into<DocPath>, input: &FieldInput) -> Result<Recomputed> {
        let path = self.autosave.on_commit(&mut self.store, path, input)?;
        let warning = input_warning(&path, &input.to_value());
        let mut recomputed = self.recompute_for(&[path])?;
        recomputed.warnings.extend(warning);
        Ok(recomputed)
    }

    /// Write any autosaved values that are due and recompute after them.
    pub fn tick(&mut self, now: Instant) -> Result<Recomputed> {
        let written = self.autosave.tick(&mut self.store, now)?;
        self.recompute_for(&written)
    }

    /// Write every pending autosave value and flush the store.
    pub fn close(&mut self) -> Result<Recomputed> {
        let written = self.autosave.flush_pending(&mut self.store)?;
        let recomputed = self.recompute_for(&written)?;
        self.store.flush()?;
        Ok(recomputed)
    }

    pub fn select_week(&mut self, week: WeekKey) -> Result<WeekSummary> {
        self.week = week;
        calendar::recalc_week(&mut self.store, &self.week)
    }

    pub fn next_week(&mut self) -> Result<WeekSummary> {
        self.select_week(self.week.next())
    }

    pub fn previous_week(&mut self) -> Result<WeekSummary> {
        self.select_week(self.week.previous())
    }

    /// The selected week's summary, read without writing anything
    pub fn week_summary(&self) -> WeekSummary {
        calendar::summarize_week(self.store.get_all(), &self.week)
    }

    pub fn projection(&self) -> Projection {
        financials::project(self.store.get_all())
    }

    pub fn progress(&self) -> ProgressReport {
        progress::report(self.store.get_all())
    }

    fn recompute_for(&mut self, paths: &[DocPath]) -> Result<Recomputed> {
        let touches = |ns: Namespace| paths.iter().any(|p| p.namespace() == Some(ns));
        let touches_calendar = touches(Namespace::Calendar);
        let touches_financials = touches(Namespace::Financials);

        let mut recomputed = Recomputed::default();
        if touches_calendar {
            recomputed.week = Some(calendar::recalc_week(&mut self.store, &self.week)?);
        }
        if touches_financials {
            recomputed.projection = Some(financials::recalc_all(&mut self.store)?);
        }
        Ok(recomputed)
    }
}

/// Check a value against the field its path names, logging anything suspicious.
fn input_warning(path: &DocPath, value: &Value) -> Option<String> {
    let warning = match (path.calendar_field(), path.financial_field()) {
        (Some(field), _) => calendar::input_warning(field, value),
        (_, Some(field)) => financials::input_warning(field, value),
        _ => None,
    };
    if let Some(warning) = &warning {
        log::warn!("{path}: {warning}");
    }
    warning
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CalendarField;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::time::Duration;

    fn week() -> WeekKey {
        "2026-10-12".parse().unwrap()
    }

    fn session() -> PlannerSession<MemoryStorage> {
        PlannerSession::new(PlannerStore::open(MemoryStorage::new()), week())
    }

    #[test]
    fn test_calendar_edit_recalculates_selected_week() {
        let mut session = session();
        let start = DocPath::calendar(&week(), 0, 0, CalendarField::TimeStart);
        let end = DocPath::calendar(&week(), 0, 0, CalendarField::TimeEnd);
        let activity = DocPath::calendar(&week(), 0, 0, CalendarField::ActivityType);

        session.edit(activity, "Stream - Main Content").unwrap();
        session.edit(start, "18:00").unwrap();
        let recomputed = session.edit(end, "21:30").unwrap();

        let summary = recomputed.week.unwrap();
        assert_eq!(summary.grand_total, 3.5);
        assert!(recomputed.projection.is_none());
        let duration = DocPath::calendar(&week(), 0, 0, CalendarField::Duration);
        assert_eq!(session.store().get(duration), Some(json!(3.5)));
    }

    #[test]
    fn test_financial_edit_recalculates_projection() {
        let mut session = session();
        let recomputed = session.edit("financials.months.1.subRevenue", 250).unwrap();
        assert!(recomputed.week.is_none());
        assert_eq!(recomputed.projection.unwrap().ending_cumulative(), 250.0);
        assert_eq!(
            session.store().get("financials.months.1.netProfit"),
            Some(json!(250.0))
        );
    }

    #[test]
    fn test_plan_edit_recomputes_nothing() {
        let mut session = session();
        let recomputed = session.edit("plan.section1.mission", "Grow").unwrap();
        assert_eq!(recomputed, Recomputed::default());
    }

    #[test]
    fn test_edit_reports_suspicious_values() {
        let mut session = session();
        let platform = DocPath::calendar(&week(), 1, 0, CalendarField::Platform);
        let recomputed = session.edit(platform.clone(), "MySpace").unwrap();
        assert_eq!(recomputed.warnings.len(), 1);
        assert!(recomputed.warnings[0].contains("MySpace"));
        // Still stored as typed
        assert_eq!(session.store().get(&platform), Some(json!("MySpace")));

        let ok = session.edit(platform, "Twitch").unwrap();
        assert!(ok.warnings.is_empty());

        let derived = session.edit("financials.months.3.netProfit", 10).unwrap();
        assert_eq!(derived.warnings.len(), 1);
        assert_eq!(
            session.store().get("financials.months.3.netProfit"),
            Some(json!(0.0))
        );

        let committed = session
            .commit("financials.months.3.donations", &FieldInput::Number("ten".into()))
            .unwrap();
        assert_eq!(committed.warnings.len(), 1);
        assert!(session.edit("plan.section1.mission", 5).unwrap().warnings.is_empty());
    }

    #[test]
    fn test_week_navigation() {
        let mut session = session();
        let next = session.next_week().unwrap();
        assert_eq!(next.week.to_string(), "2026-10-19");
        session.previous_week().unwrap();
        session.previous_week().unwrap();
        assert_eq!(session.week().to_string(), "2026-10-05");
    }

    #[test]
    fn test_autosave_tick_triggers_recalc() {
        let mut session = session();
        let now = Instant::now();
        session.input(
            "financials.months.2.donations",
            &FieldInput::Number("75".into()),
            now,
        );
        assert_eq!(session.tick(now).unwrap(), Recomputed::default());

        let recomputed = session.tick(now + Duration::from_millis(300)).unwrap();
        let projection = recomputed.projection.unwrap();
        assert_eq!(projection.month(2).unwrap().total_revenue, 75.0);
    }

    #[test]
    fn test_load_fills_derived_fields() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                "influencerPlanner",
                r#"{"version":1,"financials":{"months":{"1":{"subRevenue":"40"}}}}"#,
            )
            .unwrap();
        let mut session = PlannerSession::new(PlannerStore::open(storage), week());
        let loaded = session.load().unwrap();

        assert_eq!(loaded.week.unwrap().grand_total, 0.0);
        assert_eq!(
            session.store().get("financials.months.1.totalRevenue"),
            Some(json!(40.0))
        );
    }

    #[test]
    fn test_close_flushes_pending_input() {
        let config = PlannerConfig {
            flush: crate::config::FlushPolicy::Deferred,
            ..PlannerConfig::default()
        };
        let mut session = PlannerSession::with_config(MemoryStorage::new(), &config, week());
        session.input("plan.a", &FieldInput::Text("b".into()), Instant::now());
        session.close().unwrap();

        let store = session.into_store();
        assert!(!store.is_dirty());
        let raw = store.storage().get_item("influencerPlanner").unwrap().unwrap();
        assert!(raw.contains("\"a\":\"b\""));
    }
}
