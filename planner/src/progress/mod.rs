// Completion statistics over the document tree.

use crate::document::Document;
use crate::schema::Namespace;
use serde::Serialize;
use serde_json::Value;

/// Filled vs. total leaf counts for one subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionStats {
    pub filled: usize,
    pub total: usize,
}

impl SectionStats {
    /// Rounded completion percentage; 0 for an empty subtree.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.filled as f64 / self.total as f64 * 100.0).round() as u32
    }

    fn merge(&mut self, other: SectionStats) {
        self.filled += other.filled;
        self.total += other.total;
    }
}

/// Count the leaves under `value`. Every non-mapping value is a leaf
/// (sequences included) and is filled unless it is `""`, `null`, or `false`.
pub fn count(value: &Value) -> SectionStats {
    match value {
        Value::Object(map) => map.values().fold(SectionStats::default(), |mut acc, v| {
            acc.merge(count(v));
            acc
        }),
        leaf => SectionStats {
            filled: usize::from(is_filled(leaf)),
            total: 1,
        },
    }
}

fn is_filled(leaf: &Value) -> bool {
    !matches!(leaf, Value::Null | Value::Bool(false))
        && leaf.as_str().map_or(true, |s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceStats {
    pub namespace: Namespace,
    #[serde(flatten)]
    pub stats: SectionStats,
    pub percent: u32,
}

/// Per-namespace statistics plus an overall figure
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub namespaces: Vec<NamespaceStats>,
    pub overall: SectionStats,
    pub overall_percent: u32,
}

impl ProgressReport {
    pub fn get(&self, namespace: Namespace) -> SectionStats {
        self.namespaces
            .iter()
            .find(|n| n.namespace == namespace)
            .map(|n| n.stats)
            .unwrap_or_default()
    }
}

pub fn report(doc: &Document) -> ProgressReport {
    let mut overall = SectionStats::default();
    let namespaces = Namespace::ALL
        .iter()
        .map(|&namespace| {
            let stats = doc
                .namespace(namespace)
                .values()
                .fold(SectionStats::default(), |mut acc, v| {
                    acc.merge(count(v));
                    acc
                });
            overall.merge(stats);
            NamespaceStats {
                namespace,
                stats,
                percent: stats.percent(),
            }
        })
        .collect();

    ProgressReport {
        namespaces,
        overall,
        overall_percent: overall.percent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::PlannerStore;
    use serde_json::json;

    #[test]
    fn test_leaf_rules() {
        let tree = json!({
            "a": "",
            "b": null,
            "c": false,
            "d": "text",
            "e": 0,
            "f": true,
            "g": [],
            "nested": { "h": "x", "i": "" }
        });
        let stats = count(&tree);
        assert_eq!(stats, SectionStats { filled: 5, total: 9 });
        assert_eq!(stats.percent(), 56);
    }

    #[test]
    fn test_empty_namespace_is_zero_percent() {
        assert_eq!(SectionStats::default().percent(), 0);
        let stats = count(&json!({}));
        assert_eq!(stats.total, 0);
    }

    #[test]
    fn test_report_per_namespace_and_overall() {
        let mut store = PlannerStore::open(MemoryStorage::new());
        store.set("plan.section1.brandName", "NovaByte").unwrap();
        store.set("plan.section1.mission", "").unwrap();
        store.set("checklist.week1.a", true).unwrap();
        store.set("checklist.week1.b", false).unwrap();
        store.set("checklist.week1.c", false).unwrap();
        store.set("checklist.week1.d", false).unwrap();

        let report = report(store.get_all());
        assert_eq!(report.get(Namespace::Plan), SectionStats { filled: 1, total: 2 });
        assert_eq!(report.get(Namespace::Checklist).percent(), 25);
        assert_eq!(report.get(Namespace::Templates).total, 0);
        assert_eq!(report.overall, SectionStats { filled: 2, total: 6 });
        assert_eq!(report.overall_percent, 33);
        assert_eq!(report.namespaces.len(), 6);
    }
}
