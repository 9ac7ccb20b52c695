// The planner document: typed header plus six free-form namespaces

use crate::error::{PlannerError, Result};
use crate::schema::{DocPath, Namespace, Root};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CURRENT_VERSION: u64 = 1;

fn default_version() -> u64 {
    CURRENT_VERSION
}

/// The single persisted tree holding all planner data.
///
/// Serializes to the same JSON shape the planner has always stored:
/// `{ "version", "lastModified", "plan", "checklist", "templates",
/// "financials", "calendar", "deepDive" }`. Unknown top-level keys are kept
/// in `extra` so that export followed by import loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default, with = "iso_millis")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub plan: Map<String, Value>,
    #[serde(default)]
    pub checklist: Map<String, Value>,
    #[serde(default)]
    pub templates: Map<String, Value>,
    #[serde(default)]
    pub financials: Map<String, Value>,
    #[serde(default)]
    pub calendar: Map<String, Value>,
    #[serde(default)]
    pub deep_dive: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            version: CURRENT_VERSION,
            last_modified: None,
            plan: Map::new(),
            checklist: Map::new(),
            templates: Map::new(),
            financials: Map::new(),
            calendar: Map::new(),
            deep_dive: Map::new(),
            extra: Map::new(),
        }
    }
}

impl Document {
    /// Build a document from an arbitrary JSON value. Only mappings are accepted.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(PlannerError::ImportValidation(format!(
                "expected a JSON object, got {}",
                type_name(&value)
            )));
        }
        serde_json::from_value(value)
            .map_err(|e| PlannerError::ImportValidation(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn namespace(&self, ns: Namespace) -> &Map<String, Value> {
        match ns {
            Namespace::Plan => &self.plan,
            Namespace::Checklist => &self.checklist,
            Namespace::Templates => &self.templates,
            Namespace::Financials => &self.financials,
            Namespace::Calendar => &self.calendar,
            Namespace::DeepDive => &self.deep_dive,
        }
    }

    pub fn namespace_mut(&mut self, ns: Namespace) -> &mut Map<String, Value> {
        match ns {
            Namespace::Plan => &mut self.plan,
            Namespace::Checklist => &mut self.checklist,
            Namespace::Templates => &mut self.templates,
            Namespace::Financials => &mut self.financials,
            Namespace::Calendar => &mut self.calendar,
            Namespace::DeepDive => &mut self.deep_dive,
        }
    }

    /// Borrow the value at a path inside a namespace or an extra top-level key.
    /// Typed header fields and the root are not borrowable as JSON; use [`Document::get`].
    pub fn lookup(&self, path: &DocPath) -> Option<&Value> {
        let segments = path.segments();
        match path.root_kind()? {
            Root::Namespace(ns) => {
                let rest = &segments[1..];
                if rest.is_empty() {
                    return None;
                }
                lookup_in(self.namespace(ns), rest)
            }
            Root::Extra => lookup_in(&self.extra, segments),
            Root::Version | Root::LastModified => None,
        }
    }

    /// Read the value at `path`, or `None` when any segment is missing or a
    /// non-mapping value is hit before the path is exhausted.
    pub fn get(&self, path: &DocPath) -> Option<Value> {
        let segments = path.segments();
        match path.root_kind() {
            None => self.to_value().ok(),
            Some(Root::Version) if segments.len() == 1 => Some(Value::from(self.version)),
            Some(Root::LastModified) if segments.len() == 1 => Some(
                self.last_modified
                    .map(|ts| Value::String(format_timestamp(&ts)))
                    .unwrap_or(Value::Null),
            ),
            Some(Root::Version) | Some(Root::LastModified) => None,
            Some(Root::Namespace(ns)) if segments.len() == 1 => {
                Some(Value::Object(self.namespace(ns).clone()))
            }
            Some(_) => self.lookup(path).cloned(),
        }
    }

    /// Assign `value` at `path`, creating intermediate mappings and replacing
    /// any scalar found in the way. Does not touch `lastModified`.
    pub fn set(&mut self, path: &DocPath, value: Value) -> Result<()> {
        let segments = path.segments();
        let root = path
            .root_kind()
            .ok_or_else(|| PlannerError::InvalidPath(path.to_string()))?;

        match root {
            Root::Version => {
                if segments.len() > 1 {
                    return Err(PlannerError::TypeMismatch {
                        path: path.to_string(),
                        expected: "nothing below 'version'",
                    });
                }
                self.version = value.as_u64().ok_or_else(|| PlannerError::TypeMismatch {
                    path: path.to_string(),
                    expected: "non-negative integer",
                })?;
            }
            Root::LastModified => {
                return Err(PlannerError::ReadOnlyField(path.to_string()));
            }
            Root::Namespace(ns) if segments.len() == 1 => match value {
                Value::Object(map) => *self.namespace_mut(ns) = map,
                _ => {
                    return Err(PlannerError::TypeMismatch {
                        path: path.to_string(),
                        expected: "mapping",
                    })
                }
            },
            Root::Namespace(ns) => assign(self.namespace_mut(ns), &segments[1..], value),
            Root::Extra => assign(&mut self.extra, segments, value),
        }
        Ok(())
    }

    /// Stamp `lastModified`, keeping it strictly increasing even when the
    /// clock hasn't moved since the previous write.
    pub fn touch(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(3);
        let stamp = match self.last_modified {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        self.last_modified = Some(stamp);
        stamp
    }
}

/// Render a timestamp the way the document stores it (ISO 8601, millisecond precision, `Z`)
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

mod iso_millis {
    use super::format_timestamp;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

fn lookup_in<'a>(map: &'a Map<String, Value>, segments: &[String]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let mut current = map.get(first)?;
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn assign(map: &mut Map<String, Value>, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let slot = map
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                assign(child, rest, value);
            }
        }
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
