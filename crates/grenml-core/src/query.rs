//! Attribute-matching query engine.
//!
//! A [`Query`] is a conjunction of predicates, each naming a field and one
//! of three comparisons:
//!
//! - `field` : exact equality after normalisation
//! - `field__contains` : the entity value contains the query value
//! - `field__in` : the query value contains the entity value
//!
//! Both `contains` and `in` are the same containment relation with the
//! operands swapped. On strings containment is substring search; on sets it
//! is membership of every element. Numeric fields only support equality.
//!
//! Entities expose their fields through a static accessor table
//! ([`Matchable::field_table`]). A predicate naming a field missing from the
//! table never matches.

use std::borrow::Cow;
use std::fmt;

const CONTAINS_SUFFIX: &str = "__contains";
const IN_SUFFIX: &str = "__in";

/// A value supplied by the caller in a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Str(String),
    Num(f64),
    List(Vec<QueryValue>),
}

/// A field value as seen by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    /// Known field holding no value.
    Absent,
    Str(&'a str),
    Num(f64),
    Set(Vec<&'a str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Contains,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: Op,
    pub value: QueryValue,
}

/// Conjunction of predicates. The empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    predicates: Vec<Predicate>,
}

pub type FieldAccessor<T> = for<'a> fn(&'a T) -> FieldValue<'a>;
pub type FieldTable<T> = &'static [(&'static str, FieldAccessor<T>)];

/// Entities that can be filtered by a [`Query`].
pub trait Matchable: Sized + 'static {
    fn field_table() -> FieldTable<Self>;

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Self::field_table()
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, accessor)| accessor(self))
    }

    fn matches(&self, query: &Query) -> bool {
        query.matches(self)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl QueryValue {
    /// Textual form of a scalar, used when comparing against string fields.
    fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            QueryValue::Str(s) => Some(Cow::Borrowed(s.as_str())),
            QueryValue::Num(n) => Some(Cow::Owned(format_number(*n))),
            QueryValue::Null | QueryValue::List(_) => None,
        }
    }

    /// Elements of the value viewed as a collection; a scalar is a singleton.
    fn elements(&self) -> Vec<&QueryValue> {
        match self {
            QueryValue::List(items) => items.iter().collect(),
            QueryValue::Null => Vec::new(),
            other => vec![other],
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Null => f.write_str("None"),
            QueryValue::Str(s) => f.write_str(s),
            QueryValue::Num(n) => f.write_str(&format_number(*n)),
            QueryValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        QueryValue::Str(value.clone())
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Num(value)
    }
}

impl From<f32> for QueryValue {
    fn from(value: f32) -> Self {
        QueryValue::Num(value as f64)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Num(value as f64)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Num(value as f64)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Null, Into::into)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<QueryValue>, const N: usize> From<[T; N]> for QueryValue {
    fn from(values: [T; N]) -> Self {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<'a> FieldValue<'a> {
    pub fn opt_str(value: &'a Option<String>) -> Self {
        value.as_deref().map_or(FieldValue::Absent, FieldValue::Str)
    }

    pub fn opt_num(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Num)
    }

    pub fn set<I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        FieldValue::Set(values.into_iter().map(String::as_str).collect())
    }
}

/// `C(a, b)` with the entity value as container.
fn field_contains(container: &FieldValue<'_>, contained: &QueryValue) -> bool {
    match container {
        FieldValue::Str(s) => contained
            .elements()
            .iter()
            .all(|item| item.as_text().is_some_and(|t| s.contains(t.as_ref())))
            && !matches!(contained, QueryValue::Null),
        FieldValue::Set(items) => {
            if matches!(contained, QueryValue::Null) {
                return false;
            }
            contained.elements().iter().all(|item| {
                item.as_text()
                    .is_some_and(|t| items.iter().any(|i| *i == t.as_ref()))
            })
        }
        FieldValue::Num(_) | FieldValue::Absent => false,
    }
}

/// `C(a, b)` with the query value as container.
fn query_contains(container: &QueryValue, contained: &FieldValue<'_>) -> bool {
    let members: Vec<&str> = match contained {
        FieldValue::Str(s) => vec![*s],
        FieldValue::Set(items) => items.clone(),
        FieldValue::Num(_) | FieldValue::Absent => return false,
    };
    match container {
        QueryValue::Str(q) => members.iter().all(|m| q.contains(m)),
        QueryValue::List(items) => {
            let texts: Vec<Cow<'_, str>> = items.iter().filter_map(QueryValue::as_text).collect();
            members
                .iter()
                .all(|m| texts.iter().any(|t| t.as_ref() == *m))
        }
        QueryValue::Num(_) | QueryValue::Null => false,
    }
}

fn equals(actual: &FieldValue<'_>, expected: &QueryValue) -> bool {
    match (actual, expected) {
        (FieldValue::Absent, QueryValue::Null) => true,
        (FieldValue::Str(s), QueryValue::Str(v)) => s == v,
        (FieldValue::Num(n), QueryValue::Num(v)) => n == v,
        (FieldValue::Set(items), QueryValue::Str(_) | QueryValue::List(_)) => {
            let wanted: Vec<Cow<'_, str>> = expected
                .elements()
                .into_iter()
                .filter_map(QueryValue::as_text)
                .collect();
            items.iter().all(|i| wanted.iter().any(|w| w.as_ref() == *i))
                && wanted.iter().all(|w| items.iter().any(|i| *i == w.as_ref()))
        }
        _ => false,
    }
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<QueryValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Build a predicate from a keyword such as `owners__contains`.
    pub fn parse(key: &str, value: impl Into<QueryValue>) -> Self {
        if let Some(field) = key.strip_suffix(CONTAINS_SUFFIX) {
            Self::new(field, Op::Contains, value)
        } else if let Some(field) = key.strip_suffix(IN_SUFFIX) {
            Self::new(field, Op::In, value)
        } else {
            Self::new(key, Op::Eq, value)
        }
    }

    /// Evaluate against the field value, `None` meaning the field is unknown.
    pub fn evaluate(&self, actual: Option<FieldValue<'_>>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.op {
            Op::Eq => equals(&actual, &self.value),
            Op::Contains => field_contains(&actual, &self.value),
            Op::In => query_contains(&self.value, &actual),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.op {
            Op::Eq => "",
            Op::Contains => CONTAINS_SUFFIX,
            Op::In => IN_SUFFIX,
        };
        write!(f, "{}{}={}", self.field, suffix, self.value)
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyword-style predicate: `id`, `id__contains`, `id__in`.
    pub fn filter(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.predicates.push(Predicate::parse(key, value));
        self
    }

    pub fn eq(mut self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.predicates.push(Predicate::new(field, Op::Eq, value));
        self
    }

    pub fn contains(mut self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.predicates.push(Predicate::new(field, Op::Contains, value));
        self
    }

    pub fn is_in(mut self, field: &str, value: impl Into<QueryValue>) -> Self {
        self.predicates.push(Predicate::new(field, Op::In, value));
        self
    }

    /// Shorthand for the most common lookup.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq("id", QueryValue::Str(id.into()))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches<T: Matchable>(&self, entity: &T) -> bool {
        self.predicates
            .iter()
            .all(|p| p.evaluate(entity.field(&p.field)))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", predicate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        id: String,
        owners: Vec<String>,
        altitude: Option<f64>,
        unlocode: Option<String>,
    }

    const SAMPLE_FIELDS: FieldTable<Sample> = &[
        ("id", |p| FieldValue::Str(&p.id)),
        ("owners", |p| FieldValue::set(&p.owners)),
        ("altitude", |p| FieldValue::opt_num(p.altitude)),
        ("unlocode", |p| FieldValue::opt_str(&p.unlocode)),
    ];

    impl Matchable for Sample {
        fn field_table() -> FieldTable<Self> {
            SAMPLE_FIELDS
        }
    }

    fn sample() -> Sample {
        Sample {
            id: "TEST_NODE_ID".into(),
            owners: vec!["A".into(), "B".into()],
            altitude: Some(100.0),
            unlocode: None,
        }
    }

    #[test]
    fn test_equality() {
        let p = sample();
        assert!(p.matches(&Query::new().eq("id", "TEST_NODE_ID")));
        assert!(!p.matches(&Query::new().eq("id", "test_node_id")));
        assert!(p.matches(&Query::new().eq("altitude", 100)));
        assert!(!p.matches(&Query::new().eq("altitude", "100")));
        assert!(p.matches(&Query::new().eq("unlocode", None::<String>)));
        assert!(p.matches(&Query::new().eq("owners", vec!["B", "A"])));
        assert!(!p.matches(&Query::new().eq("owners", "A")));
    }

    #[test]
    fn test_string_containment() {
        let p = sample();
        assert!(p.matches(&Query::new().filter("id__contains", "NODE_I")));
        assert!(p.matches(&Query::new().filter("id__contains", "")));
        assert!(!p.matches(&Query::new().filter("id__contains", "NODE_X")));
        assert!(p.matches(&Query::new().filter("id__in", "123_TEST_NODE_ID_123")));
        assert!(p.matches(&Query::new().filter("id__in", vec!["X", "TEST_NODE_ID"])));
        assert!(!p.matches(&Query::new().filter("id__in", vec!["TEST_NODE"])));
    }

    #[test]
    fn test_set_containment() {
        let p = sample();
        assert!(p.matches(&Query::new().contains("owners", "A")));
        assert!(p.matches(&Query::new().contains("owners", vec!["A", "B"])));
        assert!(p.matches(&Query::new().contains("owners", Vec::<String>::new())));
        assert!(!p.matches(&Query::new().contains("owners", vec!["A", "C"])));
        assert!(p.matches(&Query::new().is_in("owners", vec!["A", "B", "C"])));
        assert!(!p.matches(&Query::new().is_in("owners", vec!["A"])));
    }

    #[test]
    fn test_numeric_fields_only_support_equality() {
        let p = sample();
        assert!(!p.matches(&Query::new().contains("altitude", 100)));
        assert!(!p.matches(&Query::new().is_in("altitude", vec![100])));
    }

    #[test]
    fn test_unknown_fields_never_match() {
        let p = sample();
        assert!(!p.matches(&Query::new().eq("notname", "TEST_NODE_ID")));
        assert!(!p.matches(&Query::new().filter("id__startswith", "TEST")));
        assert!(p.matches(&Query::new()));
    }

    #[test]
    fn test_predicates_are_anded() {
        let p = sample();
        let q = Query::new().eq("id", "TEST_NODE_ID").contains("owners", "C");
        assert!(!p.matches(&q));
    }

    #[test]
    fn test_display() {
        let q = Query::new()
            .eq("id", "X")
            .filter("owners__in", vec!["A", "B"])
            .eq("latitude", 4.5);
        assert_eq!(q.to_string(), "id=X, owners__in=[A, B], latitude=4.5");
    }
}
