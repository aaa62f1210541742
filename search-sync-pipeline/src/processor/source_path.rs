//! Source specifiers: dot-paths across relations and `template:` strings.

use once_cell::sync::Lazy;
use regex::Regex;
use search_sync_shared::{Record, Relation};
use serde_json::Value;

const TEMPLATE_PREFIX: &str = "template:";

static TEMPLATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]").expect("template token pattern"));

/// A parsed mapping source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSource<'a> {
    /// Dot-path such as `destination.name`.
    Path(&'a str),
    /// Template body with the `template:` prefix removed.
    Template(&'a str),
}

impl<'a> MappingSource<'a> {
    pub fn parse(source: &'a str) -> Self {
        match source.strip_prefix(TEMPLATE_PREFIX) {
            Some(body) => MappingSource::Template(body),
            None => MappingSource::Path(source),
        }
    }
}

/// Resolve a mapping source against `record`.
///
/// Paths yield the first value found, or `null`. Templates always yield a
/// string.
pub fn resolve_source(record: &dyn Record, source: &str) -> Value {
    match MappingSource::parse(source) {
        MappingSource::Path(path) => resolve_path(record, path).unwrap_or(Value::Null),
        MappingSource::Template(template) => Value::String(render_template(record, template)),
    }
}

/// Substitute every `[token]` in `template` with the textual value of the
/// token resolved as a dot-path.
pub fn render_template(record: &dyn Record, template: &str) -> String {
    TEMPLATE_TOKEN
        .replace_all(template, |captures: &regex::Captures<'_>| {
            let value = resolve_path(record, &captures[1]);
            text_of(value.as_ref())
        })
        .into_owned()
}

/// Resolve a dot-path such as `posts.author.name`.
///
/// Non-final segments follow relations (to-many relations yield the first
/// related record with a non-null leaf) or descend into JSON attributes. The
/// final segment reads an attribute or serializes a relation.
pub fn resolve_path(record: &dyn Record, path: &str) -> Option<Value> {
    let segments: Vec<&str> = path.split('.').collect();
    resolve_segments(record, &segments)
}

fn resolve_segments(record: &dyn Record, segments: &[&str]) -> Option<Value> {
    let (head, rest) = segments.split_first()?;

    if rest.is_empty() {
        return record
            .attribute(head)
            .or_else(|| record.relation(head).map(|relation| relation.to_value()));
    }

    if let Some(relation) = record.relation(head) {
        return match relation {
            Relation::One(related) => resolve_segments(related.as_ref(), rest),
            Relation::Many(related) => related
                .iter()
                .find_map(|item| resolve_segments(item.as_ref(), rest).filter(|v| !v.is_null())),
        };
    }

    record
        .attribute(head)
        .and_then(|value| descend(&value, rest))
}

fn descend(value: &Value, segments: &[&str]) -> Option<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value.clone());
    };

    match value {
        Value::Object(map) => map.get(*head).and_then(|child| descend(child, rest)),
        Value::Array(items) => match head.parse::<usize>() {
            Ok(position) => items.get(position).and_then(|child| descend(child, rest)),
            Err(_) => items
                .iter()
                .find_map(|item| descend(item, segments).filter(|v| !v.is_null())),
        },
        _ => None,
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
