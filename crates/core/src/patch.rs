//! The patch protocol: paths, leaf patches, and the flatten subroutine.
//!
//! A bot turn is delivered to the client as a flat stream of
//! `(path, scalar)` patches. Each patch targets exactly one leaf of the
//! logical response tree, identified by its full path from the symbolic
//! root `payload`. Containers never ride in a patch — [`flatten`]
//! decomposes them recursively into one patch per leaf, and the client
//! rebuilds the nesting from the paths alone.
//!
//! Wire form of a path is the dot/bracket string the browser applies
//! directly, e.g. `payload[0].output.message`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::PatchError;

/// The symbolic root every path starts from.
pub const PATH_ROOT: &str = "payload";

/// One step of a patch path: a named field or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// A path locating one leaf in the response tree, rooted at `payload`.
///
/// The root itself is implicit; `steps()` returns everything below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchPath(Vec<PathStep>);

impl PatchPath {
    /// The base path of part `i`: `payload[i]`.
    pub fn part(index: usize) -> Self {
        Self(vec![PathStep::Index(index)])
    }

    /// Extend with a named field step.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathStep::Key(key.into()));
        self
    }

    /// Extend with an array index step.
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathStep::Index(index));
        self
    }

    /// The steps below the root, in order.
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Parse the dot/bracket wire form, e.g. `payload[0].args.to`.
    pub fn parse(input: &str) -> Result<Self, PatchError> {
        let err = |reason: &str| PatchError::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let rest = input
            .strip_prefix(PATH_ROOT)
            .ok_or_else(|| err("path must start with the root 'payload'"))?;

        let mut steps = Vec::new();
        let mut chars = rest.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            match c {
                '[' => {
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some((_, ']')) => break,
                            Some((_, d)) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(err("index is not a number")),
                            None => return Err(err("unterminated '['")),
                        }
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| err("index is not a number"))?;
                    steps.push(PathStep::Index(index));
                }
                '.' => {
                    let mut key = String::new();
                    while let Some(&(_, k)) = chars.peek() {
                        if k == '.' || k == '[' {
                            break;
                        }
                        key.push(k);
                        chars.next();
                    }
                    if key.is_empty() {
                        return Err(err("empty field name"));
                    }
                    steps.push(PathStep::Key(key));
                }
                _ => return Err(err("expected '.' or '[' after the root")),
            }
        }

        if steps.is_empty() {
            return Err(PatchError::EmptyPath);
        }

        Ok(Self(steps))
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PATH_ROOT}")?;
        for step in &self.0 {
            match step {
                PathStep::Key(k) => write!(f, ".{k}")?,
                PathStep::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

/// A single leaf update to the response tree.
///
/// `value` is always a scalar (null, bool, number, or string) — the
/// flatten invariant. Applying patches in arrival order reconstructs the
/// tree; a later patch at the same path silently overwrites the earlier
/// value, which is how placeholders get replaced by real tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub path: PatchPath,
    pub value: Value,
}

impl Patch {
    pub fn new(path: PatchPath, value: impl Into<Value>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }
}

/// Decompose `value` into one patch per leaf, rooted at `base`.
///
/// Sequences recurse per index, mappings per key, and everything else
/// emits exactly one patch at the base path. Emission order is
/// depth-first in container order, so a client applying patches as they
/// arrive grows each subtree top-down.
///
/// Empty containers emit nothing: the wire format has no way to say
/// "an empty object lives here" without carrying a container value.
pub fn flatten(base: PatchPath, value: &Value) -> Vec<Patch> {
    let mut patches = Vec::new();
    flatten_into(base, value, &mut patches);
    patches
}

fn flatten_into(base: PatchPath, value: &Value, out: &mut Vec<Patch>) {
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(base.clone().index(i), item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_into(base.clone().key(key), item, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push(Patch::new(base, value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_flattens_to_single_patch() {
        let patches = flatten(PatchPath::part(0).key("tool"), &json!("draftEmail"));
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].path.to_string(), "payload[0].tool");
        assert_eq!(patches[0].value, json!("draftEmail"));
    }

    #[test]
    fn nested_value_flattens_one_patch_per_leaf() {
        let value = json!({
            "to": "a@b.com",
            "cc": ["x@y.com", "z@y.com"],
            "meta": { "urgent": true, "retries": null }
        });
        let patches = flatten(PatchPath::part(2).key("args"), &value);
        let positions: Vec<String> = patches.iter().map(|p| p.path.to_string()).collect();
        assert_eq!(
            positions,
            vec![
                "payload[2].args.cc[0]",
                "payload[2].args.cc[1]",
                "payload[2].args.meta.retries",
                "payload[2].args.meta.urgent",
                "payload[2].args.to",
            ]
        );
        // every carried value is a scalar
        assert!(patches.iter().all(|p| !p.value.is_array() && !p.value.is_object()));
    }

    #[test]
    fn empty_containers_emit_nothing() {
        assert!(flatten(PatchPath::part(0), &json!({})).is_empty());
        assert!(flatten(PatchPath::part(0), &json!([])).is_empty());
        assert!(flatten(PatchPath::part(0), &json!({"a": []})).is_empty());
    }

    #[test]
    fn display_and_parse_round_trip() {
        let path = PatchPath::part(3).key("output").index(1).key("message");
        let wire = path.to_string();
        assert_eq!(wire, "payload[3].output[1].message");
        assert_eq!(PatchPath::parse(&wire).unwrap(), path);
    }

    #[test]
    fn parse_rejects_foreign_root() {
        assert!(matches!(
            PatchPath::parse("result[0].tool"),
            Err(PatchError::Parse { .. })
        ));
    }

    #[test]
    fn parse_rejects_junk_after_root() {
        // the first step must start immediately after the root
        assert!(PatchPath::parse("payloadgarbage[0]").is_err());
        assert!(PatchPath::parse("payload 0.tool").is_err());
    }

    #[test]
    fn parse_rejects_bad_index() {
        assert!(PatchPath::parse("payload[x].tool").is_err());
        assert!(PatchPath::parse("payload[0").is_err());
    }

    #[test]
    fn parse_rejects_bare_root() {
        assert!(matches!(
            PatchPath::parse("payload"),
            Err(PatchError::EmptyPath)
        ));
    }

    #[test]
    fn parse_rejects_empty_field() {
        assert!(PatchPath::parse("payload[0]..message").is_err());
    }
}
