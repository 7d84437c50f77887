//! Client-side reassembly: the growing message tree.
//!
//! A [`Transcript`] holds alternating user and bot turns. Patches are
//! routed into the trailing bot turn (creating one when the last turn is
//! a user prompt) and applied leaf by leaf: intermediate containers are
//! inferred from the step kind — an index step creates an array, a key
//! step creates an object — mirroring how `flatten` built the path in
//! the first place.
//!
//! The tree is append-only at the turn level and in-place-mutating at
//! the leaf level. There is no "final" marker on a leaf: a placeholder
//! output is simply overwritten when the real value arrives.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::{Patch, PathStep};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

/// One turn of the conversation.
///
/// User turns hold the prompt string; bot turns hold the JSON array the
/// patch stream addresses as `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: Value,
}

/// The full conversation as the client sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn. The next patch received will start a fresh
    /// bot turn rather than extend the previous one.
    pub fn push_user(&mut self, prompt: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: ChatRole::User,
            content: Value::String(prompt.into()),
        });
    }

    /// Apply one patch to the trailing bot turn, creating the turn if
    /// the last entry is not a bot turn. Last write wins at the exact
    /// path; patches at other paths are unaffected.
    pub fn apply(&mut self, patch: &Patch) {
        let needs_new_turn = !matches!(
            self.turns.last(),
            Some(ChatTurn {
                role: ChatRole::Bot,
                ..
            })
        );
        if needs_new_turn {
            self.turns.push(ChatTurn {
                role: ChatRole::Bot,
                content: Value::Array(Vec::new()),
            });
        }
        if let Some(turn) = self.turns.last_mut() {
            set_path(&mut turn.content, patch.path.steps(), patch.value.clone());
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The content of the trailing bot turn, if any.
    pub fn last_bot_content(&self) -> Option<&Value> {
        match self.turns.last() {
            Some(ChatTurn {
                role: ChatRole::Bot,
                content,
            }) => Some(content),
            _ => None,
        }
    }
}

/// Set the leaf at `steps` inside `node`, creating intermediate
/// containers as needed.
///
/// An index step turns a non-array node into an array (padding with
/// nulls up to the index); a key step turns a non-object node into an
/// object. A wrong-kinded existing node is replaced outright — no
/// merging between container kinds.
pub fn set_path(node: &mut Value, steps: &[PathStep], value: Value) {
    let Some((step, rest)) = steps.split_first() else {
        *node = value;
        return;
    };

    match step {
        PathStep::Index(i) => {
            if !matches!(node, Value::Array(_)) {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                while items.len() <= *i {
                    items.push(Value::Null);
                }
                set_path(&mut items[*i], rest, value);
            }
        }
        PathStep::Key(key) => {
            if !matches!(node, Value::Object(_)) {
                *node = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(map) = node {
                let slot = map.entry(key.clone()).or_insert(Value::Null);
                set_path(slot, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{PatchPath, flatten};
    use serde_json::json;

    fn apply_all(transcript: &mut Transcript, patches: &[Patch]) {
        for patch in patches {
            transcript.apply(patch);
        }
    }

    #[test]
    fn flatten_then_reassemble_round_trips() {
        let value = json!({
            "tool": "generateReportPDF",
            "args": {
                "reportData": {
                    "title": "Q3",
                    "rows": [{"label": "revenue", "amount": 12.5}, {"label": "costs", "amount": 7}],
                    "approved": false,
                    "notes": null
                }
            }
        });
        let patches = flatten(PatchPath::part(0), &value);

        let mut transcript = Transcript::new();
        transcript.push_user("make a report");
        apply_all(&mut transcript, &patches);

        assert_eq!(transcript.last_bot_content(), Some(&json!([value])));
    }

    #[test]
    fn last_write_wins_at_same_path() {
        let path = PatchPath::part(0).key("output").key("message");
        let mut transcript = Transcript::new();
        transcript.push_user("hi");
        transcript.apply(&Patch::new(path.clone(), json!("a")));
        transcript.apply(&Patch::new(PatchPath::part(0).key("tool"), json!("informUser")));
        transcript.apply(&Patch::new(path, json!("b")));

        let content = transcript.last_bot_content().unwrap();
        assert_eq!(content[0]["output"]["message"], json!("b"));
        assert_eq!(content[0]["tool"], json!("informUser"));
    }

    #[test]
    fn disjoint_paths_commute() {
        let value = json!({"a": {"b": 1, "c": [true, "x"]}, "d": null});
        let mut patches = flatten(PatchPath::part(0).key("args"), &value);

        let mut forward = Transcript::new();
        forward.push_user("p");
        apply_all(&mut forward, &patches);

        patches.reverse();
        let mut backward = Transcript::new();
        backward.push_user("p");
        apply_all(&mut backward, &patches);

        assert_eq!(forward.last_bot_content(), backward.last_bot_content());
    }

    #[test]
    fn structured_output_accumulates_around_placeholder_leaf() {
        let mut transcript = Transcript::new();
        transcript.push_user("email bob");
        transcript.apply(&Patch::new(
            PatchPath::part(0).key("output").key("message"),
            json!("Working on it…"),
        ));
        for patch in flatten(
            PatchPath::part(0).key("output"),
            &json!({"status": "draft", "to": "bob@x.com"}),
        ) {
            transcript.apply(&patch);
        }

        let output = &transcript.last_bot_content().unwrap()[0]["output"];
        assert_eq!(output["status"], json!("draft"));
        assert_eq!(output["to"], json!("bob@x.com"));
        // distinct path, so the message leaf is untouched; renderers key
        // off the tool-specific fields
        assert_eq!(output["message"], json!("Working on it…"));
    }

    #[test]
    fn placeholder_at_same_leaf_is_overwritten() {
        let path = PatchPath::part(0).key("output").key("message");
        let mut transcript = Transcript::new();
        transcript.push_user("hello");
        transcript.apply(&Patch::new(path.clone(), json!("Working on it…")));
        transcript.apply(&Patch::new(path, json!("All done.")));

        let output = &transcript.last_bot_content().unwrap()[0]["output"];
        assert_eq!(output, &json!({"message": "All done."}));
    }

    #[test]
    fn first_patch_after_user_turn_starts_new_bot_turn() {
        let mut transcript = Transcript::new();
        transcript.push_user("one");
        transcript.apply(&Patch::new(PatchPath::part(0).key("tool"), json!("informUser")));
        transcript.push_user("two");
        transcript.apply(&Patch::new(PatchPath::part(0).key("tool"), json!("draftEmail")));

        assert_eq!(transcript.turns().len(), 4);
        assert_eq!(transcript.turns()[1].content[0]["tool"], json!("informUser"));
        assert_eq!(transcript.turns()[3].content[0]["tool"], json!("draftEmail"));
    }

    #[test]
    fn patches_for_same_part_accumulate() {
        let mut transcript = Transcript::new();
        transcript.push_user("p");
        transcript.apply(&Patch::new(PatchPath::part(1).key("tool"), json!("draftEmail")));
        transcript.apply(&Patch::new(
            PatchPath::part(0).key("output").key("message"),
            json!("first"),
        ));
        transcript.apply(&Patch::new(
            PatchPath::part(1).key("args").key("to"),
            json!("a@b.com"),
        ));

        let content = transcript.last_bot_content().unwrap();
        assert_eq!(content[0], json!({"output": {"message": "first"}}));
        assert_eq!(content[1]["tool"], json!("draftEmail"));
        assert_eq!(content[1]["args"]["to"], json!("a@b.com"));
    }

    #[test]
    fn wrong_kinded_container_is_replaced() {
        let mut node = json!({"a": "scalar"});
        set_path(
            &mut node,
            &[PathStep::Key("a".into()), PathStep::Index(1)],
            json!("x"),
        );
        assert_eq!(node, json!({"a": [null, "x"]}));
    }

    #[test]
    fn index_step_pads_with_nulls() {
        let mut node = Value::Array(Vec::new());
        set_path(&mut node, &[PathStep::Index(2)], json!("c"));
        assert_eq!(node, json!([null, null, "c"]));
    }
}
