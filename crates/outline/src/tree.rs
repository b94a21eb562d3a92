//! Tree structurer: a three-state machine over classified lines.
//!
//! | state      | topic       | subtopic              | detail               |
//! |------------|-------------|-----------------------|----------------------|
//! | Root       | → InTopic   | dropped               | dropped              |
//! | InTopic    | → InTopic   | child of topic → InSubtopic | dropped        |
//! | InSubtopic | → InTopic   | sibling subtopic      | child of subtopic    |
//!
//! A topic always closes whatever is open and becomes a direct child of the
//! root. Dropped lines are logged and returned in [`Structured::dropped`];
//! they are never attached to a shallower node.

use serde::Serialize;
use tracing::warn;

use crate::line::{classify, LineKind};

/// One node of the mind map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MindmapNode {
    pub title: String,
    pub children: Vec<MindmapNode>,
}

impl MindmapNode {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindmapNode::node_count).sum::<usize>()
    }

    /// Levels below `self` (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// A line the structurer refused to place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedLine {
    /// 1-based line number within the structured text.
    pub line_number: usize,
    pub text: String,
    pub kind: LineKind,
}

/// Output of [`build_tree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Structured {
    pub root: MindmapNode,
    pub dropped: Vec<DroppedLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Root,
    InTopic,
    InSubtopic,
}

struct TreeBuilder {
    root: MindmapNode,
    state: State,
    dropped: Vec<DroppedLine>,
}

impl TreeBuilder {
    fn new(root_title: &str) -> Self {
        Self {
            root: MindmapNode::new(root_title),
            state: State::Root,
            dropped: Vec::new(),
        }
    }

    fn feed(&mut self, line_number: usize, raw: &str) {
        let Some(line) = classify(raw) else {
            return;
        };

        match (self.state, line.kind) {
            (_, LineKind::Topic) => {
                self.root.children.push(MindmapNode::new(line.title));
                self.state = State::InTopic;
            }
            (State::InTopic | State::InSubtopic, LineKind::Subtopic) => {
                match self.root.children.last_mut() {
                    Some(topic) => {
                        topic.children.push(MindmapNode::new(line.title));
                        self.state = State::InSubtopic;
                    }
                    None => self.drop_line(line_number, line.title, line.kind),
                }
            }
            (State::InSubtopic, LineKind::Detail) => {
                let subtopic = self
                    .root
                    .children
                    .last_mut()
                    .and_then(|topic| topic.children.last_mut());
                match subtopic {
                    Some(subtopic) => subtopic.children.push(MindmapNode::new(line.title)),
                    None => self.drop_line(line_number, line.title, line.kind),
                }
            }
            (State::Root, LineKind::Subtopic) | (State::Root | State::InTopic, LineKind::Detail) => {
                self.drop_line(line_number, line.title, line.kind);
            }
        }
    }

    fn drop_line(&mut self, line_number: usize, text: String, kind: LineKind) {
        warn!(line_number, ?kind, text = %text, "orphan line has no open parent, dropping");
        self.dropped.push(DroppedLine {
            line_number,
            text,
            kind,
        });
    }

    fn finish(self) -> Structured {
        Structured {
            root: self.root,
            dropped: self.dropped,
        }
    }
}

/// Parse `text` into a tree rooted at `root_title`. Never fails: lines that
/// cannot be placed are reported in [`Structured::dropped`].
pub fn build_tree(text: &str, root_title: &str) -> Structured {
    let mut builder = TreeBuilder::new(root_title);
    for (i, raw) in text.lines().enumerate() {
        builder.feed(i + 1, raw);
    }
    builder.finish()
}
