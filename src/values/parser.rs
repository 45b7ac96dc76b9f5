//! YAML parser that keeps the comment metadata needed for documentation.
//!
//! Values come from `yaml-rust2`'s event stream, which reports a source
//! marker for every node but drops comments. Comments are recovered by a
//! separate lexical pass over the same text and attached to mapping keys by
//! line: each key owns the lines from its own line up to the next sibling
//! key, and the innermost mapping claims a comment first.

use super::{CommentToken, Entry, Mapping, Nested, Node};
use crate::error::ChartDocError;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};
use yaml_rust2::Yaml;

/// Key that pulls in the entries of an anchored mapping
const MERGE_KEY: &str = "<<";

/// UTF-8 byte order mark, which is not part of the document
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parse a values document
///
/// An empty document yields an empty mapping.
///
/// # Errors
///
/// Returns [`ChartDocError::DocumentParse`] if the YAML is malformed, the
/// root is not a mapping, or a mapping repeats a key.
///
/// # Example
/// ```
/// use chartdoc::values::{get_comment, parse_values};
///
/// let tree = parse_values("hello: world  # this is the comment").unwrap();
/// assert_eq!(get_comment(&tree, "hello"), "this is the comment");
/// ```
pub fn parse_values(source: &str) -> Result<Mapping, ChartDocError> {
    let source = source.strip_prefix(BYTE_ORDER_MARK).unwrap_or(source);
    let mut builder = TreeBuilder::new(source);
    let mut parser = Parser::new_from_str(source);

    parser
        .load(&mut builder, false)
        .map_err(|e| ChartDocError::document_parse(e.to_string()))?;

    builder.finish()
}

/// Zero-based line lookup by character index
#[derive(Debug)]
struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        let mut len = 0;
        for (index, ch) in source.chars().enumerate() {
            if ch == '\n' {
                starts.push(index + 1);
            }
            len = index + 1;
        }
        Self { starts, len }
    }

    fn line_of(&self, char_index: usize) -> usize {
        self.starts
            .partition_point(|&start| start <= char_index)
            .saturating_sub(1)
    }
}

enum PendingKey {
    Key { name: String, line: usize },
    Merge,
}

enum Frame {
    Sequence {
        anchor: usize,
        line: usize,
        items: Vec<Node>,
    },
    Mapping {
        anchor: usize,
        line: usize,
        entries: IndexMap<String, Entry>,
        merges: Vec<Node>,
        pending: Option<PendingKey>,
    },
}

struct TreeBuilder {
    lines: LineIndex,
    flow_closers: Vec<usize>,
    comments: BTreeMap<usize, CommentToken>,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    root: Option<Node>,
    error: Option<String>,
}

impl TreeBuilder {
    fn new(source: &str) -> Self {
        let flow_closers = source
            .chars()
            .enumerate()
            .filter_map(|(index, ch)| (ch == '}').then_some(index))
            .collect();

        Self {
            lines: LineIndex::new(source),
            flow_closers,
            comments: scan_comments(source),
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            error: None,
        }
    }

    fn finish(self) -> Result<Mapping, ChartDocError> {
        if let Some(message) = self.error {
            return Err(ChartDocError::document_parse(message));
        }

        match self.root {
            None | Some(Node::Null) => Ok(Mapping::new()),
            Some(Node::Mapping(mapping)) => Ok(mapping),
            Some(_) => Err(ChartDocError::document_parse(
                "the top level of a values document must be a mapping",
            )),
        }
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }

    fn register_anchor(&mut self, anchor: usize, node: &Node) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
    }

    /// Route a finished node to its parent, or make it the root
    fn push_complete(&mut self, node: Node, line: usize) {
        let Some(parent) = self.stack.last_mut() else {
            self.root = Some(node);
            return;
        };

        match parent {
            Frame::Sequence { items, .. } => items.push(node),
            Frame::Mapping {
                entries,
                merges,
                pending,
                ..
            } => match pending.take() {
                None => {
                    *pending = Some(PendingKey::Key {
                        name: key_to_string(&node),
                        line,
                    });
                }
                Some(PendingKey::Merge) => merges.push(node),
                Some(PendingKey::Key { name, line }) => {
                    if entries.contains_key(&name) {
                        if self.error.is_none() {
                            self.error =
                                Some(format!("duplicate key '{name}' on line {}", line + 1));
                        }
                        return;
                    }
                    entries.insert(
                        name,
                        Entry {
                            value: node,
                            key_line: Some(line),
                            comments: None,
                        },
                    );
                }
            },
        }
    }

    /// Line before which the mapping ending at `marker` owns comments
    fn range_end(&self, marker: &Marker) -> usize {
        let index = marker.index();
        if index >= self.lines.len {
            return usize::MAX;
        }

        let line = self.lines.line_of(index);
        if self.flow_closers.binary_search(&index).is_ok() {
            // A flow mapping closes on the same line as its last value.
            line + 1
        } else {
            line
        }
    }

    /// Give each key the comments between its line and the next key's line
    fn attach_comments(&mut self, mapping: &mut Mapping, end: usize) {
        let keyed: Vec<(String, usize)> = mapping
            .iter()
            .filter_map(|(key, entry)| entry.key_line.map(|line| (key.to_owned(), line)))
            .collect();

        for (position, (key, start)) in keyed.iter().enumerate() {
            let stop = keyed
                .get(position + 1)
                .map_or(end, |(_, next)| *next)
                .max(*start);

            let claimed: Vec<usize> = self.comments.range(*start..stop).map(|(line, _)| *line).collect();
            if claimed.is_empty() {
                continue;
            }

            let mut inline = None;
            let mut following = Vec::new();
            for line in claimed {
                if let Some(token) = self.comments.remove(&line) {
                    if line == *start {
                        inline = Some(token);
                    } else {
                        following.push(Nested::Leaf(Some(token)));
                    }
                }
            }

            if let Some(entry) = mapping.entry_mut(key) {
                entry.comments = Some(Nested::List(vec![
                    Nested::Leaf(inline),
                    Nested::List(following),
                ]));
            }
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, marker: Marker) {
        let line = self.lines.line_of(marker.index());

        match event {
            Event::Scalar(value, style, anchor, tag) => {
                if style == TScalarStyle::Plain
                    && value == MERGE_KEY
                    && let Some(Frame::Mapping { pending, .. }) = self.stack.last_mut()
                    && pending.is_none()
                {
                    *pending = Some(PendingKey::Merge);
                    return;
                }

                let is_str_tag = tag.as_ref().is_some_and(|tag| tag.suffix == "str");
                let node = resolve_scalar(value, style, is_str_tag);
                self.register_anchor(anchor, &node);
                self.push_complete(node, line);
            }

            Event::SequenceStart(anchor, _tag) => {
                self.stack.push(Frame::Sequence {
                    anchor,
                    line,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                if let Some(Frame::Sequence {
                    anchor,
                    line,
                    items,
                }) = self.stack.pop()
                {
                    let node = Node::Sequence(items);
                    self.register_anchor(anchor, &node);
                    self.push_complete(node, line);
                } else {
                    self.fail("unbalanced sequence in values document".to_owned());
                }
            }

            Event::MappingStart(anchor, _tag) => {
                self.stack.push(Frame::Mapping {
                    anchor,
                    line,
                    entries: IndexMap::new(),
                    merges: Vec::new(),
                    pending: None,
                });
            }

            Event::MappingEnd => {
                if let Some(Frame::Mapping {
                    anchor,
                    line,
                    entries,
                    merges,
                    ..
                }) = self.stack.pop()
                {
                    let mut mapping = Mapping::from_entries(entries);
                    let end = self.range_end(&marker);
                    self.attach_comments(&mut mapping, end);

                    for source in &merges {
                        match source {
                            Node::Mapping(other) => mapping.merge_missing(other),
                            Node::Sequence(items) => {
                                for item in items {
                                    if let Node::Mapping(other) = item {
                                        mapping.merge_missing(other);
                                    }
                                }
                            }
                            _ => self.fail(format!(
                                "merge key on line {} must refer to a mapping",
                                line + 1
                            )),
                        }
                    }

                    let node = Node::Mapping(mapping);
                    self.register_anchor(anchor, &node);
                    self.push_complete(node, line);
                } else {
                    self.fail("unbalanced mapping in values document".to_owned());
                }
            }

            Event::Alias(anchor) => {
                let node = self.anchors.get(&anchor).cloned().unwrap_or(Node::Null);
                self.push_complete(node, line);
            }

            _ => {}
        }
    }
}

/// Resolve a scalar with the YAML 1.2 core schema
///
/// Quoted and `!!str` scalars always stay strings. Decimal integers too
/// wide for `i64` keep their exact value.
fn resolve_scalar(value: String, style: TScalarStyle, is_str_tag: bool) -> Node {
    if style != TScalarStyle::Plain || is_str_tag {
        return Node::String(value);
    }

    match Yaml::from_str(&value) {
        Yaml::Integer(number) => Node::Integer(i128::from(number)),
        real @ Yaml::Real(_) => match value.parse::<i128>() {
            Ok(number) if is_decimal_integer(&value) => Node::Integer(number),
            _ => real.as_f64().map_or(Node::String(value), Node::Float),
        },
        Yaml::Boolean(flag) => Node::Bool(flag),
        Yaml::Null => Node::Null,
        _ => Node::String(value),
    }
}

/// Whether `value` matches the core schema's decimal integer form
fn is_decimal_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn key_to_string(node: &Node) -> String {
    match node {
        Node::String(key) => key.clone(),
        Node::Null => "null".to_owned(),
        Node::Bool(flag) => flag.to_string(),
        Node::Integer(number) => number.to_string(),
        Node::Float(number) => number.to_string(),
        Node::Sequence(_) | Node::Mapping(_) => serde_json::to_string(node).unwrap_or_default(),
    }
}

/// A `#` comment found on one source line
struct LineComment {
    line: usize,
    text: String,
    full_line: bool,
}

/// Find every comment in `source`, grouped into tokens keyed by start line
///
/// A comment followed by comment-only lines forms one multi-line token.
/// Lines inside block scalars are skipped.
fn scan_comments(source: &str) -> BTreeMap<usize, CommentToken> {
    let mut found: Vec<LineComment> = Vec::new();
    let mut block_parent_indent: Option<usize> = None;

    for (line, text) in source.lines().enumerate() {
        let indent = text.len() - text.trim_start().len();

        if let Some(parent) = block_parent_indent {
            if text.trim().is_empty() || indent > parent {
                continue;
            }
            block_parent_indent = None;
        }

        let start = comment_start(text);
        let content = start.map_or(text, |pos| &text[..pos]);
        if opens_block_scalar(content) {
            block_parent_indent = Some(indent);
        }

        if let Some(pos) = start {
            found.push(LineComment {
                line,
                text: text[pos..].trim_end().to_owned(),
                full_line: content.trim().is_empty(),
            });
        }
    }

    let mut tokens = BTreeMap::new();
    let mut current: Option<(usize, usize, String)> = None;

    for comment in found {
        match current.as_mut() {
            Some((_, last, text)) if comment.full_line && comment.line == *last + 1 => {
                text.push('\n');
                text.push_str(&comment.text);
                *last = comment.line;
            }
            _ => {
                if let Some((line, _, text)) = current.take() {
                    tokens.insert(line, CommentToken::Located { line, text });
                }
                current = Some((comment.line, comment.line, comment.text));
            }
        }
    }
    if let Some((line, _, text)) = current {
        tokens.insert(line, CommentToken::Located { line, text });
    }

    tokens
}

/// Byte offset of the `#` that starts a comment on this line, if any
fn comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut single_just_closed = false;
    let mut prev: Option<char> = None;
    let mut last_significant: Option<char> = None;

    for (pos, ch) in line.char_indices() {
        if single_just_closed {
            single_just_closed = false;
            if ch == '\'' {
                // `''` inside a single-quoted scalar is an escaped quote.
                quote = Some(ch);
                prev = Some(ch);
                continue;
            }
        }

        match quote {
            Some('"') => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    quote = None;
                }
            }
            Some(_) => {
                if ch == '\'' {
                    quote = None;
                    single_just_closed = true;
                }
            }
            None => {
                let after_space = prev.is_none_or(char::is_whitespace);
                if ch == '#' && after_space {
                    return Some(pos);
                }
                let scalar_can_start = last_significant
                    .is_none_or(|c| matches!(c, ':' | '-' | '[' | '{' | ',' | '?'));
                let opener_ok = after_space || matches!(prev, Some('[' | '{' | ','));
                if (ch == '"' || ch == '\'') && scalar_can_start && opener_ok {
                    quote = Some(ch);
                }
            }
        }

        prev = Some(ch);
        if !ch.is_whitespace() {
            last_significant = Some(ch);
        }
    }

    None
}

/// Whether a line's content ends with a `|` or `>` block scalar header
fn opens_block_scalar(content: &str) -> bool {
    content.split_whitespace().last().is_some_and(|token| {
        let mut chars = token.chars();
        matches!(chars.next(), Some('|' | '>'))
            && chars.all(|c| c.is_ascii_digit() || c == '+' || c == '-')
    })
}
