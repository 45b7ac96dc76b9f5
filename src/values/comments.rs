//! Comment tokens and description extraction
//!
//! Comments reach a key as a nested collection: whatever sits on the key's
//! line, then whatever follows it until the next sibling key. Only the
//! comment on the key's own line describes the key.

use super::CommentedMapping;
use core::slice;

/// A comment associated with a mapping key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentToken {
    /// A description that needs no line matching, used as-is
    Resolved(String),
    /// A comment scanned from source text
    Located {
        /// Zero-based line the comment starts on
        line: usize,
        /// Raw comment text including `#` markers; continuation lines are
        /// separated by `\n`
        text: String,
    },
}

/// Arbitrarily nested sequence with optional leaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested<T> {
    Leaf(Option<T>),
    List(Vec<Nested<T>>),
}

impl<T> Nested<T> {
    /// Flatten this value into its leaves
    pub fn flatten(&self) -> Flatten<'_, T> {
        flatten(slice::from_ref(self))
    }
}

/// Depth-first, left-to-right iterator over the leaves of nested sequences
///
/// Uses an explicit stack, so nesting depth is bounded by memory rather
/// than the call stack.
#[derive(Debug, Clone)]
pub struct Flatten<'a, T> {
    stack: Vec<slice::Iter<'a, Nested<T>>>,
}

impl<'a, T> Iterator for Flatten<'a, T> {
    type Item = Option<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.last_mut() {
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(Nested::Leaf(item)) => return Some(item.as_ref()),
                Some(Nested::List(children)) => self.stack.push(children.iter()),
            }
        }
        None
    }
}

/// Flatten nested sequences of unknown depth
///
/// Leaves come out in encounter order; empty lists contribute nothing and
/// absent leaves are passed through as `None`.
///
/// # Example
/// ```
/// use chartdoc::values::{Nested, flatten};
///
/// let leaf = |s: &'static str| Nested::Leaf(Some(s));
/// let nested = vec![
///     Nested::List(vec![leaf("a"), leaf("b")]),
///     Nested::List(vec![leaf("c"), Nested::List(vec![leaf("d"), leaf("e")])]),
/// ];
/// let flat: Vec<_> = flatten(&nested).flatten().copied().collect();
/// assert_eq!(flat, vec!["a", "b", "c", "d", "e"]);
/// ```
#[must_use]
pub fn flatten<T>(nested: &[Nested<T>]) -> Flatten<'_, T> {
    Flatten {
        stack: vec![nested.iter()],
    }
}

/// Extract the inline comment describing `key`
///
/// Scans the key's comment tokens in order. A resolved token wins
/// immediately; otherwise the first token starting on the key's own line
/// is used, keeping only its first line. Returns an empty string when
/// nothing matches.
pub fn get_comment<M: CommentedMapping + ?Sized>(tree: &M, key: &str) -> String {
    let Some(comments) = tree.comments(key) else {
        return String::new();
    };
    let key_line = tree.key_line(key);

    for token in comments.flatten().flatten() {
        match token {
            CommentToken::Resolved(text) => return clean_comment(text),
            CommentToken::Located { line, text } if Some(*line) == key_line => {
                let first_line = text.trim().lines().next().unwrap_or_default();
                return clean_comment(first_line);
            }
            CommentToken::Located { .. } => {}
        }
    }

    String::new()
}

/// Remove comment formatting
///
/// Strips `#` markers and whitespace from both ends. Case is left as
/// written.
#[must_use]
pub fn clean_comment(comment: &str) -> String {
    comment
        .trim_matches(|c: char| c == '#' || c.is_whitespace())
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{Entry, Mapping, Node};

    fn located(line: usize, text: &str) -> CommentToken {
        CommentToken::Located {
            line,
            text: text.to_owned(),
        }
    }

    fn mapping_with(key: &str, key_line: usize, comments: Nested<CommentToken>) -> Mapping {
        let mut mapping = Mapping::new();
        mapping.insert(key, Node::String("world".to_owned()));
        let entry: &mut Entry = mapping.entry_mut(key).unwrap();
        entry.key_line = Some(key_line);
        entry.comments = Some(comments);
        mapping
    }

    #[test]
    fn test_flatten_passes_none_through() {
        let nested = vec![
            Nested::Leaf(None),
            Nested::List(vec![Nested::Leaf(Some(1)), Nested::List(vec![])]),
            Nested::Leaf(Some(2)),
        ];
        let flat: Vec<Option<&i32>> = flatten(&nested).collect();
        assert_eq!(flat, vec![None, Some(&1), Some(&2)]);
    }

    #[test]
    fn test_flatten_keeps_strings_whole() {
        let nested = vec![Nested::Leaf(Some("hello".to_owned()))];
        let flat: Vec<&String> = flatten(&nested).flatten().collect();
        assert_eq!(flat, vec!["hello"]);
    }

    #[test]
    fn test_flatten_deep_nesting() {
        let mut nested = Nested::Leaf(Some(7));
        for _ in 0..100_000 {
            nested = Nested::List(vec![nested]);
        }
        let flat: Vec<&i32> = nested.flatten().flatten().collect();
        assert_eq!(flat, vec![&7]);
        // Drop iteratively to keep the test independent of stack size.
        while let Nested::List(mut children) = nested {
            nested = children.pop().unwrap_or(Nested::Leaf(None));
        }
    }

    #[test]
    fn test_get_comment_matches_key_line_only() {
        let comments = Nested::List(vec![
            Nested::Leaf(None),
            Nested::List(vec![
                Nested::Leaf(Some(located(1, "# preceding comment"))),
                Nested::Leaf(Some(located(2, "# this is the comment\n# continued"))),
            ]),
        ]);
        let mapping = mapping_with("hello", 2, comments);
        assert_eq!(get_comment(&mapping, "hello"), "this is the comment");
    }

    #[test]
    fn test_get_comment_without_match_is_empty() {
        let comments = Nested::List(vec![Nested::Leaf(Some(located(4, "# elsewhere")))]);
        let mapping = mapping_with("hello", 2, comments);
        assert_eq!(get_comment(&mapping, "hello"), "");
        assert_eq!(get_comment(&mapping, "missing"), "");
    }

    #[test]
    fn test_get_comment_resolved_wins() {
        let mut mapping = Mapping::new();
        mapping.insert_described("port", Node::Integer(80), "## Service port ");
        assert_eq!(get_comment(&mapping, "port"), "Service port");
    }

    #[test]
    fn test_clean_comment() {
        assert_eq!(clean_comment("# hello world"), "hello world");
        assert_eq!(clean_comment("hello world"), "hello world");
        assert_eq!(clean_comment("## # ## ## hello world"), "hello world");
        assert_eq!(clean_comment(" # hello world  "), "hello world");
        assert_eq!(clean_comment("# Use a `LoadBalancer`."), "Use a `LoadBalancer`.");
    }
}
