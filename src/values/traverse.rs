//! Parameter extraction from a values tree
//!
//! Walks a mapping depth-first in document order and turns every leaf into a
//! [`Parameter`]: the dot-joined key path, the inline comment describing it
//! and its default value encoded as JSON.

use super::{Mapping, Node, get_comment};
use anyhow::{Context as _, Result};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io;
use tracing::trace;

/// A documented parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Dot-joined key path from the document root
    pub path: String,
    /// Cleaned inline comment, or empty
    pub description: String,
    /// JSON encoding of the default value
    pub default: String,
}

impl Parameter {
    #[must_use]
    pub fn new<P, D, V>(path: P, description: D, default: V) -> Self
    where
        P: Into<String>,
        D: Into<String>,
        V: Into<String>,
    {
        Self {
            path: path.into(),
            description: description.into(),
            default: default.into(),
        }
    }
}

/// Traverse a values tree and extract every leaf parameter
///
/// A non-empty mapping is descended into and never documented itself; an
/// empty mapping, a sequence or a scalar is a leaf. `root` prefixes every
/// path, which is how dependency values get their namespace.
///
/// # Errors
///
/// Returns an error if a default value cannot be encoded
///
/// # Example
/// ```
/// use chartdoc::values::{parse_values, traverse};
///
/// let tree = parse_values("my:\n  config:\n    hello: world  # describes the option\n").unwrap();
/// let params = traverse(&tree, &[]).unwrap();
/// assert_eq!(params[0].path, "my.config.hello");
/// assert_eq!(params[0].description, "describes the option");
/// assert_eq!(params[0].default, "\"world\"");
/// ```
pub fn traverse(tree: &Mapping, root: &[String]) -> Result<Vec<Parameter>> {
    let mut path = root.to_vec();
    let mut parameters = Vec::new();
    traverse_into(tree, &mut path, &mut parameters)?;
    Ok(parameters)
}

fn traverse_into(tree: &Mapping, path: &mut Vec<String>, out: &mut Vec<Parameter>) -> Result<()> {
    for (key, entry) in tree.iter() {
        path.push(key.to_owned());

        match &entry.value {
            Node::Mapping(child) if !child.is_empty() => traverse_into(child, path, out)?,
            value => {
                let joined = path.join(".");
                let default = encode_default(value)
                    .with_context(|| format!("Failed to encode default value of '{joined}'"))?;
                let description = get_comment(tree, key);
                trace!("Parameter {joined} = {default}");
                out.push(Parameter {
                    path: joined,
                    description,
                    default,
                });
            }
        }

        path.pop();
    }

    Ok(())
}

/// Encode a value as JSON with a space after `,` and `:`
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn encode_default(value: &Node) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Compact JSON with `", "` and `": "` separators
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            return Ok(());
        }
        writer.write_all(b", ")
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            return Ok(());
        }
        writer.write_all(b", ")
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
