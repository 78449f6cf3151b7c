use serde::{Deserialize, Serialize};

use crate::error::{Result, SnnError};

/// Delimiters of the persistence blob and of the short-form network
/// definition: groups are `;`-separated, fields inside a group `,`-separated.
pub const TWO_LEVEL: [char; 2] = [';', ','];

/// How leaf text that is not a valid number is treated when converting a
/// list to numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Malformed leaves become `0.0`.
    #[default]
    Lenient,
    /// Malformed leaves fail with `SnnError::MalformedNumber`.
    Strict,
}

/// An ordered tree of string leaves, encoded as one flat string with one
/// delimiter per nesting level (outermost first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedList {
    Leaf(String),
    List(Vec<NestedList>),
}

impl Default for NestedList {
    fn default() -> Self {
        NestedList::List(Vec::new())
    }
}

impl NestedList {
    pub fn new() -> NestedList {
        NestedList::default()
    }

    /// Splits `input` on `delimiters[0]` and decodes every piece with the
    /// remaining delimiters. Consecutive delimiters are never collapsed;
    /// empty pieces are dropped only at the leaf level.
    pub fn decode(input: &str, delimiters: &[char]) -> NestedList {
        let Some((&delimiter, rest)) = delimiters.split_first() else {
            return NestedList::Leaf(input.to_owned());
        };

        let children = input
            .split(delimiter)
            .filter(|piece| !(rest.is_empty() && piece.is_empty()))
            .map(|piece| NestedList::decode(piece, rest))
            .collect();
        NestedList::List(children)
    }

    /// Inverse of [`NestedList::decode`]: joins children with the delimiter of
    /// the current depth, one delimiter consumed per level.
    pub fn encode(&self, delimiters: &[char]) -> String {
        match self {
            NestedList::Leaf(value) => value.clone(),
            NestedList::List(children) => {
                let (delimiter, rest) = match delimiters.split_first() {
                    Some((&d, rest)) => (d.to_string(), rest),
                    None => (String::new(), delimiters),
                };
                children
                    .iter()
                    .map(|child| child.encode(rest))
                    .collect::<Vec<_>>()
                    .join(&delimiter)
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NestedList::Leaf(_) => 0,
            NestedList::List(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&NestedList> {
        match self {
            NestedList::Leaf(_) => None,
            NestedList::List(children) => children.get(index),
        }
    }

    pub fn children(&self) -> &[NestedList] {
        match self {
            NestedList::Leaf(_) => &[],
            NestedList::List(children) => children,
        }
    }

    /// Leaf text, or `None` for an inner node.
    pub fn value(&self) -> Option<&str> {
        match self {
            NestedList::Leaf(value) => Some(value),
            NestedList::List(_) => None,
        }
    }

    /// Text of the `index`-th child if that child is a leaf.
    pub fn leaf(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(NestedList::value)
    }

    pub fn push_leaf(&mut self, value: impl Into<String>) {
        self.push(NestedList::Leaf(value.into()));
    }

    /// Appends a child. Pushing onto a leaf turns it into a list that keeps
    /// the old value as its first child.
    pub fn push(&mut self, child: NestedList) {
        if let NestedList::Leaf(value) = self {
            let old = NestedList::Leaf(std::mem::take(value));
            *self = NestedList::List(vec![old]);
        }
        if let NestedList::List(children) = self {
            children.push(child);
        }
    }

    /// Values of the direct leaf children, in order. Inner-node children are
    /// skipped.
    pub fn to_strings(&self) -> Vec<String> {
        self.children()
            .iter()
            .filter_map(|child| child.value().map(str::to_owned))
            .collect()
    }

    /// Leaf children parsed as numbers; malformed text becomes `0.0`.
    pub fn to_f64s(&self) -> Vec<f64> {
        self.to_strings()
            .iter()
            .map(|s| s.trim().parse::<f64>().unwrap_or(0.0))
            .collect()
    }

    /// Leaf children parsed as numbers under the given policy.
    pub fn to_f64s_with(&self, policy: NumericPolicy) -> Result<Vec<f64>> {
        match policy {
            NumericPolicy::Lenient => Ok(self.to_f64s()),
            NumericPolicy::Strict => self
                .to_strings()
                .iter()
                .map(|s| parse_number(s, policy))
                .collect(),
        }
    }
}

impl From<Vec<NestedList>> for NestedList {
    fn from(children: Vec<NestedList>) -> Self {
        NestedList::List(children)
    }
}

impl From<&str> for NestedList {
    fn from(value: &str) -> Self {
        NestedList::Leaf(value.to_owned())
    }
}

/// Parses one numeric leaf under `policy`.
pub fn parse_number(text: &str, policy: NumericPolicy) -> Result<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => match policy {
            NumericPolicy::Lenient => Ok(0.0),
            NumericPolicy::Strict => Err(SnnError::MalformedNumber(text.to_owned())),
        },
    }
}
