//! Flattened index of all addressable scopes of a yaml document
//!
//! Every object (and every identified array element) that holds at least one value becomes a scope,
//! addressed by its fully qualified name (fqn): the dot-joined field names and identifiers leading
//! to it.
//!
//! **Example**
//!
//! ```yaml
//! pipeline:
//!   identifier: p1
//!   variables:
//!     - name: region
//!       value: eu
//!   stages:
//!     - stage:
//!         identifier: s1
//!         name: Stage One
//!     - parallel:
//!         - stage:
//!             identifier: s2
//! ```
//!
//! | **fqn**              | **local names**                            |
//! |----------------------|--------------------------------------------|
//! | `pipeline`           | `identifier`, `variables`, `stages`        |
//! | `pipeline.variables` | `region`                                   |
//! | `pipeline.stages`    | `s1`, `s2`                                 |
//! | `pipeline.stages.s1` | `identifier`, `name`                       |
//! | `pipeline.stages.s2` | `identifier`                               |
//!
//! The `parallel` wrapper does not show up in any path.
use crate::value::{FqnValue, LocalMap};
use crate::yaml_node::{NodeKind, YamlNode};
use serde::Serializer;

/// Field whose text is taken as the value of an anonymous `name`/`value` array entry
const ANONYMOUS_ENTRY_VALUE_FIELD: &str = "value";

#[derive(thiserror::Error, Debug)]
pub enum ExpressionError {
    #[error("No fqn given to resolve the expression from")]
    InvalidConfiguration,
    #[error("Path {fqn} does not exist in the document")]
    PathNotFound { fqn: String },
    #[error("Unable to parse yaml")]
    InvalidYaml(#[from] serde_yaml::Error),
    #[error("Document has no root field {field}")]
    MissingRootField { field: String },
}

/// Mapping of fqn to the local names defined in that scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FqnIndex {
    root: String,
    entries: indexmap::IndexMap<String, LocalMap>,
}

impl FqnIndex {
    /// Index everything below `root`, whose name becomes the first path segment
    pub fn build(root: &YamlNode<'_>) -> Self {
        FqnIndexer::default().index(root)
    }

    /// Name of the root element, also its fqn
    pub fn root_name(&self) -> &str {
        &self.root
    }

    pub fn get(&self, fqn: &str) -> Option<&LocalMap> {
        self.entries.get(fqn)
    }

    pub fn fqns(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `expression` starting at the scope `starting_fqn`
    ///
    /// The nearest scope defining `expression` wins:
    /// - the starting scope (or its parent, if `starting_fqn` points to a leaf)
    /// - the root element itself, when `expression` is its name
    /// - each ancestor scope, innermost first
    ///
    /// `Ok(None)` means no scope defines `expression`.
    pub fn resolve(
        &self,
        starting_fqn: &str,
        expression: &str,
    ) -> Result<Option<FqnValue>, ExpressionError> {
        self.resolve_with_hops(starting_fqn, expression)
            .map(|(value, _)| value)
    }

    /// [FqnIndex::resolve], also reporting how many ancestor scopes were visited
    #[tracing::instrument(level = "trace", skip(self))]
    fn resolve_with_hops(
        &self,
        starting_fqn: &str,
        expression: &str,
    ) -> Result<(Option<FqnValue>, usize), ExpressionError> {
        if starting_fqn.is_empty() {
            return Err(ExpressionError::InvalidConfiguration);
        }

        let (mut scope, local) = match self.entries.get(starting_fqn) {
            Some(local) => (starting_fqn, local),
            None => parent_fqn(starting_fqn)
                .and_then(|parent| self.entries.get(parent).map(|local| (parent, local)))
                .ok_or_else(|| ExpressionError::PathNotFound {
                    fqn: starting_fqn.to_string(),
                })?,
        };

        if let Some(value) = local.get(expression) {
            tracing::debug!(scope, "resolved in starting scope");
            return Ok((Some(value.clone()), 0));
        }

        if expression == self.root {
            let root = self.entries.get(&self.root).cloned().map(FqnValue::Map);
            return Ok((root, 0));
        }

        let mut hops = 0;
        while let Some(parent) = parent_fqn(scope) {
            hops += 1;
            scope = parent;

            if let Some(value) = self.entries.get(scope).and_then(|local| local.get(expression)) {
                tracing::debug!(scope, hops, "resolved in ancestor scope");
                return Ok((Some(value.clone()), hops));
            }
        }

        tracing::debug!(hops, "not resolved");
        Ok((None, hops))
    }
}

impl serde::ser::Serialize for FqnIndex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(&self.entries)
    }
}

fn parent_fqn(fqn: &str) -> Option<&str> {
    fqn.rsplit_once('.').map(|(parent, _)| parent)
}

/// Builds [FqnIndex]es, tracking the current path as a stack of segments
///
/// The stack is back to empty after every [FqnIndexer::index], so one indexer can be reused.
#[derive(Debug, Default)]
pub struct FqnIndexer {
    path: Vec<String>,
}

type Entries = indexmap::IndexMap<String, LocalMap>;

impl FqnIndexer {
    #[tracing::instrument(level = "trace", skip_all, fields(root = root.name()))]
    pub fn index(&mut self, root: &YamlNode<'_>) -> FqnIndex {
        let mut entries = Entries::new();
        self.index_node(root, &mut entries);

        FqnIndex {
            root: root.name().to_string(),
            entries,
        }
    }

    fn fqn(&self) -> String {
        self.path.join(".")
    }

    /// Index a named node and register its scope
    fn index_node(&mut self, node: &YamlNode<'_>, entries: &mut Entries) -> LocalMap {
        self.path.push(node.name().to_string());

        let local = match node.kind() {
            NodeKind::Object => self.object_fields(node, entries),
            NodeKind::Array => self.array_elements(node, entries),
            NodeKind::Value => LocalMap::new(),
        };

        self.register(&local, entries);
        self.path.pop();

        local
    }

    fn register(&self, local: &LocalMap, entries: &mut Entries) {
        if local.is_empty() {
            return;
        }

        let fqn = self.fqn();
        tracing::trace!(%fqn, names = local.len(), "scope indexed");
        entries.insert(fqn, local.clone());
    }

    /// Local map of an object, relative to the current path
    fn object_fields(&mut self, node: &YamlNode<'_>, entries: &mut Entries) -> LocalMap {
        let mut local = LocalMap::new();

        for field in node.fields() {
            let name = field.name().to_string();

            if let Some(text) = field.as_text() {
                local.insert(name, FqnValue::Text(text));
                continue;
            }

            if field.is_array() && field.as_array().all(|element| element.is_value_node()) {
                let texts = field.as_array().filter_map(|element| element.as_text());
                local.insert(name, FqnValue::List(texts.collect()));
                continue;
            }

            let child = self.index_node(&field, entries);
            if !child.is_empty() {
                local.insert(name, FqnValue::Map(child));
            }
        }

        local
    }

    /// Local map of an array, relative to the current path
    ///
    /// Only three element shapes contribute, everything else is dropped:
    /// - `{name: x, value: y}` entries without identifier, recorded as `x: y`
    /// - `{wrapper: {identifier: x, ...}}` entries, indexed as scope `x`
    /// - `{wrapper: [...]}` entries, merged in as if the inner array was this one
    fn array_elements(&mut self, node: &YamlNode<'_>, entries: &mut Entries) -> LocalMap {
        let mut local = LocalMap::new();

        for element in node.as_array() {
            if let Some((key, text)) = anonymous_entry(&element) {
                local.insert(key, FqnValue::Text(text));
                continue;
            }

            if !element.is_object() {
                continue;
            }

            for field in element.fields() {
                if let Some(identifier) = field.identifier() {
                    self.path.push(identifier.clone());
                    let scope = self.object_fields(&field, entries);
                    self.register(&scope, entries);
                    self.path.pop();

                    local.insert(identifier, FqnValue::Map(scope));
                } else if field.is_array() {
                    let nested = self.array_elements(&field, entries);
                    local.extend(nested);
                }
            }
        }

        local
    }
}

/// `(array unique identifier, value text)` of a `name`/`value` style entry
fn anonymous_entry(element: &YamlNode<'_>) -> Option<(String, String)> {
    if element.identifier().is_some() {
        return None;
    }

    let key = element.array_unique_identifier()?;
    let value = element.field(ANONYMOUS_ENTRY_VALUE_FIELD)?;
    if !value.is_value_node() {
        return None;
    }

    Some((key, value.as_text()?))
}
