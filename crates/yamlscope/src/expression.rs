//! `<+yamlExpression.*>` evaluation
//!
//! Expressions are dotted paths. The first segment is looked up through the scope chain of the
//! element currently being rendered (see [FqnIndex::resolve]), the remaining segments walk into
//! the value that was found.
//!
//! ```
//! # use yamlscope::expression::{ExpressionEngine, YamlExpressionEvaluator};
//! let yaml = "pipeline:\n  stages:\n    - stage:\n        identifier: s1\n        name: Stage One\n";
//! let evaluator = YamlExpressionEvaluator::new(yaml, "pipeline.stages.s1");
//!
//! let rendered = evaluator.render("deploying <+yamlExpression.name>").unwrap();
//! assert_eq!(rendered, "deploying Stage One");
//! ```
use crate::fqn_index::{ExpressionError, FqnIndex};
use crate::value::FqnValue;
use crate::yaml_node::YamlNode;
use std::cell::OnceCell;

/// Prefix routed to [YamlExpressionEvaluator]
pub const YAML_EXPRESSION_PREFIX: &str = "yamlExpression";

/// Top-level field holding the element that is indexed
pub const DEFAULT_ROOT_FIELD: &str = "pipeline";

const EXPRESSION_START: &str = "<+";
const EXPRESSION_END: char = '>';

/// An expression namespace
pub trait ExpressionEngine {
    /// Prefixes this engine is responsible for, in lookup order
    fn prefixes(&self) -> Vec<String>;

    /// Evaluate a single expression, wrapped in `<+...>` or bare
    ///
    /// `Ok(None)` when the expression does not resolve or belongs to another namespace.
    fn evaluate(&self, expression: &str) -> Result<Option<FqnValue>, ExpressionError>;

    /// Replace all `<+...>` expressions in `template` that evaluate to a value
    ///
    /// Expressions that do not resolve stay as they are.
    fn render(&self, template: &str) -> Result<String, ExpressionError> {
        let mut rendered = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find(EXPRESSION_START) {
            rendered.push_str(&rest[..start]);
            rest = &rest[start..];

            let Some(end) = rest.find(EXPRESSION_END) else {
                break;
            };

            // a stray start marker is plain text, the scan restarts at the next one
            if let Some(inner) = rest[EXPRESSION_START.len()..end].find(EXPRESSION_START) {
                let inner = inner + EXPRESSION_START.len();
                rendered.push_str(&rest[..inner]);
                rest = &rest[inner..];
                continue;
            }

            let expression = &rest[..=end];
            match self.evaluate(expression)? {
                Some(value) => rendered.push_str(&value.render()),
                None => rendered.push_str(expression),
            }
            rest = &rest[end + 1..];
        }

        rendered.push_str(rest);
        Ok(rendered)
    }
}

/// Evaluates expressions against one yaml document, as seen from one element in it
///
/// The document is parsed and indexed on first use.
#[derive(Debug)]
pub struct YamlExpressionEvaluator {
    yaml: String,
    fqn: String,
    root_field: String,
    base_prefixes: Vec<String>,
    index: OnceCell<FqnIndex>,
}

impl YamlExpressionEvaluator {
    /// `fqn` is the path of the element being rendered, e.g. `pipeline.stages.s1.spec`
    pub fn new(yaml: impl Into<String>, fqn: impl Into<String>) -> Self {
        Self {
            yaml: yaml.into(),
            fqn: fqn.into(),
            root_field: DEFAULT_ROOT_FIELD.to_string(),
            base_prefixes: Vec::new(),
            index: OnceCell::new(),
        }
    }

    /// Index the document below `root_field` instead of `pipeline`
    pub fn with_root_field(mut self, root_field: impl Into<String>) -> Self {
        self.root_field = root_field.into();
        self.index = OnceCell::new();
        self
    }

    /// Prefixes of the underlying engine, checked after [YAML_EXPRESSION_PREFIX]
    pub fn with_base_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.base_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    /// The index of the document, built on first access
    pub fn index(&self) -> Result<&FqnIndex, ExpressionError> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }

        let index = self.build_index()?;
        Ok(self.index.get_or_init(|| index))
    }

    #[tracing::instrument(level = "trace", skip_all, fields(root = %self.root_field))]
    fn build_index(&self) -> Result<FqnIndex, ExpressionError> {
        let document: serde_yaml::Value = serde_yaml::from_str(&self.yaml)?;
        let root = YamlNode::new("", &document)
            .field(&self.root_field)
            .ok_or_else(|| ExpressionError::MissingRootField {
                field: self.root_field.clone(),
            })?;

        let index = FqnIndex::build(&root);
        tracing::debug!(scopes = index.len(), "document indexed");
        Ok(index)
    }

    /// Look up a single name through the scope chain of [Self::fqn]
    pub fn resolve(&self, name: &str) -> Result<Option<FqnValue>, ExpressionError> {
        self.index()?.resolve(&self.fqn, name)
    }
}

impl ExpressionEngine for YamlExpressionEvaluator {
    fn prefixes(&self) -> Vec<String> {
        std::iter::once(YAML_EXPRESSION_PREFIX.to_string())
            .chain(self.base_prefixes.iter().cloned())
            .collect()
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn evaluate(&self, expression: &str) -> Result<Option<FqnValue>, ExpressionError> {
        let mut segments = unwrap_expression(expression).split('.');

        let mut first = segments.next().unwrap_or_default();
        if first == YAML_EXPRESSION_PREFIX {
            first = segments.next().unwrap_or_default();
        } else if self.base_prefixes.iter().any(|prefix| prefix == first) {
            tracing::trace!(prefix = first, "left to base engine");
            return Ok(None);
        }

        if first.is_empty() {
            return Ok(None);
        }

        let Some(value) = self.resolve(first)? else {
            return Ok(None);
        };

        Ok(value.get_path(segments).cloned())
    }
}

fn unwrap_expression(expression: &str) -> &str {
    let expression = expression.trim();
    expression
        .strip_prefix(EXPRESSION_START)
        .and_then(|inner| inner.strip_suffix(EXPRESSION_END))
        .map(str::trim)
        .unwrap_or(expression)
}
