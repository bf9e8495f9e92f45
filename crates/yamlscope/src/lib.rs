//! # yamlscope - scoped lookups in yaml documents
//!
//! Two independent pieces live in this crate:
//! - resolving dotted expressions against a yaml document, as seen from one element in it
//! - walking typed object graphs with a visitor
//!
//! ## Introduction for developers
//!
//! ### Document model
//!
//! Documents are parsed with [serde_yaml] (json is valid yaml, so both work). [yaml_node::YamlNode] is a
//! read-only view over the parsed value that only knows three shapes: value nodes, objects and
//! arrays. It also knows how elements identify themselves:
//!
//! - `identifier`: the `identifier` field of an object
//! - array unique identifier: the first of `identifier`, `name` or `key`
//!
//! ### Indexing
//!
//! see [fqn_index::FqnIndex::build]
//!
//! A single depth first pass turns the document below the root element (usually `pipeline`) into a
//! flat map of scopes. Each scope has a fully qualified name (fqn) and maps local names to values.
//!
//! **Example**
//!
//! ```yaml
//! pipeline:
//!   identifier: p1
//!   stages:
//!     - stage:
//!         identifier: s1
//!         name: Stage One
//! ```
//!
//! | **fqn**              | **local names**                     |
//! |----------------------|-------------------------------------|
//! | `pipeline.stages.s1` | `identifier: s1`, `name: Stage One` |
//! | `pipeline.stages`    | `s1: {..}`                          |
//! | `pipeline`           | `identifier: p1`, `stages: {..}`    |
//!
//! Array elements are addressed by their identifier instead of their position. Arrays of
//! `name`/`value` pairs (variables) are flattened to `name: value`. Wrapper arrays (`parallel`)
//! disappear from the path.
//!
//! ### Resolution
//!
//! see [fqn_index::FqnIndex::resolve]
//!
//! Given the fqn of the element being rendered and a name, the innermost scope defining the name
//! wins. Resolution starts at the element and walks up one path segment at a time. The root
//! element's name always resolves to the whole root scope.
//!
//! ### Evaluation
//!
//! [expression::YamlExpressionEvaluator] owns the yaml text and the current fqn, indexes lazily and
//! answers `<+yamlExpression.a.b.c>` expressions: `a` is resolved through the scope chain, `b` and
//! `c` are looked up inside the result.
//!
//! ### Visiting
//!
//! see [visit]
//!
//! Domain types implement [visit::Visitable]. A [visit::Visitor] gets pre-visit, visit and
//! post-visit callbacks and steers the walk with [visit::VisitElementResult].
//! [visit::SimpleVisitor] builds placeholder copies of every node through helpers registered per
//! type in a [visit::HelperRegistry].
//!
pub mod expression;
pub mod fqn_index;
pub mod value;
pub mod visit;
pub mod yaml_node;
