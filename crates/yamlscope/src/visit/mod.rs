//! visitor pattern helpers
//!
//! Domain objects opt into traversal by implementing [Visitable] and listing their children.
//! [Visitor::walk] then runs, for every element, depth first:
//!
//! 1. [Visitor::pre_visit] - always
//! 2. [Visitor::visit] - only for [Element::Object] and only if pre-visit returned `Continue`
//! 3. the children - only if visit returned `Continue`
//! 4. [Visitor::post_visit] - always, unless the walk was terminated
//!
//! `Terminate` ends the whole walk. `SkipSiblings` returned by a child's post-visit stops the
//! iteration over the remaining children of its parent. `SkipSubtree` returned by post-visit is
//! consumed and reported upwards as `Continue`.
//!
//! Scalars and arrays ([Element::Scalar], [Element::Array]) are pre- and post-visited but never
//! descended into. Types holding raw collections expose their contents through a
//! [DummyVisitableElement] helper instead.
mod simple_visitor;
pub use simple_visitor::{DummyVisitableElement, HelperRegistry, SimpleVisitor};

use std::any::Any;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitElementResult {
    Continue,
    Terminate,
    SkipSiblings,
    SkipSubtree,
}

#[derive(thiserror::Error, Debug)]
pub enum VisitorError {
    #[error("No dummy element helper registered for {type_name}")]
    MissingHelper { type_name: &'static str },
}

/// Access to the concrete type behind a `dyn` reference
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A domain object that lists its children for traversal
pub trait Visitable: AsAny + std::fmt::Debug {
    /// Children in walk order. `None` entries are skipped.
    fn children_to_walk(&self) -> VisitableChildren<'_>;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Downcast a visited node to its concrete type
pub fn downcast<T: Visitable>(node: &dyn Visitable) -> Option<&T> {
    node.as_any().downcast_ref::<T>()
}

/// One element of the walked tree
#[derive(Debug, Clone)]
pub enum Element<'a> {
    Scalar(Cow<'a, str>),
    Object(&'a dyn Visitable),
    Array(Vec<Element<'a>>),
}

impl<'a> Element<'a> {
    pub fn as_visitable(&self) -> Option<&'a dyn Visitable> {
        match self {
            Element::Object(node) => Some(*node),
            _ => None,
        }
    }
}

impl<'a, T: Visitable> From<&'a T> for Element<'a> {
    fn from(value: &'a T) -> Self {
        Element::Object(value)
    }
}

#[derive(Debug, Clone)]
pub struct VisitableChild<'a> {
    pub field_name: String,
    pub value: Option<Element<'a>>,
}

/// Ordered list of named children
#[derive(Debug, Default, Clone)]
pub struct VisitableChildren<'a> {
    children: Vec<VisitableChild<'a>>,
}

impl<'a> VisitableChildren<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field_name: impl Into<String>, value: Option<Element<'a>>) -> &mut Self {
        self.children.push(VisitableChild {
            field_name: field_name.into(),
            value,
        });
        self
    }

    pub fn add_node<T: Visitable>(&mut self, field_name: impl Into<String>, node: &'a T) -> &mut Self {
        self.add(field_name, Some(node.into()))
    }

    pub fn add_optional<T: Visitable>(
        &mut self,
        field_name: impl Into<String>,
        node: Option<&'a T>,
    ) -> &mut Self {
        self.add(field_name, node.map(Element::from))
    }

    pub fn add_scalar(&mut self, field_name: impl Into<String>, value: impl Into<Cow<'a, str>>) -> &mut Self {
        self.add(field_name, Some(Element::Scalar(value.into())))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisitableChild<'a>> {
        self.children.iter()
    }
}

impl<'a> IntoIterator for VisitableChildren<'a> {
    type Item = VisitableChild<'a>;
    type IntoIter = std::vec::IntoIter<VisitableChild<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}

/// State of a single walk, shared by all visitor callbacks
///
/// Holds the field path of the element currently visited (the root has the empty path) and a
/// free-form key/value store.
#[derive(Debug, Default)]
pub struct VisitorContext {
    path: Vec<String>,
    values: std::collections::HashMap<String, serde_json::Value>,
}

impl VisitorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dot-joined field names from the root to the current element
    pub fn path(&self) -> String {
        self.path.join(".")
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

pub trait Visitor {
    fn pre_visit(
        &mut self,
        _element: &Element<'_>,
        _context: &mut VisitorContext,
    ) -> Result<VisitElementResult, VisitorError> {
        Ok(VisitElementResult::Continue)
    }

    fn visit(
        &mut self,
        node: &dyn Visitable,
        context: &mut VisitorContext,
    ) -> Result<VisitElementResult, VisitorError>;

    fn post_visit(
        &mut self,
        _element: &Element<'_>,
        _context: &mut VisitorContext,
    ) -> Result<VisitElementResult, VisitorError> {
        Ok(VisitElementResult::Continue)
    }

    /// Children of `node` to descend into
    fn children_to_walk<'a>(
        &mut self,
        node: &'a dyn Visitable,
        _context: &mut VisitorContext,
    ) -> Result<VisitableChildren<'a>, VisitorError> {
        Ok(node.children_to_walk())
    }

    /// Walk the tree below `root`
    fn walk(
        &mut self,
        root: &dyn Visitable,
        context: &mut VisitorContext,
    ) -> Result<VisitElementResult, VisitorError>
    where
        Self: Sized,
    {
        walk_element(self, &Element::Object(root), context)
    }
}

#[tracing::instrument(level = "trace", skip_all, fields(path = %context.path()))]
fn walk_element<V: Visitor + ?Sized>(
    visitor: &mut V,
    element: &Element<'_>,
    context: &mut VisitorContext,
) -> Result<VisitElementResult, VisitorError> {
    use VisitElementResult::*;

    match visitor.pre_visit(element, context)? {
        Terminate => return Ok(Terminate),
        Continue => {
            if let Element::Object(node) = element {
                match visitor.visit(*node, context)? {
                    Terminate => return Ok(Terminate),
                    Continue => {
                        if walk_children(visitor, *node, context)? == Terminate {
                            return Ok(Terminate);
                        }
                    }
                    SkipSiblings | SkipSubtree => {}
                }
            }
        }
        SkipSiblings | SkipSubtree => {}
    }

    match visitor.post_visit(element, context)? {
        SkipSubtree => Ok(Continue),
        result => Ok(result),
    }
}

fn walk_children<V: Visitor + ?Sized>(
    visitor: &mut V,
    node: &dyn Visitable,
    context: &mut VisitorContext,
) -> Result<VisitElementResult, VisitorError> {
    for child in visitor.children_to_walk(node, context)? {
        let Some(value) = child.value else {
            continue;
        };

        context.path.push(child.field_name);
        let result = walk_element(visitor, &value, context);
        context.path.pop();

        match result? {
            VisitElementResult::Terminate => return Ok(VisitElementResult::Terminate),
            VisitElementResult::SkipSiblings => break,
            _ => {}
        }
    }

    Ok(VisitElementResult::Continue)
}
