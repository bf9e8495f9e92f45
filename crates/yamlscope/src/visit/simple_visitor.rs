use super::{
    AsAny, VisitElementResult, Visitable, VisitableChildren, Visitor, VisitorContext, VisitorError,
};
use std::any::TypeId;
use std::collections::HashMap;

/// Type specific strategy used by [SimpleVisitor]
pub trait DummyVisitableElement: Send + Sync {
    /// Placeholder for `original`, e.g. a copy with secret values masked
    ///
    /// `None` when no placeholder is needed.
    fn create_dummy_visitable_element(&self, original: &dyn Visitable) -> Option<Box<dyn Visitable>>;

    /// Add children that [Visitable::children_to_walk] cannot express, like the entries of a map
    fn handle_complex_visitable_children<'a>(
        &self,
        _original: &'a dyn Visitable,
        _children: &mut VisitableChildren<'a>,
        _context: &mut VisitorContext,
    ) {
    }
}

/// Helpers by the concrete type they are responsible for
///
/// ```
/// # use yamlscope::visit::{DummyVisitableElement, HelperRegistry, Visitable, VisitableChildren};
/// #[derive(Debug)]
/// struct Step;
///
/// impl Visitable for Step {
///     fn children_to_walk(&self) -> VisitableChildren<'_> {
///         VisitableChildren::new()
///     }
/// }
///
/// struct StepHelper;
///
/// impl DummyVisitableElement for StepHelper {
///     fn create_dummy_visitable_element(&self, _: &dyn Visitable) -> Option<Box<dyn Visitable>> {
///         Some(Box::new(Step))
///     }
/// }
///
/// let registry = HelperRegistry::new().register::<Step>(StepHelper);
/// assert!(registry.helper_for(&Step).is_ok());
/// ```
#[derive(Default)]
pub struct HelperRegistry {
    helpers: HashMap<TypeId, Box<dyn DummyVisitableElement>>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `helper` to `T`, replacing a previous binding
    pub fn register<T: Visitable>(mut self, helper: impl DummyVisitableElement + 'static) -> Self {
        self.helpers.insert(TypeId::of::<T>(), Box::new(helper));
        self
    }

    pub fn helper_for(&self, node: &dyn Visitable) -> Result<&dyn DummyVisitableElement, VisitorError> {
        match self.helpers.get(&node.as_any().type_id()) {
            Some(helper) => Ok(&**helper),
            None => {
                let type_name = node.type_name();
                tracing::error!(type_name, "no dummy element helper registered");
                Err(VisitorError::MissingHelper { type_name })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl std::fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("helpers", &self.helpers.len())
            .finish()
    }
}

/// Collects a placeholder for every visited node, in visit order, next to its path
///
/// Siblings added under the same field name (list entries) share a path, each keeps its own
/// placeholder.
///
/// Every [Visitable] reached must have a helper in the registry, otherwise the walk fails with
/// [VisitorError::MissingHelper].
#[derive(derive_new::new, Debug)]
pub struct SimpleVisitor<'r> {
    registry: &'r HelperRegistry,
    #[new(default)]
    dummies: Vec<(String, Box<dyn Visitable>)>,
}

impl<'r> SimpleVisitor<'r> {
    /// Placeholders created at `path`, in visit order
    pub fn dummies_at<'s>(&'s self, path: &'s str) -> impl Iterator<Item = &'s dyn Visitable> + 's {
        self.dummies
            .iter()
            .filter(move |(dummy_path, _)| dummy_path == path)
            .map(|(_, dummy)| &**dummy)
    }

    pub fn dummies(&self) -> impl Iterator<Item = (&str, &dyn Visitable)> {
        self.dummies
            .iter()
            .map(|(path, dummy)| (path.as_str(), &**dummy))
    }

    pub fn into_dummies(self) -> Vec<(String, Box<dyn Visitable>)> {
        self.dummies
    }
}

impl<'r> Visitor for SimpleVisitor<'r> {
    fn visit(
        &mut self,
        node: &dyn Visitable,
        context: &mut VisitorContext,
    ) -> Result<VisitElementResult, VisitorError> {
        let registry = self.registry;
        if let Some(dummy) = registry.helper_for(node)?.create_dummy_visitable_element(node) {
            let path = context.path();
            tracing::trace!(%path, type_name = node.type_name(), "dummy created");
            self.dummies.push((path, dummy));
        }

        Ok(VisitElementResult::Continue)
    }

    fn children_to_walk<'a>(
        &mut self,
        node: &'a dyn Visitable,
        context: &mut VisitorContext,
    ) -> Result<VisitableChildren<'a>, VisitorError> {
        let registry = self.registry;
        let mut children = node.children_to_walk();
        registry
            .helper_for(node)?
            .handle_complex_visitable_children(node, &mut children, context);

        Ok(children)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::visit::{downcast, Element};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Connector {
        name: String,
        token: String,
    }

    impl Visitable for Connector {
        fn children_to_walk(&self) -> VisitableChildren<'_> {
            let mut children = VisitableChildren::new();
            children.add_scalar("name", self.name.as_str());
            children
        }
    }

    #[derive(Debug)]
    struct Registry {
        connectors: std::collections::BTreeMap<String, Connector>,
    }

    impl Visitable for Registry {
        fn children_to_walk(&self) -> VisitableChildren<'_> {
            VisitableChildren::new()
        }
    }

    struct MaskingHelper;

    impl DummyVisitableElement for MaskingHelper {
        fn create_dummy_visitable_element(&self, original: &dyn Visitable) -> Option<Box<dyn Visitable>> {
            let connector = downcast::<Connector>(original)?;
            Some(Box::new(Connector {
                name: connector.name.clone(),
                token: "*****".to_string(),
            }))
        }
    }

    struct RegistryHelper;

    impl DummyVisitableElement for RegistryHelper {
        fn create_dummy_visitable_element(&self, _original: &dyn Visitable) -> Option<Box<dyn Visitable>> {
            None
        }

        fn handle_complex_visitable_children<'a>(
            &self,
            original: &'a dyn Visitable,
            children: &mut VisitableChildren<'a>,
            _context: &mut VisitorContext,
        ) {
            if let Some(registry) = downcast::<Registry>(original) {
                for (key, connector) in &registry.connectors {
                    children.add(key.clone(), Some(Element::from(connector)));
                }
            }
        }
    }

    fn registry() -> Registry {
        Registry {
            connectors: [("git", "secret-1"), ("docker", "secret-2")]
                .into_iter()
                .map(|(name, token)| {
                    let connector = Connector {
                        name: name.to_string(),
                        token: token.to_string(),
                    };
                    (name.to_string(), connector)
                })
                .collect(),
        }
    }

    #[test]
    fn dummies_for_complex_children() {
        let helpers = HelperRegistry::new()
            .register::<Connector>(MaskingHelper)
            .register::<Registry>(RegistryHelper);
        let mut visitor = SimpleVisitor::new(&helpers);

        let result = visitor
            .walk(&registry(), &mut VisitorContext::new())
            .unwrap();
        assert_eq!(result, VisitElementResult::Continue);

        let dummies: Vec<_> = visitor
            .dummies()
            .map(|(path, dummy)| {
                let connector = downcast::<Connector>(dummy).unwrap();
                (path.to_string(), connector.token.clone())
            })
            .collect();

        assert_eq!(
            dummies,
            vec![
                ("docker".to_string(), "*****".to_string()),
                ("git".to_string(), "*****".to_string()),
            ]
        );
        assert_eq!(visitor.dummies_at("").count(), 0);
    }

    #[derive(Debug, Clone)]
    struct Step {
        identifier: String,
    }

    impl Visitable for Step {
        fn children_to_walk(&self) -> VisitableChildren<'_> {
            VisitableChildren::new()
        }
    }

    #[derive(Debug, Clone)]
    struct Stage {
        steps: Vec<Step>,
    }

    impl Visitable for Stage {
        fn children_to_walk(&self) -> VisitableChildren<'_> {
            let mut children = VisitableChildren::new();
            for step in &self.steps {
                children.add_node("steps", step);
            }
            children
        }
    }

    struct CloningHelper;

    impl DummyVisitableElement for CloningHelper {
        fn create_dummy_visitable_element(&self, original: &dyn Visitable) -> Option<Box<dyn Visitable>> {
            if let Some(step) = downcast::<Step>(original) {
                return Some(Box::new(step.clone()));
            }
            downcast::<Stage>(original).map(|stage| Box::new(stage.clone()) as Box<dyn Visitable>)
        }
    }

    #[test]
    fn list_children_keep_their_own_dummy() {
        let helpers = HelperRegistry::new()
            .register::<Stage>(CloningHelper)
            .register::<Step>(CloningHelper);
        let stage = Stage {
            steps: ["a", "b", "c"]
                .into_iter()
                .map(|identifier| Step {
                    identifier: identifier.to_string(),
                })
                .collect(),
        };

        let mut visitor = SimpleVisitor::new(&helpers);
        visitor.walk(&stage, &mut VisitorContext::new()).unwrap();

        let at_steps: Vec<_> = visitor
            .dummies_at("steps")
            .map(|dummy| downcast::<Step>(dummy).unwrap().identifier.as_str())
            .collect();
        assert_eq!(at_steps, vec!["a", "b", "c"]);

        let paths: Vec<_> = visitor
            .into_dummies()
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        assert_eq!(paths, vec!["", "steps", "steps", "steps"]);
    }

    #[test]
    fn missing_helper() {
        let helpers = HelperRegistry::new().register::<Registry>(RegistryHelper);
        let mut visitor = SimpleVisitor::new(&helpers);

        let error = visitor
            .walk(&registry(), &mut VisitorContext::new())
            .unwrap_err();

        assert!(matches!(
            error,
            VisitorError::MissingHelper { type_name } if type_name.ends_with("Connector")
        ));
    }
}
