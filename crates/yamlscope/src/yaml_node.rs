//! read-only view over a parsed yaml document ([serde_yaml::Value])
//!
//! [YamlNode] pairs a value with the field name it was found under. Every node is exactly one of
//! - a value node (scalar, including `null`)
//! - an object (ordered field map)
//! - an array
//!
//! Tags (`!foo bar`) are looked through, the tagged value decides the shape.
use serde_yaml::Value;
use std::borrow::Cow;

/// Field holding the unique identifier of an element
pub const IDENTIFIER_FIELD: &str = "identifier";

/// Fields checked, in order, for an array element's unique identifier
const ARRAY_UNIQUE_IDENTIFIER_FIELDS: [&str; 3] = [IDENTIFIER_FIELD, "name", "key"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Value,
    Object,
    Array,
}

#[derive(Debug, Clone)]
pub struct YamlNode<'a> {
    name: Cow<'a, str>,
    value: &'a Value,
}

impl<'a> YamlNode<'a> {
    pub fn new(name: impl Into<Cow<'a, str>>, value: &'a Value) -> Self {
        Self {
            name: name.into(),
            value: untagged(value),
        }
    }

    /// Name under the parent object, empty for array elements and the document itself
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        match self.value {
            Value::Mapping(_) => NodeKind::Object,
            Value::Sequence(_) => NodeKind::Array,
            _ => NodeKind::Value,
        }
    }

    pub fn is_object(&self) -> bool {
        self.kind() == NodeKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind() == NodeKind::Array
    }

    pub fn is_value_node(&self) -> bool {
        self.kind() == NodeKind::Value
    }

    /// Text of a value node
    pub fn as_text(&self) -> Option<String> {
        scalar_text(self.value)
    }

    /// Fields of an object, in document order. Empty for anything else.
    pub fn fields(&self) -> impl Iterator<Item = YamlNode<'a>> + 'a {
        self.value
            .as_mapping()
            .into_iter()
            .flatten()
            .filter_map(|(key, value)| match scalar_text(key) {
                Some(name) => Some(YamlNode::new(name, value)),
                None => {
                    tracing::trace!(?key, "skipping non-scalar mapping key");
                    None
                }
            })
    }

    /// Elements of an array, in document order. Empty for anything else.
    pub fn as_array(&self) -> impl Iterator<Item = YamlNode<'a>> + 'a {
        self.value
            .as_sequence()
            .into_iter()
            .flatten()
            .map(|value| YamlNode::new("", value))
    }

    pub fn field(&self, name: &str) -> Option<YamlNode<'a>> {
        let value = self.value.as_mapping()?.get(name)?;
        Some(YamlNode::new(name.to_string(), value))
    }

    /// Text of the `identifier` field
    pub fn identifier(&self) -> Option<String> {
        self.field_text(IDENTIFIER_FIELD)
    }

    /// First of `identifier`, `name` or `key` that holds a scalar
    ///
    /// Used for array entries that are addressed by something other than an identifier,
    /// like `variables: [{name: foo, value: bar}]`.
    pub fn array_unique_identifier(&self) -> Option<String> {
        ARRAY_UNIQUE_IDENTIFIER_FIELDS
            .iter()
            .find_map(|field| self.field_text(field))
    }

    fn field_text(&self, name: &str) -> Option<String> {
        self.field(name).and_then(|field| field.as_text())
    }
}

fn untagged(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untagged(&tagged.value),
        value => value,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match untagged(value) {
        Value::Null => Some("null".to_string()),
        Value::Bool(bool) => Some(bool.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(string) => Some(string.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).expect("yaml must parse")
    }

    #[test]
    fn shapes_are_exclusive() {
        let doc = parse("a: 1\nb: [1, 2]\nc: {d: e}\nf: !tag {g: h}");
        let root = YamlNode::new("", &doc);
        let kinds: Vec<_> = root.fields().map(|f| (f.name().to_string(), f.kind())).collect();

        assert_eq!(
            kinds,
            vec![
                ("a".to_string(), NodeKind::Value),
                ("b".to_string(), NodeKind::Array),
                ("c".to_string(), NodeKind::Object),
                ("f".to_string(), NodeKind::Object),
            ]
        );
    }

    #[test]
    fn scalar_text_is_not_coerced() {
        let doc = parse("a: 1.50\nb: true\nc: ~\nd: text");
        let root = YamlNode::new("", &doc);
        let texts: Vec<_> = root.fields().map(|f| f.as_text().unwrap()).collect();

        assert_eq!(texts, vec!["1.5", "true", "null", "text"]);
    }

    #[test]
    fn identifiers() {
        let doc = parse("- identifier: s1\n  name: one\n- name: var\n  value: x\n- key: k\n- other: 1");
        let root = YamlNode::new("", &doc);
        let ids: Vec<_> = root
            .as_array()
            .map(|e| (e.identifier(), e.array_unique_identifier()))
            .collect();

        assert_eq!(
            ids,
            vec![
                (Some("s1".to_string()), Some("s1".to_string())),
                (None, Some("var".to_string())),
                (None, Some("k".to_string())),
                (None, None),
            ]
        );
    }
}
