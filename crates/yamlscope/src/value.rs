//! value representation
//!
//! Values stored in the fqn index have exactly three shapes
//! - text (a scalar leaf, never type-coerced)
//! - list (an array whose elements are all scalars)
//! - map (an order-preserving local-name -> value mapping of a child object)
//!
//! Numbers and booleans are stored as text, no value is ever converted back into a number.
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// Local-name to value mapping of one scope
pub type LocalMap = indexmap::IndexMap<String, FqnValue>;

/// All possible value types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FqnValue {
    Text(String),
    List(Vec<String>),
    Map(LocalMap),
}

impl FqnValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FqnValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&LocalMap> {
        match self {
            FqnValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Walk into nested maps along `segments`
    pub fn get_path<'a, I>(&self, segments: I) -> Option<&FqnValue>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Text form used when a value is spliced into a rendered template
    ///
    /// Lists are joined with `,`, maps become compact json.
    pub fn render(&self) -> String {
        match self {
            FqnValue::Text(text) => text.clone(),
            FqnValue::List(items) => items.join(","),
            FqnValue::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

impl From<String> for FqnValue {
    fn from(value: String) -> Self {
        FqnValue::Text(value)
    }
}

impl From<&str> for FqnValue {
    fn from(value: &str) -> Self {
        FqnValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FqnValue {
    fn from(value: Vec<String>) -> Self {
        FqnValue::List(value)
    }
}

impl From<LocalMap> for FqnValue {
    fn from(value: LocalMap) -> Self {
        FqnValue::Map(value)
    }
}

impl serde::ser::Serialize for FqnValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FqnValue::Text(value) => serializer.serialize_str(value),
            FqnValue::List(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            FqnValue::Map(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_path_walks_nested_maps() {
        let mut inner = LocalMap::new();
        inner.insert("name".into(), "svc".into());
        let mut outer = LocalMap::new();
        outer.insert("service".into(), inner.into());
        let value = FqnValue::Map(outer);

        assert_eq!(
            value.get_path(["service", "name"]),
            Some(&FqnValue::from("svc"))
        );
        assert_eq!(value.get_path(["service", "name", "deeper"]), None);
        assert_eq!(value.get_path(["missing"]), None);
    }

    #[test]
    fn accessors_match_shape() {
        let text = FqnValue::from("svc");
        let list = FqnValue::from(vec!["a".to_string()]);
        let mut map = LocalMap::new();
        map.insert("k".into(), "v".into());
        let map = FqnValue::Map(map);

        assert_eq!(text.as_text(), Some("svc"));
        assert_eq!(list.as_text(), None);
        assert_eq!(map.as_text(), None);

        assert_eq!(text.as_map(), None);
        assert_eq!(list.as_map(), None);
        let keys: Vec<_> = map.as_map().unwrap().keys().collect();
        assert_eq!(keys, vec!["k"]);
        assert_eq!(map.get_path(["k"]).and_then(FqnValue::as_text), Some("v"));
    }

    #[test]
    fn render_forms() {
        assert_eq!(FqnValue::from("a").render(), "a");
        assert_eq!(
            FqnValue::from(vec!["a".to_string(), "b".to_string()]).render(),
            "a,b"
        );

        let mut map = LocalMap::new();
        map.insert("k".into(), "v".into());
        assert_eq!(FqnValue::Map(map).render(), r#"{"k":"v"}"#);
    }
}
