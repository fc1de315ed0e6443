//! Pointer-addressed upserts into JSON manifests such as `app.json`.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PointerError {
    Malformed,
    NotAnObject { segment: String },
}

fn segments(pointer: &str) -> Result<Vec<String>, PointerError> {
    let rest = pointer.strip_prefix('/').ok_or(PointerError::Malformed)?;
    Ok(rest
        .split('/')
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Set the value at `pointer`, creating intermediate objects as needed.
///
/// An empty document (`null`) is treated as `{}`.
pub(crate) fn set_pointer(doc: &mut Value, pointer: &str, value: Value) -> Result<(), PointerError> {
    let segs = segments(pointer)?;
    let Some((last, parents)) = segs.split_last() else {
        return Err(PointerError::Malformed);
    };

    if doc.is_null() {
        *doc = Value::Object(Map::new());
    }

    let mut cur = doc;
    let mut name = String::from("/");
    for seg in parents {
        let Value::Object(map) = cur else {
            return Err(PointerError::NotAnObject { segment: name });
        };
        cur = map
            .entry(seg.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        name = seg.clone();
    }

    match cur {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        _ => Err(PointerError::NotAnObject { segment: name }),
    }
}

/// Pretty JSON with a trailing newline.
pub(crate) fn render(doc: &Value) -> String {
    let mut out = serde_json::to_string_pretty(doc).unwrap_or_else(|_| "{}".to_string());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creates_missing_parents() {
        let mut doc = json!({"expo": {"name": "app"}});
        set_pointer(&mut doc, "/expo/extra/isDevelopment", json!(false)).expect("set");
        assert_eq!(
            doc,
            json!({"expo": {"name": "app", "extra": {"isDevelopment": false}}})
        );
    }

    #[test]
    fn refuses_to_descend_through_scalars() {
        let mut doc = json!({"expo": "flat"});
        let err = set_pointer(&mut doc, "/expo/extra/isDevelopment", json!(true)).unwrap_err();
        assert_eq!(
            err,
            PointerError::NotAnObject {
                segment: "expo".to_string()
            }
        );
    }

    #[test]
    fn escaped_segments_and_malformed_pointers() {
        let mut doc = Value::Null;
        set_pointer(&mut doc, "/a~1b", json!(1)).expect("set");
        assert_eq!(doc, json!({"a/b": 1}));
        assert_eq!(
            set_pointer(&mut doc, "no-slash", json!(1)),
            Err(PointerError::Malformed)
        );
    }
}
