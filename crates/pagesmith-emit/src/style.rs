//! Style map serialization.

use serde_json::Value;

use pagesmith_model::StyleMap;

/// Serialize a style map into CSS declarations, one per line.
///
/// Keys are converted from camelCase to kebab-case; values are emitted as-is
/// without unit validation.
pub fn serialize_styles(styles: Option<&StyleMap>) -> String {
    declarations(styles).collect::<Vec<_>>().join("\n")
}

/// Serialize a style map for a `style="..."` attribute.
pub fn inline_styles(styles: Option<&StyleMap>) -> String {
    declarations(styles).collect::<Vec<_>>().join(" ")
}

fn declarations(styles: Option<&StyleMap>) -> impl Iterator<Item = String> + '_ {
    styles
        .into_iter()
        .flat_map(|map| map.iter())
        .filter_map(|(key, value)| {
            css_value(value).map(|value| format!("{}: {};", to_kebab_case(key), value))
        })
}

/// Render a JSON value as CSS text. Null, arrays and objects have no CSS form.
fn css_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Convert a camelCase property name to kebab-case.
pub fn to_kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn styles(value: Value) -> StyleMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn serializes_declarations_in_input_order() {
        let map = styles(json!({ "backgroundColor": "#fff", "padding": "1rem" }));

        assert_eq!(
            serialize_styles(Some(&map)),
            "background-color: #fff;\npadding: 1rem;"
        );
    }

    #[test]
    fn missing_or_empty_input_is_empty() {
        assert_eq!(serialize_styles(None), "");
        assert_eq!(serialize_styles(Some(&StyleMap::new())), "");
    }

    #[test]
    fn kebab_cases_every_uppercase_letter() {
        assert_eq!(to_kebab_case("borderTopLeftRadius"), "border-top-left-radius");
        assert_eq!(to_kebab_case("WebkitTransition"), "-webkit-transition");
        assert_eq!(to_kebab_case("color"), "color");
    }

    #[test]
    fn renders_scalar_values_and_skips_structured_ones() {
        let map = styles(json!({ "zIndex": 10, "flexGrow": 1.5, "margin": null, "x": [] }));

        assert_eq!(serialize_styles(Some(&map)), "z-index: 10;\nflex-grow: 1.5;");
    }

    #[test]
    fn inline_form_uses_spaces() {
        let map = styles(json!({ "color": "red", "fontSize": "12px" }));

        assert_eq!(inline_styles(Some(&map)), "color: red; font-size: 12px;");
    }
}
