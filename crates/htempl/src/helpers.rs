/*
 * helpers.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Functions callable from template expressions.
//!
//! The default set is [`DEFAULT_HELPERS`]:
//!
//! - `map(k1, v1, k2, v2, ...)`: build a mapping from key/value pairs
//! - `withDefault(m, key, value)`: `m` with `key` set to `value` unless `m`
//!   already has it
//! - `md2html(text)`: convert markdown to HTML, exempt from escaping
//! - `safeattr`, `safehtml`, `safejs`, `safecss`, `safeurl`: mark a string
//!   as trusted so it is written without escaping
//!
//! A [`HelperRegistry`] is a plain value. Callers start from the default,
//! add or remove entries, and hand it to the compiler.

use std::collections::BTreeMap;

use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};

/// Signature shared by every helper.
pub type HelperFn = fn(Rest<Value>) -> Result<Value, Error>;

/// The helpers installed by [`HelperRegistry::default`].
pub const DEFAULT_HELPERS: &[(&str, HelperFn)] = &[
    ("map", map as HelperFn),
    ("withDefault", with_default as HelperFn),
    ("md2html", md2html as HelperFn),
    ("safeattr", safe_attr as HelperFn),
    ("safehtml", safe_html as HelperFn),
    ("safejs", safe_js as HelperFn),
    ("safecss", safe_css as HelperFn),
    ("safeurl", safe_url as HelperFn),
];

/// A named set of helpers to install into a template set.
#[derive(Debug, Clone)]
pub struct HelperRegistry {
    helpers: BTreeMap<String, HelperFn>,
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::from_table(DEFAULT_HELPERS)
    }
}

impl HelperRegistry {
    /// A registry without any helpers.
    pub fn empty() -> Self {
        Self {
            helpers: BTreeMap::new(),
        }
    }

    /// A registry holding every entry of `table`.
    pub fn from_table(table: &[(&str, HelperFn)]) -> Self {
        Self {
            helpers: table
                .iter()
                .map(|(name, f)| ((*name).to_string(), *f))
                .collect(),
        }
    }

    /// Add a helper, replacing any helper of the same name.
    pub fn insert(&mut self, name: impl Into<String>, helper: HelperFn) -> &mut Self {
        self.helpers.insert(name.into(), helper);
        self
    }

    /// Remove a helper, returning it if it was registered.
    pub fn remove(&mut self, name: &str) -> Option<HelperFn> {
        self.helpers.remove(name)
    }

    /// Look up a helper by name.
    pub fn get(&self, name: &str) -> Option<HelperFn> {
        self.helpers.get(name).copied()
    }

    /// Helper names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    /// Register every helper as a global function of `env`.
    pub fn install(&self, env: &mut Environment<'_>) {
        for (name, helper) in &self.helpers {
            env.add_function(name.clone(), *helper);
        }
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

fn expect_arity(helper: &str, args: &[Value], count: usize) -> Result<(), Error> {
    if args.len() == count {
        Ok(())
    } else {
        Err(invalid(format!(
            "{helper} expects {count} argument(s), got {}",
            args.len()
        )))
    }
}

fn single_string(helper: &str, args: &[Value]) -> Result<String, Error> {
    expect_arity(helper, args, 1)?;
    args[0]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(format!("{helper} expects a string, got {}", args[0].kind())))
}

fn is_null(value: &Value) -> bool {
    value.is_none() || value.is_undefined()
}

/// Build a mapping from alternating keys and values.
pub fn map(args: Rest<Value>) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(invalid(format!(
            "map expects key/value pairs, got {} argument(s)",
            args.len()
        )));
    }
    let mut out = BTreeMap::new();
    for pair in args.chunks(2) {
        let key = pair[0]
            .as_str()
            .ok_or_else(|| invalid(format!("map keys must be strings, got {}", pair[0].kind())))?;
        out.insert(key.to_string(), pair[1].clone());
    }
    Ok(Value::from_serialize(&out))
}

/// Return `m` with `key` defaulted to `value`.
///
/// Keys already present in `m` win. An empty `key` or a null `value`
/// returns `m` unchanged.
pub fn with_default(args: Rest<Value>) -> Result<Value, Error> {
    expect_arity("withDefault", &args, 3)?;
    let (input, key, value) = (&args[0], &args[1], &args[2]);

    let key = key
        .as_str()
        .ok_or_else(|| invalid(format!("withDefault key must be a string, got {}", key.kind())))?;
    if key.is_empty() || is_null(value) {
        return Ok(input.clone());
    }

    let mut out = BTreeMap::new();
    out.insert(Value::from(key), value.clone());
    match input.kind() {
        ValueKind::Map => {
            for k in input.try_iter()? {
                let v = input.get_item(&k)?;
                out.insert(k, v);
            }
        }
        ValueKind::None | ValueKind::Undefined => {}
        other => {
            return Err(invalid(format!(
                "withDefault expects a mapping, got {other}"
            )));
        }
    }
    Ok(Value::from_serialize(&out))
}

/// Convert markdown to HTML.
///
/// Raw HTML in the input is passed through.
pub fn md2html(args: Rest<Value>) -> Result<Value, Error> {
    let text = single_string("md2html", &args)?;
    let mut options = comrak::Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.footnotes = true;
    options.extension.tasklist = true;
    options.render.r#unsafe = true;
    Ok(Value::from_safe_string(comrak::markdown_to_html(
        &text, &options,
    )))
}

// The engine escapes for HTML only, so every trusted context maps onto its
// single safe-string marker.

/// Trust a string as an HTML attribute.
pub fn safe_attr(args: Rest<Value>) -> Result<Value, Error> {
    single_string("safeattr", &args).map(Value::from_safe_string)
}

/// Trust a string as HTML content.
pub fn safe_html(args: Rest<Value>) -> Result<Value, Error> {
    single_string("safehtml", &args).map(Value::from_safe_string)
}

/// Trust a string as script content.
pub fn safe_js(args: Rest<Value>) -> Result<Value, Error> {
    single_string("safejs", &args).map(Value::from_safe_string)
}

/// Trust a string as style content.
pub fn safe_css(args: Rest<Value>) -> Result<Value, Error> {
    single_string("safecss", &args).map(Value::from_safe_string)
}

/// Trust a string as a URL.
pub fn safe_url(args: Rest<Value>) -> Result<Value, Error> {
    single_string("safeurl", &args).map(Value::from_safe_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::AutoEscape;
    use pretty_assertions::assert_eq;

    fn call(helper: HelperFn, args: Vec<Value>) -> Result<Value, Error> {
        helper(Rest(args))
    }

    fn get(map: &Value, key: &str) -> Value {
        map.get_item(&Value::from(key)).unwrap()
    }

    fn render(source: &str) -> Result<String, Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        HelperRegistry::default().install(&mut env);
        env.render_str(source, ())
    }

    #[test]
    fn test_default_registry_names() {
        let registry = HelperRegistry::default();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "map",
                "md2html",
                "safeattr",
                "safecss",
                "safehtml",
                "safejs",
                "safeurl",
                "withDefault"
            ]
        );
    }

    #[test]
    fn test_registry_insert_and_remove() {
        fn shout(args: Rest<Value>) -> Result<Value, Error> {
            single_string("shout", &args).map(|s| Value::from(s.to_uppercase()))
        }

        let mut registry = HelperRegistry::empty();
        registry.insert("shout", shout);
        assert!(registry.get("shout").is_some());
        assert!(registry.get("map").is_none());
        assert!(registry.remove("shout").is_some());
        assert_eq!(registry.names().count(), 0);
    }

    #[test]
    fn test_map_pairs() {
        let m = call(
            map,
            vec![Value::from("a"), Value::from(1), Value::from("b"), Value::from(2)],
        )
        .unwrap();
        assert_eq!(m.len(), Some(2));
        assert_eq!(get(&m, "a"), Value::from(1));
        assert_eq!(get(&m, "b"), Value::from(2));
    }

    #[test]
    fn test_map_empty() {
        let m = call(map, vec![]).unwrap();
        assert_eq!(m.kind(), ValueKind::Map);
        assert_eq!(m.len(), Some(0));
    }

    #[test]
    fn test_map_odd_arguments() {
        let err = call(map, vec![Value::from("a"), Value::from(1), Value::from("b")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_map_non_string_key() {
        assert!(call(map, vec![Value::from(1), Value::from(2)]).is_err());
    }

    #[test]
    fn test_with_default_adds_missing_key() {
        let empty = call(map, vec![]).unwrap();
        let m = call(with_default, vec![empty, Value::from("x"), Value::from(5)]).unwrap();
        assert_eq!(m.len(), Some(1));
        assert_eq!(get(&m, "x"), Value::from(5));
    }

    #[test]
    fn test_with_default_existing_value_wins() {
        let input = call(map, vec![Value::from("x"), Value::from(1)]).unwrap();
        let m = call(with_default, vec![input, Value::from("x"), Value::from(5)]).unwrap();
        assert_eq!(get(&m, "x"), Value::from(1));
    }

    #[test]
    fn test_with_default_empty_key_is_noop() {
        let input = call(map, vec![Value::from("x"), Value::from(1)]).unwrap();
        let m = call(
            with_default,
            vec![input.clone(), Value::from(""), Value::from(5)],
        )
        .unwrap();
        assert_eq!(m, input);
    }

    #[test]
    fn test_with_default_null_value_is_noop() {
        let input = call(map, vec![Value::from("x"), Value::from(1)]).unwrap();
        let m = call(
            with_default,
            vec![input.clone(), Value::from("y"), Value::from(())],
        )
        .unwrap();
        assert_eq!(m, input);
    }

    #[test]
    fn test_with_default_on_none() {
        let m = call(
            with_default,
            vec![Value::from(()), Value::from("x"), Value::from(5)],
        )
        .unwrap();
        assert_eq!(get(&m, "x"), Value::from(5));
    }

    #[test]
    fn test_with_default_rejects_non_mapping() {
        assert!(call(with_default, vec![Value::from(3), Value::from("x"), Value::from(5)]).is_err());
        assert!(call(with_default, vec![Value::from("x")]).is_err());
    }

    #[test]
    fn test_md2html() {
        let html = call(md2html, vec![Value::from("# Title\n\nSome *text*.")]).unwrap();
        assert_eq!(
            html.as_str().unwrap(),
            "<h1>Title</h1>\n<p>Some <em>text</em>.</p>\n"
        );
        assert!(html.is_safe());
    }

    #[test]
    fn test_md2html_keeps_raw_html() {
        let html = call(
            md2html,
            vec![Value::from("a <span class=x>b</span>\n\n<div>c</div>")],
        )
        .unwrap();
        let html = html.as_str().unwrap();
        assert!(html.contains("<span class=x>b</span>"), "{html}");
        assert!(html.contains("<div>c</div>"), "{html}");
        assert!(!html.contains("raw HTML omitted"));
    }

    #[test]
    fn test_md2html_extensions() {
        let html = call(md2html, vec![Value::from("- [x] done\n- [ ] todo\n")]).unwrap();
        assert!(html.as_str().unwrap().contains(r#"type="checkbox""#));

        let html = call(md2html, vec![Value::from("Text[^1].\n\n[^1]: Note.\n")]).unwrap();
        assert!(html.as_str().unwrap().contains("footnote"));
    }

    #[test]
    fn test_md2html_requires_string() {
        assert!(call(md2html, vec![Value::from(1)]).is_err());
        assert!(call(md2html, vec![]).is_err());
    }

    #[test]
    fn test_safe_markers_bypass_escaping() {
        let out = render(r#"{{ "<b>" }}|{{ safehtml("<b>") }}|{{ safeurl("a?b=1&c=2") }}"#).unwrap();
        assert_eq!(out, "&lt;b&gt;|<b>|a?b=1&c=2");
    }

    #[test]
    fn test_all_safe_helpers_accept_strings_only() {
        for helper in [safe_attr, safe_html, safe_js, safe_css, safe_url] {
            assert!(call(helper, vec![Value::from("x")]).unwrap().is_safe());
            assert!(call(helper, vec![Value::from(1)]).is_err());
        }
    }

    #[test]
    fn test_helpers_from_templates() {
        let out = render(
            r#"{% set m = withDefault(map("a", 1), "b", 2) %}{{ m.a }}-{{ m.b }}|{{ md2html("**x**") }}"#,
        )
        .unwrap();
        assert_eq!(out, "1-2|<p><strong>x</strong></p>\n");
    }
}
