// crates/folio-core/src/include/tokens.rs
// {{token}} substitution for fragment text

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z][A-Za-z0-9_-]*)\s*\}\}").expect("token pattern is valid")
    })
}

/// Replace every occurrence of each known `{{name}}` with its HTML-escaped
/// value. Unknown names are left as written.
pub fn substitute_tokens(text: &str, values: &BTreeMap<String, String>) -> String {
    if values.is_empty() {
        return text.to_string();
    }

    token_re()
        .replace_all(text, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => escape_html(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn replaces_every_occurrence() {
        let text = "<h1>{{title}}</h1><title>{{title}}</title><meta content=\"{{title}}\">";
        let out = substitute_tokens(text, &values(&[("title", "Case Studies")]));
        assert_eq!(out.matches("Case Studies").count(), 3);
        assert!(!out.contains("{{title}}"));
    }

    #[test]
    fn tolerates_inner_whitespace() {
        let out = substitute_tokens("<p>{{ subtitle }}</p>", &values(&[("subtitle", "Work")]));
        assert_eq!(out, "<p>Work</p>");
    }

    #[test]
    fn leaves_unknown_tokens() {
        let out = substitute_tokens("{{title}} {{author}}", &values(&[("title", "A")]));
        assert_eq!(out, "A {{author}}");
    }

    #[test]
    fn escapes_values() {
        let out = substitute_tokens("{{title}}", &values(&[("title", "<b>R&D</b>")]));
        assert_eq!(out, "&lt;b&gt;R&amp;D&lt;/b&gt;");
    }

    #[test]
    fn empty_value_removes_token() {
        let out = substitute_tokens("<p>{{subtitle}}</p>", &values(&[("subtitle", "")]));
        assert_eq!(out, "<p></p>");
    }
}
