use std::collections::BTreeMap;

use regex::{Captures, Regex, RegexBuilder};

use super::types::Template;

/// Subject and body of a template after substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body: String,
}

/// Compiled-size budget for the combined placeholder pattern, matching the
/// `regex` crate default.
const PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Substitute `values` into the template's subject and body.
///
/// `{{key}}`, `{{ key }}` and any other interior whitespace all match `key`;
/// keys are matched literally and case-sensitively. Values are inserted
/// verbatim and are not scanned again, so a value containing `{{other}}` is
/// left as is. Placeholders without a value stay in the output unchanged.
pub fn render_template(template: &Template, values: &BTreeMap<String, String>) -> RenderedTemplate {
    render_with_limit(template, values, PATTERN_SIZE_LIMIT)
}

fn render_with_limit(
    template: &Template,
    values: &BTreeMap<String, String>,
    size_limit: usize,
) -> RenderedTemplate {
    let Some(matcher) = Matcher::build(values, size_limit) else {
        return RenderedTemplate {
            subject: template.subject.clone(),
            body: template.body.clone(),
        };
    };

    RenderedTemplate {
        subject: matcher.replace(&template.subject, values),
        body: matcher.replace(&template.body, values),
    }
}

enum Matcher<'v> {
    /// One alternation over every key, capturing the matched key.
    Combined(Regex),
    /// One pattern per key, used when the alternation is too large to compile.
    PerKey(Vec<(Regex, &'v str)>),
}

impl<'v> Matcher<'v> {
    fn build(values: &'v BTreeMap<String, String>, size_limit: usize) -> Option<Self> {
        let keys: Vec<&String> = values.keys().filter(|k| !k.is_empty()).collect();
        if keys.is_empty() {
            return None;
        }

        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        match RegexBuilder::new(&placeholder_pattern(&alternation))
            .size_limit(size_limit)
            .build()
        {
            Ok(re) => return Some(Self::Combined(re)),
            Err(e) => {
                tracing::warn!(error = %e, keys = keys.len(), "combined placeholder pattern rejected, matching keys one by one");
            }
        }

        let mut patterns = Vec::with_capacity(keys.len());
        for key in keys {
            match Regex::new(&placeholder_pattern(&regex::escape(key))) {
                Ok(re) => patterns.push((re, values[key].as_str())),
                Err(e) => tracing::warn!(error = %e, key = %key, "placeholder pattern rejected"),
            }
        }
        if patterns.is_empty() {
            None
        } else {
            Some(Self::PerKey(patterns))
        }
    }

    fn replace(&self, text: &str, values: &BTreeMap<String, String>) -> String {
        match self {
            Self::Combined(re) => re
                .replace_all(text, |caps: &Captures<'_>| {
                    values.get(&caps[1]).cloned().unwrap_or_default()
                })
                .into_owned(),
            Self::PerKey(patterns) => {
                // Single left-to-right pass taking the earliest placeholder each
                // step, so inserted values are never matched again.
                let mut out = String::with_capacity(text.len());
                let mut pos = 0;
                while let Some((m, value)) = patterns
                    .iter()
                    .filter_map(|(re, value)| re.find_at(text, pos).map(|m| (m, *value)))
                    .min_by_key(|(m, _)| m.start())
                {
                    out.push_str(&text[pos..m.start()]);
                    out.push_str(value);
                    pos = m.end();
                }
                out.push_str(&text[pos..]);
                out
            }
        }
    }
}

fn placeholder_pattern(keys: &str) -> String {
    format!(r"\{{\{{\s*({keys})\s*\}}\}}")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::template::TemplateDraft;

    fn template(subject: &str, body: &str) -> Template {
        Template::create(
            "t".to_string(),
            TemplateDraft {
                name: "t".to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
                ..TemplateDraft::default()
            },
            Utc::now(),
        )
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_replacement() {
        let t = template("Hello {{name}}", "Welcome {{name}}!");
        let r = render_template(&t, &values(&[("name", "John")]));
        assert_eq!(r.subject, "Hello John");
        assert_eq!(r.body, "Welcome John!");
    }

    #[test]
    fn test_spacing_inside_braces() {
        let t = template("Hi {{name}}", "Welcome {{ name }}! and {{  name  }}");
        let r = render_template(&t, &values(&[("name", "John")]));
        assert_eq!(r.subject, "Hi John");
        assert_eq!(r.body, "Welcome John! and John");
    }

    #[test]
    fn test_mixed_keys() {
        let t = template(
            "Hi {{name}} and {{ company }}",
            "Welcome {{name}} to {{  company  }}!",
        );
        let r = render_template(&t, &values(&[("name", "John"), ("company", "Acme Corp")]));
        assert_eq!(r.subject, "Hi John and Acme Corp");
        assert_eq!(r.body, "Welcome John to Acme Corp!");
    }

    #[test]
    fn test_unresolved_left_literal() {
        let t = template("{{greeting}} {{name}}", "{{ unset }}");
        let r = render_template(&t, &values(&[("name", "Ann")]));
        assert_eq!(r.subject, "{{greeting}} Ann");
        assert_eq!(r.body, "{{ unset }}");
    }

    #[test]
    fn test_empty_map_returns_input() {
        let t = template("Hello World", "Welcome {{x}}!");
        let r = render_template(&t, &BTreeMap::new());
        assert_eq!(r.subject, "Hello World");
        assert_eq!(r.body, "Welcome {{x}}!");
    }

    #[test]
    fn test_key_special_characters_matched_literally() {
        let t = template("{{a.b}} {{a+b}} {{axb}}", "{{(x)}}");
        let r = render_template(&t, &values(&[("a.b", "dot"), ("a+b", "plus"), ("(x)", "paren")]));
        assert_eq!(r.subject, "dot plus {{axb}}");
        assert_eq!(r.body, "paren");
    }

    #[test]
    fn test_value_inserted_verbatim() {
        let t = template("{{v}}", "{{v}}");
        let r = render_template(&t, &values(&[("v", "$1 <b>&amp;</b> ${name}")]));
        assert_eq!(r.subject, "$1 <b>&amp;</b> ${name}");
        assert_eq!(r.body, "$1 <b>&amp;</b> ${name}");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let t = template("{{a}}", "{{b}}");
        let r = render_template(&t, &values(&[("a", "{{b}}"), ("b", "B")]));
        assert_eq!(r.subject, "{{b}}");
        assert_eq!(r.body, "B");
    }

    #[test]
    fn test_case_sensitive() {
        let t = template("{{Name}}", "{{name}}");
        let r = render_template(&t, &values(&[("name", "x")]));
        assert_eq!(r.subject, "{{Name}}");
        assert_eq!(r.body, "x");
    }

    #[test]
    fn test_prefix_keys_do_not_collide() {
        let t = template("{{a}} {{a b}} {{ab}}", "");
        let r = render_template(&t, &values(&[("a", "1"), ("a b", "2"), ("ab", "3")]));
        assert_eq!(r.subject, "1 2 3");
    }

    #[test]
    fn test_empty_key_ignored() {
        let t = template("{{}} {{x}}", "");
        let r = render_template(&t, &values(&[("", "E"), ("x", "X")]));
        assert_eq!(r.subject, "{{}} X");
    }

    #[test]
    fn test_oversized_pattern_still_substitutes_every_key() {
        let t = template("{{ a }} and {{b}}", "{{a}}{{b}} {{c}} {{}}");
        let vals = values(&[("a", "{{b}}"), ("b", "$2"), ("", "E")]);
        let r = render_with_limit(&t, &vals, 1);
        assert_eq!(r.subject, "{{b}} and $2");
        assert_eq!(r.body, "{{b}}$2 {{c}} {{}}");
        assert_eq!(r, render_template(&t, &vals));
    }

    #[test]
    fn test_pure_across_calls() {
        let t = template("Hi {{name}}", "Bye {{name}}");
        let first = render_template(&t, &values(&[("name", "A")]));
        let second = render_template(&t, &values(&[("name", "B")]));
        let again = render_template(&t, &values(&[("name", "A")]));
        assert_eq!(first, again);
        assert_eq!(second.subject, "Hi B");
        assert_eq!(t.subject, "Hi {{name}}");
    }
}
