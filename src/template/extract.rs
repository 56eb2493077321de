use std::collections::BTreeSet;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Extract placeholder names referenced in template strings.
///
/// Each string is scanned left to right for `{{ name }}` pairs. The name is the
/// trimmed text between the delimiters; empty names are skipped. An opening
/// `{{` without a later `}}` ends the scan of that string. Returns a sorted,
/// deduplicated list of names across all inputs.
pub fn extract_variables(texts: &[&str]) -> Vec<String> {
    let mut names = BTreeSet::new();

    for s in texts {
        let mut pos = 0;
        while let Some(open) = s[pos..].find(OPEN) {
            let start = pos + open;
            let Some(close) = s[start..].find(CLOSE) else {
                break;
            };
            let end = start + close;
            let name = s[start + OPEN.len()..end].trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
            pos = end + CLOSE.len();
        }
    }

    names.into_iter().collect()
}
