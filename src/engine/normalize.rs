use std::sync::LazyLock;

use regex::Regex;

/// One recognition rule: a title convention and the capture group that
/// holds the document name.
struct TitleRule {
    pattern: Regex,
    group: usize,
}

/// Ordered first-match-wins table. Application-specific suffixes must come
/// before the generic trailing-dash rule, otherwise titles containing
/// several dashes get over-stripped.
static TITLE_RULES: LazyLock<Vec<TitleRule>> = LazyLock::new(|| {
    [
        (r"^(.+?)(?:\.docx?)?\s+-\s+(?:Microsoft\s+)?Word$", 1),
        (r"^(.+?)(?:\.xlsx?|\.csv)?\s+-\s+(?:Microsoft\s+)?Excel$", 1),
        (r"^(.+?)(?:\.pptx?)?\s+-\s+(?:Microsoft\s+)?PowerPoint$", 1),
        (
            r"^(.+?)(?:\.pdf)?\s+-\s+Adobe(?:\s+Acrobat)?(?:\s+Reader)?(?:\s+DC)?$",
            1,
        ),
        (r"^(.+?)\s+-\s+Google\s+(?:Docs|Sheets|Slides)$", 1),
        // Generic fallback: text before a trailing " - application" suffix.
        (r"^(.+)\s+-\s+[^-]+$", 1),
    ]
    .into_iter()
    .map(|(pattern, group)| TitleRule {
        pattern: Regex::new(pattern).expect("title rules are static"),
        group,
    })
    .collect()
});

/// Reduces a raw window title to a clean document name by stripping known
/// application-suffix conventions. Unrecognized titles pass through
/// unchanged, so the function is total.
pub fn normalize(raw_label: &str) -> String {
    for rule in TITLE_RULES.iter() {
        if let Some(captures) = rule.pattern.captures(raw_label) {
            if let Some(name) = captures.get(rule.group) {
                let name = name.as_str().trim();
                if !name.is_empty() {
                    return name.to_string();
                }
            }
        }
    }
    raw_label.to_string()
}
