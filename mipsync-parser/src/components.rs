//! Component Summary isolation and splitting.

use std::sync::OnceLock;

use regex::Regex;

use mipsync_core::Component;

/// A line introducing a component: `**MIP0c1: Title**`, `- MIP0c1: Title`,
/// a sub-heading `### MIP0c1: Title`, or a bare `MIP0c1: Title` line.
fn component_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*((?:[-*+][ \t]+)?(?:\*\*|#{1,6}[ \t]+(?:\*\*)?)?)(MIP\d+c\d+)([^\n]*)",
        )
        .expect("component header pattern")
    })
}

fn summary_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mi)^[ \t]{0,3}(#{1,6})[ \t]+component summary[ \t#]*\r?$")
            .expect("summary heading pattern")
    })
}

fn any_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]{0,3}(#{1,6})(?:[ \t]|\r?$)").expect("heading pattern"))
}

/// One matched component header, offsets relative to the searched text.
struct Header<'t> {
    start: usize,
    end: usize,
    label: &'t str,
    rest: &'t str,
}

/// Component headers in `text`. A label with no list, bold or heading
/// marker only counts when a `:` follows it.
fn headers(text: &str) -> impl Iterator<Item = Header<'_>> {
    component_header().captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let marked = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let rest = caps.get(3)?.as_str();
        if !marked && !rest.trim_start().starts_with(':') {
            return None;
        }
        Some(Header {
            start: whole.start(),
            end: whole.end(),
            label: caps.get(2)?.as_str(),
            rest,
        })
    })
}

/// The component summary of `text`.
///
/// With a "Component Summary" heading, the section is bounded by the next
/// heading at or above that heading's level (or the end of `text`), and
/// starts at the first component header inside that range. Without one,
/// it starts at the first component header and ends before the next
/// heading. Headings that are themselves component headers never close
/// the section. Returns `""` when no component header is found.
pub fn components_section(text: &str) -> &str {
    match summary_heading().captures(text) {
        Some(caps) => {
            let from = caps.get(0).map_or(0, |m| m.end());
            let depth = caps.get(1).map_or(0, |m| m.as_str().len());
            let close = closing_heading(text, from, Some(depth)).unwrap_or(text.len());
            let Some(first) = headers(&text[from..close]).next() else {
                return "";
            };
            &text[line_start(text, from + first.start)..close]
        }
        None => {
            let Some(first) = headers(text).next() else {
                return "";
            };
            let start = line_start(text, first.start);
            let end = closing_heading(text, start, None).unwrap_or(text.len());
            &text[start..end]
        }
    }
}

/// Offset of the first heading after `from` that closes a section opened
/// at `level` (any heading when `level` is `None`).
fn closing_heading(text: &str, from: usize, level: Option<usize>) -> Option<usize> {
    any_heading()
        .captures_iter(&text[from..])
        .filter_map(|caps| {
            let at = from + caps.get(0)?.start();
            let depth = caps.get(1)?.as_str().len();
            let closes = level.map_or(true, |l| depth <= l);
            (at > from && closes && !is_component_line(text, at)).then_some(at)
        })
        .next()
}

/// Split a component summary into one [`Component`] per header.
///
/// Text before the first header is ignored; each body runs until the next
/// header and is trimmed.
pub fn split_components(section: &str) -> Vec<Component> {
    let found: Vec<Header<'_>> = headers(section).collect();

    found
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let body_end = found.get(idx + 1).map_or(section.len(), |next| next.start);
            Component {
                c_name: header.label.to_string(),
                c_title: clean_title(header.rest),
                c_body: section[header.end..body_end].trim().to_string(),
            }
        })
        .collect()
}

/// `": Core Principles**"` → `"Core Principles"`.
fn clean_title(rest: &str) -> String {
    let rest = rest.trim();
    let rest = rest.strip_prefix("**").unwrap_or(rest).trim_start();
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    rest.trim().trim_end_matches('*').trim().to_string()
}

fn line_start(text: &str, at: usize) -> usize {
    text[..at].rfind('\n').map_or(0, |i| i + 1)
}

fn is_component_line(text: &str, at: usize) -> bool {
    let line_end = text[at..].find('\n').map_or(text.len(), |i| at + i);
    headers(&text[at..line_end]).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_variants() {
        assert_eq!(clean_title(": Core Principles**"), "Core Principles");
        assert_eq!(clean_title("**: Core Principles"), "Core Principles");
        assert_eq!(clean_title(""), "");
    }

    #[test]
    fn section_without_marker_is_empty() {
        assert_eq!(components_section("test"), "");
        assert_eq!(components_section("## Component Summary\n\nnothing here\n"), "");
    }

    #[test]
    fn section_without_end_runs_to_end_of_text() {
        let data = "**MIP0c1: Core Principles\n\nsomething";
        assert_eq!(components_section(data), data);
    }

    #[test]
    fn sub_heading_components_do_not_close_section() {
        let text = "## Component Summary\n\n### MIP1c1: A\n\nbody a\n\n### MIP1c2: B\n\nbody b\n\n## Motivation\n\nwhy\n";
        assert_eq!(
            components_section(text),
            "### MIP1c1: A\n\nbody a\n\n### MIP1c2: B\n\nbody b\n\n"
        );
    }

    #[test]
    fn split_bold_components() {
        let section = "**MIP0c1: Core Principles**\nThe principles.\n\n**MIP0c2: MIP Types**\nTypes.\n";
        let components = split_components(section);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].c_name, "MIP0c1");
        assert_eq!(components[0].c_title, "Core Principles");
        assert_eq!(components[0].c_body, "The principles.");
        assert_eq!(components[1].c_name, "MIP0c2");
        assert_eq!(components[1].c_body, "Types.");
    }

    #[test]
    fn split_list_item_components() {
        let section = "- **MIP3c1: Definitions**\n  Terms.\n- **MIP3c2: Process**\n  Steps.\n";
        let names: Vec<String> = split_components(section)
            .into_iter()
            .map(|c| c.c_name)
            .collect();
        assert_eq!(names, vec!["MIP3c1", "MIP3c2"]);
    }

    #[test]
    fn split_plain_label_lines() {
        let components = split_components("MIP9c1: Alpha\n- MIP9c2: Beta\n  beta body\n");
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].c_title, "Alpha");
        assert_eq!(components[0].c_body, "");
        assert_eq!(components[1].c_name, "MIP9c2");
        assert_eq!(components[1].c_body, "beta body");
    }

    #[test]
    fn bare_label_without_colon_is_not_a_header() {
        assert!(split_components("MIP9c1 is mentioned in passing.\n").is_empty());
    }

    #[test]
    fn split_ignores_preface() {
        let section = "Intro text.\n\n**MIP2c1: Only**\nbody";
        let components = split_components(section);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].c_body, "body");
    }
}
