//! `Key: value` preamble parsing.

use mipsync_core::Preamble;

/// Parse a preamble block.
///
/// Reads `Key: value` lines until the first blank line that follows at
/// least one recognised key. Unknown keys and lines without a colon are
/// skipped. Never fails: empty input yields [`Preamble::default`].
pub fn parse_preamble(text: &str) -> Preamble {
    let mut preamble = Preamble::default();
    let mut seen = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if seen {
                break;
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if apply(&mut preamble, &normalise_key(key), value.trim()) {
            seen = true;
        }
    }

    preamble
}

/// Store `value` under `key`; returns whether the key is recognised.
fn apply(preamble: &mut Preamble, key: &str, value: &str) -> bool {
    match key {
        "mip#" | "mip" => preamble.mip = value.parse().ok(),
        "title" => preamble.preamble_title = non_empty(value),
        "author(s)" | "author" | "authors" => preamble.author = non_empty_list(split_people(value)),
        "contributors" | "contributor(s)" => {
            preamble.contributors = non_empty_list(split_people(value))
        }
        "type" | "types" => preamble.types = non_empty(value),
        "status" => preamble.status = non_empty(value),
        "date proposed" => preamble.date_proposed = non_empty(value),
        "date ratified" => preamble.date_ratified = non_empty(value),
        "dependencies" | "dependency" => {
            preamble.dependencies = Some(
                non_empty_list(split_list(value)).unwrap_or_else(|| vec!["n/a".to_string()]),
            )
        }
        "replaces" => preamble.replaces = non_empty(value),
        "forum url" => preamble.forum_url = non_empty(value),
        "ratification poll url" => preamble.ratification_poll_url = non_empty(value),
        "tags" => preamble.tags = non_empty_list(split_list(value)),
        _ => return false,
    }
    true
}

/// `"  Date   Proposed "` → `"date proposed"`; a leading `- ` or `*` list
/// marker is dropped.
fn normalise_key(key: &str) -> String {
    let key = key.trim().trim_start_matches(['-', '*', ' ']).trim_end_matches('*');
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma list where the last separator may be `and`.
///
/// `and` only separates inside the final segment of a list that already has
/// a comma, so a single name such as `Maker and Co Foundation` stays whole.
fn split_people(value: &str) -> Vec<String> {
    let mut parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() > 1 {
        if let Some(last) = parts.pop() {
            let last = last.strip_prefix("and ").unwrap_or(last);
            match last.rsplit_once(" and ") {
                Some((head, tail)) => parts.extend([head, tail]),
                None => parts.push(last),
            }
        }
    }
    parts
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn non_empty_list(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}
