//! Block-level markdown lexer.
//!
//! Produces a flat, ordered sequence of [`Node`]s. Lexing is lossless: the
//! concatenation of every node's `raw` equals the input. Inline markup is
//! left untouched inside `text`.

/// Block type of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// ATX (`## x`) or setext heading; `depth` is 1..=6.
    Heading { depth: u8 },
    Paragraph,
    List,
    /// Fenced or indented code; `text` holds the inner lines.
    Code,
    Blockquote,
    Table,
    Hr,
    Html,
    /// One or more blank lines.
    Space,
}

/// One block of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Source text of the block, line endings included.
    pub raw: String,
    /// Block content without markup delimiters.
    pub text: String,
}

impl Node {
    fn new(kind: NodeKind, raw: String, text: String) -> Self {
        Self { kind, raw, text }
    }

    pub fn heading_depth(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Heading { depth } => Some(depth),
            _ => None,
        }
    }

    pub fn is_space(&self) -> bool {
        self.kind == NodeKind::Space
    }
}

/// Tokenizes markdown into block nodes.
pub trait Lexer: Send + Sync {
    fn lex(&self, input: &str) -> Vec<Node>;
}

/// Line-oriented lexer covering the block constructs proposal documents use.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLexer;

impl Lexer for BlockLexer {
    fn lex(&self, input: &str) -> Vec<Node> {
        let lines: Vec<&str> = input.split_inclusive('\n').collect();
        let mut nodes = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = content(lines[i]);
            let (node, next) = if is_blank(line) {
                lex_space(&lines, i)
            } else if let Some(fence) = fence_open(line) {
                lex_fence(&lines, i, fence)
            } else if let Some((depth, text)) = atx_heading(line) {
                (
                    Node::new(NodeKind::Heading { depth }, lines[i].to_string(), text),
                    i + 1,
                )
            } else if is_hr(line) {
                (Node::new(NodeKind::Hr, lines[i].to_string(), String::new()), i + 1)
            } else if is_blockquote(line) {
                lex_blockquote(&lines, i)
            } else if list_marker(line).is_some() {
                lex_list(&lines, i)
            } else if is_table_row(line) {
                lex_while(&lines, i, NodeKind::Table, |l| is_table_row(content(l)))
            } else if is_html(line) {
                lex_while(&lines, i, NodeKind::Html, |l| !is_blank(content(l)))
            } else if indent_width(line) >= 4 {
                lex_indented_code(&lines, i)
            } else {
                lex_paragraph(&lines, i)
            };
            nodes.push(node);
            i = next;
        }
        nodes
    }
}

// ---------------------------------------------------------------------------
// Block scanners
// ---------------------------------------------------------------------------

fn lex_space(lines: &[&str], start: usize) -> (Node, usize) {
    let end = scan(lines, start, |l| is_blank(content(l)));
    (
        Node::new(NodeKind::Space, lines[start..end].concat(), String::new()),
        end,
    )
}

fn lex_while(
    lines: &[&str],
    start: usize,
    kind: NodeKind,
    keep: impl Fn(&str) -> bool,
) -> (Node, usize) {
    let end = scan(lines, start + 1, keep);
    let raw = lines[start..end].concat();
    let text = raw.trim_end().to_string();
    (Node::new(kind, raw, text), end)
}

fn lex_fence(lines: &[&str], start: usize, fence: (char, usize)) -> (Node, usize) {
    let (ch, len) = fence;
    let mut end = start + 1;
    let mut closed = false;
    while end < lines.len() {
        let trimmed = content(lines[end]).trim_start();
        let run = trimmed.chars().take_while(|c| *c == ch).count();
        end += 1;
        if run >= len && trimmed[run * ch.len_utf8()..].trim().is_empty() {
            closed = true;
            break;
        }
    }
    let inner_end = if closed { end - 1 } else { end };
    let text = lines[start + 1..inner_end]
        .iter()
        .map(|l| content(l))
        .collect::<Vec<_>>()
        .join("\n");
    (Node::new(NodeKind::Code, lines[start..end].concat(), text), end)
}

fn lex_blockquote(lines: &[&str], start: usize) -> (Node, usize) {
    let end = scan(lines, start + 1, |l| {
        let line = content(l);
        !is_blank(line) && (is_blockquote(line) || !starts_block(line))
    });
    let raw = lines[start..end].concat();
    let text = lines[start..end]
        .iter()
        .map(|l| {
            let line = content(l).trim_start();
            let line = line.strip_prefix('>').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n");
    (Node::new(NodeKind::Blockquote, raw, text), end)
}

fn lex_list(lines: &[&str], start: usize) -> (Node, usize) {
    let mut end = start + 1;
    while end < lines.len() {
        let line = content(lines[end]);
        if is_blank(line) {
            // A blank line continues the list only if the next block is part of it.
            let after = scan(lines, end, |l| is_blank(content(l)));
            match lines.get(after).map(|l| content(l)) {
                Some(next) if list_marker(next).is_some() || indent_width(next) >= 2 => {
                    end = after;
                }
                _ => break,
            }
        } else if list_marker(line).is_some() || indent_width(line) >= 2 || !starts_block(line) {
            end += 1;
        } else {
            break;
        }
    }
    let raw = lines[start..end].concat();
    let text = raw.trim_end().to_string();
    (Node::new(NodeKind::List, raw, text), end)
}

fn lex_indented_code(lines: &[&str], start: usize) -> (Node, usize) {
    let mut end = start + 1;
    while end < lines.len() {
        let line = content(lines[end]);
        if indent_width(line) >= 4 {
            end += 1;
        } else if is_blank(line) {
            let after = scan(lines, end, |l| is_blank(content(l)));
            match lines.get(after) {
                Some(next) if indent_width(content(next)) >= 4 => end = after,
                _ => break,
            }
        } else {
            break;
        }
    }
    let text = lines[start..end]
        .iter()
        .map(|l| strip_indent(content(l), 4))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string();
    (Node::new(NodeKind::Code, lines[start..end].concat(), text), end)
}

fn lex_paragraph(lines: &[&str], start: usize) -> (Node, usize) {
    let mut end = start + 1;
    while end < lines.len() {
        let line = content(lines[end]);
        if let Some(depth) = setext_underline(line) {
            let raw = lines[start..=end].concat();
            let text = join_trimmed(&lines[start..end]);
            return (Node::new(NodeKind::Heading { depth }, raw, text), end + 1);
        }
        if is_blank(line) || starts_block(line) {
            break;
        }
        end += 1;
    }
    let raw = lines[start..end].concat();
    let text = join_trimmed(&lines[start..end]);
    (Node::new(NodeKind::Paragraph, raw, text), end)
}

// ---------------------------------------------------------------------------
// Line classifiers
// ---------------------------------------------------------------------------

/// Whether `line` opens a block that interrupts a paragraph.
fn starts_block(line: &str) -> bool {
    fence_open(line).is_some()
        || atx_heading(line).is_some()
        || is_hr(line)
        || is_blockquote(line)
        || bullet_marker(line)
}

fn atx_heading(line: &str) -> Option<(u8, String)> {
    if indent_width(line) > 3 {
        return None;
    }
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let mut text = rest.trim();
    // Optional closing sequence: `## Title ##`.
    let stripped = text.trim_end_matches('#');
    if stripped.is_empty() || stripped.ends_with([' ', '\t']) {
        text = stripped.trim_end();
    }
    Some((hashes as u8, text.to_string()))
}

fn setext_underline(line: &str) -> Option<u8> {
    if indent_width(line) > 3 {
        return None;
    }
    let trimmed = line.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c == '=') {
        Some(1)
    } else if trimmed.len() >= 2 && trimmed.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

fn fence_open(line: &str) -> Option<(char, usize)> {
    if indent_width(line) > 3 {
        return None;
    }
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = trimmed.chars().take_while(|c| *c == ch).count();
    (run >= 3).then_some((ch, run))
}

fn is_hr(line: &str) -> bool {
    if indent_width(line) > 3 {
        return false;
    }
    let chars: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    chars.len() >= 3
        && matches!(chars[0], '-' | '*' | '_')
        && chars.iter().all(|c| *c == chars[0])
}

fn is_blockquote(line: &str) -> bool {
    indent_width(line) <= 3 && line.trim_start().starts_with('>')
}

fn bullet_marker(line: &str) -> bool {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    matches!(chars.next(), Some('-' | '*' | '+')) && matches!(chars.next(), Some(' ' | '\t'))
}

/// Width of the list marker when `line` starts a list item.
fn list_marker(line: &str) -> Option<usize> {
    if bullet_marker(line) {
        return Some(2);
    }
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let rest = &trimmed[digits..];
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some('.' | ')'), Some(' ' | '\t')) | (Some('.' | ')'), None) => Some(digits + 2),
        _ => None,
    }
}

fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn is_html(line: &str) -> bool {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    chars.next() == Some('<')
        && matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!')
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First index at or after `from` whose line fails `keep`.
fn scan(lines: &[&str], from: usize, keep: impl Fn(&str) -> bool) -> usize {
    let mut i = from;
    while i < lines.len() && keep(lines[i]) {
        i += 1;
    }
    i
}

/// Line without its terminator.
fn content(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
    }
    width
}

fn strip_indent(line: &str, width: usize) -> &str {
    let mut removed = 0;
    for (idx, c) in line.char_indices() {
        if removed >= width {
            return &line[idx..];
        }
        match c {
            ' ' => removed += 1,
            '\t' => removed += 4,
            _ => return &line[idx..],
        }
    }
    ""
}

fn join_trimmed(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| content(l).trim())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<NodeKind> {
        BlockLexer.lex(input).into_iter().map(|n| n.kind).collect()
    }

    #[test]
    fn empty_input_has_no_nodes() {
        assert!(BlockLexer.lex("").is_empty());
    }

    #[test]
    fn lexing_is_lossless() {
        let input = "# Title\n\nSome *text*\nmore\n\n- a\n- b\n\n```\ncode\n```\n> quote\n\n| a | b |\n|---|---|\n\n---\ntrailing";
        let raw: String = BlockLexer.lex(input).iter().map(|n| n.raw.as_str()).collect();
        assert_eq!(raw, input);
    }

    #[test]
    fn headings_carry_depth_and_text() {
        let nodes = BlockLexer.lex("## Component Summary ##\n### MIP0c1: Core\n");
        assert_eq!(nodes[0].kind, NodeKind::Heading { depth: 2 });
        assert_eq!(nodes[0].text, "Component Summary");
        assert_eq!(nodes[1].heading_depth(), Some(3));
        assert_eq!(nodes[1].text, "MIP0c1: Core");
    }

    #[test]
    fn hash_without_space_is_paragraph() {
        assert_eq!(kinds("#hashtag\n"), vec![NodeKind::Paragraph]);
    }

    #[test]
    fn setext_heading() {
        let nodes = BlockLexer.lex("Title\n=====\n");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::Heading { depth: 1 });
        assert_eq!(nodes[0].text, "Title");
    }

    #[test]
    fn fenced_code_text_is_inner_lines() {
        let nodes = BlockLexer.lex("```\nMIP#: 0\nTitle: X\n```\n");
        assert_eq!(nodes[0].kind, NodeKind::Code);
        assert_eq!(nodes[0].text, "MIP#: 0\nTitle: X");
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let nodes = BlockLexer.lex("```\na\n# not a heading\n");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text, "a\n# not a heading");
    }

    #[test]
    fn loose_list_stays_one_node() {
        let nodes = BlockLexer.lex("- one\n\n- two\n  continued\n\nafter\n");
        assert_eq!(
            nodes.iter().map(|n| n.kind).collect::<Vec<_>>(),
            vec![NodeKind::List, NodeKind::Space, NodeKind::Paragraph]
        );
        assert_eq!(nodes[0].text, "- one\n\n- two\n  continued");
    }

    #[test]
    fn heading_interrupts_paragraph() {
        assert_eq!(
            kinds("text\n## Next\n"),
            vec![NodeKind::Paragraph, NodeKind::Heading { depth: 2 }]
        );
    }

    #[test]
    fn crlf_lines_are_classified() {
        let nodes = BlockLexer.lex("# T\r\n\r\nbody\r\n");
        assert_eq!(nodes[0].text, "T");
        assert_eq!(nodes[2].text, "body");
    }
}
