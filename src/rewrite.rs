//! Text edits driven by canvas gestures. The schema is always re-parsed
//! from the rewritten text afterwards.

use crate::ast::Relationship;
use crate::parser::table_blocks;
use crate::serializer::serialize_relationship;
use regex::Regex;

/// Remove every `Table <name> { ... }` block and every `Ref:` line that
/// mentions `name` as a whole word, then squeeze runs of blank lines.
pub fn remove_table(text: &str, name: &str) -> String {
    let mut output = text.to_string();
    let spans: Vec<_> = table_blocks(text)
        .into_iter()
        .filter(|block| block.name == name)
        .map(|block| block.span)
        .collect();
    for span in spans.into_iter().rev() {
        output.replace_range(span, "");
    }

    match ref_line_pattern(name) {
        Some(ref_line) => {
            output = output
                .split_inclusive('\n')
                .filter(|line| !ref_line.is_match(line))
                .collect();
        }
        None => tracing::warn!(table = name, "cannot match table name, Ref lines kept"),
    }

    collapse_blank_lines(&output)
}

/// Append a `Ref:` line for `rel`, starting it on a fresh line.
pub fn append_ref(text: &str, rel: &Relationship) -> String {
    let mut output = text.to_string();
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    serialize_relationship(&mut output, rel);
    output
}

/// A `Ref:` line (keyword in any case) naming `name` as a whole word.
fn ref_line_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"^\s*(?i:ref)\s*:.*\b{}\b", regex::escape(name))).ok()
}

/// Replace every run of three or more newlines with two.
fn collapse_blank_lines(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        output.push(c);
    }
    output
}
