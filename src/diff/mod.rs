//! Unified diff between an original file and its proposed rewrite

pub mod myers;

use myers::{diff_lines, DiffOp};

/// Unchanged lines shown around each change
pub const CONTEXT_LINES: usize = 3;

/// Render a unified diff of two whole-file texts.
///
/// Output starts with `--- {old_label}` / `+++ {new_label}`, lines are joined
/// by `\n` without a trailing newline, and identical inputs give an empty
/// string.
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str) -> String {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();
    let ops = diff_lines(&a, &b);

    let hunks = group_hunks(&ops, CONTEXT_LINES);
    if hunks.is_empty() {
        return String::new();
    }

    let mut out = vec![format!("--- {}", old_label), format!("+++ {}", new_label)];
    for hunk in hunks {
        let slice = &ops[hunk.start..hunk.end];
        let (a_start, b_start) = first_positions(&ops, hunk.start);
        let a_len = slice
            .iter()
            .filter(|op| !matches!(op, DiffOp::Insert { .. }))
            .count();
        let b_len = slice
            .iter()
            .filter(|op| !matches!(op, DiffOp::Delete { .. }))
            .count();

        out.push(format!(
            "@@ -{} +{} @@",
            format_range(a_start, a_len),
            format_range(b_start, b_len)
        ));
        for op in slice {
            out.push(match *op {
                DiffOp::Equal { a: i, .. } => format!(" {}", a[i]),
                DiffOp::Delete { a: i } => format!("-{}", a[i]),
                DiffOp::Insert { b: j } => format!("+{}", b[j]),
            });
        }
    }

    out.join("\n")
}

/// Half-open range of indices into the edit script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hunk {
    start: usize,
    end: usize,
}

// Changes separated by at most 2 * context unchanged lines share a hunk
fn group_hunks(ops: &[DiffOp], context: usize) -> Vec<Hunk> {
    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| !matches!(op, DiffOp::Equal { .. }))
        .map(|(i, _)| i)
        .collect();

    let mut hunks: Vec<Hunk> = Vec::new();
    let mut last_change = 0usize;
    for &i in &changes {
        match hunks.last_mut() {
            Some(hunk) if i - last_change - 1 <= 2 * context => {
                hunk.end = (i + context + 1).min(ops.len());
            }
            _ => hunks.push(Hunk {
                start: i.saturating_sub(context),
                end: (i + context + 1).min(ops.len()),
            }),
        }
        last_change = i;
    }
    hunks
}

// Old/new line offsets reached just before `index`
fn first_positions(ops: &[DiffOp], index: usize) -> (usize, usize) {
    match ops.get(index) {
        Some(DiffOp::Equal { a, b }) => (*a, *b),
        _ => ops[..index].iter().fold((0, 0), |(a, b), op| match op {
            DiffOp::Equal { .. } => (a + 1, b + 1),
            DiffOp::Delete { .. } => (a + 1, b),
            DiffOp::Insert { .. } => (a, b + 1),
        }),
    }
}

// 1-based start; a single line prints just the start, an empty range points
// at the line before it
fn format_range(start: usize, len: usize) -> String {
    match len {
        1 => format!("{}", start + 1),
        0 => format!("{},0", start),
        _ => format!("{},{}", start + 1, len),
    }
}
