//! Myers shortest edit script over lines

/// Edit distance beyond which the middle section is replaced wholesale
pub const MAX_EDIT_DISTANCE: usize = 2000;

/// One step of an edit script; indices point into the old (`a`) and new (`b`)
/// line slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    Equal { a: usize, b: usize },
    Delete { a: usize },
    Insert { b: usize },
}

/// Line edit script turning `a` into `b`.
///
/// Common prefix and suffix are matched first; the remaining middle is
/// diffed with Myers' algorithm. Within each run of changes, deletions come
/// before insertions.
pub fn diff_lines(a: &[&str], b: &[&str]) -> Vec<DiffOp> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let mut ops: Vec<DiffOp> = (0..prefix).map(|i| DiffOp::Equal { a: i, b: i }).collect();

    let middle = if a_mid.is_empty() || b_mid.is_empty() {
        None
    } else {
        shortest_edit(a_mid, b_mid, MAX_EDIT_DISTANCE)
    };
    match middle {
        Some(script) => ops.extend(script.into_iter().map(|op| shift(op, prefix))),
        None => {
            ops.extend((0..a_mid.len()).map(|i| DiffOp::Delete { a: prefix + i }));
            ops.extend((0..b_mid.len()).map(|i| DiffOp::Insert { b: prefix + i }));
        }
    }

    let a_tail = a.len() - suffix;
    let b_tail = b.len() - suffix;
    ops.extend((0..suffix).map(|i| DiffOp::Equal {
        a: a_tail + i,
        b: b_tail + i,
    }));

    deletes_first(ops)
}

fn shift(op: DiffOp, by: usize) -> DiffOp {
    match op {
        DiffOp::Equal { a, b } => DiffOp::Equal { a: a + by, b: b + by },
        DiffOp::Delete { a } => DiffOp::Delete { a: a + by },
        DiffOp::Insert { b } => DiffOp::Insert { b: b + by },
    }
}

/// Greedy forward Myers search. Returns `None` when the edit distance exceeds
/// `max_d`.
///
/// `trace[d]` holds the furthest-reaching x for diagonals `-(d+1)..=(d+1)` as
/// they stood before round `d`.
fn shortest_edit(a: &[&str], b: &[&str], max_d: usize) -> Option<Vec<DiffOp>> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = (a.len() + b.len()).min(max_d) as isize;
    let offset = max + 1;

    let mut v = vec![0isize; (2 * offset + 1) as usize];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    for d in 0..=max {
        let lo = (offset - d - 1) as usize;
        let hi = (offset + d + 1) as usize;
        trace.push(v[lo..=hi].to_vec());

        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;

            if x >= n && y >= m {
                return Some(backtrack(&trace, n, m));
            }
            k += 2;
        }
    }

    None
}

fn backtrack(trace: &[Vec<isize>], n: isize, m: isize) -> Vec<DiffOp> {
    let mut ops = Vec::new();
    let mut x = n;
    let mut y = m;

    for (d, frontier) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let at = |k: isize| frontier[(k + d + 1) as usize];

        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(DiffOp::Equal {
                a: (x - 1) as usize,
                b: (y - 1) as usize,
            });
            x -= 1;
            y -= 1;
        }

        if d > 0 {
            if x == prev_x {
                ops.push(DiffOp::Insert { b: (y - 1) as usize });
            } else {
                ops.push(DiffOp::Delete { a: (x - 1) as usize });
            }
        }

        x = prev_x;
        y = prev_y;
    }

    ops.reverse();
    ops
}

fn deletes_first(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut out = Vec::with_capacity(ops.len());
    let mut inserts = Vec::new();

    for op in ops {
        match op {
            DiffOp::Equal { .. } => {
                out.append(&mut inserts);
                out.push(op);
            }
            DiffOp::Delete { .. } => out.push(op),
            DiffOp::Insert { .. } => inserts.push(op),
        }
    }
    out.append(&mut inserts);
    out
}
