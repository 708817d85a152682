//! The Document Store (§4.A): an immutable loaded document with line-indexed
//! access and regex/fuzzy search.

use fancy_regex::Regex;

use crate::error::{EngineError, ErrorKind};
use crate::value::{FuzzyHit, GrepHit};

/// Flags controlling `grep` behavior (§4.A, §6.5 `grep_default_flags`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrepFlags {
    pub case_insensitive: bool,
    pub multiline: bool,
    pub global: bool,
}

impl Default for GrepFlags {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            multiline: true,
            global: true,
        }
    }
}

/// Summary statistics returned by [`Document::stats`] (§4.A).
#[derive(Debug, Clone, PartialEq)]
pub struct DocStats {
    pub length: usize,
    pub line_count: usize,
    pub sample_start: Vec<String>,
    pub sample_middle: Vec<String>,
    pub sample_end: Vec<String>,
}

/// An immutable loaded document (§3 "Document"): text plus a precomputed
/// 1-indexed line array. Replaced wholesale by a subsequent `load`, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    text: String,
    lines: Vec<String>,
    path: Option<String>,
}

const SAMPLE_SIZE: usize = 5;

impl Document {
    #[must_use]
    pub fn new(text: impl Into<String>, path: Option<String>) -> Self {
        let text = text.into();
        let lines = text.lines().map(str::to_string).collect();
        Self { text, lines, path }
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.text.len()
    }

    /// Resolves a possibly-negative 1-indexed line number to a 0-based array
    /// index, without bounds checking.
    fn resolve_index(&self, n: i64) -> Option<usize> {
        if n > 0 {
            usize::try_from(n - 1).ok()
        } else if n < 0 {
            let from_end = usize::try_from(-n).ok()?;
            self.lines.len().checked_sub(from_end)
        } else {
            None
        }
    }

    /// `line(n)` (§4.A): 1-indexed, negative counts from the end (`-1` = last
    /// line).
    pub fn line(&self, n: i64) -> Result<&str, EngineError> {
        self.resolve_index(n)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
            .ok_or_else(|| {
                EngineError::new(
                    ErrorKind::LineOutOfRange,
                    format!("line {n} is out of range (document has {} lines)", self.lines.len()),
                )
            })
    }

    /// `lines(start, end)` (§4.A): inclusive slice, reordered so `start <=
    /// end`, endpoints clamped into range; both-out-of-range-on-the-same-side
    /// yields an empty list.
    #[must_use]
    pub fn lines(&self, start: i64, end: i64) -> Vec<String> {
        if self.lines.is_empty() {
            return Vec::new();
        }
        let resolve = |n: i64| -> i64 {
            if n > 0 {
                n
            } else if n < 0 {
                self.lines.len() as i64 + n + 1
            } else {
                1
            }
        };
        let last = self.lines.len() as i64;
        let (ra, rb) = (resolve(start), resolve(end));
        if (ra > last && rb > last) || (ra < 1 && rb < 1) {
            return Vec::new();
        }
        let (mut a, mut b) = (ra.clamp(1, last), rb.clamp(1, last));
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        let lo = (a - 1) as usize;
        let hi = (b - 1) as usize;
        self.lines[lo..=hi].to_vec()
    }

    /// `stats()` (§4.A): length, line count, and up to three ≤5-line samples.
    #[must_use]
    pub fn stats(&self) -> DocStats {
        let n = self.lines.len();
        let sample_start = self.lines.iter().take(SAMPLE_SIZE).cloned().collect();
        let sample_end = self
            .lines
            .iter()
            .skip(n.saturating_sub(SAMPLE_SIZE))
            .cloned()
            .collect();
        let mid_start = n.saturating_sub(SAMPLE_SIZE) / 2;
        let sample_middle = self
            .lines
            .iter()
            .skip(mid_start)
            .take(SAMPLE_SIZE)
            .cloned()
            .collect();

        DocStats {
            length: self.text.len(),
            line_count: n,
            sample_start,
            sample_middle,
            sample_end,
        }
    }

    fn line_num_for_byte_offset(&self, offset: usize) -> u32 {
        let mut consumed = 0usize;
        for (i, line) in self.lines.iter().enumerate() {
            let line_end = consumed + line.len();
            if offset <= line_end {
                return (i + 1) as u32;
            }
            // +1 for the newline the `lines()` split removed.
            consumed = line_end + 1;
        }
        self.lines.len().max(1) as u32
    }

    /// `grep(pattern, flags)` (§4.A): eagerly collected (in practice bounded
    /// by document size) sequence of [`GrepHit`]. Zero-width matches advance
    /// the scan cursor by one code point so the scan always terminates.
    pub fn grep(&self, pattern: &str, flags: GrepFlags) -> Result<Vec<GrepHit>, EngineError> {
        let mut pattern_str = String::new();
        if flags.case_insensitive {
            pattern_str.push_str("(?i)");
        }
        if flags.multiline {
            pattern_str.push_str("(?m)");
        }
        pattern_str.push_str(pattern);

        let re = Regex::new(&pattern_str).map_err(|e| EngineError::regex(pattern, &e))?;

        let mut hits = Vec::new();
        let mut pos = 0usize;
        while pos <= self.text.len() {
            let Some(found) = re
                .find_from_pos(&self.text, pos)
                .map_err(|e| EngineError::regex(pattern, &e))?
            else {
                break;
            };
            let caps = re
                .captures_from_pos(&self.text, pos)
                .map_err(|e| EngineError::regex(pattern, &e))?;

            let matched = found.as_str().to_string();
            let line_num = self.line_num_for_byte_offset(found.start());
            let line = self
                .lines
                .get((line_num - 1) as usize)
                .cloned()
                .unwrap_or_default();

            let groups = caps
                .as_ref()
                .map(|c| {
                    (1..c.len())
                        .map(|i| c.get(i).map(|m| m.as_str().to_string()))
                        .collect()
                })
                .unwrap_or_default();

            hits.push(GrepHit {
                matched,
                line,
                line_num,
                index: found.start() as u32,
                groups,
            });

            if !flags.global {
                break;
            }

            pos = if found.end() > found.start() {
                found.end()
            } else {
                // zero-width match: step forward one code point to make progress.
                self.text[found.end()..]
                    .chars()
                    .next()
                    .map_or(found.end() + 1, |c| found.end() + c.len_utf8())
            };
        }
        Ok(hits)
    }

    /// `fuzzy(query, limit)` (§4.A): documented, stable scoring. A
    /// case-folded substring match scores `0`; otherwise the score is the
    /// edit distance between `query` and the best-matching contiguous window
    /// of the line, plus a penalty proportional to how much longer the
    /// window is than the query. Ties break by smaller `lineNum`.
    #[must_use]
    pub fn fuzzy(&self, query: &str, limit: usize) -> Vec<FuzzyHit> {
        let query_lower = query.to_lowercase();
        let mut hits: Vec<FuzzyHit> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| FuzzyHit {
                line: line.clone(),
                line_num: (i + 1) as u32,
                score: score_line(&query_lower, line),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.line_num.cmp(&b.line_num))
        });
        hits.truncate(limit);
        hits
    }
}

/// Best-window edit-distance score used by [`Document::fuzzy`]; `0` for an
/// exact case-folded substring match.
fn score_line(query_lower: &str, line: &str) -> f64 {
    let line_lower = line.to_lowercase();
    if query_lower.is_empty() {
        return 0.0;
    }
    if line_lower.contains(query_lower) {
        return 0.0;
    }

    let line_chars: Vec<char> = line_lower.chars().collect();
    let q_len = query_lower.chars().count();
    if line_chars.is_empty() {
        return q_len as f64;
    }

    let mut best = f64::MAX;
    let max_window = (q_len + 4).min(line_chars.len());
    for window_len in 1..=max_window.max(1) {
        if window_len > line_chars.len() {
            break;
        }
        for start in 0..=(line_chars.len() - window_len) {
            let window: String = line_chars[start..start + window_len].iter().collect();
            let dist = levenshtein(query_lower, &window) as f64;
            let penalty = (window_len as f64 - q_len as f64).abs() * 0.1;
            let score = dist + penalty.max(0.0);
            if score < best {
                best = score;
            }
        }
    }
    best
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
