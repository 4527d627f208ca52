//! Block nesting by keyword counting.
//!
//! Every opener keyword pushes, every `end` pops whatever is on top. The
//! opener kind is never matched against the `end`; only depth is tracked.
//! Modifier forms (`return if x`) are counted as openers too, which can
//! desynchronize the count. Comments, string bodies, member access
//! (`range.end`) and symbols (`:if`) are not keywords.

use crate::lang::BLOCK_OPENERS;
use crate::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBlock {
    pub keyword: &'static str,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPair {
    pub keyword: &'static str,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockScan {
    /// Closed blocks, in the order their `end` was seen.
    pub pairs: Vec<BlockPair>,
    /// Lines holding an `end` with nothing open.
    pub unexpected_ends: Vec<u32>,
    /// Blocks still open at end of input, outermost first.
    pub unclosed: Vec<OpenBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Open(&'static str),
    End,
}

pub fn scan(lines: &[&str]) -> BlockScan {
    let mut out = BlockScan::default();
    let mut stack: Vec<OpenBlock> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx as u32;
        for mark in line_marks(line) {
            match mark {
                Mark::Open(keyword) => stack.push(OpenBlock { keyword, line: line_no }),
                Mark::End => match stack.pop() {
                    Some(open) => out.pairs.push(BlockPair {
                        keyword: open.keyword,
                        start_line: open.line,
                        end_line: line_no,
                    }),
                    None => out.unexpected_ends.push(line_no),
                },
            }
        }
    }

    out.unclosed = stack;
    out
}

/// Opener and `end` keywords on one line, left to right.
fn line_marks(line: &str) -> Vec<Mark> {
    let masked = text::mask_non_code(line);
    let mut marks = Vec::new();
    let mut chars = masked.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((start, c)) = chars.next() {
        if !text::is_ident_start(c) || prev.is_some_and(text::is_word_char) {
            prev = Some(c);
            continue;
        }
        let mut end = start + c.len_utf8();
        let mut last = c;
        while let Some(&(i, next)) = chars.peek() {
            if !text::is_word_char(next) {
                break;
            }
            end = i + next.len_utf8();
            last = next;
            chars.next();
        }
        let word = &masked[start..end];
        let before = prev;
        let after = masked[end..].chars().next();
        prev = Some(last);

        if matches!(before, Some('.' | ':' | '@' | '$')) || after == Some(':') {
            continue;
        }
        if word == "end" {
            marks.push(Mark::End);
        } else if let Some(keyword) = BLOCK_OPENERS.iter().find(|k| **k == word) {
            marks.push(Mark::Open(keyword));
        }
    }
    marks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> BlockScan {
        let lines: Vec<&str> = src.split('\n').collect();
        scan(&lines)
    }

    #[test]
    fn balanced_nesting_pairs_innermost_first() {
        let scan = run("class Foo\n  def bar\n    if x\n    end\n  end\nend");
        assert!(scan.unexpected_ends.is_empty());
        assert!(scan.unclosed.is_empty());
        let pairs: Vec<(u32, u32)> = scan.pairs.iter().map(|p| (p.start_line, p.end_line)).collect();
        assert_eq!(pairs, vec![(2, 3), (1, 4), (0, 5)]);
    }

    #[test]
    fn extra_end_is_unexpected() {
        let scan = run("if true\n  puts 1\nend\nend");
        assert_eq!(scan.unexpected_ends, vec![3]);
        assert!(scan.unclosed.is_empty());
    }

    #[test]
    fn missing_end_reports_the_outer_opener() {
        let scan = run("class Foo\ndef bar\nend");
        assert!(scan.unexpected_ends.is_empty());
        assert_eq!(scan.unclosed, vec![OpenBlock { keyword: "class", line: 0 }]);
    }

    #[test]
    fn depth_only_matching_pairs_across_kinds() {
        // The `end` closing `if` pairs with whatever is on top.
        let scan = run("while a\nif b\nend");
        assert_eq!(scan.pairs[0].keyword, "if");
        assert_eq!(scan.unclosed[0].keyword, "while");
    }

    #[test]
    fn same_line_open_and_end() {
        let scan = run("def foo; end\nx = 1");
        assert_eq!(
            scan.pairs,
            vec![BlockPair {
                keyword: "def",
                start_line: 0,
                end_line: 0
            }]
        );
    }

    #[test]
    fn non_keyword_forms_are_ignored() {
        let src = "x = range.end\ny = :if\nputs \"class end\" # def\nz = {if: 1}\nelsif_count = 2";
        let scan = run(src);
        assert_eq!(scan, BlockScan::default());
    }

    #[test]
    fn every_occurrence_counts() {
        let scan = run("if a then if b then x end end");
        assert_eq!(scan.pairs.len(), 2);
        assert!(scan.unclosed.is_empty());
    }
}
