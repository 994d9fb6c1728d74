//! Splitting long lines
//!
//! Runs at the end of each logical line when `orange` is set. A line is split when it is at
//! least `max_split_line_length` characters long and contains an open bracket:
//!
//!     result = function_name(first_argument, second_argument)
//!
//! becomes
//!
//!     result = function_name(
//!         first_argument,
//!         second_argument
//!     )
//!
//! The line is cut after its first non-empty bracket. If what follows is still too long and
//! has commas at the top level, each element gets a line of its own and the closing bracket
//! goes back to the indentation of the line; otherwise the tail moves to one indented line.
//! Lines that end inside brackets or contain backslash continuations are left alone.

use super::output::{output_to_string, OutputKind, OutputToken};
use super::Orange;

/// Index of the first open bracket that is not immediately closed
fn first_split_point(line: &[OutputToken]) -> Option<usize> {
    line.iter().enumerate().position(|(i, token)| {
        token.kind == OutputKind::Lt
            && line
                .get(i + 1)
                .map_or(false, |next| next.kind != OutputKind::Rt)
    })
}

fn has_top_level_comma(tail: &[OutputToken]) -> bool {
    let mut depth = 0usize;
    for token in tail {
        match token.kind {
            OutputKind::Lt => depth += 1,
            OutputKind::Rt if depth == 0 => return false,
            OutputKind::Rt => depth -= 1,
            OutputKind::Op if depth == 0 && token.value == "," => return true,
            _ => {}
        }
    }
    false
}

impl Orange {
    /// Split the line that the last `line-end` token ends. Returns true if it was split.
    pub(super) fn break_line(&mut self) -> bool {
        let max = self.settings.max_split_line_length;
        if max == 0 || self.in_brackets() {
            return false;
        }
        let Some(end) = self.code_list.len().checked_sub(1) else {
            return false;
        };
        let start = self.code_list[..end]
            .iter()
            .rposition(|token| token.kind == OutputKind::LineEnd)
            .map_or(0, |i| i + 1);
        let line = &self.code_list[start..end];
        if output_to_string(line).chars().count() < max
            || line.iter().any(|token| token.kind == OutputKind::Ws)
        {
            return false;
        }
        let Some(open) = first_split_point(line) else {
            return false;
        };

        // The prefix also takes the blanks and open brackets right after the split point
        let mut prefix_len = open + 1;
        while line
            .get(prefix_len)
            .map_or(false, |t| matches!(t.kind, OutputKind::Blank | OutputKind::Lt))
        {
            prefix_len += 1;
        }
        let prefix = line[..prefix_len].to_vec();
        let tail = line[prefix_len..].to_vec();
        log::debug!(
            "splitting line {:?}",
            output_to_string(&self.code_list[start..end])
        );

        self.code_list.truncate(start);
        self.append_tail(prefix, tail);
        self.add_token(OutputKind::LineEnd, "\n");
        true
    }

    fn append_tail(&mut self, prefix: Vec<OutputToken>, tail: Vec<OutputToken>) {
        let indent = format!("{}{}", self.lws, " ".repeat(self.settings.tab_width));
        self.code_list.extend(prefix);
        self.add_token(OutputKind::LineEnd, "\n");
        self.add_token(OutputKind::LineIndent, indent.clone());

        let short = output_to_string(&tail).chars().count() < self.settings.max_split_line_length;
        if short || !has_top_level_comma(&tail) {
            self.code_list.extend(tail);
            return;
        }

        let mut depth = 0usize;
        let mut rest = tail.into_iter().peekable();
        while let Some(token) = rest.next() {
            match token.kind {
                OutputKind::Lt => {
                    depth += 1;
                    self.code_list.push(token);
                }
                OutputKind::Rt if depth == 0 => {
                    // The closing bracket goes back to the line's own indentation
                    if self.prev_kind() == OutputKind::LineIndent {
                        self.code_list.pop();
                    } else {
                        self.add_token(OutputKind::LineEnd, "\n");
                    }
                    let lws = self.lws.clone();
                    self.add_token(OutputKind::LineIndent, lws);
                    self.code_list.push(token);
                    self.code_list.extend(rest);
                    return;
                }
                OutputKind::Rt => {
                    depth -= 1;
                    self.code_list.push(token);
                }
                OutputKind::Op if depth == 0 && token.value == "," => {
                    self.add_token(OutputKind::OpNoBlanks, ",");
                    self.add_token(OutputKind::LineEnd, "\n");
                    self.add_token(OutputKind::LineIndent, indent.clone());
                    if rest
                        .peek()
                        .map_or(false, |next| next.kind == OutputKind::Blank)
                    {
                        rest.next();
                        self.add_token(OutputKind::NoOp, "");
                    }
                }
                _ => self.code_list.push(token),
            }
        }
    }
}
