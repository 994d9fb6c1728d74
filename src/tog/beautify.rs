//! Orange, a PEP 8 beautifier
//!
//!     The beautifier rebuilds the source from the token list. Every input token is turned
//!     into output tokens by a handler for its kind; the whitespace of the input is dropped
//!     and regenerated, except for backslash continuations and the indentation of lines
//!     inside brackets.
//!
//!     Spacing works with requests: a handler adds a `blank` after a token when one might be
//!     needed, and the next handler removes it again (`clean`) if its token must be attached.
//!     Line ends work the same way with `line-end`, `line-indent` and `blank-lines` tokens.
//!
//! Rules
//!
//!     - No blanks inside brackets, or before `,`, `;` and `:`.
//!     - No blanks around `=` inside parens, and none around arithmetic operators in argument
//!       lists.
//!     - Slice colons get blanks on both sides unless a bound is missing.
//!     - Two blanks before trailing comments.
//!     - Two blank lines before top-level classes, functions and their decorators, one blank
//!       line before nested ones. Other blank lines are deleted when `delete_blank_lines`
//!       is set.
//!     - Exactly one newline at the end of the file.
//!     - With `orange` set, lines of at least `max_split_line_length` characters are split
//!       after their first open bracket, one element per line (see [split](self::split)).
//!
//! Syntax-tree hints
//!
//!     When the tokens have been synchronized with a tree, the owner of an operator decides
//!     whether `-`, `+`, `~` are unary, whether `*` and `**` unpack, whether `@` starts a
//!     decorator and whether `:` is a slice colon. Without links the handlers fall back to
//!     guessing from the previous output token.

pub mod output;
mod split;

use crate::tog::ast::{Ast, NodeKind};
use crate::tog::config::OrangeSettings;
use crate::tog::parsing::is_keyword;
use crate::tog::token::{Token, TokenKind};
use output::{output_to_string, OutputKind, OutputToken, ParseState};

/// What the owner of an operator token says about it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpHint {
    Unary,
    Binary,
    Unpacking,
    Decorator,
    SliceColon,
    OtherColon,
}

fn op_hint(tree: Option<&Ast>, token: &Token) -> Option<OpHint> {
    let tree = tree?;
    let owner = token.node?;
    if owner.0 >= tree.len() {
        return None;
    }
    let hint = match (token.value.as_str(), tree.kind(owner)) {
        ("-" | "+" | "~", NodeKind::UnaryOp { .. }) => OpHint::Unary,
        (
            "*" | "**",
            NodeKind::Starred { .. }
            | NodeKind::Arguments { .. }
            | NodeKind::Call { .. }
            | NodeKind::Dict { .. }
            | NodeKind::ClassDef { .. },
        ) => OpHint::Unpacking,
        ("@", NodeKind::FunctionDef { .. } | NodeKind::ClassDef { .. }) => OpHint::Decorator,
        (":", NodeKind::Slice { .. }) => OpHint::SliceColon,
        (":", _) => OpHint::OtherColon,
        (_, NodeKind::BinOp { .. }) => OpHint::Binary,
        _ => return None,
    };
    Some(hint)
}

/// Keywords that start or join clauses. The constants behave like names.
fn is_clause_keyword(value: &str) -> bool {
    is_keyword(value) && !matches!(value, "True" | "False" | "None")
}

pub struct Orange {
    settings: OrangeSettings,
    code_list: Vec<OutputToken>,
    state_stack: Vec<ParseState>,
    /// One entry per unmatched `(`: true if it opened an argument list
    paren_stack: Vec<bool>,
    square_brackets_level: usize,
    curly_brackets_level: usize,
    decorator_seen: bool,
    /// Indentation level, changed only by indent and dedent tokens
    level: usize,
    /// Leading whitespace of the current level
    lws: String,
}

impl Orange {
    pub fn new(settings: OrangeSettings) -> Self {
        Orange {
            settings,
            code_list: Vec::new(),
            state_stack: Vec::new(),
            paren_stack: Vec::new(),
            square_brackets_level: 0,
            curly_brackets_level: 0,
            decorator_seen: false,
            level: 0,
            lws: String::new(),
        }
    }

    pub fn settings(&self) -> &OrangeSettings {
        &self.settings
    }

    /// The output tokens of the last run
    pub fn code_list(&self) -> &[OutputToken] {
        &self.code_list
    }

    /// Beautify a token list. `tree` is consulted only for tokens that carry an owner.
    pub fn beautify(&mut self, tokens: &[Token], tree: Option<&Ast>) -> String {
        *self = Orange::new(self.settings.clone());
        self.add_token(OutputKind::FileStart, "");
        self.state_stack.push(ParseState::FileStart);

        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            match token.kind {
                TokenKind::Ws => {
                    // Adjacent blanks and continuations form one run
                    let mut value = String::new();
                    while i < tokens.len()
                        && matches!(tokens[i].kind, TokenKind::Ws | TokenKind::Killed)
                    {
                        value.push_str(&tokens[i].value);
                        i += 1;
                    }
                    self.do_ws(&value);
                    continue;
                }
                TokenKind::Killed => {}
                TokenKind::Comment => self.do_comment(token),
                TokenKind::Endmarker => self.file_end(),
                TokenKind::Indent => self.do_indent(),
                TokenKind::Dedent => self.do_dedent(),
                TokenKind::Newline | TokenKind::Nl => self.line_end(),
                TokenKind::Name => self.do_name(tokens, i),
                TokenKind::Number => self.add_token(OutputKind::Number, &token.value),
                TokenKind::String => {
                    self.add_token(OutputKind::String, &token.value);
                    self.blank();
                }
                TokenKind::Op => self.do_op(&token.value, op_hint(tree, token)),
            }
            i += 1;
        }
        output_to_string(&self.code_list)
    }

    // Input token handlers

    fn do_comment(&mut self, token: &Token) {
        self.clean(OutputKind::Blank);
        if token.line.trim_start().starts_with('#') {
            self.clean(OutputKind::LineIndent);
            self.clean(OutputKind::HardBlank);
            self.add_token(OutputKind::Comment, token.line.trim_end());
        } else {
            let value = format!("  {}", token.value.trim_end());
            self.add_token(OutputKind::Comment, value);
        }
    }

    fn do_indent(&mut self) {
        self.level += 1;
        self.lws = self.indentation(self.level);
        self.line_indent();
    }

    fn do_dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
        self.lws = self.indentation(self.level);
        self.line_indent();
        if self.state_stack.last() == Some(&ParseState::Indent(self.level)) {
            self.state_stack.pop();
            if matches!(
                self.state_stack.last(),
                Some(ParseState::Class | ParseState::Def)
            ) {
                self.state_stack.pop();
                self.blank_lines(if self.level == 0 { 2 } else { 1 });
            }
        }
    }

    fn do_name(&mut self, tokens: &[Token], i: usize) {
        let name = tokens[i].value.as_str();
        match name {
            "class" | "def" => {
                if !self.last_code_is(OutputKind::Word, "async") {
                    self.start_class_or_def();
                }
                self.state_stack.push(if name == "class" {
                    ParseState::Class
                } else {
                    ParseState::Def
                });
                self.state_stack.push(ParseState::Indent(self.level));
                self.word(name);
            }
            "async" => {
                let next = tokens[i + 1..].iter().find(|t| t.is_significant());
                if next.map_or(false, |t| t.is_name("def")) {
                    self.start_class_or_def();
                }
                self.word(name);
            }
            "and" | "in" | "not" | "or" | "for" | "is" => self.word_op(name),
            _ => self.word(name),
        }
    }

    fn do_op(&mut self, value: &str, hint: Option<OpHint>) {
        match value {
            "." => self.dot(),
            "..." => self.word(value),
            "@" => match hint {
                Some(OpHint::Decorator) => self.decorator(),
                Some(_) => self.op(value),
                None if self.at_line_start() => self.decorator(),
                None => self.op(value),
            },
            ":" => match hint {
                Some(OpHint::SliceColon) => self.slice_colon(),
                Some(_) => self.op_blank(value),
                None if self.square_brackets_level > 0 => self.slice_colon(),
                None => self.op_blank(value),
            },
            "," | ";" => self.op_blank(value),
            "(" | "[" | "{" => self.lt(value),
            ")" | "]" | "}" => self.rt(value),
            "=" => {
                if self.paren_stack.is_empty() {
                    self.op(value);
                } else {
                    self.op_no_blanks(value);
                }
            }
            "~" | "+" | "-" => match hint {
                Some(OpHint::Unary) => self.unary_op(value),
                Some(OpHint::Binary) => self.op(value),
                _ => self.possible_unary_op(value),
            },
            "*" | "**" => match hint {
                Some(OpHint::Unpacking) => {
                    self.blank();
                    self.add_token(OutputKind::OpNoBlanks, value);
                }
                Some(OpHint::Binary) => self.op(value),
                _ if value == "*" => self.star_op(),
                _ => self.star_star_op(),
            },
            _ => self.op(value),
        }
    }

    fn do_ws(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        if value.contains("\\\n") || value.contains("\\\r\n") {
            // A real blank before the backslash, nothing added after it
            self.clean(OutputKind::Blank);
            self.add_token(OutputKind::Blank, " ");
            self.add_token(OutputKind::Ws, value.trim_start());
            if value.ends_with([' ', '\t']) {
                self.add_token(OutputKind::Blank, "");
            }
            return;
        }
        // Indentation of a continuation line inside brackets is kept as written
        if self.prev_kind() == OutputKind::LineIndent && self.in_brackets() {
            self.clean(OutputKind::LineIndent);
            self.add_token(OutputKind::HardBlank, value);
        }
    }

    // Output token generators

    fn add_token(&mut self, kind: OutputKind, value: impl Into<String>) {
        self.code_list.push(OutputToken::new(kind, value));
    }

    fn prev_kind(&self) -> OutputKind {
        self.code_list
            .last()
            .map_or(OutputKind::FileStart, |token| token.kind)
    }

    fn prev_value(&self) -> &str {
        self.code_list.last().map_or("", |token| token.value.as_str())
    }

    /// The last token that is not layout
    fn last_code(&self) -> Option<&OutputToken> {
        self.code_list.iter().rev().find(|token| {
            !matches!(
                token.kind,
                OutputKind::Blank
                    | OutputKind::BlankLines
                    | OutputKind::HardBlank
                    | OutputKind::LineEnd
                    | OutputKind::LineIndent
                    | OutputKind::NoOp
            )
        })
    }

    fn last_code_is(&self, kind: OutputKind, value: &str) -> bool {
        self.last_code().map_or(false, |token| token.is(kind, value))
    }

    fn at_line_start(&self) -> bool {
        matches!(
            self.prev_kind(),
            OutputKind::FileStart
                | OutputKind::BlankLines
                | OutputKind::LineEnd
                | OutputKind::LineIndent
        )
    }

    fn in_arg_list(&self) -> bool {
        self.paren_stack.iter().any(|opened_arg_list| *opened_arg_list)
    }

    fn in_brackets(&self) -> bool {
        !self.paren_stack.is_empty()
            || self.square_brackets_level > 0
            || self.curly_brackets_level > 0
    }

    fn indentation(&self, level: usize) -> String {
        " ".repeat(level * self.settings.tab_width)
    }

    /// Remove the last output token if it has the given kind
    fn clean(&mut self, kind: OutputKind) {
        if self.prev_kind() == kind && !self.code_list.is_empty() {
            self.code_list.pop();
        }
    }

    /// Remove all vestiges of previous lines
    fn clean_blank_lines(&mut self) {
        while matches!(
            self.prev_kind(),
            OutputKind::BlankLines | OutputKind::LineEnd | OutputKind::LineIndent
        ) && !self.code_list.is_empty()
        {
            self.code_list.pop();
        }
    }

    fn blank(&mut self) {
        if !matches!(
            self.prev_kind(),
            OutputKind::Blank
                | OutputKind::BlankLines
                | OutputKind::FileStart
                | OutputKind::HardBlank
                | OutputKind::LineEnd
                | OutputKind::LineIndent
                | OutputKind::Lt
                | OutputKind::OpNoBlanks
                | OutputKind::UnaryOp
        ) {
            self.add_token(OutputKind::Blank, " ");
        }
    }

    /// Request `n` blank lines, replacing whatever line ends precede
    fn blank_lines(&mut self, n: usize) {
        self.clean_blank_lines();
        if self.prev_kind() == OutputKind::FileStart {
            self.add_token(OutputKind::BlankLines, n.to_string());
            return;
        }
        for _ in 0..=n {
            self.add_token(OutputKind::LineEnd, "\n");
        }
        self.add_token(OutputKind::BlankLines, n.to_string());
        self.line_indent();
    }

    fn file_end(&mut self) {
        self.clean_blank_lines();
        if self.code_list.iter().any(|token| !token.to_source().is_empty()) {
            self.add_token(OutputKind::LineEnd, "\n");
        }
        self.add_token(OutputKind::FileEnd, "");
    }

    fn line_end(&mut self) {
        if self.prev_kind() == OutputKind::FileStart {
            return;
        }
        self.clean(OutputKind::Blank);
        if self.settings.delete_blank_lines {
            self.clean_blank_lines();
        }
        self.clean(OutputKind::LineIndent);
        self.add_token(OutputKind::LineEnd, "\n");
        if self.settings.orange {
            self.break_line();
        }
        self.line_indent();
    }

    fn line_indent(&mut self) {
        self.clean(OutputKind::LineIndent);
        let lws = self.lws.clone();
        self.add_token(OutputKind::LineIndent, lws);
    }

    /// Blank lines before a `class` or `def`, or the line break after its decorators
    fn start_class_or_def(&mut self) {
        self.decorator_seen = false;
        if self.state_stack.last() == Some(&ParseState::Decorator) {
            self.clean_blank_lines();
            self.line_end();
            self.state_stack.pop();
        } else {
            let n = self.blank_lines_before_def();
            self.blank_lines(n);
        }
    }

    fn blank_lines_before_def(&self) -> usize {
        if self.last_code_is(OutputKind::Op, ":") {
            0
        } else if self.level == 0 {
            2
        } else {
            1
        }
    }

    fn decorator(&mut self) {
        if !self.decorator_seen {
            let n = self.blank_lines_before_def();
            self.blank_lines(n);
            self.decorator_seen = true;
        }
        self.op_no_blanks("@");
        if self.state_stack.last() != Some(&ParseState::Decorator) {
            self.state_stack.push(ParseState::Decorator);
        }
    }

    fn dot(&mut self) {
        // Relative imports: `from . import x`, `from .mod import x`
        let after_keyword = self
            .last_code()
            .map_or(false, |t| t.kind == OutputKind::Word && is_clause_keyword(&t.value));
        if after_keyword {
            self.blank();
            self.add_token(OutputKind::OpNoBlanks, ".");
        } else {
            self.op_no_blanks(".");
        }
    }

    fn slice_colon(&mut self) {
        self.clean(OutputKind::Blank);
        if self.prev_value() == "[" {
            self.add_token(OutputKind::Op, ":");
        } else if self.prev_kind() == OutputKind::Op && self.prev_value() == ":" {
            self.add_token(OutputKind::Op, ":");
            self.blank();
        } else {
            self.op(":");
        }
    }

    fn lt(&mut self, s: &str) {
        match s {
            "[" => self.square_brackets_level += 1,
            "{" => self.curly_brackets_level += 1,
            _ => {}
        }
        self.clean(OutputKind::Blank);
        let mut opens_arg_list = false;
        match self.prev_kind() {
            OutputKind::Op | OutputKind::WordOp => self.blank(),
            OutputKind::Word => {
                if s == "{" || is_clause_keyword(self.prev_value()) {
                    self.blank();
                } else if s == "(" {
                    opens_arg_list = true;
                }
            }
            _ => {}
        }
        if s == "(" {
            self.paren_stack.push(opens_arg_list);
        }
        self.add_token(OutputKind::Lt, s);
    }

    fn rt(&mut self, s: &str) {
        match s {
            ")" => {
                self.paren_stack.pop();
            }
            "]" => self.square_brackets_level = self.square_brackets_level.saturating_sub(1),
            _ => self.curly_brackets_level = self.curly_brackets_level.saturating_sub(1),
        }
        self.clean(OutputKind::Blank);
        if self.prev_kind() == OutputKind::Op && self.prev_value() == ":" {
            if let Some(colon) = self.code_list.pop() {
                self.clean(OutputKind::Blank);
                self.code_list.push(colon);
            }
        }
        self.add_token(OutputKind::Rt, s);
    }

    fn op(&mut self, s: &str) {
        if self.in_arg_list() && matches!(s, "+" | "-" | "/" | "*" | "//") {
            self.clean(OutputKind::Blank);
            self.add_token(OutputKind::Op, s);
        } else {
            self.blank();
            self.add_token(OutputKind::Op, s);
            self.blank();
        }
    }

    fn op_blank(&mut self, s: &str) {
        self.clean(OutputKind::Blank);
        self.add_token(OutputKind::Op, s);
        self.blank();
    }

    fn op_no_blanks(&mut self, s: &str) {
        self.clean(OutputKind::Blank);
        self.add_token(OutputKind::OpNoBlanks, s);
    }

    fn possible_unary_op(&mut self, s: &str) {
        self.clean(OutputKind::Blank);
        let unary = match self.prev_kind() {
            OutputKind::Lt
            | OutputKind::Op
            | OutputKind::OpNoBlanks
            | OutputKind::WordOp
            | OutputKind::UnaryOp
            | OutputKind::FileStart
            | OutputKind::BlankLines
            | OutputKind::LineIndent
            | OutputKind::HardBlank => true,
            OutputKind::Word => is_clause_keyword(self.prev_value()),
            _ => false,
        };
        if unary {
            self.unary_op(s);
        } else {
            self.op(s);
        }
    }

    fn unary_op(&mut self, s: &str) {
        self.clean(OutputKind::Blank);
        let n = self.code_list.len();
        let after_lt = self.prev_kind() == OutputKind::Lt;
        let after_lt_colon = n >= 2
            && self.code_list[n - 1].is(OutputKind::Op, ":")
            && self.code_list[n - 2].kind == OutputKind::Lt;
        if !after_lt && !after_lt_colon {
            self.blank();
        }
        self.add_token(OutputKind::UnaryOp, s);
    }

    /// The last output token that is not a blank
    fn prev_non_blank(&self) -> Option<&OutputToken> {
        self.code_list
            .iter()
            .rev()
            .find(|token| token.kind != OutputKind::Blank)
    }

    /// `*` without tree hints: `*args` after an open bracket or a comma
    fn star_op(&mut self) {
        if !self.in_brackets() {
            self.op("*");
            return;
        }
        match self.prev_non_blank().map(|t| (t.kind, t.value.as_str())) {
            Some((OutputKind::Lt, _)) => self.op_no_blanks("*"),
            Some((_, ",")) => {
                self.blank();
                self.add_token(OutputKind::OpNoBlanks, "*");
            }
            _ => self.op("*"),
        }
    }

    /// `**` without tree hints: `**kwargs` after an open bracket or a comma
    fn star_star_op(&mut self) {
        if !self.in_brackets() {
            self.op("**");
            return;
        }
        match self.prev_non_blank().map(|t| (t.kind, t.value.as_str())) {
            Some((OutputKind::Lt, _)) | Some((_, ",")) => {
                self.blank();
                self.add_token(OutputKind::OpNoBlanks, "**");
            }
            _ => self.op("**"),
        }
    }

    fn word(&mut self, s: &str) {
        if s == "import" && self.prev_kind() == OutputKind::OpNoBlanks {
            // `from . import x`
            self.add_token(OutputKind::Blank, " ");
        } else if !(self.in_arg_list() && self.prev_kind() == OutputKind::Op) {
            self.blank();
        }
        self.add_token(OutputKind::Word, s);
        self.blank();
    }

    fn word_op(&mut self, s: &str) {
        self.blank();
        self.add_token(OutputKind::WordOp, s);
        self.blank();
    }
}

impl Default for Orange {
    fn default() -> Self {
        Orange::new(OrangeSettings::default())
    }
}
