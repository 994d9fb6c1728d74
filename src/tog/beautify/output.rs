//! Output tokens and parse states of the beautifier

use std::fmt;

/// What an output token stands for. Most kinds render as their value; the markers render
/// as nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// A blank between two tokens, removed again by whatever comes next if it must not be there
    Blank,
    /// Marker for a blank-lines request; the line ends themselves are separate tokens
    BlankLines,
    Comment,
    FileStart,
    FileEnd,
    /// Whitespace that no later cleanup removes
    HardBlank,
    LineEnd,
    LineIndent,
    /// `(`, `[` or `{`
    Lt,
    /// `)`, `]` or `}`
    Rt,
    Op,
    OpNoBlanks,
    UnaryOp,
    Word,
    /// A keyword operator: `and`, `in`, `not`, `or`, `for`, `is`
    WordOp,
    Number,
    String,
    /// Kept whitespace: backslash continuations
    Ws,
    /// A token cancelled by line splitting
    NoOp,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Blank => "blank",
            OutputKind::BlankLines => "blank-lines",
            OutputKind::Comment => "comment",
            OutputKind::FileStart => "file-start",
            OutputKind::FileEnd => "file-end",
            OutputKind::HardBlank => "hard-blank",
            OutputKind::LineEnd => "line-end",
            OutputKind::LineIndent => "line-indent",
            OutputKind::Lt => "lt",
            OutputKind::Rt => "rt",
            OutputKind::Op => "op",
            OutputKind::OpNoBlanks => "op-no-blanks",
            OutputKind::UnaryOp => "unary-op",
            OutputKind::Word => "word",
            OutputKind::WordOp => "word-op",
            OutputKind::Number => "number",
            OutputKind::String => "string",
            OutputKind::Ws => "ws",
            OutputKind::NoOp => "no-op",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputToken {
    pub kind: OutputKind,
    pub value: String,
}

impl OutputToken {
    pub fn new(kind: OutputKind, value: impl Into<String>) -> Self {
        OutputToken {
            kind,
            value: value.into(),
        }
    }

    pub fn is(&self, kind: OutputKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }

    /// The text this token contributes to the result
    pub fn to_source(&self) -> &str {
        match self.kind {
            OutputKind::BlankLines
            | OutputKind::FileStart
            | OutputKind::FileEnd
            | OutputKind::NoOp => "",
            OutputKind::LineEnd => "\n",
            _ => &self.value,
        }
    }
}

impl fmt::Display for OutputToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.kind, self.value)
    }
}

/// Concatenate the text of output tokens
pub fn output_to_string(tokens: &[OutputToken]) -> String {
    tokens.iter().map(OutputToken::to_source).collect()
}

/// An entry of the beautifier's parse-state stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    FileStart,
    /// Inside a run of decorators
    Decorator,
    Class,
    Def,
    /// The indentation level of a `class` or `def` statement, popped at the dedent back to it
    Indent(usize),
}
