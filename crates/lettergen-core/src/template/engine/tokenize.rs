//! Tokenization for the template engine
//!
//! Provides O(n) tokenization using a state machine.

/// A single `{{...}}` token with position and metadata
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    /// Raw text between `{{` and `}}`, untrimmed
    pub content: String,
    /// Absolute byte position of `{{` in template
    pub start: usize,
    /// Total length in bytes including `{{` and `}}`
    pub length: usize,
    /// Number of backslashes immediately before `{{`
    /// Odd count = escaped (literal), even = real (processed)
    pub backslash_count: usize,
    /// Line number where the token starts (for error messages)
    pub line: usize,
}

impl Token {
    /// Check if this token is escaped (odd backslash count)
    pub fn is_escaped(&self) -> bool {
        self.backslash_count % 2 == 1
    }

    /// Byte position where the run of escaping backslashes begins
    pub fn lead_start(&self) -> usize {
        self.start - self.backslash_count
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Tokenization state machine
///
/// ```text
/// Normal ──{───> SeenLBrace ──{───> InToken ──}───> SeenRBrace ──}───> [Yield Token] → Normal
///   │               │                  │                  │
///   │ (not {)       │ (not {)          │ (not })          │ (not })
///   └──────────────>└─────────────────>└─────────────────>└──────────> Normal
/// ```
///
/// Every byte is visited once, moving forward only. A `{{` that reaches the
/// end of input without `}}` is remembered so the caller can report it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScanState {
    /// Normal text, counting consecutive backslashes
    Normal { backslash_count: usize },

    /// Seen one `{`
    SeenLBrace {
        pos: usize,
        backslash_count: usize,
    },

    /// Inside `{{...`
    InToken {
        start: usize,
        content_start: usize,
        backslash_count: usize,
        line: usize,
    },

    /// Seen one `}` inside a token
    SeenRBrace {
        start: usize,
        content_start: usize,
        rbrace_pos: usize,
        backslash_count: usize,
        line: usize,
    },
}

/// Iterator over `{{...}}` tokens in a template string
pub(crate) struct TokenStream<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: ScanState,
    line: usize,
    step_count: usize,
    unclosed: Option<usize>,
}

impl<'a> TokenStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            state: ScanState::Normal { backslash_count: 0 },
            line: 1,
            step_count: 0,
            unclosed: None,
        }
    }

    /// Line of a `{{` left open at end of input, once iteration finished
    pub fn unclosed_line(&self) -> Option<usize> {
        self.unclosed
    }

    #[inline]
    fn should_continue(&mut self, max_steps: usize) -> bool {
        self.step_count += 1;
        self.step_count <= max_steps && self.pos < self.bytes.len()
    }

    fn finish(&mut self) {
        match self.state {
            ScanState::InToken { line, .. } | ScanState::SeenRBrace { line, .. } => {
                self.unclosed = Some(line);
            }
            _ => {}
        }
        self.state = ScanState::Normal { backslash_count: 0 };
    }

    fn process_normal_state(&mut self, byte: u8, backslash_count: usize) {
        match byte {
            b'\\' => {
                self.state = ScanState::Normal {
                    backslash_count: backslash_count + 1,
                };
            }
            b'{' => {
                self.state = ScanState::SeenLBrace {
                    pos: self.pos,
                    backslash_count,
                };
            }
            _ => {
                if byte == b'\n' {
                    self.line += 1;
                }
                self.state = ScanState::Normal { backslash_count: 0 };
            }
        }
        self.pos += 1;
    }

    /// Returns false if the byte must be reprocessed in Normal state
    fn process_seen_lbrace(&mut self, byte: u8, lbrace_pos: usize, backslash_count: usize) -> bool {
        if byte == b'{' {
            self.state = ScanState::InToken {
                start: lbrace_pos,
                content_start: self.pos + 1,
                backslash_count,
                line: self.line,
            };
            self.pos += 1;
            true
        } else {
            self.state = ScanState::Normal { backslash_count: 0 };
            false
        }
    }

    fn process_in_token(
        &mut self,
        byte: u8,
        start: usize,
        content_start: usize,
        backslash_count: usize,
        line: usize,
    ) {
        if byte == b'}' {
            self.state = ScanState::SeenRBrace {
                start,
                content_start,
                rbrace_pos: self.pos,
                backslash_count,
                line,
            };
        } else if byte == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
    }

    /// Returns the completed token, if `}}` closed here
    fn process_seen_rbrace(
        &mut self,
        byte: u8,
        start: usize,
        content_start: usize,
        rbrace_pos: usize,
        backslash_count: usize,
        line: usize,
    ) -> Option<Token> {
        if byte == b'}' {
            let content = String::from_utf8_lossy(&self.bytes[content_start..rbrace_pos]).into_owned();
            let token = Token {
                content,
                start,
                length: self.pos + 1 - start,
                backslash_count,
                line,
            };
            self.state = ScanState::Normal { backslash_count: 0 };
            self.pos += 1;
            Some(token)
        } else {
            // A lone `}` inside the token: reprocess this byte as token content
            self.state = ScanState::InToken {
                start,
                content_start,
                backslash_count,
                line,
            };
            None
        }
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        const MAX_STEPS_MULTIPLIER: usize = 3;
        let max_steps = self.bytes.len().saturating_mul(MAX_STEPS_MULTIPLIER);

        loop {
            if !self.should_continue(max_steps) {
                self.finish();
                return None;
            }

            let byte = self.bytes[self.pos];

            match self.state.clone() {
                ScanState::Normal { backslash_count } => {
                    self.process_normal_state(byte, backslash_count)
                }
                ScanState::SeenLBrace {
                    pos,
                    backslash_count,
                } => {
                    self.process_seen_lbrace(byte, pos, backslash_count);
                }
                ScanState::InToken {
                    start,
                    content_start,
                    backslash_count,
                    line,
                } => self.process_in_token(byte, start, content_start, backslash_count, line),
                ScanState::SeenRBrace {
                    start,
                    content_start,
                    rbrace_pos,
                    backslash_count,
                    line,
                } => {
                    if let Some(token) = self.process_seen_rbrace(
                        byte,
                        start,
                        content_start,
                        rbrace_pos,
                        backslash_count,
                        line,
                    ) {
                        return Some(token);
                    }
                }
            }
        }
    }
}
