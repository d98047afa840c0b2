// Copyright (c) ZeroC, Inc.

use super::tokens::*;
use crate::script_file::Location;

use std::iter::Peekable;
use std::str::CharIndices;

type LexerResult<'a> = Result<Token<'a>, Error>;

/// Converts the text of one script source into a stream of script tokens.
///
/// This token stream is in turn consumed by the [script parser](super::parser::Parser), which
/// splits it into statements and extracts the directives embedded in comments.
#[derive(Debug)]
pub struct Lexer<'input> {
    /// The full text of the script this lexer is operating on.
    source: &'input str,

    /// Iterator over the characters in the source.
    /// This is what the lexer actually operates on, by peeking at and consuming codepoints from this buffer.
    buffer: Peekable<CharIndices<'input>>,

    /// The lexer's current [`Location`](crate::script_file::Location) in the script.
    /// Used to tag tokens with their starting and ending locations in the source input.
    cursor: Location,

    /// The statement terminator to recognize. Validated by the caller to be non-empty and free of
    /// significant characters and whitespace.
    terminator: &'input str,

    /// The first character of the terminator, checked against before every token.
    terminator_start: char,

    /// While true, [Whitespace](TokenKind::Whitespace) tokens are skipped instead of returned.
    /// The parser sets this while it's inside a directive header, where whitespace is insignificant.
    filter_whitespace: bool,
}

impl<'input> Lexer<'input> {
    pub fn new(source: &'input str, terminator: &'input str) -> Self {
        debug_assert!(!terminator.is_empty());

        Lexer {
            source,
            buffer: source.char_indices().peekable(),
            cursor: Location::default(),
            terminator,
            terminator_start: terminator.chars().next().unwrap_or(';'),
            filter_whitespace: false,
        }
    }

    /// Enables or disables transparent skipping of whitespace tokens.
    pub fn set_filter_whitespace(&mut self, enabled: bool) {
        self.filter_whitespace = enabled;
    }

    /// Attempts to lex and return the next token in the source.
    /// Once the end of the input is reached, every subsequent call returns an
    /// [EndOfFile](TokenKind::EndOfFile) token.
    pub fn next_token(&mut self) -> LexerResult<'input> {
        loop {
            let start_location = self.cursor;
            let start_position = self.get_position();

            let Some((_, c)) = self.buffer.peek().copied() else {
                return Ok((start_location, TokenKind::EndOfFile, start_location));
            };

            // Newlines are checked before anything else so that line counting stays exact.
            if c == '\n' {
                self.advance_buffer();
                return Ok((start_location, TokenKind::EndOfLine, self.cursor));
            }
            if c == '\r' {
                self.buffer.next(); // Consume the '\r' without any cursor arithmetic.
                if matches!(self.buffer.peek(), Some((_, '\n'))) {
                    self.advance_buffer(); // The '\n' moves the cursor to the next row.
                } else {
                    self.cursor.row += 1;
                    self.cursor.col = 1;
                }
                return Ok((start_location, TokenKind::EndOfLine, self.cursor));
            }

            // The statement terminator takes precedence over ordinary word characters.
            if c == self.terminator_start {
                let token = self.lex_terminator(start_position);
                return Ok((start_location, token, self.cursor));
            }

            match c {
                ',' => return Ok(self.return_simple_token(TokenKind::Comma, start_location)),
                ':' => return Ok(self.return_simple_token(TokenKind::Colon, start_location)),
                '#' => return Ok(self.return_simple_token(TokenKind::Hash, start_location)),
                '-' => {
                    self.advance_buffer(); // Consume the '-' character.
                    let token = if matches!(self.buffer.peek(), Some((_, '-'))) {
                        self.advance_buffer(); // Consume the second '-' character.
                        if self.line_directive_follows() {
                            TokenKind::LineCommentStart
                        } else {
                            // An ordinary comment. Swallow it whole so its content (which may
                            // contain stray quotes) is never tokenized.
                            self.advance_to_end_of_line();
                            TokenKind::Whitespace(self.slice_from(start_position))
                        }
                    } else {
                        TokenKind::Word(self.slice_from(start_position))
                    };
                    return Ok((start_location, token, self.cursor));
                }
                '/' => {
                    self.advance_buffer(); // Consume the '/' character.
                    let token = if matches!(self.buffer.peek(), Some((_, '*'))) {
                        self.advance_buffer(); // Consume the '*' character.
                        if self.block_directive_follows() {
                            TokenKind::BlockStart
                        } else {
                            // An ordinary block comment. Swallow it whole, like line comments.
                            match self.consume_block_comment() {
                                Ok(()) => TokenKind::Whitespace(self.slice_from(start_position)),
                                Err(error) => return Err((start_location, error, self.cursor)),
                            }
                        }
                    } else {
                        TokenKind::Word(self.slice_from(start_position))
                    };
                    return Ok((start_location, token, self.cursor));
                }
                '*' => {
                    self.advance_buffer(); // Consume the '*' character.
                    let token = match self.buffer.peek() {
                        Some((_, '/')) => {
                            self.advance_buffer();
                            TokenKind::BlockStop
                        }
                        Some((_, '*')) => {
                            self.advance_buffer();
                            TokenKind::DoubleStar
                        }
                        _ => TokenKind::Word(self.slice_from(start_position)),
                    };
                    return Ok((start_location, token, self.cursor));
                }
                quote @ ('\'' | '"') => {
                    return match self.lex_string(quote) {
                        Ok(token) => Ok((start_location, token, self.cursor)),
                        Err(error) => Err((start_location, error, self.cursor)),
                    };
                }
                _ if is_inline_whitespace(c) => {
                    let token = self.lex_whitespace(start_position);
                    if self.filter_whitespace {
                        continue; // Skip the token and lex the next one.
                    }
                    return Ok((start_location, token, self.cursor));
                }
                _ => {
                    let token = self.lex_word(start_position);
                    return Ok((start_location, token, self.cursor));
                }
            }
        }
    }

    /// Returns the lexer's position in the source buffer, in bytes.
    fn get_position(&mut self) -> usize {
        if let Some((i, _)) = self.buffer.peek() {
            *i
        } else {
            // `None` means we're at the end of the buffer.
            self.source.len()
        }
    }

    /// Returns the slice of source text from `start_position` to the lexer's current position.
    fn slice_from(&mut self, start_position: usize) -> &'input str {
        let end_position = self.get_position();
        &self.source[start_position..end_position]
    }

    /// Consumes the next character in the buffer and moves the lexer's cursor forward accordingly.
    fn advance_buffer(&mut self) {
        // Consume the next character and check if it's a newline.
        if let Some((_, c)) = self.buffer.next() {
            if c == '\n' {
                self.cursor.row += 1;
                self.cursor.col = 1;
            } else {
                self.cursor.col += 1;
            }
        }
    }

    /// Consumes a single character from the lexer's buffer and returns a token of the specified kind.
    /// This is a convenience function for the common case where a token's lexeme is a single character.
    fn return_simple_token(&mut self, token: TokenKind<'input>, start: Location) -> Token<'input> {
        self.advance_buffer(); // Consume the token from the buffer.
        (start, token, self.cursor)
    }

    /// Attempts to read the full statement terminator from the buffer.
    /// A partial match becomes a [Word](TokenKind::Word) holding the matched prefix; scanning then
    /// resumes at the first character that broke the match.
    fn lex_terminator(&mut self, start_position: usize) -> TokenKind<'input> {
        let mut matched = 0;
        for expected in self.terminator.chars() {
            match self.buffer.peek() {
                Some((_, c)) if *c == expected => {
                    self.advance_buffer();
                    matched += 1;
                }
                _ => break,
            }
        }

        let lexeme = self.slice_from(start_position);
        if matched == self.terminator.chars().count() {
            TokenKind::StatementTerminator(lexeme)
        } else {
            TokenKind::Word(lexeme)
        }
    }

    /// Checks whether a line directive header follows the "--" the lexer just consumed: optional
    /// whitespace and decorative extra dashes, then a '#'. Looks ahead without consuming anything.
    fn line_directive_follows(&self) -> bool {
        let mut lookahead = self.buffer.clone();
        loop {
            match lookahead.next() {
                Some((_, c)) if is_inline_whitespace(c) || c == '-' => continue,
                Some((_, '#')) => return true,
                _ => return false,
            }
        }
    }

    /// Checks whether a block directive header follows the "/*" the lexer just consumed:
    /// optional whitespace, "**", optional whitespace, then a '#'. Looks ahead without consuming.
    fn block_directive_follows(&self) -> bool {
        let mut lookahead = self.buffer.clone();

        let mut next = lookahead.next();
        while matches!(next, Some((_, c)) if c.is_whitespace()) {
            next = lookahead.next();
        }
        if !matches!(next, Some((_, '*'))) || !matches!(lookahead.next(), Some((_, '*'))) {
            return false;
        }

        let mut next = lookahead.next();
        while matches!(next, Some((_, c)) if c.is_whitespace()) {
            next = lookahead.next();
        }
        matches!(next, Some((_, '#')))
    }

    /// Consumes characters in the buffer until end-of-line (doesn't consume the EOL) or end-of-buffer is reached.
    fn advance_to_end_of_line(&mut self) {
        // Loop until the next character is a newline.
        while matches!(self.buffer.peek(), Some((_, c)) if *c != '\n' && *c != '\r') {
            self.advance_buffer(); // Consume the character.
        }
    }

    /// Reads and consumes a block comment from the buffer, ignoring it.
    /// This function expects the lexer's cursor to be immediately after the opening "/*".
    fn consume_block_comment(&mut self) -> Result<(), ErrorKind> {
        let mut last_character_was_an_asterisk = false;

        while let Some((_, c)) = self.buffer.peek().copied() {
            self.advance_buffer(); // Consume the character.
            match c {
                '/' if last_character_was_an_asterisk => return Ok(()),
                '*' => last_character_was_an_asterisk = true,
                _ => last_character_was_an_asterisk = false,
            }
        }

        // Reaching this means we hit the end of the buffer before the end of the block comment.
        Err(ErrorKind::UnterminatedBlockComment)
    }

    /// Reads, consumes, and returns a run of non-newline whitespace from the buffer.
    fn lex_whitespace(&mut self, start_position: usize) -> TokenKind<'input> {
        while matches!(self.buffer.peek(), Some((_, c)) if is_inline_whitespace(*c)) {
            self.advance_buffer(); // Consume the character.
        }
        TokenKind::Whitespace(self.slice_from(start_position))
    }

    /// Reads, consumes, and returns a run of word characters from the buffer.
    fn lex_word(&mut self, start_position: usize) -> TokenKind<'input> {
        loop {
            let Some((_, c)) = self.buffer.peek().copied() else {
                break;
            };
            if !self.is_word_character(c) {
                break;
            }
            self.advance_buffer(); // Consume the character.
        }
        TokenKind::Word(self.slice_from(start_position))
    }

    fn is_word_character(&self, c: char) -> bool {
        !c.is_whitespace() && !SIGNIFICANT_CHARACTERS.contains(&c) && c != self.terminator_start
    }

    /// Reads, consumes, and returns a string literal from the buffer.
    ///
    /// This function expects the lexer's cursor to be immediately before the opening quote.
    /// An opening quote tripled opens a multiline string; a doubled opening quote followed by
    /// anything else is an empty string.
    fn lex_string(&mut self, quote: char) -> Result<TokenKind<'input>, ErrorKind> {
        let start_position = self.get_position();
        self.advance_buffer(); // Consume the opening quotation mark.

        if matches!(self.buffer.peek(), Some((_, c)) if *c == quote) {
            self.advance_buffer(); // Consume the second quotation mark.
            if matches!(self.buffer.peek(), Some((_, c)) if *c == quote) {
                self.advance_buffer(); // Consume the third quotation mark.
                return self.lex_multiline_string(quote, start_position);
            }
            // A doubled quote with no third is an empty single-line string.
            let raw = self.slice_from(start_position);
            return Ok(single_line_string(quote, raw, String::new()));
        }

        let mut value = String::new();
        loop {
            match self.buffer.peek().copied() {
                // String literals must be closed before end of input, and single-line string
                // literals cannot contain bare newlines.
                None | Some((_, '\n' | '\r')) => return Err(ErrorKind::UnterminatedString),
                Some((_, '\\')) => {
                    self.advance_buffer(); // Consume the backslash.
                    match self.buffer.peek().copied() {
                        Some((_, escaped)) => {
                            // The escaped character is emitted verbatim, with no interpretation.
                            value.push(escaped);
                            self.advance_buffer();
                        }
                        None => return Err(ErrorKind::UnterminatedString),
                    }
                }
                Some((_, c)) if c == quote => {
                    self.advance_buffer(); // Consume the closing quotation mark.
                    let raw = self.slice_from(start_position);
                    return Ok(single_line_string(quote, raw, value));
                }
                Some((_, c)) => {
                    value.push(c);
                    self.advance_buffer();
                }
            }
        }
    }

    /// Reads and consumes the remainder of a triple-quoted string.
    /// This function expects the lexer's cursor to be immediately after the opening delimiter.
    fn lex_multiline_string(&mut self, quote: char, start_position: usize) -> Result<TokenKind<'input>, ErrorKind> {
        let mut value = String::new();
        loop {
            match self.buffer.peek().copied() {
                None => return Err(ErrorKind::UnterminatedString),
                Some((_, '\\')) => {
                    self.advance_buffer(); // Consume the backslash.
                    match self.buffer.peek().copied() {
                        Some((_, escaped)) => {
                            value.push(escaped);
                            self.advance_buffer();
                        }
                        None => return Err(ErrorKind::UnterminatedString),
                    }
                }
                Some((_, c)) if c == quote => {
                    self.advance_buffer(); // Consume the quote and count how far the run goes.
                    if matches!(self.buffer.peek(), Some((_, c2)) if *c2 == quote) {
                        self.advance_buffer();
                        if matches!(self.buffer.peek(), Some((_, c3)) if *c3 == quote) {
                            self.advance_buffer(); // A tripled quote closes the string.
                            let raw = self.slice_from(start_position);
                            return Ok(TokenKind::MultilineQuoted { raw, value });
                        }
                        // A doubled quote escapes to a single quote character.
                        value.push(quote);
                    } else {
                        // A lone quote is ordinary content.
                        value.push(quote);
                    }
                }
                Some((_, c)) => {
                    value.push(c);
                    self.advance_buffer();
                }
            }
        }
    }
}

fn is_inline_whitespace(c: char) -> bool {
    c.is_whitespace() && c != '\n' && c != '\r'
}

fn single_line_string(quote: char, raw: &str, value: String) -> TokenKind<'_> {
    match quote {
        '\'' => TokenKind::SingleQuoted { raw, value },
        _ => TokenKind::DoubleQuoted { raw, value },
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = LexerResult<'input>;

    /// Attempts to lex and return the next token in this lexer's token stream.
    /// Returns `None` to indicate end-of-input, `Some(Ok(x))` to indicate success (where `x` is the next token),
    /// and `Some(Err(y))` to indicate an error occurred during lexing.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok((_, TokenKind::EndOfFile, _)) => None,
            other => Some(other),
        }
    }
}

// Allows string slices to be converted into `Lexer`s using the default statement terminator.
#[cfg(test)]
impl<'input> From<&'input str> for Lexer<'input> {
    fn from(s: &'input str) -> Self {
        Lexer::new(s, crate::script_file::DEFAULT_STATEMENT_TERMINATOR)
    }
}
