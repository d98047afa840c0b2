// Copyright (c) ZeroC, Inc.

use super::lexer::Lexer;
use super::tokens::{Token, TokenKind};
use crate::diagnostics::{Error, ErrorKind};
use crate::grammar::{Directive, Statement};
use crate::script_file::{Location, ScriptSource, Span};
use crate::substitutor::placeholder_marker;

use std::collections::HashMap;

/// Splits a script's token stream into an ordered list of [Statements](Statement), extracting the
/// directives embedded in its comments along the way.
///
/// Each extracted directive is replaced in the statement text by a freshly generated `{#N}`
/// placeholder marker and recorded in the statement's placeholder map under that id. Runs of
/// whitespace, newlines, and directive-free comments collapse into a single space once a
/// statement has begun; leading and trailing runs are discarded.
pub struct Parser<'a> {
    file_name: &'a str,
    lexer: Lexer<'a>,

    /// The end location of the most recently consumed token. Used to close directive spans.
    last_location: Location,

    /// Counter backing placeholder id generation. Ids are unique within one parsed script.
    next_placeholder: usize,
}

/// Accumulates one statement: its text (with collapsed whitespace and placeholder markers),
/// its placeholder map, and the location that should be recorded as the statement's origin.
#[derive(Debug, Default)]
struct StatementBuilder {
    text: String,
    directives: HashMap<String, Directive>,

    /// True once any content has been written into `text`.
    begun: bool,

    /// True while a whitespace run is waiting to be collapsed into a single space.
    /// The space only materializes when further content follows it.
    pending_space: bool,

    /// The location of the first ordinary (non-whitespace, non-directive) token.
    start: Option<Location>,

    /// The location of the first directive, used as the origin of directive-only statements.
    directive_start: Option<Location>,
}

impl StatementBuilder {
    fn push_text(&mut self, lexeme: &str, location: Location) {
        if self.begun && self.pending_space {
            self.text.push(' ');
        }
        self.text.push_str(lexeme);
        self.begun = true;
        self.pending_space = false;
        if self.start.is_none() {
            self.start = Some(location);
        }
    }

    fn push_space(&mut self) {
        if self.begun {
            self.pending_space = true;
        }
    }

    fn push_placeholder(&mut self, id: String, directive: Directive) {
        if self.begun && self.pending_space {
            self.text.push(' ');
        }
        if self.directive_start.is_none() {
            self.directive_start = Some(directive.span.start);
        }
        self.text.push_str(&placeholder_marker(&id));
        self.begun = true;
        self.pending_space = true;
        self.directives.insert(id, directive);
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a ScriptSource) -> Self {
        Parser {
            file_name: &source.name,
            lexer: Lexer::new(&source.text, &source.terminator),
            last_location: Location::default(),
            next_placeholder: 0,
        }
    }

    /// Parses a script source into its ordered list of statements.
    pub fn parse(source: &'a ScriptSource) -> Result<Vec<Statement>, Error> {
        let mut parser = Parser::new(source);
        let mut statements = Vec::new();
        while let Some(statement) = parser.parse_statement()? {
            statements.push(statement);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Option<Statement>, Error> {
        let mut builder = StatementBuilder::default();
        loop {
            let (start, kind, end) = self.next()?;
            match kind {
                TokenKind::EndOfFile => {
                    return match builder.is_empty() {
                        true => Ok(None),
                        false => Ok(Some(self.finish_statement(builder, end))),
                    };
                }
                TokenKind::StatementTerminator(_) => {
                    // A terminator with nothing accumulated yet separates nothing; no empty
                    // statement is emitted for it.
                    if !builder.is_empty() {
                        return Ok(Some(self.finish_statement(builder, end)));
                    }
                }
                TokenKind::Whitespace(_) | TokenKind::EndOfLine => builder.push_space(),
                TokenKind::LineCommentStart => self.parse_line_directive(&mut builder, start)?,
                TokenKind::BlockStart => self.parse_block_directive(&mut builder, start)?,
                other => builder.push_text(other.lexeme(), start),
            }
        }
    }

    fn finish_statement(&self, builder: StatementBuilder, end: Location) -> Statement {
        // Statements holding only directives fall back to the first directive's location.
        let start = builder.start.or(builder.directive_start).unwrap_or_default();
        Statement {
            text: builder.text,
            span: Span::new(start, end, self.file_name),
            directives: builder.directives,
        }
    }

    /// Parses the remainder of a `-- #Name[: arg, arg, ...]` comment. The lexer only emits
    /// [TokenKind::LineCommentStart] when a directive header follows, but mismatches past the
    /// header still fall back to plain-comment handling until the '#' commits the form.
    fn parse_line_directive(&mut self, builder: &mut StatementBuilder, trigger: Location) -> Result<(), Error> {
        self.lexer.set_filter_whitespace(true);
        let result = self.parse_line_directive_inner(builder, trigger);
        self.lexer.set_filter_whitespace(false);
        result
    }

    fn parse_line_directive_inner(&mut self, builder: &mut StatementBuilder, trigger: Location) -> Result<(), Error> {
        // Skip any decorative extra "--" runs before the '#'.
        let mut token = self.next()?;
        while matches!(token.1, TokenKind::LineCommentStart) {
            token = self.next()?;
        }

        if !matches!(token.1, TokenKind::Hash) {
            // Not a directive after all: consume the rest of the line as a comment.
            let mut kind = token.1;
            while !matches!(kind, TokenKind::EndOfLine | TokenKind::EndOfFile) {
                kind = self.next()?.1;
            }
            builder.push_space();
            return Ok(());
        }

        let name = self.expect_directive_name()?;
        let arguments = self.parse_line_directive_arguments()?;
        let span = Span::new(trigger, self.last_location, self.file_name);
        self.emit_directive(builder, name, arguments, span);
        Ok(())
    }

    fn parse_line_directive_arguments(&mut self) -> Result<Vec<String>, Error> {
        let (start, kind, end) = self.next()?;
        match kind {
            TokenKind::EndOfLine | TokenKind::EndOfFile => Ok(Vec::new()),
            TokenKind::Colon => {
                let mut arguments = Vec::new();
                loop {
                    // Expect an argument...
                    let (start, kind, end) = self.next()?;
                    let value = match kind {
                        TokenKind::Word(word) => word.to_owned(),
                        TokenKind::SingleQuoted { value, .. } | TokenKind::DoubleQuoted { value, .. } => value,
                        other => {
                            let message = format!("expected a directive argument, found {other}");
                            return Err(self.syntax_error(message, start, end));
                        }
                    };
                    arguments.push(value);

                    // ...then a comma, or the end of the line.
                    let (start, kind, end) = self.next()?;
                    match kind {
                        TokenKind::Comma => continue,
                        TokenKind::EndOfLine | TokenKind::EndOfFile => return Ok(arguments),
                        other => {
                            let message = format!("expected ',' or end of line, found {other}");
                            return Err(self.syntax_error(message, start, end));
                        }
                    }
                }
            }
            other => {
                let message = format!("expected ':' or end of line after the directive name, found {other}");
                Err(self.syntax_error(message, start, end))
            }
        }
    }

    /// Parses the remainder of a `/* ** #Name[: arg, arg, ...] */` comment.
    fn parse_block_directive(&mut self, builder: &mut StatementBuilder, trigger: Location) -> Result<(), Error> {
        self.lexer.set_filter_whitespace(true);
        let result = self.parse_block_directive_inner(builder, trigger);
        self.lexer.set_filter_whitespace(false);
        result
    }

    fn parse_block_directive_inner(&mut self, builder: &mut StatementBuilder, trigger: Location) -> Result<(), Error> {
        let mut token = self.next()?;
        while matches!(token.1, TokenKind::EndOfLine) {
            token = self.next()?;
        }
        if !matches!(token.1, TokenKind::DoubleStar) {
            return self.consume_plain_block_comment(builder, token, trigger);
        }

        let mut token = self.next()?;
        while matches!(token.1, TokenKind::EndOfLine) {
            token = self.next()?;
        }
        if !matches!(token.1, TokenKind::Hash) {
            return self.consume_plain_block_comment(builder, token, trigger);
        }

        let name = self.expect_directive_name()?;
        let arguments = self.parse_block_directive_arguments()?;
        let span = Span::new(trigger, self.last_location, self.file_name);
        self.emit_directive(builder, name, arguments, span);
        Ok(())
    }

    fn parse_block_directive_arguments(&mut self) -> Result<Vec<String>, Error> {
        let (start, kind, end) = self.next_skipping_newlines()?;
        match kind {
            TokenKind::BlockStop => Ok(Vec::new()),
            TokenKind::Colon => {
                let mut arguments = Vec::new();
                loop {
                    // Expect an argument. Bare '#' tokens prefix a '#' onto the value that
                    // directly follows them, so table names like #Temp stay expressible.
                    let mut token = self.next_skipping_newlines()?;
                    let mut prefix = String::new();
                    while matches!(token.1, TokenKind::Hash) {
                        prefix.push('#');
                        token = self.next()?;
                    }
                    let (start, kind, end) = token;
                    let value = match kind {
                        TokenKind::Word(word) => word.to_owned(),
                        TokenKind::SingleQuoted { value, .. }
                        | TokenKind::DoubleQuoted { value, .. }
                        | TokenKind::MultilineQuoted { value, .. } => value,
                        other => {
                            let message = format!("expected a directive argument, found {other}");
                            return Err(self.syntax_error(message, start, end));
                        }
                    };
                    arguments.push(prefix + &value);

                    // ...then a comma, or the end of the comment.
                    let (start, kind, end) = self.next_skipping_newlines()?;
                    match kind {
                        TokenKind::Comma => continue,
                        TokenKind::BlockStop => return Ok(arguments),
                        other => {
                            let message = format!("expected ',' or '*/', found {other}");
                            return Err(self.syntax_error(message, start, end));
                        }
                    }
                }
            }
            other => {
                let message = format!("expected ':' or '*/' after the directive name, found {other}");
                Err(self.syntax_error(message, start, end))
            }
        }
    }

    /// Consumes a block comment that turned out not to hold a directive, through its "*/".
    fn consume_plain_block_comment(
        &mut self,
        builder: &mut StatementBuilder,
        mut token: Token<'a>,
        trigger: Location,
    ) -> Result<(), Error> {
        loop {
            match token.1 {
                TokenKind::BlockStop => {
                    builder.push_space();
                    return Ok(());
                }
                TokenKind::EndOfFile => {
                    return Err(self.syntax_error("unterminated block comment".to_owned(), trigger, token.0));
                }
                _ => token = self.next()?,
            }
        }
    }

    fn expect_directive_name(&mut self) -> Result<String, Error> {
        let (start, kind, end) = self.next()?;
        match kind {
            TokenKind::Word(name) => Ok(name.to_owned()),
            other => {
                let message = format!("expected a directive name, found {other}");
                Err(self.syntax_error(message, start, end))
            }
        }
    }

    fn emit_directive(&mut self, builder: &mut StatementBuilder, name: String, arguments: Vec<String>, span: Span) {
        let id = format!("#{}", self.next_placeholder);
        self.next_placeholder += 1;
        builder.push_placeholder(id, Directive::new(name, arguments, span));
    }

    /// Consumes and returns the next token, converting lexical errors into syntax errors.
    fn next(&mut self) -> Result<Token<'a>, Error> {
        match self.lexer.next_token() {
            Ok(token) => {
                self.last_location = token.2;
                Ok(token)
            }
            Err((start, error, end)) => {
                let message = error.to_string();
                Err(self.syntax_error(message, start, end))
            }
        }
    }

    fn next_skipping_newlines(&mut self) -> Result<Token<'a>, Error> {
        loop {
            let token = self.next()?;
            if !matches!(token.1, TokenKind::EndOfLine) {
                return Ok(token);
            }
        }
    }

    fn syntax_error(&self, message: String, start: Location, end: Location) -> Error {
        Error::new(ErrorKind::Syntax { message }).set_span(&Span::new(start, end, self.file_name))
    }
}
