use tracing::{debug, warn};

use crate::{
    error::{CompileError, CompileResult},
    lexer::token::{Token, TokenKind},
    parser::ast::{
        Assignment, BinaryExpression, BinaryExpressionKind, Block, CallExpression, Expression,
        ForInit, ForStatement, Function, Identifier, IfStatement, NumberLiteral, Parameter,
        Position, Program, ReturnStatement, Statement, Type, UnaryExpression, UnaryExpressionKind,
        VariableDeclaration, WhileStatement,
    },
};

/// How the parser reacts to a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// The first error aborts the parse.
    #[default]
    FailFast,
    /// Each error is recorded, one token is skipped and parsing resumes. The
    /// parse still fails if anything was recorded.
    Recover,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    mode: ParseMode,
    errors: Vec<CompileError>,
    reported_end: bool,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>, mode: ParseMode) -> Parser {
        if !tokens.last().is_some_and(|t| t.is(TokenKind::EndOfInput)) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenKind::EndOfInput, "", line, 0));
        }

        Parser {
            tokens,
            pos: 0,
            mode,
            errors: vec![],
            reported_end: false,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn check_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|kind| self.check(*kind))
    }

    fn is_next(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if self.check_many(kinds) {
            return Some(self.advance());
        }
        None
    }

    fn consume(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.error(format!("expected {}", kind)))
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        let token = self.current();
        if token.is(TokenKind::EndOfInput) {
            let (line, column) = self.end_position();
            return CompileError::syntax(
                format!("{}, found end of input", message.into()),
                line,
                column,
            );
        }

        CompileError::syntax(
            format!("{}, found {} '{}'", message.into(), token.kind, token.text),
            token.line,
            token.column,
        )
    }

    /// Just past the last real token; the end marker itself carries column 0.
    fn end_position(&self) -> (usize, usize) {
        let end = self.current();
        self.tokens
            .iter()
            .rev()
            .find(|token| !token.is(TokenKind::EndOfInput))
            .map_or((end.line, end.column), |last| {
                (last.line, last.column + last.text.len())
            })
    }

    /// Records `err` in recovery mode and skips the offending token, or hands
    /// it back in fail-fast mode.
    fn recover(&mut self, err: CompileError) -> CompileResult<()> {
        match self.mode {
            ParseMode::FailFast => Err(err),
            ParseMode::Recover => {
                // Once input is exhausted every enclosing rule fails in turn;
                // only the first of those errors is kept.
                let at_end = self.check(TokenKind::EndOfInput);
                if at_end && self.reported_end {
                    debug!(%err, "dropping cascaded error at end of input");
                    return Ok(());
                }
                self.reported_end |= at_end;

                warn!(%err, "recovering from syntax error");
                self.errors.push(err);
                self.advance();
                Ok(())
            }
        }
    }

    pub fn parse(&mut self) -> CompileResult<Program> {
        let mut functions = vec![];

        if self.check(TokenKind::EndOfInput) {
            return Err(self.error("expected at least one function"));
        }

        while !self.check(TokenKind::EndOfInput) {
            match self.parse_function() {
                Ok(func) => functions.push(func),
                Err(err) => {
                    self.recover(err)?;
                    while !self.check(TokenKind::EndOfInput) && !self.current().kind.is_type() {
                        self.advance();
                    }
                }
            }
        }

        match self.errors.len() {
            0 => {
                debug!(functions = functions.len(), "parsed program");
                Ok(Program { functions })
            }
            1 => Err(self.errors.remove(0)),
            _ => Err(CompileError::Multiple(std::mem::take(&mut self.errors))),
        }
    }

    fn parse_type(&mut self) -> CompileResult<Type> {
        if self.is_next(&[TokenKind::TypeInt]).is_some() {
            Ok(Type::Int)
        } else if self.is_next(&[TokenKind::TypeFloat]).is_some() {
            Ok(Type::Float)
        } else {
            Err(self.error("expected type (int or float)"))
        }
    }

    fn parse_function(&mut self) -> CompileResult<Function> {
        let position = Position::from(self.current());
        let return_type = self.parse_type()?;
        let name = self.consume(TokenKind::Identifier)?.text;

        self.consume(TokenKind::LParen)?;
        let params = if self.check(TokenKind::RParen) {
            vec![]
        } else {
            self.parse_param_list()?
        };
        self.consume(TokenKind::RParen)?;

        let body = self.parse_block()?;

        Ok(Function {
            return_type,
            name,
            params,
            body,
            position,
        })
    }

    fn parse_param_list(&mut self) -> CompileResult<Vec<Parameter>> {
        let mut params = vec![];
        loop {
            let position = Position::from(self.current());
            let _type = self.parse_type()?;
            let name = self.consume(TokenKind::Identifier)?.text;
            params.push(Parameter {
                _type,
                name,
                position,
            });

            if self.is_next(&[TokenKind::Comma]).is_none() {
                break;
            }
        }
        Ok(params)
    }

    fn parse_block(&mut self) -> CompileResult<Block> {
        self.consume(TokenKind::LBrace)?;

        let mut statements = vec![];
        while !self.check_many(&[TokenKind::RBrace, TokenKind::EndOfInput]) {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => self.recover(err)?,
            }
        }

        self.consume(TokenKind::RBrace)?;
        Ok(Block { statements })
    }

    fn parse_statement(&mut self) -> CompileResult<Statement> {
        let kind = self.current().kind;
        match kind {
            TokenKind::TypeInt | TokenKind::TypeFloat => {
                let decl = self.parse_variable_declaration()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Statement::VarDecl(decl))
            }
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Identifier => {
                let stmt = match self.try_assignment()? {
                    Some(assign) => Statement::Assign(assign),
                    None => Statement::Expression(self.parse_expression()?),
                };
                self.consume(TokenKind::Semicolon)?;
                Ok(stmt)
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Statement::Expression(expr))
            }
        }
    }

    /// Speculatively reads `ID '=' expr`. When the identifier is not followed
    /// by `=`, the cursor is restored and `None` signals the caller to parse
    /// an expression statement instead.
    fn try_assignment(&mut self) -> CompileResult<Option<Assignment>> {
        let saved = self.pos;
        let name = self.consume(TokenKind::Identifier)?;

        if self.is_next(&[TokenKind::Assign]).is_none() {
            self.pos = saved;
            return Ok(None);
        }

        let value = self.parse_expression()?;
        Ok(Some(Assignment {
            position: Position::from(&name),
            name: name.text,
            value,
        }))
    }

    fn parse_assignment(&mut self) -> CompileResult<Assignment> {
        let name = self.consume(TokenKind::Identifier)?;
        self.consume(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        Ok(Assignment {
            position: Position::from(&name),
            name: name.text,
            value,
        })
    }

    fn parse_variable_declaration(&mut self) -> CompileResult<VariableDeclaration> {
        let position = Position::from(self.current());
        let _type = self.parse_type()?;
        let name = self.consume(TokenKind::Identifier)?.text;

        let init = if self.is_next(&[TokenKind::Assign]).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(VariableDeclaration {
            _type,
            name,
            init,
            position,
        })
    }

    fn parse_return_statement(&mut self) -> CompileResult<Statement> {
        let keyword = self.consume(TokenKind::Return)?;
        let value = self.parse_expression()?;
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Return(ReturnStatement {
            value,
            position: Position::from(&keyword),
        }))
    }

    fn parse_condition(&mut self) -> CompileResult<Expression> {
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        Ok(condition)
    }

    fn parse_if_statement(&mut self) -> CompileResult<Statement> {
        self.consume(TokenKind::If)?;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.is_next(&[TokenKind::Else]).is_some() {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            condition,
            then_branch,
            else_branch,
        }))
    }

    fn parse_while_statement(&mut self) -> CompileResult<Statement> {
        self.consume(TokenKind::While)?;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        Ok(Statement::While(WhileStatement { condition, body }))
    }

    fn parse_for_statement(&mut self) -> CompileResult<Statement> {
        self.consume(TokenKind::For)?;
        self.consume(TokenKind::LParen)?;

        let init = if self.current().kind.is_type() {
            ForInit::VarDecl(self.parse_variable_declaration()?)
        } else {
            ForInit::Assign(self.parse_assignment()?)
        };
        self.consume(TokenKind::Semicolon)?;

        let condition = self.parse_expression()?;
        self.consume(TokenKind::Semicolon)?;

        let step = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;

        let body = self.parse_block()?;

        Ok(Statement::For(ForStatement {
            init,
            condition,
            step,
            body,
        }))
    }

    fn parse_expression(&mut self) -> CompileResult<Expression> {
        self.term()
    }

    fn term(&mut self) -> CompileResult<Expression> {
        let mut result = self.factor()?;
        while let Some(op) = self.is_next(&[TokenKind::Plus, TokenKind::Minus]) {
            let kind = match op.kind {
                TokenKind::Plus => BinaryExpressionKind::Add,
                TokenKind::Minus => BinaryExpressionKind::Sub,
                _ => unreachable!(),
            };
            result = Expression::Binary(BinaryExpression {
                kind,
                lhs: result.into(),
                rhs: self.factor()?.into(),
                position: Position::from(&op),
            });
        }
        Ok(result)
    }

    fn factor(&mut self) -> CompileResult<Expression> {
        let mut result = self.unary()?;
        while let Some(op) = self.is_next(&[TokenKind::Star, TokenKind::Slash]) {
            let kind = match op.kind {
                TokenKind::Star => BinaryExpressionKind::Mul,
                TokenKind::Slash => BinaryExpressionKind::Div,
                _ => unreachable!(),
            };
            result = Expression::Binary(BinaryExpression {
                kind,
                lhs: result.into(),
                rhs: self.unary()?.into(),
                position: Position::from(&op),
            });
        }
        Ok(result)
    }

    fn unary(&mut self) -> CompileResult<Expression> {
        if let Some(op) = self.is_next(&[TokenKind::Plus, TokenKind::Minus]) {
            let expr = self.unary()?;
            return Ok(Expression::Unary(UnaryExpression {
                kind: match op.kind {
                    TokenKind::Plus => UnaryExpressionKind::Plus,
                    TokenKind::Minus => UnaryExpressionKind::Negate,
                    _ => unreachable!(),
                },
                expr: expr.into(),
                position: Position::from(&op),
            }));
        }
        self.primary()
    }

    fn primary(&mut self) -> CompileResult<Expression> {
        if let Some(number) = self.is_next(&[TokenKind::Number]) {
            Ok(Expression::Number(NumberLiteral {
                position: Position::from(&number),
                text: number.text,
            }))
        } else if self.check(TokenKind::Identifier) && self.peek(1).is(TokenKind::LParen) {
            self.call()
        } else if let Some(ident) = self.is_next(&[TokenKind::Identifier]) {
            Ok(Expression::Identifier(Identifier {
                position: Position::from(&ident),
                name: ident.text,
            }))
        } else if self.is_next(&[TokenKind::LParen]).is_some() {
            let expr = self.parse_expression()?;
            self.consume(TokenKind::RParen)?;
            Ok(expr)
        } else {
            Err(self.error("expected number, identifier or '('"))
        }
    }

    fn call(&mut self) -> CompileResult<Expression> {
        let name = self.consume(TokenKind::Identifier)?;
        self.consume(TokenKind::LParen)?;

        let mut args = vec![];
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.is_next(&[TokenKind::Comma]).is_none() {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;

        Ok(Expression::Call(CallExpression {
            position: Position::from(&name),
            name: name.text,
            args,
        }))
    }
}

pub fn parse(tokens: Vec<Token>, mode: ParseMode) -> CompileResult<Program> {
    Parser::new(tokens, mode).parse()
}
