use std::fmt;

use crate::lexer::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Position {
        Position { line, column }
    }
}

impl From<&Token> for Position {
    fn from(token: &Token) -> Position {
        Position::new(token.line, token.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
}

impl Type {
    /// `Float` wins over `Int`.
    pub fn promote(lhs: Type, rhs: Type) -> Type {
        if lhs == Type::Float || rhs == Type::Float {
            Type::Float
        } else {
            Type::Int
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub return_type: Type,
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Block,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub _type: Type,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VarDecl(VariableDeclaration),
    Assign(Assignment),
    Return(ReturnStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Block(Block),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub _type: Type,
    pub name: String,
    pub init: Option<Expression>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expression,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Expression,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Block,
    pub else_branch: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub init: ForInit,
    pub condition: Expression,
    pub step: Expression,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl(VariableDeclaration),
    Assign(Assignment),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    Number(NumberLiteral),
    Identifier(Identifier),
    Call(CallExpression),
}

impl Expression {
    pub fn position(&self) -> Position {
        match self {
            Expression::Binary(binary) => binary.position,
            Expression::Unary(unary) => unary.position,
            Expression::Number(number) => number.position,
            Expression::Identifier(ident) => ident.position,
            Expression::Call(call) => call.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryExpressionKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryExpressionKind::Add => "+",
            BinaryExpressionKind::Sub => "-",
            BinaryExpressionKind::Mul => "*",
            BinaryExpressionKind::Div => "/",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub kind: BinaryExpressionKind,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryExpressionKind {
    Plus,
    Negate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub kind: UnaryExpressionKind,
    pub expr: Box<Expression>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub text: String,
    pub position: Position,
}

impl NumberLiteral {
    pub fn _type(&self) -> Type {
        if self.text.contains('.') {
            Type::Float
        } else {
            Type::Int
        }
    }

    /// The 64-bit integer the literal lowers to. Floats lose their fraction.
    /// `None` when the value does not fit an `i64`.
    pub fn value(&self) -> Option<i64> {
        match self._type() {
            Type::Int => self.text.parse::<i64>().ok(),
            Type::Float => {
                let truncated = self.text.parse::<f64>().ok()?.trunc();
                // 2^63 is the first value past `i64::MAX`
                let limit = 9_223_372_036_854_775_808.0;
                if (-limit..limit).contains(&truncated) {
                    Some(truncated as i64)
                } else {
                    None
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub name: String,
    pub args: Vec<Expression>,
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_promotion() {
        assert_eq!(Type::promote(Type::Int, Type::Int), Type::Int);
        assert_eq!(Type::promote(Type::Int, Type::Float), Type::Float);
        assert_eq!(Type::promote(Type::Float, Type::Int), Type::Float);
        assert_eq!(Type::promote(Type::Float, Type::Float), Type::Float);
    }

    #[test]
    fn test_number_literal_type() {
        let lit = |text: &str| NumberLiteral {
            text: text.to_owned(),
            position: Position::new(1, 0),
        };
        assert_eq!(lit("10")._type(), Type::Int);
        assert_eq!(lit("10.5")._type(), Type::Float);
    }

    #[test]
    fn test_number_literal_value() {
        let lit = |text: &str| NumberLiteral {
            text: text.to_owned(),
            position: Position::new(1, 0),
        };
        assert_eq!(lit("42").value(), Some(42));
        assert_eq!(lit("2.9").value(), Some(2));
        assert_eq!(lit("9223372036854775807").value(), Some(i64::MAX));
        assert_eq!(lit("9223372036854775808").value(), None);
        assert_eq!(lit("99999999999999999999.5").value(), None);
    }
}
