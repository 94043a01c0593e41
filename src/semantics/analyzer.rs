use tracing::{debug, info};

use crate::{
    error::{CompileError, CompileResult},
    parser::ast::{
        Assignment, Block, CallExpression, Expression, ForInit, Function, Identifier, Position,
        Program, Statement, Type, VariableDeclaration,
    },
    semantics::{
        diagnostics::{Diagnostic, ErrorKind, Warning, WarningKind},
        symbols::{ScopeStack, Symbol, SymbolKind},
    },
};

/// Error policy and type strictness of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// First error aborts; types must match exactly.
    #[default]
    Strict,
    /// Errors accumulate; numeric coercions are allowed with a warning.
    Lenient,
}

pub type Check<T> = Result<T, Diagnostic>;

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Warning>,
    pub symbols: Vec<Symbol>,
}

impl Analysis {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(mut self) -> CompileResult<Analysis> {
        match self.errors.len() {
            0 => Ok(self),
            1 => Err(CompileError::Semantic(self.errors.remove(0))),
            _ => Err(CompileError::Multiple(
                self.errors.into_iter().map(CompileError::Semantic).collect(),
            )),
        }
    }
}

struct EnclosingFunction {
    name: String,
    return_type: Type,
}

pub struct Analyzer {
    scopes: ScopeStack,
    mode: AnalysisMode,
    errors: Vec<Diagnostic>,
    warnings: Vec<Warning>,
    closed: Vec<Symbol>,
    current_function: Option<EnclosingFunction>,
}

pub trait Typecheck {
    type Output;

    fn typecheck(&self, cx: &mut Analyzer) -> Check<Self::Output>;
}

impl Analyzer {
    pub fn new(mode: AnalysisMode) -> Analyzer {
        Analyzer {
            scopes: ScopeStack::new(),
            mode,
            errors: vec![],
            warnings: vec![],
            closed: vec![],
            current_function: None,
        }
    }

    pub fn analyze(mut self, program: &Program) -> Analysis {
        match self.analyze_program(program) {
            Ok(()) => self.report_unused(),
            Err(diag) => self.errors.push(diag),
        }

        let mut symbols = self.scopes.into_symbols();
        symbols.append(&mut self.closed);

        info!(
            errors = self.errors.len(),
            warnings = self.warnings.len(),
            "semantic analysis finished"
        );

        Analysis {
            errors: self.errors,
            warnings: self.warnings,
            symbols,
        }
    }

    fn report(&mut self, kind: ErrorKind, message: impl Into<String>, position: Position) -> Check<()> {
        let diag = Diagnostic::new(kind, message, position);
        match self.mode {
            AnalysisMode::Strict => Err(diag),
            AnalysisMode::Lenient => {
                debug!(%diag, "recorded semantic error");
                self.errors.push(diag);
                Ok(())
            }
        }
    }

    fn warn(&mut self, kind: WarningKind, message: impl Into<String>, position: Position) {
        self.warnings.push(Warning::new(kind, message, position));
    }

    /// Checks that a value of type `found` may be stored where `expected` is
    /// required.
    fn coerce(&mut self, expected: Type, found: Type, context: &str, position: Position) -> Check<()> {
        if expected == found {
            return Ok(());
        }

        match self.mode {
            AnalysisMode::Strict => self.report(
                ErrorKind::TypeMismatch,
                format!("{}: expected '{}', found '{}'", context, expected, found),
                position,
            ),
            AnalysisMode::Lenient => {
                self.warn(
                    WarningKind::ImplicitConversion,
                    format!(
                        "{}: implicit conversion from '{}' to '{}'",
                        context, found, expected
                    ),
                    position,
                );
                Ok(())
            }
        }
    }

    fn declare(
        &mut self,
        name: &str,
        _type: Type,
        kind: SymbolKind,
        param_types: Vec<Type>,
        position: Position,
    ) -> Check<()> {
        match self.scopes.declare(name, _type, kind, param_types, position) {
            Ok(()) => Ok(()),
            Err(existing) => self.report(
                ErrorKind::Redeclaration,
                format!(
                    "'{}' already declared in this scope at {}",
                    name, existing.position
                ),
                position,
            ),
        }
    }

    fn enter_scope(&mut self) {
        self.scopes.enter();
    }

    fn exit_scope(&mut self) {
        let mut closed = self.scopes.exit();
        self.closed.append(&mut closed);
    }

    fn analyze_program(&mut self, program: &Program) -> Check<()> {
        for func in &program.functions {
            let param_types = func.params.iter().map(|p| p._type).collect();
            self.declare(
                &func.name,
                func.return_type,
                SymbolKind::Function,
                param_types,
                func.position,
            )?;
        }

        for func in &program.functions {
            self.analyze_function(func)?;
        }

        match self.scopes.lookup("main").map(|main| (main._type, main.position)) {
            None => self.report(
                ErrorKind::MissingMain,
                "function 'main' not found",
                Position::new(1, 0),
            ),
            Some((Type::Int, _)) => Ok(()),
            Some((_type, position)) => self.report(
                ErrorKind::TypeMismatch,
                format!("function 'main' must return 'int', not '{}'", _type),
                position,
            ),
        }
    }

    fn analyze_function(&mut self, func: &Function) -> Check<()> {
        self.current_function = Some(EnclosingFunction {
            name: func.name.clone(),
            return_type: func.return_type,
        });
        self.enter_scope();

        for param in &func.params {
            self.declare(
                &param.name,
                param._type,
                SymbolKind::Parameter,
                vec![],
                param.position,
            )?;
        }

        for stmt in &func.body.statements {
            stmt.typecheck(self)?;
        }

        if !has_return(&func.body) {
            self.report(
                ErrorKind::MissingReturn,
                format!("function '{}' has no guaranteed return", func.name),
                func.position,
            )?;
        }

        self.exit_scope();
        self.current_function = None;
        Ok(())
    }

    fn analyze_scoped_block(&mut self, block: &Block) -> Check<()> {
        self.enter_scope();
        for stmt in &block.statements {
            stmt.typecheck(self)?;
        }
        self.exit_scope();
        Ok(())
    }

    // Only the global scope is open once the walk completes, and it holds
    // functions alone.
    fn report_unused(&mut self) {
        let mut unused = self
            .closed
            .iter()
            .filter(|symbol| symbol.kind == SymbolKind::Variable && !symbol.used)
            .map(|symbol| {
                Warning::new(
                    WarningKind::UnusedVariable,
                    format!("variable '{}' declared but never used", symbol.name),
                    symbol.position,
                )
            })
            .collect::<Vec<_>>();

        unused.sort_by_key(|w| (w.line, w.column));
        self.warnings.append(&mut unused);
    }
}

/// True when every path through `block` reaches a `return`. Loops never
/// count, and an `if` only counts with both branches returning.
pub fn has_return(block: &Block) -> bool {
    block.statements.iter().any(|stmt| match stmt {
        Statement::Return(_) => true,
        Statement::If(if_stmt) => match &if_stmt.else_branch {
            Some(else_branch) => has_return(&if_stmt.then_branch) && has_return(else_branch),
            None => false,
        },
        Statement::Block(inner) => has_return(inner),
        _ => false,
    })
}

impl Typecheck for Statement {
    type Output = ();

    fn typecheck(&self, cx: &mut Analyzer) -> Check<()> {
        match self {
            Statement::VarDecl(decl) => decl.typecheck(cx),
            Statement::Assign(assign) => assign.typecheck(cx),
            Statement::Return(ret) => {
                let found = ret.value.typecheck(cx)?;
                match cx.current_function.as_ref().map(|f| (f.name.clone(), f.return_type)) {
                    None => cx.report(
                        ErrorKind::ReturnOutsideFunction,
                        "'return' outside of a function",
                        ret.position,
                    ),
                    Some((name, expected)) => cx.coerce(
                        expected,
                        found,
                        &format!("return value of '{}'", name),
                        ret.position,
                    ),
                }
            }
            Statement::If(if_stmt) => {
                if_stmt.condition.typecheck(cx)?;
                cx.analyze_scoped_block(&if_stmt.then_branch)?;
                if let Some(else_branch) = &if_stmt.else_branch {
                    cx.analyze_scoped_block(else_branch)?;
                }
                Ok(())
            }
            Statement::While(while_stmt) => {
                while_stmt.condition.typecheck(cx)?;
                cx.analyze_scoped_block(&while_stmt.body)
            }
            Statement::For(for_stmt) => {
                cx.enter_scope();
                match &for_stmt.init {
                    ForInit::VarDecl(decl) => decl.typecheck(cx)?,
                    ForInit::Assign(assign) => assign.typecheck(cx)?,
                }
                for_stmt.condition.typecheck(cx)?;
                for_stmt.step.typecheck(cx)?;
                for stmt in &for_stmt.body.statements {
                    stmt.typecheck(cx)?;
                }
                cx.exit_scope();
                Ok(())
            }
            Statement::Block(block) => cx.analyze_scoped_block(block),
            Statement::Expression(expr) => expr.typecheck(cx).map(|_| ()),
        }
    }
}

impl Typecheck for VariableDeclaration {
    type Output = ();

    fn typecheck(&self, cx: &mut Analyzer) -> Check<()> {
        let init_type = match &self.init {
            Some(init) => Some(init.typecheck(cx)?),
            None => None,
        };

        cx.declare(&self.name, self._type, SymbolKind::Variable, vec![], self.position)?;

        match init_type {
            Some(found) => cx.coerce(
                self._type,
                found,
                &format!("initialization of '{}'", self.name),
                self.position,
            ),
            None => Ok(()),
        }
    }
}

impl Typecheck for Assignment {
    type Output = ();

    fn typecheck(&self, cx: &mut Analyzer) -> Check<()> {
        let target = cx.scopes.resolve(&self.name).cloned();
        let found = self.value.typecheck(cx)?;

        match target {
            None => cx.report(
                ErrorKind::UndeclaredSymbol,
                format!("variable '{}' not declared", self.name),
                self.position,
            ),
            Some(symbol) if symbol.kind == SymbolKind::Function => cx.report(
                ErrorKind::TypeMismatch,
                format!("'{}' is a function and cannot be assigned", self.name),
                self.position,
            ),
            Some(symbol) => cx.coerce(
                symbol._type,
                found,
                &format!("assignment to '{}'", self.name),
                self.position,
            ),
        }
    }
}

impl Typecheck for Expression {
    type Output = Type;

    fn typecheck(&self, cx: &mut Analyzer) -> Check<Type> {
        match self {
            Expression::Number(number) => {
                if number.value().is_none() {
                    cx.report(
                        ErrorKind::TypeMismatch,
                        format!("numeric literal '{}' does not fit in 64 bits", number.text),
                        number.position,
                    )?;
                }
                Ok(number._type())
            }
            Expression::Identifier(ident) => ident.typecheck(cx),
            Expression::Call(call) => call.typecheck(cx),
            Expression::Unary(unary) => unary.expr.typecheck(cx),
            Expression::Binary(binary) => {
                let lhs = binary.lhs.typecheck(cx)?;
                let rhs = binary.rhs.typecheck(cx)?;

                if lhs != rhs {
                    match cx.mode {
                        AnalysisMode::Strict => cx.report(
                            ErrorKind::TypeMismatch,
                            format!(
                                "mixed-type arithmetic '{} {} {}'",
                                lhs, binary.kind, rhs
                            ),
                            binary.position,
                        )?,
                        AnalysisMode::Lenient => cx.warn(
                            WarningKind::ImplicitConversion,
                            format!(
                                "implicit conversion to 'float' in '{} {} {}'",
                                lhs, binary.kind, rhs
                            ),
                            binary.position,
                        ),
                    }
                }

                Ok(Type::promote(lhs, rhs))
            }
        }
    }
}

impl Typecheck for Identifier {
    type Output = Type;

    fn typecheck(&self, cx: &mut Analyzer) -> Check<Type> {
        match cx.scopes.resolve(&self.name).cloned() {
            None => {
                cx.report(
                    ErrorKind::UndeclaredSymbol,
                    format!("variable '{}' not declared", self.name),
                    self.position,
                )?;
                Ok(Type::Int)
            }
            Some(symbol) if symbol.kind == SymbolKind::Function => {
                cx.report(
                    ErrorKind::TypeMismatch,
                    format!("'{}' is a function, not a variable", self.name),
                    self.position,
                )?;
                Ok(symbol._type)
            }
            Some(symbol) => Ok(symbol._type),
        }
    }
}

impl Typecheck for CallExpression {
    type Output = Type;

    fn typecheck(&self, cx: &mut Analyzer) -> Check<Type> {
        let callee = cx.scopes.resolve(&self.name).cloned();

        let symbol = match callee {
            None => {
                cx.report(
                    ErrorKind::UndeclaredSymbol,
                    format!("function '{}' not declared", self.name),
                    self.position,
                )?;
                None
            }
            Some(symbol) if symbol.kind != SymbolKind::Function => {
                cx.report(
                    ErrorKind::TypeMismatch,
                    format!("'{}' is a {}, not a function", self.name, symbol.kind),
                    self.position,
                )?;
                None
            }
            Some(symbol) if symbol.param_types.len() != self.args.len() => {
                cx.report(
                    ErrorKind::WrongArity,
                    format!(
                        "function '{}' expects {} arguments, but {} were given",
                        self.name,
                        symbol.param_types.len(),
                        self.args.len()
                    ),
                    self.position,
                )?;
                for arg in &self.args {
                    arg.typecheck(cx)?;
                }
                return Ok(symbol._type);
            }
            Some(symbol) => Some(symbol),
        };

        let Some(symbol) = symbol else {
            for arg in &self.args {
                arg.typecheck(cx)?;
            }
            return Ok(Type::Int);
        };

        for (idx, (arg, expected)) in self.args.iter().zip(&symbol.param_types).enumerate() {
            let found = arg.typecheck(cx)?;
            cx.coerce(
                *expected,
                found,
                &format!("argument {} of '{}'", idx + 1, self.name),
                arg.position(),
            )?;
        }

        Ok(symbol._type)
    }
}

pub fn analyze(program: &Program, mode: AnalysisMode) -> Analysis {
    Analyzer::new(mode).analyze(program)
}
