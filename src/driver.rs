use tracing::info;

use crate::{
    codegen::{
        gen::{generate, AsmProgram},
        peephole::Optimize,
    },
    emitter::emit::emit_to_string,
    error::{CompileError, CompileResult},
    lexer::{
        lex::{tokenize, LexMode},
        token::Token,
    },
    parser::{
        ast::Program,
        recursive_descent::{parse, ParseMode},
    },
    semantics::analyzer::{analyze, Analysis, AnalysisMode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub lex_mode: LexMode,
    pub parse_mode: ParseMode,
    pub analysis_mode: AnalysisMode,
    pub optimize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            lex_mode: LexMode::Strict,
            parse_mode: ParseMode::FailFast,
            analysis_mode: AnalysisMode::Strict,
            optimize: true,
        }
    }
}

/// Every artifact of a successful run.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub tokens: Vec<Token>,
    pub program: Program,
    pub analysis: Analysis,
    pub asm: AsmProgram,
    pub assembly: String,
}

pub fn lex(src: &str, options: &Options) -> CompileResult<Vec<Token>> {
    tokenize(src, options.lex_mode)
}

pub fn front_end(src: &str, options: &Options) -> CompileResult<(Vec<Token>, Program)> {
    let tokens = lex(src, options)?;
    let program = parse(tokens.clone(), options.parse_mode)?;
    Ok((tokens, program))
}

/// Lexes, parses and analyzes. Analysis failures come back as `Semantic` or
/// `Multiple`.
pub fn check(src: &str, options: &Options) -> CompileResult<(Vec<Token>, Program, Analysis)> {
    let (tokens, program) = front_end(src, options)?;
    let analysis = analyze(&program, options.analysis_mode).into_result()?;
    Ok((tokens, program, analysis))
}

pub fn compile(src: &str, options: &Options) -> CompileResult<Compilation> {
    let (tokens, program, analysis) = check(src, options)?;

    let mut asm = generate(&program)?;
    if options.optimize {
        asm.optimize();
    }

    let assembly = emit_to_string(&asm).map_err(|e| CompileError::codegen(e.to_string()))?;

    info!(
        functions = program.functions.len(),
        warnings = analysis.warnings.len(),
        "compilation finished"
    );

    Ok(Compilation {
        tokens,
        program,
        analysis,
        asm,
        assembly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::diagnostics::ErrorKind;

    #[test]
    fn test_default_options_are_strict() {
        let options = Options::default();
        assert_eq!(options.lex_mode, LexMode::Strict);
        assert_eq!(options.parse_mode, ParseMode::FailFast);
        assert_eq!(options.analysis_mode, AnalysisMode::Strict);
        assert!(options.optimize);
    }

    #[test]
    fn test_semantic_failure_stops_before_codegen() {
        let err = compile("int f() { return 0; }", &Options::default()).unwrap_err();
        match err {
            CompileError::Semantic(diag) => assert_eq!(diag.kind, ErrorKind::MissingMain),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_lexical_failure_is_reported() {
        let err = compile("int main() { return 1 @ 2; }", &Options::default()).unwrap_err();
        assert!(matches!(err, CompileError::Lexical { ch: '@', .. }));
    }

    #[test]
    fn test_optimize_flag() {
        let src = "int main() { return 1 + 2; }";
        let plain = compile(
            src,
            &Options {
                optimize: false,
                ..Options::default()
            },
        )
        .unwrap();
        let optimized = compile(src, &Options::default()).unwrap();
        assert!(plain.assembly.contains("push 1"));
        assert!(!optimized.assembly.contains("pop rbx"));
        assert!(optimized.assembly.contains("mov rbx, 2"));
    }
}
