pub mod driver;
pub mod error;
pub mod lexer {
    pub mod lex;
    pub mod token;
}
pub mod parser {
    pub mod ast;
    pub mod recursive_descent;
}
pub mod semantics {
    pub mod analyzer;
    pub mod diagnostics;
    pub mod symbols;
}
pub mod codegen {
    pub mod gen;
    pub mod peephole;
}
pub mod emitter {
    pub mod emit;
}
