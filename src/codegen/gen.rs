use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    error::{CompileError, CompileResult},
    parser::ast::{
        Assignment, BinaryExpressionKind, Block, CallExpression, Expression, ForInit, Function,
        NumberLiteral, Program, Statement, Type, UnaryExpressionKind, VariableDeclaration,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct AsmProgram {
    /// `_start` trampoline: calls `main` and exits with its result.
    pub entry: Vec<AsmInstruction>,
    pub functions: Vec<AsmFunction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsmFunction {
    pub name: String,
    pub instructions: Vec<AsmInstruction>,
    pub stack_space: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsmInstruction {
    Mov { src: AsmOperand, dst: AsmOperand },
    Push(AsmOperand),
    Pop(AsmRegister),
    Unary { op: AsmUnaryOp, operand: AsmOperand },
    Binary { op: AsmBinaryOp, src: AsmOperand, dst: AsmOperand },
    Cmp { lhs: AsmOperand, rhs: AsmOperand },
    Idiv(AsmOperand),
    Cqo,
    Jmp { target: String },
    JmpCC { condition: ConditionCode, target: String },
    Label(String),
    AllocateStack(usize),
    Call(String),
    Ret,
    Syscall,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionCode {
    E,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsmOperand {
    Imm(i64),
    Register(AsmRegister),
    Memory(AsmRegister, i64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AsmRegister {
    Ax,
    Bx,
    Cx,
    Dx,
    Di,
    Si,
    R8,
    R9,
    Bp,
    Sp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AsmUnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AsmBinaryOp {
    Add,
    Sub,
    Mul,
}

pub const ARG_REGISTERS: [AsmRegister; 6] = [
    AsmRegister::Di,
    AsmRegister::Si,
    AsmRegister::Dx,
    AsmRegister::Cx,
    AsmRegister::R8,
    AsmRegister::R9,
];

const SLOT_SIZE: i64 = 8;

pub struct CodeGenerator {
    instructions: Vec<AsmInstruction>,
    scopes: Vec<HashMap<String, i64>>,
    offset: i64,
    label_counter: usize,
}

pub trait Codegen {
    fn codegen(&self, cx: &mut CodeGenerator) -> CompileResult<()>;
}

impl Default for CodeGenerator {
    fn default() -> Self {
        CodeGenerator::new()
    }
}

impl CodeGenerator {
    pub fn new() -> CodeGenerator {
        CodeGenerator {
            instructions: vec![],
            scopes: vec![],
            offset: 0,
            label_counter: 0,
        }
    }

    pub fn generate(&mut self, program: &Program) -> CompileResult<AsmProgram> {
        let entry = vec![
            AsmInstruction::Call("main".to_owned()),
            AsmInstruction::Mov {
                src: AsmOperand::Register(AsmRegister::Ax),
                dst: AsmOperand::Register(AsmRegister::Di),
            },
            AsmInstruction::Mov {
                src: AsmOperand::Imm(60),
                dst: AsmOperand::Register(AsmRegister::Ax),
            },
            AsmInstruction::Syscall,
        ];

        let functions = program
            .functions
            .iter()
            .map(|func| self.generate_function(func))
            .collect::<CompileResult<Vec<_>>>()?;

        Ok(AsmProgram { entry, functions })
    }

    fn generate_function(&mut self, func: &Function) -> CompileResult<AsmFunction> {
        self.instructions = vec![AsmInstruction::AllocateStack(0)];
        self.scopes = vec![HashMap::new()];
        self.offset = 0;

        for (idx, param) in func.params.iter().enumerate() {
            let slot = self.bind(&param.name);
            match ARG_REGISTERS.get(idx) {
                Some(reg) => self.push(AsmInstruction::Mov {
                    src: AsmOperand::Register(*reg),
                    dst: slot,
                }),
                None => warn!(
                    function = %func.name,
                    param = %param.name,
                    "parameter beyond the sixth is never initialized"
                ),
            }
        }

        for stmt in &func.body.statements {
            stmt.codegen(self)?;
        }

        self.push(AsmInstruction::Mov {
            src: AsmOperand::Imm(0),
            dst: AsmOperand::Register(AsmRegister::Ax),
        });
        self.push(AsmInstruction::Ret);

        let stack_space = align_frame(self.offset);
        let mut instructions = std::mem::take(&mut self.instructions);
        if stack_space == 0 {
            instructions.remove(0);
        } else {
            instructions[0] = AsmInstruction::AllocateStack(stack_space);
        }

        debug!(function = %func.name, stack_space, "generated function");

        Ok(AsmFunction {
            name: func.name.clone(),
            instructions,
            stack_space,
        })
    }

    fn push(&mut self, instr: AsmInstruction) {
        self.instructions.push(instr);
    }

    /// Reserves a fresh slot for `name` in the innermost scope. Slots are
    /// never reused within a function.
    fn bind(&mut self, name: &str) -> AsmOperand {
        self.offset += SLOT_SIZE;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), self.offset);
        }
        AsmOperand::Memory(AsmRegister::Bp, -self.offset)
    }

    fn slot(&self, name: &str) -> CompileResult<AsmOperand> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .map(|offset| AsmOperand::Memory(AsmRegister::Bp, -offset))
            .ok_or_else(|| CompileError::codegen(format!("no stack slot for '{}'", name)))
    }

    fn fresh_label_id(&mut self) -> usize {
        self.label_counter += 1;
        self.label_counter
    }

    fn scoped<F>(&mut self, f: F) -> CompileResult<()>
    where
        F: FnOnce(&mut CodeGenerator) -> CompileResult<()>,
    {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn block(&mut self, block: &Block) -> CompileResult<()> {
        self.scoped(|cx| {
            for stmt in &block.statements {
                stmt.codegen(cx)?;
            }
            Ok(())
        })
    }

    /// Pops the condition value and jumps to `target` when it is zero.
    fn branch_if_zero(&mut self, target: &str) {
        self.push(AsmInstruction::Pop(AsmRegister::Ax));
        self.push(AsmInstruction::Cmp {
            lhs: AsmOperand::Register(AsmRegister::Ax),
            rhs: AsmOperand::Imm(0),
        });
        self.push(AsmInstruction::JmpCC {
            condition: ConditionCode::E,
            target: target.to_owned(),
        });
    }

    fn store_top(&mut self, slot: AsmOperand) {
        self.push(AsmInstruction::Pop(AsmRegister::Ax));
        self.push(AsmInstruction::Mov {
            src: AsmOperand::Register(AsmRegister::Ax),
            dst: slot,
        });
    }
}

fn align_frame(bytes: i64) -> usize {
    let bytes = bytes.unsigned_abs() as usize;
    (bytes + 15) / 16 * 16
}

impl Codegen for Statement {
    fn codegen(&self, cx: &mut CodeGenerator) -> CompileResult<()> {
        match self {
            Statement::VarDecl(decl) => decl.codegen(cx),
            Statement::Assign(assign) => assign.codegen(cx),
            Statement::Return(ret) => {
                ret.value.codegen(cx)?;
                cx.push(AsmInstruction::Pop(AsmRegister::Ax));
                cx.push(AsmInstruction::Ret);
                Ok(())
            }
            Statement::If(if_stmt) => {
                let id = cx.fresh_label_id();
                let else_label = format!(".else_{}", id);
                let end_label = format!(".endif_{}", id);

                if_stmt.condition.codegen(cx)?;
                cx.branch_if_zero(&else_label);
                cx.block(&if_stmt.then_branch)?;
                cx.push(AsmInstruction::Jmp {
                    target: end_label.clone(),
                });
                cx.push(AsmInstruction::Label(else_label));
                if let Some(else_branch) = &if_stmt.else_branch {
                    cx.block(else_branch)?;
                }
                cx.push(AsmInstruction::Label(end_label));
                Ok(())
            }
            Statement::While(while_stmt) => {
                let id = cx.fresh_label_id();
                let start_label = format!(".while_start_{}", id);
                let end_label = format!(".while_end_{}", id);

                cx.push(AsmInstruction::Label(start_label.clone()));
                while_stmt.condition.codegen(cx)?;
                cx.branch_if_zero(&end_label);
                cx.block(&while_stmt.body)?;
                cx.push(AsmInstruction::Jmp {
                    target: start_label,
                });
                cx.push(AsmInstruction::Label(end_label));
                Ok(())
            }
            Statement::For(for_stmt) => {
                let id = cx.fresh_label_id();
                let start_label = format!(".for_start_{}", id);
                let end_label = format!(".for_end_{}", id);

                cx.scoped(|cx| {
                    match &for_stmt.init {
                        ForInit::VarDecl(decl) => decl.codegen(cx)?,
                        ForInit::Assign(assign) => assign.codegen(cx)?,
                    }

                    cx.push(AsmInstruction::Label(start_label.clone()));
                    for_stmt.condition.codegen(cx)?;
                    cx.branch_if_zero(&end_label);

                    for stmt in &for_stmt.body.statements {
                        stmt.codegen(cx)?;
                    }

                    for_stmt.step.codegen(cx)?;
                    cx.push(AsmInstruction::Pop(AsmRegister::Ax));
                    cx.push(AsmInstruction::Jmp {
                        target: start_label.clone(),
                    });
                    cx.push(AsmInstruction::Label(end_label.clone()));
                    Ok(())
                })
            }
            Statement::Block(block) => cx.block(block),
            Statement::Expression(expr) => {
                expr.codegen(cx)?;
                cx.push(AsmInstruction::Pop(AsmRegister::Ax));
                Ok(())
            }
        }
    }
}

impl Codegen for VariableDeclaration {
    fn codegen(&self, cx: &mut CodeGenerator) -> CompileResult<()> {
        match &self.init {
            Some(init) => init.codegen(cx)?,
            None => cx.push(AsmInstruction::Push(AsmOperand::Imm(0))),
        }
        let slot = cx.bind(&self.name);
        cx.store_top(slot);
        Ok(())
    }
}

impl Codegen for Assignment {
    fn codegen(&self, cx: &mut CodeGenerator) -> CompileResult<()> {
        self.value.codegen(cx)?;
        let slot = cx.slot(&self.name)?;
        cx.store_top(slot);
        Ok(())
    }
}

impl Codegen for Expression {
    fn codegen(&self, cx: &mut CodeGenerator) -> CompileResult<()> {
        match self {
            Expression::Number(number) => number.codegen(cx),
            Expression::Identifier(ident) => {
                let slot = cx.slot(&ident.name)?;
                cx.push(AsmInstruction::Push(slot));
                Ok(())
            }
            Expression::Call(call) => call.codegen(cx),
            Expression::Unary(unary) => {
                unary.expr.codegen(cx)?;
                cx.push(AsmInstruction::Pop(AsmRegister::Ax));
                if unary.kind == UnaryExpressionKind::Negate {
                    cx.push(AsmInstruction::Unary {
                        op: AsmUnaryOp::Neg,
                        operand: AsmOperand::Register(AsmRegister::Ax),
                    });
                }
                cx.push(AsmInstruction::Push(AsmOperand::Register(AsmRegister::Ax)));
                Ok(())
            }
            Expression::Binary(binary) => {
                binary.lhs.codegen(cx)?;
                binary.rhs.codegen(cx)?;
                cx.push(AsmInstruction::Pop(AsmRegister::Bx));
                cx.push(AsmInstruction::Pop(AsmRegister::Ax));

                let op = match binary.kind {
                    BinaryExpressionKind::Add => Some(AsmBinaryOp::Add),
                    BinaryExpressionKind::Sub => Some(AsmBinaryOp::Sub),
                    BinaryExpressionKind::Mul => Some(AsmBinaryOp::Mul),
                    BinaryExpressionKind::Div => None,
                };

                match op {
                    Some(op) => cx.push(AsmInstruction::Binary {
                        op,
                        src: AsmOperand::Register(AsmRegister::Bx),
                        dst: AsmOperand::Register(AsmRegister::Ax),
                    }),
                    None => {
                        cx.push(AsmInstruction::Cqo);
                        cx.push(AsmInstruction::Idiv(AsmOperand::Register(AsmRegister::Bx)));
                    }
                }

                cx.push(AsmInstruction::Push(AsmOperand::Register(AsmRegister::Ax)));
                Ok(())
            }
        }
    }
}

impl Codegen for NumberLiteral {
    fn codegen(&self, cx: &mut CodeGenerator) -> CompileResult<()> {
        let value = self.value().ok_or_else(|| {
            CompileError::codegen(format!("literal '{}' does not fit in 64 bits", self.text))
        })?;
        if self._type() == Type::Float {
            warn!(literal = %self.text, position = %self.position, "float literal truncated to integer");
        }

        if i32::try_from(value).is_ok() {
            cx.push(AsmInstruction::Push(AsmOperand::Imm(value)));
        } else {
            cx.push(AsmInstruction::Mov {
                src: AsmOperand::Imm(value),
                dst: AsmOperand::Register(AsmRegister::Ax),
            });
            cx.push(AsmInstruction::Push(AsmOperand::Register(AsmRegister::Ax)));
        }
        Ok(())
    }
}

impl Codegen for CallExpression {
    fn codegen(&self, cx: &mut CodeGenerator) -> CompileResult<()> {
        if self.args.len() > ARG_REGISTERS.len() {
            warn!(
                function = %self.name,
                args = self.args.len(),
                "arguments beyond the sixth are evaluated and dropped"
            );
        }

        for reg in ARG_REGISTERS {
            cx.push(AsmInstruction::Push(AsmOperand::Register(reg)));
        }

        for (idx, arg) in self.args.iter().enumerate() {
            arg.codegen(cx)?;
            let reg = ARG_REGISTERS.get(idx).copied().unwrap_or(AsmRegister::Ax);
            cx.push(AsmInstruction::Pop(reg));
        }

        cx.push(AsmInstruction::Call(self.name.clone()));

        for reg in ARG_REGISTERS.iter().rev() {
            cx.push(AsmInstruction::Pop(*reg));
        }

        cx.push(AsmInstruction::Push(AsmOperand::Register(AsmRegister::Ax)));
        Ok(())
    }
}

pub fn generate(program: &Program) -> CompileResult<AsmProgram> {
    let asm = CodeGenerator::new().generate(program)?;
    debug!(functions = asm.functions.len(), "code generation finished");
    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex::{tokenize, LexMode};
    use crate::parser::recursive_descent::{parse, ParseMode};

    fn compile(src: &str) -> CompileResult<AsmProgram> {
        let tokens = tokenize(src, LexMode::Strict).unwrap();
        let program = parse(tokens, ParseMode::FailFast).unwrap();
        generate(&program)
    }

    fn labels(func: &AsmFunction) -> Vec<String> {
        func.instructions
            .iter()
            .filter_map(|instr| match instr {
                AsmInstruction::Label(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_entry_trampoline_calls_main() {
        let asm = compile("int main() { return 0; }").unwrap();
        assert_eq!(asm.entry[0], AsmInstruction::Call("main".to_owned()));
        assert_eq!(asm.entry.last(), Some(&AsmInstruction::Syscall));
    }

    #[test]
    fn test_params_moved_into_slots() {
        let asm = compile("int add(int a, int b) { return a + b; }\nint main() { return add(2, 3); }")
            .unwrap();
        let add = &asm.functions[0];
        assert_eq!(add.stack_space, 16);
        assert_eq!(add.instructions[0], AsmInstruction::AllocateStack(16));
        assert_eq!(
            add.instructions[1],
            AsmInstruction::Mov {
                src: AsmOperand::Register(AsmRegister::Di),
                dst: AsmOperand::Memory(AsmRegister::Bp, -8),
            }
        );
        assert_eq!(
            add.instructions[2],
            AsmInstruction::Mov {
                src: AsmOperand::Register(AsmRegister::Si),
                dst: AsmOperand::Memory(AsmRegister::Bp, -16),
            }
        );
    }

    #[test]
    fn test_default_epilogue_is_appended() {
        let asm = compile("int main() { return 7; }").unwrap();
        let main = &asm.functions[0];
        let tail = &main.instructions[main.instructions.len() - 2..];
        assert_eq!(
            tail,
            &[
                AsmInstruction::Mov {
                    src: AsmOperand::Imm(0),
                    dst: AsmOperand::Register(AsmRegister::Ax),
                },
                AsmInstruction::Ret,
            ]
        );
        assert!(!main
            .instructions
            .iter()
            .any(|instr| matches!(instr, AsmInstruction::AllocateStack(_))));
    }

    #[test]
    fn test_labels_are_unique() {
        let asm = compile(
            "int main() { int x = 3; while (x) { x = x - 1; } if (x) { x = 1; } else { x = 2; } if (x) { x = 0; } return x; }",
        )
        .unwrap();
        let labels = labels(&asm.functions[0]);
        assert_eq!(
            labels,
            vec![
                ".while_start_1",
                ".while_end_1",
                ".else_2",
                ".endif_2",
                ".else_3",
                ".endif_3",
            ]
        );
    }

    #[test]
    fn test_label_counter_spans_functions() {
        let asm = compile(
            "int f(int a) { if (a) { return 1; } return 0; }\nint main() { if (1) { return f(1); } return 0; }",
        )
        .unwrap();
        assert_eq!(labels(&asm.functions[0]), vec![".else_1", ".endif_1"]);
        assert_eq!(labels(&asm.functions[1]), vec![".else_2", ".endif_2"]);
    }

    #[test]
    fn test_shadowed_variable_gets_new_slot() {
        let asm = compile("int main() { int x = 1; { int x = 2; x = 3; } return x; }").unwrap();
        let main = &asm.functions[0];
        assert!(main.instructions.contains(&AsmInstruction::Mov {
            src: AsmOperand::Register(AsmRegister::Ax),
            dst: AsmOperand::Memory(AsmRegister::Bp, -16),
        }));
        // the outer `x` is read back after the block closes
        let reads = main
            .instructions
            .iter()
            .filter(|instr| {
                **instr == AsmInstruction::Push(AsmOperand::Memory(AsmRegister::Bp, -8))
            })
            .count();
        assert_eq!(reads, 1);
    }

    #[test]
    fn test_uninitialized_local_is_zeroed() {
        let asm = compile("int main() { int x; return x; }").unwrap();
        let main = &asm.functions[0];
        assert_eq!(main.instructions[1], AsmInstruction::Push(AsmOperand::Imm(0)));
    }

    #[test]
    fn test_large_literal_goes_through_register() {
        let asm = compile("int main() { return 5000000000; }").unwrap();
        let main = &asm.functions[0];
        assert_eq!(
            main.instructions[0],
            AsmInstruction::Mov {
                src: AsmOperand::Imm(5_000_000_000),
                dst: AsmOperand::Register(AsmRegister::Ax),
            }
        );
    }

    #[test]
    fn test_float_literal_is_truncated() {
        let asm = compile("int main() { return 2.9; }").unwrap();
        assert_eq!(
            asm.functions[0].instructions[0],
            AsmInstruction::Push(AsmOperand::Imm(2))
        );
    }

    #[test]
    fn test_division_sign_extends() {
        let asm = compile("int main() { return 7 / 2; }").unwrap();
        let main = &asm.functions[0];
        let cqo = main
            .instructions
            .iter()
            .position(|instr| *instr == AsmInstruction::Cqo)
            .unwrap();
        assert_eq!(
            main.instructions[cqo + 1],
            AsmInstruction::Idiv(AsmOperand::Register(AsmRegister::Bx))
        );
    }

    #[test]
    fn test_call_saves_and_restores_arg_registers() {
        let asm = compile("int f(int a) { return a; }\nint main() { return f(4); }").unwrap();
        let main = &asm.functions[1];
        let saves = main
            .instructions
            .iter()
            .take(6)
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(
            saves,
            ARG_REGISTERS
                .iter()
                .map(|reg| AsmInstruction::Push(AsmOperand::Register(*reg)))
                .collect::<Vec<_>>()
        );
        let call = main
            .instructions
            .iter()
            .position(|instr| *instr == AsmInstruction::Call("f".to_owned()))
            .unwrap();
        assert_eq!(main.instructions[call - 1], AsmInstruction::Pop(AsmRegister::Di));
        assert_eq!(main.instructions[call + 1], AsmInstruction::Pop(AsmRegister::R9));
        assert_eq!(main.instructions[call + 6], AsmInstruction::Pop(AsmRegister::Di));
    }

    #[test]
    fn test_for_lowering() {
        let asm = compile("int main() { for (int i = 3; i; i - 1) { i = i - 1; } return 0; }")
            .unwrap();
        let main = &asm.functions[0];
        assert_eq!(labels(main), vec![".for_start_1", ".for_end_1"]);

        let counter = || AsmOperand::Memory(AsmRegister::Bp, -8);
        let decrement = || {
            vec![
                AsmInstruction::Push(counter()),
                AsmInstruction::Push(AsmOperand::Imm(1)),
                AsmInstruction::Pop(AsmRegister::Bx),
                AsmInstruction::Pop(AsmRegister::Ax),
                AsmInstruction::Binary {
                    op: AsmBinaryOp::Sub,
                    src: AsmOperand::Register(AsmRegister::Bx),
                    dst: AsmOperand::Register(AsmRegister::Ax),
                },
                AsmInstruction::Push(AsmOperand::Register(AsmRegister::Ax)),
            ]
        };

        let mut expected = vec![
            AsmInstruction::Label(".for_start_1".to_owned()),
            AsmInstruction::Push(counter()),
            AsmInstruction::Pop(AsmRegister::Ax),
            AsmInstruction::Cmp {
                lhs: AsmOperand::Register(AsmRegister::Ax),
                rhs: AsmOperand::Imm(0),
            },
            AsmInstruction::JmpCC {
                condition: ConditionCode::E,
                target: ".for_end_1".to_owned(),
            },
        ];
        // body assignment
        expected.extend(decrement());
        expected.push(AsmInstruction::Pop(AsmRegister::Ax));
        expected.push(AsmInstruction::Mov {
            src: AsmOperand::Register(AsmRegister::Ax),
            dst: counter(),
        });
        // step result is discarded
        expected.extend(decrement());
        expected.push(AsmInstruction::Pop(AsmRegister::Ax));
        expected.push(AsmInstruction::Jmp {
            target: ".for_start_1".to_owned(),
        });
        expected.push(AsmInstruction::Label(".for_end_1".to_owned()));

        let start = main
            .instructions
            .iter()
            .position(|instr| *instr == AsmInstruction::Label(".for_start_1".to_owned()))
            .unwrap();
        assert_eq!(&main.instructions[start..start + expected.len()], &expected[..]);
    }

    #[test]
    fn test_call_with_seven_arguments() {
        let asm = compile(
            "int f(int a, int b, int c, int d, int e, int g, int h) { return a; }\nint main() { return f(1, 2, 3, 4, 5, 6, 7); }",
        )
        .unwrap();

        let f = &asm.functions[0];
        assert_eq!(f.stack_space, 64);
        let spills = f
            .instructions
            .iter()
            .filter(|instr| {
                matches!(
                    instr,
                    AsmInstruction::Mov {
                        src: AsmOperand::Register(_),
                        dst: AsmOperand::Memory(AsmRegister::Bp, _),
                    }
                )
            })
            .count();
        assert_eq!(spills, 6);

        let main = &asm.functions[1];
        let call = main
            .instructions
            .iter()
            .position(|instr| *instr == AsmInstruction::Call("f".to_owned()))
            .unwrap();
        assert_eq!(main.instructions[call - 2], AsmInstruction::Push(AsmOperand::Imm(7)));
        assert_eq!(main.instructions[call - 1], AsmInstruction::Pop(AsmRegister::Ax));
        assert_eq!(main.instructions[call - 3], AsmInstruction::Pop(AsmRegister::R9));

        let pushes = main
            .instructions
            .iter()
            .filter(|instr| matches!(instr, AsmInstruction::Push(_)))
            .count();
        let pops = main
            .instructions
            .iter()
            .filter(|instr| matches!(instr, AsmInstruction::Pop(_)))
            .count();
        assert_eq!(pushes, pops);
    }

    #[test]
    fn test_unresolved_variable_is_codegen_error() {
        let err = compile("int main() { return y; }").unwrap_err();
        assert!(matches!(err, CompileError::Codegen(_)));
    }

    #[test]
    fn test_frame_rounded_to_sixteen() {
        let asm = compile("int main() { int a = 1; int b = 2; int c = 3; return a + b + c; }")
            .unwrap();
        assert_eq!(asm.functions[0].stack_space, 32);
    }
}
