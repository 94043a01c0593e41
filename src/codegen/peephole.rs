use tracing::debug;

use crate::codegen::gen::{AsmInstruction, AsmOperand, AsmProgram};

pub trait Optimize {
    /// Returns the number of push/pop pairs collapsed.
    fn optimize(&mut self) -> usize;
}

impl Optimize for AsmProgram {
    fn optimize(&mut self) -> usize {
        let collapsed = self
            .functions
            .iter_mut()
            .map(|func| func.instructions.optimize())
            .sum();
        debug!(collapsed, "peephole pass finished");
        collapsed
    }
}

impl Optimize for Vec<AsmInstruction> {
    /// One left-to-right scan. A `push x` directly followed by `pop r`
    /// becomes `mov r, x`, or disappears when `x` is `r` itself. Output of a
    /// collapse is not re-examined.
    fn optimize(&mut self) -> usize {
        let mut optimized = Vec::with_capacity(self.len());
        let mut collapsed = 0;
        let mut instrs = std::mem::take(self).into_iter().peekable();

        while let Some(instr) = instrs.next() {
            let AsmInstruction::Push(src) = &instr else {
                optimized.push(instr);
                continue;
            };

            let Some(AsmInstruction::Pop(reg)) = instrs.peek() else {
                optimized.push(instr);
                continue;
            };

            let dst = AsmOperand::Register(*reg);
            if *src != dst {
                optimized.push(AsmInstruction::Mov {
                    src: src.clone(),
                    dst,
                });
            }
            instrs.next();
            collapsed += 1;
        }

        *self = optimized;
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::gen::{generate, AsmRegister};
    use crate::lexer::lex::{tokenize, LexMode};
    use crate::parser::recursive_descent::{parse, ParseMode};

    fn push(operand: AsmOperand) -> AsmInstruction {
        AsmInstruction::Push(operand)
    }

    #[test]
    fn test_push_pop_becomes_mov() {
        let mut instrs = vec![
            push(AsmOperand::Imm(4)),
            AsmInstruction::Pop(AsmRegister::Di),
        ];
        assert_eq!(instrs.optimize(), 1);
        assert_eq!(
            instrs,
            vec![AsmInstruction::Mov {
                src: AsmOperand::Imm(4),
                dst: AsmOperand::Register(AsmRegister::Di),
            }]
        );
    }

    #[test]
    fn test_same_register_pair_is_elided() {
        let mut instrs = vec![
            push(AsmOperand::Register(AsmRegister::Ax)),
            AsmInstruction::Pop(AsmRegister::Ax),
            AsmInstruction::Ret,
        ];
        assert_eq!(instrs.optimize(), 1);
        assert_eq!(instrs, vec![AsmInstruction::Ret]);
    }

    #[test]
    fn test_non_adjacent_pairs_survive() {
        let mut instrs = vec![
            push(AsmOperand::Imm(1)),
            push(AsmOperand::Imm(2)),
            AsmInstruction::Pop(AsmRegister::Bx),
            AsmInstruction::Pop(AsmRegister::Ax),
        ];
        assert_eq!(instrs.optimize(), 1);
        assert_eq!(
            instrs,
            vec![
                push(AsmOperand::Imm(1)),
                AsmInstruction::Mov {
                    src: AsmOperand::Imm(2),
                    dst: AsmOperand::Register(AsmRegister::Bx),
                },
                AsmInstruction::Pop(AsmRegister::Ax),
            ]
        );
    }

    #[test]
    fn test_single_pass_is_idempotent_on_generated_code() {
        let src = "int add(int a, int b) { return a + b; }\nint main() { return add(2, 3); }";
        let tokens = tokenize(src, LexMode::Strict).unwrap();
        let program = parse(tokens, ParseMode::FailFast).unwrap();
        let mut asm = generate(&program).unwrap();

        assert!(asm.optimize() > 0);
        let once = asm.clone();
        assert_eq!(asm.optimize(), 0);
        assert_eq!(asm, once);
    }

    #[test]
    fn test_entry_is_untouched() {
        let mut asm = AsmProgram {
            entry: vec![
                push(AsmOperand::Imm(0)),
                AsmInstruction::Pop(AsmRegister::Ax),
            ],
            functions: vec![],
        };
        assert_eq!(asm.optimize(), 0);
        assert_eq!(asm.entry.len(), 2);
    }
}
