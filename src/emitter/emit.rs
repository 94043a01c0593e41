use std::io::Write;

use anyhow::{Context, Result};

use crate::codegen::gen::{
    AsmBinaryOp, AsmFunction, AsmInstruction, AsmOperand, AsmProgram, AsmRegister, AsmUnaryOp,
    ConditionCode,
};

/// Writes NASM (Intel syntax) for x86-64 Linux.
pub trait Emit {
    fn emit<W: Write>(&self, f: &mut W) -> Result<()>;
}

impl Emit for AsmProgram {
    fn emit<W: Write>(&self, f: &mut W) -> Result<()> {
        writeln!(f, "section .text")?;
        writeln!(f, "global _start")?;
        writeln!(f)?;

        writeln!(f, "_start:")?;
        self.entry.emit(f)?;

        for func in &self.functions {
            writeln!(f)?;
            func.emit(f)
                .with_context(|| format!("failed to emit function '{}'", func.name))?;
        }

        Ok(())
    }
}

impl Emit for AsmFunction {
    fn emit<W: Write>(&self, f: &mut W) -> Result<()> {
        writeln!(f, "{}:", self.name)?;
        for instr in frame_setup() {
            instr.emit(f)?;
        }
        self.instructions.emit(f)
    }
}

fn frame_setup() -> [AsmInstruction; 2] {
    [
        AsmInstruction::Push(AsmOperand::Register(AsmRegister::Bp)),
        AsmInstruction::Mov {
            src: AsmOperand::Register(AsmRegister::Sp),
            dst: AsmOperand::Register(AsmRegister::Bp),
        },
    ]
}

fn frame_teardown() -> [AsmInstruction; 2] {
    [
        AsmInstruction::Mov {
            src: AsmOperand::Register(AsmRegister::Bp),
            dst: AsmOperand::Register(AsmRegister::Sp),
        },
        AsmInstruction::Pop(AsmRegister::Bp),
    ]
}

impl Emit for Vec<AsmInstruction> {
    fn emit<W: Write>(&self, f: &mut W) -> Result<()> {
        for instr in self {
            instr.emit(f)?;
        }

        Ok(())
    }
}

impl Emit for AsmInstruction {
    fn emit<W: Write>(&self, f: &mut W) -> Result<()> {
        match self {
            AsmInstruction::Label(label) => {
                writeln!(f, "{}:", label)?;
                return Ok(());
            }
            AsmInstruction::Ret => {
                for instr in frame_teardown() {
                    instr.emit(f)?;
                }
                writeln!(f, "    ret")?;
                return Ok(());
            }
            _ => {}
        }

        write!(f, "    ")?;

        match self {
            AsmInstruction::Mov { src, dst } => {
                write!(f, "mov ")?;
                dst.emit(f)?;
                write!(f, ", ")?;
                src.emit(f)?;
            }

            AsmInstruction::Push(operand) => {
                write!(f, "push ")?;
                operand.emit(f)?;
            }

            AsmInstruction::Pop(reg) => {
                write!(f, "pop ")?;
                reg.emit(f)?;
            }

            AsmInstruction::Unary { op, operand } => {
                match op {
                    AsmUnaryOp::Neg => write!(f, "neg ")?,
                }
                operand.emit(f)?;
            }

            AsmInstruction::Binary { op, src, dst } => {
                let instr = match op {
                    AsmBinaryOp::Add => "add",
                    AsmBinaryOp::Sub => "sub",
                    AsmBinaryOp::Mul => "imul",
                };
                write!(f, "{} ", instr)?;
                dst.emit(f)?;
                write!(f, ", ")?;
                src.emit(f)?;
            }

            AsmInstruction::Cmp { lhs, rhs } => {
                write!(f, "cmp ")?;
                lhs.emit(f)?;
                write!(f, ", ")?;
                rhs.emit(f)?;
            }

            AsmInstruction::Idiv(operand) => {
                write!(f, "idiv ")?;
                operand.emit(f)?;
            }

            AsmInstruction::Cqo => write!(f, "cqo")?,

            AsmInstruction::Jmp { target } => write!(f, "jmp {}", target)?,

            AsmInstruction::JmpCC { condition, target } => {
                let suffix = match condition {
                    ConditionCode::E => "e",
                };
                write!(f, "j{} {}", suffix, target)?;
            }

            AsmInstruction::AllocateStack(n) => {
                write!(f, "sub ")?;
                AsmRegister::Sp.emit(f)?;
                write!(f, ", {}", n)?;
            }

            AsmInstruction::Call(name) => write!(f, "call {}", name)?,

            AsmInstruction::Syscall => write!(f, "syscall")?,

            AsmInstruction::Label(_) | AsmInstruction::Ret => unreachable!(),
        }

        writeln!(f)?;
        Ok(())
    }
}

impl Emit for AsmOperand {
    fn emit<W: Write>(&self, f: &mut W) -> Result<()> {
        match self {
            AsmOperand::Imm(n) => write!(f, "{}", n)?,

            AsmOperand::Register(reg) => reg.emit(f)?,

            AsmOperand::Memory(reg, n) => {
                write!(f, "qword [")?;
                reg.emit(f)?;
                match *n {
                    0 => {}
                    n if n > 0 => write!(f, "+{}", n)?,
                    n => write!(f, "-{}", n.unsigned_abs())?,
                }
                write!(f, "]")?;
            }
        }

        Ok(())
    }
}

impl Emit for AsmRegister {
    fn emit<W: Write>(&self, f: &mut W) -> Result<()> {
        let name = match self {
            AsmRegister::Ax => "rax",
            AsmRegister::Bx => "rbx",
            AsmRegister::Cx => "rcx",
            AsmRegister::Dx => "rdx",
            AsmRegister::Di => "rdi",
            AsmRegister::Si => "rsi",
            AsmRegister::R8 => "r8",
            AsmRegister::R9 => "r9",
            AsmRegister::Bp => "rbp",
            AsmRegister::Sp => "rsp",
        };
        write!(f, "{}", name)?;
        Ok(())
    }
}

pub fn emit_to_string(program: &AsmProgram) -> Result<String> {
    let mut buf = vec![];
    program.emit(&mut buf)?;
    String::from_utf8(buf).context("emitted assembly is not valid UTF-8")
}
