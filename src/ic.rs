//! Intermediate-code model and listing renderer (§3 "Intermediate Code").
//!
//! Grounded in `original_source/lab6/include/interm_code/interm_code_model.h`
//! (`RegisterType`/`OperationType`/`LogicalMemSpaceType`/`Operand`/
//! `IntermediateCode`), translated from an optional-field struct with a
//! hand-rolled `toString` into a tagged `Operand` enum and a `Display` impl
//! doing the same column layout.

use std::fmt;

/// `{kind ∈ {T_general, R_general, RA}, id}` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    TGeneral,
    RGeneral,
    Ra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    pub kind: RegisterKind,
    pub id: u32,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            RegisterKind::TGeneral => "T",
            RegisterKind::RGeneral => "R",
            RegisterKind::Ra => "RA",
        };
        write!(f, "{prefix}{}", self.id)
    }
}

/// `{segment ∈ {CODE, DATA, STACK}, offset}` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Code,
    Data,
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogicalAddress {
    pub segment: Segment,
    pub offset: i64,
}

impl fmt::Display for LogicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.segment {
            Segment::Code => "CODE",
            Segment::Data => "DATA",
            Segment::Stack => "STACK",
        };
        write!(f, "{prefix}[{}]", self.offset)
    }
}

/// An ACTION-table-operand-free instruction operand: a register, a logical
/// address, a constant literal, or a label reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Register(Register),
    Address(LogicalAddress),
    Constant(String),
    Label(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{r}"),
            Operand::Address(a) => write!(f, "{a}"),
            Operand::Constant(c) => write!(f, "{c}"),
            Operand::Label(l) => write!(f, "{l}"),
        }
    }
}

/// `{ASSIGN, LOAD, STORE, GOTO, GOTO_IF, ADD, MUL, IS_SMALLER, IS_EQUAL,
/// IS_LESS_EQUAL, EMPTY}` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Assign,
    Load,
    Store,
    Goto,
    GotoIf,
    Add,
    Mul,
    IsSmaller,
    IsEqual,
    IsLessEqual,
    Empty,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Opcode::Assign => "ASSIGN",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Goto => "GOTO",
            Opcode::GotoIf => "GOTO_IF",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::IsSmaller => "IS_SMALLER",
            Opcode::IsEqual => "IS_EQUAL",
            Opcode::IsLessEqual => "IS_LESS_EQUAL",
            Opcode::Empty => "EMPTY",
        };
        write!(f, "{s}")
    }
}

/// One three-address instruction, up to three operands plus an optional
/// label (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand_1: Option<Operand>,
    pub operand_2: Option<Operand>,
    pub operand_3: Option<Operand>,
    pub label: Option<String>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Instruction {
            opcode,
            operand_1: None,
            operand_2: None,
            operand_3: None,
            label: None,
        }
    }

    pub fn with_operands(
        opcode: Opcode,
        operand_1: Option<Operand>,
        operand_2: Option<Operand>,
        operand_3: Option<Operand>,
    ) -> Self {
        Instruction {
            opcode,
            operand_1,
            operand_2,
            operand_3,
            label: None,
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

fn operand_column(operand: &Option<Operand>) -> String {
    operand.as_ref().map(Operand::to_string).unwrap_or_else(|| "-".to_string())
}

/// A flat sequence of [`Instruction`]s (§6 "Intermediate-code output").
#[derive(Debug, Clone, Default)]
pub struct IcListing {
    pub instructions: Vec<Instruction>,
}

impl IcListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn extend(&mut self, other: IcListing) {
        self.instructions.extend(other.instructions);
    }

    /// Renders the listing as `"{zero-padded-index}. OP OP1 OP2 OP3 label: L"`
    /// with missing operands/labels as `-` (§6).
    pub fn render(&self) -> String {
        let width = self.instructions.len().to_string().len().max(1);
        let mut out = String::new();
        for (i, instr) in self.instructions.iter().enumerate() {
            out.push_str(&format!(
                "{:0width$}. {} {} {} {} label: {}\n",
                i,
                instr.opcode,
                operand_column(&instr.operand_1),
                operand_column(&instr.operand_2),
                operand_column(&instr.operand_3),
                instr.label.clone().unwrap_or_else(|| "-".to_string()),
                width = width,
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_pads_index_and_marks_missing_operands() {
        let mut listing = IcListing::new();
        listing.push(Instruction::with_operands(
            Opcode::Goto,
            Some(Operand::Label("L0".to_string())),
            None,
            None,
        ));
        listing.push(Instruction::new(Opcode::Empty).labeled("L0"));
        let rendered = listing.render();
        assert!(rendered.contains("0. GOTO L0 - - label: -"));
        assert!(rendered.contains("1. EMPTY - - - label: L0"));
    }
}
