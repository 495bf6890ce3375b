//! Tagged-variant AST (§3 node vocabulary).
//!
//! Grounded in `original_source/lab6/include/syntax_semantic_analyzer/
//! ast_model.h`'s `ASTNodeType` enum and its per-kind `ASTNodeContent`
//! subclasses, reached there through `dynamic_pointer_cast` +
//! `cast_ast_node_base_ptr_to_specific_node`. This crate has no RTTI, so the
//! cast is replaced by matching on `Ast`'s variants directly.
//!
//! The original additionally stores `data_type`/`value`/`result_register`/
//! `interm_code_list` directly on each node and fills them in by mutation
//! during a post-order `semantic_action` pass, since a later sibling's pass
//! needs an earlier child's computed result. The idiomatic Rust shape for
//! "a post-order pass needs its children's results" is simply returning
//! those results from the recursive call (`crate::semantic`), so this tree
//! only holds what's known at parse time: which grammar shape a node is,
//! and its children.

/// What kind of declaration a `Decl` node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Array,
    Func,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Var,
    Array,
    Func,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Assign,
    ArrayAssign,
    If,
    IfElse,
    While,
    Return,
    Compound,
    FuncCall,
    /// Dangling-else disambiguation: every `if` inside is matched by an
    /// `else` (§4.6/§9 precedence-disambiguation variants).
    IfElseMatched,
    /// Dangling-else disambiguation: the innermost `if` has no `else`.
    IfElseUnmatched,
    IfElseChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    Const,
    Var,
    Func,
    Array,
    /// Precedence-disambiguation variant: an arithmetic expression that is
    /// provably not a bare constant.
    ArithNoConst,
    /// Precedence-disambiguation variant: a parenthesized expression that
    /// is provably not a bare constant.
    ParenNoConst,
    /// Temporary introduced to resolve `*` binding tighter than `+`.
    MulTemp,
    /// Temporary introduced for an atomic (non-further-decomposable) factor.
    AtomicTemp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolKind {
    Op,
    Expr,
}

/// A shifted terminal leaf. `name` is the grammar terminal's symbol name
/// (the CFG is data-driven, §3.2, so there is no fixed closed set of
/// terminal kinds to enumerate here); `value` is the lexer's literal text
/// for this occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub name: String,
    pub value: String,
}

/// The AST. One variant per §3 node kind, each carrying exactly the
/// children a reduction grafted onto it; matching on `Ast` gives
/// exhaustive, compiler-checked access to each kind with no downcasting.
#[derive(Debug, Clone)]
pub enum Ast {
    Program(Vec<Ast>),
    DeclList(Vec<Ast>),
    Decl { kind: DeclKind, children: Vec<Ast> },
    Type(Vec<Ast>),
    ArgList(Vec<Ast>),
    Arg { kind: ArgKind, children: Vec<Ast> },
    StatList(Vec<Ast>),
    Stat { kind: StatKind, children: Vec<Ast> },
    Expr { kind: ExprKind, children: Vec<Ast> },
    Bool { kind: BoolKind, children: Vec<Ast> },
    RealArg(Vec<Ast>),
    RealArgList(Vec<Ast>),
    Terminal(Terminal),
}

impl Ast {
    pub fn children(&self) -> &[Ast] {
        match self {
            Ast::Program(c)
            | Ast::DeclList(c)
            | Ast::Type(c)
            | Ast::ArgList(c)
            | Ast::StatList(c)
            | Ast::RealArg(c)
            | Ast::RealArgList(c)
            | Ast::Decl { children: c, .. }
            | Ast::Arg { children: c, .. }
            | Ast::Stat { children: c, .. }
            | Ast::Expr { children: c, .. }
            | Ast::Bool { children: c, .. } => c,
            Ast::Terminal(_) => &[],
        }
    }

    /// Finds the first direct child that is a `Terminal` named `name`.
    pub fn terminal_child(&self, name: &str) -> Option<&Terminal> {
        self.children().iter().find_map(|c| match c {
            Ast::Terminal(t) if t.name == name => Some(t),
            _ => None,
        })
    }

    /// The `node_kind` string an `AstMappingDocument` entry names for this
    /// shape (used to construct a node at reduce time and in diagnostics).
    pub fn describe(&self) -> &'static str {
        match self {
            Ast::Program(_) => "Program",
            Ast::DeclList(_) => "DeclList",
            Ast::Decl { kind, .. } => match kind {
                DeclKind::Var => "DeclVar",
                DeclKind::Array => "DeclArray",
                DeclKind::Func => "DeclFunc",
            },
            Ast::Type(_) => "Type",
            Ast::ArgList(_) => "ArgList",
            Ast::Arg { kind, .. } => match kind {
                ArgKind::Var => "ArgVar",
                ArgKind::Array => "ArgArray",
                ArgKind::Func => "ArgFunc",
            },
            Ast::StatList(_) => "StatList",
            Ast::Stat { kind, .. } => match kind {
                StatKind::Assign => "StatAssign",
                StatKind::ArrayAssign => "StatArrayAssign",
                StatKind::If => "StatIf",
                StatKind::IfElse => "StatIfElse",
                StatKind::While => "StatWhile",
                StatKind::Return => "StatReturn",
                StatKind::Compound => "StatCompound",
                StatKind::FuncCall => "StatFuncCall",
                StatKind::IfElseMatched => "StatIfElseMatched",
                StatKind::IfElseUnmatched => "StatIfElseUnmatched",
                StatKind::IfElseChain => "StatIfElseChain",
            },
            Ast::Expr { kind, .. } => match kind {
                ExprKind::Const => "ExprConst",
                ExprKind::Var => "ExprVar",
                ExprKind::Func => "ExprFunc",
                ExprKind::Array => "ExprArray",
                ExprKind::ArithNoConst => "ExprArithNoConst",
                ExprKind::ParenNoConst => "ExprParenNoConst",
                ExprKind::MulTemp => "ExprMulTemp",
                ExprKind::AtomicTemp => "ExprAtomicTemp",
            },
            Ast::Bool { kind, .. } => match kind {
                BoolKind::Op => "BoolOp",
                BoolKind::Expr => "BoolExpr",
            },
            Ast::RealArg(_) => "RealArg",
            Ast::RealArgList(_) => "RealArgList",
            Ast::Terminal(_) => "Terminal",
        }
    }

    /// Builds a node of `node_kind` (an `AstMappingDocument` entry's
    /// `node_kind` string) over the given `children`, the way a reduce step
    /// grafts a non-terminal node in §4.6. Unknown strings become a
    /// `SemanticMappingMissing`-flavored error surfaced by the driver.
    pub fn build(node_kind: &str, children: Vec<Ast>) -> Option<Ast> {
        Some(match node_kind {
            "Program" => Ast::Program(children),
            "DeclList" => Ast::DeclList(children),
            "DeclVar" => Ast::Decl { kind: DeclKind::Var, children },
            "DeclArray" => Ast::Decl { kind: DeclKind::Array, children },
            "DeclFunc" => Ast::Decl { kind: DeclKind::Func, children },
            "Type" => Ast::Type(children),
            "ArgList" => Ast::ArgList(children),
            "ArgVar" => Ast::Arg { kind: ArgKind::Var, children },
            "ArgArray" => Ast::Arg { kind: ArgKind::Array, children },
            "ArgFunc" => Ast::Arg { kind: ArgKind::Func, children },
            "StatList" => Ast::StatList(children),
            "StatAssign" => Ast::Stat { kind: StatKind::Assign, children },
            "StatArrayAssign" => Ast::Stat { kind: StatKind::ArrayAssign, children },
            "StatIf" => Ast::Stat { kind: StatKind::If, children },
            "StatIfElse" => Ast::Stat { kind: StatKind::IfElse, children },
            "StatWhile" => Ast::Stat { kind: StatKind::While, children },
            "StatReturn" => Ast::Stat { kind: StatKind::Return, children },
            "StatCompound" => Ast::Stat { kind: StatKind::Compound, children },
            "StatFuncCall" => Ast::Stat { kind: StatKind::FuncCall, children },
            "StatIfElseMatched" => Ast::Stat { kind: StatKind::IfElseMatched, children },
            "StatIfElseUnmatched" => Ast::Stat { kind: StatKind::IfElseUnmatched, children },
            "StatIfElseChain" => Ast::Stat { kind: StatKind::IfElseChain, children },
            "ExprConst" => Ast::Expr { kind: ExprKind::Const, children },
            "ExprVar" => Ast::Expr { kind: ExprKind::Var, children },
            "ExprFunc" => Ast::Expr { kind: ExprKind::Func, children },
            "ExprArray" => Ast::Expr { kind: ExprKind::Array, children },
            "ExprArithNoConst" => Ast::Expr { kind: ExprKind::ArithNoConst, children },
            "ExprParenNoConst" => Ast::Expr { kind: ExprKind::ParenNoConst, children },
            "ExprMulTemp" => Ast::Expr { kind: ExprKind::MulTemp, children },
            "ExprAtomicTemp" => Ast::Expr { kind: ExprKind::AtomicTemp, children },
            "BoolOp" => Ast::Bool { kind: BoolKind::Op, children },
            "BoolExpr" => Ast::Bool { kind: BoolKind::Expr, children },
            "RealArg" => Ast::RealArg(children),
            "RealArgList" => Ast::RealArgList(children),
            _ => return None,
        })
    }
}
