//! Semantic Engine (§4.7): one post-order walk producing the symbol table,
//! scope tree, and intermediate-code listing together.
//!
//! Grounded in `original_source/lab6/src/syntax_semantic_analyzer/
//! ast_interm_code_gen.cpp` and `syntax_semantic_analyzer.cpp`. The
//! original mutates fields directly on each `shared_ptr<ASTNodeContent>`
//! so a parent's `semantic_action` can read an already-visited child's
//! `data_type`/`result_register`/`interm_code_list`; here each recursive
//! call simply *returns* that information (`ExprResult`/`BoolResult`),
//! which is the ordinary way a post-order pass threads child results to
//! its caller in Rust.
//!
//! Node-shape convention (this crate's own, since the CFG is data-driven
//! and carries no fixed grammar text): `Decl{Var}` = `[Type, id]`,
//! `Decl{Array}` = `[Type, id, num]`, `Decl{Func}` = `[Type, id, ArgList,
//! StatList]`; `Arg{Var}` = `[Type, id]`; `Stat::Assign` = `[id, Expr]`;
//! `Stat::ArrayAssign` = `[id, Expr(index), Expr(value)]`; `Stat::If` =
//! `[Bool, StatList]`; `Stat::IfElse` (and the dangling-else variants,
//! emitted identically) = `[Bool, StatList, StatList]`; `Stat::While` =
//! `[Bool, StatList]`; `Stat::Return` = `[Expr]`; `Stat::Compound` =
//! `[StatList]` (no scope push, §4.7); `Stat::FuncCall` = `[id,
//! RealArgList]`; `Expr::Const` = `[Terminal(num|flo)]`; `Expr::Var` =
//! `[id]`; `Expr::Array` = `[id, Expr(index)]`; `Expr::Func` = `[id,
//! RealArgList]`; the precedence-disambiguation `Expr` kinds wrap either a
//! single child (pass-through) or two `Expr` children plus an operator
//! terminal; `Bool::Op` = `[Expr, Terminal(relop), Expr]`.

use crate::ast::{Ast, DeclKind, ExprKind, StatKind};
use crate::error::{Error, Result};
use crate::ic::{IcListing, Instruction, Opcode, Operand, Register};
use crate::simulator::{generate_func_header, LogicalEnvSimulator};
use crate::symtab::{ScopeTable, SymbolEntry, SymbolKind, SymbolTable, FLOAT_MEMORY_SIZE, INT_MEMORY_SIZE};

pub struct Analysis {
    pub symbols: SymbolTable,
    pub scopes: ScopeTable,
    pub ic: IcListing,
}

struct Context {
    symbols: SymbolTable,
    scopes: ScopeTable,
    sim: LogicalEnvSimulator,
}

struct ExprResult {
    data_type: String,
    register: Register,
    ic: IcListing,
}

struct BoolResult {
    register: Register,
    ic: IcListing,
}

fn memory_size_of(data_type: &str) -> Result<i64> {
    match data_type {
        "int" => Ok(INT_MEMORY_SIZE),
        "float" => Ok(FLOAT_MEMORY_SIZE),
        other => Err(Error::SemanticError(format!("unknown data type `{other}`"))),
    }
}

/// Recursively unwraps nested `*List` wrappers (`DeclList`, `StatList`,
/// `ArgList`, `RealArgList`) into the flat, ordered sequence of item nodes
/// they wrap, independent of whether the grammar built the list left- or
/// right-recursively.
fn flatten_children(node: &Ast) -> Vec<&Ast> {
    let mut out = Vec::new();
    for child in node.children() {
        match child {
            Ast::DeclList(_) | Ast::StatList(_) | Ast::ArgList(_) | Ast::RealArgList(_) => {
                out.extend(flatten_children(child));
            }
            _ => out.push(child),
        }
    }
    out
}

fn type_of_decl_type_node(node: &Ast) -> Result<String> {
    node.children()
        .iter()
        .find_map(|c| match c {
            Ast::Terminal(t) if t.name == "int" || t.name == "float" || t.name == "void" => Some(t.name.clone()),
            _ => None,
        })
        .ok_or_else(|| Error::SemanticError("Type node has no int/float/void terminal".to_string()))
}

/// Runs the full semantic pass and IC generation over a driver-built AST,
/// returning the populated symbol table, scope tree, and IC listing.
#[tracing::instrument(skip(ast))]
pub fn run(ast: &Ast) -> Result<Analysis> {
    let mut ctx = Context {
        symbols: SymbolTable::new(),
        scopes: ScopeTable::new(),
        sim: LogicalEnvSimulator::new(),
    };

    let decl_list = ast
        .children()
        .iter()
        .find(|c| matches!(c, Ast::DeclList(_)))
        .ok_or_else(|| Error::SemanticError("Program node has no DeclList child".to_string()))?;

    let ic = analyze_decl_list(decl_list, 0, &mut ctx)?;

    if ctx
        .symbols
        .all_in_scope(0)
        .find(|s| s.kind == SymbolKind::Function && s.name == "main")
        .is_none()
    {
        return Err(Error::SemanticError("program has no `main` function".to_string()));
    }

    Ok(Analysis {
        symbols: ctx.symbols,
        scopes: ctx.scopes,
        ic,
    })
}

fn analyze_decl_list(node: &Ast, scope_id: u32, ctx: &mut Context) -> Result<IcListing> {
    let mut ic = IcListing::new();
    for item in flatten_children(node) {
        match item {
            Ast::Decl { kind, children } => ic.extend(analyze_decl(*kind, children, scope_id, ctx)?),
            other => return Err(Error::SemanticError(format!("expected Decl in DeclList, found {}", other.describe()))),
        }
    }
    Ok(ic)
}

fn analyze_decl(kind: DeclKind, children: &[Ast], scope_id: u32, ctx: &mut Context) -> Result<IcListing> {
    let data_type = type_of_decl_type_node(&children[0])?;
    let name = match &children[1] {
        Ast::Terminal(t) if t.name == "id" => t.value.clone(),
        _ => return Err(Error::SemanticError("declaration has no `id` terminal".to_string())),
    };

    match kind {
        DeclKind::Var => {
            let memory_size = memory_size_of(&data_type)?;
            let offset = ctx.sim.reserve_memory(memory_size);
            ctx.symbols.add_symbol(SymbolEntry {
                name: name.clone(),
                kind: SymbolKind::Variable,
                scope_id,
                data_type,
                memory_size,
                array_length: None,
                arg_list: None,
                direct_child_scope: None,
            })?;
            let reg = ctx.sim.new_treg(scope_id);
            ctx.sim.register_var(scope_id, &name, reg);
            let mut ic = IcListing::new();
            ic.push(Instruction::with_operands(
                Opcode::Load,
                Some(Operand::Register(reg)),
                Some(Operand::Address(crate::ic::LogicalAddress {
                    segment: crate::ic::Segment::Data,
                    offset,
                })),
                None,
            ));
            Ok(ic)
        }

        DeclKind::Array => {
            let length_terminal = match &children[2] {
                Ast::Terminal(t) if t.name == "num" => t,
                _ => return Err(Error::SemanticError("array declaration has no length literal".to_string())),
            };
            let length: i64 = length_terminal
                .value
                .parse()
                .map_err(|_| Error::SemanticError(format!("invalid array length `{}`", length_terminal.value)))?;
            let element_size = memory_size_of(&data_type)?;
            let memory_size = element_size * length;
            let offset = ctx.sim.reserve_memory(memory_size);
            ctx.symbols.add_symbol(SymbolEntry {
                name: name.clone(),
                kind: SymbolKind::Array,
                scope_id,
                data_type,
                memory_size,
                array_length: Some(length),
                arg_list: None,
                direct_child_scope: None,
            })?;
            let reg = ctx.sim.new_treg(scope_id);
            ctx.sim.register_arr(scope_id, &name, reg);
            let mut ic = IcListing::new();
            ic.push(Instruction::with_operands(
                Opcode::Load,
                Some(Operand::Register(reg)),
                Some(Operand::Address(crate::ic::LogicalAddress {
                    segment: crate::ic::Segment::Data,
                    offset,
                })),
                None,
            ));
            Ok(ic)
        }

        DeclKind::Func => {
            let arg_list_node = &children[2];
            let stat_list_node = &children[3];
            let arg_items = flatten_children(arg_list_node);

            let mut arg_names = Vec::new();
            let mut typed_args = Vec::new();
            for arg in &arg_items {
                let Ast::Arg { children: arg_children, .. } = arg else {
                    return Err(Error::SemanticError("ArgList contains a non-Arg node".to_string()));
                };
                let arg_type = type_of_decl_type_node(&arg_children[0])?;
                let arg_name = match &arg_children[1] {
                    Ast::Terminal(t) if t.name == "id" => t.value.clone(),
                    _ => return Err(Error::SemanticError("Arg node has no `id` terminal".to_string())),
                };
                arg_names.push(arg_name.clone());
                typed_args.push((arg_name, arg_type));
            }

            let label = format!("FUNC_{name}");
            ctx.sim.register_func_label(&name, &label);
            let child_scope = ctx.scopes.enter();

            ctx.symbols.add_symbol(SymbolEntry {
                name: name.clone(),
                kind: SymbolKind::Function,
                scope_id,
                data_type,
                memory_size: 0,
                array_length: None,
                arg_list: Some(arg_names),
                direct_child_scope: Some(child_scope),
            })?;

            for (arg_name, arg_type) in typed_args {
                let memory_size = memory_size_of(&arg_type)?;
                ctx.symbols.add_symbol(SymbolEntry {
                    name: arg_name.clone(),
                    kind: SymbolKind::Variable,
                    scope_id: child_scope,
                    data_type: arg_type,
                    memory_size,
                    array_length: None,
                    arg_list: None,
                    direct_child_scope: None,
                })?;
                let reg = ctx.sim.new_treg(child_scope);
                ctx.sim.register_var(child_scope, &arg_name, reg);
            }

            let body_ic = analyze_stat_list(stat_list_node, child_scope, ctx)?;
            ctx.scopes.exit()?;

            let mut ic = generate_func_header(&label);
            ic.extend(body_ic);
            Ok(ic)
        }
    }
}

fn analyze_stat_list(node: &Ast, scope_id: u32, ctx: &mut Context) -> Result<IcListing> {
    let mut ic = IcListing::new();
    for item in flatten_children(node) {
        match item {
            Ast::Stat { kind, children } => ic.extend(analyze_stat(*kind, children, scope_id, ctx)?),
            other => return Err(Error::SemanticError(format!("expected Stat in StatList, found {}", other.describe()))),
        }
    }
    Ok(ic)
}

fn analyze_stat(kind: StatKind, children: &[Ast], scope_id: u32, ctx: &mut Context) -> Result<IcListing> {
    match kind {
        StatKind::Assign => {
            let name = match &children[0] {
                Ast::Terminal(t) if t.name == "id" => t.value.clone(),
                _ => return Err(Error::SemanticError("assignment has no `id` terminal".to_string())),
            };
            if ctx.symbols.find_in_scope_chain(&name, scope_id, &ctx.scopes).is_none() {
                return Err(Error::SemanticError(format!("assignment to undeclared variable `{name}`")));
            }
            let rhs = analyze_expr(&children[1], scope_id, ctx)?;
            let reg = ctx.sim.var_reg(scope_id, &name)?;
            let mut ic = rhs.ic;
            ic.push(Instruction::with_operands(
                Opcode::Assign,
                Some(Operand::Register(reg)),
                Some(Operand::Register(rhs.register)),
                None,
            ));
            Ok(ic)
        }

        StatKind::ArrayAssign => {
            let name = match &children[0] {
                Ast::Terminal(t) if t.name == "id" => t.value.clone(),
                _ => return Err(Error::SemanticError("array assignment has no `id` terminal".to_string())),
            };
            let index = analyze_expr(&children[1], scope_id, ctx)?;
            let value = analyze_expr(&children[2], scope_id, ctx)?;
            let base = ctx.sim.arr_reg(scope_id, &name)?;
            let addr_reg = ctx.sim.new_treg(scope_id);
            let mut ic = index.ic;
            ic.extend(value.ic);
            ic.push(Instruction::with_operands(
                Opcode::Add,
                Some(Operand::Register(addr_reg)),
                Some(Operand::Register(base)),
                Some(Operand::Register(index.register)),
            ));
            ic.push(Instruction::with_operands(
                Opcode::Store,
                Some(Operand::Register(addr_reg)),
                Some(Operand::Register(value.register)),
                None,
            ));
            Ok(ic)
        }

        StatKind::If => {
            let cond = analyze_bool(&children[0], scope_id, ctx)?;
            let body = analyze_stat_list(&children[1], scope_id, ctx)?;
            let start_label = ctx.sim.new_temp_label(scope_id);
            let true_label = ctx.sim.new_temp_label(scope_id);
            let end_label = ctx.sim.new_temp_label(scope_id);

            let mut ic = cond.ic;
            ic.push(
                Instruction::with_operands(
                    Opcode::GotoIf,
                    Some(Operand::Register(cond.register)),
                    Some(Operand::Label(true_label.clone())),
                    None,
                )
                .labeled(start_label),
            );
            ic.push(Instruction::with_operands(Opcode::Goto, Some(Operand::Label(end_label.clone())), None, None));
            ic.push(Instruction::new(Opcode::Empty).labeled(true_label));
            ic.extend(body);
            ic.push(Instruction::new(Opcode::Empty).labeled(end_label));
            Ok(ic)
        }

        StatKind::IfElse | StatKind::IfElseMatched | StatKind::IfElseUnmatched | StatKind::IfElseChain => {
            let cond = analyze_bool(&children[0], scope_id, ctx)?;
            let true_branch = analyze_stat_list(&children[1], scope_id, ctx)?;
            let false_branch = analyze_stat_list(&children[2], scope_id, ctx)?;
            let start_label = ctx.sim.new_temp_label(scope_id);
            let true_label = ctx.sim.new_temp_label(scope_id);
            let else_label = ctx.sim.new_temp_label(scope_id);
            let end_label = ctx.sim.new_temp_label(scope_id);

            let mut ic = cond.ic;
            ic.push(
                Instruction::with_operands(
                    Opcode::GotoIf,
                    Some(Operand::Register(cond.register)),
                    Some(Operand::Label(true_label.clone())),
                    None,
                )
                .labeled(start_label),
            );
            ic.push(Instruction::with_operands(Opcode::Goto, Some(Operand::Label(else_label.clone())), None, None));
            ic.push(Instruction::new(Opcode::Empty).labeled(true_label));
            ic.extend(true_branch);
            ic.push(Instruction::with_operands(Opcode::Goto, Some(Operand::Label(end_label.clone())), None, None));
            ic.push(Instruction::new(Opcode::Empty).labeled(else_label));
            ic.extend(false_branch);
            ic.push(Instruction::new(Opcode::Empty).labeled(end_label));
            Ok(ic)
        }

        StatKind::While => {
            let cond = analyze_bool(&children[0], scope_id, ctx)?;
            let body = analyze_stat_list(&children[1], scope_id, ctx)?;
            let loop_start_label = ctx.sim.new_temp_label(scope_id);
            let loop_end_label = ctx.sim.new_temp_label(scope_id);
            let loop_true_label = ctx.sim.new_temp_label(scope_id);

            let mut ic = cond.ic;
            ic.push(
                Instruction::with_operands(
                    Opcode::GotoIf,
                    Some(Operand::Register(cond.register)),
                    Some(Operand::Label(loop_true_label.clone())),
                    None,
                )
                .labeled(loop_start_label.clone()),
            );
            ic.push(Instruction::with_operands(Opcode::Goto, Some(Operand::Label(loop_end_label.clone())), None, None));
            ic.push(Instruction::new(Opcode::Empty).labeled(loop_true_label));
            ic.extend(body);
            // Back-edge the original lab source omits: re-evaluate the
            // condition on every iteration instead of running once.
            ic.push(Instruction::with_operands(Opcode::Goto, Some(Operand::Label(loop_start_label)), None, None));
            ic.push(Instruction::new(Opcode::Empty).labeled(loop_end_label));
            Ok(ic)
        }

        StatKind::Return => {
            let expr = analyze_expr(&children[0], scope_id, ctx)?;
            let func_scope = scope_id;
            let parent = ctx
                .scopes
                .parent_of(func_scope)
                .ok_or_else(|| Error::SemanticError("return statement outside of any function".to_string()))?;
            let func_symbol = ctx
                .symbols
                .all_in_scope(parent)
                .find(|s| s.kind == SymbolKind::Function && s.direct_child_scope == Some(func_scope))
                .ok_or_else(|| Error::SemanticError("return statement's enclosing function symbol not found".to_string()))?;
            if func_symbol.data_type != expr.data_type {
                return Err(Error::SemanticError(format!(
                    "function `{}` declared to return `{}` but returned `{}`",
                    func_symbol.name, func_symbol.data_type, expr.data_type
                )));
            }
            let ra = Register {
                kind: crate::ic::RegisterKind::Ra,
                id: 0,
            };
            let mut ic = expr.ic;
            ic.push(Instruction::with_operands(
                Opcode::Assign,
                Some(Operand::Register(ra)),
                Some(Operand::Register(expr.register)),
                None,
            ));
            Ok(ic)
        }

        StatKind::Compound => analyze_stat_list(&children[0], scope_id, ctx),

        StatKind::FuncCall => {
            let name = match &children[0] {
                Ast::Terminal(t) if t.name == "id" => t.value.clone(),
                _ => return Err(Error::SemanticError("function call has no `id` terminal".to_string())),
            };
            let real_args = flatten_children(&children[1]);
            let (expected_arity, label) = {
                let symbol = ctx
                    .symbols
                    .all_in_scope(0)
                    .chain(ctx.symbols.all_in_scope(scope_id))
                    .find(|s| s.kind == SymbolKind::Function && s.name == name)
                    .ok_or_else(|| Error::SemanticError(format!("call to undeclared function `{name}`")))?;
                (symbol.arg_list.as_ref().map(Vec::len).unwrap_or(0), ctx.sim.func_label(&name)?.to_string())
            };
            if real_args.len() != expected_arity {
                return Err(Error::SemanticError(format!(
                    "function `{name}` expects {expected_arity} arguments, found {}",
                    real_args.len()
                )));
            }
            let mut ic = IcListing::new();
            for arg in real_args {
                let Ast::RealArg(arg_children) = arg else {
                    return Err(Error::SemanticError("RealArgList contains a non-RealArg node".to_string()));
                };
                let arg_expr = analyze_expr(&arg_children[0], scope_id, ctx)?;
                ic.extend(arg_expr.ic);
            }
            ic.push(Instruction::with_operands(Opcode::Goto, Some(Operand::Label(label)), None, None));
            Ok(ic)
        }
    }
}

fn analyze_expr(node: &Ast, scope_id: u32, ctx: &mut Context) -> Result<ExprResult> {
    let Ast::Expr { kind, children } = node else {
        return Err(Error::SemanticError(format!("expected Expr node, found {}", node.describe())));
    };

    match kind {
        ExprKind::Const => {
            let terminal = match &children[0] {
                Ast::Terminal(t) => t,
                _ => return Err(Error::SemanticError("EXPR_CONST has no literal terminal".to_string())),
            };
            let data_type = match terminal.name.as_str() {
                "num" => "int",
                "flo" => "float",
                other => return Err(Error::SemanticError(format!("unexpected literal kind `{other}`"))),
            }
            .to_string();
            let reg = ctx.sim.new_treg(scope_id);
            let mut ic = IcListing::new();
            ic.push(Instruction::with_operands(
                Opcode::Assign,
                Some(Operand::Register(reg)),
                Some(Operand::Constant(terminal.value.clone())),
                None,
            ));
            Ok(ExprResult { data_type, register: reg, ic })
        }

        ExprKind::Var => {
            let name = match &children[0] {
                Ast::Terminal(t) if t.name == "id" => t.value.clone(),
                _ => return Err(Error::SemanticError("EXPR_VAR has no `id` terminal".to_string())),
            };
            let symbol = ctx
                .symbols
                .find_in_scope_chain(&name, scope_id, &ctx.scopes)
                .ok_or_else(|| Error::SemanticError(format!("use of undeclared variable `{name}`")))?
                .clone();
            let reg = ctx.sim.var_reg(symbol.scope_id, &name)?;
            Ok(ExprResult {
                data_type: symbol.data_type,
                register: reg,
                ic: IcListing::new(),
            })
        }

        ExprKind::Array => {
            let name = match &children[0] {
                Ast::Terminal(t) if t.name == "id" => t.value.clone(),
                _ => return Err(Error::SemanticError("EXPR_ARRAY has no `id` terminal".to_string())),
            };
            let symbol = ctx
                .symbols
                .find_in_scope_chain(&name, scope_id, &ctx.scopes)
                .ok_or_else(|| Error::SemanticError(format!("use of undeclared array `{name}`")))?
                .clone();
            if symbol.kind != SymbolKind::Array {
                return Err(Error::SemanticError(format!("`{name}` is not an array")));
            }
            let index = analyze_expr(&children[1], scope_id, ctx)?;
            if index.data_type != "int" {
                return Err(Error::SemanticError("array index must be of type int".to_string()));
            }
            let base = ctx.sim.arr_reg(symbol.scope_id, &name)?;
            let addr_reg = ctx.sim.new_treg(scope_id);
            let value_reg = ctx.sim.new_treg(scope_id);
            let mut ic = index.ic;
            ic.push(Instruction::with_operands(
                Opcode::Add,
                Some(Operand::Register(addr_reg)),
                Some(Operand::Register(base)),
                Some(Operand::Register(index.register)),
            ));
            ic.push(Instruction::with_operands(
                Opcode::Load,
                Some(Operand::Register(value_reg)),
                Some(Operand::Register(addr_reg)),
                None,
            ));
            Ok(ExprResult {
                data_type: symbol.data_type,
                register: value_reg,
                ic,
            })
        }

        ExprKind::Func => {
            let name = match &children[0] {
                Ast::Terminal(t) if t.name == "id" => t.value.clone(),
                _ => return Err(Error::SemanticError("EXPR_FUNC has no `id` terminal".to_string())),
            };
            let real_args = flatten_children(&children[1]);
            let (data_type, expected_arity, label) = {
                let symbol = ctx
                    .symbols
                    .all_in_scope(0)
                    .find(|s| s.kind == SymbolKind::Function && s.name == name)
                    .ok_or_else(|| Error::SemanticError(format!("call to undeclared function `{name}`")))?;
                (
                    symbol.data_type.clone(),
                    symbol.arg_list.as_ref().map(Vec::len).unwrap_or(0),
                    ctx.sim.func_label(&name)?.to_string(),
                )
            };
            if real_args.len() != expected_arity {
                return Err(Error::SemanticError(format!(
                    "function `{name}` expects {expected_arity} arguments, found {}",
                    real_args.len()
                )));
            }
            let mut ic = IcListing::new();
            for arg in real_args {
                let Ast::RealArg(arg_children) = arg else {
                    return Err(Error::SemanticError("RealArgList contains a non-RealArg node".to_string()));
                };
                let arg_expr = analyze_expr(&arg_children[0], scope_id, ctx)?;
                ic.extend(arg_expr.ic);
            }
            ic.push(Instruction::with_operands(Opcode::Goto, Some(Operand::Label(label)), None, None));
            let ra = Register {
                kind: crate::ic::RegisterKind::Ra,
                id: 0,
            };
            let result_reg = ctx.sim.new_treg(scope_id);
            ic.push(Instruction::with_operands(
                Opcode::Assign,
                Some(Operand::Register(result_reg)),
                Some(Operand::Register(ra)),
                None,
            ));
            Ok(ExprResult {
                data_type,
                register: result_reg,
                ic,
            })
        }

        ExprKind::ParenNoConst => analyze_expr(&children[0], scope_id, ctx),

        ExprKind::ArithNoConst | ExprKind::MulTemp | ExprKind::AtomicTemp => {
            if children.len() == 1 {
                return analyze_expr(&children[0], scope_id, ctx);
            }

            let left = analyze_expr(&children[0], scope_id, ctx)?;
            let right = analyze_expr(&children[2], scope_id, ctx)?;
            let is_mul = children
                .iter()
                .any(|c| matches!(c, Ast::Terminal(t) if t.name == "*"));
            let opcode = if is_mul { Opcode::Mul } else { Opcode::Add };

            if left.data_type == right.data_type && is_constant(&children[0]) && is_constant(&children[2]) {
                // Constant folding (§4.7): two EXPR_CONST operands of
                // matching type fold at analysis time instead of emitting
                // an arithmetic instruction.
                let folded = fold(opcode, &left, &right)?;
                let reg = ctx.sim.new_treg(scope_id);
                let mut ic = IcListing::new();
                ic.push(Instruction::with_operands(
                    Opcode::Assign,
                    Some(Operand::Register(reg)),
                    Some(Operand::Constant(folded)),
                    None,
                ));
                return Ok(ExprResult {
                    data_type: left.data_type,
                    register: reg,
                    ic,
                });
            }

            if left.data_type != right.data_type {
                return Err(Error::SemanticError(format!(
                    "arithmetic between mismatched types `{}` and `{}`",
                    left.data_type, right.data_type
                )));
            }

            let reg = ctx.sim.new_treg(scope_id);
            let mut ic = left.ic;
            ic.extend(right.ic);
            ic.push(Instruction::with_operands(
                opcode,
                Some(Operand::Register(reg)),
                Some(Operand::Register(left.register)),
                Some(Operand::Register(right.register)),
            ));
            Ok(ExprResult {
                data_type: left.data_type,
                register: reg,
                ic,
            })
        }
    }
}

fn is_constant(node: &Ast) -> bool {
    matches!(node, Ast::Expr { kind: ExprKind::Const, .. })
}

fn fold(opcode: Opcode, left: &ExprResult, right: &ExprResult) -> Result<String> {
    // Constants are carried through as the literal text assigned into each
    // operand's register; re-derive the numeric value from the ASSIGN
    // instruction that produced it.
    let value_of = |r: &ExprResult| -> Result<f64> {
        r.ic.instructions
            .iter()
            .find_map(|i| match &i.operand_2 {
                Some(Operand::Constant(c)) => c.parse::<f64>().ok(),
                _ => None,
            })
            .ok_or_else(|| Error::SemanticError("constant-fold operand has no literal value".to_string()))
    };
    let l = value_of(left)?;
    let r = value_of(right)?;
    let result = match opcode {
        Opcode::Add => l + r,
        Opcode::Mul => l * r,
        _ => return Err(Error::SemanticError("constant folding only supports ADD/MUL".to_string())),
    };
    if left.data_type == "int" {
        Ok((result as i64).to_string())
    } else {
        Ok(result.to_string())
    }
}

fn analyze_bool(node: &Ast, scope_id: u32, ctx: &mut Context) -> Result<BoolResult> {
    let Ast::Bool { kind, children } = node else {
        return Err(Error::SemanticError(format!("expected Bool node, found {}", node.describe())));
    };

    if *kind == crate::ast::BoolKind::Expr {
        // A bare expression used as a truth value: GOTO_IF already tests its
        // register for non-zero, so no comparison instruction is needed.
        let expr = analyze_expr(&children[0], scope_id, ctx)?;
        return Ok(BoolResult {
            register: expr.register,
            ic: expr.ic,
        });
    }

    let left = analyze_expr(&children[0], scope_id, ctx)?;
    let right = analyze_expr(&children[2], scope_id, ctx)?;
    let relop = match &children[1] {
        Ast::Terminal(t) if t.name == "relop" => t.value.clone(),
        _ => return Err(Error::SemanticError("BOOL_OP has no relop terminal".to_string())),
    };

    let (opcode, swap) = match relop.as_str() {
        "<" => (Opcode::IsSmaller, false),
        ">" => (Opcode::IsSmaller, true),
        "==" => (Opcode::IsEqual, false),
        "<=" => (Opcode::IsLessEqual, false),
        ">=" => (Opcode::IsLessEqual, true),
        other => return Err(Error::SemanticError(format!("unsupported relational operator `{other}`"))),
    };

    let (lhs, rhs) = if swap { (&right, &left) } else { (&left, &right) };
    let reg = ctx.sim.new_treg(scope_id);
    let mut ic = left.ic.clone();
    ic.extend(right.ic.clone());
    ic.push(Instruction::with_operands(
        opcode,
        Some(Operand::Register(reg)),
        Some(Operand::Register(lhs.register)),
        Some(Operand::Register(rhs.register)),
    ));
    Ok(BoolResult { register: reg, ic })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ArgKind, BoolKind, Terminal};

    fn type_node(name: &str) -> Ast {
        Ast::Type(vec![Ast::Terminal(Terminal {
            name: name.to_string(),
            value: name.to_string(),
        })])
    }

    fn id(value: &str) -> Ast {
        Ast::Terminal(Terminal {
            name: "id".to_string(),
            value: value.to_string(),
        })
    }

    fn const_expr(kind: &str, value: &str) -> Ast {
        Ast::Expr {
            kind: ExprKind::Const,
            children: vec![Ast::Terminal(Terminal {
                name: kind.to_string(),
                value: value.to_string(),
            })],
        }
    }

    fn main_func(body: Vec<Ast>) -> Ast {
        Ast::Decl {
            kind: DeclKind::Func,
            children: vec![
                type_node("int"),
                id("main"),
                Ast::ArgList(vec![]),
                Ast::StatList(body),
            ],
        }
    }

    #[test]
    fn program_without_main_is_rejected() {
        let program = Ast::Program(vec![Ast::DeclList(vec![Ast::Decl {
            kind: DeclKind::Var,
            children: vec![type_node("int"), id("x")],
        }])]);
        assert!(matches!(run(&program), Err(Error::SemanticError(_))));
    }

    #[test]
    fn minimal_main_program_analyzes_successfully() {
        let program = Ast::Program(vec![Ast::DeclList(vec![main_func(vec![Ast::Stat {
            kind: StatKind::Return,
            children: vec![const_expr("num", "0")],
        }])])]);
        let analysis = run(&program).unwrap();
        assert!(analysis
            .symbols
            .all_in_scope(0)
            .any(|s| s.name == "main" && s.kind == SymbolKind::Function));
        assert!(!analysis.ic.instructions.is_empty());
    }

    #[test]
    fn constant_folding_produces_single_assign() {
        let mut ctx = Context {
            symbols: SymbolTable::new(),
            scopes: ScopeTable::new(),
            sim: LogicalEnvSimulator::new(),
        };
        let expr = Ast::Expr {
            kind: ExprKind::ArithNoConst,
            children: vec![
                const_expr("num", "2"),
                Ast::Terminal(Terminal {
                    name: "+".to_string(),
                    value: "+".to_string(),
                }),
                const_expr("num", "3"),
            ],
        };
        let result = analyze_expr(&expr, 0, &mut ctx).unwrap();
        assert_eq!(result.ic.instructions.len(), 1);
        assert_eq!(
            result.ic.instructions[0].operand_2,
            Some(Operand::Constant("5".to_string()))
        );
    }

    #[test]
    fn duplicate_variable_declaration_is_rejected() {
        let program = Ast::Program(vec![Ast::DeclList(vec![
            Ast::Decl {
                kind: DeclKind::Var,
                children: vec![type_node("int"), id("x")],
            },
            Ast::Decl {
                kind: DeclKind::Var,
                children: vec![type_node("int"), id("x")],
            },
            main_func(vec![Ast::Stat {
                kind: StatKind::Return,
                children: vec![const_expr("num", "0")],
            }]),
        ])]);
        assert!(matches!(run(&program), Err(Error::SemanticError(_))));
    }

    #[test]
    fn while_loop_emits_a_back_edge_to_its_start_label() {
        let mut ctx = Context {
            symbols: SymbolTable::new(),
            scopes: ScopeTable::new(),
            sim: LogicalEnvSimulator::new(),
        };
        let cond = Ast::Bool {
            kind: BoolKind::Op,
            children: vec![
                const_expr("num", "1"),
                Ast::Terminal(Terminal {
                    name: "relop".to_string(),
                    value: "<".to_string(),
                }),
                const_expr("num", "2"),
            ],
        };
        let stat = Ast::Stat {
            kind: StatKind::While,
            children: vec![cond, Ast::StatList(vec![])],
        };
        let Ast::Stat { kind, children } = stat else { unreachable!() };
        let ic = analyze_stat(kind, &children, 0, &mut ctx).unwrap();

        let loop_start_label = ic.instructions[0].label.clone().unwrap();
        let has_back_edge = ic.instructions.iter().any(|i| {
            i.opcode == Opcode::Goto && i.operand_1 == Some(Operand::Label(loop_start_label.clone()))
        });
        // Two GOTOs target the start label context: the forward skip does
        // not target loop_start, only the corrected back-edge does.
        assert!(has_back_edge, "missing WHILE back-edge to {loop_start_label}");
    }

    #[test]
    fn arg_kind_round_trips_through_describe() {
        assert_eq!(
            Ast::Arg {
                kind: ArgKind::Var,
                children: vec![]
            }
            .describe(),
            "ArgVar"
        );
    }
}
