//! End-to-end seed scenarios exercising the full pipeline: grammar analysis
//! through canonical-collection construction, table assembly, the driver,
//! and the semantic/IC engine.

use indexmap::{IndexMap, IndexSet};

use simc_front::ast::{Ast, ArgKind, DeclKind, ExprKind, StatKind, Terminal};
use simc_front::canonical::{lr1, slr};
use simc_front::config::{AstMappingDocument, AstMappingEntry, ConflictPolicy, TokenRecord};
use simc_front::driver;
use simc_front::error::Error;
use simc_front::grammar::analyzer::analyze;
use simc_front::grammar::{Cfg, Symbol};
use simc_front::ic::{Instruction, Opcode, Operand};
use simc_front::items::{expand, generate_items};
use simc_front::semantic;
use simc_front::symtab::SymbolKind;
use simc_front::table::{build_lr1_table, build_slr_table};

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

fn num(value: &str) -> Ast {
    Ast::Expr {
        kind: ExprKind::Const,
        children: vec![Ast::Terminal(Terminal {
            name: "num".to_string(),
            value: value.to_string(),
        })],
    }
}

fn var_expr(name: &str) -> Ast {
    Ast::Expr {
        kind: ExprKind::Var,
        children: vec![id(name)],
    }
}

fn func_decl(data_type: &str, name: &str, args: Vec<Ast>, body: Vec<Ast>) -> Ast {
    Ast::Decl {
        kind: DeclKind::Func,
        children: vec![type_node(data_type), id(name), Ast::ArgList(args), Ast::StatList(body)],
    }
}

fn arg(data_type: &str, name: &str) -> Ast {
    Ast::Arg {
        kind: ArgKind::Var,
        children: vec![type_node(data_type), id(name)],
    }
}

// Scenario 1: minimal program.
#[test]
fn minimal_program_declares_main_with_empty_args_and_a_child_scope() {
    let program = Ast::Program(vec![Ast::DeclList(vec![func_decl(
        "int",
        "main",
        vec![],
        vec![Ast::Stat {
            kind: StatKind::Return,
            children: vec![num("0")],
        }],
    )])]);

    let analysis = semantic::run(&program).unwrap();
    let main_symbol = analysis
        .symbols
        .all_in_scope(0)
        .find(|s| s.name == "main" && s.kind == SymbolKind::Function)
        .expect("main symbol");

    assert_eq!(main_symbol.data_type, "int");
    assert_eq!(main_symbol.arg_list, Some(vec![]));
    assert_eq!(main_symbol.direct_child_scope, Some(1));

    let rendered = analysis.ic.render();
    assert!(rendered.contains("ASSIGN RA0"), "expected a return-value ASSIGN into RA:\n{rendered}");
}

// Scenario 2: missing main.
#[test]
fn program_without_main_declaration_is_rejected() {
    let program = Ast::Program(vec![Ast::DeclList(vec![Ast::Decl {
        kind: DeclKind::Var,
        children: vec![type_node("int"), id("x")],
    }])]);

    assert!(matches!(semantic::run(&program), Err(Error::SemanticError(_))));
}

// Scenario 3: dangling-else resolves by shift (ELSE binds to the inner IF).
fn dangling_else_grammar() -> Cfg {
    let stmt = Symbol::nonterminal("Stmt");
    let e = Symbol::nonterminal("E");
    let if_ = Symbol::terminal("IF");
    let then = Symbol::terminal("THEN");
    let else_ = Symbol::terminal("ELSE");
    let other = Symbol::terminal("OTHER");
    let id_term = Symbol::terminal("id");
    let end = Symbol::end();

    let mut production_rules = IndexMap::new();
    production_rules.insert(
        stmt.clone(),
        vec![
            vec![if_.clone(), e.clone(), then.clone(), stmt.clone()],
            vec![if_.clone(), e.clone(), then.clone(), stmt.clone(), else_.clone(), stmt.clone()],
            vec![other.clone()],
        ],
    );
    production_rules.insert(e.clone(), vec![vec![id_term.clone()]]);

    Cfg {
        start_symbol: stmt.clone(),
        terminals: IndexSet::from([if_, then, else_, other, id_term, end]),
        non_terminals: IndexSet::from([stmt, e]),
        production_rules,
        epsilon_production_symbols: IndexSet::new(),
    }
}

fn dangling_else_mapping() -> AstMappingDocument {
    AstMappingDocument(vec![
        AstMappingEntry {
            lhs: "Stmt".to_string(),
            rhs: vec!["IF".to_string(), "E".to_string(), "THEN".to_string(), "Stmt".to_string()],
            node_kind: "StatIf".to_string(),
        },
        AstMappingEntry {
            lhs: "Stmt".to_string(),
            rhs: vec![
                "IF".to_string(),
                "E".to_string(),
                "THEN".to_string(),
                "Stmt".to_string(),
                "ELSE".to_string(),
                "Stmt".to_string(),
            ],
            node_kind: "StatIfElse".to_string(),
        },
        AstMappingEntry {
            lhs: "Stmt".to_string(),
            rhs: vec!["OTHER".to_string()],
            node_kind: "StatCompound".to_string(),
        },
        AstMappingEntry {
            lhs: "E".to_string(),
            rhs: vec!["id".to_string()],
            node_kind: "ExprVar".to_string(),
        },
    ])
}

#[test]
fn dangling_else_attaches_to_the_innermost_if() {
    let expanded = expand(&dangling_else_grammar());
    let item_set = generate_items(&expanded).unwrap();
    let analysis = analyze(&expanded).unwrap();
    let collection = lr1::build_collection(&expanded, &item_set, &analysis).unwrap();
    let table = build_lr1_table(&collection, &analysis, &item_set.end_item, ConflictPolicy::ShiftOverReduce).unwrap();
    let mapping = dangling_else_mapping();

    // IF id THEN IF id THEN OTHER ELSE OTHER
    let tokens = vec![
        TokenRecord { kind: "IF".to_string(), value: String::new() },
        TokenRecord { kind: "id".to_string(), value: "a".to_string() },
        TokenRecord { kind: "THEN".to_string(), value: String::new() },
        TokenRecord { kind: "IF".to_string(), value: String::new() },
        TokenRecord { kind: "id".to_string(), value: "b".to_string() },
        TokenRecord { kind: "THEN".to_string(), value: String::new() },
        TokenRecord { kind: "OTHER".to_string(), value: String::new() },
        TokenRecord { kind: "ELSE".to_string(), value: String::new() },
        TokenRecord { kind: "OTHER".to_string(), value: String::new() },
    ];

    let ast = driver::parse(&expanded, &table, &mapping, &tokens).unwrap();
    assert_eq!(ast.describe(), "StatIf");
    let inner = ast.children().last().expect("inner Stmt child");
    assert_eq!(inner.describe(), "StatIfElse", "ELSE must attach to the inner IF, not the outer one");
}

// Scenario 4: constant folding.
#[test]
fn constant_expression_folds_at_semantic_analysis_time() {
    let folded_expr = Ast::Expr {
        kind: ExprKind::ArithNoConst,
        children: vec![
            num("2"),
            Ast::Terminal(Terminal { name: "+".to_string(), value: "+".to_string() }),
            Ast::Expr {
                kind: ExprKind::ArithNoConst,
                children: vec![
                    num("3"),
                    Ast::Terminal(Terminal { name: "*".to_string(), value: "*".to_string() }),
                    num("4"),
                ],
            },
        ],
    };
    let program = Ast::Program(vec![Ast::DeclList(vec![func_decl(
        "int",
        "main",
        vec![],
        vec![Ast::Stat {
            kind: StatKind::Return,
            children: vec![folded_expr],
        }],
    )])]);

    let analysis = semantic::run(&program).unwrap();
    let has_folded_constant = analysis.ic.instructions.iter().any(|i: &Instruction| {
        i.opcode == Opcode::Assign && i.operand_2 == Some(Operand::Constant("14".to_string()))
    });
    assert!(has_folded_constant, "expected a folded ASSIGN of 14:\n{}", analysis.ic.render());
}

// Scenario 5: function call control transfer.
#[test]
fn function_call_emits_a_goto_to_the_callees_label() {
    let helper = func_decl(
        "int",
        "helper",
        vec![arg("int", "a")],
        vec![Ast::Stat {
            kind: StatKind::Return,
            children: vec![var_expr("a")],
        }],
    );
    let main = func_decl(
        "int",
        "main",
        vec![],
        vec![
            Ast::Decl {
                kind: DeclKind::Var,
                children: vec![type_node("int"), id("x")],
            },
            Ast::Stat {
                kind: StatKind::FuncCall,
                children: vec![
                    id("helper"),
                    Ast::RealArgList(vec![Ast::RealArg(vec![var_expr("x")])]),
                ],
            },
            Ast::Stat {
                kind: StatKind::Return,
                children: vec![num("0")],
            },
        ],
    );
    let program = Ast::Program(vec![Ast::DeclList(vec![helper, main])]);

    let analysis = semantic::run(&program).unwrap();
    let rendered = analysis.ic.render();
    assert!(rendered.contains("GOTO FUNC_helper"), "expected a GOTO to the callee's label:\n{rendered}");
}

// Scenario 6: a grammar ambiguous beyond any finite lookahead is rejected.
fn ambiguous_grammar() -> Cfg {
    let s = Symbol::nonterminal("S");
    let a = Symbol::nonterminal("A");
    let b = Symbol::nonterminal("B");
    let lit = Symbol::terminal("a");
    let end = Symbol::end();

    let mut production_rules = IndexMap::new();
    production_rules.insert(s.clone(), vec![vec![a.clone()], vec![b.clone()]]);
    production_rules.insert(a.clone(), vec![vec![lit.clone()]]);
    production_rules.insert(b.clone(), vec![vec![lit.clone()]]);

    Cfg {
        start_symbol: s.clone(),
        terminals: IndexSet::from([lit, end]),
        non_terminals: IndexSet::from([s, a, b]),
        production_rules,
        epsilon_production_symbols: IndexSet::new(),
    }
}

#[test]
fn genuinely_ambiguous_grammar_is_rejected_as_not_lr1() {
    let expanded = expand(&ambiguous_grammar());
    let item_set = generate_items(&expanded).unwrap();
    let analysis = analyze(&expanded).unwrap();
    let collection = lr1::build_collection(&expanded, &item_set, &analysis).unwrap();
    let result = build_lr1_table(&collection, &analysis, &item_set.end_item, ConflictPolicy::ShiftOverReduce);
    assert!(matches!(result, Err(Error::NotLr1 { .. })));
}

// SLR sanity check carried along with scenario 6: the same grammar trips the
// same reduce/reduce conflict on the SLR path, via the shared `assemble`.
#[test]
fn ambiguous_grammar_is_also_rejected_on_the_slr_path() {
    let expanded = expand(&ambiguous_grammar());
    let item_set = generate_items(&expanded).unwrap();
    let analysis = analyze(&expanded).unwrap();
    let collection = slr::build_collection(&item_set).unwrap();
    let result = build_slr_table(&collection, &analysis, &item_set.end_item, ConflictPolicy::ShiftOverReduce);
    assert!(matches!(result, Err(Error::NotSlr1 { .. })));
}
