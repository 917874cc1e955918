use jackc::analyzer::{Scope, SymbolKind, SymbolTable};
use jackc::codegen::Segment;
use jackc::CompileError;

fn point_table() -> SymbolTable {
    let mut table = SymbolTable::new("Point");
    table.define("x", "int", SymbolKind::Field).unwrap();
    table.define("y", "int", SymbolKind::Field).unwrap();
    table.define("count", "int", SymbolKind::Static).unwrap();
    table
}

#[test]
fn indices_are_dense_per_kind() {
    let mut table = point_table();
    table.start_subroutine("distance");
    table.define("other", "Point", SymbolKind::Argument).unwrap();
    table.define("dx", "int", SymbolKind::Local).unwrap();
    table.define("dy", "int", SymbolKind::Local).unwrap();

    assert_eq!(table.index_of("x").unwrap(), 0);
    assert_eq!(table.index_of("y").unwrap(), 1);
    assert_eq!(table.index_of("count").unwrap(), 0);
    assert_eq!(table.index_of("other").unwrap(), 0);
    assert_eq!(table.index_of("dx").unwrap(), 0);
    assert_eq!(table.index_of("dy").unwrap(), 1);

    assert_eq!(table.var_count(SymbolKind::Field), 2);
    assert_eq!(table.var_count(SymbolKind::Static), 1);
    assert_eq!(table.var_count(SymbolKind::Argument), 1);
    assert_eq!(table.var_count(SymbolKind::Local), 2);

    assert_eq!(table.kind_of("other").unwrap(), SymbolKind::Argument);
    assert_eq!(table.type_of("other").unwrap(), "Point");
}

#[test]
fn start_subroutine_clears_only_subroutine_scope() {
    let mut table = point_table();
    table.start_subroutine("first");
    table.define("a", "int", SymbolKind::Argument).unwrap();
    table.define("tmp", "int", SymbolKind::Local).unwrap();

    table.start_subroutine("second");
    assert!(table.get("a").is_none());
    assert!(table.get("tmp").is_none());
    assert_eq!(table.var_count(SymbolKind::Argument), 0);
    assert_eq!(table.var_count(SymbolKind::Local), 0);
    assert_eq!(table.var_count(SymbolKind::Field), 2);

    table.define("b", "int", SymbolKind::Argument).unwrap();
    assert_eq!(table.index_of("b").unwrap(), 0);
    assert_eq!(table.subroutine_name(), "second");
}

#[test]
fn subroutine_scope_shadows_class_scope() {
    let mut table = point_table();
    table.start_subroutine("shadow");
    table.define("x", "boolean", SymbolKind::Local).unwrap();

    let symbol = table.lookup("x").unwrap();
    assert_eq!(symbol.kind, SymbolKind::Local);
    assert_eq!(symbol.ty, "boolean");
}

#[test]
fn duplicate_in_same_scope() {
    let mut table = point_table();
    let err = table.define("x", "char", SymbolKind::Static).unwrap_err();
    assert!(matches!(
        err,
        CompileError::DuplicateSymbol { ref name, scope: Scope::Class } if name == "x"
    ));

    table.start_subroutine("f");
    table.define("v", "int", SymbolKind::Argument).unwrap();
    let err = table.define("v", "int", SymbolKind::Local).unwrap_err();
    assert!(matches!(
        err,
        CompileError::DuplicateSymbol { scope: Scope::Subroutine, .. }
    ));
}

#[test]
fn unknown_symbol_names_subroutine() {
    let mut table = point_table();
    table.start_subroutine("draw");
    assert!(table.get("Screen").is_none());

    let err = table.lookup("z").unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnknownSymbol { ref name, ref subroutine } if name == "z" && subroutine == "Point.draw"
    ));
    assert!(table.kind_of("z").is_err());
}

#[test]
fn shift_arguments_moves_only_arguments() {
    let mut table = point_table();
    table.start_subroutine("move");
    table.define("dx", "int", SymbolKind::Argument).unwrap();
    table.define("dy", "int", SymbolKind::Argument).unwrap();
    table.define("tmp", "int", SymbolKind::Local).unwrap();
    table.shift_arguments();

    assert_eq!(table.index_of("dx").unwrap(), 1);
    assert_eq!(table.index_of("dy").unwrap(), 2);
    assert_eq!(table.index_of("tmp").unwrap(), 0);
    assert_eq!(table.index_of("x").unwrap(), 0);
}

#[test]
fn kinds_map_to_segments() {
    assert_eq!(SymbolKind::Static.segment(), Segment::Static);
    assert_eq!(SymbolKind::Field.segment(), Segment::This);
    assert_eq!(SymbolKind::Argument.segment(), Segment::Argument);
    assert_eq!(SymbolKind::Local.segment(), Segment::Local);
}

#[test]
fn display_summarizes_counts() {
    let mut table = point_table();
    table.start_subroutine("new");
    table.define("ax", "int", SymbolKind::Argument).unwrap();
    assert_eq!(
        table.to_string(),
        "{Point.new static:1 field:2 arg:1 var:0}"
    );
}
