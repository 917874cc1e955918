use std::fs;
use std::path::{Path, PathBuf};

use jackc::driver::{collect_sources, compile_file, run, Emit, Options};
use jackc::CompileError;

const MAIN: &str = "class Main { function void main() { do Game.run(); return; } }";
const GAME: &str = "class Game { function void run() { return; } }";
const BROKEN: &str = "class Broken { function void f() { let = ; } }";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("jackc-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn directory_sources_are_sorted_and_filtered() {
    let dir = scratch_dir("sorted");
    write(&dir, "Main.jack", MAIN);
    write(&dir, "Game.jack", GAME);
    write(&dir, "notes.txt", "not a class");
    fs::create_dir_all(dir.join("nested.jack")).unwrap();

    let sources = collect_sources(&dir).unwrap();
    assert_eq!(sources, vec![dir.join("Game.jack"), dir.join("Main.jack")]);

    let single = collect_sources(&dir.join("Main.jack")).unwrap();
    assert_eq!(single, vec![dir.join("Main.jack")]);
}

#[test]
fn compiles_next_to_sources() {
    let dir = scratch_dir("next-to");
    write(&dir, "Main.jack", MAIN);
    write(&dir, "Game.jack", GAME);

    let summary = run(&dir, &Options::default()).unwrap();
    assert!(summary.is_success());
    assert_eq!(
        summary.written,
        vec![dir.join("Game.vm"), dir.join("Main.vm")]
    );
    assert_eq!(
        fs::read_to_string(dir.join("Main.vm")).unwrap(),
        "function Main.main 0\ncall Game.run 0\nreturn\n"
    );
}

#[test]
fn out_dir_is_created() {
    let dir = scratch_dir("out-dir");
    let source = write(&dir, "Game.jack", GAME);
    let out_dir = dir.join("build").join("vm");

    let options = Options {
        out_dir: Some(out_dir.clone()),
        ..Options::default()
    };
    let out_path = compile_file(&source, &options).unwrap();
    assert_eq!(out_path, out_dir.join("Game.vm"));
    assert!(out_path.is_file());
}

#[test]
fn first_failure_aborts_the_batch() {
    let dir = scratch_dir("abort");
    write(&dir, "A.jack", GAME);
    write(&dir, "Broken.jack", BROKEN);
    write(&dir, "Main.jack", MAIN);

    let err = run(&dir, &Options::default()).unwrap_err();
    let CompileError::File { path, .. } = &err else {
        panic!("expected file context, got {err:?}");
    };
    assert_eq!(path, &dir.join("Broken.jack"));
    assert!(matches!(err.root(), CompileError::SyntaxError { .. }));
    assert!(err.to_string().contains("Broken.jack"));

    assert!(dir.join("A.vm").is_file());
    assert!(!dir.join("Broken.vm").exists());
    assert!(!dir.join("Main.vm").exists());
}

#[test]
fn keep_going_collects_failures() {
    let dir = scratch_dir("keep-going");
    write(&dir, "A.jack", GAME);
    write(&dir, "Broken.jack", BROKEN);
    write(&dir, "Main.jack", MAIN);

    let options = Options {
        keep_going: true,
        ..Options::default()
    };
    let summary = run(&dir, &options).unwrap();
    assert!(!summary.is_success());
    assert_eq!(summary.written, vec![dir.join("A.vm"), dir.join("Main.vm")]);
    assert_eq!(summary.failed.len(), 1);
    assert!(!dir.join("Broken.vm").exists());
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = scratch_dir("missing");
    let err = run(&dir.join("Nope.jack"), &Options::default()).unwrap_err();
    assert!(matches!(err.root(), CompileError::Io { .. }));
}

#[test]
fn emit_names() {
    assert_eq!(Emit::Vm.output_name("Main"), "Main.vm");
    assert_eq!(Emit::Xml.output_name("Main"), "Main.xml");
    assert_eq!(Emit::Tokens.output_name("Main"), "MainT.xml");
}

#[test]
fn emit_tokens_and_tree() {
    let dir = scratch_dir("emit");
    write(&dir, "Cmp.jack", "class Cmp { function boolean lt() { return 1 < \"&\"; } }");

    let tokens = Options {
        emit: Emit::Tokens,
        ..Options::default()
    };
    run(&dir, &tokens).unwrap();
    let xml = fs::read_to_string(dir.join("CmpT.xml")).unwrap();
    assert!(xml.starts_with("<tokens>\n<keyword> class </keyword>\n<identifier> Cmp </identifier>\n"));
    assert!(xml.contains("<symbol> &lt; </symbol>\n"));
    assert!(xml.contains("<stringConstant> &amp; </stringConstant>\n"));
    assert!(xml.ends_with("</tokens>\n"));

    let tree = Options {
        emit: Emit::Xml,
        ..Options::default()
    };
    run(&dir, &tree).unwrap();
    let xml = fs::read_to_string(dir.join("Cmp.xml")).unwrap();
    assert!(xml.starts_with("<class>\n  <keyword> class </keyword>\n"));
    assert!(xml.contains("<parameterList>\n    </parameterList>\n"));
    assert!(xml.contains(
        "<returnStatement>\n          <keyword> return </keyword>\n          <expression>\n"
    ));
    assert!(xml.ends_with("</class>\n"));
}
