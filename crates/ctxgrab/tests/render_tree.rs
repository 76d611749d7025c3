use std::fs;
use std::path::Path;

use anyhow::Result;
use ctxgrab::app::extract::ExtractMode;
use ctxgrab::app::render::RenderStyle;
use ctxgrab::app::workflow::Workflow;
use ctxgrab::infra::config::Config;
use ctxgrab::infra::prompt::ScriptedPrompter;
use insta::assert_snapshot;

fn two_level_project(root: &Path) -> Result<()> {
    fs::create_dir_all(root.join("pkg/sub"))?;
    fs::write(
        root.join("pkg/a.go"),
        "package pkg\n\nfunc Foo(x int) string {\n\treturn \"\"\n}\n",
    )?;
    fs::write(root.join("pkg/sub/b.go"), "package sub\n\nfunc bar() {\n}\n")?;
    Ok(())
}

/// The line printed right after the one ending with `name`.
fn line_after<'a>(rendered: &'a str, name: &str) -> Option<&'a str> {
    let mut lines = rendered.lines();
    lines.find(|line| line.ends_with(name))?;
    lines.next()
}

fn render(root: &Path, mode: ExtractMode) -> Result<String> {
    let config = Config::default();
    let prompter = ScriptedPrompter::default();
    Workflow::new(&config, &prompter).tree_with_symbols(root, mode, RenderStyle::Plain)
}

#[test]
fn lexical_tree_shows_every_function() -> Result<()> {
    let temp = tempfile::tempdir()?;
    two_level_project(temp.path())?;
    let rendered = render(temp.path(), ExtractMode::Lexical)?;

    assert!(rendered.starts_with("└── pkg\n"));
    assert!(line_after(&rendered, " a.go").is_some_and(|l| l.ends_with("── Foo(x int) -> string")));
    assert!(line_after(&rendered, " b.go").is_some_and(|l| l.ends_with("└── bar()")));
    Ok(())
}

#[test]
fn syntactic_tree_shows_exported_functions_only() -> Result<()> {
    let temp = tempfile::tempdir()?;
    two_level_project(temp.path())?;
    let rendered = render(temp.path(), ExtractMode::Syntactic)?;

    assert!(line_after(&rendered, " a.go").is_some_and(|l| l.ends_with("── Foo(x int) -> string")));
    assert!(!rendered.contains("bar"));
    Ok(())
}

#[test]
fn plain_output_is_byte_stable() -> Result<()> {
    let temp = tempfile::tempdir()?;
    two_level_project(temp.path())?;
    let first = render(temp.path(), ExtractMode::Syntactic)?;
    let second = render(temp.path(), ExtractMode::Syntactic)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn hidden_directories_never_appear() -> Result<()> {
    let temp = tempfile::tempdir()?;
    two_level_project(temp.path())?;
    fs::create_dir_all(temp.path().join(".cache/deep"))?;
    fs::write(temp.path().join(".cache/deep/Hidden.go"), "package deep\n\nfunc Hidden() {}\n")?;

    let rendered = render(temp.path(), ExtractMode::Lexical)?;
    assert!(!rendered.contains(".cache"));
    assert!(!rendered.contains("Hidden"));
    Ok(())
}

#[test]
fn single_file_tree_snapshot() -> Result<()> {
    let temp = tempfile::tempdir()?;
    fs::create_dir_all(temp.path().join("store"))?;
    fs::write(
        temp.path().join("store/store.go"),
        "package store\n\n// Store keeps items.\ntype Store struct{}\n\nfunc (s *Store) Get(key string) (int, error) {\n\treturn 0, nil\n}\n",
    )?;

    let rendered = render(temp.path(), ExtractMode::Syntactic)?;
    assert_snapshot!(rendered.trim_end(), @r"
    └── store
        └── store.go
            ├── type Store struct
            └── Get(key string) -> int, error
    ");
    Ok(())
}
