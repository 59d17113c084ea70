//! Integration tests for the `wispy` command line.
//!
//! Commands run in-process through `cli::run` against temporary sites.

use std::fs;

use clap::Parser;
use wispy::cli::{run, Cli};

fn site(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    dir
}

fn run_args(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    run(cli, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn render_page_with_data_and_query() {
    let dir = site(&[
        ("layouts/root.hstm", "<body>{% passed %}</body>"),
        ("index.hstm", "{% .greeting %} page {% .URL.Query.n %}"),
        ("data.json", r#"{"greeting": "hello"}"#),
    ]);
    let site_dir = dir.path().to_str().unwrap();
    let data = dir.path().join("data.json");

    let output = run_args(&[
        "wispy",
        "render",
        "--site",
        site_dir,
        "index.hstm",
        "--data",
        data.to_str().unwrap(),
        "--query",
        "n=2",
    ])
    .unwrap();
    assert_eq!(output, "<body>hello page 2</body>");
}

#[test]
fn bypass_header_from_the_command_line() {
    let dir = site(&[
        ("layouts/root.hstm", "<body>{% passed %}</body>"),
        ("index.hstm", "fragment"),
    ]);
    let output = run_args(&[
        "wispy",
        "render",
        "--site",
        dir.path().to_str().unwrap(),
        "index.hstm",
        "--header",
        "HX-Request=true",
    ])
    .unwrap();
    assert_eq!(output, "fragment");
}

#[test]
fn strict_mode_fails_on_template_errors() {
    let dir = site(&[
        ("layouts/root.hstm", "{% passed %}"),
        ("index.hstm", "a{% bogus %}b"),
    ]);
    let site_dir = dir.path().to_str().unwrap();

    let lenient = run_args(&["wispy", "render", "--site", site_dir, "index.hstm"]).unwrap();
    assert_eq!(lenient, "ab");

    let err = run_args(&["wispy", "render", "--site", site_dir, "index.hstm", "--strict"])
        .unwrap_err();
    assert!(err.to_string().contains("1 template error"));
}

#[test]
fn missing_page_is_an_error() {
    let dir = site(&[]);
    let err = run_args(&[
        "wispy",
        "render",
        "--site",
        dir.path().to_str().unwrap(),
        "nope.hstm",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("rendering nope.hstm"));
}

#[test]
fn data_file_must_be_an_object() {
    let dir = site(&[("index.hstm", "x"), ("data.json", "[1]")]);
    let data = dir.path().join("data.json");
    let err = run_args(&[
        "wispy",
        "render",
        "--site",
        dir.path().to_str().unwrap(),
        "index.hstm",
        "--data",
        data.to_str().unwrap(),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("must hold a JSON object"));
}

#[test]
fn configured_delimiters_apply() {
    let dir = site(&[
        ("wispy.yaml", "delimiters:\n  start: \"[[\"\n  end: \"]]\"\n"),
        ("layouts/root.hstm", "<[[ passed ]]>"),
        ("index.hstm", "[[ .URL.Query.x ]]"),
    ]);
    let config = dir.path().join("wispy.yaml");
    let output = run_args(&[
        "wispy",
        "render",
        "--site",
        dir.path().to_str().unwrap(),
        "index.hstm",
        "--config",
        config.to_str().unwrap(),
        "--query",
        "x=1",
    ])
    .unwrap();
    assert_eq!(output, "<1>");
}

#[test]
fn tags_lists_builtins() {
    let output = run_args(&["wispy", "tags"]).unwrap();
    assert!(output.starts_with("tags:\n"));
    for name in ["  partial\n", "  root-css\n", "filters:\n", "  upcase\n"] {
        assert!(output.contains(name), "missing {name:?}");
    }
}

#[test]
fn invalid_config_is_reported() {
    let dir = site(&[("bad.yaml", "max_depth: 0\n")]);
    let config = dir.path().join("bad.yaml");
    let err = run_args(&["wispy", "tags", "--config", config.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("invalid configuration"));
}
