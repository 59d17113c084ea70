//! Integration tests for wispy-render.
//!
//! Each test lays out a small site in a temporary directory and renders
//! pages through the public API only.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};
use wispy_render::{AssetKind, Engine, EngineConfig, ErrorKind, RequestInfo, TemplateError};

fn site(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), files);
    dir
}

fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
}

fn data(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture data must be an object"),
    }
}

// ============================================================================
// Test: a complete site
// ============================================================================

const ROOT: &str = "<!doctype html><html><head>{% root-head %}\n{% root-css %}</head>\
<body>{% passed %}\n{% root-js %}</body></html>";

const BASE: &str = "<header>{% block header %}Site{% end-block %}</header>\
<main>{% passed %}</main>\
<footer>{% block footer %}(c){% end-block %}</footer>";

const CARD: &str = "{% import ~/card.css %}<article>{% .title | capitalize %}: {% .body | default \"n/a\" %}</article>";

#[test]
fn blog_page_end_to_end() {
    let dir = site(&[
        ("layouts/root.hstm", ROOT),
        ("layouts/base.hstm", BASE),
        ("partials/card/index.hstm", CARD),
        ("partials/card/card.css", ".card{}"),
        ("styles/site.css", "body{}"),
        (
            "pages/blog/index.hstm",
            "{% extends base %}\
             {% title .blog.name %}\
             {% meta name=\"description\" content=.blog.tagline %}\
             {% import styles/site.css priority=10 %}\
             {% slot header %}{% .blog.name | upcase %}{% end-slot %}\
             {% each post in .posts %}{% partial card title=.post.title body=.post.body %}{% end-each %}\
             {% js defer %}<script>hydrate()</script>{% end-js %}",
        ),
        (
            "pages/blog/data_en.json",
            r#"{"blog": {"name": "notes", "tagline": "Short & sweet"},
                "posts": [{"title": "first", "body": "hello"}, {"title": "second", "body": ""}]}"#,
        ),
    ]);

    let engine = Engine::new();
    let out = engine
        .render_page(dir.path(), "pages/blog/index.hstm", Map::new(), None)
        .unwrap();

    assert!(out.errors.is_empty(), "{:?}", out.errors);
    assert_eq!(
        out.output,
        "<!doctype html><html><head>\
         <title>notes</title>\n\
         <meta name=\"description\" content=\"Short &amp; sweet\">\n\
         <style>body{}</style>\n<style>.card{}</style></head>\
         <body><header>NOTES</header>\
         <main><article>First: hello</article><article>Second: n/a</article></main>\
         <footer>(c)</footer>\n\
         <script defer>hydrate()</script></body></html>"
    );
}

#[test]
fn htmx_request_gets_fragment_only() {
    let dir = site(&[
        ("layouts/root.hstm", ROOT),
        ("layouts/base.hstm", BASE),
        ("page.hstm", "{% layout base %}<p>{% .URL.Query.id %}</p>{% end-layout %}"),
    ]);

    let request = RequestInfo::new()
        .with_header("HX-Request", "true")
        .with_query("id", "7");
    let out = Engine::new()
        .render_page(dir.path(), "page.hstm", Map::new(), Some(request))
        .unwrap();
    assert_eq!(out.output, "<p>7</p>");

    let request = RequestInfo::new().with_header("HX-Request", "false");
    let out = Engine::new()
        .render_page(dir.path(), "page.hstm", Map::new(), Some(request))
        .unwrap();
    assert!(out.output.starts_with("<!doctype html>"));
    assert!(out.output.contains("<main><p></p></main>"));
}

// ============================================================================
// Test: inheritance
// ============================================================================

#[test]
fn block_override_and_default() {
    let dir = site(&[("layouts/parent.hstm", "[{% block title %}Default{% end-block %}|{% passed %}]")]);
    let engine = Engine::new();

    let mut ctx = engine.context(dir.path());
    let out = engine.render(
        &mut ctx,
        "{% extends parent %}{% slot title %}Hello{% end-slot %}body{% end-extends %}",
    );
    assert_eq!(out.output, "[Hello|body]");

    let mut ctx = engine.context(dir.path());
    let out = engine.render(&mut ctx, "{% extends parent %}body");
    assert_eq!(out.output, "[Default|body]");
}

#[test]
fn three_level_inheritance_child_wins() {
    let dir = site(&[
        ("layouts/grand.hstm", "<{% block title %}G{% end-block %}>{% passed %}"),
        (
            "layouts/middle.hstm",
            "{% extends grand %}{% slot title %}M{% end-slot %}({% passed %})",
        ),
    ]);
    let engine = Engine::new();

    let mut ctx = engine.context(dir.path());
    let out = engine.render(&mut ctx, "{% extends middle %}{% slot title %}C{% end-slot %}c");
    assert!(out.errors.is_empty(), "{:?}", out.errors);
    assert_eq!(out.output, "<C>(c)");

    let mut ctx = engine.context(dir.path());
    let out = engine.render(&mut ctx, "{% extends middle %}c");
    assert_eq!(out.output, "<M>(c)");
}

#[test]
fn define_then_block() {
    let engine = Engine::new();
    let out = engine.render_str(
        "{% define nav %}<a>{% .home %}</a>{% end-define %}<nav>{% block nav %}none{% end-block %}</nav>",
        json!({"home": "Home"}),
    );
    assert_eq!(out.output, "<nav><a>Home</a></nav>");
}

#[test]
fn missing_parent_renders_child_unwrapped() {
    let dir = site(&[]);
    let engine = Engine::new();
    let mut ctx = engine.context(dir.path());
    let out = engine.render(&mut ctx, "{% extends nowhere %}child");
    assert_eq!(out.output, "child");
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].kind(), ErrorKind::Io);
}

#[test]
fn self_extending_layout_is_a_cycle() {
    let dir = site(&[("layouts/loop.hstm", "{% extends loop %}x")]);
    let engine = Engine::new();
    let mut ctx = engine.context(dir.path());
    let out = engine.render(&mut ctx, "{% extends loop %}start");
    assert_eq!(out.output, "x");
    assert_eq!(out.errors.len(), 1);
    assert!(matches!(out.errors[0], TemplateError::Cycle { .. }));
}

#[test]
fn self_including_partial_stops_at_first_repeat() {
    let dir = site(&[("partials/me.hstm", "<{% partial me %}{% partial me %}>")]);
    let engine = Engine::new();
    let mut ctx = engine.context(dir.path());
    let out = engine.render(&mut ctx, "{% partial me %}");
    assert_eq!(out.output, "<>");
    assert_eq!(out.errors.len(), 2);
    assert!(out
        .errors
        .iter()
        .all(|e| matches!(e, TemplateError::Cycle { .. })));
}

#[test]
fn recursive_partial_with_changing_props_renders() {
    let dir = site(&[(
        "partials/tree.hstm",
        "({% .node.name %}{% each child in .node.children %}{% partial tree node=.child %}{% end-each %})",
    )]);
    let engine = Engine::new();
    let mut ctx = engine.context(dir.path()).with_data(data(json!({
        "root": {"name": "a", "children": [
            {"name": "b", "children": []},
            {"name": "c", "children": [{"name": "d", "children": []}]}
        ]}
    })));
    let out = engine.render(&mut ctx, "{% partial tree node=.root %}");
    assert_eq!(out.output, "(a(b)(c(d)))");
    assert!(out.is_clean(), "{:?}", out.errors);
}

#[test]
fn deep_nesting_hits_depth_limit() {
    let config = EngineConfig {
        max_depth: 8,
        ..EngineConfig::default()
    };
    let engine = Engine::builder().config(config).build().unwrap();
    let template = format!(
        "{}x{}",
        "{% if .ok %}".repeat(10),
        "{% end-if %}".repeat(10)
    );
    let out = engine.render_str(&template, json!({"ok": true}));
    assert_eq!(out.output, "");
    assert!(out
        .errors
        .iter()
        .any(|e| matches!(e, TemplateError::DepthExceeded { max: 8, .. })));
}

// ============================================================================
// Test: partials and scopes
// ============================================================================

#[test]
fn props_fall_back_to_data() {
    let dir = site(&[("partials/who.hstm", "{% .user.name %}/{% .user.role %}")]);
    let engine = Engine::new();
    let mut ctx = engine.context(dir.path()).with_data(data(json!({
        "author": {"name": "prop-name"},
        "user": {"name": "data-name", "role": "admin"}
    })));
    let out = engine.render(&mut ctx, "{% partial who user=.author %}");
    assert!(out.errors.is_empty(), "{:?}", out.errors);
    assert_eq!(out.output, "prop-name/admin");
}

#[test]
fn nested_partials_restore_props() {
    let dir = site(&[
        ("partials/outer.hstm", "{% .label %}[{% partial inner label=\"in\" %}]{% .label %}"),
        ("partials/inner.hstm", "{% .label %}"),
    ]);
    let engine = Engine::new();
    let mut ctx = engine.context(dir.path());
    let out = engine.render(&mut ctx, "{% partial outer label=\"out\" %}");
    assert_eq!(out.output, "out[in]out");
}

#[test]
fn partial_assets_are_deduplicated() {
    let dir = site(&[
        ("partials/btn.hstm", "{% css %}.btn{}{% end-css %}<button/>"),
        ("layouts/root.hstm", "{% root-css %}{% passed %}"),
        ("p.hstm", "{% partial btn %}{% partial btn %}"),
    ]);
    let out = Engine::new()
        .render_page(dir.path(), "p.hstm", Map::new(), None)
        .unwrap();
    assert_eq!(out.output, "<style>.btn{}</style><button/><button/>");
}

// ============================================================================
// Test: asset ordering
// ============================================================================

#[test]
fn asset_priority_beats_insertion_order() {
    let engine = Engine::new();
    let mut ctx = engine.context(".");
    engine.render(
        &mut ctx,
        "{% css priority=50 %}.late{}{% end-css %}{% css priority=10 %}.early{}{% end-css %}",
    );
    assert_eq!(
        ctx.assets.render(AssetKind::Css),
        "<style>.early{}</style>\n<style>.late{}</style>"
    );
}

#[test]
fn module_scripts_precede_classic_scripts() {
    let engine = Engine::new();
    let mut ctx = engine.context(".");
    engine.render(
        &mut ctx,
        "{% import https://x.test/classic.js %}{% import https://x.test/mod.js module %}",
    );
    let js = ctx.assets.render(AssetKind::Js);
    assert!(js.find("mod.js").unwrap() < js.find("classic.js").unwrap());
}

// ============================================================================
// Test: error accumulation
// ============================================================================

#[test]
fn every_problem_is_reported_and_rendering_continues() {
    let dir = site(&[]);
    let engine = Engine::new();
    let mut ctx = engine.context(dir.path());
    let out = engine.render(
        &mut ctx,
        "a{% bogus %}b{% .missing %}c{% partial \"doesnotexist\" %}d{% each x %}{% end-each %}e{% .v | nope %}f",
    );
    assert_eq!(out.output, "abcdef");
    let kinds: Vec<ErrorKind> = out.errors.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::Dispatch,
            ErrorKind::Resolution,
            ErrorKind::Io,
            ErrorKind::Usage,
            ErrorKind::Dispatch,
        ]
    );
}

#[test]
fn yaml_configured_engine() {
    let dir = site(&[
        ("templates/box.html", "<<{{ .x }}>>"),
        ("config.yaml", "delimiters:\n  start: \"{{\"\n  end: \"}}\"\nextension: .html\npartials_dir: templates\n"),
    ]);
    let config = EngineConfig::from_yaml_file(dir.path().join("config.yaml")).unwrap();
    let engine = Engine::builder().config(config).build().unwrap();
    let mut ctx = engine
        .context(dir.path())
        .with_data(data(json!({"x": 1})));
    let out = engine.render(&mut ctx, "{{ partial box }}{% untouched %}");
    assert_eq!(out.output, "<<1>>{% untouched %}");
}
