//! Integration tests for `docweave convert` and the lookup commands.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn docweave_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_docweave"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn temp_out(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("docweave-convert-test").join(name);
    // Clean up from previous runs
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn convert(out: &PathBuf, extra: &[&str]) -> std::process::Output {
    Command::new(docweave_bin())
        .args([
            "convert",
            fixture("MyKit.docc").to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ])
        .args(extra)
        .output()
        .expect("failed to run docweave convert")
}

#[test]
fn convert_produces_page_tree() {
    let out = temp_out("page-tree");
    let output = convert(&out, &["--quiet"]);
    assert!(output.status.success(), "docweave convert should succeed");

    for page in [
        "documentation/MyKit",
        "documentation/MyKit/Foo",
        "documentation/MyKit/Foo/bar()",
        "documentation/MyKit/Baz",
        "documentation/MyKit/GettingStarted",
        "tutorials/MyKit",
        "tutorials/MyKit/Building",
    ] {
        assert!(out.join(page).join("index.html").exists(), "{page}/index.html should exist");
        assert!(out.join(page).join("index.md").exists(), "{page}/index.md should exist");
    }

    assert!(
        out.join("images/org.example.MyKit/hero.png").exists(),
        "images should be copied under the bundle id"
    );

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn convert_writes_breadcrumbs_and_canonical_links() {
    let out = temp_out("breadcrumbs");
    let output = convert(&out, &["--quiet"]);
    assert!(output.status.success());

    let html = fs::read_to_string(out.join("documentation/MyKit/Foo/index.html")).unwrap();
    assert!(html.contains("<title>Foo | MyKit</title>"));
    assert!(html.contains("<link rel=\"canonical\" href=\"/docs/documentation/MyKit/Foo\">"));
    assert!(html.contains("aria-label=\"Breadcrumbs\""));
    assert!(html.contains(">Getting Started</a>"));

    let tutorial = fs::read_to_string(out.join("tutorials/MyKit/Building/index.html")).unwrap();
    assert!(tutorial.contains("Building a Kit"));

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn convert_writes_relationship_manifest() {
    let out = temp_out("manifest");
    let output = convert(&out, &["--quiet"]);
    assert!(output.status.success());

    let json = fs::read_to_string(out.join("relationships.json")).unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(manifest["bundleId"], "org.example.MyKit");

    let relationships = manifest["relationships"].as_array().unwrap();
    assert!(relationships.iter().any(|r| {
        r["sourceIdentifier"] == "/documentation/MyKit/Foo"
            && r["relationshipType"] == "belongsToTopic"
            && r["targetIdentifier"] == "/documentation/MyKit/GettingStarted#Essentials"
    }));

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn html_only_format_skips_markdown_and_manifest() {
    let out = temp_out("html-only");
    let output = convert(&out, &["--quiet", "--format", "html"]);
    assert!(output.status.success());

    assert!(out.join("documentation/MyKit/index.html").exists());
    assert!(!out.join("documentation/MyKit/index.md").exists());
    assert!(!out.join("relationships.json").exists());

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn second_convert_leaves_unchanged_files() {
    let out = temp_out("unchanged");
    assert!(convert(&out, &["--quiet"]).status.success());

    let output = convert(&out, &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unchanged"), "summary should report unchanged files: {stdout}");
    assert!(!stdout.contains("written"), "nothing should be rewritten: {stdout}");

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn resolve_prints_page_path() {
    let output = Command::new(docweave_bin())
        .args(["resolve", fixture("MyKit.docc").to_str().unwrap(), "MyKit/Foo/bar()"])
        .output()
        .expect("failed to run docweave resolve");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "/documentation/MyKit/Foo/bar()"
    );

    let output = Command::new(docweave_bin())
        .args(["resolve", fixture("MyKit.docc").to_str().unwrap(), "doc:Missing"])
        .output()
        .expect("failed to run docweave resolve");
    assert!(!output.status.success(), "unresolved links should exit non-zero");
}

#[test]
fn links_lists_every_symbol() {
    let output = Command::new(docweave_bin())
        .args(["links", fixture("MyKit.docc").to_str().unwrap()])
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run docweave links");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 3);
    assert!(stdout.contains("/documentation/MyKit/Foo/bar()  s:5MyKit3FooC3baryyF"));
}

#[test]
fn render_prints_single_file_markdown() {
    let output = Command::new(docweave_bin())
        .args([
            "render",
            fixture("MyKit.docc/GettingStarted.md").to_str().unwrap(),
        ])
        .output()
        .expect("failed to run docweave render");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("# Getting Started\n"));
}
