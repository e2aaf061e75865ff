use gotestsplit_splitter::{
    Casing, DirectoryLoader, FormatterKind, LoaderKind, ResidualOutcome, SplitConfig, SplitError,
    Splitter, SyntaxTree,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn splitter(base: &str, casing: Casing) -> Splitter {
    let config = SplitConfig {
        output_base: base.to_string(),
        casing,
        loader: LoaderKind::Dir,
        formatter: FormatterKind::Builtin,
        ..SplitConfig::default()
    };
    Splitter::with_loader(config, Box::new(DirectoryLoader)).expect("valid config")
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn listing(dir: &Path) -> BTreeMap<String, String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .map(|p| {
            (
                p.file_name().unwrap().to_string_lossy().to_string(),
                fs::read_to_string(&p).unwrap(),
            )
        })
        .collect()
}

fn decl_names(path: &Path) -> Vec<String> {
    let tree = SyntaxTree::parse_file(path).unwrap();
    tree.decls()
        .map(|(_, d)| d.name.clone().unwrap_or_default())
        .collect()
}

#[test]
fn splits_tests_and_keeps_helper() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let target = write(
        dir,
        "p_test.go",
        r#"package p

import "testing"

func TestAlpha(t *testing.T) {
	t.Log("alpha")
}

func TestBeta(t *T) {}

func helper() {}
"#,
    );

    let report = splitter("split", Casing::Snake).split(".", &target).unwrap();
    assert_eq!(report.written.len(), 2);
    assert!(matches!(report.residual, ResidualOutcome::Rewritten(_)));

    let files = listing(dir);
    assert_eq!(
        files.keys().cloned().collect::<Vec<_>>(),
        vec!["p_test.go", "split_alpha_test.go", "split_beta_test.go"]
    );
    assert_eq!(
        files["split_alpha_test.go"],
        "package p\n\nimport \"testing\"\n\nfunc TestAlpha(t *testing.T) {\n\tt.Log(\"alpha\")\n}\n"
    );
    assert_eq!(files["split_beta_test.go"], "package p\n\nfunc TestBeta(t *T) {}\n");
    assert_eq!(files["p_test.go"], "package p\n\nfunc helper() {}\n");
}

#[test]
fn only_tests_deletes_the_original() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    write(dir, "p.go", "package p\n\nfunc Add(a, b int) int { return a + b }\n");
    let target = write(
        dir,
        "add_test.go",
        r#"package p

import "testing"

func TestAddSmall(t *testing.T) {
	if Add(1, 2) != 3 {
		t.Fatal("sum")
	}
}

func TestAddZero(t *testing.T) {
	if Add(0, 0) != 0 {
		t.Fatal("zero")
	}
}
"#,
    );

    let report = splitter("add", Casing::Snake).split(".", &target).unwrap();
    assert_eq!(report.residual, ResidualOutcome::Deleted(report.source.clone()));
    assert!(!target.exists());

    let files = listing(dir);
    assert_eq!(
        files.keys().cloned().collect::<Vec<_>>(),
        vec!["add_add_small_test.go", "add_add_zero_test.go", "p.go"]
    );
}

#[test]
fn declarations_are_conserved() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let target = write(
        dir,
        "mixed_test.go",
        r#"package mixed

import (
	"os"
	"testing"
)

var TestCases = []string{"a", "b"}

type fixture struct{ name string }

func newFixture() *fixture { return &fixture{name: os.Getenv("NAME")} }

func TestOne(t *testing.T) { _ = newFixture() }

const limit = 2

func (f *fixture) TestTwo(t *testing.T) {}

func TestThree(t *testing.T) {
	for range TestCases {
	}
}
"#,
    );
    let original = decl_names(&target);

    let report = splitter("m", Casing::Verbatim).split(".", &target).unwrap();

    let mut after = decl_names(&target);
    for path in &report.written {
        let names = decl_names(path);
        assert_eq!(names.len(), 1, "{} holds one declaration", path.display());
        after.extend(names);
    }

    let mut original_sorted = original.clone();
    original_sorted.sort();
    after.sort();
    assert_eq!(after, original_sorted);

    let generated: Vec<_> = report
        .written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(generated, vec!["m_One_test.go", "m_Two_test.go", "m_Three_test.go"]);
}

#[test]
fn comments_follow_their_declarations() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let target = write(
        dir,
        "c_test.go",
        r#"// Package c is about comments.
package c

import "testing"

// TestDoc has a doc comment.
func TestDoc(t *testing.T) {
	// body comment
} // trailing doc

// helper has one too.
func helper() {}
"#,
    );

    splitter("c", Casing::Snake).split(".", &target).unwrap();

    let generated = fs::read_to_string(dir.join("c_doc_test.go")).unwrap();
    assert!(generated.contains("// TestDoc has a doc comment."));
    assert!(generated.contains("// body comment"));
    assert!(generated.contains("} // trailing doc"));
    assert!(!generated.contains("Package c is about comments"));
    assert!(!generated.contains("helper"));

    let residual = fs::read_to_string(&target).unwrap();
    assert_eq!(
        residual,
        "// Package c is about comments.\npackage c\n\n// helper has one too.\nfunc helper() {}\n"
    );
}

#[test]
fn imports_shrink_in_both_directions() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let target = write(
        dir,
        "io_test.go",
        r#"package io

import (
	"bytes"
	"strings"
	"testing"
)

func reader() *strings.Reader { return strings.NewReader("x") }

func TestBuffer(t *testing.T) {
	var b bytes.Buffer
	b.WriteString("x")
}
"#,
    );

    splitter("io", Casing::Snake).split(".", &target).unwrap();

    let generated = fs::read_to_string(dir.join("io_buffer_test.go")).unwrap();
    assert!(generated.contains("\"bytes\""));
    assert!(generated.contains("\"testing\""));
    assert!(!generated.contains("\"strings\""));

    let residual = fs::read_to_string(&target).unwrap();
    assert!(residual.contains("import \"strings\""));
    assert!(!residual.contains("\"bytes\""));
    assert!(!residual.contains("\"testing\""));
}

#[test]
fn repeated_runs_are_identical() {
    let source = r#"package r

import "testing"

// TestHTTPServer starts a server.
func TestHTTPServer(t *testing.T) {}

func TestParseURL(t *testing.T) {}
"#;

    let run = || {
        let temp = tempdir().unwrap();
        let target = write(temp.path(), "r_test.go", source);
        splitter("r", Casing::Snake).split(".", &target).unwrap();
        listing(temp.path())
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(
        first.keys().cloned().collect::<Vec<_>>(),
        vec!["r_http_server_test.go", "r_parse_url_test.go"]
    );
}

#[test]
fn missing_target_touches_nothing() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    write(dir, "p_test.go", "package p\n\nfunc TestA() {}\n");
    let before = listing(dir);

    let err = splitter("s", Casing::Snake)
        .split(".", dir.join("nope_test.go"))
        .unwrap_err();

    match err {
        SplitError::NotFound { seen, .. } => {
            assert_eq!(seen.len(), 1);
            assert!(seen[0].ends_with("p_test.go"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(listing(dir), before);
}

#[test]
fn write_failure_leaves_partial_split() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let source = "package p\n\nfunc TestA() {}\n\nfunc TestB() {}\n";
    let target = write(dir, "p_test.go", source);
    // a directory where the second output should go makes that write fail
    fs::create_dir(dir.join("s_b_test.go")).unwrap();

    let err = splitter("s", Casing::Snake).split(".", &target).unwrap_err();
    assert!(matches!(err, SplitError::FileIo { .. }), "{err:?}");

    assert!(dir.join("s_a_test.go").is_file());
    assert_eq!(fs::read_to_string(&target).unwrap(), source);
}

#[test]
fn imports_named_unlike_their_path_survive() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let target = write(
        dir,
        "pod_test.go",
        r#"package pod

import (
	"testing"

	"k8s.io/api/core/v1"
)

func TestPod(t *testing.T) {
	_ = v1.Pod{}
}

func TestEmpty(t *testing.T) {}
"#,
    );

    splitter("pod", Casing::Snake).split(".", &target).unwrap();

    assert_eq!(
        fs::read_to_string(dir.join("pod_pod_test.go")).unwrap(),
        "package pod\n\nimport (\n\t\"testing\"\n\n\t\"k8s.io/api/core/v1\"\n)\n\nfunc TestPod(t *testing.T) {\n\t_ = v1.Pod{}\n}\n"
    );
    assert_eq!(
        fs::read_to_string(dir.join("pod_empty_test.go")).unwrap(),
        "package pod\n\nimport \"testing\"\n\nfunc TestEmpty(t *testing.T) {}\n"
    );
    assert!(!target.exists());
}

#[test]
fn shadowed_import_name_stays_with_its_user() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let target = write(
        dir,
        "log_test.go",
        r#"package p

import (
	"log"
	"testing"
)

func helper() { log.Print("helper") }

func TestA(t *testing.T) {
	log := newLogger(t)
	log.Info("hi")
}
"#,
    );
    write(dir, "logger.go", "package p\n\nfunc newLogger(t any) *logger { return nil }\n");

    splitter("log", Casing::Snake).split(".", &target).unwrap();

    let generated = fs::read_to_string(dir.join("log_a_test.go")).unwrap();
    assert!(generated.contains("import \"testing\"\n"), "{generated}");
    assert!(!generated.contains("\"log\""), "{generated}");

    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "package p\n\nimport \"log\"\n\nfunc helper() { log.Print(\"helper\") }\n"
    );
}
