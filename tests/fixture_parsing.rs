// Annotation parsing of fixture files on disk.

use std::fs;

use pretty_assertions::assert_eq;
use wrencc_test::fixture::{ExpectedOutput, Fixture, FixtureKind, Parsed};

fn load(source: &[u8]) -> Parsed {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("case.wren");
    fs::write(&path, source).unwrap();
    Fixture::load(&path, FixtureKind::Test).unwrap()
}

#[test]
fn full_fixture_collects_every_expectation() {
    let source = b"\
var list = [1, 2]
System.print(list[0]) // expect: 1
System.print(list[1]) // expect: 2
// stdin: hello
";
    let fixture = match load(source) {
        Parsed::Runnable(fixture) => fixture,
        other => panic!("expected runnable fixture, got {:?}", other),
    };

    assert_eq!(
        fixture.output,
        vec![
            ExpectedOutput {
                text: "1".to_string(),
                line: 2
            },
            ExpectedOutput {
                text: "2".to_string(),
                line: 3
            },
        ]
    );
    assert_eq!(fixture.stdin.as_deref(), Some(&b"hello"[..]));
    assert_eq!(fixture.expectation_count(), 2);
    assert!(fixture.passed());
}

#[test]
fn skip_on_any_line_excludes_the_fixture() {
    match load(b"System.print(1) // expect: 1\n\n// skip: slow\n") {
        Parsed::Skipped(reason) => assert_eq!(reason, "slow"),
        other => panic!("expected skip, got {:?}", other),
    }
}

#[test]
fn nontest_files_are_ignored() {
    assert!(matches!(
        load(b"// nontest\nclass Helper {}\n"),
        Parsed::NonTest
    ));
}

#[test]
fn invalid_utf8_in_source_is_tolerated() {
    let fixture = match load(b"System.print(\"\xff\") // expect: ok\n") {
        Parsed::Runnable(fixture) => fixture,
        other => panic!("expected runnable fixture, got {:?}", other),
    };
    assert_eq!(fixture.output[0].text, "ok");
}

#[test]
fn missing_fixture_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Fixture::load(&dir.path().join("gone.wren"), FixtureKind::Test).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read fixture"));
    assert!(!err.is_fatal());
}
