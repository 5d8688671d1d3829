use std::fs;
use std::path::Path;

use ect_delta::{Delta, DeltaOptions, DiffHooks, Differ, Node};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Fixture {
    lhs: String,
    rhs: String,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    inline_moves: bool,
    delta: Option<serde_json::Value>,
}

struct FieldHash(Option<String>);

impl DiffHooks for FieldHash {
    fn object_hash(&self, item: &Node, _index: usize) -> Option<String> {
        let field = self.0.as_deref()?;
        item.child(field).map(ToString::to_string)
    }
}

fn load_fixture(path: &Path) -> Fixture {
    let data = fs::read_to_string(path).expect("fixture should be readable");
    serde_json::from_str(&data).expect("fixture should deserialize")
}

#[test]
fn delta_golden_parity() {
    let fixtures_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/delta");
    let mut entries: Vec<_> = fs::read_dir(&fixtures_root)
        .expect("fixtures directory must exist")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    assert!(!entries.is_empty(), "expected at least one fixture under tests/fixtures/delta");

    for path in entries {
        let fixture = load_fixture(&path);
        let lhs = Node::from_json_str(&fixture.lhs).expect("lhs parses");
        let rhs = Node::from_json_str(&fixture.rhs).expect("rhs parses");
        let options =
            if fixture.inline_moves { DeltaOptions::default().with_moves_inline() } else { DeltaOptions::default() };
        let actual = Differ::new(options).diff_with(&lhs, &rhs, &FieldHash(fixture.hash));
        let expected = fixture.delta.map(Delta::from_json_value).transpose().expect("expected delta parses");
        assert_eq!(actual, expected, "fixture {path:?}");
    }
}

#[test]
fn deltas_survive_a_json_round_trip() {
    let lhs = Node::from_json_str(r#"{"tags":["a","b","c"],"name":"x"}"#).unwrap();
    let rhs = Node::from_json_str(r#"{"tags":["c","a"],"name":"y"}"#).unwrap();
    let delta = Differ::default().diff(&lhs, &rhs).unwrap();
    let text = serde_json::to_string(&delta).unwrap();
    assert_eq!(Delta::from_json_str(&text).unwrap(), delta);
}
