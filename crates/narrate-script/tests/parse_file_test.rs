use narrate_script::{ScriptError, ScriptParser};
use narrate_types::LineKind;
use std::io::Write;

const CHAPTER: &str = "\
# 第一章 早晨

> 本章讲述小猪一家的早晨。

太阳升起来了。
（小猪）：妈妈，早上好！
（猪妈妈）：早上好，宝贝。
（猪爸爸）：今天我们去公园吧。

---

*该小节涉及的角色：小猪、猪妈妈、猪爸爸*
";

#[test]
fn parses_a_chapter_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CHAPTER.as_bytes()).unwrap();

    let lines = ScriptParser::new().parse_file(file.path()).unwrap();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0].kind, LineKind::Narration);
    assert_eq!(lines[0].line_number, 5);
    let speakers: Vec<&str> = lines[1..].iter().map(|l| l.character.as_str()).collect();
    assert_eq!(speakers, vec!["小猪", "猪妈妈", "猪爸爸"]);
    assert_eq!(lines[3].line_number, 8);
}

#[test]
fn n_dialogue_lines_yield_n_entries() {
    for n in [0usize, 1, 7, 120] {
        let content: String = (0..n)
            .map(|i| format!("（角色{i}）：第{i}句台词。\n"))
            .collect();
        let lines = ScriptParser::new().parse(&content);
        assert_eq!(lines.len(), n);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.character, format!("角色{i}"));
            assert_eq!(line.line_number, i + 1);
        }
    }
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.md");

    let result = ScriptParser::new().parse_file(&missing);
    match result {
        Err(ScriptError::NotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn file_without_recognisable_lines_is_empty_not_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"# Title only\n\nplain ascii text\n").unwrap();

    let lines = ScriptParser::new().parse_file(file.path()).unwrap();
    assert!(lines.is_empty());
}
