use cmacrolit::{CChar, Encoding, LiteralValue, MacroTable, Reason, Verdict};

const TEST_HEADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/input/test.h");

fn load() -> MacroTable {
    let mut table = MacroTable::new();
    table.load_file(TEST_HEADER).unwrap();
    table
}

/// Decodes the expected value carried in a macro name, e.g. `Int_n3` or `Float_p001`.
fn expected_number(suffix: &str) -> String {
    suffix.replace('n', "-").replace('p', ".")
}

fn check_valid(name: &str, value: &LiteralValue) {
    let (kind, suffix) = name.split_once('_').unwrap();
    match (kind, value) {
        ("Int", LiteralValue::Int(i)) => {
            assert_eq!(i.value, expected_number(suffix).parse::<i64>().unwrap(), "{name}");
        }
        ("Float", LiteralValue::Float(f)) => {
            assert_eq!(f.value, expected_number(suffix).parse::<f64>().unwrap(), "{name}");
        }
        ("CharChar", LiteralValue::Char(c)) => {
            let code: u32 = suffix.parse().unwrap();
            assert_eq!(c.value, CChar::Char(char::from_u32(code).unwrap()), "{name}");
        }
        ("CharRaw", LiteralValue::Char(c)) => {
            assert_eq!(c.value, CChar::Raw(suffix.parse().unwrap()), "{name}");
        }
        ("Str", LiteralValue::Str(s)) => {
            assert_eq!(s.to_text().as_deref(), Some(suffix), "{name}");
        }
        _ => panic!("{name} classified as {value:?}"),
    }
}

#[test]
fn test_corpus_values() {
    let table = load();
    let mut checked = 0;
    for (entry, verdict) in table.iter() {
        let name = entry.identifier.as_str();
        if name.starts_with("FAIL_") {
            assert!(!verdict.is_valid(), "{name} should not be a literal: {verdict:?}");
            continue;
        }
        match verdict {
            Verdict::Valid(value) => check_valid(name, value),
            Verdict::Invalid(reason) => panic!("{name} rejected: {reason}"),
        }
        checked += 1;
    }
    assert_eq!(checked, table.len() - 6);
}

#[test]
fn test_corpus_failures() {
    let table = load();
    let reason = |name: &str| table.get(name).and_then(Verdict::reason);

    assert_eq!(reason("FAIL_1"), Some(Reason::ParameterizedMacro));
    assert_eq!(reason("FAIL_2"), Some(Reason::EmptyBody));
    assert_eq!(reason("FAIL_3"), Some(Reason::MalformedDigit));
    assert_eq!(reason("FAIL_4"), Some(Reason::SuffixConflict));
    assert_eq!(reason("FAIL_5"), Some(Reason::UnknownIdentifier));
    assert_eq!(reason("FAIL_6"), Some(Reason::EncodingMismatch));
}

#[test]
fn test_corpus_order_and_encodings() {
    let table = load();
    let names: Vec<&str> = table.iter().map(|(e, _)| e.identifier.as_str()).collect();
    assert_eq!(names.first(), Some(&"Int_456"));
    assert_eq!(names.last(), Some(&"FAIL_6"));

    let encoding = |name: &str| table.value(name).and_then(LiteralValue::as_str).map(|s| s.encoding);
    assert_eq!(encoding("Str_unicode"), Some(Encoding::Utf16));
    assert_eq!(encoding("Str_long"), Some(Encoding::Wide));
    assert_eq!(encoding("Str_concat"), Some(Encoding::Utf16));
    assert_eq!(encoding("Str_concat_parens"), Some(Encoding::Utf32));
    assert_eq!(encoding("Str_concat_identifier"), Some(Encoding::Utf16));
}
