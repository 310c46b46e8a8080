//! End-to-end runs through parse, branch elimination, flattening and
//! emission, checking output text and the inline source map.

use debranch::{KnownVars, Value, default_known_vars, remove_unreachable_branch};

const MAP_PREFIX: &str = "//# sourceMappingURL=data:application/json;base64,";

/// Split a transform result into its code part and the base64 map payload.
fn split_output(out: &str) -> (&str, &str) {
    let idx = out.find(MAP_PREFIX).expect("missing source map comment");
    let code = &out[..idx];
    let payload = out[idx + MAP_PREFIX.len()..].trim_end();
    (code, payload)
}

fn base64_decode(input: &str) -> Vec<u8> {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut bits = 0u32;
    let mut nbits = 0u32;
    let mut out = Vec::new();
    for byte in input.bytes() {
        if byte == b'=' {
            break;
        }
        let value = CHARS
            .iter()
            .position(|&c| c == byte)
            .expect("invalid base64") as u32;
        bits = (bits << 6) | value;
        nbits += 6;
        if nbits >= 8 {
            nbits -= 8;
            out.push((bits >> nbits) as u8);
        }
    }
    out
}

#[test]
fn strips_disabled_dev_blocks() {
    let out = remove_unreachable_branch(
        "if (__DEV__) {\n    setupDevtools();\n}\nstart();",
        "app.js",
        default_known_vars(),
    )
    .unwrap();
    let (code, _) = split_output(&out);
    assert_eq!(code, "start();\n");
}

#[test]
fn keeps_the_live_alternate() {
    let out = remove_unreachable_branch(
        "if (__DEV__) { a(); } else { b(); }",
        "app.js",
        default_known_vars(),
    )
    .unwrap();
    let (code, _) = split_output(&out);
    assert_eq!(code, "b();\n");
}

#[test]
fn truthy_environment_keeps_the_consequent() {
    let mut known = KnownVars::new();
    known.define("__DEV__", Value::Bool(true));
    let out =
        remove_unreachable_branch("if (__DEV__) { a(); } else { b(); }", "app.js", &known).unwrap();
    let (code, _) = split_output(&out);
    assert_eq!(code, "a();\n");
}

#[test]
fn effectful_test_is_retained_with_substitution() {
    let out = remove_unreachable_branch(
        "if (check() && __DEV__) { a(); }",
        "app.js",
        default_known_vars(),
    )
    .unwrap();
    let (code, _) = split_output(&out);
    assert_eq!(code, "check() && false;\n");
}

#[test]
fn undecidable_tests_are_left_alone() {
    let out = remove_unreachable_branch(
        "if (config.debug) { a(); }",
        "app.js",
        default_known_vars(),
    )
    .unwrap();
    let (code, _) = split_output(&out);
    assert_eq!(code, "if (config.debug) {\n    a();\n}\n");
}

#[test]
fn leftover_blocks_are_flattened() {
    let out = remove_unreachable_branch(
        "{ { a(); } { b(); } }",
        "app.js",
        default_known_vars(),
    )
    .unwrap();
    let (code, _) = split_output(&out);
    assert_eq!(code, "a();\nb();\n");
}

#[test]
fn collapsed_branch_keeps_let_bindings_scoped() {
    let mut known = KnownVars::new();
    known.define("FLAG", Value::Bool(true));
    let out = remove_unreachable_branch(
        "if (FLAG) { let temp = compute(); use(temp); }\nafter();",
        "app.js",
        &known,
    )
    .unwrap();
    let (code, _) = split_output(&out);
    // The braces survive so `temp` does not leak into the outer scope.
    assert_eq!(code, "{\n    let temp = compute();\n    use(temp);\n}\nafter();\n");
}

#[test]
fn sibling_let_blocks_are_not_merged() {
    // Merging would redeclare `x` in one scope, a SyntaxError at runtime.
    let out = remove_unreachable_branch(
        "{ let x = 1; f(x); } { let x = 2; g(x); }",
        "app.js",
        default_known_vars(),
    )
    .unwrap();
    let (code, _) = split_output(&out);
    assert_eq!(
        code,
        "{\n    let x = 1;\n    f(x);\n}\n{\n    let x = 2;\n    g(x);\n}\n"
    );
}

#[test]
fn branches_inside_functions_are_stripped() {
    let out = remove_unreachable_branch(
        "function init() {\n    if (__DEV__) {\n        trace();\n    }\n    boot();\n}",
        "app.js",
        default_known_vars(),
    )
    .unwrap();
    let (code, _) = split_output(&out);
    assert_eq!(code, "function init() {\n    boot();\n}\n");
}

#[test]
fn transform_is_idempotent() {
    let src = "if (__DEV__) { a(); }\nif (cond()) { b(); }\nc();";
    let first = remove_unreachable_branch(src, "app.js", default_known_vars()).unwrap();
    let (code, _) = split_output(&first);
    let second = remove_unreachable_branch(code, "app.js", default_known_vars()).unwrap();
    let (code_again, _) = split_output(&second);
    assert_eq!(code, code_again);
}

#[test]
fn inline_map_is_valid_json() {
    let out =
        remove_unreachable_branch("keep();", "app.js", default_known_vars()).unwrap();
    let (_, payload) = split_output(&out);
    let json = String::from_utf8(base64_decode(payload)).unwrap();
    let map: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "app.js");
    assert_eq!(map["sources"][0], "app.js");
    assert!(!map["mappings"].as_str().unwrap().is_empty());
}

#[test]
fn surviving_statements_map_to_their_original_lines() {
    let out = remove_unreachable_branch(
        "if (__DEV__) { a(); }\nkeep();",
        "app.js",
        default_known_vars(),
    )
    .unwrap();
    let (code, payload) = split_output(&out);
    assert_eq!(code, "keep();\n");

    let json = String::from_utf8(base64_decode(payload)).unwrap();
    let map: serde_json::Value = serde_json::from_str(&json).unwrap();
    let mappings = map["mappings"].as_str().unwrap().to_string();

    // First segment of generated line zero: [column, source, original line,
    // original column], all absolute for the first entry.
    let first_line = mappings.split(';').next().unwrap();
    let first_segment = first_line.split(',').next().unwrap();
    let mut fields = Vec::new();
    let mut rest = first_segment;
    while !rest.is_empty() {
        let (value, consumed) =
            debranch_common::source_map::vlq::decode(rest).expect("bad vlq");
        fields.push(value);
        rest = &rest[consumed..];
    }
    assert_eq!(fields, vec![0, 0, 1, 0]);
}

#[test]
fn reports_parse_errors_with_position() {
    let err = remove_unreachable_branch("if (;", "bad.js", default_known_vars())
        .expect_err("should fail");
    let message = err.to_string();
    assert!(message.contains("parse error"), "got: {message}");
}
