//! Property tests: canonical serialization parses back to an equal program.

use proptest::prelude::*;
use proptest::sample::select;
use serde_json::{json, Value as Json};

use taskgrade_core::parse_program;

const VARIABLES: [&str; 4] = ["a", "b", "c", "input"];
const BINARY: [&str; 16] = [
    "add", "sub", "mul", "div", "rem", "eq", "ne", "lt", "le", "gt", "ge", "and", "or", "get",
    "concat", "push",
];

fn leaf_expr() -> impl Strategy<Value = Json> {
    prop_oneof![
        any::<i64>().prop_map(Json::from),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        any::<bool>().prop_map(Json::from),
        Just(Json::Null),
        "[a-z]{0,6}".prop_map(|s| json!({ "lit": s })),
        select(VARIABLES.to_vec()).prop_map(|v| json!(v)),
    ]
}

fn expr() -> impl Strategy<Value = Json> {
    leaf_expr().prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (select(BINARY.to_vec()), inner.clone(), inner.clone())
                .prop_map(|(op, lhs, rhs)| json!({ op: [lhs, rhs] })),
            (select(vec!["neg", "not", "len"]), inner.clone())
                .prop_map(|(op, operand)| json!({ op: operand })),
            prop::collection::vec(inner.clone(), 0..3).prop_map(Json::Array),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(t, k, v)| json!({ "set": [t, k, v] })),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..3)
                .prop_map(|fields| json!({ "object": fields })),
        ]
    })
}

fn command() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![
        (select(VARIABLES[..3].to_vec()), expr())
            .prop_map(|(var, value)| json!({"op": "assign", "var": var, "value": value})),
        expr().prop_map(|value| json!({"op": "emit", "value": value})),
    ];
    leaf.prop_recursive(3, 24, 3, |inner| {
        let body = prop::collection::vec(inner, 0..3);
        prop_oneof![
            (expr(), body.clone(), body.clone()).prop_map(|(cond, then, otherwise)| {
                json!({"op": "if", "cond": cond, "then": then, "else": otherwise})
            }),
            (expr(), body.clone())
                .prop_map(|(cond, body)| json!({"op": "while", "cond": cond, "body": body})),
            body.clone().prop_map(|mut body| {
                body.push(json!({"op": "break"}));
                json!({"op": "loop", "body": body})
            }),
            (select(VARIABLES[..3].to_vec()), expr(), body).prop_map(|(var, iterable, body)| {
                json!({"op": "for_each", "var": var, "in": iterable, "body": body})
            }),
        ]
    })
}

fn program_doc() -> impl Strategy<Value = Json> {
    prop::collection::vec(command(), 0..6).prop_map(|generated| {
        let mut commands: Vec<Json> = ["a", "b", "c"]
            .iter()
            .map(|var| json!({"op": "assign", "var": var, "value": 0}))
            .collect();
        commands.extend(generated);
        json!({"version": 1, "commands": commands})
    })
}

proptest! {
    #[test]
    fn canonical_form_round_trips(doc in program_doc()) {
        let program = parse_program(&doc).expect("generated programs are valid");
        let canonical = program.to_json();
        let reparsed = parse_program(&canonical).expect("canonical form parses");
        prop_assert_eq!(&program, &reparsed);
        prop_assert_eq!(reparsed.to_json(), canonical);
    }

    #[test]
    fn parsing_never_panics_on_arbitrary_commands(op in "[a-z_]{1,8}", value in expr()) {
        let doc = json!({"version": 1, "commands": [{"op": op, "value": value}]});
        // Any outcome is fine; it must simply be the same outcome twice.
        prop_assert_eq!(parse_program(&doc), parse_program(&doc));
    }
}
