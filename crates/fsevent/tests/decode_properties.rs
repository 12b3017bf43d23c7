use std::collections::HashMap;

use fsevent::{decode, Decode, Dynamic, ValueTree};
use proptest::prelude::*;
use serde_json::{json, Value as Json};

#[derive(Debug, Default, Clone, PartialEq, Decode)]
pub struct Sample {
    pub count: i64,
    pub label: String,
    pub flags: Vec<bool>,
    pub ratio: Option<f64>,
    pub extra: HashMap<String, Dynamic>,
}

fn tree(fields: Json) -> ValueTree {
    serde_json::from_value(json!({ "fields": fields })).unwrap()
}

fn sample_fields() -> impl Strategy<Value = Json> {
    (
        any::<i64>(),
        "[a-zA-Z0-9 ]{0,16}",
        prop::collection::vec(any::<bool>(), 0..6),
        prop::option::of(-1.0e6f64..1.0e6),
        prop::collection::hash_map("[a-z]{1,6}", any::<i64>(), 0..4),
    )
        .prop_map(|(count, label, flags, ratio, extra)| {
            let mut fields = serde_json::Map::new();
            fields.insert("count".into(), json!({"integerValue": count.to_string()}));
            fields.insert("label".into(), json!({"stringValue": label}));
            let flags: Vec<Json> = flags
                .into_iter()
                .map(|b| json!({"booleanValue": b}))
                .collect();
            fields.insert("flags".into(), json!({"arrayValue": {"values": flags}}));
            if let Some(ratio) = ratio {
                fields.insert("ratio".into(), json!({"doubleValue": ratio}));
            }
            let extra: serde_json::Map<String, Json> = extra
                .into_iter()
                .map(|(k, v)| (k, json!({"integerValue": v.to_string()})))
                .collect();
            fields.insert("extra".into(), json!({"mapValue": {"fields": extra}}));
            Json::Object(fields)
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn integers_round_trip(n in any::<i64>()) {
        let t = tree(json!({"count": {"integerValue": n.to_string()}}));
        let mut dest = Sample::default();
        decode(&t, &mut dest).unwrap_or_else(|e| panic!("decode failed: {e}"));
        prop_assert_eq!(dest.count, n);
    }

    #[test]
    fn fresh_destinations_decode_equal(fields in sample_fields()) {
        let t = tree(fields);
        let mut first = Sample::default();
        decode(&t, &mut first).unwrap_or_else(|e| panic!("first decode failed: {e}"));
        let mut second = Sample::default();
        decode(&t, &mut second).unwrap_or_else(|e| panic!("second decode failed: {e}"));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn redecoding_a_populated_destination_is_stable(fields in sample_fields()) {
        let t = tree(fields);
        let mut once = Sample::default();
        decode(&t, &mut once).unwrap_or_else(|e| panic!("first decode failed: {e}"));
        let mut again = once.clone();
        decode(&t, &mut again).unwrap_or_else(|e| panic!("second decode failed: {e}"));
        prop_assert_eq!(once, again);
    }

    #[test]
    fn sequences_match_wire_length(initial in prop::collection::vec(any::<bool>(), 0..8),
                                   wire in prop::collection::vec(any::<bool>(), 0..8)) {
        let values: Vec<Json> = wire.iter().map(|b| json!({"booleanValue": b})).collect();
        let t = tree(json!({"flags": {"arrayValue": {"values": values}}}));
        let mut dest = Sample { flags: initial, ..Sample::default() };
        decode(&t, &mut dest).unwrap_or_else(|e| panic!("decode failed: {e}"));
        prop_assert_eq!(dest.flags, wire);
    }
}
