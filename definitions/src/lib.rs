extern crate proc_macro;
use proc_macro::TokenStream;

extern crate serde;
extern crate serde_json;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Deserialize)]
struct JsonGlobal {
    name: String,
    r#type: String,
    engines: BTreeMap<String, Value>,
}

fn default_value<T: Default>() -> T {
    T::default()
}

#[derive(Deserialize)]
struct JsonFunctionParameter {
    r#type: String,

    #[serde(default = "default_value")]
    many: bool,

    #[serde(default = "default_value")]
    optional: bool,

    #[serde(default = "default_value")]
    allow_uppercase: bool,

    #[serde(default = "default_value")]
    passthrough_last: bool,
}

#[derive(Deserialize)]
struct JsonFunction {
    name: String,

    #[serde(default = "default_value")]
    description: String,

    r#type: String,

    #[serde(default = "default_value")]
    parameters: Vec<JsonFunctionParameter>,

    engines: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct JsonCatalogue {
    #[allow(dead_code)]
    description: String,
    functions: Vec<JsonFunction>,
    globals: Vec<JsonGlobal>,
}

// snake_case source tag -> ValueType::PascalCase variant
fn snake_to_pascal(t: &str) -> String {
    let mut s: Vec<char> = t.chars().collect();
    s[0].make_ascii_uppercase();

    loop {
        if let Some(n) = s.iter().position(|x| *x == '_') {
            s[n + 1].make_ascii_uppercase();
            s.remove(n);
        } else {
            break;
        }
    }

    format!("crate::value_type::ValueType::{}", s.into_iter().collect::<String>())
}

// JSON engine slot -> EngineIndex literal. Absent key or explicit null is
// NotPresent; the string "unknown" is the UNKNOWN sentinel; anything else
// must be a concrete u16 index.
fn generate_slot(t: &BTreeMap<String, Value>, key: &str) -> String {
    match t.get(key) {
        None | Some(Value::Null) => "crate::definitions::EngineIndex::NotPresent".to_owned(),
        Some(Value::String(s)) if s == "unknown" => "crate::definitions::EngineIndex::Unknown".to_owned(),
        Some(Value::Number(n)) => {
            let v = n.as_u64().expect("engine index must be an integer");
            assert!(v < 65534, "engine index must be a concrete slot below the UNKNOWN sentinel");
            format!("crate::definitions::EngineIndex::Present({v}u16)")
        }
        _ => unreachable!("engine availability entries are null, \"unknown\", or an integer index"),
    }
}

fn generate_availability(t: &BTreeMap<String, Value>) -> String {
    format!(
        "crate::definitions::EngineAvailability {{ xbox: {}, gbx_retail: {}, gbx_demo: {}, gbx_custom: {}, mcc_cea: {} }}",
        generate_slot(t, "xbox"),
        generate_slot(t, "gbx-retail"),
        generate_slot(t, "gbx-demo"),
        generate_slot(t, "gbx-custom"),
        generate_slot(t, "mcc-cea"),
    )
}

/// Expands to two name-sorted `const` arrays, `ALL_FUNCTIONS` and `ALL_GLOBALS`,
/// read from a JSON catalogue bundled into this crate at compile time.
#[proc_macro]
pub fn generate_definitions(_: TokenStream) -> TokenStream {
    let json = include_bytes!("definition/definition.json");
    let catalogue: JsonCatalogue =
        serde_json::from_slice(&json[..]).expect("definition.json must parse");

    let mut globals: Vec<&JsonGlobal> = catalogue.globals.iter().collect();
    globals.sort_by(|a, b| a.name.cmp(&b.name));

    let mut functions: Vec<&JsonFunction> = catalogue.functions.iter().collect();
    functions.sort_by(|a, b| a.name.cmp(&b.name));

    let mut globals_list = String::new();
    for g in &globals {
        let name = &g.name;
        let value_type = snake_to_pascal(&g.r#type);
        let availability = generate_availability(&g.engines);
        globals_list += &format!(
            "crate::definitions::EngineGlobal {{ name: \"{name}\", value_type: {value_type}, availability: {availability} }},"
        );
    }

    let mut functions_list = String::new();
    for f in &functions {
        let name = &f.name;
        let return_type = snake_to_pascal(&f.r#type);
        let availability = generate_availability(&f.engines);
        assert!(f.parameters.len() <= 6, "function {name} declares more than 6 parameters");

        let mut parameters = String::new();
        for p in &f.parameters {
            let value_type = snake_to_pascal(&p.r#type);
            let many = p.many;
            let optional = p.optional;
            let allow_uppercase = p.allow_uppercase;
            let passthrough_last = p.passthrough_last;
            parameters += &format!(
                "crate::definitions::EngineFunctionParameter {{ value_type: {value_type}, many: {many}, optional: {optional}, allow_uppercase: {allow_uppercase}, passthrough_last: {passthrough_last} }},"
            );
        }

        functions_list += &format!(
            "crate::definitions::EngineFunction {{ name: \"{name}\", return_type: {return_type}, availability: {availability}, parameters: &[{parameters}] }},"
        );
    }

    format!(
        "pub(crate) const ALL_GLOBALS: [crate::definitions::EngineGlobal; {}] = [{}]; pub(crate) const ALL_FUNCTIONS: [crate::definitions::EngineFunction; {}] = [{}];",
        globals.len(),
        globals_list,
        functions.len(),
        functions_list,
    )
    .parse()
    .unwrap()
}
