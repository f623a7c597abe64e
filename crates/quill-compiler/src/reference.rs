//! Machine-generated built-in reference.
//!
//! [`builtin_table`] renders every registered built-in as JSON for tooling
//! and documentation. It is generated from the registry, never hand-written.

use serde_json::json;

use quill_stdlib::builtins;

/// Canonical module ordering for output stability.
const MODULE_ORDER: &[&str] = &[
    "core", "math", "convert", "strings", "json", "encoding", "time",
];

/// Structured table of all built-ins, grouped by module, as pretty JSON.
pub fn builtin_table() -> String {
    let reg = builtins();
    let mut modules = Vec::new();

    for &module_name in MODULE_ORDER {
        let functions: Vec<_> = reg
            .iter()
            .filter(|b| b.module == module_name)
            .map(|b| {
                json!({
                    "name": b.name,
                    "arity": b.arity.to_string(),
                    "predicate": b.is_higher_order(),
                    "description": b.description,
                })
            })
            .collect();
        modules.push(json!({ "name": module_name, "functions": functions }));
    }

    let table = json!({
        "version": env!("CARGO_PKG_VERSION"),
        "total_functions": reg.len(),
        "modules": modules,
    });
    serde_json::to_string_pretty(&table).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> serde_json::Value {
        serde_json::from_str(&builtin_table()).expect("table should be valid JSON")
    }

    #[test]
    fn test_table_lists_every_builtin_once() {
        let parsed = table();
        let listed: usize = parsed["modules"]
            .as_array()
            .expect("modules")
            .iter()
            .map(|m| m["functions"].as_array().map_or(0, Vec::len))
            .sum();
        assert_eq!(listed, builtins().len());
        assert_eq!(parsed["total_functions"], builtins().len());
    }

    #[test]
    fn test_table_module_order() {
        let parsed = table();
        let names: Vec<&str> = parsed["modules"]
            .as_array()
            .expect("modules")
            .iter()
            .filter_map(|m| m["name"].as_str())
            .collect();
        assert_eq!(names, MODULE_ORDER);
    }

    #[test]
    fn test_table_describes_map_as_predicate() {
        let parsed = table();
        let core = &parsed["modules"][0]["functions"];
        let map = core
            .as_array()
            .expect("functions")
            .iter()
            .find(|f| f["name"] == "map")
            .expect("map listed");
        assert_eq!(map["predicate"], true);
        assert_eq!(map["arity"], "2");
    }
}
