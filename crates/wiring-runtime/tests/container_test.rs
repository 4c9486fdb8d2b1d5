//! End-to-end resolution tests for the Wiring container.
//!
//! These tests drive the full pipeline from raw configuration to wired
//! object graphs:
//! 1. Cycle detection through constructor and value bindings
//! 2. Parameters and `{$name}` interpolation
//! 3. Type defaults and auto-built registered types
//! 4. Nested literal values
//! 5. Setter injection closing reference cycles
//! 6. Lifetimes, factories, and error reporting

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::cell::RefCell;

use serde_json::{Value as Json, json};
use wiring_common::config::{AssemblyDocument, ContainerOptions};
use wiring_common::error::WiringError;
use wiring_common::types::{Instance, Value};
use wiring_runtime::{Container, Param, TypeBinding, TypeRegistry};

// ── Host fixtures ────────────────────────────────────────────────────

struct SampleDependency;

#[derive(Default)]
struct SampleDependencyWithSetter {
    root: RefCell<Value>,
}

impl SampleDependencyWithSetter {
    fn root(&self) -> Value {
        self.root.borrow().clone()
    }
}

struct SampleRoot {
    dep: Instance,
}

struct SampleFactory;

struct Greeter {
    greeting: String,
    punctuation: String,
    audience: Value,
}

struct Broken;

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(TypeBinding::<SampleDependency>::new("SampleDependency").constructor([], |_| Ok(SampleDependency)))
        .with(
            TypeBinding::<SampleDependencyWithSetter>::new("SampleDependencyWithSetter")
                .constructor([], |_| Ok(SampleDependencyWithSetter::default()))
                .setter("root", |this: &SampleDependencyWithSetter, value| {
                    let _ = this.root.replace(value);
                    Ok(())
                }),
        )
        .with(
            TypeBinding::<SampleRoot>::new("SampleRoot").constructor(
                [Param::typed("arg", "SampleDependency")],
                |args| {
                    let dep = args
                        .get("arg")?
                        .as_instance()
                        .cloned()
                        .ok_or_else(|| WiringError::host("SampleRoot", "arg must be an object"))?;
                    Ok(SampleRoot { dep })
                },
            ),
        )
        .with(
            TypeBinding::<SampleFactory>::new("SampleFactory")
                .constructor([], |_| Ok(SampleFactory))
                .method("createDep", [], |_: &SampleFactory, _| {
                    Ok(Value::object("SampleDependency", SampleDependency))
                })
                .static_method("build", [Param::new("label")], |args| {
                    Ok(Value::from(format!("built {}", args.string("label")?)))
                }),
        )
        .with(
            TypeBinding::<Greeter>::new("Greeter").constructor(
                [
                    Param::new("greeting"),
                    Param::new("punctuation").with_default("!"),
                    Param::typed("audience", "Audience").optional(),
                ],
                |args| {
                    Ok(Greeter {
                        greeting: args.string("greeting")?,
                        punctuation: args.string("punctuation")?,
                        audience: args.take("audience")?,
                    })
                },
            ),
        )
        .with(
            TypeBinding::<Broken>::new("Broken")
                .constructor([], |_| Err(WiringError::host("Broken", "refusing to start"))),
        )
}

fn container(entries: &Json) -> Container {
    container_with(entries, &json!({}), ContainerOptions::default())
}

fn container_with(entries: &Json, parameters: &Json, options: ContainerOptions) -> Container {
    Container::from_config(
        entries.as_object().expect("entries mapping"),
        parameters.as_object().expect("parameters mapping"),
        registry(),
        options,
    )
    .expect("container should build")
}

fn root_of(value: &Value) -> std::rc::Rc<SampleRoot> {
    value.downcast::<SampleRoot>().expect("SampleRoot instance")
}

// ── Cycles ───────────────────────────────────────────────────────────

#[test]
fn circular_value_references_are_detected() {
    let mut c = container(&json!({
        "a": {"value": {"ref": "b"}},
        "b": {"value": {"ref": "c"}},
        "c": {"value": {"ref": "a"}}
    }));
    let err = c.get_instance("a").unwrap_err();
    let WiringError::CyclicDependency { id, path } = err.root_cause() else {
        panic!("expected cycle, got {err}");
    };
    assert_eq!(id, "a");
    assert_eq!(path, &["a", "b", "c", "a"]);
    assert!(err.to_string().contains("+ get a"), "trace missing: {err}");
}

#[test]
fn circular_constructor_arguments_are_detected() {
    let mut c = container(&json!({
        "root": {"class": "SampleRoot", "args": {"arg": {"ref": "other"}}},
        "other": {"class": "SampleRoot", "args": {"arg": {"ref": "root"}}}
    }));
    let err = c.get_instance("root").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::CyclicDependency { .. }));
    assert!(!c.is_cached("root"));
    assert!(!c.is_cached("other"));
}

#[test]
fn independent_calls_share_no_trace() {
    let mut c = container(&json!({
        "dep": {"class": "SampleDependency"},
        "root": {"class": "SampleRoot", "args": {"arg": {"ref": "dep"}}}
    }));
    let _ = c.get_instance("dep").expect("dep");
    let _ = c.get_instance("root").expect("root");
    let _ = c.get_instance("dep").expect("dep again");
}

// ── Parameters ───────────────────────────────────────────────────────

#[test]
fn interpolates_parameters_in_values() {
    let mut c = container_with(
        &json!({"some": {"value": "interpolated {$param}"}}),
        &json!({"param": "test"}),
        ContainerOptions::default(),
    );
    assert_eq!(c.get_instance("some").expect("get"), Value::from("interpolated test"));
}

#[test]
fn unknown_interpolation_token_is_permissive_by_default() {
    let mut c = container(&json!({"path": {"value": "{$home}/cache"}}));
    assert_eq!(c.get_instance("path").expect("get"), Value::from("home/cache"));
}

#[test]
fn unknown_interpolation_token_fails_in_strict_mode() {
    let options = ContainerOptions {
        strict_interpolation: true,
        ..ContainerOptions::default()
    };
    let mut c = container_with(&json!({"path": {"value": "{$home}/cache"}}), &json!({}), options);
    let err = c.get_instance("path").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::UndefinedParameter { name } if name == "home"));
}

#[test]
fn undefined_parameter_binding_fails() {
    let mut c = container(&json!({"v": {"value": {"param": "missing"}}}));
    let err = c.get_instance("v").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::UndefinedParameter { name } if name == "missing"));
}

#[test]
fn null_parameter_counts_as_undefined() {
    let mut c = container_with(
        &json!({
            "v": {"value": {"param": "home"}},
            "path": {"value": "{$home}/cache"}
        }),
        &json!({"home": null}),
        ContainerOptions::default(),
    );
    let err = c.get_instance("v").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::UndefinedParameter { name } if name == "home"));
    assert_eq!(c.get_instance("path").expect("path"), Value::from("home/cache"));
}

#[test]
fn set_parameter_applies_to_later_resolutions() {
    let mut c = container(&json!({"v": {"value": {"param": "late"}, "lifetime": "instance"}}));
    assert!(c.get_instance("v").is_err());
    let _ = c.set_parameter("late", "now");
    assert_eq!(c.get_instance("v").expect("get"), Value::from("now"));
}

// ── Type defaults ────────────────────────────────────────────────────

#[test]
fn default_implementation_satisfies_typed_parameter() {
    let mut c = container(&json!({
        "dep": {"class": "SampleDependency", "default-for": "SampleDependency"},
        "root": {"class": "SampleRoot"}
    }));
    let root = c.get_instance("root").expect("root");
    let dep = c.get_instance("dep").expect("dep");
    assert!(root_of(&root).dep.ptr_eq(dep.as_instance().expect("object")));
}

#[test]
fn default_implementation_may_be_a_subtype() {
    let mut c = container(&json!({
        "dep": {"class": "SampleDependencyWithSetter", "default-for": "SampleDependency"},
        "root": {"class": "SampleRoot"}
    }));
    let root = c.get_instance("root").expect("root");
    assert_eq!(root_of(&root).dep.type_name(), "SampleDependencyWithSetter");
}

#[test]
fn registered_types_are_auto_built_when_unbound() {
    let mut c = container(&json!({
        "root": {"class": "SampleRoot", "lifetime": "per-request"}
    }));
    let first = c.get_instance("root").expect("first");
    let second = c.get_instance("root").expect("second");
    assert_eq!(root_of(&first).dep.type_name(), "SampleDependency");
    assert!(!root_of(&first).dep.ptr_eq(&root_of(&second).dep));
}

#[test]
fn unsatisfiable_type_falls_back_to_optional_null() {
    let mut c = container(&json!({"greeter": {"class": "Greeter", "args": {"greeting": "hi"}}}));
    let greeter = c
        .get_instance("greeter")
        .expect("get")
        .downcast::<Greeter>()
        .expect("Greeter");
    assert_eq!(greeter.greeting, "hi");
    assert_eq!(greeter.punctuation, "!");
    assert!(greeter.audience.is_null());
}

#[test]
fn missing_required_argument_is_unresolvable() {
    let mut c = container(&json!({"greeter": {"class": "Greeter"}}));
    let err = c.get_instance("greeter").unwrap_err();
    assert!(matches!(
        err.root_cause(),
        WiringError::UnresolvableArgument { target, parameter }
            if target == "Greeter" && parameter == "greeting"
    ));
}

#[test]
fn instance_of_binding_without_default_or_type_fails() {
    let mut c = container(&json!({"v": {"value": {"instance-of": "Unknown"}}}));
    let err = c.get_instance("v").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::UnresolvableType { type_name } if type_name == "Unknown"));
}

// ── Values ───────────────────────────────────────────────────────────

#[test]
fn resolves_every_binding_kind_as_value() {
    let mut c = container_with(
        &json!({
            "direct": {"value": "direct"},
            "param": {"value": {"param": "param"}},
            "ref": {"value": {"ref": "direct"}},
            "instance-of": {"value": {"instance-of": "SampleDependency"}},
            "inner-class": {"value": {"class": "SampleDependency"}},
            "array": {"value": {
                "v1": "direct",
                "v2": {"param": "param"},
                "v3": {"ref": "direct"},
                "v4": [1, {"param": "param"}]
            }}
        }),
        &json!({"param": "X"}),
        ContainerOptions::default(),
    );
    assert_eq!(c.get_instance("direct").expect("direct"), Value::from("direct"));
    assert_eq!(c.get_instance("param").expect("param"), Value::from("X"));
    assert_eq!(c.get_instance("ref").expect("ref"), Value::from("direct"));
    assert!(
        c.get_instance("instance-of")
            .expect("instance-of")
            .downcast::<SampleDependency>()
            .is_some()
    );
    assert!(
        c.get_instance("inner-class")
            .expect("inner-class")
            .downcast::<SampleDependency>()
            .is_some()
    );
    let array = c.get_instance("array").expect("array");
    let map = array.as_map().expect("map");
    assert_eq!(map["v1"], Value::from("direct"));
    assert_eq!(map["v2"], Value::from("X"));
    assert_eq!(map["v3"], Value::from("direct"));
    assert_eq!(map["v4"], Value::List(vec![Value::Int(1), Value::from("X")]));
}

#[test]
fn mapping_values_keep_declaration_order() {
    let mut c = container(&json!({
        "ordered": {"value": {"zeta": 1, "alpha": {"ref": "two"}, "mid": 3}},
        "two": {"value": 2}
    }));
    let ordered = c.get_instance("ordered").expect("ordered");
    let keys: Vec<&str> = ordered
        .as_map()
        .expect("map")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["zeta", "alpha", "mid"]);
    assert_eq!(ordered.as_map().expect("map")["alpha"], Value::Int(2));
}

#[test]
fn nested_literal_resolves_element_wise() {
    let mut c = container_with(
        &json!({
            "other": {"value": "Y"},
            "nested": {"value": {"v1": "direct", "v2": {"param": "param"}, "v3": {"ref": "other"}}}
        }),
        &json!({"param": "X"}),
        ContainerOptions::default(),
    );
    let nested = c.get_instance("nested").expect("nested");
    assert_eq!(
        nested.to_json(),
        json!({"v1": "direct", "v2": "X", "v3": "Y"})
    );
}

// ── Setter injection ─────────────────────────────────────────────────

fn cross_linked() -> Container {
    container(&json!({
        "dep": {"class": "SampleDependencyWithSetter", "properties": {"root": {"ref": "root"}}},
        "root": {"class": "SampleRoot", "args": {"arg": {"ref": "dep"}}}
    }))
}

fn assert_linked(root: &Value, dep: &Value) {
    let root_obj = root_of(root);
    let dep_obj = dep
        .downcast::<SampleDependencyWithSetter>()
        .expect("dep with setter");
    assert!(root_obj.dep.ptr_eq(dep.as_instance().expect("object")));
    assert_eq!(&dep_obj.root(), root);
    let back = root_of(&dep_obj.root());
    assert!(back.dep.ptr_eq(dep.as_instance().expect("object")));
}

#[test]
fn cross_links_through_setters_starting_from_root() {
    let mut c = cross_linked();
    let root = c.get_instance("root").expect("root");
    let dep = c.get_instance("dep").expect("dep");
    assert_linked(&root, &dep);
}

#[test]
fn cross_links_through_setters_starting_from_dependency() {
    let mut c = cross_linked();
    let dep = c.get_instance("dep").expect("dep");
    let root = c.get_instance("root").expect("root");
    assert_linked(&root, &dep);
}

#[test]
fn missing_setter_fails_and_evicts_singleton() {
    let mut c = container(&json!({
        "dep": {"class": "SampleDependency", "properties": {"root": {"value": 1}}}
    }));
    let err = c.get_instance("dep").unwrap_err();
    assert!(matches!(
        err.root_cause(),
        WiringError::MissingSetter { type_name, property }
            if type_name == "SampleDependency" && property == "root"
    ));
    assert!(err.to_string().contains("populate dep"), "trace missing: {err}");
    assert!(!c.is_cached("dep"));
}

#[test]
fn failed_population_can_be_retried() {
    let mut c = container(&json!({
        "dep": {"class": "SampleDependencyWithSetter", "properties": {"root": {"param": "late"}}}
    }));
    assert!(c.get_instance("dep").is_err());
    assert!(!c.is_cached("dep"));

    let _ = c.set_parameter("late", 7);
    let dep = c.get_instance("dep").expect("retry");
    let dep = dep.downcast::<SampleDependencyWithSetter>().expect("dep");
    assert_eq!(dep.root(), Value::Int(7));
    assert!(c.is_cached("dep"));
}

#[test]
fn committed_sibling_survives_failure() {
    let mut c = container(&json!({
        "dep": {"class": "SampleDependency"},
        "list": {"value": [{"ref": "dep"}, {"ref": "broken"}]},
        "broken": {"class": "Broken"}
    }));
    let err = c.get_instance("list").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::Host { .. }));
    assert!(c.is_cached("dep"));
    assert!(!c.is_cached("broken"));
    assert!(!c.is_cached("list"));
}

#[test]
fn failed_population_rolls_back_linked_singletons() {
    let mut c = container(&json!({
        "a": {"class": "SampleDependencyWithSetter", "properties": {"root": {"ref": "b"}}},
        "b": {"class": "SampleDependencyWithSetter", "properties": {"root": {"param": "late"}}}
    }));
    let err = c.get_instance("a").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::UndefinedParameter { name } if name == "late"));
    assert!(!c.is_cached("a"));
    assert!(!c.is_cached("b"));

    let _ = c.set_parameter("late", 1);
    let a = c.get_instance("a").expect("retry");
    let b = c.get_instance("b").expect("b");
    let peer = a
        .downcast::<SampleDependencyWithSetter>()
        .expect("a")
        .root();
    assert_eq!(peer, b);
    let b = b.downcast::<SampleDependencyWithSetter>().expect("b");
    assert_eq!(b.root(), Value::Int(1));
}

#[test]
fn setter_ring_closes_through_nested_population() {
    let mut c = container(&json!({
        "a": {"class": "SampleDependencyWithSetter", "properties": {"root": {"ref": "b"}}},
        "b": {"class": "SampleDependencyWithSetter", "properties": {"root": {"ref": "c"}}},
        "c": {"class": "SampleDependencyWithSetter", "properties": {"root": {"ref": "a"}}}
    }));
    let a = c.get_instance("a").expect("a");
    let b = c.get_instance("b").expect("b");
    let c_value = c.get_instance("c").expect("c");
    let next = |value: &Value| {
        value
            .downcast::<SampleDependencyWithSetter>()
            .expect("node")
            .root()
    };
    assert_eq!(next(&a), b);
    assert_eq!(next(&b), c_value);
    assert_eq!(next(&c_value), a);
}

#[test]
fn per_request_setter_loop_is_rejected() {
    let mut c = container(&json!({
        "node": {
            "class": "SampleDependencyWithSetter",
            "lifetime": "per-request",
            "properties": {"root": {"ref": "node"}}
        }
    }));
    let err = c.get_instance("node").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::CyclicDependency { .. }));
}

// ── Lifetimes ────────────────────────────────────────────────────────

#[test]
fn singleton_returns_identical_instance() {
    let mut c = container(&json!({"dep": {"class": "SampleDependency", "lifetime": "single"}}));
    let first = c.get_instance("dep").expect("first");
    let second = c.get_instance("dep").expect("second");
    assert_eq!(first, second);
}

#[test]
fn per_request_returns_distinct_instances() {
    let mut c = container(&json!({"dep": {"class": "SampleDependency", "lifetime": "instance"}}));
    let first = c.get_instance("dep").expect("first");
    let second = c.get_instance("dep").expect("second");
    assert_ne!(first, second);
}

// ── Factories ────────────────────────────────────────────────────────

#[test]
fn factory_method_on_resolved_instance() {
    let mut c = container(&json!({
        "factory": {"class": "SampleFactory"},
        "dep": {"factory": {"ref": "factory"}, "method": "createDep"},
        "inline": {"factory": {"class": "SampleFactory"}, "method": "createDep"}
    }));
    assert!(c.get_instance("dep").expect("dep").downcast::<SampleDependency>().is_some());
    assert!(c.get_instance("inline").expect("inline").downcast::<SampleDependency>().is_some());
}

#[test]
fn factory_named_by_type_calls_static_method() {
    let mut c = container(&json!({
        "label": {"factory": "SampleFactory", "method": "build", "args": {"label": "{$what}"}}
    }));
    let _ = c.set_parameter("what", "twice");
    assert_eq!(c.get_instance("label").expect("label"), Value::from("built twice"));
}

#[test]
fn unknown_factory_method_is_reported() {
    let mut c = container(&json!({
        "dep": {"factory": {"class": "SampleFactory"}, "method": "nope"}
    }));
    let err = c.get_instance("dep").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::MissingMethod { method, .. } if method == "nope"));
}

// ── Errors & documents ───────────────────────────────────────────────

#[test]
fn undefined_entry_reports_no_definition() {
    let mut c = container(&json!({}));
    let err = c.get_instance("missing").unwrap_err();
    assert!(matches!(err.root_cause(), WiringError::NoDefinition { id } if id == "missing"));
    assert!(err.to_string().contains("failed to get container instance `missing`"));
}

#[test]
fn configuration_errors_prevent_construction() {
    let entries = json!({"bad": {"class": "A", "value": 1}});
    let err = Container::from_config(
        entries.as_object().expect("mapping"),
        &serde_json::Map::new(),
        registry(),
        ContainerOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, WiringError::Configuration { entry, .. } if entry == "bad"));
}

#[test]
fn builds_from_assembly_document() {
    let document = AssemblyDocument::from_json_str(
        r#"{
            "entries": {
                "dep": {"class": "SampleDependency", "default-for": "SampleDependency"},
                "root": {"class": "SampleRoot"},
                "greeting": {"value": "hello {$who}"}
            },
            "parameters": {"who": "wiring"},
            "options": {"strict-interpolation": true}
        }"#,
    )
    .expect("document");
    let mut c = Container::from_document(&document, registry()).expect("container");
    assert!(c.options().strict_interpolation);
    assert_eq!(c.get_instance("greeting").expect("greeting"), Value::from("hello wiring"));
    assert!(c.get_instance("root").is_ok());
}
