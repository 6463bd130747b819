use serde_json::json;
use tfprovider::error::ValidationError;
use tfprovider::schema::types::validate;
use tfprovider::schema::{ObjectType, SchemaType};

fn server_type() -> ObjectType {
    let ingress = ObjectType::new()
        .with("port", SchemaType::Number)
        .with_optional("description", SchemaType::String);
    ObjectType::new()
        .with("name", SchemaType::String)
        .with_optional("enabled", SchemaType::Boolean)
        .with_optional("tags", SchemaType::map(SchemaType::String))
        .with_optional("ingress", SchemaType::array(SchemaType::Object(ingress)))
}

// ─── Construction ────────────────────────────────────────────────────────────

#[test]
fn test_optional_never_double_wraps() {
    let once = SchemaType::optional(SchemaType::String);
    let twice = SchemaType::optional(once.clone());
    assert_eq!(once, twice);
    assert!(twice.is_optional());
    assert_eq!(twice.without_optional(), &SchemaType::String);
}

#[test]
fn test_object_keeps_declaration_order() {
    let object = server_type();
    let names: Vec<&str> = object.names().collect();
    assert_eq!(names, vec!["name", "enabled", "tags", "ingress"]);
    assert_eq!(object.len(), 4);
    assert!(object.contains("tags"));
    assert!(!object.contains("missing"));
}

#[test]
fn test_duplicate_property_replaces_in_place() {
    let object = ObjectType::new()
        .with("a", SchemaType::String)
        .with("b", SchemaType::Number)
        .with("a", SchemaType::Boolean);
    let names: Vec<&str> = object.names().collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(object.get("a"), Some(&SchemaType::Boolean));
}

#[test]
fn test_object_from_iterator() {
    let object: ObjectType = vec![
        ("x".to_string(), SchemaType::Number),
        ("y".to_string(), SchemaType::optional(SchemaType::Number)),
    ]
    .into_iter()
    .collect();
    assert_eq!(object.len(), 2);
    assert!(object.properties()[1].is_optional());
}

#[test]
fn test_schema_type_serializes_tagged() {
    let ty = SchemaType::array(SchemaType::optional(SchemaType::String));
    assert_eq!(
        serde_json::to_value(&ty).unwrap(),
        json!({"type": "array", "of": {"type": "optional", "of": {"type": "string"}}})
    );
}

// ─── Validation: accepted values ─────────────────────────────────────────────

#[test]
fn test_validate_minimal_value() {
    assert!(validate(&json!({"name": "web"}), &server_type()).is_ok());
}

#[test]
fn test_validate_full_value() {
    let value = json!({
        "name": "web",
        "enabled": true,
        "tags": {"env": "prod"},
        "ingress": [{"port": 443}, {"port": 80, "description": "http"}]
    });
    assert!(server_type().validate(&value).is_ok());
}

#[test]
fn test_validate_skips_null_optionals() {
    let value = json!({"name": "web", "enabled": null, "tags": null});
    assert!(server_type().validate(&value).is_ok());
}

#[test]
fn test_validate_ignores_undeclared_keys() {
    let value = json!({"name": "web", "extra": [1, 2, 3]});
    assert!(server_type().validate(&value).is_ok());
}

// ─── Validation: rejected values ─────────────────────────────────────────────

#[test]
fn test_validate_missing_required() {
    let err = server_type().validate(&json!({"enabled": true})).unwrap_err();
    assert_eq!(
        err,
        ValidationError::new("name", "required property is missing")
    );
}

#[test]
fn test_validate_null_required_is_missing() {
    let err = server_type().validate(&json!({"name": null})).unwrap_err();
    assert_eq!(err.path, "name");
    assert_eq!(err.message, "required property is missing");
}

#[test]
fn test_validate_wrong_primitive() {
    let err = server_type()
        .validate(&json!({"name": "web", "enabled": "yes"}))
        .unwrap_err();
    assert_eq!(err.path, "enabled");
    assert!(err.message.contains("expected boolean"));
    assert!(err.message.contains("got string"));
}

#[test]
fn test_validate_reports_array_element_path() {
    let value = json!({"name": "web", "ingress": [{"port": 443}, {"port": "eighty"}]});
    let err = server_type().validate(&value).unwrap_err();
    assert_eq!(err.path, "ingress[1].port");
}

#[test]
fn test_validate_reports_missing_nested_required() {
    let value = json!({"name": "web", "ingress": [{"description": "no port"}]});
    let err = server_type().validate(&value).unwrap_err();
    assert_eq!(err.path, "ingress[0].port");
    assert_eq!(err.message, "required property is missing");
}

#[test]
fn test_validate_reports_map_entry_path() {
    let value = json!({"name": "web", "tags": {"env": 1}});
    let err = server_type().validate(&value).unwrap_err();
    assert_eq!(err.path, r#"tags["env"]"#);
}

#[test]
fn test_validate_stops_at_first_failure_in_declaration_order() {
    // Both `name` and `enabled` are wrong; `name` is declared first.
    let value = json!({"name": 5, "enabled": "no"});
    let err = server_type().validate(&value).unwrap_err();
    assert_eq!(err.path, "name");
}

#[test]
fn test_validate_non_object_root() {
    let err = server_type().validate(&json!([1, 2])).unwrap_err();
    assert_eq!(err.path, "<root>");
    assert!(err.message.contains("expected object"));
}

#[test]
fn test_validation_error_display() {
    let err = ValidationError::new("a.b", "expected number, got string");
    assert_eq!(
        err.to_string(),
        "Validation error at 'a.b': expected number, got string"
    );
}
