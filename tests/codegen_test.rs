mod common;

use common::widget_provider_schema;
use tfprovider::codegen::{pascal_case, render_provider, Generator};
use tfprovider::schema::{ObjectType, ProviderSchemas, SchemaType};

#[test]
fn test_render_provider_declares_every_view() {
    let schemas = ProviderSchemas::from_response(&widget_provider_schema()).unwrap();
    let code = render_provider(&schemas);

    assert!(code.starts_with("// Generated from a provider schema."));
    assert!(code.contains("pub struct ProviderConfig {"));
    assert!(code.contains("pub struct WidgetArgs {"));
    assert!(code.contains("pub struct WidgetState {"));
    assert!(code.contains("pub struct LookupDataArgs {"));
    assert!(code.contains("pub struct LookupData {"));
    assert!(code.contains("pub struct WidgetArgsRule {"));
}

#[test]
fn test_render_provider_field_types() {
    let schemas = ProviderSchemas::from_response(&widget_provider_schema()).unwrap();
    let code = render_provider(&schemas);

    assert!(code.contains("    pub region: String,"));
    assert!(code.contains("    pub profile: Option<String>,"));
    assert!(code.contains("    pub size: Option<f64>,"));
    assert!(code.contains("    pub tags: Option<BTreeMap<String, String>>,"));
    assert!(code.contains("    pub rule: Option<Vec<WidgetArgsRule>>,"));
}

#[test]
fn test_generator_deduplicates_names() {
    let object = ObjectType::new().with("id", SchemaType::String);
    let mut gen = Generator::new();
    assert_eq!(gen.add_struct("Thing", &object), "Thing");
    assert_eq!(gen.add_struct("Thing", &object), "Thing2");
    assert_eq!(gen.add_struct("Thing", &object), "Thing3");
    let code = gen.finish();
    assert!(code.contains("pub struct Thing3 {"));
}

#[test]
fn test_generator_renames_awkward_fields() {
    let object = ObjectType::new()
        .with("type", SchemaType::String)
        .with_optional("kebab-name", SchemaType::Boolean);
    let mut gen = Generator::new();
    gen.add_struct("Odd", &object);
    let code = gen.finish();
    assert!(code.contains("    pub r#type: String,"));
    assert!(code.contains(
        "    #[serde(rename = \"kebab-name\")]\n    pub kebab_name: Option<bool>,"
    ));
}

#[test]
fn test_generator_renames_path_keywords() {
    let object = ObjectType::new()
        .with("crate", SchemaType::String)
        .with("self", SchemaType::String)
        .with_optional("super", SchemaType::Number)
        .with("Self", SchemaType::Boolean);
    let mut gen = Generator::new();
    gen.add_struct("Keywords", &object);
    let code = gen.finish();
    assert!(code.contains("    #[serde(rename = \"crate\")]\n    pub crate_: String,"));
    assert!(code.contains("    #[serde(rename = \"self\")]\n    pub self_: String,"));
    assert!(code.contains("    #[serde(rename = \"super\")]\n    pub super_: Option<f64>,"));
    assert!(code.contains("    #[serde(rename = \"Self\")]\n    pub Self_: bool,"));
    assert!(!code.contains("r#crate"));
    assert!(!code.contains("r#self"));
}

#[test]
fn test_pascal_case_resource_names() {
    assert_eq!(pascal_case("aws_security_group_rule"), "AwsSecurityGroupRule");
}
