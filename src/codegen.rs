//! Rendering of Rust type declarations from translated schemas.
//!
//! Struct fields follow property declaration order; optional properties become
//! `Option<T>` and nested objects get their own struct named after the path.

use std::collections::HashSet;
use std::fmt::Write;

use crate::schema::{Kind, ObjectType, ProviderSchemas, SchemaType};

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "typeof", "unsized", "virtual", "yield", "try",
];

// Keywords that cannot be written as raw identifiers
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "super", "Self"];

/// Accumulates struct declarations, deduplicating type names.
#[derive(Default)]
pub struct Generator {
    structs: Vec<String>,
    names: HashSet<String>,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a struct for `object` (and any nested objects). Returns the
    /// name actually used, which gains a numeric suffix on collision.
    pub fn add_struct(&mut self, name: &str, object: &ObjectType) -> String {
        let name = self.reserve(name);
        let mut body = String::new();
        let _ = writeln!(body, "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]");
        let _ = writeln!(body, "pub struct {} {{", name);
        for property in object.properties() {
            let nested_name = format!("{}{}", name, pascal_case(&property.name));
            let ty = self.rust_type(&nested_name, &property.ty);
            let (ident, renamed) = field_ident(&property.name);
            if renamed {
                let _ = writeln!(body, "    #[serde(rename = {:?})]", property.name);
            }
            let _ = writeln!(body, "    pub {}: {},", ident, ty);
        }
        body.push_str("}\n");
        self.structs.push(body);
        name
    }

    fn rust_type(&mut self, name: &str, ty: &SchemaType) -> String {
        match ty {
            SchemaType::Boolean => "bool".to_string(),
            SchemaType::Number => "f64".to_string(),
            SchemaType::String => "String".to_string(),
            SchemaType::Array(elem) => format!("Vec<{}>", self.rust_type(name, elem)),
            SchemaType::Map(elem) => {
                format!("BTreeMap<String, {}>", self.rust_type(name, elem))
            }
            SchemaType::Object(object) => self.add_struct(name, object),
            SchemaType::Optional(inner) => format!("Option<{}>", self.rust_type(name, inner)),
        }
    }

    fn reserve(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut n = 2;
        while !self.names.insert(candidate.clone()) {
            candidate = format!("{}{}", name, n);
            n += 1;
        }
        candidate
    }

    /// Render everything declared so far as one Rust module.
    pub fn finish(self) -> String {
        let mut out = String::from(
            "// Generated from a provider schema.\n\n\
             use serde::{Deserialize, Serialize};\n\
             use std::collections::BTreeMap;\n",
        );
        for s in self.structs {
            out.push('\n');
            out.push_str(&s);
        }
        out
    }
}

/// Render config and state structs for the provider, every resource and every data source.
pub fn render_provider(schemas: &ProviderSchemas) -> String {
    let mut gen = Generator::new();
    gen.add_struct("ProviderConfig", schemas.provider(Kind::Args));

    for type_name in schemas.resource_types() {
        let base = pascal_case(&type_name);
        if let Some(args) = schemas.resource(&type_name, Kind::Args) {
            gen.add_struct(&format!("{}Args", base), args);
        }
        if let Some(state) = schemas.resource(&type_name, Kind::Attrs) {
            gen.add_struct(&format!("{}State", base), state);
        }
    }

    for type_name in schemas.data_source_types() {
        let base = pascal_case(&type_name);
        if let Some(args) = schemas.data_source(&type_name, Kind::Args) {
            gen.add_struct(&format!("{}DataArgs", base), args);
        }
        if let Some(state) = schemas.data_source(&type_name, Kind::Attrs) {
            gen.add_struct(&format!("{}Data", base), state);
        }
    }

    gen.finish()
}

/// `aws_s3_bucket` -> `AwsS3Bucket`.
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// A valid Rust field identifier for a property, and whether it differs from
/// the property name (so a serde rename is needed).
fn field_ident(name: &str) -> (String, bool) {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) || ident.is_empty() {
        ident.insert(0, '_');
    }
    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        return (format!("{}_", ident), true);
    }
    if RUST_KEYWORDS.contains(&ident.as_str()) {
        return (format!("r#{}", ident), ident != name);
    }
    let renamed = ident != name;
    (ident, renamed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("aws_s3_bucket"), "AwsS3Bucket");
        assert_eq!(pascal_case("widget"), "Widget");
        assert_eq!(pascal_case("my-thing"), "MyThing");
    }

    #[test]
    fn test_field_ident_keywords_and_symbols() {
        assert_eq!(field_ident("type"), ("r#type".to_string(), false));
        assert_eq!(field_ident("name"), ("name".to_string(), false));
        assert_eq!(field_ident("x-id"), ("x_id".to_string(), true));
        assert_eq!(field_ident("9lives"), ("_9lives".to_string(), true));
        assert_eq!(field_ident("crate"), ("crate_".to_string(), true));
        assert_eq!(field_ident("self"), ("self_".to_string(), true));
        assert_eq!(field_ident("super"), ("super_".to_string(), true));
        assert_eq!(field_ident("Self"), ("Self_".to_string(), true));
    }
}
