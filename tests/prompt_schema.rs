use receipt_extract::{
    prompt::build_prompt,
    schema::{FieldType, RECEIPT_SCHEMA, SchemaCatalog},
};
use std::collections::HashSet;

#[test]
fn schema_fields_are_distinct_and_all_required() {
    let names: Vec<&str> = RECEIPT_SCHEMA.fields.iter().map(|f| f.name).collect();
    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(names.len(), 7);
    assert_eq!(unique.len(), 7);
    assert_eq!(RECEIPT_SCHEMA.required, names.as_slice());
    assert_eq!(RECEIPT_SCHEMA.field("vatRate").map(|f| f.ty), Some(FieldType::Number));
    assert_eq!(RECEIPT_SCHEMA.field("dateOfSale").map(|f| f.ty), Some(FieldType::String));
}

#[test]
fn json_schema_keeps_definition_order() {
    let schema = RECEIPT_SCHEMA.to_json_schema();
    let props: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
    assert_eq!(
        props,
        [
            "companyName",
            "vatNumber",
            "priceWithoutVAT",
            "vat",
            "vatRate",
            "priceIncludingVAT",
            "dateOfSale"
        ]
    );
    assert_eq!(schema["properties"]["vat"]["format"], "float");
    assert!(schema["properties"]["vatNumber"].get("format").is_none());
}

#[test]
fn prompt_is_deterministic_and_ends_with_json_only_instruction() {
    let catalog = SchemaCatalog::receipt();
    let a = build_prompt(catalog.policy, &catalog.schema);
    let b = build_prompt(catalog.policy, &catalog.schema);
    assert_eq!(a, b);
    assert!(a.starts_with(catalog.policy));
    assert!(a.contains("Please extract the information according to this JSON schema:\n{\n  \"type\": \"object\","));
    assert!(a.ends_with("Return ONLY valid JSON that matches this schema. Do not include any explanatory text."));
    assert!(a.contains("dd.mm.yyyy"));
}
