use serde_json::{Map, Value, json};

/// Instructions sent ahead of the schema in every request.
pub const EXTRACTION_POLICY: &str = "Extract the following details from the provided image of receipt document. \
First look for VAT identification number (vatNumber) in the document and associated name of the company (companyName).
Ensure all fields from the schema are populated if the information is present in the document. \
If a piece of information is not found, you may omit the field or use a suitable placeholder like 'N/A' if the schema requires it, \
but prioritize extracting actual values. For numerical values (prices, VAT amount, VAT rate), provide them as numbers (float).
For VAT rate, if it's written as e.g. '21%', provide the number 21. \
Also, extract the date of sale (transaction date) from the receipt always in dd.mm.yyyy format. \
It might be in dd/mm/yyyy or dd.mm.yyyy format on document. \
If multiple dates are present (e.g., issue date, due date), use the primary transaction sale date.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
}

impl FieldType {
    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub description: &'static str,
}

/// Target record shape. Field order here is the order used when rendering.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub fields: &'static [FieldSpec],
    pub required: &'static [&'static str],
}

pub const RECEIPT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "companyName",
        ty: FieldType::String,
        description: "The legal name of the company that issued the receipt always associated with the VAT identification number. Legal name always includes legal form (e.g. s.r.o., a.s. etc.)",
    },
    FieldSpec {
        name: "vatNumber",
        ty: FieldType::String,
        description: "The VAT identification number of the company.",
    },
    FieldSpec {
        name: "priceWithoutVAT",
        ty: FieldType::Number,
        description: "The total price of goods/services before VAT is applied. Use 0.0 if not explicitly found.",
    },
    FieldSpec {
        name: "vat",
        ty: FieldType::Number,
        description: "The total VAT amount charged. Use 0.0 if not explicitly found.",
    },
    FieldSpec {
        name: "vatRate",
        ty: FieldType::Number,
        description: "The VAT rate as a percentage (e.g., 21 for 21%). Use 0.0 if not explicitly found.",
    },
    FieldSpec {
        name: "priceIncludingVAT",
        ty: FieldType::Number,
        description: "The final price including VAT. This is usually the most prominent total amount.",
    },
    FieldSpec {
        name: "dateOfSale",
        ty: FieldType::String,
        description: "The date of sale or transaction date from the receipt, in dd.mm.yyyy format.",
    },
];

pub const RECEIPT_SCHEMA: FieldSchema = FieldSchema {
    fields: RECEIPT_FIELDS,
    required: &[
        "companyName",
        "vatNumber",
        "priceWithoutVAT",
        "vat",
        "vatRate",
        "priceIncludingVAT",
        "dateOfSale",
    ],
};

impl FieldSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// JSON Schema object: `type`, `required`, then `properties` in field order.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for f in self.fields {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(f.ty.as_str()));
            if f.ty == FieldType::Number {
                prop.insert("format".into(), json!("float"));
            }
            prop.insert("description".into(), json!(f.description));
            properties.insert(f.name.into(), Value::Object(prop));
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("required".into(), json!(self.required));
        schema.insert("properties".into(), Value::Object(properties));
        Value::Object(schema)
    }
}

/// The fixed policy and schema every request is built from.
#[derive(Debug, Clone, Copy)]
pub struct SchemaCatalog {
    pub policy: &'static str,
    pub schema: FieldSchema,
}

impl SchemaCatalog {
    pub const fn receipt() -> Self {
        Self {
            policy: EXTRACTION_POLICY,
            schema: RECEIPT_SCHEMA,
        }
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::receipt()
    }
}
