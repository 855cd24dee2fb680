use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("document is missing")]
    Missing,

    #[error("document does not match the legacy shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Converts a raw legacy resume document into the new document shape.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, raw: Option<&Value>) -> Result<Value, DocumentError>;
}

/// Sections that exist as first-class keys in both document versions.
const BUILT_IN_SECTIONS: [&str; 12] = [
    "profiles",
    "experience",
    "education",
    "projects",
    "skills",
    "languages",
    "interests",
    "awards",
    "certifications",
    "publications",
    "volunteer",
    "references",
];

#[derive(Deserialize)]
struct LegacyDocument {
    basics: LegacyBasics,
    sections: Map<String, Value>,
    metadata: Map<String, Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LegacyBasics {
    name: String,
    headline: String,
    email: String,
    phone: String,
    location: String,
    url: LegacyUrl,
    #[serde(rename = "customFields")]
    custom_fields: Vec<Value>,
    picture: Option<LegacyPicture>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LegacyUrl {
    label: String,
    href: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LegacyPicture {
    url: String,
    size: Option<u32>,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: Option<f64>,
    #[serde(rename = "borderRadius")]
    border_radius: Option<u32>,
}

/// Structural conversion of the legacy `{ basics, sections, metadata }`
/// document.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyDocumentConverter;

impl DocumentConverter for LegacyDocumentConverter {
    fn convert(&self, raw: Option<&Value>) -> Result<Value, DocumentError> {
        let raw = match raw {
            None | Some(Value::Null) => return Err(DocumentError::Missing),
            Some(raw) => raw,
        };
        let legacy = LegacyDocument::deserialize(raw)?;
        Ok(convert_document(legacy))
    }
}

fn convert_document(legacy: LegacyDocument) -> Value {
    let LegacyDocument {
        basics,
        mut sections,
        metadata,
    } = legacy;

    let picture = basics.picture.unwrap_or_default();
    let summary = sections
        .remove("summary")
        .map(convert_section)
        .unwrap_or_else(|| default_section("Summary"));

    let mut new_sections = Map::new();
    for name in BUILT_IN_SECTIONS {
        let section = sections
            .remove(name)
            .map(convert_section)
            .unwrap_or_else(|| default_section(&title_case(name)));
        new_sections.insert(name.to_string(), section);
    }

    let custom_sections: Vec<Value> = match sections.remove("custom") {
        Some(Value::Object(custom)) => custom.into_iter().map(|(_, s)| convert_section(s)).collect(),
        _ => Vec::new(),
    };

    json!({
        "picture": {
            "hidden": picture.url.is_empty(),
            "url": picture.url,
            "size": picture.size.unwrap_or(80),
            "aspectRatio": picture.aspect_ratio.unwrap_or(1.0),
            "borderRadius": picture.border_radius.unwrap_or(0),
        },
        "basics": {
            "name": basics.name,
            "headline": basics.headline,
            "email": basics.email,
            "phone": basics.phone,
            "location": basics.location,
            "website": { "url": basics.url.href, "label": basics.url.label },
            "customFields": basics.custom_fields,
        },
        "summary": summary,
        "sections": new_sections,
        "customSections": custom_sections,
        "metadata": metadata,
    })
}

/// Legacy sections carry `visible`; the new shape carries `hidden` and a
/// `title` instead of `name`.
fn convert_section(section: Value) -> Value {
    let Value::Object(mut fields) = section else {
        return section;
    };

    if let Some(visible) = fields.remove("visible") {
        let hidden = !visible.as_bool().unwrap_or(true);
        fields.insert("hidden".into(), Value::Bool(hidden));
    }
    if let Some(name) = fields.remove("name") {
        fields.entry("title").or_insert(name);
    }
    Value::Object(fields)
}

fn default_section(title: &str) -> Value {
    json!({
        "title": title,
        "columns": 1,
        "hidden": false,
        "items": [],
    })
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Document written when the legacy payload cannot be converted.
pub fn default_document() -> Value {
    convert_document(LegacyDocument {
        basics: LegacyBasics::default(),
        sections: Map::new(),
        metadata: Map::new(),
    })
}
