// Classification prompt and the declared response schema.

use serde_json::{json, Value};

pub const CLASSIFY_SYSTEM: &str = "\
You are a fashion AI that catalogues clothing for a digital wardrobe. \
Describe the single garment shown in the photo. \
You MUST respond with valid JSON only, matching the provided schema. \
If you cannot determine a field, use the literal string \"unknown\" instead of omitting it.";

pub const CLASSIFY_PROMPT: &str = "\
Identify this clothing item. Return its category as exactly one of: \
tops, bottoms, shoes, dresses, outerwear, accessories (or \"unknown\"). \
Put the specific garment type (e.g. t-shirt, jeans, sneakers) in subcategory. \
Also return its base color, formality and the seasons it suits. \
Fill `labels_json` with fit, material, texture, color (base and secondary), pattern, \
formality, season, weather_suitability, occasion and gender_fit. \
Use \"unknown\" for anything you cannot tell from the image.";

/// Category values the closet filters on. `"unknown"` is allowed like
/// every other field.
pub const CATEGORIES: &[&str] = &[
    "tops",
    "bottoms",
    "shoes",
    "dresses",
    "outerwear",
    "accessories",
    "unknown",
];

/// Name under which the schema is declared to the provider.
pub const SCHEMA_NAME: &str = "clothing_schema";

/// JSON schema the provider's answer must satisfy.
pub fn clothing_schema() -> Value {
    let string_list = json!({ "type": "array", "items": { "type": "string" } });

    json!({
        "type": "object",
        "properties": {
            "category": { "type": "string", "enum": CATEGORIES },
            "subcategory": { "type": "string" },
            "color_base": { "type": "string" },
            "formality": { "type": "string" },
            "season": string_list,
            "labels_json": {
                "type": "object",
                "properties": {
                    "fit": { "type": "string" },
                    "material": { "type": "string" },
                    "texture": { "type": "string" },
                    "color": {
                        "type": "object",
                        "properties": {
                            "base": { "type": "string" },
                            "secondary": { "type": "string" }
                        },
                        "required": ["base", "secondary"]
                    },
                    "pattern": { "type": "string" },
                    "formality": { "type": "string" },
                    "season": string_list,
                    "weather_suitability": string_list,
                    "occasion": string_list,
                    "gender_fit": { "type": "string" }
                },
                "required": [
                    "fit", "material", "texture", "color", "pattern", "formality",
                    "season", "weather_suitability", "occasion", "gender_fit"
                ]
            }
        },
        "required": ["category", "subcategory", "color_base", "formality", "season", "labels_json"]
    })
}
