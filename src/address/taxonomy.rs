//! Fixed Semantic Taxonomy
//!
//! The versioned, read-only enumeration of universal semantic categories and
//! hierarchical clusters that the category/cluster bytes of an address are
//! drawn from. Every code resolves to exactly one name and every name to
//! exactly one code; classifiers must target this exact table version.

/// Bumped whenever an entry is added, renamed or removed. Classification
/// output is only comparable within a single taxonomy version.
pub const TAXONOMY_VERSION: &str = "1.0";

/// Universal semantic categories, one per category byte.
pub const CATEGORIES: &[(u8, &str)] = &[
    (0x01, "physical_object"),
    (0x02, "natural_object"),
    (0x03, "artifact"),
    (0x04, "tool"),
    (0x05, "container"),
    (0x06, "vehicle"),
    (0x07, "building"),
    (0x08, "furniture"),
    (0x09, "clothing"),
    (0x0A, "food"),
    (0x0B, "drink"),
    (0x0C, "plant"),
    (0x0D, "tree"),
    (0x0E, "flower"),
    (0x0F, "fruit"),
    (0x10, "animal"),
    (0x11, "mammal"),
    (0x12, "bird"),
    (0x13, "fish"),
    (0x14, "insect"),
    (0x15, "body_part"),
    (0x16, "substance"),
    (0x17, "material"),
    (0x18, "liquid"),
    (0x19, "gas"),
    (0x1A, "terrain"),
    (0x1B, "water_body"),
    (0x1C, "celestial_body"),
    (0x1D, "weather_phenomenon"),
    (0x1E, "location"),
    (0x1F, "direction"),
    (0x20, "path"),
    (0x21, "boundary"),
    (0x22, "human"),
    (0x23, "kinship"),
    (0x24, "occupation"),
    (0x25, "social_group"),
    (0x26, "institution"),
    (0x27, "motion_verb"),
    (0x28, "transfer_verb"),
    (0x29, "contact_verb"),
    (0x2A, "creation_verb"),
    (0x2B, "destruction_verb"),
    (0x2C, "perception_verb"),
    (0x2D, "cognition_verb"),
    (0x2E, "communication_verb"),
    (0x2F, "emotion_verb"),
    (0x30, "consumption_verb"),
    (0x31, "possession_verb"),
    (0x32, "change_verb"),
    (0x33, "stative_verb"),
    (0x34, "causative_verb"),
    (0x35, "body_action_verb"),
    (0x36, "social_action_verb"),
    (0x37, "weather_verb"),
    (0x38, "sound_verb"),
    (0x39, "existence_verb"),
    (0x3A, "aspect_verb"),
    (0x3B, "modal_notion"),
    (0x3C, "spatial_relation"),
    (0x3D, "temporal_relation"),
    (0x3E, "causal_relation"),
    (0x3F, "comparison_relation"),
    (0x40, "part_whole_relation"),
    (0x41, "logical_connector"),
    (0x42, "quantity"),
    (0x43, "number"),
    (0x44, "measure_unit"),
    (0x45, "time_unit"),
    (0x46, "time_of_day"),
    (0x47, "calendar_term"),
    (0x48, "season"),
    (0x49, "color"),
    (0x4A, "shape"),
    (0x4B, "size_property"),
    (0x4C, "weight_property"),
    (0x4D, "temperature_property"),
    (0x4E, "texture_property"),
    (0x4F, "speed_property"),
    (0x50, "age_property"),
    (0x51, "value_property"),
    (0x52, "moral_property"),
    (0x53, "difficulty_property"),
    (0x54, "emotion_state"),
    (0x55, "mental_state"),
    (0x56, "physical_state"),
    (0x57, "health_state"),
    (0x58, "perception_attribute"),
    (0x59, "sound"),
    (0x5A, "smell"),
    (0x5B, "taste"),
    (0x5C, "event"),
    (0x5D, "process"),
    (0x5E, "activity"),
    (0x5F, "game"),
    (0x60, "ritual"),
    (0x61, "conflict"),
    (0x62, "exchange"),
    (0x63, "art_form"),
    (0x64, "abstract_concept"),
];

/// Hierarchical clusters: the secondary frequency/abstraction/register axis
/// within a category, one per cluster byte.
pub const CLUSTERS: &[(u8, &str)] = &[
    (0x01, "ultra_frequent"),
    (0x02, "very_frequent"),
    (0x03, "frequent"),
    (0x04, "common"),
    (0x05, "uncommon"),
    (0x06, "rare"),
    (0x07, "very_rare"),
    (0x08, "archaic"),
    (0x09, "concrete"),
    (0x0A, "mostly_concrete"),
    (0x0B, "mixed_abstraction"),
    (0x0C, "abstract"),
    (0x0D, "highly_abstract"),
    (0x0E, "universal"),
    (0x0F, "near_universal"),
    (0x10, "widespread"),
    (0x11, "regional"),
    (0x12, "cultural"),
    (0x13, "technical"),
    (0x14, "scientific"),
    (0x15, "legal"),
    (0x16, "medical"),
    (0x17, "religious"),
    (0x18, "colloquial"),
    (0x19, "slang"),
    (0x1A, "formal"),
    (0x1B, "literary"),
    (0x1C, "poetic"),
    (0x1D, "child_register"),
    (0x1E, "core_vocabulary"),
    (0x1F, "extended_vocabulary"),
    (0x20, "peripheral_vocabulary"),
    (0x21, "loanword"),
    (0x22, "compound"),
    (0x23, "derived"),
    (0x24, "idiomatic"),
    (0x25, "metaphorical"),
    (0x26, "onomatopoeic"),
    (0x27, "name_like"),
    (0x28, "neologism"),
];

pub fn category_name(code: u8) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub fn category_code(name: &str) -> Option<u8> {
    CATEGORIES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| *code)
}

pub fn cluster_name(code: u8) -> Option<&'static str> {
    CLUSTERS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub fn cluster_code(name: &str) -> Option<u8> {
    CLUSTERS
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| *code)
}

pub fn is_valid_category(code: u8) -> bool {
    category_name(code).is_some()
}

pub fn is_valid_cluster(code: u8) -> bool {
    cluster_name(code).is_some()
}
