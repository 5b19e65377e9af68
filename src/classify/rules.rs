//! Rule-Based Classifier
//!
//! Keyword/regex heuristics: the gloss text is matched against category
//! patterns (scoped by the record's pos tag) and the frequency rank is
//! bucketed into a cluster. Deliberately shallow; linguistic correctness is
//! a non-goal, determinism is the contract.

use super::Classifier;
use crate::address::taxonomy;
use crate::source::RawLexicalRecord;
use anyhow::{Result, bail};
use regex::Regex;

struct CategoryRule {
    pattern: Regex,
    category: &'static str,
}

pub struct RuleBasedClassifier {
    noun_rules: Vec<CategoryRule>,
    verb_rules: Vec<CategoryRule>,
    other_rules: Vec<CategoryRule>,
}

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self {
            noun_rules: compile_rules(&[
                (r"\b(water|liquid|fluid|juice)\b", "liquid"),
                (r"\b(animal|beast|creature)\b", "animal"),
                (r"\b(bird|fowl)\b", "bird"),
                (r"\b(fish)\b", "fish"),
                (r"\b(insect|bug|beetle)\b", "insect"),
                (r"\b(tree)\b", "tree"),
                (r"\b(flower|blossom)\b", "flower"),
                (r"\b(fruit|berry)\b", "fruit"),
                (r"\b(plant|herb|grass)\b", "plant"),
                (r"\b(tool|instrument|implement)\b", "tool"),
                (r"\b(vehicle|car|ship|boat|cart)\b", "vehicle"),
                (r"\b(building|house|dwelling|structure)\b", "building"),
                (r"\b(food|meal|dish|bread)\b", "food"),
                (r"\b(drink|beverage)\b", "drink"),
                (r"\b(garment|clothing|clothes|dress)\b", "clothing"),
                (r"\b(vessel|container|box|jar|bag)\b", "container"),
                (r"\b(body|limb|organ|hand|head|eye)\b", "body_part"),
                (r"\b(mother|father|brother|sister|family|kin)\b", "kinship"),
                (r"\b(person|human|man|woman|people)\b", "human"),
                (r"\b(profession|trade|occupation|worker)\b", "occupation"),
                (r"\b(place|region|area|site)\b", "location"),
                (r"\b(river|lake|sea|ocean|stream)\b", "water_body"),
                (r"\b(mountain|hill|valley|plain|land)\b", "terrain"),
                (r"\b(sun|moon|star|planet)\b", "celestial_body"),
                (r"\b(rain|snow|storm|wind|cloud)\b", "weather_phenomenon"),
                (r"\b(color|colour|hue)\b", "color"),
                (r"\b(number|numeral)\b", "number"),
                (r"\b(unit|measure)\b", "measure_unit"),
                (r"\b(day|hour|minute|year|month|week)\b", "time_unit"),
                (r"\b(feeling|emotion)\b", "emotion_state"),
                (r"\b(sound|noise)\b", "sound"),
                (r"\b(game|sport)\b", "game"),
                (r"\b(event|occasion)\b", "event"),
                (r"\b(object|thing|item)\b", "physical_object"),
            ]),
            verb_rules: compile_rules(&[
                (r"\b(go|walk|run|move|travel|come|climb|swim|fly)\b", "motion_verb"),
                (r"\b(give|send|bring|take|carry|deliver)\b", "transfer_verb"),
                (r"\b(hit|strike|touch|push|pull|cut)\b", "contact_verb"),
                (r"\b(make|build|create|produce|form)\b", "creation_verb"),
                (r"\b(destroy|break|ruin|kill)\b", "destruction_verb"),
                (r"\b(see|hear|watch|look|listen|smell)\b", "perception_verb"),
                (r"\b(think|know|believe|understand|remember)\b", "cognition_verb"),
                (r"\b(say|speak|tell|talk|ask|answer)\b", "communication_verb"),
                (r"\b(love|hate|fear|enjoy|like)\b", "emotion_verb"),
                (r"\b(eat|drink|consume|swallow)\b", "consumption_verb"),
                (r"\b(have|own|possess|keep|hold)\b", "possession_verb"),
                (r"\b(become|change|turn|grow)\b", "change_verb"),
                (r"\b(be|exist|remain|stay)\b", "existence_verb"),
                (r"\b(begin|start|finish|stop|continue)\b", "aspect_verb"),
                (r"\b(rain|snow|thunder)\b", "weather_verb"),
                (r"\b(sing|shout|cry|whisper)\b", "sound_verb"),
            ]),
            other_rules: compile_rules(&[
                (r"\b(above|below|under|over|between|inside|near)\b", "spatial_relation"),
                (r"\b(before|after|during|while|until)\b", "temporal_relation"),
                (r"\b(because|therefore|cause|reason)\b", "causal_relation"),
                (r"\b(and|or|but|not|if)\b", "logical_connector"),
                (r"\b(many|few|much|some|all|several)\b", "quantity"),
                (r"\b(big|small|large|tiny|huge)\b", "size_property"),
                (r"\b(hot|cold|warm|cool)\b", "temperature_property"),
                (r"\b(fast|slow|quick)\b", "speed_property"),
                (r"\b(old|young|new|ancient)\b", "age_property"),
                (r"\b(good|bad|evil|right|wrong)\b", "moral_property"),
                (r"\b(happy|sad|angry|afraid)\b", "emotion_state"),
            ]),
        }
    }
}

impl Default for RuleBasedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RuleBasedClassifier {
    fn classify(&self, record: &RawLexicalRecord) -> Result<(u8, u8)> {
        if record.key.trim().is_empty() {
            bail!("record has empty lexical key");
        }
        if record.gloss.trim().is_empty() && record.pos_tag.trim().is_empty() {
            bail!("record '{}' has neither gloss nor pos tag", record.key);
        }

        let gloss = record.gloss.to_lowercase();
        let pos = record.pos_tag.to_lowercase();

        let (rules, fallback) = match pos.as_str() {
            "noun" | "n" => (&self.noun_rules, "physical_object"),
            "verb" | "v" => (&self.verb_rules, "stative_verb"),
            _ => (&self.other_rules, "abstract_concept"),
        };

        let category_name = rules
            .iter()
            .find(|rule| rule.pattern.is_match(&gloss))
            .map(|rule| rule.category)
            .unwrap_or(fallback);

        // Rule tables only name categories present in the taxonomy; a miss
        // here is a programming error worth surfacing, not a skip.
        let category = taxonomy::category_code(category_name)
            .ok_or_else(|| anyhow::anyhow!("rule names unknown category '{}'", category_name))?;

        let cluster_name = cluster_for_rank(record.frequency_rank);
        let cluster = taxonomy::cluster_code(cluster_name)
            .ok_or_else(|| anyhow::anyhow!("unknown cluster '{}'", cluster_name))?;

        Ok((category, cluster))
    }
}

/// Frequency rank buckets for the cluster axis. Records without a rank fall
/// into the neutral mixed bucket.
fn cluster_for_rank(rank: Option<u32>) -> &'static str {
    match rank {
        Some(r) if r <= 100 => "ultra_frequent",
        Some(r) if r <= 500 => "very_frequent",
        Some(r) if r <= 2_000 => "frequent",
        Some(r) if r <= 10_000 => "common",
        Some(r) if r <= 50_000 => "uncommon",
        Some(_) => "rare",
        None => "mixed_abstraction",
    }
}

fn compile_rules(raw: &[(&'static str, &'static str)]) -> Vec<CategoryRule> {
    raw.iter()
        .map(|(pattern, category)| CategoryRule {
            // Patterns are static literals; a bad one is a build-time bug.
            pattern: Regex::new(pattern).expect("invalid classifier pattern"),
            category,
        })
        .collect()
}
