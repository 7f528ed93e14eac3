//! PokeAPI structured data source
//!
//! [`PokeApiClient`] is a thin `getEntity`-style wrapper over the REST API;
//! [`PokeApiSource`] maps the responses into per-facet payloads. The mapping
//! functions are pure so they can be tested against canned JSON.

use super::http::{self, FetchError};
use super::{EvidenceSource, FetchResult, SourcePriority};
use crate::types::{EvidenceBundle, FailureKind, Facet, ResearchIntent, SourceFailure};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub type Payload = BTreeMap<String, Value>;

/// Encounter areas kept per subject
const MAX_AREAS: usize = 10;

#[derive(Clone)]
pub struct PokeApiClient {
    http: Client,
    base_url: String,
}

impl PokeApiClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch `/{kind}/{name}`, e.g. `pokemon/pikachu` or `type/bug`
    pub async fn get_entity(&self, kind: &str, name: &str, timeout: Duration) -> Result<Value, FetchError> {
        let url = format!("{}/{}/{}", self.base_url, kind, name);
        self.get_url(&url, timeout).await
    }

    /// Follow an absolute resource URL returned by a previous response
    pub async fn get_url(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        tracing::debug!(url = %url, "PokeAPI request");
        http::get_json(&self.http, url, timeout).await
    }
}

/// PokeAPI resource name for a subject ("Mr. Mime" -> "mr-mime")
pub fn api_name(subject: &str) -> String {
    subject
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '\'' | '’'))
        .map(|c| if c.is_whitespace() || c == '_' { '-' } else { c })
        .collect()
}

pub struct PokeApiSource {
    id: String,
    client: PokeApiClient,
    trust: f64,
    member_limit: usize,
}

impl PokeApiSource {
    pub fn new(id: impl Into<String>, client: PokeApiClient, trust: f64) -> Self {
        Self {
            id: id.into(),
            client,
            trust,
            member_limit: 10,
        }
    }

    /// Cap on members listed for a type search
    pub fn with_member_limit(mut self, member_limit: usize) -> Self {
        self.member_limit = member_limit;
        self
    }

    async fn fetch_payload(
        &self,
        intent: &ResearchIntent,
        facet: Facet,
        timeout: Duration,
    ) -> Result<Payload, FetchError> {
        if let Some(type_name) = intent.type_search() {
            if facet != Facet::Typing {
                return Err(FetchError::new(
                    FailureKind::NotFound,
                    format!("type searches only cover typing, not {}", facet),
                ));
            }
            let data = self.client.get_entity("type", type_name, timeout).await?;
            return Ok(map_type(&data, self.member_limit));
        }

        let name = api_name(intent.subject());
        match facet {
            Facet::Typing => {
                let data = self.client.get_entity("pokemon", &name, timeout).await?;
                Ok(map_typing(&data))
            }
            Facet::Stats => {
                let data = self.client.get_entity("pokemon", &name, timeout).await?;
                Ok(map_stats(&data))
            }
            Facet::Lore => {
                let species = self.client.get_entity("pokemon-species", &name, timeout).await?;
                Ok(map_lore(&species))
            }
            Facet::Evolution => {
                let species = self.client.get_entity("pokemon-species", &name, timeout).await?;
                let chain_url = species
                    .pointer("/evolution_chain/url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| FetchError::parse("species has no evolution chain"))?;
                let chain = self.client.get_url(chain_url, timeout).await?;
                Ok(map_evolution(&species, &chain, &name))
            }
            Facet::Location => {
                let path = format!("{}/encounters", name);
                let data = self.client.get_entity("pokemon", &path, timeout).await?;
                Ok(map_encounters(&data))
            }
            Facet::CompetitiveUse => Err(FetchError::new(
                FailureKind::NotFound,
                "no competitive data in PokeAPI",
            )),
        }
    }
}

#[async_trait]
impl EvidenceSource for PokeApiSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn trust(&self) -> f64 {
        self.trust
    }

    fn priority(&self) -> SourcePriority {
        SourcePriority::Structured
    }

    fn supports(&self, facet: Facet) -> bool {
        facet != Facet::CompetitiveUse
    }

    async fn fetch(&self, intent: &ResearchIntent, facet: Facet, timeout: Duration) -> FetchResult {
        let result = tokio::time::timeout(timeout, self.fetch_payload(intent, facet, timeout)).await;

        let payload = match result {
            Ok(Ok(payload)) => payload,
            Ok(Err(err)) => return Err(err.into_failure(&self.id)),
            Err(_) => {
                return Err(SourceFailure::timeout(
                    &self.id,
                    format!("no response within {}ms", timeout.as_millis()),
                ))
            }
        };

        if payload.is_empty() {
            return Err(SourceFailure::new(
                &self.id,
                FailureKind::ParseError,
                format!("no {} fields in response for {}", facet, intent.subject()),
            ));
        }

        Ok(EvidenceBundle {
            source_id: self.id.clone(),
            subject: intent.subject().to_string(),
            facet,
            payload,
            fetched_at: Utc::now(),
            trust: self.trust,
        })
    }
}

// ============= Response Mapping =============

fn names_at(data: &Value, list: &str, inner: &str) -> Vec<Value> {
    data.get(list)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(inner)?.get("name")?.as_str())
                .map(|name| Value::String(name.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn english_entry<'a>(entries: Option<&'a Value>, field: &str) -> Option<&'a str> {
    entries?
        .as_array()?
        .iter()
        .find(|entry| entry.pointer("/language/name").and_then(Value::as_str) == Some("en"))?
        .get(field)?
        .as_str()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `/pokemon/{name}` -> types and abilities
pub fn map_typing(data: &Value) -> Payload {
    let mut payload = Payload::new();
    let types = names_at(data, "types", "type");
    if !types.is_empty() {
        payload.insert("types".to_string(), Value::Array(types));
    }
    let abilities = names_at(data, "abilities", "ability");
    if !abilities.is_empty() {
        payload.insert("abilities".to_string(), Value::Array(abilities));
    }
    payload
}

/// `/pokemon/{name}` -> base stats and body measurements
///
/// Height and weight arrive in decimetres and hectograms.
pub fn map_stats(data: &Value) -> Payload {
    let mut payload = Payload::new();

    if let Some(stats) = data.get("stats").and_then(Value::as_array) {
        for stat in stats {
            let name = stat.pointer("/stat/name").and_then(Value::as_str);
            let value = stat.get("base_stat").and_then(Value::as_i64);
            if let (Some(name), Some(value)) = (name, value) {
                payload.insert(name.to_string(), json!(value));
            }
        }
    }
    if let Some(height) = data.get("height").and_then(Value::as_f64) {
        payload.insert("height_m".to_string(), json!(height / 10.0));
    }
    if let Some(weight) = data.get("weight").and_then(Value::as_f64) {
        payload.insert("weight_kg".to_string(), json!(weight / 10.0));
    }
    if let Some(experience) = data.get("base_experience").and_then(Value::as_i64) {
        payload.insert("base_experience".to_string(), json!(experience));
    }

    payload
}

/// `/pokemon-species/{name}` -> flavour text, genus, habitat and rarity flags
pub fn map_lore(species: &Value) -> Payload {
    let mut payload = Payload::new();

    if let Some(text) = english_entry(species.get("flavor_text_entries"), "flavor_text") {
        payload.insert("flavor_text".to_string(), json!(collapse_whitespace(text)));
    }
    if let Some(genus) = english_entry(species.get("genera"), "genus") {
        payload.insert("genus".to_string(), json!(genus));
    }
    if let Some(habitat) = species.pointer("/habitat/name").and_then(Value::as_str) {
        payload.insert("habitat".to_string(), json!(habitat));
    }
    for flag in ["is_legendary", "is_mythical"] {
        if let Some(value) = species.get(flag).and_then(Value::as_bool) {
            payload.insert(flag.to_string(), json!(value));
        }
    }

    payload
}

struct ChainNode<'a> {
    name: &'a str,
    children: Vec<&'a str>,
}

fn walk_chain<'a>(node: &'a Value, out: &mut Vec<ChainNode<'a>>) {
    let Some(name) = node.pointer("/species/name").and_then(Value::as_str) else {
        return;
    };
    let next = node
        .get("evolves_to")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    out.push(ChainNode {
        name,
        children: next
            .iter()
            .filter_map(|child| child.pointer("/species/name").and_then(Value::as_str))
            .collect(),
    });
    for child in next {
        walk_chain(child, out);
    }
}

/// Species plus `/evolution-chain/{id}` -> flattened chain and neighbours
pub fn map_evolution(species: &Value, chain: &Value, name: &str) -> Payload {
    let mut payload = Payload::new();

    let mut nodes = Vec::new();
    if let Some(root) = chain.get("chain") {
        walk_chain(root, &mut nodes);
    }

    if !nodes.is_empty() {
        let stages: Vec<&str> = nodes.iter().map(|n| n.name).collect();
        payload.insert("chain".to_string(), json!(stages));
    }
    if let Some(from) = species
        .pointer("/evolves_from_species/name")
        .and_then(Value::as_str)
    {
        payload.insert("evolves_from".to_string(), json!(from));
    }
    if let Some(node) = nodes.iter().find(|n| n.name == name) {
        if !node.children.is_empty() {
            payload.insert("evolves_into".to_string(), json!(node.children));
        }
    }

    payload
}

/// `/pokemon/{name}/encounters` -> area names
pub fn map_encounters(data: &Value) -> Payload {
    let mut payload = Payload::new();
    let areas: Vec<&str> = data
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.pointer("/location_area/name").and_then(Value::as_str))
                .take(MAX_AREAS)
                .collect()
        })
        .unwrap_or_default();

    if !areas.is_empty() {
        payload.insert("areas".to_string(), json!(areas));
    }
    payload
}

/// `/type/{name}` -> members and damage relations
///
/// Alternate battle forms (megas, gigantamax) are skipped in the member list.
pub fn map_type(data: &Value, member_limit: usize) -> Payload {
    let mut payload = Payload::new();

    if let Some(name) = data.get("name").and_then(Value::as_str) {
        payload.insert("type".to_string(), json!(name));
    }

    let members: Vec<&str> = data
        .get("pokemon")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.pointer("/pokemon/name").and_then(Value::as_str))
                .filter(|name| !name.contains("-mega") && !name.contains("-gmax"))
                .take(member_limit)
                .collect()
        })
        .unwrap_or_default();
    if !members.is_empty() {
        payload.insert("members".to_string(), json!(members));
    }

    if let Some(relations) = data.get("damage_relations") {
        for field in ["double_damage_from", "double_damage_to"] {
            let names: Vec<&str> = relations
                .get(field)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("name").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();
            payload.insert(field.to_string(), json!(names));
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pikachu() -> Value {
        json!({
            "id": 25,
            "name": "pikachu",
            "types": [{"slot": 1, "type": {"name": "electric"}}],
            "height": 4,
            "weight": 60,
            "base_experience": 112,
            "abilities": [
                {"ability": {"name": "static"}},
                {"ability": {"name": "lightning-rod"}}
            ],
            "stats": [
                {"stat": {"name": "hp"}, "base_stat": 35},
                {"stat": {"name": "attack"}, "base_stat": 55},
                {"stat": {"name": "defense"}, "base_stat": 40},
                {"stat": {"name": "special-attack"}, "base_stat": 50},
                {"stat": {"name": "special-defense"}, "base_stat": 50},
                {"stat": {"name": "speed"}, "base_stat": 90}
            ]
        })
    }

    #[test]
    fn test_api_name() {
        assert_eq!(api_name("Pikachu"), "pikachu");
        assert_eq!(api_name("Mr. Mime"), "mr-mime");
        assert_eq!(api_name("Farfetch'd"), "farfetchd");
    }

    #[test]
    fn test_map_typing() {
        let payload = map_typing(&pikachu());
        assert_eq!(payload["types"], json!(["electric"]));
        assert_eq!(payload["abilities"], json!(["static", "lightning-rod"]));
    }

    #[test]
    fn test_map_stats_converts_units() {
        let payload = map_stats(&pikachu());
        assert_eq!(payload["hp"], json!(35));
        assert_eq!(payload["speed"], json!(90));
        assert_eq!(payload["height_m"], json!(0.4));
        assert_eq!(payload["weight_kg"], json!(6.0));
        assert_eq!(payload["base_experience"], json!(112));
    }

    #[test]
    fn test_map_lore_prefers_english() {
        let species = json!({
            "flavor_text_entries": [
                {"flavor_text": "Quand plusieurs", "language": {"name": "fr"}},
                {"flavor_text": "When several of\nthese POKéMON\u{c}gather", "language": {"name": "en"}}
            ],
            "genera": [{"genus": "Mouse Pokémon", "language": {"name": "en"}}],
            "habitat": {"name": "forest"},
            "is_legendary": false,
            "is_mythical": false
        });

        let payload = map_lore(&species);
        assert_eq!(payload["flavor_text"], json!("When several of these POKéMON gather"));
        assert_eq!(payload["genus"], json!("Mouse Pokémon"));
        assert_eq!(payload["habitat"], json!("forest"));
        assert_eq!(payload["is_legendary"], json!(false));
    }

    #[test]
    fn test_map_lore_null_habitat_is_omitted() {
        let species = json!({"habitat": null, "is_mythical": true});
        let payload = map_lore(&species);
        assert!(!payload.contains_key("habitat"));
        assert_eq!(payload["is_mythical"], json!(true));
    }

    #[test]
    fn test_map_evolution() {
        let species = json!({"evolves_from_species": {"name": "pichu"}});
        let chain = json!({
            "chain": {
                "species": {"name": "pichu"},
                "evolves_to": [{
                    "species": {"name": "pikachu"},
                    "evolves_to": [{"species": {"name": "raichu"}, "evolves_to": []}]
                }]
            }
        });

        let payload = map_evolution(&species, &chain, "pikachu");
        assert_eq!(payload["chain"], json!(["pichu", "pikachu", "raichu"]));
        assert_eq!(payload["evolves_from"], json!("pichu"));
        assert_eq!(payload["evolves_into"], json!(["raichu"]));
    }

    #[test]
    fn test_map_encounters_caps_areas() {
        let items: Vec<Value> = (1..=15)
            .map(|i| json!({"location_area": {"name": format!("kanto-route-{}-area", i)}}))
            .collect();
        let payload = map_encounters(&Value::Array(items));
        assert_eq!(payload["areas"].as_array().unwrap().len(), MAX_AREAS);

        assert!(map_encounters(&json!([])).is_empty());
    }

    #[test]
    fn test_map_type_skips_alternate_forms() {
        let data = json!({
            "name": "bug",
            "pokemon": [
                {"pokemon": {"name": "caterpie"}},
                {"pokemon": {"name": "beedrill-mega"}},
                {"pokemon": {"name": "butterfree-gmax"}},
                {"pokemon": {"name": "weedle"}},
                {"pokemon": {"name": "scyther"}}
            ],
            "damage_relations": {
                "double_damage_from": [{"name": "flying"}, {"name": "rock"}, {"name": "fire"}],
                "double_damage_to": [{"name": "grass"}, {"name": "psychic"}, {"name": "dark"}]
            }
        });

        let payload = map_type(&data, 2);
        assert_eq!(payload["type"], json!("bug"));
        assert_eq!(payload["members"], json!(["caterpie", "weedle"]));
        assert_eq!(payload["double_damage_from"], json!(["flying", "rock", "fire"]));
    }
}
