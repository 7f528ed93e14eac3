//! HTML extraction for scraped sources
//!
//! Normalises a raw wiki page into the same facet/field schema the
//! structured source uses (`types`, stat names, `evolves_from`,
//! `evolves_into`), plus a few web-only fields (`summary`, `routes`,
//! `tier`, `notes`). Extraction is heuristic: a field is only emitted when
//! the page states it plainly.

use super::http::FetchError;
use super::pokeapi::Payload;
use crate::types::Facet;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::sync::LazyLock;

const TYPE_NAMES: &str = "normal|fire|water|electric|grass|ice|fighting|poison|ground|flying|psychic|bug|rock|ghost|dragon|dark|steel|fairy";

/// Paragraphs shorter than this are captions or navigation
const MIN_SUMMARY_CHARS: usize = 20;
const MAX_SUMMARY_CHARS: usize = 500;
const MAX_ROUTES: usize = 10;
const MAX_NOTES: usize = 3;

static DUAL_TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({t})\s*/\s*({t})[- ]type\b", t = TYPE_NAMES))
        .expect("Invalid dual type regex")
});

static TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})[- ]type\b", TYPE_NAMES)).expect("Invalid type regex")
});

static STAT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(HP|Special Attack|Special Defense|Sp\.?\s?Atk|Sp\.?\s?Def|Attack|Defense|Speed)\s*:?\s*(\d{1,3})\b",
    )
    .expect("Invalid stat regex")
});

static EVOLVES_FROM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:evolves from) ([A-Z][\w'.-]*)").expect("Invalid evolves-from regex")
});

static EVOLVES_INTO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:evolves into) ([A-Z][\w'.-]*)").expect("Invalid evolves-into regex")
});

static ROUTE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bRoute\s+(\d{1,3})\b").expect("Invalid route regex"));

static TIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btier\W{0,3}\s*(AG|Uber|OU|UUBL|UU|RUBL|RU|NUBL|NU|PU|ZU|LC)\b")
        .expect("Invalid tier regex")
});

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::parse(format!("invalid selector {}: {:?}", css, e)))
}

/// Text pulled out of one page
struct PageText {
    /// Paragraph texts in document order
    paragraphs: Vec<String>,
    /// Every text node joined by spaces
    full: String,
}

fn page_text(html: &str) -> Result<PageText, FetchError> {
    let document = Html::parse_document(html);
    let paragraph = selector("p")?;

    let paragraphs = document
        .select(&paragraph)
        .map(|p| collapse(&p.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect();
    let full = collapse(&document.root_element().text().collect::<Vec<_>>().join(" "));

    Ok(PageText { paragraphs, full })
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical_stat(label: &str) -> Option<&'static str> {
    let label = label.to_lowercase().replace(['.', ' '], "");
    match label.as_str() {
        "hp" => Some("hp"),
        "attack" => Some("attack"),
        "defense" => Some("defense"),
        "specialattack" | "spatk" => Some("special-attack"),
        "specialdefense" | "spdef" => Some("special-defense"),
        "speed" => Some("speed"),
        _ => None,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

/// Extract the fields of `facet` from a raw page.
///
/// `type_search` is set when the page describes a whole type rather than a
/// single Pokemon.
pub fn extract(html: &str, facet: Facet, type_search: Option<&str>) -> Result<Payload, FetchError> {
    let text = page_text(html)?;

    if let Some(type_name) = type_search {
        return Ok(extract_type_page(&text, facet, type_name));
    }

    let payload = match facet {
        Facet::Typing => extract_typing(&text),
        Facet::Stats => extract_stats(&text),
        Facet::Evolution => extract_evolution(&text),
        Facet::Location => extract_routes(&text),
        Facet::Lore => extract_summary(&text),
        Facet::CompetitiveUse => extract_competitive(&text),
    };
    Ok(payload)
}

fn extract_type_page(text: &PageText, facet: Facet, type_name: &str) -> Payload {
    let mut payload = Payload::new();
    if facet != Facet::Typing {
        return payload;
    }

    let mentioned = text
        .full
        .to_lowercase()
        .contains(&format!("{} type", type_name.to_lowercase()))
        || text
            .full
            .to_lowercase()
            .contains(&format!("{}-type", type_name.to_lowercase()));
    if mentioned {
        payload.insert("type".to_string(), json!(type_name.to_lowercase()));
        if let Some(summary) = first_summary(text) {
            payload.insert("summary".to_string(), json!(summary));
        }
    }
    payload
}

fn extract_typing(text: &PageText) -> Payload {
    let mut payload = Payload::new();
    let lead = text.paragraphs.iter().take(3).cloned().collect::<Vec<_>>().join(" ");

    let types: Vec<String> = if let Some(caps) = DUAL_TYPE_REGEX.captures(&lead) {
        vec![caps[1].to_lowercase(), caps[2].to_lowercase()]
    } else {
        let mut found: Vec<String> = Vec::new();
        for caps in TYPE_REGEX.captures_iter(&lead) {
            let name = caps[1].to_lowercase();
            if !found.contains(&name) {
                found.push(name);
            }
        }
        found.truncate(1);
        found
    };

    if !types.is_empty() {
        payload.insert("types".to_string(), json!(types));
    }
    payload
}

fn extract_stats(text: &PageText) -> Payload {
    let mut payload = Payload::new();
    for caps in STAT_REGEX.captures_iter(&text.full) {
        let Some(name) = canonical_stat(&caps[1]) else {
            continue;
        };
        if payload.contains_key(name) {
            continue;
        }
        if let Ok(value) = caps[2].parse::<i64>() {
            payload.insert(name.to_string(), json!(value));
        }
    }
    payload
}

fn extract_evolution(text: &PageText) -> Payload {
    let mut payload = Payload::new();
    let clean = |name: &str| name.trim_end_matches(['.', ',']).to_lowercase();

    if let Some(caps) = EVOLVES_FROM_REGEX.captures(&text.full) {
        payload.insert("evolves_from".to_string(), json!(clean(&caps[1])));
    }

    let mut into: Vec<String> = Vec::new();
    for caps in EVOLVES_INTO_REGEX.captures_iter(&text.full) {
        let name = clean(&caps[1]);
        if !into.contains(&name) {
            into.push(name);
        }
    }
    if !into.is_empty() {
        payload.insert("evolves_into".to_string(), json!(into));
    }
    payload
}

fn extract_routes(text: &PageText) -> Payload {
    let mut payload = Payload::new();
    let mut routes: Vec<Value> = Vec::new();
    for caps in ROUTE_REGEX.captures_iter(&text.full) {
        let route = json!(format!("route-{}", &caps[1]));
        if !routes.contains(&route) {
            routes.push(route);
        }
        if routes.len() == MAX_ROUTES {
            break;
        }
    }
    if !routes.is_empty() {
        payload.insert("routes".to_string(), Value::Array(routes));
    }
    payload
}

fn first_summary(text: &PageText) -> Option<String> {
    text.paragraphs
        .iter()
        .find(|p| p.chars().count() >= MIN_SUMMARY_CHARS)
        .map(|p| truncate_chars(p, MAX_SUMMARY_CHARS))
}

fn extract_summary(text: &PageText) -> Payload {
    let mut payload = Payload::new();
    if let Some(summary) = first_summary(text) {
        payload.insert("summary".to_string(), json!(summary));
    }
    payload
}

fn extract_competitive(text: &PageText) -> Payload {
    let mut payload = Payload::new();

    if let Some(caps) = TIER_REGEX.captures(&text.full) {
        payload.insert("tier".to_string(), json!(caps[1].to_uppercase()));
    }

    let notes: Vec<String> = text
        .paragraphs
        .iter()
        .filter(|p| {
            let lower = p.to_lowercase();
            lower.contains("competitive") || lower.contains("moveset") || lower.contains("strategy")
        })
        .take(MAX_NOTES)
        .map(|p| truncate_chars(p, MAX_SUMMARY_CHARS))
        .collect();
    if !notes.is_empty() {
        payload.insert("notes".to_string(), json!(notes));
    }
    payload
}
