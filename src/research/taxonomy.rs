//! Static Pokemon domain knowledge used by the clarifier and synthesis
//!
//! Names use PokeAPI's hyphenated resource spelling.

use crate::types::{Facet, QueryClass};

/// The eighteen types
pub const TYPES: [&str; 18] = [
    "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

/// Pokemon recognised by name in free-form queries
pub const ROSTER: &[&str] = &[
    // Kanto
    "bulbasaur", "ivysaur", "venusaur", "charmander", "charmeleon", "charizard", "squirtle",
    "wartortle", "blastoise", "caterpie", "metapod", "butterfree", "weedle", "kakuna",
    "beedrill", "pidgey", "pidgeotto", "pidgeot", "rattata", "raticate", "spearow", "fearow",
    "ekans", "arbok", "pikachu", "raichu", "sandshrew", "sandslash", "nidoran-f", "nidorina",
    "nidoqueen", "nidoran-m", "nidorino", "nidoking", "clefairy", "clefable", "vulpix",
    "ninetales", "jigglypuff", "wigglytuff", "zubat", "golbat", "oddish", "gloom", "vileplume",
    "paras", "parasect", "venonat", "venomoth", "diglett", "dugtrio", "meowth", "persian",
    "psyduck", "golduck", "mankey", "primeape", "growlithe", "arcanine", "poliwag", "poliwhirl",
    "poliwrath", "abra", "kadabra", "alakazam", "machop", "machoke", "machamp", "bellsprout",
    "weepinbell", "victreebel", "tentacool", "tentacruel", "geodude", "graveler", "golem",
    "ponyta", "rapidash", "slowpoke", "slowbro", "magnemite", "magneton", "farfetchd", "doduo",
    "dodrio", "seel", "dewgong", "grimer", "muk", "shellder", "cloyster", "gastly", "haunter",
    "gengar", "onix", "drowzee", "hypno", "krabby", "kingler", "voltorb", "electrode",
    "exeggcute", "exeggutor", "cubone", "marowak", "hitmonlee", "hitmonchan", "lickitung",
    "koffing", "weezing", "rhyhorn", "rhydon", "chansey", "tangela", "kangaskhan", "horsea",
    "seadra", "goldeen", "seaking", "staryu", "starmie", "mr-mime", "scyther", "jynx",
    "electabuzz", "magmar", "pinsir", "tauros", "magikarp", "gyarados", "lapras", "ditto",
    "eevee", "vaporeon", "jolteon", "flareon", "porygon", "omanyte", "omastar", "kabuto",
    "kabutops", "aerodactyl", "snorlax", "articuno", "zapdos", "moltres", "dratini",
    "dragonair", "dragonite", "mewtwo", "mew",
    // Later generations
    "pichu", "togepi", "togekiss", "espeon", "umbreon", "scizor", "heracross", "shuckle",
    "ledyba", "spinarak", "yanma", "tyranitar", "lugia", "ho-oh", "celebi", "blaziken",
    "gardevoir", "wingull", "pelipper", "wailord", "corphish", "milotic", "salamence",
    "metagross", "kyogre", "groudon", "rayquaza", "lucario", "garchomp", "volcarona",
    "galvantula", "greninja", "sylveon", "mimikyu",
];

/// Roster used when a training question names no Pokemon
pub const EARLY_GAME_ROSTER: [&str; 6] = [
    "pikachu", "charmander", "bulbasaur", "squirtle", "pidgey", "rattata",
];

/// Places mentioned in discovery questions and the type they suggest
pub const HABITATS: &[(&str, &str)] = &[
    ("sea", "water"),
    ("ocean", "water"),
    ("beach", "water"),
    ("coast", "water"),
    ("shore", "water"),
    ("lake", "water"),
    ("river", "water"),
    ("forest", "grass"),
    ("jungle", "grass"),
    ("cave", "rock"),
    ("mountain", "rock"),
    ("volcano", "fire"),
    ("desert", "ground"),
    ("sky", "flying"),
    ("snow", "ice"),
    ("glacier", "ice"),
    ("graveyard", "ghost"),
    ("tower", "ghost"),
    ("city", "electric"),
    ("power-plant", "electric"),
];

/// Class keywords, checked in priority order
pub const CLASS_KEYWORDS: &[(QueryClass, &[&str])] = &[
    (QueryClass::TeamBuilding, &["team", "teams", "party", "squad", "lineup", "roster"]),
    (
        QueryClass::Training,
        &["train", "training", "easy", "easiest", "beginner", "starter", "level", "raise"],
    ),
    (
        QueryClass::Discovery,
        &["unique", "rare", "rarest", "find", "discover", "lives", "live", "where"],
    ),
    (
        QueryClass::Strategy,
        &["strategy", "competitive", "counter", "counters", "beat", "moveset", "tier", "battle"],
    ),
    (
        QueryClass::Lore,
        &["lore", "story", "legend", "history", "myth", "pokedex", "origin"],
    ),
];

/// Words that add a facet on top of the class defaults
pub const FACET_KEYWORDS: &[(Facet, &[&str])] = &[
    (
        Facet::Stats,
        &["stat", "stats", "hp", "attack", "defense", "speed", "strong", "strongest", "fast", "fastest"],
    ),
    (
        Facet::Typing,
        &["type", "types", "typing", "weak", "weakness", "weaknesses", "resist", "effective"],
    ),
    (Facet::Evolution, &["evolve", "evolves", "evolution", "evolved", "evolving"]),
    (
        Facet::Location,
        &["where", "catch", "location", "locations", "route", "habitat", "encounter"],
    ),
    (
        Facet::CompetitiveUse,
        &["competitive", "tier", "moveset", "smogon", "meta", "ou"],
    ),
    (
        Facet::Lore,
        &["lore", "story", "legend", "legendary", "mythical", "pokedex", "history", "entry"],
    ),
];

/// Attacking type -> defending types it hits super-effectively
pub const TYPE_ADVANTAGES: &[(&str, &[&str])] = &[
    ("fire", &["grass", "ice", "bug", "steel"]),
    ("water", &["fire", "ground", "rock"]),
    ("grass", &["water", "ground", "rock"]),
    ("electric", &["water", "flying"]),
    ("ice", &["grass", "ground", "flying", "dragon"]),
    ("fighting", &["normal", "ice", "rock", "steel", "dark"]),
    ("poison", &["grass", "fairy"]),
    ("ground", &["fire", "electric", "poison", "rock", "steel"]),
    ("flying", &["grass", "fighting", "bug"]),
    ("psychic", &["fighting", "poison"]),
    ("bug", &["grass", "psychic", "dark"]),
    ("rock", &["fire", "ice", "flying", "bug"]),
    ("ghost", &["psychic", "ghost"]),
    ("dragon", &["dragon"]),
    ("dark", &["psychic", "ghost"]),
    ("steel", &["ice", "rock", "fairy"]),
    ("fairy", &["fighting", "dragon", "dark"]),
];

pub const TEAM_STRATEGIES: [&str; 6] = [
    "Balanced team with different types",
    "Weather-based team (rain, sun, sand, hail)",
    "Trick room team for slower Pokemon",
    "Hyper offense with fast sweepers",
    "Stall team with defensive Pokemon",
    "Volt-turn team with momentum moves",
];

pub fn is_type(word: &str) -> bool {
    TYPES.contains(&word)
}

pub fn is_pokemon(word: &str) -> bool {
    ROSTER.contains(&word)
}

pub fn habitat_type(word: &str) -> Option<&'static str> {
    HABITATS
        .iter()
        .find(|(place, _)| *place == word)
        .map(|(_, type_name)| *type_name)
}

/// Defending types `attacker` hits super-effectively
pub fn strong_against(attacker: &str) -> &'static [&'static str] {
    TYPE_ADVANTAGES
        .iter()
        .find(|(name, _)| *name == attacker)
        .map(|(_, targets)| *targets)
        .unwrap_or(&[])
}

/// Attacking types that hit `defender` super-effectively
pub fn weak_to(defender: &str) -> Vec<&'static str> {
    TYPE_ADVANTAGES
        .iter()
        .filter(|(_, targets)| targets.contains(&defender))
        .map(|(attacker, _)| *attacker)
        .collect()
}

/// Facets researched for a named subject when no keyword adds more
pub fn default_facets(class: QueryClass) -> &'static [Facet] {
    match class {
        QueryClass::TeamBuilding => &[Facet::Typing, Facet::Stats],
        QueryClass::Training => &[Facet::Stats, Facet::Evolution],
        QueryClass::Discovery => &[Facet::Lore, Facet::Location, Facet::Typing],
        QueryClass::Strategy => &[Facet::CompetitiveUse, Facet::Stats, Facet::Typing],
        QueryClass::Lore => &[Facet::Lore],
        QueryClass::General => &[Facet::Typing, Facet::Stats, Facet::Lore],
    }
}
