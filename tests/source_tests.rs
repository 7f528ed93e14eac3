//! HTTP-backed source tests
//!
//! PokeAPI and the scraped sites are replaced by a local wiremock server.

use pokedex::sources::http::{build_client, get_text, read_body, MAX_BODY_BYTES};
use pokedex::sources::{EvidenceSource, PokeApiClient, PokeApiSource, WebSite, WebSource};
use pokedex::types::{Facet, FailureKind, ResearchIntent};
use pokedex::utils::toml_config::ResearchConfig;
use pokedex::ResearchPipeline;
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(2);

const PIKACHU_PAGE: &str = r#"<html><body>
    <h1>Pikachu</h1>
    <p>Pikachu is an Electric-type Pokemon introduced in Generation I.</p>
    <p>It evolves from Pichu when leveled up with high friendship and evolves into Raichu.</p>
    <table>
        <tr><th>HP</th><td>35</td></tr>
        <tr><th>Attack</th><td>55</td></tr>
    </table>
</body></html>"#;

fn pikachu_json() -> serde_json::Value {
    json!({
        "name": "pikachu",
        "height": 4,
        "weight": 60,
        "base_experience": 112,
        "types": [{"slot": 1, "type": {"name": "electric"}}],
        "abilities": [
            {"ability": {"name": "static"}},
            {"ability": {"name": "lightning-rod"}}
        ],
        "stats": [
            {"base_stat": 35, "stat": {"name": "hp"}},
            {"base_stat": 55, "stat": {"name": "attack"}}
        ]
    })
}

fn pokeapi(server: &MockServer) -> PokeApiSource {
    let client = PokeApiClient::new(build_client().unwrap(), server.uri());
    PokeApiSource::new("pokeapi", client, 0.95)
}

fn web(server: &MockServer, site: WebSite) -> WebSource {
    WebSource::new(site.default_id(), site, build_client().unwrap(), server.uri(), site.default_trust())
}

#[tokio::test]
async fn test_pokeapi_typing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pikachu_json()))
        .mount(&server)
        .await;

    let intent = ResearchIntent::new("pikachu", [Facet::Typing]);
    let bundle = pokeapi(&server).fetch(&intent, Facet::Typing, TIMEOUT).await.unwrap();

    assert_eq!(bundle.source_id, "pokeapi");
    assert_eq!(bundle.payload["types"], json!(["electric"]));
    assert_eq!(bundle.payload["abilities"], json!(["static", "lightning-rod"]));
    assert_eq!(bundle.trust, 0.95);
}

#[tokio::test]
async fn test_pokeapi_type_search_lists_members() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/type/bug"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "bug",
            "pokemon": [
                {"pokemon": {"name": "caterpie"}},
                {"pokemon": {"name": "beedrill-mega"}},
                {"pokemon": {"name": "weedle"}}
            ],
            "damage_relations": {
                "double_damage_from": [{"name": "fire"}, {"name": "flying"}, {"name": "rock"}],
                "double_damage_to": [{"name": "grass"}]
            }
        })))
        .mount(&server)
        .await;

    let intent = ResearchIntent::new("bug-type-search", [Facet::Typing]);
    let bundle = pokeapi(&server).fetch(&intent, Facet::Typing, TIMEOUT).await.unwrap();

    assert_eq!(bundle.payload["members"], json!(["caterpie", "weedle"]));
    assert_eq!(bundle.payload["double_damage_from"], json!(["fire", "flying", "rock"]));
}

#[tokio::test]
async fn test_pokeapi_follows_evolution_chain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon-species/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "pikachu",
            "evolves_from_species": {"name": "pichu"},
            "evolution_chain": {"url": format!("{}/evolution-chain/10/", server.uri())}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/evolution-chain/10/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chain": {
                "species": {"name": "pichu"},
                "evolves_to": [{
                    "species": {"name": "pikachu"},
                    "evolves_to": [{"species": {"name": "raichu"}, "evolves_to": []}]
                }]
            }
        })))
        .mount(&server)
        .await;

    let intent = ResearchIntent::new("pikachu", [Facet::Evolution]);
    let bundle = pokeapi(&server).fetch(&intent, Facet::Evolution, TIMEOUT).await.unwrap();

    assert_eq!(bundle.payload["chain"], json!(["pichu", "pikachu", "raichu"]));
    assert_eq!(bundle.payload["evolves_from"], json!("pichu"));
    assert_eq!(bundle.payload["evolves_into"], json!(["raichu"]));
}

#[tokio::test]
async fn test_http_status_classification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/missingno"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let source = pokeapi(&server);

    let missing = ResearchIntent::new("missingno", [Facet::Typing]);
    let failure = source.fetch(&missing, Facet::Typing, TIMEOUT).await.unwrap_err();
    assert_eq!(failure.reason, FailureKind::NotFound);
    assert!(!failure.retriable);

    let limited = ResearchIntent::new("pikachu", [Facet::Typing]);
    let failure = source.fetch(&limited, Facet::Typing, TIMEOUT).await.unwrap_err();
    assert_eq!(failure.reason, FailureKind::RateLimited);
    assert!(failure.retriable);
    assert_eq!(failure.source_id, "pokeapi");
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(pikachu_json())
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let intent = ResearchIntent::new("pikachu", [Facet::Typing]);
    let failure = pokeapi(&server)
        .fetch(&intent, Facet::Typing, Duration::from_millis(100))
        .await
        .unwrap_err();

    assert_eq!(failure.reason, FailureKind::Timeout);
    assert!(failure.retriable);
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let intent = ResearchIntent::new("pikachu", [Facet::Typing]);
    let failure = pokeapi(&server).fetch(&intent, Facet::Typing, TIMEOUT).await.unwrap_err();

    assert_eq!(failure.reason, FailureKind::ParseError);
}

#[tokio::test]
async fn test_pokemondb_page_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokedex/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PIKACHU_PAGE))
        .mount(&server)
        .await;

    let source = web(&server, WebSite::PokemonDb);
    let intent = ResearchIntent::new("pikachu", [Facet::Typing, Facet::Stats, Facet::Evolution]);

    let typing = source.fetch(&intent, Facet::Typing, TIMEOUT).await.unwrap();
    assert_eq!(typing.payload["types"], json!(["electric"]));
    assert_eq!(typing.source_id, "pokemondb");

    let stats = source.fetch(&intent, Facet::Stats, TIMEOUT).await.unwrap();
    assert_eq!(stats.payload["hp"], json!(35));

    let evolution = source.fetch(&intent, Facet::Evolution, TIMEOUT).await.unwrap();
    assert_eq!(evolution.payload["evolves_into"], json!(["raichu"]));
}

#[tokio::test]
async fn test_bulbapedia_wiki_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Mr_Mime"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<p>Mr. Mime is a dual-type Psychic/Fairy-type Pokemon introduced in Generation I.</p>",
        ))
        .mount(&server)
        .await;

    let intent = ResearchIntent::new("mr-mime", [Facet::Typing]);
    let bundle = web(&server, WebSite::Bulbapedia)
        .fetch(&intent, Facet::Typing, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(bundle.payload["types"], json!(["psychic", "fairy"]));
}

#[tokio::test]
async fn test_page_without_facet_data_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokedex/pikachu.shtml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Site navigation</p>"))
        .mount(&server)
        .await;

    let intent = ResearchIntent::new("pikachu", [Facet::Stats]);
    let failure = web(&server, WebSite::Serebii)
        .fetch(&intent, Facet::Stats, TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failure.reason, FailureKind::ParseError);
    assert_eq!(failure.source_id, "serebii");
}

#[tokio::test]
async fn test_configured_pipeline_against_local_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pikachu_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pokedex/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PIKACHU_PAGE))
        .mount(&server)
        .await;

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[pipeline]
budget_ms = 5000
reasoning_enabled = false

[sources.pokeapi]
type = "pokeapi"
base_url = "{uri}"

[sources.pokemondb]
type = "web"
site = "pokemondb"
base_url = "{uri}"
"#,
        uri = server.uri()
    )
    .unwrap();

    let config = ResearchConfig::load(file.path()).unwrap();
    let pipeline = ResearchPipeline::from_config(&config).unwrap();
    assert_eq!(pipeline.sources().source_ids(), vec!["pokeapi", "pokemondb"]);

    let report = pipeline.conduct_research("What type is Pikachu?").await.unwrap();

    let context = report.context("pikachu").unwrap();
    let types = context.get(Facet::Typing, "types").unwrap();
    assert_eq!(types.supporting_sources, vec!["pokeapi", "pokemondb"]);
    assert_eq!(types.agreement_score, 1.0);
    assert!(!types.single_sourced);

    let hp = context.get(Facet::Stats, "hp").unwrap();
    assert_eq!(hp.agreement_score, 1.0);

    assert_eq!(
        report.citations.iter().cloned().collect::<Vec<_>>(),
        vec!["pokeapi", "pokemondb"]
    );
    // PokeAPI has no species mock, only the page summary covers lore
    assert!(context.get(Facet::Lore, "summary").is_some());
    assert!(context.get(Facet::Lore, "flavor_text").is_none());
}

#[tokio::test]
async fn test_oversized_page_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(MAX_BODY_BYTES + 1)))
        .mount(&server)
        .await;

    let url = format!("{}/huge", server.uri());
    let err = get_text(&build_client().unwrap(), &url, TIMEOUT).await.unwrap_err();
    assert_eq!(err.reason, FailureKind::ParseError);
    assert!(err.detail.contains("exceeds"));
}

#[tokio::test]
async fn test_body_limit_is_inclusive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
        .mount(&server)
        .await;

    let client = build_client().unwrap();
    let url = format!("{}/page", server.uri());

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(read_body(response, 64).await.unwrap().len(), 64);

    let response = client.get(&url).send().await.unwrap();
    assert!(read_body(response, 63).await.is_err());
}
