// Browser-only tests; run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use circle_beat::ranking::{KeyValueStore, MAX_ENTRIES, Ranking};
use circle_beat::web::LocalStorageStore;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_round_trips_ranking() {
    let store = LocalStorageStore::from_window().unwrap();
    let ranking = Ranking::from_scores([300, 1500, 900], MAX_ENTRIES);
    ranking.save(&store, "circle-beat.test.ranking").unwrap();
    assert_eq!(
        store.get("circle-beat.test.ranking").unwrap().as_deref(),
        Some("[1500,900,300]")
    );
    let back = Ranking::load(&store, "circle-beat.test.ranking", MAX_ENTRIES).unwrap();
    assert_eq!(back.scores(), &[1500, 900, 300]);
}

#[wasm_bindgen_test]
fn game_page_builds_its_own_elements() {
    circle_beat::start_game().unwrap();
    let doc = web_sys::window().unwrap().document().unwrap();
    for id in ["menu", "chartSelect", "startBtn", "gameCanvas", "score", "judge", "result"] {
        assert!(doc.get_element_by_id(id).is_some(), "missing #{id}");
    }
    let score = doc.get_element_by_id("score").unwrap();
    assert_eq!(score.text_content().as_deref(), Some("Score: 0"));
    let result: web_sys::HtmlElement = doc.get_element_by_id("result").unwrap().dyn_into().unwrap();
    let menu: web_sys::HtmlElement = doc.get_element_by_id("menu").unwrap().dyn_into().unwrap();
    assert!(result.hidden());
    assert!(!menu.hidden());
}
