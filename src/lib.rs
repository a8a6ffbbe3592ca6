//! Hiking Games in-browser WASM server.
//!
//! Exports `handle_request(method, path, query, body)` for the Web Worker
//! bridge to call. Uses `matchit` for URL routing: the same router
//! engine that powers Axum.
//!
//! Three pass-and-play games share one module instance: Avalon, Imposter
//! and an Oh Hell score keeper. Each has a render/action route and a JSON
//! `/state` route; Avalon adds `/tick` for its paced reveals.

use wasm_bindgen::prelude::*;

pub mod error;
pub mod game;
pub mod routes;

/// Process an HTTP-like request and return an HTML fragment.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method`: HTTP method ("GET" or "POST")
/// * `path`: URL path (e.g., "/api/avalon")
/// * `query`: Query string, may be empty
/// * `body`: URL-encoded form body. Empty string for GET requests.
///
/// # Returns
/// An HTML string fragment suitable for HTMX to swap into the DOM, or a
/// JSON document for the `/state` routes.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    // Build the router. matchit compiles route patterns into a radix tree.
    let mut router = matchit::Router::new();

    router.insert("/api/avalon", "avalon").ok();
    router.insert("/api/avalon/tick", "avalon_tick").ok();
    router.insert("/api/avalon/state", "avalon_state").ok();
    router.insert("/api/imposter", "imposter").ok();
    router.insert("/api/imposter/state", "imposter_state").ok();
    router.insert("/api/oh-hell", "oh_hell").ok();
    router.insert("/api/oh-hell/state", "oh_hell_state").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("avalon", "GET") => routes::avalon::handle_get(query),
            ("avalon", "POST") => routes::avalon::handle_post(body),
            ("avalon_tick", "POST") => routes::avalon::handle_tick_post(body),
            ("avalon_state", "GET") => routes::avalon::handle_state_get(query),

            ("imposter", "GET") => routes::imposter::handle_get(query),
            ("imposter", "POST") => routes::imposter::handle_post(body),
            ("imposter_state", "GET") => routes::imposter::handle_state_get(query),

            ("oh_hell", "GET") => routes::oh_hell::handle_get(query),
            ("oh_hell", "POST") => routes::oh_hell::handle_post(body),
            ("oh_hell_state", "GET") => routes::oh_hell::handle_state_get(query),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

/// Reseed the shared RNG so the next deals and draws are reproducible.
#[wasm_bindgen]
pub fn seed_games(seed: u64) {
    log::info!("rng reseeded with {}", seed);
    game::state::reseed(seed);
}

fn not_found() -> String {
    r#"<span class="text-red-600">404 — route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-red-600">405 — method not allowed</span>"#.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{replace_sessions, with_sessions, Sessions};

    #[test]
    fn routes_each_game_panel() {
        replace_sessions(Sessions::default());
        assert!(handle_request("GET", "/api/avalon", "", "").contains("screen=setup"));
        assert!(handle_request("GET", "/api/imposter", "", "").contains("imposter screen=setup"));
        assert!(handle_request("GET", "/api/oh-hell", "", "").contains("phase=setup"));
        replace_sessions(Sessions::default());
    }

    #[test]
    fn routes_state_as_json() {
        replace_sessions(Sessions::default());
        for path in ["/api/avalon/state", "/api/imposter/state", "/api/oh-hell/state"] {
            let body = handle_request("GET", path, "", "");
            assert!(serde_json::from_str::<serde_json::Value>(&body).is_ok(), "{path}");
        }
    }

    #[test]
    fn post_reaches_engine() {
        replace_sessions(Sessions::default());
        let html = handle_request("POST", "/api/avalon", "", "action=players&count=8");
        assert!(html.contains("Evil 0/3"));
        with_sessions(|s| assert_eq!(s.avalon.record().player_count, 8));
        replace_sessions(Sessions::default());
    }

    #[test]
    fn seed_games_makes_deals_repeatable() {
        let deal = || {
            replace_sessions(Sessions::default());
            seed_games(77);
            handle_request(
                "POST",
                "/api/imposter",
                "",
                "action=start&players=8&category=countries",
            );
            with_sessions(|s| s.imposter.round().cloned())
        };
        let first = deal();
        assert!(first.is_some());
        assert_eq!(first, deal());
        replace_sessions(Sessions::default());
    }

    #[test]
    fn returns_404_for_unknown_route() {
        let html = handle_request("GET", "/api/nonexistent", "", "");
        assert!(html.contains("404"));
    }

    #[test]
    fn returns_405_for_wrong_method() {
        let html = handle_request("GET", "/api/avalon/tick", "", "");
        assert!(html.contains("405"));
        let html = handle_request("POST", "/api/oh-hell/state", "", "");
        assert!(html.contains("405"));
        let html = handle_request("DELETE", "/api/imposter", "", "");
        assert!(html.contains("405"));
    }
}
