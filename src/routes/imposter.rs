//! `/api/imposter/*` routes: the Imposter word game.

use log::{debug, warn};

use crate::error::GameError;
use crate::game::categories::Category;
use crate::game::imposter::{Imposter, Role, Screen, DEFAULT_PLAYERS, MAX_PLAYERS, MIN_PLAYERS};
use crate::game::state::{export_json, with_sessions, with_sessions_mut};
use crate::routes::util::{
    debug_comment, error_banner, escape_html, get_number, get_param, hx_button, parse_form_body,
};

pub const PATH: &str = "/api/imposter";
const TARGET: &str = "#imposter-app";

const BTN: &str = "px-4 py-2 rounded bg-purple-700 text-white font-bold";
const BTN_QUIET: &str = "px-3 py-1 rounded border border-purple-700 text-purple-800 text-sm";

// ── GET /api/imposter ──────────────────────────────────────────────

pub fn handle_get(_query: &str) -> String {
    with_sessions(|s| render(&s.imposter, None, &[]))
}

// ── POST /api/imposter ─────────────────────────────────────────────

/// Handle POST /api/imposter
/// Body params:
///   - action=start&players={n}&category={key}&custom_item={text}
///   - action=show_role    → "I have the device"
///   - action=next_player  → "Done - next player"
///   - action=reveal       → show imposter and item
///   - action=new_game     → back to setup
pub fn handle_post(body: &str) -> String {
    let params = parse_form_body(body);
    let action = get_param(&params, "action").unwrap_or("");

    with_sessions_mut(|s| {
        let result = match action {
            "start" => {
                let players = get_number(&params, "players").unwrap_or(DEFAULT_PLAYERS);
                let key = get_param(&params, "category").unwrap_or("");
                match Category::parse(key) {
                    Some(category) => s.imposter.start_round(
                        players,
                        category,
                        get_param(&params, "custom_item"),
                        &mut s.rng,
                    ),
                    None => Err(GameError::UnknownCategory(key.to_string())),
                }
            }
            "show_role" => s.imposter.show_player_role(),
            "next_player" => s.imposter.advance_to_next_player(),
            "reveal" => s.imposter.reveal().map(|_| ()),
            "new_game" => {
                s.imposter.new_game();
                Ok(())
            }
            other => {
                debug!("imposter: unknown action {:?}", other);
                Ok(())
            }
        };
        match result {
            Ok(()) => render(&s.imposter, None, &[]),
            Err(e) => {
                warn!("imposter: {} rejected: {}", action, e);
                render(&s.imposter, Some(&e), &params)
            }
        }
    })
}

// ── GET /api/imposter/state ────────────────────────────────────────

pub fn handle_state_get(_query: &str) -> String {
    export_json(|s| &s.imposter)
}

// ── Rendering ──────────────────────────────────────────────────────

fn post(action: &str, label: &str, class: &str) -> String {
    hx_button(PATH, TARGET, &[("action", action.to_string())], label, class, false)
}

/// `form` carries the last submitted setup values so a rejected start keeps
/// what the user typed.
fn render(game: &Imposter, error: Option<&GameError>, form: &[(String, String)]) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(&debug_comment(
        "imposter",
        &format!("screen={}", game.screen().name()),
    ));
    html.push_str(r#"<div class="max-w-md mx-auto p-4 text-center">"#);
    if let Some(e) = error {
        html.push_str(&error_banner(&e.to_string()));
    }

    match (game.screen(), game.round()) {
        (Screen::Setup, _) | (_, None) => render_setup(form, &mut html),
        (Screen::Pass, Some(round)) => {
            html.push_str(&format!(
                r#"<h2 class="text-2xl font-bold mb-4">Pass to Player {}</h2>"#,
                round.current_player_index
            ));
            html.push_str(r#"<p class="mb-4">Make sure nobody else can see the screen.</p>"#);
            html.push_str(&post("show_role", "I have the device", BTN));
        }
        (Screen::Player, Some(round)) => {
            if let Some(card) = game.current_role() {
                html.push_str(&format!(
                    r#"<h2 class="text-xl font-bold mb-4">Player {}</h2>"#,
                    card.player
                ));
                match card.role {
                    Role::Imposter => html.push_str(
                        r#"<div class="p-6 rounded-lg bg-red-100 border-4 border-red-700 mb-4"><p class="text-3xl font-bold text-red-700">You are the IMPOSTER!</p><p class="mt-2">Blend in and work out the secret item.</p></div>"#,
                    ),
                    Role::Knows(item) => html.push_str(&format!(
                        r#"<div class="p-6 rounded-lg bg-green-100 border-4 border-green-700 mb-4"><p class="text-sm">The secret item is</p><p class="text-3xl font-bold">{}</p></div>"#,
                        escape_html(item)
                    )),
                }
                html.push_str(&format!(
                    r#"<p class="text-sm mb-2">Category: {}</p>"#,
                    escape_html(round.category.label())
                ));
                if card.gives_first_clue {
                    html.push_str(r#"<p class="font-bold mb-4">You give the first clue!</p>"#);
                }
            }
            let label = if round.current_player_index < round.total_players {
                "Done - next player"
            } else {
                "Done - start the game"
            };
            html.push_str(&post("next_player", label, BTN));
        }
        (Screen::GameActive, Some(round)) => {
            html.push_str(r#"<h2 class="text-2xl font-bold mb-4">Everyone has their role</h2>"#);
            html.push_str(&format!(
                r#"<p class="mb-2">Category: {}</p><p class="mb-4">Player {} gives the first clue. Take turns describing the item, then vote on who the imposter is.</p>"#,
                escape_html(round.category.label()),
                round.first_clue_giver_index
            ));
            html.push_str(&post("reveal", "Reveal the imposter", BTN));
        }
        (Screen::Reveal, Some(round)) => {
            html.push_str(&format!(
                r#"<h2 class="text-2xl font-bold mb-4">Player {} was the imposter!</h2>"#,
                round.imposter_player_index
            ));
            html.push_str(&format!(
                r#"<p class="mb-4">The secret item was <span class="font-bold">{}</span></p>"#,
                escape_html(&round.secret_item)
            ));
            html.push_str(&post("new_game", "Play again", BTN));
        }
    }

    if game.screen() != Screen::Setup && game.screen() != Screen::Reveal {
        html.push_str(r#"<div class="mt-6">"#);
        html.push_str(&post("new_game", "New game", BTN_QUIET));
        html.push_str(r#"</div>"#);
    }
    html.push_str(r#"</div>"#);
    html
}

fn render_setup(form: &[(String, String)], html: &mut String) {
    let players = get_number(form, "players").unwrap_or(DEFAULT_PLAYERS);
    let chosen = get_param(form, "category")
        .and_then(Category::parse)
        .unwrap_or(Category::Locations);
    let custom = get_param(form, "custom_item").unwrap_or("");

    html.push_str(r#"<h2 class="text-2xl font-bold mb-4">Imposter</h2>"#);
    html.push_str(&format!(
        r#"<form hx-post="{}" hx-target="{}" hx-swap="innerHTML" class="flex flex-col gap-3 text-left">"#,
        PATH, TARGET
    ));
    html.push_str(r#"<input type="hidden" name="action" value="start">"#);

    html.push_str(r#"<label class="font-bold">Players <select name="players" class="border rounded p-1">"#);
    for n in MIN_PLAYERS..=MAX_PLAYERS {
        html.push_str(&format!(
            r#"<option value="{n}"{}>{n}</option>"#,
            if n == players { " selected" } else { "" }
        ));
    }
    html.push_str(r#"</select></label>"#);

    html.push_str(r#"<label class="font-bold">Category <select name="category" class="border rounded p-1">"#);
    for category in Category::ALL {
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            category.key(),
            if category == chosen { " selected" } else { "" },
            escape_html(category.label())
        ));
    }
    html.push_str(r#"</select></label>"#);

    html.push_str(&format!(
        r#"<label class="font-bold">Custom item <input type="text" name="custom_item" value="{}" placeholder="Only for the custom category" class="border rounded p-1 w-full"></label>"#,
        escape_html(custom)
    ));
    html.push_str(&format!(
        r#"<button type="submit" class="{}">Start game</button>"#,
        BTN
    ));
    html.push_str(r#"</form>"#);
}
