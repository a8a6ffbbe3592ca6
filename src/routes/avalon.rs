//! `/api/avalon/*` routes: pass-and-play Avalon.
//!
//! Every response is the whole game panel for the current screen. Paced
//! steps (card settle, vote disclosure) are rendered as a hidden element
//! that POSTs back to `/api/avalon/tick` after its delay; any newer swap
//! removes it, and the generation it carries keeps a late tick from
//! touching a newer game.

use log::{debug, warn};

use crate::error::GameError;
use crate::game::avalon::{
    self, Avalon, Scheduled, Screen, Team, TimerEvent, Vote, MAX_PLAYERS, MIN_PLAYERS, MISSIONS,
    SLOTS,
};
use crate::game::rng::GameRng;
use crate::game::state::{export_json, with_sessions, with_sessions_mut};
use crate::routes::util::{
    debug_comment, error_banner, escape_html, get_number, get_param, hx_button, hx_timer,
    parse_form_body,
};

pub const PATH: &str = "/api/avalon";
pub const TICK_PATH: &str = "/api/avalon/tick";
const TARGET: &str = "#avalon-app";

const BTN: &str = "px-4 py-2 rounded bg-amber-700 text-white font-bold disabled:opacity-50";
const BTN_QUIET: &str = "px-3 py-1 rounded border border-amber-700 text-amber-800 text-sm";

// ── GET /api/avalon ────────────────────────────────────────────────

/// Handle GET /api/avalon: render the current screen.
pub fn handle_get(_query: &str) -> String {
    with_sessions(|s| render(&s.avalon, None))
}

// ── POST /api/avalon ───────────────────────────────────────────────

/// Handle POST /api/avalon
/// Body params:
///   - action=players&count={n}   → choose table size
///   - action=slot&slot={id}      → toggle a character slot
///   - action=start               → deal identities
///   - action=flip                → show current identity
///   - action=next_player         → hand the device on
///   - action=start_mission       → open mission voting
///   - action=flip_vote           → show the private vote card
///   - action=vote&vote=pass|fail → cast or change the vote
///   - action=next_voter          → hand the device on
///   - action=reveal_votes        → begin paced disclosure
///   - action=continue            → leave the result screen
///   - action=new_game            → back to setup
pub fn handle_post(body: &str) -> String {
    let params = parse_form_body(body);
    let action = get_param(&params, "action").unwrap_or("");

    with_sessions_mut(|s| {
        let result = apply(&mut s.avalon, &mut s.rng, action, &params);
        match result {
            Ok(Some(timer)) => {
                log_scheduled(&timer);
                render(&s.avalon, None)
            }
            Ok(None) => render(&s.avalon, None),
            Err(e) => {
                warn!("avalon: {} rejected: {}", action, e);
                render(&s.avalon, Some(&e))
            }
        }
    })
}

fn apply(
    game: &mut Avalon,
    rng: &mut GameRng,
    action: &str,
    params: &[(String, String)],
) -> Result<Option<Scheduled>, GameError> {
    match action {
        "players" => {
            let count = get_number(params, "count").unwrap_or(0);
            game.select_player_count(count)?;
        }
        "slot" => {
            game.toggle_character_slot(get_param(params, "slot").unwrap_or(""))?;
        }
        "start" => game.start_game(rng)?,
        "flip" => game.flip_card()?,
        "next_player" => return game.advance_reveal(),
        "start_mission" => game.start_mission()?,
        "flip_vote" => game.flip_vote_card()?,
        "vote" => match get_param(params, "vote").and_then(Vote::parse) {
            Some(vote) => game.cast_vote(vote)?,
            None => debug!("avalon: vote without a pass/fail value"),
        },
        "next_voter" => game.advance_voter()?,
        "reveal_votes" => return game.start_vote_reveal(),
        "continue" => game.continue_after_result()?,
        "new_game" => game.new_game(),
        other => debug!("avalon: unknown action {:?}", other),
    }
    Ok(None)
}

// ── POST /api/avalon/tick ──────────────────────────────────────────

/// Handle POST /api/avalon/tick
/// Body params: event={timer event}&generation={n}
pub fn handle_tick_post(body: &str) -> String {
    let params = parse_form_body(body);
    let event = get_param(&params, "event").and_then(TimerEvent::parse);
    let generation = get_number::<u64>(&params, "generation");

    with_sessions_mut(|s| {
        if let (Some(event), Some(generation)) = (event, generation) {
            if let Some(next) = s.avalon.fire(event, generation) {
                log_scheduled(&next);
            }
        } else {
            debug!("avalon: malformed tick {:?}", body);
        }
        render(&s.avalon, None)
    })
}

// ── GET /api/avalon/state ──────────────────────────────────────────

/// Handle GET /api/avalon/state: JSON snapshot for debugging.
pub fn handle_state_get(_query: &str) -> String {
    export_json(|s| &s.avalon)
}

fn log_scheduled(timer: &Scheduled) {
    debug!(
        "avalon: {} in {}ms (generation {})",
        timer.event.as_str(),
        timer.delay_ms,
        timer.generation
    );
}

// ── Rendering ──────────────────────────────────────────────────────

fn post(action: &str, label: &str, class: &str, disabled: bool) -> String {
    hx_button(PATH, TARGET, &[("action", action.to_string())], label, class, disabled)
}

fn render(game: &Avalon, error: Option<&GameError>) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(&debug_comment(
        "avalon",
        &format!(
            "screen={} generation={}",
            game.screen().name(),
            game.generation()
        ),
    ));
    html.push_str(r#"<div class="max-w-md mx-auto p-4 text-center">"#);
    if let Some(e) = error {
        html.push_str(&error_banner(&e.to_string()));
    }

    match game.screen() {
        Screen::Setup => render_setup(game, &mut html),
        Screen::CharacterReveal => render_reveal(game, &mut html),
        Screen::GameBoard => render_board(game, &mut html),
        Screen::QuestVoting => render_voting(game, &mut html),
        Screen::QuestReveal => render_vote_reveal(game, &mut html),
        Screen::QuestResult => render_result(game, &mut html),
        Screen::Winner => render_winner(game, &mut html),
    }

    if game.screen() != Screen::Setup {
        html.push_str(r#"<div class="mt-6">"#);
        html.push_str(&post("new_game", "New game", BTN_QUIET, false));
        html.push_str(r#"</div>"#);
    }
    html.push_str(r#"</div>"#);

    if let Some(timer) = game.pending_timer() {
        html.push_str(&hx_timer(
            TICK_PATH,
            TARGET,
            &[
                ("event", timer.event.as_str().to_string()),
                ("generation", timer.generation.to_string()),
            ],
            timer.delay_ms,
        ));
    }
    html
}

fn render_setup(game: &Avalon, html: &mut String) {
    let record = game.record();
    html.push_str(r#"<h2 class="text-2xl font-bold mb-4">Avalon</h2>"#);
    html.push_str(r#"<p class="mb-2">How many players?</p>"#);
    html.push_str(r#"<div class="flex flex-wrap justify-center gap-2 mb-4">"#);
    for count in MIN_PLAYERS..=MAX_PLAYERS {
        let class = if record.player_count == count {
            "w-10 h-10 rounded bg-amber-700 text-white font-bold"
        } else {
            "w-10 h-10 rounded border border-amber-700"
        };
        html.push_str(&hx_button(
            PATH,
            TARGET,
            &[("action", "players".to_string()), ("count", count.to_string())],
            &count.to_string(),
            class,
            false,
        ));
    }
    html.push_str(r#"</div>"#);

    let (Some(evil), Some(good)) = (
        avalon::evil_quota(record.player_count),
        avalon::good_quota(record.player_count),
    ) else {
        return;
    };

    let good_picked = record.selected_on(Team::Good);
    let evil_picked = record.selected_on(Team::Evil);
    html.push_str(&format!(
        r#"<p class="mb-2"><span class="text-blue-700">Good {}/{}</span> · <span class="text-red-700">Evil {}/{}</span></p>"#,
        good_picked, good, evil_picked, evil
    ));

    html.push_str(r#"<div class="grid grid-cols-2 gap-2 mb-4">"#);
    for slot in SLOTS.iter() {
        let selected = game.is_selected(slot.id);
        let team_full = if slot.is_evil {
            evil_picked >= evil
        } else {
            good_picked >= good
        };
        let colour = if slot.is_evil { "red" } else { "blue" };
        let class = if selected {
            format!("p-2 rounded text-left bg-{}-100 border-2 border-{}-700", colour, colour)
        } else {
            format!("p-2 rounded text-left border border-{}-300 disabled:opacity-40", colour)
        };
        let label = format!(
            r#"<span class="font-bold block">{}</span><span class="text-xs">{}</span>"#,
            slot.name, slot.description
        );
        html.push_str(&hx_button(
            PATH,
            TARGET,
            &[("action", "slot".to_string()), ("slot", slot.id.to_string())],
            &label,
            &class,
            !selected && team_full,
        ));
    }
    html.push_str(r#"</div>"#);
    html.push_str(&post("start", "Start game", BTN, false));
}

fn render_reveal(game: &Avalon, html: &mut String) {
    let record = game.record();
    html.push_str(&format!(
        r#"<h2 class="text-xl font-bold mb-4">Player {} of {}</h2>"#,
        record.current_player_index + 1,
        record.player_count
    ));

    match game.visible_character() {
        Some(character) => {
            let (team, colour) = if character.is_evil {
                ("Evil", "red")
            } else {
                ("Good", "blue")
            };
            html.push_str(&format!(
                r#"<div class="p-6 rounded-lg border-4 border-{c}-700 mb-4"><p class="text-3xl font-bold">{}</p><p class="text-{c}-700 font-bold">{}</p><p class="text-sm mt-2">{}</p></div>"#,
                escape_html(&character.name),
                team,
                escape_html(&character.description),
                c = colour
            ));
            let last = record.current_player_index + 1 >= record.player_count;
            let label = if last { "Begin missions" } else { "Hide and pass on" };
            html.push_str(&post("next_player", label, BTN, false));
        }
        None => {
            html.push_str(
                r#"<div class="p-6 rounded-lg border-4 border-amber-700 mb-4 text-4xl">?</div>"#,
            );
            // While settling, the card is still turning back over.
            let settling = game.pending_timer().is_some();
            html.push_str(&post("flip", "Tap to see your identity", BTN, settling));
        }
    }
}

fn mission_strip(game: &Avalon, html: &mut String) {
    let record = game.record();
    html.push_str(r#"<div class="flex justify-center gap-2 mb-4">"#);
    for mission in 1..=MISSIONS {
        let size = avalon::team_size(record.player_count, mission).unwrap_or(0);
        let class = match record.mission_outcomes.get(mission - 1) {
            Some(true) => "bg-blue-600 text-white",
            Some(false) => "bg-red-600 text-white",
            None if mission == record.current_mission_index => "border-2 border-amber-700",
            None => "border border-gray-400",
        };
        let marker = if avalon::fails_needed(record.player_count, mission) > 1 {
            "*"
        } else {
            ""
        };
        html.push_str(&format!(
            r#"<div class="w-10 h-10 rounded-full flex items-center justify-center {}">{}{}</div>"#,
            class, size, marker
        ));
    }
    html.push_str(r#"</div>"#);
}

fn render_board(game: &Avalon, html: &mut String) {
    let record = game.record();
    html.push_str(&format!(
        r#"<h2 class="text-xl font-bold mb-2">Mission {}</h2>"#,
        record.current_mission_index
    ));
    mission_strip(game, html);
    html.push_str(&format!(
        r#"<p class="mb-2"><span class="text-blue-700">Good {}</span> · <span class="text-red-700">Evil {}</span></p>"#,
        record.wins(Team::Good),
        record.wins(Team::Evil)
    ));
    if let Some(size) = game.current_team_size() {
        html.push_str(&format!(
            r#"<p class="mb-4">Choose a team of {} players.</p>"#,
            size
        ));
    }
    if avalon::fails_needed(record.player_count, record.current_mission_index) > 1 {
        html.push_str(r#"<p class="text-sm mb-4">This mission needs two fail votes to fail.</p>"#);
    }
    html.push_str(&post("start_mission", "Start mission vote", BTN, false));
}

fn render_voting(game: &Avalon, html: &mut String) {
    let record = game.record();
    let size = record.mission_slots.len();
    html.push_str(&format!(
        r#"<h2 class="text-xl font-bold mb-4">Mission {} · Team member {} of {}</h2>"#,
        record.current_mission_index,
        record.current_voter_index + 1,
        size
    ));

    if !game.vote_card_flipped() {
        html.push_str(r#"<p class="mb-4">Pass the device to the next team member.</p>"#);
        html.push_str(&post("flip_vote", "Tap to vote in secret", BTN, false));
        return;
    }

    let current = game.current_vote();
    html.push_str(r#"<div class="flex justify-center gap-4 mb-4">"#);
    for (vote, key, label, colour) in [
        (Vote::Pass, "pass", "PASS", "blue"),
        (Vote::Fail, "fail", "FAIL", "red"),
    ] {
        let class = if current == Some(vote) {
            format!("px-6 py-4 rounded-lg bg-{}-700 text-white font-bold", colour)
        } else {
            format!("px-6 py-4 rounded-lg border-2 border-{}-700 font-bold", colour)
        };
        html.push_str(&hx_button(
            PATH,
            TARGET,
            &[("action", "vote".to_string()), ("vote", key.to_string())],
            label,
            &class,
            false,
        ));
    }
    html.push_str(r#"</div>"#);
    let label = if record.current_voter_index + 1 >= size {
        "Done voting"
    } else {
        "Hide and pass on"
    };
    html.push_str(&post("next_voter", label, BTN, current.is_none()));
}

fn vote_chip(vote: Option<Vote>) -> &'static str {
    match vote {
        Some(Vote::Pass) => {
            r#"<div class="w-12 h-16 rounded bg-blue-600 text-white flex items-center justify-center font-bold">✓</div>"#
        }
        Some(Vote::Fail) => {
            r#"<div class="w-12 h-16 rounded bg-red-600 text-white flex items-center justify-center font-bold">✗</div>"#
        }
        None => {
            r#"<div class="w-12 h-16 rounded border-2 border-gray-400 flex items-center justify-center">?</div>"#
        }
    }
}

fn render_vote_reveal(game: &Avalon, html: &mut String) {
    let record = game.record();
    let revealed = game.revealed_votes();
    html.push_str(&format!(
        r#"<h2 class="text-xl font-bold mb-4">Mission {} votes</h2>"#,
        record.current_mission_index
    ));
    html.push_str(r#"<div class="flex flex-wrap justify-center gap-2 mb-4">"#);
    for i in 0..record.mission_votes.len() {
        html.push_str(vote_chip(revealed.get(i).copied()));
    }
    html.push_str(r#"</div>"#);
    if !game.is_revealing() {
        html.push_str(&post("reveal_votes", "Reveal votes", BTN, false));
    }
}

fn render_result(game: &Avalon, html: &mut String) {
    let record = game.record();
    let passed = game.last_outcome().unwrap_or(false);
    let (text, colour) = if passed {
        ("Mission passed", "blue")
    } else {
        ("Mission failed", "red")
    };
    html.push_str(&format!(
        r#"<h2 class="text-3xl font-bold text-{}-700 mb-2">{}</h2>"#,
        colour, text
    ));
    html.push_str(&format!(
        r#"<p class="mb-4">{} pass · {} fail</p>"#,
        record.pass_votes(),
        record.fail_votes()
    ));
    mission_strip(game, html);
    html.push_str(&post("continue", "Continue", BTN, false));
}

fn render_winner(game: &Avalon, html: &mut String) {
    let (text, colour) = match game.winner() {
        Some(Team::Good) => ("Good Wins!", "blue"),
        _ => ("Evil Wins!", "red"),
    };
    let record = game.record();
    html.push_str(&format!(
        r#"<h2 class="text-4xl font-bold text-{}-700 mb-2">{}</h2><p class="text-xl mb-4">{}-{}</p>"#,
        colour,
        text,
        record.wins(Team::Good),
        record.wins(Team::Evil)
    ));
    mission_strip(game, html);
    html.push_str(r#"<ul class="text-left inline-block mb-4">"#);
    for (seat, character) in record.players.iter().enumerate() {
        html.push_str(&format!(
            r#"<li>Player {}: <span class="font-bold">{}</span></li>"#,
            seat + 1,
            escape_html(&character.name)
        ));
    }
    html.push_str(r#"</ul>"#);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{reseed, replace_sessions, Sessions};

    fn reset() {
        replace_sessions(Sessions::default());
        reseed(5);
    }

    fn post_action(body: &str) -> String {
        handle_post(body)
    }

    /// Five players with Merlin, Percival, a Loyal Servant, Mordred, Morgana.
    fn setup_five() {
        post_action("action=players&count=5");
        for slot in ["merlin", "percival", "loyal0", "mordred", "morgana"] {
            post_action(&format!("action=slot&slot={}", slot));
        }
    }

    fn tick() -> String {
        let timer = with_sessions(|s| s.avalon.pending_timer()).expect("pending timer");
        handle_tick_post(&format!(
            "event={}&generation={}",
            timer.event.as_str(),
            timer.generation
        ))
    }

    #[test]
    fn get_renders_setup() {
        reset();
        let html = handle_get("");
        assert!(html.contains("[hiking-games] avalon screen=setup generation=0"));
        assert!(html.contains("How many players?"));
        assert!(!html.contains("Merlin"));
        reset();
    }

    #[test]
    fn choosing_count_lists_slots() {
        reset();
        let html = post_action("action=players&count=5");
        assert!(html.contains("Good 0/3"));
        assert!(html.contains("Evil 0/2"));
        assert!(html.contains("Merlin"));
        reset();
    }

    #[test]
    fn full_team_disables_remaining_slots() {
        reset();
        post_action("action=players&count=5");
        post_action("action=slot&slot=mordred");
        let html = post_action("action=slot&slot=morgana");
        assert!(html.contains("Evil 2/2"));
        assert!(html.contains(" disabled>"));
        reset();
    }

    #[test]
    fn incomplete_selection_shows_message() {
        reset();
        post_action("action=players&count=5");
        post_action("action=slot&slot=merlin");
        let html = post_action("action=start");
        assert!(html.contains("Please select exactly 5 characters (1 selected)"));
        assert!(html.contains("screen=setup"));
        reset();
    }

    #[test]
    fn reveal_flow_uses_settle_tick() {
        reset();
        setup_five();
        let html = post_action("action=start");
        assert!(html.contains("Player 1 of 5"));

        let html = post_action("action=flip");
        assert!(html.contains("Hide and pass on"));

        let html = post_action("action=next_player");
        assert!(html.contains(r#"hx-trigger="load delay:300ms""#));
        assert!(html.contains("settle_reveal"));
        assert!(html.contains("Player 1 of 5"));

        let html = tick();
        assert!(html.contains("Player 2 of 5"));
        assert!(!html.contains("hx-trigger"));
        reset();
    }

    #[test]
    fn flip_during_settle_keeps_timer() {
        reset();
        setup_five();
        post_action("action=start");
        post_action("action=flip");
        post_action("action=next_player");
        let html = post_action("action=flip");
        assert!(html.contains("settle_reveal"));
        with_sessions(|s| assert!(s.avalon.visible_character().is_none()));
        reset();
    }

    #[test]
    fn stale_tick_does_nothing() {
        reset();
        setup_five();
        post_action("action=start");
        post_action("action=flip");
        post_action("action=next_player");
        post_action("action=new_game");
        let html = handle_tick_post("event=settle_reveal&generation=0");
        assert!(html.contains("screen=setup generation=1"));
        reset();
    }

    #[test]
    fn malformed_tick_rerenders() {
        reset();
        let html = handle_tick_post("event=bogus");
        assert!(html.contains("screen=setup"));
        reset();
    }

    #[test]
    fn mission_round_trip_through_result() {
        reset();
        setup_five();
        post_action("action=start");
        for _ in 0..5 {
            post_action("action=flip");
            post_action("action=next_player");
            if with_sessions(|s| s.avalon.pending_timer().is_some()) {
                tick();
            }
        }
        let html = handle_get("");
        assert!(html.contains("screen=gameBoard"));
        assert!(html.contains("Choose a team of 2 players."));

        post_action("action=start_mission");
        let html = post_action("action=next_voter");
        assert!(html.contains("screen=questVoting"));

        post_action("action=flip_vote");
        let html = post_action("action=vote&vote=fail");
        assert!(html.contains("Hide and pass on"));
        post_action("action=next_voter");
        post_action("action=flip_vote");
        post_action("action=vote&vote=pass");
        let html = post_action("action=next_voter");
        assert!(html.contains("Reveal votes"));

        let html = post_action("action=reveal_votes");
        assert!(html.contains("reveal_next_vote"));
        assert!(html.contains("1500ms"));
        tick();
        let html = tick();
        assert!(html.contains("show_result"));
        assert!(html.contains("2000ms"));
        let html = tick();
        assert!(html.contains("Mission failed"));
        assert!(html.contains("1 pass · 1 fail"));

        let html = post_action("action=continue");
        assert!(html.contains("Mission 2"));
        reset();
    }

    #[test]
    fn three_passed_missions_show_winner() {
        reset();
        setup_five();
        post_action("action=start");
        for _ in 0..5 {
            post_action("action=flip");
            post_action("action=next_player");
            if with_sessions(|s| s.avalon.pending_timer().is_some()) {
                tick();
            }
        }
        let mut html = String::new();
        for _ in 0..3 {
            post_action("action=start_mission");
            let size = with_sessions(|s| s.avalon.record().mission_slots.len());
            for _ in 0..size {
                post_action("action=flip_vote");
                post_action("action=vote&vote=pass");
                post_action("action=next_voter");
            }
            post_action("action=reveal_votes");
            while with_sessions(|s| s.avalon.pending_timer().is_some()) {
                tick();
            }
            html = post_action("action=continue");
        }
        assert!(html.contains("screen=winner"));
        assert!(html.contains("Good Wins!"));
        assert!(html.contains("3-0"));
        reset();
    }

    #[test]
    fn state_get_is_json() {
        reset();
        post_action("action=players&count=7");
        let json = handle_state_get("");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["record"]["player_count"], 7);
        assert_eq!(value["screen"], "setup");
        reset();
    }

    #[test]
    fn unknown_action_is_ignored() {
        reset();
        let html = post_action("action=dance");
        assert!(html.contains("screen=setup"));
        assert!(!html.contains("role=\"alert\""));
        reset();
    }
}
