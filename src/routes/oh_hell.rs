//! `/api/oh-hell/*` routes: Oh Hell score keeper.

use std::str::FromStr;

use log::{debug, warn};
use thiserror::Error;

use crate::error::GameError;
use crate::game::oh_hell::{
    round_score, Adjustment, OhHell, Phase, ScoringMode, Settings, MAX_BASE_POINTS, MAX_PLAYERS,
    MAX_POINTS_PER_TRICK, MIN_PLAYERS, MIN_POINTS_PER_TRICK,
};
use crate::game::state::{export_json, with_sessions, with_sessions_mut};
use crate::routes::util::{
    debug_comment, error_banner, escape_html, get_number, get_param, hx_button, parse_form_body,
};

pub const PATH: &str = "/api/oh-hell";
const TARGET: &str = "#oh-hell-app";
const DEFAULT_PLAYERS: usize = 4;

const BTN: &str = "px-4 py-2 rounded bg-emerald-700 text-white font-bold";
const BTN_QUIET: &str = "px-3 py-1 rounded border border-emerald-700 text-emerald-800 text-sm";
const CHIP: &str = "w-9 h-9 rounded border border-emerald-700 disabled:opacity-30 disabled:line-through";
const CHIP_ON: &str = "w-9 h-9 rounded bg-emerald-700 text-white font-bold";

/// Why a POST changed nothing.
#[derive(Debug, Error)]
enum Rejection {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Missing or invalid {0} parameter")]
    BadParam(&'static str),
}

fn required<T: FromStr>(params: &[(String, String)], key: &'static str) -> Result<T, Rejection> {
    get_number(params, key).ok_or(Rejection::BadParam(key))
}

// ── GET /api/oh-hell ───────────────────────────────────────────────

pub fn handle_get(_query: &str) -> String {
    with_sessions(|s| render(&s.oh_hell, None, &[]))
}

// ── POST /api/oh-hell ──────────────────────────────────────────────

/// Handle POST /api/oh-hell
/// Body params:
///   - action=start&players={n}&name0..name6&mode&base_points&points_per_trick
///   - action=bid&player={id}&bid={n}
///   - action=begin_play | back_to_bidding
///   - action=tricks&player={id}&tricks={n}
///   - action=adjust&player={id}&step=base_up|base_down|trick_up|trick_down
///   - action=score&player={id}&score={n}
///   - action=next_round | finish | restart
pub fn handle_post(body: &str) -> String {
    let params = parse_form_body(body);
    let action = get_param(&params, "action").unwrap_or("");

    // Play again keeps the table: the setup form comes back with the same
    // player count and names.
    let carried = if action == "restart" {
        with_sessions(|s| table_form(&s.oh_hell))
    } else {
        Vec::new()
    };

    with_sessions_mut(|s| match apply(&mut s.oh_hell, action, &params) {
        Ok(()) => render(&s.oh_hell, None, &carried),
        // The forbidden chip is already disabled; a stray click is not news.
        Err(Rejection::Game(GameError::ForbiddenBid { bid })) => {
            debug!("oh hell: ignoring forbidden bid {}", bid);
            render(&s.oh_hell, None, &[])
        }
        Err(e) => {
            warn!("oh hell: {} rejected: {}", action, e);
            render(&s.oh_hell, Some(&e.to_string()), &params)
        }
    })
}

fn apply(game: &mut OhHell, action: &str, params: &[(String, String)]) -> Result<(), Rejection> {
    match action {
        "start" => {
            let players = get_number(params, "players").unwrap_or(DEFAULT_PLAYERS);
            if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
                return Err(GameError::InvalidPlayerCount {
                    count: players,
                    min: MIN_PLAYERS,
                    max: MAX_PLAYERS,
                }
                .into());
            }
            let names: Vec<&str> = (0..players)
                .map(|i| get_param(params, &format!("name{}", i)).unwrap_or(""))
                .collect();
            let defaults = Settings::default();
            let scoring_mode = match get_param(params, "mode") {
                None | Some("") => defaults.scoring_mode,
                Some(key) => ScoringMode::parse(key).ok_or(Rejection::BadParam("mode"))?,
            };
            let settings = Settings {
                scoring_mode,
                base_points: optional(params, "base_points", defaults.base_points)?,
                points_per_trick: optional(params, "points_per_trick", defaults.points_per_trick)?,
            };
            game.start_session(&names[..], settings)?;
        }
        "bid" => game.record_bid(required(params, "player")?, required(params, "bid")?)?,
        "begin_play" => game.begin_play()?,
        "back_to_bidding" => game.back_to_bidding()?,
        "tricks" => {
            game.record_tricks_taken(required(params, "player")?, required(params, "tricks")?)?
        }
        "adjust" => {
            let step = get_param(params, "step")
                .and_then(Adjustment::parse)
                .ok_or(Rejection::BadParam("step"))?;
            game.adjust_score(required(params, "player")?, step)?;
        }
        "score" => {
            // Unparseable typed scores count as 0.
            let score = get_number(params, "score").unwrap_or(0);
            game.record_direct_score(required(params, "player")?, score)?;
        }
        "next_round" => game.advance_round()?,
        "finish" => game.finish()?,
        "restart" => game.restart(),
        other => debug!("oh hell: unknown action {:?}", other),
    }
    Ok(())
}

fn table_form(game: &OhHell) -> Vec<(String, String)> {
    let players = game.players();
    if players.is_empty() {
        return Vec::new();
    }
    let mut form = vec![("players".to_string(), players.len().to_string())];
    form.extend(
        players
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("name{}", i), p.name.clone())),
    );
    form
}

/// A numeric setting: blank means default, garbage is rejected.
fn optional(params: &[(String, String)], key: &'static str, default: u32) -> Result<u32, Rejection> {
    match get_param(params, key).map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse().map_err(|_| Rejection::BadParam(key)),
    }
}

// ── GET /api/oh-hell/state ─────────────────────────────────────────

pub fn handle_state_get(_query: &str) -> String {
    export_json(|s| &s.oh_hell)
}

// ── Rendering ──────────────────────────────────────────────────────

fn post(vals: &[(&str, String)], label: &str, class: &str, disabled: bool) -> String {
    hx_button(PATH, TARGET, vals, label, class, disabled)
}

fn action(name: &str) -> (&'static str, String) {
    ("action", name.to_string())
}

fn render(game: &OhHell, error: Option<&str>, form: &[(String, String)]) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(&debug_comment(
        "oh-hell",
        &format!(
            "phase={} round={}/{}",
            game.phase().name(),
            game.current_round(),
            game.max_rounds()
        ),
    ));
    html.push_str(r#"<div class="max-w-lg mx-auto p-4 text-center">"#);
    if let Some(e) = error {
        html.push_str(&error_banner(e));
    }

    match game.phase() {
        Phase::Setup => render_setup(form, &mut html),
        Phase::Bidding => render_bidding(game, &mut html),
        Phase::Scoring => render_scoring(game, &mut html),
        Phase::Results => render_results(game, &mut html),
    }

    if game.phase() != Phase::Setup && game.phase() != Phase::Results {
        render_totals(game, &mut html);
    }
    html.push_str(r#"</div>"#);
    html
}

fn render_setup(form: &[(String, String)], html: &mut String) {
    let players = get_number(form, "players").unwrap_or(DEFAULT_PLAYERS);
    let defaults = Settings::default();
    let mode = get_param(form, "mode")
        .and_then(ScoringMode::parse)
        .unwrap_or(defaults.scoring_mode);
    let base = get_param(form, "base_points")
        .map(str::to_string)
        .unwrap_or_else(|| defaults.base_points.to_string());
    let per_trick = get_param(form, "points_per_trick")
        .map(str::to_string)
        .unwrap_or_else(|| defaults.points_per_trick.to_string());

    html.push_str(r#"<h2 class="text-2xl font-bold mb-4">Oh Hell</h2>"#);
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

    html.push_str(r#"<fieldset class="grid grid-cols-2 gap-2"><legend class="font-bold">Names (first N are used)</legend>"#);
    for i in 0..MAX_PLAYERS {
        let key = format!("name{}", i);
        html.push_str(&format!(
            r#"<input type="text" name="{}" value="{}" placeholder="Player {}" class="border rounded p-1">"#,
            key,
            escape_html(get_param(form, &key).unwrap_or("")),
            i + 1
        ));
    }
    html.push_str(r#"</fieldset>"#);

    html.push_str(r#"<fieldset><legend class="font-bold">Scoring</legend>"#);
    for (m, label) in [
        (ScoringMode::BidTrick, "Bids &amp; tricks (scores calculated)"),
        (ScoringMode::Buttons, "Score buttons"),
        (ScoringMode::Typing, "Type scores"),
    ] {
        html.push_str(&format!(
            r#"<label class="block"><input type="radio" name="mode" value="{}"{}> {}</label>"#,
            m.key(),
            if m == mode { " checked" } else { "" },
            label
        ));
    }
    html.push_str(r#"</fieldset>"#);

    html.push_str(&format!(
        r#"<label class="font-bold">Points for making your bid <input type="number" name="base_points" min="0" max="{}" value="{}" class="border rounded p-1 w-20"></label>"#,
        MAX_BASE_POINTS,
        escape_html(&base)
    ));
    html.push_str(&format!(
        r#"<label class="font-bold">Points per trick <input type="number" name="points_per_trick" min="{}" max="{}" value="{}" class="border rounded p-1 w-20"></label>"#,
        MIN_POINTS_PER_TRICK,
        MAX_POINTS_PER_TRICK,
        escape_html(&per_trick)
    ));
    // Preview only settings the engine would accept.
    let preview = Settings {
        scoring_mode: mode,
        base_points: base.trim().parse().unwrap_or(defaults.base_points),
        points_per_trick: per_trick.trim().parse().unwrap_or(defaults.points_per_trick),
    };
    let preview = if preview.validate().is_ok() { preview } else { defaults };
    render_rules_preview(&preview, html);
    html.push_str(&format!(
        r#"<button type="submit" class="{}">Start game</button>"#,
        BTN
    ));
    html.push_str(r#"</form>"#);
}

fn render_rules_preview(settings: &Settings, html: &mut String) {
    let Settings {
        base_points,
        points_per_trick,
        ..
    } = *settings;
    html.push_str(&format!(
        r#"<div class="text-sm bg-emerald-50 rounded p-2"><p>Make your bid exactly: {} + {} × tricks. Miss it: 0.</p><ul class="list-disc ml-5">"#,
        base_points, points_per_trick
    ));
    for tricks in [0u32, 1, 3] {
        html.push_str(&format!(
            "<li>Bid {t}, take {t}: {} points</li>",
            round_score(tricks, tricks, base_points, points_per_trick),
            t = tricks
        ));
    }
    html.push_str(r#"<li>Bid 2, take 1: 0 points</li></ul></div>"#);
}

fn round_header(game: &OhHell, html: &mut String) {
    html.push_str(&format!(
        r#"<h2 class="text-xl font-bold mb-1">Round {} of {}</h2><p class="mb-3">{} trick{} this round</p>"#,
        game.current_round(),
        game.max_rounds(),
        game.tricks_this_round(),
        if game.tricks_this_round() == 1 { "" } else { "s" }
    ));
}

fn render_bidding(game: &OhHell, html: &mut String) {
    round_header(game, html);
    let round = game.current_round();
    let tricks = game.tricks_this_round();
    let total = game.total_bids();
    let diff = i64::from(total) - i64::from(tricks);

    html.push_str(&format!(
        r#"<p class="mb-3">Total bids: <span class="font-bold">{}</span> ({:+})</p>"#,
        total, diff
    ));
    if total == tricks {
        html.push_str(r#"<p class="text-amber-700 font-bold mb-3">Total bids equal the tricks available!</p>"#);
    }

    for player in game.players() {
        let bid = player.bid(round);
        let forbidden = game.forbidden_bid(player.id);
        html.push_str(r#"<div class="mb-3 text-left">"#);
        html.push_str(&format!(
            r#"<p class="font-bold">{}{}</p>"#,
            escape_html(&player.name),
            if game.is_last_bidder(player.id) {
                r#" <span class="text-xs text-amber-700">(last to bid)</span>"#
            } else {
                ""
            }
        ));
        html.push_str(r#"<div class="flex flex-wrap gap-1">"#);
        for n in 0..=tricks {
            html.push_str(&post(
                &[
                    action("bid"),
                    ("player", player.id.to_string()),
                    ("bid", n.to_string()),
                ],
                &n.to_string(),
                if bid == Some(n) { CHIP_ON } else { CHIP },
                forbidden == Some(n),
            ));
        }
        html.push_str(r#"</div>"#);
        if let Some(f) = forbidden {
            html.push_str(&format!(
                r#"<p class="text-xs text-red-700">Cannot bid {}</p>"#,
                f
            ));
        }
        html.push_str(r#"</div>"#);
    }
    html.push_str(&post(&[action("begin_play")], "Start playing round", BTN, false));
}

fn render_scoring(game: &OhHell, html: &mut String) {
    round_header(game, html);
    let round = game.current_round();
    let tricks = game.tricks_this_round();
    let settings = game.settings();

    for player in game.players() {
        let id = player.id.to_string();
        html.push_str(r#"<div class="mb-3 text-left">"#);
        html.push_str(&format!(
            r#"<p><span class="font-bold">{}</span> · round score {}</p>"#,
            escape_html(&player.name),
            player.score(round)
        ));
        match settings.scoring_mode {
            ScoringMode::BidTrick => {
                html.push_str(&format!(
                    r#"<p class="text-sm">Bid {} · tricks taken:</p><div class="flex flex-wrap gap-1">"#,
                    player.bid(round).unwrap_or(0)
                ));
                let taken = player.tricks(round);
                for n in 0..=tricks {
                    html.push_str(&post(
                        &[action("tricks"), ("player", id.clone()), ("tricks", n.to_string())],
                        &n.to_string(),
                        if taken == Some(n) { CHIP_ON } else { CHIP },
                        false,
                    ));
                }
                html.push_str(r#"</div>"#);
            }
            ScoringMode::Buttons => {
                html.push_str(r#"<div class="flex gap-1">"#);
                for (step, label) in [
                    ("base_down", format!("−{}", settings.base_points)),
                    ("trick_down", format!("−{}", settings.points_per_trick)),
                    ("trick_up", format!("+{}", settings.points_per_trick)),
                    ("base_up", format!("+{}", settings.base_points)),
                ] {
                    html.push_str(&post(
                        &[action("adjust"), ("player", id.clone()), ("step", step.to_string())],
                        &label,
                        BTN_QUIET,
                        false,
                    ));
                }
                html.push_str(r#"</div>"#);
            }
            ScoringMode::Typing => {
                html.push_str(&format!(
                    r#"<input type="number" name="score" min="0" value="{}" hx-post="{}" hx-trigger="change" hx-vals="{{&quot;action&quot;:&quot;score&quot;,&quot;player&quot;:&quot;{}&quot;}}" hx-target="{}" hx-swap="innerHTML" class="border rounded p-1 w-24">"#,
                    player.score(round),
                    PATH,
                    player.id,
                    TARGET
                ));
            }
        }
        html.push_str(r#"</div>"#);
    }

    html.push_str(r#"<div class="flex justify-center gap-2">"#);
    if settings.scoring_mode == ScoringMode::BidTrick {
        html.push_str(&post(&[action("back_to_bidding")], "Back to bidding", BTN_QUIET, false));
    }
    if game.is_last_round() {
        html.push_str(&post(&[action("finish")], "Final results", BTN, false));
    } else {
        html.push_str(&post(&[action("next_round")], "Next round", BTN, false));
    }
    html.push_str(r#"</div>"#);
}

fn render_totals(game: &OhHell, html: &mut String) {
    html.push_str(r#"<table class="w-full mt-6 text-sm"><thead><tr><th class="text-left">Player</th><th>Total</th></tr></thead><tbody>"#);
    for player in game.players() {
        html.push_str(&format!(
            r#"<tr><td class="text-left">{}</td><td>{}</td></tr>"#,
            escape_html(&player.name),
            player.total_score
        ));
    }
    html.push_str(r#"</tbody></table>"#);
}

fn render_results(game: &OhHell, html: &mut String) {
    html.push_str(r#"<h2 class="text-2xl font-bold mb-4">Final Results</h2><ol class="text-left inline-block mb-4">"#);
    for (place, player) in game.standings().into_iter().enumerate() {
        html.push_str(&format!(
            r#"<li>{}. <span class="font-bold">{}</span>: {} points</li>"#,
            place + 1,
            escape_html(&player.name),
            player.total_score
        ));
    }
    html.push_str(r#"</ol>"#);

    html.push_str(r#"<table class="w-full text-xs mb-4"><thead><tr><th>Round</th>"#);
    for player in game.players() {
        html.push_str(&format!("<th>{}</th>", escape_html(&player.name)));
    }
    html.push_str(r#"</tr></thead><tbody>"#);
    for round in 1..=game.max_rounds() {
        html.push_str(&format!("<tr><td>{}</td>", round));
        for player in game.players() {
            html.push_str(&format!("<td>{}</td>", player.score(round)));
        }
        html.push_str("</tr>");
    }
    html.push_str(r#"</tbody></table>"#);
    html.push_str(&post(&[action("restart")], "Play again", BTN, false));
}
