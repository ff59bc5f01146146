//! Browser front-end: canvas drawing, DOM input and the animation-frame loop.
//!
//! Everything stateful lives in [`Game`]; this module only translates between
//! it and the page. The app is kept in a thread-local so event closures and the
//! frame callback can reach it.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement, window};

use crate::audio::AudioEngine;
use crate::characters::{CHARACTERS, Character};
use crate::gacha::GACHA_COST;
use crate::ranking::RankingEntry;
use crate::run::{EntityKind, PLAYER_SIZE, RunConfig, RunState};
use crate::scene::{Game, Screen};
use crate::storage::{BrowserStorage, KeyValueStore};

pub const CANVAS_W: f64 = 800.0;
pub const CANVAS_H: f64 = 600.0;
/// Screen y of the ground line; altitude 0 maps here.
const GROUND_Y: f64 = 560.0;

const CANVAS_ID: &str = "sr-canvas";
const NAME_INPUT_ID: &str = "sr-name";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    StartRun,
    OpenSelect,
    OpenGacha,
    RollGacha,
    Back,
    Retry,
    Register,
    Select(&'static str),
}

struct Button {
    label: String,
    action: Action,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    color: &'static str,
    enabled: bool,
}

impl Button {
    fn new(label: impl Into<String>, action: Action, (x, y): (f64, f64), color: &'static str) -> Self {
        Self {
            label: label.into(),
            action,
            x,
            y,
            w: 220.0,
            h: 50.0,
            color,
            enabled: true,
        }
    }

    fn contains(&self, px: f64, py: f64) -> bool {
        (px - self.x).abs() <= self.w / 2.0 && (py - self.y).abs() <= self.h / 2.0
    }
}

struct WebApp {
    game: Game<BrowserStorage>,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    audio: Option<AudioEngine>,
    last_ts: Option<f64>,
}

thread_local! {
    static APP: RefCell<Option<WebApp>> = const { RefCell::new(None) };
}

/// Mount the game. `config_json` optionally overrides run tuning
/// (`RunConfig` fields, snake_case); omitted fields keep their defaults.
#[wasm_bindgen]
pub fn start_game(config_json: Option<String>) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id(CANVAS_ID);
        c.set_width(CANVAS_W as u32);
        c.set_height(CANVAS_H as u32);
        c.set_attribute("style", "display:block; margin:0 auto; max-width:100vw; max-height:100vh; touch-action:none; border-radius:12px; box-shadow:0 0 24px rgba(0,0,0,0.2);").ok();
        let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
        body.append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;

    let storage = BrowserStorage::local().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let config = RunConfig::from_override(config_json.as_deref());
    let game = Game::new(storage, config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let audio = match AudioEngine::new() {
        Ok(a) => Some(a),
        Err(e) => {
            log::warn!("audio disabled: {e:?}");
            None
        }
    };

    APP.with(|a| {
        a.replace(Some(WebApp {
            game,
            canvas: canvas.clone(),
            ctx,
            audio,
            last_ts: None,
        }))
    });

    // Pointer: menus use hit regions; during a run the midline splits jump / accelerate.
    {
        let canvas_ptr = canvas.clone();
        let closure = Closure::wrap(Box::new(move |evt: web_sys::PointerEvent| {
            let scale_x = CANVAS_W / canvas_ptr.client_width().max(1) as f64;
            let scale_y = CANVAS_H / canvas_ptr.client_height().max(1) as f64;
            let x = evt.offset_x() as f64 * scale_x;
            let y = evt.offset_y() as f64 * scale_y;
            with_app(|app| {
                if let Some(audio) = &app.audio {
                    audio.resume();
                }
                if matches!(app.game.screen(), Screen::Run { .. }) {
                    app.game.pointer(x, CANVAS_W);
                    return;
                }
                let hit = buttons(&app.game)
                    .into_iter()
                    .find(|b| b.enabled && b.contains(x, y))
                    .map(|b| b.action);
                if let Some(action) = hit {
                    dispatch(app, action);
                }
            });
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Keyboard: Space / ArrowUp jump, ArrowRight accelerate, Enter registers a name.
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            let key = evt.key();
            with_app(|app| {
                if key == "Enter" {
                    if matches!(app.game.screen(), Screen::Result(_)) {
                        dispatch(app, Action::Register);
                    }
                    return;
                }
                if matches!(app.game.screen(), Screen::Run { .. }) {
                    if matches!(key.as_str(), " " | "ArrowUp" | "ArrowRight") {
                        evt.prevent_default();
                    }
                    app.game.key(&key);
                }
            });
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    start_loop();
    Ok(())
}

/// Register the typed name from JS (e.g. a custom form).
#[wasm_bindgen]
pub fn register_name(name: &str) -> bool {
    let mut ok = false;
    with_app(|app| match app.game.register_name(name) {
        Ok(done) => ok = done,
        Err(e) => log::error!("name registration failed: {e}"),
    });
    ok
}

fn with_app(f: impl FnOnce(&mut WebApp)) {
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            f(app);
        }
    });
}

fn dispatch(app: &mut WebApp, action: Action) {
    let game = &mut app.game;
    let result = match action {
        Action::StartRun => game.start_run(),
        Action::OpenSelect => {
            game.open_character_select();
            Ok(())
        }
        Action::OpenGacha => {
            game.open_gacha();
            Ok(())
        }
        Action::RollGacha => game.roll_gacha().map(|_| ()),
        Action::Back => game.back_to_title(),
        Action::Retry => game.retry(),
        Action::Select(id) => game.select_character(id).map(|_| ()),
        Action::Register => {
            let name = name_input().map(|i| i.value()).unwrap_or_default();
            game.register_name(&name).map(|_| ())
        }
    };
    if let Err(e) = result {
        log::error!("{action:?} failed: {e}");
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        with_app(|app| frame(app, ts));
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn frame(app: &mut WebApp, ts: f64) {
    let dt = app.last_ts.map(|last| (ts - last) / 1000.0).unwrap_or(0.0);
    app.last_ts = Some(ts);
    if let Err(e) = app.game.update(dt) {
        log::error!("frame update failed: {e}");
    }
    let cues = app.game.drain_cues();
    let tones = app.game.drain_tones();
    if let Some(audio) = &app.audio {
        for cue in cues {
            audio.play_cue(cue);
        }
        audio.play_tones(&tones);
    }
    if let Some(doc) = window().and_then(|w| w.document()) {
        sync_name_input(&doc, &app.canvas, app.game.screen());
    }
    render(app);
}

// --- Name input overlay ---------------------------------------------------------

fn name_input() -> Option<HtmlInputElement> {
    window()?
        .document()?
        .get_element_by_id(NAME_INPUT_ID)?
        .dyn_into()
        .ok()
}

/// The input exists only while an unregistered result is shown.
fn sync_name_input(doc: &Document, canvas: &HtmlCanvasElement, screen: &Screen) {
    let wanted = matches!(screen, Screen::Result(r) if r.registered_name.is_none());
    let existing = doc.get_element_by_id(NAME_INPUT_ID);
    match (wanted, existing) {
        (true, None) => {
            let Ok(el) = doc.create_element("input") else { return };
            let Ok(input) = el.dyn_into::<HtmlInputElement>() else { return };
            input.set_id(NAME_INPUT_ID);
            input.set_max_length(crate::ranking::MAX_NAME_LEN as i32);
            input.set_placeholder("Your name");
            let top = canvas.offset_top() + (canvas.client_height() as f64 * 0.42) as i32;
            input
                .set_attribute(
                    "style",
                    &format!("position:absolute; left:50%; top:{top}px; transform:translateX(-50%); font-size:18px; padding:6px 10px; border-radius:6px; border:2px solid #ff69b4; width:180px; text-align:center;"),
                )
                .ok();
            if let Some(body) = doc.body() {
                body.append_child(&input).ok();
            }
        }
        (false, Some(el)) => el.remove(),
        _ => {}
    }
}

// --- Layout -----------------------------------------------------------------------

fn buttons<S: KeyValueStore>(game: &Game<S>) -> Vec<Button> {
    let cx = CANVAS_W / 2.0;
    match game.screen() {
        Screen::Title => vec![
            Button::new("START", Action::StartRun, (cx, 330.0), "#ff6b35"),
            Button::new("Characters", Action::OpenSelect, (cx, 400.0), "#2196f3"),
            Button::new("Gacha", Action::OpenGacha, (cx, 470.0), "#9400d3"),
        ],
        Screen::CharacterSelect => {
            let stats = game.stats().load();
            let mut out: Vec<Button> = CHARACTERS
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let col = (i % 4) as f64;
                    let row = (i / 4) as f64;
                    let mut b = Button::new(c.name, Action::Select(c.id), (130.0 + col * 180.0, 190.0 + row * 190.0), c.rarity.color());
                    b.w = 160.0;
                    b.h = 170.0;
                    b.enabled = stats.is_unlocked(c.id);
                    b
                })
                .collect();
            out.push(Button::new("Back", Action::Back, (cx, 550.0), "#4caf50"));
            out
        }
        Screen::Gacha { .. } => {
            let coins = game.stats().load().coins;
            let mut roll = Button::new(format!("Roll ({GACHA_COST} coins)"), Action::RollGacha, (cx, 440.0), "#ff6b35");
            roll.w = 300.0;
            roll.enabled = coins >= GACHA_COST;
            vec![roll, Button::new("Back", Action::Back, (cx, 530.0), "#4caf50")]
        }
        Screen::Run { .. } => Vec::new(),
        Screen::Result(r) => {
            let mut out = vec![
                Button::new("RETRY", Action::Retry, (cx - 130.0, 330.0), "#4caf50"),
                Button::new("TITLE", Action::Back, (cx + 130.0, 330.0), "#2196f3"),
            ];
            if r.registered_name.is_none() {
                let mut reg = Button::new("Register", Action::Register, (cx + 200.0, 262.0), "#ff69b4");
                reg.w = 120.0;
                reg.h = 40.0;
                out.push(reg);
            }
            out
        }
    }
}

// --- Rendering ----------------------------------------------------------------------

fn render(app: &WebApp) {
    let ctx = &app.ctx;
    let game = &app.game;
    match game.screen() {
        Screen::Title => draw_title(ctx, game),
        Screen::CharacterSelect => draw_select(ctx),
        Screen::Gacha { last_draw } => draw_gacha(ctx, game, *last_draw),
        Screen::Run { run, .. } => draw_run(ctx, run),
        Screen::Result(_) => draw_result(ctx, game),
    }
    for b in buttons(game) {
        draw_button(ctx, &b);
    }
    for (i, n) in game.notices().iter().enumerate() {
        let alpha = n.remaining.min(1.0);
        let y = 200.0 + i as f64 * 50.0;
        ctx.set_global_alpha(alpha);
        fill(ctx, "rgba(0,0,0,0.7)");
        ctx.fill_rect(CANVAS_W / 2.0 - 260.0, y - 28.0, 520.0, 42.0);
        text(ctx, &n.text, CANVAS_W / 2.0, y, "24px sans-serif", "#ffd700", "center");
        ctx.set_global_alpha(1.0);
    }
}

fn fill(ctx: &CanvasRenderingContext2d, color: &str) {
    ctx.set_fill_style(&JsValue::from_str(color));
}

fn text(ctx: &CanvasRenderingContext2d, s: &str, x: f64, y: f64, font: &str, color: &str, align: &str) {
    ctx.set_font(font);
    ctx.set_text_align(align);
    fill(ctx, color);
    ctx.fill_text(s, x, y).ok();
}

fn background(ctx: &CanvasRenderingContext2d, top: &str, bottom: &str) {
    let grad = ctx.create_linear_gradient(0.0, 0.0, 0.0, CANVAS_H);
    grad.add_color_stop(0.0, top).ok();
    grad.add_color_stop(1.0, bottom).ok();
    ctx.set_fill_style(&grad);
    ctx.fill_rect(0.0, 0.0, CANVAS_W, CANVAS_H);
}

fn draw_button(ctx: &CanvasRenderingContext2d, b: &Button) {
    fill(ctx, if b.enabled { b.color } else { "#999999" });
    ctx.fill_rect(b.x - b.w / 2.0, b.y - b.h / 2.0, b.w, b.h);
    let label_y = if b.h > 60.0 { b.y + b.h / 2.0 - 14.0 } else { b.y + 8.0 };
    text(ctx, &b.label, b.x, label_y, "20px sans-serif", "#ffffff", "center");
}

fn draw_title<S: KeyValueStore>(ctx: &CanvasRenderingContext2d, game: &Game<S>) {
    background(ctx, "#ffe4e1", "#87ceeb");
    let stats = game.stats().load();
    text(ctx, "Subaru Runner", CANVAS_W / 2.0, 150.0, "bold 56px sans-serif", "#ff6b35", "center");
    text(ctx, &format!("Coins: {}", stats.coins), 20.0, 40.0, "22px sans-serif", "#b8860b", "left");
    let current = game.current_character();
    text(ctx, &format!("Character: {}", current.name), 20.0, 70.0, "18px sans-serif", "#333", "left");
    text(
        ctx,
        &format!(
            "Plays {}  ·  Best {}m  ·  Total {}m",
            stats.total_plays, stats.highest_distance, stats.total_distance
        ),
        CANVAS_W / 2.0,
        230.0,
        "18px sans-serif",
        "#555",
        "center",
    );
    text(ctx, "Left tap: jump  /  Right tap: accelerate", CANVAS_W / 2.0, 270.0, "16px sans-serif", "#666", "center");
}

fn draw_select(ctx: &CanvasRenderingContext2d) {
    background(ctx, "#fff8dc", "#ffe4e1");
    text(ctx, "Choose your character", CANVAS_W / 2.0, 60.0, "bold 32px sans-serif", "#ff69b4", "center");
    for (i, c) in CHARACTERS.iter().enumerate() {
        let col = (i % 4) as f64;
        let row = (i / 4) as f64;
        let x = 130.0 + col * 180.0;
        let y = 190.0 + row * 190.0;
        text(ctx, c.rarity.label(), x, y - 55.0, "14px sans-serif", "#ffffff", "center");
        text(ctx, &format!("SPD {:.1}  JMP {:.1}", c.speed, c.jump), x, y - 25.0, "14px sans-serif", "#ffffff", "center");
        if let Some(sp) = c.special {
            text(ctx, sp.description(), x, y + 5.0, "12px sans-serif", "#ffffff", "center");
        }
        if let Some(cond) = c.unlock_condition {
            text(ctx, cond, x, y + 30.0, "12px sans-serif", "#ffffff", "center");
        }
    }
}

fn draw_gacha<S: KeyValueStore>(
    ctx: &CanvasRenderingContext2d,
    game: &Game<S>,
    last: Option<&'static Character>,
) {
    background(ctx, "#4b0082", "#9400d3");
    text(ctx, "Character Gacha", CANVAS_W / 2.0, 70.0, "bold 36px sans-serif", "#ffd700", "center");
    let coins = game.stats().load().coins;
    text(ctx, &format!("Coins: {coins}"), CANVAS_W / 2.0, 120.0, "24px sans-serif", "#ffd700", "center");
    if let Some(c) = last {
        fill(ctx, c.rarity.color());
        ctx.fill_rect(CANVAS_W / 2.0 - 100.0, 150.0, 200.0, 220.0);
        text(ctx, c.name, CANVAS_W / 2.0, 260.0, "bold 22px sans-serif", "#ffffff", "center");
        text(ctx, c.rarity.label(), CANVAS_W / 2.0, 295.0, "18px sans-serif", "#ffffff", "center");
    }
}

fn draw_run(ctx: &CanvasRenderingContext2d, run: &RunState) {
    fill(ctx, "#87ceeb");
    ctx.fill_rect(0.0, 0.0, CANVAS_W, CANVAS_H);
    fill(ctx, "#8fbc8f");
    ctx.fill_rect(0.0, GROUND_Y, CANVAS_W, CANVAS_H - GROUND_Y);

    for e in run.entities() {
        let (w, h) = e.kind.size();
        let color = match e.kind {
            EntityKind::Obstacle => "#8b4513",
            EntityKind::Item => "#ffeb3b",
            EntityKind::GoldenItem => "#ffd700",
            EntityKind::Bomb => "#222222",
        };
        fill(ctx, color);
        ctx.fill_rect(e.x - w / 2.0, GROUND_Y - e.y - h, w, h);
    }

    // Blink while invulnerable.
    let blink = run.is_invulnerable() && (run.remaining_secs() % 2 == 0);
    ctx.set_global_alpha(if blink { 0.5 } else { 1.0 });
    fill(ctx, run.character().rarity.color());
    let (pw, ph) = PLAYER_SIZE;
    ctx.fill_rect(run.x() - pw / 2.0, GROUND_Y - run.y() - ph, pw, ph);
    ctx.set_global_alpha(1.0);

    text(ctx, &format!("Score: {}", run.score()), 16.0, 36.0, "24px sans-serif", "#000", "left");
    text(ctx, &format!("Combo: x{:.1}", run.combo()), 16.0, 66.0, "20px sans-serif", "#000", "left");
    text(ctx, &format!("Distance: {}m", run.distance().floor()), 16.0, 96.0, "20px sans-serif", "#000", "left");
    text(ctx, &format!("Coins: {}", run.coins()), 16.0, 126.0, "20px sans-serif", "#b8860b", "left");
    text(ctx, &format!("Time: {}", run.remaining_secs()), CANVAS_W - 16.0, 36.0, "24px sans-serif", "#000", "right");
    text(ctx, "Left: jump / Right: accelerate", CANVAS_W / 2.0, 30.0, "16px sans-serif", "#666", "center");
}

fn draw_result<S: KeyValueStore>(ctx: &CanvasRenderingContext2d, game: &Game<S>) {
    background(ctx, "#ffe4e1", "#fff8dc");
    let Screen::Result(r) = game.screen() else { return };
    let s = r.summary;
    let cx = CANVAS_W / 2.0;
    text(ctx, "RESULT", cx, 70.0, "bold 48px sans-serif", "#ff69b4", "center");
    text(ctx, &format!("SCORE: {}", s.score), cx, 130.0, "bold 34px sans-serif", "#ff6b35", "center");
    text(ctx, &format!("Distance: {}m   Coins: +{}", s.distance, s.coins), cx, 170.0, "22px sans-serif", "#666", "center");
    let tps = r.taps_per_second(game.config().duration_secs);
    text(ctx, &format!("Taps: {} ({:.1}/s)", s.taps, tps), cx, 200.0, "22px sans-serif", "#666", "center");

    draw_board(ctx, "High Scores", &game.personal_ranking().top_n(5), 200.0, r.registered_name.as_deref(), s.score);
    draw_board(ctx, "Online Ranking", &game.shared_ranking().top_n(5), 600.0, r.registered_name.as_deref(), s.score);
    if let (Some(rank), Some(_)) = (game.shared_rank(), r.registered_name.as_ref()) {
        if rank > 5 {
            text(ctx, &format!("Your rank: #{rank}"), 600.0, 580.0, "bold 16px sans-serif", "#ff6b35", "center");
        }
    }
}

fn draw_board(ctx: &CanvasRenderingContext2d, title: &str, rows: &[RankingEntry], x: f64, me: Option<&str>, score: u64) {
    text(ctx, title, x, 390.0, "bold 20px sans-serif", "#ff69b4", "center");
    for (i, e) in rows.iter().enumerate() {
        let mine = me == Some(e.name.as_str()) && e.score == score;
        let color = if mine { "#ff6b35" } else { "#555" };
        let y = 420.0 + i as f64 * 28.0;
        text(ctx, &format!("{}. {}", i + 1, e.name), x - 150.0, y, "16px sans-serif", color, "left");
        text(ctx, &e.score.to_string(), x + 150.0, y, "16px sans-serif", color, "right");
    }
}

