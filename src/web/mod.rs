//! Browser shell: DOM, canvas and audio wiring around the session controller.
//!
//! All callbacks share one `Rc<RefCell<App>>`. The page may provide the
//! elements itself (matched by id); anything missing is created on the fly so
//! a bare page still works.

mod audio;
mod editor;
mod storage;

pub use editor::start_editor;
pub use storage::LocalStorageStore;

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use js_sys::Promise;
use log::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlAudioElement, HtmlCanvasElement,
    HtmlElement, HtmlSelectElement, MouseEvent, Response, window,
};

use crate::chart::Chart;
use crate::clock::PlaybackClock;
use crate::config::GameConfig;
use crate::error::ChartError;
use crate::judge::JudgeEvent;
use crate::ranking::{KeyValueStore, MemoryStore};
use crate::render::{self, Layout, Overlays};
use crate::session::{Session, SessionState};

use audio::HitSound;

type Clock = PlaybackClock<Box<dyn Fn() -> f64>>;
type Shared = Rc<RefCell<App>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

struct App {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    menu: HtmlElement,
    select: HtmlSelectElement,
    hud_score: Element,
    hud_judge: Element,
    result: HtmlElement,
    result_body: Element,
    layout: Layout,
    miss_window_ms: f64,
    session: Session,
    clock: Option<Clock>,
    track: Option<HtmlAudioElement>,
    /// Set when the platform refused playback; the session then ends on the
    /// wall clock instead of the (never firing) `ended` event.
    silent_end_ms: Option<f64>,
    hit_sound: HitSound,
}

pub(crate) fn performance_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Run `ok` or `err` once `promise` settles.
pub(crate) fn settle(
    promise: &Promise,
    ok: impl FnOnce(JsValue) + 'static,
    err: impl FnOnce(JsValue) + 'static,
) {
    let mut ok = Some(ok);
    let mut err = Some(err);
    let resolve = Closure::wrap(Box::new(move |v: JsValue| {
        if let Some(f) = ok.take() {
            f(v);
        }
    }) as Box<dyn FnMut(JsValue)>);
    let reject = Closure::wrap(Box::new(move |e: JsValue| {
        if let Some(f) = err.take() {
            f(e);
        }
    }) as Box<dyn FnMut(JsValue)>);
    let _ = promise.then2(&resolve, &reject);
    resolve.forget();
    reject.forget();
}

/// Drive `tick` from `requestAnimationFrame` for the lifetime of the page.
pub(crate) fn request_frames(mut tick: impl FnMut(f64) + 'static) {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        tick(ts);
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

pub(crate) fn listen<E: JsCast + 'static>(
    target: &web_sys::EventTarget,
    kind: &str,
    mut handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move |evt: web_sys::Event| {
        if let Ok(evt) = evt.dyn_into::<E>() {
            handler(evt);
        }
    }) as Box<dyn FnMut(web_sys::Event)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Find `id`, or create it as a `tag` under `parent`.
pub(crate) fn ensure_element(
    doc: &Document,
    parent: &Element,
    id: &str,
    tag: &str,
) -> Result<Element, JsValue> {
    if let Some(el) = doc.get_element_by_id(id) {
        return Ok(el);
    }
    let el = doc.create_element(tag)?;
    el.set_id(id);
    parent.append_child(&el)?;
    Ok(el)
}

/// Canvas-local pointer coordinates.
pub(crate) fn canvas_point(canvas: &HtmlCanvasElement, evt: &MouseEvent) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    (
        evt.client_x() as f64 - rect.left(),
        evt.client_y() as f64 - rect.top(),
    )
}

pub fn start_game(config: GameConfig) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body: Element = doc
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .into();

    let menu: HtmlElement = ensure_element(&doc, &body, "menu", "div")?.dyn_into()?;
    let select: HtmlSelectElement =
        ensure_element(&doc, &menu, "chartSelect", "select")?.dyn_into()?;
    let start_btn = ensure_element(&doc, &menu, "startBtn", "button")?;
    if start_btn.text_content().unwrap_or_default().is_empty() {
        start_btn.set_text_content(Some("Start"));
    }
    let hud = ensure_element(&doc, &body, "hud", "div")?;
    let hud_score = ensure_element(&doc, &hud, "score", "span")?;
    let hud_judge = ensure_element(&doc, &hud, "judge", "span")?;
    let canvas: HtmlCanvasElement =
        ensure_element(&doc, &body, "gameCanvas", "canvas")?.dyn_into()?;
    if canvas.width() == 300 && canvas.height() == 150 {
        // browser default size: the page did not set one
        canvas.set_width(config.canvas_width);
        canvas.set_height(config.canvas_height);
    }
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    let result: HtmlElement = ensure_element(&doc, &body, "result", "div")?.dyn_into()?;
    let result_body = ensure_element(&doc, &result, "resultBody", "div")?;
    let back_btn = ensure_element(&doc, &result, "backBtn", "button")?;
    if back_btn.text_content().unwrap_or_default().is_empty() {
        back_btn.set_text_content(Some("Back to song select"));
    }
    for entry in &config.charts {
        let option = doc.create_element("option")?;
        option.set_attribute("value", &entry.file)?;
        option.set_text_content(Some(&entry.name));
        select.append_child(&option)?;
    }

    let store: Box<dyn KeyValueStore> = match LocalStorageStore::from_window() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("ranking kept in memory only: {e}");
            Box::new(MemoryStore::new())
        }
    };
    let session = Session::new(
        config.judge_params(),
        store,
        config.ranking_key.clone(),
        config.ranking_len,
    );

    let app: Shared = Rc::new(RefCell::new(App {
        canvas: canvas.clone(),
        ctx,
        menu,
        select,
        hud_score,
        hud_judge,
        result,
        result_body,
        layout: Layout {
            hit_radius: config.hit_radius,
            max_radius: config.max_approach_radius,
            approach_ms: config.approach_ms,
        },
        miss_window_ms: config.windows.miss,
        session,
        clock: None,
        track: None,
        silent_end_ms: None,
        hit_sound: HitSound::load(&config.hit_sound),
    }));
    {
        let a = app.borrow();
        a.sync_overlays();
        a.refresh_hud();
    }

    {
        let app = app.clone();
        listen(&start_btn, "click", move |_: MouseEvent| {
            let url = app.borrow().select.value();
            if url.is_empty() {
                return;
            }
            start_chart(&app, url);
        })?;
    }
    {
        let app = app.clone();
        listen(&canvas, "click", move |evt: MouseEvent| {
            let mut app = app.borrow_mut();
            if app.session.state() != SessionState::Playing {
                return;
            }
            let (x, y) = canvas_point(&app.canvas, &evt);
            let now = app.clock.as_mut().map(|c| c.elapsed_ms()).unwrap_or(0.0);
            app.session.queue_click(x, y, now);
        })?;
    }
    {
        let app = app.clone();
        listen(&back_btn, "click", move |_: MouseEvent| {
            app.borrow_mut().return_to_menu();
        })?;
    }
    {
        let app = app.clone();
        request_frames(move |_ts| app.borrow_mut().tick());
    }
    info!("game ready with {} charts", config.charts.len());
    Ok(())
}

fn start_chart(app: &Shared, url: String) {
    {
        let mut a = app.borrow_mut();
        if let Err(e) = a.session.begin_loading() {
            warn!("start ignored: {e}");
            return;
        }
        a.hit_sound.resume();
        a.sync_overlays();
        a.refresh_hud();
    }
    let Some(win) = window() else {
        return;
    };
    let request = win.fetch_with_str(&url);
    let on_ok = {
        let app = app.clone();
        let url = url.clone();
        move |resp: JsValue| {
            if let Err(e) = read_chart(&app, &url, resp) {
                fail_loading(&app, e);
            }
        }
    };
    let on_err = {
        let app = app.clone();
        move |e: JsValue| {
            fail_loading(
                &app,
                ChartError::Fetch {
                    url,
                    reason: format!("{e:?}"),
                },
            );
        }
    };
    settle(&request, on_ok, on_err);
}

fn read_chart(app: &Shared, url: &str, resp: JsValue) -> Result<(), ChartError> {
    let fetch_err = |e: JsValue| ChartError::Fetch {
        url: url.to_string(),
        reason: format!("{e:?}"),
    };
    let resp: Response = resp.dyn_into().map_err(fetch_err)?;
    if !resp.ok() {
        return Err(ChartError::FetchStatus {
            url: url.to_string(),
            status: resp.status(),
        });
    }
    let body = resp.text().map_err(fetch_err)?;
    let on_text = {
        let app = app.clone();
        move |text: JsValue| {
            let parsed = Chart::from_json(&text.as_string().unwrap_or_default());
            match parsed {
                Ok(chart) => prepare_track(&app, chart),
                Err(e) => fail_loading(&app, e),
            }
        }
    };
    let on_err = {
        let app = app.clone();
        let url = url.to_string();
        move |e: JsValue| {
            fail_loading(
                &app,
                ChartError::Fetch {
                    url,
                    reason: format!("{e:?}"),
                },
            )
        }
    };
    settle(&body, on_text, on_err);
    Ok(())
}

/// Wire the track element; playback starts once it can play.
fn prepare_track(app: &Shared, chart: Chart) {
    let audio_url = chart.audio.clone();
    let wired = HtmlAudioElement::new_with_src(&audio_url)
        .and_then(|track| wire_track(app, &track, chart).map(|_| track));
    match wired {
        Ok(track) => app.borrow_mut().track = Some(track),
        Err(e) => fail_loading(
            app,
            ChartError::Decode {
                url: audio_url,
                reason: format!("{e:?}"),
            },
        ),
    }
}

fn wire_track(app: &Shared, track: &HtmlAudioElement, chart: Chart) -> Result<(), JsValue> {
    let url = chart.audio.clone();
    // `canplay` may fire again after seeking; only the first one starts play
    let mut chart = Some(chart);
    {
        let app = app.clone();
        let track_el = track.clone();
        listen(track, "canplay", move |_: web_sys::Event| {
            if let Some(chart) = chart.take() {
                begin_playback(&app, &track_el, chart);
            }
        })?;
    }
    {
        let app = app.clone();
        listen(track, "error", move |_: web_sys::Event| {
            if app.borrow().session.state() == SessionState::Loading {
                fail_loading(
                    &app,
                    ChartError::Decode {
                        url: url.clone(),
                        reason: "media element error".to_string(),
                    },
                );
            } else {
                warn!("track '{url}' reported an error during play");
            }
        })?;
    }
    {
        let app = app.clone();
        listen(track, "ended", move |_: web_sys::Event| {
            app.borrow_mut().end_session();
        })?;
    }
    Ok(())
}

fn begin_playback(app: &Shared, track: &HtmlAudioElement, chart: Chart) {
    let fallback_end = {
        let duration = track.duration();
        if duration.is_finite() && duration > 0.0 {
            duration * 1000.0
        } else {
            let miss = app.borrow().miss_window_ms;
            chart.last_note_time().unwrap_or(0.0) + miss
        }
    };
    {
        let mut a = app.borrow_mut();
        // stale track from an aborted attempt
        if a.track.as_ref() != Some(track) || a.session.start_playing(chart).is_err() {
            return;
        }
        let position = track.clone();
        let source: Box<dyn Fn() -> f64> = Box::new(move || position.current_time() * 1000.0);
        a.clock = Some(PlaybackClock::with_origin(source, 0.0));
        a.silent_end_ms = None;
        a.sync_overlays();
    }
    match track.play() {
        Ok(promise) => {
            let app = app.clone();
            settle(
                &promise,
                |_| {},
                move |e| {
                    warn!("audio playback refused, continuing on wall clock: {e:?}");
                    let mut a = app.borrow_mut();
                    let wall: Box<dyn Fn() -> f64> = Box::new(performance_now);
                    a.clock = a.clock.take().map(|c| c.rebase(wall));
                    a.silent_end_ms = Some(fallback_end);
                },
            );
        }
        Err(e) => warn!("audio playback unavailable: {e:?}"),
    }
}

fn fail_loading(app: &Shared, cause: ChartError) {
    {
        let mut a = app.borrow_mut();
        if a.session.abort_loading(&cause).is_err() {
            return;
        }
        a.track = None;
        a.clock = None;
        a.sync_overlays();
    }
    if let Some(w) = window() {
        let _ = w.alert_with_message(&format!("Failed to load chart: {cause}"));
    }
}

impl App {
    fn tick(&mut self) {
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;
        self.ctx.clear_rect(0.0, 0.0, width, height);
        if self.session.state() != SessionState::Playing {
            return;
        }
        let now = self.clock.as_mut().map(|c| c.elapsed_ms()).unwrap_or(0.0);
        for event in self.session.frame(now) {
            if let JudgeEvent::Hit { .. } = event {
                self.hit_sound.play();
            }
        }
        let circles = self.layout.circles(&self.session.visible(now));
        for circle in &circles {
            self.draw_circle(circle);
        }
        self.refresh_hud();
        if self.silent_end_ms.is_some_and(|end| now >= end) {
            self.end_session();
        }
    }

    fn draw_circle(&self, c: &render::ApproachCircle) {
        let ctx = &self.ctx;
        ctx.begin_path();
        if ctx.arc(c.x, c.y, c.radius, 0.0, TAU).is_ok() {
            ctx.set_stroke_style_str("rgba(0,200,255,0.6)");
            ctx.set_line_width(3.0);
            ctx.stroke();
        }
        ctx.begin_path();
        if ctx.arc(c.x, c.y, c.target_radius, 0.0, TAU).is_ok() {
            ctx.set_fill_style_str("rgba(255,255,255,0.05)");
            ctx.fill();
            ctx.set_line_width(2.0);
            ctx.set_stroke_style_str("rgba(255,255,255,0.12)");
            ctx.stroke();
        }
    }

    fn refresh_hud(&self) {
        let stats = self.session.stats();
        self.hud_score
            .set_text_content(Some(&render::score_text(&stats)));
        self.hud_judge
            .set_text_content(Some(&render::judge_text(&stats)));
    }

    fn end_session(&mut self) {
        let now = self.clock.as_mut().map(|c| c.elapsed_ms()).unwrap_or(0.0);
        let stats = match self.session.finish(now) {
            Ok(stats) => stats.clone(),
            Err(e) => {
                warn!("end ignored: {e}");
                return;
            }
        };
        self.silent_end_ms = None;
        self.refresh_hud();
        let mut html = format!(
            "<h2>Result</h2><p>{}</p><p>{}</p><p>Accuracy: {:.2}%</p>",
            render::score_text(&stats),
            render::tally_text(&stats),
            stats.accuracy()
        );
        let lines = render::ranking_lines(self.session.ranking());
        if !lines.is_empty() {
            html.push_str("<h3>Ranking</h3><ol>");
            for line in &lines {
                html.push_str(&format!("<li>{line}</li>"));
            }
            html.push_str("</ol>");
        }
        self.result_body.set_inner_html(&html);
        self.sync_overlays();
    }

    fn return_to_menu(&mut self) {
        if let Err(e) = self.session.acknowledge() {
            warn!("back ignored: {e}");
            return;
        }
        self.track = None;
        self.clock = None;
        self.sync_overlays();
        self.refresh_hud();
    }

    fn sync_overlays(&self) {
        let shown = Overlays::for_state(self.session.state());
        self.menu.set_hidden(!shown.menu);
        self.result.set_hidden(!shown.result);
    }
}
