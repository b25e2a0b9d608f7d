//! Recorder page: play a reference track and click along to place notes.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use log::{error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Element, HtmlAudioElement, HtmlCanvasElement, MouseEvent, window};

use super::{canvas_point, ensure_element, listen, request_frames, settle};
use crate::editor::Recorder;

struct EditorPage {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    track: HtmlAudioElement,
    notes_list: Element,
    recorder: Recorder,
}

impl EditorPage {
    fn toggle(&mut self) {
        if self.recorder.is_playing() {
            if let Err(e) = self.track.pause() {
                warn!("pause failed: {e:?}");
            }
            self.recorder.set_playing(false);
            return;
        }
        self.recorder.set_playing(true);
        match self.track.play() {
            Ok(promise) => settle(
                &promise,
                |_| {},
                |e| warn!("reference track refused to play: {e:?}"),
            ),
            Err(e) => warn!("reference track unavailable: {e:?}"),
        }
    }

    fn export(&self) {
        match self.recorder.export_json() {
            Ok(json) => {
                self.notes_list.set_text_content(Some(&json));
                info!("exported {} notes:\n{json}", self.recorder.notes().len());
                if let Some(w) = window() {
                    let _ = w.alert_with_message("Chart JSON written to the page and the console.");
                }
            }
            Err(e) => error!("export failed: {e}"),
        }
    }

    fn record(&mut self, evt: &MouseEvent) {
        let (x, y) = canvas_point(&self.canvas, evt);
        let time = self.track.current_time() * 1000.0;
        if self.recorder.record(time, x, y) {
            self.notes_list
                .set_text_content(Some(&self.recorder.listing()));
        }
    }

    fn draw(&self) {
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;
        let ctx = &self.ctx;
        ctx.clear_rect(0.0, 0.0, width, height);

        for note in self.recorder.notes() {
            ctx.begin_path();
            if ctx.arc(note.x, note.y, 10.0, 0.0, TAU).is_ok() {
                ctx.set_fill_style_str("cyan");
                ctx.fill();
                ctx.set_stroke_style_str("white");
                ctx.stroke();
            }
        }

        // playhead
        let duration = self.track.duration();
        if self.recorder.is_playing() && duration.is_finite() && duration > 0.0 {
            let bar_x = self.track.current_time() / duration * width;
            ctx.begin_path();
            ctx.move_to(bar_x, 0.0);
            ctx.line_to(bar_x, height);
            ctx.set_stroke_style_str("red");
            ctx.set_line_width(2.0);
            ctx.stroke();
        }
    }
}

pub fn start_editor(track_url: &str) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body: Element = doc
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .into();

    let canvas: HtmlCanvasElement =
        ensure_element(&doc, &body, "gameCanvas", "canvas")?.dyn_into()?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    let play_btn = ensure_element(&doc, &body, "btnPlayPause", "button")?;
    let export_btn = ensure_element(&doc, &body, "btnExport", "button")?;
    for (btn, label) in [(&play_btn, "Play / Pause"), (&export_btn, "Export")] {
        if btn.text_content().unwrap_or_default().is_empty() {
            btn.set_text_content(Some(label));
        }
    }
    let notes_list = ensure_element(&doc, &body, "notesList", "pre")?;
    let track = HtmlAudioElement::new_with_src(track_url)?;

    let page = Rc::new(RefCell::new(EditorPage {
        canvas: canvas.clone(),
        ctx,
        track: track.clone(),
        notes_list,
        recorder: Recorder::new(),
    }));

    {
        let page = page.clone();
        listen(&play_btn, "click", move |_: MouseEvent| page.borrow_mut().toggle())?;
    }
    {
        let page = page.clone();
        listen(&export_btn, "click", move |_: MouseEvent| page.borrow().export())?;
    }
    {
        let page = page.clone();
        listen(&canvas, "click", move |evt: MouseEvent| page.borrow_mut().record(&evt))?;
    }
    {
        let page = page.clone();
        listen(&track, "ended", move |_: web_sys::Event| {
            page.borrow_mut().recorder.set_playing(false);
        })?;
    }
    {
        let page = page.clone();
        request_frames(move |_ts| page.borrow().draw());
    }
    info!("recorder ready for '{track_url}'");
    Ok(())
}
