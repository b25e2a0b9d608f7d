//! Hit sound playback through Web Audio for low latency.
//! The sound is optional: until it has decoded, `play()` does nothing.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::ArrayBuffer;
use log::{debug, error, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AudioBuffer, AudioContext, Response};

use super::settle;

pub struct HitSound {
    ctx: Option<AudioContext>,
    buffer: Rc<RefCell<Option<AudioBuffer>>>,
}

impl HitSound {
    /// Start fetching and decoding `url` in the background.
    pub fn load(url: &str) -> Self {
        let buffer = Rc::new(RefCell::new(None));
        let ctx = match AudioContext::new() {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("Web Audio unavailable, hit sound disabled: {e:?}");
                return Self { ctx: None, buffer };
            }
        };
        if let Some(win) = web_sys::window() {
            let slot = buffer.clone();
            let decode_ctx = ctx.clone();
            let name = url.to_string();
            settle(
                &win.fetch_with_str(url),
                move |resp| {
                    if let Err(e) = decode_into(&decode_ctx, resp, slot) {
                        error!("hit sound '{name}' failed to load: {e:?}");
                    }
                },
                |e| error!("hit sound request failed: {e:?}"),
            );
        }
        Self {
            ctx: Some(ctx),
            buffer,
        }
    }

    /// Browsers create the context suspended until a user gesture; call this
    /// from one.
    pub fn resume(&self) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        match ctx.resume() {
            Ok(promise) => settle(&promise, |_| {}, |e| warn!("audio context stayed suspended: {e:?}")),
            Err(e) => warn!("audio context resume failed: {e:?}"),
        }
    }

    /// Fire and forget. Skipped silently while the buffer is still loading.
    pub fn play(&self) {
        let (Some(ctx), Some(buffer)) = (&self.ctx, self.buffer.borrow().clone()) else {
            return;
        };
        let started = ctx.create_buffer_source().and_then(|source| {
            source.set_buffer(Some(&buffer));
            source.connect_with_audio_node(&ctx.destination())?;
            source.start()
        });
        if let Err(e) = started {
            debug!("hit sound dropped: {e:?}");
        }
    }
}

fn decode_into(
    ctx: &AudioContext,
    resp: JsValue,
    slot: Rc<RefCell<Option<AudioBuffer>>>,
) -> Result<(), JsValue> {
    let resp: Response = resp.dyn_into()?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!("status {}", resp.status())));
    }
    let ctx = ctx.clone();
    settle(
        &resp.array_buffer()?,
        move |data| {
            let decoded = data
                .dyn_into::<ArrayBuffer>()
                .and_then(|data| ctx.decode_audio_data(&data));
            match decoded {
                Ok(promise) => settle(
                    &promise,
                    move |buf| match buf.dyn_into::<AudioBuffer>() {
                        Ok(buf) => {
                            debug!("hit sound ready ({:.2}s)", buf.duration());
                            *slot.borrow_mut() = Some(buf);
                        }
                        Err(e) => error!("hit sound decoded to unexpected value: {e:?}"),
                    },
                    |e| error!("hit sound decode failed: {e:?}"),
                ),
                Err(e) => error!("hit sound decode failed: {e:?}"),
            }
        },
        |e| error!("hit sound body unreadable: {e:?}"),
    );
    Ok(())
}
