use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Promise, JSON};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;

use character_animation_core::{
    parse_sequence_json, AnimatorConfig, CharacterAnimator, CharacterDefinition,
    CharacterDocument, PlaybackState, Sequence, SoundWindowOptions,
};

pub mod audio;
pub mod dom;
pub mod logger;

pub use audio::{HtmlAudioClip, WebAudio};
pub use dom::DomSink;
pub use logger::set_log_level;

type Animator = CharacterAnimator<WebAudio, DomSink>;

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(v: &JsValue) -> String {
    v.as_string().unwrap_or_else(|| format!("{v:?}"))
}

fn sequence_from_js(value: &JsValue, op: &str) -> Result<Sequence, JsError> {
    if jsvalue_is_undefined_or_null(value) {
        return Err(JsError::new(&format!("{op}: sequence is null/undefined")));
    }
    // Stringify so the core parser reports track/event errors by name.
    let text = JSON::stringify(value)
        .map_err(|e| JsError::new(&format!("{op} stringify error: {}", describe(&e))))?
        .as_string()
        .ok_or_else(|| JsError::new(&format!("{op}: stringify produced non-string")))?;
    parse_sequence_json(&text).map_err(|e| JsError::new(&format!("{op} sequence error: {e}")))
}

struct Inner {
    animator: Animator,
    frame: Option<Closure<dyn FnMut(f64)>>,
    raf_id: Option<i32>,
    last_frame_ms: Option<f64>,
}

impl Inner {
    fn schedule_frame(&mut self) {
        if self.raf_id.is_some() {
            return;
        }
        let (Some(window), Some(frame)) = (web_sys::window(), self.frame.as_ref()) else {
            return;
        };
        match window.request_animation_frame(frame.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id = Some(id),
            Err(err) => log::warn!("requestAnimationFrame failed: {}", describe(&err)),
        }
    }

    fn cancel_frame(&mut self) {
        if let (Some(id), Some(window)) = (self.raf_id.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
        self.last_frame_ms = None;
    }

    fn sync_loop(&mut self) {
        if self.animator.playback_state() == Some(PlaybackState::Playing) {
            self.schedule_frame();
        } else {
            self.cancel_frame();
        }
    }
}

fn on_frame(weak: &Weak<RefCell<Inner>>, timestamp_ms: f64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let mut s = inner.borrow_mut();
    s.raf_id = None;
    let dt = s
        .last_frame_ms
        .map_or(0.0, |last| ((timestamp_ms - last) / 1000.0).max(0.0));
    s.last_frame_ms = Some(timestamp_ms);
    if let Err(err) = s.animator.tick(dt) {
        log::warn!("frame skipped: {err}");
        return;
    }
    s.sync_loop();
}

/// Browser host for a character animator: renders into DOM handles, plays
/// audio through `<audio>` elements and ticks on `requestAnimationFrame`.
#[wasm_bindgen]
pub struct WebCharacterAnimator {
    inner: Rc<RefCell<Inner>>,
}

#[wasm_bindgen]
impl WebCharacterAnimator {
    /// Validate inputs and build the animator. Call `init()` before playback.
    /// Example:
    ///   new WebCharacterAnimator(sequence, { mouth: img, leftEye: img }, character)
    #[wasm_bindgen(constructor)]
    pub fn new(
        sequence: JsValue,
        handles: JsValue,
        character: JsValue,
        config: JsValue,
    ) -> Result<WebCharacterAnimator, JsError> {
        console_error_panic_hook::set_once();

        let cfg: AnimatorConfig = if jsvalue_is_undefined_or_null(&config) {
            AnimatorConfig::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };
        let sequence = sequence_from_js(&sequence, "constructor")?;
        let document: CharacterDocument = swb::from_value(character)
            .map_err(|e| JsError::new(&format!("character parse error: {e}")))?;
        let character = CharacterDefinition::try_from(document)
            .map_err(|e| JsError::new(&format!("character error: {e}")))?;
        let sink = DomSink::from_js(&handles);
        log::debug!("bound {} of 10 render roles", sink.bound_roles());

        let animator = CharacterAnimator::new(sequence, sink, character, WebAudio, cfg)
            .map_err(|e| JsError::new(&format!("animator error: {e}")))?;

        let inner = Rc::new(RefCell::new(Inner {
            animator,
            frame: None,
            raf_id: None,
            last_frame_ms: None,
        }));
        let weak = Rc::downgrade(&inner);
        let frame = Closure::wrap(Box::new(move |ts: f64| on_frame(&weak, ts)) as Box<dyn FnMut(f64)>);
        inner.borrow_mut().frame = Some(frame);
        Ok(WebCharacterAnimator { inner })
    }

    /// Preload audio and images, build the timeline and render time 0.
    /// Resolves once ready; load failures are logged, never rejected.
    #[wasm_bindgen]
    pub fn init(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let preload = inner.borrow().animator.begin_preload();
            let preloaded = preload.await;
            let mut s = inner.borrow_mut();
            s.cancel_frame();
            s.animator.finish_init(preloaded);
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Replace the sequence. Rejects if it is invalid; otherwise playback is
    /// reset and the promise resolves once new audio is preloaded.
    #[wasm_bindgen(js_name = updateSequence)]
    pub fn update_sequence(&self, sequence: JsValue) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let sequence = sequence_from_js(&sequence, "updateSequence")?;
            let preload = {
                let mut s = inner.borrow_mut();
                s.animator
                    .replace_sequence(sequence)
                    .map_err(|e| JsError::new(&format!("updateSequence error: {e}")))?;
                s.sync_loop();
                s.animator.begin_preload()
            };
            let preloaded = preload.await;
            inner.borrow_mut().animator.finish_update(preloaded);
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen]
    pub fn play(&self) -> Result<(), JsError> {
        let mut s = self.inner.borrow_mut();
        s.animator.play().map_err(|e| JsError::new(&e.to_string()))?;
        s.cancel_frame();
        s.sync_loop();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn pause(&self) -> Result<(), JsError> {
        let mut s = self.inner.borrow_mut();
        s.animator.pause().map_err(|e| JsError::new(&e.to_string()))?;
        s.sync_loop();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn resume(&self) -> Result<(), JsError> {
        let mut s = self.inner.borrow_mut();
        s.animator.resume().map_err(|e| JsError::new(&e.to_string()))?;
        s.sync_loop();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn seek(&self, time_sec: f64) -> Result<(), JsError> {
        let mut s = self.inner.borrow_mut();
        s.animator.seek(time_sec).map_err(|e| JsError::new(&e.to_string()))?;
        s.last_frame_ms = None;
        Ok(())
    }

    /// Stop audio, cancel the frame loop and drop the timeline.
    #[wasm_bindgen]
    pub fn dispose(&self) {
        let mut s = self.inner.borrow_mut();
        s.cancel_frame();
        s.frame = None;
        s.animator.dispose();
    }

    #[wasm_bindgen(js_name = durationSec)]
    pub fn duration_sec(&self) -> f64 {
        self.inner.borrow().animator.duration_sec()
    }

    /// Pose at `time_sec` as a plain object (snake_case fields).
    #[wasm_bindgen(js_name = samplePoseAtTime)]
    pub fn sample_pose_at_time(&self, time_sec: f64) -> Result<JsValue, JsError> {
        let pose = self.inner.borrow().animator.sample_pose_at_time(time_sec);
        swb::to_value(&pose).map_err(|e| JsError::new(&format!("pose error: {e}")))
    }

    /// Sound cues starting in `[startSec, endSec)` by default.
    /// `options` is `{ include_start?, include_end? }` or undefined.
    #[wasm_bindgen(js_name = soundEventsBetween)]
    pub fn sound_events_between(
        &self,
        start_sec: f64,
        end_sec: f64,
        options: JsValue,
    ) -> Result<JsValue, JsError> {
        let opts: SoundWindowOptions = if jsvalue_is_undefined_or_null(&options) {
            SoundWindowOptions::default()
        } else {
            swb::from_value(options).map_err(|e| JsError::new(&format!("options error: {e}")))?
        };
        let s = self.inner.borrow();
        let events = s.animator.sound_events_between(start_sec, end_sec, opts);
        swb::to_value(&events).map_err(|e| JsError::new(&format!("sound events error: {e}")))
    }

    /// `"uninitialized"`, `"stopped"`, `"playing"`, `"paused"` or `"ended"`.
    #[wasm_bindgen(js_name = playbackState)]
    pub fn playback_state(&self) -> String {
        self.inner
            .borrow()
            .animator
            .playback_state()
            .map_or("uninitialized", |state| state.name())
            .to_string()
    }

    #[wasm_bindgen(js_name = positionSec)]
    pub fn position_sec(&self) -> f64 {
        self.inner.borrow().animator.position_sec()
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
