//! `HtmlAudioElement` audio backend.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use character_animation_core::{AudioBackend, AudioClip, ResourceError};
use futures_util::future::LocalBoxFuture;
use js_sys::Promise;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::HtmlAudioElement;

use crate::describe;

#[derive(Clone, Copy, Debug, Default)]
pub struct WebAudio;

/// One `<audio>` element. Duplicates are made with `cloneNode`.
pub struct HtmlAudioClip {
    url: String,
    el: HtmlAudioElement,
    /// Set by the play-promise handler when the browser refuses playback.
    rejected: Rc<Cell<bool>>,
}

impl HtmlAudioClip {
    fn new(url: String, el: HtmlAudioElement) -> Self {
        Self {
            url,
            el,
            rejected: Rc::new(Cell::new(false)),
        }
    }
}

impl AudioClip for HtmlAudioClip {
    fn duplicate(&self) -> Result<Self, ResourceError> {
        let failed = |reason: String| ResourceError::LoadFailed {
            url: self.url.clone(),
            reason,
        };
        let node = self.el.clone_node().map_err(|e| failed(describe(&e)))?;
        let el = node
            .dyn_into::<HtmlAudioElement>()
            .map_err(|_| failed("cloned node is not an audio element".into()))?;
        Ok(Self::new(self.url.clone(), el))
    }

    fn set_volume(&mut self, volume: f32) {
        self.el.set_volume(f64::from(volume));
    }

    fn set_position(&mut self, position_sec: f64) {
        self.el.set_current_time(position_sec);
    }

    /// A synchronous refusal is returned. An asynchronous rejection of the
    /// play promise pauses this element and marks it discarded.
    fn play(&mut self) -> Result<(), ResourceError> {
        let promise = self
            .el
            .play()
            .map_err(|e| ResourceError::PlaybackRejected {
                url: self.url.clone(),
                reason: describe(&e),
            })?;
        let el = self.el.clone();
        let url = self.url.clone();
        let rejected = self.rejected.clone();
        spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                rejected.set(true);
                let _ = el.pause();
                log::warn!(
                    "{}",
                    ResourceError::PlaybackRejected {
                        url,
                        reason: describe(&err),
                    }
                );
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.el.pause();
    }

    fn is_playing(&self) -> bool {
        !self.el.paused()
    }

    fn is_discarded(&self) -> bool {
        self.rejected.get()
    }
}

impl AudioBackend for WebAudio {
    type Clip = HtmlAudioClip;

    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<HtmlAudioClip, ResourceError>> {
        let url = url.to_string();
        Box::pin(async move {
            let failed = |e: &wasm_bindgen::JsValue| ResourceError::LoadFailed {
                url: url.clone(),
                reason: describe(e),
            };
            let el = HtmlAudioElement::new_with_src(&url).map_err(|e| failed(&e))?;
            el.set_preload("auto");
            let ready = Promise::new(&mut |resolve, reject| {
                let _ = el.add_event_listener_with_callback("canplaythrough", &resolve);
                let _ = el.add_event_listener_with_callback("error", &reject);
            });
            el.load();
            JsFuture::from(ready).await.map_err(|e| failed(&e))?;
            Ok(HtmlAudioClip::new(url, el))
        })
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let ms = duration.as_millis().min(i32::MAX as u128) as i32;
        Box::pin(async move {
            let timer = Promise::new(&mut |resolve, _reject| {
                match web_sys::window() {
                    Some(window) => {
                        let _ = window
                            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
                    }
                    None => log::warn!("no window: audio preload timeout cannot fire"),
                }
            });
            let _ = JsFuture::from(timer).await;
        })
    }
}
