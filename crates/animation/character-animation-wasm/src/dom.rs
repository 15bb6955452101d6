//! Render sink that writes poses straight into DOM element styles.

use character_animation_core::{BottomClip, ResourceError, RenderSink, Role, Transform};
use futures_util::future::LocalBoxFuture;
use hashbrown::HashMap;
use js_sys::{Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlElement, HtmlImageElement};

use crate::describe;

/// Element handles keyed by role. Roles without a handle are skipped.
pub struct DomSink {
    handles: HashMap<Role, HtmlElement>,
}

impl DomSink {
    /// Read `{ headClip: el, mouth: el, ... }`. Missing, null or non-element
    /// entries leave that role unbound.
    pub fn from_js(handles: &JsValue) -> Self {
        let mut bound = HashMap::new();
        if handles.is_undefined() || handles.is_null() {
            return Self { handles: bound };
        }
        for role in Role::ALL {
            let value = match Reflect::get(handles, &JsValue::from_str(role.as_str())) {
                Ok(v) if !(v.is_undefined() || v.is_null()) => v,
                _ => continue,
            };
            match value.dyn_into::<HtmlElement>() {
                Ok(el) => {
                    bound.insert(role, el);
                }
                Err(_) => log::warn!("handle '{}' is not an HTML element; ignored", role.as_str()),
            }
        }
        Self { handles: bound }
    }

    pub fn bound_roles(&self) -> usize {
        self.handles.len()
    }

    fn set_style(&self, role: Role, property: &str, value: &str) {
        if let Some(el) = self.handles.get(&role) {
            if let Err(err) = el.style().set_property(property, value) {
                log::debug!("{}.{property} rejected: {}", role.as_str(), describe(&err));
            }
        }
    }
}

impl RenderSink for DomSink {
    fn set_transform(&mut self, role: Role, transform: &Transform) {
        self.set_style(role, "transform", &transform.to_css());
    }

    fn set_visible(&mut self, role: Role, visible: bool) {
        self.set_style(role, "visibility", if visible { "visible" } else { "hidden" });
    }

    fn set_top(&mut self, role: Role, top_px: f64) {
        self.set_style(role, "top", &format!("{top_px}px"));
    }

    fn set_clip(&mut self, role: Role, clip: Option<BottomClip>) {
        match clip {
            Some(clip) => self.set_style(role, "clip-path", &clip.to_css()),
            None => {
                if let Some(el) = self.handles.get(&role) {
                    let _ = el.style().remove_property("clip-path");
                }
            }
        }
    }

    fn set_image(&mut self, role: Role, url: &str) {
        let Some(el) = self.handles.get(&role) else {
            return;
        };
        // Rewriting an unchanged src restarts decoding in some browsers.
        if el.get_attribute("src").as_deref() == Some(url) {
            return;
        }
        if let Err(err) = el.set_attribute("src", url) {
            log::debug!("{}.src rejected: {}", role.as_str(), describe(&err));
        }
    }

    fn preload_image(&self, url: &str) -> LocalBoxFuture<'static, Result<(), ResourceError>> {
        let url = url.to_string();
        Box::pin(async move {
            let img = HtmlImageElement::new().map_err(|e| ResourceError::LoadFailed {
                url: url.clone(),
                reason: describe(&e),
            })?;
            let loaded = Promise::new(&mut |resolve, reject| {
                img.set_onload(Some(&resolve));
                img.set_onerror(Some(&reject));
            });
            img.set_src(&url);
            let outcome = JsFuture::from(loaded).await;
            img.set_onload(None);
            img.set_onerror(None);
            outcome.map(|_| ()).map_err(|e| ResourceError::LoadFailed {
                url,
                reason: describe(&e),
            })
        })
    }
}
