#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use character_animation_core::{
    AudioBackend, AudioClip, BottomClip, ResourceError, RenderSink, Role, Transform,
};
use futures_util::future::{pending, ready, LocalBoxFuture};

/// Shared record of everything the mock audio layer did.
#[derive(Debug, Default)]
pub struct AudioLog {
    pub loads: Vec<String>,
    /// (url, volume, start position) for every successful play of a duplicate.
    pub plays: Vec<(String, f32, f64)>,
    pub stops: Vec<String>,
    pub pauses: Vec<String>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBehavior {
    Ready,
    Fail,
    /// Never resolves; only the timeout ends it.
    Hang,
}

#[derive(Clone, Default)]
pub struct MockAudio {
    pub log: Rc<RefCell<AudioLog>>,
    behaviors: Rc<RefCell<HashMap<String, LoadBehavior>>>,
    reject_play: Rc<RefCell<HashSet<String>>>,
    reject_later: Rc<RefCell<HashSet<String>>>,
}

impl MockAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(self, url: &str, behavior: LoadBehavior) -> Self {
        self.behaviors.borrow_mut().insert(url.to_string(), behavior);
        self
    }

    pub fn reject_play_of(&self, url: &str) {
        self.reject_play.borrow_mut().insert(url.to_string());
    }

    /// `play()` reports success, then the host rejects it, as a browser
    /// does through the play promise.
    pub fn reject_play_later_of(&self, url: &str) {
        self.reject_later.borrow_mut().insert(url.to_string());
    }

    pub fn plays(&self) -> Vec<(String, f32, f64)> {
        self.log.borrow().plays.clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.log.borrow().loads.clone()
    }
}

#[derive(Debug)]
pub struct MockClip {
    url: String,
    volume: f32,
    position: f64,
    playing: bool,
    discarded: bool,
    log: Rc<RefCell<AudioLog>>,
    reject_play: Rc<RefCell<HashSet<String>>>,
    reject_later: Rc<RefCell<HashSet<String>>>,
}

impl MockClip {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AudioClip for MockClip {
    fn duplicate(&self) -> Result<Self, ResourceError> {
        Ok(Self {
            url: self.url.clone(),
            volume: self.volume,
            position: 0.0,
            playing: false,
            discarded: false,
            log: self.log.clone(),
            reject_play: self.reject_play.clone(),
            reject_later: self.reject_later.clone(),
        })
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_position(&mut self, position_sec: f64) {
        self.position = position_sec;
    }

    fn play(&mut self) -> Result<(), ResourceError> {
        if self.reject_play.borrow().contains(&self.url) {
            self.log.borrow_mut().rejected.push(self.url.clone());
            return Err(ResourceError::PlaybackRejected {
                url: self.url.clone(),
                reason: "NotAllowedError".into(),
            });
        }
        self.playing = true;
        self.log
            .borrow_mut()
            .plays
            .push((self.url.clone(), self.volume, self.position));
        if self.reject_later.borrow().contains(&self.url) {
            self.playing = false;
            self.discarded = true;
            self.log.borrow_mut().rejected.push(self.url.clone());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
        self.log.borrow_mut().pauses.push(self.url.clone());
    }

    fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
        self.log.borrow_mut().stops.push(self.url.clone());
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_discarded(&self) -> bool {
        self.discarded
    }
}

impl AudioBackend for MockAudio {
    type Clip = MockClip;

    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<MockClip, ResourceError>> {
        self.log.borrow_mut().loads.push(url.to_string());
        let behavior = self
            .behaviors
            .borrow()
            .get(url)
            .copied()
            .unwrap_or(LoadBehavior::Ready);
        match behavior {
            LoadBehavior::Ready => Box::pin(ready(Ok(MockClip {
                url: url.to_string(),
                volume: 1.0,
                position: 0.0,
                playing: false,
                discarded: false,
                log: self.log.clone(),
                reject_play: self.reject_play.clone(),
                reject_later: self.reject_later.clone(),
            }))),
            LoadBehavior::Fail => Box::pin(ready(Err(ResourceError::LoadFailed {
                url: url.to_string(),
                reason: "404".into(),
            }))),
            LoadBehavior::Hang => Box::pin(pending()),
        }
    }

    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        // The timer is only polled after the load future, so ready loads
        // always win the race.
        Box::pin(ready(()))
    }
}

/// One call made against the recording sink.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Transform(Role, Transform),
    Visible(Role, bool),
    Top(Role, f64),
    Clip(Role, Option<BottomClip>),
    Image(Role, String),
}

impl SinkCall {
    pub fn kind(&self) -> &'static str {
        match self {
            SinkCall::Transform(..) => "transform",
            SinkCall::Visible(..) => "visible",
            SinkCall::Top(..) => "top",
            SinkCall::Clip(..) => "clip",
            SinkCall::Image(..) => "image",
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    pub preloaded: RefCell<Vec<String>>,
    /// Roles the host has no element for.
    pub missing: HashSet<Role>,
}

impl RecordingSink {
    pub fn take(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn last_image(&self, role: Role) -> Option<&str> {
        self.calls.iter().rev().find_map(|c| match c {
            SinkCall::Image(r, url) if *r == role => Some(url.as_str()),
            _ => None,
        })
    }

    pub fn last_transform(&self, role: Role) -> Option<Transform> {
        self.calls.iter().rev().find_map(|c| match c {
            SinkCall::Transform(r, t) if *r == role => Some(*t),
            _ => None,
        })
    }

    fn push(&mut self, role: Role, call: SinkCall) {
        if !self.missing.contains(&role) {
            self.calls.push(call);
        }
    }
}

impl RenderSink for RecordingSink {
    fn set_transform(&mut self, role: Role, transform: &Transform) {
        self.push(role, SinkCall::Transform(role, *transform));
    }

    fn set_visible(&mut self, role: Role, visible: bool) {
        self.push(role, SinkCall::Visible(role, visible));
    }

    fn set_top(&mut self, role: Role, top_px: f64) {
        self.push(role, SinkCall::Top(role, top_px));
    }

    fn set_clip(&mut self, role: Role, clip: Option<BottomClip>) {
        self.push(role, SinkCall::Clip(role, clip));
    }

    fn set_image(&mut self, role: Role, url: &str) {
        self.push(role, SinkCall::Image(role, url.to_string()));
    }

    fn preload_image(&self, url: &str) -> LocalBoxFuture<'static, Result<(), ResourceError>> {
        self.preloaded.borrow_mut().push(url.to_string());
        Box::pin(ready(Ok(())))
    }
}

pub fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}
