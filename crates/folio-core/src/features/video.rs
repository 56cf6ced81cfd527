// crates/folio-core/src/features/video.rs
// Video modal: [data-video] triggers load the embed into #video-frame

use std::rc::Rc;

use crate::Result;
use crate::features::OPEN_CLASS;
use crate::host::{DomEvent, ListenTarget, PageHost, Query};
use crate::rebind::{BindKey, BindRegistry, Feature};
use crate::video::VideoSource;

pub const MODAL_ID: &str = "video-modal";
pub const FRAME_ID: &str = "video-frame";

pub struct VideoModal {
    registry: BindRegistry,
}

impl Default for VideoModal {
    fn default() -> Self {
        Self {
            registry: BindRegistry::new("video-modal"),
        }
    }
}

pub fn open_video<H: PageHost>(host: &H, raw: &str) -> Result<()> {
    let (Some(modal), Some(frame)) = (host.by_id(MODAL_ID), host.by_id(FRAME_ID)) else {
        return Ok(());
    };
    let source = VideoSource::resolve(raw);
    if let VideoSource::Direct(raw) = &source {
        log::debug!("Unrecognized video reference, playing {:?} directly", raw);
    }
    host.set_attribute(&frame, "src", &source.frame_src())?;
    host.add_class(&modal, OPEN_CLASS)?;
    host.set_attribute(&modal, "aria-hidden", "false")
}

/// Hide the modal and unload the frame so playback stops
pub fn close_video<H: PageHost>(host: &H) -> Result<()> {
    let Some(modal) = host.by_id(MODAL_ID) else {
        return Ok(());
    };
    if let Some(frame) = host.by_id(FRAME_ID) {
        host.remove_attribute(&frame, "src")?;
    }
    host.remove_class(&modal, OPEN_CLASS)?;
    host.set_attribute(&modal, "aria-hidden", "true")
}

impl<H: PageHost> Feature<H> for VideoModal {
    fn name(&self) -> &'static str {
        "video-modal"
    }

    fn bind(&self, host: &Rc<H>, scope: &H::Node) -> Result<usize> {
        if host.by_id(MODAL_ID).is_none() {
            return Ok(0);
        }

        let mut bound = 0;
        for trigger in host.query_all(scope, &Query::Attr("data-video")) {
            let key = BindKey::Node(host.key(&trigger));
            let attached = self.registry.bind_once(key, || {
                let h = host.clone();
                let node = trigger.clone();
                host.listen(
                    ListenTarget::Node(trigger),
                    "click",
                    Rc::new(move |event: &DomEvent| {
                        let raw = h.attribute(&node, "data-video").unwrap_or_default();
                        if raw.trim().is_empty() {
                            return;
                        }
                        event.prevent_default();
                        if let Err(e) = open_video(&*h, &raw) {
                            log::warn!("Failed to open video: {}", e);
                        }
                    }),
                )
            })?;
            bound += usize::from(attached);
        }

        for close in host.query_all(scope, &Query::Attr("data-video-close")) {
            let key = BindKey::Node(host.key(&close));
            let attached = self.registry.bind_once(key, || {
                let h = host.clone();
                host.listen(
                    ListenTarget::Node(close),
                    "click",
                    Rc::new(move |_: &DomEvent| {
                        if let Err(e) = close_video(&*h) {
                            log::warn!("Failed to close video: {}", e);
                        }
                    }),
                )
            })?;
            bound += usize::from(attached);
        }

        let attached = self.registry.bind_once(BindKey::Global("video-escape"), || {
            let h = host.clone();
            host.listen(
                ListenTarget::Document,
                "keydown",
                Rc::new(move |event: &DomEvent| {
                    if event.key.as_deref() != Some("Escape") {
                        return;
                    }
                    let open = h.by_id(MODAL_ID).is_some_and(|m| h.has_class(&m, OPEN_CLASS));
                    if open {
                        if let Err(e) = close_video(&*h) {
                            log::warn!("Failed to close video: {}", e);
                        }
                    }
                }),
            )
        })?;
        bound += usize::from(attached);

        Ok(bound)
    }
}
