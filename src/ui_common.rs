// src/ui_common.rs

use std::{cell::RefCell, rc::Rc};

use log::{debug, warn};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent,
    TouchEvent, Window
};

use crate::{
    config::PadConfig,
    error::SigError,
    geometry::{Point, Viewport},
    input::{resolve_point, PointerInput},
    signature_core::{PadEvent, SignaturePad},
    surface::Surface,
    web::CanvasSurface
};

type SharedPad = Rc<RefCell<SignaturePad<CanvasSurface>>>;
type Hook = Box<dyn FnMut(&PadEvent)>;

/// Append inline style pairs without clobbering existing rules.
/// Very simple: appends `key:value;` if key is not present.
fn merge_inline_style(el: &Element, pairs: &[(&str, &str)]) -> Result<(), SigError> {
    let current = el.get_attribute("style").unwrap_or_default();
    let mut style = current.trim().to_string();
    if !style.is_empty() && !style.ends_with(';') {
        style.push(';');
    }
    for (k, v) in pairs {
        let needle = format!("{k}:");
        if !style.contains(&needle) {
            style.push_str(k);
            style.push(':');
            style.push_str(v);
            style.push(';');
        }
    }
    el.set_attribute("style", &style)
        .map_err(|_| SigError::OpFailed("setAttribute(style)".into()))
}

/// Element ids the pad binds to.
#[derive(Debug, Clone, PartialEq)]
pub struct MountPoints {
    pub canvas_id:       String,
    /// Element whose rendered width drives the logical surface width.
    pub container_id:    String,
    pub clear_button_id: String,
    pub save_button_id:  String,
    pub preview_id:      String
}

impl Default for MountPoints {
    fn default() -> Self {
        Self::with_prefix("signature")
    }
}

impl MountPoints {
    /// `{prefix}-canvas`, `{prefix}-container`, `{prefix}-clear`,
    /// `{prefix}-save`, `{prefix}-preview`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            canvas_id:       format!("{prefix}-canvas"),
            container_id:    format!("{prefix}-container"),
            clear_button_id: format!("{prefix}-clear"),
            save_button_id:  format!("{prefix}-save"),
            preview_id:      format!("{prefix}-preview")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MountOptions {
    pub config:  PadConfig,
    /// Whether the container is shown at mount time. Hidden pads configure
    /// themselves on `set_visible(true)`.
    pub visible: bool
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            config:  PadConfig::default(),
            visible: true
        }
    }
}

/// One registered DOM listener; removed from its target on drop.
struct Listener {
    target:   EventTarget,
    kind:     &'static str,
    callback: Closure<dyn FnMut(Event)>
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static
    ) -> Result<Self, SigError> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(|_| SigError::OpFailed(format!("addEventListener({kind})")))?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

/// Mouse events are checked first: `TouchEvent` is not defined in every
/// desktop browser.
fn pointer_input(event: &Event) -> Option<PointerInput> {
    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        return Some(PointerInput::Mouse {
            client: Point::new(mouse.client_x() as f64, mouse.client_y() as f64)
        });
    }
    let touch = event.dyn_ref::<TouchEvent>()?.touches().get(0)?;
    Some(PointerInput::Touch {
        first: Point::new(touch.client_x() as f64, touch.client_y() as f64)
    })
}

fn surface_point(canvas: &HtmlCanvasElement, event: &Event) -> Option<Point> {
    let input = pointer_input(event)?;
    let rect = canvas.get_bounding_client_rect();
    Some(resolve_point(&input, Point::new(rect.left(), rect.top())))
}

/// Fans clear/save out to the preview and the user hook. Always fired after
/// the pad borrow is released, so observers may call back into the pad.
#[derive(Default)]
struct EventHub {
    preview: Option<Box<dyn Fn(&PadEvent)>>,
    hook:    RefCell<Option<Hook>>
}

impl EventHub {
    fn set_hook(&self, hook: Hook) {
        *self.hook.borrow_mut() = Some(hook);
    }

    fn fire(&self, event: &PadEvent) {
        if let Some(preview) = &self.preview {
            preview(event);
        }
        // Taken out while it runs: a hook that clears or saves again does not
        // re-enter itself.
        let taken = self.hook.borrow_mut().take();
        if let Some(mut hook) = taken {
            hook(event);
            let mut slot = self.hook.borrow_mut();
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }
}

fn clear_pad<S: Surface>(pad: &RefCell<SignaturePad<S>>, events: &EventHub) {
    pad.borrow_mut().clear();
    events.fire(&PadEvent::Cleared);
}

fn save_pad<S: Surface>(
    pad: &RefCell<SignaturePad<S>>,
    events: &EventHub
) -> Result<String, SigError> {
    let saved = pad.borrow_mut().save();
    if let Ok(data_url) = &saved {
        events.fire(&PadEvent::Saved {
            data_url: data_url.clone()
        });
    }
    saved
}

/// Mounted pad resources shared with listeners.
#[derive(Clone)]
struct Host {
    window:       Window,
    container:    HtmlElement,
    pad:          SharedPad,
    /// `load` listener of the snapshot waiting to be painted back.
    pending_load: Rc<RefCell<Option<Listener>>>
}

impl Host {
    fn viewport(&self) -> Viewport {
        Viewport::new(
            self.container.client_width() as f64,
            self.window.device_pixel_ratio()
        )
    }

    /// Configure the surface for the current layout and schedule the redraw
    /// of the previous frame. A newer call replaces (and detaches) the
    /// listener of an older one.
    fn reconfigure(&self) -> Result<(), SigError> {
        let viewport = self.viewport();
        let pending = self.pad.borrow_mut().configure_surface(viewport)?;
        let Some(pending) = pending else {
            return Ok(());
        };
        let image = pending.snapshot().clone();
        if image.complete() {
            // A frame carried over from an earlier resize is already decoded
            // and will not fire `load` again.
            self.pending_load.borrow_mut().take();
            self.pad.borrow_mut().finish_redraw(pending);
            return Ok(());
        }
        let pad = Rc::clone(&self.pad);
        let mut slot = Some(pending);
        let listener = Listener::attach(image.as_ref(), "load", move |_e: Event| {
            if let Some(pending) = slot.take() {
                pad.borrow_mut().finish_redraw(pending);
            }
        })?;
        *self.pending_load.borrow_mut() = Some(listener);
        Ok(())
    }
}

fn show_preview(document: &Document, preview: &Element, data_url: &str) -> Result<(), SigError> {
    let img = document
        .create_element("img")
        .map_err(|_| SigError::OpFailed("createElement(img)".into()))?;
    img.set_attribute("src", data_url)
        .map_err(|_| SigError::OpFailed("setAttribute(src)".into()))?;
    merge_inline_style(&img, &[("max-width", "300px")])?;
    preview.set_inner_html("");
    preview
        .append_child(&img)
        .map_err(|_| SigError::OpFailed("appendChild(img)".into()))?;
    Ok(())
}

/// RAII handle that owns the SignaturePad and its JS listeners.
/// On drop, listeners are removed.
pub struct MountedPad {
    host:       Host,
    events:     Rc<EventHub>,
    _listeners: Vec<Listener>
}

impl MountedPad {
    /// Resolve the mount points, configure the surface and attach listeners.
    pub fn mount(points: &MountPoints, options: MountOptions) -> Result<Self, SigError> {
        let window: Window = web_sys::window().ok_or(SigError::DomUnavailable)?;
        let document: Document = window.document().ok_or(SigError::DomUnavailable)?;
        let find = |id: &str| {
            document
                .get_element_by_id(id)
                .ok_or_else(|| SigError::ElementNotFound(id.to_string()))
        };

        let canvas: HtmlCanvasElement = find(&points.canvas_id)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SigError::ElementNotFound(points.canvas_id.clone()))?;
        let container: HtmlElement = find(&points.container_id)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| SigError::ElementNotFound(points.container_id.clone()))?;
        let clear_btn = find(&points.clear_button_id)?;
        let save_btn = find(&points.save_button_id)?;
        let preview = find(&points.preview_id)?;

        let height = format!("{}px", options.config.logical_height);
        merge_inline_style(
            canvas.as_ref(),
            &[
                ("display", "block"),
                ("width", "100%"),
                ("height", &height),
                ("touch-action", "none")
            ]
        )?;

        let mut pad = SignaturePad::new(CanvasSurface::new(canvas.clone())?, options.config)?;
        pad.set_visible(options.visible);

        // Preview reacts to pad state; user hook runs after.
        let events = {
            let document = document.clone();
            let preview = preview.clone();
            Rc::new(EventHub {
                preview: Some(Box::new(move |event: &PadEvent| match event {
                    PadEvent::Cleared => preview.set_inner_html(""),
                    PadEvent::Saved { data_url } => {
                        if let Err(e) = show_preview(&document, &preview, data_url) {
                            warn!("signature preview failed: {e}");
                        }
                    }
                })),
                hook:    RefCell::new(None)
            })
        };

        let host = Host {
            window: window.clone(),
            container,
            pad: Rc::new(RefCell::new(pad)),
            pending_load: Rc::new(RefCell::new(None))
        };
        host.reconfigure()?;

        let mut listeners = Vec::new();

        for kind in ["mousedown", "touchstart"] {
            let pad = Rc::clone(&host.pad);
            let canvas_in_cb = canvas.clone();
            listeners.push(Listener::attach(canvas.as_ref(), kind, move |e: Event| {
                if let Some(p) = surface_point(&canvas_in_cb, &e) {
                    pad.borrow_mut().begin_stroke(p);
                }
                if e.dyn_ref::<MouseEvent>().is_none() {
                    e.prevent_default();
                }
            })?);
        }

        for kind in ["mousemove", "touchmove"] {
            let pad = Rc::clone(&host.pad);
            let canvas_in_cb = canvas.clone();
            listeners.push(Listener::attach(canvas.as_ref(), kind, move |e: Event| {
                if let Some(p) = surface_point(&canvas_in_cb, &e) {
                    pad.borrow_mut().extend_stroke(p);
                }
                if e.dyn_ref::<MouseEvent>().is_none() {
                    e.prevent_default();
                }
            })?);
        }

        // Release anywhere on the page ends the stroke.
        for kind in ["mouseup", "touchend", "touchcancel"] {
            let pad = Rc::clone(&host.pad);
            listeners.push(Listener::attach(document.as_ref(), kind, move |_e: Event| {
                pad.borrow_mut().end_stroke();
            })?);
        }

        {
            let host_in_cb = host.clone();
            listeners.push(Listener::attach(window.as_ref(), "resize", move |_e: Event| {
                if let Err(e) = host_in_cb.reconfigure() {
                    warn!("signature pad resize failed: {e}");
                }
            })?);
        }

        {
            let pad = Rc::clone(&host.pad);
            let events = Rc::clone(&events);
            listeners.push(Listener::attach(clear_btn.as_ref(), "click", move |_e: Event| {
                clear_pad(&pad, &events);
            })?);
        }

        {
            let pad = Rc::clone(&host.pad);
            let events = Rc::clone(&events);
            let preview = preview.clone();
            listeners.push(Listener::attach(save_btn.as_ref(), "click", move |_e: Event| {
                match save_pad(&pad, &events) {
                    Ok(_) => {}
                    Err(SigError::EmptySignature) => {
                        let message = SigError::EmptySignature.to_string();
                        preview.set_text_content(Some(message.as_str()));
                    }
                    Err(e) => warn!("signature save failed: {e}")
                }
            })?);
        }

        debug!("signature pad mounted on #{}", points.canvas_id);
        Ok(Self {
            host,
            events,
            _listeners: listeners
        })
    }

    /// Extra observer for clear/save, called after the preview is updated.
    pub fn on_event(&self, hook: impl FnMut(&PadEvent) + 'static) {
        self.events.set_hook(Box::new(hook));
    }

    pub fn data_url(&self) -> Result<String, SigError> {
        self.host.pad.borrow().data_url()
    }

    pub fn refresh(&self) -> Result<(), SigError> {
        self.host.reconfigure()
    }

    pub fn is_empty(&self) -> bool {
        self.host.pad.borrow().is_empty()
    }

    /// Show or hide the pad; becoming visible reconfigures the surface.
    pub fn set_visible(&self, visible: bool) -> Result<(), SigError> {
        self.host.pad.borrow_mut().set_visible(visible);
        if visible {
            self.host.reconfigure()?;
        }
        Ok(())
    }

    pub fn clear(&self) {
        clear_pad(&self.host.pad, &self.events);
    }
}

impl Drop for MountedPad {
    fn drop(&mut self) {
        self.host.pending_load.borrow_mut().take();
        debug!("signature pad unmounted");
    }
}

/// JS-facing handle returned by `mountSignaturePad`.
#[wasm_bindgen]
pub struct SignaturePadHandle {
    inner: MountedPad
}

#[wasm_bindgen]
impl SignaturePadHandle {
    /// Empty string when nothing was drawn, PNG data URL otherwise.
    #[wasm_bindgen(js_name = getDataURL)]
    pub fn get_data_url(&self) -> Result<String, JsValue> {
        Ok(self.inner.data_url()?)
    }

    pub fn refresh(&self) -> Result<(), JsValue> {
        Ok(self.inner.refresh()?)
    }

    #[wasm_bindgen(js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[wasm_bindgen(js_name = setVisible)]
    pub fn set_visible(&self, visible: bool) -> Result<(), JsValue> {
        Ok(self.inner.set_visible(visible)?)
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Detach every listener. The handle is unusable afterwards.
    pub fn unmount(self) {}
}

/// Mount a pad on elements `{prefix}-canvas`, `{prefix}-container`,
/// `{prefix}-clear`, `{prefix}-save` and `{prefix}-preview`.
#[wasm_bindgen(js_name = mountSignaturePad)]
pub fn mount_signature_pad(prefix: &str, visible: bool) -> Result<SignaturePadHandle, JsValue> {
    let options = MountOptions {
        visible,
        ..MountOptions::default()
    };
    let inner = MountedPad::mount(&MountPoints::with_prefix(prefix), options)?;
    Ok(SignaturePadHandle { inner })
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::raster::RasterSurface;

    fn drawn_pad() -> Rc<RefCell<SignaturePad<RasterSurface>>> {
        let mut pad = SignaturePad::new(RasterSurface::new(), PadConfig::default()).unwrap();
        pad.configure_surface(Viewport::new(300.0, 1.0)).unwrap();
        pad.begin_stroke(Point::new(10.0, 10.0));
        pad.extend_stroke(Point::new(50.0, 10.0));
        pad.end_stroke();
        Rc::new(RefCell::new(pad))
    }

    #[test]
    fn hook_can_read_pad_during_save_and_clear() {
        let pad = drawn_pad();
        let events = EventHub::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let pad = Rc::clone(&pad);
            let seen = Rc::clone(&seen);
            events.set_hook(Box::new(move |event: &PadEvent| {
                let empty = pad.borrow().is_empty();
                let url = pad.borrow().data_url().unwrap();
                seen.borrow_mut()
                    .push((matches!(event, PadEvent::Cleared), empty, url.is_empty()));
            }));
        }

        let url = save_pad(&pad, &events).unwrap();
        assert!(!url.is_empty());
        clear_pad(&pad, &events);

        assert_eq!(
            *seen.borrow(),
            vec![(false, false, false), (true, true, true)]
        );
    }

    #[test]
    fn hook_clearing_the_pad_does_not_reenter_itself() {
        let pad = drawn_pad();
        let events = Rc::new(EventHub::default());
        let calls = Rc::new(RefCell::new(0));
        {
            let pad = Rc::clone(&pad);
            let hub = Rc::clone(&events);
            let calls = Rc::clone(&calls);
            events.set_hook(Box::new(move |event: &PadEvent| {
                *calls.borrow_mut() += 1;
                if let PadEvent::Saved { .. } = event {
                    clear_pad(&pad, &hub);
                }
            }));
        }

        save_pad(&pad, &events).unwrap();
        assert_eq!(*calls.borrow(), 1);
        assert!(pad.borrow().is_empty());

        // Hook is back in place for later events.
        clear_pad(&pad, &events);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn rejected_save_fires_nothing() {
        let pad = Rc::new(RefCell::new(
            SignaturePad::new(RasterSurface::new(), PadConfig::default()).unwrap()
        ));
        let events = EventHub::default();
        let fired = Rc::new(RefCell::new(false));
        {
            let fired = Rc::clone(&fired);
            events.set_hook(Box::new(move |_event: &PadEvent| *fired.borrow_mut() = true));
        }
        assert!(matches!(
            save_pad(&pad, &events),
            Err(SigError::EmptySignature)
        ));
        assert!(!*fired.borrow());
    }
}
