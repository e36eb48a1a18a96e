use log::{debug, trace};

use crate::{
    config::{ClearPolicy, PadConfig},
    error::SigError,
    geometry::{LogicalSize, Point, SurfaceLayout, Viewport},
    surface::Surface
};

/// Pointer tracking between a pointer-down and the matching pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing { last: Point }
}

/// A frame captured before a resize, waiting to be painted back.
///
/// Only the redraw from the most recent configuration is accepted; see
/// [`SignaturePad::finish_redraw`].
#[derive(Debug)]
pub struct PendingRedraw<T> {
    generation: u64,
    logical:    LogicalSize,
    snapshot:   T
}

impl<T> PendingRedraw<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }
}

/// State changes preview consumers react to.
#[derive(Debug, Clone, PartialEq)]
pub enum PadEvent {
    Cleared,
    Saved { data_url: String }
}

type Listener = Box<dyn FnMut(&PadEvent)>;

/// Encapsulates drawing logic and export of signature.
pub struct SignaturePad<S: Surface> {
    surface:    S,
    config:     PadConfig,
    stroke:     StrokeState,
    has_ink:    bool,
    visible:    bool,
    viewport:   Option<Viewport>,
    layout:     Option<SurfaceLayout>,
    generation: u64,
    /// Frame handed out by a configuration and not painted back yet.
    unrestored: Option<S::Snapshot>,
    listener:   Option<Listener>
}

impl<S: Surface> SignaturePad<S> {
    /// Create an empty, visible pad. The surface stays unconfigured until the
    /// first [`configure_surface`](Self::configure_surface).
    pub fn new(surface: S, config: PadConfig) -> Result<Self, SigError> {
        config.validate()?;
        Ok(Self {
            surface,
            config,
            stroke: StrokeState::Idle,
            has_ink: false,
            visible: true,
            viewport: None,
            layout: None,
            generation: 0,
            unrestored: None,
            listener: None
        })
    }

    /// Tear the pad down and hand the surface back.
    pub fn unmount(self) -> S {
        debug!("signature pad unmounted");
        self.surface
    }

    pub fn set_listener(&mut self, listener: impl FnMut(&PadEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn config(&self) -> &PadConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn stroke_state(&self) -> StrokeState {
        self.stroke
    }

    /// Layout of the last successful configuration.
    pub fn layout(&self) -> Option<SurfaceLayout> {
        self.layout
    }

    /// Size the surface for `viewport`.
    ///
    /// Hidden pads and zero-width containers are skipped without touching
    /// any state. When there is ink, the current frame is captured before the
    /// resize and returned so the host can paint it back with
    /// [`finish_redraw`](Self::finish_redraw) once it is available. A frame
    /// that was never painted back is carried into the next configuration.
    pub fn configure_surface(
        &mut self,
        viewport: Viewport
    ) -> Result<Option<PendingRedraw<S::Snapshot>>, SigError> {
        self.viewport = Some(viewport);
        if !self.visible {
            debug!("pad hidden, skipping surface configuration");
            return Ok(None);
        }
        if !(viewport.container_width > 0.0) {
            debug!("container has no width, skipping surface configuration");
            return Ok(None);
        }

        let scale = viewport.effective_scale();
        let logical = LogicalSize {
            width:  viewport.container_width,
            height: self.config.logical_height
        };
        let layout = SurfaceLayout::new(logical, scale);
        if layout.physical.is_empty() {
            debug!("physical size collapses to zero, skipping surface configuration");
            return Ok(None);
        }

        // While an earlier redraw is outstanding the buffer is blank; reuse
        // that frame instead of capturing the blank one.
        let snapshot = match self.unrestored.take() {
            Some(snapshot) => Some(snapshot),
            None if self.has_ink => self.surface.capture(),
            None => None
        };
        self.unrestored = snapshot.clone();

        self.surface.resize(layout.physical)?;
        self.surface.set_scale(scale);
        self.surface.apply_style(&self.config.stroke);
        self.generation += 1;
        self.layout = Some(layout);
        debug!(
            "surface configured: logical {}x{}, physical {}x{}, scale {}",
            logical.width, logical.height, layout.physical.width, layout.physical.height, scale
        );

        Ok(snapshot.map(|snapshot| PendingRedraw {
            generation: self.generation,
            logical,
            snapshot
        }))
    }

    /// Same as [`configure_surface`](Self::configure_surface); named for the
    /// host's resize handler.
    pub fn resize(
        &mut self,
        viewport: Viewport
    ) -> Result<Option<PendingRedraw<S::Snapshot>>, SigError> {
        self.configure_surface(viewport)
    }

    /// Re-run configuration with the last viewport seen, e.g. after the pad
    /// becomes visible.
    pub fn refresh(&mut self) -> Result<Option<PendingRedraw<S::Snapshot>>, SigError> {
        match self.viewport {
            Some(viewport) => self.configure_surface(viewport),
            None => Ok(None)
        }
    }

    /// Paint a captured frame back. Returns `false` when a later
    /// configuration or a clear superseded it.
    pub fn finish_redraw(&mut self, pending: PendingRedraw<S::Snapshot>) -> bool {
        if pending.generation != self.generation {
            debug!(
                "dropping stale redraw (generation {} < {})",
                pending.generation, self.generation
            );
            return false;
        }
        self.surface.draw_snapshot(&pending.snapshot, pending.logical);
        self.unrestored = None;
        true
    }

    /// Handle pointer down: start a stroke. Nothing is drawn yet.
    pub fn begin_stroke(&mut self, p: Point) {
        self.stroke = StrokeState::Drawing { last: p };
    }

    /// Handle pointer move: draw one segment from the last point if drawing.
    ///
    /// Before the first configuration there is nothing to draw on: the point
    /// is tracked but no ink is recorded.
    pub fn extend_stroke(&mut self, p: Point) {
        let StrokeState::Drawing { last } = self.stroke else {
            return;
        };
        if self.layout.is_none() {
            self.stroke = StrokeState::Drawing { last: p };
            return;
        }
        trace!("segment ({}, {}) -> ({}, {})", last.x, last.y, p.x, p.y);
        self.surface.stroke_segment(last, p);
        self.stroke = StrokeState::Drawing { last: p };
        self.has_ink = true;
    }

    /// Handle pointer up/cancel: stop drawing.
    pub fn end_stroke(&mut self) {
        self.stroke = StrokeState::Idle;
    }

    /// Erase the whole buffer and forget the ink.
    pub fn clear(&mut self) {
        self.surface.clear_all();
        self.has_ink = false;
        // Frames captured before the clear must not come back.
        self.generation += 1;
        self.unrestored = None;
        if self.config.clear_policy == ClearPolicy::AbandonStroke {
            self.stroke = StrokeState::Idle;
        }
        debug!("signature pad cleared");
        self.emit(&PadEvent::Cleared);
    }

    /// Is pad empty (nothing drawn)?
    pub fn is_empty(&self) -> bool {
        !self.has_ink
    }

    /// PNG of the full physical buffer, or `None` when nothing was drawn.
    pub fn export_png(&self) -> Result<Option<Vec<u8>>, SigError> {
        if self.is_empty() {
            return Ok(None);
        }
        self.surface.encode_png().map(Some)
    }

    /// PNG data URL, or an empty string when nothing was drawn.
    pub fn data_url(&self) -> Result<String, SigError> {
        if self.is_empty() {
            return Ok(String::new());
        }
        self.surface.png_data_url()
    }

    /// Save/preview trigger. Rejects an empty pad without changing state.
    pub fn save(&mut self) -> Result<String, SigError> {
        if self.is_empty() {
            debug!("save rejected: pad is empty");
            return Err(SigError::EmptySignature);
        }
        let data_url = self.surface.png_data_url()?;
        debug!("signature saved ({} bytes)", data_url.len());
        self.emit(&PadEvent::Saved {
            data_url: data_url.clone()
        });
        Ok(data_url)
    }

    fn emit(&mut self, event: &PadEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        config::StrokeStyle,
        geometry::PhysicalSize
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Resize(PhysicalSize),
        Scale(f64),
        Style(StrokeStyle),
        Snapshot(u32, LogicalSize),
        Segment(Point, Point),
        ClearAll
    }

    #[derive(Default)]
    struct RecordingSurface {
        size:     PhysicalSize,
        ops:      Vec<Op>,
        captures: std::cell::Cell<u32>
    }

    impl RecordingSurface {
        fn segments(&self) -> Vec<(Point, Point)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Segment(a, b) => Some((*a, *b)),
                    _ => None
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        type Snapshot = u32;

        fn physical_size(&self) -> PhysicalSize {
            self.size
        }

        fn capture(&self) -> Option<u32> {
            let id = self.captures.get() + 1;
            self.captures.set(id);
            Some(id)
        }

        fn resize(&mut self, size: PhysicalSize) -> Result<(), SigError> {
            self.size = size;
            self.ops.push(Op::Resize(size));
            Ok(())
        }

        fn set_scale(&mut self, scale: f64) {
            self.ops.push(Op::Scale(scale));
        }

        fn apply_style(&mut self, style: &StrokeStyle) {
            self.ops.push(Op::Style(*style));
        }

        fn draw_snapshot(&mut self, snapshot: &u32, logical: LogicalSize) {
            self.ops.push(Op::Snapshot(*snapshot, logical));
        }

        fn stroke_segment(&mut self, from: Point, to: Point) {
            self.ops.push(Op::Segment(from, to));
        }

        fn clear_all(&mut self) {
            self.ops.push(Op::ClearAll);
        }

        fn encode_png(&self) -> Result<Vec<u8>, SigError> {
            Ok(b"\x89PNG".to_vec())
        }
    }

    fn pad() -> SignaturePad<RecordingSurface> {
        SignaturePad::new(RecordingSurface::default(), PadConfig::default()).unwrap()
    }

    fn ready() -> SignaturePad<RecordingSurface> {
        let mut p = pad();
        p.configure_surface(Viewport::new(300.0, 1.0)).unwrap();
        p
    }

    fn pad_with(policy: ClearPolicy) -> SignaturePad<RecordingSurface> {
        let config = PadConfig::default().with_clear_policy(policy);
        let mut p = SignaturePad::new(RecordingSurface::default(), config).unwrap();
        p.configure_surface(Viewport::new(300.0, 1.0)).unwrap();
        p
    }

    const A: Point = Point::new(10.0, 10.0);
    const B: Point = Point::new(50.0, 10.0);
    const C: Point = Point::new(60.0, 30.0);

    #[test]
    fn new_pad_is_empty_and_idle() {
        let p = pad();
        assert!(p.is_empty());
        assert_eq!(p.stroke_state(), StrokeState::Idle);
        assert!(p.layout().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = PadConfig::default().with_logical_height(-1.0);
        assert!(SignaturePad::new(RecordingSurface::default(), cfg).is_err());
    }

    #[test]
    fn configure_resizes_then_scales_then_styles() {
        let mut p = pad();
        let redraw = p.configure_surface(Viewport::new(300.0, 2.0)).unwrap();
        assert!(redraw.is_none());
        let expected = PhysicalSize {
            width:  600,
            height: 400
        };
        assert_eq!(
            p.surface().ops,
            vec![
                Op::Resize(expected),
                Op::Scale(2.0),
                Op::Style(StrokeStyle::default())
            ]
        );
        assert_eq!(p.layout().map(|l| l.physical), Some(expected));
    }

    #[test]
    fn begin_alone_draws_nothing() {
        let mut p = pad();
        p.begin_stroke(A);
        p.end_stroke();
        assert!(p.is_empty());
        assert!(p.surface().segments().is_empty());
    }

    #[test]
    fn begin_then_extend_draws_exactly_one_segment() {
        let mut p = ready();
        p.begin_stroke(A);
        p.extend_stroke(B);
        assert_eq!(p.surface().segments(), vec![(A, B)]);
        assert!(!p.is_empty());
    }

    #[test]
    fn segments_form_a_connected_polyline_in_order() {
        let mut p = ready();
        p.begin_stroke(A);
        p.extend_stroke(B);
        p.extend_stroke(C);
        p.end_stroke();
        assert_eq!(p.surface().segments(), vec![(A, B), (B, C)]);
    }

    #[test]
    fn extend_while_idle_is_noop() {
        let mut p = pad();
        p.extend_stroke(B);
        assert!(p.is_empty());
        assert!(p.surface().segments().is_empty());
    }

    #[test]
    fn end_stroke_is_idempotent() {
        let mut p = ready();
        p.begin_stroke(A);
        p.end_stroke();
        let after_once = p.stroke_state();
        p.end_stroke();
        assert_eq!(p.stroke_state(), after_once);
        assert_eq!(after_once, StrokeState::Idle);
        p.extend_stroke(B);
        assert!(p.surface().segments().is_empty());
    }

    #[test]
    fn clear_mid_stroke_abandons_stroke_by_default() {
        let mut p = pad_with(ClearPolicy::AbandonStroke);
        p.begin_stroke(A);
        p.extend_stroke(B);
        p.clear();
        assert!(p.is_empty());
        assert_eq!(p.stroke_state(), StrokeState::Idle);

        p.extend_stroke(C);
        assert!(p.is_empty());
        assert_eq!(p.surface().segments(), vec![(A, B)]);
    }

    #[test]
    fn legacy_clear_resumes_from_stale_point() {
        let mut p = pad_with(ClearPolicy::Legacy);
        p.begin_stroke(A);
        p.extend_stroke(B);
        p.clear();
        assert!(p.is_empty());
        assert_eq!(p.stroke_state(), StrokeState::Drawing { last: B });

        p.extend_stroke(C);
        assert!(!p.is_empty());
        assert_eq!(p.surface().segments(), vec![(A, B), (B, C)]);
    }

    #[test]
    fn export_is_empty_iff_pad_is_empty() {
        let mut p = ready();
        assert_eq!(p.export_png().unwrap(), None);
        assert_eq!(p.data_url().unwrap(), "");

        p.begin_stroke(A);
        p.extend_stroke(B);
        assert!(p.export_png().unwrap().is_some());
        assert!(p.data_url().unwrap().starts_with("data:image/png;base64,"));

        p.clear();
        assert_eq!(p.export_png().unwrap(), None);
    }

    #[test]
    fn save_rejects_empty_pad_and_notifies_listener_otherwise() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut p = ready();
        let sink = Rc::clone(&seen);
        p.set_listener(move |ev| sink.borrow_mut().push(ev.clone()));

        assert!(matches!(p.save(), Err(SigError::EmptySignature)));
        assert!(seen.borrow().is_empty());

        p.begin_stroke(A);
        p.extend_stroke(B);
        let url = p.save().unwrap();
        p.clear();

        assert_eq!(
            *seen.borrow(),
            vec![PadEvent::Saved { data_url: url }, PadEvent::Cleared]
        );
    }

    #[test]
    fn hidden_pad_skips_configuration() {
        let mut p = pad();
        p.configure_surface(Viewport::new(300.0, 1.0)).unwrap();
        p.begin_stroke(A);
        p.extend_stroke(B);
        let before = p.layout();
        let ops_before = p.surface().ops.len();

        p.set_visible(false);
        let redraw = p.configure_surface(Viewport::new(500.0, 2.0)).unwrap();
        assert!(redraw.is_none());
        assert_eq!(p.layout(), before);
        assert_eq!(p.surface().ops.len(), ops_before);
        assert!(!p.is_empty());

        p.set_visible(true);
        let redraw = p.refresh().unwrap();
        assert!(redraw.is_some());
        assert_eq!(p.layout().map(|l| l.logical.width), Some(500.0));
    }

    #[test]
    fn zero_width_container_is_skipped() {
        let mut p = pad();
        assert!(p.configure_surface(Viewport::new(0.0, 2.0)).unwrap().is_none());
        assert!(p.layout().is_none());
        assert!(p.surface().ops.is_empty());
    }

    #[test]
    fn refresh_without_viewport_does_nothing() {
        let mut p = pad();
        assert!(p.refresh().unwrap().is_none());
        assert!(p.surface().ops.is_empty());
    }

    #[test]
    fn latest_configuration_wins() {
        let mut p = pad();
        p.configure_surface(Viewport::new(300.0, 1.0)).unwrap();
        p.begin_stroke(A);
        p.extend_stroke(B);

        let first = p.resize(Viewport::new(400.0, 1.0)).unwrap().unwrap();
        let second = p.resize(Viewport::new(500.0, 1.0)).unwrap().unwrap();
        assert!(second.generation() > first.generation());

        assert!(!p.finish_redraw(first));
        let snapshot = *second.snapshot();
        assert!(p.finish_redraw(second));
        assert_eq!(
            p.surface().ops.last(),
            Some(&Op::Snapshot(
                snapshot,
                LogicalSize {
                    width:  500.0,
                    height: 200.0
                }
            ))
        );
    }

    #[test]
    fn clear_invalidates_pending_redraw() {
        let mut p = pad();
        p.configure_surface(Viewport::new(300.0, 1.0)).unwrap();
        p.begin_stroke(A);
        p.extend_stroke(B);
        let pending = p.resize(Viewport::new(400.0, 1.0)).unwrap().unwrap();
        p.clear();
        assert!(!p.finish_redraw(pending));
        assert!(p.is_empty());
    }

    #[test]
    fn resize_mid_stroke_keeps_stroke_state() {
        let mut p = pad();
        p.configure_surface(Viewport::new(300.0, 1.0)).unwrap();
        p.begin_stroke(A);
        p.extend_stroke(B);
        let _ = p.resize(Viewport::new(320.0, 2.0)).unwrap();
        assert_eq!(p.stroke_state(), StrokeState::Drawing { last: B });
        p.extend_stroke(C);
        assert_eq!(p.surface().segments(), vec![(A, B), (B, C)]);
    }

    #[test]
    fn unmount_returns_surface() {
        let mut p = ready();
        p.begin_stroke(A);
        p.extend_stroke(B);
        let surface = p.unmount();
        assert_eq!(surface.segments(), vec![(A, B)]);
    }

    #[test]
    fn stroke_before_first_configuration_leaves_no_ink() {
        let mut p = pad();
        p.begin_stroke(A);
        p.extend_stroke(B);
        assert!(p.is_empty());
        assert!(p.surface().segments().is_empty());
        assert_eq!(p.export_png().unwrap(), None);

        // The stroke keeps tracking the pointer and draws once sized.
        p.configure_surface(Viewport::new(300.0, 1.0)).unwrap();
        p.extend_stroke(C);
        assert_eq!(p.surface().segments(), vec![(B, C)]);
        assert!(!p.is_empty());
    }

    #[test]
    fn unpainted_frame_is_carried_into_next_configuration() {
        let mut p = ready();
        p.begin_stroke(A);
        p.extend_stroke(B);

        let first = p.resize(Viewport::new(400.0, 1.0)).unwrap().unwrap();
        let second = p.resize(Viewport::new(500.0, 1.0)).unwrap().unwrap();
        assert_eq!(second.snapshot(), first.snapshot());
        assert_eq!(p.surface().captures.get(), 1);

        assert!(!p.finish_redraw(first));
        assert!(p.finish_redraw(second));

        // Painted back: the next resize captures the live buffer again.
        let third = p.resize(Viewport::new(600.0, 1.0)).unwrap().unwrap();
        assert_eq!(*third.snapshot(), 2);
    }

    #[test]
    fn clear_drops_carried_frame() {
        let mut p = ready();
        p.begin_stroke(A);
        p.extend_stroke(B);
        p.end_stroke();
        let _ = p.resize(Viewport::new(400.0, 1.0)).unwrap();
        p.clear();
        assert!(p.resize(Viewport::new(500.0, 1.0)).unwrap().is_none());
    }
}
