use crate::config::SyncConfig;
use crate::lifecycle::Lifecycle;
use crate::window::{ResizeHandler, WindowEventSource};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use viewport_common::{SharedViewportSize, ViewportError, clamp_pixel_ratio};
use viewport_render::{OutputTarget, ProjectionCamera};

/// Where a [`ViewportResizeSync`] is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unattached,
    Attached,
    /// Terminal. A new sync has to be built to observe the window again.
    Detached,
}

/// Keeps a shared size record, a camera and a render target matched to the
/// window's inner size for as long as it is attached.
///
/// Nothing is validated at construction. Handles are shared with the caller
/// and mutated in place on every resize event.
pub struct ViewportResizeSync<W, C, R>
where
    W: WindowEventSource + 'static,
    C: ProjectionCamera + 'static,
    R: OutputTarget + 'static,
{
    window: Rc<W>,
    size: SharedViewportSize,
    camera: Rc<RefCell<C>>,
    renderer: Rc<RefCell<R>>,
    config: SyncConfig,
    state: SyncState,
    handler: Option<ResizeHandler>,
}

impl<W, C, R> ViewportResizeSync<W, C, R>
where
    W: WindowEventSource + 'static,
    C: ProjectionCamera + 'static,
    R: OutputTarget + 'static,
{
    pub fn new(
        window: Rc<W>,
        size: SharedViewportSize,
        camera: Rc<RefCell<C>>,
        renderer: Rc<RefCell<R>>,
    ) -> Self {
        Self::with_config(window, size, camera, renderer, SyncConfig::default())
    }

    pub fn with_config(
        window: Rc<W>,
        size: SharedViewportSize,
        camera: Rc<RefCell<C>>,
        renderer: Rc<RefCell<R>>,
        config: SyncConfig,
    ) -> Self {
        Self {
            window,
            size,
            camera,
            renderer,
            config,
            state: SyncState::Unattached,
            handler: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Start observing window resizes.
    ///
    /// Attaching twice keeps the first registration. A detached sync refuses
    /// with [`ViewportError::Reattach`] and registers nothing.
    pub fn attach(&mut self) -> Result<(), ViewportError> {
        match self.state {
            SyncState::Attached => return Ok(()),
            SyncState::Detached => {
                tracing::warn!("ignoring attach on a detached resize sync");
                return Err(ViewportError::Reattach);
            }
            SyncState::Unattached => {}
        }

        let window = Rc::downgrade(&self.window);
        let size = self.size.clone();
        let camera = self.camera.clone();
        let renderer = self.renderer.clone();
        let max_ratio = self.config.max_pixel_ratio;
        let handler: ResizeHandler = Rc::new(move || {
            on_resize(&window, &size, &camera, &renderer, max_ratio)
        });

        self.window.add_resize_listener(handler.clone());
        self.handler = Some(handler);
        self.state = SyncState::Attached;
        tracing::info!("viewport resize sync attached");
        Ok(())
    }

    /// Stop observing window resizes. Safe in any state, any number of times.
    pub fn detach(&mut self) {
        if let Some(handler) = self.handler.take() {
            self.window.remove_resize_listener(&handler);
            tracing::info!("viewport resize sync detached");
        }
        self.state = SyncState::Detached;
    }

    /// Run the resize pipeline once against the window's current metrics.
    ///
    /// Works before attach. A detached sync no longer touches the shared
    /// handles, so this returns `Ok(())` without doing anything.
    pub fn sync_now(&self) -> Result<(), ViewportError> {
        if self.state == SyncState::Detached {
            tracing::debug!("sync_now ignored on detached viewport resize sync");
            return Ok(());
        }
        let window = Rc::downgrade(&self.window);
        on_resize(
            &window,
            &self.size,
            &self.camera,
            &self.renderer,
            self.config.max_pixel_ratio,
        )
    }
}

/// The five-step propagation run for every resize event.
fn on_resize<W, C, R>(
    window: &Weak<W>,
    size: &SharedViewportSize,
    camera: &Rc<RefCell<C>>,
    renderer: &Rc<RefCell<R>>,
    max_ratio: f64,
) -> Result<(), ViewportError>
where
    W: WindowEventSource,
    C: ProjectionCamera,
    R: OutputTarget,
{
    let Some(window) = window.upgrade() else {
        return Ok(());
    };

    let (width, height) = window.inner_size();
    let current = {
        let mut size = size
            .try_borrow_mut()
            .map_err(|_| ViewportError::HandleBusy("viewport size"))?;
        size.width = width;
        size.height = height;
        *size
    };

    let aspect = current.width / current.height;
    {
        let mut camera = camera
            .try_borrow_mut()
            .map_err(|_| ViewportError::HandleBusy("camera"))?;
        camera.set_aspect(aspect);
        camera.recompute_projection();
    }

    let ratio = clamp_pixel_ratio(window.device_pixel_ratio(), max_ratio);
    {
        let mut renderer = renderer
            .try_borrow_mut()
            .map_err(|_| ViewportError::HandleBusy("renderer"))?;
        renderer.set_output_size(current.width, current.height)?;
        renderer.set_pixel_density(ratio)?;
    }

    tracing::debug!(width, height, aspect, ratio, "viewport resized");
    Ok(())
}

impl<W, C, R> Lifecycle for ViewportResizeSync<W, C, R>
where
    W: WindowEventSource + 'static,
    C: ProjectionCamera + 'static,
    R: OutputTarget + 'static,
{
    fn on_attach(&mut self) -> Result<(), ViewportError> {
        self.attach()
    }

    fn on_detach(&mut self) {
        self.detach();
    }
}

impl<W, C, R> Drop for ViewportResizeSync<W, C, R>
where
    W: WindowEventSource + 'static,
    C: ProjectionCamera + 'static,
    R: OutputTarget + 'static,
{
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::HeadlessWindow;
    use viewport_common::ViewportSize;
    use viewport_render::{DebugTextTarget, TargetCall};

    type Log = Rc<RefCell<Vec<String>>>;

    /// Camera that logs its calls and the size record it saw at each one.
    struct LoggingCamera {
        aspect: f64,
        projections: u32,
        size: SharedViewportSize,
        log: Log,
    }

    impl ProjectionCamera for LoggingCamera {
        fn aspect(&self) -> f64 {
            self.aspect
        }

        fn set_aspect(&mut self, aspect: f64) {
            let s = self.size.borrow();
            self.log
                .borrow_mut()
                .push(format!("aspect {}x{}", s.width, s.height));
            self.aspect = aspect;
        }

        fn recompute_projection(&mut self) {
            self.projections += 1;
            self.log.borrow_mut().push(format!("project {}", self.aspect));
        }
    }

    struct LoggingTarget {
        inner: DebugTextTarget,
        log: Log,
        fail_density: bool,
    }

    impl OutputTarget for LoggingTarget {
        fn set_output_size(&mut self, width: f64, height: f64) -> Result<(), ViewportError> {
            self.log.borrow_mut().push(format!("size {width}x{height}"));
            self.inner.set_output_size(width, height)
        }

        fn set_pixel_density(&mut self, ratio: f64) -> Result<(), ViewportError> {
            if self.fail_density {
                return Err(ViewportError::Backend("density rejected".into()));
            }
            self.log.borrow_mut().push(format!("density {ratio}"));
            self.inner.set_pixel_density(ratio)
        }
    }

    struct Rig {
        window: Rc<HeadlessWindow>,
        size: SharedViewportSize,
        camera: Rc<RefCell<LoggingCamera>>,
        target: Rc<RefCell<LoggingTarget>>,
        log: Log,
        sync: ViewportResizeSync<HeadlessWindow, LoggingCamera, LoggingTarget>,
    }

    fn rig(width: f64, height: f64, ratio: f64) -> Rig {
        let window = Rc::new(HeadlessWindow::new(width, height, ratio));
        let size = ViewportSize::new(width, height).shared();
        let log: Log = Rc::default();
        let camera = Rc::new(RefCell::new(LoggingCamera {
            aspect: 1.0,
            projections: 0,
            size: size.clone(),
            log: log.clone(),
        }));
        let target = Rc::new(RefCell::new(LoggingTarget {
            inner: DebugTextTarget::new(),
            log: log.clone(),
            fail_density: false,
        }));
        let sync = ViewportResizeSync::new(
            window.clone(),
            size.clone(),
            camera.clone(),
            target.clone(),
        );
        Rig {
            window,
            size,
            camera,
            target,
            log,
            sync,
        }
    }

    #[test]
    fn starts_unattached_without_listener() {
        let r = rig(800.0, 600.0, 1.0);
        assert_eq!(r.sync.state(), SyncState::Unattached);
        assert_eq!(r.window.listener_count(), 0);
    }

    #[test]
    fn size_mirrors_every_resize() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();

        for (w, h) in [(1024.0, 768.0), (333.0, 777.0), (1.0, 1.0), (3840.0, 2160.0)] {
            r.window.resize_to(w, h).unwrap();
            assert_eq!(*r.size.borrow(), ViewportSize::new(w, h));
        }
    }

    #[test]
    fn aspect_matches_size_exactly() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();

        for (w, h) in [(1920.0, 1080.0), (1000.0, 3.0), (7.0, 9.0)] {
            r.window.resize_to(w, h).unwrap();
            let size = *r.size.borrow();
            assert_eq!(r.camera.borrow().aspect(), size.width / size.height);
        }
        assert_eq!(r.camera.borrow().projections, 3);
    }

    #[test]
    fn steps_run_in_fixed_order() {
        let mut r = rig(800.0, 600.0, 1.5);
        r.sync.attach().unwrap();
        r.window.resize_to(400.0, 200.0).unwrap();

        assert_eq!(
            *r.log.borrow(),
            vec![
                "aspect 400x200".to_string(),
                "project 2".to_string(),
                "size 400x200".to_string(),
                "density 1.5".to_string(),
            ]
        );
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();

        let mut seen = Vec::new();
        for ratio in [0.5, 1.0, 2.0, 3.0, 5.0] {
            r.window.set_device_pixel_ratio(ratio);
            r.window.resize_to(800.0, 600.0).unwrap();
            seen.push(r.target.borrow().inner.pixel_density());
        }
        assert_eq!(seen, vec![0.5, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn configured_ceiling_is_honoured() {
        let window = Rc::new(HeadlessWindow::new(100.0, 100.0, 3.0));
        let target = Rc::new(RefCell::new(DebugTextTarget::new()));
        let mut sync = ViewportResizeSync::with_config(
            window.clone(),
            ViewportSize::default().shared(),
            Rc::new(RefCell::new(viewport_render::PerspectiveCamera::default())),
            target.clone(),
            SyncConfig {
                max_pixel_ratio: 1.25,
            },
        );
        sync.attach().unwrap();
        window.resize_to(200.0, 100.0).unwrap();
        assert_eq!(target.borrow().pixel_density(), 1.25);
    }

    #[test]
    fn no_mutation_before_attach() {
        let r = rig(800.0, 600.0, 3.0);
        r.window.resize_to(1920.0, 1080.0).unwrap();

        assert_eq!(*r.size.borrow(), ViewportSize::new(800.0, 600.0));
        assert_eq!(r.camera.borrow().aspect(), 1.0);
        assert!(r.log.borrow().is_empty());
        assert!(r.target.borrow().inner.calls().is_empty());
    }

    #[test]
    fn no_mutation_after_detach() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();
        r.window.resize_to(1000.0, 500.0).unwrap();
        r.sync.detach();
        let log_len = r.log.borrow().len();

        r.window.resize_to(640.0, 480.0).unwrap();
        assert_eq!(*r.size.borrow(), ViewportSize::new(1000.0, 500.0));
        assert_eq!(r.camera.borrow().aspect(), 2.0);
        assert_eq!(r.log.borrow().len(), log_len);
        assert_eq!(r.window.listener_count(), 0);
        assert_eq!(r.sync.state(), SyncState::Detached);
    }

    #[test]
    fn detach_is_idempotent_in_any_state() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.detach();
        r.sync.detach();
        assert_eq!(r.sync.state(), SyncState::Detached);

        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();
        r.sync.detach();
        r.sync.detach();
        assert_eq!(r.window.listener_count(), 0);
    }

    #[test]
    fn double_attach_registers_once() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();
        r.sync.attach().unwrap();
        assert_eq!(r.window.listener_count(), 1);

        r.window.resize_to(10.0, 10.0).unwrap();
        assert_eq!(r.camera.borrow().projections, 1);
    }

    #[test]
    fn reattach_after_detach_is_refused() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();
        r.sync.detach();

        assert_eq!(r.sync.attach(), Err(ViewportError::Reattach));
        assert_eq!(r.window.listener_count(), 0);
        assert_eq!(r.sync.state(), SyncState::Detached);
    }

    #[test]
    fn zero_height_propagates_infinite_aspect() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();
        r.window.resize_to(800.0, 0.0).unwrap();
        assert!(r.camera.borrow().aspect().is_infinite());

        r.window.resize_to(0.0, 0.0).unwrap();
        assert!(r.camera.borrow().aspect().is_nan());
    }

    #[test]
    fn target_error_reaches_dispatch_boundary() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();
        r.target.borrow_mut().fail_density = true;

        let err = r.window.resize_to(500.0, 250.0).unwrap_err();
        assert_eq!(err, ViewportError::Backend("density rejected".into()));
        // Steps before the failing one already ran.
        assert_eq!(*r.size.borrow(), ViewportSize::new(500.0, 250.0));
        assert_eq!(r.target.borrow().inner.output_size(), (500.0, 250.0));
    }

    #[test]
    fn borrowed_handle_surfaces_as_busy() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();

        let held = r.target.borrow();
        let err = r.window.resize_to(10.0, 20.0).unwrap_err();
        drop(held);
        assert_eq!(err, ViewportError::HandleBusy("renderer"));
    }

    #[test]
    fn dropping_the_sync_unsubscribes() {
        let mut r = rig(800.0, 600.0, 1.0);
        r.sync.attach().unwrap();
        let window = r.window.clone();
        assert_eq!(window.listener_count(), 1);

        drop(r);
        assert_eq!(window.listener_count(), 0);
    }

    #[test]
    fn sync_now_applies_current_metrics() {
        let r = rig(640.0, 320.0, 4.0);
        r.sync.sync_now().unwrap();
        assert_eq!(r.camera.borrow().aspect(), 2.0);
        assert_eq!(r.target.borrow().inner.pixel_density(), 2.0);
        assert_eq!(r.sync.state(), SyncState::Unattached);
    }

    #[test]
    fn sync_now_after_detach_changes_nothing() {
        let mut r = rig(640.0, 320.0, 1.0);
        r.sync.attach().unwrap();
        r.sync.detach();
        r.window.set_device_pixel_ratio(3.0);

        r.sync.sync_now().unwrap();
        assert_eq!(r.camera.borrow().aspect(), 1.0);
        assert!(r.target.borrow().inner.calls().is_empty());
        assert!(r.log.borrow().is_empty());
    }

    #[test]
    fn attach_resize_detach_scenario() {
        let window = Rc::new(HeadlessWindow::new(800.0, 600.0, 3.0));
        let size = ViewportSize::new(800.0, 600.0).shared();
        let camera = Rc::new(RefCell::new(viewport_render::PerspectiveCamera::default()));
        let target = Rc::new(RefCell::new(DebugTextTarget::new()));
        let mut sync =
            ViewportResizeSync::new(window.clone(), size.clone(), camera.clone(), target.clone());

        sync.attach().unwrap();
        window.resize_to(1920.0, 1080.0).unwrap();

        assert_eq!(*size.borrow(), ViewportSize::new(1920.0, 1080.0));
        assert!((camera.borrow().aspect() - 1.7778).abs() < 1e-4);
        assert_eq!(
            target.borrow().calls(),
            &[
                TargetCall::OutputSize {
                    width: 1920.0,
                    height: 1080.0
                },
                TargetCall::PixelDensity(2.0),
            ]
        );

        sync.detach();
        let projection = camera.borrow().projection_matrix();
        window.resize_to(640.0, 480.0).unwrap();

        assert_eq!(*size.borrow(), ViewportSize::new(1920.0, 1080.0));
        assert_eq!(camera.borrow().projection_matrix(), projection);
        assert_eq!(target.borrow().calls().len(), 2);
    }
}
