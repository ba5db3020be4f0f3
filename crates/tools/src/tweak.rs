use std::ops::RangeInclusive;
use viewport_sync::ControlPanel;

/// One tunable value shown in a [`TweakPanel`].
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Slider {
        label: String,
        value: f32,
        range: RangeInclusive<f32>,
    },
    Toggle {
        label: String,
        value: bool,
    },
}

impl Binding {
    pub fn label(&self) -> &str {
        match self {
            Binding::Slider { label, .. } | Binding::Toggle { label, .. } => label,
        }
    }
}

/// Floating egui window holding named sliders and toggles.
pub struct TweakPanel {
    title: String,
    bindings: Vec<Binding>,
    visible: bool,
    disposed: bool,
}

impl TweakPanel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bindings: Vec::new(),
            visible: true,
            disposed: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Add a float slider. The value is clamped into `range`.
    pub fn add_slider(&mut self, label: impl Into<String>, value: f32, range: RangeInclusive<f32>) {
        let value = value.clamp(*range.start(), *range.end());
        self.bindings.push(Binding::Slider {
            label: label.into(),
            value,
            range,
        });
    }

    pub fn add_toggle(&mut self, label: impl Into<String>, value: bool) {
        self.bindings.push(Binding::Toggle {
            label: label.into(),
            value,
        });
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn slider(&self, label: &str) -> Option<f32> {
        self.bindings.iter().find_map(|b| match b {
            Binding::Slider { label: l, value, .. } if l == label => Some(*value),
            _ => None,
        })
    }

    pub fn toggle(&self, label: &str) -> Option<bool> {
        self.bindings.iter().find_map(|b| match b {
            Binding::Toggle { label: l, value } if l == label => Some(*value),
            _ => None,
        })
    }

    /// Set a slider from code, clamped to its range. Returns false if no such slider.
    pub fn set_slider(&mut self, label: &str, new_value: f32) -> bool {
        for binding in &mut self.bindings {
            if let Binding::Slider { label: l, value, range } = binding {
                if l.as_str() == label {
                    *value = new_value.clamp(*range.start(), *range.end());
                    return true;
                }
            }
        }
        false
    }

    pub fn is_visible(&self) -> bool {
        self.visible && !self.disposed
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Draw the panel. Returns true if any binding changed this frame.
    pub fn show(&mut self, ctx: &egui::Context) -> bool {
        if !self.is_visible() {
            return false;
        }

        let mut changed = false;
        let bindings = &mut self.bindings;
        egui::Window::new(self.title.as_str())
            .default_width(240.0)
            .resizable(false)
            .show(ctx, |ui| {
                for binding in bindings.iter_mut() {
                    match binding {
                        Binding::Slider { label, value, range } => {
                            let slider = egui::Slider::new(value, range.clone()).text(label.as_str());
                            changed |= ui.add(slider).changed();
                        }
                        Binding::Toggle { label, value } => {
                            changed |= ui.checkbox(value, label.as_str()).changed();
                        }
                    }
                }
            });
        changed
    }
}

impl ControlPanel for TweakPanel {
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.bindings.clear();
        self.disposed = true;
        tracing::debug!(title = %self.title, "tweak panel disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewport_sync::{HostComponent, bind_control_panel};

    fn panel() -> TweakPanel {
        let mut panel = TweakPanel::new("Debug");
        panel.add_slider("elevation", 2.0, 0.0..=10.0);
        panel.add_slider("exposure", 5.0, 0.0..=1.0);
        panel.add_toggle("wireframe", false);
        panel
    }

    #[test]
    fn bindings_are_queryable() {
        let panel = panel();
        assert_eq!(panel.slider("elevation"), Some(2.0));
        assert_eq!(panel.slider("exposure"), Some(1.0));
        assert_eq!(panel.toggle("wireframe"), Some(false));
        assert_eq!(panel.slider("wireframe"), None);
        assert_eq!(panel.bindings()[2].label(), "wireframe");
    }

    #[test]
    fn set_slider_clamps() {
        let mut panel = panel();
        assert!(panel.set_slider("elevation", 42.0));
        assert_eq!(panel.slider("elevation"), Some(10.0));
        assert!(!panel.set_slider("missing", 1.0));
    }

    #[test]
    fn dispose_clears_and_hides() {
        let mut panel = panel();
        panel.dispose();
        assert!(panel.is_disposed());
        assert!(!panel.is_visible());
        assert!(panel.bindings().is_empty());

        let ctx = egui::Context::default();
        let mut changed = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            changed = panel.show(ctx);
        });
        assert!(!changed);
    }

    #[test]
    fn shows_without_changes_when_idle() {
        let mut panel = panel();
        let ctx = egui::Context::default();
        let mut changed = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            changed = panel.show(ctx);
        });
        assert!(!changed);
    }

    #[test]
    fn host_unmount_disposes_panel() {
        let mut host = HostComponent::new("viewport");
        let lifecycle = bind_control_panel(&mut host, || Ok::<_, ()>(panel())).unwrap();
        host.mount().unwrap();

        host.unmount();
        assert!(lifecycle.borrow().is_disposed());
    }
}
