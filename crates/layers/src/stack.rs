//! The ordered, name-addressed image layer stack.

use crate::survey::Survey;

/// The reserved bottom layer name.
pub const BASE_LAYER: &str = "base";

/// Layers bottom to top; compositing follows iteration order.
///
/// Notes:
/// - `set_layer` replaces in place when the name exists, preserving z-order.
/// - The name `"base"` is always forced to index 0.
/// - The `empty` flag drives the embedder's fallback display: it is raised
///   when the base layer fails to load or the last layer is removed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LayerStack {
    layers: Vec<Survey>,
    active: Option<String>,
    empty: bool,
}

impl LayerStack {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            active: None,
            empty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The embedder-visible "nothing to show" flag.
    pub fn empty_flag(&self) -> bool {
        self.empty
    }

    /// Bottom-to-top iteration, the compositing order.
    pub fn iter(&self) -> impl Iterator<Item = &Survey> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Survey> {
        self.layers.iter_mut()
    }

    pub fn get(&self, name: &str) -> Option<&Survey> {
        self.layers.iter().find(|s| s.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Survey> {
        self.layers.iter_mut().find(|s| s.name() == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|s| s.name() == name)
    }

    pub fn active(&self) -> Option<&Survey> {
        let name = self.active.as_deref()?;
        self.get(name)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Inserts a new layer on top, or replaces an existing one in place.
    /// The layer becomes active either way.
    pub fn set_layer(&mut self, survey: Survey) {
        let name = survey.name().to_owned();
        match self.index_of(&name) {
            Some(i) => self.layers[i] = survey,
            None => self.layers.push(survey),
        }
        if name == BASE_LAYER
            && let Some(i) = self.index_of(BASE_LAYER)
            && i != 0
        {
            let base = self.layers.remove(i);
            self.layers.insert(0, base);
        }
        self.active = Some(name);
        self.empty = false;
    }

    /// Removes a layer; when it was active, the topmost remaining layer
    /// takes over. Returns `false` for an unknown name.
    pub fn remove_layer(&mut self, name: &str) -> bool {
        let Some(i) = self.index_of(name) else {
            return false;
        };
        self.layers.remove(i);
        if self.active.as_deref() == Some(name) {
            self.active = self.layers.last().map(|s| s.name().to_owned());
        }
        if self.layers.is_empty() {
            self.empty = true;
        }
        true
    }

    /// Metadata load failure: the layer is dropped entirely, and losing the
    /// base layer raises the empty flag even if overlays remain.
    pub fn mark_load_failure(&mut self, name: &str) -> bool {
        let removed = self.remove_layer(name);
        if name == BASE_LAYER {
            self.empty = true;
        }
        removed
    }

    /// Renames a layer. Fails if the new name is taken. Renaming to
    /// `"base"` sinks the layer to the bottom.
    pub fn rename_layer(&mut self, from: &str, to: &str) -> bool {
        if from == to || self.index_of(to).is_some() {
            return false;
        }
        let Some(i) = self.index_of(from) else {
            return false;
        };
        self.layers[i].rename(to);
        if to == BASE_LAYER && i != 0 {
            let base = self.layers.remove(i);
            self.layers.insert(0, base);
        }
        if self.active.as_deref() == Some(from) {
            self.active = Some(to.to_owned());
        }
        true
    }

    /// Swaps the z positions of two layers. The base layer stays at the
    /// bottom, so swapping it is refused.
    pub fn swap_layers(&mut self, a: &str, b: &str) -> bool {
        if a == BASE_LAYER || b == BASE_LAYER {
            return false;
        }
        let (Some(i), Some(j)) = (self.index_of(a), self.index_of(b)) else {
            return false;
        };
        self.layers.swap(i, j);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{BASE_LAYER, LayerStack};
    use crate::survey::Survey;
    use pretty_assertions::assert_eq;
    use streaming::properties::parse_properties;

    fn survey(name: &str) -> Survey {
        let props = parse_properties("hips_order = 5\n").unwrap();
        Survey::from_properties(name, "http://hips/x", &props)
    }

    #[test]
    fn base_added_last_still_sinks_to_the_bottom() {
        let mut stack = LayerStack::new();
        stack.set_layer(survey("halpha"));
        stack.set_layer(survey("xray"));
        stack.set_layer(survey(BASE_LAYER));

        let names: Vec<&str> = stack.iter().map(|s| s.name()).collect();
        assert_eq!(names, [BASE_LAYER, "halpha", "xray"]);
        assert_eq!(stack.active_name(), Some(BASE_LAYER));

        // Removing the active base promotes the topmost remaining layer.
        assert!(stack.remove_layer(BASE_LAYER));
        assert_eq!(stack.active_name(), Some("xray"));
        assert!(!stack.empty_flag());
    }

    #[test]
    fn replace_in_place_preserves_z_order() {
        let mut stack = LayerStack::new();
        stack.set_layer(survey("a"));
        stack.set_layer(survey("b"));
        stack.set_layer(survey("a"));
        let names: Vec<&str> = stack.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(stack.active_name(), Some("a"));
    }

    #[test]
    fn last_removal_raises_the_empty_flag() {
        let mut stack = LayerStack::new();
        assert!(stack.empty_flag());
        stack.set_layer(survey("a"));
        assert!(!stack.empty_flag());
        stack.remove_layer("a");
        assert!(stack.empty_flag());
        assert_eq!(stack.active_name(), None);
    }

    #[test]
    fn base_load_failure_empties_the_viewer() {
        let mut stack = LayerStack::new();
        stack.set_layer(survey(BASE_LAYER));
        stack.set_layer(survey("overlay"));
        assert!(stack.mark_load_failure(BASE_LAYER));
        assert!(stack.empty_flag());
        assert_eq!(stack.len(), 1);
        // A non-base failure does not.
        let mut stack = LayerStack::new();
        stack.set_layer(survey(BASE_LAYER));
        stack.set_layer(survey("overlay"));
        assert!(stack.mark_load_failure("overlay"));
        assert!(!stack.empty_flag());
    }

    #[test]
    fn rename_and_swap() {
        let mut stack = LayerStack::new();
        stack.set_layer(survey(BASE_LAYER));
        stack.set_layer(survey("a"));
        stack.set_layer(survey("b"));

        assert!(!stack.rename_layer("a", "b")); // taken
        assert!(stack.rename_layer("a", "c"));
        assert!(stack.get("c").is_some());

        assert!(stack.swap_layers("c", "b"));
        let names: Vec<&str> = stack.iter().map(|s| s.name()).collect();
        assert_eq!(names, [BASE_LAYER, "b", "c"]);
        assert!(!stack.swap_layers(BASE_LAYER, "b"));
    }
}
