//! Drawable primitives and the host canvas seam
//!
//! The image viewer hosting the mask builder owns the actual drawing surface.
//! This crate only describes what to draw through [Drawable] and hands it to a
//! [Canvas] under a string tag, so that groups can later be replaced or removed
//! by tag.

use derive_more::Display;
use glam::DVec2;

use crate::math::Degree;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    #[display(fmt = "white")]
    White,
    #[display(fmt = "yellow")]
    Yellow,
    #[display(fmt = "purple")]
    Purple,
    #[display(fmt = "red")]
    Red,
    #[display(fmt = "green")]
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub color: Color,
    pub dashed: bool,
    pub fill: bool,
}
impl Style {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            dashed: false,
            fill: false,
        }
    }
    pub fn dashed(color: Color) -> Self {
        Self {
            color,
            dashed: true,
            fill: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Circle {
        center: DVec2,
        radius: f64,
        style: Style,
    },
    /// Rectangle rotated by `rotation` about its center
    Rectangle {
        center: DVec2,
        half_size: DVec2,
        rotation: Degree,
        style: Style,
    },
    Line {
        from: DVec2,
        to: DVec2,
        style: Style,
    },
    Text {
        at: DVec2,
        text: String,
        rotation: Degree,
        style: Style,
    },
    Compound(Vec<Drawable>),
}
impl Drawable {
    /// Number of leaf primitives, compounds are flattened
    pub fn primitive_count(&self) -> usize {
        match self {
            Drawable::Compound(items) => items.iter().map(Drawable::primitive_count).sum(),
            _ => 1,
        }
    }
}

/// Drawing surface exposed by the host image viewer
pub trait Canvas {
    /// Add `drawable` under `tag`, replacing any object already holding it
    fn add(&mut self, tag: &str, drawable: Drawable);

    fn delete_by_tag(&mut self, tag: &str) -> Option<Drawable>;

    /// Delete every object whose tag starts with `prefix`, returning how many went
    fn delete_by_prefix(&mut self, prefix: &str) -> usize;

    fn get(&self, tag: &str) -> Option<&Drawable>;

    fn tags(&self) -> Vec<String>;

    fn clear(&mut self);

    fn redraw(&mut self);
}

/// In-memory canvas keeping objects in insertion order
#[derive(Debug, Default, Clone)]
pub struct MemoryCanvas {
    objects: Vec<(String, Drawable)>,
    redraws: usize,
}
impl MemoryCanvas {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn redraws(&self) -> usize {
        self.redraws
    }
    pub fn len(&self) -> usize {
        self.objects.len()
    }
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Canvas for MemoryCanvas {
    fn add(&mut self, tag: &str, drawable: Drawable) {
        match self.objects.iter_mut().find(|(t, _)| t == tag) {
            Some(slot) => slot.1 = drawable,
            None => self.objects.push((tag.to_string(), drawable)),
        }
    }

    fn delete_by_tag(&mut self, tag: &str) -> Option<Drawable> {
        let idx = self.objects.iter().position(|(t, _)| t == tag)?;
        Some(self.objects.remove(idx).1)
    }

    fn delete_by_prefix(&mut self, prefix: &str) -> usize {
        let before = self.objects.len();
        self.objects.retain(|(t, _)| !t.starts_with(prefix));
        before - self.objects.len()
    }

    fn get(&self, tag: &str) -> Option<&Drawable> {
        self.objects
            .iter()
            .find_map(|(t, d)| if t == tag { Some(d) } else { None })
    }

    fn tags(&self) -> Vec<String> {
        self.objects.iter().map(|(t, _)| t.clone()).collect()
    }

    fn clear(&mut self) {
        self.objects.clear();
    }

    fn redraw(&mut self) {
        self.redraws += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dot(x: f64) -> Drawable {
        Drawable::Circle {
            center: DVec2::new(x, 0.0),
            radius: 1.0,
            style: Style::solid(Color::White),
        }
    }

    #[test]
    fn test_add_replaces_same_tag() {
        let mut canvas = MemoryCanvas::new();
        canvas.add("slit0", dot(1.0));
        canvas.add("hole1", dot(2.0));
        canvas.add("slit0", dot(3.0));
        assert_eq!(canvas.tags(), vec!["slit0", "hole1"]);
        assert_eq!(canvas.get("slit0"), Some(&dot(3.0)));
    }

    #[test]
    fn test_delete_by_prefix() {
        let mut canvas = MemoryCanvas::new();
        for tag in ["label0", "label_hole1", "slit0", "spectra_bundle"] {
            canvas.add(tag, dot(0.0));
        }
        assert_eq!(canvas.delete_by_prefix("label"), 2);
        assert_eq!(canvas.tags(), vec!["slit0", "spectra_bundle"]);
        assert!(canvas.delete_by_tag("slit0").is_some());
        assert!(canvas.delete_by_tag("slit0").is_none());
    }

    #[test]
    fn test_primitive_count() {
        let group = Drawable::Compound(vec![dot(0.0), Drawable::Compound(vec![dot(1.0), dot(2.0)])]);
        assert_eq!(group.primitive_count(), 3);
    }
}
