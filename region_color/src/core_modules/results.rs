use crate::core_modules::partial_sum::Rgb;

/// A computed representative color.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Label of the result, initially the name of the source image.
    pub name: String,
    /// Red channel, 0.0-255.0.
    pub r: f64,
    /// Green channel, 0.0-255.0.
    pub g: f64,
    /// Blue channel, 0.0-255.0.
    pub b: f64,
}

impl Color {
    pub fn new(name: impl Into<String>, rgb: Rgb) -> Self {
        Self {
            name: name.into(),
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
        }
    }

    pub fn channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}

/// The ordered collection computed colors are appended to.
#[derive(Debug, Clone, Default)]
pub struct ResultList {
    colors: Vec<Color>,
}

impl ResultList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, color: Color) {
        self.colors.push(color);
    }

    /// Renames the result at `index`. Returns false if there is none.
    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.colors.get_mut(index) {
            Some(color) => {
                color.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Color> {
        (index < self.colors.len()).then(|| self.colors.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Color> {
        self.colors.get(index)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.colors.iter()
    }

    pub fn snapshot(&self) -> Vec<Color> {
        self.colors.clone()
    }
}
