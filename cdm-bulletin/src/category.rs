use serde::{Deserialize, Serialize};
use std::fmt;

/// Drought severity category of the monitor bulletin.
/// - `Sa`: no effect ("sin afectación")
/// - `D0`..`D4`: abnormally dry through exceptional drought
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "SA")]
    Sa,
    D0,
    D1,
    D2,
    D3,
    D4,
}

impl Category {
    /// The six fixed categories, in bulletin order.
    pub const ALL: [Category; 6] = [
        Category::Sa,
        Category::D0,
        Category::D1,
        Category::D2,
        Category::D3,
        Category::D4,
    ];

    /// Property name in bulletin payloads and GeoJSON features.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Sa => "SA",
            Category::D0 => "D0",
            Category::D1 => "D1",
            Category::D2 => "D2",
            Category::D3 => "D3",
            Category::D4 => "D4",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One value per drought category. Serializes as `{SA, D0, D1, D2, D3, D4}`.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct ByCategory<T> {
    #[serde(rename = "SA")]
    pub sa: T,
    #[serde(rename = "D0")]
    pub d0: T,
    #[serde(rename = "D1")]
    pub d1: T,
    #[serde(rename = "D2")]
    pub d2: T,
    #[serde(rename = "D3")]
    pub d3: T,
    #[serde(rename = "D4")]
    pub d4: T,
}

/// Percent of area per category.
pub type CategoryValues = ByCategory<f64>;

impl<T> ByCategory<T> {
    /// Build by evaluating `f` for each category.
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> ByCategory<T> {
        ByCategory {
            sa: f(Category::Sa),
            d0: f(Category::D0),
            d1: f(Category::D1),
            d2: f(Category::D2),
            d3: f(Category::D3),
            d4: f(Category::D4),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Sa => &self.sa,
            Category::D0 => &self.d0,
            Category::D1 => &self.d1,
            Category::D2 => &self.d2,
            Category::D3 => &self.d3,
            Category::D4 => &self.d4,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Sa => &mut self.sa,
            Category::D0 => &mut self.d0,
            Category::D1 => &mut self.d1,
            Category::D2 => &mut self.d2,
            Category::D3 => &mut self.d3,
            Category::D4 => &mut self.d4,
        }
    }

    /// Iterate `(category, value)` pairs in bulletin order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> ByCategory<U> {
        ByCategory::from_fn(|c| f(self.get(c)))
    }
}
