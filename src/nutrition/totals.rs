use std::{iter::Sum, ops::Add};

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl MacroTotals {
    /// Totals for `servings` portions given per-serving values.
    pub fn scaled(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64, servings: f64) -> Self {
        Self {
            calories: calories * servings,
            protein_g: protein_g * servings,
            carbs_g: carbs_g * servings,
            fat_g: fat_g * servings,
        }
    }

    pub fn divided_by(&self, n: usize) -> Self {
        if n == 0 {
            return Self::default();
        }
        let n = n as f64;
        Self {
            calories: self.calories / n,
            protein_g: self.protein_g / n,
            carbs_g: self.carbs_g / n,
            fat_g: self.fat_g / n,
        }
    }
}

impl Add for MacroTotals {
    type Output = MacroTotals;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            calories: self.calories + rhs.calories,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
        }
    }
}

impl Sum for MacroTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
