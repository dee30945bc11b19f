use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Macronutrient with a fixed energy-per-gram factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MacroKind {
    Carb,
    Protein,
    Fat,
}

impl MacroKind {
    /// kcal per gram.
    pub fn factor(self) -> f64 {
        match self {
            MacroKind::Carb | MacroKind::Protein => 4.0,
            MacroKind::Fat => 9.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MacroKind::Carb => "CARB",
            MacroKind::Protein => "PROTEIN",
            MacroKind::Fat => "FAT",
        }
    }
}

impl fmt::Display for MacroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MacroKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARB" => Ok(MacroKind::Carb),
            "PROTEIN" => Ok(MacroKind::Protein),
            "FAT" => Ok(MacroKind::Fat),
            _ => Err(AppError::InvalidMacroKind(s.to_string())),
        }
    }
}

/// Exact product of grams and the kind's factor, no rounding.
pub fn calories(grams: f64, kind: MacroKind) -> f64 {
    grams * kind.factor()
}

pub fn calories_from_macros(protein_g: f64, carbs_g: f64, fat_g: f64) -> f64 {
    calories(protein_g, MacroKind::Protein)
        + calories(carbs_g, MacroKind::Carb)
        + calories(fat_g, MacroKind::Fat)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacronutrientAmount {
    grams: f64,
    kind: MacroKind,
}

impl MacronutrientAmount {
    pub fn new(grams: f64, kind: MacroKind) -> Result<Self, AppError> {
        if !grams.is_finite() || grams < 0.0 {
            return Err(AppError::validation("grams must be a non-negative number"));
        }
        Ok(Self { grams, kind })
    }

    pub fn calories(&self) -> CalorieResult {
        CalorieResult {
            calories: calories(self.grams, self.kind),
            kind: self.kind,
            grams: self.grams,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalorieResult {
    pub calories: f64,
    pub kind: MacroKind,
    pub grams: f64,
}
