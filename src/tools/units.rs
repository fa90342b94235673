//! Unit converter
//!
//! Temperature converts through Celsius. Every other category is a table of
//! factors relative to one base unit.

use serde::{Deserialize, Serialize};

use super::{ToolError, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    #[serde(alias = "c")]
    Celsius,
    #[serde(alias = "f")]
    Fahrenheit,
    #[serde(alias = "k")]
    Kelvin,
}

impl std::str::FromStr for Temperature {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" | "°c" => Ok(Self::Celsius),
            "f" | "fahrenheit" | "°f" => Ok(Self::Fahrenheit),
            "k" | "kelvin" => Ok(Self::Kelvin),
            other => Err(ToolError::UnknownUnit(other.to_string())),
        }
    }
}

pub fn convert_temperature(value: f64, from: Temperature, to: Temperature) -> ToolResult<f64> {
    if !value.is_finite() {
        return Err(ToolError::invalid_input("value must be a finite number"));
    }
    let celsius = match from {
        Temperature::Celsius => value,
        Temperature::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        Temperature::Kelvin => value - 273.15,
    };
    if celsius < -273.15 - 1e-9 {
        return Err(ToolError::out_of_range("temperature below absolute zero"));
    }
    Ok(match to {
        Temperature::Celsius => celsius,
        Temperature::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        Temperature::Kelvin => celsius + 273.15,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Length,
    Mass,
    Data,
    Time,
    Area,
    Volume,
    Speed,
}

// Factors convert one unit into the category's base unit.
const LENGTH: &[(&str, f64)] = &[
    ("mm", 0.001),
    ("cm", 0.01),
    ("m", 1.0),
    ("km", 1000.0),
    ("in", 0.0254),
    ("ft", 0.3048),
    ("yd", 0.9144),
    ("mi", 1609.344),
    ("nmi", 1852.0),
];

const MASS: &[(&str, f64)] = &[
    ("mg", 0.000_001),
    ("g", 0.001),
    ("kg", 1.0),
    ("t", 1000.0),
    ("oz", 0.028_349_523_125),
    ("lb", 0.453_592_37),
    ("st", 6.350_293_18),
];

const DATA: &[(&str, f64)] = &[
    ("bit", 0.125),
    ("b", 1.0),
    ("kb", 1e3),
    ("mb", 1e6),
    ("gb", 1e9),
    ("tb", 1e12),
    ("pb", 1e15),
    ("kib", 1024.0),
    ("mib", 1_048_576.0),
    ("gib", 1_073_741_824.0),
    ("tib", 1_099_511_627_776.0),
    ("pib", 1_125_899_906_842_624.0),
];

const TIME: &[(&str, f64)] = &[
    ("ns", 1e-9),
    ("us", 1e-6),
    ("ms", 1e-3),
    ("s", 1.0),
    ("min", 60.0),
    ("h", 3600.0),
    ("d", 86_400.0),
    ("wk", 604_800.0),
    ("yr", 31_557_600.0),
];

const AREA: &[(&str, f64)] = &[
    ("mm2", 1e-6),
    ("cm2", 1e-4),
    ("m2", 1.0),
    ("ha", 10_000.0),
    ("km2", 1e6),
    ("in2", 0.000_645_16),
    ("ft2", 0.092_903_04),
    ("ac", 4_046.856_422_4),
    ("mi2", 2_589_988.110_336),
];

const VOLUME: &[(&str, f64)] = &[
    ("ml", 0.001),
    ("l", 1.0),
    ("m3", 1000.0),
    ("tsp", 0.004_928_921_593_75),
    ("tbsp", 0.014_786_764_781_25),
    ("floz", 0.029_573_529_562_5),
    ("cup", 0.236_588_236_5),
    ("pt", 0.473_176_473),
    ("qt", 0.946_352_946),
    ("gal", 3.785_411_784),
];

const SPEED: &[(&str, f64)] = &[
    ("m/s", 1.0),
    ("km/h", 1.0 / 3.6),
    ("mph", 0.447_04),
    ("kn", 1852.0 / 3600.0),
    ("ft/s", 0.3048),
];

impl Category {
    fn table(self) -> &'static [(&'static str, f64)] {
        match self {
            Self::Length => LENGTH,
            Self::Mass => MASS,
            Self::Data => DATA,
            Self::Time => TIME,
            Self::Area => AREA,
            Self::Volume => VOLUME,
            Self::Speed => SPEED,
        }
    }

    /// Unit symbols accepted by this category
    pub fn units(self) -> Vec<&'static str> {
        self.table().iter().map(|(unit, _)| *unit).collect()
    }

    fn factor(self, unit: &str) -> ToolResult<f64> {
        let unit = unit.trim().to_ascii_lowercase();
        self.table()
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, factor)| *factor)
            .ok_or_else(|| ToolError::UnknownUnit(unit))
    }
}

/// Convert `value` between two units of the same category
pub fn convert(category: Category, value: f64, from: &str, to: &str) -> ToolResult<f64> {
    if !value.is_finite() {
        return Err(ToolError::invalid_input("value must be a finite number"));
    }
    let from_factor = category.factor(from)?;
    let to_factor = category.factor(to)?;
    Ok(value * from_factor / to_factor)
}
