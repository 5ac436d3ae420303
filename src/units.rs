//! Unit conversion and the user's current unit selection.
//!
//! The provider always answers in metric base units (°C, km/h, mm); everything
//! shown on screen goes through one of the `convert` functions below.

pub mod temperature {
    use super::TemperatureUnit;

    pub fn c2f(temp_c: f64) -> f64 {
        temp_c * 9.0 / 5.0 + 32.0
    }

    pub fn convert(celsius: f64, target: TemperatureUnit) -> f64 {
        match target {
            TemperatureUnit::Fahrenheit => c2f(celsius),
            TemperatureUnit::Celsius => celsius,
        }
    }

    #[test]
    fn test_temperature() {
        assert_eq!(c2f(0.0), 32.0);
        assert_eq!(c2f(100.0), 212.0);
        assert_eq!(convert(0.0, TemperatureUnit::Fahrenheit), 32.0);
        assert_eq!(convert(100.0, TemperatureUnit::Fahrenheit), 212.0);
        for x in [-40.0, -3.5, 0.0, 21.7, 48.0] {
            assert_eq!(convert(x, TemperatureUnit::Celsius), x);
        }
    }
}

pub mod speed {
    use super::WindSpeedUnit;

    const KPM: f64 = 0.621371;

    pub fn kph2mph(kph: f64) -> f64 {
        kph * KPM
    }

    pub fn convert(kmh: f64, target: WindSpeedUnit) -> f64 {
        match target {
            WindSpeedUnit::Mph => kph2mph(kmh),
            WindSpeedUnit::Kmh => kmh,
        }
    }

    #[test]
    fn test_speed() {
        assert!((convert(10.0, WindSpeedUnit::Mph) - 6.21371).abs() < 1e-9);
        assert_eq!(convert(17.3, WindSpeedUnit::Kmh), 17.3);
    }
}

pub mod precipitation {
    use super::PrecipitationUnit;

    const MM_PER_INCH: f64 = 0.0393701;

    pub fn mm2in(mm: f64) -> f64 {
        mm * MM_PER_INCH
    }

    pub fn convert(mm: f64, target: PrecipitationUnit) -> f64 {
        match target {
            PrecipitationUnit::Inches => mm2in(mm),
            PrecipitationUnit::Mm => mm,
        }
    }

    #[test]
    fn test_precipitation() {
        assert!((convert(25.4, PrecipitationUnit::Inches) - 1.0).abs() < 1e-4);
        assert_eq!(convert(2.2, PrecipitationUnit::Mm), 2.2);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindSpeedUnit {
    #[default]
    Kmh,
    Mph,
}

impl WindSpeedUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Kmh => "km/h",
            Self::Mph => "mph",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrecipitationUnit {
    #[default]
    Mm,
    Inches,
}

impl PrecipitationUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Inches => "in",
        }
    }
}

/// Aggregate label derived from the three individual units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum System {
    #[default]
    Metric,
    Imperial,
}

impl System {
    pub fn label(self) -> &'static str {
        match self {
            Self::Metric => "Metric",
            Self::Imperial => "Imperial",
        }
    }
}

/// A change to exactly one unit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitChoice {
    Temperature(TemperatureUnit),
    WindSpeed(WindSpeedUnit),
    Precipitation(PrecipitationUnit),
}

/// Current unit selection. `system` is never set directly; it is recomputed
/// after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitsState {
    pub temperature: TemperatureUnit,
    pub wind_speed: WindSpeedUnit,
    pub precipitation: PrecipitationUnit,
    system: System,
}

impl UnitsState {
    pub fn system(&self) -> System {
        self.system
    }

    pub fn apply(&mut self, choice: UnitChoice) {
        match choice {
            UnitChoice::Temperature(unit) => self.temperature = unit,
            UnitChoice::WindSpeed(unit) => self.wind_speed = unit,
            UnitChoice::Precipitation(unit) => self.precipitation = unit,
        }
        self.system = self.derive_system();
    }

    pub fn switch_to_imperial(&mut self) {
        *self = Self {
            temperature: TemperatureUnit::Fahrenheit,
            wind_speed: WindSpeedUnit::Mph,
            precipitation: PrecipitationUnit::Inches,
            system: System::Imperial,
        };
    }

    pub fn is_selected(&self, choice: UnitChoice) -> bool {
        match choice {
            UnitChoice::Temperature(unit) => self.temperature == unit,
            UnitChoice::WindSpeed(unit) => self.wind_speed == unit,
            UnitChoice::Precipitation(unit) => self.precipitation == unit,
        }
    }

    // Imperial as soon as any one category is imperial.
    fn derive_system(&self) -> System {
        if self.temperature == TemperatureUnit::Fahrenheit
            || self.wind_speed == WindSpeedUnit::Mph
            || self.precipitation == PrecipitationUnit::Inches
        {
            System::Imperial
        } else {
            System::Metric
        }
    }
}

/// One entry of the units dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOption {
    Imperial,
    Unit(UnitChoice),
}

impl UnitOption {
    pub const ALL: [UnitOption; 7] = [
        UnitOption::Imperial,
        UnitOption::Unit(UnitChoice::Temperature(TemperatureUnit::Celsius)),
        UnitOption::Unit(UnitChoice::Temperature(TemperatureUnit::Fahrenheit)),
        UnitOption::Unit(UnitChoice::WindSpeed(WindSpeedUnit::Kmh)),
        UnitOption::Unit(UnitChoice::WindSpeed(WindSpeedUnit::Mph)),
        UnitOption::Unit(UnitChoice::Precipitation(PrecipitationUnit::Mm)),
        UnitOption::Unit(UnitChoice::Precipitation(PrecipitationUnit::Inches)),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Imperial => "Switch to Imperial",
            Self::Unit(UnitChoice::Temperature(TemperatureUnit::Celsius)) => "Celsius (°C)",
            Self::Unit(UnitChoice::Temperature(TemperatureUnit::Fahrenheit)) => "Fahrenheit (°F)",
            Self::Unit(UnitChoice::WindSpeed(WindSpeedUnit::Kmh)) => "km/h",
            Self::Unit(UnitChoice::WindSpeed(WindSpeedUnit::Mph)) => "mph",
            Self::Unit(UnitChoice::Precipitation(PrecipitationUnit::Mm)) => "Millimeters (mm)",
            Self::Unit(UnitChoice::Precipitation(PrecipitationUnit::Inches)) => "Inches (in)",
        }
    }

    /// The "Switch to Imperial" entry is an action and never shows as selected.
    pub fn is_selected(self, units: &UnitsState) -> bool {
        match self {
            Self::Imperial => false,
            Self::Unit(choice) => units.is_selected(choice),
        }
    }
}
