//! Static description of each supported oscilloscope family.
//!
//! A driver is parameterized by one [`Variant`], picked at construction from
//! a model name or from the `*IDN?` reply.

use std::fmt;

/// `AUToscale:PLACement` modes of the UXR/MXR families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Every channel in one grid, lower ADC resolution.
    Stack,
    /// One grid per channel at full ADC resolution.
    Separate,
    Overlay,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Stack => "STACk",
            Placement::Separate => "SEParate",
            Placement::Overlay => "OVERlay",
        }
    }
}

/// How the count column of a statistics reply is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountRule {
    /// `100`
    Integer,
    /// `1.00E+02`, truncated to an integer.
    Float,
}

impl CountRule {
    pub fn parse(&self, field: &str) -> Option<u64> {
        let field = field.trim();
        match self {
            CountRule::Integer => field.parse::<u64>().ok(),
            CountRule::Float => {
                let value = field.parse::<f64>().ok()?;
                if value.is_finite() && value >= 0.0 {
                    Some(value.trunc() as u64)
                } else {
                    None
                }
            }
        }
    }
}

/// Screen capture command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hardcopy {
    /// InfiniiVision: ink saver must be off for a true color image.
    InkSaverPng,
    /// Infiniium
    Png,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Variant {
    pub name: &'static str,
    pub description: &'static str,
    pub max_channels: u8,
    /// Most channels a single `AUToscale` accepts.
    pub autoscale_limit: usize,
    /// Written as `AUToscale:PLACement` before every autoscale.
    pub placement: Option<Placement>,
    pub count_rule: CountRule,
    /// Statistics must be brought up in the measure menu before reading.
    pub statistics_menu: bool,
    pub dvm: bool,
    /// Has the MSO digital bus (`D0`..`D15`, `POD1`, `POD2`).
    pub digital: bool,
    pub hardcopy: Hardcopy,
}

pub static MSOX3000: Variant = Variant {
    name: "MSOX3000",
    description: "HP/Agilent/Keysight MSO-X/DSO-X 3000A Oscilloscope",
    max_channels: 4,
    autoscale_limit: 5,
    placement: None,
    count_rule: CountRule::Integer,
    statistics_menu: true,
    dvm: true,
    digital: true,
    hardcopy: Hardcopy::InkSaverPng,
};

const INFINIIUM: Variant = Variant {
    name: "UXR",
    description: "Keysight UXR Series Oscilloscope",
    max_channels: 2,
    autoscale_limit: 5,
    placement: Some(Placement::Separate),
    count_rule: CountRule::Float,
    statistics_menu: false,
    dvm: false,
    digital: false,
    hardcopy: Hardcopy::Png,
};

pub static UXR: Variant = INFINIIUM;

pub static UXR_XXX2A: Variant = Variant {
    name: "UXRxxx2A",
    description: "Keysight UXRxxx2A/UXRxxx2AP 2-Channel Oscilloscope",
    ..INFINIIUM
};

pub static UXR_XXX4A: Variant = Variant {
    name: "UXRxxx4A",
    description: "Keysight UXRxxx4A/UXRxxx4AP 4-Channel Oscilloscope",
    max_channels: 4,
    ..INFINIIUM
};

pub static MXR: Variant = Variant {
    name: "MXR",
    description: "Keysight MXR Series Oscilloscope",
    max_channels: 4,
    ..INFINIIUM
};

pub static MXR058A: Variant = Variant {
    name: "MXR058A",
    description: "Keysight MXR058A Oscilloscope",
    max_channels: 8,
    ..INFINIIUM
};

pub static VARIANTS: [&Variant; 6] = [&MSOX3000, &UXR, &UXR_XXX2A, &UXR_XXX4A, &MXR, &MXR058A];

impl Variant {
    /// Looks a variant up by its name, ignoring case.
    pub fn by_name(name: &str) -> Option<&'static Variant> {
        VARIANTS
            .iter()
            .copied()
            .find(|v| v.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Picks the variant matching the model field of an `*IDN?` reply,
    /// e.g. `MSO-X 3054A`, `UXR0594AP`, `MXR058A`.
    pub fn detect(idn_model: &str) -> Option<&'static Variant> {
        let model: String = idn_model
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();
        if model.starts_with("MSOX3") || model.starts_with("DSOX3") {
            Some(&MSOX3000)
        } else if model.starts_with("UXR") {
            let model = model.trim_end_matches('P');
            if model.ends_with("4A") {
                Some(&UXR_XXX4A)
            } else if model.ends_with("2A") {
                Some(&UXR_XXX2A)
            } else {
                Some(&UXR)
            }
        } else if model.starts_with("MXR058") {
            Some(&MXR058A)
        } else if model.starts_with("MXR") {
            Some(&MXR)
        } else {
            None
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_from_idn_model() {
        assert_eq!(Variant::detect("MSO-X 3054A"), Some(&MSOX3000));
        assert_eq!(Variant::detect("DSO-X 3024A"), Some(&MSOX3000));
        assert_eq!(Variant::detect("UXR0594AP"), Some(&UXR_XXX4A));
        assert_eq!(Variant::detect("UXR0332A"), Some(&UXR_XXX2A));
        assert_eq!(Variant::detect("MXR058A"), Some(&MXR058A));
        assert_eq!(Variant::detect("MXR254A"), Some(&MXR));
        assert_eq!(Variant::detect("34461A"), None);
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Variant::by_name("uxrxxx4a"), Some(&UXR_XXX4A));
        assert_eq!(Variant::by_name("msox3000"), Some(&MSOX3000));
        assert!(Variant::by_name("TDS2024").is_none());
    }

    #[test]
    fn family_traits() {
        for v in VARIANTS {
            assert_eq!(v.autoscale_limit, 5);
        }
        assert_eq!(MXR058A.max_channels, 8);
        assert_eq!(MXR058A.placement, Some(Placement::Separate));
        assert!(!UXR_XXX4A.dvm);
        assert_eq!(UXR_XXX2A.count_rule, CountRule::Float);
    }

    #[test]
    fn count_rules() {
        assert_eq!(CountRule::Integer.parse("100"), Some(100));
        assert_eq!(CountRule::Integer.parse("1.00E+02"), None);
        assert_eq!(CountRule::Float.parse("1.00E+02"), Some(100));
        assert_eq!(CountRule::Float.parse("42.9"), Some(42));
        assert_eq!(CountRule::Float.parse("nan"), None);
    }
}
