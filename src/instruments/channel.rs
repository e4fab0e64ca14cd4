use std::{fmt, str::FromStr};

use crate::error::Error;

use super::models::Variant;

/// A waveform source on the oscilloscope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// `1`, `2`, ... (`CHANnel<n>`)
    Analog(u8),
    /// `D0`..`D15` (`DIGital<n>`)
    Digital(u8),
    /// `POD1`, `POD2`
    Pod(u8),
    /// `FUNC<n>` (`FUNCtion<n>`)
    Function(u8),
    Math,
    /// `WMEM<n>` (`WMEMory<n>`)
    WMemory(u8),
}

impl Default for Channel {
    fn default() -> Self {
        Channel::Analog(1)
    }
}

impl From<u8> for Channel {
    fn from(n: u8) -> Self {
        Channel::Analog(n)
    }
}

fn numbered(rest: &str) -> Option<u8> {
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let parsed = if let Some(n) = numbered(&upper) {
            Some(Channel::Analog(n))
        } else if upper == "MATH" {
            Some(Channel::Math)
        } else {
            // longest prefixes first
            let prefixes: [(&str, fn(u8) -> Channel); 10] = [
                ("CHANNEL", Channel::Analog),
                ("CHAN", Channel::Analog),
                ("DIGITAL", Channel::Digital),
                ("DIG", Channel::Digital),
                ("D", Channel::Digital),
                ("POD", Channel::Pod),
                ("FUNCTION", Channel::Function),
                ("FUNC", Channel::Function),
                ("WMEMORY", Channel::WMemory),
                ("WMEM", Channel::WMemory),
            ];
            prefixes
                .iter()
                .find_map(|(prefix, build)| upper.strip_prefix(*prefix).and_then(numbered).map(build))
        };
        parsed.ok_or_else(|| Error::InvalidChannel {
            channel: s.to_string(),
            model: "any model",
        })
    }
}

impl Channel {
    /// The SCPI source name, e.g. `CHANnel1` or `DIGital7`.
    pub fn scpi(&self) -> String {
        match self {
            Channel::Analog(n) => format!("CHANnel{}", n),
            Channel::Digital(n) => format!("DIGital{}", n),
            Channel::Pod(n) => format!("POD{}", n),
            Channel::Function(n) => format!("FUNCtion{}", n),
            Channel::Math => "MATH".to_string(),
            Channel::WMemory(n) => format!("WMEMory{}", n),
        }
    }

    pub fn is_analog(&self) -> bool {
        matches!(self, Channel::Analog(_))
    }

    /// Whether `variant` has this source.
    pub fn is_valid_for(&self, variant: &Variant) -> bool {
        match *self {
            Channel::Analog(n) => (1..=variant.max_channels).contains(&n),
            Channel::Digital(n) => variant.digital && n <= 15,
            Channel::Pod(n) => variant.digital && (1..=2).contains(&n),
            Channel::Function(n) => (1..=16).contains(&n),
            Channel::Math => true,
            Channel::WMemory(n) => (1..=4).contains(&n),
        }
    }

    pub fn validate(self, variant: &'static Variant) -> Result<Self, Error> {
        if self.is_valid_for(variant) {
            Ok(self)
        } else {
            Err(Error::InvalidChannel {
                channel: self.to_string(),
                model: variant.name,
            })
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Analog(n) => write!(f, "{}", n),
            Channel::Digital(n) => write!(f, "D{}", n),
            Channel::Pod(n) => write!(f, "POD{}", n),
            Channel::Function(n) => write!(f, "FUNC{}", n),
            Channel::Math => f.write_str("MATH"),
            Channel::WMemory(n) => write!(f, "WMEM{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::models::{MSOX3000, MXR058A, UXR_XXX2A};

    #[test]
    fn parse_names() {
        assert_eq!("1".parse::<Channel>().unwrap(), Channel::Analog(1));
        assert_eq!("chan3".parse::<Channel>().unwrap(), Channel::Analog(3));
        assert_eq!("D15".parse::<Channel>().unwrap(), Channel::Digital(15));
        assert_eq!("pod2".parse::<Channel>().unwrap(), Channel::Pod(2));
        assert_eq!("FUNC1".parse::<Channel>().unwrap(), Channel::Function(1));
        assert_eq!("math".parse::<Channel>().unwrap(), Channel::Math);
        assert_eq!("WMEM2".parse::<Channel>().unwrap(), Channel::WMemory(2));
        assert!("X1".parse::<Channel>().is_err());
        assert!("D".parse::<Channel>().is_err());
        assert!("".parse::<Channel>().is_err());
    }

    #[test]
    fn scpi_names() {
        assert_eq!(Channel::from(2).scpi(), "CHANnel2");
        assert_eq!(Channel::Digital(7).scpi(), "DIGital7");
        assert_eq!(Channel::Function(1).scpi(), "FUNCtion1");
        assert_eq!(Channel::Pod(1).scpi(), "POD1");
    }

    #[test]
    fn display_parses_back() {
        for ch in [Channel::Analog(4), Channel::Digital(0), Channel::WMemory(1), Channel::Math] {
            assert_eq!(ch.to_string().parse::<Channel>().unwrap(), ch);
        }
    }

    #[test]
    fn validity_depends_on_model() {
        assert!(Channel::Analog(4).is_valid_for(&MSOX3000));
        assert!(!Channel::Analog(5).is_valid_for(&MSOX3000));
        assert!(!Channel::Analog(0).is_valid_for(&MSOX3000));
        assert!(Channel::Analog(8).is_valid_for(&MXR058A));
        assert!(!Channel::Analog(3).is_valid_for(&UXR_XXX2A));
        assert!(Channel::Digital(15).is_valid_for(&MSOX3000));
        assert!(!Channel::Digital(16).is_valid_for(&MSOX3000));
        assert!(!Channel::Digital(0).is_valid_for(&UXR_XXX2A));
        match Channel::Analog(3).validate(&UXR_XXX2A) {
            Err(Error::InvalidChannel { channel, model }) => {
                assert_eq!(channel, "3");
                assert_eq!(model, "UXRxxx2A");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
