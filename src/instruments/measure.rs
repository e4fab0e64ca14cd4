//! Named measurements and the `MEASure` subsystem mnemonics behind them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub name: &'static str,
    /// Header below `MEASure:`.
    pub mnemonic: &'static str,
    /// Parameters placed before the source, e.g. `DISPlay` for full screen.
    pub argument: Option<&'static str>,
    pub unit: Option<&'static str>,
}

const fn m(
    name: &'static str,
    mnemonic: &'static str,
    argument: Option<&'static str>,
    unit: &'static str,
) -> Measurement {
    Measurement {
        name,
        mnemonic,
        argument,
        unit: Some(unit),
    }
}

pub static MEASUREMENTS: [Measurement; 27] = [
    m("Bit Rate", "BRATe", None, "Hz"),
    m("Burst Width", "BWIDth", None, "s"),
    m("Counter Freq", "COUNter", None, "Hz"),
    m("Frequency", "FREQuency", None, "Hz"),
    m("Period", "PERiod", None, "s"),
    m("Duty", "DUTYcycle", None, "%"),
    m("Neg Duty", "NDUTy", None, "%"),
    m("+ Width", "PWIDth", None, "s"),
    m("- Width", "NWIDth", None, "s"),
    m("Rise Time", "RISetime", None, "s"),
    m("Num Rising", "PEDGes", None, "Edges"),
    m("Num Pos Pulses", "PPULses", None, "Pulses"),
    m("Fall Time", "FALLtime", None, "s"),
    m("Num Falling", "NEDGes", None, "Edges"),
    m("Num Neg Pulses", "NPULses", None, "Pulses"),
    m("Overshoot", "OVERshoot", None, "%"),
    m("Preshoot", "PREShoot", None, "%"),
    m("Amplitude", "VAMPlitude", None, "V"),
    m("Pk-Pk", "VPP", None, "V"),
    m("Top", "VTOP", None, "V"),
    m("Base", "VBASe", None, "V"),
    m("Maximum", "VMAX", None, "V"),
    m("Minimum", "VMIN", None, "V"),
    m("Average - Full Screen", "VAVerage", Some("DISPlay"), "V"),
    m("RMS - Full Screen", "VRMS", Some("DISPlay,DC"), "V"),
    m("Average - N Cycles", "VAVerage", Some("CYCLe"), "V"),
    m("RMS - N Cycles", "VRMS", Some("CYCLe,DC"), "V"),
];

/// Looks a measurement up by its display name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static Measurement> {
    let name = name.trim();
    MEASUREMENTS
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}

impl Measurement {
    /// `MEASure:<mnemonic> [<argument>,]<source>`, the form that installs
    /// the measurement in the statistics window.
    pub fn install_command(&self, source: &str) -> String {
        format!("MEASure:{} {}", self.mnemonic, self.parameters(source))
    }

    pub fn query_command(&self, source: &str) -> String {
        format!("MEASure:{}? {}", self.mnemonic, self.parameters(source))
    }

    fn parameters(&self, source: &str) -> String {
        match self.argument {
            Some(argument) => format!("{},{}", argument, source),
            None => source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let pp = lookup("pk-pk").unwrap();
        assert_eq!(pp.mnemonic, "VPP");
        assert_eq!(pp.unit, Some("V"));
        assert!(lookup("").is_none());
        assert!(lookup("Jitter").is_none());
    }

    #[test]
    fn commands_with_and_without_argument() {
        let avg = lookup("Average - Full Screen").unwrap();
        assert_eq!(avg.install_command("CHANnel1"), "MEASure:VAVerage DISPlay,CHANnel1");
        assert_eq!(avg.query_command("CHANnel1"), "MEASure:VAVerage? DISPlay,CHANnel1");
        let width = lookup("+ Width").unwrap();
        assert_eq!(width.query_command("CHANnel2"), "MEASure:PWIDth? CHANnel2");
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in MEASUREMENTS.iter().enumerate() {
            assert!(MEASUREMENTS[i + 1..].iter().all(|b| b.name != a.name), "{}", a.name);
        }
    }
}
