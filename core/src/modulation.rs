use crate::error::{Result, WaveformError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Digital modulation family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modulation {
    #[serde(rename = "PAM")]
    Pam,
    #[serde(rename = "QAM")]
    Qam,
    #[serde(rename = "PSK")]
    Psk,
    #[serde(rename = "FSK")]
    Fsk,
}

impl Modulation {
    pub fn name(&self) -> &'static str {
        match self {
            Modulation::Pam => "PAM",
            Modulation::Qam => "QAM",
            Modulation::Psk => "PSK",
            Modulation::Fsk => "FSK",
        }
    }

    /// Check that `order` is a usable alphabet size for this family.
    ///
    /// Every family needs a power of two no smaller than 2. QAM also needs
    /// an even number of bits so the grid is square.
    pub fn validate_order(&self, order: u32) -> Result<()> {
        let unsupported = WaveformError::UnsupportedOrder {
            modulation: *self,
            order,
        };

        if order < 2 || !order.is_power_of_two() {
            return Err(unsupported);
        }

        if *self == Modulation::Qam && bits_per_symbol(order) % 2 != 0 {
            return Err(unsupported);
        }

        Ok(())
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Modulation {
    type Err = WaveformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAM" => Ok(Modulation::Pam),
            "QAM" => Ok(Modulation::Qam),
            "PSK" => Ok(Modulation::Psk),
            "FSK" => Ok(Modulation::Fsk),
            _ => Err(WaveformError::UnknownModulation(s.to_string())),
        }
    }
}

/// Bits carried by one symbol of an `order`-ary alphabet (log2 M)
pub fn bits_per_symbol(order: u32) -> u32 {
    if order == 0 {
        return 0;
    }
    order.ilog2()
}

/// Display presets, in the order the scheme selector lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scheme {
    #[default]
    #[serde(rename = "QPSK")]
    Qpsk,
    #[serde(rename = "BPSK")]
    Bpsk,
    #[serde(rename = "8PSK")]
    Psk8,
    #[serde(rename = "16QAM")]
    Qam16,
    #[serde(rename = "64QAM")]
    Qam64,
}

impl Scheme {
    pub const ALL: [Scheme; 5] = [
        Scheme::Qpsk,
        Scheme::Bpsk,
        Scheme::Psk8,
        Scheme::Qam16,
        Scheme::Qam64,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Qpsk => "QPSK",
            Scheme::Bpsk => "BPSK",
            Scheme::Psk8 => "8PSK",
            Scheme::Qam16 => "16QAM",
            Scheme::Qam64 => "64QAM",
        }
    }

    pub fn modulation(&self) -> Modulation {
        match self {
            Scheme::Qpsk | Scheme::Bpsk | Scheme::Psk8 => Modulation::Psk,
            Scheme::Qam16 | Scheme::Qam64 => Modulation::Qam,
        }
    }

    pub fn order(&self) -> u32 {
        match self {
            Scheme::Bpsk => 2,
            Scheme::Qpsk => 4,
            Scheme::Psk8 => 8,
            Scheme::Qam16 => 16,
            Scheme::Qam64 => 64,
        }
    }

    pub fn bits_per_symbol(&self) -> u32 {
        bits_per_symbol(self.order())
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = WaveformError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Scheme::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WaveformError::UnknownScheme(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modulation_case_insensitive() {
        assert_eq!("qam".parse::<Modulation>().unwrap(), Modulation::Qam);
        assert_eq!(" FSK ".parse::<Modulation>().unwrap(), Modulation::Fsk);
        assert!(matches!(
            "OOK".parse::<Modulation>(),
            Err(WaveformError::UnknownModulation(_))
        ));
    }

    #[test]
    fn test_order_validation() {
        assert!(Modulation::Pam.validate_order(2).is_ok());
        assert!(Modulation::Psk.validate_order(8).is_ok());
        assert!(Modulation::Qam.validate_order(16).is_ok());
        assert!(Modulation::Qam.validate_order(8).is_err());
        assert!(Modulation::Qam.validate_order(2).is_err());
        assert!(Modulation::Fsk.validate_order(6).is_err());
        assert!(Modulation::Pam.validate_order(1).is_err());
    }

    #[test]
    fn test_scheme_presets() {
        let bits: Vec<u32> = Scheme::ALL.iter().map(|s| s.bits_per_symbol()).collect();
        assert_eq!(bits, vec![2, 1, 3, 4, 6]);
        assert_eq!(Scheme::default(), Scheme::Qpsk);
        assert_eq!("16qam".parse::<Scheme>().unwrap(), Scheme::Qam16);
        assert_eq!(Scheme::Psk8.modulation(), Modulation::Psk);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Modulation::Pam).unwrap();
        assert_eq!(json, "\"PAM\"");
        let scheme: Scheme = serde_json::from_str("\"8PSK\"").unwrap();
        assert_eq!(scheme, Scheme::Psk8);
    }
}
