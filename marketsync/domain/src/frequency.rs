use serde::{Deserialize, Serialize};

/// Sampling frequency of stored records. Each (symbol, frequency) pair
/// carries independent sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Min1,
    Min5,
    Min15,
    Min30,
    Min60,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "1d",
            Frequency::Min1 => "1m",
            Frequency::Min5 => "5m",
            Frequency::Min15 => "15m",
            Frequency::Min30 => "30m",
            Frequency::Min60 => "60m",
        }
    }

    pub fn parse(value: &str) -> Result<Self, FrequencyParseError> {
        match value {
            "1d" => Ok(Frequency::Daily),
            "1m" => Ok(Frequency::Min1),
            "5m" => Ok(Frequency::Min5),
            "15m" => Ok(Frequency::Min15),
            "30m" => Ok(Frequency::Min30),
            "60m" => Ok(Frequency::Min60),
            other => Err(FrequencyParseError::Unknown(other.to_string())),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Frequency {
    type Error = FrequencyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Frequency::parse(&value)
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrequencyParseError {
    #[error("unknown frequency code '{0}'")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_codes() {
        for freq in [
            Frequency::Daily,
            Frequency::Min1,
            Frequency::Min5,
            Frequency::Min15,
            Frequency::Min30,
            Frequency::Min60,
        ] {
            assert_eq!(Frequency::parse(freq.as_str()).unwrap(), freq);
        }
    }

    #[test]
    fn rejects_unknown_code() {
        assert!(matches!(
            Frequency::parse("2h"),
            Err(FrequencyParseError::Unknown(_))
        ));
    }
}
