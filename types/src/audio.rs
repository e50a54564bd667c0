use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Audio data encoded as base64
pub type Base64EncodedAudioBytes = String;

#[derive(Debug, Clone, PartialEq)]
pub enum Voice {
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
    Custom(String),
}

impl Serialize for Voice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Voice::Alloy => serializer.serialize_str("alloy"),
            Voice::Echo => serializer.serialize_str("echo"),
            Voice::Fable => serializer.serialize_str("fable"),
            Voice::Onyx => serializer.serialize_str("onyx"),
            Voice::Nova => serializer.serialize_str("nova"),
            Voice::Shimmer => serializer.serialize_str("shimmer"),
            Voice::Custom(s) => serializer.serialize_str(s),
        }
    }
}

impl FromStr for Voice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "alloy" => Voice::Alloy,
            "echo" => Voice::Echo,
            "fable" => Voice::Fable,
            "onyx" => Voice::Onyx,
            "nova" => Voice::Nova,
            "shimmer" => Voice::Shimmer,
            _ => Voice::Custom(s.to_string()),
        })
    }
}

impl<'de> Deserialize<'de> for Voice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Voice::from_str(&s).unwrap())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub enum AudioFormat {
    #[serde(rename = "pcm16")]
    Pcm16,
    #[serde(rename = "g711_ulaw")]
    Mulaw,
    #[serde(rename = "g711_alaw")]
    Alaw,
}
