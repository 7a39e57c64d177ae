//! Layer and purpose identifiers.

use std::fmt::Display;
use std::str::FromStr;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// A layer purpose.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerPurpose {
    // First-class enumerated purposes
    Drawing,
    Pin,
    Dummy,
    Edge,
    Boundary,
    /// Named purpose, not first-class supported
    Named(ArcStr),
}

impl Default for LayerPurpose {
    fn default() -> Self {
        Self::Drawing
    }
}

impl FromStr for LayerPurpose {
    type Err = std::convert::Infallible;
    fn from_str(purp: &str) -> Result<Self, Self::Err> {
        Ok(match purp {
            "" | "drawing" => Self::Drawing,
            "pin" => Self::Pin,
            "dummy" => Self::Dummy,
            "edge" => Self::Edge,
            "boundary" => Self::Boundary,
            _ => Self::Named(ArcStr::from(purp)),
        })
    }
}

impl Display for LayerPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drawing => write!(f, "drawing"),
            Self::Pin => write!(f, "pin"),
            Self::Dummy => write!(f, "dummy"),
            Self::Edge => write!(f, "edge"),
            Self::Boundary => write!(f, "boundary"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// A layer name paired with a purpose.
///
/// Serialized as `"name:purpose"`; a bare `"name"` means the drawing purpose.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LayerSpec(ArcStr, LayerPurpose);

impl LayerSpec {
    /// Creates a new [`LayerSpec`].
    #[inline]
    pub fn new(name: impl Into<ArcStr>, purpose: LayerPurpose) -> Self {
        Self(name.into(), purpose)
    }

    /// Returns the spec for the drawing purpose of the layer `name`.
    #[inline]
    pub fn drawing(name: impl Into<ArcStr>) -> Self {
        Self(name.into(), LayerPurpose::Drawing)
    }

    #[inline]
    pub fn dummy(name: impl Into<ArcStr>) -> Self {
        Self(name.into(), LayerPurpose::Dummy)
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.0
    }

    #[inline]
    pub fn purpose(&self) -> &LayerPurpose {
        &self.1
    }
}

impl Display for LayerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

impl FromStr for LayerSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, purp) = s.split_once(':').unwrap_or((s, ""));
        Ok(Self(ArcStr::from(name), purp.parse()?))
    }
}

impl From<LayerSpec> for String {
    fn from(value: LayerSpec) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for LayerSpec {
    type Error = std::convert::Infallible;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_spec() {
        let spec: LayerSpec = "Poly:edge".parse().unwrap();
        assert_eq!(spec, LayerSpec::new("Poly", LayerPurpose::Edge));
        let spec: LayerSpec = "LiAct".parse().unwrap();
        assert_eq!(spec, LayerSpec::drawing("LiAct"));
        let spec: LayerSpec = "FinArea:fin48".parse().unwrap();
        assert_eq!(
            spec.purpose(),
            &LayerPurpose::Named(arcstr::literal!("fin48"))
        );
        assert_eq!(spec.to_string(), "FinArea:fin48");
    }
}
