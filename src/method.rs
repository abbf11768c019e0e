//! Method
//!
//! Identifiers of the estimation methods, in their canonical output order.
use crate::errors::CausalError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An estimation method. The declaration order is the order of every result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "regression")]
    Regression,
    #[serde(rename = "stratification")]
    Stratification,
    #[serde(rename = "matching")]
    Matching,
    #[serde(rename = "weighting")]
    Weighting,
    #[serde(rename = "ivs")]
    InstrumentalVariable,
    #[serde(rename = "regDiscont")]
    RegressionDiscontinuity,
    #[serde(rename = "nde")]
    NaturalDirectEffect,
    #[serde(rename = "nie")]
    NaturalIndirectEffect,
}

impl Method {
    /// Every method, in canonical order.
    pub const ALL: [Method; 8] = [
        Method::Regression,
        Method::Stratification,
        Method::Matching,
        Method::Weighting,
        Method::InstrumentalVariable,
        Method::RegressionDiscontinuity,
        Method::NaturalDirectEffect,
        Method::NaturalIndirectEffect,
    ];

    /// Wire identifier of the method.
    pub fn id(&self) -> &'static str {
        match self {
            Method::Regression => "regression",
            Method::Stratification => "stratification",
            Method::Matching => "matching",
            Method::Weighting => "weighting",
            Method::InstrumentalVariable => "ivs",
            Method::RegressionDiscontinuity => "regDiscont",
            Method::NaturalDirectEffect => "nde",
            Method::NaturalIndirectEffect => "nie",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Method {
    type Err = CausalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL.iter().copied().find(|m| m.id() == s).ok_or_else(|| {
            CausalError::ParseString(
                s.to_string(),
                "Method".to_string(),
                items_to_strings(Method::ALL.iter().map(|m| m.id()).collect()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_ids_round_trip() {
        for m in Method::ALL {
            assert_eq!(m.id().parse::<Method>().unwrap(), m);
            assert_eq!(serde_json::to_string(&m).unwrap(), format!("\"{}\"", m.id()));
        }
        assert!(matches!("twoStageReg".parse::<Method>(), Err(CausalError::ParseString(..))));
    }

    #[test]
    fn test_canonical_order() {
        let mut shuffled = vec![Method::NaturalIndirectEffect, Method::Regression, Method::InstrumentalVariable];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Method::Regression, Method::InstrumentalVariable, Method::NaturalIndirectEffect]
        );
    }
}
