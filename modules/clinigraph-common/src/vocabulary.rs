//! Closed node and edge type vocabularies.
//!
//! Type strings are matched exactly as serialized; there is no alias or
//! case folding.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    Claim,
    Evidence,
    Study,
    Population,
    Intervention,
    Comparator,
    Outcome,
    RiskFactor,
    Condition,
    Medication,
    Procedure,
    Mechanism,
    Guideline,
    Assumption,
    Recommendation,
}

impl NodeType {
    pub const ALL: [NodeType; 15] = [
        NodeType::Claim,
        NodeType::Evidence,
        NodeType::Study,
        NodeType::Population,
        NodeType::Intervention,
        NodeType::Comparator,
        NodeType::Outcome,
        NodeType::RiskFactor,
        NodeType::Condition,
        NodeType::Medication,
        NodeType::Procedure,
        NodeType::Mechanism,
        NodeType::Guideline,
        NodeType::Assumption,
        NodeType::Recommendation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Claim => "Claim",
            NodeType::Evidence => "Evidence",
            NodeType::Study => "Study",
            NodeType::Population => "Population",
            NodeType::Intervention => "Intervention",
            NodeType::Comparator => "Comparator",
            NodeType::Outcome => "Outcome",
            NodeType::RiskFactor => "RiskFactor",
            NodeType::Condition => "Condition",
            NodeType::Medication => "Medication",
            NodeType::Procedure => "Procedure",
            NodeType::Mechanism => "Mechanism",
            NodeType::Guideline => "Guideline",
            NodeType::Assumption => "Assumption",
            NodeType::Recommendation => "Recommendation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Attribute keys the extraction prompt asks the model to fill for this type.
    /// Advisory only; validation does not enforce them.
    pub fn expected_attributes(&self) -> &'static [&'static str] {
        match self {
            NodeType::Outcome => &["metric_name", "value", "direction", "unit", "timeframe"],
            NodeType::RiskFactor => &[
                "severity",
                "likelihood",
                "diagnostics_needed",
                "mitigation",
            ],
            NodeType::Study => &["design", "sample_size", "year"],
            NodeType::Medication => &["name", "dose", "route", "frequency"],
            NodeType::Population => &["description", "size", "age_range"],
            NodeType::Intervention | NodeType::Comparator => &["name", "dose", "duration"],
            NodeType::Evidence => &["strength", "kind"],
            NodeType::Claim => &["stance", "confidence"],
            NodeType::Guideline => &["issuer", "year"],
            NodeType::Recommendation => &["strength", "action"],
            NodeType::Condition
            | NodeType::Procedure
            | NodeType::Mechanism
            | NodeType::Assumption => &[],
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Supports,
    Contradicts,
    Causes,
    Treats,
    IncreasesRiskOf,
    DecreasesRiskOf,
    Measures,
    AppliesTo,
    ComparedWith,
    DerivedFrom,
    Contraindicates,
    Mitigates,
    Qualifies,
    Recommends,
}

impl EdgeType {
    pub const ALL: [EdgeType; 14] = [
        EdgeType::Supports,
        EdgeType::Contradicts,
        EdgeType::Causes,
        EdgeType::Treats,
        EdgeType::IncreasesRiskOf,
        EdgeType::DecreasesRiskOf,
        EdgeType::Measures,
        EdgeType::AppliesTo,
        EdgeType::ComparedWith,
        EdgeType::DerivedFrom,
        EdgeType::Contraindicates,
        EdgeType::Mitigates,
        EdgeType::Qualifies,
        EdgeType::Recommends,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Supports => "supports",
            EdgeType::Contradicts => "contradicts",
            EdgeType::Causes => "causes",
            EdgeType::Treats => "treats",
            EdgeType::IncreasesRiskOf => "increases_risk_of",
            EdgeType::DecreasesRiskOf => "decreases_risk_of",
            EdgeType::Measures => "measures",
            EdgeType::AppliesTo => "applies_to",
            EdgeType::ComparedWith => "compared_with",
            EdgeType::DerivedFrom => "derived_from",
            EdgeType::Contraindicates => "contraindicates",
            EdgeType::Mitigates => "mitigates",
            EdgeType::Qualifies => "qualifies",
            EdgeType::Recommends => "recommends",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
