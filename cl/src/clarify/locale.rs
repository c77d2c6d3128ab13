//! Locale-specific text used when assembling composite queries
//!
//! Labels and separators are the only language-dependent part of the core;
//! everything else operates on the strings these produce.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::Strategy;

/// Language of the labels, separators and default keywords
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "zh" | "chinese" | "zh-cn" => Ok(Locale::Chinese),
            other => Err(format!("unknown locale '{}', expected en or zh", other)),
        }
    }
}

impl Locale {
    /// Human-readable goal of a strategy, fed to the question generator
    pub fn strategy_description(&self, strategy: Strategy) -> &'static str {
        match (self, strategy) {
            (Locale::English, Strategy::UnderstandIntent) => "clarify the user's real need and intent",
            (Locale::English, Strategy::GatherContext) => "gather the user's background and circumstances",
            (Locale::English, Strategy::SpecifyDetails) => "fill in the necessary specific details",
            (Locale::Chinese, Strategy::UnderstandIntent) => "明确用户的真实需求和意图",
            (Locale::Chinese, Strategy::GatherContext) => "收集用户背景信息和具体情况",
            (Locale::Chinese, Strategy::SpecifyDetails) => "补充必要的具体细节",
        }
    }

    /// Keywords in an intent answer that suggest personal context matters
    pub fn default_context_keywords(&self) -> Vec<String> {
        let words: &[&str] = match self {
            Locale::English => &[
                "treatment",
                "doctor-visit",
                "choice",
                "suitability",
                "recommendation",
                "cost",
                "hospital",
                "medication",
            ],
            Locale::Chinese => &["治疗", "看医生", "选择", "适合", "建议", "费用", "医院", "药物"],
        };
        words.iter().map(|w| w.to_string()).collect()
    }

    /// Prefix the question generator hint uses before the strategy description
    pub(crate) fn hint_label(&self) -> &'static str {
        match self {
            Locale::English => "Currently needed",
            Locale::Chinese => "当前需要",
        }
    }

    /// Joins answers given under the same strategy
    pub(crate) fn answer_separator(&self) -> &'static str {
        "; "
    }

    /// Joins labeled segments of the folded query
    pub(crate) fn segment_separator(&self) -> &'static str {
        " | "
    }

    /// Label of each folded-query segment
    pub(crate) fn fold_labels(&self) -> FoldLabels {
        match self {
            Locale::English => FoldLabels {
                original: "Original question",
                intent: "Underlying need",
                context: "User context",
                details: "Specific requirements",
                colon: ": ",
            },
            Locale::Chinese => FoldLabels {
                original: "用户原始问题",
                intent: "用户真实需求",
                context: "用户背景",
                details: "具体要求",
                colon: ": ",
            },
        }
    }

    /// Segment wrappers and separator of the deterministic final query
    pub(crate) fn fallback_format(&self) -> FallbackFormat {
        match self {
            Locale::English => FallbackFormat {
                context: ("[Context: ", "]"),
                intent: ("[Intent: ", "]"),
                details: ("[Details: ", "]"),
                separator: ", ",
            },
            Locale::Chinese => FallbackFormat {
                context: ("（用户背景：", "）"),
                intent: ("具体想了解：", ""),
                details: ("关注细节：", ""),
                separator: "，",
            },
        }
    }

    /// Labels of the structured summary handed to the final-query generator
    pub(crate) fn summary_labels(&self) -> SummaryLabels {
        match self {
            Locale::English => SummaryLabels {
                original: "Original question",
                process: "Clarification process",
                answer: "User answer",
                round: "Round",
                final_query: "Final question",
            },
            Locale::Chinese => SummaryLabels {
                original: "原始问题",
                process: "追问过程",
                answer: "用户回答",
                round: "轮次",
                final_query: "最终生成的用户问题",
            },
        }
    }
}

pub(crate) struct FoldLabels {
    pub original: &'static str,
    pub intent: &'static str,
    pub context: &'static str,
    pub details: &'static str,
    pub colon: &'static str,
}

pub(crate) struct FallbackFormat {
    pub context: (&'static str, &'static str),
    pub intent: (&'static str, &'static str),
    pub details: (&'static str, &'static str),
    pub separator: &'static str,
}

pub(crate) struct SummaryLabels {
    pub original: &'static str,
    pub process: &'static str,
    pub answer: &'static str,
    pub round: &'static str,
    pub final_query: &'static str,
}
