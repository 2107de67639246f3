use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Display band for a skill percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Expert,
    Advanced,
    Intermediate,
    Beginner,
}

impl SkillLevel {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 85.0 {
            SkillLevel::Expert
        } else if pct >= 70.0 {
            SkillLevel::Advanced
        } else if pct >= 55.0 {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillLevel::Expert => "Expert",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Beginner => "Beginner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSkill {
    pub name: String,
    pub percentage: f64,
    pub level: SkillLevel,
}

/// Orders skills by percentage, highest first; ties break by name.
/// Percentages outside 0..=100 are clamped and NaN is treated as 0.
pub fn rank_skills(skills: &BTreeMap<String, f64>) -> Vec<RankedSkill> {
    let mut ranked: Vec<RankedSkill> = skills
        .iter()
        .map(|(name, pct)| {
            let percentage = if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) };
            RankedSkill {
                name: name.clone(),
                percentage,
                level: SkillLevel::from_percentage(percentage),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}
