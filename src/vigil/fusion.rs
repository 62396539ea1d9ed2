// SPDX-License-Identifier: MIT

//! Fusion rule table
//!
//! Every applicable rule contributes, in table order. A rule may raise the
//! threat level but never lower it, its actions are appended as-is, and its
//! sentence is appended to the reasoning.

use std::fmt;

use super::schemas::{AudioEvent, ThreatAssessment, ThreatLevel, VisionEvent};

/// Confidence reported with every assessment
pub const CONFIDENCE: f64 = 0.9;

/// Reasoning used when no escalating rule fired
pub const DEFAULT_REASONING: &str = "Normal activity detected.";

/// One row of the fusion table
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    /// Minimum level this rule imposes, if any
    pub level: Option<ThreatLevel>,
    pub actions: &'static [&'static str],
    pub reasoning: &'static str,
    pub applies: fn(Option<&VisionEvent>, Option<&AudioEvent>) -> bool,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("actions", &self.actions)
            .finish()
    }
}

impl Rule {
    fn escalates(&self) -> bool {
        self.level.is_some_and(|level| level > ThreatLevel::Low)
    }
}

/// Unattended bag in the visual feed
pub const UNATTENDED_BAG: Rule = Rule {
    name: "unattended_bag",
    level: Some(ThreatLevel::Medium),
    actions: &["alert_security", "monitor_camera"],
    reasoning: "Unattended bag detected in visual feed.",
    applies: |vision, _| vision.is_some_and(|v| v.has_anomaly("unattended_bag")),
};

/// Glass breaking in the audio feed; always ends at HIGH
pub const GLASS_BREAKING: Rule = Rule {
    name: "glass_breaking",
    level: Some(ThreatLevel::High),
    actions: &["trigger_alarm", "lockdown_zone"],
    reasoning: "Glass breaking sound detected.",
    applies: |_, audio| audio.is_some_and(|a| a.hears("glass_breaking")),
};

/// A person plus footsteps; explanation only
pub const PERSON_WALKING: Rule = Rule {
    name: "person_walking",
    level: None,
    actions: &[],
    reasoning: "Person walking detected.",
    applies: |vision, audio| match (vision, audio) {
        (Some(v), Some(a)) => v.sees("person") && a.hears("footsteps"),
        _ => false,
    },
};

/// The fusion table in evaluation order
pub const RULES: &[Rule] = &[UNATTENDED_BAG, GLASS_BREAKING, PERSON_WALKING];

/// Assess a pair of observations with the standard table
pub fn assess(vision: Option<&VisionEvent>, audio: Option<&AudioEvent>) -> ThreatAssessment {
    assess_with(RULES, vision, audio)
}

/// Assess a pair of observations with an explicit rule list
pub fn assess_with(
    rules: &[Rule],
    vision: Option<&VisionEvent>,
    audio: Option<&AudioEvent>,
) -> ThreatAssessment {
    let mut threat_level = ThreatLevel::Low;
    let mut actions = Vec::new();
    let mut sentences = Vec::new();
    let mut escalated = false;

    for rule in rules.iter().filter(|rule| (rule.applies)(vision, audio)) {
        log::debug!("Fusion rule '{}' applies", rule.name);
        if let Some(level) = rule.level {
            threat_level = threat_level.max(level);
        }
        escalated |= rule.escalates();
        actions.extend(rule.actions.iter().map(|a| a.to_string()));
        sentences.push(rule.reasoning);
    }

    if !escalated {
        sentences.insert(0, DEFAULT_REASONING);
    }

    ThreatAssessment {
        threat_level,
        reasoning: sentences.join(" "),
        actions,
        confidence: CONFIDENCE,
    }
}
