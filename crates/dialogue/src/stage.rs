//! Sales-phase and session engagement scoring
//!
//! Both values are derived from session counters only, so assessing the
//! same session twice gives the same answer. The phase never moves back.

use serde::{Deserialize, Serialize};

use sales_agent_config::{EngagementConfig, StageConfig};
use sales_agent_core::{ConversationPhase, ConversationSession};

/// Result of one assessment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageAssessment {
    pub phase: ConversationPhase,
    /// 0-10
    pub engagement: f32,
}

pub struct StageScorer {
    stage: StageConfig,
    engagement: EngagementConfig,
}

impl StageScorer {
    pub fn new(stage: StageConfig, engagement: EngagementConfig) -> Self {
        Self { stage, engagement }
    }

    /// Phase the counters point at, ignoring the current phase
    pub fn target_phase(&self, session: &ConversationSession) -> ConversationPhase {
        if session.scheduling_requested {
            ConversationPhase::Closing
        } else if session.objection_count >= self.stage.negotiation_min_objections {
            ConversationPhase::Negotiation
        } else if session.distinct_items_viewed() >= self.stage.evaluation_min_viewed {
            ConversationPhase::Evaluation
        } else {
            ConversationPhase::Discovery
        }
    }

    /// Recomputed from scratch on every call
    pub fn engagement(&self, session: &ConversationSession) -> f32 {
        let w = &self.engagement;
        let messages = (session.message_count as f32 * w.message_weight).min(w.message_cap);
        let views = (session.distinct_items_viewed() as f32 * w.view_weight).min(w.view_cap);
        let interest =
            (session.interested_projects.len() as f32 * w.interest_weight).min(w.interest_cap);
        let deep_query = session
            .detail_requests
            .values()
            .any(|count| *count >= w.deep_query_min_details);
        let bonus = if deep_query { w.deep_query_bonus } else { 0.0 };

        (messages + views + interest + bonus).clamp(0.0, 10.0)
    }

    pub fn assess(&self, session: &ConversationSession) -> StageAssessment {
        StageAssessment {
            phase: session.phase.max(self.target_phase(session)),
            engagement: self.engagement(session),
        }
    }

    /// Write the assessment back to the session
    pub fn apply(&self, session: &mut ConversationSession) -> StageAssessment {
        let assessment = self.assess(session);
        let previous = session.phase;
        if session.advance_phase(assessment.phase) {
            tracing::info!(
                session_id = %session.id,
                from = previous.display_name(),
                to = assessment.phase.display_name(),
                "Conversation phase advanced"
            );
        }
        session.engagement_score = assessment.engagement;
        assessment
    }
}

impl Default for StageScorer {
    fn default() -> Self {
        Self::new(StageConfig::default(), EngagementConfig::default())
    }
}
