//! Shared rule arbitration for coaching and nudges
//!
//! A [`RuleTable`] holds rules sorted by priority (highest first, declaration
//! order within a priority). Selection walks the table and returns the first
//! rule that matches and is outside its cooldown. Rules render their message
//! from a template with `{key}` placeholders bound by the matcher.

use chrono::{DateTime, Duration, Utc};

use sales_agent_core::{
    ConversationSession, Directive, DirectiveKind, Error, Priority, Result, ShownMemory,
    UserProfile,
};

use crate::signals::TurnSignals;

/// Everything a matcher may look at
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub session: &'a ConversationSession,
    /// Absent for anonymous sessions
    pub profile: Option<&'a UserProfile>,
    pub signals: &'a TurnSignals,
    pub utterance: &'a str,
    pub now: DateTime<Utc>,
}

/// Placeholder bindings produced by a matching rule
pub type Bindings = Vec<(&'static str, String)>;

type Matcher = Box<dyn Fn(&RuleContext<'_>) -> Option<Bindings> + Send + Sync>;

pub struct Rule {
    pub id: String,
    pub priority: Priority,
    pub template: String,
    pub suggested_action: Option<String>,
    matcher: Matcher,
}

impl Rule {
    pub fn new<F>(
        id: impl Into<String>,
        priority: Priority,
        template: impl Into<String>,
        matcher: F,
    ) -> Self
    where
        F: Fn(&RuleContext<'_>) -> Option<Bindings> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            priority,
            template: template.into(),
            suggested_action: None,
            matcher: Box::new(matcher),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    pub fn matches(&self, ctx: &RuleContext<'_>) -> Option<Bindings> {
        (self.matcher)(ctx)
    }

    fn render(&self, bindings: &Bindings) -> Result<String> {
        render_template(&self.template, bindings).map_err(|key| {
            Error::Rule(format!("rule {}: unbound placeholder {{{}}}", self.id, key))
        })
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

#[derive(Debug)]
pub struct RuleTable {
    kind: DirectiveKind,
    cooldown: Duration,
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(kind: DirectiveKind, cooldown_secs: u64) -> Self {
        Self {
            kind,
            cooldown: Duration::seconds(i64::try_from(cooldown_secs).unwrap_or(i64::MAX)),
            rules: Vec::new(),
        }
    }

    /// Add a rule, keeping priority order
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
        // stable: declaration order breaks ties
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.push(rule);
        self
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Pick at most one directive for this turn
    ///
    /// Does not touch `memory`; the caller records the emitted id.
    pub fn select(
        &self,
        ctx: &RuleContext<'_>,
        memory: &ShownMemory,
    ) -> Result<Option<Directive>> {
        for rule in &self.rules {
            if !memory.is_cool(&rule.id, ctx.now, self.cooldown) {
                continue;
            }
            let Some(bindings) = rule.matches(ctx) else {
                continue;
            };
            let message = rule.render(&bindings)?;
            tracing::debug!(
                session_id = %ctx.session.id,
                rule_id = %rule.id,
                kind = ?self.kind,
                priority = %rule.priority,
                "Rule selected"
            );
            return Ok(Some(Directive {
                id: rule.id.clone(),
                kind: self.kind,
                priority: rule.priority,
                message,
                suggested_action: rule.suggested_action.clone(),
            }));
        }
        Ok(None)
    }
}

/// Substitute `{key}` placeholders; returns the first unbound key on failure
fn render_template(template: &str, bindings: &Bindings) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return Ok(out);
        };
        let key = &after[..close];
        match bindings.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => return Err(key.to_string()),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
