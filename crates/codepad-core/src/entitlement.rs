//! Entitlement gate
//!
//! Decides whether a user may run code in a language. Languages on the free
//! tier are open to every authenticated caller; everything else needs a user
//! record with the paid flag set. A missing user record is never entitled.

use crate::error::ExecutionError;
use crate::types::{Language, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Language run by default on the free tier
pub const DEFAULT_FREE_LANGUAGE: &str = "javascript";

/// Allow-list of languages available without a paid plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreeTierPolicy {
    languages: BTreeSet<String>,
}

impl FreeTierPolicy {
    /// Policy with an explicit language list
    #[must_use]
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    /// Policy where every language needs a paid plan
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            languages: BTreeSet::new(),
        }
    }

    /// With an additional free language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.insert(language.into());
        self
    }

    /// Check if a language is free
    #[inline]
    #[must_use]
    pub fn is_free(&self, language: &Language) -> bool {
        self.languages.contains(language.as_str())
    }

    /// Iterate free languages in sorted order
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(String::as_str)
    }
}

impl Default for FreeTierPolicy {
    fn default() -> Self {
        Self::new([DEFAULT_FREE_LANGUAGE])
    }
}

/// Why an attempt was allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowBasis {
    /// Language is on the free tier
    FreeTier,
    /// User holds the paid plan
    Entitled,
}

/// Gate outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Attempt may proceed
    Allow(AllowBasis),
    /// Attempt must fail with `Unauthorized`
    Deny,
}

impl Decision {
    /// Check if allowed
    #[inline]
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Pure entitlement check over a [`FreeTierPolicy`]
#[derive(Debug, Clone, Default)]
pub struct EntitlementGate {
    policy: FreeTierPolicy,
}

impl EntitlementGate {
    /// Create gate with policy
    #[inline]
    #[must_use]
    pub fn new(policy: FreeTierPolicy) -> Self {
        Self { policy }
    }

    /// Get policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &FreeTierPolicy {
        &self.policy
    }

    /// Decide for a (possibly missing) user and a language
    #[must_use]
    pub fn decide(&self, user: Option<&User>, language: &Language) -> Decision {
        if self.policy.is_free(language) {
            return Decision::Allow(AllowBasis::FreeTier);
        }
        match user {
            Some(u) if u.is_entitled => Decision::Allow(AllowBasis::Entitled),
            _ => Decision::Deny,
        }
    }

    /// Like [`decide`](Self::decide), mapping denial to `Unauthorized`
    pub fn check(&self, user: Option<&User>, language: &Language) -> Result<AllowBasis, ExecutionError> {
        match self.decide(user, language) {
            Decision::Allow(basis) => Ok(basis),
            Decision::Deny => Err(ExecutionError::unauthorized(language.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubjectId;
    use proptest::prelude::*;

    fn lang(s: &str) -> Language {
        Language::new(s).unwrap()
    }

    #[test]
    fn javascript_is_free_for_everyone() {
        let gate = EntitlementGate::default();
        let free_user = User::free(SubjectId::new("u1"));

        assert_eq!(
            gate.decide(None, &lang("javascript")),
            Decision::Allow(AllowBasis::FreeTier)
        );
        assert_eq!(
            gate.decide(Some(&free_user), &lang("javascript")),
            Decision::Allow(AllowBasis::FreeTier)
        );
    }

    #[test]
    fn missing_user_is_denied() {
        let gate = EntitlementGate::default();
        assert_eq!(gate.decide(None, &lang("python")), Decision::Deny);
        assert!(matches!(
            gate.check(None, &lang("python")),
            Err(ExecutionError::Unauthorized { language }) if language == "python"
        ));
    }

    #[test]
    fn free_user_is_denied_paid_language() {
        let gate = EntitlementGate::default();
        let user = User::free(SubjectId::new("u1"));
        assert_eq!(gate.decide(Some(&user), &lang("rust")), Decision::Deny);
    }

    #[test]
    fn entitled_user_is_allowed() {
        let gate = EntitlementGate::default();
        let user = User::entitled(SubjectId::new("u1"));
        assert_eq!(
            gate.check(Some(&user), &lang("rust")).unwrap(),
            AllowBasis::Entitled
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        let gate = EntitlementGate::default();
        assert_eq!(gate.decide(None, &lang("JavaScript")), Decision::Deny);
    }

    #[test]
    fn policy_can_be_extended() {
        let gate = EntitlementGate::new(FreeTierPolicy::default().with_language("python"));
        assert!(gate.decide(None, &lang("python")).is_allowed());
        assert_eq!(gate.policy().languages().collect::<Vec<_>>(), ["javascript", "python"]);
    }

    #[test]
    fn empty_policy_gates_everything() {
        let gate = EntitlementGate::new(FreeTierPolicy::empty());
        assert_eq!(gate.decide(None, &lang("javascript")), Decision::Deny);
    }

    proptest! {
        #[test]
        fn prop_decision_matches_policy(
            language in prop_oneof![
                Just("javascript".to_string()),
                Just("python".to_string()),
                Just(" javascript ".to_string()),
                "[a-z+#]{1,12}",
            ],
            user_state in prop_oneof![Just(None), Just(Some(false)), Just(Some(true))],
        ) {
            let gate = EntitlementGate::default();
            let language = Language::new(language).unwrap();
            let user = user_state.map(|entitled| User {
                subject_id: SubjectId::new("u1"),
                is_entitled: entitled,
            });

            let allowed = gate.decide(user.as_ref(), &language).is_allowed();
            let expected = language.as_str() == DEFAULT_FREE_LANGUAGE || user_state == Some(true);
            prop_assert_eq!(allowed, expected);
        }
    }
}
