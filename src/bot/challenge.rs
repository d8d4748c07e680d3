//! Challenge triage
//!
//! One accept/decline decision per inbound challenge, checked in this order:
//!
//! 1. Challenges the bot sent itself are ignored
//! 2. No free admission slot declines with `later`
//! 3. Bot/human opponent, variant, time control, rated/casual, rating band
//!
//! [`handle_challenge`] applies the verdict on the platform.

use crate::core::config::ChallengePolicy;
use crate::networking::client::{Platform, PlatformResult};
use crate::networking::model::ChallengeInfo;
use std::fmt;
use tracing::{info, warn};

/// The platform's decline reason keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    Generic,
    Later,
    TooFast,
    TooSlow,
    TimeControl,
    Rated,
    Casual,
    Variant,
    NoBot,
    OnlyBot,
}

impl DeclineReason {
    pub fn key(self) -> &'static str {
        match self {
            DeclineReason::Generic => "generic",
            DeclineReason::Later => "later",
            DeclineReason::TooFast => "tooFast",
            DeclineReason::TooSlow => "tooSlow",
            DeclineReason::TimeControl => "timeControl",
            DeclineReason::Rated => "rated",
            DeclineReason::Casual => "casual",
            DeclineReason::Variant => "variant",
            DeclineReason::NoBot => "noBot",
            DeclineReason::OnlyBot => "onlyBot",
        }
    }
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Decline(DeclineReason),
    /// Our own outgoing challenge; nothing to do
    Ignore,
}

/// The fields of a challenge triage looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub id: String,
    pub variant: String,
    /// Speed name: bullet, blitz, rapid, classical, correspondence
    pub speed: String,
    /// Initial clock in seconds, `None` for correspondence/unlimited
    pub base: Option<u64>,
    pub increment: Option<u64>,
    pub rated: bool,
    pub opponent_rating: Option<u32>,
    pub opponent_is_bot: bool,
    pub from_self: bool,
}

impl Challenge {
    pub fn from_info(info: &ChallengeInfo, bot_id: &str) -> Self {
        let challenger = info.challenger.clone().unwrap_or_default();
        let from_self = challenger
            .id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(bot_id));
        let clock = info.time_control.kind == "clock";

        Self {
            id: info.id.clone(),
            variant: info.variant.key.clone(),
            speed: info.speed.clone(),
            base: info.time_control.limit.filter(|_| clock),
            increment: info.time_control.increment.filter(|_| clock),
            rated: info.rated,
            opponent_rating: challenger.rating,
            opponent_is_bot: challenger.title.as_deref() == Some("BOT"),
            from_self,
        }
    }
}

/// Decide a challenge against the policy and the current load
pub fn triage(challenge: &Challenge, policy: &ChallengePolicy, active_games: usize) -> Verdict {
    if challenge.from_self {
        return Verdict::Ignore;
    }
    if active_games >= policy.concurrency {
        return Verdict::Decline(DeclineReason::Later);
    }
    match decline_reason(challenge, policy) {
        Some(reason) => Verdict::Decline(reason),
        None => Verdict::Accept,
    }
}

fn decline_reason(challenge: &Challenge, policy: &ChallengePolicy) -> Option<DeclineReason> {
    if challenge.opponent_is_bot && !policy.accept_bot {
        return Some(DeclineReason::NoBot);
    }
    if !challenge.opponent_is_bot && policy.only_bot {
        return Some(DeclineReason::OnlyBot);
    }
    if !policy.variants.iter().any(|v| v == &challenge.variant) {
        return Some(DeclineReason::Variant);
    }
    if !policy.time_controls.iter().any(|t| t == &challenge.speed) {
        return Some(DeclineReason::TimeControl);
    }
    if let (Some(base), Some(increment)) = (challenge.base, challenge.increment) {
        if base < policy.min_base || increment < policy.min_increment {
            return Some(DeclineReason::TooFast);
        }
        if base > policy.max_base || increment > policy.max_increment {
            return Some(DeclineReason::TooSlow);
        }
    }
    let mode = if challenge.rated { "rated" } else { "casual" };
    if !policy.modes.iter().any(|m| m == mode) {
        // The reason names the mode the bot does accept
        return Some(if challenge.rated { DeclineReason::Casual } else { DeclineReason::Rated });
    }
    if let Some(rating) = challenge.opponent_rating {
        let too_low = policy.min_rating.is_some_and(|min| rating < min);
        let too_high = policy.max_rating.is_some_and(|max| rating > max);
        if too_low || too_high {
            return Some(DeclineReason::Generic);
        }
    }
    None
}

/// Triage a challenge and answer it on the platform
pub async fn handle_challenge(
    platform: &dyn Platform,
    challenge: &Challenge,
    policy: &ChallengePolicy,
    active_games: usize,
) -> PlatformResult<Verdict> {
    let verdict = triage(challenge, policy, active_games);
    match verdict {
        Verdict::Accept => {
            info!("[CHALLENGE] accepting {} ({} {})", challenge.id, challenge.variant, challenge.speed);
            // The challenger may have cancelled in the meantime
            if let Err(e) = platform.accept_challenge(&challenge.id).await {
                warn!("[CHALLENGE] accept of {} failed: {}", challenge.id, e);
            }
        }
        Verdict::Decline(reason) => {
            info!("[CHALLENGE] declining {}: {}", challenge.id, reason);
            platform.decline_challenge(&challenge.id, reason.key()).await?;
        }
        Verdict::Ignore => {}
    }
    Ok(verdict)
}
