//! Per-server mutation gate
//!
//! Each server carries a process-local cooldown counter. A server is
//! `Cooling` while its counter is above zero and `Armed` at zero. Every
//! message observed while cooling decrements the counter; only armed
//! messages may reach the whitelist, self-authorship and probability checks.
//!
//! Two messages handled concurrently for one server may both see `Armed`.
//! That only risks a back-to-back mutation and is tolerated.

use crate::settings::GlobalSettings;
use crate::types::{InboundMessage, ServerState};
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Cooldown state observed for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Still cooling down; `remaining` messages left after this one
    Cooling { remaining: u32 },
    Armed,
}

/// Why a message was or was not turned into a mutation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Attempt,
    Cooling { remaining: u32 },
    NotWhitelisted,
    SelfAuthored,
    RollFailed,
}

impl GateDecision {
    pub fn is_attempt(&self) -> bool {
        matches!(self, GateDecision::Attempt)
    }
}

/// Process-local cooldown counters keyed by server id
#[derive(Debug, Default)]
pub struct RateLimiter {
    locks: Mutex<HashMap<String, u32>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one inbound message for `server_id`
    ///
    /// Servers never seen before start armed.
    pub async fn observe(&self, server_id: &str) -> GateState {
        let mut locks = self.locks.lock().await;
        match locks.get_mut(server_id) {
            Some(lock) if *lock > 0 => {
                *lock -= 1;
                debug!("Server {} cooling, {} message(s) left", server_id, *lock);
                GateState::Cooling { remaining: *lock }
            }
            _ => GateState::Armed,
        }
    }

    /// Start a new cooldown after a successful mutation
    pub async fn reset(&self, server_id: &str, buffer: u32) {
        self.locks.lock().await.insert(server_id.to_string(), buffer);
        debug!("Server {} lock reset to {}", server_id, buffer);
    }

    /// Current counter, 0 for unknown servers
    pub async fn current(&self, server_id: &str) -> u32 {
        self.locks
            .lock()
            .await
            .get(server_id)
            .copied()
            .unwrap_or(0)
    }
}

/// Decide whether an observed message may be mutated
///
/// The probability roll only happens once every other check has passed.
pub fn decide<R: Rng + ?Sized>(
    state: GateState,
    server: &ServerState,
    message: &InboundMessage,
    bot_user_id: &str,
    settings: &GlobalSettings,
    rng: &mut R,
) -> GateDecision {
    if let GateState::Cooling { remaining } = state {
        return GateDecision::Cooling { remaining };
    }
    if !server.is_whitelisted(&message.channel_name) {
        return GateDecision::NotWhitelisted;
    }
    if message.author_id == bot_user_id && !settings.allow_self_reply {
        return GateDecision::SelfAuthored;
    }
    if rng.gen::<f64>() < settings.chance_to_mutate {
        GateDecision::Attempt
    } else {
        GateDecision::RollFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn server() -> ServerState {
        let mut server = ServerState::new("g1");
        server.whitelist.insert("general".to_string());
        server
    }

    fn message(author: &str, channel: &str) -> InboundMessage {
        InboundMessage {
            author_id: author.to_string(),
            author_is_bot: false,
            author_roles: Vec::new(),
            author_is_owner: false,
            channel_name: channel.to_string(),
            text: "the quick brown fox".to_string(),
            guild_id: "g1".to_string(),
        }
    }

    fn always() -> GlobalSettings {
        GlobalSettings {
            chance_to_mutate: 1.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unknown_server_is_armed() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.observe("g1").await, GateState::Armed);
        assert_eq!(limiter.current("g1").await, 0);
    }

    #[tokio::test]
    async fn test_lock_of_five_arms_on_sixth_message() {
        let limiter = RateLimiter::new();
        limiter.reset("g1", 5).await;

        for expected in (0..5).rev() {
            assert_eq!(
                limiter.observe("g1").await,
                GateState::Cooling {
                    remaining: expected
                }
            );
        }
        assert_eq!(limiter.observe("g1").await, GateState::Armed);
    }

    #[tokio::test]
    async fn test_servers_are_independent() {
        let limiter = RateLimiter::new();
        limiter.reset("g1", 2).await;
        assert_eq!(limiter.observe("g2").await, GateState::Armed);
        assert_eq!(limiter.current("g1").await, 2);
    }

    #[test]
    fn test_cooling_blocks_even_certain_roll() {
        let mut rng = StdRng::seed_from_u64(1);
        let decision = decide(
            GateState::Cooling { remaining: 3 },
            &server(),
            &message("user", "general"),
            "bot",
            &always(),
            &mut rng,
        );
        assert_eq!(decision, GateDecision::Cooling { remaining: 3 });
    }

    #[test]
    fn test_armed_checks() {
        let mut rng = StdRng::seed_from_u64(1);
        let server = server();

        let decide_for = |msg: &InboundMessage, settings: &GlobalSettings, rng: &mut StdRng| {
            decide(GateState::Armed, &server, msg, "bot", settings, rng)
        };

        assert_eq!(
            decide_for(&message("user", "general"), &always(), &mut rng),
            GateDecision::Attempt
        );
        assert_eq!(
            decide_for(&message("user", "random"), &always(), &mut rng),
            GateDecision::NotWhitelisted
        );
        assert_eq!(
            decide_for(&message("bot", "general"), &always(), &mut rng),
            GateDecision::SelfAuthored
        );

        let permissive = GlobalSettings {
            allow_self_reply: true,
            ..always()
        };
        assert!(decide_for(&message("bot", "general"), &permissive, &mut rng).is_attempt());

        let never = GlobalSettings {
            chance_to_mutate: 0.0,
            ..Default::default()
        };
        for _ in 0..50 {
            assert_eq!(
                decide_for(&message("user", "general"), &never, &mut rng),
                GateDecision::RollFailed
            );
        }
    }
}
