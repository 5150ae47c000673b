//! Placeholder agent replies on task chat threads.
//!
//! Until agents post into threads themselves, a message from anyone other than the agent gets a
//! canned acknowledgement a couple of seconds later. The reply is written by a detached task, so
//! the request that posted the message never waits on it.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::config::AutoReplyConfig;
use crate::db::handlers::Store;
use crate::db::models::messages::TaskMessageCreateDBRequest;
use crate::types::{TaskId, abbrev_uuid};

/// Sender name used for replies, and the sender that never triggers one
pub const AGENT_SENDER: &str = "agent";

const CANNED_REPLIES: &[&str] = &[
    "Thanks, I'm picking this task up now. Live agent replies are not wired in yet.",
    "Noted. I'll take a look. (Automatic placeholder reply.)",
    "Got your instructions and added them to my notes. Real agent integration is still pending.",
    "On it! This is an automated acknowledgement for now.",
];

/// Whether a message from `sender` should get a placeholder reply
pub fn wants_reply(config: &AutoReplyConfig, sender: &str) -> bool {
    config.enabled && sender != AGENT_SENDER
}

/// Base delay plus up to one second of jitter
fn reply_delay(base: Duration, rng: &mut impl Rng) -> Duration {
    base + Duration::from_millis(rng.gen_range(0..=1000))
}

fn pick_reply(rng: &mut impl Rng) -> &'static str {
    CANNED_REPLIES.choose(rng).copied().unwrap_or(CANNED_REPLIES[0])
}

/// Post a placeholder reply on `task_id` after the configured delay.
///
/// Failures are logged and dropped; the task may have been deleted in the meantime.
pub fn spawn_auto_reply(store: Arc<dyn Store>, config: &AutoReplyConfig, task_id: TaskId) -> tokio::task::JoinHandle<()> {
    let (delay, message) = {
        let mut rng = rand::thread_rng();
        (reply_delay(config.delay, &mut rng), pick_reply(&mut rng))
    };

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let request = TaskMessageCreateDBRequest {
            task_id,
            sender: AGENT_SENDER.to_string(),
            message: message.to_string(),
        };
        match store.create_message(&request).await {
            Ok(_) => debug!(task_id = %abbrev_uuid(&task_id), "Posted placeholder agent reply"),
            Err(e) => warn!(task_id = %abbrev_uuid(&task_id), "Failed to post placeholder agent reply: {}", e),
        }
    })
}
