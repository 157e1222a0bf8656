//! Shared test payloads and scripted strategies
use super::{ProfileStrategy, StrategyError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

pub fn sample_post(index: usize, is_video: bool) -> Value {
    let mut node = json!({
        "id": format!("post{}", index),
        "is_video": is_video,
        "display_url": format!("https://cdn.test/post{}.jpg", index),
        "shortcode": format!("SC{}", index),
        "edge_media_to_caption": {
            "edges": [ { "node": { "text": format!("caption {}", index) } } ]
        },
        "edge_media_preview_like": { "count": 10 + index },
        "edge_media_to_comment": { "count": index },
    });
    if is_video {
        node["video_url"] = json!(format!("https://cdn.test/post{}.mp4", index));
    }
    node
}

/// User object in the shape every upstream surface converges on
pub fn sample_user(posts: usize) -> Value {
    let edges: Vec<Value> = (0..posts)
        .map(|i| json!({ "node": sample_post(i, i % 3 == 0) }))
        .collect();

    json!({
        "username": "someuser",
        "full_name": "Some User",
        "biography": "bio line",
        "edge_followed_by": { "count": 1200 },
        "edge_follow": { "count": 80 },
        "edge_owner_to_timeline_media": { "count": posts, "edges": edges },
        "profile_pic_url": "https://cdn.test/avatar.jpg",
        "profile_pic_url_hd": "https://cdn.test/avatar_hd.jpg",
        "is_private": false,
        "is_verified": true,
        "external_url": "https://example.com",
        "category_name": "Artist",
    })
}

pub fn private_user() -> Value {
    let mut user = sample_user(0);
    user["is_private"] = json!(true);
    user
}

#[derive(Clone)]
pub enum Script {
    User(Value),
    Fail,
    Hang,
}

/// Strategy that replays a fixed outcome and counts its invocations
pub struct ScriptedStrategy {
    name: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    pub fn new(name: &'static str, script: Script) -> Self {
        Self {
            name,
            script,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ProfileStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, _handle: &str) -> Result<Value, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::User(user) => Ok(user.clone()),
            Script::Fail => Err(StrategyError::Shape("scripted failure".to_string())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(StrategyError::Shape("unreachable".to_string()))
            }
        }
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
