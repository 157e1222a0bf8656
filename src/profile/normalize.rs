/// Maps the upstream nested user object onto [`ProfileRecord`]
use super::{NormalizationError, PostKind, PostSummary, ProfileRecord, MAX_POSTS};
use serde_json::Value;

/// Build a complete record from a raw user object.
///
/// Fails if any required field is absent or mistyped; callers treat that as
/// a failure of the strategy that produced `user`.
pub fn normalize_user(user: &Value) -> Result<ProfileRecord, NormalizationError> {
    if !user.is_object() {
        return Err(NormalizationError::WrongType("user".to_string()));
    }

    let avatar_url = match optional_string(user, "profile_pic_url_hd")? {
        Some(url) => url,
        None => string(user, "profile_pic_url")?,
    };

    let edges = field(user, "edge_owner_to_timeline_media.edges")?
        .as_array()
        .ok_or_else(|| NormalizationError::WrongType("edge_owner_to_timeline_media.edges".to_string()))?;

    let posts = edges
        .iter()
        .take(MAX_POSTS)
        .map(|edge| field(edge, "node").and_then(normalize_post))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProfileRecord {
        handle: string(user, "username")?.to_lowercase(),
        display_name: string(user, "full_name")?,
        biography: string(user, "biography")?,
        follower_count: count(user, "edge_followed_by.count")?,
        following_count: count(user, "edge_follow.count")?,
        post_count: count(user, "edge_owner_to_timeline_media.count")?,
        avatar_url,
        is_private: flag(user, "is_private")?,
        is_verified: flag(user, "is_verified")?,
        external_link: optional_string(user, "external_url")?,
        category: optional_string(user, "category_name")?.filter(|c| !c.is_empty()),
        posts,
    })
}

fn normalize_post(node: &Value) -> Result<PostSummary, NormalizationError> {
    let is_video = match node.get("is_video") {
        None | Some(Value::Null) => false,
        Some(value) => value
            .as_bool()
            .ok_or_else(|| NormalizationError::WrongType("is_video".to_string()))?,
    };
    let kind = PostKind::from_is_video(is_video);

    let captions = field(node, "edge_media_to_caption.edges")?
        .as_array()
        .ok_or_else(|| NormalizationError::WrongType("edge_media_to_caption.edges".to_string()))?;
    let caption = match captions.first() {
        Some(edge) => string(edge, "node.text")?,
        None => String::new(),
    };

    let like_count = match count(node, "edge_media_preview_like.count") {
        Ok(likes) => likes,
        Err(NormalizationError::Missing(_)) => count(node, "edge_liked_by.count")?,
        Err(e) => return Err(e),
    };

    let video_url = if kind.is_video() {
        optional_string(node, "video_url")?
    } else {
        None
    };

    Ok(PostSummary {
        id: string(node, "id")?,
        kind,
        thumbnail_url: string(node, "display_url")?,
        video_url,
        short_code: string(node, "shortcode")?,
        caption,
        like_count,
        comment_count: count(node, "edge_media_to_comment.count")?,
    })
}

/// Follow a dotted path; null counts as missing
fn field<'a>(value: &'a Value, path: &str) -> Result<&'a Value, NormalizationError> {
    path.split('.').try_fold(value, |current, key| {
        current
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| NormalizationError::Missing(path.to_string()))
    })
}

fn string(value: &Value, path: &str) -> Result<String, NormalizationError> {
    field(value, path)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| NormalizationError::WrongType(path.to_string()))
}

fn optional_string(value: &Value, path: &str) -> Result<Option<String>, NormalizationError> {
    match field(value, path) {
        Ok(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| NormalizationError::WrongType(path.to_string())),
        Err(NormalizationError::Missing(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn count(value: &Value, path: &str) -> Result<u64, NormalizationError> {
    field(value, path)?
        .as_u64()
        .ok_or_else(|| NormalizationError::WrongType(path.to_string()))
}

fn flag(value: &Value, path: &str) -> Result<bool, NormalizationError> {
    field(value, path)?
        .as_bool()
        .ok_or_else(|| NormalizationError::WrongType(path.to_string()))
}
