//! Conversion of raw API responses into the domain's [`RawProfile`].

use instalens_core::{Post, RawProfile, Reel, MAX_RECENT_POSTS, MAX_RECENT_REELS};

use crate::types::{FeedItem, WebUser};

fn post_url(code: Option<&str>) -> Option<String> {
    code.filter(|c| !c.is_empty())
        .map(|c| format!("https://www.instagram.com/p/{c}/"))
}

/// Split feed items into posts and reels, preserving feed order (newest first)
/// and keeping at most [`MAX_RECENT_POSTS`] posts and [`MAX_RECENT_REELS`] reels.
#[must_use]
pub fn split_feed(items: Vec<FeedItem>) -> (Vec<Post>, Vec<Reel>) {
    let mut posts = Vec::new();
    let mut reels = Vec::new();

    for item in items {
        let image_url = item.primary_image_url().map(str::to_owned);
        let caption = item.caption.as_ref().and_then(|c| c.text.clone());
        let url = post_url(item.code.as_deref());

        if item.is_video() {
            if reels.len() < MAX_RECENT_REELS {
                reels.push(Reel {
                    id: item.id,
                    image_url,
                    likes: item.like_count.unwrap_or(0),
                    comments: item.comment_count.unwrap_or(0),
                    views: item.play_count.unwrap_or(0),
                    caption,
                    post_url: url,
                    enrichment: None,
                });
            }
        } else if posts.len() < MAX_RECENT_POSTS {
            posts.push(Post {
                id: item.id,
                image_url,
                likes: item.like_count.unwrap_or(0),
                comments: item.comment_count.unwrap_or(0),
                caption,
                post_url: url,
                enrichment: None,
            });
        }

        if posts.len() == MAX_RECENT_POSTS && reels.len() == MAX_RECENT_REELS {
            break;
        }
    }

    (posts, reels)
}

/// Combine profile identity and feed items into a [`RawProfile`] for `handle`.
#[must_use]
pub fn build_raw_profile(handle: &str, user: WebUser, feed: Vec<FeedItem>) -> RawProfile {
    let (posts, reels) = split_feed(feed);
    RawProfile {
        handle: handle.to_string(),
        full_name: user.full_name.filter(|n| !n.trim().is_empty()),
        profile_picture_url: user.profile_pic_url_hd.or(user.profile_pic_url),
        followers: user.edge_followed_by.count,
        following: user.edge_follow.count,
        posts_count: user.edge_owner_to_timeline_media.count,
        posts,
        reels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeedResponse;

    fn feed(json: serde_json::Value) -> Vec<FeedItem> {
        serde_json::from_value::<FeedResponse>(json)
            .expect("feed fixture")
            .items
    }

    fn image_item(id: usize) -> serde_json::Value {
        serde_json::json!({
            "id": format!("img{id}"),
            "code": format!("C{id}"),
            "media_type": 1,
            "like_count": 10,
            "comment_count": 1,
            "image_versions2": {"candidates": [{"url": format!("https://cdn.example.com/{id}.jpg")}]}
        })
    }

    fn video_item(id: usize) -> serde_json::Value {
        serde_json::json!({
            "id": format!("vid{id}"),
            "code": format!("V{id}"),
            "media_type": 2,
            "like_count": 5,
            "comment_count": 0,
            "play_count": 700,
            "image_versions2": {"candidates": [{"url": format!("https://cdn.example.com/v{id}.jpg")}]}
        })
    }

    #[test]
    fn classifies_videos_as_reels() {
        let items = feed(serde_json::json!({"items": [image_item(1), video_item(2), image_item(3)]}));
        let (posts, reels) = split_feed(items);
        assert_eq!(posts.len(), 2);
        assert_eq!(reels.len(), 1);
        assert_eq!(posts[0].id, "img1");
        assert_eq!(posts[1].id, "img3");
        assert_eq!(reels[0].views, 700);
        assert_eq!(
            posts[0].post_url.as_deref(),
            Some("https://www.instagram.com/p/C1/")
        );
    }

    #[test]
    fn caps_posts_and_reels() {
        let mut items: Vec<serde_json::Value> = (0..15).map(image_item).collect();
        items.extend((0..8).map(video_item));
        let (posts, reels) = split_feed(feed(serde_json::json!({ "items": items })));
        assert_eq!(posts.len(), MAX_RECENT_POSTS);
        assert_eq!(reels.len(), MAX_RECENT_REELS);
        assert_eq!(posts.last().map(|p| p.id.as_str()), Some("img9"));
    }

    #[test]
    fn carousel_falls_back_to_first_slide_image() {
        let items = feed(serde_json::json!({"items": [{
            "id": "car1",
            "media_type": 8,
            "carousel_media": [
                {"image_versions2": {"candidates": [{"url": "https://cdn.example.com/slide1.jpg"}]}},
                {"image_versions2": {"candidates": [{"url": "https://cdn.example.com/slide2.jpg"}]}}
            ]
        }]}));
        let (posts, _) = split_feed(items);
        assert_eq!(
            posts[0].image_url.as_deref(),
            Some("https://cdn.example.com/slide1.jpg")
        );
        assert_eq!(posts[0].likes, 0, "missing counts default to zero");
        assert!(posts[0].post_url.is_none());
    }

    #[test]
    fn caption_text_is_carried_through() {
        let items = feed(serde_json::json!({"items": [{
            "id": "c1",
            "media_type": 1,
            "caption": {"text": "golden hour"}
        }]}));
        let (posts, _) = split_feed(items);
        assert_eq!(posts[0].caption.as_deref(), Some("golden hour"));
        assert!(posts[0].image_url.is_none());
    }

    #[test]
    fn build_raw_profile_prefers_hd_picture_and_drops_blank_name() {
        let user: WebUser = serde_json::from_value(serde_json::json!({
            "id": "1",
            "username": "alpha",
            "full_name": "  ",
            "profile_pic_url_hd": "https://cdn.example.com/hd.jpg",
            "profile_pic_url": "https://cdn.example.com/sd.jpg",
            "edge_followed_by": {"count": 1200},
            "edge_follow": {"count": 80},
            "edge_owner_to_timeline_media": {"count": 64}
        }))
        .expect("user fixture");

        let raw = build_raw_profile("alpha", user, Vec::new());
        assert_eq!(raw.handle, "alpha");
        assert!(raw.full_name.is_none());
        assert_eq!(
            raw.profile_picture_url.as_deref(),
            Some("https://cdn.example.com/hd.jpg")
        );
        assert_eq!(raw.followers, 1200);
        assert_eq!(raw.following, 80);
        assert_eq!(raw.posts_count, 64);
        assert!(!raw.has_media());
    }
}
