//! Response shapes of the Instagram web API, reduced to the fields we read.

use serde::Deserialize;

/// `media_type` value Instagram uses for videos and reels.
pub const MEDIA_TYPE_VIDEO: u8 = 2;

#[derive(Debug, Deserialize)]
pub struct WebProfileInfoResponse {
    pub data: WebProfileInfoData,
}

#[derive(Debug, Deserialize)]
pub struct WebProfileInfoData {
    pub user: Option<WebUser>,
}

#[derive(Debug, Deserialize)]
pub struct WebUser {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub profile_pic_url_hd: Option<String>,
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub edge_followed_by: EdgeCount,
    #[serde(default)]
    pub edge_follow: EdgeCount,
    #[serde(default)]
    pub edge_owner_to_timeline_media: EdgeCount,
}

#[derive(Debug, Default, Deserialize)]
pub struct EdgeCount {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub code: Option<String>,
    #[serde(default)]
    pub media_type: u8,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub play_count: Option<u64>,
    pub caption: Option<FeedCaption>,
    pub image_versions2: Option<ImageVersions>,
    pub carousel_media: Option<Vec<CarouselMedia>>,
}

#[derive(Debug, Deserialize)]
pub struct FeedCaption {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageVersions {
    #[serde(default)]
    pub candidates: Vec<ImageCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CarouselMedia {
    pub image_versions2: Option<ImageVersions>,
}

impl FeedItem {
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.media_type == MEDIA_TYPE_VIDEO
    }

    /// First image candidate, falling back to the first carousel slide.
    #[must_use]
    pub fn primary_image_url(&self) -> Option<&str> {
        first_candidate(self.image_versions2.as_ref()).or_else(|| {
            self.carousel_media
                .as_ref()
                .and_then(|slides| slides.first())
                .and_then(|slide| first_candidate(slide.image_versions2.as_ref()))
        })
    }
}

fn first_candidate(versions: Option<&ImageVersions>) -> Option<&str> {
    versions
        .and_then(|v| v.candidates.first())
        .map(|c| c.url.as_str())
}
