//! Channel dashboard projections

use serde::Serialize;
use sqlx::FromRow;

/// Aggregate numbers for the viewer's own channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialize_in_camel_case() {
        let stats = ChannelStats {
            total_videos: 2,
            total_views: 40,
            total_subscribers: 3,
            total_likes: 7,
        };

        let body = serde_json::to_value(stats).unwrap();
        assert_eq!(body["totalVideos"], 2);
        assert_eq!(body["totalViews"], 40);
        assert_eq!(body["totalSubscribers"], 3);
        assert_eq!(body["totalLikes"], 7);
    }
}
