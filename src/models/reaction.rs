use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::post::Visibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

text_enum!(ReactionType, "reaction type", {
    Like => "like",
    Love => "love",
    Haha => "haha",
    Wow => "wow",
    Sad => "sad",
    Angry => "angry",
});

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub reaction_type: ReactionType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleReactionRequest {
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub reaction_type: ReactionType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactionTargetQuery {
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
}

/// 反应目标：帖子或评论，二者必须且只能有一个
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl ReactionTarget {
    pub fn from_ids(post_id: Option<Uuid>, comment_id: Option<Uuid>) -> Result<Self> {
        match (post_id, comment_id) {
            (Some(post_id), None) => Ok(ReactionTarget::Post(post_id)),
            (None, Some(comment_id)) => Ok(ReactionTarget::Comment(comment_id)),
            _ => Err(AppError::bad_request(
                "Exactly one of post_id or comment_id is required",
            )),
        }
    }

    pub fn post_id(&self) -> Option<Uuid> {
        match self {
            ReactionTarget::Post(id) => Some(*id),
            ReactionTarget::Comment(_) => None,
        }
    }

    pub fn comment_id(&self) -> Option<Uuid> {
        match self {
            ReactionTarget::Comment(id) => Some(*id),
            ReactionTarget::Post(_) => None,
        }
    }

    /// 目标所在帖子为私密且查看者不是帖子作者时，按不存在处理
    pub fn visible_author(&self, row: Option<TargetRow>, viewer_id: Option<Uuid>) -> Result<Uuid> {
        match row {
            Some(row)
                if row.visibility == Visibility::Public || Some(row.post_author_id) == viewer_id =>
            {
                Ok(row.target_author_id)
            }
            _ => Err(AppError::not_found(match self {
                ReactionTarget::Post(_) => "Post",
                ReactionTarget::Comment(_) => "Comment",
            })),
        }
    }
}

/// 反应目标的作者及其所在帖子的可见性
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct TargetRow {
    pub target_author_id: Uuid,
    pub post_author_id: Uuid,
    pub visibility: Visibility,
}

/// 切换反应时的状态转移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTransition {
    Create,
    Remove,
    Change { from: ReactionType },
}

impl ReactionTransition {
    pub fn decide(existing: Option<ReactionType>, requested: ReactionType) -> Self {
        match existing {
            None => ReactionTransition::Create,
            Some(current) if current == requested => ReactionTransition::Remove,
            Some(current) => ReactionTransition::Change { from: current },
        }
    }

    /// 目标的 reaction_count 变化量
    pub fn counter_delta(&self) -> i64 {
        match self {
            ReactionTransition::Create => 1,
            ReactionTransition::Remove => -1,
            ReactionTransition::Change { .. } => 0,
        }
    }
}

/// 切换结果：`None` 表示反应已被移除
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub transition: ReactionTransition,
    pub reaction: Option<Reaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReactionCount {
    pub reaction_type: ReactionType,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub total: i64,
    pub counts: Vec<ReactionCount>,
    pub viewer_reaction: Option<ReactionType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_target_hidden_from_others() {
        let author = Uuid::new_v4();
        let commenter = Uuid::new_v4();
        let target = ReactionTarget::Comment(Uuid::new_v4());
        let row = TargetRow {
            target_author_id: commenter,
            post_author_id: author,
            visibility: Visibility::Private,
        };

        assert_eq!(target.visible_author(Some(row), Some(author)).unwrap(), commenter);

        let stranger = target.visible_author(Some(row), Some(Uuid::new_v4())).unwrap_err();
        assert_eq!(stranger.status_code(), axum::http::StatusCode::NOT_FOUND);
        assert!(target.visible_author(Some(row), None).is_err());
        assert!(target.visible_author(None, Some(author)).is_err());

        let public = TargetRow {
            visibility: Visibility::Public,
            ..row
        };
        assert_eq!(target.visible_author(Some(public), None).unwrap(), commenter);
    }

    #[test]
    fn test_reaction_type_from_text() {
        assert_eq!("haha".parse::<ReactionType>().unwrap(), ReactionType::Haha);
        assert_eq!(ReactionType::Angry.as_str(), "angry");
        assert!("meh".parse::<ReactionType>().is_err());
    }

    #[test]
    fn test_target_requires_exactly_one_id() {
        let id = Uuid::new_v4();

        assert_eq!(ReactionTarget::from_ids(Some(id), None).unwrap(), ReactionTarget::Post(id));
        assert_eq!(
            ReactionTarget::from_ids(None, Some(id)).unwrap(),
            ReactionTarget::Comment(id)
        );

        let both = ReactionTarget::from_ids(Some(id), Some(Uuid::new_v4())).unwrap_err();
        assert_eq!(both.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let neither = ReactionTarget::from_ids(None, None).unwrap_err();
        assert_eq!(neither.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_transition_table() {
        use ReactionTransition::*;

        assert_eq!(ReactionTransition::decide(None, ReactionType::Like), Create);
        assert_eq!(
            ReactionTransition::decide(Some(ReactionType::Like), ReactionType::Like),
            Remove
        );
        assert_eq!(
            ReactionTransition::decide(Some(ReactionType::Like), ReactionType::Angry),
            Change { from: ReactionType::Like }
        );
    }

    #[test]
    fn test_double_toggle_nets_zero() {
        let first = ReactionTransition::decide(None, ReactionType::Love);
        let second = ReactionTransition::decide(Some(ReactionType::Love), ReactionType::Love);

        assert_eq!(first.counter_delta() + second.counter_delta(), 0);
        assert_eq!(
            ReactionTransition::decide(Some(ReactionType::Love), ReactionType::Sad).counter_delta(),
            0
        );
    }

    #[test]
    fn test_reaction_type_from_json() {
        let request: ToggleReactionRequest =
            serde_json::from_str(r#"{"post_id":null,"comment_id":null,"reaction_type":"haha"}"#)
                .unwrap();
        assert_eq!(request.reaction_type, ReactionType::Haha);
    }
}
