// Row decoding for the entity tables

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::core::decode_list;
use crate::error::AppResult;
use crate::models::{Comment, Post, Project, User};

pub const USER_COLUMNS: &str = "id, username, bio, picture, links, creation_date";
pub const PROJECT_COLUMNS: &str =
    "id, owner, name, description, status, likes, tags, links, creation_date";
pub const POST_COLUMNS: &str = "id, user_id, project_id, content, likes, creation_date";
pub const COMMENT_COLUMNS: &str =
    "id, user_id, content, likes, creation_date, parent_comment_id";

pub fn user_from_row(row: &SqliteRow) -> AppResult<User> {
    let links: String = row.try_get("links")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        bio: row.try_get("bio")?,
        picture: row.try_get("picture")?,
        links: decode_list(&links)?,
        created_on: row.try_get("creation_date")?,
    })
}

pub fn project_from_row(row: &SqliteRow) -> AppResult<Project> {
    let tags: String = row.try_get("tags")?;
    let links: String = row.try_get("links")?;
    Ok(Project {
        id: row.try_get("id")?,
        owner: row.try_get("owner")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        status: row.try_get("status")?,
        likes: row.try_get("likes")?,
        tags: decode_list(&tags)?,
        links: decode_list(&links)?,
        creation_date: row.try_get("creation_date")?,
    })
}

pub fn post_from_row(row: &SqliteRow) -> AppResult<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        user: row.try_get("user_id")?,
        project: row.try_get("project_id")?,
        likes: row.try_get("likes")?,
        content: row.try_get("content")?,
        created_on: row.try_get("creation_date")?,
    })
}

pub fn comment_from_row(row: &SqliteRow) -> AppResult<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        user: row.try_get("user_id")?,
        likes: row.try_get("likes")?,
        parent_comment: row.try_get("parent_comment_id")?,
        created_on: row.try_get("creation_date")?,
        content: row.try_get("content")?,
    })
}

pub fn collect<T>(
    rows: &[SqliteRow],
    decode: fn(&SqliteRow) -> AppResult<T>,
) -> AppResult<Vec<T>> {
    rows.iter().map(decode).collect()
}
