use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::classes::{generate_invite_code, Class, ClassMember};
use crate::store::operations::users::UserRole;
use crate::validation::validate_title;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_class).get(list_classes))
        .route("/join", post(join_class))
        .route("/:id/members", get(list_members))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinClassRequest {
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassView {
    pub id: String,
    pub name: String,
    pub invite_code: String,
    pub owner_id: String,
}

impl From<&Class> for ClassView {
    fn from(value: &Class) -> Self {
        Self {
            id: value.id.clone(),
            name: value.name.clone(),
            invite_code: value.invite_code.clone(),
            owner_id: value.owner_id.clone(),
        }
    }
}

const INVITE_CODE_RETRIES: usize = 5;

async fn create_class(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_instructor()?;

    let name = req.name.trim();
    if let Err(msg) = validate_title(name) {
        return Err(AppError::validation(msg));
    }

    // Invite codes are random; on the rare collision, roll a new code and
    // retry rather than failing the request.
    let now = Utc::now();
    let mut last_err = None;
    for _ in 0..INVITE_CODE_RETRIES {
        let class = Class {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: auth_user.user_id.clone(),
            name: name.to_string(),
            invite_code: generate_invite_code(),
            created_at: now,
            updated_at: now,
        };
        match state.store().create_class(&class) {
            Ok(()) => return Ok(created(ClassView::from(&class))),
            Err(e @ crate::store::StoreError::Conflict { .. }) => {
                last_err = Some(e);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(last_err
        .map(AppError::from)
        .unwrap_or_else(|| AppError::internal("invite code generation failed")))
}

async fn list_classes(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let classes = match auth_user.role {
        UserRole::Instructor => state.store().list_classes_by_owner(&auth_user.user_id)?,
        UserRole::Student => {
            let mut joined = Vec::new();
            for class_id in state.store().list_user_class_ids(&auth_user.user_id)? {
                if let Some(class) = state.store().get_class(&class_id)? {
                    joined.push(class);
                }
            }
            joined
        }
    };

    let views: Vec<ClassView> = classes.iter().map(ClassView::from).collect();
    Ok(ok(views))
}

async fn join_class(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<JoinClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_student()?;

    let code = req.invite_code.trim();
    if code.is_empty() {
        return Err(AppError::validation("Invite code is required"));
    }

    let class = state
        .store()
        .get_class_by_code(code)?
        .ok_or_else(|| AppError::not_found("Class not found for this invite code"))?;

    if state.store().is_class_member(&class.id, &auth_user.user_id)? {
        return Err(AppError::conflict(
            "ALREADY_MEMBER",
            "Already a member of this class",
        ));
    }

    state.store().add_class_member(&ClassMember {
        class_id: class.id.clone(),
        user_id: auth_user.user_id.clone(),
        joined_at: Utc::now(),
    })?;

    Ok(ok(ClassView::from(&class)))
}

async fn list_members(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_instructor()?;

    let class = state
        .store()
        .get_class(&class_id)?
        .ok_or_else(|| AppError::not_found("Class not found"))?;

    if class.owner_id != auth_user.user_id {
        return Err(AppError::forbidden("Not the owner of this class"));
    }

    let mut members = Vec::new();
    for member in state.store().list_class_members(&class_id)? {
        if let Some(user) = state.store().get_user_by_id(&member.user_id)? {
            members.push(serde_json::json!({
                "userId": user.id,
                "username": user.username,
                "joinedAt": member.joined_at,
            }));
        }
    }

    Ok(ok(members))
}
