//! Thin RPC surface: `<plural>.getAll`, `<plural>.addToUser`,
//! `<plural>.removeFromUser`, dispatched from one route.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task;

use crate::catalog::clamp_limit;
use crate::cursor::Cursor;
use crate::error::CatalogError;
use crate::model::{AnyKind, ItemKind};
use crate::server::{identity_from, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Procedure {
    GetAll(AnyKind),
    AddToUser(ItemKind),
    RemoveFromUser(ItemKind),
}

/// Resolves `minions.getAll` style names. Mutations exist for item kinds
/// only; instances are completed by collecting their rewards, not toggled.
fn parse_procedure(name: &str) -> Result<Procedure, RpcError> {
    let unknown = || RpcError::UnknownProcedure(name.to_string());
    let (segment, op) = name.split_once('.').ok_or_else(unknown)?;
    match op {
        "getAll" => AnyKind::from_plural(segment)
            .map(Procedure::GetAll)
            .ok_or_else(unknown),
        "addToUser" => ItemKind::from_plural(segment)
            .map(Procedure::AddToUser)
            .ok_or_else(unknown),
        "removeFromUser" => ItemKind::from_plural(segment)
            .map(Procedure::RemoveFromUser)
            .ok_or_else(unknown),
        _ => Err(unknown()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MutationBody {
    item_id: String,
}

pub(crate) async fn query_handler(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Response, RpcError> {
    let kind = match parse_procedure(&procedure)? {
        Procedure::GetAll(kind) => kind,
        Procedure::AddToUser(_) | Procedure::RemoveFromUser(_) => {
            return Err(RpcError::NotAQuery(procedure))
        }
    };
    let cursor = Cursor::decode_opt(params.cursor.as_deref())?;
    let limit = clamp_limit(params.limit, kind.default_limit());

    match kind {
        AnyKind::Item(kind) => {
            let page = task::spawn_blocking(move || {
                state.open_catalog()?.page_items(kind, cursor, limit)
            })
            .await??;
            Ok(Json(page).into_response())
        }
        AnyKind::Instance(kind) => {
            let page = task::spawn_blocking(move || {
                state.open_catalog()?.page_instances(kind, cursor, limit)
            })
            .await??;
            Ok(Json(page).into_response())
        }
    }
}

pub(crate) async fn mutation_handler(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    headers: HeaderMap,
    Json(body): Json<MutationBody>,
) -> Result<Response, RpcError> {
    let (kind, adding) = match parse_procedure(&procedure)? {
        Procedure::AddToUser(kind) => (kind, true),
        Procedure::RemoveFromUser(kind) => (kind, false),
        Procedure::GetAll(_) => return Err(RpcError::NotAMutation(procedure)),
    };
    if state.read_only() {
        return Err(RpcError::ReadOnly);
    }
    let user = identity_from(&headers).ok_or(RpcError::Unauthorized)?;

    let summary = task::spawn_blocking(move || {
        let mut catalog = state.open_catalog()?;
        if adding {
            catalog.grant(&user, kind, &body.item_id)
        } else {
            catalog.revoke(&user, kind, &body.item_id)
        }
    })
    .await??;
    Ok(Json(summary).into_response())
}

#[derive(Debug, Error)]
pub(crate) enum RpcError {
    #[error("unknown procedure '{0}'")]
    UnknownProcedure(String),
    #[error("no catalog named '{0}'")]
    UnknownCatalog(String),
    #[error("procedure '{0}' is a mutation; POST it")]
    NotAQuery(String),
    #[error("procedure '{0}' is a query; GET it")]
    NotAMutation(String),
    #[error("log in to modify your collection")]
    Unauthorized,
    #[error("mutating endpoint is disabled in read-only mode")]
    ReadOnly,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("internal task failure: {0}")]
    Join(#[from] task::JoinError),
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match &self {
            RpcError::UnknownProcedure(_) | RpcError::UnknownCatalog(_) => StatusCode::NOT_FOUND,
            RpcError::NotAQuery(_) | RpcError::NotAMutation(_) => StatusCode::METHOD_NOT_ALLOWED,
            RpcError::Unauthorized => StatusCode::UNAUTHORIZED,
            RpcError::ReadOnly => StatusCode::FORBIDDEN,
            RpcError::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            RpcError::Catalog(CatalogError::InvalidCursor(_))
            | RpcError::Catalog(CatalogError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            RpcError::Catalog(_) | RpcError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "rpc failure");
        }
        let body = Json(ErrorPayload {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    message: String,
}
