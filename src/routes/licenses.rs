// ABOUTME: License management routes - batch key generation, listing, deletion, CSV export
// ABOUTME: Keys are random 20-character codes grouped as XXXXX-XXXXX-XXXXX-XXXXX
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use crate::errors::{AppError, AppResult};
use crate::middleware::{admin_auth_middleware, AdminIdentity};
use crate::models::License;
use crate::routes::{client_ip, ApiContext};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{middleware, Extension, Json, Router};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const MAX_BATCH_SIZE: u32 = 100;
const KEY_GROUPS: usize = 4;
const KEY_GROUP_LEN: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLicensesRequest {
    #[serde(default = "default_count")]
    pub count: u32,
    pub subscription_type: String,
    pub duration_days: i64,
}

const fn default_count() -> u32 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseListResponse {
    pub success: bool,
    pub licenses: Vec<License>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLicensesResponse {
    pub success: bool,
    pub message: String,
    pub licenses: Vec<License>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

/// Produce one random license key from uppercase alphanumerics
fn generate_license_key() -> String {
    let mut rng = rand::thread_rng();
    (0..KEY_GROUPS)
        .map(|_| {
            (&mut rng)
                .sample_iter(Alphanumeric)
                .take(KEY_GROUP_LEN)
                .map(|b| (b as char).to_ascii_uppercase())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

async fn handle_list_licenses(
    State(context): State<Arc<ApiContext>>,
) -> AppResult<impl IntoResponse> {
    let licenses = context
        .database
        .list_licenses()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(LicenseListResponse {
        success: true,
        licenses,
    }))
}

async fn handle_generate_licenses(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Json(request): Json<GenerateLicensesRequest>,
) -> AppResult<impl IntoResponse> {
    if request.count == 0 || request.count > MAX_BATCH_SIZE {
        return Err(AppError::invalid_input(format!(
            "Count must be between 1 and {MAX_BATCH_SIZE}"
        )));
    }
    if request.subscription_type.trim().is_empty() {
        return Err(AppError::invalid_input("Subscription type is required"));
    }
    if request.duration_days <= 0 {
        return Err(AppError::invalid_input("Duration must be positive"));
    }

    let keys: Vec<String> = (0..request.count).map(|_| generate_license_key()).collect();

    let licenses = context
        .database
        .insert_licenses(&keys, request.subscription_type.trim(), request.duration_days)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    context
        .database
        .log_activity(
            Some(identity.admin_id),
            Some(&identity.username),
            "licenses_generated",
            Some(&format!(
                "Generated {} {} license(s)",
                licenses.len(),
                request.subscription_type.trim()
            )),
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    info!(
        admin_id = identity.admin_id,
        count = licenses.len(),
        "Licenses generated"
    );

    Ok(Json(GenerateLicensesResponse {
        success: true,
        message: format!("{} license(s) generated", licenses.len()),
        licenses,
    }))
}

async fn handle_delete_license(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Path(license_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let affected = context
        .database
        .delete_license(license_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    if affected == 0 {
        return Err(AppError::not_found("License"));
    }

    context
        .database
        .log_activity(
            Some(identity.admin_id),
            Some(&identity.username),
            "license_deleted",
            Some(&format!("Deleted license id {license_id}")),
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(ActionResponse {
        success: true,
        message: "License deleted successfully".into(),
    }))
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

async fn handle_export_csv(
    State(context): State<Arc<ApiContext>>,
) -> AppResult<impl IntoResponse> {
    let licenses = context
        .database
        .list_licenses()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let mut csv = String::from("license_key,subscription_type,duration_days,status,created_at\n");
    for license in &licenses {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_escape(&license.license_key),
            csv_escape(&license.subscription_type),
            license.duration_days,
            license.status.as_str(),
            license.created_at.to_rfc3339(),
        ));
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"licenses.csv\"",
            ),
        ],
        csv,
    ))
}

/// License management routes implementation
pub struct LicenseRoutes;

impl LicenseRoutes {
    /// Create the license management router
    pub fn routes(context: Arc<ApiContext>) -> Router {
        Router::new()
            .route("/licenses", get(handle_list_licenses))
            .route("/licenses/generate", post(handle_generate_licenses))
            .route("/licenses/:id", delete(handle_delete_license))
            .route("/licenses/export/csv", get(handle_export_csv))
            .layer(middleware::from_fn_with_state(
                context.clone(),
                admin_auth_middleware,
            ))
            .with_state(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_key_has_four_groups_of_five() {
        let key = generate_license_key();
        let groups: Vec<&str> = key.split('-').collect();
        assert_eq!(groups.len(), 4);
        for group in groups {
            assert_eq!(group.len(), 5);
            assert!(group
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn csv_escape_quotes_embedded_commas() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
