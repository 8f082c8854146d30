use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::{AppError, GenerationError},
    models::dto::{
        request::{AskRequestDto, GenerateQuizRequestDto},
        response::{AskResponseDto, GenerationStatusDto, MessageResponse},
    },
    services::{
        generation_orchestrator::{GenerationProgress, GenerationState},
        model_service::ask_once,
        page_content_service::{HttpPageFetcher, PageContentProvider, SnapshotPageProvider},
    },
};

#[post("/api/generation")]
pub async fn start_generation(
    state: web::Data<AppState>,
    request: web::Json<GenerateQuizRequestDto>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let request = request.into_inner();

    let provider: Arc<dyn PageContentProvider> = match (&request.page, &request.url) {
        (Some(page), _) => Arc::new(SnapshotPageProvider::new(Some(page.clone()))),
        (None, Some(url)) => Arc::new(HttpPageFetcher::new(state.http_client.clone(), url.clone())),
        (None, None) => return Err(GenerationError::PageAccessUnavailable.into()),
    };

    state.orchestrator.spawn(request.config(), Some(provider))?;

    let status = GenerationStatusDto::from_progress(
        GenerationProgress::Loading { attempts_made: 0 },
        GenerationState::Preparing,
    );
    Ok(HttpResponse::Accepted().json(status))
}

#[get("/api/generation")]
pub async fn generation_status(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let progress = state.orchestrator.reattach().await?;
    let status = GenerationStatusDto::from_progress(progress, state.orchestrator.state());
    Ok(HttpResponse::Ok().json(status))
}

#[post("/api/generation/cancel")]
pub async fn cancel_generation(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    if !state.orchestrator.cancel() {
        return Err(AppError::NotFound("No generation in progress".to_string()));
    }
    Ok(HttpResponse::Accepted().json(MessageResponse {
        message: "Cancellation requested".to_string(),
    }))
}

#[delete("/api/generation")]
pub async fn reset_generation(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.orchestrator.reset().await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Generation state cleared".to_string(),
    }))
}

#[post("/api/ask")]
pub async fn ask(
    state: web::Data<AppState>,
    request: web::Json<AskRequestDto>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let model = state
        .model
        .as_ref()
        .ok_or_else(|| AppError::ModelError("Language model is not available".to_string()))?;

    let answer = ask_once(model.as_ref(), &request.prompt).await?;
    Ok(HttpResponse::Ok().json(AskResponseDto { answer }))
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "model_available": state.model.is_some(),
        "model_name": state.model.as_ref().map(|_| state.config.model_name.as_str()),
        "generation_running": state.orchestrator.is_running(),
    }))
}
