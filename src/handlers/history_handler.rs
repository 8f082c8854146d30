use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{ListTestsParams, SaveProgressRequestDto, SaveTestRequestDto, SubmitAnswersRequestDto},
        response::{MessageResponse, SubmitAnswersResponseDto},
    },
};

#[get("/api/tests")]
pub async fn list_tests(
    state: web::Data<AppState>,
    query: web::Query<ListTestsParams>,
) -> Result<HttpResponse, AppError> {
    let records = state
        .saved_test_service
        .list(query.include_archived)
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

#[post("/api/tests")]
pub async fn save_test(
    state: web::Data<AppState>,
    request: web::Json<SaveTestRequestDto>,
) -> Result<HttpResponse, AppError> {
    let record = state
        .saved_test_service
        .save_quiz(request.into_inner().quiz)
        .await?;
    Ok(HttpResponse::Created().json(record))
}

#[get("/api/tests/{id}")]
pub async fn get_test(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record = state.saved_test_service.get(&id).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[put("/api/tests/{id}/progress")]
pub async fn save_progress(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<SaveProgressRequestDto>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let record = state
        .saved_test_service
        .save_progress(
            &id,
            request.user_answers,
            request.current_question,
            request.time_left,
        )
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[post("/api/tests/{id}/submit")]
pub async fn submit_test(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<SubmitAnswersRequestDto>,
) -> Result<HttpResponse, AppError> {
    let (record, grade) = state
        .saved_test_service
        .complete(&id, request.into_inner().user_answers)
        .await?;
    Ok(HttpResponse::Ok().json(SubmitAnswersResponseDto { record, grade }))
}

#[post("/api/tests/{id}/archive")]
pub async fn archive_test(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record = state.saved_test_service.set_archived(&id, true).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[post("/api/tests/{id}/unarchive")]
pub async fn unarchive_test(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record = state.saved_test_service.set_archived(&id, false).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[delete("/api/tests/{id}")]
pub async fn delete_test(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state.saved_test_service.delete(&id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: format!("Saved test '{}' deleted", id),
    }))
}
