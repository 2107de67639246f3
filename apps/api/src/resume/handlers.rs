use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::resume::client::{ResumeAnalysis, ResumeFormat};
use crate::resume::ranking::{rank_skills, RankedSkill};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: ResumeAnalysis,
    pub ranked_skills: Vec<RankedSkill>,
}

/// POST /api/resume/analyze
/// Requires a signed-in session. Expects multipart field `file` (.pdf or .docx).
pub async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let session_id = state.cookies.session_id(&headers);
    let user = state.auth.current_user(session_id.as_deref()).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let format = ResumeFormat::from_file_name(&file_name)
            .ok_or_else(|| AppError::Validation("Please upload a PDF or DOCX file.".to_string()))?;
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        upload = Some((file_name, format, content));
        break;
    }

    let (file_name, format, content) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    if content.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    info!(
        "Forwarding {} byte resume for user {} to analysis service",
        content.len(),
        user.id
    );
    let analysis = state
        .resume
        .analyze(&file_name, format, content)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let ranked_skills = rank_skills(&analysis.skills);
    Ok(Json(AnalyzeResponse {
        analysis,
        ranked_skills,
    }))
}

#[cfg(test)]
mod tests {
    use crate::client::SessionClient;
    use crate::resume::ranking::SkillLevel;
    use crate::routes::build_router;
    use crate::test_support::test_state;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    async fn spawn_stack(service: Router) -> String {
        let service_url = serve(service).await;
        serve(build_router(test_state(&format!("{service_url}/process_resume")))).await
    }

    fn analysis_service() -> Router {
        Router::new().route(
            "/process_resume",
            post(|| async {
                Json(json!({
                    "skills": {"SQL": 58, "Rust": 90, "Git": 74},
                    "experience": [{"company": "Acme"}],
                }))
            }),
        )
    }

    #[tokio::test]
    async fn test_upload_returns_ranked_skills() {
        let base = spawn_stack(analysis_service()).await;
        let mut client = SessionClient::new(&base).unwrap();
        client.register("Ana", "ana@x.com", "secret1").await.unwrap();

        let result = client
            .upload_resume("cv.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        let ranked: Vec<_> = result
            .ranked_skills
            .iter()
            .map(|s| (s.name.as_str(), s.level))
            .collect();
        assert_eq!(
            ranked,
            [
                ("Rust", SkillLevel::Expert),
                ("Git", SkillLevel::Advanced),
                ("SQL", SkillLevel::Intermediate),
            ]
        );
        assert_eq!(result.analysis.experience.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_format() {
        let base = spawn_stack(analysis_service()).await;
        let mut client = SessionClient::new(&base).unwrap();
        client.register("Ana", "ana@x.com", "secret1").await.unwrap();

        let err = client
            .upload_resume("cv.txt", b"plain".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please upload a PDF or DOCX file.");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_502() {
        let failing = Router::new().route(
            "/process_resume",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, Json(Value::Null)) }),
        );
        let base = spawn_stack(failing).await;
        let mut client = SessionClient::new(&base).unwrap();
        client.register("Ana", "ana@x.com", "secret1").await.unwrap();

        let err = client
            .upload_resume("cv.docx", b"PK".to_vec())
            .await
            .unwrap_err();
        match err {
            crate::client::ClientError::Api { status, .. } => assert_eq!(status, 502),
            e => panic!("unexpected error: {e}"),
        }
    }
}
