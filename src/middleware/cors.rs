// src/middleware/cors.rs

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{common::error::AppError, config::AppState};

// O middleware em si: só origens da lista explícita podem chamar a API
// a partir do navegador. Origem desconhecida recebe um erro claro de
// "domínio não autorizado" em vez de uma falha silenciosa de rede.
pub async fn cors_guard(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let Some(origin) = origin else {
        // Sem header Origin (curl, apps nativos): não é uma requisição
        // cross-origin, segue o jogo.
        return Ok(next.run(request).await);
    };

    if !app_state
        .config
        .allowed_origins
        .iter()
        .any(|allowed| allowed == &origin)
    {
        tracing::warn!("Origem bloqueada pelo CORS: {}", origin);
        return Err(AppError::UnauthorizedOrigin);
    }

    // Preflight é respondido aqui mesmo, sem chegar aos handlers.
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut(), &origin);
        return Ok(response);
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut(), &origin);
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: &str) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("authorization, content-type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}
