use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Emotion, Genre},
    routes::AppState,
};

const IMAGE_FIELD: &str = "image";
const ALLOWED_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

#[derive(Debug, Serialize)]
pub struct DetectEmotionResponse {
    pub success: bool,
    pub emotion: Emotion,
    pub genre: Genre,
}

fn has_image_extension(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Handler for emotion detection from an uploaded photo
pub async fn detect(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> AppResult<Json<DetectEmotionResponse>> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !has_image_extension(&file_name) {
            return Err(AppError::InvalidInput(
                "Invalid image format. Only PNG, JPG, or JPEG allowed.".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Could not read image: {}", e)))?;
        image = Some(bytes);
        break;
    }

    let image = image.ok_or_else(|| AppError::InvalidInput("No image provided".to_string()))?;
    let emotion = state.emotion_detector.detect(&image).await;

    tracing::info!(
        request_id = %request_id,
        bytes = image.len(),
        emotion = %emotion,
        detector = state.emotion_detector.name(),
        "Emotion detection completed"
    );

    Ok(Json(DetectEmotionResponse {
        success: true,
        emotion,
        genre: emotion.genre(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        assert!(has_image_extension("selfie.png"));
        assert!(has_image_extension("SELFIE.JPG"));
        assert!(has_image_extension("face.jpeg"));
        assert!(!has_image_extension("face.gif"));
        assert!(!has_image_extension("png"));
        assert!(!has_image_extension(""));
    }
}
