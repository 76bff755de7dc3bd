/// Emotion detection from face images
///
/// Classification is delegated to an external face/emotion service. Detection never
/// fails from the caller's point of view: undecodable images, missing faces and
/// service errors all degrade to `Emotion::Neutral`.
use crate::{
    error::{AppError, AppResult},
    models::Emotion,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[async_trait::async_trait]
pub trait EmotionDetector: Send + Sync {
    /// Dominant emotion of the first face in `image`
    async fn detect(&self, image: &[u8]) -> Emotion;

    fn name(&self) -> &'static str;
}

/// One detected face and its per-emotion scores
#[derive(Debug, Deserialize)]
struct FaceScores {
    emotions: BTreeMap<String, f64>,
}

/// Strongest label of the first face, if any face was found
fn strongest_label(faces: &[FaceScores]) -> Option<&str> {
    faces
        .first()?
        .emotions
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(label, _)| label.as_str())
}

/// Detector backed by an HTTP classification service
///
/// The service receives the raw image bytes and answers with a list of faces, each
/// carrying an `emotions` score map.
#[derive(Clone)]
pub struct HttpEmotionDetector {
    http_client: HttpClient,
    service_url: String,
}

impl HttpEmotionDetector {
    pub fn new(service_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            service_url,
        })
    }

    async fn classify(&self, image: &[u8]) -> AppResult<Option<String>> {
        let response = self
            .http_client
            .post(&self.service_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Emotion service returned status {}: {}",
                status, body
            )));
        }

        let faces: Vec<FaceScores> = response.json().await?;
        tracing::debug!(faces = faces.len(), "Emotion service responded");

        Ok(strongest_label(&faces).map(str::to_string))
    }
}

#[async_trait::async_trait]
impl EmotionDetector for HttpEmotionDetector {
    async fn detect(&self, image: &[u8]) -> Emotion {
        if image.is_empty() {
            return Emotion::Neutral;
        }

        match self.classify(image).await {
            Ok(Some(label)) => {
                let emotion = Emotion::from_classifier_label(&label);
                tracing::info!(label = %label, emotion = %emotion, "Emotion detected");
                emotion
            }
            Ok(None) => {
                tracing::info!("No face detected, defaulting to neutral");
                Emotion::Neutral
            }
            Err(e) => {
                tracing::error!(error = %e, "Emotion detection failed, defaulting to neutral");
                Emotion::Neutral
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Detector used when no classification service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralEmotionDetector;

#[async_trait::async_trait]
impl EmotionDetector for NeutralEmotionDetector {
    async fn detect(&self, _image: &[u8]) -> Emotion {
        Emotion::Neutral
    }

    fn name(&self) -> &'static str {
        "neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_classifier(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/classify", addr)
    }

    fn detector(url: String) -> HttpEmotionDetector {
        HttpEmotionDetector::new(url, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_strongest_label_uses_first_face() {
        let faces: Vec<FaceScores> = serde_json::from_value(json!([
            {"emotions": {"angry": 0.1, "happy": 0.7, "sad": 0.2}},
            {"emotions": {"fear": 0.99}}
        ]))
        .unwrap();
        assert_eq!(strongest_label(&faces), Some("happy"));
    }

    #[test]
    fn test_strongest_label_without_faces() {
        assert_eq!(strongest_label(&[]), None);
    }

    #[tokio::test]
    async fn test_detect_maps_classifier_label() {
        let router = Router::new().route(
            "/classify",
            post(|body: axum::body::Bytes| async move {
                assert_eq!(&body[..], b"fake-png");
                Json(json!([{"box": [0, 0, 48, 48], "emotions": {"disgust": 0.8, "neutral": 0.2}}]))
            }),
        );
        let url = spawn_classifier(router).await;

        let emotion = detector(url).detect(b"fake-png").await;
        assert_eq!(emotion, Emotion::Anger);
    }

    #[tokio::test]
    async fn test_no_face_defaults_to_neutral() {
        let router =
            Router::new().route("/classify", post(|| async { Json::<Value>(json!([])) }));
        let url = spawn_classifier(router).await;

        assert_eq!(detector(url).detect(b"img").await, Emotion::Neutral);
    }

    #[tokio::test]
    async fn test_service_error_defaults_to_neutral() {
        let router = Router::new().route(
            "/classify",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
        );
        let url = spawn_classifier(router).await;

        assert_eq!(detector(url).detect(b"img").await, Emotion::Neutral);
    }

    #[tokio::test]
    async fn test_empty_image_defaults_to_neutral() {
        let detector = detector("http://127.0.0.1:9/classify".to_string());
        assert_eq!(detector.detect(&[]).await, Emotion::Neutral);
    }

    #[tokio::test]
    async fn test_neutral_detector() {
        assert_eq!(NeutralEmotionDetector.detect(b"img").await, Emotion::Neutral);
    }
}
