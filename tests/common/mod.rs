#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use gbr_serve::pipeline::{PipelineArtifact, PredictionPipeline};
use gbr_serve::preprocessing::{
    DataPreprocessor, Encoder, EncoderType, HandleUnknown, ImputeStrategy, Imputer, Scaler, ScalerType,
};
use gbr_serve::regressor::{DecisionTree, GradientBoostingRegressor, TreeNode};
use gbr_serve::server::{create_router, AppState, ErrorStatusPolicy, ServerConfig};
use serde_json::Value;

/// feature1 numeric (mean 2.0, std 0.5), feature2 one-hot over A/B/C.
/// Predicts 10 + 0.5 * (±2 on scaled feature1 + 4 when feature2 == "A").
pub fn fixture_artifact() -> PipelineArtifact {
    let preprocessor = DataPreprocessor::new()
        .with_numeric_columns(["feature1"])
        .with_categorical_columns(["feature2"])
        .with_numeric_imputer(Imputer::new(ImputeStrategy::Mean).with_numeric("feature1", 2.0))
        .with_scaler(Scaler::new(ScalerType::Standard).with_params("feature1", 2.0, 0.5))
        .with_encoder(
            Encoder::new(EncoderType::OneHot)
                .with_categories("feature2", ["A", "B", "C"])
                .with_handle_unknown(HandleUnknown::Ignore),
        );

    let regressor = GradientBoostingRegressor::new(4, 0.5, 10.0)
        .with_tree(DecisionTree::new(TreeNode::split(
            0,
            0.0,
            TreeNode::leaf(-2.0),
            TreeNode::leaf(2.0),
        )))
        .with_tree(DecisionTree::new(TreeNode::split(
            1,
            0.5,
            TreeNode::leaf(0.0),
            TreeNode::leaf(4.0),
        )));

    PipelineArtifact::new(preprocessor, regressor)
}

pub fn fixture_pipeline() -> PredictionPipeline {
    fixture_artifact().into_pipeline().unwrap()
}

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/gbr_pipeline.json")
}

pub fn test_config(error_status: ErrorStatusPolicy) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        model_path: fixture_path(),
        error_status,
        max_body_bytes: 64 * 1024,
    }
}

pub fn test_app() -> axum::Router {
    test_app_with(ErrorStatusPolicy::Categorized)
}

pub fn test_app_with(error_status: ErrorStatusPolicy) -> axum::Router {
    let state = Arc::new(AppState::new(test_config(error_status), fixture_pipeline()));
    create_router(state)
}

pub fn post_predict(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
