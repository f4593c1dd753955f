use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gbr_serve::pipeline::{PipelineArtifact, PredictionPipeline};
use gbr_serve::preprocessing::{
    DataPreprocessor, Encoder, EncoderType, HandleUnknown, ImputeStrategy, Imputer, Scaler, ScalerType,
};
use gbr_serve::records;
use gbr_serve::regressor::{DecisionTree, GradientBoostingRegressor, TreeNode};
use rand::prelude::*;
use serde_json::{json, Value};

const CATEGORIES: [&str; 3] = ["A", "B", "C"];

/// Full binary tree of the given depth splitting on rotating features
fn random_tree(rng: &mut impl Rng, depth: usize, n_features: usize) -> TreeNode {
    if depth == 0 {
        return TreeNode::leaf(rng.gen_range(-1.0..1.0));
    }
    TreeNode::split(
        rng.gen_range(0..n_features),
        rng.gen_range(-1.0..1.0),
        random_tree(rng, depth - 1, n_features),
        random_tree(rng, depth - 1, n_features),
    )
}

fn create_pipeline(n_estimators: usize, max_depth: usize) -> PredictionPipeline {
    let mut rng = StdRng::seed_from_u64(42);

    let preprocessor = DataPreprocessor::new()
        .with_numeric_columns(["feature1"])
        .with_categorical_columns(["feature2"])
        .with_numeric_imputer(Imputer::new(ImputeStrategy::Mean).with_numeric("feature1", 0.0))
        .with_scaler(Scaler::new(ScalerType::Standard).with_params("feature1", 0.0, 1.0))
        .with_encoder(
            Encoder::new(EncoderType::OneHot)
                .with_categories("feature2", CATEGORIES)
                .with_handle_unknown(HandleUnknown::Ignore),
        );

    let mut regressor = GradientBoostingRegressor::new(4, 0.1, 0.0);
    for _ in 0..n_estimators {
        regressor = regressor.with_tree(DecisionTree::new(random_tree(&mut rng, max_depth, 4)));
    }

    PipelineArtifact::new(preprocessor, regressor).into_pipeline().unwrap()
}

fn create_payload(n_rows: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(7);
    let rows: Vec<Value> = (0..n_rows)
        .map(|_| {
            json!({
                "feature1": rng.gen_range(-3.0..3.0),
                "feature2": CATEGORIES[rng.gen_range(0..CATEGORIES.len())],
            })
        })
        .collect();
    serde_json::to_vec(&rows).unwrap()
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    let pipeline = create_pipeline(100, 3);

    for n_rows in [1, 100, 5000].iter() {
        let body = create_payload(*n_rows);

        group.bench_with_input(BenchmarkId::new("end_to_end", n_rows), &body, |b, body| {
            b.iter(|| {
                let frame = records::parse_body(black_box(body)).unwrap();
                pipeline.predict(&frame).unwrap()
            })
        });

        let frame = records::parse_body(&body).unwrap();
        group.bench_with_input(BenchmarkId::new("pipeline_only", n_rows), &frame, |b, frame| {
            b.iter(|| pipeline.predict(black_box(frame)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
