use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lstmseg_core::{
    BundleConfig, GraphemeDictionary, InferenceConfig, InferenceEngine, ModelDescriptor, ModelType,
    TensorRole, TopologyValidator, WeightTensor, codec,
};

/// A model the size of the shipped Thai heavy model, with synthetic weights.
fn synthetic_model() -> ModelDescriptor {
    let clusters: Vec<String> = ('\u{0E01}'..='\u{0E5B}').map(String::from).collect();
    let dictionary = GraphemeDictionary::from_entries(
        clusters.iter().enumerate().map(|(i, c)| (c.as_str(), i as i64)),
    )
    .unwrap();
    let (embeddings, hunits) = (16, 27);
    let topology = TopologyValidator::new(dictionary.len(), embeddings, hunits);

    let weights = TensorRole::all()
        .iter()
        .map(|role| {
            let dim = topology.expected_shape(*role).unwrap();
            let len = topology.expected_len(*role).unwrap();
            let data = (0..len).map(|i| ((i * 7919) % 1000) as f32 / 1000.0 - 0.5).collect();
            WeightTensor::new(role.name(), dim, data).unwrap()
        })
        .collect();

    ModelDescriptor::from_parts(
        "Thai_codepoints_bench",
        ModelType::Codepoints,
        embeddings,
        hunits,
        dictionary,
        weights,
    )
    .unwrap()
}

fn bench_inference(c: &mut Criterion) {
    let model = synthetic_model();
    let ids: Vec<u32> = (0..120).map(|i| (i * 13) % model.dictionary().len() as u32).collect();

    let sequential = InferenceEngine::new(&model);
    c.bench_function("predict_120_sequential", |b| {
        b.iter(|| sequential.predict(black_box(&ids)).unwrap());
    });

    let parallel = InferenceEngine::new(&model)
        .with_config(InferenceConfig::new().with_parallel_directions(true));
    c.bench_function("predict_120_parallel", |b| {
        b.iter(|| parallel.predict(black_box(&ids)).unwrap());
    });
}

fn bench_codec(c: &mut Criterion) {
    let model = synthetic_model();
    let config = BundleConfig::default();
    let text = codec::encode(&model, &config);

    c.bench_function("encode_bundle", |b| {
        b.iter(|| codec::encode(black_box(&model), &config));
    });

    c.bench_function("decode_bundle", |b| {
        b.iter(|| codec::decode(black_box(&text)).unwrap());
    });
}

criterion_group!(benches, bench_inference, bench_codec);
criterion_main!(benches);
