use kira_coexnet::cancel::CancelToken;
use kira_coexnet::error::CoexnetError;
use kira_coexnet::math::forest::{
    self, CandidateFeatureSet, ForestParams, ImportanceRanking, RandomForest,
};
use kira_coexnet::math::sam::{DeResult, Direction};
use ndarray::Array2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn fixed_seed_reproduces_ranking() {
    let (x, y) = labelled_data(40, 12, 31);
    let params = ForestParams {
        trees: 100,
        max_depth: 6,
        seed: 9,
    };
    let a = forest::train(&x.view(), &y, &params, &CancelToken::new()).unwrap();
    let b = forest::train(&x.view(), &y, &params, &CancelToken::new()).unwrap();
    assert_eq!(a.importance, b.importance);
    assert_eq!(a.oob_accuracy, b.oob_accuracy);
    assert_eq!(
        ImportanceRanking::new(&a).order,
        ImportanceRanking::new(&b).order
    );
}

#[test]
fn informative_feature_dominates_importance() {
    let (x, y) = labelled_data(40, 12, 31);
    let params = ForestParams {
        trees: 200,
        max_depth: 6,
        seed: 9,
    };
    let model = forest::train(&x.view(), &y, &params, &CancelToken::new()).unwrap();
    let ranking = ImportanceRanking::new(&model);
    assert_eq!(ranking.order[0], 0);
    for f in 1..12 {
        assert!(model.importance[0] > model.importance[f]);
    }
    let total: f64 = model.importance.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(model.oob_accuracy > 0.9);
}

#[test]
fn rejects_single_class_labels() {
    let (x, _) = labelled_data(20, 4, 2);
    let y = vec![1u8; 20];
    let params = ForestParams {
        trees: 10,
        max_depth: 4,
        seed: 1,
    };
    let err = forest::train(&x.view(), &y, &params, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, CoexnetError::Input(_)));
}

#[test]
fn rejects_label_length_mismatch() {
    let (x, _) = labelled_data(20, 4, 2);
    let y = vec![0u8, 1u8];
    let params = ForestParams {
        trees: 10,
        max_depth: 4,
        seed: 1,
    };
    let err = forest::train(&x.view(), &y, &params, &CancelToken::new()).unwrap_err();
    assert!(err.to_string().contains("labels cover"));
}

#[test]
fn cancelled_token_stops_training() {
    let (x, y) = labelled_data(20, 4, 2);
    let params = ForestParams {
        trees: 10,
        max_depth: 4,
        seed: 1,
    };
    let token = CancelToken::new();
    token.cancel();
    let err = forest::train(&x.view(), &y, &params, &token).unwrap_err();
    assert!(matches!(err, CoexnetError::Cancelled(_)));
}

#[test]
fn ranking_orders_by_importance_with_stable_ties() {
    let model = RandomForest {
        importance: vec![0.1, 0.4, 0.0, 0.3, 0.2],
        oob_accuracy: 0.8,
    };
    let ranking = ImportanceRanking::new(&model);
    assert_eq!(ranking.order, vec![1, 3, 4, 0, 2]);
    assert_eq!(ranking.top_k(3), &[1, 3, 4]);
    assert_eq!(ranking.top_k(99).len(), 5);

    let tied = RandomForest {
        importance: vec![0.25, 0.25, 0.5],
        oob_accuracy: 0.8,
    };
    assert_eq!(ImportanceRanking::new(&tied).order, vec![2, 0, 1]);
}

#[test]
fn candidates_intersect_top_k_with_calls() {
    let model = RandomForest {
        importance: vec![0.1, 0.4, 0.0, 0.3, 0.2],
        oob_accuracy: 0.8,
    };
    let ranking = ImportanceRanking::new(&model);
    let de = DeResult {
        statistic: vec![2.0, 3.0, -2.5, 0.1, -3.0],
        expected: vec![0.0; 5],
        call: vec![
            Some(Direction::Up),
            Some(Direction::Up),
            Some(Direction::Down),
            None,
            Some(Direction::Down),
        ],
        up: vec![0, 1],
        down: vec![2, 4],
        s0: 0.1,
        delta: 1.0,
        false_calls: 0.0,
    };

    let narrow = CandidateFeatureSet::from_ranking(&ranking, 3, &de);
    assert_eq!(narrow.up, vec![1]);
    assert_eq!(narrow.down, vec![4]);
    assert_eq!(narrow.all(), vec![1, 4]);
    assert_eq!(narrow.len(), 2);

    let wide = CandidateFeatureSet::from_ranking(&ranking, 5, &de);
    assert_eq!(wide.up, vec![1, 0]);
    assert_eq!(wide.down, vec![4, 2]);
    assert!(!wide.is_empty());
}

// Feature 0 tracks the label; everything else is noise.
fn labelled_data(samples: usize, features: usize, seed: u64) -> (Array2<f64>, Vec<u8>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let y: Vec<u8> = (0..samples).map(|s| (s % 2) as u8).collect();
    let mut values = Vec::with_capacity(samples * features);
    for s in 0..samples {
        for f in 0..features {
            let v = if f == 0 {
                y[s] as f64 + rng.gen_range(-0.1..0.1)
            } else {
                rng.gen_range(-1.0..1.0)
            };
            values.push(v);
        }
    }
    (Array2::from_shape_vec((samples, features), values).unwrap(), y)
}
