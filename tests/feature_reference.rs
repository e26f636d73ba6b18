//! Feature values pinned against reference numbers computed in float64 from
//! librosa's published formulas (Slaney mel, orthonormal DCT-II, piptrack
//! tuning, chroma filterbank) for deterministic inputs.

use emotion_recognizer::analysis::features::{
    hz_to_mel, power_to_db, FeatureExtractor, FeatureSelection, MelFilterbank, MfccProcessor,
};
use emotion_recognizer::config::FeatureConfig;

/// |actual - expected| within `rel` of max(1, |expected|)
fn assert_close(actual: &[f32], expected: &[f64], rel: f64, what: &str) {
    assert_eq!(actual.len(), expected.len(), "{} length", what);
    for (idx, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        let tolerance = rel * e.abs().max(1.0);
        assert!(
            (a as f64 - e).abs() <= tolerance,
            "{}[{}]: got {}, expected {}",
            what,
            idx,
            a,
            e
        );
    }
}

#[test]
fn slaney_mel_scale_reference_points() {
    assert!((hz_to_mel(60.0) - 0.9).abs() < 1e-12);
    assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-12);
}

#[test]
fn mel_filterbank_rows_match_reference() {
    let bank = MelFilterbank::full_band(22_050, 2048, 128);
    let filters = bank.filters();

    let row10: f64 = filters[10].iter().map(|&w| w as f64).sum();
    let row100: f64 = filters[100].iter().map(|&w| w as f64).sum();
    assert!((row10 - 0.091_041_121_18).abs() < 1e-6, "row 10 sums to {}", row10);
    assert!((row100 - 0.092_914_505_56).abs() < 1e-6, "row 100 sums to {}", row100);

    let support: Vec<usize> = filters[10]
        .iter()
        .enumerate()
        .filter(|(_, &w)| w > 0.0)
        .map(|(k, _)| k)
        .collect();
    assert_eq!(support, vec![24, 25, 26, 27, 28]);
}

#[test]
fn log_mel_and_dct_match_reference() {
    let mel_power = vec![
        vec![1.0, 0.5, 0.25, 0.0],
        vec![100.0, 10.0, 1.0, 0.1],
        vec![1e-12, 2.0, 3.0, 4.0],
    ];

    let db = power_to_db(&mel_power);
    let expected_db = [
        [0.0, -3.010_299_957, -6.020_599_913, -60.0],
        [20.0, 10.0, 0.0, -10.0],
        [-60.0, 3.010_299_957, 4.771_212_547, 6.020_599_913],
    ];
    for (frame, expected) in db.iter().zip(&expected_db) {
        assert_close(frame, expected, 1e-5, "dB");
    }

    let mfcc = MfccProcessor::new(4, 4).from_mel_power(&mel_power);
    let expected_mfcc = [
        [-34.515_449_93, 40.011_470_24, -25.484_550_07, 14.269_309_79],
        [10.0, 22.304_424_97, 0.0, 1.585_126_678],
        [-23.098_943_79, -43.606_534_90, -30.880_456_30, -16.714_674_01],
    ];
    for (frame, expected) in mfcc.iter().zip(&expected_mfcc) {
        assert_close(frame, expected, 1e-5, "mfcc");
    }
}

/// MFCC(40), chroma(12) and mel(128) means of one second of a 0.5 amplitude
/// 440 Hz sine at 22 050 Hz. The estimated tuning is +0.01 bins.
const SINE_440_FEATURES: [f64; 180] = [
    -4.625002369e+02, 5.266015665e+01, 2.883245737e+01, 1.398984886e+01,
    -2.001614186e+00, -1.758310697e+01, -2.939484180e+01, -3.626546228e+01,
    -3.710713400e+01, -3.185821645e+01, -2.175128845e+01, -8.568358353e+00,
    5.513926465e+00, 1.795743583e+01, 2.704368808e+01, 3.126726089e+01,
    3.029206585e+01, 2.453290661e+01, 1.516630520e+01, 3.964376963e+00,
    -7.161906884e+00, -1.642165327e+01, -2.241750235e+01, -2.443110701e+01,
    -2.242382347e+01, -1.699925265e+01, -9.335173925e+00, -7.932624882e-01,
    7.148456290e+00, 1.329537221e+01, 1.681467784e+01, 1.737482754e+01,
    1.515511633e+01, 1.075882409e+01, 5.076647418e+00, -8.684770498e-01,
    -6.121303306e+00, -9.926955933e+00, -1.181852918e+01, -1.169624866e+01,
    1.168718538e-02, 9.644341711e-03, 8.795635274e-03, 8.471989711e-03,
    8.656694139e-03, 9.367519055e-03, 1.126160066e-02, 2.032036579e-02,
    2.751008837e-01, 1.000000000e+00, 2.739000031e-01, 2.065497013e-02,
    8.033328357e-02, 8.476652288e-02, 8.817034751e-02, 8.933285302e-02,
    1.020121749e-01, 1.045919475e-01, 1.190831376e-01, 1.371673716e-01,
    1.539075658e-01, 1.987792206e-01, 2.392493293e-01, 3.273911509e-01,
    4.927742284e-01, 7.984874218e-01, 2.013624220e+00, 2.818105756e+02,
    2.934662862e+03, 4.976893518e+02, 1.736533009e+00, 6.621105586e-01,
    3.209173036e-01, 1.919817903e-01, 1.290314021e-01, 8.486084926e-02,
    6.485890844e-02, 4.709804596e-02, 3.628327398e-02, 2.975904393e-02,
    2.258994615e-02, 1.932695682e-02, 1.556527438e-02, 1.287635557e-02,
    1.138677836e-02, 9.130720368e-03, 8.189257521e-03, 6.952953152e-03,
    5.937855133e-03, 5.481031978e-03, 4.478767683e-03, 4.216945491e-03,
    3.504837334e-03, 3.158918174e-03, 2.831623188e-03, 2.443007659e-03,
    2.170342951e-03, 1.924153278e-03, 1.703845148e-03, 1.507852403e-03,
    1.358582613e-03, 1.190667472e-03, 1.050115308e-03, 9.586715947e-04,
    8.334147978e-04, 7.467521725e-04, 6.744774151e-04, 5.954292073e-04,
    5.314297192e-04, 4.767096283e-04, 4.271588788e-04, 3.782843739e-04,
    3.414719658e-04, 3.036349202e-04, 2.751250401e-04, 2.440949524e-04,
    2.193459756e-04, 1.967260066e-04, 1.768867825e-04, 1.591957113e-04,
    1.419520205e-04, 1.282622209e-04, 1.153746438e-04, 1.034185397e-04,
    9.323211165e-05, 8.409452336e-05, 7.523419924e-05, 6.833936171e-05,
    6.130027603e-05, 5.528660573e-05, 4.994055737e-05, 4.513234102e-05,
    4.063912791e-05, 3.676477415e-05, 3.326226952e-05, 3.004687393e-05,
    2.720015552e-05, 2.461488711e-05, 2.234027736e-05, 2.024099932e-05,
    1.831885863e-05, 1.667493115e-05, 1.511556315e-05, 1.373911309e-05,
    1.252965446e-05, 1.137371933e-05, 1.037107963e-05, 9.456460280e-06,
    8.634717874e-06, 7.887367812e-06, 7.217999102e-06, 6.596015232e-06,
    6.053348031e-06, 5.550559887e-06, 5.102417684e-06, 4.690356496e-06,
    4.324035862e-06, 3.986586020e-06, 3.684068987e-06, 3.410302740e-06,
    3.160410633e-06, 2.936577471e-06, 2.732130512e-06, 2.547193168e-06,
    2.382308273e-06, 2.231258904e-06, 2.094602598e-06, 1.972602958e-06,
    1.863218245e-06, 1.764259063e-06, 1.676343877e-06, 1.598984374e-06,
    1.529003255e-06, 1.469747583e-06, 1.417803970e-06, 1.373466699e-06,
    1.337708417e-06, 1.309095463e-06, 1.288979288e-06, 1.275982828e-06,
];

#[test]
fn sine_feature_vector_matches_reference() {
    let sample_rate = 22_050u32;
    // Phase in f64 so the input itself carries no f32 phase drift
    let samples: Vec<f32> = (0..sample_rate as usize)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            (0.5 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as f32
        })
        .collect();

    let vector = FeatureExtractor::new(FeatureConfig::default()).extract(
        &samples,
        sample_rate,
        FeatureSelection::ALL,
    );

    assert_close(&vector.values[..40], &SINE_440_FEATURES[..40], 1e-3, "mfcc");
    assert_close(&vector.values[40..52], &SINE_440_FEATURES[40..52], 1e-3, "chroma");
    assert_close(&vector.values[52..], &SINE_440_FEATURES[52..], 1e-3, "mel");
}
