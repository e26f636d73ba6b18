// Waveform plot - amplitude over sample index rendered as SVG
//
// The clip is downmixed and resampled to the plot rate first. Samples are
// bucketed into one min/max pair per pixel column so long clips stay small.
// No text is drawn, so no font backend is needed.

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;

use crate::audio::{resample, Waveform};
use crate::config::PlotConfig;

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Min/max envelope of `samples` over `columns` buckets as (x, y) points
///
/// Each bucket contributes its minimum then its maximum, so the polyline
/// sweeps the full range inside every column.
pub fn envelope(samples: &[f32], columns: usize) -> Vec<(f64, f64)> {
    if samples.is_empty() || columns == 0 {
        return Vec::new();
    }
    if samples.len() <= columns * 2 {
        return samples
            .iter()
            .enumerate()
            .map(|(i, &s)| (i as f64, s as f64))
            .collect();
    }

    let bucket = samples.len().div_ceil(columns);
    let mut points = Vec::with_capacity(columns * 2);
    for (idx, chunk) in samples.chunks(bucket).enumerate() {
        let x = (idx * bucket) as f64;
        let (min, max) = chunk
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        points.push((x, min as f64));
        points.push((x + chunk.len() as f64 / 2.0, max as f64));
    }
    points
}

/// Render the waveform as an SVG document
pub fn render_waveform_svg(wave: &Waveform, config: &PlotConfig) -> Result<String> {
    let mono = Waveform::mono(wave.to_mono(), wave.sample_rate);
    let mono = resample::resample(&mono, config.sample_rate)
        .context("Failed to resample waveform for plotting")?;

    let points = envelope(&mono.samples, config.width as usize);
    let x_max = mono.samples.len().max(1) as f64;
    let peak = mono
        .samples
        .iter()
        .fold(0.0f32, |acc, &s| acc.max(s.abs()))
        .max(1e-3) as f64;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (config.width, config.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(0.0..x_max, -peak..peak)?;

        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, 0.0), (x_max, 0.0)],
            BLACK.mix(0.2),
        )))?;
        chart.draw_series(LineSeries::new(points, &LINE_COLOR))?;

        root.present()?;
    }

    log::debug!(
        "[Plot] Rendered {} samples @ {} Hz into {}x{} SVG ({} bytes)",
        mono.samples.len(),
        mono.sample_rate,
        config.width,
        config.height,
        svg.len()
    );
    Ok(svg)
}

/// Render and write the SVG to `path`
pub fn write_waveform_svg<P: AsRef<Path>>(
    wave: &Waveform,
    config: &PlotConfig,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let svg = render_waveform_svg(wave, config)?;
    std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sine_wave;

    #[test]
    fn test_envelope_short_signal_is_passthrough() {
        let points = envelope(&[0.1, -0.2, 0.3], 10);
        assert_eq!(points, vec![(0.0, 0.1f32 as f64), (1.0, -0.2f32 as f64), (2.0, 0.3f32 as f64)]);
    }

    #[test]
    fn test_envelope_buckets_long_signal() {
        let samples = sine_wave(22_050, 100.0, 22_050, 0.5);
        let points = envelope(&samples, 100);
        assert!(points.len() <= 200);
        let max = points.iter().map(|p| p.1).fold(f64::MIN, f64::max);
        let min = points.iter().map(|p| p.1).fold(f64::MAX, f64::min);
        assert!(max > 0.49 && min < -0.49);
    }

    #[test]
    fn test_envelope_empty() {
        assert!(envelope(&[], 100).is_empty());
    }

    #[test]
    fn test_render_svg_document() {
        let wave = Waveform::mono(sine_wave(44_100, 220.0, 44_100, 0.7), 44_100);
        let svg = render_waveform_svg(&wave, &PlotConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"1200\""));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn test_render_silent_clip() {
        let wave = Waveform::mono(vec![0.0; 512], 22_050);
        let svg = render_waveform_svg(&wave, &PlotConfig::default()).unwrap();
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_write_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wave.svg");
        let wave = Waveform::mono(sine_wave(22_050, 440.0, 2048, 0.5), 22_050);
        write_waveform_svg(&wave, &PlotConfig::default(), &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
    }
}
