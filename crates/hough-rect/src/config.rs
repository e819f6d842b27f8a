//! JSON configuration shared by the demo and downstream tools.
//!
//! Every field is optional; unset fields keep the defaults of
//! [`RectangleConfig`].

use crate::scan::RectangleConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path, path::PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetectionConfig {
    pub image: Option<PathBuf>,
    pub output_json: Option<PathBuf>,
    pub window: Option<usize>,
    pub r_min: Option<f32>,
    pub r_max: Option<f32>,
    pub theta_bins: Option<usize>,
    pub rho_bins: Option<usize>,
    pub enhance_size: Option<usize>,
    pub threshold_rel: Option<f32>,
    pub threshold_abs: Option<f32>,
    pub t_theta: Option<f32>,
    pub t_rho: Option<f32>,
    pub t_length: Option<f32>,
    pub t_alpha: Option<f32>,
    pub stride: Option<usize>,
    pub merge_radius: Option<f32>,
    pub log_level: Option<String>,
}

impl DetectionConfig {
    /// Detector configuration with this file's overrides applied.
    ///
    /// Changing `window` without `r_max` rescales the ring to the window.
    pub fn rectangle_config(&self) -> Result<RectangleConfig> {
        let mut cfg = RectangleConfig::default();
        let det = &mut cfg.detector;

        if let Some(v) = self.window {
            if v < 2 {
                anyhow::bail!("window must be >= 2");
            }
            det.window = v;
            det.r_max = v as f32 * 0.5;
        }
        if let Some(v) = self.r_min {
            det.r_min = v;
        }
        if let Some(v) = self.r_max {
            det.r_max = v;
        }
        if det.r_min > det.r_max {
            anyhow::bail!("r_min ({}) must not exceed r_max ({})", det.r_min, det.r_max);
        }
        if let Some(v) = self.theta_bins {
            det.hough.theta_bins = v;
        }
        if let Some(v) = self.rho_bins {
            det.hough.rho_bins = v;
        }
        if let Some(v) = self.enhance_size {
            if v == 0 {
                anyhow::bail!("enhance size must be >= 1");
            }
            det.enhance_h = v;
            det.enhance_w = v;
        }
        if let Some(t) = self.threshold_rel {
            det.peaks.threshold_rel = t;
        }
        if let Some(t) = self.threshold_abs {
            det.peaks.threshold_abs = Some(t);
        }
        if let Some(t) = self.t_theta {
            det.matching.t_theta = t;
        }
        if let Some(t) = self.t_rho {
            det.matching.t_rho = t;
        }
        if let Some(t) = self.t_length {
            det.matching.t_length = t;
        }
        if let Some(t) = self.t_alpha {
            det.matching.t_alpha = t;
        }
        if let Some(v) = self.stride {
            if v == 0 {
                anyhow::bail!("stride must be >= 1");
            }
            cfg.scan.stride = v;
        }
        if let Some(v) = self.merge_radius {
            if v < 0.0 {
                anyhow::bail!("merge radius must be >= 0");
            }
            cfg.scan.merge_radius = v;
        }
        Ok(cfg)
    }
}

pub fn load_config(path: &Path) -> Result<DetectionConfig> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let cfg: DetectionConfig = serde_json::from_reader(file)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let cfg: DetectionConfig = serde_json::from_str(
            r#"{ "window": 31, "threshold_rel": 0.6, "t_alpha": 5.0, "stride": 4 }"#,
        )
        .unwrap();
        let rc = cfg.rectangle_config().unwrap();
        assert_eq!(rc.detector.window, 31);
        assert_eq!(rc.detector.r_max, 15.5);
        assert_eq!(rc.detector.peaks.threshold_rel, 0.6);
        assert_eq!(rc.detector.matching.t_alpha, 5.0);
        assert_eq!(rc.detector.matching.t_theta, 3.0);
        assert_eq!(rc.scan.stride, 4);
    }

    #[test]
    fn invalid_overrides_are_reported() {
        let cfg = DetectionConfig {
            stride: Some(0),
            ..DetectionConfig::default()
        };
        assert!(cfg.rectangle_config().is_err());

        let cfg = DetectionConfig {
            r_min: Some(30.0),
            ..DetectionConfig::default()
        };
        assert!(cfg.rectangle_config().is_err());
    }

    #[test]
    fn missing_config_file_mentions_the_path() {
        let err = load_config(Path::new("/nonexistent/rect.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/rect.json"));
    }
}
