use serde::{Deserialize, Serialize};

pub const TRAY_MAX_ROWS_DEFAULT: u32 = 4;
pub const TRAY_MAX_ROWS_MIN: u32 = 1;
pub const TRAY_MAX_ROWS_MAX: u32 = 16;

pub const TRAY_GAP_DEFAULT: f32 = 12.0;
pub const TRAY_GAP_MAX: f32 = 64.0;
pub const TRAY_GAP_SHRINK_RATIO: f32 = 0.1;

pub const DIAGONAL_CLEARANCE_DEFAULT: f32 = 36.0;
pub const SIDE_CLEARANCE_DEFAULT: f32 = 18.0;
pub const CLEARANCE_MAX: f32 = 128.0;

pub const TRAY_SAFETY_DEFAULT: f32 = 0.95;
pub const TRAY_SAFETY_MIN: f32 = 0.5;
pub const TRAY_SAFETY_MAX: f32 = 1.0;

pub const BOARD_FRACTION_DEFAULT: f32 = 0.62;
pub const BOARD_FRACTION_MIN: f32 = 0.3;
pub const BOARD_FRACTION_MAX: f32 = 0.85;

pub const STAGE_PADDING_DEFAULT: f32 = 16.0;
pub const STAGE_PADDING_MAX: f32 = 96.0;

pub const ZONE_MARGIN_DEFAULT: f32 = 8.0;
pub const ZONE_HYSTERESIS_DEFAULT: f32 = 24.0;
pub const ZONE_DISTANCE_MAX: f32 = 200.0;

pub const SCALE_TWEEN_MS_DEFAULT: f32 = 160.0;
pub const SNAP_TWEEN_MS_DEFAULT: f32 = 180.0;
pub const RETURN_TWEEN_MS_DEFAULT: f32 = 260.0;
pub const FLASH_MS_DEFAULT: f32 = 420.0;
pub const TWEEN_MS_MAX: f32 = 2000.0;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 2.0;
pub const ZOOM_DEFAULT: f32 = 1.0;
pub const ZOOM_STEP_DEFAULT: f32 = 0.1;
pub const ZOOM_STEP_MAX: f32 = 0.5;
pub const PINCH_SENSITIVITY_DEFAULT: f32 = 0.003;
pub const PINCH_SENSITIVITY_MAX: f32 = 0.05;

pub const ROTATE_STEP_DEFAULT_DEG: f32 = 15.0;
pub const ROTATE_FAST_STEP_DEFAULT_DEG: f32 = 45.0;
pub const ROTATE_STEP_MIN_DEG: f32 = 1.0;
pub const ROTATE_STEP_MAX_DEG: f32 = 180.0;

pub const HANDLE_RADIUS_DEFAULT: f32 = 14.0;
pub const HANDLE_GAP_DEFAULT: f32 = 10.0;
pub const HANDLE_SIZE_MIN: f32 = 4.0;
pub const HANDLE_SIZE_MAX: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Host-tunable engine constants. Every field falls back to its default when
/// omitted from JSON; [`EngineRules::sanitized`] clamps out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineRules {
    pub tray_max_rows: u32,
    pub tray_gap: f32,
    pub diagonal_clearance: f32,
    pub side_clearance: f32,
    pub tray_safety: f32,
    pub board_fraction: f32,
    pub stage_padding: f32,
    pub zone_margin: f32,
    pub zone_hysteresis: f32,
    pub scale_tween_ms: f32,
    pub snap_tween_ms: f32,
    pub return_tween_ms: f32,
    pub flash_ms: f32,
    pub zoom_step: f32,
    pub pinch_sensitivity: f32,
    pub rotate_step_deg: f32,
    pub rotate_fast_step_deg: f32,
    pub handle_radius: f32,
    pub handle_gap: f32,
}

impl Default for EngineRules {
    fn default() -> Self {
        Self {
            tray_max_rows: TRAY_MAX_ROWS_DEFAULT,
            tray_gap: TRAY_GAP_DEFAULT,
            diagonal_clearance: DIAGONAL_CLEARANCE_DEFAULT,
            side_clearance: SIDE_CLEARANCE_DEFAULT,
            tray_safety: TRAY_SAFETY_DEFAULT,
            board_fraction: BOARD_FRACTION_DEFAULT,
            stage_padding: STAGE_PADDING_DEFAULT,
            zone_margin: ZONE_MARGIN_DEFAULT,
            zone_hysteresis: ZONE_HYSTERESIS_DEFAULT,
            scale_tween_ms: SCALE_TWEEN_MS_DEFAULT,
            snap_tween_ms: SNAP_TWEEN_MS_DEFAULT,
            return_tween_ms: RETURN_TWEEN_MS_DEFAULT,
            flash_ms: FLASH_MS_DEFAULT,
            zoom_step: ZOOM_STEP_DEFAULT,
            pinch_sensitivity: PINCH_SENSITIVITY_DEFAULT,
            rotate_step_deg: ROTATE_STEP_DEFAULT_DEG,
            rotate_fast_step_deg: ROTATE_FAST_STEP_DEFAULT_DEG,
            handle_radius: HANDLE_RADIUS_DEFAULT,
            handle_gap: HANDLE_GAP_DEFAULT,
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

impl EngineRules {
    pub fn sanitized(self) -> Self {
        Self {
            tray_max_rows: self.tray_max_rows.clamp(TRAY_MAX_ROWS_MIN, TRAY_MAX_ROWS_MAX),
            tray_gap: clamp_or(self.tray_gap, 0.0, TRAY_GAP_MAX, TRAY_GAP_DEFAULT),
            diagonal_clearance: clamp_or(
                self.diagonal_clearance,
                0.0,
                CLEARANCE_MAX,
                DIAGONAL_CLEARANCE_DEFAULT,
            ),
            side_clearance: clamp_or(self.side_clearance, 0.0, CLEARANCE_MAX, SIDE_CLEARANCE_DEFAULT),
            tray_safety: clamp_or(self.tray_safety, TRAY_SAFETY_MIN, TRAY_SAFETY_MAX, TRAY_SAFETY_DEFAULT),
            board_fraction: clamp_or(
                self.board_fraction,
                BOARD_FRACTION_MIN,
                BOARD_FRACTION_MAX,
                BOARD_FRACTION_DEFAULT,
            ),
            stage_padding: clamp_or(self.stage_padding, 0.0, STAGE_PADDING_MAX, STAGE_PADDING_DEFAULT),
            zone_margin: clamp_or(self.zone_margin, 0.0, ZONE_DISTANCE_MAX, ZONE_MARGIN_DEFAULT),
            zone_hysteresis: clamp_or(
                self.zone_hysteresis,
                0.0,
                ZONE_DISTANCE_MAX,
                ZONE_HYSTERESIS_DEFAULT,
            ),
            scale_tween_ms: clamp_or(self.scale_tween_ms, 0.0, TWEEN_MS_MAX, SCALE_TWEEN_MS_DEFAULT),
            snap_tween_ms: clamp_or(self.snap_tween_ms, 0.0, TWEEN_MS_MAX, SNAP_TWEEN_MS_DEFAULT),
            return_tween_ms: clamp_or(self.return_tween_ms, 0.0, TWEEN_MS_MAX, RETURN_TWEEN_MS_DEFAULT),
            flash_ms: clamp_or(self.flash_ms, 0.0, TWEEN_MS_MAX, FLASH_MS_DEFAULT),
            zoom_step: clamp_or(self.zoom_step, 0.01, ZOOM_STEP_MAX, ZOOM_STEP_DEFAULT),
            pinch_sensitivity: clamp_or(
                self.pinch_sensitivity,
                0.0,
                PINCH_SENSITIVITY_MAX,
                PINCH_SENSITIVITY_DEFAULT,
            ),
            rotate_step_deg: clamp_or(
                self.rotate_step_deg,
                ROTATE_STEP_MIN_DEG,
                ROTATE_STEP_MAX_DEG,
                ROTATE_STEP_DEFAULT_DEG,
            ),
            rotate_fast_step_deg: clamp_or(
                self.rotate_fast_step_deg,
                ROTATE_STEP_MIN_DEG,
                ROTATE_STEP_MAX_DEG,
                ROTATE_FAST_STEP_DEFAULT_DEG,
            ),
            handle_radius: clamp_or(self.handle_radius, HANDLE_SIZE_MIN, HANDLE_SIZE_MAX, HANDLE_RADIUS_DEFAULT),
            handle_gap: clamp_or(self.handle_gap, 0.0, HANDLE_SIZE_MAX, HANDLE_GAP_DEFAULT),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let rules: EngineRules = serde_json::from_str(raw)?;
        Ok(rules.sanitized())
    }
}

pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        ZOOM_DEFAULT
    }
}
