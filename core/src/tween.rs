use std::collections::BTreeMap;

use crate::definition::PieceId;
use crate::geom::{angle_delta, normalize_angle, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TweenProperty {
    Position,
    Rotation,
    Scale,
    Flash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    EaseOutCubic,
    EaseInOutQuad,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
                }
            }
        }
    }
}

/// What a tween drives. Rotation takes the short way round; flash rises and
/// falls back to zero over its duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenTrack {
    Position { from: Vec2, to: Vec2 },
    Rotation { from: f32, to: f32 },
    Scale { from: f32, to: f32 },
    Flash,
}

impl TweenTrack {
    pub fn property(&self) -> TweenProperty {
        match self {
            TweenTrack::Position { .. } => TweenProperty::Position,
            TweenTrack::Rotation { .. } => TweenProperty::Rotation,
            TweenTrack::Scale { .. } => TweenProperty::Scale,
            TweenTrack::Flash => TweenProperty::Flash,
        }
    }

    fn sample(&self, eased: f32, raw: f32) -> TweenSample {
        if raw >= 1.0 {
            return self.end();
        }
        match *self {
            TweenTrack::Position { from, to } => TweenSample::Position(from.lerp(to, eased)),
            TweenTrack::Rotation { from, to } => {
                TweenSample::Rotation(normalize_angle(from + angle_delta(to, from) * eased))
            }
            TweenTrack::Scale { from, to } => TweenSample::Scale(from + (to - from) * eased),
            TweenTrack::Flash => TweenSample::Flash((raw * std::f32::consts::PI).sin().max(0.0)),
        }
    }

    fn end(&self) -> TweenSample {
        match *self {
            TweenTrack::Position { to, .. } => TweenSample::Position(to),
            TweenTrack::Rotation { to, .. } => TweenSample::Rotation(normalize_angle(to)),
            TweenTrack::Scale { to, .. } => TweenSample::Scale(to),
            TweenTrack::Flash => TweenSample::Flash(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenSample {
    Position(Vec2),
    Rotation(f32),
    Scale(f32),
    Flash(f32),
}

#[derive(Debug, Clone)]
struct Tween {
    track: TweenTrack,
    duration_ms: f32,
    easing: Easing,
    // Stamped by the first frame that sees the tween.
    start_ms: Option<f64>,
}

/// Per-piece property tweens. Starting a tween on a (piece, property) pair
/// replaces whatever was running there.
#[derive(Debug, Default)]
pub struct Animator {
    tweens: BTreeMap<(PieceId, TweenProperty), Tween>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, piece: &PieceId, track: TweenTrack, duration_ms: f32, easing: Easing) {
        self.tweens.insert(
            (piece.clone(), track.property()),
            Tween {
                track,
                duration_ms: duration_ms.max(0.0),
                easing,
                start_ms: None,
            },
        );
    }

    pub fn cancel(&mut self, piece: &PieceId, property: TweenProperty) {
        self.tweens.remove(&(piece.clone(), property));
    }

    pub fn cancel_piece(&mut self, piece: &PieceId) {
        self.tweens.retain(|(id, _), _| id != piece);
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn is_animating(&self) -> bool {
        !self.tweens.is_empty()
    }

    pub fn is_running(&self, piece: &PieceId, property: TweenProperty) -> bool {
        self.tweens.contains_key(&(piece.clone(), property))
    }

    /// Destination of the running scale tween, if any.
    pub fn scale_target(&self, piece: &PieceId) -> Option<f32> {
        match self.tweens.get(&(piece.clone(), TweenProperty::Scale))?.track {
            TweenTrack::Scale { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Samples every tween at `now_ms` and drops the finished ones.
    pub fn advance(&mut self, now_ms: f64) -> Vec<(PieceId, TweenSample)> {
        let mut samples = Vec::with_capacity(self.tweens.len());
        let mut finished = Vec::new();
        for ((piece, property), tween) in self.tweens.iter_mut() {
            let start = *tween.start_ms.get_or_insert(now_ms);
            let raw = if tween.duration_ms <= 0.0 {
                1.0
            } else {
                (((now_ms - start) as f32) / tween.duration_ms).clamp(0.0, 1.0)
            };
            samples.push((piece.clone(), tween.track.sample(tween.easing.apply(raw), raw)));
            if raw >= 1.0 {
                finished.push((piece.clone(), *property));
            }
        }
        for key in finished {
            self.tweens.remove(&key);
        }
        samples
    }
}
