use crate::geom::normalize_angle;

pub const SCRAMBLE_SEED: u32 = 0x6B61_6B65;

pub fn splitmix32(mut value: u32) -> u32 {
    value = value.wrapping_add(0x9E37_79B9);
    let mut z = value;
    z = (z ^ (z >> 16)).wrapping_mul(0x85EB_CA6B);
    z = (z ^ (z >> 13)).wrapping_mul(0xC2B2_AE35);
    z ^ (z >> 16)
}

pub fn rand_unit(seed: u32, salt: u32) -> f32 {
    let mixed = splitmix32(seed ^ salt);
    let top = mixed >> 8;
    top as f32 / ((1u32 << 24) as f32)
}

pub fn load_seed(load_seq: u64) -> u32 {
    splitmix32(SCRAMBLE_SEED ^ (load_seq as u32) ^ ((load_seq >> 32) as u32))
}

/// Starting rotation for a loose piece: a non-zero whole number of `step`
/// turns away from the solved angle.
pub fn initial_rotation(seed: u32, index: usize, correct_deg: f32, step_deg: f32) -> f32 {
    let steps = (360.0 / step_deg).floor() as u32;
    if steps < 2 {
        return normalize_angle(correct_deg + 180.0);
    }
    let pick = (rand_unit(seed, (index as u32).wrapping_mul(0x2545_F491)) * (steps - 1) as f32) as u32;
    let k = pick.min(steps - 2) + 1;
    normalize_angle(correct_deg + k as f32 * step_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::angle_delta;

    #[test]
    fn never_starts_solved() {
        let seed = load_seed(7);
        for index in 0..200 {
            let rotation = initial_rotation(seed, index, 30.0, 15.0);
            assert!(angle_delta(rotation, 30.0).abs() >= 15.0 - 1e-3, "index {index} got {rotation}");
        }
    }

    #[test]
    fn deterministic_per_seed() {
        let a = initial_rotation(load_seed(3), 4, 0.0, 15.0);
        let b = initial_rotation(load_seed(3), 4, 0.0, 15.0);
        assert_eq!(a, b);
    }
}
