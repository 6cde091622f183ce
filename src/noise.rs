//! Deterministic noise and hashing. Everything here is pure: the same
//! inputs always produce the same output.

const PERM_SEED: u64 = 0x5EED_F1E1_D000_0256;

/// 2D value noise over a fixed 256-entry permutation table with
/// smoothstep interpolation. Output is in `0..=1`.
#[derive(Clone)]
pub struct ValueNoise {
    perm: [u8; 512],
}

impl Default for ValueNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValueNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueNoise").finish_non_exhaustive()
    }
}

impl ValueNoise {
    pub fn new() -> Self {
        let mut table: Vec<u8> = (0..=255u8).collect();
        fastrand::Rng::with_seed(PERM_SEED).shuffle(&mut table);
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn lattice(&self, xi: i32, yi: i32) -> f32 {
        let x = (xi & 255) as usize;
        let y = (yi & 255) as usize;
        self.perm[self.perm[x] as usize + y] as f32 / 255.0
    }

    pub fn noise2(&self, x: f32, y: f32) -> f32 {
        if !(x.is_finite() && y.is_finite()) {
            return 0.0;
        }
        let x0 = x.floor();
        let y0 = y.floor();
        let xi = x0 as i32;
        let yi = y0 as i32;
        let u = smooth(x - x0);
        let v = smooth(y - y0);
        let a = self.lattice(xi, yi);
        let b = self.lattice(xi + 1, yi);
        let c = self.lattice(xi, yi + 1);
        let d = self.lattice(xi + 1, yi + 1);
        let top = a + (b - a) * u;
        let bot = c + (d - c) * u;
        top + (bot - top) * v
    }

    /// Sum of `octaves` noise layers at doubling frequency, normalised.
    pub fn fbm(&self, x: f32, y: f32, octaves: u32) -> f32 {
        let mut amp = 0.5;
        let mut freq = 1.0;
        let mut sum = 0.0;
        let mut norm = 0.0;
        for _ in 0..octaves.max(1) {
            sum += self.noise2(x * freq, y * freq) * amp;
            norm += amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        sum / norm
    }
}

#[inline]
fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let d = (edge1 - edge0).abs().max(1e-6);
    smooth(((x - edge0) / d).clamp(0.0, 1.0))
}

pub fn hash_u32(x: u32, y: u32, seed: u32) -> u32 {
    let mut n = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed.wrapping_mul(0x9E37_79B9);
    n ^= n >> 13;
    n = n.wrapping_mul(1_274_126_177);
    n ^ (n >> 16)
}

/// Seeded per-index value in `0..1`; stable across frames.
#[inline]
pub fn hash01(i: u32, seed: u32) -> f32 {
    (hash_u32(i, i.rotate_left(16) ^ 0xA53A_9B17, seed) & 0x00FF_FFFF) as f32 / 16_777_216.0
}
