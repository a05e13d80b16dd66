use rand::Rng;
use glam::Vec3;

pub fn random_f32<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen::<f32>()
}

pub fn random_range_f32<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..max)
}

// point uniformly distributed inside the unit disk, returned as (x, y)
pub fn random_in_unit_disk<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    loop {
        let x = random_range_f32(rng, -1.0, 1.0);
        let y = random_range_f32(rng, -1.0, 1.0);
        if x * x + y * y < 1.0 {
            return (x, y);
        }
    }
}

// h, s, v in [0, 1]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h = h.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match sector as u32 {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}

pub fn random_hsv_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    hsv_to_rgb(random_f32(rng), random_f32(rng), random_f32(rng))
}
