//! Short human-typeable codes for rooms and games.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Length of a room or game code.
pub const CODE_LEN: usize = 6;

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A random code such as `K3Q9ZD`.
pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| {
            let i = rng.random_range(0..CODE_CHARSET.len());
            char::from(CODE_CHARSET[i])
        })
        .collect()
}

/// A code for which `taken` is false.
///
/// Tries `attempts` random codes. If all of them collide, the last one is
/// suffixed with the current unix time in nanoseconds, which is unique
/// enough for a single process.
pub fn unique_code<R, F>(rng: &mut R, attempts: usize, taken: F) -> String
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let mut last = None;
    for _ in 0..attempts {
        let code = random_code(rng);
        if !taken(&code) {
            return code;
        }
        last = Some(code);
    }

    let code = last.unwrap_or_else(|| random_code(rng));
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    tracing::debug!(%code, attempts, "id space collision, using suffixed id");
    format!("{code}_{nanos}")
}
