//! XOR obfuscation used for the directory block and every file payload.
//!
//! # Algorithm
//! A rolling state byte starts at `len(buf) as u8`.  For each position `i`:
//!
//! ```text
//! keyed   = buf[i] ^ MAGIC[i % 16] ^ (i * multiplier) as u8
//! buf[i]  = keyed ^ state
//! state   = keyed
//! ```
//!
//! Every method except [`Method::V0`] then XORs each byte pair at positions
//! `5 + 16k`, `6 + 16k` with `0x0d`.  Both passes always cover the whole buffer.
//!
//! The rolling state is taken from the *obfuscated* side, so [`decipher`] is
//! not its own inverse.  [`encipher`] is the exact inverse and exists so that
//! synthetic containers can be produced for testing.

use log::trace;

/// Fixed 16-byte key stream shared by every container.
pub const MAGIC: [u8; 16] = [
    0x4f, 0xd0, 0xa0, 0xac,
    0x4a, 0x5b, 0xb9, 0xe5,
    0x93, 0x79, 0x45, 0xa5,
    0xc1, 0xcb, 0x31, 0x93,
];

/// Byte applied by the secondary pair pass.
const PAIR_XOR: u8 = 0x0d;
/// First index touched by the pair pass, and its stride.
const PAIR_START:  usize = 5;
const PAIR_STRIDE: usize = 16;

// ── Method ───────────────────────────────────────────────────────────────────

/// One of the four known cipher configurations.  Chosen once per container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
}

impl Method {
    /// Order in which methods are tried against a directory block.
    pub const PROBE_ORDER: [Method; 4] = [Method::V3, Method::V2, Method::V1, Method::V0];

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Method::V0),
            1 => Some(Method::V1),
            2 => Some(Method::V2),
            3 => Some(Method::V3),
            _ => None,
        }
    }

    /// Rolling multiplier applied to the byte position.
    #[inline]
    pub fn multiplier(self) -> u8 {
        match self {
            Method::V2 => 0xad,
            _          => 0x6d,
        }
    }

    /// Whether the secondary pair pass runs.
    #[inline]
    pub fn pair_pass(self) -> bool {
        self != Method::V0
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "method {}", self.id())
    }
}

// ── Passes ───────────────────────────────────────────────────────────────────

#[inline]
fn key_at(i: usize, multiplier: u8) -> u8 {
    MAGIC[i & 0xf] ^ (i as u8).wrapping_mul(multiplier)
}

fn pair_pass(buf: &mut [u8]) {
    let mut i = PAIR_START;
    while i + 1 < buf.len() {
        buf[i]     ^= PAIR_XOR;
        buf[i + 1] ^= PAIR_XOR;
        i += PAIR_STRIDE;
    }
}

/// Remove the obfuscation from `buf` in place.
pub fn decipher(buf: &mut [u8], method: Method) {
    trace!("Deciphering {} bytes with {}", buf.len(), method);
    let multiplier = method.multiplier();
    let mut state = buf.len() as u8;
    for (i, byte) in buf.iter_mut().enumerate() {
        let keyed = *byte ^ key_at(i, multiplier);
        *byte = keyed ^ state;
        state = keyed;
    }
    if method.pair_pass() {
        pair_pass(buf);
    }
}

/// Apply the obfuscation to `buf` in place.  Inverse of [`decipher`].
pub fn encipher(buf: &mut [u8], method: Method) {
    if method.pair_pass() {
        pair_pass(buf);
    }
    let multiplier = method.multiplier();
    let mut state = buf.len() as u8;
    for (i, byte) in buf.iter_mut().enumerate() {
        let keyed = *byte ^ state;
        *byte = keyed ^ key_at(i, multiplier);
        state = keyed;
    }
}

/// Decipher several independent payload buffers with the same method.
///
/// With the `parallel` feature the buffers are processed on the Rayon pool;
/// otherwise sequentially.
pub fn decipher_all(bufs: &mut [Vec<u8>], method: Method) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        bufs.par_iter_mut().for_each(|b| decipher(b, method));
    }

    #[cfg(not(feature = "parallel"))]
    {
        for b in bufs.iter_mut() {
            decipher(b, method);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_method() -> impl Strategy<Value = Method> {
        (0u8..4).prop_map(|id| Method::from_id(id).unwrap())
    }

    #[test]
    fn method_constants() {
        assert_eq!(Method::V0.multiplier(), 0x6d);
        assert_eq!(Method::V1.multiplier(), 0x6d);
        assert_eq!(Method::V2.multiplier(), 0xad);
        assert_eq!(Method::V3.multiplier(), 0x6d);
        assert!(!Method::V0.pair_pass());
        assert!(Method::V1.pair_pass() && Method::V2.pair_pass() && Method::V3.pair_pass());
        assert_eq!(Method::from_id(4), None);
    }

    #[test]
    fn first_byte_uses_length_as_state() {
        // i = 0: keyed = b ^ MAGIC[0] ^ 0, out = keyed ^ len
        let mut buf = [0x00u8];
        decipher(&mut buf, Method::V0);
        assert_eq!(buf[0], MAGIC[0] ^ 1);
    }

    #[test]
    fn pair_pass_touches_expected_positions() {
        let mut a = vec![0u8; 40];
        let mut b = a.clone();
        decipher(&mut a, Method::V0);
        decipher(&mut b, Method::V1);
        let diff: Vec<usize> = (0..40).filter(|&i| a[i] != b[i]).collect();
        assert_eq!(diff, vec![5, 6, 21, 22, 37, 38]);
    }

    #[test]
    fn pair_pass_skips_incomplete_stride() {
        // len 22: pairs (5,6) and (21,22) -> second runs past the end.
        let mut a = vec![0u8; 22];
        let mut b = a.clone();
        decipher(&mut a, Method::V0);
        decipher(&mut b, Method::V3);
        let diff: Vec<usize> = (0..22).filter(|&i| a[i] != b[i]).collect();
        assert_eq!(diff, vec![5, 6]);
    }

    #[test]
    fn empty_buffer_is_noop() {
        let mut buf: [u8; 0] = [];
        decipher(&mut buf, Method::V3);
        encipher(&mut buf, Method::V3);
    }

    #[test]
    fn decipher_all_matches_single() {
        let mut bufs = vec![b"first payload".to_vec(), b"second".to_vec(), Vec::new()];
        let expected: Vec<Vec<u8>> = bufs
            .iter()
            .map(|b| {
                let mut b = b.clone();
                decipher(&mut b, Method::V2);
                b
            })
            .collect();
        decipher_all(&mut bufs, Method::V2);
        assert_eq!(bufs, expected);
    }

    proptest! {
        #[test]
        fn encipher_then_decipher_restores(data in proptest::collection::vec(any::<u8>(), 0..512),
                                           method in any_method()) {
            let mut buf = data.clone();
            encipher(&mut buf, method);
            decipher(&mut buf, method);
            prop_assert_eq!(buf, data);
        }

        #[test]
        fn decipher_then_encipher_restores(data in proptest::collection::vec(any::<u8>(), 0..512),
                                           method in any_method()) {
            let mut buf = data.clone();
            decipher(&mut buf, method);
            encipher(&mut buf, method);
            prop_assert_eq!(buf, data);
        }
    }
}
