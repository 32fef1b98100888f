use std::fmt;
use std::ops::Add;

/// A 32-bit TCP sequence number. Arithmetic wraps modulo 2^32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl Add for Wrap32 {
    type Output = Wrap32;

    fn add(self, other: Wrap32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(other.value))
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, n: u32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(n))
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use rand::Rng;
    use super::*;

    // -- Test `+` operator overload --

    #[test]
    fn test_add() {
        let x = Wrap32::new(1);
        let y = Wrap32::new(2);
        let z = Wrap32::new(3);
        assert_eq!(x + y, z);
        assert_eq!(x + 2u32, z);
    }

    #[test]
    fn test_add_overflow() {
        let x = Wrap32::new(u32::MAX);
        let y = Wrap32::new(1);
        let z = Wrap32::new(0);
        assert_eq!(x + y, z);
        assert_eq!(x + 1u32, z);
    }

    // -- Test compare --

    #[test]
    fn test_equality() {
        let wrap_a = Wrap32::new(3);
        let wrap_b = Wrap32::new(1);

        assert_ne!(wrap_a, wrap_b);
        assert_eq!(wrap_a != wrap_b, true);
        assert_eq!(wrap_a == wrap_b, false);
    }

    #[test]
    fn test_equality_random() {
        let n_reps = 32768;
        let mut rng = rand::thread_rng();
        for _ in 0..n_reps {
            let n: u32 = rng.gen();
            let diff: u8 = rng.gen();
            let m: u32 = n.wrapping_add(diff as u32);

            let wrap_n = Wrap32::new(n);
            let wrap_m = Wrap32::new(m);

            assert_eq!(wrap_n == wrap_m, n == m);
            assert_eq!(wrap_n + diff as u32, wrap_m);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Wrap32::new(2753993875).to_string(), "2753993875");
    }
}
