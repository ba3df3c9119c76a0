//! Business logic services for the storefront.
//!
//! # Services
//!
//! - [`auth`] - sign-up, sign-in, sign-out and session lookup
//! - [`cart`] - the signed-in user's cart, persisted per user
//! - [`orders`] - order placement and the status lifecycle

pub mod auth;
pub mod cart;
pub mod orders;

use rand::Rng;

/// Random lowercase base-36 string of `len` characters.
pub(crate) fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_base36_charset_and_length() {
        let id = random_base36(9);
        assert_eq!(id.len(), 9);
        assert!(
            id.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }
}
