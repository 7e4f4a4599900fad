//! Secret command - print one generated secret.

use crate::core::secret::{generate_secret, Encoding};
use crate::error::Result;

/// Print a secret of `bytes` random bytes to stdout.
pub fn execute(bytes: usize, hex: bool) -> Result<()> {
    let encoding = if hex { Encoding::Hex } else { Encoding::Base64 };
    let secret = generate_secret(bytes, encoding)?;
    println!("{}", secret.expose());
    Ok(())
}
