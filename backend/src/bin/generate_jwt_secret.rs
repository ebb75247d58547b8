//! Print a freshly generated `JWT_SECRET_KEY`.
//!
//! The key is 64 bytes from the operating system RNG, encoded as URL-safe
//! base64 with padding. Buffers holding the secret are zeroised on exit.

use std::io::{self, Write};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, Zeroizing};

const SECRET_BYTES: usize = 64;

fn generate_secret<R: RngCore>(rng: &mut R) -> Zeroizing<String> {
    let mut bytes = [0_u8; SECRET_BYTES];
    rng.fill_bytes(&mut bytes);
    let encoded = Zeroizing::new(URL_SAFE.encode(bytes));
    bytes.zeroize();
    encoded
}

fn main() -> io::Result<()> {
    let secret = generate_secret(&mut OsRng);
    let mut out = io::stdout().lock();
    writeln!(out, "JWT_SECRET_KEY={}", secret.as_str())?;
    writeln!(out)?;
    writeln!(out, "Set this value as JWT_SECRET_KEY in the deployment environment.")?;
    writeln!(out, "Keep it out of version control and use a different key per environment.")?;
    writeln!(out, "If it leaks, generate a new key and redeploy; existing tokens stop validating.")?;
    Ok(())
}
