//! Return code generation.

use osun_storefront::services::returns::code;

/// Print `count` freshly generated return codes, one per line.
#[allow(clippy::print_stdout)]
pub fn generate(count: usize) {
    for _ in 0..count {
        println!("{}", code::generate());
    }
}
