use std::{env, path::PathBuf};

use raspboot::layout::LOADER_ADDRESS;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let ld = manifest_dir.join("layout.ld");
    println!("cargo:rerun-if-changed={}", ld.display());

    // host builds (cargo test) link normally
    let target = env::var("TARGET").unwrap();
    if !target.contains("-none") {
        return;
    }

    assert_eq!(LOADER_ADDRESS & 0xf, 0, "LOADER_ADDRESS {:#x} is misaligned", LOADER_ADDRESS);

    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());
    println!("cargo:rustc-link-arg-bins=--defsym=LOADER_ADDRESS={:#x}", LOADER_ADDRESS);
}
