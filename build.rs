use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=HYPERTUNE_LIB_DIR");

    // Nothing to link unless the native engine was requested.
    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    let lib_dir = match env::var_os("HYPERTUNE_LIB_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let manifest_dir = PathBuf::from(
                env::var_os("CARGO_MANIFEST_DIR").expect("cargo always sets CARGO_MANIFEST_DIR"),
            );
            let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "x86_64".to_owned());
            manifest_dir.join("lib").join(arch)
        }
    };

    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=hypertune");
}
