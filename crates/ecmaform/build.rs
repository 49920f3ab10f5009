fn main() {
    // Cargo only exposes TARGET to build scripts; forward it to the crate.
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown-unknown-unknown".to_string());
    println!("cargo:rustc-env=ECMAFORM_TARGET_TRIPLE={target}");
    println!("cargo:rerun-if-changed=build.rs");
}
